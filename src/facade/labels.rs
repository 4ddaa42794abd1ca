//! Label facade (§4.6). Labels have no action chain of their own in the
//! source — they're list/create/delete verbs reached directly, and an
//! add/remove pair reached through the issue and pull action chains.

use crate::capability::Forge;
use crate::context::Context;
use crate::error::Result;
use crate::path::Path;
use crate::types::{FetchLimit, Label};

pub fn list(ctx: &Context, forge: &dyn Forge, path: &Path, max: FetchLimit) -> Result<Vec<Label>> {
   forge.get_labels(ctx, path, max)
}

pub fn create(ctx: &Context, forge: &dyn Forge, path: &Path, label: &Label) -> Result<Label> {
   forge.create_label(ctx, path, label)
}

pub fn delete(ctx: &Context, forge: &dyn Forge, path: &Path, name: &str) -> Result<()> {
   forge.delete_label(ctx, path, name)
}
