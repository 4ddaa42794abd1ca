//! Fork facade (§4.6): list a repo's forks, or create one of your own.

use crate::capability::Forge;
use crate::context::Context;
use crate::error::Result;
use crate::path::Path;
use crate::types::{FetchLimit, Fork};

pub fn list(ctx: &Context, forge: &dyn Forge, path: &Path, max: FetchLimit) -> Result<Vec<Fork>> {
   forge.get_forks(ctx, path, max)
}

pub fn create(ctx: &Context, forge: &dyn Forge, path: &Path) -> Result<Fork> {
   forge.fork_create(ctx, path)
}
