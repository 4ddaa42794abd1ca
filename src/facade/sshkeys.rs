//! SSH key facade (§4.6): list, add, and remove keys on the active account.

use crate::capability::Forge;
use crate::context::Context;
use crate::error::Result;
use crate::types::{FetchLimit, SshKey};

pub fn list(ctx: &Context, forge: &dyn Forge, max: FetchLimit) -> Result<Vec<SshKey>> {
   forge.get_sshkeys(ctx, max)
}

pub fn create(ctx: &Context, forge: &dyn Forge, title: &str, key: &str) -> Result<SshKey> {
   forge.sshkey_create(ctx, title, key)
}

pub fn delete(ctx: &Context, forge: &dyn Forge, id: u64) -> Result<()> {
   forge.sshkey_delete(ctx, id)
}
