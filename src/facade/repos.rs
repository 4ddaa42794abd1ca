//! Repository facade (§4.6): list repos for an owner or for the active
//! account, create, delete, and flip visibility.

use crate::capability::{Forge, RepoCreateOpts};
use crate::context::Context;
use crate::error::Result;
use crate::path::Path;
use crate::types::{FetchLimit, Repo};

pub fn list_for_owner(ctx: &Context, forge: &dyn Forge, owner: &str, max: FetchLimit) -> Result<Vec<Repo>> {
   forge.get_repos(ctx, owner, max)
}

pub fn list_own(ctx: &Context, forge: &dyn Forge, max: FetchLimit) -> Result<Vec<Repo>> {
   forge.get_own_repos(ctx, max)
}

pub fn create(ctx: &Context, forge: &dyn Forge, name: &str, opts: &RepoCreateOpts) -> Result<Repo> {
   forge.repo_create(ctx, name, opts)
}

pub fn delete(ctx: &Context, forge: &dyn Forge, path: &Path) -> Result<()> {
   forge.repo_delete(ctx, path)
}

pub fn set_visibility(ctx: &Context, forge: &dyn Forge, path: &Path, private: bool) -> Result<()> {
   forge.repo_set_visibility(ctx, path, private)
}
