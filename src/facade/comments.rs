//! Comment facade (§4.6): fetch a single comment by id, or submit a new one
//! against an issue or a pull request.

use crate::capability::{Forge, SubmitCommentOpts};
use crate::context::Context;
use crate::error::Result;
use crate::path::Path;
use crate::types::{Comment, CommentTarget};

pub fn get(
   ctx: &Context,
   forge: &dyn Forge,
   path: &Path,
   target_type: CommentTarget,
   comment_id: u64,
) -> Result<Comment> {
   forge.get_comment(ctx, path, target_type, comment_id)
}

pub fn submit_on_issue(ctx: &Context, forge: &dyn Forge, path: &Path, message: &str) -> Result<Comment> {
   forge.perform_submit_comment(ctx, &SubmitCommentOpts {
      target:      path.clone(),
      target_type: CommentTarget::Issue,
      message:     message.to_string(),
   })
}

pub fn submit_on_pull(ctx: &Context, forge: &dyn Forge, path: &Path, message: &str) -> Result<Comment> {
   forge.perform_submit_comment(ctx, &SubmitCommentOpts {
      target:      path.clone(),
      target_type: CommentTarget::Pull,
      message:     message.to_string(),
   })
}
