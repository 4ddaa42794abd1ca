//! Notification facade (§4.6): list the active account's notifications, mark
//! one read, and jump from a notification to the issue/comments it's about.

use crate::capability::Forge;
use crate::context::Context;
use crate::error::Result;
use crate::types::{Comment, FetchLimit, Issue, Notification};

pub fn list(ctx: &Context, forge: &dyn Forge, max: FetchLimit) -> Result<Vec<Notification>> {
   forge.get_notifications(ctx, max)
}

pub fn mark_as_read(ctx: &Context, forge: &dyn Forge, id: &str) -> Result<()> {
   forge.notification_mark_as_read(ctx, id)
}

pub fn issue_for(ctx: &Context, forge: &dyn Forge, notification: &Notification) -> Result<Issue> {
   forge.notification_get_issue(ctx, notification)
}

pub fn comments_for(ctx: &Context, forge: &dyn Forge, notification: &Notification) -> Result<Vec<Comment>> {
   forge.notification_get_comments(ctx, notification)
}
