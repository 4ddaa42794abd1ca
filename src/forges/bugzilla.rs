//! Bugzilla-like tracker adapter.
//!
//! Narrowest of the four backends: issues and comments only, no pulls, no
//! labels, no milestones, no pipelines — every other capability falls
//! through to the trait's default `Unsupported`. Bugzilla's REST API
//! authenticates via an `?api_key=` query parameter rather than an
//! `Authorization` header, so [`Forge::get_authheader`] returns an empty
//! string here and every URL carries the key explicitly instead.

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;

use crate::capability::{Forge, IssueSubmitOpts, SubmitCommentOpts};
use crate::context::Context;
use crate::error::{GcliError, Result};
use crate::fetch::{self, Page};
use crate::path::Path;
use crate::types::{Comment, CommentTarget, FetchLimit, Issue, SearchFilters};

pub struct Bugzilla;

fn api_key(ctx: &Context) -> String {
   ctx.account().token.clone()
}

fn rest_url(ctx: &Context, suffix: &str) -> String {
   format!("{}/rest{suffix}", ctx.account().api_base)
}

fn append_key(ctx: &Context, url: &mut String) {
   let sep = if url.contains('?') { '&' } else { '?' };
   url.push(sep);
   url.push_str(&format!("api_key={}", api_key(ctx)));
}

fn bug_id(path: &Path) -> Result<u64> {
   match path {
      Path::Id(id) => Ok(*id),
      Path::Default { id, .. } if *id > 0 => Ok(*id),
      _ => Err(GcliError::usage("bugzilla requires a numeric bug id")),
   }
}

#[derive(Debug, Deserialize)]
struct BzBug {
   id:             u64,
   summary:        String,
   #[serde(default)]
   creator:        String,
   status:         String,
   creation_time:  DateTime<Utc>,
   #[serde(default)]
   is_open:        bool,
   #[serde(default)]
   product:        String,
   #[serde(default)]
   component:      String,
   #[serde(default)]
   assigned_to:    String,
}

impl From<BzBug> for Issue {
   fn from(b: BzBug) -> Self {
      Self {
         number:         b.id,
         title:          b.summary,
         body:           String::new(),
         author:         b.creator,
         state:          b.status,
         created_at:     b.creation_time,
         comments_count: 0,
         locked:         !b.is_open,
         url:            String::new(),
         product:        b.product,
         component:      b.component,
         milestone:      None,
         labels:         Vec::new(),
         assignees:      if b.assigned_to.is_empty() { Vec::new() } else { vec![b.assigned_to] },
         is_pr:          false,
      }
   }
}

#[derive(Debug, Deserialize)]
struct BzBugsResponse {
   bugs: Vec<BzBug>,
}

#[derive(Debug, Deserialize)]
struct BzComment {
   id:           u64,
   #[serde(default)]
   creator:      String,
   time:         DateTime<Utc>,
   text:         String,
}

#[derive(Debug, Deserialize)]
struct BzCommentsBody {
   bugs: std::collections::HashMap<String, BzCommentsForBug>,
}

#[derive(Debug, Deserialize)]
struct BzCommentsForBug {
   comments: Vec<BzComment>,
}

impl From<BzComment> for Comment {
   fn from(c: BzComment) -> Self {
      Self { id: c.id, author: c.creator, date: c.time, body: c.text }
   }
}

impl Forge for Bugzilla {
   fn get_authheader(&self, _ctx: &Context) -> String {
      String::new()
   }

   fn search_issues(
      &self,
      ctx: &Context,
      path: &Path,
      filters: &SearchFilters,
      max: FetchLimit,
   ) -> Result<Vec<Issue>> {
      let mut url = rest_url(ctx, "/bug");
      if let Path::Bugzilla { product, component } = path {
         url.push_str(&format!("?product={product}&component={component}"));
      }
      if !filters.all {
         let sep = if url.contains('?') { '&' } else { '?' };
         url.push(sep);
         url.push_str("status=open");
      }
      if let Some(author) = &filters.author {
         url.push_str(&format!("&creator={author}"));
      }
      append_key(ctx, &mut url);

      fetch::fetch_list(
         ctx,
         self,
         &url,
         max,
         |body| {
            let parsed: BzBugsResponse = serde_json::from_str(body)?;
            Ok(Page { items: parsed.bugs.into_iter().map(Into::into).collect(), next_url: None })
         },
         None,
      )
   }

   fn get_issue(&self, ctx: &Context, path: &Path) -> Result<Issue> {
      let id = bug_id(path)?;
      let mut url = rest_url(ctx, &format!("/bug/{id}"));
      append_key(ctx, &mut url);
      let body = fetch::fetch_one(ctx, self, &url, None)?;
      let parsed: BzBugsResponse = serde_json::from_str(&body)?;
      parsed
         .bugs
         .into_iter()
         .next()
         .map(Into::into)
         .ok_or_else(|| GcliError::data(format!("no such bug #{id}")))
   }

   fn submit_issue(&self, ctx: &Context, path: &Path, opts: &IssueSubmitOpts) -> Result<Issue> {
      let Path::Bugzilla { product, component } = path else {
         return Err(GcliError::usage("filing a bug requires a product/component path"));
      };
      let mut url = rest_url(ctx, "/bug");
      append_key(ctx, &mut url);
      let payload = serde_json::json!({
         "product": product,
         "component": component,
         "summary": opts.title,
         "description": opts.body,
         "version": "unspecified",
      })
      .to_string();
      let body = fetch::fetch_with_method(ctx, self, Method::POST, &url, Some(&payload), &[], true)?
         .ok_or_else(|| GcliError::data("empty response filing bug"))?;
      let created: serde_json::Value = serde_json::from_str(&body)?;
      let id = created["id"].as_u64().ok_or_else(|| GcliError::data("bug creation response had no id"))?;
      self.get_issue(ctx, &Path::Id(id))
   }

   fn issue_close(&self, ctx: &Context, path: &Path) -> Result<()> {
      patch_bug_status(ctx, self, path, "RESOLVED")
   }

   fn issue_reopen(&self, ctx: &Context, path: &Path) -> Result<()> {
      patch_bug_status(ctx, self, path, "REOPENED")
   }

   fn issue_assign(&self, ctx: &Context, path: &Path, user: &str) -> Result<()> {
      let id = bug_id(path)?;
      let mut url = rest_url(ctx, &format!("/bug/{id}"));
      append_key(ctx, &mut url);
      let payload = serde_json::json!({ "assigned_to": user }).to_string();
      fetch::fetch_with_method(ctx, self, Method::PUT, &url, Some(&payload), &[], false)?;
      Ok(())
   }

   fn issue_set_title(&self, ctx: &Context, path: &Path, title: &str) -> Result<()> {
      let id = bug_id(path)?;
      let mut url = rest_url(ctx, &format!("/bug/{id}"));
      append_key(ctx, &mut url);
      let payload = serde_json::json!({ "summary": title }).to_string();
      fetch::fetch_with_method(ctx, self, Method::PUT, &url, Some(&payload), &[], false)?;
      Ok(())
   }

   fn get_issue_comments(&self, ctx: &Context, path: &Path, _max: FetchLimit) -> Result<Vec<Comment>> {
      let id = bug_id(path)?;
      let mut url = rest_url(ctx, &format!("/bug/{id}/comment"));
      append_key(ctx, &mut url);
      let body = fetch::fetch_one(ctx, self, &url, None)?;
      let mut parsed: BzCommentsBody = serde_json::from_str(&body)?;
      Ok(
         parsed
            .bugs
            .remove(&id.to_string())
            .map(|b| b.comments.into_iter().map(Into::into).collect())
            .unwrap_or_default(),
      )
   }

   fn get_comment(
      &self,
      ctx: &Context,
      _path: &Path,
      _target_type: CommentTarget,
      comment_id: u64,
   ) -> Result<Comment> {
      let mut url = rest_url(ctx, &format!("/bug/comment/{comment_id}"));
      append_key(ctx, &mut url);
      let body = fetch::fetch_one(ctx, self, &url, None)?;
      let parsed: serde_json::Value = serde_json::from_str(&body)?;
      let comments = parsed["comments"]
         .as_object()
         .ok_or_else(|| GcliError::data("no such comment"))?;
      let raw = comments
         .values()
         .next()
         .ok_or_else(|| GcliError::data(format!("no such comment #{comment_id}")))?;
      let comment: BzComment = serde_json::from_value(raw.clone())?;
      Ok(comment.into())
   }

   fn perform_submit_comment(&self, ctx: &Context, opts: &SubmitCommentOpts) -> Result<Comment> {
      let id = bug_id(&opts.target)?;
      let mut url = rest_url(ctx, &format!("/bug/{id}/comment"));
      append_key(ctx, &mut url);
      let payload = serde_json::json!({ "comment": opts.message }).to_string();
      fetch::fetch_with_method(ctx, self, Method::POST, &url, Some(&payload), &[], false)?;
      Ok(Comment { id: 0, author: String::new(), date: Utc::now(), body: opts.message.clone() })
   }
}

fn patch_bug_status(ctx: &Context, forge: &dyn Forge, path: &Path, status: &str) -> Result<()> {
   let id = bug_id(path)?;
   let mut url = rest_url(ctx, &format!("/bug/{id}"));
   append_key(ctx, &mut url);
   let payload = serde_json::json!({ "status": status }).to_string();
   fetch::fetch_with_method(ctx, forge, Method::PUT, &url, Some(&payload), &[], false)?;
   Ok(())
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn get_authheader_is_empty_auth_goes_via_query_param() {
      let ctx = Context::new(crate::config::Account {
         forge_type: crate::types::ForgeKind::Bugzilla,
         api_base:   "https://bugzilla.example".into(),
         token:      "secret".into(),
         default:    true,
      });
      assert_eq!(Bugzilla.get_authheader(&ctx), "");
   }

   #[test]
   fn append_key_picks_the_right_separator() {
      let ctx = Context::new(crate::config::Account {
         forge_type: crate::types::ForgeKind::Bugzilla,
         api_base:   "https://bugzilla.example".into(),
         token:      "secret".into(),
         default:    true,
      });
      let mut plain = "https://bugzilla.example/rest/bug".to_string();
      append_key(&ctx, &mut plain);
      assert_eq!(plain, "https://bugzilla.example/rest/bug?api_key=secret");

      let mut with_query = "https://bugzilla.example/rest/bug?product=Core".to_string();
      append_key(&ctx, &mut with_query);
      assert_eq!(with_query, "https://bugzilla.example/rest/bug?product=Core&api_key=secret");
   }

   #[test]
   fn bug_id_accepts_id_path_and_nonzero_default_id() {
      assert_eq!(bug_id(&Path::Id(42)).unwrap(), 42);
      assert_eq!(bug_id(&Path::default("", "", 7)).unwrap(), 7);
      assert!(bug_id(&Path::Bugzilla { product: "Core".into(), component: "Layout".into() }).is_err());
   }
}
