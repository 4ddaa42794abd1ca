//! Issue facade (§4.6), verb table grounded on `src/cmd/issues.c`'s
//! `issue_actions` table.
//!
//! `all` and `status` are distinct entries in the source table but share one
//! handler (`gcli_issue_print_summary`) — the "all" name is a historical
//! leftover, not a different view. `notes` is a bare alias for `comments`.
//! `open` returns the issue's web URL rather than spawning a browser, since
//! launching one is out of scope here.

use crate::actions::{Action, Fetchable, run_chain};
use crate::capability::Forge;
use crate::context::Context;
use crate::error::{GcliError, Result};
use crate::path::Path;
use crate::types::{FetchLimit, Issue, SearchFilters};

/// Lists issues matching `filters`, up to `max`. The path must already be
/// sanitised by the caller (§4.6's "adjusts the path" step).
pub fn search(
   ctx: &Context,
   forge: &dyn Forge,
   path: &Path,
   filters: &SearchFilters,
   max: FetchLimit,
) -> Result<Vec<Issue>> {
   forge.search_issues(ctx, path, filters, max)
}

struct IssueFetcher;

impl Fetchable for IssueFetcher {
   type Item = Issue;

   fn fetch(&self, ctx: &Context, forge: &dyn Forge, path: &Path) -> Result<Issue> {
      forge.get_issue(ctx, path)
   }
}

fn summary_line(issue: &Issue) -> String {
   format!("issue #{}: {} [{}]", issue.number, issue.title, issue.state)
}

fn require_item<'a>(item: &'a Option<Issue>, verb: &str) -> Result<&'a Issue> {
   item.as_ref().ok_or_else(|| GcliError::data(format!("no issue fetched for '{verb}'")))
}

fn parse_labels_options(args: &mut Vec<String>) -> Result<(Vec<String>, Vec<String>)> {
   if args.is_empty() {
      return Err(GcliError::usage("expected label operations"));
   }

   let mut add = Vec::new();
   let mut remove = Vec::new();
   let mut target: Option<&mut Vec<String>> = None;

   while let Some(tok) = args.first() {
      match tok.as_str() {
         "add" => {
            args.remove(0);
            target = Some(&mut add);
         },
         "remove" => {
            args.remove(0);
            target = Some(&mut remove);
         },
         _ => match &mut target {
            Some(bucket) => bucket.push(args.remove(0)),
            None => return Err(GcliError::usage("expected 'add' or 'remove' before a label name")),
         },
      }
   }

   Ok((add, remove))
}

/// Builds the verb table for the `issues` resource (§6's issue vocabulary).
#[must_use]
pub fn action_table() -> Vec<Action<Issue>> {
   vec![
      Action::new("all", true, |_, _, _, item, _| {
         Ok(Some(summary_line(require_item(item, "all")?)))
      }),
      Action::new("status", true, |_, _, _, item, _| {
         Ok(Some(summary_line(require_item(item, "status")?)))
      }),
      Action::new("op", true, |_, _, _, item, _| {
         Ok(Some(require_item(item, "op")?.body.clone()))
      }),
      Action::new("comments", false, |ctx, forge, path, _, _| {
         let comments = forge.get_issue_comments(ctx, path, FetchLimit::All)?;
         Ok(Some(
            comments.iter().map(|c| format!("#{} @{}: {}", c.id, c.author, c.body)).collect::<Vec<_>>().join("\n"),
         ))
      }),
      Action::new("notes", false, |ctx, forge, path, _, _| {
         let comments = forge.get_issue_comments(ctx, path, FetchLimit::All)?;
         Ok(Some(
            comments.iter().map(|c| format!("#{} @{}: {}", c.id, c.author, c.body)).collect::<Vec<_>>().join("\n"),
         ))
      }),
      Action::new("close", false, |ctx, forge, path, _, _| {
         forge.issue_close(ctx, path)?;
         Ok(Some("closed".into()))
      }),
      Action::new("reopen", false, |ctx, forge, path, _, _| {
         forge.issue_reopen(ctx, path)?;
         Ok(Some("reopened".into()))
      }),
      Action::new("assign", false, |ctx, forge, path, _, args| {
         if args.is_empty() {
            return Err(GcliError::usage("missing assignee"));
         }
         let assignee = args.remove(0);
         forge.issue_assign(ctx, path, &assignee)?;
         Ok(Some(format!("assigned to {assignee}")))
      }),
      Action::new("labels", false, |ctx, forge, path, _, args| {
         let (add, remove) = parse_labels_options(args)?;
         if !add.is_empty() {
            forge.issue_add_labels(ctx, path, &add)?;
         }
         if !remove.is_empty() {
            forge.issue_remove_labels(ctx, path, &remove)?;
         }
         Ok(Some(format!("labels: +{add:?} -{remove:?}")))
      }),
      Action::new("milestone", false, |ctx, forge, path, _, args| {
         if args.is_empty() {
            return Err(GcliError::usage("missing milestone id"));
         }
         let token = args.remove(0);
         if token == "-d" {
            forge.issue_clear_milestone(ctx, path)?;
            return Ok(Some("milestone cleared".into()));
         }
         let id: u64 =
            token.parse().map_err(|_| GcliError::usage("could not parse milestone id"))?;
         forge.issue_set_milestone(ctx, path, id)?;
         Ok(Some(format!("milestone set to {id}")))
      }),
      Action::new("title", false, |ctx, forge, path, _, args| {
         if args.is_empty() {
            return Err(GcliError::usage("missing new title"));
         }
         let title = args.remove(0);
         forge.issue_set_title(ctx, path, &title)?;
         Ok(Some(format!("title set to {title}")))
      }),
      Action::new("attachments", false, |ctx, forge, path, _, _| {
         let names = forge.issue_get_attachments(ctx, path)?;
         Ok(Some(names.join("\n")))
      }),
      Action::new("open", true, |_, _, _, item, _| {
         Ok(Some(require_item(item, "open")?.url.clone()))
      }),
   ]
}

/// Runs a chain of issue actions on `path`, per §4.7.
pub fn run(ctx: &Context, forge: &dyn Forge, path: &Path, args: Vec<String>) -> Result<Vec<String>> {
   run_chain(ctx, forge, path, &IssueFetcher, &action_table(), args)
}

#[cfg(test)]
mod tests {
   use super::*;
   use chrono::Utc;

   fn issue() -> Issue {
      Issue {
         number: 1,
         title: "t".into(),
         body: "the body".into(),
         author: "a".into(),
         state: "open".into(),
         created_at: Utc::now(),
         comments_count: 0,
         locked: false,
         url: "https://example.com/issues/1".into(),
         product: String::new(),
         component: String::new(),
         milestone: None,
         labels: Vec::new(),
         assignees: Vec::new(),
         is_pr: false,
      }
   }

   #[test]
   fn summary_line_includes_number_title_and_state() {
      let line = summary_line(&issue());
      assert!(line.contains('1'));
      assert!(line.contains('t'));
      assert!(line.contains("open"));
   }

   #[test]
   fn labels_with_no_tokens_is_a_usage_error() {
      let mut args = Vec::new();
      let err = parse_labels_options(&mut args).unwrap_err();
      assert_eq!(err.exit_code(), crate::error::EXIT_USAGE);
   }

   #[test]
   fn labels_splits_add_and_remove_groups() {
      let mut args: Vec<String> =
         vec!["add", "bug", "wontfix", "remove", "stale"].into_iter().map(String::from).collect();
      let (add, remove) = parse_labels_options(&mut args).unwrap();
      assert_eq!(add, vec!["bug".to_string(), "wontfix".to_string()]);
      assert_eq!(remove, vec!["stale".to_string()]);
   }

   #[test]
   fn labels_rejects_a_bare_name_before_any_group_keyword() {
      let mut args: Vec<String> = vec!["bug".to_string()];
      let err = parse_labels_options(&mut args).unwrap_err();
      assert_eq!(err.exit_code(), crate::error::EXIT_USAGE);
   }

   #[test]
   fn milestone_dash_d_clears_without_touching_set() {
      let table = action_table();
      let milestone = table.iter().find(|a| a.name == "milestone").unwrap();
      assert!(!milestone.needs_item);
   }

   #[test]
   fn op_and_all_and_status_need_the_fetched_item() {
      let table = action_table();
      for name in ["op", "all", "status", "open"] {
         assert!(table.iter().find(|a| a.name == name).unwrap().needs_item, "{name} should need item");
      }
      for name in ["comments", "notes", "close", "reopen", "assign", "labels", "title", "attachments"] {
         assert!(!table.iter().find(|a| a.name == name).unwrap().needs_item, "{name} should not need item");
      }
   }
}
