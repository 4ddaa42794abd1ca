//! Pull request facade (§4.6), verb table grounded on `src/cmd/pulls.c`'s
//! `pull_actions` table, plus `submit`/`review` for pull creation and the
//! review session.
//!
//! `merge` and `milestone` consume an optional extra token the way the
//! source does. `checkout` needs the fetched item here even though the
//! source's table marks it `needs_item = false`, because `pull_checkout`
//! takes the pull's head branch label rather than just a path. `review` is
//! deliberately absent from the verb table below — it needs a prompt and an
//! editor invocation, which the `'static`, closure-free `Action` handler has
//! no room for — so `main.rs` dispatches straight to the `review` function
//! with its own terminal-facing closures instead of going through
//! `action_table`/`run_chain`.

use crate::actions::{Action, Fetchable, run_chain};
use crate::capability::{Forge, PullSubmitOpts};
use crate::context::Context;
use crate::error::{GcliError, Result};
use crate::path::Path;
use crate::review::{ReviewCache, ReviewOutcome, edit_diff};
use crate::types::{FetchLimit, MergeFlags, PullRequest, QuirkMask, SearchFilters};

/// Lists pull requests matching `filters`, up to `max`.
pub fn search(
   ctx: &Context,
   forge: &dyn Forge,
   path: &Path,
   filters: &SearchFilters,
   max: FetchLimit,
) -> Result<Vec<PullRequest>> {
   forge.search_pulls(ctx, path, filters, max)
}

/// Submits a new pull request (§4.6). Refuses automerge before the creation
/// POST on a backend whose quirks don't advertise support for it.
pub fn submit(ctx: &Context, forge: &dyn Forge, opts: &PullSubmitOpts) -> Result<PullRequest> {
   if opts.automerge && !forge.quirks().has(QuirkMask::HAS_AUTOMERGE) {
      return Err(GcliError::data("forge does not support auto-merge"));
   }
   forge.perform_submit_pull(ctx, opts)
}

struct PullFetcher;

impl Fetchable for PullFetcher {
   type Item = PullRequest;

   fn fetch(&self, ctx: &Context, forge: &dyn Forge, path: &Path) -> Result<PullRequest> {
      forge.get_pull(ctx, path)
   }
}

fn summary_line(pull: &PullRequest) -> String {
   format!(
      "pull #{}: {} [{}]{}",
      pull.number,
      pull.title,
      pull.state,
      if pull.merged { " (merged)" } else { "" }
   )
}

fn require_item<'a>(item: &'a Option<PullRequest>, verb: &str) -> Result<&'a PullRequest> {
   item.as_ref().ok_or_else(|| GcliError::data(format!("no pull fetched for '{verb}'")))
}

fn parse_labels_options(args: &mut Vec<String>) -> Result<(Vec<String>, Vec<String>)> {
   if args.is_empty() {
      return Err(GcliError::usage("expected label action"));
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

/// Builds the verb table for the `pulls` resource (§6's pull vocabulary).
#[must_use]
pub fn action_table() -> Vec<Action<PullRequest>> {
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
      Action::new("commits", false, |ctx, forge, path, _, _| {
         let commits = forge.get_pull_commits(ctx, path)?;
         Ok(Some(
            commits.iter().map(|c| format!("{} {}", c.short_sha, c.message)).collect::<Vec<_>>().join("\n"),
         ))
      }),
      Action::new("diff", false, |ctx, forge, path, _, _| {
         Ok(Some(forge.pull_get_diff(ctx, path)?))
      }),
      Action::new("patch", false, |ctx, forge, path, _, _| {
         Ok(Some(forge.pull_get_patch(ctx, path)?))
      }),
      Action::new("comments", false, |ctx, forge, path, _, _| {
         let comments = forge.get_pull_comments(ctx, path, FetchLimit::All)?;
         Ok(Some(
            comments.iter().map(|c| format!("#{} @{}: {}", c.id, c.author, c.body)).collect::<Vec<_>>().join("\n"),
         ))
      }),
      Action::new("notes", false, |ctx, forge, path, _, _| {
         let comments = forge.get_pull_comments(ctx, path, FetchLimit::All)?;
         Ok(Some(
            comments.iter().map(|c| format!("#{} @{}: {}", c.id, c.author, c.body)).collect::<Vec<_>>().join("\n"),
         ))
      }),
      Action::new("ci", false, |ctx, forge, path, _, _| {
         let checks = forge.pull_get_checks(ctx, path)?;
         Ok(Some(
            checks.iter().map(|p| format!("{} {}", p.ref_name, p.status)).collect::<Vec<_>>().join("\n"),
         ))
      }),
      Action::new("merge", false, |ctx, forge, path, _, args| {
         let mut flags = MergeFlags::DELETEHEAD;
         if let Some(word) = args.first() {
            match word.as_str() {
               "-s" | "--squash" => {
                  args.remove(0);
                  flags = flags | MergeFlags::SQUASH;
               },
               "-D" | "--inhibit-delete" => {
                  args.remove(0);
                  flags = MergeFlags::default();
               },
               _ => {},
            }
         }
         forge.pull_merge(ctx, path, flags)?;
         Ok(Some("merged".into()))
      }),
      Action::new("close", false, |ctx, forge, path, _, _| {
         forge.pull_close(ctx, path)?;
         Ok(Some("closed".into()))
      }),
      Action::new("reopen", false, |ctx, forge, path, _, _| {
         forge.pull_reopen(ctx, path)?;
         Ok(Some("reopened".into()))
      }),
      Action::new("labels", false, |ctx, forge, path, _, args| {
         let (add, remove) = parse_labels_options(args)?;
         if !add.is_empty() {
            forge.pull_add_labels(ctx, path, &add)?;
         }
         if !remove.is_empty() {
            forge.pull_remove_labels(ctx, path, &remove)?;
         }
         Ok(Some(format!("labels: +{add:?} -{remove:?}")))
      }),
      Action::new("milestone", false, |ctx, forge, path, _, args| {
         if args.is_empty() {
            return Err(GcliError::usage("missing arguments to milestone action"));
         }
         let token = args.remove(0);
         if token == "-d" {
            forge.pull_clear_milestone(ctx, path)?;
            return Ok(Some("milestone cleared".into()));
         }
         let id: u64 =
            token.parse().map_err(|_| GcliError::data(format!("cannot parse milestone id »{token}«")))?;
         forge.pull_set_milestone(ctx, path, id)?;
         Ok(Some(format!("milestone set to {id}")))
      }),
      Action::new("request-review", false, |ctx, forge, path, _, args| {
         if args.is_empty() {
            return Err(GcliError::usage("missing user name for reviewer"));
         }
         let reviewer = args.remove(0);
         forge.pull_add_reviewer(ctx, path, &reviewer)?;
         Ok(Some(format!("review requested from {reviewer}")))
      }),
      Action::new("title", false, |ctx, forge, path, _, args| {
         if args.is_empty() {
            return Err(GcliError::usage("missing title"));
         }
         let title = args.remove(0);
         forge.pull_set_title(ctx, path, &title)?;
         Ok(Some(format!("title set to {title}")))
      }),
      Action::new("checkout", true, |ctx, forge, path, item, _| {
         let pull = require_item(item, "checkout")?;
         forge.pull_checkout(ctx, pull)?;
         Ok(Some(format!("checked out {}", path.owner_repo().map_or_else(String::new, |(o, r)| format!("{o}/{r}")))))
      }),
   ]
}

/// Runs a chain of pull-request actions on `path`, per §4.7.
pub fn run(ctx: &Context, forge: &dyn Forge, path: &Path, args: Vec<String>) -> Result<Vec<String>> {
   run_chain(ctx, forge, path, &PullFetcher, &action_table(), args)
}

/// Drives a full review session (§4.9): ensures the cached diff, hands it to
/// the caller to edit and annotate, then submits or postpones depending on
/// the chosen outcome. `open_editor` and `ask_outcome` are injected the same
/// way `confirm_restart` is in [`crate::review::edit_diff`], so this
/// function never touches a terminal.
pub fn review(
   ctx: &Context,
   forge: &dyn Forge,
   path: &Path,
   pull: &PullRequest,
   confirm_restart: &mut dyn FnMut() -> bool,
   open_editor: &mut dyn FnMut(&std::path::Path) -> Result<()>,
   ask_outcome: &mut dyn FnMut() -> ReviewOutcome,
) -> Result<Vec<String>> {
   let (owner, repo) =
      path.owner_repo().ok_or_else(|| GcliError::usage("review needs an owner/repo path"))?;
   let cache = ReviewCache::for_pull(owner, repo, pull.number)?;
   edit_diff(&cache, ctx, forge, path, confirm_restart)?;
   open_editor(cache.path())?;
   let series_text = cache.read()?;
   let outcome = ask_outcome();
   match crate::review::build_submission(&series_text, outcome)? {
      Some(submission) => {
         forge.pull_create_review(ctx, path, &submission)?;
         cache.remove()?;
         Ok(vec!["review submitted".into()])
      },
      None => Ok(vec!["review postponed".into()]),
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn merge_defaults_to_deletehead_without_squash() {
      let table = action_table();
      assert!(table.iter().any(|a| a.name == "merge" && !a.needs_item));
   }

   #[test]
   fn request_review_needs_no_fetched_item() {
      let table = action_table();
      assert!(!table.iter().find(|a| a.name == "request-review").unwrap().needs_item);
   }

   #[test]
   fn checkout_needs_the_fetched_item_here_unlike_the_source() {
      // `pull_checkout` takes a `PullRequest` (for its head branch label),
      // not just a path, so this port fetches eagerly where the original
      // didn't have to.
      let table = action_table();
      assert!(table.iter().find(|a| a.name == "checkout").unwrap().needs_item);
   }

   #[test]
   fn review_is_not_part_of_the_generic_action_table() {
      // The review session is interactive (editor, outcome prompt) and is
      // dispatched directly by the caller instead, via `review()`.
      let table = action_table();
      assert!(table.iter().all(|a| a.name != "review"));
   }

   #[test]
   fn milestone_with_unparsable_id_is_a_data_error_not_usage() {
      let mut args = vec!["not-a-number".to_string()];
      let table = action_table();
      let milestone = table.iter().find(|a| a.name == "milestone").unwrap();
      let ctx = Context::new(crate::config::Account {
         forge_type: crate::types::ForgeKind::GitHub,
         api_base:   String::new(),
         token:      "t".into(),
         default:    true,
      });
      let forge = crate::forges::for_kind(crate::types::ForgeKind::GitHub);
      let path = Path::default("o", "r", 1);
      let mut item = None;
      let err = (milestone.handler)(&ctx, forge.as_ref(), &path, &mut item, &mut args).unwrap_err();
      assert_eq!(err.exit_code(), crate::error::EXIT_DATA);
   }

   fn test_ctx() -> Context {
      Context::new(crate::config::Account {
         forge_type: crate::types::ForgeKind::GitHub,
         api_base:   String::new(),
         token:      "t".into(),
         default:    true,
      })
   }

   fn sample_pull(number: u64) -> PullRequest {
      PullRequest {
         number,
         node_id: String::new(),
         title: "sample".into(),
         body: String::new(),
         author: String::new(),
         state: "open".into(),
         created_at: chrono::Utc::now(),
         head_label: String::new(),
         base_label: String::new(),
         head_sha: String::new(),
         base_sha: String::new(),
         start_sha: String::new(),
         milestone: None,
         comments: 0,
         additions: 0,
         deletions: 0,
         commits: 0,
         changed_files: 0,
         coverage: None,
         web_url: String::new(),
         labels: vec![],
         reviewers: vec![],
         merged: false,
         mergeable: false,
         draft: false,
         automerge: false,
      }
   }

   struct RecordingForge {
      quirks: QuirkMask,
      called: std::cell::Cell<bool>,
   }

   impl Forge for RecordingForge {
      fn quirks(&self) -> QuirkMask {
         self.quirks
      }

      fn perform_submit_pull(&self, _ctx: &Context, _opts: &PullSubmitOpts) -> Result<PullRequest> {
         self.called.set(true);
         Ok(sample_pull(1))
      }
   }

   #[test]
   fn submit_refuses_automerge_before_any_network_call_when_quirks_forbid_it() {
      // Scenario 6: a backend whose quirks forbid automerge refuses the
      // whole request before the creation POST, not just the follow-up.
      let forge = RecordingForge { quirks: QuirkMask::NONE, called: std::cell::Cell::new(false) };
      let ctx = test_ctx();
      let opts = PullSubmitOpts { automerge: true, ..PullSubmitOpts::default() };
      let err = submit(&ctx, &forge, &opts).unwrap_err();
      assert_eq!(err.exit_code(), crate::error::EXIT_DATA);
      assert!(!forge.called.get(), "perform_submit_pull must not run once automerge is refused");
   }

   #[test]
   fn submit_proceeds_when_quirks_advertise_automerge_support() {
      let forge = RecordingForge { quirks: QuirkMask::HAS_AUTOMERGE, called: std::cell::Cell::new(false) };
      let ctx = test_ctx();
      let opts = PullSubmitOpts { automerge: true, ..PullSubmitOpts::default() };
      submit(&ctx, &forge, &opts).unwrap();
      assert!(forge.called.get());
   }

   #[test]
   fn submit_without_automerge_ignores_quirks() {
      let forge = RecordingForge { quirks: QuirkMask::NONE, called: std::cell::Cell::new(false) };
      let ctx = test_ctx();
      let opts = PullSubmitOpts::default();
      submit(&ctx, &forge, &opts).unwrap();
      assert!(forge.called.get());
   }

   const SAMPLE_PATCH: &str = "GCLI: base_sha aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\n\
From bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb Mon Sep 17 00:00:00 2001\n\
From: a <a@example.com>\nDate: Mon, 1 Jan 2024 00:00:00 +0000\nSubject: [PATCH] x\n\n\
body\n---\n stat\n\n\
diff --git a/f b/f\n--- a/f\n+++ b/f\n@@ -1 +1 @@\n-x\n+y\n> note\n";

   struct ReviewRecordingForge {
      reviewed: std::cell::Cell<bool>,
   }

   impl Forge for ReviewRecordingForge {
      fn pull_get_patch(&self, _ctx: &Context, _path: &Path) -> Result<String> {
         Ok(SAMPLE_PATCH.to_string())
      }

      fn pull_create_review(
         &self,
         _ctx: &Context,
         _path: &Path,
         _submission: &crate::review::ReviewSubmission,
      ) -> Result<()> {
         self.reviewed.set(true);
         Ok(())
      }
   }

   /// Points HOME at a scratch directory for the duration of one test, so
   /// the review cache never touches the real user cache.
   fn with_scratch_home<T>(suffix: &str, body: impl FnOnce() -> T) -> T {
      let dir = std::env::temp_dir().join(format!("gcli-review-test-{}-{suffix}", std::process::id()));
      std::fs::create_dir_all(&dir).unwrap();
      // SAFETY: single-threaded test process, no concurrent env access.
      unsafe {
         std::env::set_var("HOME", &dir);
      }
      let result = body();
      std::fs::remove_dir_all(&dir).ok();
      result
   }

   #[test]
   fn review_accept_submits_and_clears_the_cache() {
      with_scratch_home("accept", || {
         let ctx = test_ctx();
         let forge = ReviewRecordingForge { reviewed: std::cell::Cell::new(false) };
         let path = Path::default("o", "r", 7);
         let pull = sample_pull(7);
         let lines = review(
            &ctx,
            &forge,
            &path,
            &pull,
            &mut || true,
            &mut |_| Ok(()),
            &mut || ReviewOutcome::Accept,
         )
         .unwrap();
         assert_eq!(lines, vec!["review submitted".to_string()]);
         assert!(forge.reviewed.get());
         assert!(!ReviewCache::for_pull("o", "r", 7).unwrap().exists());
      });
   }

   #[test]
   fn review_postpone_never_submits_and_keeps_the_cache() {
      with_scratch_home("postpone", || {
         let ctx = test_ctx();
         let forge = ReviewRecordingForge { reviewed: std::cell::Cell::new(false) };
         let path = Path::default("o", "r", 8);
         let pull = sample_pull(8);
         let lines = review(
            &ctx,
            &forge,
            &path,
            &pull,
            &mut || true,
            &mut |_| Ok(()),
            &mut || ReviewOutcome::Postpone,
         )
         .unwrap();
         assert_eq!(lines, vec!["review postponed".to_string()]);
         assert!(!forge.reviewed.get());
         assert!(ReviewCache::for_pull("o", "r", 8).unwrap().exists());
      });
   }
}
