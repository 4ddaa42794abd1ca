//! Milestone facade (§4.6), verb table grounded on `src/cmd/milestones.c`'s
//! `milestone_actions` table.
//!
//! The milestone id travels inside [`Path`] the same way an issue/pull
//! number does; [`milestone_id`] extracts it.

use chrono::{DateTime, Utc};

use crate::actions::{Action, Fetchable, run_chain};
use crate::capability::Forge;
use crate::context::Context;
use crate::error::{GcliError, Result};
use crate::path::Path;
use crate::types::{FetchLimit, Milestone};

fn milestone_id(path: &Path) -> Result<u64> {
   path.id().ok_or_else(|| GcliError::usage("milestones require a numeric id"))
}

/// Lists milestones for the repo named by `path`, up to `max`.
pub fn search(ctx: &Context, forge: &dyn Forge, path: &Path, max: FetchLimit) -> Result<Vec<Milestone>> {
   forge.get_milestones(ctx, path, max)
}

struct MilestoneFetcher;

impl Fetchable for MilestoneFetcher {
   type Item = Milestone;

   fn fetch(&self, ctx: &Context, forge: &dyn Forge, path: &Path) -> Result<Milestone> {
      forge.get_milestone(ctx, path, milestone_id(path)?)
   }
}

fn summary_line(milestone: &Milestone) -> String {
   format!("milestone #{}: {} [{}]", milestone.id, milestone.title, milestone.state)
}

fn require_item<'a>(item: &'a Option<Milestone>, verb: &str) -> Result<&'a Milestone> {
   item.as_ref().ok_or_else(|| GcliError::data(format!("no milestone fetched for '{verb}'")))
}

/// Builds the verb table for the `milestones` resource (§6's vocabulary).
#[must_use]
pub fn action_table() -> Vec<Action<Milestone>> {
   vec![
      Action::new("all", true, |_, _, _, item, _| {
         Ok(Some(summary_line(require_item(item, "all")?)))
      }),
      Action::new("status", true, |_, _, _, item, _| {
         Ok(Some(summary_line(require_item(item, "status")?)))
      }),
      Action::new("issues", false, |ctx, forge, path, _, _| {
         let issues = forge.milestone_get_issues(ctx, path, milestone_id(path)?, FetchLimit::All)?;
         Ok(Some(
            issues.iter().map(|i| format!("#{} {}", i.number, i.title)).collect::<Vec<_>>().join("\n"),
         ))
      }),
      Action::new("delete", false, |ctx, forge, path, _, _| {
         forge.delete_milestone(ctx, path, milestone_id(path)?)?;
         Ok(Some("deleted".into()))
      }),
      Action::new("set-duedate", false, |ctx, forge, path, _, args| {
         if args.is_empty() {
            return Err(GcliError::usage("missing date for set-duedate"));
         }
         let raw = args.remove(0);
         let due: DateTime<Utc> = raw
            .parse()
            .map_err(|_| GcliError::data(format!("could not parse due date »{raw}«")))?;
         forge.milestone_set_duedate(ctx, path, milestone_id(path)?, due)?;
         Ok(Some(format!("due date set to {raw}")))
      }),
      Action::new("open", true, |_, _, _, item, _| {
         Ok(Some(require_item(item, "open")?.web_url.clone()))
      }),
   ]
}

/// Runs a chain of milestone actions on `path`, per §4.7.
pub fn run(ctx: &Context, forge: &dyn Forge, path: &Path, args: Vec<String>) -> Result<Vec<String>> {
   run_chain(ctx, forge, path, &MilestoneFetcher, &action_table(), args)
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn milestone_id_requires_a_numeric_path() {
      assert!(milestone_id(&Path::Url("https://x".into())).is_err());
      assert_eq!(milestone_id(&Path::Id(7)).unwrap(), 7);
      assert_eq!(milestone_id(&Path::default("o", "r", 3)).unwrap(), 3);
   }

   #[test]
   fn issues_and_delete_and_set_duedate_need_no_fetched_item() {
      let table = action_table();
      for name in ["issues", "delete", "set-duedate"] {
         assert!(!table.iter().find(|a| a.name == name).unwrap().needs_item);
      }
   }

   #[test]
   fn all_status_and_open_need_the_fetched_item() {
      let table = action_table();
      for name in ["all", "status", "open"] {
         assert!(table.iter().find(|a| a.name == name).unwrap().needs_item);
      }
   }
}
