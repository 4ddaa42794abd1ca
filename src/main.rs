//! Command-line edge: parses arguments, builds a [`Context`], and hands the
//! remaining verbs off to the domain facade / action-chain engine. This is
//! the only place in the crate allowed to print — the library itself stays
//! silent (see `style.rs`'s doc comment).

use std::io::Write;

use clap::{Parser, Subcommand};
use gcli::capability::{Forge, PullSubmitOpts};
use gcli::path::{self, NoInference};
use gcli::review::ReviewOutcome;
use gcli::types::{FetchLimit, ForgeKind, SearchFilters};
use gcli::{Context, GcliConfig, Path, facade, forges, style};

/// Command-line workbench dispatching issue/pull/milestone/pipeline/job
/// actions across GitHub, GitLab, Gitea, and Bugzilla-like forges.
#[derive(Parser)]
#[command(name = "gcli", version, about)]
struct Args {
   /// Repository owner (user or org/group), or Bugzilla product.
   #[arg(short = 'o', long, global = true)]
   owner: Option<String>,

   /// Repository name, or Bugzilla component.
   #[arg(short = 'r', long, global = true)]
   repo: Option<String>,

   /// Numeric id of the item (issue/pull/milestone/pipeline/job number).
   #[arg(short = 'i', long, global = true)]
   id: Option<u64>,

   /// Account name from the config file; defaults to the configured default.
   #[arg(short = 'a', long, global = true)]
   account: Option<String>,

   /// Include closed/merged items when listing.
   #[arg(long, global = true)]
   all: bool,

   #[command(subcommand)]
   resource: Resource,
}

#[derive(Subcommand)]
enum Resource {
   /// Search or act on issues.
   Issues {
      #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
      actions: Vec<String>,
   },
   /// Search or act on pull/merge requests.
   Pulls {
      #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
      actions: Vec<String>,
   },
   /// Open a new pull/merge request.
   PullCreate {
      #[arg(long)]
      title: String,
      #[arg(long, default_value = "")]
      body: String,
      #[arg(long)]
      head: String,
      #[arg(long)]
      base: String,
      #[arg(long = "label")]
      labels: Vec<String>,
      #[arg(long = "reviewer")]
      reviewers: Vec<String>,
      #[arg(long)]
      automerge: bool,
   },
   /// Search or act on milestones.
   Milestones {
      #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
      actions: Vec<String>,
   },
   /// Search or act on GitLab pipelines.
   Pipelines {
      #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
      actions: Vec<String>,
   },
   /// Act on a single GitLab job (`-i` names the job id).
   Jobs {
      #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
      actions: Vec<String>,
   },
   /// List labels on a repository.
   Labels,
   /// List or create forks.
   Forks {
      #[arg(long)]
      create: bool,
   },
   /// List repositories for an owner, or the active account's own.
   Repos,
   /// List the active account's notifications.
   Notifications,
   /// List the active account's SSH keys.
   SshKeys,
}

/// Builds and sanitises the path named by `-o`/`-r`/`-i`, per §4.6's "adjusts
/// the path when necessary" step.
fn resolve_path(args: &Args, forge: ForgeKind) -> gcli::error::Result<Path> {
   let raw = Path::default(
      args.owner.clone().unwrap_or_default(),
      args.repo.clone().unwrap_or_default(),
      args.id.unwrap_or(0),
   );
   path::sanitise(raw, forge, &NoInference)
}

/// Asks whether to restart an in-progress review rather than resume the
/// cached diff. The only place in the crate allowed to prompt a terminal.
fn prompt_confirm_restart() -> bool {
   eprint!("a cached review is already in progress; start over? [y/N] ");
   std::io::stderr().flush().ok();
   let mut line = String::new();
   std::io::stdin().read_line(&mut line).ok();
   matches!(line.trim(), "y" | "Y")
}

/// Opens `$EDITOR` (falling back to `vi`) on the cached diff.
fn prompt_open_editor(path: &std::path::Path) -> gcli::error::Result<()> {
   let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
   let status = std::process::Command::new(editor)
      .arg(path)
      .status()
      .map_err(|e| gcli::GcliError::usage(format!("failed to launch editor: {e}")))?;
   if !status.success() {
      return Err(gcli::GcliError::usage("editor exited with a non-zero status"));
   }
   Ok(())
}

/// Loops on a single-character outcome prompt; EOF postpones the review
/// rather than aborting, unlike the source's `ask_for_review_state`.
fn prompt_ask_outcome() -> ReviewOutcome {
   loop {
      eprint!("accept/request-changes/comment/postpone? [a/r/c/p] ");
      std::io::stderr().flush().ok();
      let mut line = String::new();
      if std::io::stdin().read_line(&mut line).unwrap_or(0) == 0 {
         return ReviewOutcome::Postpone;
      }
      match line.trim() {
         "a" => return ReviewOutcome::Accept,
         "r" => return ReviewOutcome::RequestChanges,
         "c" => return ReviewOutcome::Comment,
         "p" => return ReviewOutcome::Postpone,
         _ => continue,
      }
   }
}

fn run(args: Args) -> gcli::error::Result<Vec<String>> {
   let config = GcliConfig::load()?;
   let account = config.resolve_account(args.account.as_deref())?;
   let ctx = Context::new(account);
   let forge_obj = forges::for_kind(ctx.forge());
   let forge: &dyn Forge = forge_obj.as_ref();
   let path = resolve_path(&args, ctx.forge())?;
   let filters = SearchFilters { all: args.all, ..SearchFilters::default() };
   let max = FetchLimit::All;

   match args.resource {
      Resource::Issues { actions } if actions.is_empty() => {
         let issues = facade::issues::search(&ctx, forge, &path, &filters, max)?;
         Ok(issues.iter().map(|i| format!("#{} {} [{}]", i.number, i.title, i.state)).collect())
      },
      Resource::Issues { actions } => facade::issues::run(&ctx, forge, &path, actions),

      Resource::Pulls { actions } if actions.is_empty() => {
         let pulls = facade::pulls::search(&ctx, forge, &path, &filters, max)?;
         Ok(pulls.iter().map(|p| format!("#{} {} [{}]", p.number, p.title, p.state)).collect())
      },
      Resource::Pulls { actions } if actions.first().map(String::as_str) == Some("review") => {
         let pull = forge.get_pull(&ctx, &path)?;
         facade::pulls::review(
            &ctx,
            forge,
            &path,
            &pull,
            &mut prompt_confirm_restart,
            &mut prompt_open_editor,
            &mut prompt_ask_outcome,
         )
      },
      Resource::Pulls { actions } => facade::pulls::run(&ctx, forge, &path, actions),

      Resource::PullCreate { title, body, head, base, labels, reviewers, automerge } => {
         let opts = PullSubmitOpts { path: path.clone(), title, body, head, base, labels, reviewers, automerge };
         let pull = facade::pulls::submit(&ctx, forge, &opts)?;
         Ok(vec![format!("#{} {} [{}]", pull.number, pull.title, pull.state)])
      },

      Resource::Milestones { actions } if actions.is_empty() => {
         let milestones = facade::milestones::search(&ctx, forge, &path, max)?;
         Ok(milestones.iter().map(|m| format!("#{} {} [{}]", m.id, m.title, m.state)).collect())
      },
      Resource::Milestones { actions } => facade::milestones::run(&ctx, forge, &path, actions),

      Resource::Pipelines { actions } if actions.is_empty() => {
         let pipelines = facade::pipelines::search(&ctx, forge, &path, max)?;
         Ok(pipelines.iter().map(|p| format!("#{} {} [{}]", p.id, p.ref_name, p.status)).collect())
      },
      Resource::Pipelines { actions } => facade::pipelines::run_pipeline(&ctx, forge, &path, actions),

      Resource::Jobs { actions } => facade::pipelines::run_job(&ctx, forge, &path, actions),

      Resource::Labels => {
         let labels = facade::labels::list(&ctx, forge, &path, max)?;
         Ok(labels.iter().map(|l| l.name.clone()).collect())
      },

      Resource::Forks { create: true } => {
         let fork = facade::forks::create(&ctx, forge, &path)?;
         Ok(vec![fork.full_name])
      },
      Resource::Forks { create: false } => {
         let forks = facade::forks::list(&ctx, forge, &path, max)?;
         Ok(forks.iter().map(|f| f.full_name.clone()).collect())
      },

      Resource::Repos => {
         let repos = match path.owner_repo() {
            Some((owner, _)) if !owner.is_empty() => facade::repos::list_for_owner(&ctx, forge, owner, max)?,
            _ => facade::repos::list_own(&ctx, forge, max)?,
         };
         Ok(repos.iter().map(|r| format!("{}/{}", r.owner, r.name)).collect())
      },

      Resource::Notifications => {
         let notifications = facade::notifications::list(&ctx, forge, max)?;
         Ok(notifications.iter().map(|n| format!("{}: {}", n.id, n.title)).collect())
      },

      Resource::SshKeys => {
         let keys = facade::sshkeys::list(&ctx, forge, max)?;
         Ok(keys.iter().map(|k| format!("#{} {}", k.id, k.title)).collect())
      },
   }
}

fn main() {
   dotenvy::dotenv().ok();
   let args = Args::parse();

   match run(args) {
      Ok(lines) => {
         for line in lines {
            println!("{line}");
         }
      },
      Err(e) => {
         style::warn(&format!("{e}"));
         std::process::exit(e.exit_code());
      },
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn resolve_path_uses_given_id_when_owner_and_repo_are_absent_on_bugzilla() {
      let args = Args {
         owner:    None,
         repo:     None,
         id:       Some(42),
         account:  None,
         all:      false,
         resource: Resource::Issues { actions: Vec::new() },
      };
      let path = resolve_path(&args, ForgeKind::Bugzilla).unwrap();
      assert_eq!(path, Path::Id(42));
   }

   #[test]
   fn resolve_path_rejects_owner_without_repo() {
      let args = Args {
         owner:    Some("o".into()),
         repo:     None,
         id:       None,
         account:  None,
         all:      false,
         resource: Resource::Issues { actions: Vec::new() },
      };
      let err = resolve_path(&args, ForgeKind::GitHub).unwrap_err();
      assert_eq!(err.exit_code(), gcli::error::EXIT_USAGE);
   }
}
