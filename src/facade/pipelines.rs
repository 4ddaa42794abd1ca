//! GitLab pipeline and job facade (§4.6), grounded on `src/cmd/pipelines.c`'s
//! `pipeline_actions` and `job_actions` tables. Pipelines and jobs are
//! GitLab-only resources; other backends report `Unsupported` through the
//! capability set's default methods.

use std::path::PathBuf;

use crate::actions::{Action, Fetchable, run_chain};
use crate::capability::Forge;
use crate::context::Context;
use crate::error::{GcliError, Result};
use crate::path::Path;
use crate::types::{FetchLimit, Job, Pipeline};

fn numeric_id(path: &Path) -> Result<u64> {
   path.id().ok_or_else(|| GcliError::usage("pipelines and jobs require a numeric id"))
}

/// Lists pipelines for the repo named by `path`, up to `max`.
pub fn search(ctx: &Context, forge: &dyn Forge, path: &Path, max: FetchLimit) -> Result<Vec<Pipeline>> {
   forge.get_pipelines(ctx, path, max)
}

struct PipelineFetcher;

impl Fetchable for PipelineFetcher {
   type Item = Pipeline;

   fn fetch(&self, ctx: &Context, forge: &dyn Forge, path: &Path) -> Result<Pipeline> {
      forge.get_pipeline(ctx, path, numeric_id(path)?)
   }
}

fn pipeline_summary(pipeline: &Pipeline) -> String {
   format!("pipeline #{}: {} [{}]", pipeline.id, pipeline.ref_name, pipeline.status)
}

fn require_pipeline<'a>(item: &'a Option<Pipeline>, verb: &str) -> Result<&'a Pipeline> {
   item.as_ref().ok_or_else(|| GcliError::data(format!("no pipeline fetched for '{verb}'")))
}

/// Builds the verb table for the `pipelines` resource (§6's vocabulary).
#[must_use]
pub fn pipeline_action_table() -> Vec<Action<Pipeline>> {
   vec![
      Action::new("all", true, |_, _, _, item, _| {
         Ok(Some(pipeline_summary(require_pipeline(item, "all")?)))
      }),
      Action::new("status", true, |_, _, _, item, _| {
         Ok(Some(pipeline_summary(require_pipeline(item, "status")?)))
      }),
      Action::new("jobs", false, |ctx, forge, path, _, _| {
         let jobs = forge.get_pipeline_jobs(ctx, path, numeric_id(path)?, FetchLimit::All)?;
         Ok(Some(
            jobs.iter().map(|j| format!("#{} {} [{}]", j.id, j.name, j.status)).collect::<Vec<_>>().join("\n"),
         ))
      }),
      Action::new("children", false, |ctx, forge, path, _, _| {
         let children = forge.get_pipeline_children(ctx, path, numeric_id(path)?)?;
         Ok(Some(children.iter().map(pipeline_summary).collect::<Vec<_>>().join("\n")))
      }),
      Action::new("open", true, |_, _, _, item, _| {
         Ok(Some(require_pipeline(item, "open")?.web_url.clone()))
      }),
   ]
}

/// Runs a chain of pipeline actions on `path`, per §4.7.
pub fn run_pipeline(
   ctx: &Context,
   forge: &dyn Forge,
   path: &Path,
   args: Vec<String>,
) -> Result<Vec<String>> {
   run_chain(ctx, forge, path, &PipelineFetcher, &pipeline_action_table(), args)
}

struct JobFetcher;

impl Fetchable for JobFetcher {
   type Item = Job;

   fn fetch(&self, ctx: &Context, forge: &dyn Forge, path: &Path) -> Result<Job> {
      forge.get_job(ctx, path, numeric_id(path)?)
   }
}

fn require_job<'a>(item: &'a Option<Job>, verb: &str) -> Result<&'a Job> {
   item.as_ref().ok_or_else(|| GcliError::data(format!("no job fetched for '{verb}'")))
}

/// Builds the verb table for the `jobs` resource (§6's vocabulary).
///
/// `artifacts` defaults the output filename to `artifacts.zip` when no
/// `-o FILE` is given, matching the source.
#[must_use]
pub fn job_action_table() -> Vec<Action<Job>> {
   vec![
      Action::new("status", true, |_, _, _, item, _| {
         let job = require_job(item, "status")?;
         Ok(Some(format!("job #{}: {} [{}]", job.id, job.name, job.status)))
      }),
      Action::new("log", false, |ctx, forge, path, _, _| {
         Ok(Some(forge.job_get_log(ctx, path, numeric_id(path)?)?))
      }),
      Action::new("cancel", false, |ctx, forge, path, _, _| {
         forge.job_cancel(ctx, path, numeric_id(path)?)?;
         Ok(Some("cancelled".into()))
      }),
      Action::new("retry", false, |ctx, forge, path, _, _| {
         forge.job_retry(ctx, path, numeric_id(path)?)?;
         Ok(Some("retried".into()))
      }),
      Action::new("artifacts", false, |ctx, forge, path, _, args| {
         let outfile = if args.first().is_some_and(|a| a == "-o") {
            args.remove(0);
            if args.is_empty() {
               return Err(GcliError::usage("-o is missing the output filename"));
            }
            args.remove(0)
         } else {
            "artifacts.zip".to_string()
         };
         forge.job_download_artifacts(ctx, path, numeric_id(path)?, &PathBuf::from(&outfile))?;
         Ok(Some(format!("downloaded to {outfile}")))
      }),
      Action::new("open", true, |_, _, _, item, _| {
         Ok(Some(require_job(item, "open")?.web_url.clone()))
      }),
   ]
}

/// Runs a chain of job actions on `path`, per §4.7.
pub fn run_job(ctx: &Context, forge: &dyn Forge, path: &Path, args: Vec<String>) -> Result<Vec<String>> {
   run_chain(ctx, forge, path, &JobFetcher, &job_action_table(), args)
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn pipeline_jobs_and_children_need_no_fetched_item() {
      let table = pipeline_action_table();
      assert!(!table.iter().find(|a| a.name == "jobs").unwrap().needs_item);
      assert!(!table.iter().find(|a| a.name == "children").unwrap().needs_item);
   }

   #[test]
   fn job_status_and_open_need_the_fetched_item_but_log_does_not() {
      let table = job_action_table();
      assert!(table.iter().find(|a| a.name == "status").unwrap().needs_item);
      assert!(table.iter().find(|a| a.name == "open").unwrap().needs_item);
      assert!(!table.iter().find(|a| a.name == "log").unwrap().needs_item);
   }

   #[test]
   fn artifacts_with_dash_o_but_no_filename_is_a_usage_error() {
      let table = job_action_table();
      let artifacts = table.iter().find(|a| a.name == "artifacts").unwrap();
      let ctx = Context::new(crate::config::Account {
         forge_type: crate::types::ForgeKind::GitLab,
         api_base:   String::new(),
         token:      "t".into(),
         default:    true,
      });
      let forge = crate::forges::for_kind(crate::types::ForgeKind::GitLab);
      let path = Path::Id(9);
      let mut item = None;
      let mut args = vec!["-o".to_string()];
      let err = (artifacts.handler)(&ctx, forge.as_ref(), &path, &mut item, &mut args).unwrap_err();
      assert_eq!(err.exit_code(), crate::error::EXIT_USAGE);
   }
}
