//! Forge capability set: one filled trait object per backend.
//!
//! The source represents this as a struct of function pointers where a
//! backend that doesn't implement an operation leaves the pointer null; the
//! facade checks non-nullness before calling. Rust has no null function
//! pointers worth emulating here — the idiomatic equivalent (per the
//! "Re-architecture items" design note) is a trait with default methods that
//! return [`GcliError::Unsupported`], overridden only where a backend
//! actually implements the operation.

use chrono::{DateTime, Utc};

use crate::context::Context;
use crate::error::{GcliError, Result};
use crate::path::Path;
use crate::review::ReviewSubmission;
use crate::types::{
   Comment, CommentTarget, FetchLimit, Fork, Issue, Job, Label, MergeFlags, Milestone,
   Notification, Pipeline, PullRequest, QuirkMask, Repo, SearchFilters, SshKey,
};

fn unsupported(name: &str) -> GcliError {
   GcliError::unsupported(name)
}

#[derive(Debug, Clone, Default)]
pub struct IssueSubmitOpts {
   pub title: String,
   pub body:  String,
}

#[derive(Debug, Clone, Default)]
pub struct PullSubmitOpts {
   pub path:      Path,
   pub title:     String,
   pub body:      String,
   pub head:      String,
   pub base:      String,
   pub labels:    Vec<String>,
   pub reviewers: Vec<String>,
   pub automerge: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RepoCreateOpts {
   pub description: String,
   pub private:     bool,
}

#[derive(Debug, Clone)]
pub struct SubmitCommentOpts {
   pub target:      Path,
   pub target_type: CommentTarget,
   pub message:     String,
}

/// One filled instance of this trait exists per backend (`forges::github`,
/// `forges::gitlab`, `forges::gitea`, `forges::bugzilla`). The facade (§4.6)
/// dispatches into it after argument validation.
pub trait Forge {
   fn get_authheader(&self, ctx: &Context) -> String {
      ctx.auth_header()
   }

   /// Extracts a human message from a non-2xx response body, trying
   /// `error_description`, `message`, `error` in that priority order (the
   /// GitLab ordering named in the specification; other backends mostly
   /// expose only `message`).
   fn api_error_string(&self, body: &str) -> String {
      let parsed: serde_json::Value = match serde_json::from_str(body) {
         Ok(v) => v,
         Err(_) => return format!("no error message: {body}"),
      };
      for key in ["error_description", "message", "error"] {
         if let Some(s) = parsed.get(key).and_then(|v| v.as_str()) {
            return s.to_string();
         }
      }
      format!("no error message: {body}")
   }

   /// Which summary fields and operations this backend actually populates
   /// or supports. Defaults to none; a backend overrides this to advertise
   /// what it fills in, and the facade consults it before operations that
   /// would otherwise silently no-op on an unsupporting backend.
   fn quirks(&self) -> QuirkMask {
      QuirkMask::NONE
   }

   // === issues ===
   fn search_issues(
      &self,
      _ctx: &Context,
      _path: &Path,
      _filters: &SearchFilters,
      _max: FetchLimit,
   ) -> Result<Vec<Issue>> {
      Err(unsupported("search_issues"))
   }

   fn get_issue(&self, _ctx: &Context, _path: &Path) -> Result<Issue> {
      Err(unsupported("get_issue"))
   }

   fn submit_issue(&self, _ctx: &Context, _path: &Path, _opts: &IssueSubmitOpts) -> Result<Issue> {
      Err(unsupported("submit_issue"))
   }

   fn issue_close(&self, _ctx: &Context, _path: &Path) -> Result<()> {
      Err(unsupported("issue_close"))
   }

   fn issue_reopen(&self, _ctx: &Context, _path: &Path) -> Result<()> {
      Err(unsupported("issue_reopen"))
   }

   fn issue_assign(&self, _ctx: &Context, _path: &Path, _user: &str) -> Result<()> {
      Err(unsupported("issue_assign"))
   }

   fn issue_add_labels(&self, _ctx: &Context, _path: &Path, _labels: &[String]) -> Result<()> {
      Err(unsupported("issue_add_labels"))
   }

   fn issue_remove_labels(&self, _ctx: &Context, _path: &Path, _labels: &[String]) -> Result<()> {
      Err(unsupported("issue_remove_labels"))
   }

   fn issue_set_milestone(&self, _ctx: &Context, _path: &Path, _milestone_id: u64) -> Result<()> {
      Err(unsupported("issue_set_milestone"))
   }

   fn issue_clear_milestone(&self, _ctx: &Context, _path: &Path) -> Result<()> {
      Err(unsupported("issue_clear_milestone"))
   }

   fn issue_set_title(&self, _ctx: &Context, _path: &Path, _title: &str) -> Result<()> {
      Err(unsupported("issue_set_title"))
   }

   fn issue_get_attachments(&self, _ctx: &Context, _path: &Path) -> Result<Vec<String>> {
      Err(unsupported("issue_get_attachments"))
   }

   // === pulls ===
   fn search_pulls(
      &self,
      _ctx: &Context,
      _path: &Path,
      _filters: &SearchFilters,
      _max: FetchLimit,
   ) -> Result<Vec<PullRequest>> {
      Err(unsupported("search_pulls"))
   }

   fn get_pull(&self, _ctx: &Context, _path: &Path) -> Result<PullRequest> {
      Err(unsupported("get_pull"))
   }

   fn get_pull_commits(&self, _ctx: &Context, _path: &Path) -> Result<Vec<crate::types::Commit>> {
      Err(unsupported("get_pull_commits"))
   }

   fn pull_get_diff(&self, _ctx: &Context, _path: &Path) -> Result<String> {
      Err(unsupported("pull_get_diff"))
   }

   fn pull_get_patch(&self, _ctx: &Context, _path: &Path) -> Result<String> {
      Err(unsupported("pull_get_patch"))
   }

   fn pull_get_checks(&self, _ctx: &Context, _path: &Path) -> Result<Vec<Pipeline>> {
      Err(unsupported("pull_get_checks"))
   }

   fn pull_merge(&self, _ctx: &Context, _path: &Path, _flags: MergeFlags) -> Result<()> {
      Err(unsupported("pull_merge"))
   }

   fn pull_close(&self, _ctx: &Context, _path: &Path) -> Result<()> {
      Err(unsupported("pull_close"))
   }

   fn pull_reopen(&self, _ctx: &Context, _path: &Path) -> Result<()> {
      Err(unsupported("pull_reopen"))
   }

   fn pull_add_labels(&self, _ctx: &Context, _path: &Path, _labels: &[String]) -> Result<()> {
      Err(unsupported("pull_add_labels"))
   }

   fn pull_remove_labels(&self, _ctx: &Context, _path: &Path, _labels: &[String]) -> Result<()> {
      Err(unsupported("pull_remove_labels"))
   }

   fn pull_set_milestone(&self, _ctx: &Context, _path: &Path, _milestone_id: u64) -> Result<()> {
      Err(unsupported("pull_set_milestone"))
   }

   fn pull_clear_milestone(&self, _ctx: &Context, _path: &Path) -> Result<()> {
      Err(unsupported("pull_clear_milestone"))
   }

   fn pull_add_reviewer(&self, _ctx: &Context, _path: &Path, _user: &str) -> Result<()> {
      Err(unsupported("pull_add_reviewer"))
   }

   fn pull_set_title(&self, _ctx: &Context, _path: &Path, _title: &str) -> Result<()> {
      Err(unsupported("pull_set_title"))
   }

   fn pull_create_review(
      &self,
      _ctx: &Context,
      _path: &Path,
      _submission: &ReviewSubmission,
   ) -> Result<()> {
      Err(unsupported("pull_create_review"))
   }

   fn perform_submit_pull(&self, _ctx: &Context, _opts: &PullSubmitOpts) -> Result<PullRequest> {
      Err(unsupported("perform_submit_pull"))
   }

   fn pull_checkout(&self, _ctx: &Context, _pull: &PullRequest) -> Result<()> {
      Err(unsupported("pull_checkout"))
   }

   // === labels ===
   fn get_labels(&self, _ctx: &Context, _path: &Path, _max: FetchLimit) -> Result<Vec<Label>> {
      Err(unsupported("get_labels"))
   }

   fn create_label(&self, _ctx: &Context, _path: &Path, _label: &Label) -> Result<Label> {
      Err(unsupported("create_label"))
   }

   fn delete_label(&self, _ctx: &Context, _path: &Path, _name: &str) -> Result<()> {
      Err(unsupported("delete_label"))
   }

   // === milestones ===
   fn get_milestones(
      &self,
      _ctx: &Context,
      _path: &Path,
      _max: FetchLimit,
   ) -> Result<Vec<Milestone>> {
      Err(unsupported("get_milestones"))
   }

   fn get_milestone(&self, _ctx: &Context, _path: &Path, _id: u64) -> Result<Milestone> {
      Err(unsupported("get_milestone"))
   }

   fn create_milestone(&self, _ctx: &Context, _path: &Path, _title: &str) -> Result<Milestone> {
      Err(unsupported("create_milestone"))
   }

   fn delete_milestone(&self, _ctx: &Context, _path: &Path, _id: u64) -> Result<()> {
      Err(unsupported("delete_milestone"))
   }

   fn milestone_get_issues(
      &self,
      _ctx: &Context,
      _path: &Path,
      _id: u64,
      _max: FetchLimit,
   ) -> Result<Vec<Issue>> {
      Err(unsupported("milestone_get_issues"))
   }

   fn milestone_set_duedate(
      &self,
      _ctx: &Context,
      _path: &Path,
      _id: u64,
      _due: DateTime<Utc>,
   ) -> Result<()> {
      Err(unsupported("milestone_set_duedate"))
   }

   // === forks ===
   fn get_forks(&self, _ctx: &Context, _path: &Path, _max: FetchLimit) -> Result<Vec<Fork>> {
      Err(unsupported("get_forks"))
   }

   fn fork_create(&self, _ctx: &Context, _path: &Path) -> Result<Fork> {
      Err(unsupported("fork_create"))
   }

   // === repos ===
   fn get_repos(&self, _ctx: &Context, _owner: &str, _max: FetchLimit) -> Result<Vec<Repo>> {
      Err(unsupported("get_repos"))
   }

   fn get_own_repos(&self, _ctx: &Context, _max: FetchLimit) -> Result<Vec<Repo>> {
      Err(unsupported("get_own_repos"))
   }

   fn repo_create(&self, _ctx: &Context, _name: &str, _opts: &RepoCreateOpts) -> Result<Repo> {
      Err(unsupported("repo_create"))
   }

   fn repo_delete(&self, _ctx: &Context, _path: &Path) -> Result<()> {
      Err(unsupported("repo_delete"))
   }

   fn repo_set_visibility(&self, _ctx: &Context, _path: &Path, _private: bool) -> Result<()> {
      Err(unsupported("repo_set_visibility"))
   }

   // === notifications ===
   fn get_notifications(&self, _ctx: &Context, _max: FetchLimit) -> Result<Vec<Notification>> {
      Err(unsupported("get_notifications"))
   }

   fn notification_mark_as_read(&self, _ctx: &Context, _id: &str) -> Result<()> {
      Err(unsupported("notification_mark_as_read"))
   }

   fn notification_get_issue(
      &self,
      _ctx: &Context,
      _notification: &Notification,
   ) -> Result<Issue> {
      Err(unsupported("notification_get_issue"))
   }

   fn notification_get_comments(
      &self,
      _ctx: &Context,
      _notification: &Notification,
   ) -> Result<Vec<Comment>> {
      Err(unsupported("notification_get_comments"))
   }

   // === comments ===
   fn get_issue_comments(
      &self,
      _ctx: &Context,
      _path: &Path,
      _max: FetchLimit,
   ) -> Result<Vec<Comment>> {
      Err(unsupported("get_issue_comments"))
   }

   fn get_pull_comments(
      &self,
      _ctx: &Context,
      _path: &Path,
      _max: FetchLimit,
   ) -> Result<Vec<Comment>> {
      Err(unsupported("get_pull_comments"))
   }

   fn get_comment(
      &self,
      _ctx: &Context,
      _path: &Path,
      _target_type: CommentTarget,
      _comment_id: u64,
   ) -> Result<Comment> {
      Err(unsupported("get_comment"))
   }

   fn perform_submit_comment(&self, _ctx: &Context, _opts: &SubmitCommentOpts) -> Result<Comment> {
      Err(unsupported("perform_submit_comment"))
   }

   // === ssh keys ===
   fn get_sshkeys(&self, _ctx: &Context, _max: FetchLimit) -> Result<Vec<SshKey>> {
      Err(unsupported("get_sshkeys"))
   }

   fn sshkey_create(&self, _ctx: &Context, _title: &str, _key: &str) -> Result<SshKey> {
      Err(unsupported("sshkey_create"))
   }

   fn sshkey_delete(&self, _ctx: &Context, _id: u64) -> Result<()> {
      Err(unsupported("sshkey_delete"))
   }

   // === GitLab-only: pipelines and jobs ===
   fn get_pipelines(&self, _ctx: &Context, _path: &Path, _max: FetchLimit) -> Result<Vec<Pipeline>> {
      Err(unsupported("get_pipelines"))
   }

   fn get_mr_pipelines(
      &self,
      _ctx: &Context,
      _path: &Path,
      _max: FetchLimit,
   ) -> Result<Vec<Pipeline>> {
      Err(unsupported("get_mr_pipelines"))
   }

   fn get_pipeline(&self, _ctx: &Context, _path: &Path, _id: u64) -> Result<Pipeline> {
      Err(unsupported("get_pipeline"))
   }

   fn get_pipeline_jobs(
      &self,
      _ctx: &Context,
      _path: &Path,
      _id: u64,
      _max: FetchLimit,
   ) -> Result<Vec<Job>> {
      Err(unsupported("get_pipeline_jobs"))
   }

   fn get_pipeline_children(&self, _ctx: &Context, _path: &Path, _id: u64) -> Result<Vec<Pipeline>> {
      Err(unsupported("get_pipeline_children"))
   }

   fn get_job(&self, _ctx: &Context, _path: &Path, _id: u64) -> Result<Job> {
      Err(unsupported("get_job"))
   }

   fn job_get_log(&self, _ctx: &Context, _path: &Path, _id: u64) -> Result<String> {
      Err(unsupported("job_get_log"))
   }

   fn job_cancel(&self, _ctx: &Context, _path: &Path, _id: u64) -> Result<()> {
      Err(unsupported("job_cancel"))
   }

   fn job_retry(&self, _ctx: &Context, _path: &Path, _id: u64) -> Result<()> {
      Err(unsupported("job_retry"))
   }

   fn job_download_artifacts(
      &self,
      _ctx: &Context,
      _path: &Path,
      _id: u64,
      _out_file: &std::path::Path,
   ) -> Result<()> {
      Err(unsupported("job_download_artifacts"))
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   struct Bare;
   impl Forge for Bare {}

   #[test]
   fn unimplemented_capabilities_report_their_own_name() {
      let forge = Bare;
      let ctx = Context::new(crate::config::Account {
         forge_type: crate::types::ForgeKind::GitHub,
         api_base:   String::new(),
         token:      "t".into(),
         default:    true,
      });
      let path = Path::default("o", "r", 1);
      let err = forge.get_issue(&ctx, &path).unwrap_err();
      assert_eq!(err.to_string(), "not supported by this forge: get_issue");
   }

   #[test]
   fn api_error_string_respects_gitlab_priority_order() {
      let forge = Bare;
      let body = r#"{"message": "m", "error_description": "ed", "error": "e"}"#;
      assert_eq!(forge.api_error_string(body), "ed");

      let body = r#"{"message": "m", "error": "e"}"#;
      assert_eq!(forge.api_error_string(body), "m");

      let body = r#"{"error": "e"}"#;
      assert_eq!(forge.api_error_string(body), "e");

      let body = "not json";
      assert_eq!(forge.api_error_string(body), "no error message: not json");
   }
}
