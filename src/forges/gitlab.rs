//! GitLab adapter.
//!
//! URLs are built around `projects/{owner}%2F{repo}` the way
//! `gitlab_mr_make_url`/`gitlab_repo_make_url` do in the original source;
//! merge-request state carries no explicit "merged" flag so it is derived
//! from `state == "merged"` the same way `gitlab_mrs_fixup` does.

use std::io::Write as _;

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use sha1::{Digest, Sha1};

use crate::capability::{Forge, IssueSubmitOpts, PullSubmitOpts, RepoCreateOpts, SubmitCommentOpts};
use crate::context::Context;
use crate::error::{GcliError, Result};
use crate::fetch::{self, Page};
use crate::path::Path;
use crate::review::{ReviewOutcome, ReviewSubmission};
use crate::types::{
   Comment, CommentTarget, FetchLimit, Fork, Issue, Job, Label, MergeFlags, Milestone,
   Notification, Pipeline, PullRequest, QuirkMask, Repo, SearchFilters, SshKey,
};

pub struct GitLab;

const AUTOMERGE_POLL_ATTEMPTS: u32 = 30;

fn project_url(ctx: &Context, path: &Path, suffix: &str) -> Result<String> {
   let (owner, repo) = path
      .owner_repo()
      .ok_or_else(|| GcliError::usage("gitlab requires an owner/repo path"))?;
   let owner = urlencode(owner);
   let repo = urlencode(repo);
   Ok(format!("{}/projects/{owner}%2F{repo}{suffix}", ctx.account().api_base))
}

fn mr_url(ctx: &Context, path: &Path, suffix: &str) -> Result<String> {
   let id = path.id().filter(|id| *id > 0).ok_or_else(|| GcliError::usage("missing merge request iid"))?;
   project_url(ctx, path, &format!("/merge_requests/{id}{suffix}"))
}

fn issue_url(ctx: &Context, path: &Path, suffix: &str) -> Result<String> {
   let id = path.id().filter(|id| *id > 0).ok_or_else(|| GcliError::usage("missing issue iid"))?;
   project_url(ctx, path, &format!("/issues/{id}{suffix}"))
}

fn urlencode(s: &str) -> String {
   let mut out = String::with_capacity(s.len());
   for b in s.bytes() {
      match b {
         b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(b as char),
         _ => out.push_str(&format!("%{b:02X}")),
      }
   }
   out
}

fn line_code(filename: &str, old: u64, new: u64) -> String {
   let mut hasher = Sha1::new();
   hasher.update(filename.as_bytes());
   let digest = hasher.finalize();
   let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
   format!("{hex}_{old}_{new}")
}

#[derive(Debug, Deserialize)]
struct GlAuthor {
   #[serde(default)]
   username: String,
}

#[derive(Debug, Deserialize)]
struct GlMilestoneRef {
   title: String,
}

#[derive(Debug, Deserialize)]
struct GlIssue {
   iid:         u64,
   title:       String,
   #[serde(default)]
   description: Option<String>,
   author:      GlAuthor,
   state:       String,
   created_at:  DateTime<Utc>,
   #[serde(default)]
   user_notes_count: u64,
   #[serde(default)]
   discussion_locked: Option<bool>,
   web_url:     String,
   #[serde(default)]
   milestone:   Option<GlMilestoneRef>,
   #[serde(default)]
   labels:      Vec<String>,
   #[serde(default)]
   assignees:   Vec<GlAuthor>,
}

impl From<GlIssue> for Issue {
   fn from(i: GlIssue) -> Self {
      Self {
         number:         i.iid,
         title:          i.title,
         body:           i.description.unwrap_or_default(),
         author:         i.author.username,
         state:          i.state,
         created_at:     i.created_at,
         comments_count: i.user_notes_count,
         locked:         i.discussion_locked.unwrap_or(false),
         url:            i.web_url,
         product:        String::new(),
         component:      String::new(),
         milestone:      i.milestone.map(|m| m.title),
         labels:         i.labels,
         assignees:      i.assignees.into_iter().map(|a| a.username).collect(),
         is_pr:          false,
      }
   }
}

#[derive(Debug, Deserialize)]
struct GlMr {
   iid:            u64,
   title:          String,
   #[serde(default)]
   description:    Option<String>,
   author:         GlAuthor,
   state:          String,
   created_at:     DateTime<Utc>,
   source_branch:  String,
   target_branch:  String,
   sha:            String,
   #[serde(default)]
   diff_refs:      Option<GlDiffRefs>,
   #[serde(default)]
   milestone:      Option<GlMilestoneRef>,
   #[serde(default)]
   user_notes_count: u64,
   #[serde(default)]
   changes_count:  Option<String>,
   web_url:        String,
   #[serde(default)]
   labels:         Vec<String>,
   #[serde(default)]
   reviewers:      Vec<GlAuthor>,
   #[serde(default)]
   merged:         bool,
   #[serde(default)]
   merge_status:   Option<String>,
   #[serde(default)]
   draft:          bool,
}

#[derive(Debug, Deserialize, Default)]
struct GlDiffRefs {
   #[serde(default)]
   base_sha: String,
   #[serde(default)]
   start_sha: String,
   #[serde(default)]
   head_sha: String,
}

impl From<GlMr> for PullRequest {
   fn from(p: GlMr) -> Self {
      let diff_refs = p.diff_refs.unwrap_or_default();
      let merged = p.state == "merged";
      let mergeable = p.merge_status.as_deref() == Some("can_be_merged");
      Self {
         number:        p.iid,
         node_id:       String::new(),
         title:         p.title,
         body:          p.description.unwrap_or_default(),
         author:        p.author.username,
         state:         p.state,
         created_at:    p.created_at,
         head_label:    format!(":{}", p.source_branch),
         base_label:    format!(":{}", p.target_branch),
         head_sha:      p.sha,
         base_sha:      diff_refs.base_sha,
         start_sha:     diff_refs.start_sha,
         milestone:     p.milestone.map(|m| m.title),
         comments:      p.user_notes_count,
         additions:     0,
         deletions:     0,
         commits:       0,
         changed_files: p.changes_count.and_then(|c| c.parse().ok()).unwrap_or(0),
         coverage:      None,
         web_url:       p.web_url,
         labels:        p.labels,
         reviewers:     p.reviewers.into_iter().map(|r| r.username).collect(),
         merged,
         mergeable,
         draft:         p.draft,
         automerge:     false,
      }
   }
}

#[derive(Debug, Deserialize)]
struct GlComment {
   id:         u64,
   author:     GlAuthor,
   created_at: DateTime<Utc>,
   body:       String,
}

impl From<GlComment> for Comment {
   fn from(c: GlComment) -> Self {
      Self { id: c.id, author: c.author.username, date: c.created_at, body: c.body }
   }
}

#[derive(Debug, Deserialize)]
struct GlLabelFull {
   id:   u64,
   name: String,
   #[serde(default)]
   description: Option<String>,
   color: String,
}

impl From<GlLabelFull> for Label {
   fn from(l: GlLabelFull) -> Self {
      Self {
         id:          l.id,
         name:        l.name,
         description: l.description.unwrap_or_default(),
         colour:      u32::from_str_radix(l.color.trim_start_matches('#'), 16).unwrap_or(0),
      }
   }
}

#[derive(Debug, Deserialize)]
struct GlMilestone {
   id:            u64,
   title:         String,
   #[serde(default)]
   description:   Option<String>,
   state:         String,
   created_at:    DateTime<Utc>,
   updated_at:    DateTime<Utc>,
   #[serde(default)]
   due_date:      Option<DateTime<Utc>>,
   #[serde(default)]
   expired:       Option<bool>,
   web_url:       String,
}

impl From<GlMilestone> for Milestone {
   fn from(m: GlMilestone) -> Self {
      Self {
         id:                  m.id,
         title:               m.title,
         description:         m.description.unwrap_or_default(),
         state:               m.state,
         created_at:          m.created_at,
         updated_at:          m.updated_at,
         due_date:            m.due_date,
         expired:             m.expired.unwrap_or(false),
         open_issues_count:   0,
         closed_issues_count: 0,
         web_url:             m.web_url,
      }
   }
}

#[derive(Debug, Deserialize)]
struct GlRepo {
   #[serde(default)]
   owner: Option<GlAuthor>,
   #[serde(default)]
   namespace: Option<GlNamespace>,
   name:        String,
   #[serde(default)]
   description: Option<String>,
   visibility:  String,
   #[serde(default)]
   forked_from_project: Option<serde_json::Value>,
   web_url:     String,
}

#[derive(Debug, Deserialize)]
struct GlNamespace {
   path: String,
}

impl GlRepo {
   fn owner_name(&self) -> String {
      self
         .owner
         .as_ref()
         .map(|o| o.username.clone())
         .or_else(|| self.namespace.as_ref().map(|n| n.path.clone()))
         .unwrap_or_default()
   }
}

impl From<GlRepo> for Repo {
   fn from(r: GlRepo) -> Self {
      let owner = r.owner_name();
      Self {
         owner,
         name:        r.name,
         description: r.description.unwrap_or_default(),
         private:     r.visibility != "public",
         fork:        r.forked_from_project.is_some(),
         web_url:     r.web_url,
      }
   }
}

impl From<GlRepo> for Fork {
   fn from(r: GlRepo) -> Self {
      let owner = r.owner_name();
      Self {
         full_name: format!("{owner}/{}", r.name),
         owner,
         repo:      r.name.clone(),
         web_url:   r.web_url,
      }
   }
}

#[derive(Debug, Deserialize)]
struct GlPipeline {
   id:         u64,
   status:     String,
   #[serde(rename = "ref")]
   ref_name:   String,
   sha:        String,
   web_url:    String,
   created_at: DateTime<Utc>,
}

impl From<GlPipeline> for Pipeline {
   fn from(p: GlPipeline) -> Self {
      Self { id: p.id, status: p.status, ref_name: p.ref_name, sha: p.sha, web_url: p.web_url, created_at: p.created_at }
   }
}

#[derive(Debug, Deserialize)]
struct GlJob {
   id:         u64,
   name:       String,
   status:     String,
   stage:      String,
   web_url:    String,
   created_at: DateTime<Utc>,
}

impl From<GlJob> for Job {
   fn from(j: GlJob) -> Self {
      Self { id: j.id, name: j.name, status: j.status, stage: j.stage, web_url: j.web_url, created_at: j.created_at }
   }
}

fn paginate<T, U>(ctx: &Context, forge: &dyn Forge, url: String, max: FetchLimit) -> Result<Vec<T>>
where
   U: for<'de> Deserialize<'de> + Into<T>,
{
   fetch::fetch_list(
      ctx,
      forge,
      &url,
      max,
      |body| {
         let page: Vec<U> = serde_json::from_str(body)?;
         Ok(Page { items: page.into_iter().map(Into::into).collect(), next_url: None })
      },
      None,
   )
}

impl Forge for GitLab {
   fn get_authheader(&self, ctx: &Context) -> String {
      format!("Bearer {}", ctx.account().token)
   }

   fn search_issues(
      &self,
      ctx: &Context,
      path: &Path,
      filters: &SearchFilters,
      max: FetchLimit,
   ) -> Result<Vec<Issue>> {
      let mut url = project_url(ctx, path, "/issues")?;
      let mut qmark = true;
      if !filters.all {
         url.push_str("?state=opened");
         qmark = false;
      }
      let push = |url: &mut String, qmark: &mut bool, key: &str, value: &str| {
         url.push(if *qmark { '?' } else { '&' });
         *qmark = false;
         url.push_str(&format!("{key}={}", urlencode(value)));
      };
      if let Some(author) = &filters.author {
         push(&mut url, &mut qmark, "author_username", author);
      }
      if let Some(label) = &filters.label {
         push(&mut url, &mut qmark, "labels", label);
      }
      if let Some(milestone) = &filters.milestone {
         push(&mut url, &mut qmark, "milestone", milestone);
      }
      if let Some(search) = &filters.search_term {
         push(&mut url, &mut qmark, "search", search);
      }
      paginate::<Issue, GlIssue>(ctx, self, url, max)
   }

   fn get_issue(&self, ctx: &Context, path: &Path) -> Result<Issue> {
      let url = issue_url(ctx, path, "")?;
      let body = fetch::fetch_one(ctx, self, &url, None)?;
      Ok(serde_json::from_str::<GlIssue>(&body)?.into())
   }

   fn submit_issue(&self, ctx: &Context, path: &Path, opts: &IssueSubmitOpts) -> Result<Issue> {
      let url = project_url(ctx, path, "/issues")?;
      let payload = serde_json::json!({ "title": opts.title, "description": opts.body }).to_string();
      let body = fetch::fetch_with_method(ctx, self, Method::POST, &url, Some(&payload), &[], true)?
         .ok_or_else(|| GcliError::data("empty response creating issue"))?;
      Ok(serde_json::from_str::<GlIssue>(&body)?.into())
   }

   fn issue_close(&self, ctx: &Context, path: &Path) -> Result<()> {
      set_issue_state(ctx, self, path, "close")
   }

   fn issue_reopen(&self, ctx: &Context, path: &Path) -> Result<()> {
      set_issue_state(ctx, self, path, "reopen")
   }

   fn issue_assign(&self, ctx: &Context, path: &Path, user: &str) -> Result<()> {
      let url = issue_url(ctx, path, &format!("?assignee_ids[]={}", urlencode(user)))?;
      fetch::fetch_with_method(ctx, self, Method::PUT, &url, None, &[], false)?;
      Ok(())
   }

   fn issue_add_labels(&self, ctx: &Context, path: &Path, labels: &[String]) -> Result<()> {
      let url = issue_url(ctx, path, "")?;
      let payload = serde_json::json!({ "add_labels": labels.join(",") }).to_string();
      fetch::fetch_with_method(ctx, self, Method::PUT, &url, Some(&payload), &[], false)?;
      Ok(())
   }

   fn issue_remove_labels(&self, ctx: &Context, path: &Path, labels: &[String]) -> Result<()> {
      let url = issue_url(ctx, path, "")?;
      let payload = serde_json::json!({ "remove_labels": labels.join(",") }).to_string();
      fetch::fetch_with_method(ctx, self, Method::PUT, &url, Some(&payload), &[], false)?;
      Ok(())
   }

   fn issue_set_milestone(&self, ctx: &Context, path: &Path, milestone_id: u64) -> Result<()> {
      let url = issue_url(ctx, path, "")?;
      let payload = serde_json::json!({ "milestone_id": milestone_id }).to_string();
      fetch::fetch_with_method(ctx, self, Method::PUT, &url, Some(&payload), &[], false)?;
      Ok(())
   }

   fn issue_clear_milestone(&self, ctx: &Context, path: &Path) -> Result<()> {
      let url = issue_url(ctx, path, "")?;
      let payload = serde_json::json!({ "milestone_id": null }).to_string();
      fetch::fetch_with_method(ctx, self, Method::PUT, &url, Some(&payload), &[], false)?;
      Ok(())
   }

   fn issue_set_title(&self, ctx: &Context, path: &Path, title: &str) -> Result<()> {
      let url = issue_url(ctx, path, "")?;
      let payload = serde_json::json!({ "title": title }).to_string();
      fetch::fetch_with_method(ctx, self, Method::PUT, &url, Some(&payload), &[], false)?;
      Ok(())
   }

   fn search_pulls(
      &self,
      ctx: &Context,
      path: &Path,
      filters: &SearchFilters,
      max: FetchLimit,
   ) -> Result<Vec<PullRequest>> {
      let mut url = project_url(ctx, path, "/merge_requests")?;
      if !filters.all {
         url.push_str("?state=opened");
      }
      let mut mrs = paginate::<PullRequest, GlMr>(ctx, self, url, max)?;
      for mr in &mut mrs {
         mr.merged = mr.state == "merged";
      }
      Ok(mrs)
   }

   fn get_pull(&self, ctx: &Context, path: &Path) -> Result<PullRequest> {
      let url = mr_url(ctx, path, "")?;
      let body = fetch::fetch_one(ctx, self, &url, None)?;
      Ok(serde_json::from_str::<GlMr>(&body)?.into())
   }

   fn get_pull_commits(&self, ctx: &Context, path: &Path) -> Result<Vec<crate::types::Commit>> {
      let url = mr_url(ctx, path, "/commits")?;
      let body = fetch::fetch_one(ctx, self, &url, None)?;
      let raw: Vec<serde_json::Value> = serde_json::from_str(&body)?;
      Ok(
         raw
            .into_iter()
            .map(|v| crate::types::Commit {
               short_sha: v["id"].as_str().unwrap_or_default().chars().take(7).collect(),
               long_sha:  v["id"].as_str().unwrap_or_default().to_string(),
               message:   v["message"].as_str().unwrap_or_default().to_string(),
               date:      v["created_at"]
                  .as_str()
                  .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                  .map(|d| d.with_timezone(&Utc))
                  .unwrap_or_else(Utc::now),
               author:    v["author_name"].as_str().unwrap_or_default().to_string(),
               email:     v["author_email"].as_str().unwrap_or_default().to_string(),
            })
            .collect(),
      )
   }

   fn pull_get_diff(&self, ctx: &Context, path: &Path) -> Result<String> {
      let url = mr_url(ctx, path, "/changes")?;
      fetch::fetch_one(ctx, self, &url, None)
   }

   fn pull_get_patch(&self, ctx: &Context, path: &Path) -> Result<String> {
      let url = mr_url(ctx, path, ".patch")?;
      fetch::fetch_one(ctx, self, &url, None)
   }

   fn pull_get_checks(&self, ctx: &Context, path: &Path) -> Result<Vec<Pipeline>> {
      self.get_mr_pipelines(ctx, path, FetchLimit::All)
   }

   fn pull_merge(&self, ctx: &Context, path: &Path, flags: MergeFlags) -> Result<()> {
      let squash = flags.has(MergeFlags::SQUASH);
      let remove_source = flags.has(MergeFlags::DELETEHEAD);
      let url = mr_url(ctx, path, &format!("/merge?squash={squash}&should_remove_source_branch={remove_source}"))?;
      fetch::fetch_with_method(ctx, self, Method::PUT, &url, Some("{}"), &[], false)?;
      Ok(())
   }

   fn pull_close(&self, ctx: &Context, path: &Path) -> Result<()> {
      set_mr_state(ctx, self, path, "close")
   }

   fn pull_reopen(&self, ctx: &Context, path: &Path) -> Result<()> {
      set_mr_state(ctx, self, path, "reopen")
   }

   fn pull_add_labels(&self, ctx: &Context, path: &Path, labels: &[String]) -> Result<()> {
      let url = mr_url(ctx, path, "")?;
      let payload = serde_json::json!({ "add_labels": labels.join(",") }).to_string();
      fetch::fetch_with_method(ctx, self, Method::PUT, &url, Some(&payload), &[], false)?;
      Ok(())
   }

   fn pull_remove_labels(&self, ctx: &Context, path: &Path, labels: &[String]) -> Result<()> {
      let url = mr_url(ctx, path, "")?;
      let payload = serde_json::json!({ "remove_labels": labels.join(",") }).to_string();
      fetch::fetch_with_method(ctx, self, Method::PUT, &url, Some(&payload), &[], false)?;
      Ok(())
   }

   fn pull_set_milestone(&self, ctx: &Context, path: &Path, milestone_id: u64) -> Result<()> {
      let url = mr_url(ctx, path, "")?;
      let payload = serde_json::json!({ "milestone_id": milestone_id }).to_string();
      fetch::fetch_with_method(ctx, self, Method::PUT, &url, Some(&payload), &[], false)?;
      Ok(())
   }

   fn pull_clear_milestone(&self, ctx: &Context, path: &Path) -> Result<()> {
      let url = mr_url(ctx, path, "")?;
      let payload = serde_json::json!({ "milestone_id": null }).to_string();
      fetch::fetch_with_method(ctx, self, Method::PUT, &url, Some(&payload), &[], false)?;
      Ok(())
   }

   fn pull_add_reviewer(&self, ctx: &Context, path: &Path, user: &str) -> Result<()> {
      let user_id = self.lookup_user_id(ctx, user)?;
      let url = mr_url(ctx, path, "")?;
      let payload = serde_json::json!({ "reviewer_ids": [user_id] }).to_string();
      fetch::fetch_with_method(ctx, self, Method::PUT, &url, Some(&payload), &[], false)?;
      Ok(())
   }

   fn pull_set_title(&self, ctx: &Context, path: &Path, title: &str) -> Result<()> {
      let url = mr_url(ctx, path, "")?;
      let payload = serde_json::json!({ "title": title }).to_string();
      fetch::fetch_with_method(ctx, self, Method::PUT, &url, Some(&payload), &[], false)?;
      Ok(())
   }

   fn pull_create_review(&self, ctx: &Context, path: &Path, submission: &ReviewSubmission) -> Result<()> {
      let base_sha = submission
         .metadata
         .get("base_sha")
         .ok_or_else(|| GcliError::data("no base_sha in review metadata"))?;
      let start_sha = submission
         .metadata
         .get("start_sha")
         .ok_or_else(|| GcliError::data("no start_sha in review metadata"))?;
      let head_sha = submission
         .metadata
         .get("head_sha")
         .ok_or_else(|| GcliError::data("no head_sha in review metadata"))?;

      for comment in &submission.comments {
         let url = mr_url(ctx, path, "/discussions")?;
         let payload = serde_json::json!({
            "body": comment.comment,
            "commit_id": head_sha,
            "position": {
               "position_type": "text",
               "base_sha": base_sha,
               "start_sha": start_sha,
               "head_sha": head_sha,
               "new_path": comment.filename,
               "old_path": comment.filename,
               "new_line": comment.new_line_end,
               "line_range": {
                  "start": {
                     "type": if comment.start_is_in_new { "new" } else { "old" },
                     "line_code": line_code(&comment.filename, comment.old_line_start, comment.new_line_start),
                  },
                  "end": {
                     "type": if comment.end_is_in_new { "new" } else { "old" },
                     "line_code": line_code(&comment.filename, comment.old_line_end, comment.new_line_end),
                  },
               },
            },
         })
         .to_string();
         fetch::fetch_with_method(ctx, self, Method::POST, &url, Some(&payload), &[], false)?;
      }

      if !submission.body.is_empty() {
         let opts = SubmitCommentOpts {
            target:      path.clone(),
            target_type: CommentTarget::Pull,
            message:     submission.body.clone(),
         };
         self.perform_submit_comment(ctx, &opts)?;
      }

      match submission.outcome {
         ReviewOutcome::Accept => {
            let url = mr_url(ctx, path, "/approve")?;
            fetch::fetch_with_method(ctx, self, Method::POST, &url, None, &[], false)?;
         },
         ReviewOutcome::RequestChanges => {
            let url = mr_url(ctx, path, "/unapprove")?;
            fetch::fetch_with_method(ctx, self, Method::POST, &url, None, &[], false)?;
         },
         ReviewOutcome::Comment | ReviewOutcome::Postpone => {},
      }
      Ok(())
   }

   fn quirks(&self) -> QuirkMask {
      QuirkMask::HAS_AUTOMERGE
   }

   fn perform_submit_pull(&self, ctx: &Context, opts: &PullSubmitOpts) -> Result<PullRequest> {
      let (source_owner, source_branch) = opts
         .head
         .split_once(':')
         .ok_or_else(|| GcliError::usage("bad merge request source: expected 'owner:branch'"))?;
      let _ = source_owner;

      let url = project_url(ctx, &opts.path, "/merge_requests")?;
      let mut reviewer_ids = Vec::new();
      for reviewer in &opts.reviewers {
         reviewer_ids.push(self.lookup_user_id(ctx, reviewer)?);
      }
      let payload = serde_json::json!({
         "source_branch": source_branch,
         "target_branch": opts.base,
         "title": opts.title,
         "description": opts.body,
         "labels": opts.labels,
         "reviewer_ids": reviewer_ids,
      })
      .to_string();
      let body = fetch::fetch_with_method(ctx, self, Method::POST, &url, Some(&payload), &[], true)?
         .ok_or_else(|| GcliError::data("empty response creating merge request"))?;
      let pull: PullRequest = serde_json::from_str::<GlMr>(&body)?.into();

      if opts.automerge {
         let mr_path = Path::default(
            opts.path.owner_repo().map(|(o, _)| o).unwrap_or_default(),
            opts.path.owner_repo().map(|(_, r)| r).unwrap_or_default(),
            pull.number,
         );
         self.wait_until_mergeable(ctx, &mr_path)?;
         let url = mr_url(ctx, &mr_path, "")?;
         fetch::fetch_with_method(ctx, self, Method::PUT, &url, None, &[], false)?;
      }
      Ok(pull)
   }

   fn get_labels(&self, ctx: &Context, path: &Path, max: FetchLimit) -> Result<Vec<Label>> {
      let url = project_url(ctx, path, "/labels")?;
      paginate::<Label, GlLabelFull>(ctx, self, url, max)
   }

   fn create_label(&self, ctx: &Context, path: &Path, label: &Label) -> Result<Label> {
      let url = project_url(ctx, path, "/labels")?;
      let payload = serde_json::json!({
         "name": label.name,
         "color": format!("#{:06x}", label.colour),
         "description": label.description,
      })
      .to_string();
      let body = fetch::fetch_with_method(ctx, self, Method::POST, &url, Some(&payload), &[], true)?
         .ok_or_else(|| GcliError::data("empty response creating label"))?;
      Ok(serde_json::from_str::<GlLabelFull>(&body)?.into())
   }

   fn delete_label(&self, ctx: &Context, path: &Path, name: &str) -> Result<()> {
      let url = project_url(ctx, path, &format!("/labels/{}", urlencode(name)))?;
      fetch::fetch_with_method(ctx, self, Method::DELETE, &url, None, &[], false)?;
      Ok(())
   }

   fn get_milestones(&self, ctx: &Context, path: &Path, max: FetchLimit) -> Result<Vec<Milestone>> {
      let url = project_url(ctx, path, "/milestones")?;
      paginate::<Milestone, GlMilestone>(ctx, self, url, max)
   }

   fn get_milestone(&self, ctx: &Context, path: &Path, id: u64) -> Result<Milestone> {
      let url = project_url(ctx, path, &format!("/milestones/{id}"))?;
      let body = fetch::fetch_one(ctx, self, &url, None)?;
      Ok(serde_json::from_str::<GlMilestone>(&body)?.into())
   }

   fn create_milestone(&self, ctx: &Context, path: &Path, title: &str) -> Result<Milestone> {
      let url = project_url(ctx, path, "/milestones")?;
      let payload = serde_json::json!({ "title": title }).to_string();
      let body = fetch::fetch_with_method(ctx, self, Method::POST, &url, Some(&payload), &[], true)?
         .ok_or_else(|| GcliError::data("empty response creating milestone"))?;
      Ok(serde_json::from_str::<GlMilestone>(&body)?.into())
   }

   fn delete_milestone(&self, ctx: &Context, path: &Path, id: u64) -> Result<()> {
      let url = project_url(ctx, path, &format!("/milestones/{id}"))?;
      fetch::fetch_with_method(ctx, self, Method::DELETE, &url, None, &[], false)?;
      Ok(())
   }

   fn milestone_get_issues(&self, ctx: &Context, path: &Path, id: u64, max: FetchLimit) -> Result<Vec<Issue>> {
      let url = project_url(ctx, path, &format!("/milestones/{id}/issues"))?;
      paginate::<Issue, GlIssue>(ctx, self, url, max)
   }

   fn milestone_set_duedate(&self, ctx: &Context, path: &Path, id: u64, due: DateTime<Utc>) -> Result<()> {
      let url = project_url(ctx, path, &format!("/milestones/{id}"))?;
      let payload = serde_json::json!({ "due_date": due.format("%Y-%m-%d").to_string() }).to_string();
      fetch::fetch_with_method(ctx, self, Method::PUT, &url, Some(&payload), &[], false)?;
      Ok(())
   }

   fn get_forks(&self, ctx: &Context, path: &Path, max: FetchLimit) -> Result<Vec<Fork>> {
      let url = project_url(ctx, path, "/forks")?;
      paginate::<Fork, GlRepo>(ctx, self, url, max)
   }

   fn fork_create(&self, ctx: &Context, path: &Path) -> Result<Fork> {
      let url = project_url(ctx, path, "/fork")?;
      let body = fetch::fetch_with_method(ctx, self, Method::POST, &url, None, &[], true)?
         .ok_or_else(|| GcliError::data("empty response creating fork"))?;
      Ok(serde_json::from_str::<GlRepo>(&body)?.into())
   }

   fn get_repos(&self, ctx: &Context, owner: &str, max: FetchLimit) -> Result<Vec<Repo>> {
      let url = format!("{}/users/{}/projects", ctx.account().api_base, urlencode(owner));
      paginate::<Repo, GlRepo>(ctx, self, url, max)
   }

   fn get_own_repos(&self, ctx: &Context, max: FetchLimit) -> Result<Vec<Repo>> {
      let url = format!("{}/projects?owned=true", ctx.account().api_base);
      paginate::<Repo, GlRepo>(ctx, self, url, max)
   }

   fn repo_create(&self, ctx: &Context, name: &str, opts: &RepoCreateOpts) -> Result<Repo> {
      let url = format!("{}/projects", ctx.account().api_base);
      let visibility = if opts.private { "private" } else { "public" };
      let payload = serde_json::json!({
         "name": name,
         "description": opts.description,
         "visibility": visibility,
      })
      .to_string();
      let body = fetch::fetch_with_method(ctx, self, Method::POST, &url, Some(&payload), &[], true)?
         .ok_or_else(|| GcliError::data("empty response creating project"))?;
      Ok(serde_json::from_str::<GlRepo>(&body)?.into())
   }

   fn repo_delete(&self, ctx: &Context, path: &Path) -> Result<()> {
      let url = project_url(ctx, path, "")?;
      fetch::fetch_with_method(ctx, self, Method::DELETE, &url, None, &[], false)?;
      Ok(())
   }

   fn repo_set_visibility(&self, ctx: &Context, path: &Path, private: bool) -> Result<()> {
      let url = project_url(ctx, path, "")?;
      let visibility = if private { "private" } else { "public" };
      let payload = serde_json::json!({ "visibility": visibility }).to_string();
      fetch::fetch_with_method(ctx, self, Method::PUT, &url, Some(&payload), &[], false)?;
      Ok(())
   }

   fn get_notifications(&self, ctx: &Context, max: FetchLimit) -> Result<Vec<Notification>> {
      let url = format!("{}/todos", ctx.account().api_base);
      fetch::fetch_list(
         ctx,
         self,
         &url,
         max,
         |body| {
            let raw: Vec<serde_json::Value> = serde_json::from_str(body)?;
            let items = raw
               .into_iter()
               .map(|v| Notification {
                  id:         v["id"].to_string(),
                  title:      v["target"]["title"].as_str().unwrap_or_default().to_string(),
                  reason:     v["action_name"].as_str().unwrap_or_default().to_string(),
                  unread:     v["state"].as_str() == Some("pending"),
                  updated_at: v["updated_at"]
                     .as_str()
                     .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                     .map(|d| d.with_timezone(&Utc))
                     .unwrap_or_else(Utc::now),
                  url:        v["target_url"].as_str().unwrap_or_default().to_string(),
               })
               .collect();
            Ok(Page { items, next_url: None })
         },
         None,
      )
   }

   fn notification_mark_as_read(&self, ctx: &Context, id: &str) -> Result<()> {
      let url = format!("{}/todos/{id}/mark_as_done", ctx.account().api_base);
      fetch::fetch_with_method(ctx, self, Method::POST, &url, None, &[], false)?;
      Ok(())
   }

   fn get_issue_comments(&self, ctx: &Context, path: &Path, max: FetchLimit) -> Result<Vec<Comment>> {
      let url = issue_url(ctx, path, "/notes")?;
      paginate::<Comment, GlComment>(ctx, self, url, max)
   }

   fn get_pull_comments(&self, ctx: &Context, path: &Path, max: FetchLimit) -> Result<Vec<Comment>> {
      let url = mr_url(ctx, path, "/notes")?;
      paginate::<Comment, GlComment>(ctx, self, url, max)
   }

   fn get_comment(&self, ctx: &Context, path: &Path, target_type: CommentTarget, comment_id: u64) -> Result<Comment> {
      let url = match target_type {
         CommentTarget::Issue => issue_url(ctx, path, &format!("/notes/{comment_id}"))?,
         CommentTarget::Pull => mr_url(ctx, path, &format!("/notes/{comment_id}"))?,
      };
      let body = fetch::fetch_one(ctx, self, &url, None)?;
      Ok(serde_json::from_str::<GlComment>(&body)?.into())
   }

   fn perform_submit_comment(&self, ctx: &Context, opts: &SubmitCommentOpts) -> Result<Comment> {
      let url = match opts.target_type {
         CommentTarget::Issue => issue_url(ctx, &opts.target, "/notes")?,
         CommentTarget::Pull => mr_url(ctx, &opts.target, "/notes")?,
      };
      let payload = serde_json::json!({ "body": opts.message }).to_string();
      let body = fetch::fetch_with_method(ctx, self, Method::POST, &url, Some(&payload), &[], true)?
         .ok_or_else(|| GcliError::data("empty response creating note"))?;
      Ok(serde_json::from_str::<GlComment>(&body)?.into())
   }

   fn get_sshkeys(&self, ctx: &Context, max: FetchLimit) -> Result<Vec<SshKey>> {
      let url = format!("{}/user/keys", ctx.account().api_base);
      fetch::fetch_list(
         ctx,
         self,
         &url,
         max,
         |body| {
            let raw: Vec<serde_json::Value> = serde_json::from_str(body)?;
            let items = raw
               .into_iter()
               .map(|v| SshKey {
                  id:         v["id"].as_u64().unwrap_or_default(),
                  title:      v["title"].as_str().unwrap_or_default().to_string(),
                  key:        v["key"].as_str().unwrap_or_default().to_string(),
                  created_at: v["created_at"]
                     .as_str()
                     .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                     .map(|d| d.with_timezone(&Utc))
                     .unwrap_or_else(Utc::now),
               })
               .collect();
            Ok(Page { items, next_url: None })
         },
         None,
      )
   }

   fn sshkey_create(&self, ctx: &Context, title: &str, key: &str) -> Result<SshKey> {
      let url = format!("{}/user/keys", ctx.account().api_base);
      let payload = serde_json::json!({ "title": title, "key": key }).to_string();
      let body = fetch::fetch_with_method(ctx, self, Method::POST, &url, Some(&payload), &[], true)?
         .ok_or_else(|| GcliError::data("empty response creating ssh key"))?;
      let v: serde_json::Value = serde_json::from_str(&body)?;
      Ok(SshKey {
         id:         v["id"].as_u64().unwrap_or_default(),
         title:      v["title"].as_str().unwrap_or_default().to_string(),
         key:        v["key"].as_str().unwrap_or_default().to_string(),
         created_at: Utc::now(),
      })
   }

   fn sshkey_delete(&self, ctx: &Context, id: u64) -> Result<()> {
      let url = format!("{}/user/keys/{id}", ctx.account().api_base);
      fetch::fetch_with_method(ctx, self, Method::DELETE, &url, None, &[], false)?;
      Ok(())
   }

   fn get_pipelines(&self, ctx: &Context, path: &Path, max: FetchLimit) -> Result<Vec<Pipeline>> {
      let url = project_url(ctx, path, "/pipelines")?;
      paginate::<Pipeline, GlPipeline>(ctx, self, url, max)
   }

   fn get_mr_pipelines(&self, ctx: &Context, path: &Path, max: FetchLimit) -> Result<Vec<Pipeline>> {
      let url = mr_url(ctx, path, "/pipelines")?;
      paginate::<Pipeline, GlPipeline>(ctx, self, url, max)
   }

   fn get_pipeline(&self, ctx: &Context, path: &Path, id: u64) -> Result<Pipeline> {
      let url = project_url(ctx, path, &format!("/pipelines/{id}"))?;
      let body = fetch::fetch_one(ctx, self, &url, None)?;
      Ok(serde_json::from_str::<GlPipeline>(&body)?.into())
   }

   fn get_pipeline_jobs(&self, ctx: &Context, path: &Path, id: u64, max: FetchLimit) -> Result<Vec<Job>> {
      let url = project_url(ctx, path, &format!("/pipelines/{id}/jobs"))?;
      paginate::<Job, GlJob>(ctx, self, url, max)
   }

   fn get_pipeline_children(&self, ctx: &Context, path: &Path, id: u64) -> Result<Vec<Pipeline>> {
      let url = project_url(ctx, path, &format!("/pipelines/{id}/bridges"))?;
      paginate::<Pipeline, GlPipeline>(ctx, self, url, FetchLimit::All)
   }

   fn get_job(&self, ctx: &Context, path: &Path, id: u64) -> Result<Job> {
      let url = project_url(ctx, path, &format!("/jobs/{id}"))?;
      let body = fetch::fetch_one(ctx, self, &url, None)?;
      Ok(serde_json::from_str::<GlJob>(&body)?.into())
   }

   fn job_get_log(&self, ctx: &Context, path: &Path, id: u64) -> Result<String> {
      let url = project_url(ctx, path, &format!("/jobs/{id}/trace"))?;
      fetch::fetch_one(ctx, self, &url, None)
   }

   fn job_cancel(&self, ctx: &Context, path: &Path, id: u64) -> Result<()> {
      let url = project_url(ctx, path, &format!("/jobs/{id}/cancel"))?;
      fetch::fetch_with_method(ctx, self, Method::POST, &url, None, &[], false)?;
      Ok(())
   }

   fn job_retry(&self, ctx: &Context, path: &Path, id: u64) -> Result<()> {
      let url = project_url(ctx, path, &format!("/jobs/{id}/retry"))?;
      fetch::fetch_with_method(ctx, self, Method::POST, &url, None, &[], false)?;
      Ok(())
   }

   fn job_download_artifacts(&self, ctx: &Context, path: &Path, id: u64, out_file: &std::path::Path) -> Result<()> {
      let url = project_url(ctx, path, &format!("/jobs/{id}/artifacts"))?;
      let body = fetch::fetch_one(ctx, self, &url, Some("application/zip"))?;
      let mut f = std::fs::File::create(out_file)?;
      f.write_all(body.as_bytes())?;
      Ok(())
   }
}

impl GitLab {
   fn lookup_user_id(&self, ctx: &Context, username: &str) -> Result<u64> {
      let url = format!("{}/users?username={}", ctx.account().api_base, urlencode(username));
      let body = fetch::fetch_one(ctx, self, &url, None)?;
      let users: Vec<serde_json::Value> = serde_json::from_str(&body)?;
      users
         .first()
         .and_then(|u| u["id"].as_u64())
         .ok_or_else(|| GcliError::data(format!("no such user '{username}'")))
   }

   /// Works around a GitLab race condition (gitlab#353984): a freshly
   /// created MR briefly reports `merge_status != can_be_merged` before the
   /// mergeability check catches up, so automerge must poll until it does.
   fn wait_until_mergeable(&self, ctx: &Context, path: &Path) -> Result<()> {
      for _ in 0..AUTOMERGE_POLL_ATTEMPTS {
         let pull = self.get_pull(ctx, path)?;
         if pull.mergeable {
            return Ok(());
         }
         std::thread::sleep(std::time::Duration::from_secs(1));
      }
      Err(GcliError::transport("timed out waiting for merge request to become mergeable"))
   }
}

fn set_issue_state(ctx: &Context, forge: &dyn Forge, path: &Path, event: &str) -> Result<()> {
   let url = issue_url(ctx, path, "")?;
   let payload = serde_json::json!({ "state_event": event }).to_string();
   fetch::fetch_with_method(ctx, forge, Method::PUT, &url, Some(&payload), &[], false)?;
   Ok(())
}

fn set_mr_state(ctx: &Context, forge: &dyn Forge, path: &Path, event: &str) -> Result<()> {
   let url = mr_url(ctx, path, "")?;
   let payload = serde_json::json!({ "state_event": event }).to_string();
   fetch::fetch_with_method(ctx, forge, Method::PUT, &url, Some(&payload), &[], false)?;
   Ok(())
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn urlencode_escapes_reserved_characters() {
      assert_eq!(urlencode("owner/repo"), "owner%2Frepo");
      assert_eq!(urlencode("safe-Name_1.2~3"), "safe-Name_1.2~3");
   }

   #[test]
   fn line_code_is_sha1_of_filename_plus_both_line_numbers() {
      let code = line_code("src/main.rs", 10, 12);
      assert!(code.ends_with("_10_12"));
      assert_eq!(code.len(), 40 + "_10_12".len());
   }

   #[test]
   fn pull_request_merged_is_derived_from_state() {
      let raw = serde_json::json!({
         "iid": 1, "title": "t", "author": {"username": "a"}, "state": "merged",
         "created_at": "2024-01-01T00:00:00Z", "source_branch": "feat", "target_branch": "main",
         "sha": "abc", "web_url": "u"
      });
      let mr: GlMr = serde_json::from_value(raw).unwrap();
      let pull: PullRequest = mr.into();
      assert!(pull.merged);
   }
}
