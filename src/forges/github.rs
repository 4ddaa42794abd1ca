//! GitHub adapter — the reference, most complete backend.
//!
//! URL construction follows `api.rs`'s `format!("{}/chat/completions",
//! config.api_base_url)` idiom; JSON bodies go through typed
//! `Serialize`/`Deserialize` structs the way `api.rs`'s `ApiRequest`/
//! `SummaryOutput` do, one pair per endpoint shape, converted into/from the
//! shared domain types in `types.rs`.

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::capability::{Forge, IssueSubmitOpts, PullSubmitOpts, RepoCreateOpts, SubmitCommentOpts};
use crate::context::Context;
use crate::error::{GcliError, Result};
use crate::fetch::{self, Page};
use crate::path::Path;
use crate::review::ReviewSubmission;
use crate::types::{
   Comment, CommentTarget, FetchLimit, Fork, Issue, Label, MergeFlags, Milestone, Notification,
   Pipeline, PullRequest, QuirkMask, Repo, SearchFilters, SshKey,
};

pub struct GitHub;

fn repo_url(ctx: &Context, path: &Path, suffix: &str) -> Result<String> {
   let (owner, repo) = path
      .owner_repo()
      .ok_or_else(|| GcliError::usage("github requires an owner/repo path"))?;
   Ok(format!("{}/repos/{owner}/{repo}{suffix}", ctx.account().api_base))
}

fn issue_number(path: &Path) -> Result<u64> {
   path.id().filter(|id| *id > 0).ok_or_else(|| GcliError::usage("missing issue/pull number"))
}

#[derive(Debug, Deserialize)]
struct GhUser {
   #[serde(default)]
   login: String,
}

#[derive(Debug, Deserialize)]
struct GhLabel {
   name: String,
}

#[derive(Debug, Deserialize)]
struct GhMilestoneRef {
   title: String,
}

#[derive(Debug, Deserialize)]
struct GhIssue {
   number:            u64,
   title:             String,
   #[serde(default)]
   body:              Option<String>,
   user:              GhUser,
   state:             String,
   created_at:        DateTime<Utc>,
   comments:          u64,
   locked:            bool,
   html_url:          String,
   #[serde(default)]
   milestone:         Option<GhMilestoneRef>,
   #[serde(default)]
   labels:            Vec<GhLabel>,
   #[serde(default)]
   assignees:         Vec<GhUser>,
   #[serde(default)]
   pull_request:      Option<serde_json::Value>,
}

impl From<GhIssue> for Issue {
   fn from(i: GhIssue) -> Self {
      Self {
         number:         i.number,
         title:          i.title,
         body:           i.body.unwrap_or_default(),
         author:         i.user.login,
         state:          i.state,
         created_at:     i.created_at,
         comments_count: i.comments,
         locked:         i.locked,
         url:            i.html_url,
         product:        String::new(),
         component:      String::new(),
         milestone:      i.milestone.map(|m| m.title),
         labels:         i.labels.into_iter().map(|l| l.name).collect(),
         assignees:      i.assignees.into_iter().map(|a| a.login).collect(),
         is_pr:          i.pull_request.is_some(),
      }
   }
}

#[derive(Debug, Deserialize)]
struct GhPull {
   number:         u64,
   #[serde(default)]
   node_id:        String,
   title:          String,
   #[serde(default)]
   body:           Option<String>,
   user:           GhUser,
   state:          String,
   created_at:     DateTime<Utc>,
   head:           GhBranchRef,
   base:           GhBranchRef,
   #[serde(default)]
   milestone:      Option<GhMilestoneRef>,
   #[serde(default)]
   comments:       u64,
   #[serde(default)]
   additions:      u64,
   #[serde(default)]
   deletions:      u64,
   #[serde(default)]
   commits:        u64,
   #[serde(default)]
   changed_files:  u64,
   html_url:       String,
   #[serde(default)]
   labels:         Vec<GhLabel>,
   #[serde(default)]
   requested_reviewers: Vec<GhUser>,
   #[serde(default)]
   merged:         bool,
   #[serde(default)]
   mergeable:      Option<bool>,
   #[serde(default)]
   draft:          bool,
   #[serde(default)]
   auto_merge:     Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GhBranchRef {
   label: String,
   sha:   String,
}

impl From<GhPull> for PullRequest {
   fn from(p: GhPull) -> Self {
      Self {
         number:        p.number,
         node_id:       p.node_id,
         title:         p.title,
         body:          p.body.unwrap_or_default(),
         author:        p.user.login,
         state:         p.state,
         created_at:    p.created_at,
         head_label:    p.head.label,
         base_label:    p.base.label,
         head_sha:      p.head.sha,
         base_sha:      p.base.sha,
         start_sha:     String::new(),
         milestone:     p.milestone.map(|m| m.title),
         comments:      p.comments,
         additions:     p.additions,
         deletions:     p.deletions,
         commits:       p.commits,
         changed_files: p.changed_files,
         coverage:      None,
         web_url:       p.html_url,
         labels:        p.labels.into_iter().map(|l| l.name).collect(),
         reviewers:     p.requested_reviewers.into_iter().map(|u| u.login).collect(),
         merged:        p.merged,
         mergeable:     p.mergeable.unwrap_or(false),
         draft:         p.draft,
         automerge:     p.auto_merge.is_some(),
      }
   }
}

#[derive(Debug, Deserialize)]
struct GhComment {
   id:         u64,
   user:       GhUser,
   created_at: DateTime<Utc>,
   body:       String,
}

impl From<GhComment> for Comment {
   fn from(c: GhComment) -> Self {
      Self { id: c.id, author: c.user.login, date: c.created_at, body: c.body }
   }
}

#[derive(Debug, Deserialize)]
struct GhLabelFull {
   id:   u64,
   name: String,
   #[serde(default)]
   description: Option<String>,
   color: String,
}

impl From<GhLabelFull> for Label {
   fn from(l: GhLabelFull) -> Self {
      Self {
         id:          l.id,
         name:        l.name,
         description: l.description.unwrap_or_default(),
         colour:      u32::from_str_radix(&l.color, 16).unwrap_or(0),
      }
   }
}

#[derive(Debug, Deserialize)]
struct GhMilestone {
   number:             u64,
   title:              String,
   #[serde(default)]
   description:        Option<String>,
   state:              String,
   created_at:         DateTime<Utc>,
   updated_at:         DateTime<Utc>,
   #[serde(default)]
   due_on:             Option<DateTime<Utc>>,
   open_issues:        u64,
   closed_issues:      u64,
   html_url:           String,
}

impl From<GhMilestone> for Milestone {
   fn from(m: GhMilestone) -> Self {
      Self {
         id:                  m.number,
         title:               m.title,
         description:         m.description.unwrap_or_default(),
         state:               m.state,
         created_at:          m.created_at,
         updated_at:          m.updated_at,
         due_date:            m.due_on,
         expired:             false,
         open_issues_count:   m.open_issues,
         closed_issues_count: m.closed_issues,
         web_url:             m.html_url,
      }
   }
}

#[derive(Debug, Deserialize)]
struct GhRepo {
   name:        String,
   owner:       GhUser,
   #[serde(default)]
   description: Option<String>,
   private:     bool,
   fork:        bool,
   html_url:    String,
}

impl From<GhRepo> for Repo {
   fn from(r: GhRepo) -> Self {
      Self {
         owner:       r.owner.login,
         name:        r.name,
         description: r.description.unwrap_or_default(),
         private:     r.private,
         fork:        r.fork,
         web_url:     r.html_url,
      }
   }
}

impl From<GhRepo> for Fork {
   fn from(r: GhRepo) -> Self {
      Self {
         owner:     r.owner.login.clone(),
         repo:      r.name.clone(),
         full_name: format!("{}/{}", r.owner.login, r.name),
         web_url:   r.html_url,
      }
   }
}

#[derive(Debug, Deserialize)]
struct GhNotification {
   id:         String,
   subject:    GhNotificationSubject,
   reason:     String,
   unread:     bool,
   updated_at: DateTime<Utc>,
   #[serde(default)]
   url:        String,
}

#[derive(Debug, Deserialize)]
struct GhNotificationSubject {
   title: String,
}

impl From<GhNotification> for Notification {
   fn from(n: GhNotification) -> Self {
      Self {
         id:         n.id,
         title:      n.subject.title,
         reason:     n.reason,
         unread:     n.unread,
         updated_at: n.updated_at,
         url:        n.url,
      }
   }
}

#[derive(Debug, Deserialize)]
struct GhSshKey {
   id:         u64,
   title:      String,
   key:        String,
   created_at: DateTime<Utc>,
}

impl From<GhSshKey> for SshKey {
   fn from(k: GhSshKey) -> Self {
      Self { id: k.id, title: k.title, key: k.key, created_at: k.created_at }
   }
}

#[derive(Debug, Deserialize)]
struct GhCheckRunsResponse {
   check_runs: Vec<GhCheckRun>,
}

#[derive(Debug, Deserialize)]
struct GhCheckRun {
   id:         u64,
   name:       String,
   status:     String,
   #[serde(default)]
   conclusion: Option<String>,
   head_sha:   String,
   html_url:   String,
   started_at: DateTime<Utc>,
}

impl From<GhCheckRun> for Pipeline {
   fn from(c: GhCheckRun) -> Self {
      Self {
         id:         c.id,
         status:     c.conclusion.unwrap_or(c.status),
         ref_name:   c.name,
         sha:        c.head_sha,
         web_url:    c.html_url,
         created_at: c.started_at,
      }
   }
}

#[derive(Serialize)]
struct LabelsBody<'a> {
   labels: &'a [String],
}

fn paginate<T, U>(
   ctx: &Context,
   forge: &dyn Forge,
   url: String,
   max: FetchLimit,
) -> Result<Vec<T>>
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

impl Forge for GitHub {
   fn search_issues(
      &self,
      ctx: &Context,
      path: &Path,
      filters: &SearchFilters,
      max: FetchLimit,
   ) -> Result<Vec<Issue>> {
      let (owner, repo) = path
         .owner_repo()
         .ok_or_else(|| GcliError::usage("github requires an owner/repo path"))?;
      let state = if filters.all { "all" } else { "open" };
      let mut url = format!("{}/repos/{owner}/{repo}/issues?state={state}", ctx.account().api_base);
      if let Some(label) = &filters.label {
         url.push_str(&format!("&labels={label}"));
      }
      if let Some(milestone) = &filters.milestone {
         url.push_str(&format!("&milestone={milestone}"));
      }
      let mut issues: Vec<Issue> = paginate::<Issue, GhIssue>(ctx, self, url, max)?;
      if let Some(author) = &filters.author {
         issues.retain(|i| &i.author == author);
      }
      issues.retain(|i| !i.is_pr);
      Ok(issues)
   }

   fn get_issue(&self, ctx: &Context, path: &Path) -> Result<Issue> {
      let n = issue_number(path)?;
      let url = repo_url(ctx, path, &format!("/issues/{n}"))?;
      let body = fetch::fetch_one(ctx, self, &url, None)?;
      Ok(serde_json::from_str::<GhIssue>(&body)?.into())
   }

   fn submit_issue(&self, ctx: &Context, path: &Path, opts: &IssueSubmitOpts) -> Result<Issue> {
      let url = repo_url(ctx, path, "/issues")?;
      let payload = serde_json::json!({ "title": opts.title, "body": opts.body }).to_string();
      let body = fetch::fetch_with_method(ctx, self, Method::POST, &url, Some(&payload), &[], true)?
         .ok_or_else(|| GcliError::data("empty response creating issue"))?;
      Ok(serde_json::from_str::<GhIssue>(&body)?.into())
   }

   fn issue_close(&self, ctx: &Context, path: &Path) -> Result<()> {
      patch_state(ctx, self, path, "issues", "closed")
   }

   fn issue_reopen(&self, ctx: &Context, path: &Path) -> Result<()> {
      patch_state(ctx, self, path, "issues", "open")
   }

   fn issue_assign(&self, ctx: &Context, path: &Path, user: &str) -> Result<()> {
      let n = issue_number(path)?;
      let url = repo_url(ctx, path, &format!("/issues/{n}/assignees"))?;
      let payload = serde_json::json!({ "assignees": [user] }).to_string();
      fetch::fetch_with_method(ctx, self, Method::POST, &url, Some(&payload), &[], false)?;
      Ok(())
   }

   fn issue_add_labels(&self, ctx: &Context, path: &Path, labels: &[String]) -> Result<()> {
      let n = issue_number(path)?;
      let url = repo_url(ctx, path, &format!("/issues/{n}/labels"))?;
      let payload = serde_json::to_string(&LabelsBody { labels })?;
      fetch::fetch_with_method(ctx, self, Method::POST, &url, Some(&payload), &[], false)?;
      Ok(())
   }

   fn issue_remove_labels(&self, ctx: &Context, path: &Path, labels: &[String]) -> Result<()> {
      let n = issue_number(path)?;
      for label in labels {
         let url = repo_url(ctx, path, &format!("/issues/{n}/labels/{label}"))?;
         fetch::fetch_with_method(ctx, self, Method::DELETE, &url, None, &[], false)?;
      }
      Ok(())
   }

   fn issue_set_milestone(&self, ctx: &Context, path: &Path, milestone_id: u64) -> Result<()> {
      let n = issue_number(path)?;
      let url = repo_url(ctx, path, &format!("/issues/{n}"))?;
      let payload = serde_json::json!({ "milestone": milestone_id }).to_string();
      fetch::fetch_with_method(ctx, self, Method::PATCH, &url, Some(&payload), &[], false)?;
      Ok(())
   }

   fn issue_clear_milestone(&self, ctx: &Context, path: &Path) -> Result<()> {
      let n = issue_number(path)?;
      let url = repo_url(ctx, path, &format!("/issues/{n}"))?;
      let payload = serde_json::json!({ "milestone": null }).to_string();
      fetch::fetch_with_method(ctx, self, Method::PATCH, &url, Some(&payload), &[], false)?;
      Ok(())
   }

   fn issue_set_title(&self, ctx: &Context, path: &Path, title: &str) -> Result<()> {
      let n = issue_number(path)?;
      let url = repo_url(ctx, path, &format!("/issues/{n}"))?;
      let payload = serde_json::json!({ "title": title }).to_string();
      fetch::fetch_with_method(ctx, self, Method::PATCH, &url, Some(&payload), &[], false)?;
      Ok(())
   }

   fn search_pulls(
      &self,
      ctx: &Context,
      path: &Path,
      filters: &SearchFilters,
      max: FetchLimit,
   ) -> Result<Vec<PullRequest>> {
      let (owner, repo) = path
         .owner_repo()
         .ok_or_else(|| GcliError::usage("github requires an owner/repo path"))?;
      let state = if filters.all { "all" } else { "open" };
      let url = format!("{}/repos/{owner}/{repo}/pulls?state={state}", ctx.account().api_base);
      paginate::<PullRequest, GhPull>(ctx, self, url, max)
   }

   fn get_pull(&self, ctx: &Context, path: &Path) -> Result<PullRequest> {
      let n = issue_number(path)?;
      let url = repo_url(ctx, path, &format!("/pulls/{n}"))?;
      let body = fetch::fetch_one(ctx, self, &url, None)?;
      Ok(serde_json::from_str::<GhPull>(&body)?.into())
   }

   fn get_pull_commits(&self, ctx: &Context, path: &Path) -> Result<Vec<crate::types::Commit>> {
      let n = issue_number(path)?;
      let url = repo_url(ctx, path, &format!("/pulls/{n}/commits"))?;
      let body = fetch::fetch_one(ctx, self, &url, None)?;
      let raw: Vec<serde_json::Value> = serde_json::from_str(&body)?;
      Ok(
         raw
            .into_iter()
            .map(|v| crate::types::Commit {
               short_sha: v["sha"].as_str().unwrap_or_default().chars().take(7).collect(),
               long_sha:  v["sha"].as_str().unwrap_or_default().to_string(),
               message:   v["commit"]["message"].as_str().unwrap_or_default().to_string(),
               date:      v["commit"]["author"]["date"]
                  .as_str()
                  .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                  .map(|d| d.with_timezone(&Utc))
                  .unwrap_or_else(Utc::now),
               author:    v["commit"]["author"]["name"].as_str().unwrap_or_default().to_string(),
               email:     v["commit"]["author"]["email"].as_str().unwrap_or_default().to_string(),
            })
            .collect(),
      )
   }

   fn pull_get_diff(&self, ctx: &Context, path: &Path) -> Result<String> {
      let n = issue_number(path)?;
      let url = repo_url(ctx, path, &format!("/pulls/{n}"))?;
      fetch::fetch_one(ctx, self, &url, Some("application/vnd.github.v3.diff"))
   }

   fn pull_get_patch(&self, ctx: &Context, path: &Path) -> Result<String> {
      let n = issue_number(path)?;
      let url = repo_url(ctx, path, &format!("/pulls/{n}"))?;
      fetch::fetch_one(ctx, self, &url, Some("application/vnd.github.v3.patch"))
   }

   fn pull_get_checks(&self, ctx: &Context, path: &Path) -> Result<Vec<Pipeline>> {
      let pull = self.get_pull(ctx, path)?;
      let url = repo_url(ctx, path, &format!("/commits/{}/check-runs", pull.head_sha))?;
      let body = fetch::fetch_one(ctx, self, &url, None)?;
      let response: GhCheckRunsResponse = serde_json::from_str(&body)?;
      Ok(response.check_runs.into_iter().map(Into::into).collect())
   }

   fn pull_merge(&self, ctx: &Context, path: &Path, flags: MergeFlags) -> Result<()> {
      let n = issue_number(path)?;
      let head_sha_branch = if flags.has(MergeFlags::DELETEHEAD) {
         Some(self.get_pull(ctx, path)?.head_label)
      } else {
         None
      };

      let method = if flags.has(MergeFlags::SQUASH) { "squash" } else { "merge" };
      let url = repo_url(ctx, path, &format!("/pulls/{n}/merge"))?;
      let payload = serde_json::json!({ "merge_method": method }).to_string();
      fetch::fetch_with_method(ctx, self, Method::PUT, &url, Some(&payload), &[], false)?;

      if let Some(label) = head_sha_branch
         && let Some(branch) = label.split(':').nth(1)
      {
         let (owner, repo) =
            path.owner_repo().ok_or_else(|| GcliError::usage("github requires an owner/repo path"))?;
         let url = format!("{}/repos/{owner}/{repo}/git/refs/heads/{branch}", ctx.account().api_base);
         fetch::fetch_with_method(ctx, self, Method::DELETE, &url, None, &[], false)?;
      }
      Ok(())
   }

   fn pull_close(&self, ctx: &Context, path: &Path) -> Result<()> {
      patch_state(ctx, self, path, "pulls", "closed")
   }

   fn pull_reopen(&self, ctx: &Context, path: &Path) -> Result<()> {
      patch_state(ctx, self, path, "pulls", "open")
   }

   fn pull_add_labels(&self, ctx: &Context, path: &Path, labels: &[String]) -> Result<()> {
      self.issue_add_labels(ctx, path, labels)
   }

   fn pull_remove_labels(&self, ctx: &Context, path: &Path, labels: &[String]) -> Result<()> {
      self.issue_remove_labels(ctx, path, labels)
   }

   fn pull_set_milestone(&self, ctx: &Context, path: &Path, milestone_id: u64) -> Result<()> {
      self.issue_set_milestone(ctx, path, milestone_id)
   }

   fn pull_clear_milestone(&self, ctx: &Context, path: &Path) -> Result<()> {
      self.issue_clear_milestone(ctx, path)
   }

   fn pull_add_reviewer(&self, ctx: &Context, path: &Path, user: &str) -> Result<()> {
      let n = issue_number(path)?;
      let url = repo_url(ctx, path, &format!("/pulls/{n}/requested_reviewers"))?;
      let payload = serde_json::json!({ "reviewers": [user] }).to_string();
      fetch::fetch_with_method(ctx, self, Method::POST, &url, Some(&payload), &[], false)?;
      Ok(())
   }

   fn pull_set_title(&self, ctx: &Context, path: &Path, title: &str) -> Result<()> {
      self.issue_set_title(ctx, path, title)
   }

   fn pull_create_review(
      &self,
      ctx: &Context,
      path: &Path,
      submission: &ReviewSubmission,
   ) -> Result<()> {
      let n = issue_number(path)?;
      let url = repo_url(ctx, path, &format!("/pulls/{n}/reviews"))?;
      let event = match submission.outcome {
         crate::review::ReviewOutcome::Accept => "APPROVE",
         crate::review::ReviewOutcome::RequestChanges => "REQUEST_CHANGES",
         crate::review::ReviewOutcome::Comment | crate::review::ReviewOutcome::Postpone => "COMMENT",
      };
      let comments: Vec<serde_json::Value> = submission
         .comments
         .iter()
         .map(|c| {
            let mut obj = serde_json::json!({
               "path": c.filename,
               "body": c.comment,
               "line": c.new_line_end,
            });
            if c.new_line_start != c.new_line_end {
               obj["start_line"] = serde_json::json!(c.new_line_start);
            }
            obj
         })
         .collect();
      let payload = serde_json::json!({
         "event": event,
         "body": submission.body,
         "comments": comments,
      })
      .to_string();
      fetch::fetch_with_method(ctx, self, Method::POST, &url, Some(&payload), &[], false)?;
      Ok(())
   }

   fn quirks(&self) -> QuirkMask {
      QuirkMask::HAS_AUTOMERGE
   }

   fn perform_submit_pull(&self, ctx: &Context, opts: &PullSubmitOpts) -> Result<PullRequest> {
      let (owner, repo) = opts
         .path
         .owner_repo()
         .ok_or_else(|| GcliError::usage("github requires an owner/repo path"))?;
      let url = format!("{}/repos/{owner}/{repo}/pulls", ctx.account().api_base);
      let payload = serde_json::json!({
         "title": opts.title,
         "body": opts.body,
         "head": opts.head,
         "base": opts.base,
      })
      .to_string();
      let body = fetch::fetch_with_method(ctx, self, Method::POST, &url, Some(&payload), &[], true)?
         .ok_or_else(|| GcliError::data("empty response creating pull"))?;
      let pull: PullRequest = serde_json::from_str::<GhPull>(&body)?.into();

      if !opts.labels.is_empty() {
         self.issue_add_labels(ctx, &opts.path, &opts.labels)?;
      }
      for reviewer in &opts.reviewers {
         self.pull_add_reviewer(ctx, &opts.path, reviewer)?;
      }
      if opts.automerge {
         let mutation = serde_json::json!({
            "query": "mutation($id: ID!) { enablePullRequestAutoMerge(input: {pullRequestId: $id, mergeMethod: MERGE}) { clientMutationId } }",
            "variables": { "id": pull.node_id },
         })
         .to_string();
         let graphql_url = format!("{}/graphql", ctx.account().api_base.trim_end_matches("/v3"));
         fetch::fetch_with_method(ctx, self, Method::POST, &graphql_url, Some(&mutation), &[], false)?;
      }
      Ok(pull)
   }

   fn get_labels(&self, ctx: &Context, path: &Path, max: FetchLimit) -> Result<Vec<Label>> {
      let url = repo_url(ctx, path, "/labels")?;
      paginate::<Label, GhLabelFull>(ctx, self, url, max)
   }

   fn create_label(&self, ctx: &Context, path: &Path, label: &Label) -> Result<Label> {
      let url = repo_url(ctx, path, "/labels")?;
      let payload = serde_json::json!({
         "name": label.name,
         "color": format!("{:06x}", label.colour),
         "description": label.description,
      })
      .to_string();
      let body = fetch::fetch_with_method(ctx, self, Method::POST, &url, Some(&payload), &[], true)?
         .ok_or_else(|| GcliError::data("empty response creating label"))?;
      Ok(serde_json::from_str::<GhLabelFull>(&body)?.into())
   }

   fn delete_label(&self, ctx: &Context, path: &Path, name: &str) -> Result<()> {
      let url = repo_url(ctx, path, &format!("/labels/{name}"))?;
      fetch::fetch_with_method(ctx, self, Method::DELETE, &url, None, &[], false)?;
      Ok(())
   }

   fn get_milestones(&self, ctx: &Context, path: &Path, max: FetchLimit) -> Result<Vec<Milestone>> {
      let url = repo_url(ctx, path, "/milestones")?;
      paginate::<Milestone, GhMilestone>(ctx, self, url, max)
   }

   fn get_milestone(&self, ctx: &Context, path: &Path, id: u64) -> Result<Milestone> {
      let url = repo_url(ctx, path, &format!("/milestones/{id}"))?;
      let body = fetch::fetch_one(ctx, self, &url, None)?;
      Ok(serde_json::from_str::<GhMilestone>(&body)?.into())
   }

   fn create_milestone(&self, ctx: &Context, path: &Path, title: &str) -> Result<Milestone> {
      let url = repo_url(ctx, path, "/milestones")?;
      let payload = serde_json::json!({ "title": title }).to_string();
      let body = fetch::fetch_with_method(ctx, self, Method::POST, &url, Some(&payload), &[], true)?
         .ok_or_else(|| GcliError::data("empty response creating milestone"))?;
      Ok(serde_json::from_str::<GhMilestone>(&body)?.into())
   }

   fn delete_milestone(&self, ctx: &Context, path: &Path, id: u64) -> Result<()> {
      let url = repo_url(ctx, path, &format!("/milestones/{id}"))?;
      fetch::fetch_with_method(ctx, self, Method::DELETE, &url, None, &[], false)?;
      Ok(())
   }

   fn milestone_get_issues(
      &self,
      ctx: &Context,
      path: &Path,
      id: u64,
      max: FetchLimit,
   ) -> Result<Vec<Issue>> {
      let url = repo_url(ctx, path, &format!("/issues?milestone={id}&state=all"))?;
      let mut issues = paginate::<Issue, GhIssue>(ctx, self, url, max)?;
      issues.retain(|i| !i.is_pr);
      Ok(issues)
   }

   fn milestone_set_duedate(
      &self,
      ctx: &Context,
      path: &Path,
      id: u64,
      due: DateTime<Utc>,
   ) -> Result<()> {
      let url = repo_url(ctx, path, &format!("/milestones/{id}"))?;
      let payload = serde_json::json!({ "due_on": due.to_rfc3339() }).to_string();
      fetch::fetch_with_method(ctx, self, Method::PATCH, &url, Some(&payload), &[], false)?;
      Ok(())
   }

   fn get_forks(&self, ctx: &Context, path: &Path, max: FetchLimit) -> Result<Vec<Fork>> {
      let url = repo_url(ctx, path, "/forks")?;
      paginate::<Fork, GhRepo>(ctx, self, url, max)
   }

   fn fork_create(&self, ctx: &Context, path: &Path) -> Result<Fork> {
      let url = repo_url(ctx, path, "/forks")?;
      let body = fetch::fetch_with_method(ctx, self, Method::POST, &url, None, &[], true)?
         .ok_or_else(|| GcliError::data("empty response creating fork"))?;
      Ok(serde_json::from_str::<GhRepo>(&body)?.into())
   }

   fn get_repos(&self, ctx: &Context, owner: &str, max: FetchLimit) -> Result<Vec<Repo>> {
      let url = format!("{}/users/{owner}/repos", ctx.account().api_base);
      paginate::<Repo, GhRepo>(ctx, self, url, max)
   }

   fn get_own_repos(&self, ctx: &Context, max: FetchLimit) -> Result<Vec<Repo>> {
      let url = format!("{}/user/repos", ctx.account().api_base);
      paginate::<Repo, GhRepo>(ctx, self, url, max)
   }

   fn repo_create(&self, ctx: &Context, name: &str, opts: &RepoCreateOpts) -> Result<Repo> {
      let url = format!("{}/user/repos", ctx.account().api_base);
      let payload = serde_json::json!({
         "name": name,
         "description": opts.description,
         "private": opts.private,
      })
      .to_string();
      let body = fetch::fetch_with_method(ctx, self, Method::POST, &url, Some(&payload), &[], true)?
         .ok_or_else(|| GcliError::data("empty response creating repo"))?;
      Ok(serde_json::from_str::<GhRepo>(&body)?.into())
   }

   fn repo_delete(&self, ctx: &Context, path: &Path) -> Result<()> {
      let url = repo_url(ctx, path, "")?;
      fetch::fetch_with_method(ctx, self, Method::DELETE, &url, None, &[], false)?;
      Ok(())
   }

   fn repo_set_visibility(&self, ctx: &Context, path: &Path, private: bool) -> Result<()> {
      let url = repo_url(ctx, path, "")?;
      let payload = serde_json::json!({ "private": private }).to_string();
      fetch::fetch_with_method(ctx, self, Method::PATCH, &url, Some(&payload), &[], false)?;
      Ok(())
   }

   fn get_notifications(&self, ctx: &Context, max: FetchLimit) -> Result<Vec<Notification>> {
      let url = format!("{}/notifications", ctx.account().api_base);
      paginate::<Notification, GhNotification>(ctx, self, url, max)
   }

   fn notification_mark_as_read(&self, ctx: &Context, id: &str) -> Result<()> {
      let url = format!("{}/notifications/threads/{id}", ctx.account().api_base);
      fetch::fetch_with_method(ctx, self, Method::PATCH, &url, None, &[], false)?;
      Ok(())
   }

   fn get_issue_comments(&self, ctx: &Context, path: &Path, max: FetchLimit) -> Result<Vec<Comment>> {
      let n = issue_number(path)?;
      let url = repo_url(ctx, path, &format!("/issues/{n}/comments"))?;
      paginate::<Comment, GhComment>(ctx, self, url, max)
   }

   fn get_pull_comments(&self, ctx: &Context, path: &Path, max: FetchLimit) -> Result<Vec<Comment>> {
      let n = issue_number(path)?;
      let url = repo_url(ctx, path, &format!("/pulls/{n}/comments"))?;
      paginate::<Comment, GhComment>(ctx, self, url, max)
   }

   fn get_comment(
      &self,
      ctx: &Context,
      path: &Path,
      _target_type: CommentTarget,
      comment_id: u64,
   ) -> Result<Comment> {
      let url = repo_url(ctx, path, &format!("/issues/comments/{comment_id}"))?;
      let body = fetch::fetch_one(ctx, self, &url, None)?;
      Ok(serde_json::from_str::<GhComment>(&body)?.into())
   }

   fn perform_submit_comment(&self, ctx: &Context, opts: &SubmitCommentOpts) -> Result<Comment> {
      let n = issue_number(&opts.target)?;
      let suffix = match opts.target_type {
         CommentTarget::Issue => format!("/issues/{n}/comments"),
         CommentTarget::Pull => format!("/issues/{n}/comments"),
      };
      let url = repo_url(ctx, &opts.target, &suffix)?;
      let payload = serde_json::json!({ "body": opts.message }).to_string();
      let body = fetch::fetch_with_method(ctx, self, Method::POST, &url, Some(&payload), &[], true)?
         .ok_or_else(|| GcliError::data("empty response creating comment"))?;
      Ok(serde_json::from_str::<GhComment>(&body)?.into())
   }

   fn get_sshkeys(&self, ctx: &Context, max: FetchLimit) -> Result<Vec<SshKey>> {
      let url = format!("{}/user/keys", ctx.account().api_base);
      paginate::<SshKey, GhSshKey>(ctx, self, url, max)
   }

   fn sshkey_create(&self, ctx: &Context, title: &str, key: &str) -> Result<SshKey> {
      let url = format!("{}/user/keys", ctx.account().api_base);
      let payload = serde_json::json!({ "title": title, "key": key }).to_string();
      let body = fetch::fetch_with_method(ctx, self, Method::POST, &url, Some(&payload), &[], true)?
         .ok_or_else(|| GcliError::data("empty response creating ssh key"))?;
      Ok(serde_json::from_str::<GhSshKey>(&body)?.into())
   }

   fn sshkey_delete(&self, ctx: &Context, id: u64) -> Result<()> {
      let url = format!("{}/user/keys/{id}", ctx.account().api_base);
      fetch::fetch_with_method(ctx, self, Method::DELETE, &url, None, &[], false)?;
      Ok(())
   }
}

fn patch_state(ctx: &Context, forge: &dyn Forge, path: &Path, kind: &str, state: &str) -> Result<()> {
   let n = issue_number(path)?;
   let url = repo_url(ctx, path, &format!("/{kind}/{n}"))?;
   let payload = serde_json::json!({ "state": state }).to_string();
   fetch::fetch_with_method(ctx, forge, Method::PATCH, &url, Some(&payload), &[], false)?;
   Ok(())
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn gh_issue_conflates_labels_down_to_names() {
      let raw = serde_json::json!({
         "number": 1, "title": "t", "body": "b", "user": {"login": "a"},
         "state": "open", "created_at": "2024-01-01T00:00:00Z", "comments": 0,
         "locked": false, "html_url": "u", "labels": [{"name": "bug"}], "assignees": []
      });
      let gh: GhIssue = serde_json::from_value(raw).unwrap();
      let issue: Issue = gh.into();
      assert_eq!(issue.labels, vec!["bug".to_string()]);
      assert!(!issue.is_pr);
   }

   #[test]
   fn gh_label_colour_parses_as_hex() {
      let raw = serde_json::json!({"id": 1, "name": "bug", "color": "ff0000"});
      let gh: GhLabelFull = serde_json::from_value(raw).unwrap();
      let label: Label = gh.into();
      assert_eq!(label.colour, 0x00ff0000);
   }

   #[test]
   fn issue_number_requires_a_default_path_with_nonzero_id() {
      assert!(issue_number(&Path::default("o", "r", 0)).is_err());
      assert!(issue_number(&Path::Id(5)).is_err());
      assert_eq!(issue_number(&Path::default("o", "r", 5)).unwrap(), 5);
   }
}
