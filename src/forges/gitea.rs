//! Gitea adapter.
//!
//! Gitea's REST API is close enough to GitHub's that the original source
//! delegates most issue/milestone/repo operations straight to the GitHub
//! implementation (`gitea_get_issue_summary` calls `github_get_issue_summary`
//! verbatim, etc.) and only special-cases the handful of places Gitea
//! actually differs: `"closed"`/`"open"` state strings instead of GitHub's
//! `"close"`/`"reopen"` state-event names, label add/remove/delete by
//! numeric id rather than by name, and a private/public-only visibility
//! model.

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;

use crate::capability::{Forge, IssueSubmitOpts, PullSubmitOpts, RepoCreateOpts, SubmitCommentOpts};
use crate::context::Context;
use crate::error::{GcliError, Result};
use crate::fetch::{self, Page};
use crate::path::Path;
use crate::types::{
   Comment, CommentTarget, FetchLimit, Fork, Issue, Label, MergeFlags, Milestone, PullRequest,
   Repo, SearchFilters,
};

pub struct Gitea;

fn repo_url(ctx: &Context, path: &Path, suffix: &str) -> Result<String> {
   let (owner, repo) = path
      .owner_repo()
      .ok_or_else(|| GcliError::usage("gitea requires an owner/repo path"))?;
   Ok(format!("{}/repos/{owner}/{repo}{suffix}", ctx.account().api_base))
}

fn entity_id(path: &Path) -> Result<u64> {
   path.id().filter(|id| *id > 0).ok_or_else(|| GcliError::usage("missing issue/pull number"))
}

#[derive(Debug, Deserialize)]
struct GtUser {
   #[serde(default)]
   login: String,
}

#[derive(Debug, Deserialize)]
struct GtMilestoneRef {
   title: String,
}

#[derive(Debug, Deserialize)]
struct GtIssue {
   number:      u64,
   title:       String,
   #[serde(default)]
   body:        Option<String>,
   user:        GtUser,
   state:       String,
   created_at:  DateTime<Utc>,
   #[serde(default)]
   comments:    u64,
   #[serde(default)]
   html_url:    String,
   #[serde(default)]
   milestone:   Option<GtMilestoneRef>,
   #[serde(default)]
   labels:      Vec<GtLabelFull>,
   #[serde(default)]
   assignees:   Vec<GtUser>,
   #[serde(default)]
   pull_request: Option<serde_json::Value>,
}

impl From<GtIssue> for Issue {
   fn from(i: GtIssue) -> Self {
      Self {
         number:         i.number,
         title:          i.title,
         body:           i.body.unwrap_or_default(),
         author:         i.user.login,
         state:          i.state,
         created_at:     i.created_at,
         comments_count: i.comments,
         locked:         false,
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
struct GtBranchRef {
   #[serde(default)]
   label: String,
   #[serde(default)]
   sha:   String,
}

#[derive(Debug, Deserialize)]
struct GtPull {
   number:        u64,
   title:         String,
   #[serde(default)]
   body:          Option<String>,
   user:          GtUser,
   state:         String,
   created_at:    DateTime<Utc>,
   head:          GtBranchRef,
   base:          GtBranchRef,
   #[serde(default)]
   milestone:     Option<GtMilestoneRef>,
   #[serde(default)]
   comments:      u64,
   #[serde(default)]
   additions:     u64,
   #[serde(default)]
   deletions:     u64,
   #[serde(default)]
   commits:       u64,
   #[serde(default)]
   changed_files: u64,
   #[serde(default)]
   html_url:      String,
   #[serde(default)]
   labels:        Vec<GtLabelFull>,
   #[serde(default)]
   requested_reviewers: Vec<GtUser>,
   #[serde(default)]
   merged:        bool,
   #[serde(default)]
   mergeable:     Option<bool>,
   #[serde(default)]
   draft:         bool,
}

impl From<GtPull> for PullRequest {
   fn from(p: GtPull) -> Self {
      Self {
         number:        p.number,
         node_id:       String::new(),
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
         automerge:     false,
      }
   }
}

#[derive(Debug, Deserialize)]
struct GtComment {
   id:         u64,
   user:       GtUser,
   created_at: DateTime<Utc>,
   body:       String,
}

impl From<GtComment> for Comment {
   fn from(c: GtComment) -> Self {
      Self { id: c.id, author: c.user.login, date: c.created_at, body: c.body }
   }
}

#[derive(Debug, Deserialize, Clone)]
struct GtLabelFull {
   id:   u64,
   name: String,
   #[serde(default)]
   description: String,
   color: String,
}

impl From<GtLabelFull> for Label {
   fn from(l: GtLabelFull) -> Self {
      Self {
         id:          l.id,
         name:        l.name,
         description: l.description,
         colour:      u32::from_str_radix(l.color.trim_start_matches('#'), 16).unwrap_or(0),
      }
   }
}

#[derive(Debug, Deserialize)]
struct GtMilestone {
   id:          u64,
   title:       String,
   #[serde(default)]
   description: String,
   state:       String,
   created_at:  DateTime<Utc>,
   updated_at:  DateTime<Utc>,
   #[serde(default)]
   due_on:      Option<DateTime<Utc>>,
   #[serde(default)]
   open_issues: u64,
   #[serde(default)]
   closed_issues: u64,
}

impl From<GtMilestone> for Milestone {
   fn from(m: GtMilestone) -> Self {
      Self {
         id:                  m.id,
         title:               m.title,
         description:         m.description,
         state:               m.state,
         created_at:          m.created_at,
         updated_at:          m.updated_at,
         due_date:            m.due_on,
         expired:             false,
         open_issues_count:   m.open_issues,
         closed_issues_count: m.closed_issues,
         web_url:             String::new(),
      }
   }
}

#[derive(Debug, Deserialize)]
struct GtRepo {
   name:        String,
   owner:       GtUser,
   #[serde(default)]
   description: String,
   private:     bool,
   #[serde(default)]
   fork:        bool,
   #[serde(default)]
   html_url:    String,
}

impl From<GtRepo> for Repo {
   fn from(r: GtRepo) -> Self {
      Self {
         owner:       r.owner.login,
         name:        r.name,
         description: r.description,
         private:     r.private,
         fork:        r.fork,
         web_url:     r.html_url,
      }
   }
}

impl From<GtRepo> for Fork {
   fn from(r: GtRepo) -> Self {
      Self {
         full_name: format!("{}/{}", r.owner.login, r.name),
         owner:     r.owner.login,
         repo:      r.name.clone(),
         web_url:   r.html_url,
      }
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

impl Gitea {
   /// Resolves label names to their numeric ids — Gitea's add/remove/delete
   /// endpoints want ids, not names, unlike GitHub's.
   fn label_names_to_ids(&self, ctx: &Context, path: &Path, names: &[String]) -> Result<Vec<u64>> {
      let all = self.get_labels(ctx, path, FetchLimit::All)?;
      names
         .iter()
         .map(|name| {
            all.iter()
               .find(|l| &l.name == name)
               .map(|l| l.id)
               .ok_or_else(|| GcliError::data(format!("no such label '{name}'")))
         })
         .collect()
   }
}

impl Forge for Gitea {
   fn search_issues(
      &self,
      ctx: &Context,
      path: &Path,
      filters: &SearchFilters,
      max: FetchLimit,
   ) -> Result<Vec<Issue>> {
      let state = if filters.all { "all" } else { "open" };
      let mut url = repo_url(ctx, path, &format!("/issues?type=issues&state={state}"))?;
      if let Some(author) = &filters.author {
         url.push_str(&format!("&created_by={author}"));
      }
      if let Some(label) = &filters.label {
         url.push_str(&format!("&labels={label}"));
      }
      if let Some(milestone) = &filters.milestone {
         url.push_str(&format!("&milestones={milestone}"));
      }
      if let Some(search) = &filters.search_term {
         url.push_str(&format!("&q={search}"));
      }
      paginate::<Issue, GtIssue>(ctx, self, url, max)
   }

   fn get_issue(&self, ctx: &Context, path: &Path) -> Result<Issue> {
      let id = entity_id(path)?;
      let url = repo_url(ctx, path, &format!("/issues/{id}"))?;
      let body = fetch::fetch_one(ctx, self, &url, None)?;
      Ok(serde_json::from_str::<GtIssue>(&body)?.into())
   }

   fn submit_issue(&self, ctx: &Context, path: &Path, opts: &IssueSubmitOpts) -> Result<Issue> {
      let url = repo_url(ctx, path, "/issues")?;
      let payload = serde_json::json!({ "title": opts.title, "body": opts.body }).to_string();
      let body = fetch::fetch_with_method(ctx, self, Method::POST, &url, Some(&payload), &[], true)?
         .ok_or_else(|| GcliError::data("empty response creating issue"))?;
      Ok(serde_json::from_str::<GtIssue>(&body)?.into())
   }

   fn issue_close(&self, ctx: &Context, path: &Path) -> Result<()> {
      patch_issue_state(ctx, self, path, "closed")
   }

   fn issue_reopen(&self, ctx: &Context, path: &Path) -> Result<()> {
      patch_issue_state(ctx, self, path, "open")
   }

   fn issue_assign(&self, ctx: &Context, path: &Path, user: &str) -> Result<()> {
      let id = entity_id(path)?;
      let url = repo_url(ctx, path, &format!("/issues/{id}"))?;
      let payload = serde_json::json!({ "assignees": [user] }).to_string();
      fetch::fetch_with_method(ctx, self, Method::PATCH, &url, Some(&payload), &[], false)?;
      Ok(())
   }

   fn issue_add_labels(&self, ctx: &Context, path: &Path, labels: &[String]) -> Result<()> {
      let ids = self.label_names_to_ids(ctx, path, labels)?;
      let id = entity_id(path)?;
      let url = repo_url(ctx, path, &format!("/issues/{id}/labels"))?;
      let payload = serde_json::json!({ "labels": ids }).to_string();
      fetch::fetch_with_method(ctx, self, Method::POST, &url, Some(&payload), &[], false)?;
      Ok(())
   }

   fn issue_remove_labels(&self, ctx: &Context, path: &Path, labels: &[String]) -> Result<()> {
      let ids = self.label_names_to_ids(ctx, path, labels)?;
      let id = entity_id(path)?;
      for label_id in ids {
         let url = repo_url(ctx, path, &format!("/issues/{id}/labels/{label_id}"))?;
         fetch::fetch_with_method(ctx, self, Method::DELETE, &url, None, &[], false)?;
      }
      Ok(())
   }

   fn issue_set_milestone(&self, ctx: &Context, path: &Path, milestone_id: u64) -> Result<()> {
      let id = entity_id(path)?;
      let url = repo_url(ctx, path, &format!("/issues/{id}"))?;
      let payload = serde_json::json!({ "milestone": milestone_id }).to_string();
      fetch::fetch_with_method(ctx, self, Method::PATCH, &url, Some(&payload), &[], false)?;
      Ok(())
   }

   fn issue_clear_milestone(&self, ctx: &Context, path: &Path) -> Result<()> {
      self.issue_set_milestone(ctx, path, 0)
   }

   fn issue_set_title(&self, ctx: &Context, path: &Path, title: &str) -> Result<()> {
      let id = entity_id(path)?;
      let url = repo_url(ctx, path, &format!("/issues/{id}"))?;
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
      let state = if filters.all { "all" } else { "open" };
      let url = repo_url(ctx, path, &format!("/pulls?state={state}"))?;
      paginate::<PullRequest, GtPull>(ctx, self, url, max)
   }

   fn get_pull(&self, ctx: &Context, path: &Path) -> Result<PullRequest> {
      let id = entity_id(path)?;
      let url = repo_url(ctx, path, &format!("/pulls/{id}"))?;
      let body = fetch::fetch_one(ctx, self, &url, None)?;
      Ok(serde_json::from_str::<GtPull>(&body)?.into())
   }

   fn pull_get_diff(&self, ctx: &Context, path: &Path) -> Result<String> {
      let id = entity_id(path)?;
      let url = repo_url(ctx, path, &format!("/pulls/{id}.diff"))?;
      fetch::fetch_one(ctx, self, &url, None)
   }

   fn pull_get_patch(&self, ctx: &Context, path: &Path) -> Result<String> {
      let id = entity_id(path)?;
      let url = repo_url(ctx, path, &format!("/pulls/{id}.patch"))?;
      fetch::fetch_one(ctx, self, &url, None)
   }

   fn pull_merge(&self, ctx: &Context, path: &Path, flags: MergeFlags) -> Result<()> {
      let id = entity_id(path)?;
      let url = repo_url(ctx, path, &format!("/pulls/{id}/merge"))?;
      let method = if flags.has(MergeFlags::SQUASH) { "squash" } else { "merge" };
      let payload = serde_json::json!({
         "Do": method,
         "delete_branch_after_merge": flags.has(MergeFlags::DELETEHEAD),
      })
      .to_string();
      fetch::fetch_with_method(ctx, self, Method::POST, &url, Some(&payload), &[], false)?;
      Ok(())
   }

   fn pull_close(&self, ctx: &Context, path: &Path) -> Result<()> {
      patch_pull_state(ctx, self, path, "closed")
   }

   fn pull_reopen(&self, ctx: &Context, path: &Path) -> Result<()> {
      patch_pull_state(ctx, self, path, "open")
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
      let id = entity_id(path)?;
      let url = repo_url(ctx, path, &format!("/pulls/{id}/requested_reviewers"))?;
      let payload = serde_json::json!({ "reviewers": [user] }).to_string();
      fetch::fetch_with_method(ctx, self, Method::POST, &url, Some(&payload), &[], false)?;
      Ok(())
   }

   fn pull_set_title(&self, ctx: &Context, path: &Path, title: &str) -> Result<()> {
      self.issue_set_title(ctx, path, title)
   }

   fn perform_submit_pull(&self, ctx: &Context, opts: &PullSubmitOpts) -> Result<PullRequest> {
      let url = repo_url(ctx, &opts.path, "/pulls")?;
      let payload = serde_json::json!({
         "title": opts.title,
         "body": opts.body,
         "head": opts.head,
         "base": opts.base,
         "labels": opts.labels,
      })
      .to_string();
      let body = fetch::fetch_with_method(ctx, self, Method::POST, &url, Some(&payload), &[], true)?
         .ok_or_else(|| GcliError::data("empty response creating pull request"))?;
      let pull: PullRequest = serde_json::from_str::<GtPull>(&body)?.into();
      for reviewer in &opts.reviewers {
         self.pull_add_reviewer(ctx, &Path::default(
            opts.path.owner_repo().map(|(o, _)| o).unwrap_or_default(),
            opts.path.owner_repo().map(|(_, r)| r).unwrap_or_default(),
            pull.number,
         ), reviewer)?;
      }
      Ok(pull)
   }

   fn get_labels(&self, ctx: &Context, path: &Path, max: FetchLimit) -> Result<Vec<Label>> {
      let url = repo_url(ctx, path, "/labels")?;
      paginate::<Label, GtLabelFull>(ctx, self, url, max)
   }

   fn create_label(&self, ctx: &Context, path: &Path, label: &Label) -> Result<Label> {
      let url = repo_url(ctx, path, "/labels")?;
      let payload = serde_json::json!({
         "name": label.name,
         "color": format!("#{:06x}", label.colour),
         "description": label.description,
      })
      .to_string();
      let body = fetch::fetch_with_method(ctx, self, Method::POST, &url, Some(&payload), &[], true)?
         .ok_or_else(|| GcliError::data("empty response creating label"))?;
      Ok(serde_json::from_str::<GtLabelFull>(&body)?.into())
   }

   fn delete_label(&self, ctx: &Context, path: &Path, name: &str) -> Result<()> {
      let ids = self.label_names_to_ids(ctx, path, std::slice::from_ref(&name.to_string()))?;
      let id = ids[0];
      let url = repo_url(ctx, path, &format!("/labels/{id}"))?;
      fetch::fetch_with_method(ctx, self, Method::DELETE, &url, None, &[], false)?;
      Ok(())
   }

   fn get_milestones(&self, ctx: &Context, path: &Path, max: FetchLimit) -> Result<Vec<Milestone>> {
      let url = repo_url(ctx, path, "/milestones")?;
      paginate::<Milestone, GtMilestone>(ctx, self, url, max)
   }

   fn get_milestone(&self, ctx: &Context, path: &Path, id: u64) -> Result<Milestone> {
      let url = repo_url(ctx, path, &format!("/milestones/{id}"))?;
      let body = fetch::fetch_one(ctx, self, &url, None)?;
      Ok(serde_json::from_str::<GtMilestone>(&body)?.into())
   }

   fn create_milestone(&self, ctx: &Context, path: &Path, title: &str) -> Result<Milestone> {
      let url = repo_url(ctx, path, "/milestones")?;
      let payload = serde_json::json!({ "title": title }).to_string();
      let body = fetch::fetch_with_method(ctx, self, Method::POST, &url, Some(&payload), &[], true)?
         .ok_or_else(|| GcliError::data("empty response creating milestone"))?;
      Ok(serde_json::from_str::<GtMilestone>(&body)?.into())
   }

   fn delete_milestone(&self, ctx: &Context, path: &Path, id: u64) -> Result<()> {
      let url = repo_url(ctx, path, &format!("/milestones/{id}"))?;
      fetch::fetch_with_method(ctx, self, Method::DELETE, &url, None, &[], false)?;
      Ok(())
   }

   fn milestone_get_issues(&self, ctx: &Context, path: &Path, id: u64, max: FetchLimit) -> Result<Vec<Issue>> {
      let url = repo_url(ctx, path, &format!("/issues?state=all&milestones={id}"))?;
      paginate::<Issue, GtIssue>(ctx, self, url, max)
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
      paginate::<Fork, GtRepo>(ctx, self, url, max)
   }

   fn fork_create(&self, ctx: &Context, path: &Path) -> Result<Fork> {
      let url = repo_url(ctx, path, "/forks")?;
      let body = fetch::fetch_with_method(ctx, self, Method::POST, &url, None, &[], true)?
         .ok_or_else(|| GcliError::data("empty response creating fork"))?;
      Ok(serde_json::from_str::<GtRepo>(&body)?.into())
   }

   fn get_repos(&self, ctx: &Context, owner: &str, max: FetchLimit) -> Result<Vec<Repo>> {
      let url = format!("{}/users/{owner}/repos", ctx.account().api_base);
      paginate::<Repo, GtRepo>(ctx, self, url, max)
   }

   fn get_own_repos(&self, ctx: &Context, max: FetchLimit) -> Result<Vec<Repo>> {
      let url = format!("{}/user/repos", ctx.account().api_base);
      paginate::<Repo, GtRepo>(ctx, self, url, max)
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
         .ok_or_else(|| GcliError::data("empty response creating repository"))?;
      Ok(serde_json::from_str::<GtRepo>(&body)?.into())
   }

   fn repo_delete(&self, ctx: &Context, path: &Path) -> Result<()> {
      let url = repo_url(ctx, path, "")?;
      fetch::fetch_with_method(ctx, self, Method::DELETE, &url, None, &[], false)?;
      Ok(())
   }

   /// Gitea only distinguishes private from public — no GitHub-style
   /// `internal` tier — so this is a plain boolean PATCH.
   fn repo_set_visibility(&self, ctx: &Context, path: &Path, private: bool) -> Result<()> {
      let url = repo_url(ctx, path, "")?;
      let payload = serde_json::json!({ "private": private }).to_string();
      fetch::fetch_with_method(ctx, self, Method::PATCH, &url, Some(&payload), &[], false)?;
      Ok(())
   }

   fn get_issue_comments(&self, ctx: &Context, path: &Path, max: FetchLimit) -> Result<Vec<Comment>> {
      let id = entity_id(path)?;
      let url = repo_url(ctx, path, &format!("/issues/{id}/comments"))?;
      paginate::<Comment, GtComment>(ctx, self, url, max)
   }

   fn get_pull_comments(&self, ctx: &Context, path: &Path, max: FetchLimit) -> Result<Vec<Comment>> {
      self.get_issue_comments(ctx, path, max)
   }

   fn get_comment(&self, ctx: &Context, path: &Path, _target_type: CommentTarget, comment_id: u64) -> Result<Comment> {
      let url = repo_url(ctx, path, &format!("/issues/comments/{comment_id}"))?;
      let body = fetch::fetch_one(ctx, self, &url, None)?;
      Ok(serde_json::from_str::<GtComment>(&body)?.into())
   }

   fn perform_submit_comment(&self, ctx: &Context, opts: &SubmitCommentOpts) -> Result<Comment> {
      let id = entity_id(&opts.target)?;
      let url = repo_url(ctx, &opts.target, &format!("/issues/{id}/comments"))?;
      let payload = serde_json::json!({ "body": opts.message }).to_string();
      let body = fetch::fetch_with_method(ctx, self, Method::POST, &url, Some(&payload), &[], true)?
         .ok_or_else(|| GcliError::data("empty response creating comment"))?;
      Ok(serde_json::from_str::<GtComment>(&body)?.into())
   }
}

/// Gitea's state strings are `"closed"`/`"open"`, unlike GitHub's
/// `"closed"`/`"open"` pair spelled with a `state_reason` sibling — close
/// enough to confuse at a glance, which is why `action_close`/`action_reopen`
/// always go through this helper rather than inlining the literal.
fn state_payload(state: &str) -> String {
   serde_json::json!({ "state": state }).to_string()
}

fn patch_issue_state(ctx: &Context, forge: &dyn Forge, path: &Path, state: &str) -> Result<()> {
   let id = entity_id(path)?;
   let url = repo_url(ctx, path, &format!("/issues/{id}"))?;
   let payload = state_payload(state);
   fetch::fetch_with_method(ctx, forge, Method::PATCH, &url, Some(&payload), &[], false)?;
   Ok(())
}

fn patch_pull_state(ctx: &Context, forge: &dyn Forge, path: &Path, state: &str) -> Result<()> {
   let id = entity_id(path)?;
   let url = repo_url(ctx, path, &format!("/pulls/{id}"))?;
   let payload = state_payload(state);
   fetch::fetch_with_method(ctx, forge, Method::PATCH, &url, Some(&payload), &[], false)?;
   Ok(())
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn close_and_reopen_send_closed_and_open_not_close_and_reopen() {
      let closed: serde_json::Value = serde_json::from_str(&state_payload("closed")).unwrap();
      let open: serde_json::Value = serde_json::from_str(&state_payload("open")).unwrap();
      assert_eq!(closed["state"], "closed");
      assert_eq!(open["state"], "open");
   }

   #[test]
   fn gitea_label_colour_parses_as_hex() {
      let raw = serde_json::json!({ "id": 1, "name": "bug", "color": "#ff0000" });
      let label: GtLabelFull = serde_json::from_value(raw).unwrap();
      let label: Label = label.into();
      assert_eq!(label.colour, 0xff_0000);
   }

   #[test]
   fn repo_url_requires_owner_repo_path() {
      let ctx = Context::new(crate::config::Account {
         forge_type: crate::types::ForgeKind::Gitea,
         api_base:   "https://gitea.example".into(),
         token:      "t".into(),
         default:    true,
      });
      let err = repo_url(&ctx, &Path::Id(5), "").unwrap_err();
      assert_eq!(err.exit_code(), crate::error::EXIT_USAGE);

      let url = repo_url(&ctx, &Path::default("o", "r", 0), "/labels").unwrap();
      assert_eq!(url, "https://gitea.example/repos/o/r/labels");
   }
}
