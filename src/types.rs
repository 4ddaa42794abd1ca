//! Domain records shared by every forge adapter and the facade.
//!
//! Every record owns its strings and child collections exclusively, per the
//! ownership rule in the data model: there is no sharing between records.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which code-forge a [`crate::context::Context`] is currently talking to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForgeKind {
   GitHub,
   GitLab,
   Gitea,
   Bugzilla,
}

impl std::fmt::Display for ForgeKind {
   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      let s = match self {
         Self::GitHub => "github",
         Self::GitLab => "gitlab",
         Self::Gitea => "gitea",
         Self::Bugzilla => "bugzilla",
      };
      f.write_str(s)
   }
}

/// Bit flags describing which summary fields a backend actually populates.
///
/// The facade preserves "quirk discipline": callers may see a
/// documented-absent field hold its empty value and must not read meaning
/// into that absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuirkMask(pub u32);

impl QuirkMask {
   pub const NONE: Self = Self(0);
   pub const HAS_MILESTONE: Self = Self(1 << 0);
   pub const HAS_ASSIGNEES: Self = Self(1 << 1);
   pub const HAS_COVERAGE: Self = Self(1 << 2);
   pub const HAS_NODE_ID: Self = Self(1 << 3);
   pub const HAS_DRAFT: Self = Self(1 << 4);
   pub const HAS_AUTOMERGE: Self = Self(1 << 5);

   #[must_use]
   pub fn has(self, flag: Self) -> bool {
      self.0 & flag.0 != 0
   }

   #[must_use]
   pub fn with(self, flag: Self) -> Self {
      Self(self.0 | flag.0)
   }
}

impl std::ops::BitOr for QuirkMask {
   type Output = Self;

   fn bitor(self, rhs: Self) -> Self {
      self.with(rhs)
   }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
   pub id:          u64,
   pub name:        String,
   pub description: String,
   /// 24-bit RGB value, e.g. `0x00ff00`.
   pub colour:      u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
   pub id:                  u64,
   pub title:               String,
   pub description:         String,
   pub state:               String,
   pub created_at:          DateTime<Utc>,
   pub updated_at:          DateTime<Utc>,
   pub due_date:            Option<DateTime<Utc>>,
   pub expired:             bool,
   pub open_issues_count:   u64,
   pub closed_issues_count: u64,
   pub web_url:             String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
   pub number:        u64,
   pub title:         String,
   pub body:          String,
   pub author:        String,
   pub state:         String,
   pub created_at:    DateTime<Utc>,
   pub comments_count: u64,
   pub locked:        bool,
   pub url:           String,
   /// Populated only on the Bugzilla-like backend.
   pub product:       String,
   /// Populated only on the Bugzilla-like backend.
   pub component:     String,
   pub milestone:     Option<String>,
   pub labels:        Vec<String>,
   pub assignees:     Vec<String>,
   /// Lets GitHub's conflation of issues and pull requests be filtered out.
   pub is_pr:         bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
   pub number:        u64,
   /// Opaque string used on GitHub for GraphQL mutations (`node_id`).
   pub node_id:       String,
   pub title:         String,
   pub body:          String,
   pub author:        String,
   pub state:         String,
   pub created_at:    DateTime<Utc>,
   pub head_label:    String,
   pub base_label:    String,
   pub head_sha:      String,
   pub base_sha:      String,
   pub start_sha:     String,
   pub milestone:     Option<String>,
   pub comments:      u64,
   pub additions:     u64,
   pub deletions:     u64,
   pub commits:       u64,
   pub changed_files: u64,
   pub coverage:      Option<f64>,
   pub web_url:       String,
   pub labels:        Vec<String>,
   pub reviewers:     Vec<String>,
   pub merged:        bool,
   pub mergeable:     bool,
   pub draft:         bool,
   pub automerge:     bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
   pub short_sha: String,
   pub long_sha:  String,
   pub message:   String,
   pub date:      DateTime<Utc>,
   pub author:    String,
   pub email:     String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
   pub id:     u64,
   pub author: String,
   pub date:   DateTime<Utc>,
   pub body:   String,
}

/// Which kind of object a submitted comment attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentTarget {
   Issue,
   Pull,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fork {
   pub owner:     String,
   pub repo:      String,
   pub full_name: String,
   pub web_url:   String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repo {
   pub owner:       String,
   pub name:        String,
   pub description: String,
   pub private:     bool,
   pub fork:        bool,
   pub web_url:     String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
   pub id:         u64,
   pub status:     String,
   pub ref_name:   String,
   pub sha:        String,
   pub web_url:    String,
   pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
   pub id:         u64,
   pub name:       String,
   pub status:     String,
   pub stage:      String,
   pub web_url:    String,
   pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
   pub id:         String,
   pub title:      String,
   pub reason:     String,
   pub unread:     bool,
   pub updated_at: DateTime<Utc>,
   pub url:        String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshKey {
   pub id:         u64,
   pub title:      String,
   pub key:        String,
   pub created_at: DateTime<Utc>,
}

/// Bitmask of flags accepted by `pull_merge`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeFlags(pub u32);

impl MergeFlags {
   pub const NONE: Self = Self(0);
   pub const SQUASH: Self = Self(1 << 0);
   pub const DELETEHEAD: Self = Self(1 << 1);

   #[must_use]
   pub fn has(self, flag: Self) -> bool {
      self.0 & flag.0 != 0
   }
}

impl std::ops::BitOr for MergeFlags {
   type Output = Self;

   fn bitor(self, rhs: Self) -> Self {
      Self(self.0 | rhs.0)
   }
}

/// Filters accepted by `search_issues`/`search_pulls`.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
   pub all:         bool,
   pub author:      Option<String>,
   pub label:       Option<String>,
   pub milestone:   Option<String>,
   pub search_term: Option<String>,
}

/// `max == -1` (represented here as `FetchLimit::All`) means "all pages".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchLimit {
   All,
   Max(usize),
}

impl FetchLimit {
   #[must_use]
   pub fn from_signed(n: i64) -> Self {
      if n < 0 { Self::All } else { Self::Max(n as usize) }
   }

   #[must_use]
   pub fn as_usize(self) -> Option<usize> {
      match self {
         Self::All => None,
         Self::Max(n) => Some(n),
      }
   }
}

/// Side-channel `GCLI: key value` metadata surfaced from a patch-series
/// prelude, keyed case-sensitively as written by the author.
pub type PreludeMetadata = HashMap<String, String>;

/// One reviewer comment anchored to a range of diff lines (§4.8).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffComment {
   /// The post-change ("after") filename the comment is anchored to.
   pub filename:      String,
   pub old_line_start: u64,
   pub new_line_start: u64,
   pub old_line_end:   u64,
   pub new_line_end:   u64,
   /// Whether the start/end endpoint lies on the added (`true`) or removed
   /// (`false`) side — i.e. which counter was advanced last at that point.
   pub start_is_in_new: bool,
   pub end_is_in_new:   bool,
   pub comment:        String,
   /// Verbatim diff lines the anchor covers.
   pub diff_text:      String,
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn quirk_mask_combines_with_bitor() {
      let mask = QuirkMask::HAS_MILESTONE | QuirkMask::HAS_DRAFT;
      assert!(mask.has(QuirkMask::HAS_MILESTONE));
      assert!(mask.has(QuirkMask::HAS_DRAFT));
      assert!(!mask.has(QuirkMask::HAS_AUTOMERGE));
   }

   #[test]
   fn fetch_limit_from_signed_negative_is_all() {
      assert_eq!(FetchLimit::from_signed(-1), FetchLimit::All);
      assert_eq!(FetchLimit::from_signed(5), FetchLimit::Max(5));
      assert_eq!(FetchLimit::All.as_usize(), None);
      assert_eq!(FetchLimit::Max(5).as_usize(), Some(5));
   }

   #[test]
   fn merge_flags_default_to_none() {
      let flags = MergeFlags::default();
      assert!(!flags.has(MergeFlags::SQUASH));
      let flags = flags | MergeFlags::SQUASH;
      assert!(flags.has(MergeFlags::SQUASH));
      assert!(!flags.has(MergeFlags::DELETEHEAD));
   }
}
