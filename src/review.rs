//! Review session (§4.9): cache management, outcome selection, and
//! submission assembly. Grounded line-for-line on `pull_reviews.c`'s
//! `do_review_session`/`edit_diff`/`djb2`/`make_review_diff_file_name`.
//!
//! Prompting (resume-vs-restart, outcome selection) and editor invocation are
//! out of core scope (§1) — both are taken as injected closures so this
//! module never touches a terminal.

use std::path::PathBuf;

use crate::capability::Forge;
use crate::context::Context;
use crate::error::{GcliError, Result};
use crate::path::Path;
use crate::patch::{self, PatchSeries};
use crate::types::{DiffComment, PreludeMetadata};

/// The standard `hash = 5381; hash = hash*33 + c` string hash, reused here
/// only as the review-cache key — not a general-purpose hash in the source
/// either.
#[must_use]
pub fn djb2(s: &str) -> u64 {
   let mut hash: u64 = 5381;
   for c in s.bytes() {
      hash = hash.wrapping_shl(5).wrapping_add(hash).wrapping_add(u64::from(c));
   }
   hash
}

fn review_diff_filename(owner: &str, repo: &str, pull_id: u64) -> String {
   let hash = djb2(owner) ^ djb2(repo);
   format!("{hash:x}_{pull_id}.diff")
}

fn cache_dir() -> Result<PathBuf> {
   let home = std::env::var("HOME")
      .map_err(|_| GcliError::usage("could not determine home directory for review cache"))?;
   Ok(PathBuf::from(home).join(".cache/gcli/reviews"))
}

/// The on-disk cached diff/patch for one in-progress review.
pub struct ReviewCache {
   path: PathBuf,
}

impl ReviewCache {
   pub fn for_pull(owner: &str, repo: &str, pull_id: u64) -> Result<Self> {
      let path = cache_dir()?.join(review_diff_filename(owner, repo, pull_id));
      Ok(Self { path })
   }

   #[must_use]
   pub fn path(&self) -> &std::path::Path {
      &self.path
   }

   #[must_use]
   pub fn exists(&self) -> bool {
      self.path.exists()
   }

   /// Fetches the patch through the facade and writes it to the cache path,
   /// creating the cache directory if needed.
   pub fn fetch_and_cache(&self, ctx: &Context, forge: &dyn Forge, pull_path: &Path) -> Result<()> {
      if let Some(dir) = self.path.parent() {
         std::fs::create_dir_all(dir)?;
      }
      let contents = forge.pull_get_patch(ctx, pull_path)?;
      std::fs::write(&self.path, contents)?;
      Ok(())
   }

   pub fn read(&self) -> Result<String> {
      Ok(std::fs::read_to_string(&self.path)?)
   }

   pub fn remove(&self) -> Result<()> {
      if self.path.exists() {
         std::fs::remove_file(&self.path)?;
      }
      Ok(())
   }
}

/// Ensures the cached diff exists, prompting via `confirm_restart` when one
/// is already in progress — the resume-vs-restart choice from `edit_diff`.
pub fn edit_diff(
   cache: &ReviewCache,
   ctx: &Context,
   forge: &dyn Forge,
   pull_path: &Path,
   confirm_restart: &mut dyn FnMut() -> bool,
) -> Result<()> {
   let should_fetch = if cache.exists() { confirm_restart() } else { true };
   if should_fetch {
      cache.fetch_and_cache(ctx, forge, pull_path)?;
   }
   Ok(())
}

/// The four terminal states of a review; `Postpone` short-circuits before
/// any network call and leaves the cache file in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewOutcome {
   Accept,
   RequestChanges,
   Comment,
   Postpone,
}

/// A backend-agnostic review ready for a per-backend adapter to translate
/// into its own submission shape (§4.9 step 5).
#[derive(Debug, Clone)]
pub struct ReviewSubmission {
   pub outcome:  ReviewOutcome,
   pub body:     String,
   pub comments: Vec<DiffComment>,
   pub metadata: PreludeMetadata,
}

/// Parses the cached patch, extracts comments and series-prelude metadata,
/// and builds the submission for everything but `Postpone`.
pub fn build_submission(series_text: &str, outcome: ReviewOutcome) -> Result<Option<ReviewSubmission>> {
   if outcome == ReviewOutcome::Postpone {
      return Ok(None);
   }

   let series = patch::parse_patch_series(series_text)?;
   let comments = crate::localize::get_series_comments(&series);
   let metadata = series.prelude_metadata();
   let body = series.prelude_body();

   Ok(Some(ReviewSubmission { outcome, body, comments, metadata }))
}

/// Parses just enough of a series to read back for display (`print_comment_list`
/// equivalent) without deciding an outcome yet.
pub fn parse_cached_series(series_text: &str) -> Result<PatchSeries> {
   patch::parse_patch_series(series_text)
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn djb2_matches_the_reference_constants() {
      // hash = 5381; for "" the hash is unchanged.
      assert_eq!(djb2(""), 5381);
      // hash('a') = 5381*33 + 'a' (97) = 177670
      assert_eq!(djb2("a"), 5381u64.wrapping_mul(33).wrapping_add(97));
   }

   #[test]
   fn review_diff_filename_xors_the_two_hashes_and_appends_pull_id() {
      let name = review_diff_filename("herrhotzenplotz", "gcli", 42);
      let expected_hash = djb2("herrhotzenplotz") ^ djb2("gcli");
      assert_eq!(name, format!("{expected_hash:x}_42.diff"));
   }

   #[test]
   fn postpone_never_builds_a_submission() {
      let result = build_submission("ignored", ReviewOutcome::Postpone).unwrap();
      assert!(result.is_none());
   }

   #[test]
   fn build_submission_surfaces_metadata_and_comments() {
      let text = "GCLI: base_sha aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\n\
From bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb Mon Sep 17 00:00:00 2001\n\
From: a <a@example.com>\nDate: Mon, 1 Jan 2024 00:00:00 +0000\nSubject: [PATCH] x\n\n\
body\n---\n stat\n\n\
diff --git a/f b/f\n--- a/f\n+++ b/f\n@@ -1 +1 @@\n-x\n+y\n> note\n";
      let submission = build_submission(text, ReviewOutcome::Accept).unwrap().unwrap();
      assert_eq!(submission.outcome, ReviewOutcome::Accept);
      assert_eq!(
         submission.metadata.get("base_sha").map(String::as_str),
         Some("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa")
      );
      assert_eq!(submission.comments.len(), 1);
      assert_eq!(submission.comments[0].comment, "note");
   }
}
