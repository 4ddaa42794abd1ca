//! Patch and patch-series parsing (§4.8, second/third grammar level).
//!
//! A patch series is what `git format-patch`/`pull_get_patch` produce: an
//! optional series-level prelude, then one or more patches, each opening
//! with a `From <hash> Mon Sep 17 00:00:00 2001` line.

use std::collections::HashMap;

use crate::diff::{self, Diff};
use crate::error::{GcliError, Result};

const GCLI_PREFIX: &str = "GCLI: ";

/// One `From <hash> ...` block: RFC-822-like headers, a commit message body,
/// the `---` diffstat sentinel and its prelude, then the diffs it carries.
#[derive(Debug, Clone, Default)]
pub struct Patch {
   pub commit_hash: String,
   pub headers:     Vec<(String, String)>,
   pub body:        String,
   /// Free text between the `---` sentinel and the first `diff --git` line
   /// (typically the diffstat `git format-patch` inserts there).
   pub prelude:     String,
   pub diffs:       Vec<Diff>,
}

#[derive(Debug, Clone, Default)]
pub struct PatchSeries {
   pub prelude:  String,
   pub patches:  Vec<Patch>,
}

fn is_commit_hash(token: &str) -> bool {
   (token.len() == 40 || token.len() == 64) && token.bytes().all(|b| b.is_ascii_hexdigit())
}

impl PatchSeries {
   /// Splits the series prelude into `GCLI: <key> <value>` metadata and the
   /// remaining free text, line-for-line per `process_series_prelude`.
   #[must_use]
   pub fn prelude_metadata(&self) -> HashMap<String, String> {
      let mut meta = HashMap::new();
      for line in self.prelude.lines() {
         if let Some(rest) = line.strip_prefix(GCLI_PREFIX)
            && let Some((key, value)) = rest.split_once(' ')
         {
            meta.insert(key.to_string(), value.to_string());
         }
      }
      meta
   }

   #[must_use]
   pub fn prelude_body(&self) -> String {
      self
         .prelude
         .lines()
         .filter(|line| !line.starts_with(GCLI_PREFIX))
         .collect::<Vec<_>>()
         .join("\n")
   }
}

/// Parses a full patch series: an optional series prelude, then one or more
/// `From <hash> ...`-delimited patches.
pub fn parse_patch_series(text: &str) -> Result<PatchSeries> {
   let lines: Vec<&str> = text.lines().collect();
   let mut i = 0;
   let mut series_prelude_lines = Vec::new();

   while i < lines.len() && !starts_patch(lines[i]) {
      series_prelude_lines.push(lines[i]);
      i += 1;
   }

   if i == lines.len() {
      return Err(GcliError::parse("patch series with no leading 'From ' line"));
   }

   let mut patches = Vec::new();
   while i < lines.len() {
      let start = i;
      i += 1;
      while i < lines.len() && !starts_patch(lines[i]) {
         i += 1;
      }
      patches.push(parse_one_patch(&lines[start..i])?);
   }

   Ok(PatchSeries { prelude: series_prelude_lines.join("\n"), patches })
}

/// Parses a single diff (not wrapped in a `From`-headed patch), as returned
/// by `pull_get_diff`. Exposed separately since not every caller has a
/// patch series to work with.
pub fn parse_bare_diff(text: &str) -> Result<Vec<Diff>> {
   diff::parse_diffs(text)
}

fn starts_patch(line: &str) -> bool {
   line
      .strip_prefix("From ")
      .and_then(|rest| rest.split_whitespace().next())
      .is_some_and(is_commit_hash)
}

fn parse_one_patch(lines: &[&str]) -> Result<Patch> {
   let header_line = lines[0];
   let commit_hash = header_line
      .strip_prefix("From ")
      .and_then(|rest| rest.split_whitespace().next())
      .ok_or_else(|| GcliError::parse("malformed 'From' line"))?
      .to_string();

   let mut idx = 1;
   let mut headers = Vec::new();
   while idx < lines.len() && !lines[idx].is_empty() {
      if let Some((key, value)) = lines[idx].split_once(':') {
         headers.push((key.trim().to_string(), value.trim().to_string()));
      }
      idx += 1;
   }
   idx += 1; // skip the blank line after headers

   let body_start = idx;
   while idx < lines.len() && lines[idx] != "---" {
      idx += 1;
   }
   let body = lines[body_start..idx].join("\n");
   if idx < lines.len() {
      idx += 1; // skip the '---' sentinel
   }

   let prelude_start = idx;
   while idx < lines.len() && !lines[idx].starts_with("diff --git a/") {
      idx += 1;
   }
   let prelude = lines[prelude_start..idx].join("\n");

   let diff_text = lines[idx..].join("\n");
   let diffs = if diff_text.is_empty() { Vec::new() } else { diff::parse_diffs(&diff_text)? };

   Ok(Patch { commit_hash, headers, body, prelude, diffs })
}

#[cfg(test)]
mod tests {
   use super::*;

   const SAMPLE_SERIES: &str = "GCLI: base_sha aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\n\
GCLI: head_sha bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb\n\
Looks good overall.\n\
From cccccccccccccccccccccccccccccccccccccccc Mon Sep 17 00:00:00 2001\n\
From: Jane Dev <jane@example.com>\n\
Date: Mon, 1 Jan 2024 00:00:00 +0000\n\
Subject: [PATCH] fix the thing\n\
\n\
Body text of the commit message.\n\
---\n\
 src/lib.rs | 3 ++-\n\
\n\
diff --git a/src/lib.rs b/src/lib.rs\n\
--- a/src/lib.rs\n\
+++ b/src/lib.rs\n\
@@ -1 +1 @@\n\
-old\n\
+new\n";

   #[test]
   fn splits_series_prelude_into_metadata_and_body() {
      let series = parse_patch_series(SAMPLE_SERIES).unwrap();
      let meta = series.prelude_metadata();
      assert_eq!(meta.get("base_sha").map(String::as_str), Some("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"));
      assert_eq!(meta.get("head_sha").map(String::as_str), Some("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"));
      assert_eq!(series.prelude_body(), "Looks good overall.");
   }

   #[test]
   fn parses_one_patch_with_headers_body_and_diff() {
      let series = parse_patch_series(SAMPLE_SERIES).unwrap();
      assert_eq!(series.patches.len(), 1);
      let patch = &series.patches[0];
      assert_eq!(patch.commit_hash.len(), 40);
      assert_eq!(patch.body, "Body text of the commit message.");
      assert_eq!(patch.prelude, " src/lib.rs | 3 ++-");
      assert_eq!(patch.diffs.len(), 1);
      assert_eq!(patch.diffs[0].after_filename(), "src/lib.rs");
   }

   #[test]
   fn series_with_no_leading_from_line_is_an_error() {
      let err = parse_patch_series("just some text\nmore text\n").unwrap_err();
      assert!(matches!(err, GcliError::Parse(_)));
   }

   #[test]
   fn bare_diff_parses_without_patch_wrapper() {
      let diffs = parse_bare_diff("diff --git a/f b/f\n--- a/f\n+++ b/f\n@@ -1 +1 @@\n-a\n+b\n").unwrap();
      assert_eq!(diffs.len(), 1);
   }
}
