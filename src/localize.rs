//! Comment localisation: the non-trivial half of §4.8.
//!
//! An iterator-based walk over each hunk's body per the "re-architecture
//! items" design note — the source implements this as a state machine
//! indexed by hand-maintained cursors, which map directly onto two running
//! counters threaded through a `lines()` iterator here.

use crate::diff::{Diff, Hunk};
use crate::error::Result;
use crate::patch::PatchSeries;
use crate::types::DiffComment;

#[derive(Clone, Copy)]
struct Pos {
   old_line:   u64,
   new_line:   u64,
   is_in_new:  bool,
}

/// Extracts the anchored comments out of one hunk's body, in order.
fn extract_hunk_comments(hunk: &Hunk, filename: &str) -> Vec<DiffComment> {
   let mut comments = Vec::new();

   let mut old_line = hunk.old_start;
   let mut new_line = hunk.new_start;
   let mut last_pos: Option<Pos> = None;
   let mut last_diff_line: Option<String> = None;

   let mut in_braces = false;
   let mut brace_range: Option<(Pos, Pos)> = None;
   let mut brace_lines: Vec<String> = Vec::new();
   let mut pending_brace: Option<(Pos, Pos, String)> = None;

   let mut block: Vec<String> = Vec::new();

   let flush_block = |block: &mut Vec<String>,
                       pending_brace: &mut Option<(Pos, Pos, String)>,
                       last_pos: &Pos,
                       last_diff_line: &str,
                       comments: &mut Vec<DiffComment>,
                       filename: &str| {
      if block.is_empty() {
         return;
      }
      let (start, end, diff_text) = pending_brace
         .take()
         .unwrap_or_else(|| (*last_pos, *last_pos, last_diff_line.to_string()));

      comments.push(DiffComment {
         filename:        filename.to_string(),
         old_line_start:  start.old_line,
         new_line_start:  start.new_line,
         old_line_end:    end.old_line,
         new_line_end:    end.new_line,
         start_is_in_new: start.is_in_new,
         end_is_in_new:   end.is_in_new,
         comment:         block.join("\n"),
         diff_text,
      });
      block.clear();
   };

   for line in &hunk.body {
      if line == "{" {
         if let Some(pos) = last_pos {
            flush_block(&mut block, &mut pending_brace, &pos, last_diff_line.as_deref().unwrap_or(""), &mut comments, filename);
         }
         in_braces = true;
         brace_range = None;
         brace_lines.clear();
         continue;
      }
      if line == "}" {
         in_braces = false;
         if let Some((start, end)) = brace_range {
            pending_brace = Some((start, end, brace_lines.join("\n")));
         }
         continue;
      }

      let sigil = line.chars().next();
      let is_diff_line = matches!(sigil, Some(' ') | Some('+') | Some('-') | Some('\\'));

      if is_diff_line {
         if let Some(pos) = last_pos {
            flush_block(&mut block, &mut pending_brace, &pos, last_diff_line.as_deref().unwrap_or(""), &mut comments, filename);
         }

         if sigil == Some('\\') {
            continue;
         }

         let cur = Pos { old_line, new_line, is_in_new: sigil != Some('-') };
         last_pos = Some(cur);
         last_diff_line = Some(line.clone());

         if in_braces {
            brace_range = Some(match brace_range {
               Some((start, _)) => (start, cur),
               None => (cur, cur),
            });
            brace_lines.push(line.clone());
         }

         match sigil {
            Some(' ') => {
               old_line += 1;
               new_line += 1;
            },
            Some('+') => new_line += 1,
            Some('-') => old_line += 1,
            _ => {},
         }
      } else {
         let stripped = line.strip_prefix("> ").or_else(|| line.strip_prefix('>')).unwrap_or(line);
         block.push(stripped.to_string());
      }
   }

   if let Some(pos) = last_pos {
      flush_block(&mut block, &mut pending_brace, &pos, last_diff_line.as_deref().unwrap_or(""), &mut comments, filename);
   }

   comments
}

fn extract_diff_comments(diff: &Diff) -> Vec<DiffComment> {
   let filename = diff.after_filename().to_string();
   diff
      .hunks
      .iter()
      .flat_map(|hunk| extract_hunk_comments(hunk, &filename))
      .collect()
}

/// Flat, in-order list of anchored comments across every diff in `diffs`.
#[must_use]
pub fn get_comments(diffs: &[Diff]) -> Vec<DiffComment> {
   diffs.iter().flat_map(extract_diff_comments).collect()
}

/// Flat, in-order list of anchored comments across an entire patch series.
#[must_use]
pub fn get_series_comments(series: &PatchSeries) -> Vec<DiffComment> {
   series.patches.iter().flat_map(|patch| get_comments(&patch.diffs)).collect()
}

/// Parses `text` as a bare diff and returns its comments; a thin convenience
/// wrapper so `pull_get_diff` output can be reviewed without constructing a
/// whole patch series.
pub fn get_comments_from_diff_text(text: &str) -> Result<Vec<DiffComment>> {
   Ok(get_comments(&crate::diff::parse_diffs(text)?))
}

#[cfg(test)]
mod tests {
   use super::*;
   use crate::diff::parse_diffs;
   use crate::patch::parse_patch_series;

   #[test]
   fn single_line_anchor_from_immediately_preceding_line() {
      let text = "diff --git a/f b/f\n--- a/f\n+++ b/f\n@@ -1,2 +1,2 @@\n context\n-old\n+new\n> looks wrong\n";
      let diffs = parse_diffs(text).unwrap();
      let comments = get_comments(&diffs);
      assert_eq!(comments.len(), 1);
      let c = &comments[0];
      assert_eq!(c.comment, "looks wrong");
      assert_eq!(c.filename, "f");
      assert!(c.start_is_in_new);
      assert_eq!(c.new_line_start, 2);
   }

   #[test]
   fn brace_enclosed_block_spans_a_range() {
      let text = "diff --git a/f b/f\n--- a/f\n+++ b/f\n@@ -1,3 +1,3 @@\n context\n{\n-old one\n-old two\n}\n> both of these are wrong\n";
      let diffs = parse_diffs(text).unwrap();
      let comments = get_comments(&diffs);
      assert_eq!(comments.len(), 1);
      let c = &comments[0];
      assert_eq!(c.old_line_start, 2);
      assert_eq!(c.old_line_end, 3);
      assert!(!c.start_is_in_new);
      assert_eq!(c.diff_text, "-old one\n-old two");
   }

   #[test]
   fn multiple_comment_blocks_in_one_hunk_are_returned_in_order() {
      let text = "diff --git a/f b/f\n--- a/f\n+++ b/f\n@@ -1,2 +1,2 @@\n-old\n+new\n> first\n context\n+more\n> second\n";
      let diffs = parse_diffs(text).unwrap();
      let comments = get_comments(&diffs);
      assert_eq!(comments.len(), 2);
      assert_eq!(comments[0].comment, "first");
      assert_eq!(comments[1].comment, "second");
   }

   #[test]
   fn series_comments_flatten_across_patches() {
      let series_text = "From aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa Mon Sep 17 00:00:00 2001\nFrom: a <a@example.com>\nDate: Mon, 1 Jan 2024 00:00:00 +0000\nSubject: [PATCH] x\n\nbody\n---\n stat\n\ndiff --git a/f b/f\n--- a/f\n+++ b/f\n@@ -1 +1 @@\n-x\n+y\n> note\n";
      let series = parse_patch_series(series_text).unwrap();
      let comments = get_series_comments(&series);
      assert_eq!(comments.len(), 1);
      assert_eq!(comments[0].comment, "note");
   }
}
