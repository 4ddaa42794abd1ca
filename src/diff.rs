//! Unified-diff parsing (§4.8, first grammar level).
//!
//! Grounded on the teacher's `diff.rs` line-by-line state machine (iterate
//! lines, accumulate into the struct being built, push and reset on the next
//! boundary marker) but driving a different grammar: `diff --git` blocks and
//! their hunks, rather than file-diff token-budget accounting.

use crate::error::{GcliError, Result};

/// One `@@ -r_start[,r_len] +a_start[,a_len] @@[ context]` hunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
   pub old_start:    u64,
   pub old_len:      u64,
   pub new_start:    u64,
   pub new_len:      u64,
   pub context_info: String,
   /// Raw body lines between this header and the next boundary, sigils
   /// (` `, `+`, `-`, `\`) and any interleaved reviewer comment lines alike.
   pub body:         Vec<String>,
}

/// One `diff --git a/<file_a> b/<file_b>` block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Diff {
   pub file_a:            String,
   pub file_b:            String,
   pub new_file_mode:     Option<String>,
   pub deleted_file_mode: Option<String>,
   pub index_line:        Option<String>,
   pub r_file:            String,
   pub a_file:            String,
   pub hunks:             Vec<Hunk>,
}

impl Diff {
   /// The filename comments against this diff should be anchored to — the
   /// post-change ("after") side, per §4.9's `comment->after.filename`.
   #[must_use]
   pub fn after_filename(&self) -> &str {
      self.a_file.strip_prefix("b/").unwrap_or(&self.a_file)
   }
}

fn parse_hunk_header(line: &str) -> Result<(u64, u64, u64, u64, String)> {
   let rest = line
      .strip_prefix("@@ -")
      .ok_or_else(|| GcliError::parse(format!("malformed hunk header: {line}")))?;
   let (ranges, context_info) = match rest.split_once(" @@") {
      Some((r, c)) => (r, c.trim_start().to_string()),
      None => return Err(GcliError::parse(format!("malformed hunk header: {line}"))),
   };
   let (r_range, a_range) = ranges
      .split_once(" +")
      .ok_or_else(|| GcliError::parse(format!("malformed hunk header: {line}")))?;

   let parse_range = |s: &str| -> Result<(u64, u64)> {
      match s.split_once(',') {
         Some((start, len)) => Ok((
            start.parse().map_err(|_| GcliError::parse(format!("bad range in: {line}")))?,
            len.parse().map_err(|_| GcliError::parse(format!("bad range in: {line}")))?,
         )),
         None => Ok((s.parse().map_err(|_| GcliError::parse(format!("bad range in: {line}")))?, 1)),
      }
   };

   let (old_start, old_len) = parse_range(r_range)?;
   let (new_start, new_len) = parse_range(a_range)?;
   Ok((old_start, old_len, new_start, new_len, context_info))
}

/// Parses zero or more consecutive `diff --git` blocks out of `text`,
/// stopping at the first line that starts neither a diff nor belongs to one
/// already in progress (callers that embed diffs inside a larger patch
/// grammar pass only the slice that belongs to the diff portion).
pub fn parse_diffs(text: &str) -> Result<Vec<Diff>> {
   let mut diffs = Vec::new();
   let mut current: Option<Diff> = None;
   let mut current_hunk: Option<Hunk> = None;
   let mut expect_minus_plus = 0u8;

   macro_rules! close_hunk {
      () => {
         if let Some(hunk) = current_hunk.take() {
            current.as_mut().expect("hunk without diff").hunks.push(hunk);
         }
      };
   }
   macro_rules! close_diff {
      () => {
         close_hunk!();
         if let Some(diff) = current.take() {
            diffs.push(diff);
         }
      };
   }

   for line in text.lines() {
      if let Some(rest) = line.strip_prefix("diff --git a/") {
         close_diff!();
         let (file_a, file_b) = rest
            .split_once(" b/")
            .ok_or_else(|| GcliError::parse(format!("malformed diff header: {line}")))?;
         current = Some(Diff {
            file_a: format!("a/{file_a}"),
            file_b: format!("b/{file_b}"),
            ..Diff::default()
         });
         expect_minus_plus = 0;
         continue;
      }

      let Some(diff) = current.as_mut() else {
         continue;
      };

      if current_hunk.is_none() {
         if let Some(mode) = line.strip_prefix("new file mode ") {
            diff.new_file_mode = Some(mode.to_string());
            continue;
         }
         if let Some(mode) = line.strip_prefix("deleted file mode ") {
            diff.deleted_file_mode = Some(mode.to_string());
            continue;
         }
         if let Some(idx) = line.strip_prefix("index ") {
            diff.index_line = Some(idx.to_string());
            continue;
         }
         if let Some(f) = line.strip_prefix("--- ") {
            diff.r_file = f.to_string();
            expect_minus_plus = 1;
            continue;
         }
         if expect_minus_plus == 1
            && let Some(f) = line.strip_prefix("+++ ")
         {
            diff.a_file = f.to_string();
            expect_minus_plus = 2;
            continue;
         }
         if expect_minus_plus == 2 && !line.starts_with("@@ -") {
            return Err(GcliError::parse(format!("comment outside any hunk: {line}")));
         }
      }

      if line.starts_with("@@ -") {
         close_hunk!();
         let (old_start, old_len, new_start, new_len, context_info) = parse_hunk_header(line)?;
         current_hunk = Some(Hunk { old_start, old_len, new_start, new_len, context_info, body: Vec::new() });
         continue;
      }

      if let Some(hunk) = current_hunk.as_mut() {
         hunk.body.push(line.to_string());
      }
   }

   close_diff!();
   Ok(diffs)
}

#[cfg(test)]
mod tests {
   use super::*;

   const SAMPLE: &str = "diff --git a/src/lib.rs b/src/lib.rs\n\
index 1111111..2222222 100644\n\
--- a/src/lib.rs\n\
+++ b/src/lib.rs\n\
@@ -1,2 +1,3 @@ fn main\n\
 context line\n\
-old line\n\
+new line one\n\
+new line two\n";

   #[test]
   fn parses_a_single_diff_with_one_hunk() {
      let diffs = parse_diffs(SAMPLE).unwrap();
      assert_eq!(diffs.len(), 1);
      let diff = &diffs[0];
      assert_eq!(diff.file_a, "a/src/lib.rs");
      assert_eq!(diff.after_filename(), "src/lib.rs");
      assert_eq!(diff.hunks.len(), 1);

      let hunk = &diff.hunks[0];
      assert_eq!(hunk.old_start, 1);
      assert_eq!(hunk.old_len, 2);
      assert_eq!(hunk.new_start, 1);
      assert_eq!(hunk.new_len, 3);
      assert_eq!(hunk.context_info, "fn main");
      assert_eq!(hunk.body.len(), 4);
   }

   #[test]
   fn hunk_length_defaults_to_one_when_absent() {
      let diffs = parse_diffs(
         "diff --git a/f b/f\n--- a/f\n+++ b/f\n@@ -5 +5 @@\n-x\n+y\n",
      )
      .unwrap();
      let hunk = &diffs[0].hunks[0];
      assert_eq!(hunk.old_len, 1);
      assert_eq!(hunk.new_len, 1);
   }

   #[test]
   fn multiple_diffs_in_one_buffer() {
      let text = format!("{SAMPLE}diff --git a/other.rs b/other.rs\n--- a/other.rs\n+++ b/other.rs\n@@ -1 +1 @@\n-a\n+b\n");
      let diffs = parse_diffs(&text).unwrap();
      assert_eq!(diffs.len(), 2);
      assert_eq!(diffs[1].after_filename(), "other.rs");
   }

   #[test]
   fn malformed_hunk_header_is_a_parse_error() {
      let text = "diff --git a/f b/f\n--- a/f\n+++ b/f\n@@ bogus @@\n";
      let err = parse_diffs(text).unwrap_err();
      assert!(matches!(err, GcliError::Parse(_)));
   }
}
