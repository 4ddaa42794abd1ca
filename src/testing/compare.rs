//! Comparison logic for fixture testing.

use crate::types::DiffComment;

/// Result of comparing a golden comment list to the one the localizer
/// actually produced for a fixture's patch series.
#[derive(Debug, Clone)]
pub struct CompareResult {
   /// Number of comments in the golden list
   pub golden_count: usize,
   /// Number of comments the localizer actually produced
   pub actual_count: usize,
   /// Golden comments with no matching actual comment (same filename and
   /// anchor range)
   pub missing:      Vec<DiffComment>,
   /// Actual comments with no matching golden entry
   pub extra:        Vec<DiffComment>,
   /// Whether every golden comment was matched and nothing extra appeared
   pub passed:       bool,
   /// Human-readable summary
   pub summary:      String,
}

/// A comment "matches" another when it anchors the same file and line range;
/// the free-text `comment` body is allowed to differ, since wording isn't
/// part of the contract the localizer promises.
fn anchors_match(a: &DiffComment, b: &DiffComment) -> bool {
   a.filename == b.filename
      && a.old_line_start == b.old_line_start
      && a.new_line_start == b.new_line_start
      && a.old_line_end == b.old_line_end
      && a.new_line_end == b.new_line_end
}

/// Compares a fixture's golden comment list against the one actually
/// produced for its patch series.
pub fn compare_comments(golden: &[DiffComment], actual: &[DiffComment]) -> CompareResult {
   let missing: Vec<DiffComment> =
      golden.iter().filter(|g| !actual.iter().any(|a| anchors_match(g, a))).cloned().collect();
   let extra: Vec<DiffComment> =
      actual.iter().filter(|a| !golden.iter().any(|g| anchors_match(g, a))).cloned().collect();

   let passed = missing.is_empty() && extra.is_empty();
   let summary = if passed {
      format!("✓ {} comments matched", golden.len())
   } else {
      format!(
         "✗ {} missing, {} extra (golden {}, actual {})",
         missing.len(),
         extra.len(),
         golden.len(),
         actual.len()
      )
   };

   CompareResult { golden_count: golden.len(), actual_count: actual.len(), missing, extra, passed, summary }
}

#[cfg(test)]
mod tests {
   use super::*;

   fn comment(filename: &str, old_start: u64, new_start: u64) -> DiffComment {
      DiffComment {
         filename:        filename.into(),
         old_line_start:  old_start,
         new_line_start:  new_start,
         old_line_end:    old_start,
         new_line_end:    new_start,
         start_is_in_new: true,
         end_is_in_new:   true,
         comment:         String::new(),
         diff_text:       "+x".into(),
      }
   }

   #[test]
   fn identical_lists_pass() {
      let golden = vec![comment("a.rs", 1, 1)];
      let actual = golden.clone();
      let result = compare_comments(&golden, &actual);
      assert!(result.passed);
      assert!(result.missing.is_empty());
      assert!(result.extra.is_empty());
   }

   #[test]
   fn comment_wording_difference_does_not_fail_the_match() {
      let golden = vec![comment("a.rs", 1, 1)];
      let mut actual = golden.clone();
      actual[0].comment = "a different note".into();
      let result = compare_comments(&golden, &actual);
      assert!(result.passed);
   }

   #[test]
   fn a_golden_comment_with_no_actual_match_is_reported_missing() {
      let golden = vec![comment("a.rs", 1, 1)];
      let actual = vec![];
      let result = compare_comments(&golden, &actual);
      assert!(!result.passed);
      assert_eq!(result.missing.len(), 1);
      assert!(result.extra.is_empty());
   }

   #[test]
   fn an_unexpected_actual_comment_is_reported_extra() {
      let golden = vec![];
      let actual = vec![comment("a.rs", 1, 1)];
      let result = compare_comments(&golden, &actual);
      assert!(!result.passed);
      assert!(result.missing.is_empty());
      assert_eq!(result.extra.len(), 1);
   }
}
