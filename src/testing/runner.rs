//! Test runner for fixture-based testing.
//!
//! Runs entirely offline: a fixture's patch series goes through
//! [`crate::patch::parse_patch_series`] and [`crate::localize::get_series_comments`],
//! and the resulting comments are compared against the fixture's golden list.
//! No forge, no network, no account — this harness never leaves the process.

use super::{
   compare::{CompareResult, compare_comments},
   fixture::{Fixture, discover_fixtures},
};
use crate::{error::Result, localize, patch, types::DiffComment};

/// Result of running a single fixture
#[derive(Debug)]
pub struct RunResult {
   /// Fixture name
   pub name:       String,
   /// Comparison result (None if the fixture carries no golden list)
   pub comparison: Option<CompareResult>,
   /// The comments actually produced for the fixture's patch series
   pub comments:   Vec<DiffComment>,
   /// Error if the fixture failed to load or parse
   pub error:      Option<String>,
}

/// Test runner configuration
pub struct TestRunner {
   /// Fixtures directory
   pub fixtures_dir: std::path::PathBuf,
   /// Filter pattern for fixture names
   pub filter:       Option<String>,
}

impl TestRunner {
   /// Create a new test runner
   pub fn new(fixtures_dir: impl Into<std::path::PathBuf>) -> Self {
      Self { fixtures_dir: fixtures_dir.into(), filter: None }
   }

   /// Set filter pattern
   pub fn with_filter(mut self, filter: Option<String>) -> Self {
      self.filter = filter;
      self
   }

   /// Run all fixtures and return results
   pub fn run_all(&self) -> Result<Vec<RunResult>> {
      let fixture_names = discover_fixtures(&self.fixtures_dir)?;
      let mut results = Vec::new();

      for name in fixture_names {
         if let Some(pattern) = &self.filter
            && !name.contains(pattern)
         {
            continue;
         }

         results.push(self.run_fixture(&name));
      }

      Ok(results)
   }

   /// Run a single fixture
   pub fn run_fixture(&self, name: &str) -> RunResult {
      match self.run_fixture_inner(name) {
         Ok(result) => result,
         Err(e) => RunResult {
            name:       name.to_string(),
            comparison: None,
            comments:   Vec::new(),
            error:      Some(e.to_string()),
         },
      }
   }

   fn run_fixture_inner(&self, name: &str) -> Result<RunResult> {
      let fixture = Fixture::load(&self.fixtures_dir, name)?;
      let series = patch::parse_patch_series(&fixture.input.series)?;
      let comments = localize::get_series_comments(&series);

      let comparison = fixture.golden.as_ref().map(|g| compare_comments(&g.comments, &comments));

      Ok(RunResult { name: name.to_string(), comparison, comments, error: None })
   }

   /// Update golden files for all fixtures
   pub fn update_all(&self) -> Result<Vec<String>> {
      let fixture_names = discover_fixtures(&self.fixtures_dir)?;
      let mut updated = Vec::new();

      for name in fixture_names {
         if let Some(pattern) = &self.filter
            && !name.contains(pattern)
         {
            continue;
         }

         self.update_fixture(&name)?;
         updated.push(name);
      }

      Ok(updated)
   }

   /// Update golden file for a single fixture
   pub fn update_fixture(&self, name: &str) -> Result<()> {
      let result = self.run_fixture(name);

      if let Some(err) = result.error {
         return Err(crate::error::GcliError::Data(format!("failed to run fixture '{name}': {err}")));
      }

      let mut fixture = Fixture::load(&self.fixtures_dir, name)?;
      fixture.update_golden(result.comments);
      fixture.save(&self.fixtures_dir)?;

      Ok(())
   }
}

/// Summary of test run
#[derive(Debug, Default)]
pub struct TestSummary {
   pub total:     usize,
   pub passed:    usize,
   pub failed:    usize,
   pub no_golden: usize,
   pub errors:    usize,
}

impl TestSummary {
   /// Create summary from results
   pub fn from_results(results: &[RunResult]) -> Self {
      let mut summary = Self { total: results.len(), ..Default::default() };

      for result in results {
         if result.error.is_some() {
            summary.errors += 1;
         } else if let Some(cmp) = &result.comparison {
            if cmp.passed {
               summary.passed += 1;
            } else {
               summary.failed += 1;
            }
         } else {
            summary.no_golden += 1;
         }
      }

      summary
   }

   /// Check if all tests passed
   pub const fn all_passed(&self) -> bool {
      self.failed == 0 && self.errors == 0
   }
}

#[cfg(test)]
mod tests {
   use std::fs;

   use super::*;
   use crate::testing::fixture::FixtureMeta;

   struct ScratchDir(std::path::PathBuf);

   impl ScratchDir {
      fn new(tag: &str) -> Self {
         let dir = std::env::temp_dir().join(format!("gcli-runner-test-{tag}-{}", std::process::id()));
         fs::create_dir_all(&dir).unwrap();
         Self(dir)
      }
   }

   impl Drop for ScratchDir {
      fn drop(&mut self) {
         let _ = fs::remove_dir_all(&self.0);
      }
   }

   const SAMPLE_SERIES: &str = "--- a/src/lib.rs\n+++ b/src/lib.rs\n@@ -1,2 +1,3 @@\n fn one() {}\n+fn two() {}\n fn three() {}\n";

   fn write_fixture(dir: &std::path::Path, name: &str, golden: Option<Vec<DiffComment>>) {
      let fixture = Fixture {
         name:   name.to_string(),
         meta:   FixtureMeta {
            source_repo: "local".into(),
            description: "a single-hunk addition".into(),
            captured_at: "2026-01-01".into(),
            tags:        vec![],
         },
         input:  crate::testing::fixture::FixtureInput { series: SAMPLE_SERIES.to_string() },
         golden: golden.map(|comments| crate::testing::fixture::Golden { comments }),
      };
      fixture.save(dir).unwrap();
   }

   #[test]
   fn fixture_with_no_golden_reports_no_golden_not_a_failure() {
      let dir = ScratchDir::new("no-golden");
      write_fixture(&dir.0, "sample", None);

      let runner = TestRunner::new(&dir.0);
      let results = runner.run_all().unwrap();
      assert_eq!(results.len(), 1);
      assert!(results[0].error.is_none());
      assert!(results[0].comparison.is_none());

      let summary = TestSummary::from_results(&results);
      assert_eq!(summary.no_golden, 1);
      assert!(summary.all_passed());
   }

   #[test]
   fn unknown_fixture_name_surfaces_as_a_run_error() {
      let dir = ScratchDir::new("unknown");
      let runner = TestRunner::new(&dir.0);
      let result = runner.run_fixture("does-not-exist");
      assert!(result.error.is_some());
      assert!(result.comparison.is_none());
   }

   #[test]
   fn filter_restricts_run_all_to_matching_fixture_names() {
      let dir = ScratchDir::new("filter");
      write_fixture(&dir.0, "alpha-case", None);
      write_fixture(&dir.0, "beta-case", None);

      let runner = TestRunner::new(&dir.0).with_filter(Some("alpha".to_string()));
      let results = runner.run_all().unwrap();
      assert_eq!(results.len(), 1);
      assert_eq!(results[0].name, "alpha-case");
   }
}
