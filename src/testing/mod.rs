//! Testing infrastructure for gcli's diff-comment localizer.
//!
//! Provides fixture-based golden file testing for [`crate::localize`]: each
//! fixture freezes a patch series and the [`crate::types::DiffComment`] list
//! the localizer is expected to derive from it, so regressions in anchor
//! placement show up without hitting a forge.
//!
//! # Directory Structure
//!
//! ```text
//! tests/fixtures/
//! ├── manifest.toml              # Fixture registry
//! ├── rename-with-trailer/
//! │   ├── meta.toml              # Fixture metadata
//! │   ├── input/
//! │   │   └── series.patch       # Frozen patch series
//! │   └── golden/
//! │       └── comments.json      # Expected DiffComment list
//! └── ...
//! ```

mod compare;
pub mod fixture;
mod runner;

use std::path::Path;

pub use compare::{CompareResult, compare_comments};
pub use fixture::{Fixture, FixtureEntry, FixtureInput, FixtureMeta, Golden, Manifest, discover_fixtures};
pub use runner::{RunResult, TestRunner, TestSummary};

use crate::error::Result;

/// Default fixtures directory relative to crate root
pub const FIXTURES_DIR: &str = "tests/fixtures";

/// Get the fixtures directory path
pub fn fixtures_dir() -> std::path::PathBuf {
   if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
      return Path::new(&manifest_dir).join(FIXTURES_DIR);
   }

   Path::new(FIXTURES_DIR).to_path_buf()
}

/// List all available fixtures
pub fn list_fixtures() -> Result<Vec<String>> {
   let manifest = Manifest::load(&fixtures_dir())?;
   Ok(manifest.fixtures.into_keys().collect())
}
