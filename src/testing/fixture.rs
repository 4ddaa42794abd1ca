//! Fixture types and I/O operations.
//!
//! A fixture is a captured patch series plus the [`DiffComment`] list the
//! localizer is expected to produce for it, per §8's "fixtures become
//! unified-diff/patch-series samples instead of commit-message samples".

use std::{collections::HashMap, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{error::Result, types::DiffComment};

/// Manifest listing all fixtures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
   /// Map of fixture name to metadata
   #[serde(default)]
   pub fixtures: HashMap<String, FixtureEntry>,
}

/// Entry in the manifest for a single fixture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureEntry {
   /// Brief description of what this fixture tests
   pub description: String,
   /// Tags for filtering (e.g. "multi-file", "rename", "edge-case")
   #[serde(default)]
   pub tags: Vec<String>,
}

impl Manifest {
   /// Load manifest from fixtures directory
   pub fn load(fixtures_dir: &Path) -> Result<Self> {
      let path = fixtures_dir.join("manifest.toml");
      if !path.exists() {
         return Ok(Self { fixtures: HashMap::new() });
      }
      let content = fs::read_to_string(&path)?;
      toml::from_str(&content).map_err(crate::error::GcliError::Config)
   }

   /// Save manifest to fixtures directory
   pub fn save(&self, fixtures_dir: &Path) -> Result<()> {
      let path = fixtures_dir.join("manifest.toml");
      let content = toml::to_string_pretty(self)
         .map_err(|e| crate::error::GcliError::Data(format!("failed to serialize manifest: {e}")))?;
      fs::write(&path, content)?;
      Ok(())
   }

   /// Add a new fixture entry
   pub fn add(&mut self, name: String, entry: FixtureEntry) {
      self.fixtures.insert(name, entry);
   }
}

/// Metadata for a fixture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureMeta {
   /// Where the sample patch series came from (e.g. a forge/owner/repo triple)
   pub source_repo: String,
   /// Why this fixture is interesting
   pub description: String,
   /// When this fixture was captured
   pub captured_at: String,
   /// Tags for categorization
   #[serde(default)]
   pub tags: Vec<String>,
}

/// Input data for a fixture: the raw patch series text handed to
/// [`crate::patch::parse_patch_series`].
#[derive(Debug, Clone)]
pub struct FixtureInput {
   pub series: String,
}

/// Golden (expected) output: the comment list the localizer should derive
/// from the fixture's patch series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Golden {
   pub comments: Vec<DiffComment>,
}

/// A complete fixture with all data
#[derive(Debug, Clone)]
pub struct Fixture {
   /// Fixture name (directory name)
   pub name: String,
   pub meta: FixtureMeta,
   pub input: FixtureInput,
   /// Golden output (None if not yet generated)
   pub golden: Option<Golden>,
}

impl Fixture {
   /// Load a fixture from disk
   pub fn load(fixtures_dir: &Path, name: &str) -> Result<Self> {
      let fixture_dir = fixtures_dir.join(name);
      if !fixture_dir.exists() {
         return Err(crate::error::GcliError::Data(format!(
            "fixture '{}' not found at {}",
            name,
            fixture_dir.display()
         )));
      }

      let meta_path = fixture_dir.join("meta.toml");
      let meta: FixtureMeta = if meta_path.exists() {
         let content = fs::read_to_string(&meta_path)?;
         toml::from_str(&content).map_err(crate::error::GcliError::Config)?
      } else {
         return Err(crate::error::GcliError::Data(format!("fixture '{name}' missing meta.toml")));
      };

      let input_dir = fixture_dir.join("input");
      let series = fs::read_to_string(input_dir.join("series.patch")).map_err(|e| {
         crate::error::GcliError::Data(format!("failed to read series.patch: {e}"))
      })?;

      let golden_dir = fixture_dir.join("golden");
      let golden = if golden_dir.exists() {
         let comments_path = golden_dir.join("comments.json");
         if comments_path.exists() {
            let content = fs::read_to_string(&comments_path)?;
            let comments: Vec<DiffComment> = serde_json::from_str(&content)?;
            Some(Golden { comments })
         } else {
            None
         }
      } else {
         None
      };

      Ok(Self { name: name.to_string(), meta, input: FixtureInput { series }, golden })
   }

   /// Save a fixture to disk
   pub fn save(&self, fixtures_dir: &Path) -> Result<()> {
      let fixture_dir = fixtures_dir.join(&self.name);
      let input_dir = fixture_dir.join("input");
      let golden_dir = fixture_dir.join("golden");

      fs::create_dir_all(&input_dir)?;
      fs::create_dir_all(&golden_dir)?;

      let meta_content = toml::to_string_pretty(&self.meta)
         .map_err(|e| crate::error::GcliError::Data(format!("failed to serialize meta: {e}")))?;
      fs::write(fixture_dir.join("meta.toml"), meta_content)?;
      fs::write(input_dir.join("series.patch"), &self.input.series)?;

      if let Some(golden) = &self.golden {
         let comments_json = serde_json::to_string_pretty(&golden.comments)?;
         fs::write(golden_dir.join("comments.json"), comments_json)?;
      }

      Ok(())
   }

   /// Replace this fixture's golden output
   pub fn update_golden(&mut self, comments: Vec<DiffComment>) {
      self.golden = Some(Golden { comments });
   }
}

/// Discover all fixtures in a directory
pub fn discover_fixtures(fixtures_dir: &Path) -> Result<Vec<String>> {
   let mut fixtures = Vec::new();

   if !fixtures_dir.exists() {
      return Ok(fixtures);
   }

   for entry in fs::read_dir(fixtures_dir)? {
      let entry = entry?;
      let path = entry.path();

      if !path.is_dir() {
         continue;
      }

      if path.join("meta.toml").exists()
         && let Some(name) = path.file_name().and_then(|n| n.to_str())
      {
         fixtures.push(name.to_string());
      }
   }

   fixtures.sort();
   Ok(fixtures)
}

#[cfg(test)]
mod tests {
   use super::*;

   /// A scratch directory unique to this test process, cleaned up on drop.
   struct ScratchDir(std::path::PathBuf);

   impl ScratchDir {
      fn new(tag: &str) -> Self {
         let dir = std::env::temp_dir().join(format!("gcli-fixture-test-{tag}-{}", std::process::id()));
         fs::create_dir_all(&dir).unwrap();
         Self(dir)
      }
   }

   impl Drop for ScratchDir {
      fn drop(&mut self) {
         let _ = fs::remove_dir_all(&self.0);
      }
   }

   #[test]
   fn discover_fixtures_skips_entries_without_meta_toml() {
      let dir = ScratchDir::new("discover");
      fs::create_dir_all(dir.0.join("has-meta")).unwrap();
      fs::write(
         dir.0.join("has-meta").join("meta.toml"),
         "source_repo = \"x\"\ndescription = \"d\"\ncaptured_at = \"2026-01-01\"\n",
      )
      .unwrap();
      fs::create_dir_all(dir.0.join("no-meta")).unwrap();

      let found = discover_fixtures(&dir.0).unwrap();
      assert_eq!(found, vec!["has-meta".to_string()]);
   }

   #[test]
   fn save_then_load_round_trips_series_and_golden() {
      let dir = ScratchDir::new("roundtrip");
      let fixture = Fixture {
         name:   "sample".into(),
         meta:   FixtureMeta {
            source_repo: "github:owner/repo".into(),
            description: "a rename with a trailing comment hunk".into(),
            captured_at: "2026-01-01".into(),
            tags:        vec!["rename".into()],
         },
         input:  FixtureInput { series: "From abc\nSubject: [PATCH] x\n".into() },
         golden: Some(Golden {
            comments: vec![DiffComment {
               filename:        "src/lib.rs".into(),
               old_line_start:  1,
               new_line_start:  1,
               old_line_end:    2,
               new_line_end:    2,
               start_is_in_new: true,
               end_is_in_new:   true,
               comment:         String::new(),
               diff_text:       "+x".into(),
            }],
         }),
      };
      fixture.save(&dir.0).unwrap();

      let loaded = Fixture::load(&dir.0, "sample").unwrap();
      assert_eq!(loaded.input.series, fixture.input.series);
      assert_eq!(loaded.golden.unwrap().comments, fixture.golden.unwrap().comments);
   }

   #[test]
   fn load_missing_fixture_is_an_error() {
      let dir = ScratchDir::new("missing");
      assert!(Fixture::load(&dir.0, "nope").is_err());
   }
}
