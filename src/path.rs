//! Backend-independent name of a remote object.
//!
//! Grounded on `include/gcli/path.h` in the original source, which defines
//! the same tagged union (`gcli_path`) this module ports to a Rust enum.

use crate::error::{GcliError, Result};
use crate::types::ForgeKind;

/// Names a remote object independent of backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Path {
   /// `id == 0` denotes "the repository itself".
   Default { owner: String, repo: String, id: u64 },
   Bugzilla { product: String, component: String },
   /// Raw numeric id in a forge that supports it.
   Id(u64),
   /// Pre-resolved absolute URL, bypasses construction.
   Url(String),
}

impl Path {
   #[must_use]
   pub fn default(owner: impl Into<String>, repo: impl Into<String>, id: u64) -> Self {
      Self::Default { owner: owner.into(), repo: repo.into(), id }
   }

   #[must_use]
   pub fn owner_repo(&self) -> Option<(&str, &str)> {
      match self {
         Self::Default { owner, repo, .. } => Some((owner, repo)),
         _ => None,
      }
   }

   #[must_use]
   pub fn id(&self) -> Option<u64> {
      match self {
         Self::Default { id, .. } => Some(*id),
         Self::Id(id) => Some(*id),
         _ => None,
      }
   }
}

impl Default for Path {
   /// An empty `Default{}` path — used as a struct-update base by option
   /// builders (e.g. [`crate::capability::PullSubmitOpts`]), never a
   /// meaningful path on its own.
   fn default() -> Self {
      Self::Default { owner: String::new(), repo: String::new(), id: 0 }
   }
}

/// A caller-supplied owner/repo inference function, invoked when one or both
/// names are missing from a `Default` path (config/git remote inference is
/// out of core scope, so this is injected).
pub trait OwnerRepoInference {
   /// Returns `(owner, repo)` if both can be inferred, `None` otherwise.
   fn infer(&self) -> Option<(String, String)>;
}

/// Sanitises a path against the active forge's quirks.
///
/// - On the Bugzilla-like backend, a `Default{owner, repo, id}` is
///   reinterpreted as `Bugzilla{product, component}` when `id == 0`, and as
///   `Id(id)` when both names are absent.
/// - Otherwise runs owner/repo inference when one of the two names is
///   missing, failing with a usage error if only one is missing, or invoking
///   `inference` if both are missing.
pub fn sanitise(
   path: Path,
   forge: ForgeKind,
   inference: &dyn OwnerRepoInference,
) -> Result<Path> {
   match path {
      Path::Default { owner, repo, id } if forge == ForgeKind::Bugzilla => {
         let owner_empty = owner.is_empty();
         let repo_empty = repo.is_empty();
         if owner_empty && repo_empty && id > 0 {
            Ok(Path::Id(id))
         } else if id == 0 {
            Ok(Path::Bugzilla { product: owner, component: repo })
         } else {
            Ok(Path::Default { owner, repo, id })
         }
      },
      Path::Default { owner, repo, id } => {
         let owner_empty = owner.is_empty();
         let repo_empty = repo.is_empty();
         if !owner_empty && !repo_empty {
            Ok(Path::Default { owner, repo, id })
         } else if owner_empty != repo_empty {
            Err(GcliError::PathInference(
               "both owner and repo must be given, or neither".to_string(),
            ))
         } else {
            match inference.infer() {
               Some((owner, repo)) => Ok(Path::Default { owner, repo, id }),
               None => Err(GcliError::PathInference(
                  "could not infer owner/repo for this repository".to_string(),
               )),
            }
         }
      },
      other => Ok(other),
   }
}

/// Inference source that never finds anything — used when the caller has
/// explicitly disabled inference (e.g. non-interactive scripts).
pub struct NoInference;

impl OwnerRepoInference for NoInference {
   fn infer(&self) -> Option<(String, String)> {
      None
   }
}

/// Inference source that always returns a fixed pair — used in tests and by
/// callers that already resolved the remote themselves.
pub struct FixedInference(pub Option<(String, String)>);

impl OwnerRepoInference for FixedInference {
   fn infer(&self) -> Option<(String, String)> {
      self.0.clone()
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn both_owner_and_repo_set_is_unchanged() {
      let path = Path::default("herrhotzenplotz", "gcli", 42);
      let out = sanitise(path.clone(), ForgeKind::GitHub, &NoInference).unwrap();
      assert_eq!(out, path);
   }

   #[test]
   fn bugzilla_default_with_zero_id_becomes_product_component() {
      let path = Path::default("Core", "Layout", 0);
      let out = sanitise(path, ForgeKind::Bugzilla, &NoInference).unwrap();
      assert_eq!(out, Path::Bugzilla { product: "Core".into(), component: "Layout".into() });
   }

   #[test]
   fn bugzilla_default_with_no_names_becomes_id() {
      let path = Path::default("", "", 12345);
      let out = sanitise(path, ForgeKind::Bugzilla, &NoInference).unwrap();
      assert_eq!(out, Path::Id(12345));
   }

   #[test]
   fn missing_both_names_triggers_inference() {
      let path = Path::default("", "", 7);
      let inference = FixedInference(Some(("owner".into(), "repo".into())));
      let out = sanitise(path, ForgeKind::GitHub, &inference).unwrap();
      assert_eq!(out, Path::default("owner", "repo", 7));
   }

   #[test]
   fn missing_both_names_with_failed_inference_is_usage_error() {
      let path = Path::default("", "", 7);
      let err = sanitise(path, ForgeKind::GitHub, &NoInference).unwrap_err();
      assert_eq!(err.exit_code(), crate::error::EXIT_USAGE);
   }

   #[test]
   fn missing_only_one_name_is_usage_error() {
      let path = Path::default("owner", "", 7);
      let err = sanitise(path, ForgeKind::GitHub, &NoInference).unwrap_err();
      assert_eq!(err.exit_code(), crate::error::EXIT_USAGE);
   }

   #[test]
   fn url_and_id_pass_through_unchanged() {
      let url = Path::Url("https://example.com/x".into());
      assert_eq!(sanitise(url.clone(), ForgeKind::GitHub, &NoInference).unwrap(), url);

      let id = Path::Id(9);
      assert_eq!(sanitise(id.clone(), ForgeKind::GitLab, &NoInference).unwrap(), id);
   }
}
