//! Per-backend `impl Forge` adapters (§4.5/§4.6's biggest component).
//!
//! Grounded on `api.rs`'s dual-backend request/response shaping — each
//! backend here plays the role `api.rs` gives `ChatCompletions` vs
//! `AnthropicMessages`: same verb, different URL shape, different JSON
//! envelope, enriched by `original_source/src/github`, `src/gitlab`,
//! `src/gitea` for the REST surface itself.

pub mod bugzilla;
pub mod github;
pub mod gitea;
pub mod gitlab;

use crate::capability::Forge;
use crate::types::ForgeKind;

/// Returns the filled capability-set instance for `kind`.
#[must_use]
pub fn for_kind(kind: ForgeKind) -> Box<dyn Forge> {
   match kind {
      ForgeKind::GitHub => Box::new(github::GitHub),
      ForgeKind::GitLab => Box::new(gitlab::GitLab),
      ForgeKind::Gitea => Box::new(gitea::Gitea),
      ForgeKind::Bugzilla => Box::new(bugzilla::Bugzilla),
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn for_kind_returns_one_instance_per_backend() {
      for kind in [ForgeKind::GitHub, ForgeKind::GitLab, ForgeKind::Gitea, ForgeKind::Bugzilla] {
         let _forge = for_kind(kind);
      }
   }
}
