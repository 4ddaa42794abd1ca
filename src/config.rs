//! Account configuration loading.
//!
//! Out of core scope per the specification (the core never parses config
//! files itself — it only ever sees the resolved [`Account`]), but the
//! ambient stack still needs a loader, built the way the teacher's
//! `CommitConfig` loads and env-overrides its settings.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{GcliError, Result};
use crate::types::ForgeKind;

/// One configured forge account: a token plus the API base it talks to.
#[derive(Debug, Clone)]
pub struct Account {
   pub forge_type: ForgeKind,
   pub api_base:   String,
   pub token:      String,
   pub default:    bool,
}

#[derive(Debug, Clone, Deserialize)]
struct RawAccount {
   forge_type: ForgeKind,
   #[serde(default)]
   api_base:   Option<String>,
   #[serde(default)]
   token:      Option<String>,
   #[serde(default)]
   default:    bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GcliConfig {
   /// Name of the account to use when none is given explicitly.
   pub default_account: Option<String>,
   pub accounts:        HashMap<String, RawAccount>,
}

impl Default for GcliConfig {
   fn default() -> Self {
      Self { default_account: None, accounts: HashMap::new() }
   }
}

fn default_api_base(forge: ForgeKind) -> &'static str {
   match forge {
      ForgeKind::GitHub => "https://api.github.com",
      ForgeKind::GitLab => "https://gitlab.com/api/v4",
      ForgeKind::Gitea => "https://gitea.com/api/v1",
      ForgeKind::Bugzilla => "https://bugzilla.mozilla.org/rest",
   }
}

impl GcliConfig {
   /// Load config from the default location
   /// (`~/.config/gcli/config.toml`), falling back to an empty config if the
   /// file doesn't exist or `HOME` can't be determined.
   ///
   /// Environment variables override the chosen account afterwards:
   /// - `GCLI_TOKEN` overrides the resolved account's token.
   /// - `GCLI_ACCOUNT` selects which account to resolve.
   /// - `GCLI_FORGE` overrides the resolved account's forge type.
   pub fn load() -> Result<Self> {
      let config_path = if let Ok(custom_path) = std::env::var("GCLI_CONFIG") {
         PathBuf::from(custom_path)
      } else {
         Self::default_config_path().unwrap_or_default()
      };

      if config_path.exists() { Self::from_file(&config_path) } else { Ok(Self::default()) }
   }

   pub fn from_file(path: &Path) -> Result<Self> {
      let contents = std::fs::read_to_string(path)?;
      let config: Self = toml::from_str(&contents)?;
      Ok(config)
   }

   /// Get default config path. Tries `HOME` (Unix/Linux/macOS) then
   /// `USERPROFILE` (Windows).
   pub fn default_config_path() -> Result<PathBuf> {
      if let Ok(home) = std::env::var("HOME") {
         return Ok(PathBuf::from(home).join(".config/gcli/config.toml"));
      }
      if let Ok(profile) = std::env::var("USERPROFILE") {
         return Ok(PathBuf::from(profile).join(".config/gcli/config.toml"));
      }
      Err(GcliError::usage("could not determine home directory for config lookup"))
   }

   /// Resolve an [`Account`], applying `GCLI_TOKEN`/`GCLI_ACCOUNT`/
   /// `GCLI_FORGE` overrides on top of the named (or default) account.
   pub fn resolve_account(&self, name: Option<&str>) -> Result<Account> {
      let env_name = std::env::var("GCLI_ACCOUNT").ok();
      let name = name
         .map(str::to_string)
         .or(env_name)
         .or_else(|| self.default_account.clone())
         .or_else(|| {
            self
               .accounts
               .iter()
               .find(|(_, a)| a.default)
               .map(|(n, _)| n.clone())
         });

      let raw = name
         .as_deref()
         .and_then(|name| self.accounts.get(name).cloned())
         .unwrap_or(RawAccount {
            forge_type: ForgeKind::GitHub,
            api_base:   None,
            token:      None,
            default:    true,
         });

      let forge_type = match std::env::var("GCLI_FORGE").ok().as_deref() {
         Some("github") => ForgeKind::GitHub,
         Some("gitlab") => ForgeKind::GitLab,
         Some("gitea") => ForgeKind::Gitea,
         Some("bugzilla") => ForgeKind::Bugzilla,
         _ => raw.forge_type,
      };

      let token = std::env::var("GCLI_TOKEN")
         .ok()
         .or(raw.token)
         .ok_or_else(|| GcliError::usage("no token configured for the active account"))?;

      let api_base = raw
         .api_base
         .unwrap_or_else(|| default_api_base(forge_type).to_string());

      Ok(Account { forge_type, api_base, token, default: raw.default })
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn resolve_account_falls_back_to_default_api_base() {
      // SAFETY: single-threaded test process, no concurrent env access.
      unsafe {
         std::env::remove_var("GCLI_TOKEN");
         std::env::remove_var("GCLI_ACCOUNT");
         std::env::remove_var("GCLI_FORGE");
      }
      let mut config = GcliConfig::default();
      config.accounts.insert("home".to_string(), RawAccount {
         forge_type: ForgeKind::GitLab,
         api_base:   None,
         token:      Some("abc123".to_string()),
         default:    true,
      });
      let account = config.resolve_account(None).unwrap();
      assert_eq!(account.forge_type, ForgeKind::GitLab);
      assert_eq!(account.api_base, "https://gitlab.com/api/v4");
      assert_eq!(account.token, "abc123");
   }

   #[test]
   fn resolve_account_without_any_account_needs_a_token() {
      // SAFETY: single-threaded test process, no concurrent env access.
      unsafe {
         std::env::remove_var("GCLI_TOKEN");
         std::env::remove_var("GCLI_ACCOUNT");
         std::env::remove_var("GCLI_FORGE");
      }
      let config = GcliConfig::default();
      assert!(config.resolve_account(None).is_err());
   }
}
