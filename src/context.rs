//! Process-wide handle threaded through every core operation.
//!
//! Grounded on `api.rs`'s `build_client` (timeout configuration) and on the
//! global `g_clictx` / `struct gcli_ctx` in the original source, excised of
//! its process-wide-global nature per the "Global state" design note: the
//! context is passed explicitly rather than reached for implicitly.

use std::cell::RefCell;
use std::time::Duration;

use crate::config::Account;
use crate::types::ForgeKind;

/// One most-recent error string, overwritten on each failure, plus the
/// active forge kind, the resolved account, and the shared HTTP client.
///
/// Not re-entrant: one operation at a time per context, matching the
/// single-threaded, synchronous concurrency model in the specification.
pub struct Context {
   forge:      ForgeKind,
   account:    Account,
   client:     reqwest::blocking::Client,
   last_error: RefCell<Option<String>>,
}

impl Context {
   #[must_use]
   pub fn new(account: Account) -> Self {
      let forge = account.forge_type;
      let client = reqwest::blocking::Client::builder()
         .timeout(Duration::from_secs(30))
         .connect_timeout(Duration::from_secs(10))
         .user_agent(concat!("gcli/", env!("CARGO_PKG_VERSION")))
         .build()
         .unwrap_or_else(|_| reqwest::blocking::Client::new());

      Self { forge, account, client, last_error: RefCell::new(None) }
   }

   #[must_use]
   pub fn forge(&self) -> ForgeKind {
      self.forge
   }

   #[must_use]
   pub fn account(&self) -> &Account {
      &self.account
   }

   #[must_use]
   pub fn client(&self) -> &reqwest::blocking::Client {
      &self.client
   }

   /// Overwrites the context's last-error string.
   pub fn set_error(&self, message: impl Into<String>) {
      *self.last_error.borrow_mut() = Some(message.into());
   }

   /// Fetches the most recently set error message, if any.
   #[must_use]
   pub fn get_error(&self) -> Option<String> {
      self.last_error.borrow().clone()
   }

   /// Authorisation header value for the active account, e.g.
   /// `token <secret>`.
   #[must_use]
   pub fn auth_header(&self) -> String {
      format!("token {}", self.account.token)
   }
}

#[cfg(test)]
mod tests {
   use super::*;
   use crate::config::Account;

   fn test_account() -> Account {
      Account {
         forge_type: ForgeKind::GitHub,
         api_base:   "https://api.github.com".to_string(),
         token:      "secret".to_string(),
         default:    true,
      }
   }

   #[test]
   fn set_error_overwrites_previous_value() {
      let ctx = Context::new(test_account());
      assert_eq!(ctx.get_error(), None);
      ctx.set_error("first failure");
      assert_eq!(ctx.get_error().as_deref(), Some("first failure"));
      ctx.set_error("second failure");
      assert_eq!(ctx.get_error().as_deref(), Some("second failure"));
   }

   #[test]
   fn auth_header_carries_the_account_token() {
      let ctx = Context::new(test_account());
      assert_eq!(ctx.auth_header(), "token secret");
   }

   #[test]
   fn forge_matches_the_account() {
      let ctx = Context::new(test_account());
      assert_eq!(ctx.forge(), ForgeKind::GitHub);
   }
}
