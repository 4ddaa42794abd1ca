//! Fetch pipeline: the only place HTTP I/O happens (§4.3).
//!
//! Grounded on `api.rs`'s `retry_api_call` exponential-backoff shape, reused
//! here for transient transport failures while GETs and paginated lists are
//! driven through one `reqwest::blocking::Client`. Every fetch attaches the
//! authorisation header from the active forge's `get_authheader` and, on a
//! non-2xx status, routes the body through the forge's `api_error_string`
//! before recording it as the context's last error.

use std::thread;
use std::time::Duration;

use reqwest::Method;

use crate::capability::Forge;
use crate::context::Context;
use crate::error::{GcliError, Result};
use crate::types::FetchLimit;

const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 250;

/// One parsed page: the items it carried plus the backend's "next page" URL,
/// if the response included one (a `Link: rel="next"` header on GitHub, a
/// `next` field in GitLab/Gitea's own body, none at all on Bugzilla).
pub struct Page<T> {
   pub items:    Vec<T>,
   pub next_url: Option<String>,
}

fn retry_transport<F, T>(mut call: F) -> Result<T>
where
   F: FnMut() -> Result<T>,
{
   let mut attempt = 0;
   loop {
      attempt += 1;
      match call() {
         Ok(value) => return Ok(value),
         Err(err) if attempt < MAX_RETRIES && is_transient(&err) => {
            let backoff_ms = INITIAL_BACKOFF_MS * (1 << (attempt - 1));
            thread::sleep(Duration::from_millis(backoff_ms));
         },
         Err(err) => return Err(err),
      }
   }
}

fn is_transient(err: &GcliError) -> bool {
   matches!(err, GcliError::Transport(_) | GcliError::Http(_))
}

fn raw_request(
   ctx: &Context,
   forge: &dyn Forge,
   method: Method,
   url: &str,
   accept: Option<&str>,
   payload: Option<&str>,
   extra_headers: &[(String, String)],
) -> Result<reqwest::blocking::Response> {
   retry_transport(|| {
      let mut builder = ctx
         .client()
         .request(method.clone(), url)
         .header("Authorization", forge.get_authheader(ctx))
         .header("Accept", accept.unwrap_or("application/json"));

      for (key, value) in extra_headers {
         builder = builder.header(key, value);
      }
      if let Some(body) = payload {
         builder = builder.header("Content-Type", "application/json").body(body.to_string());
      }

      builder.send().map_err(|e| GcliError::Transport(e.to_string()))
   })
}

fn check_status(
   ctx: &Context,
   forge: &dyn Forge,
   response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response> {
   if response.status().is_success() {
      return Ok(response);
   }
   let status = response.status();
   let body = response.text().unwrap_or_default();
   let message = forge.api_error_string(&body);
   ctx.set_error(message.clone());
   Err(GcliError::data(format!("{status}: {message}")))
}

/// GETs a single resource and returns its body verbatim.
pub fn fetch_one(
   ctx: &Context,
   forge: &dyn Forge,
   url: &str,
   accept: Option<&str>,
) -> Result<String> {
   let response = raw_request(ctx, forge, Method::GET, url, accept, None, &[])?;
   let response = check_status(ctx, forge, response)?;
   response.text().map_err(|e| GcliError::Transport(e.to_string()))
}

/// Drives a non-GET verb. The response body is only read (and so only
/// allocated) when `capture_body` is set, matching the source's
/// `out_buffer`-may-be-null contract for mutations the caller ignores.
pub fn fetch_with_method(
   ctx: &Context,
   forge: &dyn Forge,
   method: Method,
   url: &str,
   payload: Option<&str>,
   extra_headers: &[(String, String)],
   capture_body: bool,
) -> Result<Option<String>> {
   let response = raw_request(ctx, forge, method, url, None, payload, extra_headers)?;
   let response = check_status(ctx, forge, response)?;
   if capture_body {
      Ok(Some(response.text().map_err(|e| GcliError::Transport(e.to_string()))?))
   } else {
      Ok(None)
   }
}

/// Performs paginated GETs, following the backend's next-page link until one
/// of the stopping rules in §4.3 fires: transport failure, parser failure,
/// the accumulated count reaches `max` (when bounded), or there is no
/// further page. The result is truncated to exactly `max` elements when the
/// last page overshoots it.
pub fn fetch_list<T>(
   ctx: &Context,
   forge: &dyn Forge,
   start_url: &str,
   max: FetchLimit,
   parse: impl Fn(&str) -> Result<Page<T>>,
   mut filter: Option<&mut dyn FnMut(&mut Vec<T>)>,
) -> Result<Vec<T>> {
   let mut items = Vec::new();
   let mut next = Some(start_url.to_string());

   while let Some(url) = next {
      let body = fetch_one(ctx, forge, &url, None)?;
      let mut page = parse(&body)?;

      items.append(&mut page.items);
      if let Some(filter) = filter.as_deref_mut() {
         filter(&mut items);
      }

      if let Some(limit) = max.as_usize()
         && items.len() >= limit
      {
         items.truncate(limit);
         return Ok(items);
      }

      next = page.next_url;
   }

   Ok(items)
}

#[cfg(test)]
mod tests {
   use super::*;
   use crate::config::Account;
   use crate::types::ForgeKind;

   struct FakeForge;
   impl Forge for FakeForge {}

   fn test_ctx() -> Context {
      Context::new(Account {
         forge_type: ForgeKind::GitHub,
         api_base:   "https://example.invalid".to_string(),
         token:      "t".to_string(),
         default:    true,
      })
   }

   #[test]
   fn forge_and_context_construct_without_network() {
      let ctx = test_ctx();
      let forge = FakeForge;
      assert_eq!(ctx.forge(), ForgeKind::GitHub);
      assert_eq!(forge.get_authheader(&ctx), ctx.auth_header());
   }

   #[test]
   fn accumulate_and_truncate_matches_max_contract() {
      fn accumulate(pages: Vec<Vec<i32>>, max: FetchLimit) -> Vec<i32> {
         let mut items = Vec::new();
         for mut page in pages {
            items.append(&mut page);
            if let Some(limit) = max.as_usize()
               && items.len() >= limit
            {
               items.truncate(limit);
               return items;
            }
         }
         items
      }

      let pages = vec![vec![1, 2, 3], vec![4, 5]];
      assert_eq!(accumulate(pages.clone(), FetchLimit::Max(4)), vec![1, 2, 3, 4]);
      assert_eq!(accumulate(pages.clone(), FetchLimit::All), vec![1, 2, 3, 4, 5]);
      assert_eq!(accumulate(pages, FetchLimit::Max(2)), vec![1, 2]);
   }

   #[test]
   fn is_transient_flags_transport_and_http_only() {
      assert!(is_transient(&GcliError::Transport("x".into())));
      assert!(!is_transient(&GcliError::data("x")));
      assert!(!is_transient(&GcliError::usage("x")));
   }
}
