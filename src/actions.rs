//! Action-chain engine (§4.7).
//!
//! Grounded on `src/cmd/actions.c`'s `gcli_cmd_actions_handle`: a lazily
//! fetched item, a flat table of named actions, and a loop that advances the
//! argument vector one token at a time. The C source represents the fetched
//! item as a `void*` behind a fetcher/freeer function-pointer pair; the
//! "Re-architecture items" design note replaces that with a `Fetchable`
//! trait parameterising the chain, and replaces the manual `free_item` call
//! with ordinary Rust drop — `Option<F::Item>` frees itself exactly once when
//! the chain returns.
//!
//! The engine never prints: `main.rs` is the only place allowed to write to
//! a terminal (§10's logging note), so each handler returns the line it
//! would have printed and the engine collects them, inserting a blank string
//! between verbs exactly where the source emits a blank line (step 5).

use crate::capability::Forge;
use crate::context::Context;
use crate::error::{GcliError, Result};
use crate::path::Path;

/// Fetches the one item a chain of actions operates on. One implementation
/// per resource kind (issue, pull, milestone, pipeline, job).
pub trait Fetchable {
   type Item;

   fn fetch(&self, ctx: &Context, forge: &dyn Forge, path: &Path) -> Result<Self::Item>;
}

/// A single named action in a chain. `handler` may consume additional
/// tokens from `args` (e.g. `labels add foo remove bar`, `milestone 42`).
pub struct Action<Item> {
   pub name:       &'static str,
   pub needs_item: bool,
   pub handler: Box<
      dyn Fn(&Context, &dyn Forge, &Path, &mut Option<Item>, &mut Vec<String>) -> Result<Option<String>>,
   >,
}

impl<Item> Action<Item> {
   pub fn new(
      name: &'static str,
      needs_item: bool,
      handler: impl Fn(&Context, &dyn Forge, &Path, &mut Option<Item>, &mut Vec<String>) -> Result<Option<String>>
      + 'static,
   ) -> Self {
      Self { name, needs_item, handler: Box::new(handler) }
   }
}

/// Runs one action chain to completion (§4.7's five-step algorithm).
///
/// Returns the lines the handlers would have printed, with an empty string
/// marking each inter-verb blank line (step 5). A failure anywhere stops the
/// loop and propagates — verbs after the failing one are never attempted.
pub fn run_chain<F: Fetchable>(
   ctx: &Context,
   forge: &dyn Forge,
   path: &Path,
   fetcher: &F,
   actions: &[Action<F::Item>],
   mut args: Vec<String>,
) -> Result<Vec<String>> {
   if args.is_empty() {
      return Err(GcliError::usage("missing action"));
   }

   let mut item: Option<F::Item> = None;
   let mut output = Vec::new();

   loop {
      let name = args.remove(0);
      let action = actions
         .iter()
         .find(|a| a.name == name)
         .ok_or_else(|| GcliError::usage(format!("unknown action '{name}'")))?;

      if action.needs_item && item.is_none() {
         item = Some(fetcher.fetch(ctx, forge, path)?);
      }

      if let Some(line) = (action.handler)(ctx, forge, path, &mut item, &mut args)? {
         output.push(line);
      }

      if args.is_empty() {
         break;
      }
      output.push(String::new());
   }

   Ok(output)
}

#[cfg(test)]
mod tests {
   use super::*;
   use crate::config::Account;
   use crate::types::ForgeKind;

   struct Bare;
   impl Forge for Bare {}

   struct CountingFetcher {
      calls: std::cell::Cell<u32>,
   }

   impl Fetchable for CountingFetcher {
      type Item = u32;

      fn fetch(&self, _ctx: &Context, _forge: &dyn Forge, _path: &Path) -> Result<u32> {
         self.calls.set(self.calls.get() + 1);
         Ok(self.calls.get())
      }
   }

   fn test_ctx() -> Context {
      Context::new(Account {
         forge_type: ForgeKind::GitHub,
         api_base:   String::new(),
         token:      "t".into(),
         default:    true,
      })
   }

   #[test]
   fn empty_args_is_a_usage_error() {
      let ctx = test_ctx();
      let forge = Bare;
      let path = Path::default("o", "r", 1);
      let fetcher = CountingFetcher { calls: std::cell::Cell::new(0) };
      let err = run_chain(&ctx, &forge, &path, &fetcher, &[], Vec::new()).unwrap_err();
      assert_eq!(err.exit_code(), crate::error::EXIT_USAGE);
   }

   #[test]
   fn unknown_action_is_a_usage_error() {
      let ctx = test_ctx();
      let forge = Bare;
      let path = Path::default("o", "r", 1);
      let fetcher = CountingFetcher { calls: std::cell::Cell::new(0) };
      let actions: Vec<Action<u32>> = vec![];
      let err =
         run_chain(&ctx, &forge, &path, &fetcher, &actions, vec!["bogus".into()]).unwrap_err();
      assert_eq!(err.exit_code(), crate::error::EXIT_USAGE);
   }

   #[test]
   fn item_is_fetched_exactly_once_across_several_needs_item_verbs() {
      let ctx = test_ctx();
      let forge = Bare;
      let path = Path::default("o", "r", 1);
      let fetcher = CountingFetcher { calls: std::cell::Cell::new(0) };
      let actions: Vec<Action<u32>> = vec![
         Action::new("a", true, |_, _, _, item, _| {
            Ok(Some(format!("a saw {}", item.unwrap())))
         }),
         Action::new("b", true, |_, _, _, item, _| {
            Ok(Some(format!("b saw {}", item.unwrap())))
         }),
      ];
      let out =
         run_chain(&ctx, &forge, &path, &fetcher, &actions, vec!["a".into(), "b".into()]).unwrap();
      assert_eq!(fetcher.calls.get(), 1);
      assert_eq!(out, vec!["a saw 1".to_string(), String::new(), "b saw 1".to_string()]);
   }

   #[test]
   fn handler_can_consume_additional_tokens() {
      let ctx = test_ctx();
      let forge = Bare;
      let path = Path::default("o", "r", 1);
      let fetcher = CountingFetcher { calls: std::cell::Cell::new(0) };
      let actions: Vec<Action<u32>> = vec![Action::new("title", false, |_, _, _, _, args| {
         if args.is_empty() {
            return Err(GcliError::usage("missing title"));
         }
         let title = args.remove(0);
         Ok(Some(format!("title set to {title}")))
      })];
      let out = run_chain(&ctx, &forge, &path, &fetcher, &actions, vec![
         "title".into(),
         "New Title".into(),
      ])
      .unwrap();
      assert_eq!(out, vec!["title set to New Title".to_string()]);
   }

   #[test]
   fn a_failing_verb_stops_the_chain() {
      let ctx = test_ctx();
      let forge = Bare;
      let path = Path::default("o", "r", 1);
      let fetcher = CountingFetcher { calls: std::cell::Cell::new(0) };
      let actions: Vec<Action<u32>> = vec![
         Action::new("fail", false, |_, _, _, _, _| Err(GcliError::data("boom"))),
         Action::new("never", false, |_, _, _, _, _| Ok(Some("unreachable".into()))),
      ];
      let err = run_chain(&ctx, &forge, &path, &fetcher, &actions, vec![
         "fail".into(),
         "never".into(),
      ])
      .unwrap_err();
      assert_eq!(err.exit_code(), crate::error::EXIT_DATA);
   }
}
