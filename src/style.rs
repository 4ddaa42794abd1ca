//! Terminal styling for CLI output.
//!
//! Respects the `NO_COLOR` environment variable (<https://no-color.org/>).
//! The table/spinner/box-drawing rendering the teacher carries has no
//! SPEC_FULL.md counterpart here and was dropped — see DESIGN.md.

use std::io::IsTerminal;

/// Whether colour output is enabled.
pub fn colors_enabled() -> bool {
   std::env::var("NO_COLOR").is_err() && std::io::stdout().is_terminal()
}

fn paint(s: &str, code: &str) -> String {
   if colors_enabled() { format!("\x1b[{code}m{s}\x1b[0m") } else { s.to_string() }
}

pub fn success(s: &str) -> String {
   paint(s, "1;32")
}

pub fn warning(s: &str) -> String {
   paint(s, "33")
}

pub fn error(s: &str) -> String {
   paint(s, "1;31")
}

pub fn info(s: &str) -> String {
   paint(s, "36")
}

pub fn dim(s: &str) -> String {
   paint(s, "2")
}

pub fn bold(s: &str) -> String {
   paint(s, "1")
}

pub mod icons {
   pub const SUCCESS: &str = "\u{2713}";
   pub const WARNING: &str = "\u{26A0}";
   pub const ERROR: &str = "\u{2717}";
   pub const INFO: &str = "\u{2139}";
}

/// Prints a warning on stderr, regardless of `NO_COLOR`.
pub fn warn(msg: &str) {
   eprintln!("{} {}", warning(icons::WARNING), warning(msg));
}

/// Prints an informational message on stderr.
pub fn print_info(msg: &str) {
   eprintln!("{} {msg}", info(icons::INFO));
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn no_color_env_disables_colour() {
      // SAFETY: test-only, single-threaded access to process env within this test.
      unsafe {
         std::env::set_var("NO_COLOR", "1");
      }
      let plain = success("ok");
      assert_eq!(plain, "ok");
      unsafe {
         std::env::remove_var("NO_COLOR");
      }
   }
}
