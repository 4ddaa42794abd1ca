//! Error taxonomy for the core.
//!
//! Mirrors the taxonomy in the specification: usage errors, data errors,
//! transport errors, feature-unsupported errors, and diff/patch parse
//! errors. Every fallible core function returns `Result<T>`; at the CLI edge
//! these map onto the exit codes `0 = ok`, `1 = usage`, `2 = data error`.

use thiserror::Error;

pub const EXIT_OK: i32 = 0;
pub const EXIT_USAGE: i32 = 1;
pub const EXIT_DATA: i32 = 2;

#[derive(Debug, Error)]
pub enum GcliError {
   /// Missing required argument, conflicting options, unknown action name,
   /// unparseable numeric argument.
   #[error("usage error: {0}")]
   Usage(String),

   /// Owner/repo could not be inferred and only one of the two was given.
   #[error("usage error: {0}")]
   PathInference(String),

   /// Backend returned a failure status, response failed to parse, or the
   /// requested entity does not exist.
   #[error("{0}")]
   Data(String),

   /// The active forge does not implement the requested capability.
   #[error("not supported by this forge: {0}")]
   Unsupported(String),

   /// Network failure or authentication rejected.
   #[error("transport error: {0}")]
   Transport(String),

   /// Malformed hunk header, comment outside a hunk, premature EOF, etc.
   #[error("parse error: {0}")]
   Parse(String),

   #[error("io error: {0}")]
   Io(#[from] std::io::Error),

   #[error("json error: {0}")]
   Json(#[from] serde_json::Error),

   #[error(transparent)]
   Http(#[from] reqwest::Error),

   #[error("config error: {0}")]
   Config(#[from] toml::de::Error),
}

impl GcliError {
   /// Exit code this error maps to under the §4.7/§6 convention.
   #[must_use]
   pub fn exit_code(&self) -> i32 {
      match self {
         Self::Usage(_) | Self::PathInference(_) => EXIT_USAGE,
         Self::Data(_)
         | Self::Unsupported(_)
         | Self::Transport(_)
         | Self::Parse(_)
         | Self::Io(_)
         | Self::Json(_)
         | Self::Http(_)
         | Self::Config(_) => EXIT_DATA,
      }
   }

   pub fn usage(msg: impl Into<String>) -> Self {
      Self::Usage(msg.into())
   }

   pub fn data(msg: impl Into<String>) -> Self {
      Self::Data(msg.into())
   }

   pub fn unsupported(msg: impl Into<String>) -> Self {
      Self::Unsupported(msg.into())
   }

   pub fn transport(msg: impl Into<String>) -> Self {
      Self::Transport(msg.into())
   }

   pub fn parse(msg: impl Into<String>) -> Self {
      Self::Parse(msg.into())
   }
}

pub type Result<T> = std::result::Result<T, GcliError>;

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn usage_errors_exit_one() {
      assert_eq!(GcliError::usage("missing action").exit_code(), EXIT_USAGE);
      assert_eq!(
         GcliError::PathInference("need owner and repo".into()).exit_code(),
         EXIT_USAGE
      );
   }

   #[test]
   fn data_and_transport_errors_exit_two() {
      assert_eq!(GcliError::data("404").exit_code(), EXIT_DATA);
      assert_eq!(GcliError::transport("timeout").exit_code(), EXIT_DATA);
      assert_eq!(GcliError::unsupported("job_retry").exit_code(), EXIT_DATA);
      assert_eq!(GcliError::parse("bad hunk header").exit_code(), EXIT_DATA);
   }

   #[test]
   fn display_messages_are_human_readable() {
      let err = GcliError::unsupported("job_retry");
      assert_eq!(err.to_string(), "not supported by this forge: job_retry");
   }
}
