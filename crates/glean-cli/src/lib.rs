//! # glean-cli — The `glean_parser` Command
//!
//! ## Subcommands
//!
//! - `translate` — definitions to Kotlin, Swift or Markdown
//! - `check` — validate a ping read from stdin against a JSON Schema
//! - `glinter` — report lint warnings for definitions
//!
//! ## Crate Policy
//!
//! - Argument parsing lives here; behavior lives in the library crates.
//! - Handlers return the process exit status.
//! - Logs go to stderr; stdout carries `check` and `glinter` output only.

pub mod check;
pub mod config;
pub mod glinter;
pub mod translate;
