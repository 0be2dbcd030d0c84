//! # glean-translate — Emitters and the Translation Orchestrator
//!
//! Renders the model built by `glean-parser` into target-language source
//! files and commits them to an output directory.
//!
//! ## Formats
//!
//! | Format | Outputs | Options |
//! |---|---|---|
//! | `kotlin` | `<Category>.kt` per category, `Pings.kt` | `namespace`, `glean_namespace` |
//! | `swift` | `Metrics.swift` | `namespace`, `glean_namespace` |
//! | `markdown` | `metrics.md` | `project_title` |
//!
//! ## Key Design Principles
//!
//! 1. **Emitters are pure.** They take `&Model` and return bytes; the same
//!    model always yields byte-identical outputs.
//!
//! 2. **All-or-nothing generation.** Nothing touches the output directory
//!    until every output has been generated and its path checked.
//!
//! 3. **Idempotent commits.** Unchanged files are not rewritten and owned
//!    files that are no longer generated are removed.

pub mod emitter;
pub mod kotlin;
pub mod markdown;
pub mod orchestrator;
pub mod registry;
pub mod swift;
pub mod util;

#[cfg(test)]
mod testing;

pub use emitter::{check_output_paths, Emitter, EmitterError, EmitterOptions, EmitterOutput};
pub use kotlin::KotlinEmitter;
pub use markdown::MarkdownEmitter;
pub use orchestrator::{translate, TranslateError, TranslateOptions, TranslateReport};
pub use registry::{EmitterFactory, EmitterRegistry};
pub use swift::SwiftEmitter;
