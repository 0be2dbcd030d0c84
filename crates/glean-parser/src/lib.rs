#![warn(missing_docs)]

//! # glean-parser — Definition Pipeline
//!
//! Turns metrics and pings YAML documents into the emitter-neutral
//! [`Model`]:
//!
//! ```text
//! load_documents ──► Validator::validate ──► ModelBuilder::build ──► lint_model
//!   (ParseError)       (ValidationError)       (ModelError: defect)   (warnings)
//! ```
//!
//! Each stage gates the next. Parse and validation errors are accumulated
//! across every input file so one run reports everything.
//!
//! ## Crate Policy
//!
//! - Depends only on `glean-core` internally.
//! - No I/O besides reading input files in [`loader::load_documents`].

pub mod error;
pub mod fields;
pub mod lines;
pub mod lint;
pub mod loader;
pub mod model;
pub mod types;
pub mod validate;

pub use error::{ErrorAccumulator, ParseError, ValidationError, ValidationErrorKind};
pub use lint::{lint_model, LintKind, LintWarning};
pub use loader::{
    load_documents, parse_document, DefinitionDocument, DefinitionNode, DocumentKind,
    MergedDefinitionSet,
};
pub use model::{Category, Entity, Model, ModelBuilder, ModelError, Ping};
pub use types::{Bug, Expiry, HistogramType, Lifetime, MemoryUnit, MetricType, TimeUnit};
pub use validate::{Validator, ValidatorOptions};
