//! # glean-core — Foundational Types for glean_parser
//!
//! Leaf crate of the workspace. Every other `glean-*` crate depends on it;
//! it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Provenance everywhere.** [`SourceLocation`] travels with every
//!    definition node and every diagnostic so a user can find the offending
//!    line without extra tooling.
//!
//! 2. **Validated identifier newtypes.** [`CategoryName`], [`MetricName`],
//!    [`PingName`] and [`Label`] can only be built through constructors that
//!    enforce the naming rules. Case renderings (`camel`, `pascal`) are
//!    computed in one place so emitters never re-implement them.
//!
//! 3. **UTC-only timestamps.** [`Timestamp`] backs the schema cache's
//!    `fetched_at` field and the build date used to resolve expiry.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `glean-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod digest;
pub mod error;
pub mod identity;
pub mod location;
pub mod temporal;

pub use digest::sha256_hex;
pub use error::{ConfigurationError, IdentifierError};
pub use identity::{camel_case, pascal_case, CategoryName, Label, MetricName, PingName};
pub use location::SourceLocation;
pub use temporal::Timestamp;
