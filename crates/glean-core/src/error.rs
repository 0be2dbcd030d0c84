//! # Error Types — Shared Error Leaves
//!
//! Errors that more than one crate needs to construct. Parse and validation
//! errors live next to the loader and validator in `glean-parser`; fetch
//! errors live in `glean-schema`.

use thiserror::Error;

/// The invocation cannot proceed because of how it was configured.
///
/// Raised before any input is parsed: an unknown output format, a schema
/// locator with an unsupported scheme, or a malformed emitter option.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The requested output format has no registered emitter.
    #[error("unknown output format '{format}' (available: {available})")]
    UnknownFormat {
        /// The format identifier that was requested.
        format: String,
        /// Comma-separated list of registered formats.
        available: String,
    },

    /// The schema locator is neither a local path nor an http(s) URL.
    #[error("unsupported schema locator '{locator}': {reason}")]
    BadSchemaLocator {
        /// The locator as given by the user.
        locator: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An emitter option was not of the form `key=value`.
    #[error("invalid emitter option '{0}': expected KEY=VALUE")]
    BadOption(String),
}

/// An identifier violated its naming rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    /// The identifier is empty.
    #[error("{kind} name must not be empty")]
    Empty {
        /// Which kind of identifier (category, metric, ping, label).
        kind: &'static str,
    },

    /// The identifier exceeds its maximum length.
    #[error("{kind} name '{value}' is {len} characters long, maximum is {max}")]
    TooLong {
        /// Which kind of identifier.
        kind: &'static str,
        /// The offending value.
        value: String,
        /// Its length in characters.
        len: usize,
        /// The maximum allowed length.
        max: usize,
    },

    /// The identifier does not match the required pattern.
    #[error("{kind} name '{value}' must be {rule}")]
    Malformed {
        /// Which kind of identifier.
        kind: &'static str,
        /// The offending value.
        value: String,
        /// Human-readable description of the rule.
        rule: &'static str,
    },

    /// The identifier is reserved for the Glean SDK itself.
    #[error("{kind} name '{value}' is reserved")]
    Reserved {
        /// Which kind of identifier.
        kind: &'static str,
        /// The offending value.
        value: String,
    },
}
