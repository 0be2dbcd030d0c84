//! # glean-schema — Schema Cache and Ping Validator
//!
//! Validates ping payloads against JSON Schemas that usually live on the
//! network.
//!
//! - [`cache`]: resolves schema locators, keeping remote schemas in an
//!   on-disk cache so repeated checks work offline.
//! - [`validate`]: compiles a schema with the `jsonschema` crate, resolving
//!   remote `$ref`s through the cache.
//! - [`ping`]: reads one ping, validates it, and writes JSON Lines.
//!
//! ## Crate Policy
//!
//! - Network access only through [`cache::SchemaFetcher`].
//! - A cache entry on disk is always complete.

pub mod cache;
pub mod ping;
pub mod validate;

pub use cache::{
    default_cache_dir, CacheConfig, FallbackPolicy, FetchError, HttpFetcher, Provenance, Resolved,
    SchemaCache, SchemaCacheEntry, SchemaFetcher, SchemaLocator, CACHE_DIR_ENV, DEFAULT_TIMEOUT,
};
pub use ping::{CheckError, CheckOutcome, CheckRecord, PingParseError, PingValidator, DEFAULT_SCHEMA_URL};
pub use validate::{compile, violations, Violation};
