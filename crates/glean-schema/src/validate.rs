//! # Schema Compilation
//!
//! Compiles a resolved schema with the `jsonschema` crate and turns its
//! errors into [`Violation`]s.
//!
//! Remote `$ref`s are resolved through the same [`SchemaCache`] as the root
//! schema, so a ping can be validated offline once every schema it touches
//! has been cached. The draft is taken from the schema's `$schema` keyword.

use std::fmt;

use jsonschema::{Retrieve, Uri, Validator};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{SchemaCache, SchemaLocator};

/// Resolves `$ref` URIs through the schema cache.
struct CacheRetriever {
    cache: SchemaCache,
}

impl Retrieve for CacheRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let locator = SchemaLocator::parse(uri.as_str())?;
        let resolved = self.cache.resolve(&locator)?;
        if let Some(warning) = resolved.warning() {
            warn!(uri = uri.as_str(), "{warning}");
        }
        debug!(uri = uri.as_str(), "resolved $ref");
        Ok(serde_json::from_str(&resolved.content)?)
    }
}

/// A single validation violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// JSON Pointer to the violating value in the instance.
    pub instance_path: String,
    /// JSON Pointer to the schema keyword that failed.
    pub schema_path: String,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.instance_path, self.message)
        }
    }
}

/// Compile `schema`, resolving remote references through `cache`.
///
/// # Errors
///
/// Returns the compiler's message if the schema is invalid or a
/// reference cannot be resolved.
pub fn compile(schema: &Value, cache: &SchemaCache) -> Result<Validator, String> {
    let mut opts = jsonschema::options();
    opts.with_retriever(CacheRetriever {
        cache: cache.clone(),
    });
    opts.build(schema).map_err(|e| e.to_string())
}

/// Every violation of `instance`, in the validator's order.
pub fn violations(validator: &Validator, instance: &Value) -> Vec<Violation> {
    validator
        .iter_errors(instance)
        .map(|e| Violation {
            instance_path: e.instance_path.to_string(),
            schema_path: e.schema_path.to_string(),
            message: e.to_string(),
        })
        .collect()
}
