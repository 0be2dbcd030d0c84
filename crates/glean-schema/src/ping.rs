//! # Ping Validator
//!
//! Validates one JSON ping read from a stream against a schema resolved
//! through the [`SchemaCache`], and writes the outcome as JSON Lines:
//!
//! ```text
//! {"kind":"schema-validation","instance_path":"/seq","schema_path":"/properties/seq/type","message":"..."}
//! {"kind":"ping-parse","line":1,"column":5,"message":"..."}
//! ```
//!
//! An empty output means the ping is valid. Records appear in the order the
//! validator reports them, so the output is stable for a given ping and
//! schema.

use std::io::{self, Read, Write};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::{FetchError, SchemaCache, SchemaLocator};
use crate::validate::{compile, violations, Violation};

/// Schema used by `check` when none is given.
pub const DEFAULT_SCHEMA_URL: &str = "https://raw.githubusercontent.com/mozilla-services/mozilla-pipeline-schemas/master/schemas/glean/glean/glean.1.schema.json";

/// Why a check could not produce a verdict.
#[derive(Error, Debug)]
pub enum CheckError {
    /// The schema could not be resolved.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The schema is not JSON.
    #[error("schema {locator} is not valid JSON: {reason}")]
    SchemaParse {
        /// The schema locator.
        locator: String,
        /// Parser message.
        reason: String,
    },

    /// The schema is not a valid JSON Schema.
    #[error("schema {locator} cannot be compiled: {reason}")]
    SchemaCompile {
        /// The schema locator.
        locator: String,
        /// Compiler message.
        reason: String,
    },

    /// Reading the ping or writing the report failed.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// A ping that is not a single well-formed JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PingParseError {
    /// 1-based line of the error.
    pub line: usize,
    /// 1-based column of the error.
    pub column: usize,
    /// Parser message.
    pub message: String,
}

/// One line of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CheckRecord {
    /// The ping does not conform to the schema.
    SchemaValidation(Violation),
    /// The ping is not valid JSON.
    PingParse(PingParseError),
}

/// Outcome of one check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckOutcome {
    /// Records written to the output.
    pub records: Vec<CheckRecord>,
    /// Warnings raised while resolving the schema.
    pub warnings: Vec<String>,
}

impl CheckOutcome {
    /// True when no record was written.
    pub fn is_valid(&self) -> bool {
        self.records.is_empty()
    }

    /// Process exit status: 0 when valid, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        u8::from(!self.is_valid())
    }
}

/// Validates pings against a schema.
#[derive(Debug, Clone)]
pub struct PingValidator {
    cache: SchemaCache,
}

impl PingValidator {
    /// A validator resolving schemas through `cache`.
    pub fn new(cache: SchemaCache) -> Self {
        Self { cache }
    }

    /// Read one ping from `input`, validate it against `locator`, and write
    /// one JSON line per problem to `output`.
    ///
    /// The schema is resolved before the ping is parsed, so a schema that
    /// cannot be fetched is reported even for a malformed ping.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError`] if the schema cannot be resolved or compiled,
    /// or on I/O failure. Problems with the ping itself are records, not
    /// errors.
    pub fn validate<R: Read, W: Write>(
        &self,
        mut input: R,
        mut output: W,
        locator: &SchemaLocator,
    ) -> Result<CheckOutcome, CheckError> {
        let mut outcome = CheckOutcome::default();

        let resolved = self.cache.resolve(locator)?;
        if let Some(warning) = resolved.warning() {
            warn!(schema = %locator, "{warning}");
            outcome.warnings.push(warning);
        }
        let schema: Value =
            serde_json::from_str(&resolved.content).map_err(|e| CheckError::SchemaParse {
                locator: locator.to_string(),
                reason: e.to_string(),
            })?;
        let validator = compile(&schema, &self.cache).map_err(|reason| CheckError::SchemaCompile {
            locator: locator.to_string(),
            reason,
        })?;

        // Bytes, not a String: invalid UTF-8 is a malformed ping, not an I/O failure.
        let mut bytes = Vec::new();
        input.read_to_end(&mut bytes)?;

        outcome.records = match serde_json::from_slice::<Value>(&bytes) {
            Ok(ping) => violations(&validator, &ping)
                .into_iter()
                .map(CheckRecord::SchemaValidation)
                .collect(),
            Err(e) => vec![CheckRecord::PingParse(PingParseError {
                line: e.line(),
                column: e.column(),
                message: e.to_string(),
            })],
        };

        for record in &outcome.records {
            let line = serde_json::to_string(record).map_err(io::Error::other)?;
            writeln!(output, "{line}")?;
        }
        output.flush()?;

        if outcome.is_valid() {
            info!(schema = %locator, "ping is valid");
        } else {
            debug!(schema = %locator, errors = outcome.records.len(), "ping is invalid");
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use serde_json::json;
    use std::fs;

    fn setup(schema: &Value) -> (tempfile::TempDir, PingValidator, SchemaLocator) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        fs::write(&path, schema.to_string()).unwrap();
        let cache = SchemaCache::new(CacheConfig {
            cache_dir: dir.path().join("cache"),
            ..CacheConfig::default()
        });
        (dir, PingValidator::new(cache), SchemaLocator::Local(path))
    }

    fn run(validator: &PingValidator, locator: &SchemaLocator, ping: &str) -> (CheckOutcome, Vec<Value>) {
        let mut out = Vec::new();
        let outcome = validator.validate(ping.as_bytes(), &mut out, locator).unwrap();
        let lines = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        (outcome, lines)
    }

    #[test]
    fn valid_ping_writes_nothing() {
        let (_dir, validator, locator) = setup(&json!({ "required": ["ping_type"] }));
        let (outcome, lines) = run(&validator, &locator, r#"{"ping_type":"metrics"}"#);
        assert!(lines.is_empty());
        assert_eq!(outcome.exit_code(), 0);
    }

    #[test]
    fn violations_are_json_lines() {
        let (_dir, validator, locator) = setup(&json!({
            "type": "object",
            "required": ["ping_type"],
            "properties": { "seq": { "type": "integer" } }
        }));
        let (outcome, lines) = run(&validator, &locator, r#"{"seq":"x"}"#);
        assert_eq!(outcome.exit_code(), 1);
        assert_eq!(lines.len(), 2);
        for line in &lines {
            assert_eq!(line["kind"], "schema-validation");
            assert!(line["instance_path"].is_string());
            assert!(line["schema_path"].is_string());
            assert!(line["message"].is_string());
        }
    }

    #[test]
    fn malformed_ping_is_a_parse_record() {
        let (_dir, validator, locator) = setup(&json!({}));
        let (outcome, lines) = run(&validator, &locator, "{\n  \"a\": ,\n}");
        assert_eq!(outcome.exit_code(), 1);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["kind"], "ping-parse");
        assert_eq!(lines[0]["line"], 2);
        assert!(lines[0]["column"].as_u64().unwrap() > 0);
    }

    #[test]
    fn trailing_document_is_a_parse_record() {
        let (_dir, validator, locator) = setup(&json!({}));
        let (_, lines) = run(&validator, &locator, "{} {}");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["kind"], "ping-parse");
    }

    #[test]
    fn invalid_utf8_is_a_parse_record() {
        let (_dir, validator, locator) = setup(&json!({}));
        let mut out = Vec::new();
        let outcome = validator
            .validate(&b"{\"ping_type\": \"\xff\"}"[..], &mut out, &locator)
            .unwrap();
        assert_eq!(outcome.exit_code(), 1);
        let lines: Vec<Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["kind"], "ping-parse");
        assert_eq!(lines[0]["line"], 1);
    }

    #[test]
    fn empty_input_is_a_parse_record() {
        let (_dir, validator, locator) = setup(&json!({}));
        let (_, lines) = run(&validator, &locator, "");
        assert_eq!(lines[0]["kind"], "ping-parse");
    }

    #[test]
    fn schema_that_is_not_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        fs::write(&path, "not json").unwrap();
        let validator = PingValidator::new(SchemaCache::new(CacheConfig {
            cache_dir: dir.path().join("cache"),
            ..CacheConfig::default()
        }));
        let err = validator
            .validate("{}".as_bytes(), Vec::new(), &SchemaLocator::Local(path))
            .unwrap_err();
        assert!(matches!(err, CheckError::SchemaParse { .. }), "{err:?}");
    }

    #[test]
    fn default_schema_is_remote() {
        assert!(SchemaLocator::parse(DEFAULT_SCHEMA_URL).unwrap().is_remote());
    }
}
