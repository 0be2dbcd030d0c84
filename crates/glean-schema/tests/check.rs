//! End-to-end checks of the ping validator against cached remote schemas.
//!
//! Network access is replaced by an in-memory fetcher that can be switched
//! offline, so the stale-cache fallback is exercised the way a user would
//! hit it: validate once online, then again with the network gone.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use glean_schema::{
    CacheConfig, CheckError, FallbackPolicy, FetchError, PingValidator, SchemaCache, SchemaFetcher,
    SchemaLocator,
};
use serde_json::Value;
use url::Url;

const SCHEMA_URL: &str = "https://schemas.example/glean/glean.1.schema.json";
const SCHEMA: &str = r#"{
  "$schema": "http://json-schema.org/draft-07/schema#",
  "type": "object",
  "required": ["ping_type"],
  "properties": { "ping_type": { "type": "string" } }
}"#;

struct Network {
    online: AtomicBool,
}

impl SchemaFetcher for Network {
    fn fetch(&self, url: &Url, timeout: Duration) -> Result<Vec<u8>, FetchError> {
        if !self.online.load(Ordering::SeqCst) {
            return Err(FetchError::Timeout {
                url: url.to_string(),
                timeout,
            });
        }
        if url.as_str() == SCHEMA_URL {
            Ok(SCHEMA.as_bytes().to_vec())
        } else {
            Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }
}

fn validator(dir: &std::path::Path, network: &Arc<Network>, fallback: FallbackPolicy) -> PingValidator {
    let config = CacheConfig {
        cache_dir: dir.to_path_buf(),
        timeout: Duration::from_secs(1),
        max_age: None,
        force_refresh: true,
        fallback,
    };
    PingValidator::new(SchemaCache::with_fetcher(config, network.clone()))
}

fn check(validator: &PingValidator, ping: &str) -> Result<(u8, Vec<Value>, Vec<String>), CheckError> {
    let mut out = Vec::new();
    let locator = SchemaLocator::parse(SCHEMA_URL).unwrap();
    let outcome = validator.validate(ping.as_bytes(), &mut out, &locator)?;
    let lines = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    Ok((outcome.exit_code(), lines, outcome.warnings))
}

// ---------------------------------------------------------------------------
// Scenario: empty ping against a schema requiring ping_type
// ---------------------------------------------------------------------------

#[test]
fn empty_object_reports_missing_ping_type() {
    let dir = tempfile::tempdir().unwrap();
    let network = Arc::new(Network {
        online: AtomicBool::new(true),
    });
    let (code, lines, warnings) = check(&validator(dir.path(), &network, FallbackPolicy::Warn), "{}").unwrap();

    assert_eq!(code, 1);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["kind"], "schema-validation");
    assert!(lines[0]["message"].as_str().unwrap().contains("ping_type"));
    assert!(warnings.is_empty());
}

#[test]
fn conforming_ping_is_silent() {
    let dir = tempfile::tempdir().unwrap();
    let network = Arc::new(Network {
        online: AtomicBool::new(true),
    });
    let (code, lines, _) = check(
        &validator(dir.path(), &network, FallbackPolicy::Warn),
        r#"{"ping_type":"baseline"}"#,
    )
    .unwrap();
    assert_eq!(code, 0);
    assert!(lines.is_empty());
}

// ---------------------------------------------------------------------------
// Stale cache fallback
// ---------------------------------------------------------------------------

#[test]
fn offline_with_cache_and_warn_policy_still_validates() {
    let dir = tempfile::tempdir().unwrap();
    let network = Arc::new(Network {
        online: AtomicBool::new(true),
    });
    let validator = validator(dir.path(), &network, FallbackPolicy::Warn);
    check(&validator, "{}").unwrap();

    network.online.store(false, Ordering::SeqCst);
    let (code, lines, warnings) = check(&validator, "{}").unwrap();

    assert_eq!(code, 1);
    assert_eq!(lines.len(), 1);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("using cached schema"), "{warnings:?}");
}

#[test]
fn offline_with_cache_and_fail_policy_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let network = Arc::new(Network {
        online: AtomicBool::new(true),
    });
    check(&validator(dir.path(), &network, FallbackPolicy::Warn), "{}").unwrap();

    network.online.store(false, Ordering::SeqCst);
    let err = check(&validator(dir.path(), &network, FallbackPolicy::Fail), "{}").unwrap_err();
    assert!(
        matches!(err, CheckError::Fetch(FetchError::StaleRefused { .. })),
        "{err:?}"
    );
}

#[test]
fn offline_without_cache_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let network = Arc::new(Network {
        online: AtomicBool::new(false),
    });
    let err = check(&validator(dir.path(), &network, FallbackPolicy::Warn), "{}").unwrap_err();
    assert!(matches!(err, CheckError::Fetch(FetchError::Timeout { .. })), "{err:?}");
}
