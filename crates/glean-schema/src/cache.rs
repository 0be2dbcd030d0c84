//! # Schema Cache
//!
//! Resolves a schema locator to schema text.
//!
//! - A local path is read directly and never cached.
//! - A remote URL is served from `<cache_dir>/<sha256(url)>.json` unless a
//!   refresh is forced or the entry is older than `max_age`. Otherwise the
//!   schema is fetched with a bounded timeout and the entry replaced.
//!
//! ## Entry Replacement
//!
//! Entries are written to a temporary file in the cache directory and then
//! renamed over the old entry. A reader in another process sees either the
//! previous entry or the new one, never a partial write.
//!
//! ## Fetch Failures
//!
//! Without an entry a failed fetch is an error. With an entry the
//! [`FallbackPolicy`] decides: `warn` serves the stale copy and reports the
//! failure in [`Resolved::warning`]; `fail` returns
//! [`FetchError::StaleRefused`].

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use glean_core::{sha256_hex, ConfigurationError, Timestamp};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

/// Environment variable overriding the default cache directory.
pub const CACHE_DIR_ENV: &str = "GLEAN_PARSER_CACHE_DIR";

/// Default fetch timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where a schema comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaLocator {
    /// A file on disk.
    Local(PathBuf),
    /// An `http` or `https` URL.
    Remote(Url),
}

impl SchemaLocator {
    /// Classify `locator`.
    ///
    /// `http`/`https` URLs are remote; `file://` URLs and strings without a
    /// scheme are local paths. Single-letter schemes are taken to be drive
    /// letters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::BadSchemaLocator`] for any other scheme
    /// or a malformed URL.
    pub fn parse(locator: &str) -> Result<Self, ConfigurationError> {
        let bad = |reason: String| ConfigurationError::BadSchemaLocator {
            locator: locator.to_string(),
            reason,
        };
        if locator.trim().is_empty() {
            return Err(bad("locator is empty".into()));
        }
        match Url::parse(locator) {
            Ok(url) => match url.scheme() {
                "http" | "https" => Ok(Self::Remote(url)),
                "file" => url
                    .to_file_path()
                    .map(Self::Local)
                    .map_err(|()| bad("file URL does not name a local path".into())),
                scheme if scheme.len() == 1 => Ok(Self::Local(PathBuf::from(locator))),
                scheme => Err(bad(format!("scheme '{scheme}' is not supported"))),
            },
            Err(url::ParseError::RelativeUrlWithoutBase) => Ok(Self::Local(PathBuf::from(locator))),
            Err(e) => Err(bad(e.to_string())),
        }
    }

    /// True for http(s) locators.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl fmt::Display for SchemaLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => f.write_str(url.as_str()),
        }
    }
}

/// What to do when a fetch fails but a stale entry exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Serve the stale entry and report a warning.
    #[default]
    Warn,
    /// Fail the resolution.
    Fail,
}

impl FallbackPolicy {
    /// Accepted spellings.
    pub const NAMES: &'static [&'static str] = &["warn", "fail"];

    /// Parse `warn` or `fail`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "warn" => Some(Self::Warn),
            "fail" => Some(Self::Fail),
            _ => None,
        }
    }

    /// The policy's name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warn => "warn",
            Self::Fail => "fail",
        }
    }
}

impl fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cache settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Directory holding the entries. Created on first write.
    pub cache_dir: PathBuf,
    /// Upper bound on one fetch.
    pub timeout: Duration,
    /// Entries older than this are refetched. `None` keeps entries forever.
    pub max_age: Option<Duration>,
    /// Ignore existing entries and fetch.
    pub force_refresh: bool,
    /// Stale-entry behavior on fetch failure.
    pub fallback: FallbackPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            timeout: DEFAULT_TIMEOUT,
            max_age: None,
            force_refresh: false,
            fallback: FallbackPolicy::Warn,
        }
    }
}

/// `$GLEAN_PARSER_CACHE_DIR`, else the platform cache directory joined with
/// `glean_parser`, else the same under the temp directory.
pub fn default_cache_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(CACHE_DIR_ENV).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("glean_parser")
}

/// Why a schema could not be resolved.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The fetch did not complete within the timeout.
    #[error("fetching {url} timed out after {}s", .timeout.as_secs())]
    Timeout {
        /// The URL being fetched.
        url: String,
        /// The configured timeout.
        timeout: Duration,
    },

    /// The server answered with a non-success status.
    #[error("fetching {url} returned HTTP {status}")]
    Status {
        /// The URL being fetched.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// Connection, TLS or body errors.
    #[error("fetching {url} failed: {reason}")]
    Transport {
        /// The URL being fetched.
        url: String,
        /// Client error message.
        reason: String,
    },

    /// A local schema file could not be read.
    #[error("cannot read schema {}: {source}", .path.display())]
    Io {
        /// The schema file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A stale entry exists but the fallback policy is `fail`.
    #[error("{source} (a cached copy from {fetched_at} exists but the stale-cache policy is 'fail')")]
    StaleRefused {
        /// When the stale entry was fetched.
        fetched_at: Timestamp,
        /// The fetch failure.
        source: Box<FetchError>,
    },
}

/// Network access, behind a trait so tests can run offline.
pub trait SchemaFetcher: Send + Sync {
    /// Fetch `url` within `timeout`.
    fn fetch(&self, url: &Url, timeout: Duration) -> Result<Vec<u8>, FetchError>;
}

/// Blocking HTTP fetcher.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpFetcher;

impl SchemaFetcher for HttpFetcher {
    fn fetch(&self, url: &Url, timeout: Duration) -> Result<Vec<u8>, FetchError> {
        let transport = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                    timeout,
                }
            } else {
                FetchError::Transport {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("glean_parser/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(transport)?;

        let resp = client
            .get(url.clone())
            .header("Accept", "application/schema+json, application/json;q=0.9, */*;q=0.8")
            .send()
            .map_err(transport)?;

        if !resp.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }

        resp.bytes().map(|b| b.to_vec()).map_err(transport)
    }
}

/// On-disk cache entry. Written whole or not at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaCacheEntry {
    /// The URL the content came from.
    pub locator: String,
    /// When it was fetched.
    pub fetched_at: Timestamp,
    /// The schema text.
    pub content: String,
}

/// How a resolution was satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    /// Read from a local path.
    Local,
    /// Served from a current cache entry.
    Cached {
        /// When the entry was fetched.
        fetched_at: Timestamp,
    },
    /// Fetched now.
    Fetched,
    /// Served from a stale entry after a failed fetch.
    Stale {
        /// When the entry was fetched.
        fetched_at: Timestamp,
        /// The fetch failure.
        reason: String,
    },
}

/// Resolved schema text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// The schema text.
    pub content: String,
    /// Where it came from.
    pub provenance: Provenance,
}

impl Resolved {
    /// The warning to show the user, for stale fallbacks.
    pub fn warning(&self) -> Option<String> {
        match &self.provenance {
            Provenance::Stale { fetched_at, reason } => Some(format!(
                "{reason}; using cached schema fetched at {fetched_at}"
            )),
            _ => None,
        }
    }
}

/// Schema cache. Cheap to clone; clones share the fetcher.
#[derive(Clone)]
pub struct SchemaCache {
    config: CacheConfig,
    fetcher: Arc<dyn SchemaFetcher>,
}

impl fmt::Debug for SchemaCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaCache")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SchemaCache {
    /// A cache fetching over HTTP.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_fetcher(config, Arc::new(HttpFetcher))
    }

    /// A cache with a custom fetcher.
    pub fn with_fetcher(config: CacheConfig, fetcher: Arc<dyn SchemaFetcher>) -> Self {
        Self { config, fetcher }
    }

    /// The settings in use.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Path of the entry for `url`.
    pub fn entry_path(&self, url: &Url) -> PathBuf {
        self.config
            .cache_dir
            .join(format!("{}.json", sha256_hex(url.as_str().as_bytes())))
    }

    /// Resolve `locator` to schema text.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if a local file cannot be read, or a remote
    /// fetch fails and no usable entry exists.
    pub fn resolve(&self, locator: &SchemaLocator) -> Result<Resolved, FetchError> {
        match locator {
            SchemaLocator::Local(path) => {
                let content = fs::read_to_string(path).map_err(|source| FetchError::Io {
                    path: path.clone(),
                    source,
                })?;
                debug!(path = %path.display(), "read local schema");
                Ok(Resolved {
                    content,
                    provenance: Provenance::Local,
                })
            }
            SchemaLocator::Remote(url) => self.resolve_remote(url),
        }
    }

    fn resolve_remote(&self, url: &Url) -> Result<Resolved, FetchError> {
        let path = self.entry_path(url);
        let cached = read_entry(&path, url);

        if let Some(entry) = &cached {
            if !self.config.force_refresh && self.is_current(entry) {
                debug!(%url, fetched_at = %entry.fetched_at, "schema cache hit");
                return Ok(Resolved {
                    content: entry.content.clone(),
                    provenance: Provenance::Cached {
                        fetched_at: entry.fetched_at,
                    },
                });
            }
        }

        let error = match self.fetch_text(url) {
            Ok(content) => {
                let entry = SchemaCacheEntry {
                    locator: url.to_string(),
                    fetched_at: Timestamp::now(),
                    content,
                };
                if let Err(e) = write_entry(&self.config.cache_dir, &path, &entry) {
                    warn!(path = %path.display(), error = %e, "could not update schema cache");
                }
                info!(%url, "fetched schema");
                return Ok(Resolved {
                    content: entry.content,
                    provenance: Provenance::Fetched,
                });
            }
            Err(e) => e,
        };

        let Some(entry) = cached else {
            return Err(error);
        };
        match self.config.fallback {
            FallbackPolicy::Warn => {
                warn!(%url, fetched_at = %entry.fetched_at, error = %error, "using stale cached schema");
                Ok(Resolved {
                    content: entry.content,
                    provenance: Provenance::Stale {
                        fetched_at: entry.fetched_at,
                        reason: error.to_string(),
                    },
                })
            }
            FallbackPolicy::Fail => Err(FetchError::StaleRefused {
                fetched_at: entry.fetched_at,
                source: Box::new(error),
            }),
        }
    }

    fn fetch_text(&self, url: &Url) -> Result<String, FetchError> {
        let bytes = self.fetcher.fetch(url, self.config.timeout)?;
        String::from_utf8(bytes).map_err(|e| FetchError::Transport {
            url: url.to_string(),
            reason: format!("response is not UTF-8: {e}"),
        })
    }

    fn is_current(&self, entry: &SchemaCacheEntry) -> bool {
        match self.config.max_age {
            None => true,
            Some(max_age) => {
                let age = entry.fetched_at.seconds_until(&Timestamp::now());
                u64::try_from(age).map_or(true, |age| age <= max_age.as_secs())
            }
        }
    }
}

/// Read the entry at `path` if it exists, parses, and belongs to `url`.
fn read_entry(path: &Path, url: &Url) -> Option<SchemaCacheEntry> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read schema cache entry");
            return None;
        }
    };
    match serde_json::from_str::<SchemaCacheEntry>(&text) {
        Ok(entry) if entry.locator == url.as_str() => Some(entry),
        Ok(entry) => {
            warn!(path = %path.display(), locator = %entry.locator, "schema cache entry belongs to another locator");
            None
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring corrupt schema cache entry");
            None
        }
    }
}

/// Replace the entry at `path` through a temp file in `dir` and a rename.
fn write_entry(dir: &Path, path: &Path, entry: &SchemaCacheEntry) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    let json = serde_json::to_vec_pretty(entry).map_err(io::Error::other)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&json)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    debug!(path = %path.display(), "schema cache entry replaced");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    const URL: &str = "https://example.com/schemas/glean.1.schema.json";

    /// Serves queued responses and records the URLs requested.
    #[derive(Default)]
    struct ScriptedFetcher {
        responses: Mutex<Vec<Result<Vec<u8>, FetchError>>>,
        requests: Mutex<Vec<String>>,
    }

    impl ScriptedFetcher {
        fn replying(responses: Vec<Result<Vec<u8>, FetchError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    impl SchemaFetcher for ScriptedFetcher {
        fn fetch(&self, url: &Url, _timeout: Duration) -> Result<Vec<u8>, FetchError> {
            self.requests.lock().unwrap().push(url.to_string());
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Err(FetchError::Transport {
                    url: url.to_string(),
                    reason: "no scripted response".into(),
                });
            }
            responses.remove(0)
        }
    }

    fn offline(url: &str) -> FetchError {
        FetchError::Timeout {
            url: url.into(),
            timeout: Duration::from_secs(1),
        }
    }

    fn config(dir: &Path) -> CacheConfig {
        CacheConfig {
            cache_dir: dir.join("cache"),
            timeout: Duration::from_secs(1),
            max_age: None,
            force_refresh: false,
            fallback: FallbackPolicy::Warn,
        }
    }

    fn remote() -> SchemaLocator {
        SchemaLocator::parse(URL).unwrap()
    }

    #[test]
    fn classifies_locators() {
        assert!(SchemaLocator::parse("https://a.example/s.json").unwrap().is_remote());
        assert!(SchemaLocator::parse("http://a.example/s.json").unwrap().is_remote());
        assert_eq!(
            SchemaLocator::parse("schemas/glean.json").unwrap(),
            SchemaLocator::Local(PathBuf::from("schemas/glean.json"))
        );
        assert_eq!(
            SchemaLocator::parse("/tmp/s.json").unwrap(),
            SchemaLocator::Local(PathBuf::from("/tmp/s.json"))
        );
        assert_eq!(
            SchemaLocator::parse("file:///tmp/s.json").unwrap(),
            SchemaLocator::Local(PathBuf::from("/tmp/s.json"))
        );
        assert!(matches!(
            SchemaLocator::parse("ftp://a.example/s.json"),
            Err(ConfigurationError::BadSchemaLocator { .. })
        ));
        assert!(SchemaLocator::parse("").is_err());
    }

    #[test]
    fn fallback_policy_names() {
        for name in FallbackPolicy::NAMES {
            assert_eq!(FallbackPolicy::parse(name).unwrap().as_str(), *name);
        }
        assert_eq!(FallbackPolicy::parse("ignore"), None);
        assert_eq!(FallbackPolicy::default(), FallbackPolicy::Warn);
    }

    #[test]
    fn local_schema_is_read_directly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        fs::write(&path, "{}").unwrap();
        let fetcher = ScriptedFetcher::replying(vec![]);
        let cache = SchemaCache::with_fetcher(config(dir.path()), fetcher.clone());

        let resolved = cache.resolve(&SchemaLocator::Local(path)).unwrap();
        assert_eq!(resolved.content, "{}");
        assert_eq!(resolved.provenance, Provenance::Local);
        assert_eq!(fetcher.request_count(), 0);
        assert!(!dir.path().join("cache").exists());
    }

    #[test]
    fn missing_local_schema_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SchemaCache::with_fetcher(config(dir.path()), ScriptedFetcher::replying(vec![]));
        let err = cache
            .resolve(&SchemaLocator::Local(dir.path().join("nope.json")))
            .unwrap_err();
        assert!(matches!(err, FetchError::Io { .. }));
    }

    #[test]
    fn first_fetch_populates_cache_and_second_is_served_from_it() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ScriptedFetcher::replying(vec![Ok(br#"{"type":"object"}"#.to_vec())]);
        let cache = SchemaCache::with_fetcher(config(dir.path()), fetcher.clone());

        let first = cache.resolve(&remote()).unwrap();
        assert_eq!(first.provenance, Provenance::Fetched);

        let second = cache.resolve(&remote()).unwrap();
        assert!(matches!(second.provenance, Provenance::Cached { .. }));
        assert_eq!(second.content, first.content);
        assert_eq!(fetcher.request_count(), 1);

        let url = Url::parse(URL).unwrap();
        let stored: SchemaCacheEntry =
            serde_json::from_str(&fs::read_to_string(cache.entry_path(&url)).unwrap()).unwrap();
        assert_eq!(stored.locator, URL);
        assert_eq!(stored.content, r#"{"type":"object"}"#);
    }

    #[test]
    fn entry_write_leaves_no_temporary_files() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ScriptedFetcher::replying(vec![Ok(b"{}".to_vec()), Ok(b"{\"v\":2}".to_vec())]);
        let mut cfg = config(dir.path());
        cfg.force_refresh = true;
        let cache = SchemaCache::with_fetcher(cfg, fetcher);

        cache.resolve(&remote()).unwrap();
        cache.resolve(&remote()).unwrap();

        let files: Vec<_> = fs::read_dir(dir.path().join("cache"))
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(files, vec![cache.entry_path(&Url::parse(URL).unwrap())]);
        let stored = read_entry(&files[0], &Url::parse(URL).unwrap()).unwrap();
        assert_eq!(stored.content, "{\"v\":2}");
    }

    #[test]
    fn fetch_failure_without_entry_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SchemaCache::with_fetcher(config(dir.path()), ScriptedFetcher::replying(vec![Err(offline(URL))]));
        let err = cache.resolve(&remote()).unwrap_err();
        assert!(matches!(err, FetchError::Timeout { .. }), "{err:?}");
    }

    #[test]
    fn stale_entry_with_warn_policy_is_served_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ScriptedFetcher::replying(vec![Ok(b"{}".to_vec()), Err(offline(URL))]);
        let mut cfg = config(dir.path());
        cfg.force_refresh = true;
        let cache = SchemaCache::with_fetcher(cfg, fetcher);

        cache.resolve(&remote()).unwrap();
        let resolved = cache.resolve(&remote()).unwrap();

        assert_eq!(resolved.content, "{}");
        assert!(matches!(resolved.provenance, Provenance::Stale { .. }));
        let warning = resolved.warning().unwrap();
        assert!(warning.contains("timed out"), "{warning}");
    }

    #[test]
    fn stale_entry_with_fail_policy_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ScriptedFetcher::replying(vec![Ok(b"{}".to_vec()), Err(offline(URL))]);
        let mut cfg = config(dir.path());
        cfg.force_refresh = true;
        cfg.fallback = FallbackPolicy::Fail;
        let cache = SchemaCache::with_fetcher(cfg, fetcher);

        cache.resolve(&remote()).unwrap();
        let err = cache.resolve(&remote()).unwrap_err();
        match err {
            FetchError::StaleRefused { source, .. } => {
                assert!(matches!(*source, FetchError::Timeout { .. }))
            }
            other => panic!("expected StaleRefused, got {other:?}"),
        }
    }

    #[test]
    fn expired_entry_is_refetched() {
        let dir = tempfile::tempdir().unwrap();
        let url = Url::parse(URL).unwrap();
        let mut cfg = config(dir.path());
        cfg.max_age = Some(Duration::from_secs(3600));
        let fetcher = ScriptedFetcher::replying(vec![Ok(b"{\"new\":true}".to_vec())]);
        let cache = SchemaCache::with_fetcher(cfg, fetcher.clone());

        let old = SchemaCacheEntry {
            locator: URL.into(),
            fetched_at: Timestamp::parse("2020-01-01T00:00:00Z").unwrap(),
            content: "{\"old\":true}".into(),
        };
        write_entry(&dir.path().join("cache"), &cache.entry_path(&url), &old).unwrap();

        let resolved = cache.resolve(&remote()).unwrap();
        assert_eq!(resolved.provenance, Provenance::Fetched);
        assert_eq!(resolved.content, "{\"new\":true}");
        assert_eq!(fetcher.request_count(), 1);
    }

    #[test]
    fn corrupt_entry_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ScriptedFetcher::replying(vec![Ok(b"{}".to_vec())]);
        let cache = SchemaCache::with_fetcher(config(dir.path()), fetcher.clone());
        let path = cache.entry_path(&Url::parse(URL).unwrap());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ truncated").unwrap();

        let resolved = cache.resolve(&remote()).unwrap();
        assert_eq!(resolved.provenance, Provenance::Fetched);
        assert_eq!(fetcher.request_count(), 1);
    }
}
