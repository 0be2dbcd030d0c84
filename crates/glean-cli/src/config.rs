//! # Configuration File
//!
//! Optional YAML file given with `--config`. Every key is optional; command
//! line flags override the file.
//!
//! ```yaml
//! cache_dir: /var/cache/glean_parser
//! fetch_timeout_secs: 10
//! cache_max_age_secs: 86400
//! stale_cache: fail
//! allow_reserved: false
//! emitter_options:
//!   kotlin:
//!     namespace: org.example.GleanMetrics
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use glean_schema::{default_cache_dir, CacheConfig, FallbackPolicy, DEFAULT_TIMEOUT};
use glean_translate::EmitterOptions;
use serde::Deserialize;

/// Settings read from the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Schema cache directory.
    pub cache_dir: Option<PathBuf>,
    /// Schema fetch timeout.
    pub fetch_timeout_secs: Option<u64>,
    /// Refetch cached schemas older than this.
    pub cache_max_age_secs: Option<u64>,
    /// Stale-cache policy when a fetch fails.
    pub stale_cache: Option<FallbackPolicy>,
    /// Accept reserved category and ping names.
    pub allow_reserved: bool,
    /// Per-format emitter options.
    pub emitter_options: BTreeMap<String, EmitterOptions>,
}

impl Settings {
    /// Read `path`, or return the defaults when no file was given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Parse settings from YAML text. An empty document yields the defaults.
    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Emitter options for `format` from the file, overridden by `overrides`.
    pub fn emitter_options(&self, format: &str, overrides: &[(String, String)]) -> EmitterOptions {
        let mut options = self.emitter_options.get(format).cloned().unwrap_or_default();
        options.extend(overrides.iter().cloned());
        options
    }

    /// Cache settings, with `check`'s flags applied.
    pub fn cache_config(&self, force_refresh: bool, stale_cache: Option<FallbackPolicy>) -> CacheConfig {
        CacheConfig {
            cache_dir: self.cache_dir.clone().unwrap_or_else(default_cache_dir),
            timeout: self
                .fetch_timeout_secs
                .map_or(DEFAULT_TIMEOUT, Duration::from_secs),
            max_age: self.cache_max_age_secs.map(Duration::from_secs),
            force_refresh,
            fallback: stale_cache.or(self.stale_cache).unwrap_or_default(),
        }
    }
}
