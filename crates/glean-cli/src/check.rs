//! # `check` — Validate a Ping
//!
//! Reads one JSON ping from stdin and writes one JSON line per problem to
//! stdout:
//!
//! ```bash
//! glean_parser check < ping.json
//! glean_parser check -s schemas/glean.1.schema.json --stale-cache fail < ping.json
//! ```
//!
//! Exit status: 0 when the ping is valid, 1 when it is not or the schema
//! cannot be resolved, 2 for an unsupported schema locator.

use std::io::{Read, Write};

use anyhow::{Context, Result};
use clap::Args;
use glean_schema::{FallbackPolicy, PingValidator, SchemaCache, SchemaLocator, DEFAULT_SCHEMA_URL};

use crate::config::Settings;

/// Arguments of `check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Schema URL or local path.
    #[arg(short, long, value_name = "URL_OR_PATH", default_value = DEFAULT_SCHEMA_URL)]
    pub schema: String,

    /// Fetch the schema even if a cached copy exists.
    #[arg(long)]
    pub force_refresh: bool,

    /// What to do when the fetch fails but a cached copy exists.
    #[arg(long, value_name = "warn|fail", value_parser = parse_fallback)]
    pub stale_cache: Option<FallbackPolicy>,
}

fn parse_fallback(s: &str) -> Result<FallbackPolicy, String> {
    FallbackPolicy::parse(s)
        .ok_or_else(|| format!("expected one of: {}", FallbackPolicy::NAMES.join(", ")))
}

/// Execute `check` on stdin and stdout.
pub fn run_check(args: &CheckArgs, settings: &Settings) -> Result<u8> {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    check_stream(args, settings, stdin.lock(), stdout.lock())
}

/// Execute `check` on the given streams.
pub fn check_stream<R: Read, W: Write>(
    args: &CheckArgs,
    settings: &Settings,
    input: R,
    output: W,
) -> Result<u8> {
    let locator = match SchemaLocator::parse(&args.schema) {
        Ok(locator) => locator,
        Err(e) => {
            eprintln!("{e}");
            return Ok(2);
        }
    };
    let cache = SchemaCache::new(settings.cache_config(args.force_refresh, args.stale_cache));
    tracing::debug!(schema = %locator, cache_dir = %cache.config().cache_dir.display(), "checking ping");

    let outcome = PingValidator::new(cache)
        .validate(input, output, &locator)
        .with_context(|| format!("cannot check ping against {locator}"))?;
    Ok(outcome.exit_code())
}
