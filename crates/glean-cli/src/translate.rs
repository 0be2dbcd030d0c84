//! # `translate` — Definitions to Target-Language Code
//!
//! ```bash
//! glean_parser translate metrics.yaml pings.yaml -o generated -f kotlin \
//!     -s namespace=org.example.GleanMetrics
//! ```
//!
//! Diagnostics go to stderr, one per line. Exit status: 0 on success, 1 for
//! parse, validation or output errors, 2 for configuration errors.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use glean_core::ConfigurationError;
use glean_translate::{translate, EmitterRegistry, TranslateOptions};

use crate::config::Settings;

/// Arguments of `translate`.
#[derive(Args, Debug)]
pub struct TranslateArgs {
    /// Metric and ping definition files, in order.
    #[arg(required = true, value_name = "INPUT")]
    pub inputs: Vec<PathBuf>,

    /// Output directory.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Output format (kotlin, markdown, swift).
    #[arg(short, long)]
    pub format: String,

    /// Emitter option; repeatable.
    #[arg(short = 's', long = "option", value_name = "KEY=VALUE", value_parser = parse_option)]
    pub options: Vec<(String, String)>,

    /// Accept reserved category and ping names.
    #[arg(long)]
    pub allow_reserved: bool,
}

/// Split `key=value`.
pub fn parse_option(s: &str) -> Result<(String, String), ConfigurationError> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(ConfigurationError::BadOption(s.to_string())),
    }
}

/// Execute `translate`.
pub fn run_translate(args: &TranslateArgs, settings: &Settings) -> Result<u8> {
    let options = TranslateOptions {
        emitter_options: settings.emitter_options(&args.format, &args.options),
        allow_reserved: args.allow_reserved || settings.allow_reserved,
        ..TranslateOptions::default()
    };

    match translate(
        &EmitterRegistry::with_defaults(),
        &args.inputs,
        &args.format,
        &args.output,
        &options,
    ) {
        Ok(report) => {
            tracing::info!(
                written = report.written.len(),
                unchanged = report.unchanged.len(),
                removed = report.removed.len(),
                warnings = report.warnings.len(),
                "translated {} file(s) to {}",
                args.inputs.len(),
                args.format,
            );
            Ok(0)
        }
        Err(e) => {
            for line in e.diagnostics() {
                eprintln!("{line}");
            }
            Ok(e.exit_code())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_syntax() {
        assert_eq!(
            parse_option("namespace=org.example").unwrap(),
            ("namespace".to_string(), "org.example".to_string())
        );
        assert_eq!(parse_option("empty=").unwrap(), ("empty".to_string(), String::new()));
        assert_eq!(parse_option("a=b=c").unwrap().1, "b=c");
        assert!(parse_option("novalue").is_err());
        assert!(parse_option("=value").is_err());
    }
}
