//! # glean_parser entry point
//!
//! Parses arguments, loads the configuration file, sets up logging on
//! stderr, and dispatches to the subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use glean_cli::check::{run_check, CheckArgs};
use glean_cli::config::Settings;
use glean_cli::glinter::{run_glinter, GlinterArgs};
use glean_cli::translate::{run_translate, TranslateArgs};

/// Translate Glean metric and ping definitions into code, lint them, and
/// validate pings against the pipeline schema.
#[derive(Parser, Debug)]
#[command(name = "glean_parser", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate target-language code from metric and ping definitions.
    Translate(TranslateArgs),

    /// Validate a JSON ping read from stdin against a JSON Schema.
    Check(CheckArgs),

    /// Report lint warnings for metric and ping definitions.
    Glinter(GlinterArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG applies only when no -v was given.
    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("glean_parser v{} starting", env!("CARGO_PKG_VERSION"));

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(2);
        }
    };

    let result = match cli.command {
        Commands::Translate(args) => run_translate(&args, &settings),
        Commands::Check(args) => run_check(&args, &settings),
        Commands::Glinter(args) => run_glinter(&args, &settings),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glean_schema::{FallbackPolicy, DEFAULT_SCHEMA_URL};

    #[test]
    fn cli_parse_translate() {
        let cli = Cli::try_parse_from([
            "glean_parser",
            "translate",
            "metrics.yaml",
            "pings.yaml",
            "-o",
            "out",
            "-f",
            "kotlin",
            "-s",
            "namespace=org.example",
            "--option",
            "glean_namespace=mozilla",
        ])
        .unwrap();
        match cli.command {
            Commands::Translate(args) => {
                assert_eq!(args.inputs, vec![PathBuf::from("metrics.yaml"), PathBuf::from("pings.yaml")]);
                assert_eq!(args.output, PathBuf::from("out"));
                assert_eq!(args.format, "kotlin");
                assert_eq!(args.options.len(), 2);
                assert_eq!(args.options[0], ("namespace".to_string(), "org.example".to_string()));
                assert!(!args.allow_reserved);
            }
            other => panic!("expected translate, got {other:?}"),
        }
    }

    #[test]
    fn cli_translate_requires_inputs_output_and_format() {
        assert!(Cli::try_parse_from(["glean_parser", "translate", "-o", "out", "-f", "kotlin"]).is_err());
        assert!(Cli::try_parse_from(["glean_parser", "translate", "m.yaml", "-f", "kotlin"]).is_err());
        assert!(Cli::try_parse_from(["glean_parser", "translate", "m.yaml", "-o", "out"]).is_err());
    }

    #[test]
    fn cli_translate_rejects_malformed_option() {
        assert!(Cli::try_parse_from([
            "glean_parser", "translate", "m.yaml", "-o", "out", "-f", "kotlin", "-s", "novalue",
        ])
        .is_err());
    }

    #[test]
    fn cli_parse_check_defaults() {
        let cli = Cli::try_parse_from(["glean_parser", "check"]).unwrap();
        match cli.command {
            Commands::Check(args) => {
                assert_eq!(args.schema, DEFAULT_SCHEMA_URL);
                assert!(!args.force_refresh);
                assert_eq!(args.stale_cache, None);
            }
            other => panic!("expected check, got {other:?}"),
        }
    }

    #[test]
    fn cli_parse_check_flags() {
        let cli = Cli::try_parse_from([
            "glean_parser",
            "check",
            "-s",
            "schema.json",
            "--force-refresh",
            "--stale-cache",
            "fail",
        ])
        .unwrap();
        match cli.command {
            Commands::Check(args) => {
                assert_eq!(args.schema, "schema.json");
                assert!(args.force_refresh);
                assert_eq!(args.stale_cache, Some(FallbackPolicy::Fail));
            }
            other => panic!("expected check, got {other:?}"),
        }
        assert!(Cli::try_parse_from(["glean_parser", "check", "--stale-cache", "ignore"]).is_err());
    }

    #[test]
    fn cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "glean_parser",
            "glinter",
            "metrics.yaml",
            "-vv",
            "--config",
            "glean.yaml",
            "--allow-reserved",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("glean.yaml")));
        match cli.command {
            Commands::Glinter(args) => assert!(args.allow_reserved),
            other => panic!("expected glinter, got {other:?}"),
        }
    }
}
