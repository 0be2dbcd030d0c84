//! # `glinter` — Lint Definitions
//!
//! Loads and validates the inputs like `translate`, then prints one line per
//! lint warning to stdout. Exit status is 1 if anything was printed.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use glean_core::Timestamp;
use glean_parser::{lint_model, load_documents, ModelBuilder, Validator, ValidatorOptions};

use crate::config::Settings;

/// Arguments of `glinter`.
#[derive(Args, Debug)]
pub struct GlinterArgs {
    /// Metric and ping definition files.
    #[arg(required = true, value_name = "INPUT")]
    pub inputs: Vec<PathBuf>,

    /// Accept reserved category and ping names.
    #[arg(long)]
    pub allow_reserved: bool,
}

/// Execute `glinter`, printing to stdout.
pub fn run_glinter(args: &GlinterArgs, settings: &Settings) -> Result<u8> {
    let stdout = std::io::stdout();
    lint_files(args, settings, stdout.lock())
}

/// Execute `glinter`, printing lint warnings to `out`.
pub fn lint_files<W: Write>(args: &GlinterArgs, settings: &Settings, mut out: W) -> Result<u8> {
    let set = match load_documents(&args.inputs) {
        Ok(set) => set,
        Err(errors) => {
            for e in errors {
                eprintln!("{e}");
            }
            return Ok(1);
        }
    };
    let options = ValidatorOptions {
        allow_reserved: args.allow_reserved || settings.allow_reserved,
    };
    if let Err(errors) = Validator::new(options).validate(&set) {
        for e in errors {
            eprintln!("{e}");
            if let Some(related) = &e.related {
                eprintln!("{related}: note: first defined here");
            }
        }
        return Ok(1);
    }
    let model = ModelBuilder::new(Timestamp::now().date()).build(&set)?;

    let warnings = lint_model(&model);
    for warning in &warnings {
        writeln!(out, "{warning}")?;
    }
    tracing::info!(lints = warnings.len(), "lint complete");
    Ok(u8::from(!warnings.is_empty()))
}
