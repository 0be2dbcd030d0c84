//! # Translation Orchestrator
//!
//! Runs one `translate` invocation end to end:
//!
//! 1. Resolve the emitter for the requested format (fail fast).
//! 2. Load every input; stop if any file failed to parse.
//! 3. Validate; stop if anything is invalid.
//! 4. Build the model and run the lints (warnings only).
//! 5. Generate every output in memory and check the paths.
//! 6. Only then touch the output directory: write changed files, leave
//!    unchanged ones alone, remove owned files that were not regenerated.
//!
//! A write failure in step 6 is not rolled back; the error lists the files
//! that were already written.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use glean_core::{ConfigurationError, Timestamp};
use glean_parser::{
    lint_model, load_documents, ModelBuilder, ModelError, ParseError, ValidationError, Validator,
    ValidatorOptions,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::emitter::{check_output_paths, Emitter, EmitterError, EmitterOptions, EmitterOutput};
use crate::registry::EmitterRegistry;

/// Settings of one translation.
#[derive(Debug, Clone)]
pub struct TranslateOptions {
    /// `key=value` settings for the emitter.
    pub emitter_options: EmitterOptions,
    /// Accept reserved category and ping names.
    pub allow_reserved: bool,
    /// Date against which `expires` dates are resolved.
    pub build_date: NaiveDate,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            emitter_options: EmitterOptions::new(),
            allow_reserved: false,
            build_date: Timestamp::now().date(),
        }
    }
}

/// What a successful translation did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslateReport {
    /// Files created or rewritten.
    pub written: Vec<PathBuf>,
    /// Files whose contents were already up to date.
    pub unchanged: Vec<PathBuf>,
    /// Stale files removed from the output directory.
    pub removed: Vec<PathBuf>,
    /// Lint and option warnings.
    pub warnings: Vec<String>,
}

/// Why a translation failed.
#[derive(Error, Debug)]
pub enum TranslateError {
    /// Bad format or options. Nothing was read.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// One or more inputs could not be parsed.
    #[error("{} input file(s) could not be parsed", .0.len())]
    Parse(Vec<ParseError>),

    /// The definitions are invalid.
    #[error("found {} validation error(s)", .0.len())]
    Validation(Vec<ValidationError>),

    /// The model could not be built from a validated set.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The emitter failed.
    #[error(transparent)]
    Emitter(#[from] EmitterError),

    /// The output directory could not be created or listed.
    #[error("cannot prepare output directory {}: {source}", .path.display())]
    OutputDir {
        /// The output directory.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A file could not be written or removed.
    #[error("cannot update {}: {source} ({} file(s) already written)", .path.display(), .written.len())]
    Write {
        /// Files written before the failure.
        written: Vec<PathBuf>,
        /// The file that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}

impl TranslateError {
    /// One line per underlying problem, ready to print.
    pub fn diagnostics(&self) -> Vec<String> {
        match self {
            Self::Parse(errors) => errors.iter().map(ToString::to_string).collect(),
            Self::Validation(errors) => errors
                .iter()
                .flat_map(|e| {
                    let mut lines = vec![e.to_string()];
                    if let Some(related) = &e.related {
                        lines.push(format!("{related}: note: first defined here"));
                    }
                    lines
                })
                .collect(),
            Self::Write { written, .. } => {
                let mut lines = vec![self.to_string()];
                lines.extend(written.iter().map(|p| format!("already written: {}", p.display())));
                lines
            }
            other => vec![other.to_string()],
        }
    }

    /// Process exit status: 2 for configuration errors, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) => 2,
            _ => 1,
        }
    }
}

/// Translate `inputs` into `format` files under `output_dir`.
///
/// # Errors
///
/// Returns [`TranslateError`]; parse and validation variants carry every
/// error found.
pub fn translate<P: AsRef<Path>>(
    registry: &EmitterRegistry,
    inputs: &[P],
    format: &str,
    output_dir: &Path,
    options: &TranslateOptions,
) -> Result<TranslateReport, TranslateError> {
    let emitter = registry.create(format)?;
    let mut report = TranslateReport::default();

    for key in options.emitter_options.keys() {
        if !emitter.option_keys().contains(&key.as_str()) {
            let message = format!(
                "option '{key}' is not used by the {format} emitter (known: {})",
                emitter.option_keys().join(", ")
            );
            warn!(option = %key, format, "unknown emitter option");
            report.warnings.push(message);
        }
    }

    let set = load_documents(inputs).map_err(TranslateError::Parse)?;
    Validator::new(ValidatorOptions {
        allow_reserved: options.allow_reserved,
    })
    .validate(&set)
    .map_err(TranslateError::Validation)?;
    let model = ModelBuilder::new(options.build_date).build(&set)?;

    for lint in lint_model(&model) {
        warn!(lint = %lint.kind, subject = %lint.subject, "{}", lint.message);
        report.warnings.push(lint.to_string());
    }

    let outputs = emitter.generate(&model, &options.emitter_options)?;
    check_output_paths(emitter.format(), &outputs)?;
    debug!(format, outputs = outputs.len(), "generated outputs");

    commit(emitter.as_ref(), output_dir, outputs, &mut report)?;
    info!(
        output_dir = %output_dir.display(),
        written = report.written.len(),
        unchanged = report.unchanged.len(),
        removed = report.removed.len(),
        "translation complete"
    );
    Ok(report)
}

fn commit(
    emitter: &dyn Emitter,
    output_dir: &Path,
    outputs: Vec<EmitterOutput>,
    report: &mut TranslateReport,
) -> Result<(), TranslateError> {
    fs::create_dir_all(output_dir).map_err(|source| TranslateError::OutputDir {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let generated: BTreeSet<PathBuf> = outputs.iter().map(|o| o.path.clone()).collect();

    for output in outputs {
        let target = output_dir.join(&output.path);
        if fs::read(&target).is_ok_and(|existing| existing == output.contents) {
            debug!(path = %target.display(), "unchanged");
            report.unchanged.push(target);
            continue;
        }
        let result = match target.parent() {
            Some(parent) => fs::create_dir_all(parent),
            None => Ok(()),
        }
        .and_then(|()| fs::write(&target, &output.contents));
        if let Err(source) = result {
            return Err(TranslateError::Write {
                written: std::mem::take(&mut report.written),
                path: target,
                source,
            });
        }
        debug!(path = %target.display(), bytes = output.contents.len(), "wrote");
        report.written.push(target);
    }

    let entries = fs::read_dir(output_dir).map_err(|source| TranslateError::OutputDir {
        path: output_dir.to_path_buf(),
        source,
    })?;
    let mut stale = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(dir = %output_dir.display(), error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let owned = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| emitter.owned_extensions().contains(&e));
        if owned && !generated.contains(Path::new(&entry.file_name())) {
            stale.push(path);
        }
    }
    stale.sort();
    for path in stale {
        if let Err(source) = fs::remove_file(&path) {
            return Err(TranslateError::Write {
                written: std::mem::take(&mut report.written),
                path,
                source,
            });
        }
        info!(path = %path.display(), "removed stale output");
        report.removed.push(path);
    }
    Ok(())
}
