//! # Emitter Interface
//!
//! An [`Emitter`] renders a [`Model`] into files for one target. Emitters
//! are pure: they read the model and options and return bytes. Writing to
//! disk belongs to the orchestrator, which commits outputs only after every
//! emitter call has succeeded.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use glean_parser::Model;
use thiserror::Error;

/// `key=value` settings passed to an emitter with `-s`.
pub type EmitterOptions = BTreeMap<String, String>;

/// Error raised by an emitter or while checking its outputs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmitterError {
    /// The template could not be rendered.
    #[error("{format} emitter failed: {reason}")]
    Render {
        /// Format of the failing emitter.
        format: &'static str,
        /// What went wrong.
        reason: String,
    },

    /// An output path escapes the output directory or is absolute.
    #[error("{format} emitter produced an invalid output path '{}': {reason}", .path.display())]
    InvalidPath {
        /// Format of the failing emitter.
        format: &'static str,
        /// The offending path.
        path: PathBuf,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Two outputs map to the same file.
    #[error("{format} emitter produced '{}' more than once", .path.display())]
    DuplicatePath {
        /// Format of the failing emitter.
        format: &'static str,
        /// The repeated path.
        path: PathBuf,
    },
}

/// One generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitterOutput {
    /// Path relative to the output directory.
    pub path: PathBuf,
    /// File contents.
    pub contents: Vec<u8>,
}

impl EmitterOutput {
    /// A text output.
    pub fn text(path: impl Into<PathBuf>, contents: String) -> Self {
        Self {
            path: path.into(),
            contents: contents.into_bytes(),
        }
    }
}

/// A target format.
pub trait Emitter: Send + Sync {
    /// Format identifier used with `--format`.
    fn format(&self) -> &'static str;

    /// One-line description for `--help`.
    fn description(&self) -> &'static str;

    /// File extensions this emitter owns in the output directory. Files with
    /// these extensions that are not regenerated are removed.
    fn owned_extensions(&self) -> &'static [&'static str];

    /// Option keys the emitter understands.
    fn option_keys(&self) -> &'static [&'static str] {
        &[]
    }

    /// Render `model`.
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError`] if rendering fails. Must be deterministic:
    /// the same model and options always produce the same outputs in the
    /// same order.
    fn generate(&self, model: &Model, options: &EmitterOptions) -> Result<Vec<EmitterOutput>, EmitterError>;
}

/// Check that every output path is relative, stays inside the output
/// directory and is unique.
///
/// # Errors
///
/// Returns the first offending path.
pub fn check_output_paths(format: &'static str, outputs: &[EmitterOutput]) -> Result<(), EmitterError> {
    let mut seen = std::collections::BTreeSet::new();
    for output in outputs {
        let path = output.path.as_path();
        let reason = if path.as_os_str().is_empty() {
            Some("path is empty")
        } else if path.is_absolute() || path.has_root() {
            Some("path is absolute")
        } else if path.components().any(|c| !matches!(c, Component::Normal(_))) {
            Some("path must not contain `..` or `.` components")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(EmitterError::InvalidPath {
                format,
                path: path.to_path_buf(),
                reason,
            });
        }
        if !seen.insert(normalized(path)) {
            return Err(EmitterError::DuplicatePath {
                format,
                path: path.to_path_buf(),
            });
        }
    }
    Ok(())
}

/// Case-folded form, so `A.kt` and `a.kt` collide as they would on
/// case-insensitive file systems.
fn normalized(path: &Path) -> String {
    path.to_string_lossy().to_lowercase()
}

/// Render with `std::fmt::Write`, mapping formatter failures to
/// [`EmitterError::Render`].
pub(crate) fn render_error(format: &'static str) -> impl Fn(std::fmt::Error) -> EmitterError {
    move |e| EmitterError::Render {
        format,
        reason: e.to_string(),
    }
}
