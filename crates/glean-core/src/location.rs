//! # Source Provenance
//!
//! Every definition node and every diagnostic carries a [`SourceLocation`]
//! so errors can be reported as `path:line`.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// A position in an input document.
///
/// `line` is 1-based. It is `None` when the position could not be recovered,
/// e.g. for I/O failures or flow-style YAML.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SourceLocation {
    /// The input file, as given on the command line.
    pub path: PathBuf,
    /// 1-based line number, if known.
    pub line: Option<usize>,
}

impl SourceLocation {
    /// A location pointing at a specific line.
    pub fn new(path: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            path: path.into(),
            line: Some(line),
        }
    }

    /// A location that only identifies the file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            line: None,
        }
    }

    /// The same file at a more precise line, falling back to this location's
    /// line when `line` is `None`.
    pub fn refine(&self, line: Option<usize>) -> Self {
        Self {
            path: self.path.clone(),
            line: line.or(self.line),
        }
    }

    /// The file this location refers to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{line}", self.path.display()),
            None => write!(f, "{}", self.path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_and_without_line() {
        assert_eq!(SourceLocation::new("metrics.yaml", 12).to_string(), "metrics.yaml:12");
        assert_eq!(SourceLocation::file("metrics.yaml").to_string(), "metrics.yaml");
    }

    #[test]
    fn refine_prefers_new_line() {
        let base = SourceLocation::new("a.yaml", 3);
        assert_eq!(base.refine(Some(7)).line, Some(7));
        assert_eq!(base.refine(None).line, Some(3));
    }
}
