//! # Parse and Validation Errors
//!
//! Both error kinds are accumulated, never short-circuited: the loader
//! returns every file's [`ParseError`], the validator every
//! [`ValidationError`], so a user fixes all problems in one pass.

use std::fmt;
use std::path::Path;

use glean_core::SourceLocation;
use thiserror::Error;

/// A definition document could not be read or is not well-formed YAML.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{location}{}: parse error: {message}", column_suffix(.location, .column))]
pub struct ParseError {
    /// Where the syntax error was detected.
    pub location: SourceLocation,
    /// 1-based column, if the parser reported one.
    pub column: Option<usize>,
    /// Parser message.
    pub message: String,
}

impl ParseError {
    /// Build from a serde_yaml error, keeping its line and column.
    pub fn from_yaml(path: &Path, err: &serde_yaml::Error) -> Self {
        let (line, column) = err
            .location()
            .map(|l| (Some(l.line()), Some(l.column())))
            .unwrap_or((None, None));
        Self {
            location: SourceLocation {
                path: path.to_path_buf(),
                line,
            },
            column,
            message: err.to_string(),
        }
    }

    /// Build from an I/O failure reading the file.
    pub fn io(path: &Path, err: &std::io::Error) -> Self {
        Self {
            location: SourceLocation::file(path),
            column: None,
            message: format!("cannot read file: {err}"),
        }
    }
}

/// `:col` when both a line and a column are known.
fn column_suffix(location: &SourceLocation, column: &Option<usize>) -> String {
    match (location.line, column) {
        (Some(_), Some(col)) => format!(":{col}"),
        _ => String::new(),
    }
}

/// Category of a semantic validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorKind {
    /// A required field is absent.
    MissingField,
    /// A field holds a value of the wrong YAML type.
    TypeMismatch,
    /// A field's value is outside its declared domain.
    InvalidEnumValue,
    /// The same `(category, name)` is defined more than once, or two names
    /// render to the same generated identifier.
    DuplicateIdentifier,
    /// A field's legality depends on another field's value, and it fails.
    CrossFieldConstraint,
    /// A field that the schema does not know.
    UnknownField,
    /// A category, metric, ping or label name breaks its naming rule.
    InvalidIdentifier,
}

impl ValidationErrorKind {
    /// Stable kebab-case name used in rendered diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingField => "missing-field",
            Self::TypeMismatch => "type-mismatch",
            Self::InvalidEnumValue => "invalid-enum-value",
            Self::DuplicateIdentifier => "duplicate-identifier",
            Self::CrossFieldConstraint => "cross-field-constraint-violation",
            Self::UnknownField => "unknown-field",
            Self::InvalidIdentifier => "invalid-identifier",
        }
    }
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A semantically invalid (but syntactically well-formed) definition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{location}: {kind}: {subject}{}: {message}", field_suffix(.field))]
pub struct ValidationError {
    /// What went wrong.
    pub kind: ValidationErrorKind,
    /// Where it went wrong.
    pub location: SourceLocation,
    /// A second location involved in the error (the first definition of a
    /// duplicate identifier).
    pub related: Option<SourceLocation>,
    /// The definition the error belongs to, e.g. `browser.click_count`.
    pub subject: String,
    /// The offending field, when the error is about one.
    pub field: Option<String>,
    /// Human-readable explanation.
    pub message: String,
}

impl ValidationError {
    /// Start an error about a whole definition.
    pub fn new(
        kind: ValidationErrorKind,
        location: SourceLocation,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            location,
            related: None,
            subject: subject.into(),
            field: None,
            message: message.into(),
        }
    }

    /// Attach the offending field name.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Attach a related location.
    pub fn with_related(mut self, related: SourceLocation) -> Self {
        self.related = Some(related);
        self
    }
}

fn field_suffix(field: &Option<String>) -> String {
    field.as_ref().map(|f| format!(": field `{f}`")).unwrap_or_default()
}

/// Collects validation errors in the order they are found.
///
/// Threaded through every check instead of returning early, so one run
/// reports every problem in every file.
#[derive(Debug, Default)]
pub struct ErrorAccumulator {
    errors: Vec<ValidationError>,
}

impl ErrorAccumulator {
    /// Record an error.
    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Number of errors recorded so far.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// `Ok(())` when nothing was recorded, otherwise every error in order.
    pub fn finish(self) -> Result<(), Vec<ValidationError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_display_names_field_file_and_line() {
        let e = ValidationError::new(
            ValidationErrorKind::InvalidEnumValue,
            SourceLocation::new("metrics.yaml", 9),
            "browser.click_count",
            "'forever' is not one of: ping, user, application",
        )
        .with_field("lifetime");
        let s = e.to_string();
        assert!(s.starts_with("metrics.yaml:9: invalid-enum-value"), "{s}");
        assert!(s.contains("field `lifetime`"), "{s}");
        assert!(s.contains("browser.click_count"), "{s}");
    }

    #[test]
    fn parse_error_display_includes_column() {
        let e = ParseError {
            location: SourceLocation::new("bad.yaml", 3),
            column: Some(5),
            message: "mapping values are not allowed".into(),
        };
        assert_eq!(e.to_string(), "bad.yaml:3:5: parse error: mapping values are not allowed");
    }

    #[test]
    fn optional_parts_are_omitted_from_display() {
        let e = ParseError::io(Path::new("gone.yaml"), &std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(e.to_string().starts_with("gone.yaml: parse error: cannot read file"), "{e}");

        let e = ValidationError::new(
            ValidationErrorKind::DuplicateIdentifier,
            SourceLocation::new("b.yaml", 3),
            "browser.clicks",
            "already defined at a.yaml:3",
        );
        assert_eq!(
            e.to_string(),
            "b.yaml:3: duplicate-identifier: browser.clicks: already defined at a.yaml:3"
        );
    }

    #[test]
    fn accumulator_finish() {
        let acc = ErrorAccumulator::default();
        assert!(acc.finish().is_ok());

        let mut acc = ErrorAccumulator::default();
        acc.push(ValidationError::new(
            ValidationErrorKind::MissingField,
            SourceLocation::file("a.yaml"),
            "a.b",
            "missing",
        ));
        assert_eq!(acc.len(), 1);
        assert_eq!(acc.finish().unwrap_err().len(), 1);
    }

    #[test]
    fn kind_names_are_stable() {
        assert_eq!(ValidationErrorKind::DuplicateIdentifier.as_str(), "duplicate-identifier");
        assert_eq!(
            ValidationErrorKind::CrossFieldConstraint.as_str(),
            "cross-field-constraint-violation"
        );
    }
}
