//! # Identifier Newtypes
//!
//! Newtype wrappers for every name that appears in a definition document.
//! Each is validated at construction, so code downstream of the validator
//! cannot hold a malformed name.
//!
//! ## Naming Rules
//!
//! | Identifier | Pattern | Max length |
//! |---|---|---|
//! | category | dotted `snake_case` segments | 40 |
//! | metric | `snake_case` | 30 |
//! | ping | `kebab-case` | 30 |
//! | label | `snake_case` segments joined by `.`, `-` allowed | 61 |
//!
//! ## Case Normalization
//!
//! All target languages see the same renderings: [`camel_case`] splits on
//! `.`, `_` and `-`, lower-cases the first word and capitalizes the rest;
//! [`pascal_case`] capitalizes every word. Digits never start a new word, so
//! `v2_count` renders as `v2Count` and `ab1cd` stays `ab1cd`.

use convert_case::{Boundary, Case, Converter};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::IdentifierError;

static CATEGORY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_]*(\.[a-z_][a-z0-9_]*)*$").expect("static regex"));
static METRIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").expect("static regex"));
static PING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9-]*$").expect("static regex"));
static LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z_][a-z0-9_-]{0,29}(\.[a-z_0-9-]{0,29})*$").expect("static regex")
});

/// Ping names the Glean SDK sends on its own.
pub const RESERVED_PING_NAMES: &[&str] = &["baseline", "metrics", "events", "deletion-request", "default"];

/// Category prefix reserved for metrics the Glean SDK collects itself.
pub const RESERVED_CATEGORY_PREFIX: &str = "glean";

fn check(
    kind: &'static str,
    value: &str,
    max: usize,
    re: &Regex,
    rule: &'static str,
) -> Result<(), IdentifierError> {
    if value.is_empty() {
        return Err(IdentifierError::Empty { kind });
    }
    let len = value.chars().count();
    if len > max {
        return Err(IdentifierError::TooLong {
            kind,
            value: value.to_string(),
            len,
            max,
        });
    }
    if !re.is_match(value) {
        return Err(IdentifierError::Malformed {
            kind,
            value: value.to_string(),
            rule,
        });
    }
    Ok(())
}

fn converter(case: Case) -> Converter {
    Converter::new()
        .set_boundaries(&[Boundary::Underscore, Boundary::Hyphen])
        .to_case(case)
}

/// Render an identifier in `camelCase`, splitting on `.`, `_` and `-`.
pub fn camel_case(value: &str) -> String {
    converter(Case::Camel).convert(value.replace('.', "_"))
}

/// Render an identifier in `PascalCase`, splitting on `.`, `_` and `-`.
pub fn pascal_case(value: &str) -> String {
    converter(Case::Pascal).convert(value.replace('.', "_"))
}

/// A metric category, e.g. `browser.engagement`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CategoryName(String);

impl CategoryName {
    /// Maximum length of a category name.
    pub const MAX_LEN: usize = 40;

    /// Create a category name, validating the dotted `snake_case` rule.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError`] if the name is empty, too long or
    /// malformed.
    pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
        let s = value.into();
        check(
            "category",
            &s,
            Self::MAX_LEN,
            &CATEGORY_RE,
            "dotted snake_case (e.g. `browser.engagement`)",
        )?;
        Ok(Self(s))
    }

    /// Whether the category belongs to the Glean SDK's own namespace.
    pub fn is_reserved(&self) -> bool {
        self.0.starts_with(RESERVED_CATEGORY_PREFIX)
    }

    /// The canonical (dotted snake_case) form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `browser.engagement` → `browserEngagement`.
    pub fn camel(&self) -> String {
        camel_case(&self.0)
    }

    /// `browser.engagement` → `BrowserEngagement`.
    pub fn pascal(&self) -> String {
        pascal_case(&self.0)
    }
}

impl std::fmt::Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A metric name within a category, e.g. `click_count`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MetricName(String);

impl MetricName {
    /// Maximum length of a metric name.
    pub const MAX_LEN: usize = 30;

    /// Create a metric name, validating the `snake_case` rule.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError`] if the name is empty, too long or
    /// malformed.
    pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
        let s = value.into();
        check("metric", &s, Self::MAX_LEN, &METRIC_RE, "snake_case (e.g. `click_count`)")?;
        Ok(Self(s))
    }

    /// The canonical (snake_case) form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `click_count` → `clickCount`.
    pub fn camel(&self) -> String {
        camel_case(&self.0)
    }

    /// `click_count` → `ClickCount`.
    pub fn pascal(&self) -> String {
        pascal_case(&self.0)
    }
}

impl std::fmt::Display for MetricName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A custom ping name, e.g. `search-usage`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PingName(String);

impl PingName {
    /// Maximum length of a ping name.
    pub const MAX_LEN: usize = 30;

    /// Create a ping name, validating the `kebab-case` rule.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError`] if the name is empty, too long or
    /// malformed.
    pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
        let s = value.into();
        check("ping", &s, Self::MAX_LEN, &PING_RE, "kebab-case (e.g. `search-usage`)")?;
        Ok(Self(s))
    }

    /// Whether the Glean SDK already sends a ping with this name.
    pub fn is_reserved(&self) -> bool {
        RESERVED_PING_NAMES.contains(&self.0.as_str())
    }

    /// The canonical (kebab-case) form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `search-usage` → `searchUsage`.
    pub fn camel(&self) -> String {
        camel_case(&self.0)
    }
}

impl std::fmt::Display for PingName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A static label of a labeled metric.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Label(String);

impl Label {
    /// Maximum length of a label.
    pub const MAX_LEN: usize = 61;

    /// Create a label, validating the label rule.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError`] if the label is empty, too long or
    /// malformed.
    pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
        let s = value.into();
        check(
            "label",
            &s,
            Self::MAX_LEN,
            &LABEL_RE,
            "snake_case segments of at most 30 characters, joined by `.`",
        )?;
        Ok(Self(s))
    }

    /// The label as written.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn category_accepts_dotted_snake_case() {
        let c = CategoryName::new("browser.engagement").unwrap();
        assert_eq!(c.as_str(), "browser.engagement");
        assert_eq!(c.camel(), "browserEngagement");
        assert_eq!(c.pascal(), "BrowserEngagement");
    }

    #[test]
    fn category_rejects_uppercase_and_hyphen() {
        assert!(matches!(
            CategoryName::new("Browser"),
            Err(IdentifierError::Malformed { .. })
        ));
        assert!(matches!(
            CategoryName::new("browser-engagement"),
            Err(IdentifierError::Malformed { .. })
        ));
    }

    #[test]
    fn category_rejects_empty_segment() {
        assert!(CategoryName::new("browser..engagement").is_err());
        assert!(CategoryName::new(".browser").is_err());
    }

    #[test]
    fn category_too_long() {
        let long = "a".repeat(41);
        match CategoryName::new(long) {
            Err(IdentifierError::TooLong { len, max, .. }) => {
                assert_eq!(len, 41);
                assert_eq!(max, 40);
            }
            other => panic!("expected TooLong, got {other:?}"),
        }
    }

    #[test]
    fn reserved_category_prefix() {
        assert!(CategoryName::new("glean.internal").unwrap().is_reserved());
        assert!(CategoryName::new("glean_extra").unwrap().is_reserved());
        assert!(!CategoryName::new("browser").unwrap().is_reserved());
    }

    #[test]
    fn metric_name_rules() {
        assert!(MetricName::new("click_count").is_ok());
        assert!(MetricName::new("_private").is_ok());
        assert!(matches!(MetricName::new(""), Err(IdentifierError::Empty { .. })));
        assert!(MetricName::new("clickCount").is_err());
        assert!(MetricName::new("1st").is_err());
        assert!(MetricName::new("a".repeat(31)).is_err());
    }

    #[test]
    fn metric_name_renderings() {
        let m = MetricName::new("v2_click_count").unwrap();
        assert_eq!(m.camel(), "v2ClickCount");
        assert_eq!(m.pascal(), "V2ClickCount");
        assert_eq!(MetricName::new("ab1cd").unwrap().camel(), "ab1cd");
    }

    #[test]
    fn ping_name_rules() {
        let p = PingName::new("search-usage").unwrap();
        assert_eq!(p.camel(), "searchUsage");
        assert!(!p.is_reserved());
        assert!(PingName::new("baseline").unwrap().is_reserved());
        assert!(PingName::new("deletion-request").unwrap().is_reserved());
        assert!(PingName::new("search_usage").is_err());
        assert!(PingName::new("-leading").is_err());
    }

    #[test]
    fn label_rules() {
        assert!(Label::new("tab.opened").is_ok());
        assert!(Label::new("with-dash").is_ok());
        assert!(Label::new("Upper").is_err());
        assert!(Label::new("a".repeat(31)).is_err());
    }

    #[test]
    fn error_messages_name_the_value() {
        let err = MetricName::new("BadName").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("BadName"), "{msg}");
        assert!(msg.contains("snake_case"), "{msg}");
    }

    proptest! {
        #[test]
        fn valid_metric_names_camel_case_has_no_separators(name in "[a-z][a-z0-9]{0,8}(_[a-z][a-z0-9]{0,8}){0,2}") {
            let m = MetricName::new(name.clone()).unwrap();
            let camel = m.camel();
            prop_assert!(!camel.contains('_'));
            prop_assert!(camel.chars().next().map_or(false, |c| c.is_ascii_lowercase()));
            prop_assert_eq!(camel.to_lowercase(), name.replace('_', ""));
        }

        #[test]
        fn pascal_is_capitalized_camel(name in "[a-z][a-z0-9]{0,8}(\\.[a-z][a-z0-9]{0,8}){0,2}") {
            let c = CategoryName::new(name).unwrap();
            let camel = c.camel();
            let pascal = c.pascal();
            let mut expected = camel.chars();
            let first = expected.next().unwrap().to_ascii_uppercase();
            prop_assert_eq!(pascal, format!("{first}{}", expected.as_str()));
        }
    }
}
