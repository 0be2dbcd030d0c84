//! # Lints
//!
//! Advisory checks over the model. They never block `translate`; the
//! `glinter` command reports them and fails if any fire. A metric or ping
//! suppresses a lint by listing its name in `no_lint`.

use std::collections::BTreeSet;
use std::fmt;

use glean_core::SourceLocation;

use crate::model::{Category, Entity, Model, Ping};
use crate::types::{Bug, MetricType};

/// Category names that say nothing about what they contain.
const GENERIC_CATEGORIES: &[&str] = &["metrics", "events"];

/// A lint check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LintKind {
    /// Every metric in a category starts with the same word.
    CommonPrefix,
    /// The category name is too generic.
    CategoryGeneric,
    /// A bug is given as a bare number.
    BugNumber,
    /// A metric is sent in the `baseline` ping.
    BaselinePing,
    /// A metric name repeats its unit.
    UnitInName,
    /// A `no_lint` entry suppresses nothing.
    SuperfluousNoLint,
}

impl LintKind {
    /// Lint names as written in `no_lint`.
    pub const NAMES: &'static [&'static str] = &[
        "COMMON_PREFIX",
        "CATEGORY_GENERIC",
        "BUG_NUMBER",
        "BASELINE_PING",
        "UNIT_IN_NAME",
        "SUPERFLUOUS_NO_LINT",
    ];

    const ALL: &'static [LintKind] = &[
        Self::CommonPrefix,
        Self::CategoryGeneric,
        Self::BugNumber,
        Self::BaselinePing,
        Self::UnitInName,
        Self::SuperfluousNoLint,
    ];

    /// The name used in `no_lint`.
    pub fn as_str(&self) -> &'static str {
        Self::NAMES[*self as usize]
    }

    /// Look up a lint by name.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == s)
    }
}

impl fmt::Display for LintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lint that fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintWarning {
    /// Which lint fired.
    pub kind: LintKind,
    /// Category, `category.metric` or `pings.name`.
    pub subject: String,
    /// Where the subject is defined.
    pub location: SourceLocation,
    /// What to change.
    pub message: String,
}

impl fmt::Display for LintWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}: {}", self.location, self.kind, self.subject, self.message)
    }
}

/// Run every lint over `model`, in model order.
pub fn lint_model(model: &Model) -> Vec<LintWarning> {
    let mut warnings = Vec::new();

    for category in &model.categories {
        let category_lints = category_lints(category);
        for (kind, message) in &category_lints {
            let suppressed = category
                .entities
                .iter()
                .all(|e| e.metadata.no_lint.iter().any(|n| n == kind.as_str()));
            if !suppressed {
                warnings.push(LintWarning {
                    kind: *kind,
                    subject: category.name.to_string(),
                    location: category.entities[0].location.clone(),
                    message: message.clone(),
                });
            }
        }

        for entity in &category.entities {
            let mut fired: BTreeSet<LintKind> = category_lints.iter().map(|(k, _)| *k).collect();
            for (kind, message) in entity_lints(entity) {
                fired.insert(kind);
                if !entity.metadata.no_lint.iter().any(|n| n == kind.as_str()) {
                    warnings.push(LintWarning {
                        kind,
                        subject: entity.identifier(),
                        location: entity.location.clone(),
                        message,
                    });
                }
            }
            superfluous(&mut warnings, &entity.metadata.no_lint, &fired, entity.identifier(), &entity.location);
        }
    }

    for ping in &model.pings {
        let subject = format!("pings.{}", ping.name);
        let mut fired = BTreeSet::new();
        for (kind, message) in ping_lints(ping) {
            fired.insert(kind);
            if !ping.no_lint.iter().any(|n| n == kind.as_str()) {
                warnings.push(LintWarning {
                    kind,
                    subject: subject.clone(),
                    location: ping.location.clone(),
                    message,
                });
            }
        }
        superfluous(&mut warnings, &ping.no_lint, &fired, subject, &ping.location);
    }

    warnings
}

fn category_lints(category: &Category) -> Vec<(LintKind, String)> {
    let mut out = Vec::new();

    if category.entities.len() >= 2 {
        let prefix = category.entities[0].name.as_str().split('_').next().unwrap_or_default();
        let shared = category.entities.iter().all(|e| {
            let name = e.name.as_str();
            name.len() > prefix.len() && name.starts_with(prefix) && name[prefix.len()..].starts_with('_')
        });
        if shared {
            out.push((
                LintKind::CommonPrefix,
                format!("every metric starts with '{prefix}'; consider moving it into the category name"),
            ));
        }
    }

    if GENERIC_CATEGORIES.contains(&category.name.as_str()) {
        out.push((
            LintKind::CategoryGeneric,
            format!("category name '{}' is too generic", category.name),
        ));
    }

    out
}

fn bug_lints(bugs: &[Bug]) -> Option<(LintKind, String)> {
    let numbers: Vec<String> = bugs
        .iter()
        .filter_map(|b| match b {
            Bug::Number(n) => Some(n.to_string()),
            Bug::Url(_) => None,
        })
        .collect();
    if numbers.is_empty() {
        None
    } else {
        Some((
            LintKind::BugNumber,
            format!("bugs {} should be given as URLs", numbers.join(", ")),
        ))
    }
}

fn entity_lints(entity: &Entity) -> Vec<(LintKind, String)> {
    let mut out = Vec::new();
    out.extend(bug_lints(&entity.metadata.bugs));

    if entity.metadata.send_in_pings.iter().any(|p| p == "baseline") {
        out.push((
            LintKind::BaselinePing,
            "metrics should not be added to the baseline ping".to_string(),
        ));
    }

    let unit = match entity.metric_type {
        MetricType::Timespan | MetricType::TimingDistribution | MetricType::Datetime => {
            entity.annotations.time_unit.map(|u| u.as_str().to_string())
        }
        MetricType::MemoryDistribution => entity.annotations.memory_unit.map(|u| u.as_str().to_string()),
        MetricType::Quantity => entity.annotations.unit.clone(),
        _ => None,
    };
    if let Some(unit) = unit {
        let name = entity.name.as_str();
        let unit = unit.to_lowercase().replace(' ', "_");
        if name.ends_with(&format!("_{unit}")) || name.ends_with(&format!("_{unit}s")) {
            out.push((
                LintKind::UnitInName,
                format!("the unit '{unit}' is already recorded; drop it from the name"),
            ));
        }
    }

    out
}

fn ping_lints(ping: &Ping) -> Vec<(LintKind, String)> {
    bug_lints(&ping.bugs).into_iter().collect()
}

fn superfluous(
    warnings: &mut Vec<LintWarning>,
    no_lint: &[String],
    fired: &BTreeSet<LintKind>,
    subject: String,
    location: &SourceLocation,
) {
    for name in no_lint {
        let Some(kind) = LintKind::parse(name) else {
            continue;
        };
        if kind != LintKind::SuperfluousNoLint && !fired.contains(&kind) {
            warnings.push(LintWarning {
                kind: LintKind::SuperfluousNoLint,
                subject: subject.clone(),
                location: location.clone(),
                message: format!("'{name}' is listed in no_lint but does not fire"),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_document;
    use crate::loader::MergedDefinitionSet;
    use crate::model::ModelBuilder;
    use chrono::NaiveDate;
    use std::path::Path;

    fn model(body: &str) -> Model {
        let text = format!("$schema: moz://mozilla.org/schemas/glean/metrics/1-0-0\n{body}");
        let set = MergedDefinitionSet {
            documents: vec![parse_document(Path::new("m.yaml"), &text).unwrap()],
        };
        ModelBuilder::new(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())
            .build(&set)
            .unwrap()
    }

    fn metric(name: &str, extra: &str) -> String {
        format!(
            "  {name}:
    type: timespan
    description: d
    bugs: [https://bugzilla.mozilla.org/1]
    data_reviews: []
    notification_emails: [a@example.com]
    expires: never
{extra}"
        )
    }

    fn kinds(warnings: &[LintWarning]) -> Vec<LintKind> {
        warnings.iter().map(|w| w.kind).collect()
    }

    #[test]
    fn clean_model_has_no_warnings() {
        let m = model(&format!("browser:\n{}{}", metric("load", ""), metric("paint", "")));
        assert!(lint_model(&m).is_empty());
    }

    #[test]
    fn common_prefix_and_generic_category() {
        let m = model(&format!("metrics:\n{}{}", metric("page_load", ""), metric("page_paint", "")));
        assert_eq!(kinds(&lint_model(&m)), vec![LintKind::CommonPrefix, LintKind::CategoryGeneric]);
    }

    #[test]
    fn unit_in_name_and_baseline() {
        let m = model(&format!(
            "browser:\n{}",
            metric("load_millisecond", "    send_in_pings: [baseline]\n")
        ));
        assert_eq!(kinds(&lint_model(&m)), vec![LintKind::BaselinePing, LintKind::UnitInName]);
    }

    #[test]
    fn no_lint_suppresses_and_flags_superfluous() {
        let m = model(&format!(
            "browser:\n{}",
            metric("load_millisecond", "    no_lint: [UNIT_IN_NAME, BUG_NUMBER]\n")
        ));
        let warnings = lint_model(&m);
        assert_eq!(kinds(&warnings), vec![LintKind::SuperfluousNoLint]);
        assert!(warnings[0].message.contains("BUG_NUMBER"));
    }

    #[test]
    fn bare_bug_numbers() {
        let m = model(&format!(
            "browser:\n{}",
            metric("load", "").replace("[https://bugzilla.mozilla.org/1]", "[1234]")
        ));
        let warnings = lint_model(&m);
        assert_eq!(kinds(&warnings), vec![LintKind::BugNumber]);
        assert_eq!(warnings[0].subject, "browser.load");
    }

    #[test]
    fn names_parse() {
        for name in LintKind::NAMES {
            assert_eq!(LintKind::parse(name).map(|k| k.as_str()), Some(*name));
        }
        assert_eq!(LintKind::parse("NOPE"), None);
    }
}
