//! # Intermediate Model
//!
//! The emitter-neutral, fully resolved form of a validated definition set.
//! Every default is applied here (lifetime, `send_in_pings`, units, expiry)
//! so emitters only render.
//!
//! ## Ordering
//!
//! Categories, the entities within each category and pings are sorted by
//! canonical name. The model built from a set of files is therefore the same
//! regardless of the order the files were given in.
//!
//! ## Contract
//!
//! [`ModelBuilder::build`] must only see a set the validator accepted. A
//! [`ModelError`] means the two disagree and is a bug, not a user error.

use chrono::NaiveDate;
use glean_core::{CategoryName, Label, MetricName, PingName, SourceLocation};
use serde_yaml::{Mapping, Value};
use thiserror::Error;
use tracing::debug;

use crate::loader::{DefinitionNode, DocumentKind, MergedDefinitionSet};
use crate::types::{Bug, Expiry, HistogramType, Lifetime, MemoryUnit, MetricType, TimeUnit};

/// The validated set violated an invariant the validator should have
/// enforced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("internal error building model for {subject} at {location}: {reason}")]
pub struct ModelError {
    /// The definition being built.
    pub subject: String,
    /// Where it is defined.
    pub location: SourceLocation,
    /// What was wrong.
    pub reason: String,
}

/// Metadata shared by every metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// Free-text description, as written.
    pub description: String,
    /// Bug numbers or URLs tracking the metric.
    pub bugs: Vec<Bug>,
    /// Data review URLs.
    pub data_reviews: Vec<String>,
    /// Owners to notify about the metric.
    pub notification_emails: Vec<String>,
    /// When the metric stops being recorded.
    pub expires: Expiry,
    /// Defaults to [`Lifetime::Ping`].
    pub lifetime: Lifetime,
    /// Resolved ping list: never empty, no `default` placeholder, no
    /// duplicates.
    pub send_in_pings: Vec<String>,
    /// True when disabled explicitly or by expiry.
    pub disabled: bool,
    /// Definition version, `0` unless given.
    pub version: u64,
    /// Lints suppressed for this metric.
    pub no_lint: Vec<String>,
}

/// An event extra key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraKey {
    /// Key as written.
    pub name: String,
    /// What the key records.
    pub description: String,
}

/// Parameters of a custom distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomRange {
    /// Lowest bucket boundary.
    pub range_min: u64,
    /// Highest bucket boundary.
    pub range_max: u64,
    /// Number of buckets.
    pub bucket_count: u64,
    /// Bucket spacing.
    pub histogram_type: HistogramType,
}

/// Type-specific attributes. Only the ones meaningful for an entity's type
/// are set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
    /// Static labels of a labeled metric. `None` means dynamic labels.
    pub labels: Option<Vec<Label>>,
    /// Timespan, datetime and timing distribution unit.
    pub time_unit: Option<TimeUnit>,
    /// Memory distribution unit.
    pub memory_unit: Option<MemoryUnit>,
    /// Event extra keys, sorted by name.
    pub extra_keys: Vec<ExtraKey>,
    /// Custom distribution parameters.
    pub custom_range: Option<CustomRange>,
    /// Free-form unit of a quantity.
    pub unit: Option<String>,
}

/// One metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    /// Owning category.
    pub category: CategoryName,
    /// Metric name within the category.
    pub name: MetricName,
    /// Metric type.
    pub metric_type: MetricType,
    /// Common metadata with defaults applied.
    pub metadata: Metadata,
    /// Type-specific attributes.
    pub annotations: Annotations,
    /// Where the metric is defined.
    pub location: SourceLocation,
}

impl Entity {
    /// `category.name` as written in documents.
    pub fn identifier(&self) -> String {
        format!("{}.{}", self.category, self.name)
    }
}

/// Metrics sharing a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Category name.
    pub name: CategoryName,
    /// Sorted by metric name.
    pub entities: Vec<Entity>,
}

/// A ping submission reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reason {
    /// Reason code sent with the ping.
    pub name: String,
    /// When the reason applies.
    pub description: String,
}

/// A custom ping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ping {
    /// Ping name.
    pub name: PingName,
    /// Free-text description.
    pub description: String,
    /// Whether the ping carries the client id.
    pub include_client_id: bool,
    /// Send even when no metric recorded data.
    pub send_if_empty: bool,
    /// Submission reasons, sorted by name.
    pub reasons: Vec<Reason>,
    /// Bug numbers or URLs tracking the ping.
    pub bugs: Vec<Bug>,
    /// Data review URLs.
    pub data_reviews: Vec<String>,
    /// Owners to notify about the ping.
    pub notification_emails: Vec<String>,
    /// Lints suppressed for this ping.
    pub no_lint: Vec<String>,
    /// Where the ping is defined.
    pub location: SourceLocation,
}

/// The complete model handed to emitters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Model {
    /// Metric categories, sorted by name.
    pub categories: Vec<Category>,
    /// Custom pings, sorted by name.
    pub pings: Vec<Ping>,
}

impl Model {
    /// Every entity, category order then name order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.categories.iter().flat_map(|c| c.entities.iter())
    }

    /// Whether the model defines nothing.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.pings.is_empty()
    }
}

/// Builds a [`Model`] from a validated set.
#[derive(Debug, Clone, Copy)]
pub struct ModelBuilder {
    build_date: NaiveDate,
}

impl ModelBuilder {
    /// Resolve expiry dates against `build_date`.
    pub fn new(build_date: NaiveDate) -> Self {
        Self { build_date }
    }

    /// Build the model.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] only if `set` was not validated first.
    pub fn build(&self, set: &MergedDefinitionSet) -> Result<Model, ModelError> {
        let mut categories: Vec<Category> = Vec::new();
        let mut pings = Vec::new();

        for (doc, node) in set.definitions() {
            match doc.kind {
                DocumentKind::Pings => pings.push(build_ping(node)?),
                DocumentKind::Metrics => {
                    let entity = self.build_entity(node)?;
                    match categories.iter_mut().find(|c| c.name == entity.category) {
                        Some(category) => category.entities.push(entity),
                        None => categories.push(Category {
                            name: entity.category.clone(),
                            entities: vec![entity],
                        }),
                    }
                }
            }
        }

        categories.sort_by(|a, b| a.name.cmp(&b.name));
        for category in &mut categories {
            category.entities.sort_by(|a, b| a.name.cmp(&b.name));
        }
        pings.sort_by(|a, b| a.name.cmp(&b.name));

        debug!(
            categories = categories.len(),
            pings = pings.len(),
            build_date = %self.build_date,
            "built model"
        );
        Ok(Model { categories, pings })
    }

    fn build_entity(&self, node: &DefinitionNode) -> Result<Entity, ModelError> {
        let fields = Fields::of(node)?;
        let category = CategoryName::new(node.category.as_str()).map_err(|e| fields.defect(e))?;
        let name = MetricName::new(node.name.as_str()).map_err(|e| fields.defect(e))?;

        let type_name = fields.required_str("type")?;
        let metric_type = MetricType::parse(type_name)
            .ok_or_else(|| fields.defect(format!("unknown type '{type_name}'")))?;

        let expires_raw = fields.required_str("expires")?;
        let expires = Expiry::parse(expires_raw)
            .ok_or_else(|| fields.defect(format!("bad expiry '{expires_raw}'")))?;

        let lifetime = match fields.str("lifetime") {
            Some(s) => Lifetime::parse(s).ok_or_else(|| fields.defect(format!("bad lifetime '{s}'")))?,
            None => Lifetime::default(),
        };

        let default_store = metric_type.default_store();
        let mut send_in_pings: Vec<String> = Vec::new();
        for ping in fields.strings("send_in_pings").unwrap_or_else(|| vec!["default"]) {
            let ping = if ping == "default" { default_store } else { ping };
            if !send_in_pings.iter().any(|p| p == ping) {
                send_in_pings.push(ping.to_string());
            }
        }

        let disabled = fields.bool("disabled").unwrap_or(false) || expires.is_expired(self.build_date);

        let metadata = Metadata {
            description: fields.required_str("description")?.to_string(),
            bugs: fields.bugs(),
            data_reviews: fields.owned_strings("data_reviews"),
            notification_emails: fields.owned_strings("notification_emails"),
            expires,
            lifetime,
            send_in_pings,
            disabled,
            version: fields.u64("version").unwrap_or(0),
            no_lint: fields.owned_strings("no_lint"),
        };

        let mut annotations = Annotations::default();
        if metric_type.is_labeled() {
            if let Some(labels) = fields.strings("labels") {
                let labels = labels
                    .into_iter()
                    .map(Label::new)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| fields.defect(e))?;
                annotations.labels = Some(labels);
            }
        }
        match metric_type {
            MetricType::Timespan | MetricType::TimingDistribution | MetricType::Datetime => {
                let default = if metric_type == MetricType::TimingDistribution {
                    TimeUnit::Nanosecond
                } else {
                    TimeUnit::Millisecond
                };
                annotations.time_unit = Some(match fields.str("time_unit") {
                    Some(s) => TimeUnit::parse(s).ok_or_else(|| fields.defect(format!("bad time_unit '{s}'")))?,
                    None => default,
                });
            }
            MetricType::MemoryDistribution => {
                annotations.memory_unit = Some(match fields.str("memory_unit") {
                    Some(s) => {
                        MemoryUnit::parse(s).ok_or_else(|| fields.defect(format!("bad memory_unit '{s}'")))?
                    }
                    None => MemoryUnit::Byte,
                });
            }
            MetricType::Event => {
                if let Some(extra) = fields.mapping("extra_keys") {
                    for (key, value) in extra {
                        let name = key
                            .as_str()
                            .ok_or_else(|| fields.defect("extra key is not a string"))?;
                        let description = value
                            .as_mapping()
                            .and_then(|m| m.get("description"))
                            .and_then(Value::as_str)
                            .ok_or_else(|| fields.defect(format!("extra key '{name}' has no description")))?;
                        annotations.extra_keys.push(ExtraKey {
                            name: name.to_string(),
                            description: description.to_string(),
                        });
                    }
                    annotations.extra_keys.sort_by(|a, b| a.name.cmp(&b.name));
                }
            }
            MetricType::CustomDistribution => {
                let histogram = fields.required_str("histogram_type")?;
                annotations.custom_range = Some(CustomRange {
                    range_min: fields.u64("range_min").unwrap_or(1),
                    range_max: fields.u64("range_max").ok_or_else(|| fields.defect("range_max missing"))?,
                    bucket_count: fields
                        .u64("bucket_count")
                        .ok_or_else(|| fields.defect("bucket_count missing"))?,
                    histogram_type: HistogramType::parse(histogram)
                        .ok_or_else(|| fields.defect(format!("bad histogram_type '{histogram}'")))?,
                });
            }
            MetricType::Quantity => {
                annotations.unit = fields.str("unit").map(str::to_string);
            }
            _ => {}
        }

        Ok(Entity {
            category,
            name,
            metric_type,
            metadata,
            annotations,
            location: node.location.clone(),
        })
    }
}

fn build_ping(node: &DefinitionNode) -> Result<Ping, ModelError> {
    let fields = Fields::of(node)?;
    let name = PingName::new(node.name.as_str()).map_err(|e| fields.defect(e))?;

    let mut reasons = Vec::new();
    if let Some(map) = fields.mapping("reasons") {
        for (key, value) in map {
            match (key.as_str(), value.as_str()) {
                (Some(name), Some(description)) => reasons.push(Reason {
                    name: name.to_string(),
                    description: description.to_string(),
                }),
                _ => return Err(fields.defect("malformed reason")),
            }
        }
        reasons.sort_by(|a, b| a.name.cmp(&b.name));
    }

    Ok(Ping {
        name,
        description: fields.required_str("description")?.to_string(),
        include_client_id: fields
            .bool("include_client_id")
            .ok_or_else(|| fields.defect("include_client_id missing"))?,
        send_if_empty: fields.bool("send_if_empty").unwrap_or(false),
        reasons,
        bugs: fields.bugs(),
        data_reviews: fields.owned_strings("data_reviews"),
        notification_emails: fields.owned_strings("notification_emails"),
        no_lint: fields.owned_strings("no_lint"),
        location: node.location.clone(),
    })
}

/// Typed accessors over a definition body.
struct Fields<'a> {
    node: &'a DefinitionNode,
    body: &'a Mapping,
}

impl<'a> Fields<'a> {
    fn of(node: &'a DefinitionNode) -> Result<Self, ModelError> {
        match &node.body {
            Value::Mapping(body) => Ok(Self { node, body }),
            _ => Err(ModelError {
                subject: node.subject(),
                location: node.location.clone(),
                reason: "definition body is not a mapping".to_string(),
            }),
        }
    }

    fn defect(&self, reason: impl ToString) -> ModelError {
        ModelError {
            subject: self.node.subject(),
            location: self.node.location.clone(),
            reason: reason.to_string(),
        }
    }

    fn str(&self, field: &str) -> Option<&'a str> {
        self.body.get(field).and_then(Value::as_str)
    }

    fn required_str(&self, field: &str) -> Result<&'a str, ModelError> {
        self.str(field)
            .ok_or_else(|| self.defect(format!("`{field}` missing")))
    }

    fn bool(&self, field: &str) -> Option<bool> {
        self.body.get(field).and_then(Value::as_bool)
    }

    fn u64(&self, field: &str) -> Option<u64> {
        self.body.get(field).and_then(Value::as_u64)
    }

    fn mapping(&self, field: &str) -> Option<&'a Mapping> {
        self.body.get(field).and_then(Value::as_mapping)
    }

    fn strings(&self, field: &str) -> Option<Vec<&'a str>> {
        self.body
            .get(field)
            .and_then(Value::as_sequence)
            .map(|seq| seq.iter().filter_map(Value::as_str).collect())
    }

    fn owned_strings(&self, field: &str) -> Vec<String> {
        self.strings(field)
            .unwrap_or_default()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn bugs(&self) -> Vec<Bug> {
        self.body
            .get("bugs")
            .and_then(Value::as_sequence)
            .map(|seq| {
                seq.iter()
                    .filter_map(|b| match b {
                        Value::Number(n) => n.as_u64().map(Bug::Number),
                        Value::String(s) => Some(Bug::Url(s.clone())),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_document;
    use std::path::Path;

    const METRICS: &str = "\
$schema: moz://mozilla.org/schemas/glean/metrics/1-0-0
zeta:
  b_metric:
    type: event
    description: An event.
    bugs: [https://bugzilla.mozilla.org/1]
    data_reviews: []
    notification_emails: [a@example.com]
    expires: never
    extra_keys:
      target:
        description: What was clicked.
  a_metric:
    type: timing_distribution
    description: Load time.
    bugs: [42]
    data_reviews: []
    notification_emails: [a@example.com]
    expires: 2020-01-01
    send_in_pings: [default, custom, custom-two]
alpha:
  sizes:
    type: custom_distribution
    description: Sizes.
    bugs: [https://bugzilla.mozilla.org/1]
    data_reviews: []
    notification_emails: [a@example.com]
    expires: expired
    range_max: 100
    bucket_count: 10
    histogram_type: exponential
";

    fn build(texts: &[&str]) -> Model {
        let set = MergedDefinitionSet {
            documents: texts
                .iter()
                .enumerate()
                .map(|(i, t)| parse_document(Path::new(&format!("{i}.yaml")), t).unwrap())
                .collect(),
        };
        ModelBuilder::new(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())
            .build(&set)
            .unwrap()
    }

    #[test]
    fn categories_and_entities_are_sorted() {
        let model = build(&[METRICS]);
        let names: Vec<_> = model.entities().map(Entity::identifier).collect();
        assert_eq!(names, vec!["alpha.sizes", "zeta.a_metric", "zeta.b_metric"]);
    }

    #[test]
    fn defaults_are_resolved() {
        let model = build(&[METRICS]);
        let event = model.entities().find(|e| e.name.as_str() == "b_metric").unwrap();
        assert_eq!(event.metadata.lifetime, Lifetime::Ping);
        assert_eq!(event.metadata.send_in_pings, vec!["events"]);
        assert!(!event.metadata.disabled);
        assert_eq!(event.metadata.version, 0);
        assert_eq!(event.annotations.extra_keys[0].name, "target");

        let timing = model.entities().find(|e| e.name.as_str() == "a_metric").unwrap();
        assert_eq!(timing.metadata.send_in_pings, vec!["metrics", "custom", "custom-two"]);
        assert_eq!(timing.annotations.time_unit, Some(TimeUnit::Nanosecond));
        assert_eq!(timing.metadata.bugs, vec![Bug::Number(42)]);
    }

    #[test]
    fn expiry_disables() {
        let model = build(&[METRICS]);
        let timing = model.entities().find(|e| e.name.as_str() == "a_metric").unwrap();
        assert!(timing.metadata.disabled, "expired by date");
        let sizes = model.entities().find(|e| e.name.as_str() == "sizes").unwrap();
        assert!(sizes.metadata.disabled, "expired explicitly");
        let range = sizes.annotations.custom_range.unwrap();
        assert_eq!(range.range_min, 1);
        assert_eq!(range.histogram_type, HistogramType::Exponential);
    }

    #[test]
    fn pings_are_built_separately() {
        let pings = "\
$schema: moz://mozilla.org/schemas/glean/pings/1-0-0
search-usage:
  description: Search usage.
  include_client_id: true
  bugs: [https://bugzilla.mozilla.org/1]
  notification_emails: [a@example.com]
  reasons:
    startup: At startup.
    background: Going to background.
";
        let model = build(&[METRICS, pings]);
        assert_eq!(model.pings.len(), 1);
        let ping = &model.pings[0];
        assert!(ping.include_client_id);
        assert!(!ping.send_if_empty);
        let reasons: Vec<_> = ping.reasons.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(reasons, vec!["background", "startup"]);
        assert_eq!(model.categories.len(), 2);
    }

    #[test]
    fn unvalidated_input_is_a_defect() {
        let text = "$schema: moz://mozilla.org/schemas/glean/metrics/1-0-0\nbrowser:\n  clicks:\n    type: nope\n";
        let set = MergedDefinitionSet {
            documents: vec![parse_document(Path::new("x.yaml"), text).unwrap()],
        };
        let err = ModelBuilder::new(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())
            .build(&set)
            .unwrap_err();
        assert_eq!(err.subject, "browser.clicks");
    }
}
