//! # Field Table
//!
//! The definition schema as data. Each [`FieldSpec`] row says what a field
//! holds, when it is required and which metric types may carry it. The
//! validator walks these rows; adding a field means adding a row, not a
//! branch.

use crate::types::{HistogramType, Lifetime, MemoryUnit, MetricType, TimeUnit};

/// The value domain of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A non-empty string.
    Text,
    /// `true` or `false`.
    Boolean,
    /// A non-negative integer.
    Integer,
    /// A list of strings.
    TextList {
        /// Whether the list must have at least one element.
        non_empty: bool,
    },
    /// One of a fixed set of strings.
    Enum(&'static [&'static str]),
    /// `never`, `expired` or `YYYY-MM-DD`.
    Expiry,
    /// Non-empty list of bug numbers or URLs.
    Bugs,
    /// Non-empty list of e-mail addresses.
    Emails,
    /// Unique labels of a labeled metric.
    Labels,
    /// Non-empty, duplicate-free list of ping names.
    PingNames,
    /// Mapping of event extra key to `{description}`.
    ExtraKeys,
    /// Mapping of ping reason to description.
    Reasons,
}

impl FieldKind {
    /// Short description of the expected YAML shape, for type mismatches.
    pub fn expected(&self) -> &'static str {
        match self {
            Self::Text | Self::Enum(_) | Self::Expiry => "a string",
            Self::Boolean => "a boolean",
            Self::Integer => "a non-negative integer",
            Self::TextList { .. }
            | Self::Bugs
            | Self::Emails
            | Self::Labels
            | Self::PingNames => "a list",
            Self::ExtraKeys | Self::Reasons => "a mapping",
        }
    }
}

/// When a field must be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Never required.
    Optional,
    /// Required for every definition.
    Always,
    /// Required for definitions of these metric types.
    For(&'static [MetricType]),
}

/// Which definitions may carry a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Any definition.
    Any,
    /// Only definitions of these metric types.
    Only(&'static [MetricType]),
}

/// One row of the field table.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Field key in the definition body.
    pub name: &'static str,
    /// Value domain.
    pub kind: FieldKind,
    /// Presence rule.
    pub required: Requirement,
    /// Applicability rule.
    pub scope: Scope,
    /// One-line description, used in generated documentation.
    pub summary: &'static str,
}

impl FieldSpec {
    /// Whether the field is required for a definition of `metric_type`.
    ///
    /// Pings have no metric type; only `Always` applies to them.
    pub fn is_required(&self, metric_type: Option<MetricType>) -> bool {
        match self.required {
            Requirement::Optional => false,
            Requirement::Always => true,
            Requirement::For(types) => metric_type.is_some_and(|t| types.contains(&t)),
        }
    }

    /// Whether a definition of `metric_type` may carry the field.
    ///
    /// An unknown type permits every field; the type error is reported on
    /// its own.
    pub fn applies_to(&self, metric_type: Option<MetricType>) -> bool {
        match (self.scope, metric_type) {
            (Scope::Any, _) | (_, None) => true,
            (Scope::Only(types), Some(t)) => types.contains(&t),
        }
    }
}

const LABELED: &[MetricType] = &[
    MetricType::LabeledBoolean,
    MetricType::LabeledCounter,
    MetricType::LabeledString,
];
const TIMED: &[MetricType] = &[
    MetricType::Timespan,
    MetricType::TimingDistribution,
    MetricType::Datetime,
];
const CUSTOM: &[MetricType] = &[MetricType::CustomDistribution];

/// Fields of a metric definition, in checking order.
pub const METRIC_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "type",
        kind: FieldKind::Enum(MetricType::NAMES),
        required: Requirement::Always,
        scope: Scope::Any,
        summary: "The metric type.",
    },
    FieldSpec {
        name: "description",
        kind: FieldKind::Text,
        required: Requirement::Always,
        scope: Scope::Any,
        summary: "What the metric measures.",
    },
    FieldSpec {
        name: "bugs",
        kind: FieldKind::Bugs,
        required: Requirement::Always,
        scope: Scope::Any,
        summary: "Bugs where the metric was introduced or changed.",
    },
    FieldSpec {
        name: "data_reviews",
        kind: FieldKind::TextList { non_empty: false },
        required: Requirement::Always,
        scope: Scope::Any,
        summary: "Data review links.",
    },
    FieldSpec {
        name: "notification_emails",
        kind: FieldKind::Emails,
        required: Requirement::Always,
        scope: Scope::Any,
        summary: "Who to notify about the metric.",
    },
    FieldSpec {
        name: "expires",
        kind: FieldKind::Expiry,
        required: Requirement::Always,
        scope: Scope::Any,
        summary: "When the metric stops being collected.",
    },
    FieldSpec {
        name: "lifetime",
        kind: FieldKind::Enum(Lifetime::NAMES),
        required: Requirement::Optional,
        scope: Scope::Any,
        summary: "How long the value is kept.",
    },
    FieldSpec {
        name: "send_in_pings",
        kind: FieldKind::PingNames,
        required: Requirement::Optional,
        scope: Scope::Any,
        summary: "Pings the metric is sent in.",
    },
    FieldSpec {
        name: "disabled",
        kind: FieldKind::Boolean,
        required: Requirement::Optional,
        scope: Scope::Any,
        summary: "Whether collection is switched off.",
    },
    FieldSpec {
        name: "version",
        kind: FieldKind::Integer,
        required: Requirement::Optional,
        scope: Scope::Any,
        summary: "Definition version, bumped on semantic changes.",
    },
    FieldSpec {
        name: "labels",
        kind: FieldKind::Labels,
        required: Requirement::Optional,
        scope: Scope::Only(LABELED),
        summary: "Static labels of a labeled metric.",
    },
    FieldSpec {
        name: "time_unit",
        kind: FieldKind::Enum(TimeUnit::NAMES),
        required: Requirement::Optional,
        scope: Scope::Only(TIMED),
        summary: "Time resolution.",
    },
    FieldSpec {
        name: "memory_unit",
        kind: FieldKind::Enum(MemoryUnit::NAMES),
        required: Requirement::Optional,
        scope: Scope::Only(&[MetricType::MemoryDistribution]),
        summary: "Unit of memory samples.",
    },
    FieldSpec {
        name: "extra_keys",
        kind: FieldKind::ExtraKeys,
        required: Requirement::Optional,
        scope: Scope::Only(&[MetricType::Event]),
        summary: "Extra keys an event may record.",
    },
    FieldSpec {
        name: "range_min",
        kind: FieldKind::Integer,
        required: Requirement::Optional,
        scope: Scope::Only(CUSTOM),
        summary: "Lowest bucket boundary.",
    },
    FieldSpec {
        name: "range_max",
        kind: FieldKind::Integer,
        required: Requirement::For(CUSTOM),
        scope: Scope::Only(CUSTOM),
        summary: "Highest bucket boundary.",
    },
    FieldSpec {
        name: "bucket_count",
        kind: FieldKind::Integer,
        required: Requirement::For(CUSTOM),
        scope: Scope::Only(CUSTOM),
        summary: "Number of buckets.",
    },
    FieldSpec {
        name: "histogram_type",
        kind: FieldKind::Enum(HistogramType::NAMES),
        required: Requirement::For(CUSTOM),
        scope: Scope::Only(CUSTOM),
        summary: "Bucketing scheme.",
    },
    FieldSpec {
        name: "unit",
        kind: FieldKind::Text,
        required: Requirement::Optional,
        scope: Scope::Only(&[MetricType::Quantity]),
        summary: "Unit of the quantity.",
    },
    FieldSpec {
        name: "no_lint",
        kind: FieldKind::TextList { non_empty: false },
        required: Requirement::Optional,
        scope: Scope::Any,
        summary: "Lints to suppress for this metric.",
    },
];

/// Fields of a ping definition, in checking order.
pub const PING_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "description",
        kind: FieldKind::Text,
        required: Requirement::Always,
        scope: Scope::Any,
        summary: "What the ping is for.",
    },
    FieldSpec {
        name: "include_client_id",
        kind: FieldKind::Boolean,
        required: Requirement::Always,
        scope: Scope::Any,
        summary: "Whether the ping carries the client id.",
    },
    FieldSpec {
        name: "bugs",
        kind: FieldKind::Bugs,
        required: Requirement::Always,
        scope: Scope::Any,
        summary: "Bugs where the ping was introduced or changed.",
    },
    FieldSpec {
        name: "notification_emails",
        kind: FieldKind::Emails,
        required: Requirement::Always,
        scope: Scope::Any,
        summary: "Who to notify about the ping.",
    },
    FieldSpec {
        name: "data_reviews",
        kind: FieldKind::TextList { non_empty: false },
        required: Requirement::Optional,
        scope: Scope::Any,
        summary: "Data review links.",
    },
    FieldSpec {
        name: "send_if_empty",
        kind: FieldKind::Boolean,
        required: Requirement::Optional,
        scope: Scope::Any,
        summary: "Whether the ping is sent without any metric data.",
    },
    FieldSpec {
        name: "reasons",
        kind: FieldKind::Reasons,
        required: Requirement::Optional,
        scope: Scope::Any,
        summary: "Reasons the ping may be submitted for.",
    },
    FieldSpec {
        name: "no_lint",
        kind: FieldKind::TextList { non_empty: false },
        required: Requirement::Optional,
        scope: Scope::Any,
        summary: "Lints to suppress for this ping.",
    },
];

/// Look up a row by field name.
pub fn find(table: &'static [FieldSpec], name: &str) -> Option<&'static FieldSpec> {
    table.iter().find(|f| f.name == name)
}
