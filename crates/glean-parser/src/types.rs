//! # Definition Value Types
//!
//! Closed domains of the definition schema. Each enum exposes its accepted
//! spellings through a `NAMES` table so the field table and the validator's
//! error messages share one source of truth.

use chrono::NaiveDate;
use serde::Serialize;

/// Kind of a metric, from the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    Boolean,
    Counter,
    CustomDistribution,
    Datetime,
    Event,
    LabeledBoolean,
    LabeledCounter,
    LabeledString,
    MemoryDistribution,
    Quantity,
    String,
    StringList,
    Timespan,
    TimingDistribution,
    Uuid,
}

impl MetricType {
    /// Every metric type, in the order they are listed to users.
    pub const ALL: &'static [MetricType] = &[
        Self::Boolean,
        Self::Counter,
        Self::CustomDistribution,
        Self::Datetime,
        Self::Event,
        Self::LabeledBoolean,
        Self::LabeledCounter,
        Self::LabeledString,
        Self::MemoryDistribution,
        Self::Quantity,
        Self::String,
        Self::StringList,
        Self::Timespan,
        Self::TimingDistribution,
        Self::Uuid,
    ];

    /// Accepted spellings, aligned with [`Self::ALL`].
    pub const NAMES: &'static [&'static str] = &[
        "boolean",
        "counter",
        "custom_distribution",
        "datetime",
        "event",
        "labeled_boolean",
        "labeled_counter",
        "labeled_string",
        "memory_distribution",
        "quantity",
        "string",
        "string_list",
        "timespan",
        "timing_distribution",
        "uuid",
    ];

    /// The spelling used in definition documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Counter => "counter",
            Self::CustomDistribution => "custom_distribution",
            Self::Datetime => "datetime",
            Self::Event => "event",
            Self::LabeledBoolean => "labeled_boolean",
            Self::LabeledCounter => "labeled_counter",
            Self::LabeledString => "labeled_string",
            Self::MemoryDistribution => "memory_distribution",
            Self::Quantity => "quantity",
            Self::String => "string",
            Self::StringList => "string_list",
            Self::Timespan => "timespan",
            Self::TimingDistribution => "timing_distribution",
            Self::Uuid => "uuid",
        }
    }

    /// Look up a type by its document spelling.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s)
    }

    /// Whether the type is one of the `labeled_*` wrappers.
    pub fn is_labeled(&self) -> bool {
        matches!(
            self,
            Self::LabeledBoolean | Self::LabeledCounter | Self::LabeledString
        )
    }

    /// The ping a metric of this type is sent in when `send_in_pings` is not
    /// given.
    pub fn default_store(&self) -> &'static str {
        match self {
            Self::Event => "events",
            _ => "metrics",
        }
    }
}

impl std::fmt::Display for MetricType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How long a metric's value survives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifetime {
    /// Cleared every time the ping is sent.
    #[default]
    Ping,
    /// Kept for the lifetime of the user profile.
    User,
    /// Kept until the application restarts.
    Application,
}

impl Lifetime {
    /// Accepted spellings.
    pub const NAMES: &'static [&'static str] = &["ping", "user", "application"];

    /// Look up a lifetime by its document spelling.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ping" => Some(Self::Ping),
            "user" => Some(Self::User),
            "application" => Some(Self::Application),
            _ => None,
        }
    }

    /// The document spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::User => "user",
            Self::Application => "application",
        }
    }
}

/// Resolution of timespan, timing distribution and datetime metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Nanosecond,
    Microsecond,
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
}

impl TimeUnit {
    /// Accepted spellings.
    pub const NAMES: &'static [&'static str] = &[
        "nanosecond",
        "microsecond",
        "millisecond",
        "second",
        "minute",
        "hour",
        "day",
    ];

    /// Look up a unit by its document spelling.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "nanosecond" => Some(Self::Nanosecond),
            "microsecond" => Some(Self::Microsecond),
            "millisecond" => Some(Self::Millisecond),
            "second" => Some(Self::Second),
            "minute" => Some(Self::Minute),
            "hour" => Some(Self::Hour),
            "day" => Some(Self::Day),
            _ => None,
        }
    }

    /// The document spelling.
    pub fn as_str(&self) -> &'static str {
        Self::NAMES[*self as usize]
    }
}

/// Unit of memory distribution samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryUnit {
    Byte,
    Kilobyte,
    Megabyte,
    Gigabyte,
}

impl MemoryUnit {
    /// Accepted spellings.
    pub const NAMES: &'static [&'static str] = &["byte", "kilobyte", "megabyte", "gigabyte"];

    /// Look up a unit by its document spelling.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "byte" => Some(Self::Byte),
            "kilobyte" => Some(Self::Kilobyte),
            "megabyte" => Some(Self::Megabyte),
            "gigabyte" => Some(Self::Gigabyte),
            _ => None,
        }
    }

    /// The document spelling.
    pub fn as_str(&self) -> &'static str {
        Self::NAMES[*self as usize]
    }
}

/// Bucketing of a custom distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HistogramType {
    Linear,
    Exponential,
}

impl HistogramType {
    /// Accepted spellings.
    pub const NAMES: &'static [&'static str] = &["linear", "exponential"];

    /// Look up a histogram type by its document spelling.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "linear" => Some(Self::Linear),
            "exponential" => Some(Self::Exponential),
            _ => None,
        }
    }

    /// The document spelling.
    pub fn as_str(&self) -> &'static str {
        Self::NAMES[*self as usize]
    }
}

/// The `expires` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Expiry {
    /// Collected indefinitely.
    Never,
    /// Already switched off.
    Expired,
    /// Collected until the given date (exclusive).
    On(NaiveDate),
}

impl Expiry {
    /// Parse `never`, `expired` or an ISO `YYYY-MM-DD` date.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "never" => Some(Self::Never),
            "expired" => Some(Self::Expired),
            other => NaiveDate::parse_from_str(other, "%Y-%m-%d").ok().map(Self::On),
        }
    }

    /// Whether the metric is expired as of `build_date`.
    pub fn is_expired(&self, build_date: NaiveDate) -> bool {
        match self {
            Self::Never => false,
            Self::Expired => true,
            Self::On(date) => *date <= build_date,
        }
    }
}

impl std::fmt::Display for Expiry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Never => f.write_str("never"),
            Self::Expired => f.write_str("expired"),
            Self::On(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

/// An entry of the `bugs` list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Bug {
    /// A bare bug number, linted against.
    Number(u64),
    /// A bug tracker URL.
    Url(String),
}

impl std::fmt::Display for Bug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Url(u) => f.write_str(u),
        }
    }
}
