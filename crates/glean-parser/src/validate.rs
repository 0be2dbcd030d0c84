//! # Semantic Validator
//!
//! Checks a [`MergedDefinitionSet`] against the field table in
//! [`crate::fields`], the naming rules of [`glean_core::identity`] and the
//! global uniqueness of `(category, name)`, both as written and as the
//! emitters render them.
//!
//! ## Error Order
//!
//! Errors are reported in a fixed order so repeated runs print the same
//! diagnostics: documents in the order given, entries in declaration order,
//! fields in table order, and finally the cross-document uniqueness pass.
//! Nothing short-circuits; every problem in every file is reported.

use std::collections::{HashMap, HashSet};

use glean_core::{
    camel_case, pascal_case, CategoryName, IdentifierError, Label, MetricName, PingName, SourceLocation,
};
use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::error::{ErrorAccumulator, ValidationError, ValidationErrorKind as Kind};
use crate::fields::{FieldKind, FieldSpec, METRIC_FIELDS, PING_FIELDS};
use crate::lint::LintKind;
use crate::loader::{
    yaml_type_name, DefinitionDocument, DefinitionNode, DocumentEntry, DocumentKind,
    MergedDefinitionSet, METRICS_SCHEMA_ID, PINGS_SCHEMA_ID,
};
use crate::types::{Expiry, Lifetime, MetricType};

/// Most labels a labeled metric may declare.
pub const MAX_LABELS: usize = 16;

/// Most extra keys an event may declare.
pub const MAX_EXTRA_KEYS: usize = 10;

/// Validator switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatorOptions {
    /// Accept names reserved for the Glean SDK's own metrics and pings.
    pub allow_reserved: bool,
}

/// Table-driven validator. Pure: reads the set, returns errors.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    options: ValidatorOptions,
}

impl Validator {
    /// Create a validator with the given options.
    pub fn new(options: ValidatorOptions) -> Self {
        Self { options }
    }

    /// Validate every document in `set`.
    ///
    /// # Errors
    ///
    /// Returns every [`ValidationError`] found, in deterministic order.
    pub fn validate(&self, set: &MergedDefinitionSet) -> Result<(), Vec<ValidationError>> {
        let mut acc = ErrorAccumulator::default();

        for doc in &set.documents {
            self.check_document(&mut acc, doc);
        }
        check_uniqueness(&mut acc, set);

        debug!(
            documents = set.documents.len(),
            errors = acc.len(),
            "validated definition set"
        );
        acc.finish()
    }

    fn check_document(&self, acc: &mut ErrorAccumulator, doc: &DefinitionDocument) {
        let subject = doc.path.display().to_string();
        match &doc.schema {
            None => acc.push(
                ValidationError::new(
                    Kind::MissingField,
                    SourceLocation::file(&doc.path),
                    &subject,
                    format!("document must declare `$schema: {METRICS_SCHEMA_ID}` or `{PINGS_SCHEMA_ID}`"),
                )
                .with_field("$schema"),
            ),
            Some(decl) => match decl.value.as_deref() {
                None => acc.push(
                    ValidationError::new(Kind::TypeMismatch, decl.location.clone(), &subject, "expected a string")
                        .with_field("$schema"),
                ),
                Some(METRICS_SCHEMA_ID) | Some(PINGS_SCHEMA_ID) => {}
                Some(other) => acc.push(
                    ValidationError::new(
                        Kind::InvalidEnumValue,
                        decl.location.clone(),
                        &subject,
                        format!("'{other}' is not one of: {METRICS_SCHEMA_ID}, {PINGS_SCHEMA_ID}"),
                    )
                    .with_field("$schema"),
                ),
            },
        }

        let mut seen_categories = HashSet::new();
        for entry in &doc.entries {
            match entry {
                DocumentEntry::Malformed(m) => {
                    let subject = if m.key_path.is_empty() {
                        subject.clone()
                    } else {
                        m.key_path.join(".")
                    };
                    acc.push(ValidationError::new(
                        Kind::TypeMismatch,
                        m.location.clone(),
                        subject,
                        format!("expected {}, found {}", m.expected, m.found),
                    ));
                }
                DocumentEntry::Definition(node) => {
                    if doc.kind == DocumentKind::Metrics && seen_categories.insert(node.category.as_str()) {
                        self.check_category(acc, node);
                    }
                    self.check_definition(acc, doc.kind, node);
                }
            }
        }
    }

    fn check_category(&self, acc: &mut ErrorAccumulator, node: &DefinitionNode) {
        let result = CategoryName::new(node.category.as_str()).and_then(|c| {
            if c.is_reserved() && !self.options.allow_reserved {
                Err(IdentifierError::Reserved {
                    kind: "category",
                    value: node.category.clone(),
                })
            } else {
                Ok(c)
            }
        });
        if let Err(e) = result {
            acc.push(ValidationError::new(
                Kind::InvalidIdentifier,
                node.category_location.clone(),
                &node.category,
                e.to_string(),
            ));
        }
    }

    fn check_definition(&self, acc: &mut ErrorAccumulator, kind: DocumentKind, node: &DefinitionNode) {
        let subject = node.subject();

        let name_check = match kind {
            DocumentKind::Metrics => MetricName::new(node.name.as_str()).map(|_| ()),
            DocumentKind::Pings => PingName::new(node.name.as_str()).and_then(|p| {
                if p.is_reserved() && !self.options.allow_reserved {
                    Err(IdentifierError::Reserved {
                        kind: "ping",
                        value: node.name.clone(),
                    })
                } else {
                    Ok(())
                }
            }),
        };
        if let Err(e) = name_check {
            acc.push(ValidationError::new(
                Kind::InvalidIdentifier,
                node.location.clone(),
                &subject,
                e.to_string(),
            ));
        }

        let Value::Mapping(body) = &node.body else {
            acc.push(ValidationError::new(
                Kind::TypeMismatch,
                node.location.clone(),
                &subject,
                format!("expected a mapping of fields, found {}", yaml_type_name(&node.body)),
            ));
            return;
        };

        let table = match kind {
            DocumentKind::Metrics => METRIC_FIELDS,
            DocumentKind::Pings => PING_FIELDS,
        };

        for key in body.keys() {
            let known = key.as_str().is_some_and(|k| table.iter().any(|f| f.name == k));
            if !known {
                let name = key.as_str().map(str::to_string).unwrap_or_else(|| format!("{key:?}"));
                acc.push(
                    ValidationError::new(
                        Kind::UnknownField,
                        node.field_location(&name),
                        &subject,
                        "not a known field",
                    )
                    .with_field(name),
                );
            }
        }

        let metric_type = match kind {
            DocumentKind::Metrics => body.get("type").and_then(Value::as_str).and_then(MetricType::parse),
            DocumentKind::Pings => None,
        };

        let mut check = FieldCheck {
            acc,
            node,
            subject: &subject,
        };
        for spec in table {
            match body.get(spec.name) {
                None => {
                    if spec.is_required(metric_type) {
                        check.push(Kind::MissingField, spec.name, "required field is missing".to_string());
                    }
                }
                Some(value) => {
                    if spec.applies_to(metric_type) {
                        check.value(spec, value);
                    } else if let Some(t) = metric_type {
                        check.push(
                            Kind::CrossFieldConstraint,
                            spec.name,
                            format!("not allowed for metrics of type {t}"),
                        );
                    }
                }
            }
        }

        if metric_type.is_some() {
            check.metric_constraints(body, metric_type);
        }
    }
}

/// Per-definition checking context.
struct FieldCheck<'a> {
    acc: &'a mut ErrorAccumulator,
    node: &'a DefinitionNode,
    subject: &'a str,
}

impl FieldCheck<'_> {
    fn push(&mut self, kind: Kind, field: &str, message: String) {
        self.acc.push(
            ValidationError::new(kind, self.node.field_location(field), self.subject, message)
                .with_field(field),
        );
    }

    fn mismatch(&mut self, spec: &FieldSpec, value: &Value) {
        let message = format!("expected {}, found {}", spec.kind.expected(), yaml_type_name(value));
        self.push(Kind::TypeMismatch, spec.name, message);
    }

    fn value(&mut self, spec: &FieldSpec, value: &Value) {
        match spec.kind {
            FieldKind::Text => match value.as_str() {
                Some(s) if !s.trim().is_empty() => {}
                Some(_) => self.push(Kind::TypeMismatch, spec.name, "must not be empty".to_string()),
                None => self.mismatch(spec, value),
            },
            FieldKind::Boolean => {
                if !value.is_bool() {
                    self.mismatch(spec, value);
                }
            }
            FieldKind::Integer => {
                if value.as_u64().is_none() {
                    self.mismatch(spec, value);
                }
            }
            FieldKind::Enum(names) => match value.as_str() {
                Some(s) if names.contains(&s) => {}
                Some(s) => self.push(
                    Kind::InvalidEnumValue,
                    spec.name,
                    format!("'{s}' is not one of: {}", names.join(", ")),
                ),
                None => self.mismatch(spec, value),
            },
            FieldKind::Expiry => match value.as_str() {
                Some(s) if Expiry::parse(s).is_some() => {}
                Some(s) => self.push(
                    Kind::InvalidEnumValue,
                    spec.name,
                    format!("'{s}' is not `never`, `expired` or a YYYY-MM-DD date"),
                ),
                None => self.mismatch(spec, value),
            },
            FieldKind::TextList { non_empty } => {
                let Some(items) = self.strings(spec, value) else {
                    return;
                };
                if non_empty && items.is_empty() {
                    self.push(Kind::TypeMismatch, spec.name, "must not be empty".to_string());
                }
                if spec.name == "no_lint" {
                    for item in items {
                        if LintKind::parse(item).is_none() {
                            self.push(
                                Kind::InvalidEnumValue,
                                spec.name,
                                format!("'{item}' is not one of: {}", LintKind::NAMES.join(", ")),
                            );
                        }
                    }
                }
            }
            FieldKind::Bugs => self.bugs(spec, value),
            FieldKind::Emails => {
                let Some(items) = self.strings(spec, value) else {
                    return;
                };
                if items.is_empty() {
                    self.push(Kind::TypeMismatch, spec.name, "must not be empty".to_string());
                }
                for item in items {
                    if !is_email(item) {
                        self.push(
                            Kind::InvalidEnumValue,
                            spec.name,
                            format!("'{item}' is not an e-mail address"),
                        );
                    }
                }
            }
            FieldKind::Labels => {
                let Some(items) = self.strings(spec, value) else {
                    return;
                };
                if items.len() > MAX_LABELS {
                    self.push(
                        Kind::CrossFieldConstraint,
                        spec.name,
                        format!("{} labels given, at most {MAX_LABELS} are allowed", items.len()),
                    );
                }
                for item in &items {
                    if let Err(e) = Label::new(*item) {
                        self.push(Kind::InvalidIdentifier, spec.name, e.to_string());
                    }
                }
                self.no_duplicates(spec, &items);
            }
            FieldKind::PingNames => {
                let Some(items) = self.strings(spec, value) else {
                    return;
                };
                if items.is_empty() {
                    self.push(Kind::TypeMismatch, spec.name, "must not be empty".to_string());
                }
                for item in &items {
                    if *item == "default" {
                        continue;
                    }
                    if let Err(e) = PingName::new(*item) {
                        self.push(Kind::InvalidIdentifier, spec.name, e.to_string());
                    }
                }
                self.no_duplicates(spec, &items);
            }
            FieldKind::ExtraKeys => {
                let Some(map) = value.as_mapping() else {
                    self.mismatch(spec, value);
                    return;
                };
                if map.len() > MAX_EXTRA_KEYS {
                    self.push(
                        Kind::CrossFieldConstraint,
                        spec.name,
                        format!("{} extra keys given, at most {MAX_EXTRA_KEYS} are allowed", map.len()),
                    );
                }
                for (key, extra) in map {
                    let Some(key) = self.snake_key(spec, key) else {
                        continue;
                    };
                    let description = extra
                        .as_mapping()
                        .and_then(|m| m.get("description"))
                        .and_then(Value::as_str);
                    if description.is_none() {
                        self.push(
                            Kind::MissingField,
                            spec.name,
                            format!("extra key '{key}' needs a `description` string"),
                        );
                    }
                }
            }
            FieldKind::Reasons => {
                let Some(map) = value.as_mapping() else {
                    self.mismatch(spec, value);
                    return;
                };
                for (key, description) in map {
                    let Some(key) = self.snake_key(spec, key) else {
                        continue;
                    };
                    if description.as_str().is_none() {
                        self.push(
                            Kind::TypeMismatch,
                            spec.name,
                            format!("reason '{key}' must be described by a string"),
                        );
                    }
                }
            }
        }
    }

    /// The items of a list of strings, or `None` after reporting a mismatch.
    fn strings<'v>(&mut self, spec: &FieldSpec, value: &'v Value) -> Option<Vec<&'v str>> {
        let Some(seq) = value.as_sequence() else {
            self.mismatch(spec, value);
            return None;
        };
        let mut items = Vec::with_capacity(seq.len());
        for item in seq {
            match item.as_str() {
                Some(s) => items.push(s),
                None => {
                    self.push(
                        Kind::TypeMismatch,
                        spec.name,
                        format!("list items must be strings, found {}", yaml_type_name(item)),
                    );
                    return None;
                }
            }
        }
        Some(items)
    }

    fn snake_key<'v>(&mut self, spec: &FieldSpec, key: &'v Value) -> Option<&'v str> {
        let Some(key) = key.as_str() else {
            self.push(
                Kind::TypeMismatch,
                spec.name,
                format!("keys must be strings, found {}", yaml_type_name(key)),
            );
            return None;
        };
        if let Err(e) = MetricName::new(key) {
            self.push(Kind::InvalidIdentifier, spec.name, e.to_string());
        }
        Some(key)
    }

    fn no_duplicates(&mut self, spec: &FieldSpec, items: &[&str]) {
        let mut seen = HashSet::new();
        for item in items {
            if !seen.insert(*item) {
                self.push(
                    Kind::CrossFieldConstraint,
                    spec.name,
                    format!("'{item}' is listed more than once"),
                );
            }
        }
    }

    fn bugs(&mut self, spec: &FieldSpec, value: &Value) {
        let Some(seq) = value.as_sequence() else {
            self.mismatch(spec, value);
            return;
        };
        if seq.is_empty() {
            self.push(Kind::TypeMismatch, spec.name, "must not be empty".to_string());
        }
        for bug in seq {
            match bug {
                Value::Number(n) if n.as_u64().is_some() => {}
                Value::String(s) if is_http_url(s) => {}
                Value::String(s) => self.push(
                    Kind::InvalidEnumValue,
                    spec.name,
                    format!("'{s}' is neither a bug number nor an http(s) URL"),
                ),
                other => self.push(
                    Kind::TypeMismatch,
                    spec.name,
                    format!("bugs must be numbers or URLs, found {}", yaml_type_name(other)),
                ),
            }
        }
    }

    fn metric_constraints(&mut self, body: &Mapping, metric_type: Option<MetricType>) {
        if metric_type == Some(MetricType::Event) {
            if let Some(lifetime) = body.get("lifetime").and_then(Value::as_str) {
                if Lifetime::parse(lifetime).is_some_and(|l| l != Lifetime::Ping) {
                    self.push(
                        Kind::CrossFieldConstraint,
                        "lifetime",
                        format!("event metrics must have lifetime `ping`, not `{lifetime}`"),
                    );
                }
            }
        }

        if metric_type == Some(MetricType::CustomDistribution) {
            let min = body.get("range_min").and_then(Value::as_u64).unwrap_or(1);
            if let Some(max) = body.get("range_max").and_then(Value::as_u64) {
                if min >= max {
                    self.push(
                        Kind::CrossFieldConstraint,
                        "range_max",
                        format!("range_max ({max}) must be greater than range_min ({min})"),
                    );
                }
            }
        }
    }
}

fn is_http_url(s: &str) -> bool {
    url::Url::parse(s).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
}

fn is_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !s.contains(char::is_whitespace)
        }
        None => false,
    }
}

fn check_uniqueness(acc: &mut ErrorAccumulator, set: &MergedDefinitionSet) {
    let mut first_seen: HashMap<(&str, &str), &SourceLocation> = HashMap::new();
    // Emitters name files and types after these renderings, so two spellings
    // that render alike are as much a clash as two identical ones.
    let mut categories: HashMap<String, (&str, &SourceLocation)> = HashMap::new();
    let mut clashing_categories: HashSet<&str> = HashSet::new();
    let mut rendered: HashMap<(DocumentKind, String, String), &DefinitionNode> = HashMap::new();

    for (doc, node) in set.definitions() {
        let key = (node.category.as_str(), node.name.as_str());
        if let Some(first) = first_seen.get(&key) {
            acc.push(
                ValidationError::new(
                    Kind::DuplicateIdentifier,
                    node.location.clone(),
                    node.subject(),
                    format!("already defined at {first}"),
                )
                .with_related((*first).clone()),
            );
            continue;
        }
        first_seen.insert(key, &node.location);

        let category = pascal_case(&node.category);
        if doc.kind == DocumentKind::Metrics {
            if let Some((first, location)) = categories.get(&category) {
                if *first != node.category {
                    if clashing_categories.insert(node.category.as_str()) {
                        acc.push(
                            ValidationError::new(
                                Kind::DuplicateIdentifier,
                                node.category_location.clone(),
                                &node.category,
                                format!("category renders as `{category}`, the same as `{first}` defined at {location}"),
                            )
                            .with_related((*location).clone()),
                        );
                    }
                    continue;
                }
            } else {
                categories.insert(category.clone(), (node.category.as_str(), &node.category_location));
            }
        }

        let name = camel_case(&node.name);
        match rendered.get(&(doc.kind, category.clone(), name.clone())) {
            Some(first) => acc.push(
                ValidationError::new(
                    Kind::DuplicateIdentifier,
                    node.location.clone(),
                    node.subject(),
                    format!(
                        "name renders as `{name}`, the same as `{}` defined at {}",
                        first.subject(),
                        first.location
                    ),
                )
                .with_related(first.location.clone()),
            ),
            None => {
                rendered.insert((doc.kind, category, name), node);
            }
        }
    }
}
