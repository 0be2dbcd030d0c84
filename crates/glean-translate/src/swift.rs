//! # Swift Emitter
//!
//! A single `Metrics.swift` extending the namespace enum with one nested
//! enum per category and a `Pings` enum for custom pings.

use std::fmt::Write;

use glean_core::camel_case;
use glean_parser::{Entity, MetricType, Model, Ping};

use crate::emitter::{render_error, Emitter, EmitterError, EmitterOptions, EmitterOutput};
use crate::util::{swift_doc, swift_string};

const FORMAT: &str = "swift";
const DEFAULT_NAMESPACE: &str = "GleanMetrics";
const DEFAULT_GLEAN_NAMESPACE: &str = "Glean";

/// Swift code for the iOS Glean SDK.
#[derive(Debug, Default, Clone, Copy)]
pub struct SwiftEmitter;

impl Emitter for SwiftEmitter {
    fn format(&self) -> &'static str {
        FORMAT
    }

    fn description(&self) -> &'static str {
        "Swift enums for the iOS Glean SDK"
    }

    fn owned_extensions(&self) -> &'static [&'static str] {
        &["swift"]
    }

    fn option_keys(&self) -> &'static [&'static str] {
        &["namespace", "glean_namespace"]
    }

    fn generate(&self, model: &Model, options: &EmitterOptions) -> Result<Vec<EmitterOutput>, EmitterError> {
        let namespace = options.get("namespace").map_or(DEFAULT_NAMESPACE, String::as_str);
        let glean = options
            .get("glean_namespace")
            .map_or(DEFAULT_GLEAN_NAMESPACE, String::as_str);
        let contents = render(model, namespace, glean).map_err(render_error(FORMAT))?;
        Ok(vec![EmitterOutput::text("Metrics.swift", contents)])
    }
}

fn swift_enum_case(value: &str) -> String {
    format!(".{}", camel_case(value))
}

fn swift_list(items: impl IntoIterator<Item = impl AsRef<str>>) -> String {
    let quoted: Vec<String> = items.into_iter().map(|s| swift_string(s.as_ref())).collect();
    format!("[{}]", quoted.join(", "))
}

fn metric_class(metric_type: MetricType) -> String {
    let name = metric_type.as_str();
    let base = name.strip_prefix("labeled_").unwrap_or(name);
    format!("{}MetricType", glean_core::pascal_case(base))
}

fn write_args(out: &mut String, args: &[(&str, String)], indent: &str) -> std::fmt::Result {
    for (i, (key, value)) in args.iter().enumerate() {
        let sep = if i + 1 < args.len() { "," } else { "" };
        writeln!(out, "{indent}{key}: {value}{sep}")?;
    }
    Ok(())
}

fn entity_args(entity: &Entity) -> Vec<(&'static str, String)> {
    let m = &entity.metadata;
    let a = &entity.annotations;
    let mut args = vec![
        ("category", swift_string(entity.category.as_str())),
        ("name", swift_string(entity.name.as_str())),
        ("sendInPings", swift_list(&m.send_in_pings)),
        ("lifetime", swift_enum_case(m.lifetime.as_str())),
        ("disabled", m.disabled.to_string()),
    ];
    if let Some(labels) = &a.labels {
        args.push(("labels", swift_list(labels.iter().map(|l| l.as_str()))));
    }
    if let Some(unit) = a.time_unit {
        args.push(("timeUnit", swift_enum_case(unit.as_str())));
    }
    if let Some(unit) = a.memory_unit {
        args.push(("memoryUnit", swift_enum_case(unit.as_str())));
    }
    if let Some(range) = a.custom_range {
        args.push(("rangeMin", range.range_min.to_string()));
        args.push(("rangeMax", range.range_max.to_string()));
        args.push(("bucketCount", range.bucket_count.to_string()));
        args.push(("histogramType", swift_enum_case(range.histogram_type.as_str())));
    }
    if entity.metric_type == MetricType::Event {
        args.push((
            "allowedExtraKeys",
            swift_list(a.extra_keys.iter().map(|k| k.name.as_str())),
        ));
    }
    args
}

fn render_entity(out: &mut String, entity: &Entity) -> std::fmt::Result {
    let class = metric_class(entity.metric_type);
    out.push_str(&swift_doc(&entity.metadata.description, "        "));
    if entity.metric_type.is_labeled() {
        writeln!(
            out,
            "        static let {} = try! LabeledMetricType<{class}>( // generated from {}",
            entity.name.camel(),
            entity.identifier()
        )?;
    } else if entity.metric_type == MetricType::Event && !entity.annotations.extra_keys.is_empty() {
        let keys = format!("{}Keys", entity.name.pascal());
        writeln!(out, "        enum {keys}: Int32, ExtraKeys {{")?;
        for (i, key) in entity.annotations.extra_keys.iter().enumerate() {
            writeln!(out, "            case {} = {i}", camel_case(&key.name))?;
        }
        writeln!(out)?;
        writeln!(out, "            public func index() -> Int32 {{")?;
        writeln!(out, "                return self.rawValue")?;
        writeln!(out, "            }}")?;
        writeln!(out, "        }}")?;
        writeln!(out)?;
        writeln!(
            out,
            "        static let {} = EventMetricType<{keys}>( // generated from {}",
            entity.name.camel(),
            entity.identifier()
        )?;
    } else if entity.metric_type == MetricType::Event {
        writeln!(
            out,
            "        static let {} = EventMetricType<NoExtraKeys>( // generated from {}",
            entity.name.camel(),
            entity.identifier()
        )?;
    } else {
        writeln!(
            out,
            "        static let {} = {class}( // generated from {}",
            entity.name.camel(),
            entity.identifier()
        )?;
    }
    write_args(out, &entity_args(entity), "            ")?;
    writeln!(out, "        )")
}

fn render_ping(out: &mut String, ping: &Ping) -> std::fmt::Result {
    out.push_str(&swift_doc(&ping.description, "        "));
    writeln!(
        out,
        "        static let {} = Ping( // generated from {}",
        ping.name.camel(),
        ping.name
    )?;
    let args = vec![
        ("name", swift_string(ping.name.as_str())),
        ("includeClientId", ping.include_client_id.to_string()),
        ("sendIfEmpty", ping.send_if_empty.to_string()),
        ("reasonCodes", swift_list(ping.reasons.iter().map(|r| r.name.as_str()))),
    ];
    write_args(out, &args, "            ")?;
    writeln!(out, "        )")
}

fn render(model: &Model, namespace: &str, glean: &str) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    writeln!(out, "// -*- mode: Swift -*-")?;
    writeln!(out)?;
    writeln!(out, "// AUTOGENERATED BY glean_parser. DO NOT EDIT.")?;
    writeln!(out)?;
    writeln!(out, "// swiftlint:disable superfluous_disable_command")?;
    writeln!(out, "// swiftlint:disable nesting")?;
    writeln!(out, "// swiftlint:disable line_length")?;
    writeln!(out, "// swiftlint:disable identifier_name")?;
    writeln!(out, "// swiftlint:disable force_try")?;
    writeln!(out)?;
    writeln!(out, "import {glean}")?;
    writeln!(out)?;
    writeln!(out, "extension {namespace} {{")?;

    let mut first = true;
    for category in &model.categories {
        if !first {
            writeln!(out)?;
        }
        first = false;
        writeln!(out, "    enum {} {{", category.name.pascal())?;
        for (i, entity) in category.entities.iter().enumerate() {
            if i > 0 {
                writeln!(out)?;
            }
            render_entity(&mut out, entity)?;
        }
        writeln!(out, "    }}")?;
    }

    if !model.pings.is_empty() {
        if !first {
            writeln!(out)?;
        }
        writeln!(out, "    enum Pings {{")?;
        for (i, ping) in model.pings.iter().enumerate() {
            if i > 0 {
                writeln!(out)?;
            }
            render_ping(&mut out, ping)?;
        }
        writeln!(out, "    }}")?;
    }

    writeln!(out, "}}")?;
    Ok(out)
}
