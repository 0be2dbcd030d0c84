//! # Kotlin Emitter
//!
//! One `<Category>.kt` per category, each an `internal object` holding a
//! lazily constructed metric per entity, plus `Pings.kt` when custom pings
//! are defined.
//!
//! Options: `namespace` (package of the generated objects) and
//! `glean_namespace` (package of the Glean SDK).

use std::collections::BTreeSet;
use std::fmt::Write;

use glean_core::pascal_case;
use glean_parser::{Category, Entity, MetricType, Model, Ping};

use crate::emitter::{render_error, Emitter, EmitterError, EmitterOptions, EmitterOutput};
use crate::util::{kdoc, kotlin_string};

const FORMAT: &str = "kotlin";
const DEFAULT_NAMESPACE: &str = "GleanMetrics";
const DEFAULT_GLEAN_NAMESPACE: &str = "mozilla.components.service.glean";

const HEADER: &str = "/*
 * AUTOGENERATED BY glean_parser. DO NOT EDIT.
 */

@file:Suppress(\"PackageNaming\", \"MaxLineLength\")
";

/// Kotlin code for the Android Glean SDK.
#[derive(Debug, Default, Clone, Copy)]
pub struct KotlinEmitter;

impl Emitter for KotlinEmitter {
    fn format(&self) -> &'static str {
        FORMAT
    }

    fn description(&self) -> &'static str {
        "Kotlin objects for the Android Glean SDK"
    }

    fn owned_extensions(&self) -> &'static [&'static str] {
        &["kt"]
    }

    fn option_keys(&self) -> &'static [&'static str] {
        &["namespace", "glean_namespace"]
    }

    fn generate(&self, model: &Model, options: &EmitterOptions) -> Result<Vec<EmitterOutput>, EmitterError> {
        let ns = Namespaces {
            package: options.get("namespace").map_or(DEFAULT_NAMESPACE, String::as_str),
            glean: options
                .get("glean_namespace")
                .map_or(DEFAULT_GLEAN_NAMESPACE, String::as_str),
        };

        let mut outputs = Vec::with_capacity(model.categories.len() + 1);
        for category in &model.categories {
            let contents = render_category(&ns, category).map_err(render_error(FORMAT))?;
            outputs.push(EmitterOutput::text(format!("{}.kt", category.name.pascal()), contents));
        }
        if !model.pings.is_empty() {
            let contents = render_pings(&ns, &model.pings).map_err(render_error(FORMAT))?;
            outputs.push(EmitterOutput::text("Pings.kt", contents));
        }
        Ok(outputs)
    }
}

struct Namespaces<'a> {
    package: &'a str,
    glean: &'a str,
}

fn metric_class(metric_type: MetricType) -> String {
    let name = metric_type.as_str();
    let base = name.strip_prefix("labeled_").unwrap_or(name);
    format!("{}MetricType", pascal_case(base))
}

fn declared_type(entity: &Entity) -> String {
    let class = metric_class(entity.metric_type);
    match entity.metric_type {
        t if t.is_labeled() => format!("LabeledMetricType<{class}>"),
        MetricType::Event => format!("EventMetricType<{}>", extra_keys_type(entity)),
        _ => class,
    }
}

fn extra_keys_type(entity: &Entity) -> String {
    if entity.annotations.extra_keys.is_empty() {
        "NoExtraKeys".to_string()
    } else {
        format!("{}Keys", entity.name.pascal())
    }
}

fn imports(ns: &Namespaces<'_>, category: &Category) -> BTreeSet<String> {
    let mut imports = BTreeSet::new();
    imports.insert(format!("{}.private.Lifetime", ns.glean));
    for entity in &category.entities {
        imports.insert(format!("{}.private.{}", ns.glean, metric_class(entity.metric_type)));
        let a = &entity.annotations;
        if entity.metric_type.is_labeled() {
            imports.insert(format!("{}.private.LabeledMetricType", ns.glean));
        }
        if entity.metric_type == MetricType::Event && a.extra_keys.is_empty() {
            imports.insert(format!("{}.private.NoExtraKeys", ns.glean));
        }
        if a.time_unit.is_some() {
            imports.insert(format!("{}.private.TimeUnit", ns.glean));
        }
        if a.memory_unit.is_some() {
            imports.insert(format!("{}.private.MemoryUnit", ns.glean));
        }
        if a.custom_range.is_some() {
            imports.insert(format!("{}.private.HistogramType", ns.glean));
        }
    }
    imports
}

/// Constructor arguments shared by every metric type.
fn common_args(entity: &Entity) -> Vec<(&'static str, String)> {
    let pings: Vec<String> = entity.metadata.send_in_pings.iter().map(|p| kotlin_string(p)).collect();
    vec![
        ("disabled", entity.metadata.disabled.to_string()),
        ("category", kotlin_string(entity.category.as_str())),
        ("lifetime", format!("Lifetime.{}", pascal_case(entity.metadata.lifetime.as_str()))),
        ("name", kotlin_string(entity.name.as_str())),
        ("sendInPings", format!("listOf({})", pings.join(", "))),
    ]
}

fn type_args(entity: &Entity) -> Vec<(&'static str, String)> {
    let a = &entity.annotations;
    let mut args = Vec::new();
    if let Some(unit) = a.time_unit {
        args.push(("timeUnit", format!("TimeUnit.{}", pascal_case(unit.as_str()))));
    }
    if let Some(unit) = a.memory_unit {
        args.push(("memoryUnit", format!("MemoryUnit.{}", pascal_case(unit.as_str()))));
    }
    if let Some(range) = a.custom_range {
        args.push(("rangeMin", format!("{}L", range.range_min)));
        args.push(("rangeMax", format!("{}L", range.range_max)));
        args.push(("bucketCount", range.bucket_count.to_string()));
        args.push((
            "histogramType",
            format!("HistogramType.{}", pascal_case(range.histogram_type.as_str())),
        ));
    }
    if entity.metric_type == MetricType::Event {
        let keys: Vec<String> = a.extra_keys.iter().map(|k| kotlin_string(&k.name)).collect();
        args.push(("allowedExtraKeys", format!("listOf({})", keys.join(", "))));
    }
    args
}

fn write_call(out: &mut String, class: &str, args: &[(&str, String)], indent: &str) -> std::fmt::Result {
    writeln!(out, "{class}(")?;
    for (i, (key, value)) in args.iter().enumerate() {
        let sep = if i + 1 < args.len() { "," } else { "" };
        writeln!(out, "{indent}    {key} = {value}{sep}")?;
    }
    write!(out, "{indent})")
}

fn render_category(ns: &Namespaces<'_>, category: &Category) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    out.push_str(HEADER);
    writeln!(out, "package {}", ns.package)?;
    writeln!(out)?;
    for import in imports(ns, category) {
        writeln!(out, "import {import}")?;
    }
    writeln!(out)?;
    writeln!(out, "internal object {} {{", category.name.pascal())?;

    for (i, entity) in category.entities.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        if entity.metric_type == MetricType::Event && !entity.annotations.extra_keys.is_empty() {
            writeln!(out, "    @Suppress(\"EnumNaming\")")?;
            writeln!(out, "    enum class {} {{", extra_keys_type(entity))?;
            let keys: Vec<&str> = entity.annotations.extra_keys.iter().map(|k| k.name.as_str()).collect();
            writeln!(out, "        {}", keys.join(", "))?;
            writeln!(out, "    }}")?;
            writeln!(out)?;
        }

        out.push_str(&kdoc(&entity.metadata.description, "    "));
        writeln!(
            out,
            "    val {}: {} by lazy {{ // generated from {}",
            entity.name.camel(),
            declared_type(entity),
            entity.identifier()
        )?;
        write!(out, "        ")?;

        let mut args = common_args(entity);
        if entity.metric_type.is_labeled() {
            let mut sub = String::new();
            write_call(&mut sub, &metric_class(entity.metric_type), &common_args(entity), "            ")?;
            args.push(("subMetric", sub));
            let labels = match &entity.annotations.labels {
                Some(labels) => {
                    let quoted: Vec<String> = labels.iter().map(|l| kotlin_string(l.as_str())).collect();
                    format!("setOf({})", quoted.join(", "))
                }
                None => "null".to_string(),
            };
            args.push(("labels", labels));
            write_call(&mut out, "LabeledMetricType", &args, "        ")?;
        } else {
            args.extend(type_args(entity));
            write_call(&mut out, &metric_class(entity.metric_type), &args, "        ")?;
        }
        writeln!(out)?;
        writeln!(out, "    }}")?;
    }

    writeln!(out, "}}")?;
    Ok(out)
}

fn render_pings(ns: &Namespaces<'_>, pings: &[Ping]) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    out.push_str(HEADER);
    writeln!(out, "package {}", ns.package)?;
    writeln!(out)?;
    writeln!(out, "import {}.private.PingType", ns.glean)?;
    writeln!(out)?;
    writeln!(out, "internal object Pings {{")?;
    for (i, ping) in pings.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        out.push_str(&kdoc(&ping.description, "    "));
        writeln!(out, "    val {}: PingType by lazy {{ // generated from {}", ping.name.camel(), ping.name)?;
        write!(out, "        ")?;
        let reasons: Vec<String> = ping.reasons.iter().map(|r| kotlin_string(&r.name)).collect();
        let args = vec![
            ("name", kotlin_string(ping.name.as_str())),
            ("includeClientId", ping.include_client_id.to_string()),
            ("sendIfEmpty", ping.send_if_empty.to_string()),
            ("reasonCodes", format!("listOf({})", reasons.join(", "))),
        ];
        write_call(&mut out, "PingType", &args, "        ")?;
        writeln!(out)?;
        writeln!(out, "    }}")?;
    }
    writeln!(out, "}}")?;
    Ok(out)
}
