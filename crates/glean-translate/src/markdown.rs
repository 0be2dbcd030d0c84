//! # Markdown Emitter
//!
//! Generates `metrics.md`, a reference of every ping and the metrics sent
//! in it. Pings are the union of custom pings and every ping named in a
//! `send_in_pings` list, sorted by name.
//!
//! Option: `project_title`, the name used in the introduction.

use std::collections::BTreeSet;
use std::fmt::Write;

use glean_parser::{Entity, MetricType, Model, Ping};

use crate::emitter::{render_error, Emitter, EmitterError, EmitterOptions, EmitterOutput};
use crate::util::table_cell;

const FORMAT: &str = "markdown";
const DEFAULT_PROJECT_TITLE: &str = "this project";
const BOOK: &str = "https://mozilla.github.io/glean/book";

/// Markdown documentation of pings and metrics.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownEmitter;

impl Emitter for MarkdownEmitter {
    fn format(&self) -> &'static str {
        FORMAT
    }

    fn description(&self) -> &'static str {
        "Markdown reference of pings and their metrics"
    }

    fn owned_extensions(&self) -> &'static [&'static str] {
        &["md"]
    }

    fn option_keys(&self) -> &'static [&'static str] {
        &["project_title"]
    }

    fn generate(&self, model: &Model, options: &EmitterOptions) -> Result<Vec<EmitterOutput>, EmitterError> {
        let title = options
            .get("project_title")
            .map_or(DEFAULT_PROJECT_TITLE, String::as_str);
        let contents = render(model, title).map_err(render_error(FORMAT))?;
        Ok(vec![EmitterOutput::text("metrics.md", contents)])
    }
}

fn ping_names(model: &Model) -> BTreeSet<&str> {
    let mut names: BTreeSet<&str> = model.pings.iter().map(|p| p.name.as_str()).collect();
    for entity in model.entities() {
        names.extend(entity.metadata.send_in_pings.iter().map(String::as_str));
    }
    names
}

fn type_link(metric_type: MetricType) -> String {
    let page = match metric_type {
        MetricType::LabeledBoolean => "labeled_booleans",
        MetricType::LabeledCounter => "labeled_counters",
        MetricType::LabeledString => "labeled_strings",
        other => other.as_str(),
    };
    format!("[{}]({BOOK}/user/metrics/{page}.html)", metric_type.as_str())
}

fn extras(entity: &Entity) -> String {
    let a = &entity.annotations;
    let mut items: Vec<String> = Vec::new();
    if let Some(labels) = &a.labels {
        items.extend(labels.iter().map(|l| format!("<li>{l}</li>")));
    }
    items.extend(
        a.extra_keys
            .iter()
            .map(|k| format!("<li>{}: {}</li>", k.name, table_cell(&k.description))),
    );
    if items.is_empty() {
        String::new()
    } else {
        format!("<ul>{}</ul>", items.concat())
    }
}

fn write_ping_header(out: &mut String, name: &str, ping: Option<&Ping>) -> std::fmt::Result {
    writeln!(out, "## {name}")?;
    writeln!(out)?;
    match ping {
        Some(ping) => {
            writeln!(out, "{}", ping.description.trim())?;
            writeln!(out)?;
            if ping.include_client_id {
                writeln!(
                    out,
                    "This ping includes the [client id]({BOOK}/user/pings/index.html#the-client_info-section)."
                )?;
                writeln!(out)?;
            }
            if ping.send_if_empty {
                writeln!(out, "This ping is sent even if it contains no metric data.")?;
                writeln!(out)?;
            }
            if !ping.reasons.is_empty() {
                writeln!(out, "**Reasons this ping may be sent:**")?;
                writeln!(out)?;
                for reason in &ping.reasons {
                    writeln!(out, "- `{}`: {}", reason.name, reason.description.trim())?;
                }
                writeln!(out)?;
            }
        }
        None => {
            writeln!(out, "This is a built-in ping that is assembled out of the box by the Glean SDK.")?;
            writeln!(out)?;
            writeln!(
                out,
                "See the Glean SDK documentation for the [`{name}` ping]({BOOK}/user/pings/{name}.html)."
            )?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn render(model: &Model, title: &str) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    writeln!(out, "<!-- AUTOGENERATED BY glean_parser. DO NOT EDIT. -->")?;
    writeln!(out)?;
    writeln!(out, "# Metrics")?;
    writeln!(out)?;
    writeln!(
        out,
        "This document enumerates the metrics collected by {title} using the [Glean SDK]({BOOK}/index.html)."
    )?;
    writeln!(out)?;

    let names = ping_names(model);
    if names.is_empty() {
        writeln!(out, "This project does not define any metrics or pings.")?;
        return Ok(out);
    }

    writeln!(out, "# Pings")?;
    writeln!(out)?;
    for name in &names {
        writeln!(out, "- [{name}](#{name})")?;
    }

    for name in &names {
        writeln!(out)?;
        let ping = model.pings.iter().find(|p| p.name.as_str() == *name);
        write_ping_header(&mut out, name, ping)?;

        let entities: Vec<&Entity> = model
            .entities()
            .filter(|e| e.metadata.send_in_pings.iter().any(|p| p == name))
            .collect();
        if entities.is_empty() {
            writeln!(out, "This ping contains no metrics.")?;
            continue;
        }

        writeln!(out, "The following metrics are added to the ping:")?;
        writeln!(out)?;
        writeln!(out, "| Name | Type | Description | Data reviews | Extras | Expiration |")?;
        writeln!(out, "| --- | --- | --- | --- | --- | --- |")?;
        for entity in entities {
            let reviews: Vec<String> = entity
                .metadata
                .data_reviews
                .iter()
                .enumerate()
                .map(|(i, url)| format!("[{}]({url})", i + 1))
                .collect();
            writeln!(
                out,
                "| {} | {} | {} | {} | {} | {} |",
                entity.identifier(),
                type_link(entity.metric_type),
                table_cell(&entity.metadata.description),
                reviews.join(", "),
                extras(entity),
                entity.metadata.expires,
            )?;
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_model;

    fn render_sample(options: &EmitterOptions) -> String {
        let outputs = MarkdownEmitter.generate(&sample_model(), options).unwrap();
        assert_eq!(outputs[0].path.to_str(), Some("metrics.md"));
        String::from_utf8(outputs[0].contents.clone()).unwrap()
    }

    #[test]
    fn lists_pings_in_order() {
        let md = render_sample(&EmitterOptions::new());
        assert!(
            md.contains("# Pings\n\n- [events](#events)\n- [metrics](#metrics)\n- [search-usage](#search-usage)\n"),
            "{md}"
        );
    }

    #[test]
    fn metrics_grouped_under_their_ping() {
        let md = render_sample(&EmitterOptions::new());
        let metrics_section = md.split("## metrics").nth(1).unwrap();
        let metrics_section = metrics_section.split("## search-usage").next().unwrap();
        assert!(metrics_section.contains("| browser.engagement.click_count |"), "{md}");
        assert!(metrics_section.contains("| browser.engagement.page_load |"), "{md}");
        assert!(!metrics_section.contains("search.by_engine"), "{md}");

        let search = md.split("## search-usage").nth(1).unwrap();
        assert!(search.contains("- `startup`: Sent at startup."), "{md}");
        assert!(search.contains("<ul><li>bing</li><li>google</li></ul>"), "{md}");
    }

    #[test]
    fn description_cells_are_escaped() {
        let md = render_sample(&EmitterOptions::new());
        assert!(md.contains("A search was performed.<br>Includes the \\| engine used."), "{md}");
    }

    #[test]
    fn project_title_option() {
        let mut options = EmitterOptions::new();
        options.insert("project_title".into(), "Firefox".into());
        let md = render_sample(&options);
        assert!(md.contains("collected by Firefox using"), "{md}");
    }

    #[test]
    fn empty_model() {
        let outputs = MarkdownEmitter.generate(&Model::default(), &EmitterOptions::new()).unwrap();
        let md = String::from_utf8(outputs[0].contents.clone()).unwrap();
        assert!(md.ends_with("This project does not define any metrics or pings.\n"));
    }
}
