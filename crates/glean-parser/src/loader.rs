//! # Definition Loader
//!
//! Reads definition documents from disk and splits each into
//! [`DefinitionNode`]s tagged with their source line. Every file is parsed
//! independently; a malformed file does not stop the others from being read,
//! and all [`ParseError`]s come back together.
//!
//! The loader only checks shape as far as it needs to find definitions. A
//! category body that is not a mapping is kept as a [`MalformedEntry`] for
//! the validator to report, so structural problems surface as validation
//! errors alongside everything else.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use glean_core::SourceLocation;
use serde_yaml::Value;
use tracing::debug;

use crate::error::ParseError;
use crate::lines::KeyLineIndex;

/// `$schema` of a metrics document.
pub const METRICS_SCHEMA_ID: &str = "moz://mozilla.org/schemas/glean/metrics/1-0-0";

/// `$schema` of a pings document.
pub const PINGS_SCHEMA_ID: &str = "moz://mozilla.org/schemas/glean/pings/1-0-0";

/// Category that ping definitions are filed under.
pub const PINGS_CATEGORY: &str = "pings";

/// What a document defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// `category -> metric -> fields`.
    Metrics,
    /// `ping -> fields`.
    Pings,
}

/// One definition, with its body still untyped.
#[derive(Debug, Clone)]
pub struct DefinitionNode {
    /// Category key as written (`pings` for ping definitions).
    pub category: String,
    /// Metric or ping name as written.
    pub name: String,
    /// Definition body.
    pub body: Value,
    /// Line of the definition's name key.
    pub location: SourceLocation,
    /// Line of the category key.
    pub category_location: SourceLocation,
    /// Line of each field key in the body.
    pub field_lines: BTreeMap<String, usize>,
}

impl DefinitionNode {
    /// Location of `field`, falling back to the definition itself.
    pub fn field_location(&self, field: &str) -> SourceLocation {
        self.location.refine(self.field_lines.get(field).copied())
    }

    /// `category.name`, as used in diagnostics.
    pub fn subject(&self) -> String {
        format!("{}.{}", self.category, self.name)
    }
}

/// A key whose value has the wrong shape to hold definitions.
#[derive(Debug, Clone)]
pub struct MalformedEntry {
    /// Keys leading to the value, e.g. `["browser"]`.
    pub key_path: Vec<String>,
    /// What was expected there.
    pub expected: &'static str,
    /// YAML type that was found.
    pub found: &'static str,
    /// Where the key is.
    pub location: SourceLocation,
}

/// A top-level entry in declaration order.
#[derive(Debug, Clone)]
pub enum DocumentEntry {
    /// A well-shaped definition.
    Definition(DefinitionNode),
    /// Something that could not be split into definitions.
    Malformed(MalformedEntry),
}

/// The `$schema` header of a document.
#[derive(Debug, Clone)]
pub struct SchemaDeclaration {
    /// The value, if it is a string.
    pub value: Option<String>,
    /// Where it is declared.
    pub location: SourceLocation,
}

/// One parsed input file.
#[derive(Debug, Clone)]
pub struct DefinitionDocument {
    /// Path as given by the caller.
    pub path: PathBuf,
    /// The `$schema` header, if present.
    pub schema: Option<SchemaDeclaration>,
    /// Kind selected by the header (metrics when missing or unknown).
    pub kind: DocumentKind,
    /// Entries in declaration order.
    pub entries: Vec<DocumentEntry>,
}

impl DefinitionDocument {
    /// The well-shaped definitions, in declaration order.
    pub fn definitions(&self) -> impl Iterator<Item = &DefinitionNode> {
        self.entries.iter().filter_map(|e| match e {
            DocumentEntry::Definition(d) => Some(d),
            DocumentEntry::Malformed(_) => None,
        })
    }
}

/// Every document of one invocation, in the order they were given.
#[derive(Debug, Clone, Default)]
pub struct MergedDefinitionSet {
    /// Parsed documents.
    pub documents: Vec<DefinitionDocument>,
}

impl MergedDefinitionSet {
    /// All definitions across all documents, file order then declaration
    /// order.
    pub fn definitions(&self) -> impl Iterator<Item = (&DefinitionDocument, &DefinitionNode)> {
        self.documents
            .iter()
            .flat_map(|doc| doc.definitions().map(move |d| (doc, d)))
    }
}

/// Name of a YAML value's type, for diagnostics.
pub fn yaml_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "list",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

/// Render a mapping key as a string. Non-string scalar keys (`1:`, `true:`)
/// are rendered as YAML writes them.
fn key_string(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => "null".to_string(),
        other => yaml_type_name(other).to_string(),
    }
}

/// Parse one document from text.
///
/// # Errors
///
/// Returns [`ParseError`] if `text` is not well-formed YAML.
pub fn parse_document(path: &Path, text: &str) -> Result<DefinitionDocument, ParseError> {
    let root: Value = serde_yaml::from_str(text).map_err(|e| ParseError::from_yaml(path, &e))?;
    let index = KeyLineIndex::build(text);
    let file = SourceLocation::file(path);

    let mut doc = DefinitionDocument {
        path: path.to_path_buf(),
        schema: None,
        kind: DocumentKind::Metrics,
        entries: Vec::new(),
    };

    let mapping = match root {
        Value::Null => return Ok(doc),
        Value::Mapping(m) => m,
        other => {
            doc.entries.push(DocumentEntry::Malformed(MalformedEntry {
                key_path: Vec::new(),
                expected: "a mapping at the top level",
                found: yaml_type_name(&other),
                location: file.refine(Some(1)),
            }));
            return Ok(doc);
        }
    };

    if let Some(schema) = mapping.get("$schema") {
        let value = schema.as_str().map(str::to_string);
        doc.kind = match value.as_deref() {
            Some(PINGS_SCHEMA_ID) => DocumentKind::Pings,
            _ => DocumentKind::Metrics,
        };
        doc.schema = Some(SchemaDeclaration {
            value,
            location: file.refine(index.line_of(&["$schema"])),
        });
    }

    for (key, value) in mapping {
        let top = key_string(&key);
        if top == "$schema" {
            continue;
        }
        let top_location = file.refine(index.line_of(&[top.as_str()]));
        match doc.kind {
            DocumentKind::Pings => {
                doc.entries.push(definition_entry(
                    &index,
                    &top_location,
                    &[top.as_str()],
                    PINGS_CATEGORY,
                    top.clone(),
                    value,
                    &top_location,
                ));
            }
            DocumentKind::Metrics => {
                let metrics = match value {
                    Value::Mapping(metrics) => metrics,
                    other => {
                        doc.entries.push(DocumentEntry::Malformed(MalformedEntry {
                            key_path: vec![top],
                            expected: "a mapping of metric names to definitions",
                            found: yaml_type_name(&other),
                            location: top_location,
                        }));
                        continue;
                    }
                };
                for (metric_key, body) in metrics {
                    let name = key_string(&metric_key);
                    let location = file.refine(index.line_of(&[top.as_str(), name.as_str()]));
                    doc.entries.push(definition_entry(
                        &index,
                        &location,
                        &[top.as_str(), name.as_str()],
                        &top,
                        name.clone(),
                        body,
                        &top_location,
                    ));
                }
            }
        }
    }

    debug!(
        path = %path.display(),
        entries = doc.entries.len(),
        "parsed definition document"
    );
    Ok(doc)
}

fn definition_entry(
    index: &KeyLineIndex,
    location: &SourceLocation,
    key_path: &[&str],
    category: &str,
    name: String,
    body: Value,
    category_location: &SourceLocation,
) -> DocumentEntry {
    let mut field_lines = BTreeMap::new();
    if let Value::Mapping(fields) = &body {
        for field in fields.keys() {
            let field = key_string(field);
            let mut path = key_path.to_vec();
            path.push(field.as_str());
            if let Some(line) = index.line_of(&path) {
                field_lines.insert(field.clone(), line);
            }
        }
    }
    DocumentEntry::Definition(DefinitionNode {
        category: category.to_string(),
        name,
        body,
        location: location.clone(),
        category_location: category_location.clone(),
        field_lines,
    })
}

/// Read and parse every file in `paths`, in order.
///
/// # Errors
///
/// Returns every [`ParseError`] if any file could not be read or parsed.
pub fn load_documents<P: AsRef<Path>>(paths: &[P]) -> Result<MergedDefinitionSet, Vec<ParseError>> {
    let mut set = MergedDefinitionSet::default();
    let mut errors = Vec::new();

    for path in paths {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                errors.push(ParseError::io(path, &e));
                continue;
            }
        };
        match parse_document(path, &text) {
            Ok(doc) => set.documents.push(doc),
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(set)
    } else {
        Err(errors)
    }
}
