//! # Key Line Index
//!
//! `serde_yaml` values carry no positions, so line numbers for definitions
//! and fields are recovered from the source text. The index records the
//! first line of every block-style mapping key under its full key path, e.g.
//! `["browser", "click_count", "lifetime"]`.
//!
//! Only block mappings are indexed. Keys inside sequences, flow collections
//! and block scalars (`|`, `>`) are skipped; lookups for them return `None`
//! and callers fall back to the enclosing definition's line.

use std::collections::HashMap;

/// Maps key paths to 1-based line numbers.
#[derive(Debug, Default, Clone)]
pub struct KeyLineIndex {
    lines: HashMap<Vec<String>, usize>,
}

impl KeyLineIndex {
    /// Index every block mapping key in `text`.
    pub fn build(text: &str) -> Self {
        let mut lines = HashMap::new();
        let mut stack: Vec<(usize, Vec<String>)> = Vec::new();
        let mut block_scalar_indent: Option<usize> = None;

        for (i, raw) in text.lines().enumerate() {
            let trimmed = raw.trim_start();
            let indent = raw.len() - trimmed.len();

            if let Some(scalar_indent) = block_scalar_indent {
                if trimmed.is_empty() || indent > scalar_indent {
                    continue;
                }
                block_scalar_indent = None;
            }

            if trimmed.is_empty()
                || trimmed.starts_with('#')
                || trimmed.starts_with('-')
                || trimmed.starts_with("...")
            {
                continue;
            }

            let Some((key, rest)) = split_key(trimmed) else {
                continue;
            };

            while stack.last().is_some_and(|(level, _)| *level >= indent) {
                stack.pop();
            }
            let mut path = stack.last().map(|(_, p)| p.clone()).unwrap_or_default();
            path.push(key);
            lines.entry(path.clone()).or_insert(i + 1);

            let rest = rest.trim_start();
            if rest.starts_with('|') || rest.starts_with('>') {
                block_scalar_indent = Some(indent);
            }
            stack.push((indent, path));
        }

        Self { lines }
    }

    /// The line of the key at `path`, if it was indexed.
    pub fn line_of(&self, path: &[&str]) -> Option<usize> {
        let key: Vec<String> = path.iter().map(|s| s.to_string()).collect();
        self.lines.get(&key).copied()
    }
}

/// Split `key: rest` into the unquoted key and the remainder after the colon.
fn split_key(line: &str) -> Option<(String, &str)> {
    let first = line.chars().next()?;
    if first == '"' || first == '\'' {
        let close = line[1..].find(first)? + 1;
        let after = line[close + 1..].trim_start();
        let rest = after.strip_prefix(':')?;
        if !(rest.is_empty() || rest.starts_with(char::is_whitespace)) {
            return None;
        }
        return Some((line[1..close].to_string(), rest));
    }
    if first == '{' || first == '[' {
        return None;
    }

    let bytes = line.as_bytes();
    for (pos, b) in bytes.iter().enumerate() {
        match b {
            b'#' if pos > 0 && bytes[pos - 1].is_ascii_whitespace() => return None,
            b':' => {
                let rest = &line[pos + 1..];
                if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                    return Some((line[..pos].trim_end().to_string(), rest));
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"---
$schema: moz://mozilla.org/schemas/glean/metrics/1-0-0

# A comment: with a colon
browser.engagement:
  click_count:
    type: counter
    description: |
      Counts clicks.
      note: not a key
    bugs:
      - https://bugzilla.mozilla.org/123
    expires: never

  "quoted_name":
    type: boolean
"#;

    #[test]
    fn indexes_nested_keys() {
        let idx = KeyLineIndex::build(DOC);
        assert_eq!(idx.line_of(&["$schema"]), Some(2));
        assert_eq!(idx.line_of(&["browser.engagement"]), Some(5));
        assert_eq!(idx.line_of(&["browser.engagement", "click_count"]), Some(6));
        assert_eq!(idx.line_of(&["browser.engagement", "click_count", "type"]), Some(7));
        assert_eq!(idx.line_of(&["browser.engagement", "click_count", "bugs"]), Some(11));
        assert_eq!(idx.line_of(&["browser.engagement", "click_count", "expires"]), Some(13));
    }

    #[test]
    fn skips_block_scalar_contents() {
        let idx = KeyLineIndex::build(DOC);
        assert_eq!(
            idx.line_of(&["browser.engagement", "click_count", "description", "note"]),
            None
        );
    }

    #[test]
    fn unquotes_keys() {
        let idx = KeyLineIndex::build(DOC);
        assert_eq!(idx.line_of(&["browser.engagement", "quoted_name"]), Some(15));
        assert_eq!(idx.line_of(&["browser.engagement", "quoted_name", "type"]), Some(16));
    }

    #[test]
    fn urls_in_values_are_not_keys() {
        assert_eq!(split_key("url: https://example.com"), Some(("url".into(), " https://example.com")));
        assert_eq!(split_key("https://example.com"), None);
    }

    #[test]
    fn unknown_paths_are_none() {
        let idx = KeyLineIndex::build(DOC);
        assert_eq!(idx.line_of(&["nope"]), None);
    }
}
