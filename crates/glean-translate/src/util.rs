//! String escaping shared by the emitters.

/// Escape for a double-quoted Kotlin string literal.
pub fn kotlin_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '$' => out.push_str("\\$"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Escape for a double-quoted Swift string literal.
pub fn swift_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Lines of a free-text description, trimmed, without trailing blank lines.
pub fn description_lines(s: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = s.trim().lines().map(str::trim_end).collect();
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}

/// Render `text` as the body of a `/** ... */` comment at `indent`.
pub fn kdoc(text: &str, indent: &str) -> String {
    let mut out = format!("{indent}/**\n");
    for line in description_lines(text) {
        let line = line.replace("*/", "*&#47;");
        if line.is_empty() {
            out.push_str(&format!("{indent} *\n"));
        } else {
            out.push_str(&format!("{indent} * {line}\n"));
        }
    }
    out.push_str(&format!("{indent} */\n"));
    out
}

/// Render `text` as `///` lines at `indent`.
pub fn swift_doc(text: &str, indent: &str) -> String {
    description_lines(text)
        .into_iter()
        .map(|line| {
            if line.is_empty() {
                format!("{indent}///\n")
            } else {
                format!("{indent}/// {line}\n")
            }
        })
        .collect()
}

/// Make text safe for a Markdown table cell.
pub fn table_cell(s: &str) -> String {
    description_lines(s)
        .join("<br>")
        .replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kotlin_escapes_templates_and_quotes() {
        assert_eq!(kotlin_string("a\"b$c\\"), r#""a\"b\$c\\""#);
    }

    #[test]
    fn swift_leaves_dollar_alone() {
        assert_eq!(swift_string("$x\n"), r#""$x\n""#);
    }

    #[test]
    fn kdoc_cannot_be_closed_early() {
        let doc = kdoc("ends */ here\n\nsecond", "    ");
        assert_eq!(doc, "    /**\n     * ends *&#47; here\n     *\n     * second\n     */\n");
    }

    #[test]
    fn table_cells_escape_pipes_and_newlines() {
        assert_eq!(table_cell("a | b\nc\n"), "a \\| b<br>c");
    }

    fn unescape(literal: &str) -> String {
        let inner = &literal[1..literal.len() - 1];
        let mut out = String::new();
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        }
        out
    }

    proptest::proptest! {
        #[test]
        fn literals_are_single_line_and_lossless(s in "\\PC*|[\"$\\\\\n\r\t a-z]*") {
            for literal in [kotlin_string(&s), swift_string(&s)] {
                proptest::prop_assert!(literal.starts_with('"') && literal.ends_with('"'));
                proptest::prop_assert!(!literal.contains('\n'));
                proptest::prop_assert_eq!(unescape(&literal), s.clone());
            }
        }
    }
}
