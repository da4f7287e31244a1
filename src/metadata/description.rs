// src/metadata/description.rs

//! DESCRIPTION file parsing
//!
//! R package DESCRIPTION files use Debian control format: `Key: value` lines
//! with indented continuation lines. Values are folded to single lines; key
//! order is not significant.

use std::collections::BTreeMap;

/// Parse raw DESCRIPTION text into a field map
///
/// Continuation lines (starting with whitespace) are appended to the current
/// field with a single separating space. Lines without a colon outside a
/// continuation are skipped.
pub fn parse_description(raw: &str) -> BTreeMap<String, String> {
    fn flush(
        key: &mut Option<String>,
        value: &mut Vec<String>,
        out: &mut BTreeMap<String, String>,
    ) {
        if let Some(k) = key.take() {
            let folded = value
                .iter()
                .map(|part| part.trim())
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            out.insert(k, folded);
        }
        value.clear();
    }

    let mut fields = BTreeMap::new();
    let mut current_key: Option<String> = None;
    let mut current_value: Vec<String> = Vec::new();

    for line in raw.lines() {
        if line.trim().is_empty() {
            flush(&mut current_key, &mut current_value, &mut fields);
            continue;
        }
        if line.starts_with(' ') || line.starts_with('\t') {
            if current_key.is_some() {
                current_value.push(line.to_string());
            }
            continue;
        }
        match line.split_once(':') {
            Some((key, value)) => {
                flush(&mut current_key, &mut current_value, &mut fields);
                current_key = Some(key.trim().to_string());
                current_value.push(value.to_string());
            }
            None => continue,
        }
    }
    flush(&mut current_key, &mut current_value, &mut fields);

    fields
}
