//! CSV cell rendering
//!
//! Sets are rendered as Python list literals (`['a', 'b']`) and vectors as
//! `[0, 1, 0, 0, 0]`, so existing features.csv consumers keep working.

use std::collections::BTreeSet;

/// Python-style string literal
fn quote_str(value: &str) -> String {
    if value.contains('\'') && !value.contains('"') {
        return format!("\"{}\"", value.replace('\\', "\\\\"));
    }
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

pub fn render_set(values: &BTreeSet<String>) -> String {
    let items: Vec<String> = values.iter().map(|v| quote_str(v)).collect();
    format!("[{}]", items.join(", "))
}

pub fn render_vector(values: &[u8]) -> String {
    let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("[{}]", items.join(", "))
}

/// Quote a CSV field when it contains a delimiter, quote or newline
pub fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
