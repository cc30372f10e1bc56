//! Common utilities for certificate generation.
//!
//! Shared helpers for Typst escaping, file naming and static asset lookup.

use chrono::NaiveDate;
use std::path::Path;

/// Escape special characters for Typst string literals.
pub fn escape_typst_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str(r"\\"),
            '"' => escaped.push_str(r#"\""#),
            '\n' => escaped.push_str(r"\n"),
            '\r' => escaped.push_str(r"\r"),
            '\t' => escaped.push_str(r"\t"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Quote a value as a Typst string literal.
pub fn typst_string(value: &str) -> String {
    format!("\"{}\"", escape_typst_string(value))
}

/// Lowercase ASCII slug, words joined by dashes; `fallback` if nothing is left.
pub fn slugify(name: &str, fallback: &str) -> String {
    let mut result = String::new();
    let mut last_dash = false;

    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            result.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if (ch.is_whitespace() || ch == '-' || ch == '_') && !last_dash && !result.is_empty() {
            result.push('-');
            last_dash = true;
        }
    }

    let result = result.trim_matches('-');
    if result.is_empty() {
        return fallback.to_string();
    }

    result.to_string()
}

/// Replace every character outside `[A-Za-z0-9]` with `_`, one for one.
///
/// This is the naming scheme certificates have always been saved under, so
/// "José da Silva" becomes "Jos__da_Silva".
pub fn certificate_name_stem(name: &str) -> String {
    name.chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
        .collect()
}

/// File name of a single participant's certificate.
pub fn certificate_file_name(participant_name: &str) -> String {
    format!("certificado-{}.pdf", certificate_name_stem(participant_name))
}

/// File name offered for a batch archive, e.g. `certificados-oficina-2025-07-12.zip`.
pub fn archive_file_name(event_name: &str, date: NaiveDate) -> String {
    format!(
        "certificados-{}-{}.zip",
        slugify(event_name, "evento"),
        date.format("%Y-%m-%d")
    )
}

/// Get the static assets directory path.
pub fn get_static_dir() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/static"))
}
