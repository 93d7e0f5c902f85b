//! Storage key addressing
//!
//! Client-supplied file names are untrusted. Every key handed to the backend
//! is built here as `{unix_seconds}_{sanitized_name}`, where the sanitized name
//! only contains `[A-Za-z0-9._-]`. Keys are safe by construction; nothing on
//! the write path has to reject a name.

use chrono::{DateTime, Utc};

/// Substituted when nothing usable survives sanitization
pub const FALLBACK_NAME: &str = "unnamed_file";

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

/// Reduce an untrusted name to its final path segment over the key alphabet.
///
/// Both `/` and `\` separate segments. Any other character outside
/// `[A-Za-z0-9._-]` becomes `_`. An empty result or `.` becomes
/// [`FALLBACK_NAME`]; `..` is kept since keys never reach a filesystem.
pub fn sanitize(raw_name: &str) -> String {
    let base = raw_name.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| if is_key_char(c) { c } else { '_' })
        .collect();

    if cleaned.is_empty() || cleaned == "." {
        FALLBACK_NAME.to_string()
    } else {
        cleaned
    }
}

/// Build the storage key for `raw_name` uploaded at `now`
pub fn make_key(raw_name: &str, now: DateTime<Utc>) -> String {
    make_key_at(raw_name, now.timestamp())
}

/// Build the storage key for `raw_name` at a unix second.
///
/// Negative seconds are clamped to zero so the prefix stays all digits.
pub fn make_key_at(raw_name: &str, unix_seconds: i64) -> String {
    format!("{}_{}", unix_seconds.max(0), sanitize(raw_name))
}

/// Whether `key` could have been produced by [`make_key`]'s alphabet.
///
/// Read and delete paths use this to answer out-of-alphabet keys as missing
/// without asking the backend.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(is_key_char)
}
