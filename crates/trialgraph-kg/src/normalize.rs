//! Name canonicalization used as the deduplication key.

/// Trim, collapse internal whitespace runs to one space, lowercase.
pub fn normalize_str(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Total over missing values: `None` maps to the empty key.
pub fn normalize(raw: Option<&str>) -> String {
    raw.map(normalize_str).unwrap_or_default()
}
