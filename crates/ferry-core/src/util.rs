/// Split a comma-separated list of dates, dropping blanks.
///
/// Example: `"2026-01-02, 2026-01-03,"` → `["2026-01-02", "2026-01-03"]`
pub fn parse_dates(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect()
}

/// Treat blank strings as unset (env vars are often exported empty).
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
