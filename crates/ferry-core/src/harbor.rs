/// Harbors served by the North Frisian ferry operator, by code.
pub const HARBORS: &[(&str, &str)] = &[
    ("DEWYK", "Wyk (Föhr)"),
    ("DEDAG", "Dagebüll"),
    ("DEWIT", "Wittdün (Amrum)"),
    ("DENOR", "Nordstrand"),
    ("DEPEL", "Pellworm"),
    ("DESCH", "Schlüttsiel"),
];

/// Human-readable harbor name, or the code itself when unknown.
pub fn display_name(code: &str) -> &str {
    HARBORS
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, name)| *name)
        .unwrap_or(code)
}

pub fn is_known(code: &str) -> bool {
    HARBORS.iter().any(|(c, _)| c.eq_ignore_ascii_case(code))
}
