/// Reduce a raw price string to digits and a decimal point.
///
/// Currency symbols and words are dropped, commas removed, decimals kept.
/// Stray leading/trailing dots are trimmed so `"Rs.0"` becomes `"0"`, not
/// `".0"`.  An input with no digits at all yields `"0"`.  The transform is
/// idempotent.
pub fn sanitize_price(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let cleaned = cleaned.trim_matches('.');
    if cleaned.is_empty() {
        "0".to_string()
    } else {
        cleaned.to_string()
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
