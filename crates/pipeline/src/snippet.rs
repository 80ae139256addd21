//! Regex price detection over snippet and page text.
//!
//! Used to classify and extract locally when no LLM key is configured, and as
//! the last-resort extractor when a page-level generation call fails.

use std::sync::LazyLock;

use regex::Regex;

use crate::sanitize::sanitize_price;

static PRICE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // symbol-prefixed: $999, ₹1,19,900, € 499.00
        r"[$£€¥₹]\s*\d[\d,]*(?:\.\d+)?",
        // symbol-suffixed: 999 €, 1299$
        r"\d[\d,]*(?:\.\d+)?\s*[$£€¥₹]",
        // currency-word prefixed: Rs.999, USD 500, INR 25000
        r"(?i)\b(?:rs\.?|usd|inr|eur|gbp|jpy|aud|cad)\s*\.?\s*\d[\d,]*(?:\.\d+)?",
        // pricing terms with a number: MRP 999, Price: $500
        r"(?i)\b(?:price|mrp|cost)\s*[:\-]?\s*[$£€¥₹]?\s*\d[\d,]*(?:\.\d+)?",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("static price pattern"))
    .collect()
});

/// Whether the text carries an actual numeric price, not just price-related
/// vocabulary.
pub fn contains_price(text: &str) -> bool {
    PRICE_PATTERNS.iter().any(|re| re.is_match(text))
}

/// First sanitized non-zero price found in the text, if any.
pub fn extract_price(text: &str) -> Option<String> {
    for re in PRICE_PATTERNS.iter() {
        if let Some(found) = re.find(text) {
            let price = sanitize_price(found.as_str());
            if price != "0" {
                return Some(price);
            }
        }
    }
    None
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_symbol_prices() {
        assert!(contains_price("Buy iPhone for $999.00 with free shipping"));
        assert!(contains_price("Best price ₹1,19,900 with discount"));
        assert!(contains_price("Only 499 €"));
    }

    #[test]
    fn detects_currency_words_and_terms() {
        assert!(contains_price("MRP Rs.25,000 Special offer"));
        assert!(contains_price("USD 500 incl. taxes"));
        assert!(contains_price("Price: 1299"));
    }

    #[test]
    fn ignores_price_vocabulary_without_numbers() {
        assert!(!contains_price("Learn about prices and features"));
        assert!(!contains_price("Colors, Price, Size, Reviews"));
        assert!(!contains_price("Best price available"));
    }

    #[test]
    fn extracts_first_price() {
        assert_eq!(
            extract_price("was ₹79,999 now with exchange bonus"),
            Some("79999".to_string())
        );
        assert_eq!(extract_price("special offer $1,299.99"), Some("1299.99".to_string()));
    }

    #[test]
    fn extract_returns_none_without_a_price() {
        assert_eq!(extract_price("check pricing and reviews"), None);
        assert_eq!(extract_price(""), None);
    }
}
