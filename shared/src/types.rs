//! Common types used across the assistant

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Supported languages
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Hindi,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
        }
    }
}

/// Detect the language of a text by scanning for Devanagari characters.
/// Empty text defaults to English.
pub fn detect_language(text: &str) -> Language {
    if text.chars().any(|c| ('\u{0900}'..='\u{097F}').contains(&c)) {
        Language::Hindi
    } else {
        Language::English
    }
}

/// Parse a decimal from a stored cell value, falling back to a default.
/// Stored cells are free-form strings; blanks and garbage both fall back.
pub fn parse_decimal_or(value: &str, default: Decimal) -> Decimal {
    Decimal::from_str(value.trim()).unwrap_or(default)
}

/// Format an amount for user-facing replies (rupee sign, two decimals max)
pub fn format_money(amount: Decimal) -> String {
    format!("₹{}", amount.round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language("Add 10 pens"), Language::English);
        assert_eq!(detect_language("10 कलम जोड़ो"), Language::Hindi);
        assert_eq!(detect_language(""), Language::English);
    }

    #[test]
    fn test_parse_decimal_or() {
        assert_eq!(parse_decimal_or("12.5", Decimal::ZERO), Decimal::new(125, 1));
        assert_eq!(parse_decimal_or(" 7 ", Decimal::ZERO), Decimal::from(7));
        assert_eq!(parse_decimal_or("", Decimal::ONE), Decimal::ONE);
        assert_eq!(parse_decimal_or("n/a", Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(Decimal::new(125, 1)), "₹12.5");
        assert_eq!(format_money(Decimal::from(50)), "₹50");
    }
}
