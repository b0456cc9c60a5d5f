//! Lenient number parsing for free-text form fields.
//!
//! Only a leading numeric prefix counts: `"12abc"` reads as 12, `" 7.9"` as
//! 7.9, and anything without a prefix yields `None`.

use std::sync::OnceLock;

use regex::Regex;

fn decimal_prefix() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("valid decimal pattern")
    })
}

fn integer_prefix() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[+-]?\d+").expect("valid integer pattern"))
}

pub fn parse_decimal_prefix(raw: &str) -> Option<f64> {
    let matched = decimal_prefix().find(raw.trim_start())?;
    matched
        .as_str()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

pub fn parse_integer_prefix(raw: &str) -> Option<i64> {
    let matched = integer_prefix().find(raw.trim_start())?;
    matched.as_str().parse::<i64>().ok()
}

/// Missing, unparseable and zero values all fall back to `default`.
pub fn decimal_or(raw: &str, default: f64) -> f64 {
    parse_decimal_prefix(raw)
        .filter(|value| *value != 0.0)
        .unwrap_or(default)
}

/// Missing, unparseable and zero values all fall back to `default`.
pub fn integer_or(raw: &str, default: i64) -> i64 {
    parse_integer_prefix(raw)
        .filter(|value| *value != 0)
        .unwrap_or(default)
}
