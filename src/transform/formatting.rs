//! Text formatting for line values.
//!
//! Every formatter is total: a missing or non-finite number renders as the
//! `-` placeholder instead of failing.

use crate::models::Polarity;

/// Placeholder for a value that is not yet available
pub const PLACEHOLDER: &str = "-";

/// Shortest decimal form of a number; negative zero prints as "0"
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    value.to_string()
}

fn known(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Diff text: `+` forced on positive values, zero stays bare
pub fn format_signed_diff(value: Option<f64>) -> String {
    match known(value) {
        None => PLACEHOLDER.to_string(),
        Some(v) if v > 0.0 => format!("+{}", format_number(v)),
        Some(v) => format_number(v),
    }
}

pub fn classify_polarity(value: Option<f64>) -> Polarity {
    match known(value) {
        Some(v) if v > 0.0 => Polarity::Positive,
        Some(v) if v < 0.0 => Polarity::Negative,
        _ => Polarity::Neutral,
    }
}

/// `"<point> (<price>)"`, each part independently replaced by `-`
pub fn format_point_with_price(point: Option<f64>, price: Option<f64>) -> String {
    format!(
        "{} ({})",
        format_moneyline_price(point),
        format_moneyline_price(price)
    )
}

/// Bare price; upstream prices already carry their sign
pub fn format_moneyline_price(price: Option<f64>) -> String {
    known(price)
        .map(format_number)
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}
