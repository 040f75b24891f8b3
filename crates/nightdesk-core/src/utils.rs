//! Formatting helpers shared by the console views

use rust_decimal::Decimal;

/// Share of `part` in `whole` as a percentage
///
/// Returns `0.0` when `whole` is zero or the result is not finite, so callers
/// never render `NaN` or infinity.
#[must_use]
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole == 0.0 || !whole.is_finite() {
        return 0.0;
    }
    let pct = part / whole * 100.0;
    if pct.is_finite() { pct } else { 0.0 }
}

/// Format a share as a percentage label, e.g. `"50%"` or `"33.3%"`
///
/// One decimal place is kept unless it is zero. `format_percentage(0.0, 0.0)`
/// is `"0%"`.
#[must_use]
pub fn format_percentage(part: f64, whole: f64) -> String {
    let pct = percentage(part, whole);
    let rounded = if pct.abs() < 1e15 {
        (pct * 10.0).round() / 10.0
    } else {
        pct.round()
    };
    // Normalise -0.0 so it never renders as "-0%"
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}%")
    } else {
        format!("{rounded:.1}%")
    }
}

/// Format a money amount with thousands separators, e.g. `"$1,234.50"`
#[must_use]
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let text = format!("{:.2}", rounded.abs());
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{sign}${grouped}.{cents}")
}

/// Shorten text to at most `max_chars` characters, ending with an ellipsis
#[must_use]
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(max_chars - 1).collect();
    out.push('…');
    out
}
