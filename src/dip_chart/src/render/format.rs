//! Number formatting for prices and dip figures. Missing or NaN values
//! render as a placeholder instead of failing.

pub fn format_price(value: Option<f64>) -> String {
    match present(value) {
        Some(v) => format!("${v:.2}"),
        None => "Not available yet".to_string(),
    }
}

pub fn format_percent(value: Option<f64>) -> String {
    match present(value) {
        Some(v) => format!("{v:.2}%"),
        None => "n/a".to_string(),
    }
}

/// Percentage points, e.g. a return relative to SPY.
pub fn format_points(value: Option<f64>) -> String {
    match present(value) {
        Some(v) => format!("{v:.2}pp"),
        None => "n/a".to_string(),
    }
}

/// Like [`format_points`] with an explicit `+` on positive values.
pub fn format_signed_points(value: Option<f64>) -> String {
    match present(value) {
        Some(v) => format!("{}{v:.2}pp", sign(v)),
        None => "n/a".to_string(),
    }
}

pub(crate) fn sign(value: f64) -> &'static str {
    if value > 0.0 { "+" } else { "" }
}

fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}
