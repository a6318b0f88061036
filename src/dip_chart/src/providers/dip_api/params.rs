//! Paths and query parameters for the dip backend's chart endpoints.

use crate::models::{range::FetchPlan, request_params::normalize_symbol};

/// Path of the history endpoint serving `plan`.
pub fn chart_path(symbol: &str, plan: FetchPlan) -> String {
    let symbol = normalize_symbol(symbol);
    match plan {
        FetchPlan::Intraday { .. } => format!("/chart/intraday/{symbol}"),
        FetchPlan::Aggregate { .. } => format!("/chart/daily/{symbol}"),
    }
}

/// Query string pairs for `plan`.
pub fn construct_params(plan: FetchPlan) -> Vec<(&'static str, String)> {
    match plan {
        FetchPlan::Intraday { lookback_minutes } => {
            vec![("lookback_minutes", lookback_minutes.to_string())]
        }
        FetchPlan::Aggregate {
            lookback_days,
            timespan,
            multiplier,
        } => vec![
            ("lookback_days", lookback_days.to_string()),
            ("timespan", timespan.as_str().to_string()),
            ("multiplier", multiplier.to_string()),
        ],
    }
}

/// Path of the per-symbol live bar stream.
pub fn live_feed_path(symbol: &str) -> String {
    format!("/ws/chart/intraday/{}", normalize_symbol(symbol))
}

/// Derives the WebSocket base from the REST base (`http` → `ws`, `https` → `wss`).
pub fn ws_base_url(http_base: &str) -> String {
    match http_base.strip_prefix("http") {
        Some(rest) => format!("ws{rest}"),
        None => http_base.to_string(),
    }
}
