//! Dip signal and ticker detail records served next to the chart endpoints.
//!
//! Numeric fields are optional throughout: the backend may omit them, and
//! the client decodes leniently (see
//! [`dip_api::response`](crate::providers::dip_api::response)).

use serde::Serialize;
use serde_json::{Map, Value};

/// A stored dip signal (`GET /dips`, `recent_signals`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DipRow {
    pub symbol: String,
    pub date: String,
    pub rule: String,
    pub value: Option<f64>,
    pub created_at: Option<String>,
}

/// One row of the current-dips screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentDip {
    pub symbol: String,
    pub date: String,
    /// Return over the window, in percent (negative for a dip).
    pub dip: Option<f64>,
    pub window_days: Option<u32>,
    pub market_symbol: Option<String>,
    pub sector_symbol: Option<String>,
    /// Ticker return minus market return, in percentage points.
    pub relative_to_spy_pp: Option<f64>,
    /// Ticker return minus sector return, in percentage points.
    pub relative_to_sector_pp: Option<f64>,
}

/// `GET /dips/current` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CurrentDips {
    pub asof: Option<String>,
    pub windows: Vec<u32>,
    pub items: Vec<CurrentDip>,
}

/// An alert raised for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertRow {
    pub symbol: String,
    pub date: String,
    pub rule: String,
    pub magnitude: Option<f64>,
    pub threshold: Option<f64>,
    pub details: Option<Map<String, Value>>,
    pub created_at: Option<String>,
}

/// Daily price row attached to a ticker detail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceRow {
    pub symbol: String,
    pub date: String,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
    pub source: Option<String>,
}

/// `GET /tickers/{symbol}` payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerDetail {
    pub symbol: String,
    pub name: Option<String>,
    pub active: Option<bool>,
    pub latest_price: Option<PriceRow>,
    pub recent_signals: Vec<DipRow>,
    pub recent_alerts: Vec<AlertRow>,
}

impl TickerDetail {
    /// Company name, or `None` when the backend has none or it is blank.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }
}
