//! Lenient decoding of dip backend payloads.
//!
//! The backend is loosely typed: numbers sometimes arrive as strings, optional
//! fields go missing, and collections can be absent. Decoding mirrors what the
//! app tolerates. Missing strings become empty, missing numbers become `None`,
//! and non-array collections become empty. Chart bars are the exception: a
//! bar failing [`Bar::from_wire`] is dropped rather than defaulted.

use serde_json::{Map, Value};
use tracing::trace;

use crate::{
    models::{
        bar::Bar,
        bar_series::BarSeries,
        dips::{AlertRow, CurrentDip, CurrentDips, DipRow, PriceRow, TickerDetail},
        range::Timespan,
        request_params::normalize_symbol,
    },
    providers::ProviderError,
};

/// Decodes `{ symbol, timespan, bars: [{t,o,h,l,c,v}] }`.
///
/// `symbol` and `fallback` fill in a missing or unrecognized `symbol` /
/// `timespan`. A payload that is not a JSON object is malformed.
pub fn decode_chart(
    value: &Value,
    symbol: &str,
    fallback: Timespan,
) -> Result<BarSeries, ProviderError> {
    let obj = value
        .as_object()
        .ok_or_else(|| ProviderError::Decode("chart payload is not an object".into()))?;

    let raw = array(obj, "bars");
    let bars: Vec<Bar> = raw.iter().filter_map(Bar::from_wire).collect();
    if bars.len() != raw.len() {
        trace!(dropped = raw.len() - bars.len(), "dropped malformed history bars");
    }

    let symbol = opt_text(obj, "symbol").unwrap_or_else(|| normalize_symbol(symbol));
    let timespan = opt_text(obj, "timespan")
        .and_then(|t| t.parse().ok())
        .unwrap_or(fallback);

    Ok(BarSeries {
        symbol,
        timespan,
        bars,
    })
}

/// Decodes `GET /dips/current`.
pub fn decode_current_dips(value: &Value) -> CurrentDips {
    let Some(obj) = value.as_object() else {
        return CurrentDips::default();
    };

    CurrentDips {
        asof: opt_text(obj, "asof"),
        windows: array(obj, "windows")
            .iter()
            .filter_map(|w| wire_number(w).and_then(round_u32))
            .collect(),
        items: objects(array(obj, "items"))
            .map(|item| CurrentDip {
                symbol: text(item, "symbol"),
                date: text(item, "date"),
                dip: number(item, "dip"),
                window_days: number(item, "window_days").and_then(round_u32),
                market_symbol: opt_text(item, "market_symbol"),
                sector_symbol: opt_text(item, "sector_symbol"),
                relative_to_spy_pp: number(item, "relative_to_spy_pp"),
                relative_to_sector_pp: number(item, "relative_to_sector_pp"),
            })
            .collect(),
    }
}

/// Decodes `GET /dips`: a bare array of signal rows.
pub fn decode_dips(value: &Value) -> Vec<DipRow> {
    value
        .as_array()
        .map(|rows| objects(rows).map(dip_row).collect())
        .unwrap_or_default()
}

/// Decodes `GET /tickers/{symbol}`.
pub fn decode_ticker(value: &Value, symbol: &str) -> Result<TickerDetail, ProviderError> {
    let obj = value
        .as_object()
        .ok_or_else(|| ProviderError::Decode("ticker payload is not an object".into()))?;

    Ok(TickerDetail {
        symbol: opt_text(obj, "symbol").unwrap_or_else(|| normalize_symbol(symbol)),
        name: opt_text(obj, "name"),
        active: obj.get("active").map(truthy),
        latest_price: obj
            .get("latest_price")
            .and_then(Value::as_object)
            .map(price_row),
        recent_signals: objects(array(obj, "recent_signals")).map(dip_row).collect(),
        recent_alerts: objects(array(obj, "recent_alerts")).map(alert_row).collect(),
    })
}

fn dip_row(item: &Map<String, Value>) -> DipRow {
    DipRow {
        symbol: text(item, "symbol"),
        date: text(item, "date"),
        rule: text(item, "rule"),
        value: number(item, "value"),
        created_at: opt_text(item, "created_at"),
    }
}

fn alert_row(item: &Map<String, Value>) -> AlertRow {
    AlertRow {
        symbol: text(item, "symbol"),
        date: text(item, "date"),
        rule: text(item, "rule"),
        magnitude: number(item, "magnitude"),
        threshold: number(item, "threshold"),
        details: item.get("details").and_then(Value::as_object).cloned(),
        created_at: opt_text(item, "created_at"),
    }
}

fn price_row(item: &Map<String, Value>) -> PriceRow {
    PriceRow {
        symbol: text(item, "symbol"),
        date: text(item, "date"),
        open: number(item, "open"),
        high: number(item, "high"),
        low: number(item, "low"),
        close: number(item, "close"),
        volume: number(item, "volume"),
        source: opt_text(item, "source"),
    }
}

fn objects(values: &[Value]) -> impl Iterator<Item = &Map<String, Value>> {
    values.iter().filter_map(Value::as_object)
}

fn array<'a>(obj: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    obj.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Scalar rendered as a string; missing or null reads as `""`.
fn text(obj: &Map<String, Value>, key: &str) -> String {
    match obj.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Like [`text`], but falsy values (missing, null, `""`, `false`, `0`) read as `None`.
fn opt_text(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).filter(|v| truthy(v)).map(|_| text(obj, key))
}

fn number(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    obj.get(key).and_then(wire_number)
}

fn wire_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn round_u32(value: f64) -> Option<u32> {
    let rounded = value.round();
    (0.0..=f64::from(u32::MAX))
        .contains(&rounded)
        .then_some(rounded as u32)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
