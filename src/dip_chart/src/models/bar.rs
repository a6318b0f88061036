//! Canonical in-memory representation of a time-series bar (OHLCV).
//!
//! This struct is the unit of exchange between the REST history endpoints,
//! the live feed and the [`BarStore`](crate::store::BarStore), regardless of
//! which path a bar arrived on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single time-series bar (OHLCV) keyed by its timestamp.
///
/// The serialized field names match the backend wire format (`t`, `o`, `h`,
/// `l`, `c`, `v`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Bucket start, milliseconds since the Unix epoch. Unique within a series.
    #[serde(rename = "t")]
    pub timestamp: i64,

    /// Opening price.
    #[serde(rename = "o")]
    pub open: f64,

    /// Highest price during the bar interval.
    #[serde(rename = "h")]
    pub high: f64,

    /// Lowest price during the bar interval.
    #[serde(rename = "l")]
    pub low: f64,

    /// Closing price.
    #[serde(rename = "c")]
    pub close: f64,

    /// Volume traded during the bar interval.
    #[serde(rename = "v")]
    pub volume: f64,
}

impl Bar {
    pub const fn new(
        timestamp: i64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// `true` when every price and the volume are finite numbers.
    pub fn is_valid(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite())
    }

    /// The bucket start as a UTC datetime, if the timestamp is representable.
    pub fn time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    /// Decodes one bar object from loosely typed JSON.
    ///
    /// All six fields are required. Each may be a JSON number or a numeric
    /// string; `t` is rounded to the nearest millisecond. Returns `None` when
    /// a field is missing, unparsable or non-finite.
    pub fn from_wire(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let field = |key: &str| obj.get(key).and_then(wire_number);

        let bar = Self {
            timestamp: round_timestamp(field("t")?)?,
            open: field("o")?,
            high: field("h")?,
            low: field("l")?,
            close: field("c")?,
            volume: field("v")?,
        };
        bar.is_valid().then_some(bar)
    }
}

fn wire_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn round_timestamp(raw: f64) -> Option<i64> {
    let rounded = raw.round();
    // i64::MAX is not exactly representable; stay strictly inside the range.
    (rounded.is_finite() && rounded.abs() < 9.0e18).then_some(rounded as i64)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_numeric_fields_and_rounds_timestamp() {
        let bar = Bar::from_wire(&json!({
            "t": 1_700_000_000_000.6_f64, "o": 10.0, "h": 12.0, "l": 9.5, "c": 11.0, "v": 300
        }))
        .unwrap();

        assert_eq!(bar.timestamp, 1_700_000_000_001);
        assert_eq!(bar.close, 11.0);
        assert_eq!(bar.volume, 300.0);
    }

    #[test]
    fn accepts_numeric_strings() {
        let bar = Bar::from_wire(&json!({
            "t": "1000", "o": "1.5", "h": "2", "l": "1", "c": " 1.75 ", "v": "0"
        }))
        .unwrap();
        assert_eq!(bar, Bar::new(1000, 1.5, 2.0, 1.0, 1.75, 0.0));
    }

    #[test]
    fn rejects_missing_field() {
        assert!(Bar::from_wire(&json!({"t": 1, "o": 1.0, "h": 1.0, "l": 1.0, "c": 1.0})).is_none());
    }

    #[test]
    fn rejects_non_finite_and_non_numeric_values() {
        assert!(
            Bar::from_wire(&json!({"t": 1, "o": "NaN", "h": 1.0, "l": 1.0, "c": 1.0, "v": 1.0}))
                .is_none()
        );
        assert!(
            Bar::from_wire(&json!({"t": 1, "o": 1.0, "h": "inf", "l": 1.0, "c": 1.0, "v": 1.0}))
                .is_none()
        );
        assert!(
            Bar::from_wire(&json!({"t": 1, "o": 1.0, "h": 1.0, "l": null, "c": 1.0, "v": 1.0}))
                .is_none()
        );
        assert!(
            Bar::from_wire(&json!({"t": true, "o": 1.0, "h": 1.0, "l": 1.0, "c": 1.0, "v": 1.0}))
                .is_none()
        );
    }

    #[test]
    fn rejects_non_objects() {
        assert!(Bar::from_wire(&json!([1, 2, 3, 4, 5, 6])).is_none());
        assert!(Bar::from_wire(&json!("bar")).is_none());
    }

    #[test]
    fn validity_checks_every_value() {
        assert!(Bar::new(1, 1.0, 1.0, 1.0, 1.0, 1.0).is_valid());
        assert!(!Bar::new(1, f64::NAN, 1.0, 1.0, 1.0, 1.0).is_valid());
        assert!(!Bar::new(1, 1.0, 1.0, 1.0, 1.0, f64::INFINITY).is_valid());
    }

    #[test]
    fn serializes_with_wire_names() {
        let value = serde_json::to_value(Bar::new(5, 1.0, 2.0, 0.5, 1.5, 10.0)).unwrap();
        assert_eq!(value, json!({"t": 5, "o": 1.0, "h": 2.0, "l": 0.5, "c": 1.5, "v": 10.0}));
    }
}
