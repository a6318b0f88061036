//! Decoding of live feed frames.
//!
//! A frame is either one update `{"type":"bar","bar":{t,o,h,l,c,v}}` or a JSON
//! array of them. Entries are decoded independently: a malformed entry is
//! skipped and the rest of the frame still counts.

use serde_json::Value;
use tracing::trace;

use crate::models::bar::Bar;

/// Decodes every valid bar in `payload`, in frame order.
///
/// Unparsable frames yield an empty vector.
pub fn decode_message(payload: &str) -> Vec<Bar> {
    let value = match serde_json::from_str::<Value>(payload) {
        Ok(value) => value,
        Err(err) => {
            trace!(error = %err, "discarding unparsable feed frame");
            return Vec::new();
        }
    };

    match value {
        Value::Array(items) => {
            let bars: Vec<Bar> = items.iter().filter_map(decode_update).collect();
            if bars.len() != items.len() {
                trace!(
                    dropped = items.len() - bars.len(),
                    "skipped malformed entries in feed batch"
                );
            }
            bars
        }
        single => decode_update(&single).into_iter().collect(),
    }
}

fn decode_update(value: &Value) -> Option<Bar> {
    let obj = value.as_object()?;
    if obj.get("type").and_then(Value::as_str) != Some("bar") {
        return None;
    }
    Bar::from_wire(obj.get("bar")?)
}
