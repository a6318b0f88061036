use crate::models::range::{FetchPlan, RangeSelection};

/// What the chart is asked to show: one symbol over one range.
///
/// This is the unit of supersession. A new `ChartRequest` replaces any
/// in-flight fetch for the previous one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChartRequest {
    /// Upper-cased, trimmed ticker symbol (e.g. `"AAPL"`).
    pub symbol: String,

    /// The selected chart window.
    pub range: RangeSelection,

    /// Lookback for [`RangeSelection::DipWindow`], in days. Ignored by the
    /// other ranges.
    pub dip_window_days: Option<u32>,
}

impl ChartRequest {
    pub fn new(symbol: &str, range: RangeSelection) -> Self {
        Self {
            symbol: normalize_symbol(symbol),
            range,
            dip_window_days: None,
        }
    }

    pub fn with_dip_window(mut self, days: u32) -> Self {
        self.dip_window_days = Some(days);
        self
    }

    /// Same symbol and dip window, different range.
    pub fn with_range(&self, range: RangeSelection) -> Self {
        Self {
            range,
            ..self.clone()
        }
    }

    pub fn plan(&self) -> FetchPlan {
        self.range.fetch_plan(self.dip_window_days)
    }
}

/// Trims and upper-cases a ticker symbol.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_ascii_uppercase()
}
