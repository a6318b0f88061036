//! A collection of time-series bars for a specific symbol and timespan.

use serde::{Deserialize, Serialize};

use crate::models::{bar::Bar, range::Timespan};

/// Represents a complete set of time-series data for a single symbol.
///
/// This struct groups a vector of [`Bar`]s with their corresponding symbol
/// and [`Timespan`], making the data set self-describing. It is what a
/// [`HistoryProvider`](crate::providers::HistoryProvider) returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    /// The symbol this data represents (e.g., "AAPL").
    pub symbol: String,
    /// The bucket size of each bar in the series.
    pub timespan: Timespan,
    /// Bars in ascending timestamp order.
    pub bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(symbol: impl Into<String>, timespan: Timespan, bars: Vec<Bar>) -> Self {
        Self {
            symbol: symbol.into(),
            timespan,
            bars,
        }
    }
}
