//! Chart range selection and its mapping onto backend fetch parameters.
//!
//! A [`RangeSelection`] is what the user picks above the chart (`1D`, `1W`,
//! ...). Each range resolves to exactly one [`FetchPlan`], one [`LabelMode`]
//! for the x-axis, and a flag saying whether the live feed runs for it. The
//! mapping is a pure function of the range (plus the dip window override for
//! [`RangeSelection::DipWindow`]).
//!
//! ```
//! use dip_chart::models::range::{FetchPlan, RangeSelection, Timespan};
//!
//! let plan = RangeSelection::Week.fetch_plan(None);
//! assert_eq!(
//!     plan,
//!     FetchPlan::Aggregate { lookback_days: 7, timespan: Timespan::Hour, multiplier: 1 }
//! );
//! assert!(RangeSelection::Intraday.is_live());
//! ```

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lookback used for the intraday chart: one regular US session.
pub const INTRADAY_LOOKBACK_MINUTES: u32 = 390;

/// Largest `lookback_days` the daily endpoint accepts.
pub const MAX_LOOKBACK_DAYS: u32 = 5000;

/// Dip window used when the caller has none.
pub const DEFAULT_DIP_WINDOW_DAYS: u32 = 30;

/// Dip windows at or below this length are fetched with hourly bars.
const HOURLY_DIP_WINDOW_MAX_DAYS: u32 = 7;

#[derive(Debug, Error)]
#[error("unknown chart range: {0:?}")]
pub struct RangeParseError(pub String);

/// Bar bucket size understood by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timespan {
    Minute,
    Hour,
    Day,
}

impl Timespan {
    pub const fn as_str(self) -> &'static str {
        match self {
            Timespan::Minute => "minute",
            Timespan::Hour => "hour",
            Timespan::Day => "day",
        }
    }
}

impl fmt::Display for Timespan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timespan {
    type Err = RangeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minute" => Ok(Timespan::Minute),
            "hour" => Ok(Timespan::Hour),
            "day" => Ok(Timespan::Day),
            _ => Err(RangeParseError(s.to_string())),
        }
    }
}

/// How x-axis and tooltip labels render a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelMode {
    /// Clock time, e.g. `14:05`.
    Time,
    /// Calendar date, e.g. `Mar 04`.
    Date,
    /// Month and year, e.g. `Mar 2024`.
    MonthYear,
    /// No labels.
    None,
}

/// Parameters for one historical fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPlan {
    /// `GET /chart/intraday/{symbol}?lookback_minutes=`
    Intraday { lookback_minutes: u32 },
    /// `GET /chart/daily/{symbol}?lookback_days=&timespan=&multiplier=`
    Aggregate {
        lookback_days: u32,
        timespan: Timespan,
        multiplier: u32,
    },
}

impl FetchPlan {
    pub const fn timespan(&self) -> Timespan {
        match self {
            FetchPlan::Intraday { .. } => Timespan::Minute,
            FetchPlan::Aggregate { timespan, .. } => *timespan,
        }
    }
}

/// The chart window selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeSelection {
    /// Today's session in minute bars; the only range with a live feed.
    Intraday,
    Week,
    Month,
    Year,
    All,
    /// The symbol's dip lookback window.
    DipWindow,
}

impl RangeSelection {
    /// Every range, in the order they are offered.
    pub const ALL: [RangeSelection; 6] = [
        RangeSelection::Intraday,
        RangeSelection::Week,
        RangeSelection::Month,
        RangeSelection::Year,
        RangeSelection::All,
        RangeSelection::DipWindow,
    ];

    /// Short code shown on the range picker.
    pub const fn code(self) -> &'static str {
        match self {
            RangeSelection::Intraday => "1D",
            RangeSelection::Week => "1W",
            RangeSelection::Month => "1M",
            RangeSelection::Year => "1Y",
            RangeSelection::All => "ALL",
            RangeSelection::DipWindow => "DIP",
        }
    }

    /// Resolves the fetch parameters for this range.
    ///
    /// `dip_window_days` is only consulted for [`RangeSelection::DipWindow`];
    /// it is clamped to `1..=MAX_LOOKBACK_DAYS`.
    pub fn fetch_plan(self, dip_window_days: Option<u32>) -> FetchPlan {
        let daily = |lookback_days, timespan| FetchPlan::Aggregate {
            lookback_days,
            timespan,
            multiplier: 1,
        };

        match self {
            RangeSelection::Intraday => FetchPlan::Intraday {
                lookback_minutes: INTRADAY_LOOKBACK_MINUTES,
            },
            RangeSelection::Week => daily(7, Timespan::Hour),
            RangeSelection::Month => daily(30, Timespan::Day),
            RangeSelection::Year => daily(365, Timespan::Day),
            RangeSelection::All => daily(MAX_LOOKBACK_DAYS, Timespan::Day),
            RangeSelection::DipWindow => {
                let days = dip_window_days
                    .unwrap_or(DEFAULT_DIP_WINDOW_DAYS)
                    .clamp(1, MAX_LOOKBACK_DAYS);
                let timespan = if days <= HOURLY_DIP_WINDOW_MAX_DAYS {
                    Timespan::Hour
                } else {
                    Timespan::Day
                };
                daily(days, timespan)
            }
        }
    }

    /// Whether this range uses the finest granularity, and so runs the live feed.
    pub const fn is_live(self) -> bool {
        matches!(self, RangeSelection::Intraday)
    }

    pub const fn label_mode(self) -> LabelMode {
        match self {
            RangeSelection::Intraday => LabelMode::Time,
            RangeSelection::Week | RangeSelection::Month | RangeSelection::DipWindow => {
                LabelMode::Date
            }
            RangeSelection::Year | RangeSelection::All => LabelMode::MonthYear,
        }
    }

    /// Parses a range code, falling back to [`RangeSelection::All`] (the
    /// coarsest mapping) for anything unrecognized.
    pub fn from_code_lossy(code: &str) -> Self {
        code.parse().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "falling back to the coarsest chart range");
            RangeSelection::All
        })
    }
}

impl fmt::Display for RangeSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for RangeSelection {
    type Err = RangeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        RangeSelection::ALL
            .into_iter()
            .find(|range| range.code() == code)
            .ok_or_else(|| RangeParseError(s.to_string()))
    }
}
