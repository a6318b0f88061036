//! Provider abstraction for historical chart data.
//!
//! This module defines the [`HistoryProvider`] trait, the seam between the
//! [`HistoricalLoader`](crate::loader::HistoricalLoader) and whatever serves
//! bars. The production implementation is [`dip_api::DipApiClient`]; tests
//! plug in in-memory providers.
//!
//! The trait is designed for async usage and supports dynamic dispatch
//! (`Arc<dyn HistoryProvider>`), because the loader moves the provider into
//! spawned fetch tasks.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use dip_chart::models::{
//!     bar_series::BarSeries, range::Timespan, request_params::ChartRequest,
//! };
//! use dip_chart::providers::{HistoryProvider, ProviderError};
//!
//! struct EmptyProvider;
//!
//! #[async_trait]
//! impl HistoryProvider for EmptyProvider {
//!     async fn fetch_bars(&self, request: ChartRequest) -> Result<BarSeries, ProviderError> {
//!         Ok(BarSeries::new(request.symbol, Timespan::Minute, vec![]))
//!     }
//! }
//! ```

pub mod dip_api;
pub mod errors;

use async_trait::async_trait;

pub use errors::ProviderError;

use crate::models::{bar_series::BarSeries, request_params::ChartRequest};

/// Trait for fetching one historical bar series.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    /// Fetches the series for `request.symbol` over `request.range`.
    ///
    /// # Returns
    ///
    /// * `Ok(BarSeries)` - bars in ascending timestamp order, invalid bars removed.
    /// * `Err(ProviderError)` - transport failure, timeout, non-success status
    ///   or malformed payload.
    async fn fetch_bars(&self, request: ChartRequest) -> Result<BarSeries, ProviderError>;
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::models::{
        bar::Bar,
        range::{RangeSelection, Timespan},
    };

    use super::*;

    struct FixedProvider;
    struct DownProvider;

    #[async_trait]
    impl HistoryProvider for FixedProvider {
        async fn fetch_bars(&self, request: ChartRequest) -> Result<BarSeries, ProviderError> {
            let bar = Bar::new(1, 1.0, 1.0, 1.0, 1.0, 1.0);
            let timespan = request.plan().timespan();
            Ok(BarSeries::new(request.symbol, timespan, vec![bar]))
        }
    }

    #[async_trait]
    impl HistoryProvider for DownProvider {
        async fn fetch_bars(&self, _request: ChartRequest) -> Result<BarSeries, ProviderError> {
            Err(ProviderError::Status { status: 503 })
        }
    }

    fn get_provider(name: &str) -> Arc<dyn HistoryProvider> {
        if name == "fixed" {
            Arc::new(FixedProvider)
        } else {
            Arc::new(DownProvider)
        }
    }

    #[tokio::test]
    async fn providers_are_usable_behind_dyn() {
        let request = ChartRequest::new("aapl", RangeSelection::Week);

        let series = get_provider("fixed").fetch_bars(request.clone()).await.unwrap();
        assert_eq!(series.symbol, "AAPL");
        assert_eq!(series.timespan, Timespan::Hour);

        let err = get_provider("down").fetch_bars(request).await.unwrap_err();
        assert_eq!(err.to_string(), "Request failed (503)");
    }
}
