//! Bar-series ingestion for a stock dip chart.
//!
//! A [`ChartSession`] fetches a historical series for one symbol and range
//! through a [`HistoryProvider`], keeps it in a bounded [`BarStore`], and
//! for the intraday range merges live bars streamed over WebSocket. The
//! [`render`] module turns the store's contents into screen coordinates,
//! hover targets and labels.

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod errors;
pub mod events;
pub mod feed;
pub mod loader;
pub mod models;
pub mod providers;
pub mod render;
pub mod session;
pub mod store;

pub use errors::{Error, Result};
pub use providers::{HistoryProvider, ProviderError, dip_api::DipApiClient};
pub use session::{ChartSession, SessionUpdate};
pub use store::{BarStore, MAX_BARS};
