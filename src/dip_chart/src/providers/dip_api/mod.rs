//! REST client for the dip backend (charts, dip signals, ticker detail).

pub mod client;
pub mod params;
pub mod response;

pub use client::DipApiClient;
