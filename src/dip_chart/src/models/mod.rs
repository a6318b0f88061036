pub mod bar;
pub mod bar_series;
pub mod dips;
pub mod range;
pub mod request_params;
