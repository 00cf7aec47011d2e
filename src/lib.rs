//! Quantitative evaluation engine for security price forecasting.
//!
//! The crate repairs and scores raw daily price series
//! ([`engine::quality`]), derives index-relative features
//! ([`engine::features`]), combines forecasting variants by inverse
//! validation loss ([`engine::ensemble`]), turns raw model output into an
//! uncertainty-quantified forecast with a trading signal
//! ([`engine::prediction`]) and replays those signals against history
//! ([`engine::backtest`]).
//!
//! Forecasting backends stay external: anything implementing
//! [`forecaster::Forecaster`] plugs in, alone or as an ensemble. Market
//! data, persistence and report rendering are likewise collaborator
//! concerns; this crate is consumed as a library and installs no tracing
//! subscriber of its own.

pub mod engine;
pub mod errors;
pub mod forecaster;
pub mod models;

#[cfg(test)]
mod testutil;
