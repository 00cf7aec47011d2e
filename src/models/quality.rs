use serde::{Deserialize, Serialize};

use super::price::PricePoint;

/// A gap between two consecutive points in a raw series.
/// `gap_days` is the calendar-day delta between the bounding points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceGap {
    pub start_index: usize,
    pub end_index: usize,
    pub gap_days: i64,
}

/// Outcome of running the data-quality pipeline over one symbol's raw series.
/// Produced once per sync and immutable afterwards; training and backtest
/// gating read it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataQualityResult {
    /// The repaired series, interpolated points included.
    pub data: Vec<PricePoint>,
    pub gaps_detected: usize,
    pub interpolated_count: usize,
    /// Indices into `data`, ascending.
    pub interpolated_indices: Vec<usize>,
    /// Share of `data` that was synthesized, in [0, 1].
    pub interpolated_percent: f64,
    pub outlier_count: usize,
    /// Indices into `data` of points whose day-over-day return deviates
    /// abnormally from the trailing window. Flagged, never removed.
    pub outlier_indices: Vec<usize>,
    /// Total calendar days missing across all gaps, filled or not.
    pub missing_days: u32,
    /// Composite quality score in [0, 100], one decimal.
    pub quality_score: f64,
}
