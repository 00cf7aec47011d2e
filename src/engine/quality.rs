use chrono::{Duration, NaiveDate};
use tracing::debug;

use crate::errors::EngineError;
use crate::models::price::PricePoint;
use crate::models::quality::{DataQualityResult, PriceGap};

use super::stats;

/// Largest run of missing days that interpolation will fill. A gap spanning
/// `MAX_GAP + 1` calendar days between its bounding points is still filled;
/// anything wider is only counted.
const MAX_GAP: i64 = 3;

/// Trailing-returns window for outlier z-scoring.
const OUTLIER_WINDOW: usize = 20;

/// Minimum samples in the trailing window before a point can be flagged.
const MIN_OUTLIER_SAMPLES: usize = 10;

/// Deviation multiple that marks a day-over-day return as an outlier.
const OUTLIER_STD_MULTIPLE: f64 = 3.0;

/// Ceiling on the share of interpolated points an acceptable series may have.
const MAX_INTERPOLATED_PERCENT: f64 = 0.10;

/// Repairs and scores one symbol's raw daily price series.
#[derive(Debug, Clone)]
pub struct DataQualityPipeline {
    min_quality_score: f64,
}

impl DataQualityPipeline {
    pub fn new(min_quality_score: f64) -> Self {
        Self { min_quality_score }
    }

    /// Detect gaps, fill the small ones, flag outliers and score the series.
    pub fn process_data(
        &self,
        symbol: &str,
        points: &[PricePoint],
    ) -> Result<DataQualityResult, EngineError> {
        if points.is_empty() {
            return Err(EngineError::EmptySeries(symbol.to_string()));
        }
        if points.windows(2).any(|w| w[1].date <= w[0].date) {
            return Err(EngineError::UnsortedSeries(symbol.to_string()));
        }

        let gaps = detect_gaps(points);
        let (data, interpolated_indices) = fill_gaps(points);

        let large_gaps = gaps.iter().filter(|g| g.gap_days > MAX_GAP + 1).count();
        let missing_days: u32 = gaps.iter().map(|g| (g.gap_days - 1) as u32).sum();
        let interpolated_percent = interpolated_indices.len() as f64 / data.len() as f64;
        let outlier_indices = flag_outliers(&data);

        let quality_score = quality_score(
            data.len(),
            interpolated_percent,
            large_gaps,
            points[0].date,
            points[points.len() - 1].date,
        );

        debug!(
            "Data quality for {}: score {:.1}, {} gaps, {} interpolated, {} outliers",
            symbol,
            quality_score,
            gaps.len(),
            interpolated_indices.len(),
            outlier_indices.len()
        );

        Ok(DataQualityResult {
            data,
            gaps_detected: gaps.len(),
            interpolated_count: interpolated_indices.len(),
            interpolated_indices,
            interpolated_percent,
            outlier_count: outlier_indices.len(),
            outlier_indices,
            missing_days,
            quality_score,
        })
    }

    /// Training gate: a series is acceptable when little of it is synthetic
    /// and the composite score clears the configured minimum.
    pub fn is_quality_acceptable(&self, result: &DataQualityResult) -> bool {
        result.interpolated_percent <= MAX_INTERPOLATED_PERCENT
            && result.quality_score >= self.min_quality_score
    }

    /// [`Self::is_quality_acceptable`] as a fail-fast check for callers that
    /// gate training on it.
    pub fn ensure_acceptable(
        &self,
        symbol: &str,
        result: &DataQualityResult,
    ) -> Result<(), EngineError> {
        if result.interpolated_percent > MAX_INTERPOLATED_PERCENT {
            return Err(EngineError::ExcessiveInterpolation {
                symbol: symbol.to_string(),
                percent: result.interpolated_percent * 100.0,
                maximum: MAX_INTERPOLATED_PERCENT * 100.0,
            });
        }
        if result.quality_score < self.min_quality_score {
            return Err(EngineError::QualityBelowThreshold {
                symbol: symbol.to_string(),
                score: result.quality_score,
                minimum: self.min_quality_score,
            });
        }
        Ok(())
    }
}

impl Default for DataQualityPipeline {
    fn default() -> Self {
        Self::new(60.0)
    }
}

/// Scan consecutive points for calendar-day deltas greater than one.
fn detect_gaps(points: &[PricePoint]) -> Vec<PriceGap> {
    let mut gaps = Vec::new();
    for i in 1..points.len() {
        let gap_days = (points[i].date - points[i - 1].date).num_days();
        if gap_days > 1 {
            gaps.push(PriceGap {
                start_index: i - 1,
                end_index: i,
                gap_days,
            });
        }
    }
    gaps
}

/// Rebuild the series with small gaps filled by per-field linear
/// interpolation at daily synthetic dates. Returns the repaired series and
/// the indices of the synthetic points, ascending.
fn fill_gaps(points: &[PricePoint]) -> (Vec<PricePoint>, Vec<usize>) {
    let mut data = Vec::with_capacity(points.len());
    let mut interpolated = Vec::new();
    data.push(points[0].clone());

    for i in 1..points.len() {
        let prev = &points[i - 1];
        let next = &points[i];
        let gap_days = (next.date - prev.date).num_days();
        if gap_days > 1 && gap_days <= MAX_GAP + 1 {
            for k in 1..gap_days {
                data.push(interpolate_point(prev, next, k, gap_days));
                interpolated.push(data.len() - 1);
            }
        }
        data.push(next.clone());
    }
    (data, interpolated)
}

fn interpolate_point(
    prev: &PricePoint,
    next: &PricePoint,
    day_offset: i64,
    gap_days: i64,
) -> PricePoint {
    let t = day_offset as f64 / gap_days as f64;
    let lerp = |a: f64, b: f64| a + (b - a) * t;
    PricePoint {
        date: prev.date + Duration::days(day_offset),
        open: lerp(prev.open, next.open),
        high: lerp(prev.high, next.high),
        low: lerp(prev.low, next.low),
        close: lerp(prev.close, next.close),
        adj_close: lerp(prev.adj_close, next.adj_close),
        volume: lerp(prev.volume as f64, next.volume as f64).round() as u64,
    }
}

/// Flag points whose day-over-day return deviates from the trailing window's
/// mean by more than [`OUTLIER_STD_MULTIPLE`] standard deviations. Flagged
/// points stay in the series.
fn flag_outliers(data: &[PricePoint]) -> Vec<usize> {
    let returns: Vec<f64> = data
        .windows(2)
        .map(|w| (w[1].close - w[0].close) / w[0].close)
        .collect();

    let mut outliers = Vec::new();
    for i in 0..returns.len() {
        let start = i.saturating_sub(OUTLIER_WINDOW);
        let window = &returns[start..i];
        if window.len() < MIN_OUTLIER_SAMPLES {
            continue;
        }
        let mean = stats::mean(window);
        let sd = stats::std_dev(window);
        if sd > 0.0 && (returns[i] - mean).abs() > OUTLIER_STD_MULTIPLE * sd {
            // Return i is the move into point i + 1
            outliers.push(i + 1);
        }
    }
    outliers
}

/// Weighted composite: completeness 0.4, large-gap penalty 0.3, density 0.3.
/// Rounded to one decimal.
fn quality_score(
    point_count: usize,
    interpolated_percent: f64,
    large_gaps: usize,
    first: NaiveDate,
    last: NaiveDate,
) -> f64 {
    let completeness = 1.0 - interpolated_percent;
    let gap_penalty = (1.0 - large_gaps as f64 / 10.0).max(0.0);
    let calendar_days = (last - first).num_days() + 1;
    let expected_trading_days = calendar_days as f64 * 5.0 / 7.0;
    let density = if expected_trading_days > 0.0 {
        (point_count as f64 / expected_trading_days).min(1.0)
    } else {
        1.0
    };
    let score = (completeness * 0.4 + gap_penalty * 0.3 + density * 0.3) * 100.0;
    (score * 10.0).round() / 10.0
}
