use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use tracing::debug;

use crate::errors::EngineError;
use crate::forecaster::{Forecaster, PredictOptions};
use crate::models::config::EngineConfig;
use crate::models::features::FeatureSet;
use crate::models::forecast::{PredictedPoint, PredictionResult};
use crate::models::price::PricePoint;
use crate::models::signal::{SignalAction, TradingSignal};

use super::stats;

/// z-value for a two-sided 95% interval.
const CONFIDENCE_Z: f64 = 1.96;

/// MAPE assumed when a forecaster carries no evaluation metadata.
const DEFAULT_MAPE: f64 = 0.2;

/// Confidence is clamped into this band regardless of reported MAPE.
const CONFIDENCE_FLOOR: f64 = 0.1;
const CONFIDENCE_CEILING: f64 = 0.95;

/// Turns raw forecaster output into an uncertainty-quantified forecast and a
/// discrete trading signal.
pub struct PredictionEngine {
    config: EngineConfig,
}

impl PredictionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Produce a `horizon`-day forecast with 95% bounds.
    ///
    /// Uncertainty comes from repeated stochastic sampling: the forecaster
    /// runs `uncertainty_iterations` times with dropout left active, and each
    /// horizon day is summarized independently across the sampled paths.
    /// Checks `cancel_flag` between iterations and reports
    /// `(completed, total)` through `on_progress`.
    #[allow(clippy::too_many_arguments)]
    pub fn predict(
        &self,
        symbol: &str,
        forecaster: &dyn Forecaster,
        history: &[PricePoint],
        horizon: usize,
        features: Option<&FeatureSet>,
        cancel_flag: &AtomicBool,
        on_progress: impl Fn(usize, usize),
    ) -> Result<PredictionResult, EngineError> {
        if !forecaster.is_trained() {
            return Err(EngineError::NotTrained(symbol.to_string()));
        }
        if horizon == 0 {
            return Err(EngineError::InvalidHorizon);
        }
        if history.len() < self.config.window_size {
            return Err(EngineError::InsufficientData {
                symbol: symbol.to_string(),
                needed: self.config.window_size,
                available: history.len(),
            });
        }

        let iterations = self.config.uncertainty_iterations.max(1);
        let mut samples: Vec<Vec<f64>> = Vec::with_capacity(iterations);
        for i in 0..iterations {
            if cancel_flag.load(Ordering::Relaxed) {
                return Err(EngineError::PredictionCancelled);
            }
            let path =
                forecaster.predict(history, horizon, features, PredictOptions { training: true })?;
            if path.len() != horizon {
                return Err(EngineError::ForecastLengthMismatch {
                    expected: horizon,
                    actual: path.len(),
                });
            }
            samples.push(path);
            on_progress(i + 1, iterations);
        }

        // Summarize each horizon day independently across the sampled paths
        let mut mean_path = Vec::with_capacity(horizon);
        let mut lower_path = Vec::with_capacity(horizon);
        let mut upper_path = Vec::with_capacity(horizon);
        let mut day_samples = Vec::with_capacity(iterations);
        for day in 0..horizon {
            day_samples.clear();
            day_samples.extend(samples.iter().map(|path| path[day]));
            let mean = stats::mean(&day_samples);
            let sd = stats::population_std_dev(&day_samples);
            mean_path.push(mean);
            lower_path.push(mean - CONFIDENCE_Z * sd);
            upper_path.push(mean + CONFIDENCE_Z * sd);
        }

        let current_price = history[history.len() - 1].close;
        let percent_change = (mean_path[horizon - 1] - current_price) / current_price;
        let mape = forecaster
            .metadata()
            .and_then(|m| m.mape)
            .unwrap_or(DEFAULT_MAPE);
        let confidence = (1.0 - mape).clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEILING);

        let mut predicted_data = Vec::with_capacity(horizon);
        let mut forecast_date = history[history.len() - 1].date;
        for day in 0..horizon {
            forecast_date = next_trading_day(forecast_date);
            predicted_data.push(PredictedPoint {
                date: forecast_date,
                price: mean_path[day],
                lower_bound: lower_path[day],
                upper_bound: upper_path[day],
            });
        }

        debug!(
            "Prediction for {}: {:+.2}% over {} days, confidence {:.2}",
            symbol,
            percent_change * 100.0,
            horizon,
            confidence
        );

        Ok(PredictionResult {
            symbol: symbol.to_string(),
            current_price,
            predicted_prices: mean_path,
            lower_bound: lower_path[horizon - 1],
            upper_bound: upper_path[horizon - 1],
            confidence,
            percent_change,
            predicted_data,
        })
    }

    pub fn generate_signal(&self, prediction: &PredictionResult) -> TradingSignal {
        generate_signal(prediction, &self.config)
    }
}

/// Derive the discrete trading action from a prediction. Pure: identical
/// inputs always yield the identical signal.
pub fn generate_signal(prediction: &PredictionResult, config: &EngineConfig) -> TradingSignal {
    let delta = prediction.percent_change;
    let confidence = prediction.confidence;
    let (action, reason) = if delta >= config.buy_threshold && confidence >= config.min_confidence
    {
        (
            SignalAction::Buy,
            format!(
                "predicted move {:+.2}% reaches buy threshold {:+.2}%",
                delta * 100.0,
                config.buy_threshold * 100.0
            ),
        )
    } else if delta <= config.sell_threshold && confidence >= config.min_confidence {
        (
            SignalAction::Sell,
            format!(
                "predicted move {:+.2}% breaches sell threshold {:+.2}%",
                delta * 100.0,
                config.sell_threshold * 100.0
            ),
        )
    } else if confidence < config.min_confidence {
        (
            SignalAction::Hold,
            format!(
                "confidence {:.2} below minimum {:.2}",
                confidence, config.min_confidence
            ),
        )
    } else {
        (
            SignalAction::Hold,
            format!("predicted move {:+.2}% within thresholds", delta * 100.0),
        )
    };
    TradingSignal {
        action,
        confidence,
        delta,
        reason,
    }
}

/// The next weekday after `date`. Exchange holidays are not modeled.
fn next_trading_day(date: NaiveDate) -> NaiveDate {
    let mut next = date + Duration::days(1);
    while matches!(next.weekday(), Weekday::Sat | Weekday::Sun) {
        next += Duration::days(1);
    }
    next
}
