//! Shared test fixtures: deterministic series builders and a mock forecaster.

use std::sync::Mutex;

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use crate::errors::EngineError;
use crate::forecaster::{EpochCallback, Forecaster, PredictOptions};
use crate::models::config::EngineConfig;
use crate::models::features::FeatureSet;
use crate::models::forecast::{ErrorStats, ForecastMetadata, ForecastMetrics};
use crate::models::price::PricePoint;
use crate::models::result::{Trade, TradeAction};

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// A plausible OHLCV point around the given close.
pub fn point_at(date: NaiveDate, close: f64) -> PricePoint {
    PricePoint {
        date,
        open: close * 0.99,
        high: close * 1.01,
        low: close * 0.98,
        close,
        adj_close: close,
        volume: 1_000,
    }
}

/// Consecutive daily points compounding at `daily_gain`.
pub fn trending_series(
    start: NaiveDate,
    len: usize,
    start_price: f64,
    daily_gain: f64,
) -> Vec<PricePoint> {
    (0..len)
        .map(|i| {
            let close = start_price * (1.0 + daily_gain).powi(i as i32);
            point_at(start + Duration::days(i as i64), close)
        })
        .collect()
}

/// Consecutive daily points with a deterministic up/down wiggle, so returns
/// have non-zero variance.
pub fn choppy_series(start: NaiveDate, len: usize, base: f64) -> Vec<PricePoint> {
    (0..len)
        .map(|i| {
            let wiggle = match i % 4 {
                0 => 0.0,
                1 => 0.004,
                2 => -0.003,
                _ => 0.002,
            };
            let close = base * (1.0 + 0.001 * i as f64) * (1.0 + wiggle);
            point_at(start + Duration::days(i as i64), close)
        })
        .collect()
}

pub fn make_trade(action: TradeAction, date: NaiveDate, price: f64, shares: u64) -> Trade {
    Trade {
        id: Uuid::new_v4(),
        action,
        date,
        price,
        shares,
        value: shares as f64 * price,
    }
}

/// Forecaster double: projects the last close forward at a fixed daily
/// drift, adding seeded noise when dropout-mode inference is requested.
pub struct MockForecaster {
    drift: f64,
    loss: f64,
    mape: Option<f64>,
    noise: f64,
    trained: bool,
    rng: Mutex<StdRng>,
}

impl MockForecaster {
    pub fn new(drift: f64) -> Self {
        Self {
            drift,
            loss: 0.01,
            mape: Some(0.1),
            noise: 0.0,
            trained: true,
            rng: Mutex::new(StdRng::seed_from_u64(7)),
        }
    }

    pub fn untrained(mut self) -> Self {
        self.trained = false;
        self
    }

    pub fn with_loss(mut self, loss: f64) -> Self {
        self.loss = loss;
        self
    }

    pub fn with_mape(mut self, mape: Option<f64>) -> Self {
        self.mape = mape;
        self
    }

    pub fn with_noise(mut self, noise: f64) -> Self {
        self.noise = noise;
        self
    }
}

impl Forecaster for MockForecaster {
    fn train(
        &mut self,
        series: &[PricePoint],
        config: &EngineConfig,
        on_epoch: Option<EpochCallback<'_>>,
        _features: Option<&FeatureSet>,
    ) -> Result<ForecastMetrics, EngineError> {
        self.trained = true;
        if let Some(cb) = on_epoch {
            cb(0, self.loss);
        }
        Ok(ForecastMetrics {
            loss: self.loss,
            mape: self.mape,
            is_valid: true,
            data_points: series.len(),
            window_size: config.window_size,
        })
    }

    fn predict(
        &self,
        series: &[PricePoint],
        horizon: usize,
        _features: Option<&FeatureSet>,
        options: PredictOptions,
    ) -> Result<Vec<f64>, EngineError> {
        let last = series
            .last()
            .map(|p| p.close)
            .ok_or_else(|| EngineError::EmptySeries("mock".into()))?;
        let mut rng = self.rng.lock().unwrap();
        Ok((1..=horizon as i32)
            .map(|k| {
                let noise = if options.training && self.noise > 0.0 {
                    rng.gen_range(-self.noise..=self.noise)
                } else {
                    0.0
                };
                last * (1.0 + self.drift).powi(k) * (1.0 + noise)
            })
            .collect())
    }

    fn evaluate(
        &self,
        series: &[PricePoint],
        config: &EngineConfig,
        _features: Option<&FeatureSet>,
    ) -> Result<ForecastMetrics, EngineError> {
        Ok(ForecastMetrics {
            loss: self.loss,
            mape: self.mape,
            is_valid: true,
            data_points: series.len(),
            window_size: config.window_size,
        })
    }

    fn is_trained(&self) -> bool {
        self.trained
    }

    fn metadata(&self) -> Option<ForecastMetadata> {
        if !self.trained {
            return None;
        }
        Some(ForecastMetadata {
            symbol: "MOCK".into(),
            loss: self.loss,
            mape: self.mape,
            metrics: ErrorStats {
                mean_absolute_error: self.loss,
                root_mean_squared_error: self.loss.sqrt(),
            },
            data_points: 0,
            window_size: 0,
            ensemble_size: None,
        })
    }
}
