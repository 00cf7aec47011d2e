use crate::engine::ensemble::EnsembleCombiner;
use crate::errors::EngineError;
use crate::models::config::EngineConfig;
use crate::models::features::FeatureSet;
use crate::models::forecast::{ForecastMetadata, ForecastMetrics};
use crate::models::price::PricePoint;

/// Per-epoch training progress callback: `(epoch, loss)`.
pub type EpochCallback<'a> = &'a mut dyn FnMut(usize, f64);

/// Inference-time options.
#[derive(Debug, Clone, Copy, Default)]
pub struct PredictOptions {
    /// Leave stochastic regularization (dropout) active during inference.
    /// The prediction engine uses this for Monte-Carlo uncertainty sampling.
    pub training: bool,
}

/// Contract every forecasting backend satisfies. The quantitative core never
/// sees training-loop internals; any backend that can learn from a price
/// series and emit a horizon-length price path plugs in here.
///
/// `Send` so ensemble variants can train on worker threads.
pub trait Forecaster: Send {
    /// Train on the full series. Returns the backend's validation metrics.
    fn train(
        &mut self,
        series: &[PricePoint],
        config: &EngineConfig,
        on_epoch: Option<EpochCallback<'_>>,
        features: Option<&FeatureSet>,
    ) -> Result<ForecastMetrics, EngineError>;

    /// Forecast `horizon` daily prices following the end of `series`.
    /// The returned path must be exactly `horizon` long.
    fn predict(
        &self,
        series: &[PricePoint],
        horizon: usize,
        features: Option<&FeatureSet>,
        options: PredictOptions,
    ) -> Result<Vec<f64>, EngineError>;

    /// Evaluate against held-out data; the returned metrics carry a MAPE.
    fn evaluate(
        &self,
        series: &[PricePoint],
        config: &EngineConfig,
        features: Option<&FeatureSet>,
    ) -> Result<ForecastMetrics, EngineError>;

    fn is_trained(&self) -> bool;

    /// Metadata blob for the persistence layer. `None` until trained.
    fn metadata(&self) -> Option<ForecastMetadata>;
}

/// A forecasting model: a single backend or a weighted ensemble of variants.
/// Both satisfy [`Forecaster`], so downstream engines never branch on which
/// one they were handed.
pub enum Model {
    Single(Box<dyn Forecaster>),
    Ensemble(EnsembleCombiner),
}

impl Forecaster for Model {
    fn train(
        &mut self,
        series: &[PricePoint],
        config: &EngineConfig,
        on_epoch: Option<EpochCallback<'_>>,
        features: Option<&FeatureSet>,
    ) -> Result<ForecastMetrics, EngineError> {
        match self {
            Model::Single(f) => f.train(series, config, on_epoch, features),
            Model::Ensemble(e) => e.train(series, config, on_epoch, features),
        }
    }

    fn predict(
        &self,
        series: &[PricePoint],
        horizon: usize,
        features: Option<&FeatureSet>,
        options: PredictOptions,
    ) -> Result<Vec<f64>, EngineError> {
        match self {
            Model::Single(f) => f.predict(series, horizon, features, options),
            Model::Ensemble(e) => e.predict(series, horizon, features, options),
        }
    }

    fn evaluate(
        &self,
        series: &[PricePoint],
        config: &EngineConfig,
        features: Option<&FeatureSet>,
    ) -> Result<ForecastMetrics, EngineError> {
        match self {
            Model::Single(f) => f.evaluate(series, config, features),
            Model::Ensemble(e) => e.evaluate(series, config, features),
        }
    }

    fn is_trained(&self) -> bool {
        match self {
            Model::Single(f) => f.is_trained(),
            Model::Ensemble(e) => e.is_trained(),
        }
    }

    fn metadata(&self) -> Option<ForecastMetadata> {
        match self {
            Model::Single(f) => f.metadata(),
            Model::Ensemble(e) => e.metadata(),
        }
    }
}
