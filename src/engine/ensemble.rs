use rayon::prelude::*;
use tracing::{debug, info};

use crate::errors::EngineError;
use crate::forecaster::{EpochCallback, Forecaster, PredictOptions};
use crate::models::config::EngineConfig;
use crate::models::features::FeatureSet;
use crate::models::forecast::{ForecastMetadata, ForecastMetrics};
use crate::models::price::PricePoint;

/// Floor applied to a variant's loss before inverting it, so a perfect
/// (zero-loss) variant cannot divide by zero.
const LOSS_EPSILON: f64 = 1e-6;

/// One architecture variant inside an ensemble.
pub struct EnsembleMember {
    pub architecture: String,
    pub forecaster: Box<dyn Forecaster>,
}

impl EnsembleMember {
    pub fn new(architecture: impl Into<String>, forecaster: Box<dyn Forecaster>) -> Self {
        Self {
            architecture: architecture.into(),
            forecaster,
        }
    }
}

/// A weighted set of architecturally distinct forecasters trained on
/// identical input. Owns its members and their weight vector exclusively;
/// weights sum to 1 and are recomputed only at train time.
pub struct EnsembleCombiner {
    members: Vec<EnsembleMember>,
    weights: Vec<f64>,
}

impl EnsembleCombiner {
    pub fn new(members: Vec<EnsembleMember>) -> Self {
        Self {
            members,
            weights: Vec::new(),
        }
    }

    /// Build members from the configured architecture list using a factory.
    pub fn from_architectures(
        architectures: &[String],
        mut factory: impl FnMut(&str) -> Box<dyn Forecaster>,
    ) -> Self {
        Self::new(
            architectures
                .iter()
                .map(|arch| EnsembleMember::new(arch.clone(), factory(arch)))
                .collect(),
        )
    }

    /// Per-variant weights, set at train time. Empty before training.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn best_member_index(&self) -> Option<usize> {
        self.weights
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
    }

    /// Inverse-loss weights: lower validation loss, more influence.
    fn compute_weights(losses: &[f64]) -> Vec<f64> {
        let inverse: Vec<f64> = losses.iter().map(|l| 1.0 / l.max(LOSS_EPSILON)).collect();
        let total: f64 = inverse.iter().sum();
        inverse.iter().map(|w| w / total).collect()
    }

    fn weighted_metrics(&self, per_member: &[ForecastMetrics]) -> ForecastMetrics {
        let loss = per_member
            .iter()
            .zip(&self.weights)
            .map(|(m, w)| w * m.loss)
            .sum();
        let mut mape_sum = 0.0;
        let mut mape_weight = 0.0;
        for (m, w) in per_member.iter().zip(&self.weights) {
            if let Some(mape) = m.mape {
                mape_sum += w * mape;
                mape_weight += w;
            }
        }
        ForecastMetrics {
            loss,
            mape: (mape_weight > 0.0).then(|| mape_sum / mape_weight),
            is_valid: per_member.iter().all(|m| m.is_valid),
            data_points: per_member[0].data_points,
            window_size: per_member[0].window_size,
        }
    }
}

impl Forecaster for EnsembleCombiner {
    /// Train every variant on the same input (variants are independent, so
    /// they train in parallel) and recompute the weight vector from each
    /// variant's validation loss.
    fn train(
        &mut self,
        series: &[PricePoint],
        config: &EngineConfig,
        _on_epoch: Option<EpochCallback<'_>>,
        features: Option<&FeatureSet>,
    ) -> Result<ForecastMetrics, EngineError> {
        if self.members.is_empty() {
            return Err(EngineError::EmptyEnsemble);
        }
        info!(
            "Training ensemble: {} variants on {} points",
            self.members.len(),
            series.len()
        );

        let per_member: Vec<ForecastMetrics> = self
            .members
            .par_iter_mut()
            .map(|m| m.forecaster.train(series, config, None, features))
            .collect::<Result<Vec<_>, _>>()?;

        self.weights = Self::compute_weights(
            &per_member.iter().map(|m| m.loss).collect::<Vec<_>>(),
        );
        for (member, weight) in self.members.iter().zip(&self.weights) {
            debug!(
                "Ensemble weight for {}: {:.4}",
                member.architecture, weight
            );
        }
        Ok(self.weighted_metrics(&per_member))
    }

    /// Per-day weight-weighted sum of every variant's forecast.
    fn predict(
        &self,
        series: &[PricePoint],
        horizon: usize,
        features: Option<&FeatureSet>,
        options: PredictOptions,
    ) -> Result<Vec<f64>, EngineError> {
        if !self.is_trained() {
            return Err(EngineError::EnsembleNotTrained);
        }
        let mut combined = vec![0.0; horizon];
        for (member, &weight) in self.members.iter().zip(&self.weights) {
            let path = member.forecaster.predict(series, horizon, features, options)?;
            if path.len() != horizon {
                return Err(EngineError::ForecastLengthMismatch {
                    expected: horizon,
                    actual: path.len(),
                });
            }
            for (c, p) in combined.iter_mut().zip(&path) {
                *c += weight * p;
            }
        }
        Ok(combined)
    }

    fn evaluate(
        &self,
        series: &[PricePoint],
        config: &EngineConfig,
        features: Option<&FeatureSet>,
    ) -> Result<ForecastMetrics, EngineError> {
        if !self.is_trained() {
            return Err(EngineError::EnsembleNotTrained);
        }
        let per_member: Vec<ForecastMetrics> = self
            .members
            .iter()
            .map(|m| m.forecaster.evaluate(series, config, features))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.weighted_metrics(&per_member))
    }

    fn is_trained(&self) -> bool {
        !self.weights.is_empty() && self.members.iter().all(|m| m.forecaster.is_trained())
    }

    /// The best (highest-weight) variant's metadata, tagged with the
    /// ensemble's member count.
    fn metadata(&self) -> Option<ForecastMetadata> {
        let best = self.best_member_index()?;
        let mut meta = self.members[best].forecaster.metadata()?;
        meta.ensemble_size = Some(self.members.len());
        Some(meta)
    }
}
