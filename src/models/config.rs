use serde::{Deserialize, Serialize};

/// Engine-wide configuration. Every field has a default so partial
/// configurations deserialize cleanly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Input window length the forecaster consumes per prediction.
    pub window_size: usize,
    /// Number of stochastic forward passes for uncertainty estimation.
    pub uncertainty_iterations: usize,
    /// Days predicted per backtest step.
    pub forecast_horizon: usize,
    /// Minimum predicted relative gain that produces a BUY signal.
    pub buy_threshold: f64,
    /// Maximum predicted relative loss (negative) that produces a SELL signal.
    pub sell_threshold: f64,
    /// Minimum model confidence required for BUY/SELL signals.
    pub min_confidence: f64,
    /// Starting cash for backtests.
    pub initial_capital: f64,
    /// Proportional transaction cost charged per trade.
    pub transaction_cost: f64,
    /// Minimum acceptable data-quality score (0-100).
    pub min_quality_score: f64,
    /// Ensemble architecture variants, in training order.
    pub architectures: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_size: 30,
            uncertainty_iterations: 30,
            forecast_horizon: 5,
            buy_threshold: 0.02,
            sell_threshold: -0.02,
            min_confidence: 0.6,
            initial_capital: 10_000.0,
            transaction_cost: 0.001,
            min_quality_score: 60.0,
            architectures: vec!["lstm".into(), "gru".into(), "dense".into()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"window_size": 15, "buy_threshold": 0.05}"#)
                .expect("partial config should deserialize");
        assert_eq!(config.window_size, 15);
        assert!((config.buy_threshold - 0.05).abs() < 1e-12);
        // Untouched fields fall back to defaults
        assert_eq!(config.uncertainty_iterations, 30);
        assert!((config.initial_capital - 10_000.0).abs() < 1e-9);
        assert_eq!(config.architectures.len(), 3);
    }

    #[test]
    fn test_empty_config_is_default() {
        let config: EngineConfig = serde_json::from_str("{}").expect("empty config");
        assert_eq!(config.window_size, 30);
        assert!((config.sell_threshold + 0.02).abs() < 1e-12);
        assert!((config.min_quality_score - 60.0).abs() < 1e-12);
    }
}
