use serde::Serialize;

/// All engine errors, categorized by domain. Each variant carries the symbol
/// or the numbers a caller needs to report a per-symbol status.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    // ── Data ──
    #[error("Empty price series for {0}")]
    EmptySeries(String),

    #[error("Price series for {0} is not strictly ascending by date")]
    UnsortedSeries(String),

    #[error("Insufficient data for {symbol}: need {needed} points, got {available}")]
    InsufficientData {
        symbol: String,
        needed: usize,
        available: usize,
    },

    #[error("Data quality too low for {symbol}: score {score:.1} below minimum {minimum:.1}")]
    QualityBelowThreshold {
        symbol: String,
        score: f64,
        minimum: f64,
    },

    #[error("Too much interpolated data for {symbol}: {percent:.1}% exceeds {maximum:.1}%")]
    ExcessiveInterpolation {
        symbol: String,
        percent: f64,
        maximum: f64,
    },

    // ── Model ──
    #[error("Model for {0} is not trained")]
    NotTrained(String),

    #[error("Ensemble not trained")]
    EnsembleNotTrained,

    #[error("Ensemble has no members")]
    EmptyEnsemble,

    #[error("Forecast length mismatch: expected {expected} days, got {actual}")]
    ForecastLengthMismatch { expected: usize, actual: usize },

    // ── Prediction ──
    #[error("Forecast horizon must be at least 1 day")]
    InvalidHorizon,

    #[error("Prediction cancelled")]
    PredictionCancelled,

    // ── Backtest ──
    #[error("Backtest cancelled")]
    BacktestCancelled,
}

/// Coarse error category. Orchestration layers catch per-symbol failures at
/// the boundary and convert them into statuses keyed by this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ErrorCategory {
    Data,
    Model,
    Prediction,
    Cancelled,
}

impl EngineError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EngineError::EmptySeries(_)
            | EngineError::UnsortedSeries(_)
            | EngineError::InsufficientData { .. }
            | EngineError::QualityBelowThreshold { .. }
            | EngineError::ExcessiveInterpolation { .. } => ErrorCategory::Data,
            EngineError::NotTrained(_)
            | EngineError::EnsembleNotTrained
            | EngineError::EmptyEnsemble
            | EngineError::ForecastLengthMismatch { .. } => ErrorCategory::Model,
            EngineError::InvalidHorizon => ErrorCategory::Prediction,
            EngineError::PredictionCancelled | EngineError::BacktestCancelled => {
                ErrorCategory::Cancelled
            }
        }
    }
}
