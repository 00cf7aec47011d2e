use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Training or evaluation metrics owned by a forecaster instance.
/// Read-only downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastMetrics {
    /// Validation loss the forecaster reports for itself.
    pub loss: f64,
    /// Mean Absolute Percentage Error, when an evaluation produced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mape: Option<f64>,
    pub is_valid: bool,
    pub data_points: usize,
    pub window_size: usize,
}

/// Pointwise error summary inside forecaster metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorStats {
    pub mean_absolute_error: f64,
    pub root_mean_squared_error: f64,
}

/// Metadata blob describing a trained forecaster. The external persistence
/// layer stores and restores these keyed by symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastMetadata {
    pub symbol: String,
    pub loss: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mape: Option<f64>,
    pub metrics: ErrorStats,
    pub data_points: usize,
    pub window_size: usize,
    /// Set when this metadata describes the best member of an ensemble;
    /// carries the member count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ensemble_size: Option<usize>,
}

/// A single forecast day with its confidence interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedPoint {
    pub date: NaiveDate,
    pub price: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

// Persistence stores metadata blobs keyed by symbol; the format is the
// external layer's concern, so these types only need to serde cleanly.

/// An uncertainty-quantified multi-day forecast for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub symbol: String,
    /// Last actual close the forecast starts from.
    pub current_price: f64,
    /// Mean forecast path, one value per horizon day.
    pub predicted_prices: Vec<f64>,
    /// 95% interval bounds on the final horizon day.
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// Model confidence in [0, 1], derived from evaluation MAPE.
    pub confidence: f64,
    /// Relative change from `current_price` to the final forecast day.
    pub percent_change: f64,
    pub predicted_data: Vec<PredictedPoint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_round_trips_through_json() {
        let meta = ForecastMetadata {
            symbol: "AAPL".into(),
            loss: 0.012,
            mape: Some(0.08),
            metrics: ErrorStats {
                mean_absolute_error: 1.4,
                root_mean_squared_error: 2.1,
            },
            data_points: 504,
            window_size: 30,
            ensemble_size: None,
        };
        let json = serde_json::to_string(&meta).expect("serialize");
        // Absent options stay out of the blob entirely
        assert!(!json.contains("ensemble_size"));
        let back: ForecastMetadata = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, meta);
    }
}
