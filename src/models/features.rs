use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Coarse market trend classification from moving-average structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarketRegime {
    Bull,
    Bear,
    Neutral,
}

impl std::fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketRegime::Bull => write!(f, "BULL"),
            MarketRegime::Bear => write!(f, "BEAR"),
            MarketRegime::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// Index-relative risk/return features for one symbol on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketFeatures {
    pub date: NaiveDate,
    /// Benchmark index daily return.
    pub market_return: f64,
    /// Stock return minus market return.
    pub relative_return: f64,
    /// 30-day rolling cov/var against the index. 1 before warm-up.
    pub beta: f64,
    /// 20-day rolling Pearson correlation with the index. 0 before warm-up.
    pub index_correlation: f64,
    /// Volatility-index close on this date.
    pub vix: f64,
    /// 10-day stock stdev minus index stdev.
    pub volatility_spread: f64,
    pub market_regime: MarketRegime,
    /// (index price − MA200) / MA200.
    pub distance_from_ma: f64,
}

/// Date-keyed collection of [`MarketFeatures`] with range slicing, so the
/// backtest can restrict a prediction to features visible inside its
/// context window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureSet {
    by_date: BTreeMap<NaiveDate, MarketFeatures>,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_features(features: Vec<MarketFeatures>) -> Self {
        Self {
            by_date: features.into_iter().map(|f| (f.date, f)).collect(),
        }
    }

    pub fn get(&self, date: NaiveDate) -> Option<&MarketFeatures> {
        self.by_date.get(&date)
    }

    pub fn len(&self) -> usize {
        self.by_date.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }

    /// Features with dates in `[start, end]`, both inclusive.
    pub fn in_range(&self, start: NaiveDate, end: NaiveDate) -> FeatureSet {
        Self {
            by_date: self
                .by_date
                .range(start..=end)
                .map(|(d, f)| (*d, f.clone()))
                .collect(),
        }
    }

    /// Iterate features in ascending date order.
    pub fn iter(&self) -> impl Iterator<Item = &MarketFeatures> {
        self.by_date.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::date;

    fn feature(d: NaiveDate) -> MarketFeatures {
        MarketFeatures {
            date: d,
            market_return: 0.0,
            relative_return: 0.0,
            beta: 1.0,
            index_correlation: 0.0,
            vix: 15.0,
            volatility_spread: 0.0,
            market_regime: MarketRegime::Neutral,
            distance_from_ma: 0.0,
        }
    }

    #[test]
    fn test_in_range_is_inclusive() {
        let set = FeatureSet::from_features(vec![
            feature(date(2024, 1, 1)),
            feature(date(2024, 1, 2)),
            feature(date(2024, 1, 3)),
            feature(date(2024, 1, 4)),
        ]);
        let window = set.in_range(date(2024, 1, 2), date(2024, 1, 3));
        assert_eq!(window.len(), 2);
        assert!(window.get(date(2024, 1, 2)).is_some());
        assert!(window.get(date(2024, 1, 3)).is_some());
        assert!(window.get(date(2024, 1, 4)).is_none());
    }

    #[test]
    fn test_lookup_by_date() {
        let set = FeatureSet::from_features(vec![feature(date(2024, 3, 15))]);
        assert!(set.get(date(2024, 3, 15)).is_some());
        assert!(set.get(date(2024, 3, 16)).is_none());
    }
}
