use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::models::features::{MarketFeatures, MarketRegime};
use crate::models::price::PricePoint;

use super::stats;

/// Rolling window for beta (cov/var against the index).
const BETA_WINDOW: usize = 30;

/// Rolling window for Pearson correlation with the index.
const CORRELATION_WINDOW: usize = 20;

/// Rolling window for the stock-vs-index volatility spread.
const VOLATILITY_WINDOW: usize = 10;

/// Index history required before a regime can be classified.
const REGIME_LONG_WINDOW: usize = 200;
const REGIME_SHORT_WINDOW: usize = 50;

/// Derive index-relative features for one symbol.
///
/// Emits one entry per stock date where the benchmark index and the
/// volatility index both have data and the index carries enough history to
/// classify a regime; any other date is skipped. Rolling statistics fall
/// back to their neutral defaults (beta 1, correlation 0, spread 0) until
/// their windows fill.
pub fn calculate_features(
    symbol: &str,
    stock: &[PricePoint],
    index: &[PricePoint],
    vol_index: &[PricePoint],
) -> Vec<MarketFeatures> {
    let index_pos: HashMap<NaiveDate, usize> = index
        .iter()
        .enumerate()
        .map(|(i, p)| (p.date, i))
        .collect();
    let vol_close: HashMap<NaiveDate, f64> =
        vol_index.iter().map(|p| (p.date, p.close)).collect();
    let index_close: Vec<f64> = index.iter().map(|p| p.close).collect();

    // Aligned return history, grown only on dates where both series trade
    let mut stock_returns: Vec<f64> = Vec::with_capacity(stock.len());
    let mut market_returns: Vec<f64> = Vec::with_capacity(stock.len());
    let mut features = Vec::new();

    for w in stock.windows(2) {
        let (prev, cur) = (&w[0], &w[1]);
        let (Some(&j), Some(&j_prev)) = (index_pos.get(&cur.date), index_pos.get(&prev.date))
        else {
            continue;
        };

        let stock_return = (cur.close - prev.close) / prev.close;
        let market_return = (index_close[j] - index_close[j_prev]) / index_close[j_prev];
        stock_returns.push(stock_return);
        market_returns.push(market_return);

        if j + 1 < REGIME_LONG_WINDOW {
            continue;
        }
        let Some(&vix) = vol_close.get(&cur.date) else {
            continue;
        };

        let (market_regime, distance_from_ma) = classify_regime(&index_close[..=j]);

        features.push(MarketFeatures {
            date: cur.date,
            market_return,
            relative_return: stock_return - market_return,
            beta: rolling_beta(&stock_returns, &market_returns),
            index_correlation: rolling_correlation(&stock_returns, &market_returns),
            vix,
            volatility_spread: rolling_volatility_spread(&stock_returns, &market_returns),
            market_regime,
            distance_from_ma,
        });
    }

    debug!(
        "Features for {}: {} dates from {} stock points",
        symbol,
        features.len(),
        stock.len()
    );
    features
}

fn rolling_beta(stock: &[f64], market: &[f64]) -> f64 {
    if stock.len() < BETA_WINDOW {
        return 1.0;
    }
    let m = stats::tail(market, BETA_WINDOW);
    let variance = stats::variance(m);
    if variance < f64::EPSILON {
        return 1.0;
    }
    stats::covariance(stats::tail(stock, BETA_WINDOW), m) / variance
}

fn rolling_correlation(stock: &[f64], market: &[f64]) -> f64 {
    if stock.len() < CORRELATION_WINDOW {
        return 0.0;
    }
    stats::correlation(
        stats::tail(stock, CORRELATION_WINDOW),
        stats::tail(market, CORRELATION_WINDOW),
    )
}

fn rolling_volatility_spread(stock: &[f64], market: &[f64]) -> f64 {
    if stock.len() < VOLATILITY_WINDOW {
        return 0.0;
    }
    stats::std_dev(stats::tail(stock, VOLATILITY_WINDOW))
        - stats::std_dev(stats::tail(market, VOLATILITY_WINDOW))
}

/// Classify the index trend from its 50/200-day moving averages.
/// Caller guarantees at least [`REGIME_LONG_WINDOW`] closes.
fn classify_regime(index_closes: &[f64]) -> (MarketRegime, f64) {
    let price = index_closes[index_closes.len() - 1];
    let ma200 = stats::mean(stats::tail(index_closes, REGIME_LONG_WINDOW));
    let ma50 = stats::mean(stats::tail(index_closes, REGIME_SHORT_WINDOW));
    let regime = if price > ma200 && ma50 > ma200 {
        MarketRegime::Bull
    } else if price < ma200 && ma50 < ma200 {
        MarketRegime::Bear
    } else {
        MarketRegime::Neutral
    };
    (regime, (price - ma200) / ma200)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{choppy_series, date, trending_series};

    #[test]
    fn test_warm_up_skips_early_dates() {
        // 100 index days is under the 200-day regime requirement
        let stock = trending_series(date(2024, 1, 1), 100, 50.0, 0.001);
        let index = trending_series(date(2024, 1, 1), 100, 4000.0, 0.001);
        let vol = trending_series(date(2024, 1, 1), 100, 15.0, 0.0);
        assert!(calculate_features("TEST", &stock, &index, &vol).is_empty());
    }

    #[test]
    fn test_uptrend_classifies_bull() {
        let stock = choppy_series(date(2023, 1, 1), 260, 50.0);
        let index = trending_series(date(2023, 1, 1), 260, 4000.0, 0.002);
        let vol = trending_series(date(2023, 1, 1), 260, 15.0, 0.0);
        let features = calculate_features("TEST", &stock, &index, &vol);

        // First 199 index days are warm-up; stock date k pairs with index date k
        assert_eq!(features.len(), 260 - REGIME_LONG_WINDOW + 1);
        let last = &features[features.len() - 1];
        assert_eq!(last.market_regime, MarketRegime::Bull);
        assert!(last.distance_from_ma > 0.0);
        assert!((last.vix - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_downtrend_classifies_bear() {
        let stock = choppy_series(date(2023, 1, 1), 260, 50.0);
        let index = trending_series(date(2023, 1, 1), 260, 4000.0, -0.002);
        let vol = trending_series(date(2023, 1, 1), 260, 15.0, 0.0);
        let features = calculate_features("TEST", &stock, &index, &vol);
        let last = &features[features.len() - 1];
        assert_eq!(last.market_regime, MarketRegime::Bear);
        assert!(last.distance_from_ma < 0.0);
    }

    #[test]
    fn test_relative_return_is_stock_minus_market() {
        let stock = choppy_series(date(2023, 1, 1), 210, 50.0);
        let index = trending_series(date(2023, 1, 1), 210, 4000.0, 0.001);
        let vol = trending_series(date(2023, 1, 1), 210, 15.0, 0.0);
        let features = calculate_features("TEST", &stock, &index, &vol);
        assert!(!features.is_empty());
        for f in &features {
            // market_return of the constant-gain index is always 0.001
            assert!((f.market_return - 0.001).abs() < 1e-9);
            let implied_stock = f.relative_return + f.market_return;
            assert!(implied_stock.is_finite());
        }
    }

    #[test]
    fn test_missing_vix_date_is_skipped() {
        let stock = choppy_series(date(2023, 1, 1), 210, 50.0);
        let index = trending_series(date(2023, 1, 1), 210, 4000.0, 0.001);
        // Volatility series stops 5 days early
        let vol = trending_series(date(2023, 1, 1), 205, 15.0, 0.0);
        let features = calculate_features("TEST", &stock, &index, &vol);
        assert_eq!(features.len(), 210 - REGIME_LONG_WINDOW + 1 - 5);
    }

    #[test]
    fn test_identical_series_has_unit_beta_and_full_correlation() {
        // Stock that IS the index: beta 1, correlation 1, zero spread
        let index = choppy_series(date(2023, 1, 1), 240, 4000.0);
        let stock = index.clone();
        let vol = trending_series(date(2023, 1, 1), 240, 15.0, 0.0);
        let features = calculate_features("TEST", &stock, &index, &vol);
        let last = &features[features.len() - 1];
        assert!((last.beta - 1.0).abs() < 1e-9, "beta {}", last.beta);
        assert!(
            (last.index_correlation - 1.0).abs() < 1e-9,
            "corr {}",
            last.index_correlation
        );
        assert!(last.volatility_spread.abs() < 1e-12);
        assert!(last.relative_return.abs() < 1e-12);
    }
}
