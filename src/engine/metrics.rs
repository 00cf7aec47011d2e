use crate::models::result::{EquityPoint, Trade, TradeAction};

use super::stats;

/// Annualization basis for daily returns.
const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Maximum peak-to-trough decline as a fraction of the running peak.
pub fn calculate_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    if equity_curve.is_empty() {
        return 0.0;
    }
    let mut peak = equity_curve[0].value;
    let mut max_drawdown = 0.0f64;
    for point in equity_curve {
        if point.value > peak {
            peak = point.value;
        }
        if peak > 0.0 {
            let drawdown = (peak - point.value) / peak;
            if drawdown > max_drawdown {
                max_drawdown = drawdown;
            }
        }
    }
    max_drawdown
}

/// Annualized Sharpe ratio of daily returns: `mean / stdev × √252`.
/// 0 with fewer than two samples or zero variance.
pub fn calculate_sharpe(daily_returns: &[f64]) -> f64 {
    if daily_returns.len() < 2 {
        return 0.0;
    }
    let std_dev = stats::std_dev(daily_returns);
    if std_dev == 0.0 {
        return 0.0;
    }
    stats::mean(daily_returns) / std_dev * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Daily returns of an equity curve.
pub fn equity_returns(equity_curve: &[EquityPoint]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .filter(|w| w[0].value > 0.0)
        .map(|w| (w[1].value - w[0].value) / w[0].value)
        .collect()
}

/// Win rate over completed round trips. Trades pair greedily as alternating
/// (BUY, SELL); a pair wins when the sell's gross value exceeds the buy's.
/// Unpaired or out-of-order trades never form a pair.
pub fn calculate_win_rate(trades: &[Trade]) -> f64 {
    let mut pending_buy: Option<f64> = None;
    let mut pairs = 0usize;
    let mut wins = 0usize;
    for trade in trades {
        match trade.action {
            TradeAction::Buy => {
                if pending_buy.is_none() {
                    pending_buy = Some(trade.value);
                }
            }
            TradeAction::Sell => {
                if let Some(buy_value) = pending_buy.take() {
                    pairs += 1;
                    if trade.value > buy_value {
                        wins += 1;
                    }
                }
            }
        }
    }
    if pairs == 0 {
        0.0
    } else {
        wins as f64 / pairs as f64
    }
}
