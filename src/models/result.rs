use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of an executed trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
}

/// A simulated trade, appended to the backtest log as it executes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: Uuid,
    pub action: TradeAction,
    pub date: NaiveDate,
    /// Execution price: always an opening price.
    pub price: f64,
    pub shares: u64,
    /// Gross value `shares × price`, before transaction costs.
    pub value: f64,
}

/// A point on the equity curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Complete results of one walk-forward backtest run. Produced once,
/// immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<Trade>,
    pub total_return: f64,
    /// Buy-and-hold return of the symbol over the same window.
    pub benchmark_return: f64,
    /// `total_return − benchmark_return`.
    pub alpha: f64,
    /// Maximum peak-to-trough decline as a fraction of the peak.
    pub drawdown: f64,
    /// Annualized mean/stdev of daily equity returns.
    pub sharpe_ratio: f64,
    /// Share of completed BUY→SELL round trips that gained value.
    pub win_rate: f64,
    pub final_value: f64,
    pub initial_value: f64,
}
