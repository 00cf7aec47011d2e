use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use crate::errors::EngineError;
use crate::forecaster::Forecaster;
use crate::models::config::EngineConfig;
use crate::models::features::FeatureSet;
use crate::models::price::PricePoint;
use crate::models::result::{BacktestResult, EquityPoint, Trade, TradeAction};
use crate::models::signal::SignalAction;

use super::metrics;
use super::prediction::{generate_signal, PredictionEngine};

/// Bounds the per-step prediction context to `window_size ×` this many
/// points, keeping each step's compute cost flat over long replays.
const CONTEXT_WINDOW_MULTIPLIER: usize = 4;

/// Running cash/shares state threaded through the simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortfolioState {
    pub cash: f64,
    pub shares: u64,
}

/// Replays prediction-driven trading signals over history, one day at a
/// time, using only information available up to each day.
pub struct BacktestEngine {
    config: EngineConfig,
    prediction: PredictionEngine,
}

impl BacktestEngine {
    pub fn new(config: EngineConfig) -> Self {
        let prediction = PredictionEngine::new(config.clone());
        Self { config, prediction }
    }

    /// Walk forward over the last `days` of `full_history`, predicting from a
    /// bounded context window and executing signals at the next day's open.
    ///
    /// Either returns a fully populated result or fails; no partial equity
    /// curves. Checks `cancel_flag` every day and reports progress as
    /// `(pct, current, total)`.
    pub fn run(
        &self,
        symbol: &str,
        forecaster: &dyn Forecaster,
        full_history: &[PricePoint],
        features: &FeatureSet,
        days: usize,
        cancel_flag: &AtomicBool,
        progress_callback: impl Fn(u8, usize, usize),
    ) -> Result<BacktestResult, EngineError> {
        let len = full_history.len();
        let start_index = len.saturating_sub(days + 1);
        let available = len - start_index;
        let needed = self.config.window_size + 1;
        if available < needed {
            return Err(EngineError::InsufficientData {
                symbol: symbol.to_string(),
                needed,
                available,
            });
        }

        let total_steps = len - start_index;
        info!(
            "Starting backtest for {}: {} steps, capital {:.2}",
            symbol, total_steps, self.config.initial_capital
        );

        let initial_capital = self.config.initial_capital;
        let mut state = PortfolioState {
            cash: initial_capital,
            shares: 0,
        };
        let mut trades: Vec<Trade> = Vec::new();
        let mut equity_curve: Vec<EquityPoint> = Vec::with_capacity(total_steps);

        for (step, i) in (start_index..len).enumerate() {
            if cancel_flag.load(Ordering::Relaxed) {
                info!("Backtest for {} cancelled at step {}/{}", symbol, step, total_steps);
                return Err(EngineError::BacktestCancelled);
            }
            let pct = (step as f64 / total_steps as f64 * 100.0) as u8;
            progress_callback(pct, step, total_steps);

            // The final day has no next open to execute at; it only closes
            // out the equity curve.
            if i + 1 < len {
                let context_start = (i + 1)
                    .saturating_sub(self.config.window_size * CONTEXT_WINDOW_MULTIPLIER);
                let context = &full_history[context_start..=i];
                // Features dated after day i must never reach the forecaster
                let visible_features =
                    features.in_range(context[0].date, full_history[i].date);

                let prediction = self.prediction.predict(
                    symbol,
                    forecaster,
                    context,
                    self.config.forecast_horizon,
                    Some(&visible_features),
                    cancel_flag,
                    |_, _| {},
                )?;
                let signal = generate_signal(&prediction, &self.config);

                let next_day = &full_history[i + 1];
                let (next_state, trade) = execute_signal(
                    state,
                    signal.action,
                    next_day.date,
                    next_day.open,
                    self.config.transaction_cost,
                );
                state = next_state;
                if let Some(trade) = trade {
                    trades.push(trade);
                }
            }

            equity_curve.push(EquityPoint {
                date: full_history[i].date,
                value: state.cash + state.shares as f64 * full_history[i].close,
            });
        }
        progress_callback(100, total_steps, total_steps);

        let first_close = full_history[start_index].close;
        let last_close = full_history[len - 1].close;
        let benchmark_return = (last_close - first_close) / first_close;

        let final_value = equity_curve[equity_curve.len() - 1].value;
        let total_return = (final_value - initial_capital) / initial_capital;
        let alpha = total_return - benchmark_return;
        let daily_returns = metrics::equity_returns(&equity_curve);

        info!(
            "Backtest for {} complete: {} trades, return {:+.2}%, alpha {:+.2}%",
            symbol,
            trades.len(),
            total_return * 100.0,
            alpha * 100.0
        );

        Ok(BacktestResult {
            drawdown: metrics::calculate_drawdown(&equity_curve),
            sharpe_ratio: metrics::calculate_sharpe(&daily_returns),
            win_rate: metrics::calculate_win_rate(&trades),
            equity_curve,
            trades,
            total_return,
            benchmark_return,
            alpha,
            final_value,
            initial_value: initial_capital,
        })
    }
}

/// Apply one trading signal at the next day's opening price.
///
/// Pure: `(state, signal, open) -> (state, trade?)`. BUY converts all cash
/// into whole shares after deducting the transaction cost; SELL liquidates
/// every share. Anything else, or an unexecutable action, is a no-op.
pub fn execute_signal(
    state: PortfolioState,
    action: SignalAction,
    date: NaiveDate,
    open_price: f64,
    cost_rate: f64,
) -> (PortfolioState, Option<Trade>) {
    match action {
        SignalAction::Buy if state.cash > 0.0 => {
            let cost = state.cash * cost_rate;
            let shares = ((state.cash - cost) / open_price).floor() as u64;
            if shares == 0 {
                return (state, None);
            }
            let value = shares as f64 * open_price;
            let trade = Trade {
                id: Uuid::new_v4(),
                action: TradeAction::Buy,
                date,
                price: open_price,
                shares,
                value,
            };
            (
                PortfolioState {
                    cash: state.cash - value - cost,
                    shares: state.shares + shares,
                },
                Some(trade),
            )
        }
        SignalAction::Sell if state.shares > 0 => {
            let value = state.shares as f64 * open_price;
            let cost = value * cost_rate;
            let trade = Trade {
                id: Uuid::new_v4(),
                action: TradeAction::Sell,
                date,
                price: open_price,
                shares: state.shares,
                value,
            };
            (
                PortfolioState {
                    cash: state.cash + value - cost,
                    shares: 0,
                },
                Some(trade),
            )
        }
        _ => (state, None),
    }
}
