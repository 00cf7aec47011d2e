use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single daily price record for one symbol.
///
/// Series invariant: one point per calendar date, strictly ascending by date,
/// all prices positive, volume non-negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: u64,
}
