use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::price_row::PriceRow;

/// How a tracked trade ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeOutcome {
    /// Still open when the price series ran out
    Open,
    /// Closed once the expiry horizon was reached
    Expired,
}

/// Hypothetical call position opened on a breakout day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OptionTrade {
    /// Window size that triggered the entry
    pub breakout_days: usize,
    /// LTP on the entry day
    pub start_price: f64,
    #[schema(value_type = String, format = Date)]
    pub start_date: NaiveDate,
    /// Tracked high since entry
    pub current_limit: f64,
    /// % move from `start_price` to `current_limit`
    pub change: f64,
    /// Calendar days from entry to the last update
    pub days: i64,
    pub outcome: TradeOutcome,
}

impl OptionTrade {
    pub fn open(breakout_days: usize, row: &PriceRow) -> Self {
        Self {
            breakout_days,
            start_price: row.last_price,
            start_date: row.date,
            current_limit: row.high,
            change: 0.0,
            days: 0,
            outcome: TradeOutcome::Open,
        }
    }

    pub fn update_change(&mut self, high: f64, date: NaiveDate) {
        self.current_limit = high;
        self.change = percent_change(self.start_price, high);
        self.days = self.days_since_start(date);
    }

    pub fn days_since_start(&self, date: NaiveDate) -> i64 {
        (date - self.start_date).num_days()
    }

    pub fn expire(mut self) -> Self {
        self.outcome = TradeOutcome::Expired;
        self
    }
}

fn percent_change(from: f64, to: f64) -> f64 {
    if from == 0.0 {
        return 0.0;
    }
    (to - from) / from * 100.0
}
