use chrono::NaiveDate;

use crate::business_logic::config::BreakoutConfig;
use crate::business_logic::preprocess::preprocess;
use crate::business_logic::today::append_today;
use crate::errors::AppError;
use crate::models::price_row::{PriceRow, RawPriceRow};
use crate::models::quote::QuoteSnapshot;
use crate::models::trade::OptionTrade;

/// Per-row mutation applied to the open trade
pub trait TrackingPolicy {
    /// Human-readable name, used in logs and API responses
    fn name(&self) -> &'static str;

    /// Runs on every row while a trade is open, before the expiry check
    fn on_row(&self, _trade: &mut OptionTrade, _row: &PriceRow) {}

    /// Runs on the row that expires the trade, just before it is emitted
    fn on_expiry(&self, _trade: &mut OptionTrade, _row: &PriceRow) {}
}

/// Captures the high on the expiry row, ignoring intermediate peaks
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeTillExpiry;

impl TrackingPolicy for ChangeTillExpiry {
    fn name(&self) -> &'static str {
        "change_till_expiry"
    }

    fn on_expiry(&self, trade: &mut OptionTrade, row: &PriceRow) {
        trade.update_change(row.high, row.date);
    }
}

/// Tracks the running peak high up to and including the expiry row
#[derive(Debug, Clone, Copy, Default)]
pub struct PeakTracking;

impl TrackingPolicy for PeakTracking {
    fn name(&self) -> &'static str {
        "peak"
    }

    fn on_row(&self, trade: &mut OptionTrade, row: &PriceRow) {
        if row.high >= trade.current_limit {
            trade.update_change(row.high, row.date);
        }
    }
}

/// Scan state
#[derive(Debug, Clone, PartialEq)]
enum ScanState {
    NoOpenTrade,
    TradeOpen(OptionTrade),
}

/// Scan `rows` opening at most one trade at a time.
///
/// Breakouts that occur while a trade is open are skipped. A trade still
/// open when the rows run out is emitted with its outcome left `Open`.
pub fn scan_trades<P: TrackingPolicy + ?Sized>(
    symbol: &str,
    rows: &[PriceRow],
    config: &BreakoutConfig,
    policy: &P,
) -> Vec<OptionTrade> {
    let (state, mut trades) = rows.iter().fold(
        (ScanState::NoOpenTrade, Vec::new()),
        |(state, mut trades), row| {
            let state = step(symbol, state, row, config, policy, &mut trades);
            (state, trades)
        },
    );

    if let ScanState::TradeOpen(trade) = state {
        tracing::debug!(
            "[{}] Trade from {} still open at end of data ({})",
            symbol,
            trade.start_date,
            policy.name()
        );
        trades.push(trade);
    }

    trades
}

fn step<P: TrackingPolicy + ?Sized>(
    symbol: &str,
    state: ScanState,
    row: &PriceRow,
    config: &BreakoutConfig,
    policy: &P,
    trades: &mut Vec<OptionTrade>,
) -> ScanState {
    let mut trade = match state {
        ScanState::TradeOpen(trade) => trade,
        ScanState::NoOpenTrade if row.is_breakout() => {
            tracing::debug!(
                "[{}] Breakout on {} at high {} (ltp {})",
                symbol,
                row.date,
                row.high,
                row.last_price
            );
            OptionTrade::open(config.breakout_days, row)
        }
        ScanState::NoOpenTrade => return ScanState::NoOpenTrade,
    };

    policy.on_row(&mut trade, row);

    if trade.days_since_start(row.date) >= i64::from(config.days_to_expiry) {
        policy.on_expiry(&mut trade, row);
        tracing::debug!(
            "[{}] Trade from {} expired on {} (limit {}, change {:.2}%)",
            symbol,
            trade.start_date,
            row.date,
            trade.current_limit,
            trade.change
        );
        trades.push(trade.expire());
        return ScanState::NoOpenTrade;
    }

    ScanState::TradeOpen(trade)
}

/// Price table held by a tracker, raw until first use
#[derive(Debug, Clone)]
enum SeriesTable {
    Raw(Vec<RawPriceRow>),
    Prepared(Vec<PriceRow>),
}

impl SeriesTable {
    /// Preprocess a raw table in place and hand back the prepared rows
    fn prepared(&mut self, symbol: &str, config: &BreakoutConfig) -> &mut Vec<PriceRow> {
        if let SeriesTable::Raw(raw) = self {
            let rows = preprocess(raw, config);
            tracing::debug!("[{}] Prepared {} rows", symbol, rows.len());
            *self = SeriesTable::Prepared(rows);
        }

        match self {
            SeriesTable::Prepared(rows) => rows,
            SeriesTable::Raw(_) => unreachable!(),
        }
    }
}

/// Breakout finder and trade tracker for a single instrument
///
/// Not meant for shared mutation: wrap it in a lock per caller.
#[derive(Debug, Clone)]
pub struct BreakoutTracker {
    symbol: String,
    config: BreakoutConfig,
    table: SeriesTable,
}

impl BreakoutTracker {
    /// Tracker over a newest-first loader table
    pub fn new(
        symbol: String,
        config: BreakoutConfig,
        rows: Vec<RawPriceRow>,
    ) -> Result<Self, AppError> {
        config.validate()?;
        Ok(Self {
            symbol,
            config,
            table: SeriesTable::Raw(rows),
        })
    }

    /// Tracker over rows that were already preprocessed
    pub fn from_prepared(
        symbol: String,
        config: BreakoutConfig,
        rows: Vec<PriceRow>,
    ) -> Result<Self, AppError> {
        config.validate()?;
        Ok(Self {
            symbol,
            config,
            table: SeriesTable::Prepared(rows),
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn config(&self) -> &BreakoutConfig {
        &self.config
    }

    /// Preprocess the table on first call; later calls return it unchanged
    pub fn preprocess(&mut self) -> &[PriceRow] {
        self.table.prepared(&self.symbol, &self.config)
    }

    /// Run the trade scan under `policy` over the prepared rows
    pub fn track<P: TrackingPolicy + ?Sized>(&mut self, policy: &P) -> Vec<OptionTrade> {
        let rows = self.table.prepared(&self.symbol, &self.config);
        scan_trades(&self.symbol, rows, &self.config, policy)
    }

    /// Value of each trade at expiry
    pub fn find_change_till_expiry(&mut self) -> Vec<OptionTrade> {
        self.track(&ChangeTillExpiry)
    }

    /// Best high reached by each trade before expiry
    pub fn find_peak(&mut self) -> Vec<OptionTrade> {
        self.track(&PeakTracking)
    }

    /// Most recent 20-day low
    pub fn get_stop_loss(&mut self) -> Result<f64, AppError> {
        self.table
            .prepared(&self.symbol, &self.config)
            .last()
            .map(|row| row.low_20d)
            .ok_or_else(|| {
                AppError::InsufficientData(format!("{}: no rows to derive a stop loss", self.symbol))
            })
    }

    /// Whether today's quote makes a new 40-day high
    pub fn breakout(&mut self, quote: &QuoteSnapshot) -> Result<bool, AppError> {
        self.breakout_on(quote, chrono::Local::now().date_naive())
    }

    /// Same as [`Self::breakout`] with an explicit date for the today-row
    pub fn breakout_on(
        &mut self,
        quote: &QuoteSnapshot,
        today: NaiveDate,
    ) -> Result<bool, AppError> {
        let rows = self.table.prepared(&self.symbol, &self.config);
        if rows.is_empty() {
            return Ok(false);
        }

        let row = append_today(rows, quote, today)?;
        let is_breakout = row.high >= row.high_40d;

        tracing::info!(
            "[{}] Today's high {} vs 40d high {}: breakout={}",
            self.symbol,
            row.high,
            row.high_40d,
            is_breakout
        );

        Ok(is_breakout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::trade::TradeOutcome;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(n as u64)
    }

    /// Newest-first loader rows on consecutive days, LTP one below the high
    fn make_raw(highs: &[f64]) -> Vec<RawPriceRow> {
        let mut rows: Vec<RawPriceRow> = highs
            .iter()
            .enumerate()
            .map(|(i, &high)| {
                RawPriceRow::new(day(i as u32), high - 2.0, high, high - 3.0, high - 1.0)
            })
            .collect();
        rows.reverse();
        rows
    }

    fn make_tracker(highs: &[f64], breakout_days: usize, days_to_expiry: u32) -> BreakoutTracker {
        let config = BreakoutConfig::new(breakout_days, days_to_expiry).unwrap();
        BreakoutTracker::new("TEST".to_string(), config, make_raw(highs)).unwrap()
    }

    #[test]
    fn test_change_till_expiry_example() {
        let mut tracker = make_tracker(&[10.0, 12.0, 15.0, 15.0, 14.0, 20.0], 2, 3);

        let trades = tracker.find_change_till_expiry();

        // first prepared row (high 12) already equals its 2-day max
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].start_date, day(1));
        assert_eq!(trades[0].start_price, 11.0);
        assert_eq!(trades[0].current_limit, 14.0);
        assert_eq!(trades[0].days, 3);
        assert_eq!(trades[0].outcome, TradeOutcome::Expired);

        assert_eq!(trades[1].start_date, day(5));
        assert_eq!(trades[1].current_limit, 20.0);
        assert_eq!(trades[1].change, 0.0);
        assert_eq!(trades[1].outcome, TradeOutcome::Open);
    }

    #[test]
    fn test_peak_example() {
        let mut tracker = make_tracker(&[10.0, 12.0, 15.0, 15.0, 14.0, 20.0], 2, 3);

        let trades = tracker.find_peak();

        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].start_date, day(1));
        assert_eq!(trades[0].current_limit, 15.0);
        assert_eq!(trades[0].days, 2);
        assert!((trades[0].change - (15.0 - 11.0) / 11.0 * 100.0).abs() < 1e-9);
        assert_eq!(trades[0].outcome, TradeOutcome::Expired);
    }

    #[test]
    fn test_peak_on_expiry_row_is_captured() {
        // breakout on day 0 (window 1), new high lands exactly on the expiry day
        let mut tracker = make_tracker(&[10.0, 9.0, 9.5, 13.0, 8.0], 1, 3);

        let trades = tracker.find_peak();

        assert_eq!(trades[0].start_date, day(0));
        assert_eq!(trades[0].current_limit, 13.0);
        assert_eq!(trades[0].days, 3);
        assert_eq!(trades[0].outcome, TradeOutcome::Expired);
    }

    #[test]
    fn test_breakouts_during_open_trade_are_ignored() {
        let mut tracker = make_tracker(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0], 1, 2);

        let trades = tracker.find_change_till_expiry();

        let starts: Vec<NaiveDate> = trades.iter().map(|t| t.start_date).collect();
        assert_eq!(starts, vec![day(0), day(3)]);
        assert_eq!(trades[0].current_limit, 12.0);
        assert_eq!(trades[1].current_limit, 15.0);
    }

    #[test]
    fn test_zero_expiry_opens_and_closes_same_row() {
        let mut tracker = make_tracker(&[10.0, 11.0, 9.0], 1, 0);

        let trades = tracker.find_change_till_expiry();

        assert_eq!(trades.len(), 3);
        for (i, trade) in trades.iter().enumerate() {
            assert_eq!(trade.start_date, day(i as u32));
            assert_eq!(trade.days, 0);
            assert_eq!(trade.outcome, TradeOutcome::Expired);
        }
    }

    #[test]
    fn test_trades_do_not_overlap() {
        let highs = [
            10.0, 11.0, 10.5, 12.0, 13.0, 12.5, 12.0, 14.0, 13.0, 15.0, 15.5, 14.0, 16.0,
        ];
        let mut tracker = make_tracker(&highs, 3, 2);

        for trades in [tracker.find_peak(), tracker.find_change_till_expiry()] {
            for pair in trades.windows(2) {
                let closed_on = pair[0].start_date + chrono::Days::new(2);
                assert!(pair[1].start_date > closed_on);
            }
        }
    }

    #[test]
    fn test_peak_is_monotonic_within_trade() {
        let rows = make_tracker(&[10.0, 12.0, 11.0, 14.0, 13.0, 13.5, 16.0, 15.0], 2, 10)
            .preprocess()
            .to_vec();
        let policy = PeakTracking;
        let mut trade = OptionTrade::open(2, &rows[0]);
        let mut last = trade.current_limit;

        for row in &rows {
            policy.on_row(&mut trade, row);
            assert!(trade.current_limit >= last);
            last = trade.current_limit;
        }
        assert_eq!(last, 16.0);
    }

    #[test]
    fn test_preprocess_is_idempotent() {
        let mut tracker = make_tracker(&[10.0, 12.0, 15.0, 15.0, 14.0, 20.0], 2, 3);

        let once = tracker.preprocess().to_vec();
        let twice = tracker.preprocess().to_vec();
        assert_eq!(once, twice);

        let config = *tracker.config();
        let mut prepared =
            BreakoutTracker::from_prepared("TEST".to_string(), config, once.clone()).unwrap();
        assert_eq!(prepared.preprocess(), once.as_slice());
    }

    #[test]
    fn test_empty_series() {
        let mut tracker = make_tracker(&[10.0], 5, 3);

        assert!(tracker.find_change_till_expiry().is_empty());
        assert!(tracker.find_peak().is_empty());
        assert!(matches!(
            tracker.get_stop_loss(),
            Err(AppError::InsufficientData(_))
        ));

        let quote = QuoteSnapshot::new(11.0, 10.0, 12.0, 9.0);
        assert!(!tracker.breakout_on(&quote, day(30)).unwrap());
        assert!(tracker.preprocess().is_empty());
    }

    #[test]
    fn test_stop_loss_is_last_low_20d() {
        let raw = vec![
            RawPriceRow::new(day(1), 150.0, 155.0, 148.0, 152.0).with_extremes(160.0, 142.5),
            RawPriceRow::new(day(0), 149.0, 151.0, 147.0, 150.0).with_extremes(160.0, 140.0),
        ];
        let config = BreakoutConfig::new(1, 5).unwrap();
        let mut tracker = BreakoutTracker::new("TEST".to_string(), config, raw).unwrap();

        assert_eq!(tracker.get_stop_loss().unwrap(), 142.5);
    }

    fn make_40d_tracker() -> BreakoutTracker {
        let raw = vec![
            RawPriceRow::new(day(1), 100.0, 104.0, 99.0, 103.0).with_extremes(110.0, 95.0),
            RawPriceRow::new(day(0), 98.0, 101.0, 97.0, 100.0).with_extremes(110.0, 95.0),
        ];
        let config = BreakoutConfig::new(1, 5).unwrap();
        BreakoutTracker::new("TEST".to_string(), config, raw).unwrap()
    }

    #[test]
    fn test_breakout_below_40d_high() {
        let mut tracker = make_40d_tracker();
        let quote = QuoteSnapshot::new(107.0, 104.0, 109.0, 103.0);

        assert!(!tracker.breakout_on(&quote, day(2)).unwrap());
        assert_eq!(tracker.preprocess().len(), 3);
    }

    #[test]
    fn test_breakout_above_40d_high() {
        let mut tracker = make_40d_tracker();
        let before = tracker.preprocess().len();
        let quote = QuoteSnapshot::new(111.0, 104.0, 112.0, 103.0);

        assert!(tracker.breakout_on(&quote, day(2)).unwrap());

        let rows = tracker.preprocess();
        assert_eq!(rows.len(), before + 1);
        let today = rows.last().unwrap();
        assert_eq!(today.index, 2);
        assert_eq!(today.high_40d, 112.0);
        assert_eq!(today.breakout_threshold, Some(104.0));
    }

    #[test]
    fn test_today_row_can_open_trade() {
        let mut tracker = make_tracker(&[10.0, 10.0, 10.0], 2, 0);
        assert_eq!(tracker.find_peak().len(), 2);

        let quote = QuoteSnapshot::new(10.0, 10.0, 10.0, 9.0);
        tracker.breakout_on(&quote, day(3)).unwrap();

        let trades = tracker.find_peak();
        assert_eq!(trades.len(), 3);
        assert_eq!(trades[2].start_date, day(3));
        assert_eq!(trades[2].outcome, TradeOutcome::Expired);
    }

    #[test]
    fn test_oversized_windows_do_not_panic() {
        let config = BreakoutConfig {
            breakout_days: usize::MAX / 2,
            ..BreakoutConfig::default()
        };
        let raw = make_raw(&[10.0, 11.0, 12.0, 11.5, 13.0]);
        let mut tracker = BreakoutTracker::new("TEST".to_string(), config, raw).unwrap();

        assert!(tracker.find_peak().is_empty());
        assert!(tracker.preprocess().is_empty());

        let config = BreakoutConfig {
            breakout_days: 1,
            days_to_expiry: 3,
            high_window: usize::MAX / 2,
            low_window: usize::MAX,
        };
        let raw = make_raw(&[10.0, 11.0, 12.0, 11.5, 13.0]);
        let mut tracker = BreakoutTracker::new("TEST".to_string(), config, raw).unwrap();

        let rows = tracker.preprocess();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[3].high_40d, 12.0);
        assert_eq!(rows[4].low_20d, 7.0);
    }

    #[test]
    fn test_breakout_rejects_malformed_quote() {
        let mut tracker = make_40d_tracker();
        let quote = QuoteSnapshot {
            intra_day_high_low: None,
            ..QuoteSnapshot::new(111.0, 104.0, 112.0, 103.0)
        };

        let error = tracker.breakout_on(&quote, day(2)).unwrap_err();

        assert!(matches!(error, AppError::MalformedInput(_)));
        assert_eq!(tracker.preprocess().len(), 2);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = BreakoutConfig {
            breakout_days: 0,
            ..BreakoutConfig::default()
        };
        let error = BreakoutTracker::new("TEST".to_string(), config, Vec::new()).unwrap_err();
        assert!(matches!(error, AppError::InvalidConfiguration(_)));
    }
}
