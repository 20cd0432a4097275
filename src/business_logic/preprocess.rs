use std::collections::HashMap;

use chrono::NaiveDate;

use crate::business_logic::config::BreakoutConfig;
use crate::business_logic::indicators::RollingExtreme;
use crate::models::price_row::{PriceRow, RawPriceRow};

/// Turn a newest-first loader table into oldest-first annotated rows.
///
/// Rows without a complete `breakout_days` window are dropped and the
/// survivors are re-indexed from zero.
pub fn preprocess(raw: &[RawPriceRow], config: &BreakoutConfig) -> Vec<PriceRow> {
    let ordered = chronological(raw);

    let mut threshold = RollingExtreme::max(config.breakout_days);
    let mut rolling_high = RollingExtreme::max(config.high_window);
    let mut rolling_low = RollingExtreme::min(config.low_window);

    let mut rows = Vec::with_capacity(ordered.len());
    for row in ordered {
        let breakout_threshold = threshold.update(row.high);
        rolling_high.update(row.high);
        rolling_low.update(row.low);

        let Some(breakout_threshold) = breakout_threshold else {
            continue;
        };

        let high_40d = row
            .high_40d
            .or(rolling_high.current())
            .map_or(row.high, |high| high.max(row.high));
        let low_20d = row
            .low_20d
            .or(rolling_low.current())
            .map_or(row.low, |low| low.min(row.low));

        rows.push(PriceRow {
            index: rows.len(),
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            last_price: row.last_price,
            high_40d,
            low_20d,
            breakout_threshold: Some(breakout_threshold),
        });
    }

    tracing::debug!(
        "Preprocessed {} raw rows into {} rows (breakout window {})",
        raw.len(),
        rows.len(),
        config.breakout_days
    );

    rows
}

/// Reverse, drop duplicate dates and sort ascending.
///
/// The loader lists the latest revision of a day first, so when two rows
/// share a date the one nearest the top of the raw table wins.
fn chronological(raw: &[RawPriceRow]) -> Vec<&RawPriceRow> {
    let mut kept: HashMap<NaiveDate, &RawPriceRow> = HashMap::with_capacity(raw.len());
    let mut unique = Vec::with_capacity(raw.len());

    for row in raw {
        match kept.get(&row.date) {
            Some(existing) => {
                if *existing != row {
                    tracing::warn!(
                        "Dropping conflicting row for {} (keeping the first occurrence)",
                        row.date
                    );
                }
            }
            None => {
                kept.insert(row.date, row);
                unique.push(row);
            }
        }
    }

    unique.reverse();
    unique.sort_by_key(|row| row.date);
    unique
}
