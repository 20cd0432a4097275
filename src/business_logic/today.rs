use chrono::NaiveDate;

use crate::errors::AppError;
use crate::models::price_row::PriceRow;
use crate::models::quote::{Quote, QuoteSnapshot};

/// Append a synthetic row for `today` built from a live quote.
///
/// The previous last row is the template; the rolling extremes are
/// extended with today's range and the breakout threshold is carried over.
/// Repeated calls on the same day append repeated rows.
pub fn append_today<'a>(
    rows: &'a mut Vec<PriceRow>,
    snapshot: &QuoteSnapshot,
    today: NaiveDate,
) -> Result<&'a PriceRow, AppError> {
    let quote = Quote::try_from(snapshot)?;

    let previous = rows.last().ok_or_else(|| {
        AppError::InsufficientData("cannot append today's quote to an empty series".to_string())
    })?;

    let row = PriceRow {
        index: previous.index + 1,
        date: today,
        open: quote.open,
        high: quote.high,
        low: quote.low,
        last_price: quote.last_price,
        high_40d: previous.high_40d.max(quote.high),
        low_20d: previous.low_20d.min(quote.low),
        breakout_threshold: previous.breakout_threshold,
    };

    if row.date <= previous.date {
        tracing::warn!(
            "Today-row dated {} does not advance past {} (row {})",
            row.date,
            previous.date,
            row.index
        );
    }

    rows.push(row);
    Ok(&rows[rows.len() - 1])
}
