use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::AppError;

/// Live quote snapshot as returned by the market-data client
///
/// Every field is optional on the wire so that a partial payload can be
/// reported as malformed instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSnapshot {
    pub last_price: Option<f64>,
    pub open: Option<f64>,
    pub intra_day_high_low: Option<IntraDayHighLow>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct IntraDayHighLow {
    pub max: Option<f64>,
    pub min: Option<f64>,
}

/// Fully populated quote
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub last_price: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
}

impl QuoteSnapshot {
    pub fn new(last_price: f64, open: f64, high: f64, low: f64) -> Self {
        Self {
            last_price: Some(last_price),
            open: Some(open),
            intra_day_high_low: Some(IntraDayHighLow {
                max: Some(high),
                min: Some(low),
            }),
        }
    }
}

impl TryFrom<&QuoteSnapshot> for Quote {
    type Error = AppError;

    fn try_from(snapshot: &QuoteSnapshot) -> Result<Self, Self::Error> {
        let range = snapshot
            .intra_day_high_low
            .as_ref()
            .ok_or_else(|| missing("intraDayHighLow"))?;

        Ok(Quote {
            last_price: snapshot.last_price.ok_or_else(|| missing("lastPrice"))?,
            open: snapshot.open.ok_or_else(|| missing("open"))?,
            high: range.max.ok_or_else(|| missing("intraDayHighLow.max"))?,
            low: range.min.ok_or_else(|| missing("intraDayHighLow.min"))?,
        })
    }
}

fn missing(field: &str) -> AppError {
    AppError::MalformedInput(format!("quote snapshot is missing `{field}`"))
}
