use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// Date layouts accepted in the `DATE` column
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d-%b-%Y", "%d-%m-%Y"];

/// One trading day as supplied by the price-history loader (newest first)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RawPriceRow {
    /// Trading date
    #[serde(rename = "DATE", deserialize_with = "deserialize_date")]
    #[schema(rename = "DATE", value_type = String, format = Date)]
    pub date: NaiveDate,
    /// Open price
    #[serde(rename = "OPEN", deserialize_with = "deserialize_price")]
    #[schema(rename = "OPEN")]
    pub open: f64,
    /// High price
    #[serde(rename = "HIGH", deserialize_with = "deserialize_price")]
    #[schema(rename = "HIGH")]
    pub high: f64,
    /// Low price
    #[serde(rename = "LOW", deserialize_with = "deserialize_price")]
    #[schema(rename = "LOW")]
    pub low: f64,
    /// Last traded price
    #[serde(rename = "LTP", deserialize_with = "deserialize_price")]
    #[schema(rename = "LTP")]
    pub last_price: f64,
    /// Precomputed 40-day high (optional if the loader omits it)
    #[serde(
        rename = "40D_HIGH",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_price"
    )]
    #[schema(rename = "40D_HIGH")]
    pub high_40d: Option<f64>,
    /// Precomputed 20-day low (optional if the loader omits it)
    #[serde(
        rename = "LOWEST_20D",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_price"
    )]
    #[schema(rename = "LOWEST_20D")]
    pub low_20d: Option<f64>,
}

impl RawPriceRow {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, last_price: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            last_price,
            high_40d: None,
            low_20d: None,
        }
    }

    pub fn with_extremes(mut self, high_40d: f64, low_20d: f64) -> Self {
        self.high_40d = Some(high_40d);
        self.low_20d = Some(low_20d);
        self
    }
}

/// A preprocessed trading day, oldest first, annotated with rolling extremes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    /// Dense zero-based ordinal
    pub index: usize,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub last_price: f64,
    pub high_40d: f64,
    pub low_20d: f64,
    /// Trailing max high over `breakout_days` rows; an injected today-row carries the previous value
    pub breakout_threshold: Option<f64>,
}

impl PriceRow {
    /// Today's high is the trailing-window maximum
    pub fn is_breakout(&self) -> bool {
        self.breakout_threshold == Some(self.high)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PriceValue {
    Number(f64),
    Text(String),
}

fn parse_price_text(text: &str) -> Result<Option<f64>, String> {
    let cleaned = text.trim().replace(',', "");
    if cleaned.is_empty() || cleaned == "-" {
        return Ok(None);
    }
    cleaned
        .parse::<f64>()
        .map(Some)
        .map_err(|err| format!("invalid price {text:?}: {err}"))
}

fn deserialize_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match PriceValue::deserialize(deserializer)? {
        PriceValue::Number(value) => Ok(value),
        PriceValue::Text(text) => parse_price_text(&text)
            .map_err(serde::de::Error::custom)?
            .ok_or_else(|| serde::de::Error::custom("missing price")),
    }
}

fn deserialize_optional_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<PriceValue>::deserialize(deserializer)? {
        None => Ok(None),
        Some(PriceValue::Number(value)) => Ok(Some(value)),
        Some(PriceValue::Text(text)) => parse_price_text(&text).map_err(serde::de::Error::custom),
    }
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    parse_date(&s).map_err(serde::de::Error::custom)
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .ok_or_else(|| format!("unrecognised date: {value:?}"))
}
