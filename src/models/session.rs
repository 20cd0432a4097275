use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::business_logic::config::BreakoutConfig;
use crate::models::price_row::RawPriceRow;
use crate::models::trade::OptionTrade;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSessionRequest {
    #[validate(length(min = 1, max = 32))]
    #[schema(example = "RELIANCE")]
    pub symbol: String,
    /// Rolling window for the breakout threshold. Must be greater than 0.
    #[schema(example = 20)]
    pub breakout_days: usize,
    /// Calendar days a trade is held before it expires.
    #[schema(example = 30)]
    pub days_to_expiry: u32,
    #[serde(default = "default_high_window")]
    #[schema(example = 40, default = 40)]
    pub high_window: usize,
    #[serde(default = "default_low_window")]
    #[schema(example = 20, default = 20)]
    pub low_window: usize,
    /// Daily rows, newest first
    #[serde(default)]
    pub rows: Vec<RawPriceRow>,
}

impl CreateSessionRequest {
    pub fn config(&self) -> BreakoutConfig {
        BreakoutConfig {
            breakout_days: self.breakout_days,
            days_to_expiry: self.days_to_expiry,
            high_window: self.high_window,
            low_window: self.low_window,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionResponse {
    pub session_id: u64,
    pub symbol: String,
    /// Rows left after preprocessing
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TradesResponse {
    pub session_id: u64,
    pub symbol: String,
    pub policy: String,
    pub trades: Vec<OptionTrade>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StopLossResponse {
    pub session_id: u64,
    pub symbol: String,
    pub stop_loss: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BreakoutResponse {
    pub session_id: u64,
    pub symbol: String,
    pub breakout: bool,
    /// Rows after today's quote was appended
    pub rows: usize,
}

fn default_high_window() -> usize {
    BreakoutConfig::default().high_window
}

fn default_low_window() -> usize {
    BreakoutConfig::default().low_window
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn request_defaults_aux_windows() {
        let json = r#"{"symbol":"INFY","breakout_days":10,"days_to_expiry":7}"#;
        let request: CreateSessionRequest = serde_json::from_str(json).unwrap();

        assert!(request.rows.is_empty());
        assert_eq!(
            request.config(),
            BreakoutConfig {
                breakout_days: 10,
                days_to_expiry: 7,
                high_window: 40,
                low_window: 20,
            }
        );
    }

    #[test]
    fn request_requires_symbol() {
        let mut request: CreateSessionRequest =
            serde_json::from_str(r#"{"symbol":"","breakout_days":10,"days_to_expiry":7}"#)
                .unwrap();
        assert!(request.validate().is_err());

        request.symbol = "INFY".to_string();
        assert!(request.validate().is_ok());
    }

    #[test]
    fn long_expiry_horizons_are_accepted() {
        let json = format!(
            r#"{{"symbol":"INFY","breakout_days":10,"days_to_expiry":{}}}"#,
            u32::MAX
        );
        let request: CreateSessionRequest = serde_json::from_str(&json).unwrap();

        assert!(request.validate().is_ok());
        assert_eq!(request.config().days_to_expiry, u32::MAX);
        assert!(request.config().validate().is_ok());
    }

    #[test]
    fn negative_config_values_fail_to_parse() {
        let json = r#"{"symbol":"INFY","breakout_days":10,"days_to_expiry":-1}"#;
        assert!(serde_json::from_str::<CreateSessionRequest>(json).is_err());
    }
}
