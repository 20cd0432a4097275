use crate::errors::AppError;

/// Configuration parameters for breakout trade tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakoutConfig {
    /// Rolling window (rows) for the breakout threshold
    pub breakout_days: usize,
    /// Calendar days a trade is held before it expires
    pub days_to_expiry: u32,
    /// Window for the rolling high when the loader omits `40D_HIGH`
    pub high_window: usize,
    /// Window for the rolling low when the loader omits `LOWEST_20D`
    pub low_window: usize,
}

impl BreakoutConfig {
    pub fn new(breakout_days: usize, days_to_expiry: u32) -> Result<Self, AppError> {
        let config = Self {
            breakout_days,
            days_to_expiry,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.breakout_days == 0 {
            return Err(AppError::InvalidConfiguration(
                "breakout_days must be greater than 0".to_string(),
            ));
        }
        if self.high_window == 0 || self.low_window == 0 {
            return Err(AppError::InvalidConfiguration(format!(
                "rolling windows must be greater than 0 (high_window={}, low_window={})",
                self.high_window, self.low_window
            )));
        }
        Ok(())
    }
}

impl Default for BreakoutConfig {
    fn default() -> Self {
        Self {
            breakout_days: 20,
            days_to_expiry: 30,
            high_window: 40,
            low_window: 20,
        }
    }
}
