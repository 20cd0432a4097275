use std::path::PathBuf;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Server settings read from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// `BREAKOUT_BIND_ADDR`
    pub bind_addr: String,
    /// `BREAKOUT_LOG_DIR`; logs go to stdout only when unset
    pub log_dir: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            bind_addr: non_empty("BREAKOUT_BIND_ADDR")
                .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            log_dir: non_empty("BREAKOUT_LOG_DIR").map(PathBuf::from),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            log_dir: None,
        }
    }
}
