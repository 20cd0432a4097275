pub mod breakout;
pub mod config;
pub mod indicators;
pub mod preprocess;
pub mod today;
