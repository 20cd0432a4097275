pub mod health;
pub mod price_row;
pub mod quote;
pub mod session;
pub mod trade;
