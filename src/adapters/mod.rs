pub mod alpha_vantage;
pub mod database;
pub mod latency;
