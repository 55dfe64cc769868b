pub mod config;
pub mod live;
pub mod logger;
