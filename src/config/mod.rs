//! Configuration module
//!
//! Config file parsing and environment overrides

pub mod dashboard;

pub use dashboard::{ConfigError, DashboardConfig};
