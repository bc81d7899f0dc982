//! Report assembler for the movie analytics engines.
//!
//! `ReportService` owns a shared `FactStore` handle and the
//! `AnalyticsConfig`, runs each engine call off the async runtime and
//! returns serializable report rows.

pub mod config;
pub mod contracts;
pub mod error;
pub mod service;

pub use config::{AnalyticsConfig, ConfigError};
pub use contracts::*;
pub use error::{ReportError, Result};
pub use service::ReportService;
