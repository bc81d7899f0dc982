use crate::config::ConfigError;
use analytics::AnalyticsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    /// The blocking task running the engine panicked or was cancelled
    #[error("report task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ReportError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ReportError::Analytics(e) if e.is_not_found())
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
