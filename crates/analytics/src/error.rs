//! Error types for the analytics engines.
//!
//! Only conditions the caller must treat as failures are errors. Gates that
//! are not met, cold starts and undefined statistics are ordinary results
//! (`None` fields, empty lists) and never show up here.

use data_loader::{MovieId, StoreError, UserId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    /// The requested movie is not in the fact store
    #[error("Movie {0} not found")]
    MovieNotFound(MovieId),

    /// The requested user is not in the fact store
    #[error("User {0} not found")]
    UserNotFound(UserId),

    /// A caller-supplied threshold the computation cannot honour
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The fact store failed; passed through untouched
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),
}

impl AnalyticsError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AnalyticsError::MovieNotFound(_) | AnalyticsError::UserNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
