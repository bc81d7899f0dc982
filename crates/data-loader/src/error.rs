//! Error types for the data-loader crate.
//!
//! `DataLoadError` covers reading and validating the CSV datasets.
//! `StoreError` is what a fact store reports while serving a read.

use thiserror::Error;

/// Errors raised while building a `DataIndex` from disk
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// A required dataset file is missing or unreadable
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// The CSV reader rejected a record (bad quoting, wrong column type, ...)
    #[error("CSV error in {file}: {source}")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },

    /// A score that is not a step of the configured rating scale
    #[error("Rating {value} by user {user_id} for movie {movie_id} is outside the rating scale")]
    RatingOutOfScale {
        user_id: u32,
        movie_id: u32,
        value: f32,
    },

    /// A record points at an entity that was never loaded
    #[error("Missing reference: {entity} with id {id}")]
    MissingReference { entity: &'static str, id: u32 },

    #[error("Invalid rating scale: {0}")]
    InvalidScale(String),
}

pub type Result<T> = std::result::Result<T, DataLoadError>;

/// Failure of the fact store while answering a query.
///
/// The in-memory `DataIndex` never produces one; stores backed by a
/// database or a remote service surface connectivity problems and
/// timeouts through this type. Callers propagate it unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached or did not answer in time
    #[error("Fact store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
