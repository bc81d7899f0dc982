//! # Data Loader Crate
//!
//! This crate owns the facts the analytics engines read: movies, genres,
//! the general MovieLens rating population and the personality-study
//! population.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Movie, Genre, Rating, PersonalityProfile, DataIndex)
//! - **parser**: Parse the CSV files into Rust structs
//! - **index**: Build and validate the in-memory `DataIndex`
//! - **store**: The `FactStore` read interface handed to every engine call
//! - **query**: Typed movie predicates for listing queries
//! - **error**: Error types for loading and for store reads
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{DataIndex, FactStore, RatingScale};
//! use std::path::Path;
//!
//! let index = DataIndex::load_from_files(Path::new("data/ml-latest-small"), RatingScale::HALF_STARS)?;
//!
//! let movie = index.movie(1)?.unwrap();
//! let ratings = index.user_ratings(1)?;
//! println!("{} has {} genres; user 1 rated {} movies", movie.title, movie.genres.len(), ratings.len());
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod index;
pub mod query;
pub mod store;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result, StoreError, StoreResult};
pub use query::{MoviePredicate, MovieQuery};
pub use store::FactStore;
pub use types::{
    // Type aliases
    UserId,
    MovieId,
    GenreId,
    // Core types
    Movie,
    Genre,
    Rating,
    RatingPopulation,
    RatingScale,
    PersonalityProfile,
    PersonalityTrait,
    DataIndex,
    DatasetCounts,
};
