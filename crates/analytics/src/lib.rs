//! # Analytics Crate
//!
//! The computation engines behind every movie report. Each entry point takes
//! a `&dyn FactStore`, fetches the facts it needs at call start and returns
//! an owned result; nothing is cached between calls, so repeated calls over
//! unchanged facts give identical output.
//!
//! ## Engines
//!
//! - **aggregation**: per-genre count/mean/stddev/median, per-movie stats
//! - **correlation**: Pearson correlation of per-user series, all-pairs
//! - **personality**: trait ↔ genre correlation and cluster summaries
//! - **prediction**: genre-overlap weighted rating prediction
//! - **similarity**: genre and rating closeness ranking
//! - **bias**: per-user deviation from the global mean
//!
//! Undefined statistics are `None`, never a placeholder number. Unknown
//! movies and users are `AnalyticsError`s; unmet sample gates are not.
//!
//! ## Example Usage
//!
//! ```ignore
//! use analytics::{predict_rating, similar_movies};
//! use data_loader::{DataIndex, RatingScale};
//!
//! let index = DataIndex::load_from_files(data_dir, RatingScale::HALF_STARS)?;
//! let prediction = predict_rating(&index, 1, 296)?;
//! let similar = similar_movies(&index, 296, 10)?;
//! ```

pub mod aggregation;
pub mod bias;
pub mod correlation;
pub mod error;
pub mod personality;
pub mod prediction;
pub mod similarity;
pub mod stats;

pub use aggregation::{
    aggregate_by_genre, movie_rating_stats, AggregateOptions, GroupOrder, GroupStats,
    MovieRatingStats,
};
pub use bias::{rating_bias_all, rating_bias_for_user, UserBias};
pub use correlation::{
    correlate, correlate_all_pairs, cross_genre_preferences, user_genre_averages, Correlation,
    PairCorrelation, UserSeries,
};
pub use error::{AnalyticsError, Result};
pub use personality::{
    personality_clusters, personality_genre_correlation, PersonalityCluster,
    PersonalityGenreCorrelation, TraitValues,
};
pub use prediction::{predict_rating, Prediction};
pub use similarity::{similar_movies, SimilarMovie};
