//! Report rows as handed to callers.
//!
//! Field names are camelCase on the wire and undefined values serialize as
//! `null`. The personality correlation row keeps its historical
//! `<trait>_corr` column names.

use analytics::{
    GroupStats, MovieRatingStats, PairCorrelation, PersonalityCluster, PersonalityGenreCorrelation,
    Prediction, SimilarMovie, UserBias,
};
use data_loader::{Genre, GenreId, Movie, MovieId, UserId};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenrePopularityRow {
    pub genre_id: GenreId,
    pub genre_name: String,
    pub rating_count: usize,
    pub avg_rating: Option<f64>,
    pub movie_count: usize,
}

impl From<GroupStats> for GenrePopularityRow {
    fn from(group: GroupStats) -> Self {
        Self {
            genre_id: group.genre_id,
            genre_name: group.genre,
            rating_count: group.count,
            avg_rating: group.mean,
            movie_count: group.movie_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenrePolarisationRow {
    pub genre_id: GenreId,
    pub genre_name: String,
    pub total_ratings: usize,
    pub avg_rating: Option<f64>,
    pub stddev: Option<f64>,
}

impl From<GroupStats> for GenrePolarisationRow {
    fn from(group: GroupStats) -> Self {
        Self {
            genre_id: group.genre_id,
            genre_name: group.genre,
            total_ratings: group.count,
            avg_rating: group.mean,
            stddev: group.stddev,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBiasRow {
    pub user_id: UserId,
    pub rating_count: usize,
    pub user_avg: Option<f64>,
    pub global_avg: Option<f64>,
    pub bias: Option<f64>,
}

impl From<UserBias> for UserBiasRow {
    fn from(bias: UserBias) -> Self {
        Self {
            user_id: bias.user_id,
            rating_count: bias.rating_count,
            user_avg: bias.user_avg,
            global_avg: bias.global_avg,
            bias: bias.bias,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossGenreRow {
    pub genre_a: String,
    pub genre_b: String,
    pub correlation: Option<f64>,
    pub shared_users: usize,
}

impl From<PairCorrelation> for CrossGenreRow {
    fn from(pair: PairCorrelation) -> Self {
        Self {
            genre_a: pair.first,
            genre_b: pair.second,
            correlation: pair.correlation.coefficient,
            shared_users: pair.correlation.sample_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonalityGenreRow {
    pub genre: String,
    pub openness_corr: Option<f64>,
    pub agreeableness_corr: Option<f64>,
    #[serde(rename = "emotionalStability_corr")]
    pub emotional_stability_corr: Option<f64>,
    pub conscientiousness_corr: Option<f64>,
    pub extraversion_corr: Option<f64>,
    #[serde(rename = "sampleSize")]
    pub sample_size: usize,
}

impl From<PersonalityGenreCorrelation> for PersonalityGenreRow {
    fn from(row: PersonalityGenreCorrelation) -> Self {
        let c = row.correlations;
        Self {
            genre: row.genre,
            openness_corr: c.openness,
            agreeableness_corr: c.agreeableness,
            emotional_stability_corr: c.emotional_stability,
            conscientiousness_corr: c.conscientiousness,
            extraversion_corr: c.extraversion,
            sample_size: row.sample_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalityClusterRow {
    pub assigned_metric: String,
    pub assigned_condition: String,
    pub user_count: usize,
    pub avg_rating: Option<f64>,
    pub stddev_rating: Option<f64>,
    pub total_ratings: usize,
    pub avg_openness: Option<f64>,
    pub avg_agreeableness: Option<f64>,
    pub avg_emotional_stability: Option<f64>,
    pub avg_conscientiousness: Option<f64>,
    pub avg_extraversion: Option<f64>,
}

impl From<PersonalityCluster> for PersonalityClusterRow {
    fn from(cluster: PersonalityCluster) -> Self {
        let means = cluster.trait_means;
        Self {
            assigned_metric: cluster.assigned_metric,
            assigned_condition: cluster.assigned_condition,
            user_count: cluster.user_count,
            avg_rating: cluster.avg_rating,
            stddev_rating: cluster.stddev_rating,
            total_ratings: cluster.total_ratings,
            avg_openness: means.openness,
            avg_agreeableness: means.agreeableness,
            avg_emotional_stability: means.emotional_stability,
            avg_conscientiousness: means.conscientiousness,
            avg_extraversion: means.extraversion,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionReport {
    pub predicted_rating: Option<f64>,
    pub based_on_movies: usize,
    pub total_genre_overlap: usize,
}

impl From<Prediction> for PredictionReport {
    fn from(prediction: Prediction) -> Self {
        Self {
            predicted_rating: prediction.predicted_rating,
            based_on_movies: prediction.based_on_movies,
            total_genre_overlap: prediction.total_genre_overlap,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarFilmRow {
    pub movie_id: MovieId,
    pub title: String,
    pub release_year: Option<u16>,
    pub poster_path: Option<String>,
    pub avg_rating: Option<f64>,
    pub shared_genres: usize,
    pub genre_similarity: f64,
    pub rating_similarity: f64,
}

impl From<SimilarMovie> for SimilarFilmRow {
    fn from(similar: SimilarMovie) -> Self {
        Self {
            movie_id: similar.movie.id,
            title: similar.movie.title,
            release_year: similar.movie.year,
            poster_path: similar.movie.poster_path,
            avg_rating: similar.avg_rating,
            shared_genres: similar.shared_genres,
            genre_similarity: similar.genre_similarity,
            rating_similarity: similar.rating_similarity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieStatsReport {
    pub movie_id: MovieId,
    pub total_ratings: usize,
    pub avg_rating: Option<f64>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub stddev: Option<f64>,
    pub median: Option<f64>,
}

impl From<MovieRatingStats> for MovieStatsReport {
    fn from(stats: MovieRatingStats) -> Self {
        Self {
            movie_id: stats.movie_id,
            total_ratings: stats.total_ratings,
            avg_rating: stats.avg_rating,
            min_rating: stats.min_rating,
            max_rating: stats.max_rating,
            stddev: stats.stddev,
            median: stats.median,
        }
    }
}

/// One movie of a search result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieSummaryRow {
    pub movie_id: MovieId,
    pub title: String,
    pub release_year: Option<u16>,
    pub poster_path: Option<String>,
    pub genres: Vec<String>,
}

impl MovieSummaryRow {
    /// Resolve genre ids through `genres`; unknown ids are dropped
    pub fn from_movie(movie: Movie, genres: &HashMap<GenreId, Genre>) -> Self {
        let mut names: Vec<String> = movie
            .genres
            .iter()
            .filter_map(|id| genres.get(id).map(|g| g.name.clone()))
            .collect();
        names.sort();
        Self {
            movie_id: movie.id,
            title: movie.title,
            release_year: movie.year,
            poster_path: movie.poster_path,
            genres: names,
        }
    }
}
