//! # Report Service
//!
//! Entry point for every report. Each call:
//! 1. Resolves thresholds (caller override, else configuration)
//! 2. Runs the engine on tokio's blocking pool against the shared store
//! 3. Shapes the engine output into report rows
//! 4. Logs how long it took
//!
//! The service is cheap to clone; clones share the store and configuration,
//! so many reports can run concurrently.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use analytics::{AggregateOptions, GroupOrder};
use data_loader::{FactStore, GenreId, MovieId, MovieQuery, RatingPopulation, UserId};

use crate::config::AnalyticsConfig;
use crate::contracts::*;
use crate::error::Result;

#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn FactStore>,
    config: Arc<AnalyticsConfig>,
}

impl ReportService {
    /// Create a service over `store`. The configuration is validated first.
    pub fn new(store: Arc<dyn FactStore>, config: AnalyticsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Run `job` on the blocking pool and log its duration under `report`
    async fn run<T, F>(&self, report: &'static str, job: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn FactStore, &AnalyticsConfig) -> analytics::Result<T> + Send + 'static,
    {
        let start_time = Instant::now();
        let store = self.store.clone();
        let config = self.config.clone();

        let output =
            tokio::task::spawn_blocking(move || job(store.as_ref(), config.as_ref())).await??;

        info!("Report {} ready in {:.2?}", report, start_time.elapsed());
        Ok(output)
    }

    /// Genres by average rating, best first
    pub async fn genre_popularity(&self) -> Result<Vec<GenrePopularityRow>> {
        self.run("genre_popularity", |store, _| {
            let groups = analytics::aggregate_by_genre(
                store,
                RatingPopulation::General,
                AggregateOptions::new(GroupOrder::MeanDesc),
            )?;
            Ok(groups.into_iter().map(GenrePopularityRow::from).collect())
        })
        .await
    }

    /// Genres by rating spread, most divisive first
    pub async fn genre_polarisation(
        &self,
        min_sample_size: Option<usize>,
    ) -> Result<Vec<GenrePolarisationRow>> {
        self.run("genre_polarisation", move |store, config| {
            let options = AggregateOptions::new(GroupOrder::StddevDesc)
                .with_min_sample_size(min_sample_size.unwrap_or(config.min_sample_size));
            let groups = analytics::aggregate_by_genre(store, RatingPopulation::General, options)?;
            Ok(groups.into_iter().map(GenrePolarisationRow::from).collect())
        })
        .await
    }

    pub async fn rating_bias(&self, min_sample_size: Option<usize>) -> Result<Vec<UserBiasRow>> {
        self.run("rating_bias", move |store, config| {
            let min = min_sample_size.unwrap_or(config.min_sample_size);
            let biases = analytics::rating_bias_all(store, min)?;
            Ok(biases.into_iter().map(UserBiasRow::from).collect())
        })
        .await
    }

    pub async fn user_rating_bias(&self, user_id: UserId) -> Result<UserBiasRow> {
        self.run("user_rating_bias", move |store, _| {
            analytics::rating_bias_for_user(store, user_id).map(UserBiasRow::from)
        })
        .await
    }

    pub async fn cross_genre_preferences(
        &self,
        min_series_size: Option<usize>,
        min_pairs: Option<usize>,
    ) -> Result<Vec<CrossGenreRow>> {
        self.run("cross_genre_preferences", move |store, config| {
            let rows = analytics::cross_genre_preferences(
                store,
                min_series_size.unwrap_or(config.min_series_size),
                min_pairs.unwrap_or(config.min_pairs),
            )?;
            Ok(rows.into_iter().map(CrossGenreRow::from).collect())
        })
        .await
    }

    pub async fn personality_genre_correlation(
        &self,
        min_series_size: Option<usize>,
        min_pairs: Option<usize>,
    ) -> Result<Vec<PersonalityGenreRow>> {
        self.run("personality_genre_correlation", move |store, config| {
            let rows = analytics::personality_genre_correlation(
                store,
                min_series_size.unwrap_or(config.min_series_size),
                min_pairs.unwrap_or(config.min_pairs),
            )?;
            Ok(rows.into_iter().map(PersonalityGenreRow::from).collect())
        })
        .await
    }

    pub async fn personality_clusters(&self) -> Result<Vec<PersonalityClusterRow>> {
        self.run("personality_clusters", |store, _| {
            let clusters = analytics::personality_clusters(store)?;
            Ok(clusters.into_iter().map(PersonalityClusterRow::from).collect())
        })
        .await
    }

    pub async fn predict_rating(&self, user_id: UserId, movie_id: MovieId) -> Result<PredictionReport> {
        self.run("predict_rating", move |store, _| {
            analytics::predict_rating(store, user_id, movie_id).map(PredictionReport::from)
        })
        .await
    }

    pub async fn similar_films(
        &self,
        movie_id: MovieId,
        limit: Option<usize>,
    ) -> Result<Vec<SimilarFilmRow>> {
        self.run("similar_films", move |store, config| {
            let similar =
                analytics::similar_movies(store, movie_id, limit.unwrap_or(config.similar_limit))?;
            Ok(similar.into_iter().map(SimilarFilmRow::from).collect())
        })
        .await
    }

    pub async fn movie_rating_stats(&self, movie_id: MovieId) -> Result<MovieStatsReport> {
        self.run("movie_rating_stats", move |store, _| {
            analytics::movie_rating_stats(store, movie_id).map(MovieStatsReport::from)
        })
        .await
    }

    pub async fn search_movies(&self, query: MovieQuery) -> Result<Vec<MovieSummaryRow>> {
        self.run("search_movies", move |store, _| {
            let genres: HashMap<GenreId, _> =
                store.genres()?.into_iter().map(|g| (g.id, g)).collect();
            let movies = store.search_movies(&query)?;
            Ok(movies
                .into_iter()
                .map(|m| MovieSummaryRow::from_movie(m, &genres))
                .collect())
        })
        .await
    }
}
