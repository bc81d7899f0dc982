//! Aggregation Engine
//!
//! Grouped rating statistics. Ratings are joined to genres through the
//! movie ↔ genre relation, so a rating of a movie with N genres lands in N
//! groups.
//!
//! ## Algorithm
//! 1. Fetch the movie ↔ genre relation and one rating population
//! 2. Fan each rating out to its movie's genres (rayon fold/reduce)
//! 3. Drop groups below the minimum sample size
//! 4. Summarise the rest and sort with the caller's order, ties by genre name

use crate::error::{AnalyticsError, Result};
use crate::stats::Summary;
use data_loader::{FactStore, GenreId, MovieId, RatingPopulation};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

/// Sort key for grouped statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupOrder {
    /// Highest mean first ("popularity")
    MeanDesc,
    /// Highest standard deviation first ("polarisation")
    StddevDesc,
    /// Most ratings first
    CountDesc,
    /// Group name ascending
    KeyAsc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOptions {
    /// Groups with fewer ratings are left out of the result
    pub min_sample_size: usize,
    pub order: GroupOrder,
    pub with_median: bool,
}

impl AggregateOptions {
    pub fn new(order: GroupOrder) -> Self {
        Self {
            min_sample_size: 0,
            order,
            with_median: false,
        }
    }

    pub fn with_min_sample_size(mut self, min: usize) -> Self {
        self.min_sample_size = min;
        self
    }

    pub fn with_median(mut self, with_median: bool) -> Self {
        self.with_median = with_median;
        self
    }
}

/// Statistics of one genre group
#[derive(Debug, Clone, PartialEq)]
pub struct GroupStats {
    pub genre_id: GenreId,
    pub genre: String,
    /// Number of ratings in the group
    pub count: usize,
    /// Number of distinct movies those ratings belong to
    pub movie_count: usize,
    pub mean: Option<f64>,
    pub stddev: Option<f64>,
    pub median: Option<f64>,
}

/// Rating statistics of a single movie
#[derive(Debug, Clone, PartialEq)]
pub struct MovieRatingStats {
    pub movie_id: MovieId,
    pub total_ratings: usize,
    pub avg_rating: Option<f64>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub stddev: Option<f64>,
    pub median: Option<f64>,
}

#[derive(Default)]
struct GroupAccumulator {
    values: Vec<f64>,
    movies: HashSet<MovieId>,
}

/// Aggregate one rating population by genre.
#[instrument(skip(store))]
pub fn aggregate_by_genre(
    store: &dyn FactStore,
    population: RatingPopulation,
    options: AggregateOptions,
) -> Result<Vec<GroupStats>> {
    let movie_genres = store.movie_genres()?;
    let ratings = store.ratings(population)?;
    let genres = store.genres()?;

    let groups: HashMap<GenreId, GroupAccumulator> = ratings
        .par_iter()
        .fold(HashMap::new, |mut local: HashMap<GenreId, GroupAccumulator>, rating| {
            if let Some(genre_ids) = movie_genres.get(&rating.movie_id) {
                for genre_id in genre_ids {
                    let group = local.entry(*genre_id).or_default();
                    group.values.push(f64::from(rating.rating));
                    group.movies.insert(rating.movie_id);
                }
            }
            local
        })
        .reduce(HashMap::new, |mut acc, local| {
            for (genre_id, group) in local {
                let entry = acc.entry(genre_id).or_default();
                entry.values.extend(group.values);
                entry.movies.extend(group.movies);
            }
            acc
        });
    debug!("Grouped {} ratings into {} genres", ratings.len(), groups.len());

    let mut result: Vec<GroupStats> = genres
        .into_iter()
        .filter_map(|genre| {
            let group = groups.get(&genre.id)?;
            if group.values.is_empty() || group.values.len() < options.min_sample_size {
                return None;
            }
            let summary = Summary::of(&group.values, options.with_median);
            Some(GroupStats {
                genre_id: genre.id,
                genre: genre.name,
                count: summary.count,
                movie_count: group.movies.len(),
                mean: summary.mean,
                stddev: summary.stddev,
                median: summary.median,
            })
        })
        .collect();

    result.sort_by(|a, b| compare_groups(a, b, options.order));
    debug!(
        "Kept {} genres with at least {} ratings",
        result.len(),
        options.min_sample_size
    );
    Ok(result)
}

fn compare_groups(a: &GroupStats, b: &GroupStats, order: GroupOrder) -> Ordering {
    let primary = match order {
        GroupOrder::MeanDesc => desc_option(a.mean, b.mean),
        GroupOrder::StddevDesc => desc_option(a.stddev, b.stddev),
        GroupOrder::CountDesc => b.count.cmp(&a.count),
        GroupOrder::KeyAsc => Ordering::Equal,
    };
    primary.then_with(|| a.genre.cmp(&b.genre))
}

/// Descending order with undefined values last
pub(crate) fn desc_option(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Count, mean, spread and median of one movie's ratings.
#[instrument(skip(store))]
pub fn movie_rating_stats(store: &dyn FactStore, movie_id: MovieId) -> Result<MovieRatingStats> {
    if store.movie(movie_id)?.is_none() {
        return Err(AnalyticsError::MovieNotFound(movie_id));
    }

    let values: Vec<f64> = store
        .movie_ratings(movie_id)?
        .iter()
        .map(|r| f64::from(r.rating))
        .collect();
    let summary = Summary::of(&values, true);

    Ok(MovieRatingStats {
        movie_id,
        total_ratings: summary.count,
        avg_rating: summary.mean,
        min_rating: summary.min,
        max_rating: summary.max,
        stddev: summary.stddev,
        median: summary.median,
    })
}
