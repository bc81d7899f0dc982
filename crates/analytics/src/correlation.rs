//! Correlation Engine
//!
//! Pearson correlation between per-user series. A series maps each user to
//! one scalar (typically the user's mean rating within a genre); two series
//! are joined on user identity before the coefficient is taken.
//!
//! Series are `BTreeMap`s so the joined pairs always come out in user-id
//! order. That keeps the floating-point sums identical between
//! `correlate(a, b)` and `correlate(b, a)` and between repeated calls.

use crate::aggregation::desc_option;
use crate::error::{AnalyticsError, Result};
use crate::stats::{pearson, round_to};
use data_loader::{FactStore, GenreId, RatingPopulation, UserId};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// One scalar per user
pub type UserSeries = BTreeMap<UserId, f64>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correlation {
    /// Rounded to 3 decimals; `None` when either side has no variance
    pub coefficient: Option<f64>,
    /// Number of users present in both series
    pub sample_size: usize,
}

/// Correlation of one unordered pair of named series.
/// `first` sorts before `second`.
#[derive(Debug, Clone, PartialEq)]
pub struct PairCorrelation {
    pub first: String,
    pub second: String,
    pub correlation: Correlation,
}

/// Correlate two series over the users they share.
///
/// Returns `None` when fewer than `min_pairs` users are shared.
pub fn correlate(a: &UserSeries, b: &UserSeries, min_pairs: usize) -> Option<Correlation> {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .filter_map(|(user, x)| b.get(user).map(|y| (*x, *y)))
        .collect();

    if pairs.len() < min_pairs {
        return None;
    }

    Some(Correlation {
        coefficient: pearson(&pairs).map(|r| round_to(r, 3)),
        sample_size: pairs.len(),
    })
}

/// Correlate every unordered pair of series exactly once.
///
/// Pairs come back in (first, second) key order; pairs below `min_pairs`
/// are omitted.
pub fn correlate_all_pairs(
    series: &BTreeMap<String, UserSeries>,
    min_pairs: usize,
) -> Vec<PairCorrelation> {
    let keyed: Vec<(&String, &UserSeries)> = series.iter().collect();
    let pairs: Vec<(usize, usize)> = (0..keyed.len())
        .flat_map(|i| ((i + 1)..keyed.len()).map(move |j| (i, j)))
        .collect();

    let result: Vec<PairCorrelation> = pairs
        .par_iter()
        .filter_map(|&(i, j)| {
            let (first, a) = keyed[i];
            let (second, b) = keyed[j];
            correlate(a, b, min_pairs).map(|correlation| PairCorrelation {
                first: first.clone(),
                second: second.clone(),
                correlation,
            })
        })
        .collect();

    debug!(
        "Evaluated {} pairs, {} met the {} pair minimum",
        pairs.len(),
        result.len(),
        min_pairs
    );
    result
}

/// Per genre, each user's mean rating of that genre's movies.
///
/// Keyed by genre name. A (user, genre) cell is kept only when it rests on
/// at least `min_series_size` ratings; genres left with no users are dropped.
#[instrument(skip(store))]
pub fn user_genre_averages(
    store: &dyn FactStore,
    population: RatingPopulation,
    min_series_size: usize,
) -> Result<BTreeMap<String, UserSeries>> {
    let movie_genres = store.movie_genres()?;
    let ratings = store.ratings(population)?;
    let genres = store.genres()?;

    let mut cells: BTreeMap<GenreId, BTreeMap<UserId, (f64, usize)>> = BTreeMap::new();
    for rating in &ratings {
        let Some(genre_ids) = movie_genres.get(&rating.movie_id) else {
            continue;
        };
        for genre_id in genre_ids {
            let cell = cells
                .entry(*genre_id)
                .or_default()
                .entry(rating.user_id)
                .or_insert((0.0, 0));
            cell.0 += f64::from(rating.rating);
            cell.1 += 1;
        }
    }

    let mut series = BTreeMap::new();
    for genre in genres {
        let Some(users) = cells.remove(&genre.id) else {
            continue;
        };
        let averages: UserSeries = users
            .into_iter()
            .filter(|(_, (_, count))| *count > 0 && *count >= min_series_size)
            .map(|(user, (sum, count))| (user, sum / count as f64))
            .collect();
        if !averages.is_empty() {
            series.insert(genre.name, averages);
        }
    }

    debug!("Built {} genre series from {} ratings", series.len(), ratings.len());
    Ok(series)
}

/// How users' tastes in one genre track their tastes in another.
///
/// Rows with a defined coefficient come first, strongest positive first;
/// ties and undefined rows fall back to (first, second) order.
///
/// Fails with `InvalidInput` when `min_pairs` is below 2, since no
/// coefficient can be defined over fewer pairs.
#[instrument(skip(store))]
pub fn cross_genre_preferences(
    store: &dyn FactStore,
    min_series_size: usize,
    min_pairs: usize,
) -> Result<Vec<PairCorrelation>> {
    check_min_pairs(min_pairs)?;

    let series = user_genre_averages(store, RatingPopulation::General, min_series_size)?;
    let mut pairs = correlate_all_pairs(&series, min_pairs);
    pairs.sort_by(|a, b| {
        desc_option(a.correlation.coefficient, b.correlation.coefficient)
            .then_with(|| a.first.cmp(&b.first))
            .then_with(|| a.second.cmp(&b.second))
    });
    Ok(pairs)
}

pub(crate) fn check_min_pairs(min_pairs: usize) -> Result<()> {
    if min_pairs < 2 {
        return Err(AnalyticsError::InvalidInput(format!(
            "a correlation needs at least 2 pairs, got minimum {}",
            min_pairs
        )));
    }
    Ok(())
}
