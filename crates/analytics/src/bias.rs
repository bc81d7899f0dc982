//! Bias Engine
//!
//! A user's rating bias is how far their mean rating sits from the global
//! mean of the general population. Both means are rounded to 2 decimals
//! before the difference is taken, so the reported numbers add up.

use crate::aggregation::desc_option;
use crate::error::{AnalyticsError, Result};
use crate::stats::{mean, round_to};
use data_loader::{FactStore, Rating, RatingPopulation, UserId};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UserBias {
    pub user_id: UserId,
    pub rating_count: usize,
    pub user_avg: Option<f64>,
    pub global_avg: Option<f64>,
    pub bias: Option<f64>,
}

impl UserBias {
    fn new(user_id: UserId, values: &[f64], global_avg: Option<f64>) -> Self {
        let user_avg = mean(values).map(|m| round_to(m, 2));
        let bias = match (user_avg, global_avg) {
            (Some(user), Some(global)) => Some(round_to(user - global, 2)),
            _ => None,
        };
        Self {
            user_id,
            rating_count: values.len(),
            user_avg,
            global_avg,
            bias,
        }
    }
}

fn global_average(ratings: &[Rating]) -> Option<f64> {
    let values: Vec<f64> = ratings.iter().map(|r| f64::from(r.rating)).collect();
    mean(&values).map(|m| round_to(m, 2))
}

/// Bias of every user with at least `min_sample_size` ratings.
///
/// Most generous raters first; ties by user id.
#[instrument(skip(store))]
pub fn rating_bias_all(store: &dyn FactStore, min_sample_size: usize) -> Result<Vec<UserBias>> {
    let ratings = store.ratings(RatingPopulation::General)?;
    let global_avg = global_average(&ratings);

    let mut by_user: BTreeMap<UserId, Vec<f64>> = BTreeMap::new();
    for rating in &ratings {
        by_user
            .entry(rating.user_id)
            .or_default()
            .push(f64::from(rating.rating));
    }
    let users = by_user.len();

    let mut result: Vec<UserBias> = by_user
        .into_iter()
        .filter(|(_, values)| !values.is_empty() && values.len() >= min_sample_size)
        .map(|(user_id, values)| UserBias::new(user_id, &values, global_avg))
        .collect();
    result.sort_by(|a, b| desc_option(a.bias, b.bias).then_with(|| a.user_id.cmp(&b.user_id)));

    debug!(
        "{} of {} users have at least {} ratings",
        result.len(),
        users,
        min_sample_size
    );
    Ok(result)
}

/// Bias of one user, whatever the number of ratings.
#[instrument(skip(store))]
pub fn rating_bias_for_user(store: &dyn FactStore, user_id: UserId) -> Result<UserBias> {
    if !store.user_exists(user_id)? {
        return Err(AnalyticsError::UserNotFound(user_id));
    }
    let global_avg = global_average(&store.ratings(RatingPopulation::General)?);
    let values: Vec<f64> = store
        .user_ratings(user_id)?
        .iter()
        .map(|r| f64::from(r.rating))
        .collect();
    Ok(UserBias::new(user_id, &values, global_avg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{DataIndex, Genre, Movie};

    fn create_test_index() -> DataIndex {
        let mut index = DataIndex::new();
        index.insert_genre(Genre {
            id: 1,
            name: "Drama".to_string(),
        });
        for id in 1..=10 {
            index.insert_movie(Movie {
                id,
                title: format!("Movie {}", id),
                year: None,
                poster_path: None,
                genres: vec![1],
            });
        }
        // User 1: ten ratings of 4.0; user 2: ten of 3.0; user 3: one 1.0
        for movie_id in 1..=10 {
            for (user_id, rating) in [(1, 4.0), (2, 3.0)] {
                index.insert_rating(Rating {
                    user_id,
                    movie_id,
                    rating,
                    timestamp: None,
                });
            }
        }
        index.insert_rating(Rating {
            user_id: 3,
            movie_id: 1,
            rating: 1.0,
            timestamp: None,
        });
        index
    }

    #[test]
    fn test_all_users_gated_and_ordered() {
        let index = create_test_index();
        let biases = rating_bias_all(&index, 10).unwrap();

        // Global mean: (40 + 30 + 1) / 21 = 3.38
        assert_eq!(biases.len(), 2);
        assert_eq!(biases[0].user_id, 1);
        assert_eq!(biases[0].global_avg, Some(3.38));
        assert_eq!(biases[0].bias, Some(0.62));
        assert_eq!(biases[1].bias, Some(-0.38));
    }

    #[test]
    fn test_single_user_has_no_gate() {
        let index = create_test_index();
        let bias = rating_bias_for_user(&index, 3).unwrap();
        assert_eq!(bias.rating_count, 1);
        assert_eq!(bias.user_avg, Some(1.0));
        assert_eq!(bias.bias, Some(-2.38));
    }

    #[test]
    fn test_single_user_without_ratings() {
        let mut index = create_test_index();
        index.insert_user(42);

        let bias = rating_bias_for_user(&index, 42).unwrap();
        assert_eq!(bias.rating_count, 0);
        assert_eq!(bias.user_avg, None);
        assert_eq!(bias.bias, None);
        assert_eq!(bias.global_avg, Some(3.38));
    }

    #[test]
    fn test_unknown_user() {
        let index = create_test_index();
        assert_eq!(
            rating_bias_for_user(&index, 77).unwrap_err(),
            AnalyticsError::UserNotFound(77)
        );
    }

    #[test]
    fn test_empty_population() {
        let mut index = DataIndex::new();
        index.insert_user(1);
        assert!(rating_bias_all(&index, 0).unwrap().is_empty());
        let bias = rating_bias_for_user(&index, 1).unwrap();
        assert_eq!(bias.global_avg, None);
        assert_eq!(bias.bias, None);
    }
}
