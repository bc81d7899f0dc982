//! Prediction Engine
//!
//! Predicts a user's rating of a movie from the user's own history: every
//! other movie the user rated that shares genres with the target votes
//! with its rating, weighted by the number of shared genres.

use crate::error::{AnalyticsError, Result};
use crate::stats::round_to;
use data_loader::{FactStore, GenreId, Movie, MovieId, UserId};
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// `None` when no rated movie shares a genre with the target
    pub predicted_rating: Option<f64>,
    /// Number of rated movies that contributed
    pub based_on_movies: usize,
    /// Sum of the contributing genre overlaps
    pub total_genre_overlap: usize,
}

impl Prediction {
    pub fn is_cold_start(&self) -> bool {
        self.predicted_rating.is_none()
    }
}

#[instrument(skip(store))]
pub fn predict_rating(
    store: &dyn FactStore,
    user_id: UserId,
    movie_id: MovieId,
) -> Result<Prediction> {
    let target = store
        .movie(movie_id)?
        .ok_or(AnalyticsError::MovieNotFound(movie_id))?;
    if !store.user_exists(user_id)? {
        return Err(AnalyticsError::UserNotFound(user_id));
    }

    let target_genres: HashSet<GenreId> = target.genres.iter().copied().collect();
    let history: Vec<(MovieId, f64)> = store
        .user_ratings(user_id)?
        .into_iter()
        .filter(|r| r.movie_id != movie_id)
        .map(|r| (r.movie_id, f64::from(r.rating)))
        .collect();

    let ids: Vec<MovieId> = history.iter().map(|(id, _)| *id).collect();
    let rated: HashMap<MovieId, Movie> = store
        .movies(&ids)?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();

    let mut weighted_sum = 0.0;
    let mut total_weight = 0usize;
    let mut based_on = 0usize;
    for (id, rating) in &history {
        let Some(movie) = rated.get(id) else {
            continue;
        };
        let weight = movie.shared_genre_count(&target_genres);
        if weight == 0 {
            continue;
        }
        weighted_sum += rating * weight as f64;
        total_weight += weight;
        based_on += 1;
    }

    let predicted_rating = if total_weight == 0 {
        None
    } else {
        Some(round_to(weighted_sum / total_weight as f64, 2))
    };
    debug!(
        "{} of {} rated movies overlap the target genres",
        based_on,
        history.len()
    );

    Ok(Prediction {
        predicted_rating,
        based_on_movies: based_on,
        total_genre_overlap: total_weight,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{DataIndex, Genre, Rating};

    fn movie(id: MovieId, genres: Vec<GenreId>) -> Movie {
        Movie {
            id,
            title: format!("Movie {}", id),
            year: None,
            poster_path: None,
            genres,
        }
    }

    fn rate(index: &mut DataIndex, user_id: UserId, movie_id: MovieId, rating: f32) {
        index.insert_rating(Rating {
            user_id,
            movie_id,
            rating,
            timestamp: None,
        });
    }

    fn create_test_index() -> DataIndex {
        let mut index = DataIndex::new();
        for (id, name) in [(1, "Action"), (2, "Comedy"), (3, "Drama")] {
            index.insert_genre(Genre {
                id,
                name: name.to_string(),
            });
        }
        index.insert_movie(movie(1, vec![1, 2])); // target
        index.insert_movie(movie(2, vec![1, 2]));
        index.insert_movie(movie(3, vec![1]));
        index.insert_movie(movie(4, vec![3]));
        index.insert_movie(movie(5, vec![]));
        index
    }

    #[test]
    fn test_single_full_overlap() {
        let mut index = create_test_index();
        rate(&mut index, 7, 2, 4.0);

        let prediction = predict_rating(&index, 7, 1).unwrap();
        assert_eq!(prediction.predicted_rating, Some(4.0));
        assert_eq!(prediction.based_on_movies, 1);
        assert_eq!(prediction.total_genre_overlap, 2);
    }

    #[test]
    fn test_weighted_by_overlap() {
        let mut index = create_test_index();
        rate(&mut index, 7, 2, 5.0); // weight 2
        rate(&mut index, 7, 3, 2.0); // weight 1
        rate(&mut index, 7, 4, 1.0); // no overlap

        let prediction = predict_rating(&index, 7, 1).unwrap();
        // (5*2 + 2*1) / 3
        assert_eq!(prediction.predicted_rating, Some(4.0));
        assert_eq!(prediction.based_on_movies, 2);
        assert_eq!(prediction.total_genre_overlap, 3);
    }

    #[test]
    fn test_target_rating_ignored() {
        let mut index = create_test_index();
        rate(&mut index, 7, 1, 0.5);
        rate(&mut index, 7, 3, 3.5);

        let prediction = predict_rating(&index, 7, 1).unwrap();
        assert_eq!(prediction.predicted_rating, Some(3.5));
        assert_eq!(prediction.based_on_movies, 1);
    }

    #[test]
    fn test_cold_start() {
        let mut index = create_test_index();
        rate(&mut index, 7, 4, 5.0);

        let prediction = predict_rating(&index, 7, 1).unwrap();
        assert!(prediction.is_cold_start());
        assert_eq!(prediction.based_on_movies, 0);
        assert_eq!(prediction.total_genre_overlap, 0);

        // A target without genres can never be predicted
        let genreless = predict_rating(&index, 7, 5).unwrap();
        assert!(genreless.is_cold_start());
    }

    #[test]
    fn test_unknown_ids() {
        let mut index = create_test_index();
        rate(&mut index, 7, 2, 4.0);

        assert_eq!(
            predict_rating(&index, 7, 99).unwrap_err(),
            AnalyticsError::MovieNotFound(99)
        );
        assert_eq!(
            predict_rating(&index, 8, 1).unwrap_err(),
            AnalyticsError::UserNotFound(8)
        );
    }
}
