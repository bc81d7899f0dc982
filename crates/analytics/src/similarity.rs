//! Similarity Engine
//!
//! Ranks movies against a target by genre overlap first and closeness of
//! community average rating second.
//!
//! ## Scoring
//! - genre similarity: shared genres / target genre count, 2 decimals
//! - rating similarity: 1 / (1 + |avg(candidate) - avg(target)|), 3 decimals,
//!   with an unrated movie counting as an average of 0
//!
//! Only movies sharing at least one genre are candidates.

use crate::error::{AnalyticsError, Result};
use crate::stats::round_to;
use data_loader::{FactStore, GenreId, Movie, MovieId};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::{debug, instrument};

#[derive(Debug, Clone, PartialEq)]
pub struct SimilarMovie {
    pub movie: Movie,
    /// Community average rounded to 2 decimals, `None` when unrated
    pub avg_rating: Option<f64>,
    pub shared_genres: usize,
    pub genre_similarity: f64,
    pub rating_similarity: f64,
}

#[instrument(skip(store))]
pub fn similar_movies(
    store: &dyn FactStore,
    movie_id: MovieId,
    limit: usize,
) -> Result<Vec<SimilarMovie>> {
    let target = store
        .movie(movie_id)?
        .ok_or(AnalyticsError::MovieNotFound(movie_id))?;

    let target_genres: HashSet<GenreId> = target.genres.iter().copied().collect();
    if limit == 0 || target_genres.is_empty() {
        return Ok(Vec::new());
    }
    let k = target_genres.len() as f64;

    let target_avg = store
        .movie_average_ratings(&[movie_id])?
        .get(&movie_id)
        .copied()
        .unwrap_or(0.0);

    let genre_ids: Vec<GenreId> = target_genres.iter().copied().collect();
    let candidates: Vec<Movie> = store
        .movies_with_any_genre(&genre_ids)?
        .into_iter()
        .filter(|m| m.id != movie_id)
        .collect();
    let candidate_ids: Vec<MovieId> = candidates.iter().map(|m| m.id).collect();
    let averages = store.movie_average_ratings(&candidate_ids)?;

    let mut scored: Vec<SimilarMovie> = candidates
        .into_par_iter()
        .filter_map(|movie| {
            let shared = movie.shared_genre_count(&target_genres);
            if shared == 0 {
                return None;
            }
            let avg = averages.get(&movie.id).copied();
            let gap = (avg.unwrap_or(0.0) - target_avg).abs();
            Some(SimilarMovie {
                avg_rating: avg.map(|a| round_to(a, 2)),
                shared_genres: shared,
                genre_similarity: round_to(shared as f64 / k, 2),
                rating_similarity: round_to(1.0 / (1.0 + gap), 3),
                movie,
            })
        })
        .collect();
    debug!("Scored {} candidates", scored.len());

    scored.sort_by(compare_similarity);
    scored.truncate(limit);
    Ok(scored)
}

fn compare_similarity(a: &SimilarMovie, b: &SimilarMovie) -> Ordering {
    b.genre_similarity
        .total_cmp(&a.genre_similarity)
        .then_with(|| b.rating_similarity.total_cmp(&a.rating_similarity))
        .then_with(|| a.movie.id.cmp(&b.movie.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{DataIndex, Genre, Rating};

    fn add_movie(index: &mut DataIndex, id: MovieId, genres: Vec<GenreId>, ratings: &[f32]) {
        index.insert_movie(Movie {
            id,
            title: format!("Movie {}", id),
            year: Some(2000),
            poster_path: None,
            genres,
        });
        for (i, rating) in ratings.iter().enumerate() {
            index.insert_rating(Rating {
                user_id: i as u32 + 1,
                movie_id: id,
                rating: *rating,
                timestamp: None,
            });
        }
    }

    fn create_test_index() -> DataIndex {
        let mut index = DataIndex::new();
        for (id, name) in [(1, "Action"), (2, "Comedy"), (3, "Drama")] {
            index.insert_genre(Genre {
                id,
                name: name.to_string(),
            });
        }
        add_movie(&mut index, 1, vec![1, 2], &[3.0, 4.0]); // target, avg 3.5
        add_movie(&mut index, 2, vec![1, 2], &[3.5]);
        add_movie(&mut index, 3, vec![1], &[3.5]);
        add_movie(&mut index, 4, vec![2, 3], &[1.5]);
        add_movie(&mut index, 5, vec![3], &[3.5]);
        add_movie(&mut index, 6, vec![2], &[]);
        index
    }

    #[test]
    fn test_full_overlap_ranks_first() {
        let index = create_test_index();
        let similar = similar_movies(&index, 1, 10).unwrap();

        assert_eq!(similar[0].movie.id, 2);
        assert_eq!(similar[0].genre_similarity, 1.0);
        assert_eq!(similar[0].rating_similarity, 1.0);
        assert_eq!(similar[0].shared_genres, 2);
        assert!(similar[1..].iter().all(|s| s.genre_similarity < 1.0));
    }

    #[test]
    fn test_excludes_target_and_unrelated() {
        let index = create_test_index();
        let ids: Vec<MovieId> = similar_movies(&index, 1, 10)
            .unwrap()
            .iter()
            .map(|s| s.movie.id)
            .collect();
        assert_eq!(ids, vec![2, 3, 4, 6]);
    }

    #[test]
    fn test_rating_similarity_breaks_genre_ties() {
        let index = create_test_index();
        let similar = similar_movies(&index, 1, 10).unwrap();

        // Movie 3 avg 3.5, movie 4 avg 1.5 (gap 2), movie 6 unrated (gap 3.5)
        assert_eq!(similar[1].rating_similarity, 1.0);
        assert_eq!(similar[2].rating_similarity, 0.333);
        assert_eq!(similar[3].rating_similarity, 0.222);
        assert_eq!(similar[3].avg_rating, None);
        assert_eq!(similar[2].avg_rating, Some(1.5));
    }

    #[test]
    fn test_limit() {
        let index = create_test_index();
        assert_eq!(similar_movies(&index, 1, 2).unwrap().len(), 2);
        assert!(similar_movies(&index, 1, 0).unwrap().is_empty());
    }

    #[test]
    fn test_genreless_target_and_unknown_target() {
        let mut index = create_test_index();
        add_movie(&mut index, 9, vec![], &[4.0]);

        assert!(similar_movies(&index, 9, 10).unwrap().is_empty());
        assert_eq!(
            similar_movies(&index, 404, 10).unwrap_err(),
            AnalyticsError::MovieNotFound(404)
        );
    }

    #[test]
    fn test_bounds() {
        let index = create_test_index();
        for s in similar_movies(&index, 4, 10).unwrap() {
            assert!((0.0..=1.0).contains(&s.genre_similarity));
            assert!(s.rating_similarity > 0.0 && s.rating_similarity <= 1.0);
            assert!(s.shared_genres > 0);
        }
    }
}
