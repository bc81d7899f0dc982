//! Read access to the facts.
//!
//! `FactStore` is the data-access handle the analytics engines receive for
//! each call. It exposes reads plus the few set-membership and aggregation
//! queries the engines need, and returns owned snapshots so an
//! implementation backed by a database can satisfy it as well as the
//! in-memory `DataIndex`.
//!
//! Every method may fail with `StoreError`; engines propagate that error
//! unchanged and never retry.

use crate::error::StoreResult;
use crate::query::{MoviePredicate, MovieQuery};
use crate::types::*;
use std::collections::{HashMap, HashSet};

pub trait FactStore: Send + Sync {
    /// All genres ordered by id
    fn genres(&self) -> StoreResult<Vec<Genre>>;

    /// A single movie, `None` if it does not exist
    fn movie(&self, id: MovieId) -> StoreResult<Option<Movie>>;

    /// The movies among `ids` that exist, ascending by id
    fn movies(&self, ids: &[MovieId]) -> StoreResult<Vec<Movie>>;

    /// Movies having at least one of `genres`, ascending by id
    fn movies_with_any_genre(&self, genres: &[GenreId]) -> StoreResult<Vec<Movie>>;

    /// The movie ↔ genre relation for every movie
    fn movie_genres(&self) -> StoreResult<HashMap<MovieId, Vec<GenreId>>>;

    /// Whether the user exists in the general population
    fn user_exists(&self, user_id: UserId) -> StoreResult<bool>;

    /// Every rating of one population
    fn ratings(&self, population: RatingPopulation) -> StoreResult<Vec<Rating>>;

    /// General-population ratings made by one user
    fn user_ratings(&self, user_id: UserId) -> StoreResult<Vec<Rating>>;

    /// General-population ratings of one movie
    fn movie_ratings(&self, movie_id: MovieId) -> StoreResult<Vec<Rating>>;

    /// Community average rating of each of `ids` that has ratings.
    /// Unrated movies are absent from the map.
    fn movie_average_ratings(&self, ids: &[MovieId]) -> StoreResult<HashMap<MovieId, f64>>;

    /// Every personality profile, ascending by user id
    fn personality_profiles(&self) -> StoreResult<Vec<PersonalityProfile>>;

    /// Movies satisfying every predicate of `query`, ascending by id
    fn search_movies(&self, query: &MovieQuery) -> StoreResult<Vec<Movie>>;
}

impl FactStore for DataIndex {
    fn genres(&self) -> StoreResult<Vec<Genre>> {
        Ok(self.all_genres().cloned().collect())
    }

    fn movie(&self, id: MovieId) -> StoreResult<Option<Movie>> {
        Ok(self.get_movie(id).cloned())
    }

    fn movies(&self, ids: &[MovieId]) -> StoreResult<Vec<Movie>> {
        let mut movies: Vec<Movie> = ids
            .iter()
            .collect::<HashSet<_>>()
            .into_iter()
            .filter_map(|id| self.get_movie(*id).cloned())
            .collect();
        movies.sort_by_key(|m| m.id);
        Ok(movies)
    }

    fn movies_with_any_genre(&self, genres: &[GenreId]) -> StoreResult<Vec<Movie>> {
        let mut ids: Vec<MovieId> = genres
            .iter()
            .flat_map(|g| self.get_movies_by_genre(*g).iter().copied())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids
            .into_iter()
            .filter_map(|id| self.get_movie(id).cloned())
            .collect())
    }

    fn movie_genres(&self) -> StoreResult<HashMap<MovieId, Vec<GenreId>>> {
        Ok(self
            .movies
            .values()
            .map(|m| (m.id, m.genres.clone()))
            .collect())
    }

    fn user_exists(&self, user_id: UserId) -> StoreResult<bool> {
        Ok(self.has_user(user_id))
    }

    fn ratings(&self, population: RatingPopulation) -> StoreResult<Vec<Rating>> {
        Ok(match population {
            RatingPopulation::General => {
                let mut users: Vec<&UserId> = self.user_ratings.keys().collect();
                users.sort_unstable();
                users
                    .into_iter()
                    .flat_map(|u| self.user_ratings[u].iter().copied())
                    .collect()
            }
            RatingPopulation::Personality => self.personality_ratings.clone(),
        })
    }

    fn user_ratings(&self, user_id: UserId) -> StoreResult<Vec<Rating>> {
        Ok(self.get_user_ratings(user_id).to_vec())
    }

    fn movie_ratings(&self, movie_id: MovieId) -> StoreResult<Vec<Rating>> {
        Ok(self.get_movie_ratings(movie_id).to_vec())
    }

    fn movie_average_ratings(&self, ids: &[MovieId]) -> StoreResult<HashMap<MovieId, f64>> {
        Ok(ids
            .iter()
            .filter_map(|&id| {
                let ratings = self.get_movie_ratings(id);
                if ratings.is_empty() {
                    return None;
                }
                let total: f64 = ratings.iter().map(|r| f64::from(r.rating)).sum();
                Some((id, total / ratings.len() as f64))
            })
            .collect())
    }

    fn personality_profiles(&self) -> StoreResult<Vec<PersonalityProfile>> {
        Ok(self.personality_profiles.values().cloned().collect())
    }

    fn search_movies(&self, query: &MovieQuery) -> StoreResult<Vec<Movie>> {
        let movies: Vec<&Movie> = match self.indexed_candidates(query) {
            Some(ids) => ids.iter().filter_map(|id| self.movies.get(id)).collect(),
            None => {
                let mut all: Vec<&Movie> = self.movies.values().collect();
                all.sort_by_key(|m| m.id);
                all
            }
        };
        Ok(query.apply(movies, self).into_iter().cloned().collect())
    }
}

impl DataIndex {
    /// Candidate ids (ascending) from the year or genre index, when the
    /// query has a predicate one of them can answer. The full predicate
    /// list is still applied to the candidates afterwards.
    fn indexed_candidates(&self, query: &MovieQuery) -> Option<Vec<MovieId>> {
        query.predicates().iter().find_map(|predicate| match predicate {
            MoviePredicate::Year(year) => Some(self.get_movies_by_year(*year).to_vec()),
            MoviePredicate::YearRange { from, to } => Some(self.get_movies_in_years(*from, *to)),
            MoviePredicate::Genre(name) => Some(
                self.get_genre_by_name(name)
                    .map(|genre| self.get_movies_by_genre(genre.id).to_vec())
                    .unwrap_or_default(),
            ),
            MoviePredicate::TitleContains(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_index() -> DataIndex {
        let mut index = DataIndex::new();
        for (id, name) in [(1, "Action"), (2, "Comedy"), (3, "Drama")] {
            index.insert_genre(Genre {
                id,
                name: name.to_string(),
            });
        }
        index.insert_movie(Movie {
            id: 10,
            title: "Rush Hour".to_string(),
            year: Some(1998),
            poster_path: None,
            genres: vec![1, 2],
        });
        index.insert_movie(Movie {
            id: 20,
            title: "Heat".to_string(),
            year: Some(1995),
            poster_path: None,
            genres: vec![1],
        });
        index.insert_movie(Movie {
            id: 30,
            title: "Magnolia".to_string(),
            year: Some(1999),
            poster_path: None,
            genres: vec![3],
        });
        index.insert_rating(Rating {
            user_id: 1,
            movie_id: 10,
            rating: 4.0,
            timestamp: None,
        });
        index.insert_rating(Rating {
            user_id: 2,
            movie_id: 10,
            rating: 3.0,
            timestamp: None,
        });
        index.insert_personality_rating(Rating {
            user_id: 900,
            movie_id: 20,
            rating: 5.0,
            timestamp: None,
        });
        index
    }

    #[test]
    fn test_movies_with_any_genre_is_deduplicated() {
        let index = create_test_index();
        let movies = index.movies_with_any_genre(&[1, 2]).unwrap();
        let ids: Vec<MovieId> = movies.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![10, 20]);
    }

    #[test]
    fn test_movies_skips_unknown_ids() {
        let index = create_test_index();
        let movies = index.movies(&[30, 99, 10, 30]).unwrap();
        let ids: Vec<MovieId> = movies.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![10, 30]);
    }

    #[test]
    fn test_populations_are_separate() {
        let index = create_test_index();
        assert_eq!(index.ratings(RatingPopulation::General).unwrap().len(), 2);
        let personality = index.ratings(RatingPopulation::Personality).unwrap();
        assert_eq!(personality.len(), 1);
        assert_eq!(personality[0].user_id, 900);
    }

    #[test]
    fn test_movie_average_ratings_omits_unrated() {
        let index = create_test_index();
        let averages = index.movie_average_ratings(&[10, 20]).unwrap();
        assert_eq!(averages.len(), 1);
        assert_eq!(averages[&10], 3.5);
    }

    #[test]
    fn test_search_movies() {
        let index = create_test_index();
        let query = MovieQuery::new().with(MoviePredicate::Genre("Action".to_string()));
        let ids: Vec<MovieId> = index
            .search_movies(&query)
            .unwrap()
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec![10, 20]);
    }

    #[test]
    fn test_search_movies_by_year() {
        let index = create_test_index();
        let search = |query: MovieQuery| -> Vec<MovieId> {
            index
                .search_movies(&query)
                .unwrap()
                .iter()
                .map(|m| m.id)
                .collect()
        };

        assert_eq!(search(MovieQuery::new().with(MoviePredicate::Year(1995))), vec![20]);
        assert_eq!(
            search(MovieQuery::new().with(MoviePredicate::YearRange {
                from: 1995,
                to: 1998
            })),
            vec![10, 20]
        );
        // Later predicates still filter the indexed candidates
        assert_eq!(
            search(
                MovieQuery::new()
                    .with(MoviePredicate::YearRange { from: 1990, to: 1999 })
                    .with(MoviePredicate::Genre("action".to_string()))
                    .with(MoviePredicate::TitleContains("rush".to_string()))
            ),
            vec![10]
        );
        let inverted = MoviePredicate::YearRange {
            from: 1999,
            to: 1995,
        };
        assert!(search(MovieQuery::new().with(inverted)).is_empty());
        let unknown_genre = MoviePredicate::Genre("Western".to_string());
        assert!(search(MovieQuery::new().with(unknown_genre)).is_empty());
    }

    #[test]
    fn test_user_exists() {
        let index = create_test_index();
        assert!(index.user_exists(1).unwrap());
        assert!(!index.user_exists(900).unwrap());
    }
}
