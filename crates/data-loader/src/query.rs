//! Typed movie predicates for listing queries.
//!
//! A `MovieQuery` is a conjunction of independent `MoviePredicate`s built
//! per request. The store evaluates them; nothing here assembles query
//! strings.

use crate::types::{DataIndex, Movie};
use tracing::debug;

/// One filter condition over movies
#[derive(Debug, Clone, PartialEq)]
pub enum MoviePredicate {
    /// Case-insensitive substring of the title
    TitleContains(String),
    /// Movie has a genre with this name (case-insensitive)
    Genre(String),
    /// Released in exactly this year
    Year(u16),
    /// Released within `from..=to`
    YearRange { from: u16, to: u16 },
}

impl MoviePredicate {
    /// Evaluate against a movie of `index`
    pub fn matches(&self, movie: &Movie, index: &DataIndex) -> bool {
        match self {
            MoviePredicate::TitleContains(term) => {
                movie.title.to_lowercase().contains(&term.to_lowercase())
            }
            MoviePredicate::Genre(name) => match index.get_genre_by_name(name) {
                Some(genre) => movie.genres.contains(&genre.id),
                None => false,
            },
            MoviePredicate::Year(year) => movie.year == Some(*year),
            MoviePredicate::YearRange { from, to } => {
                matches!(movie.year, Some(y) if (*from..=*to).contains(&y))
            }
        }
    }

    /// Name for logging
    pub fn name(&self) -> &'static str {
        match self {
            MoviePredicate::TitleContains(_) => "title",
            MoviePredicate::Genre(_) => "genre",
            MoviePredicate::Year(_) => "year",
            MoviePredicate::YearRange { .. } => "year_range",
        }
    }
}

/// Conjunction of predicates with an optional result cap.
///
/// ## Usage
/// ```ignore
/// let query = MovieQuery::new()
///     .with(MoviePredicate::TitleContains("star".into()))
///     .with(MoviePredicate::Genre("Sci-Fi".into()))
///     .limit(20);
/// let movies = store.search_movies(&query)?;
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovieQuery {
    predicates: Vec<MoviePredicate>,
    limit: Option<usize>,
}

impl MovieQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predicate (builder pattern)
    pub fn with(mut self, predicate: MoviePredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Cap the number of results
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn predicates(&self) -> &[MoviePredicate] {
        &self.predicates
    }

    /// Apply every predicate in sequence, then the cap.
    ///
    /// Input order is preserved.
    pub fn apply<'a>(&self, movies: Vec<&'a Movie>, index: &DataIndex) -> Vec<&'a Movie> {
        let mut current = movies;
        for predicate in &self.predicates {
            let before = current.len();
            current.retain(|movie| predicate.matches(movie, index));
            debug!(
                "Applied predicate {} ({} -> {} movies)",
                predicate.name(),
                before,
                current.len()
            );
        }
        if let Some(limit) = self.limit {
            current.truncate(limit);
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Genre;

    fn create_test_index() -> DataIndex {
        let mut index = DataIndex::new();
        index.insert_genre(Genre {
            id: 1,
            name: "Action".to_string(),
        });
        index.insert_genre(Genre {
            id: 2,
            name: "Sci-Fi".to_string(),
        });

        index.insert_movie(Movie {
            id: 1,
            title: "Star Wars: Episode IV - A New Hope".to_string(),
            year: Some(1977),
            poster_path: None,
            genres: vec![1, 2],
        });
        index.insert_movie(Movie {
            id: 2,
            title: "Star Trek: Generations".to_string(),
            year: Some(1994),
            poster_path: None,
            genres: vec![2],
        });
        index.insert_movie(Movie {
            id: 3,
            title: "Heat".to_string(),
            year: Some(1995),
            poster_path: None,
            genres: vec![1],
        });
        index
    }

    fn run(query: &MovieQuery, index: &DataIndex) -> Vec<u32> {
        let mut movies: Vec<&Movie> = index.movies.values().collect();
        movies.sort_by_key(|m| m.id);
        query.apply(movies, index).iter().map(|m| m.id).collect()
    }

    #[test]
    fn test_empty_query_keeps_everything() {
        let index = create_test_index();
        assert_eq!(run(&MovieQuery::new(), &index), vec![1, 2, 3]);
    }

    #[test]
    fn test_predicates_are_conjunctive() {
        let index = create_test_index();
        let query = MovieQuery::new()
            .with(MoviePredicate::TitleContains("STAR".to_string()))
            .with(MoviePredicate::Genre("action".to_string()));

        assert_eq!(run(&query, &index), vec![1]);
    }

    #[test]
    fn test_year_predicates() {
        let index = create_test_index();
        assert_eq!(run(&MovieQuery::new().with(MoviePredicate::Year(1994)), &index), vec![2]);

        let range = MovieQuery::new().with(MoviePredicate::YearRange {
            from: 1990,
            to: 1999,
        });
        assert_eq!(run(&range, &index), vec![2, 3]);
    }

    #[test]
    fn test_unknown_genre_matches_nothing() {
        let index = create_test_index();
        let query = MovieQuery::new().with(MoviePredicate::Genre("Western".to_string()));
        assert!(run(&query, &index).is_empty());
    }

    #[test]
    fn test_limit() {
        let index = create_test_index();
        assert_eq!(run(&MovieQuery::new().limit(2), &index), vec![1, 2]);
    }
}
