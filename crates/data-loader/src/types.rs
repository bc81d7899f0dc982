//! Core domain types for the movie/ratings dataset.
//!
//! This module defines the fact types every other crate reads:
//! movies, genres, the two rating populations and personality profiles,
//! plus `DataIndex`, the in-memory store that owns them.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a user
pub type UserId = u32;

/// Unique identifier for a movie (MovieLens `movieId`)
pub type MovieId = u32;

/// Unique identifier for a genre, assigned at load time
pub type GenreId = u32;

// =============================================================================
// Movie-related Types
// =============================================================================

/// Represents a movie in the dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    /// Title with the trailing "(YYYY)" removed
    pub title: String,
    pub year: Option<u16>,
    /// Relative poster path, filled in by enrichment when available
    pub poster_path: Option<String>,
    /// Genres for this movie. May be empty.
    pub genres: Vec<GenreId>,
}

impl Movie {
    /// Number of this movie's genres that are also in `genres`
    pub fn shared_genre_count(&self, genres: &HashSet<GenreId>) -> usize {
        self.genres.iter().filter(|g| genres.contains(g)).count()
    }
}

/// A genre. The name is the display and grouping key for genre reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
}

// =============================================================================
// Rating Types
// =============================================================================

/// Represents a single rating from a user for a movie
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub rating: f32,
    /// Unix timestamp when rating was made, if the source recorded one
    pub timestamp: Option<i64>,
}

/// Which of the two disjoint rating populations a query reads.
///
/// `General` is the MovieLens population; `Personality` is the
/// personality-study population. They are never aggregated together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RatingPopulation {
    General,
    Personality,
}

/// The bounded, stepped range rating scores live in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingScale {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl RatingScale {
    /// MovieLens half-star scale: 0.5 to 5.0 in 0.5 steps
    pub const HALF_STARS: RatingScale = RatingScale {
        min: 0.5,
        max: 5.0,
        step: 0.5,
    };

    /// Whether `value` is inside the range and on a step boundary
    pub fn contains(&self, value: f32) -> bool {
        if !value.is_finite() || value < self.min || value > self.max {
            return false;
        }
        let steps = (value - self.min) / self.step;
        (steps - steps.round()).abs() < 1e-4
    }
}

impl Default for RatingScale {
    fn default() -> Self {
        Self::HALF_STARS
    }
}

// =============================================================================
// Personality Types
// =============================================================================

/// The five personality traits recorded for each study participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PersonalityTrait {
    Openness,
    Agreeableness,
    EmotionalStability,
    Conscientiousness,
    Extraversion,
}

impl PersonalityTrait {
    /// All traits, in report column order
    pub const ALL: [PersonalityTrait; 5] = [
        PersonalityTrait::Openness,
        PersonalityTrait::Agreeableness,
        PersonalityTrait::EmotionalStability,
        PersonalityTrait::Conscientiousness,
        PersonalityTrait::Extraversion,
    ];
}

/// Trait scores and cluster assignment of one personality-study user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalityProfile {
    pub user_id: UserId,
    pub openness: Option<f64>,
    pub agreeableness: Option<f64>,
    pub emotional_stability: Option<f64>,
    pub conscientiousness: Option<f64>,
    pub extraversion: Option<f64>,
    pub assigned_metric: String,
    pub assigned_condition: String,
}

impl PersonalityProfile {
    pub fn trait_score(&self, personality_trait: PersonalityTrait) -> Option<f64> {
        match personality_trait {
            PersonalityTrait::Openness => self.openness,
            PersonalityTrait::Agreeableness => self.agreeableness,
            PersonalityTrait::EmotionalStability => self.emotional_stability,
            PersonalityTrait::Conscientiousness => self.conscientiousness,
            PersonalityTrait::Extraversion => self.extraversion,
        }
    }
}

// =============================================================================
// DataIndex - The In-Memory Fact Store
// =============================================================================

/// Record counts, mostly for logging and validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DatasetCounts {
    pub users: usize,
    pub movies: usize,
    pub genres: usize,
    pub ratings: usize,
    pub personality_profiles: usize,
    pub personality_ratings: usize,
}

/// Main data structure that holds all facts and their lookup indices.
///
/// The index is built once and then only read; share it behind an `Arc`.
#[derive(Debug, Default)]
pub struct DataIndex {
    // Primary data stores
    pub(crate) movies: HashMap<MovieId, Movie>,
    pub(crate) genres: BTreeMap<GenreId, Genre>,
    pub(crate) users: HashSet<UserId>,

    // General population ratings, indexed both ways
    pub(crate) user_ratings: HashMap<UserId, Vec<Rating>>,
    pub(crate) movie_ratings: HashMap<MovieId, Vec<Rating>>,

    // Personality study population
    pub(crate) personality_profiles: BTreeMap<UserId, PersonalityProfile>,
    pub(crate) personality_ratings: Vec<Rating>,

    // Secondary indices, kept sorted by movie id
    pub(crate) genre_index: HashMap<GenreId, Vec<MovieId>>,
    pub(crate) year_index: BTreeMap<u16, Vec<MovieId>>,
    pub(crate) genre_names: HashMap<String, GenreId>,
}

impl DataIndex {
    /// Creates a new, empty DataIndex
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a movie by ID
    pub fn get_movie(&self, id: MovieId) -> Option<&Movie> {
        self.movies.get(&id)
    }

    /// Get a genre by ID
    pub fn get_genre(&self, id: GenreId) -> Option<&Genre> {
        self.genres.get(&id)
    }

    /// Look up a genre by name, ignoring ASCII case
    pub fn get_genre_by_name(&self, name: &str) -> Option<&Genre> {
        self.genre_names
            .get(&name.to_ascii_lowercase())
            .and_then(|id| self.genres.get(id))
    }

    /// All genres ordered by id
    pub fn all_genres(&self) -> impl Iterator<Item = &Genre> {
        self.genres.values()
    }

    /// Whether the user is known to the store (has an account or any rating)
    pub fn has_user(&self, id: UserId) -> bool {
        self.users.contains(&id)
    }

    /// Get all general-population ratings made by a user
    ///
    /// Returns an empty slice if user has no ratings
    pub fn get_user_ratings(&self, user_id: UserId) -> &[Rating] {
        self.user_ratings
            .get(&user_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Get all general-population ratings for a movie
    pub fn get_movie_ratings(&self, movie_id: MovieId) -> &[Rating] {
        self.movie_ratings
            .get(&movie_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Get all movies in a specific genre, ascending by id
    pub fn get_movies_by_genre(&self, genre: GenreId) -> &[MovieId] {
        self.genre_index
            .get(&genre)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Get all movies released in a specific year, ascending by id
    pub fn get_movies_by_year(&self, year: u16) -> &[MovieId] {
        self.year_index
            .get(&year)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Movies released within `from..=to`, ascending by id
    pub fn get_movies_in_years(&self, from: u16, to: u16) -> Vec<MovieId> {
        if from > to {
            return Vec::new();
        }
        let mut ids: Vec<MovieId> = self
            .year_index
            .range(from..=to)
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Get the personality profile of a study participant
    pub fn get_personality_profile(&self, user_id: UserId) -> Option<&PersonalityProfile> {
        self.personality_profiles.get(&user_id)
    }

    /// All movie ids in ascending order
    pub fn get_all_movie_ids(&self) -> Vec<MovieId> {
        let mut ids: Vec<MovieId> = self.movies.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// All general-population user ids in ascending order
    pub fn get_all_user_ids(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.users.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    // Mutators - used while loading, before the index is shared

    /// Insert a genre, replacing any genre with the same id
    pub fn insert_genre(&mut self, genre: Genre) {
        self.genre_names
            .insert(genre.name.to_ascii_lowercase(), genre.id);
        self.genres.insert(genre.id, genre);
    }

    /// Insert a movie and update the genre and year indices
    pub fn insert_movie(&mut self, movie: Movie) {
        if let Some(previous) = self.movies.remove(&movie.id) {
            self.unindex_movie(&previous);
        }

        for &genre in &movie.genres {
            insert_sorted(self.genre_index.entry(genre).or_default(), movie.id);
        }
        if let Some(year) = movie.year {
            insert_sorted(self.year_index.entry(year).or_default(), movie.id);
        }
        self.movies.insert(movie.id, movie);
    }

    /// Register a user that may not have rated anything yet
    pub fn insert_user(&mut self, user_id: UserId) {
        self.users.insert(user_id);
    }

    /// Insert a general-population rating and update indices
    pub fn insert_rating(&mut self, rating: Rating) {
        self.users.insert(rating.user_id);

        self.user_ratings
            .entry(rating.user_id)
            .or_default()
            .push(rating);

        self.movie_ratings
            .entry(rating.movie_id)
            .or_default()
            .push(rating);
    }

    /// Insert a personality profile, replacing any previous one for the user
    pub fn insert_personality_profile(&mut self, profile: PersonalityProfile) {
        self.personality_profiles.insert(profile.user_id, profile);
    }

    /// Insert a personality-study rating
    pub fn insert_personality_rating(&mut self, rating: Rating) {
        self.personality_ratings.push(rating);
    }

    /// Get counts for debugging/validation
    pub fn counts(&self) -> DatasetCounts {
        DatasetCounts {
            users: self.users.len(),
            movies: self.movies.len(),
            genres: self.genres.len(),
            ratings: self.user_ratings.values().map(|v| v.len()).sum(),
            personality_profiles: self.personality_profiles.len(),
            personality_ratings: self.personality_ratings.len(),
        }
    }

    fn unindex_movie(&mut self, movie: &Movie) {
        for genre in &movie.genres {
            if let Some(ids) = self.genre_index.get_mut(genre) {
                ids.retain(|&id| id != movie.id);
            }
        }
        if let Some(ids) = movie.year.and_then(|y| self.year_index.get_mut(&y)) {
            ids.retain(|&id| id != movie.id);
        }
    }
}

fn insert_sorted(ids: &mut Vec<MovieId>, id: MovieId) {
    if let Err(pos) = ids.binary_search(&id) {
        ids.insert(pos, id);
    }
}
