//! DataIndex building and validation.
//!
//! Turns the parsed CSV records into a `DataIndex`:
//! - assign stable genre ids
//! - insert movies, ratings and the personality population
//! - validate referential integrity and the rating scale

use crate::error::{DataLoadError, Result};
use crate::parser::{self, ParsedMovie};
use crate::types::*;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::{info, warn};

pub const MOVIES_FILE: &str = "movies.csv";
pub const RATINGS_FILE: &str = "ratings.csv";
pub const PERSONALITY_PROFILES_FILE: &str = "personality-data.csv";
pub const PERSONALITY_RATINGS_FILE: &str = "personality-ratings.csv";

impl DataIndex {
    /// Load the dataset from a directory.
    ///
    /// `movies.csv` and `ratings.csv` are required. The personality files
    /// are optional; without them the personality reports are empty.
    ///
    /// Steps:
    /// 1. Parse the files in parallel
    /// 2. Assign genre ids in alphabetical order of name
    /// 3. Insert movies and general ratings
    /// 4. Insert the personality population, skipping dangling ratings
    /// 5. Validate against `scale`
    pub fn load_from_files(data_dir: &Path, scale: RatingScale) -> Result<Self> {
        info!("Loading dataset from {:?}", data_dir);

        let movies_path = data_dir.join(MOVIES_FILE);
        let ratings_path = data_dir.join(RATINGS_FILE);
        let profiles_path = data_dir.join(PERSONALITY_PROFILES_FILE);
        let personality_ratings_path = data_dir.join(PERSONALITY_RATINGS_FILE);

        let ((movies, ratings), (profiles, personality_ratings)) = rayon::join(
            || {
                rayon::join(
                    || parser::parse_movies(&movies_path),
                    || parser::parse_ratings(&ratings_path),
                )
            },
            || {
                rayon::join(
                    || parse_optional(&profiles_path, parser::parse_personality_profiles),
                    || {
                        parse_optional(
                            &personality_ratings_path,
                            parser::parse_personality_ratings,
                        )
                    },
                )
            },
        );

        let movies = movies?;
        let ratings = ratings?;
        let profiles = profiles?;
        let personality_ratings = personality_ratings?;

        info!(
            "Parsed {} movies, {} ratings, {} personality profiles, {} personality ratings",
            movies.len(),
            ratings.len(),
            profiles.len(),
            personality_ratings.len()
        );

        let mut index = DataIndex::new();
        index.insert_parsed_movies(movies);

        for rating in ratings {
            index.insert_rating(rating);
        }

        for profile in profiles {
            index.insert_personality_profile(profile);
        }

        let mut skipped = 0usize;
        for rating in personality_ratings {
            if index.personality_profiles.contains_key(&rating.user_id)
                && index.movies.contains_key(&rating.movie_id)
            {
                index.insert_personality_rating(rating);
            } else {
                skipped += 1;
            }
        }
        if skipped > 0 {
            warn!(
                "Skipped {} personality ratings with unknown user or movie",
                skipped
            );
        }

        index.validate(&scale)?;

        let counts = index.counts();
        info!(
            "DataIndex built: {} users, {} movies, {} genres, {} ratings",
            counts.users, counts.movies, counts.genres, counts.ratings
        );
        Ok(index)
    }

    /// Insert parsed movies, creating genres as they are first seen.
    ///
    /// Genre ids are assigned 1.. in alphabetical order of name so the same
    /// files always produce the same ids.
    pub fn insert_parsed_movies(&mut self, movies: Vec<ParsedMovie>) {
        let names: BTreeSet<&str> = movies
            .iter()
            .flat_map(|m| m.genre_names.iter().map(String::as_str))
            .collect();

        let mut next_id = self.genres.keys().next_back().copied().unwrap_or(0) + 1;
        let mut ids: HashMap<String, GenreId> = HashMap::new();
        for name in names {
            let id = match self.get_genre_by_name(name) {
                Some(existing) => existing.id,
                None => {
                    let id = next_id;
                    next_id += 1;
                    self.insert_genre(Genre {
                        id,
                        name: name.to_string(),
                    });
                    id
                }
            };
            ids.insert(name.to_string(), id);
        }

        for movie in movies {
            let genres = movie
                .genre_names
                .iter()
                .filter_map(|name| ids.get(name).copied())
                .collect();
            self.insert_movie(Movie {
                id: movie.id,
                title: movie.title,
                year: movie.year,
                poster_path: None,
                genres,
            });
        }
    }

    /// Validate data integrity
    ///
    /// Check that:
    /// - every rating references an existing movie
    /// - every movie references existing genres
    /// - every score lies on `scale`
    /// - every personality rating belongs to a profiled user
    pub fn validate(&self, scale: &RatingScale) -> Result<()> {
        if scale.min > scale.max || scale.step <= 0.0 {
            return Err(DataLoadError::InvalidScale(format!("{:?}", scale)));
        }

        for movie in self.movies.values() {
            for genre in &movie.genres {
                if !self.genres.contains_key(genre) {
                    return Err(DataLoadError::MissingReference {
                        entity: "Genre",
                        id: *genre,
                    });
                }
            }
        }

        for rating in self.user_ratings.values().flatten() {
            check_rating(self, rating, scale)?;
        }

        for rating in &self.personality_ratings {
            if !self.personality_profiles.contains_key(&rating.user_id) {
                return Err(DataLoadError::MissingReference {
                    entity: "PersonalityProfile",
                    id: rating.user_id,
                });
            }
            check_rating(self, rating, scale)?;
        }
        Ok(())
    }
}

fn check_rating(index: &DataIndex, rating: &Rating, scale: &RatingScale) -> Result<()> {
    if !index.movies.contains_key(&rating.movie_id) {
        return Err(DataLoadError::MissingReference {
            entity: "Movie",
            id: rating.movie_id,
        });
    }
    if !scale.contains(rating.rating) {
        return Err(DataLoadError::RatingOutOfScale {
            user_id: rating.user_id,
            movie_id: rating.movie_id,
            value: rating.rating,
        });
    }
    Ok(())
}

fn parse_optional<T>(path: &Path, parse: fn(&Path) -> Result<Vec<T>>) -> Result<Vec<T>> {
    if path.exists() {
        parse(path)
    } else {
        info!("{} not found, skipping", path.display());
        Ok(Vec::new())
    }
}
