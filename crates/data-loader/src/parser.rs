//! Parser for the MovieLens and Personality ISF CSV files.
//!
//! - movies.csv: movieId,title,genres
//! - ratings.csv: userId,movieId,rating,timestamp
//! - personality-data.csv: userid,openness,...,assigned metric,assigned condition
//! - personality-ratings.csv: userid,movie_id,rating,tstamp
//!
//! Records are read with the `csv` crate and deserialized through serde.
//! Headers and fields are trimmed because the personality files pad their
//! header names with spaces.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// MovieLens marker for a movie without genres
const NO_GENRES: &str = "(no genres listed)";

/// A movie as it appears in movies.csv, before genre names get ids
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMovie {
    pub id: MovieId,
    pub title: String,
    pub year: Option<u16>,
    pub genre_names: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MovieRecord {
    #[serde(rename = "movieId")]
    movie_id: MovieId,
    title: String,
    genres: String,
}

#[derive(Debug, Deserialize)]
struct RatingRecord {
    #[serde(rename = "userId")]
    user_id: UserId,
    #[serde(rename = "movieId")]
    movie_id: MovieId,
    rating: f32,
    timestamp: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ProfileRecord {
    #[serde(rename = "userid", alias = "userId")]
    user_id: UserId,
    openness: Option<f64>,
    agreeableness: Option<f64>,
    emotional_stability: Option<f64>,
    conscientiousness: Option<f64>,
    extraversion: Option<f64>,
    #[serde(rename = "assigned metric", alias = "assigned_metric", default)]
    assigned_metric: Option<String>,
    #[serde(rename = "assigned condition", alias = "assigned_condition", default)]
    assigned_condition: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PersonalityRatingRecord {
    #[serde(rename = "userid", alias = "userId")]
    user_id: UserId,
    #[serde(rename = "movie_id", alias = "movieId")]
    movie_id: MovieId,
    rating: f32,
    #[serde(rename = "tstamp", alias = "timestamp", default)]
    timestamp: Option<String>,
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|_| DataLoadError::FileNotFound {
        path: path.display().to_string(),
    })
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Deserialize every record of a CSV stream with a header row
fn read_records<T: DeserializeOwned, R: Read>(reader: R, file: &str) -> Result<Vec<T>> {
    let mut csv_reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    csv_reader
        .deserialize()
        .map(|record| {
            record.map_err(|source| DataLoadError::Csv {
                file: file.to_string(),
                source,
            })
        })
        .collect()
}

/// Parse the movies.csv file
pub fn parse_movies(path: &Path) -> Result<Vec<ParsedMovie>> {
    parse_movies_from_reader(open(path)?, &file_label(path))
}

pub fn parse_movies_from_reader<R: Read>(reader: R, file: &str) -> Result<Vec<ParsedMovie>> {
    let records: Vec<MovieRecord> = read_records(reader, file)?;

    Ok(records
        .into_iter()
        .map(|record| {
            let (title, year) = split_title_year(&record.title);
            ParsedMovie {
                id: record.movie_id,
                title,
                year,
                genre_names: parse_genre_names(&record.genres),
            }
        })
        .collect())
}

/// Parse the ratings.csv file
pub fn parse_ratings(path: &Path) -> Result<Vec<Rating>> {
    parse_ratings_from_reader(open(path)?, &file_label(path))
}

pub fn parse_ratings_from_reader<R: Read>(reader: R, file: &str) -> Result<Vec<Rating>> {
    let records: Vec<RatingRecord> = read_records(reader, file)?;

    Ok(records
        .into_iter()
        .map(|record| Rating {
            user_id: record.user_id,
            movie_id: record.movie_id,
            rating: record.rating,
            timestamp: record.timestamp,
        })
        .collect())
}

/// Parse the personality-data.csv file
pub fn parse_personality_profiles(path: &Path) -> Result<Vec<PersonalityProfile>> {
    parse_personality_profiles_from_reader(open(path)?, &file_label(path))
}

pub fn parse_personality_profiles_from_reader<R: Read>(
    reader: R,
    file: &str,
) -> Result<Vec<PersonalityProfile>> {
    let records: Vec<ProfileRecord> = read_records(reader, file)?;

    Ok(records
        .into_iter()
        .map(|record| PersonalityProfile {
            user_id: record.user_id,
            openness: record.openness,
            agreeableness: record.agreeableness,
            emotional_stability: record.emotional_stability,
            conscientiousness: record.conscientiousness,
            extraversion: record.extraversion,
            assigned_metric: record.assigned_metric.unwrap_or_default(),
            assigned_condition: record.assigned_condition.unwrap_or_default(),
        })
        .collect())
}

/// Parse the personality-ratings.csv file
pub fn parse_personality_ratings(path: &Path) -> Result<Vec<Rating>> {
    parse_personality_ratings_from_reader(open(path)?, &file_label(path))
}

pub fn parse_personality_ratings_from_reader<R: Read>(
    reader: R,
    file: &str,
) -> Result<Vec<Rating>> {
    let records: Vec<PersonalityRatingRecord> = read_records(reader, file)?;

    Ok(records
        .into_iter()
        .map(|record| Rating {
            user_id: record.user_id,
            movie_id: record.movie_id,
            rating: record.rating,
            timestamp: record.timestamp.as_deref().and_then(parse_epoch_seconds),
        })
        .collect())
}

/// Split a trailing "(YYYY)" off a MovieLens title
///
/// Example: "Toy Story (1995)" -> ("Toy Story", Some(1995))
///          "Movie Title" -> ("Movie Title", None)
fn split_title_year(raw: &str) -> (String, Option<u16>) {
    let raw = raw.trim();
    if let Some(rest) = raw.strip_suffix(')') {
        if let Some(start) = rest.rfind('(') {
            let year_str = rest[start + 1..].trim();
            if year_str.len() == 4 && year_str.chars().all(|c| c.is_ascii_digit()) {
                if let Ok(year) = year_str.parse::<u16>() {
                    return (rest[..start].trim().to_string(), Some(year));
                }
            }
        }
    }
    (raw.to_string(), None)
}

/// Parse pipe-separated genre names
///
/// Example: "Action|Adventure|Sci-Fi" -> ["Action", "Adventure", "Sci-Fi"]
fn parse_genre_names(s: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in s.split('|').map(str::trim) {
        if name.is_empty() || name == NO_GENRES {
            continue;
        }
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Seconds since the epoch, tolerating a fractional part
fn parse_epoch_seconds(s: &str) -> Option<i64> {
    let value: f64 = s.trim().parse().ok()?;
    value.is_finite().then(|| value.trunc() as i64)
}
