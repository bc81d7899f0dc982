//! Integration tests from CSV files to serialized reports.

use data_loader::{DataIndex, MoviePredicate, MovieQuery, RatingScale};
use reports::{AnalyticsConfig, ReportService};
use serde_json::json;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const MOVIES: &str = "movieId,title,genres
1,Toy Story (1995),Adventure|Animation|Children|Comedy|Fantasy
2,Jumanji (1995),Adventure|Children|Fantasy
3,Grumpier Old Men (1995),Comedy|Romance
4,\"American President, The (1995)\",Comedy|Drama|Romance
5,Heat (1995),Action|Crime|Thriller
6,Unreleased Project,(no genres listed)
";

const PERSONALITY_PROFILES: &str = "userid, openness, agreeableness, emotional_stability, conscientiousness, extraversion, assigned metric, assigned condition
900, 5.0, 2.0, 3.0, 2.5, 6.5, serendipity, high
901, 4.0, 3.0, 4.0, 5.5, 2.0, serendipity, high
902, 2.5, 4.5, 6.0, 4.0, 3.5, diversity, low
";

const PERSONALITY_RATINGS: &str = "userid, movie_id, rating, tstamp
900, 1, 4.5, 2001-01-01 00:00:00
901, 1, 3.0, 2001-01-01 00:00:00
902, 5, 2.0, 2001-01-01 00:00:00
903, 5, 4.0, 2001-01-01 00:00:00
";

fn ratings_csv() -> String {
    let mut csv = String::from("userId,movieId,rating,timestamp\n");
    // Users 1 and 2 rate the first four movies with opposite tastes
    for movie_id in 1..=4 {
        let user_1 = if movie_id == 2 { 3.0 } else { 4.5 };
        let user_2 = if movie_id == 2 { 4.0 } else { 2.0 };
        csv.push_str(&format!("1,{},{},964982703\n", movie_id, user_1));
        csv.push_str(&format!("2,{},{},964982703\n", movie_id, user_2));
    }
    for user_id in 3..=12 {
        csv.push_str(&format!("{},1,4.0,964982703\n", user_id));
        csv.push_str(&format!("{},5,3.5,964982703\n", user_id));
    }
    csv
}

fn write_dataset(dir: &Path, with_personality: bool) {
    fs::write(dir.join("movies.csv"), MOVIES).unwrap();
    fs::write(dir.join("ratings.csv"), ratings_csv()).unwrap();
    if with_personality {
        fs::write(dir.join("personality-data.csv"), PERSONALITY_PROFILES).unwrap();
        fs::write(dir.join("personality-ratings.csv"), PERSONALITY_RATINGS).unwrap();
    }
}

fn build_service(with_personality: bool) -> (TempDir, ReportService) {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path(), with_personality);
    let index = DataIndex::load_from_files(dir.path(), RatingScale::HALF_STARS).unwrap();
    let service = ReportService::new(Arc::new(index), AnalyticsConfig::default()).unwrap();
    (dir, service)
}

#[tokio::test]
async fn test_movie_stats_from_csv() {
    let (_dir, service) = build_service(true);

    let stats = service.movie_rating_stats(1).await.unwrap();
    assert_eq!(
        serde_json::to_value(&stats).unwrap(),
        json!({
            "movieId": 1,
            "totalRatings": 12,
            "avgRating": 3.88,
            "minRating": 2.0,
            "maxRating": 4.5,
            "stddev": 0.58,
            "median": 4.0
        })
    );

    let unrated = service.movie_rating_stats(6).await.unwrap();
    assert_eq!(unrated.total_ratings, 0);
    assert_eq!(unrated.avg_rating, None);
}

#[tokio::test]
async fn test_similar_films_from_csv() {
    let (_dir, service) = build_service(true);

    let similar = service.similar_films(2, Some(2)).await.unwrap();
    assert_eq!(similar.len(), 1);
    // Toy Story shares all three of Jumanji's genres
    assert_eq!(similar[0].movie_id, 1);
    assert_eq!(similar[0].genre_similarity, 1.0);
    assert_eq!(similar[0].title, "Toy Story");
    assert_eq!(similar[0].release_year, Some(1995));

    // Untitled movie has no genres, so nothing is similar to it
    assert!(service.similar_films(6, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_prediction_from_csv() {
    let (_dir, service) = build_service(true);

    // User 2 gave 2.0 to Toy Story (shares Comedy) and to The American
    // President (shares both genres); Jumanji shares nothing
    let prediction = service.predict_rating(2, 3).await.unwrap();
    let value = serde_json::to_value(&prediction).unwrap();
    assert_eq!(value["basedOnMovies"], json!(2));
    assert_eq!(value["predictedRating"], json!(2.0));
    assert_eq!(value["totalGenreOverlap"], json!(3));
}

#[tokio::test]
async fn test_personality_reports_from_csv() {
    let (_dir, service) = build_service(true);

    let clusters = service.personality_clusters().await.unwrap();
    assert_eq!(clusters.len(), 2);
    assert_eq!(clusters[0].assigned_metric, "diversity");
    assert_eq!(clusters[0].total_ratings, 1);
    assert_eq!(clusters[1].user_count, 2);
    assert_eq!(clusters[1].avg_rating, Some(3.75));
    assert_eq!(clusters[1].avg_openness, Some(4.5));

    // Too few users for any correlation with the default minimums
    assert!(
        service
            .personality_genre_correlation(None, None)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_personality_files_are_optional() {
    let (_dir, service) = build_service(false);
    assert!(service.personality_clusters().await.unwrap().is_empty());
    assert_eq!(service.genre_popularity().await.unwrap().len(), 10);
}

#[tokio::test]
async fn test_search_from_csv() {
    let (_dir, service) = build_service(true);

    let query = MovieQuery::new()
        .with(MoviePredicate::Genre("Romance".to_string()))
        .with(MoviePredicate::TitleContains("president".to_string()));
    let rows = service.search_movies(query).await.unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "American President, The");
    assert_eq!(
        rows[0].genres,
        vec!["Comedy".to_string(), "Drama".to_string(), "Romance".to_string()]
    );
}
