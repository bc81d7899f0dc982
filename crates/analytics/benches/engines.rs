//! Benchmarks for the analytics engines
//!
//! Run with: cargo bench --package analytics
//!
//! Uses a synthetic catalogue shaped like MovieLens latest-small
//! (~600 users, ~2000 movies, ~60k ratings) so no data files are needed.

use analytics::{
    aggregate_by_genre, cross_genre_preferences, predict_rating, similar_movies, AggregateOptions,
    GroupOrder,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use data_loader::{DataIndex, Genre, Movie, Rating, RatingPopulation};
use std::sync::Arc;

const USERS: u32 = 600;
const MOVIES: u32 = 2000;
const GENRES: u32 = 18;
const RATINGS_PER_USER: u32 = 100;

fn build_synthetic_index() -> Arc<DataIndex> {
    let mut index = DataIndex::new();
    for id in 1..=GENRES {
        index.insert_genre(Genre {
            id,
            name: format!("Genre {:02}", id),
        });
    }
    for id in 1..=MOVIES {
        let first = id % GENRES + 1;
        let second = (id * 7) % GENRES + 1;
        let mut genres = vec![first];
        if second != first {
            genres.push(second);
        }
        index.insert_movie(Movie {
            id,
            title: format!("Movie {}", id),
            year: Some(1950 + (id % 70) as u16),
            poster_path: None,
            genres,
        });
    }
    for user_id in 1..=USERS {
        for n in 0..RATINGS_PER_USER {
            let movie_id = (user_id * 31 + n * 17) % MOVIES + 1;
            let steps = (user_id + movie_id * 3) % 10 + 1;
            index.insert_rating(Rating {
                user_id,
                movie_id,
                rating: steps as f32 * 0.5,
                timestamp: None,
            });
        }
    }
    Arc::new(index)
}

fn bench_predict_rating(c: &mut Criterion) {
    let index = build_synthetic_index();

    c.bench_function("predict_rating", |b| {
        b.iter(|| {
            let prediction = predict_rating(index.as_ref(), black_box(1), black_box(42)).unwrap();
            black_box(prediction)
        })
    });
}

fn bench_similar_movies(c: &mut Criterion) {
    let index = build_synthetic_index();

    c.bench_function("similar_movies", |b| {
        b.iter(|| {
            let similar = similar_movies(index.as_ref(), black_box(42), black_box(10)).unwrap();
            black_box(similar)
        })
    });
}

fn bench_genre_aggregation(c: &mut Criterion) {
    let index = build_synthetic_index();
    let options = AggregateOptions::new(GroupOrder::StddevDesc).with_min_sample_size(10);

    c.bench_function("aggregate_by_genre", |b| {
        b.iter(|| {
            let groups =
                aggregate_by_genre(index.as_ref(), RatingPopulation::General, black_box(options))
                    .unwrap();
            black_box(groups)
        })
    });
}

fn bench_cross_genre(c: &mut Criterion) {
    let index = build_synthetic_index();

    c.bench_function("cross_genre_preferences", |b| {
        b.iter(|| {
            let rows = cross_genre_preferences(index.as_ref(), black_box(5), black_box(20)).unwrap();
            black_box(rows)
        })
    });
}

criterion_group!(
    benches,
    bench_predict_rating,
    bench_similar_movies,
    bench_genre_aggregation,
    bench_cross_genre
);
criterion_main!(benches);
