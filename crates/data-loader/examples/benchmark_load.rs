use data_loader::{DataIndex, RatingScale};
use std::env;
use std::path::PathBuf;
use std::time::Instant;

fn main() {
    let data_dir: PathBuf = env::args()
        .nth(1)
        .unwrap_or_else(|| "data/ml-latest-small".to_string())
        .into();

    println!("Loading dataset from {}...\n", data_dir.display());

    let start = Instant::now();
    let index = DataIndex::load_from_files(&data_dir, RatingScale::HALF_STARS)
        .expect("Failed to load dataset");
    let elapsed = start.elapsed();

    let counts = index.counts();

    println!("=== Load Complete ===");
    println!("Time taken: {:.2?}", elapsed);
    println!("Users: {}", counts.users);
    println!("Movies: {}", counts.movies);
    println!("Genres: {}", counts.genres);
    println!("Ratings: {}", counts.ratings);
    println!("Personality profiles: {}", counts.personality_profiles);
    println!("Personality ratings: {}", counts.personality_ratings);
    println!(
        "\nThroughput: {:.0} ratings/second",
        (counts.ratings + counts.personality_ratings) as f64 / elapsed.as_secs_f64()
    );
}
