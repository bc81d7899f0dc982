use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::{DataIndex, MovieId, MoviePredicate, MovieQuery, UserId};
use reports::{AnalyticsConfig, ReportService};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::info;

/// Movie Analytics - rating statistics, correlations and predictions
#[derive(Parser)]
#[command(name = "movie-analytics")]
#[command(about = "Analytics and recommendation reports over MovieLens ratings", long_about = None)]
struct Cli {
    /// Path to the dataset directory (movies.csv, ratings.csv, personality files)
    #[arg(short, long, env = "MOVIE_ANALYTICS_DATA_DIR", default_value = "data/ml-latest-small")]
    data_dir: PathBuf,

    /// Optional TOML file with thresholds and the rating scale
    #[arg(short, long, env = "MOVIE_ANALYTICS_CONFIG")]
    config: Option<PathBuf>,

    /// Print reports as JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Genres ranked by average rating
    GenrePopularity,

    /// Genres ranked by rating spread
    GenrePolarisation {
        /// Minimum ratings per genre
        #[arg(long)]
        min_sample_size: Option<usize>,
    },

    /// How far users rate above or below the global mean
    RatingBias {
        /// Report a single user, without the sample gate
        #[arg(long)]
        user_id: Option<UserId>,

        /// Minimum ratings per user
        #[arg(long)]
        min_sample_size: Option<usize>,
    },

    /// Correlation of users' tastes between genre pairs
    CrossGenre {
        #[arg(long)]
        min_series_size: Option<usize>,

        #[arg(long)]
        min_pairs: Option<usize>,
    },

    /// Correlation of personality traits with genre ratings
    PersonalityGenre {
        #[arg(long)]
        min_series_size: Option<usize>,

        #[arg(long)]
        min_pairs: Option<usize>,
    },

    /// Rating behaviour per personality-study cluster
    PersonalityClusters,

    /// Predict a user's rating of a movie
    Predict {
        #[arg(long)]
        user_id: UserId,

        #[arg(long)]
        movie_id: MovieId,
    },

    /// Movies similar to a movie
    Similar {
        #[arg(long)]
        movie_id: MovieId,

        /// Number of movies to return
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Rating statistics of one movie
    MovieStats {
        #[arg(long)]
        movie_id: MovieId,
    },

    /// Search movies by title, genre and release year
    Search {
        /// Case-insensitive title substring
        #[arg(long)]
        title: Option<String>,

        /// Genre name
        #[arg(long)]
        genre: Option<String>,

        /// Exact release year
        #[arg(long, conflicts_with_all = ["from_year", "to_year"])]
        year: Option<u16>,

        #[arg(long, requires = "to_year")]
        from_year: Option<u16>,

        #[arg(long, requires = "from_year")]
        to_year: Option<u16>,

        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Run concurrent predictions to measure throughput
    Benchmark {
        /// Number of predictions to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Maximum predictions in flight
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = AnalyticsConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    info!("Loading dataset from {}", cli.data_dir.display());
    let start = Instant::now();
    let data_dir = cli.data_dir.clone();
    let scale = config.rating_scale;
    let data_index = Arc::new(
        tokio::task::spawn_blocking(move || DataIndex::load_from_files(&data_dir, scale))
            .await?
            .context("Failed to load dataset")?,
    );
    let counts = data_index.counts();
    info!(
        "Loaded {} movies, {} users, {} ratings in {:.2?}",
        counts.movies,
        counts.users,
        counts.ratings,
        start.elapsed()
    );

    let service = ReportService::new(data_index.clone(), config)?;
    let thresholds = service.config();
    info!(
        "Thresholds: min sample {}, min series {}, min pairs {}, similar limit {}",
        thresholds.min_sample_size,
        thresholds.min_series_size,
        thresholds.min_pairs,
        thresholds.similar_limit
    );
    let json = cli.json;

    match cli.command {
        Commands::GenrePopularity => {
            let rows = service.genre_popularity().await?;
            emit(json, &rows, || {
                print_header("Genre popularity");
                for (rank, row) in rows.iter().enumerate() {
                    println!(
                        "{:>3}. {:<20} avg {}  {:>7} ratings  {:>5} movies",
                        (rank + 1).to_string().green(),
                        row.genre_name,
                        fmt_opt(row.avg_rating, 2),
                        row.rating_count,
                        row.movie_count
                    );
                }
            })?;
        }
        Commands::GenrePolarisation { min_sample_size } => {
            let rows = service.genre_polarisation(min_sample_size).await?;
            emit(json, &rows, || {
                print_header("Genre polarisation");
                for (rank, row) in rows.iter().enumerate() {
                    println!(
                        "{:>3}. {:<20} stddev {}  avg {}  {:>7} ratings",
                        (rank + 1).to_string().green(),
                        row.genre_name,
                        fmt_opt(row.stddev, 2).yellow(),
                        fmt_opt(row.avg_rating, 2),
                        row.total_ratings
                    );
                }
            })?;
        }
        Commands::RatingBias {
            user_id: Some(user_id),
            ..
        } => {
            let row = service
                .user_rating_bias(user_id)
                .await
                .with_context(|| format!("Failed to compute bias for user {}", user_id))?;
            emit(json, &row, || {
                print_header(&format!("Rating bias of user {}", user_id));
                println!("{}Ratings: {}", "• ".cyan(), row.rating_count);
                println!("{}User average: {}", "• ".cyan(), fmt_opt(row.user_avg, 2));
                println!("{}Global average: {}", "• ".cyan(), fmt_opt(row.global_avg, 2));
                println!("{}Bias: {}", "• ".cyan(), fmt_signed(row.bias, 2));
            })?;
        }
        Commands::RatingBias {
            user_id: None,
            min_sample_size,
        } => {
            let rows = service.rating_bias(min_sample_size).await?;
            emit(json, &rows, || {
                print_header("Rating bias");
                for row in &rows {
                    println!(
                        "user {:>6}  {:>5} ratings  avg {}  bias {}",
                        row.user_id,
                        row.rating_count,
                        fmt_opt(row.user_avg, 2),
                        fmt_signed(row.bias, 2)
                    );
                }
            })?;
        }
        Commands::CrossGenre {
            min_series_size,
            min_pairs,
        } => {
            let rows = service.cross_genre_preferences(min_series_size, min_pairs).await?;
            emit(json, &rows, || {
                print_header("Cross-genre preferences");
                for row in &rows {
                    println!(
                        "{:<20} {:<20} r {}  ({} users)",
                        row.genre_a,
                        row.genre_b,
                        fmt_signed(row.correlation, 3),
                        row.shared_users
                    );
                }
            })?;
        }
        Commands::PersonalityGenre {
            min_series_size,
            min_pairs,
        } => {
            let rows = service
                .personality_genre_correlation(min_series_size, min_pairs)
                .await?;
            emit(json, &rows, || {
                print_header("Personality and genre correlation");
                println!(
                    "{:<20} {:>7} {:>7} {:>7} {:>7} {:>7} {:>6}",
                    "genre", "open", "agree", "stable", "consc", "extra", "users"
                );
                for row in &rows {
                    println!(
                        "{:<20} {:>7} {:>7} {:>7} {:>7} {:>7} {:>6}",
                        row.genre,
                        fmt_opt(row.openness_corr, 3),
                        fmt_opt(row.agreeableness_corr, 3),
                        fmt_opt(row.emotional_stability_corr, 3),
                        fmt_opt(row.conscientiousness_corr, 3),
                        fmt_opt(row.extraversion_corr, 3),
                        row.sample_size
                    );
                }
            })?;
        }
        Commands::PersonalityClusters => {
            let rows = service.personality_clusters().await?;
            emit(json, &rows, || {
                print_header("Personality clusters");
                for row in &rows {
                    println!(
                        "{} / {}: {} users, {} ratings, avg {} (stddev {})",
                        row.assigned_metric.bold(),
                        row.assigned_condition,
                        row.user_count,
                        row.total_ratings,
                        fmt_opt(row.avg_rating, 2),
                        fmt_opt(row.stddev_rating, 2)
                    );
                    println!(
                        "   traits: open {}  agree {}  stable {}  consc {}  extra {}",
                        fmt_opt(row.avg_openness, 3),
                        fmt_opt(row.avg_agreeableness, 3),
                        fmt_opt(row.avg_emotional_stability, 3),
                        fmt_opt(row.avg_conscientiousness, 3),
                        fmt_opt(row.avg_extraversion, 3)
                    );
                }
            })?;
        }
        Commands::Predict { user_id, movie_id } => {
            let report = service
                .predict_rating(user_id, movie_id)
                .await
                .with_context(|| format!("Failed to predict movie {} for user {}", movie_id, user_id))?;
            emit(json, &report, || {
                print_header(&format!("Prediction for user {} / movie {}", user_id, movie_id));
                match report.predicted_rating {
                    Some(rating) => println!("{}Predicted rating: {:.2}", "• ".green(), rating),
                    None => println!(
                        "{}No prediction: the user rated nothing sharing a genre",
                        "• ".yellow()
                    ),
                }
                println!("{}Based on {} movies", "• ".cyan(), report.based_on_movies);
                println!("{}Total genre overlap: {}", "• ".cyan(), report.total_genre_overlap);
            })?;
        }
        Commands::Similar { movie_id, limit } => {
            let rows = service
                .similar_films(movie_id, limit)
                .await
                .with_context(|| format!("Failed to find movies similar to {}", movie_id))?;
            emit(json, &rows, || {
                print_header(&format!("Movies similar to {}", movie_id));
                for (rank, row) in rows.iter().enumerate() {
                    println!(
                        "{:>3}. {} ({}) - genres {:.2}, rating {:.3}, avg {}",
                        (rank + 1).to_string().green(),
                        row.title,
                        fmt_year(row.release_year),
                        row.genre_similarity,
                        row.rating_similarity,
                        fmt_opt(row.avg_rating, 2)
                    );
                }
            })?;
        }
        Commands::MovieStats { movie_id } => {
            let report = service
                .movie_rating_stats(movie_id)
                .await
                .with_context(|| format!("Failed to compute stats for movie {}", movie_id))?;
            emit(json, &report, || {
                print_header(&format!("Rating statistics of movie {}", movie_id));
                println!("{}Ratings: {}", "• ".cyan(), report.total_ratings);
                println!("{}Average: {}", "• ".cyan(), fmt_opt(report.avg_rating, 2));
                println!("{}Median: {}", "• ".cyan(), fmt_opt(report.median, 2));
                println!("{}Stddev: {}", "• ".cyan(), fmt_opt(report.stddev, 2));
                println!(
                    "{}Range: {} - {}",
                    "• ".cyan(),
                    fmt_opt(report.min_rating, 1),
                    fmt_opt(report.max_rating, 1)
                );
            })?;
        }
        Commands::Search {
            title,
            genre,
            year,
            from_year,
            to_year,
            limit,
        } => {
            let mut query = MovieQuery::new().limit(limit);
            if let Some(title) = title {
                query = query.with(MoviePredicate::TitleContains(title));
            }
            if let Some(genre) = genre {
                query = query.with(MoviePredicate::Genre(genre));
            }
            if let Some(year) = year {
                query = query.with(MoviePredicate::Year(year));
            }
            if let (Some(from), Some(to)) = (from_year, to_year) {
                query = query.with(MoviePredicate::YearRange { from, to });
            }

            let rows = service.search_movies(query).await?;
            emit(json, &rows, || {
                print_header("Search results");
                for row in &rows {
                    println!(
                        "{:>7}: {} ({}) [{}]",
                        row.movie_id,
                        row.title,
                        fmt_year(row.release_year),
                        row.genres.join(", ")
                    );
                }
            })?;
        }
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(&service, &data_index, requests, concurrent).await?,
    }

    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    service: &ReportService,
    data_index: &DataIndex,
    requests: usize,
    concurrent: usize,
) -> Result<()> {
    let user_ids = data_index.get_all_user_ids();
    let movie_ids = data_index.get_all_movie_ids();
    if user_ids.is_empty() || movie_ids.is_empty() || requests == 0 {
        println!("{}", "Nothing to benchmark".yellow());
        return Ok(());
    }

    // Random (user, movie) pairs drawn from the loaded dataset
    let pairs: Vec<(UserId, MovieId)> = (0..requests)
        .map(|_| {
            (
                user_ids[rand::random_range(0..user_ids.len())],
                movie_ids[rand::random_range(0..movie_ids.len())],
            )
        })
        .collect();

    let limiter = Arc::new(Semaphore::new(concurrent.max(1)));
    let wall_clock = Instant::now();
    let mut handles = Vec::with_capacity(requests);
    for (user_id, movie_id) in pairs {
        let service = service.clone();
        let limiter = limiter.clone();
        handles.push(tokio::spawn(async move {
            let _permit = limiter.acquire_owned().await?;
            let start = Instant::now();
            service.predict_rating(user_id, movie_id).await?;
            Ok::<_, anyhow::Error>(start.elapsed())
        }));
    }

    let mut timings: Vec<Duration> = Vec::with_capacity(requests);
    for handle in handles {
        timings.push(handle.await??);
    }
    let total_time = wall_clock.elapsed();

    timings.sort();
    let latency_sum: Duration = timings.iter().sum();
    let avg_latency = latency_sum / timings.len() as u32;
    let percentile = |p: f64| timings[((timings.len() as f64 * p) as usize).min(timings.len() - 1)];
    let throughput = requests as f64 / total_time.as_secs_f64();

    print_header("Benchmark results");
    println!("Requests: {} ({} concurrent)", requests, concurrent.max(1));
    println!("Total time: {:.2?}", total_time);
    println!("Average latency: {:.2?}", avg_latency);
    println!("P50 latency: {:.2?}", percentile(0.50));
    println!("P95 latency: {:.2?}", percentile(0.95));
    println!("P99 latency: {:.2?}", percentile(0.99));
    println!("Throughput: {:.2} predictions/second", throughput);

    Ok(())
}

/// Print `value` as JSON, or run the table printer
fn emit<T: Serialize>(json: bool, value: &T, table: impl FnOnce()) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        table();
    }
    Ok(())
}

fn print_header(title: &str) {
    println!("{}", title.bold().blue());
}

fn fmt_opt(value: Option<f64>, places: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", places, v),
        None => "-".dimmed().to_string(),
    }
}

fn fmt_signed(value: Option<f64>, places: usize) -> String {
    match value {
        Some(v) if v > 0.0 => format!("{:+.*}", places, v).green().to_string(),
        Some(v) if v < 0.0 => format!("{:+.*}", places, v).red().to_string(),
        Some(v) => format!("{:.*}", places, v),
        None => "-".dimmed().to_string(),
    }
}

fn fmt_year(year: Option<u16>) -> String {
    year.map(|y| y.to_string()).unwrap_or_else(|| "????".to_string())
}
