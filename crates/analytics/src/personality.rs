//! Personality reports over the personality-study population.
//!
//! Both reports read only the personality profiles and the personality
//! rating population; the general MovieLens ratings never enter them.

use crate::correlation::{check_min_pairs, user_genre_averages};
use crate::error::Result;
use crate::stats::{pearson, round_to, Summary};
use data_loader::{FactStore, PersonalityProfile, PersonalityTrait, RatingPopulation, UserId};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, instrument};

/// One optional value per personality trait
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TraitValues {
    pub openness: Option<f64>,
    pub agreeableness: Option<f64>,
    pub emotional_stability: Option<f64>,
    pub conscientiousness: Option<f64>,
    pub extraversion: Option<f64>,
}

impl TraitValues {
    pub fn from_fn(mut f: impl FnMut(PersonalityTrait) -> Option<f64>) -> Self {
        Self {
            openness: f(PersonalityTrait::Openness),
            agreeableness: f(PersonalityTrait::Agreeableness),
            emotional_stability: f(PersonalityTrait::EmotionalStability),
            conscientiousness: f(PersonalityTrait::Conscientiousness),
            extraversion: f(PersonalityTrait::Extraversion),
        }
    }

    pub fn get(&self, personality_trait: PersonalityTrait) -> Option<f64> {
        match personality_trait {
            PersonalityTrait::Openness => self.openness,
            PersonalityTrait::Agreeableness => self.agreeableness,
            PersonalityTrait::EmotionalStability => self.emotional_stability,
            PersonalityTrait::Conscientiousness => self.conscientiousness,
            PersonalityTrait::Extraversion => self.extraversion,
        }
    }
}

/// How each trait correlates with users' mean rating of one genre
#[derive(Debug, Clone, PartialEq)]
pub struct PersonalityGenreCorrelation {
    pub genre: String,
    /// Pearson coefficients rounded to 3 decimals
    pub correlations: TraitValues,
    /// Users with both a genre average and a profile
    pub sample_size: usize,
}

/// Rating behaviour and mean traits of one (metric, condition) cluster
#[derive(Debug, Clone, PartialEq)]
pub struct PersonalityCluster {
    pub assigned_metric: String,
    pub assigned_condition: String,
    pub user_count: usize,
    pub total_ratings: usize,
    pub avg_rating: Option<f64>,
    pub stddev_rating: Option<f64>,
    /// Trait means over the cluster's profiles, rounded to 3 decimals
    pub trait_means: TraitValues,
}

/// Correlate every trait with each genre's per-user average rating.
///
/// A genre is reported when at least `min_pairs` users have both an
/// average in it (built from `min_series_size` ratings or more) and a
/// profile. Each trait is then correlated over those users whose score for
/// it is known, so a sparse trait can be undefined while the others are
/// not. Rows are ordered by genre name.
///
/// `min_pairs` below 2 is rejected with `InvalidInput`.
#[instrument(skip(store))]
pub fn personality_genre_correlation(
    store: &dyn FactStore,
    min_series_size: usize,
    min_pairs: usize,
) -> Result<Vec<PersonalityGenreCorrelation>> {
    check_min_pairs(min_pairs)?;

    let series = user_genre_averages(store, RatingPopulation::Personality, min_series_size)?;
    let profiles: HashMap<UserId, PersonalityProfile> = store
        .personality_profiles()?
        .into_iter()
        .map(|p| (p.user_id, p))
        .collect();

    let keyed: Vec<(&String, &BTreeMap<UserId, f64>)> = series.iter().collect();
    let rows: Vec<PersonalityGenreCorrelation> = keyed
        .par_iter()
        .filter_map(|(genre, averages)| {
            let joined: Vec<(&PersonalityProfile, f64)> = averages
                .iter()
                .filter_map(|(user, avg)| profiles.get(user).map(|p| (p, *avg)))
                .collect();
            if joined.len() < min_pairs {
                return None;
            }

            let correlations = TraitValues::from_fn(|personality_trait| {
                let pairs: Vec<(f64, f64)> = joined
                    .iter()
                    .filter_map(|(profile, avg)| {
                        profile.trait_score(personality_trait).map(|score| (score, *avg))
                    })
                    .collect();
                pearson(&pairs).map(|r| round_to(r, 3))
            });

            Some(PersonalityGenreCorrelation {
                genre: (*genre).clone(),
                correlations,
                sample_size: joined.len(),
            })
        })
        .collect();

    debug!("{} of {} genres met the pair minimum", rows.len(), series.len());
    Ok(rows)
}

/// Summarise each (assigned metric, assigned condition) cluster.
///
/// Trait means run over the cluster's profile ↔ rating rows: a profile
/// counts once per personality rating its user made, and once if the user
/// made none.
#[instrument(skip(store))]
pub fn personality_clusters(store: &dyn FactStore) -> Result<Vec<PersonalityCluster>> {
    let profiles = store.personality_profiles()?;
    let ratings = store.ratings(RatingPopulation::Personality)?;

    let mut clusters: BTreeMap<(String, String), Vec<&PersonalityProfile>> = BTreeMap::new();
    let mut user_cluster: HashMap<UserId, (String, String)> = HashMap::new();
    for profile in &profiles {
        let key = (
            profile.assigned_metric.clone(),
            profile.assigned_condition.clone(),
        );
        user_cluster.insert(profile.user_id, key.clone());
        clusters.entry(key).or_default().push(profile);
    }

    let mut cluster_ratings: HashMap<&(String, String), Vec<f64>> = HashMap::new();
    let mut ratings_per_user: HashMap<UserId, usize> = HashMap::new();
    for rating in &ratings {
        if let Some(key) = user_cluster.get(&rating.user_id) {
            cluster_ratings
                .entry(key)
                .or_default()
                .push(f64::from(rating.rating));
            *ratings_per_user.entry(rating.user_id).or_default() += 1;
        }
    }

    let result: Vec<PersonalityCluster> = clusters
        .iter()
        .map(|(key, members)| {
            let values = cluster_ratings
                .get(key)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let summary = Summary::of(values, false);
            let trait_means = TraitValues::from_fn(|personality_trait| {
                weighted_trait_mean(members, &ratings_per_user, personality_trait)
            });

            PersonalityCluster {
                assigned_metric: key.0.clone(),
                assigned_condition: key.1.clone(),
                user_count: members.len(),
                total_ratings: summary.count,
                avg_rating: summary.mean,
                stddev_rating: summary.stddev,
                trait_means,
            }
        })
        .collect();

    debug!(
        "Summarised {} clusters from {} profiles",
        result.len(),
        profiles.len()
    );
    Ok(result)
}

// Each profile weighs max(1, ratings of its user)
fn weighted_trait_mean(
    members: &[&PersonalityProfile],
    ratings_per_user: &HashMap<UserId, usize>,
    personality_trait: PersonalityTrait,
) -> Option<f64> {
    let (sum, weight) = members
        .iter()
        .filter_map(|p| {
            let score = p.trait_score(personality_trait)?;
            let rows = ratings_per_user.get(&p.user_id).copied().unwrap_or(0).max(1);
            Some((score, rows))
        })
        .fold((0.0, 0usize), |(sum, weight), (score, rows)| {
            (sum + score * rows as f64, weight + rows)
        });
    if weight == 0 {
        return None;
    }
    Some(round_to(sum / weight as f64, 3))
}
