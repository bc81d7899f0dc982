//! Numeric building blocks shared by the engines.
//!
//! Every function returns `None` when the statistic is undefined for its
//! input instead of a made-up number.

/// Round half away from zero to `places` decimals.
///
/// The scaled value is first snapped to 6 decimals so binary noise such as
/// `80.49999999999999` rounds the way the decimal value `80.5` would.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    let scaled = ((value * factor) * 1e6).round() / 1e6;
    scaled.round() / factor
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation. A single value has a deviation of 0.
pub fn population_stddev(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Median with linear interpolation between the two middle values
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// Pearson correlation coefficient of paired observations.
///
/// `None` when fewer than two pairs exist or either side has no variance.
/// The result is clamped to [-1, 1].
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if is_negligible(sxx, mean_x, n) || is_negligible(syy, mean_y, n) {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

// Sum of squared deviations indistinguishable from rounding noise
fn is_negligible(sum_sq: f64, mean: f64, n: f64) -> bool {
    sum_sq <= 1e-12 * n * mean.abs().max(1.0).powi(2)
}

/// Count, mean, deviation and (on request) median of one group of values.
/// Means and deviations are rounded to 2 decimals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: Option<f64>,
    pub stddev: Option<f64>,
    pub median: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Summary {
    pub fn of(values: &[f64], with_median: bool) -> Self {
        Self {
            count: values.len(),
            mean: mean(values).map(|m| round_to(m, 2)),
            stddev: population_stddev(values).map(|s| round_to(s, 2)),
            median: if with_median {
                median(values).map(|m| round_to(m, 2))
            } else {
                None
            },
            min: values.iter().copied().min_by(f64::total_cmp),
            max: values.iter().copied().max_by(f64::total_cmp),
        }
    }
}
