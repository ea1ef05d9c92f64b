//! Leaderboard ordering and the convergence confidence metric

use crate::entry::Entry;
use crate::rating::RatingConfig;
use std::cmp::Ordering;

/// Sort entries by `mu` descending, ties broken by id ascending
pub fn sort_by_rank(entries: &mut [Entry]) {
    entries.sort_by(|a, b| {
        b.rating
            .mu
            .partial_cmp(&a.rating.mu)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// How far the average sigma of `entries` has converged, in `[0, 100]`
///
/// `clamp((σ₀ − avg σ) / (σ₀ − σ_converged), 0, 1) × 100`. Only active
/// entries count; an empty scope reports 0.
///
/// # Examples
///
/// ```
/// use hackduel_domain::{convergence_confidence, RatingConfig};
///
/// let config = RatingConfig::default();
/// assert_eq!(convergence_confidence(&[], &config), 0.0);
/// ```
pub fn convergence_confidence(entries: &[Entry], config: &RatingConfig) -> f64 {
    let (sum, count) = entries
        .iter()
        .filter(|e| e.is_active())
        .fold((0.0, 0usize), |(sum, count), e| (sum + e.rating.sigma, count + 1));

    if count == 0 {
        return 0.0;
    }

    let span = config.sigma - config.converged_sigma;
    if span <= 0.0 {
        return 0.0;
    }

    let avg_sigma = sum / count as f64;
    ((config.sigma - avg_sigma) / span).clamp(0.0, 1.0) * 100.0
}
