//! Pair scoring for active-learning matchmaking
//!
//! The value of comparing two entries is approximated by their match quality
//! (how likely the outcome is to be informative rather than a foregone
//! conclusion) times their combined variance (how much uncertainty there is
//! to remove).

use crate::entry::{Entry, EntryId};
use crate::rating::{match_quality, Rating, RatingConfig};

/// Unordered pair of entry ids, stored smallest first
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairKey(EntryId, EntryId);

impl PairKey {
    /// Canonical key for the pair `{a, b}`
    pub fn new(a: &EntryId, b: &EntryId) -> Self {
        if a <= b {
            Self(a.clone(), b.clone())
        } else {
            Self(b.clone(), a.clone())
        }
    }

    /// The two ids, smallest first
    pub fn ids(&self) -> (&EntryId, &EntryId) {
        (&self.0, &self.1)
    }
}

/// Expected information of comparing `a` with `b`
pub fn pair_score(a: Rating, b: Rating, config: &RatingConfig) -> f64 {
    let combined_variance = a.sigma * a.sigma + b.sigma * b.sigma;
    match_quality(a, b, config) * combined_variance
}

fn scored_pairs<F>(candidates: &[Entry], config: &RatingConfig, is_excluded: F) -> Vec<(f64, PairKey, usize, usize)>
where
    F: Fn(&PairKey) -> bool,
{
    let mut scored = Vec::new();

    for i in 0..candidates.len() {
        for j in (i + 1)..candidates.len() {
            let (a, b) = (&candidates[i], &candidates[j]);
            if a.id == b.id {
                continue;
            }
            let key = PairKey::new(&a.id, &b.id);
            if is_excluded(&key) {
                continue;
            }
            scored.push((pair_score(a.rating, b.rating, config), key, i, j));
        }
    }

    scored
}

/// Pick the highest scoring pair among `candidates`
///
/// Pairs for which `is_excluded` returns true are skipped. Ties are broken by
/// the smaller [`PairKey`] so the choice is deterministic for a given
/// candidate list. Returns indices into `candidates`, or `None` when no
/// admissible pair exists.
pub fn best_pair<F>(candidates: &[Entry], config: &RatingConfig, is_excluded: F) -> Option<(usize, usize)>
where
    F: Fn(&PairKey) -> bool,
{
    let mut best: Option<(f64, PairKey, usize, usize)> = None;

    for (score, key, i, j) in scored_pairs(candidates, config, is_excluded) {
        let better = match &best {
            None => true,
            Some((best_score, best_key, _, _)) => score > *best_score || (score == *best_score && key < *best_key),
        };
        if better {
            best = Some((score, key, i, j));
        }
    }

    best.map(|(_, _, i, j)| (i, j))
}

/// Every admissible pair scoring within `tolerance` (relative) of the best
///
/// Returned in scan order. Empty when no admissible pair exists.
pub fn near_best_pairs<F>(
    candidates: &[Entry],
    config: &RatingConfig,
    is_excluded: F,
    tolerance: f64,
) -> Vec<(usize, usize)>
where
    F: Fn(&PairKey) -> bool,
{
    let scored = scored_pairs(candidates, config, is_excluded);
    let Some(best) = scored.iter().map(|(score, ..)| *score).reduce(f64::max) else {
        return Vec::new();
    };
    let threshold = best - tolerance.max(0.0) * best.abs();

    scored
        .into_iter()
        .filter(|(score, ..)| *score >= threshold)
        .map(|(_, _, i, j)| (i, j))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryMetadata;

    fn entry(id: &str, mu: f64, sigma: f64) -> Entry {
        let mut e = Entry::new(EntryId::new(id), "test", EntryMetadata::default(), &RatingConfig::default());
        e.rating = Rating::new(mu, sigma);
        e
    }

    #[test]
    fn test_pair_key_is_unordered() {
        let a = EntryId::new("a");
        let b = EntryId::new("b");
        assert_eq!(PairKey::new(&a, &b), PairKey::new(&b, &a));
        assert_eq!(PairKey::new(&b, &a).ids(), (&a, &b));
    }

    #[test]
    fn test_closer_means_score_higher() {
        let config = RatingConfig::default();
        let base = Rating::new(25.0, 3.0);
        assert!(pair_score(base, Rating::new(26.0, 3.0), &config) > pair_score(base, Rating::new(40.0, 3.0), &config));
    }

    #[test]
    fn test_uncertainty_scores_higher() {
        let config = RatingConfig::default();
        let base = Rating::new(25.0, 3.0);
        assert!(pair_score(base, Rating::new(25.0, 8.0), &config) > pair_score(base, Rating::new(25.0, 2.0), &config));
    }

    #[test]
    fn test_best_pair_picks_closest() {
        let config = RatingConfig::default();
        let candidates = vec![entry("a", 10.0, 2.0), entry("b", 40.0, 2.0), entry("c", 11.0, 2.0)];

        let (i, j) = best_pair(&candidates, &config, |_| false).unwrap();
        let mut ids = [candidates[i].id.as_str(), candidates[j].id.as_str()];
        ids.sort();
        assert_eq!(ids, ["a", "c"]);
    }

    #[test]
    fn test_best_pair_honours_exclusions() {
        let config = RatingConfig::default();
        let candidates = vec![entry("a", 10.0, 2.0), entry("b", 40.0, 2.0), entry("c", 11.0, 2.0)];
        let excluded = PairKey::new(&EntryId::new("a"), &EntryId::new("c"));

        let (i, j) = best_pair(&candidates, &config, |k| *k == excluded).unwrap();
        assert!(candidates[i].id.as_str() == "b" || candidates[j].id.as_str() == "b");

        assert!(best_pair(&candidates, &config, |_| true).is_none());
        assert!(best_pair(&candidates[..1], &config, |_| false).is_none());
    }

    #[test]
    fn test_near_best_pairs_collects_ties() {
        let config = RatingConfig::default();
        let candidates = vec![entry("a", 25.0, 4.0), entry("b", 25.0, 4.0), entry("c", 25.0, 4.0), entry("d", 60.0, 4.0)];

        let near = near_best_pairs(&candidates, &config, |_| false, 0.01);
        assert_eq!(near, vec![(0, 1), (0, 2), (1, 2)]);

        // Zero tolerance still keeps exact ties
        assert_eq!(near_best_pairs(&candidates, &config, |_| false, 0.0).len(), 3);
        assert!(near_best_pairs(&candidates, &config, |_| true, 0.01).is_empty());
    }
}
