//! Active-learning pair selection
//!
//! Chooses the comparison expected to remove the most uncertainty: close
//! skill estimates weighted toward uncertain entries. Pairs a session has
//! already seen are skipped until the candidate set is exhausted.

use crate::EngineError;
use hackduel_domain::{best_pair, near_best_pairs, Entry, EntryId, PairKey, RatingConfig};
use parking_lot::Mutex;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

/// Category name that selects the whole pool
pub const ALL_CATEGORIES: &str = "All";

/// Sessionless requests pick at random among pairs scoring this close
/// (relative) to the best
const NEAR_TIE_TOLERANCE: f64 = 0.02;

/// Map the request-level category to a store scope
///
/// Blank and `"All"` are unfiltered.
pub fn category_scope(category: Option<&str>) -> Option<&str> {
    category
        .map(str::trim)
        .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case(ALL_CATEGORIES))
}

/// Pair selection tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingConfig {
    /// Largest number of entries scored per request; bigger scopes are sampled
    pub candidate_pool: usize,
    /// Pairs remembered per session; must cover every pair of a full
    /// candidate set
    pub session_history: usize,
    /// Sessions tracked before the oldest is forgotten
    pub max_sessions: usize,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            candidate_pool: 24,
            session_history: 276,
            max_sessions: 10_000,
        }
    }
}

impl PairingConfig {
    /// Reject settings that cannot form a pair
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.candidate_pool < 2 {
            return Err(EngineError::Config("candidate_pool must be at least 2".to_string()));
        }
        let candidate_pairs = self.candidate_pool.saturating_mul(self.candidate_pool - 1) / 2;
        if self.session_history < candidate_pairs {
            return Err(EngineError::Config(format!(
                "session_history must be at least {} to cover every pair of {} candidates",
                candidate_pairs, self.candidate_pool
            )));
        }
        if self.max_sessions == 0 {
            return Err(EngineError::Config("max_sessions must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct SessionHistory {
    order: VecDeque<PairKey>,
    seen: HashSet<PairKey>,
}

impl SessionHistory {
    fn contains(&self, key: &PairKey) -> bool {
        self.seen.contains(key)
    }

    fn record(&mut self, key: PairKey, capacity: usize) {
        if capacity == 0 || !self.seen.insert(key.clone()) {
            return;
        }
        self.order.push_back(key);
        while self.order.len() > capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
    }

    /// Forget the pairs drawn entirely from `ids`
    fn forget_within(&mut self, ids: &HashSet<&EntryId>) {
        let within = |key: &PairKey| {
            let (a, b) = key.ids();
            ids.contains(a) && ids.contains(b)
        };
        self.order.retain(|key| !within(key));
        self.seen.retain(|key| !within(key));
    }
}

#[derive(Debug, Default)]
struct Sessions {
    histories: HashMap<String, SessionHistory>,
    arrival: VecDeque<String>,
}

impl Sessions {
    fn history(&mut self, session: &str, max_sessions: usize) -> &mut SessionHistory {
        if !self.histories.contains_key(session) {
            while self.histories.len() >= max_sessions {
                match self.arrival.pop_front() {
                    Some(oldest) => {
                        self.histories.remove(&oldest);
                    }
                    None => break,
                }
            }
            self.arrival.push_back(session.to_string());
        }
        self.histories.entry(session.to_string()).or_default()
    }
}

/// Chooses the next pair to compare
#[derive(Debug)]
pub struct PairSelector {
    config: PairingConfig,
    rating: RatingConfig,
    sessions: Mutex<Sessions>,
}

impl PairSelector {
    /// Create a selector scoring pairs under `rating`
    pub fn new(config: PairingConfig, rating: RatingConfig) -> Self {
        Self {
            config,
            rating,
            sessions: Mutex::new(Sessions::default()),
        }
    }

    /// Pick two distinct entries from `pool`
    ///
    /// `pool` is the active scope. Presentation order is randomized; the
    /// chosen pair is recorded against `session` when one is given.
    pub fn select(&self, pool: Vec<Entry>, session: Option<&str>) -> Result<(Entry, Entry), EngineError> {
        if pool.len() < 2 {
            return Err(EngineError::EmptyPool);
        }

        let mut rng = rand::rng();
        let mut candidates = if pool.len() > self.config.candidate_pool {
            sample_by_uncertainty(pool, self.config.candidate_pool, &mut rng)
        } else {
            pool
        };
        // Scoring ties resolve by id, so the scan order must not depend on
        // hash order
        candidates.sort_by(|a, b| a.id.cmp(&b.id));

        let (i, j) = match session {
            Some(session) => {
                let mut sessions = self.sessions.lock();
                let history = sessions.history(session, self.config.max_sessions);

                let chosen = match best_pair(&candidates, &self.rating, |key| history.contains(key)) {
                    Some(pair) => pair,
                    None => {
                        tracing::debug!(session, "Session has seen every candidate pair, starting over");
                        let ids: HashSet<&EntryId> = candidates.iter().map(|e| &e.id).collect();
                        history.forget_within(&ids);
                        best_pair(&candidates, &self.rating, |_| false).ok_or(EngineError::EmptyPool)?
                    }
                };
                history.record(
                    PairKey::new(&candidates[chosen.0].id, &candidates[chosen.1].id),
                    self.config.session_history,
                );
                chosen
            }
            None => {
                let near = near_best_pairs(&candidates, &self.rating, |_| false, NEAR_TIE_TOLERANCE);
                if near.is_empty() {
                    return Err(EngineError::EmptyPool);
                }
                near[rng.random_range(0..near.len())]
            }
        };

        let (first, second) = if rng.random::<f64>() < 0.5 { (i, j) } else { (j, i) };
        let b = candidates.swap_remove(second);
        // swap_remove may have moved `first` into `second`'s slot
        let first = if first == candidates.len() { second } else { first };
        let a = candidates.swap_remove(first);
        Ok((a, b))
    }

    /// Forget every session's history
    pub fn clear_sessions(&self) {
        let mut sessions = self.sessions.lock();
        sessions.histories.clear();
        sessions.arrival.clear();
    }
}

/// Draw `k` entries without replacement, weighted by variance
fn sample_by_uncertainty(mut pool: Vec<Entry>, k: usize, rng: &mut impl Rng) -> Vec<Entry> {
    let mut sampled = Vec::with_capacity(k);

    while sampled.len() < k && !pool.is_empty() {
        let weights: Vec<f64> = pool.iter().map(|e| e.rating.sigma * e.rating.sigma).collect();
        let total_weight: f64 = weights.iter().sum();

        let index = if total_weight > 0.0 && total_weight.is_finite() {
            weighted_random_select(&weights, total_weight, rng)
        } else {
            rng.random_range(0..pool.len())
        };
        sampled.push(pool.swap_remove(index));
    }

    sampled
}

fn weighted_random_select(weights: &[f64], total_weight: f64, rng: &mut impl Rng) -> usize {
    let mut r = rng.random::<f64>() * total_weight;
    for (j, &w) in weights.iter().enumerate() {
        r -= w;
        if r < 1e-10 {
            return j;
        }
    }
    weights.len() - 1
}
