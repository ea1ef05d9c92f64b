//! Rating module - Gaussian skill beliefs and the two-player update
//!
//! Each entry's skill is modeled as `N(mu, sigma²)`. A match performance is
//! the skill plus zero-mean Gaussian noise of scale `beta`. Observing
//! "winner performed better than loser" truncates the performance-difference
//! distribution, and both marginals are moved by moment matching (the
//! TrueSkill factor-graph update for two players without draws).

use crate::gaussian::{v_win, w_win};

/// Default prior mean
pub const DEFAULT_MU: f64 = 25.0;

/// Default prior standard deviation, `μ₀ / 3`
pub const DEFAULT_SIGMA: f64 = DEFAULT_MU / 3.0;

/// Lowest sigma an update may produce (default)
pub const DEFAULT_MIN_SIGMA: f64 = 0.5;

/// Sigma at which the pool is considered converged (default)
pub const DEFAULT_CONVERGED_SIGMA: f64 = 3.0;

/// A skill belief `N(mu, sigma²)`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rating {
    /// Skill estimate (mean)
    pub mu: f64,
    /// Uncertainty (standard deviation), strictly positive
    pub sigma: f64,
}

impl Rating {
    /// Create a new rating
    pub fn new(mu: f64, sigma: f64) -> Self {
        Self { mu, sigma }
    }

    /// Finite mean and finite, strictly positive deviation
    pub fn is_valid(&self) -> bool {
        self.mu.is_finite() && self.sigma.is_finite() && self.sigma > 0.0
    }

    /// Conservative skill estimate `mu - k·sigma`
    pub fn conservative(&self, k: f64) -> f64 {
        self.mu - k * self.sigma
    }
}

/// Which side of an `update` call won
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    /// The first rating passed
    First,
    /// The second rating passed
    Second,
}

/// Tunable constants of the rating model
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RatingConfig {
    /// Initial mean `μ₀`
    pub mu: f64,
    /// Initial deviation `σ₀`
    pub sigma: f64,
    /// Performance noise scale
    pub beta: f64,
    /// Dynamics added to each prior variance before an update
    pub tau: f64,
    /// Floor applied to updated deviations
    pub min_sigma: f64,
    /// Deviation at which confidence reaches 100
    pub converged_sigma: f64,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            mu: DEFAULT_MU,
            sigma: DEFAULT_SIGMA,
            beta: DEFAULT_SIGMA / 2.0,
            tau: DEFAULT_SIGMA / 100.0,
            min_sigma: DEFAULT_MIN_SIGMA,
            converged_sigma: DEFAULT_CONVERGED_SIGMA,
        }
    }
}

impl RatingConfig {
    /// The rating every entry starts from
    pub fn initial_rating(&self) -> Rating {
        Rating::new(self.mu, self.sigma)
    }

    /// Check the constants describe a usable model
    pub fn validate(&self) -> Result<(), String> {
        if !self.mu.is_finite() {
            return Err("mu must be finite".to_string());
        }
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err("sigma must be positive".to_string());
        }
        if !(self.beta.is_finite() && self.beta > 0.0) {
            return Err("beta must be positive".to_string());
        }
        if !(self.tau.is_finite() && self.tau >= 0.0) {
            return Err("tau must be non-negative".to_string());
        }
        if !(self.min_sigma > 0.0 && self.min_sigma < self.sigma) {
            return Err("min_sigma must be in (0, sigma)".to_string());
        }
        if !(self.converged_sigma >= self.min_sigma && self.converged_sigma < self.sigma) {
            return Err("converged_sigma must be in [min_sigma, sigma)".to_string());
        }
        Ok(())
    }
}

/// Posterior ratings after `winner` beat `loser`
///
/// Returns `(new_winner, new_loser)`. Deterministic and total for valid
/// ratings: the winner's mean never decreases, the loser's never increases,
/// and neither deviation grows. Deviations are floored at
/// `config.min_sigma` (a prior already below the floor is kept as is).
///
/// # Examples
///
/// ```
/// use hackduel_domain::{rate_match, RatingConfig};
///
/// let config = RatingConfig::default();
/// let prior = config.initial_rating();
/// let (winner, loser) = rate_match(prior, prior, &config);
///
/// assert!(winner.mu > prior.mu);
/// assert!(loser.mu < prior.mu);
/// assert!(winner.sigma < prior.sigma);
/// ```
pub fn rate_match(winner: Rating, loser: Rating, config: &RatingConfig) -> (Rating, Rating) {
    let tau_sq = config.tau * config.tau;
    let winner_var = winner.sigma * winner.sigma + tau_sq;
    let loser_var = loser.sigma * loser.sigma + tau_sq;

    let c_sq = 2.0 * config.beta * config.beta + winner_var + loser_var;
    let c = c_sq.sqrt();
    let t = (winner.mu - loser.mu) / c;

    let v = v_win(t);
    let w = w_win(t);

    let new_winner = Rating {
        mu: winner.mu + winner_var / c * v,
        sigma: posterior_sigma(winner.sigma, winner_var, c_sq, w, config.min_sigma),
    };
    let new_loser = Rating {
        mu: loser.mu - loser_var / c * v,
        sigma: posterior_sigma(loser.sigma, loser_var, c_sq, w, config.min_sigma),
    };

    (new_winner, new_loser)
}

/// Update a pair of ratings given which side won
///
/// Returns `(new_first, new_second)` in argument order.
pub fn update(first: Rating, second: Rating, winner: Winner, config: &RatingConfig) -> (Rating, Rating) {
    match winner {
        Winner::First => rate_match(first, second, config),
        Winner::Second => {
            let (new_second, new_first) = rate_match(second, first, config);
            (new_first, new_second)
        }
    }
}

fn posterior_sigma(prior_sigma: f64, var: f64, c_sq: f64, w: f64, floor: f64) -> f64 {
    let shrink = (1.0 - var / c_sq * w).max(0.0);
    let sigma = (var * shrink).sqrt();
    // The tau inflation can push the posterior above the prior when an
    // expected result carries almost no information.
    sigma.min(prior_sigma).max(floor.min(prior_sigma))
}

/// Draw probability of a pairing, the TrueSkill notion of match quality
///
/// In `(0, 1]`; highest for equal means and low uncertainty.
pub fn match_quality(a: Rating, b: Rating, config: &RatingConfig) -> f64 {
    let beta_sq = config.beta * config.beta;
    let c_sq = 2.0 * beta_sq + a.sigma * a.sigma + b.sigma * b.sigma;
    let diff = a.mu - b.mu;
    (2.0 * beta_sq / c_sq).sqrt() * (-(diff * diff) / (2.0 * c_sq)).exp()
}

/// Probability that `a` beats `b`
pub fn win_probability(a: Rating, b: Rating, config: &RatingConfig) -> f64 {
    let c_sq = 2.0 * config.beta * config.beta + a.sigma * a.sigma + b.sigma * b.sigma;
    crate::gaussian::cdf((a.mu - b.mu) / c_sq.sqrt())
}
