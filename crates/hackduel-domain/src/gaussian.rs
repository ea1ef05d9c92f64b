//! Standard normal helpers used by the rating update
//!
//! `erfc` uses the Chebyshev fit from Numerical Recipes (fractional error
//! below 1.2e-7 everywhere), which is plenty for rating purposes.

use std::f64::consts::{PI, SQRT_2};

/// Smallest CDF value the truncation factors divide by.
const MIN_DENOMINATOR: f64 = 2.222_758_749e-162;

/// Complementary error function.
pub fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -z * z - 1.265_512_23
        + t * (1.000_023_68
            + t * (0.374_091_96
                + t * (0.096_784_18
                    + t * (-0.186_288_06
                        + t * (0.278_868_07
                            + t * (-1.135_203_98
                                + t * (1.488_515_87 + t * (-0.822_152_23 + t * 0.170_872_77))))))));
    let r = t * poly.exp();
    if x >= 0.0 {
        r
    } else {
        2.0 - r
    }
}

/// Standard normal probability density.
pub fn pdf(x: f64) -> f64 {
    (-(x * x) / 2.0).exp() / (2.0 * PI).sqrt()
}

/// Standard normal cumulative distribution.
pub fn cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Mean shift factor of a truncated Gaussian for a win, `φ(t) / Φ(t)`.
///
/// Falls back to the asymptote `-t` when `Φ(t)` underflows, so the result is
/// always finite and non-negative.
pub fn v_win(t: f64) -> f64 {
    let denom = cdf(t);
    if denom < MIN_DENOMINATOR {
        return (-t).max(0.0);
    }
    pdf(t) / denom
}

/// Variance shrink factor of a truncated Gaussian for a win, `v(t)(v(t) + t)`.
///
/// Clamped to `[0, 1]`.
pub fn w_win(t: f64) -> f64 {
    let denom = cdf(t);
    if denom < MIN_DENOMINATOR {
        return if t < 0.0 { 1.0 } else { 0.0 };
    }
    let v = v_win(t);
    (v * (v + t)).clamp(0.0, 1.0)
}
