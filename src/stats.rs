//! Significance engine for two-arm conversion experiments
//!
//! **Problem**: Observed conversion rates differ between arms by chance alone.
//!
//! **Solution**: Pure functions over aggregate counts:
//! - 95% Wald confidence interval per arm
//! - Pooled two-proportion z-test with a fixed alpha of 0.05
//! - Per-arm sample size needed for 80% power at the observed effect
//!
//! Every constant below is part of a cross-version contract. The normal CDF
//! in particular is the Abramowitz–Stegun 26.2.17 polynomial, evaluated in a
//! fixed order so p-values stay bit-comparable with earlier releases.
//! Replacing it with a more accurate CDF changes significance outcomes at the
//! margins and must ship as a new version.

#![allow(clippy::cast_precision_loss)]

use serde::{Deserialize, Serialize};

/// Two-sided 95% critical value.
pub const Z_ALPHA: f64 = 1.96;

/// Critical value for 80% power.
pub const Z_BETA: f64 = 0.84;

/// Significance threshold for the z-test.
pub const ALPHA: f64 = 0.05;

/// Reported confidence level of the intervals.
pub const CONFIDENCE_LEVEL: f64 = 0.95;

/// Minimum visitors per arm before a test is attempted.
pub const MIN_SAMPLE_PER_ARM: u64 = 30;

/// Sample-size recommendation when the arms show no difference.
pub const NO_EFFECT_SAMPLE_SIZE: u64 = 10_000;

/// Closed interval `[lower, upper]` around a conversion rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    /// Lower bound, clamped to 0.
    pub lower: f64,
    /// Upper bound, clamped to 1.
    pub upper: f64,
}

impl ConfidenceInterval {
    /// Degenerate interval reported for an arm with no visitors.
    pub const EMPTY: Self = Self {
        lower: 0.0,
        upper: 0.0,
    };

    /// Whether `rate` lies inside the interval.
    #[must_use]
    pub fn contains(&self, rate: f64) -> bool {
        self.lower <= rate && rate <= self.upper
    }
}

/// Outcome of the two-proportion z-test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignificanceTest {
    /// Two-sided p-value. At `z = 0` the CDF approximation yields
    /// `1.0000003`, slightly above 1.
    pub p_value: f64,
    /// `p_value < ALPHA`.
    pub is_significant: bool,
}

impl SignificanceTest {
    /// Result reported when no test can be run (sample floor or zero variance).
    pub const INCONCLUSIVE: Self = Self {
        p_value: 1.0,
        is_significant: false,
    };
}

/// Conversion rate, or 0 when there are no visitors.
#[must_use]
pub fn conversion_rate(conversions: u64, visitors: u64) -> f64 {
    if visitors == 0 {
        0.0
    } else {
        conversions as f64 / visitors as f64
    }
}

/// 95% two-sided Wald interval for a proportion.
///
/// # Examples
///
/// ```rust
/// use splitlab::stats::{confidence_interval, ConfidenceInterval};
///
/// assert_eq!(confidence_interval(0.1, 0), ConfidenceInterval::EMPTY);
///
/// let ci = confidence_interval(0.5, 100);
/// assert!((ci.lower - 0.402).abs() < 1e-9);
/// assert!((ci.upper - 0.598).abs() < 1e-9);
/// ```
#[must_use]
pub fn confidence_interval(rate: f64, n: u64) -> ConfidenceInterval {
    if n == 0 {
        return ConfidenceInterval::EMPTY;
    }

    let se = (rate * (1.0 - rate) / n as f64).sqrt();
    let margin = Z_ALPHA * se;

    ConfidenceInterval {
        lower: (rate - margin).max(0.0),
        upper: (rate + margin).min(1.0),
    }
}

/// Pooled two-proportion z-test of `c1/n1` against `c2/n2`.
///
/// Returns [`SignificanceTest::INCONCLUSIVE`] when either arm is below
/// [`MIN_SAMPLE_PER_ARM`] or the pooled standard error is zero.
#[must_use]
pub fn significance(c1: u64, n1: u64, c2: u64, n2: u64) -> SignificanceTest {
    if n1 < MIN_SAMPLE_PER_ARM || n2 < MIN_SAMPLE_PER_ARM {
        return SignificanceTest::INCONCLUSIVE;
    }

    let (c1, n1, c2, n2) = (c1 as f64, n1 as f64, c2 as f64, n2 as f64);
    let p1 = c1 / n1;
    let p2 = c2 / n2;
    let pooled = (c1 + c2) / (n1 + n2);

    let se = (pooled * (1.0 - pooled) * (1.0 / n1 + 1.0 / n2)).sqrt();
    if se == 0.0 {
        return SignificanceTest::INCONCLUSIVE;
    }

    let z = (p1 - p2) / se;
    let p_value = 2.0 * (1.0 - normal_cdf(z.abs()));

    SignificanceTest {
        p_value,
        is_significant: p_value < ALPHA,
    }
}

/// Minimum visitors per arm to detect `|p1 - p2|` at alpha 0.05, power 0.8.
///
/// Returns [`NO_EFFECT_SAMPLE_SIZE`] when the rates are equal.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn sample_size_recommendation(p1: f64, p2: f64) -> u64 {
    let p = (p1 + p2) / 2.0;
    let d = (p1 - p2).abs();

    if d == 0.0 {
        return NO_EFFECT_SAMPLE_SIZE;
    }

    let n = 2.0 * p * (1.0 - p) * (Z_ALPHA + Z_BETA).powi(2) / d.powi(2);
    n.ceil() as u64
}

/// Standard normal CDF, Abramowitz–Stegun 26.2.17 (|error| < 7.5e-8).
#[must_use]
pub fn normal_cdf(z: f64) -> f64 {
    let t = 1.0 / (1.0 + 0.231_641_9 * z.abs());
    let d = 0.398_942_3 * (-z * z / 2.0).exp();
    let prob = d
        * t
        * (0.319_381_5
            + t * (-0.356_563_8 + t * (1.781_478 + t * (-1.821_256 + t * 1.330_274))));

    if z > 0.0 {
        1.0 - prob
    } else {
        prob
    }
}
