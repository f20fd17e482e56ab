//! Two-sample hypothesis tests, effect sizes and confidence intervals.
//!
//! - [`chi_squared_independence`]: chi-squared test on a 2x2 contingency table
//! - [`welch_t_test`]: two-sample t-test without the equal-variance assumption
//! - [`cohens_d`] and [`odds_ratio`]: effect sizes
//! - [`mean_difference_ci`] and [`proportion_difference_ci`]: large-sample
//!   normal-approximation intervals
//!
//! Distribution functions come from `statrs`.
//!
//! # Examples
//!
//! ```
//! use gamelytics_stats::hypothesis::{ContingencyTable2x2, chi_squared_independence, odds_ratio};
//!
//! let table = ContingencyTable2x2 {
//!     a_success: 20,
//!     a_failure: 80,
//!     b_success: 35,
//!     b_failure: 65,
//! };
//! let outcome = chi_squared_independence(&table, true);
//! assert!(outcome.p_value < 0.05);
//! assert!(odds_ratio(&table) > 1.0);
//! ```

use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF, Normal, StudentsT};

use crate::descriptive::{ratio_or_zero, sample_variance};

/// Two-sided 97.5% standard normal quantile, used if `statrs` rejects the parameters.
const Z_975: f64 = 1.959_963_984_540_054;

/// A two-sided confidence interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
    /// Confidence level in `(0, 1)`, e.g. `0.95`.
    pub level: f64,
}

impl ConfidenceInterval {
    #[must_use]
    pub fn around(center: f64, half_width: f64, level: f64) -> Self {
        Self {
            lower: center - half_width,
            upper: center + half_width,
            level,
        }
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// Result of a hypothesis test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TestOutcome {
    pub statistic: f64,
    pub p_value: f64,
    pub degrees_of_freedom: f64,
}

/// Counts of a 2x2 table: two groups by success/failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContingencyTable2x2 {
    pub a_success: u64,
    pub a_failure: u64,
    pub b_success: u64,
    pub b_failure: u64,
}

/// Mean, sample variance and size of one sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SampleSummary {
    pub n: usize,
    pub mean: f64,
    /// Sample variance (`n - 1` denominator), zero for a single value.
    pub variance: f64,
}

impl SampleSummary {
    /// Summarizes `values`; `None` when empty.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        Some(Self {
            n: values.len(),
            mean,
            variance: sample_variance(values, mean),
        })
    }

    #[must_use]
    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }

    /// Squared standard error of the mean.
    #[expect(clippy::cast_precision_loss)]
    fn squared_standard_error(&self) -> f64 {
        ratio_or_zero(self.variance, self.n as f64)
    }
}

/// Two-sided critical value of the standard normal distribution for `level`.
///
/// ```
/// # use gamelytics_stats::hypothesis::z_critical;
/// assert!((z_critical(0.95) - 1.959964).abs() < 1e-6);
/// ```
#[must_use]
pub fn z_critical(level: f64) -> f64 {
    Normal::new(0.0, 1.0).map_or(Z_975, |normal| {
        normal.inverse_cdf(1.0 - (1.0 - level) / 2.0)
    })
}

/// Chi-squared test of independence on a 2x2 table (one degree of freedom).
///
/// With `yates_correction`, each `|observed - expected|` is reduced by
/// `min(0.5, |observed - expected|)`. A table with an empty row or column
/// carries no evidence and yields statistic `0` with p-value `1`.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn chi_squared_independence(
    table: &ContingencyTable2x2,
    yates_correction: bool,
) -> TestOutcome {
    let observed = [
        [table.a_success as f64, table.a_failure as f64],
        [table.b_success as f64, table.b_failure as f64],
    ];
    let row_totals = [observed[0][0] + observed[0][1], observed[1][0] + observed[1][1]];
    let col_totals = [observed[0][0] + observed[1][0], observed[0][1] + observed[1][1]];
    let total = row_totals[0] + row_totals[1];

    if row_totals.contains(&0.0) || col_totals.contains(&0.0) {
        return TestOutcome {
            statistic: 0.0,
            p_value: 1.0,
            degrees_of_freedom: 1.0,
        };
    }

    let mut statistic = 0.0;
    for (row, row_total) in observed.iter().zip(row_totals) {
        for (cell, col_total) in row.iter().zip(col_totals) {
            let expected = row_total * col_total / total;
            let mut deviation = (cell - expected).abs();
            if yates_correction {
                deviation -= deviation.min(0.5);
            }
            statistic += deviation * deviation / expected;
        }
    }

    let p_value = ChiSquared::new(1.0).map_or(f64::NAN, |dist| 1.0 - dist.cdf(statistic));
    TestOutcome {
        statistic,
        p_value,
        degrees_of_freedom: 1.0,
    }
}

/// Odds of success in group B divided by odds of success in group A.
///
/// NaN when either group has no failures.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn odds_ratio(table: &ContingencyTable2x2) -> f64 {
    if table.a_failure == 0 || table.b_failure == 0 {
        return f64::NAN;
    }
    let odds_a = table.a_success as f64 / table.a_failure as f64;
    let odds_b = table.b_success as f64 / table.b_failure as f64;
    odds_b / odds_a
}

/// Normal-approximation interval for `p_B - p_A`.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn proportion_difference_ci(
    successes_a: u64,
    n_a: u64,
    successes_b: u64,
    n_b: u64,
    level: f64,
) -> ConfidenceInterval {
    let p_a = ratio_or_zero(successes_a as f64, n_a as f64);
    let p_b = ratio_or_zero(successes_b as f64, n_b as f64);
    let variance = ratio_or_zero(p_a * (1.0 - p_a), n_a as f64)
        + ratio_or_zero(p_b * (1.0 - p_b), n_b as f64);
    ConfidenceInterval::around(p_b - p_a, z_critical(level) * variance.sqrt(), level)
}

/// Welch's two-sample t-test of `mean_B - mean_A`, two-sided.
///
/// Degrees of freedom follow Welch-Satterthwaite. When the combined standard
/// error is zero the statistic is `0` (p = 1) for equal means and infinite
/// (p = 0) otherwise.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn welch_t_test(a: &SampleSummary, b: &SampleSummary) -> TestOutcome {
    let se2_a = a.squared_standard_error();
    let se2_b = b.squared_standard_error();
    let se2 = se2_a + se2_b;
    let diff = b.mean - a.mean;

    if se2 <= 0.0 {
        let (statistic, p_value) = if diff == 0.0 {
            (0.0, 1.0)
        } else {
            (diff.signum() * f64::INFINITY, 0.0)
        };
        return TestOutcome {
            statistic,
            p_value,
            degrees_of_freedom: (a.n + b.n).saturating_sub(2) as f64,
        };
    }

    let term = |se2: f64, n: usize| {
        if n > 1 {
            se2 * se2 / (n - 1) as f64
        } else {
            0.0
        }
    };
    let degrees_of_freedom = se2 * se2 / (term(se2_a, a.n) + term(se2_b, b.n));
    let statistic = diff / se2.sqrt();
    let p_value = StudentsT::new(0.0, 1.0, degrees_of_freedom)
        .map_or(f64::NAN, |dist| 2.0 * (1.0 - dist.cdf(statistic.abs())));

    TestOutcome {
        statistic,
        p_value: p_value.clamp(0.0, 1.0),
        degrees_of_freedom,
    }
}

/// Cohen's d of `mean_B - mean_A` using the pooled standard deviation.
///
/// The pooled variance uses `n_A + n_B - 2` degrees of freedom; returns `0.0`
/// when it is undefined or zero.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn cohens_d(a: &SampleSummary, b: &SampleSummary) -> f64 {
    let dof = (a.n + b.n).saturating_sub(2);
    if dof == 0 {
        return 0.0;
    }
    let pooled_variance = ((a.n.saturating_sub(1)) as f64 * a.variance
        + (b.n.saturating_sub(1)) as f64 * b.variance)
        / dof as f64;
    let pooled_std = pooled_variance.sqrt();
    if !pooled_std.is_finite() || pooled_std <= f64::EPSILON {
        return 0.0;
    }
    (b.mean - a.mean) / pooled_std
}

/// Normal-approximation interval for `mean_B - mean_A`:
/// `diff +/- z * sqrt(SE_A^2 + SE_B^2)`.
#[must_use]
pub fn mean_difference_ci(a: &SampleSummary, b: &SampleSummary, level: f64) -> ConfidenceInterval {
    let half_width =
        z_critical(level) * (a.squared_standard_error() + b.squared_standard_error()).sqrt();
    ConfidenceInterval::around(b.mean - a.mean, half_width, level)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversion_table() -> ContingencyTable2x2 {
        ContingencyTable2x2 {
            a_success: 20,
            a_failure: 80,
            b_success: 35,
            b_failure: 65,
        }
    }

    #[test]
    fn test_chi_squared_with_yates_matches_reference() {
        let outcome = chi_squared_independence(&conversion_table(), true);
        assert!((outcome.statistic - 4.915_360).abs() < 1e-4);
        assert!((outcome.p_value - 0.026_6).abs() < 1e-3);
    }

    #[test]
    fn test_chi_squared_without_correction_is_larger() {
        let corrected = chi_squared_independence(&conversion_table(), true);
        let plain = chi_squared_independence(&conversion_table(), false);
        assert!(plain.statistic > corrected.statistic);
        assert!((plain.statistic - 5.642_633).abs() < 1e-4);
    }

    #[test]
    fn test_chi_squared_empty_margin() {
        let table = ContingencyTable2x2 {
            a_success: 0,
            a_failure: 10,
            b_success: 0,
            b_failure: 12,
        };
        let outcome = chi_squared_independence(&table, true);
        assert_eq!(outcome.statistic, 0.0);
        assert_eq!(outcome.p_value, 1.0);
    }

    #[test]
    fn test_odds_ratio() {
        let ratio = odds_ratio(&conversion_table());
        assert!((ratio - (35.0 / 65.0) / (20.0 / 80.0)).abs() < 1e-12);

        let no_failures = ContingencyTable2x2 {
            a_success: 5,
            a_failure: 0,
            b_success: 3,
            b_failure: 2,
        };
        assert!(odds_ratio(&no_failures).is_nan());
    }

    #[test]
    fn test_proportion_ci_contains_difference() {
        let ci = proportion_difference_ci(20, 100, 35, 100, 0.95);
        assert!(ci.contains(0.15));
        assert!(ci.lower > 0.0);
        let se = (0.2_f64 * 0.8 / 100.0 + 0.35 * 0.65 / 100.0).sqrt();
        assert!((ci.upper - (0.15 + 1.959_964 * se)).abs() < 1e-5);
    }

    #[test]
    fn test_welch_identical_samples() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let a = SampleSummary::from_values(&values).unwrap();
        let b = SampleSummary::from_values(&values).unwrap();
        let outcome = welch_t_test(&a, &b);
        assert_eq!(outcome.statistic, 0.0);
        assert!((outcome.p_value - 1.0).abs() < 1e-12);
        assert_eq!(cohens_d(&a, &b), 0.0);
    }

    #[test]
    fn test_welch_reference_values() {
        // t = 3 / sqrt(2.5 / 5 + 2.5 / 5) = 3, df = 8
        let a = SampleSummary::from_values(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let b = SampleSummary::from_values(&[4.0, 5.0, 6.0, 7.0, 8.0]).unwrap();
        let outcome = welch_t_test(&a, &b);
        assert!((outcome.statistic - 3.0).abs() < 1e-12);
        assert!((outcome.degrees_of_freedom - 8.0).abs() < 1e-9);
        assert!((outcome.p_value - 0.017_071).abs() < 1e-4);
    }

    #[test]
    fn test_welch_zero_variance() {
        let a = SampleSummary::from_values(&[2.0, 2.0]).unwrap();
        let b = SampleSummary::from_values(&[3.0, 3.0]).unwrap();
        let outcome = welch_t_test(&a, &b);
        assert_eq!(outcome.p_value, 0.0);
        assert!(outcome.statistic.is_infinite());
        assert_eq!(cohens_d(&a, &b), 0.0);
    }

    #[test]
    fn test_cohens_d_pooled() {
        let a = SampleSummary::from_values(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let b = SampleSummary::from_values(&[4.0, 5.0, 6.0, 7.0, 8.0]).unwrap();
        // pooled variance 2.5
        assert!((cohens_d(&a, &b) - 3.0 / 2.5_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_mean_difference_ci() {
        let a = SampleSummary::from_values(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let b = SampleSummary::from_values(&[4.0, 5.0, 6.0, 7.0, 8.0]).unwrap();
        let ci = mean_difference_ci(&a, &b, 0.95);
        assert!((ci.lower - (3.0 - 1.959_964)).abs() < 1e-5);
        assert!((ci.upper - (3.0 + 1.959_964)).abs() < 1e-5);
    }
}
