//! A/B significance testing between experiment groups A and B.
//!
//! Conversion is compared with a chi-squared test on the 2x2
//! converted/not-converted table (Yates-corrected) and summarized by the odds
//! ratio. Spending and playtime are compared with Welch's t-test and
//! summarized by Cohen's d. Every result carries a 95% confidence interval
//! for the B minus A difference and a plain-language interpretation.

use gamelytics_data::{AbGroup, FilteredView, PlayerRecord};
use gamelytics_stats::hypothesis::{
    self, ConfidenceInterval, ContingencyTable2x2, SampleSummary, TestOutcome,
};
use serde::Serialize;

use crate::AnalysisError;

/// Significance level.
pub const ALPHA: f64 = 0.05;
/// Confidence level of the reported intervals.
pub const CONFIDENCE_LEVEL: f64 = 0.95;

/// Metric compared between the groups.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    derive_more::Display,
    derive_more::FromStr,
)]
pub enum AbMetric {
    /// Share of players who made a purchase.
    #[default]
    Conversion,
    /// Total spend in USD.
    Spending,
    /// Total playtime in hours.
    PlayTime,
}

impl AbMetric {
    pub const ALL: [Self; 3] = [Self::Conversion, Self::Spending, Self::PlayTime];

    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Conversion => Self::Spending,
            Self::Spending => Self::PlayTime,
            Self::PlayTime => Self::Conversion,
        }
    }

    /// Human-readable name, used in interpretations.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Conversion => "conversion rate",
            Self::Spending => "spending (USD)",
            Self::PlayTime => "playtime (hours)",
        }
    }

    fn value(self, record: &PlayerRecord) -> f64 {
        match self {
            Self::Conversion => f64::from(u8::from(record.has_purchased)),
            Self::Spending => record.total_spent_usd,
            Self::PlayTime => record.play_time_hours,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TestKind {
    ChiSquared,
    WelchT,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum EffectSize {
    /// Odds of converting in B over odds in A; NaN when undefined.
    OddsRatio(f64),
    /// Standardized mean difference of B minus A.
    CohensD(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display)]
pub enum EffectMagnitude {
    #[display("negligible")]
    Negligible,
    #[display("small")]
    Small,
    #[display("medium")]
    Medium,
    #[display("large")]
    Large,
}

impl EffectMagnitude {
    /// Conventional buckets of `|d|`: 0.2, 0.5 and 0.8.
    #[must_use]
    pub fn from_cohens_d(d: f64) -> Self {
        match d.abs() {
            d if d < 0.2 => Self::Negligible,
            d if d < 0.5 => Self::Small,
            d if d < 0.8 => Self::Medium,
            _ => Self::Large,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub group: AbGroup,
    pub players: usize,
    /// Conversion rate in `[0, 1]`, or the metric mean.
    pub mean: f64,
    /// Sample standard deviation of the metric.
    pub std_dev: f64,
    /// Converted players; only set for conversion.
    pub conversions: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbTestResult {
    pub metric: AbMetric,
    pub group_a: GroupStats,
    pub group_b: GroupStats,
    pub test: TestKind,
    pub statistic: f64,
    pub p_value: f64,
    pub degrees_of_freedom: f64,
    pub significant: bool,
    pub effect: EffectSize,
    /// Interval for the B minus A difference (rates for conversion).
    pub confidence_interval: ConfidenceInterval,
    pub interpretation: String,
}

/// Compares groups A and B on `metric`.
///
/// Both groups need at least one player, two for continuous metrics so that
/// each has a sample variance.
pub fn ab_test(view: &FilteredView<'_>, metric: AbMetric) -> Result<AbTestResult, AnalysisError> {
    let values_of = |group| {
        view.iter()
            .filter(|r| r.ab_group == group)
            .map(|r| metric.value(r))
            .collect::<Vec<_>>()
    };
    let required = match metric {
        AbMetric::Conversion => 1,
        AbMetric::Spending | AbMetric::PlayTime => 2,
    };
    let summarize = |group, values: &[f64]| {
        SampleSummary::from_values(values)
            .filter(|summary| summary.n >= required)
            .ok_or(AnalysisError::InsufficientGroupData {
                group,
                required,
                actual: values.len(),
            })
    };
    let a = values_of(AbGroup::A);
    let b = values_of(AbGroup::B);
    let summary_a = summarize(AbGroup::A, &a)?;
    let summary_b = summarize(AbGroup::B, &b)?;

    let result = match metric {
        AbMetric::Conversion => conversion_test(&a, &b, &summary_a, &summary_b),
        AbMetric::Spending | AbMetric::PlayTime => {
            continuous_test(metric, &summary_a, &summary_b)
        }
    };
    Ok(result)
}

fn group_stats(group: AbGroup, summary: &SampleSummary, conversions: Option<u64>) -> GroupStats {
    GroupStats {
        group,
        players: summary.n,
        mean: summary.mean,
        std_dev: summary.std_dev(),
        conversions,
    }
}

fn conversion_test(
    a: &[f64],
    b: &[f64],
    summary_a: &SampleSummary,
    summary_b: &SampleSummary,
) -> AbTestResult {
    let converted = |values: &[f64]| values.iter().filter(|v| **v > 0.0).count() as u64;
    let (n_a, n_b) = (a.len() as u64, b.len() as u64);
    let (conv_a, conv_b) = (converted(a), converted(b));
    let table = ContingencyTable2x2 {
        a_success: conv_a,
        a_failure: n_a - conv_a,
        b_success: conv_b,
        b_failure: n_b - conv_b,
    };

    let outcome = hypothesis::chi_squared_independence(&table, true);
    let odds_ratio = hypothesis::odds_ratio(&table);
    let ci = hypothesis::proportion_difference_ci(conv_a, n_a, conv_b, n_b, CONFIDENCE_LEVEL);
    let group_a = group_stats(AbGroup::A, summary_a, Some(conv_a));
    let group_b = group_stats(AbGroup::B, summary_b, Some(conv_b));
    let interpretation = interpret_conversion(&group_a, &group_b, &outcome, odds_ratio, &ci);

    build_result(
        AbMetric::Conversion,
        group_a,
        group_b,
        TestKind::ChiSquared,
        &outcome,
        EffectSize::OddsRatio(odds_ratio),
        ci,
        interpretation,
    )
}

fn continuous_test(
    metric: AbMetric,
    summary_a: &SampleSummary,
    summary_b: &SampleSummary,
) -> AbTestResult {
    let outcome = hypothesis::welch_t_test(summary_a, summary_b);
    let d = hypothesis::cohens_d(summary_a, summary_b);
    let ci = hypothesis::mean_difference_ci(summary_a, summary_b, CONFIDENCE_LEVEL);
    let group_a = group_stats(AbGroup::A, summary_a, None);
    let group_b = group_stats(AbGroup::B, summary_b, None);
    let interpretation = interpret_continuous(metric, &group_a, &group_b, &outcome, d, &ci);

    build_result(
        metric,
        group_a,
        group_b,
        TestKind::WelchT,
        &outcome,
        EffectSize::CohensD(d),
        ci,
        interpretation,
    )
}

#[expect(clippy::too_many_arguments)]
fn build_result(
    metric: AbMetric,
    group_a: GroupStats,
    group_b: GroupStats,
    test: TestKind,
    outcome: &TestOutcome,
    effect: EffectSize,
    confidence_interval: ConfidenceInterval,
    interpretation: String,
) -> AbTestResult {
    AbTestResult {
        metric,
        group_a,
        group_b,
        test,
        statistic: outcome.statistic,
        p_value: outcome.p_value,
        degrees_of_freedom: outcome.degrees_of_freedom,
        significant: is_significant(outcome.p_value),
        effect,
        confidence_interval,
        interpretation,
    }
}

fn is_significant(p_value: f64) -> bool {
    p_value < ALPHA
}

fn verdict(p_value: f64) -> String {
    if is_significant(p_value) {
        format!("The difference is statistically significant (p = {p_value:.4}).")
    } else {
        format!("The difference is not statistically significant (p = {p_value:.4}).")
    }
}

fn interpret_conversion(
    a: &GroupStats,
    b: &GroupStats,
    outcome: &TestOutcome,
    odds_ratio: f64,
    ci: &ConfidenceInterval,
) -> String {
    let likelihood = if odds_ratio.is_nan() {
        "The odds ratio is undefined because a group has no non-converting players.".to_owned()
    } else if odds_ratio >= 1.0 {
        format!("Group B players are {odds_ratio:.2} times more likely to convert (odds ratio).")
    } else if odds_ratio > 0.0 {
        format!(
            "Group B players are {:.2} times less likely to convert (odds ratio {odds_ratio:.2}).",
            1.0 / odds_ratio
        )
    } else {
        "No group B player converted.".to_owned()
    };
    format!(
        "Conversion is {:.2}% in group B vs {:.2}% in group A. {} \
         {:.0}% CI for the difference: [{:.2}, {:.2}] percentage points. {likelihood}",
        b.mean * 100.0,
        a.mean * 100.0,
        verdict(outcome.p_value),
        ci.level * 100.0,
        ci.lower * 100.0,
        ci.upper * 100.0,
    )
}

fn interpret_continuous(
    metric: AbMetric,
    a: &GroupStats,
    b: &GroupStats,
    outcome: &TestOutcome,
    d: f64,
    ci: &ConfidenceInterval,
) -> String {
    format!(
        "Mean {} is {:.2} in group B vs {:.2} in group A. {} \
         {:.0}% CI for the difference: [{:.2}, {:.2}]. Cohen's d = {d:.3} ({} effect).",
        metric.description(),
        b.mean,
        a.mean,
        verdict(outcome.p_value),
        ci.level * 100.0,
        ci.lower,
        ci.upper,
        EffectMagnitude::from_cohens_d(d),
    )
}

#[cfg(test)]
mod tests {
    use gamelytics_data::Dataset;

    use super::*;
    use crate::fixtures::player;

    fn converted(id: u64, group: AbGroup, has_purchased: bool) -> PlayerRecord {
        PlayerRecord {
            ab_group: group,
            has_purchased,
            total_spent_usd: if has_purchased { 10.0 } else { 0.0 },
            ..player(id)
        }
    }

    fn conversion_dataset(conv_a: u64, n_a: u64, conv_b: u64, n_b: u64) -> Dataset {
        let a = (0..n_a).map(|i| converted(i, AbGroup::A, i < conv_a));
        let b = (0..n_b).map(|i| converted(n_a + i, AbGroup::B, i < conv_b));
        Dataset::new(a.chain(b).collect())
    }

    #[test]
    fn test_conversion_difference_is_significant() {
        let dataset = conversion_dataset(20, 100, 35, 100);
        let result = ab_test(&FilteredView::all(&dataset), AbMetric::Conversion).unwrap();
        assert_eq!(result.test, TestKind::ChiSquared);
        assert!(result.p_value < 0.05);
        assert!(result.significant);
        let EffectSize::OddsRatio(odds_ratio) = result.effect else {
            panic!("expected odds ratio");
        };
        assert!(odds_ratio > 1.0);
        assert_eq!(result.group_a.conversions, Some(20));
        assert!((result.group_b.mean - 0.35).abs() < 1e-12);
        assert!(result.confidence_interval.contains(0.15));
        assert!(result.interpretation.contains("more likely"));
    }

    #[test]
    fn test_odds_ratio_undefined_without_non_converters() {
        let dataset = conversion_dataset(10, 10, 3, 10);
        let result = ab_test(&FilteredView::all(&dataset), AbMetric::Conversion).unwrap();
        let EffectSize::OddsRatio(odds_ratio) = result.effect else {
            panic!("expected odds ratio");
        };
        assert!(odds_ratio.is_nan());
        assert!(result.interpretation.contains("undefined"));
    }

    #[test]
    fn test_identical_groups_are_not_significant() {
        let records = (0..80_u64)
            .map(|id| PlayerRecord {
                ab_group: if id % 2 == 0 { AbGroup::A } else { AbGroup::B },
                play_time_hours: ((id / 2) % 10) as f64,
                ..player(id)
            })
            .collect();
        let dataset = Dataset::new(records);
        let result = ab_test(&FilteredView::all(&dataset), AbMetric::PlayTime).unwrap();
        assert_eq!(result.test, TestKind::WelchT);
        assert!(result.p_value > 0.5);
        let EffectSize::CohensD(d) = result.effect else {
            panic!("expected Cohen's d");
        };
        assert!(d.abs() < 0.05);
        assert!(!result.significant);
        assert!(result.interpretation.contains("negligible"));
    }

    #[test]
    fn test_empty_group() {
        let dataset = conversion_dataset(3, 10, 0, 0);
        assert_eq!(
            ab_test(&FilteredView::all(&dataset), AbMetric::Spending),
            Err(AnalysisError::InsufficientGroupData {
                group: AbGroup::B,
                required: 2,
                actual: 0
            })
        );
        assert_eq!(
            ab_test(&FilteredView::default(), AbMetric::Conversion),
            Err(AnalysisError::InsufficientGroupData {
                group: AbGroup::A,
                required: 1,
                actual: 0
            })
        );
    }

    #[test]
    fn test_single_player_group_has_no_variance() {
        let lone = PlayerRecord {
            ab_group: AbGroup::A,
            play_time_hours: 11.0,
            ..player(0)
        };
        let others = (1..=50_u64).map(|id| PlayerRecord {
            ab_group: AbGroup::B,
            play_time_hours: 9.5 + (id % 5) as f64 * 0.25,
            ..player(id)
        });
        let dataset = Dataset::new(std::iter::once(lone).chain(others).collect());
        let view = FilteredView::all(&dataset);
        assert_eq!(
            ab_test(&view, AbMetric::PlayTime),
            Err(AnalysisError::InsufficientGroupData {
                group: AbGroup::A,
                required: 2,
                actual: 1
            })
        );
        // a single player still has a conversion rate
        assert!(ab_test(&view, AbMetric::Conversion).is_ok());
    }

    #[test]
    fn test_effect_magnitude_buckets() {
        assert_eq!(EffectMagnitude::from_cohens_d(0.1), EffectMagnitude::Negligible);
        assert_eq!(EffectMagnitude::from_cohens_d(-0.3), EffectMagnitude::Small);
        assert_eq!(EffectMagnitude::from_cohens_d(0.5), EffectMagnitude::Medium);
        assert_eq!(EffectMagnitude::from_cohens_d(1.2), EffectMagnitude::Large);
    }
}
