//! Behavioral segmentation of players with k-means.
//!
//! Six behavioral features are standardized over the current view and
//! clustered into [`SEGMENT_COUNT`] groups. Clusters are then named from
//! their raw feature means:
//!
//! - highest mean spend: "High Value"
//! - lowest mean playtime: "Low Engagement"
//! - remaining two by mean playtime: "Casual Player" (lower),
//!   "Active Non-Spender" (higher)
//!
//! When these rules do not yield four distinct names (the top spender is also
//! the least active cluster, an extreme is tied, or no cluster spends
//! anything), every cluster is named "Segment N" and the result carries a
//! warning instead.

use std::cmp::Ordering;

use gamelytics_data::{FilteredView, PlayerRecord};
use gamelytics_stats::{
    kmeans::{self, KMeansError, KMeansParams},
    standardize::StandardScaler,
};
use serde::Serialize;

use crate::AnalysisError;

/// Number of behavioral segments.
pub const SEGMENT_COUNT: usize = 4;
/// Seed used when the caller has no preference.
pub const DEFAULT_SEED: u64 = 42;

pub const HIGH_VALUE: &str = "High Value";
pub const LOW_ENGAGEMENT: &str = "Low Engagement";
pub const CASUAL_PLAYER: &str = "Casual Player";
pub const ACTIVE_NON_SPENDER: &str = "Active Non-Spender";

/// A clustering feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display)]
pub enum SegmentFeature {
    #[display("PlayTimeHours")]
    PlayTimeHours,
    #[display("TotalSpentUSD")]
    TotalSpentUsd,
    #[display("SessionsPerWeek")]
    SessionsPerWeek,
    #[display("AchievementsUnlocked")]
    AchievementsUnlocked,
    #[display("AvgSessionDurationMinutes")]
    AvgSessionDurationMinutes,
    #[display("FriendsCount")]
    FriendsCount,
}

impl SegmentFeature {
    pub const ALL: [Self; 6] = [
        Self::PlayTimeHours,
        Self::TotalSpentUsd,
        Self::SessionsPerWeek,
        Self::AchievementsUnlocked,
        Self::AvgSessionDurationMinutes,
        Self::FriendsCount,
    ];

    /// Raw value of this feature; non-finite values read as `0.0`.
    #[must_use]
    pub fn value(self, record: &PlayerRecord) -> f64 {
        let value = match self {
            Self::PlayTimeHours => record.play_time_hours,
            Self::TotalSpentUsd => record.total_spent_usd,
            Self::SessionsPerWeek => f64::from(record.sessions_per_week),
            Self::AchievementsUnlocked => f64::from(record.achievements_unlocked),
            Self::AvgSessionDurationMinutes => f64::from(record.avg_session_duration_minutes),
            Self::FriendsCount => f64::from(record.friends_count),
        };
        if value.is_finite() { value } else { 0.0 }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentAssignment {
    pub player_id: u64,
    pub cluster: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSummary {
    pub cluster: usize,
    pub label: String,
    pub players: usize,
    /// Mean raw value of each feature, in [`SegmentFeature::ALL`] order.
    pub feature_means: Vec<f64>,
}

impl ClusterSummary {
    #[must_use]
    pub fn mean_of(&self, feature: SegmentFeature) -> f64 {
        self.feature_means[feature.index()]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segmentation {
    /// One entry per record of the view, in view order.
    pub assignments: Vec<SegmentAssignment>,
    /// One entry per cluster, indexed by cluster.
    pub clusters: Vec<ClusterSummary>,
    /// Sum of squared distances to centroids, in standardized units.
    pub inertia: f64,
    /// Set when clusters could not be named from their characteristics.
    pub warning: Option<String>,
}

impl Segmentation {
    #[must_use]
    pub fn label_of(&self, cluster: usize) -> Option<&str> {
        self.clusters.get(cluster).map(|c| c.label.as_str())
    }
}

/// Clusters the players of the view into behavioral segments.
///
/// Deterministic for a given view and seed.
#[expect(clippy::cast_precision_loss)]
pub fn segment_players(view: &FilteredView<'_>, seed: u64) -> Result<Segmentation, AnalysisError> {
    if view.len() < SEGMENT_COUNT {
        return Err(AnalysisError::InsufficientData {
            required: SEGMENT_COUNT,
            actual: view.len(),
        });
    }

    let rows = view
        .iter()
        .map(|r| {
            SegmentFeature::ALL
                .iter()
                .map(|f| f.value(r))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    let (_, scaled) = StandardScaler::fit_transform(&rows);

    let fit = kmeans::fit(&scaled, &KMeansParams::new(SEGMENT_COUNT, seed)).map_err(|e| match e {
        KMeansError::ZeroClusters | KMeansError::TooFewSamples { .. } => {
            AnalysisError::InsufficientData {
                required: SEGMENT_COUNT,
                actual: view.len(),
            }
        }
    })?;

    let sizes = fit.cluster_sizes();
    let mut sums = vec![vec![0.0; SegmentFeature::ALL.len()]; SEGMENT_COUNT];
    for (row, &cluster) in rows.iter().zip(&fit.assignments) {
        for (sum, value) in sums[cluster].iter_mut().zip(row) {
            *sum += value;
        }
    }
    let feature_means = sums
        .into_iter()
        .zip(&sizes)
        .map(|(sum, &size)| {
            sum.into_iter()
                .map(|s| if size > 0 { s / size as f64 } else { 0.0 })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    let (labels, warning) = match characteristic_labels(&feature_means) {
        Some(labels) => (labels, None),
        None => {
            log::debug!("Segment naming rules were ambiguous; using generic names");
            let labels = (1..=SEGMENT_COUNT)
                .map(|n| format!("Segment {n}"))
                .collect();
            let warning = "Segments could not be named from their characteristics; \
                           showing generic names"
                .to_owned();
            (labels, Some(warning))
        }
    };

    let clusters = labels
        .into_iter()
        .zip(feature_means)
        .zip(sizes)
        .enumerate()
        .map(|(cluster, ((label, feature_means), players))| ClusterSummary {
            cluster,
            label,
            players,
            feature_means,
        })
        .collect();
    let assignments = view
        .iter()
        .zip(fit.assignments)
        .map(|(record, cluster)| SegmentAssignment {
            player_id: record.player_id,
            cluster,
        })
        .collect();

    Ok(Segmentation {
        assignments,
        clusters,
        inertia: fit.inertia,
        warning,
    })
}

/// Names clusters from their mean spend and playtime, `None` when the rules
/// collide or an extreme is shared.
fn characteristic_labels(feature_means: &[Vec<f64>]) -> Option<Vec<String>> {
    let spend = |c: usize| feature_means[c][SegmentFeature::TotalSpentUsd.index()];
    let play_time = |c: usize| feature_means[c][SegmentFeature::PlayTimeHours.index()];
    let clusters = 0..feature_means.len();

    let high_value = unique_extreme(clusters.clone(), |a, b| spend(a).total_cmp(&spend(b)))?;
    if spend(high_value) <= 0.0 {
        return None;
    }
    let low_engagement =
        unique_extreme(clusters.clone(), |a, b| play_time(b).total_cmp(&play_time(a)))?;
    if high_value == low_engagement {
        return None;
    }

    let mut rest = clusters
        .filter(|&c| c != high_value && c != low_engagement)
        .collect::<Vec<_>>();
    if rest.len() != 2 {
        return None;
    }
    rest.sort_by(|&a, &b| play_time(a).total_cmp(&play_time(b)));
    if play_time(rest[0]).total_cmp(&play_time(rest[1])) == Ordering::Equal {
        return None;
    }

    let mut labels = vec![String::new(); feature_means.len()];
    labels[high_value] = HIGH_VALUE.to_owned();
    labels[low_engagement] = LOW_ENGAGEMENT.to_owned();
    labels[rest[0]] = CASUAL_PLAYER.to_owned();
    labels[rest[1]] = ACTIVE_NON_SPENDER.to_owned();
    Some(labels)
}

/// The cluster ranked strictly above every other by `cmp`.
fn unique_extreme<I, F>(clusters: I, cmp: F) -> Option<usize>
where
    I: Iterator<Item = usize> + Clone,
    F: Fn(usize, usize) -> Ordering,
{
    let best = clusters.clone().max_by(|&a, &b| cmp(a, b))?;
    let tied = clusters.filter(|&c| cmp(c, best) == Ordering::Equal).count();
    (tied == 1).then_some(best)
}
