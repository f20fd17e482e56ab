//! Retention curves by days since signup.
//!
//! The curve is the share of active players among those who signed up a
//! given number of days ago, optionally split into one curve per segment.

use gamelytics_data::{FilteredView, PlayerRecord};
use serde::Serialize;

use crate::{AnalysisError, aggregate::group_by};

/// Dimension along which retention curves are split.
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
pub enum RetentionSegment {
    #[default]
    Overall,
    Device,
    GameGenre,
    EngagementLevel,
    GameDifficulty,
}

impl RetentionSegment {
    pub const ALL: [Self; 5] = [
        Self::Overall,
        Self::Device,
        Self::GameGenre,
        Self::EngagementLevel,
        Self::GameDifficulty,
    ];

    /// Segment name of `record` along this dimension.
    #[must_use]
    pub fn key(self, record: &PlayerRecord) -> String {
        match self {
            Self::Overall => "All".to_owned(),
            Self::Device => record.device.clone(),
            Self::GameGenre => record.game_genre.clone(),
            Self::EngagementLevel => record.engagement_level.to_string(),
            Self::GameDifficulty => record.game_difficulty.to_string(),
        }
    }

    /// The following dimension, wrapping around.
    #[must_use]
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetentionPoint {
    pub segment: String,
    pub day: u32,
    /// Share of active players, in `[0, 100]`.
    pub retention_pct: f64,
    pub players: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetentionCurve {
    pub segmentation: RetentionSegment,
    /// Points ordered by segment, then day.
    pub points: Vec<RetentionPoint>,
}

impl RetentionCurve {
    /// Distinct segment names, in order.
    #[must_use]
    pub fn segments(&self) -> Vec<&str> {
        let mut segments = self
            .points
            .iter()
            .map(|p| p.segment.as_str())
            .collect::<Vec<_>>();
        segments.dedup();
        segments
    }

    pub fn points_for<'a>(&'a self, segment: &'a str) -> impl Iterator<Item = &'a RetentionPoint> {
        self.points.iter().filter(move |p| p.segment == segment)
    }
}

/// Computes retention by days since signup, split by `segmentation`.
pub fn retention_curve(
    view: &FilteredView<'_>,
    segmentation: RetentionSegment,
) -> Result<RetentionCurve, AnalysisError> {
    if view.is_empty() {
        return Err(AnalysisError::EmptyView);
    }
    let points = group_by(
        view,
        |r| (segmentation.key(r), r.days_since_signup),
        |r| f64::from(u8::from(r.is_active)),
    )
    .into_iter()
    .map(|group| {
        let (segment, day) = group.key;
        RetentionPoint {
            segment,
            day,
            retention_pct: group.mean * 100.0,
            players: group.count,
        }
    })
    .collect();
    Ok(RetentionCurve {
        segmentation,
        points,
    })
}

/// Mean playtime of players grouped by days since signup, ordered by day.
#[must_use]
pub fn playtime_by_days_since_signup(view: &FilteredView<'_>) -> Vec<(u32, f64)> {
    crate::aggregate::mean_by(view, |r| r.days_since_signup, |r| r.play_time_hours)
}

#[cfg(test)]
mod tests {
    use gamelytics_data::Dataset;

    use super::*;
    use crate::fixtures::player;

    fn dataset() -> Dataset {
        let records = (0..60_u64)
            .map(|id| PlayerRecord {
                device: ["PC", "iOS", "Android"][(id % 3) as usize].to_owned(),
                days_since_signup: u32::try_from(id % 4).unwrap(),
                is_active: id % 5 != 0,
                ..player(id)
            })
            .collect();
        Dataset::new(records)
    }

    #[test]
    fn test_percentages_within_bounds() {
        let dataset = dataset();
        let view = FilteredView::all(&dataset);
        for segmentation in RetentionSegment::ALL {
            let curve = retention_curve(&view, segmentation).unwrap();
            assert!(
                curve
                    .points
                    .iter()
                    .all(|p| (0.0..=100.0).contains(&p.retention_pct))
            );
            let total = curve.points.iter().map(|p| p.players).sum::<usize>();
            assert_eq!(total, dataset.len());
        }
    }

    #[test]
    fn test_overall_curve_values() {
        let dataset = dataset();
        let curve =
            retention_curve(&FilteredView::all(&dataset), RetentionSegment::Overall).unwrap();
        assert_eq!(curve.segments(), ["All"]);
        let days = curve.points.iter().map(|p| p.day).collect::<Vec<_>>();
        assert_eq!(days, [0, 1, 2, 3]);
        // day 0: ids 0, 4, 8, ..., 56; inactive when divisible by 5 (0, 20, 40)
        assert_eq!(curve.points[0].players, 15);
        assert!((curve.points[0].retention_pct - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_segment_curve_equals_prefiltered_curve() {
        let dataset = dataset();
        let view = FilteredView::all(&dataset);
        let by_device = retention_curve(&view, RetentionSegment::Device).unwrap();
        for segment in by_device.segments() {
            let prefiltered = view.filter(|r| r.device == segment);
            let overall = retention_curve(&prefiltered, RetentionSegment::Overall).unwrap();
            let segmented = by_device.points_for(segment).collect::<Vec<_>>();
            assert_eq!(segmented.len(), overall.points.len());
            for (a, b) in segmented.iter().zip(&overall.points) {
                assert_eq!(a.day, b.day);
                assert_eq!(a.players, b.players);
                assert!((a.retention_pct - b.retention_pct).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_empty_view() {
        assert_eq!(
            retention_curve(&FilteredView::default(), RetentionSegment::Overall),
            Err(AnalysisError::EmptyView)
        );
    }

    #[test]
    fn test_segment_cycle_wraps() {
        assert_eq!(RetentionSegment::Overall.next(), RetentionSegment::Device);
        assert_eq!(RetentionSegment::GameDifficulty.next(), RetentionSegment::Overall);
    }
}
