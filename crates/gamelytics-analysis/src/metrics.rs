//! KPI metrics for the dashboard pages.
//!
//! Each struct gathers the figures of one page and is computed from a view in
//! a single call. Ratios are zero-guarded: an empty view yields zeros and
//! empty distributions, never NaN.

use gamelytics_data::{EngagementLevel, FilteredView, PlayerRecord, player::MAX_ACHIEVEMENTS};
use gamelytics_stats::{
    descriptive::{DescriptiveStats, mean_or_zero, ratio_or_zero},
    histogram::Histogram,
};
use serde::Serialize;

use crate::aggregate::{
    GroupSummary, ValueCount, count_where, group_by, mean_by, value_counts, values_of,
};

const AGE_BIN_WIDTH: f64 = 5.0;
const SPEND_BINS: usize = 20;
const DURATION_BINS: usize = 20;
const FPS_BINS: usize = 15;
const FRIENDS_BINS: usize = 20;
const ACHIEVEMENT_BIN_WIDTH: f64 = 5.0;

pub const GUILD_MEMBER: &str = "Member";
pub const NOT_GUILD_MEMBER: &str = "Non-member";

#[must_use]
pub fn guild_label(record: &PlayerRecord) -> &'static str {
    if record.guild_member {
        GUILD_MEMBER
    } else {
        NOT_GUILD_MEMBER
    }
}

/// Distribution summary of one group, as shown by a box plot.
#[derive(Debug, Clone, Serialize)]
pub struct GroupDistribution {
    pub key: String,
    pub stats: DescriptiveStats,
}

fn distribution_by<FK, FV>(
    view: &FilteredView<'_>,
    mut key: FK,
    mut value: FV,
) -> Vec<GroupDistribution>
where
    FK: FnMut(&PlayerRecord) -> String,
    FV: FnMut(&PlayerRecord) -> f64,
{
    let mut groups = std::collections::BTreeMap::<String, Vec<f64>>::new();
    for record in view {
        groups.entry(key(record)).or_default().push(value(record));
    }
    groups
        .into_iter()
        .filter_map(|(key, values)| {
            DescriptiveStats::new(values).map(|stats| GroupDistribution { key, stats })
        })
        .collect()
}

/// Mean of `value` per engagement level, in Low, Medium, High order, for the
/// levels present in the view.
fn mean_by_engagement<FV>(view: &FilteredView<'_>, value: FV) -> Vec<(EngagementLevel, f64)>
where
    FV: FnMut(&PlayerRecord) -> f64,
{
    mean_by(view, |r| r.engagement_level, value)
}

#[derive(Debug, Clone, Serialize)]
pub struct OverviewMetrics {
    pub players: usize,
    pub active_players: usize,
    pub total_revenue: f64,
    pub arpu: f64,
    pub mean_play_time_hours: f64,
    pub mean_sessions_per_week: f64,
    pub retention_rate_pct: f64,
    pub genre_distribution: Vec<ValueCount<String>>,
    pub engagement_distribution: Vec<ValueCount<EngagementLevel>>,
}

impl OverviewMetrics {
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn compute(view: &FilteredView<'_>) -> Self {
        let players = view.len();
        let active_players = count_where(view, |r| r.is_active);
        let total_revenue = values_of(view, |r| r.total_spent_usd).iter().sum::<f64>();
        Self {
            players,
            active_players,
            total_revenue,
            arpu: ratio_or_zero(total_revenue, players as f64),
            mean_play_time_hours: mean_or_zero(&values_of(view, |r| r.play_time_hours)),
            mean_sessions_per_week: mean_or_zero(&values_of(view, |r| {
                f64::from(r.sessions_per_week)
            })),
            retention_rate_pct: ratio_or_zero(active_players as f64, players as f64) * 100.0,
            genre_distribution: value_counts(view, |r| r.game_genre.clone()),
            engagement_distribution: value_counts(view, |r| r.engagement_level),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerMetrics {
    pub players: usize,
    pub mean_age: f64,
    pub age_histogram: Histogram,
    pub gender_distribution: Vec<ValueCount<String>>,
    pub location_distribution: Vec<ValueCount<String>>,
    pub device_distribution: Vec<ValueCount<String>>,
    pub mean_level_by_engagement: Vec<(EngagementLevel, f64)>,
    pub mean_play_time_by_engagement: Vec<(EngagementLevel, f64)>,
}

impl PlayerMetrics {
    #[must_use]
    pub fn compute(view: &FilteredView<'_>) -> Self {
        let ages = values_of(view, |r| f64::from(r.age));
        Self {
            players: view.len(),
            mean_age: mean_or_zero(&ages),
            age_histogram: Histogram::with_bin_width(ages, AGE_BIN_WIDTH),
            gender_distribution: value_counts(view, |r| r.gender.clone()),
            location_distribution: value_counts(view, |r| r.location.clone()),
            device_distribution: value_counts(view, |r| r.device.clone()),
            mean_level_by_engagement: mean_by_engagement(view, |r| f64::from(r.player_level)),
            mean_play_time_by_engagement: mean_by_engagement(view, |r| r.play_time_hours),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RevenueMetrics {
    pub paying_players: usize,
    pub conversion_pct: f64,
    /// Average revenue per paying user.
    pub arppu: f64,
    /// Average revenue per user.
    pub arpu: f64,
    /// Lifetime value; equal to ARPU in this model.
    pub ltv: f64,
    pub median_ltv: f64,
    pub total_revenue: f64,
    /// Mean spend per device, highest first.
    pub spend_by_device: Vec<GroupSummary<String>>,
    pub spend_by_engagement: Vec<(EngagementLevel, f64)>,
    pub paying_spend_histogram: Histogram,
}

impl RevenueMetrics {
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn compute(view: &FilteredView<'_>) -> Self {
        let players = view.len();
        let spend = values_of(view, |r| r.total_spent_usd);
        let paying = view.filter(|r| r.has_purchased);
        let paying_spend = values_of(&paying, |r| r.total_spent_usd);
        let total_revenue = spend.iter().sum::<f64>();
        let arpu = ratio_or_zero(total_revenue, players as f64);

        let mut spend_by_device = group_by(view, |r| r.device.clone(), |r| r.total_spent_usd);
        spend_by_device.sort_by(|a, b| b.mean.total_cmp(&a.mean));

        Self {
            paying_players: paying.len(),
            conversion_pct: ratio_or_zero(paying.len() as f64, players as f64) * 100.0,
            arppu: mean_or_zero(&paying_spend),
            arpu,
            ltv: arpu,
            median_ltv: DescriptiveStats::new(spend).map_or(0.0, |s| s.median),
            total_revenue,
            spend_by_device,
            spend_by_engagement: mean_by_engagement(view, |r| r.total_spent_usd),
            paying_spend_histogram: Histogram::new(paying_spend, SPEND_BINS),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionMetrics {
    pub mean_sessions_per_week: f64,
    pub mean_session_duration_minutes: f64,
    pub sessions_histogram: Histogram,
    pub duration_histogram: Histogram,
    /// Mean playtime by days since signup, ordered by day.
    pub play_time_by_days_since_signup: Vec<(u32, f64)>,
    pub duration_by_guild: Vec<GroupDistribution>,
}

impl SessionMetrics {
    #[must_use]
    pub fn compute(view: &FilteredView<'_>) -> Self {
        let sessions = values_of(view, |r| f64::from(r.sessions_per_week));
        let durations = values_of(view, |r| f64::from(r.avg_session_duration_minutes));
        Self {
            mean_sessions_per_week: mean_or_zero(&sessions),
            mean_session_duration_minutes: mean_or_zero(&durations),
            sessions_histogram: Histogram::with_bin_width(sessions, 1.0),
            duration_histogram: Histogram::new(durations, DURATION_BINS),
            play_time_by_days_since_signup: crate::retention::playtime_by_days_since_signup(view),
            duration_by_guild: distribution_by(
                view,
                |r| guild_label(r).to_owned(),
                |r| f64::from(r.avg_session_duration_minutes),
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AchievementMetrics {
    pub mean_unlocked: f64,
    pub max_unlocked: u32,
    pub total_unlocked: u64,
    /// Unlocked share of all achievements available to the view, in `[0, 100]`.
    pub completion_rate_pct: f64,
    pub histogram: Histogram,
    pub mean_unlocked_by_engagement: Vec<(EngagementLevel, f64)>,
}

impl AchievementMetrics {
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn compute(view: &FilteredView<'_>) -> Self {
        let unlocked = values_of(view, |r| f64::from(r.achievements_unlocked));
        let total_unlocked = view
            .iter()
            .map(|r| u64::from(r.achievements_unlocked))
            .sum::<u64>();
        let available = view.len() as f64 * f64::from(MAX_ACHIEVEMENTS);
        Self {
            mean_unlocked: mean_or_zero(&unlocked),
            max_unlocked: view.iter().map(|r| r.achievements_unlocked).max().unwrap_or(0),
            total_unlocked,
            completion_rate_pct: ratio_or_zero(total_unlocked as f64, available) * 100.0,
            histogram: Histogram::with_bin_width(unlocked, ACHIEVEMENT_BIN_WIDTH),
            mean_unlocked_by_engagement: mean_by_engagement(view, |r| {
                f64::from(r.achievements_unlocked)
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DevicePerformance {
    pub device: String,
    pub players: usize,
    pub mean_fps: f64,
    pub mean_crashes: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TechnicalMetrics {
    pub mean_fps: f64,
    pub min_fps: f64,
    pub max_fps: f64,
    pub total_crashes: u64,
    pub mean_crashes: f64,
    pub fps_histogram: Histogram,
    /// Players per crash count, ordered by crash count.
    pub crash_distribution: Vec<(u32, usize)>,
    pub by_device: Vec<DevicePerformance>,
    pub mean_crashes_by_guild: Vec<(&'static str, f64)>,
}

impl TechnicalMetrics {
    #[must_use]
    pub fn compute(view: &FilteredView<'_>) -> Self {
        let fps = values_of(view, |r| r.avg_fps);
        let fps_stats = DescriptiveStats::new(fps.iter().copied());
        let crashes = values_of(view, |r| f64::from(r.crash_count));

        let fps_by_device = group_by(view, |r| r.device.clone(), |r| r.avg_fps);
        let crashes_by_device = mean_by(view, |r| r.device.clone(), |r| f64::from(r.crash_count));
        let by_device = fps_by_device
            .into_iter()
            .zip(crashes_by_device)
            .map(|(fps, (_, mean_crashes))| DevicePerformance {
                device: fps.key,
                players: fps.count,
                mean_fps: fps.mean,
                mean_crashes,
            })
            .collect();

        let mut crash_distribution = group_by(view, |r| r.crash_count, |_| 0.0)
            .into_iter()
            .map(|group| (group.key, group.count))
            .collect::<Vec<_>>();
        crash_distribution.sort_by_key(|(crashes, _)| *crashes);

        Self {
            mean_fps: fps_stats.as_ref().map_or(0.0, |s| s.mean),
            min_fps: fps_stats.as_ref().map_or(0.0, |s| s.min),
            max_fps: fps_stats.as_ref().map_or(0.0, |s| s.max),
            total_crashes: view.iter().map(|r| u64::from(r.crash_count)).sum(),
            mean_crashes: mean_or_zero(&crashes),
            fps_histogram: Histogram::new(fps, FPS_BINS),
            crash_distribution,
            by_device,
            mean_crashes_by_guild: mean_by(view, guild_label, |r| f64::from(r.crash_count)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SocialMetrics {
    pub mean_friends: f64,
    pub max_friends: u32,
    pub guild_members: usize,
    pub guild_share_pct: f64,
    pub friends_histogram: Histogram,
    pub play_time_by_guild: Vec<GroupDistribution>,
    /// Spend distribution by guild membership, spenders only.
    pub spend_by_guild: Vec<GroupDistribution>,
}

impl SocialMetrics {
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn compute(view: &FilteredView<'_>) -> Self {
        let friends = values_of(view, |r| f64::from(r.friends_count));
        let guild_members = count_where(view, |r| r.guild_member);
        let spenders = view.filter(|r| r.total_spent_usd > 0.0);
        Self {
            mean_friends: mean_or_zero(&friends),
            max_friends: view.iter().map(|r| r.friends_count).max().unwrap_or(0),
            guild_members,
            guild_share_pct: ratio_or_zero(guild_members as f64, view.len() as f64) * 100.0,
            friends_histogram: Histogram::new(friends, FRIENDS_BINS),
            play_time_by_guild: distribution_by(
                view,
                |r| guild_label(r).to_owned(),
                |r| r.play_time_hours,
            ),
            spend_by_guild: distribution_by(
                &spenders,
                |r| guild_label(r).to_owned(),
                |r| r.total_spent_usd,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use gamelytics_data::Dataset;

    use super::*;
    use crate::fixtures::player;

    fn dataset() -> Dataset {
        let records = (0..10_u64)
            .map(|id| PlayerRecord {
                is_active: id < 7,
                has_purchased: id < 2,
                total_spent_usd: match id {
                    0 => 30.0,
                    1 => 10.0,
                    _ => 0.0,
                },
                device: if id % 2 == 0 { "PC" } else { "iOS" }.to_owned(),
                guild_member: id < 3,
                crash_count: u32::try_from(id % 3).unwrap(),
                achievements_unlocked: 5,
                avg_fps: 40.0 + f64::from(u32::try_from(id).unwrap()),
                ..player(id)
            })
            .collect();
        Dataset::new(records)
    }

    #[test]
    fn test_overview() {
        let dataset = dataset();
        let metrics = OverviewMetrics::compute(&FilteredView::all(&dataset));
        assert_eq!(metrics.players, 10);
        assert_eq!(metrics.active_players, 7);
        assert_eq!(metrics.total_revenue, 40.0);
        assert_eq!(metrics.arpu, 4.0);
        assert!((metrics.retention_rate_pct - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_revenue() {
        let dataset = dataset();
        let metrics = RevenueMetrics::compute(&FilteredView::all(&dataset));
        assert_eq!(metrics.paying_players, 2);
        assert!((metrics.conversion_pct - 20.0).abs() < 1e-9);
        assert_eq!(metrics.arppu, 20.0);
        assert_eq!(metrics.ltv, metrics.arpu);
        assert_eq!(metrics.median_ltv, 0.0);
        assert_eq!(metrics.spend_by_device[0].key, "PC");
        assert_eq!(metrics.paying_spend_histogram.total(), 2);
    }

    #[test]
    fn test_achievements_and_technical() {
        let dataset = dataset();
        let view = FilteredView::all(&dataset);
        let achievements = AchievementMetrics::compute(&view);
        assert_eq!(achievements.total_unlocked, 50);
        assert!((achievements.completion_rate_pct - 10.0).abs() < 1e-9);

        let technical = TechnicalMetrics::compute(&view);
        assert_eq!(technical.min_fps, 40.0);
        assert_eq!(technical.max_fps, 49.0);
        assert_eq!(technical.total_crashes, 9);
        assert_eq!(technical.crash_distribution, [(0, 4), (1, 3), (2, 3)]);
        assert_eq!(technical.by_device.len(), 2);
    }

    #[test]
    fn test_social() {
        let dataset = dataset();
        let metrics = SocialMetrics::compute(&FilteredView::all(&dataset));
        assert_eq!(metrics.guild_members, 3);
        assert!((metrics.guild_share_pct - 30.0).abs() < 1e-9);
        let spenders = metrics
            .spend_by_guild
            .iter()
            .map(|g| g.stats.count)
            .sum::<usize>();
        assert_eq!(spenders, 2);
    }

    #[test]
    fn test_empty_view_reports_zeros() {
        let view = FilteredView::default();
        let overview = OverviewMetrics::compute(&view);
        assert_eq!(overview.players, 0);
        assert_eq!(overview.arpu, 0.0);
        assert_eq!(overview.retention_rate_pct, 0.0);

        let revenue = RevenueMetrics::compute(&view);
        assert_eq!(revenue.arppu, 0.0);
        assert_eq!(revenue.median_ltv, 0.0);
        assert!(revenue.paying_spend_histogram.bins.is_empty());

        let technical = TechnicalMetrics::compute(&view);
        assert_eq!(technical.mean_fps, 0.0);
        assert!(technical.by_device.is_empty());

        let achievements = AchievementMetrics::compute(&view);
        assert_eq!(achievements.completion_rate_pct, 0.0);
        assert_eq!(achievements.max_unlocked, 0);

        let social = SocialMetrics::compute(&view);
        assert_eq!(social.guild_share_pct, 0.0);
        assert!(SessionMetrics::compute(&view).duration_by_guild.is_empty());
        assert!(PlayerMetrics::compute(&view).gender_distribution.is_empty());
    }
}
