//! Plain-text rendering of a [`Report`].

use std::{
    fmt::Display,
    io::{self, Write},
};

use gamelytics_analysis::{
    AnalysisError,
    ab_test::{AbTestResult, EffectSize},
    aggregate::ValueCount,
    cohort::CohortMatrix,
    retention::RetentionCurve,
    segmentation::{SegmentFeature, Segmentation},
};
use gamelytics_stats::descriptive::ratio_or_zero;

use super::Report;

const RETENTION_BUCKETS: [(u32, u32); 5] = [(0, 7), (8, 30), (31, 90), (91, 180), (181, u32::MAX)];
const MAX_COHORT_ROWS: usize = 12;
const MAX_COHORT_COLUMNS: usize = 8;
const MAX_DISTRIBUTION_ROWS: usize = 10;

fn section<W: Write>(w: &mut W, title: &str) -> io::Result<()> {
    writeln!(w)?;
    writeln!(w, "{title}")?;
    writeln!(w, "{}", "=".repeat(title.len()))
}

fn distribution<W, K>(w: &mut W, label: &str, counts: &[ValueCount<K>]) -> io::Result<()>
where
    W: Write,
    K: Display,
{
    writeln!(w, "  {label}:")?;
    for count in counts.iter().take(MAX_DISTRIBUTION_ROWS) {
        writeln!(
            w,
            "    {:<20} {:>8} {:>7.1}%",
            count.key.to_string(),
            count.count,
            count.share * 100.0
        )?;
    }
    Ok(())
}

fn unavailable<W: Write>(w: &mut W, error: &AnalysisError) -> io::Result<()> {
    writeln!(w, "  Not available: {error}")
}

pub(super) fn write_report<W: Write>(w: &mut W, report: &Report) -> io::Result<()> {
    writeln!(w, "Gamelytics Report")?;
    writeln!(w, "=================")?;
    let filter = &report.filter;
    writeln!(
        w,
        "Filters: genre={} difficulty={} device={} location={}",
        filter.genre, filter.difficulty, filter.device, filter.location
    )?;
    if filter.signup_from.is_some() || filter.signup_to.is_some() {
        let date = |d: Option<chrono::NaiveDate>| d.map_or("-".to_owned(), |d| d.to_string());
        writeln!(
            w,
            "Signup: {} to {}",
            date(filter.signup_from),
            date(filter.signup_to)
        )?;
    }

    write_overview(w, report)?;
    write_revenue(w, report)?;
    write_engagement(w, report)?;

    section(w, "Retention")?;
    match &report.retention {
        Ok(curve) => write_retention(w, curve)?,
        Err(error) => unavailable(w, error)?,
    }

    section(w, "Weekly Cohorts")?;
    match &report.cohorts {
        Ok(matrix) => write_cohorts(w, matrix)?,
        Err(error) => unavailable(w, error)?,
    }

    section(w, "Player Segments")?;
    match &report.segmentation {
        Ok(segmentation) => write_segmentation(w, segmentation)?,
        Err(error) => unavailable(w, error)?,
    }

    section(w, "A/B Test")?;
    match &report.ab_test {
        Ok(result) => write_ab_test(w, result)?,
        Err(error) => unavailable(w, error)?,
    }
    w.flush()
}

fn write_overview<W: Write>(w: &mut W, report: &Report) -> io::Result<()> {
    let overview = &report.overview;
    section(w, "Overview")?;
    writeln!(w, "  Players: {}", overview.players)?;
    writeln!(w, "  Active players: {}", overview.active_players)?;
    writeln!(w, "  Retention rate: {:.1}%", overview.retention_rate_pct)?;
    writeln!(w, "  Mean playtime: {:.1} h", overview.mean_play_time_hours)?;
    writeln!(
        w,
        "  Mean sessions/week: {:.1}",
        overview.mean_sessions_per_week
    )?;
    distribution(w, "Genres", &overview.genre_distribution)?;
    distribution(w, "Engagement", &overview.engagement_distribution)?;
    distribution(w, "Gender", &report.players.gender_distribution)?;
    writeln!(w, "  Mean age: {:.1}", report.players.mean_age)
}

fn write_revenue<W: Write>(w: &mut W, report: &Report) -> io::Result<()> {
    let revenue = &report.revenue;
    section(w, "Revenue")?;
    writeln!(w, "  Total revenue: ${:.2}", revenue.total_revenue)?;
    writeln!(
        w,
        "  Paying players: {} ({:.1}%)",
        revenue.paying_players, revenue.conversion_pct
    )?;
    writeln!(w, "  ARPU: ${:.2}", revenue.arpu)?;
    writeln!(w, "  ARPPU: ${:.2}", revenue.arppu)?;
    writeln!(w, "  LTV: ${:.2} (median ${:.2})", revenue.ltv, revenue.median_ltv)?;
    writeln!(w, "  Mean spend by device:")?;
    for group in &revenue.spend_by_device {
        writeln!(w, "    {:<20} ${:>9.2}", group.key, group.mean)?;
    }
    writeln!(w, "  Mean spend by engagement:")?;
    for (level, mean) in &revenue.spend_by_engagement {
        writeln!(w, "    {:<20} ${mean:>9.2}", level.to_string())?;
    }
    Ok(())
}

fn write_engagement<W: Write>(w: &mut W, report: &Report) -> io::Result<()> {
    section(w, "Engagement")?;
    let sessions = &report.sessions;
    writeln!(
        w,
        "  Mean session duration: {:.1} min",
        sessions.mean_session_duration_minutes
    )?;
    for group in &sessions.duration_by_guild {
        writeln!(
            w,
            "    {:<20} median {:>6.1} min, mean {:>6.1} min",
            group.key, group.stats.median, group.stats.mean
        )?;
    }

    let achievements = &report.achievements;
    writeln!(
        w,
        "  Achievements: mean {:.1}, max {}, completion {:.1}%",
        achievements.mean_unlocked, achievements.max_unlocked, achievements.completion_rate_pct
    )?;

    let technical = &report.technical;
    writeln!(
        w,
        "  FPS: mean {:.1} (min {:.1}, max {:.1})",
        technical.mean_fps, technical.min_fps, technical.max_fps
    )?;
    writeln!(
        w,
        "  Crashes: total {}, mean {:.2}",
        technical.total_crashes, technical.mean_crashes
    )?;
    for device in &technical.by_device {
        writeln!(
            w,
            "    {:<20} {:>6.1} fps {:>6.2} crashes",
            device.device, device.mean_fps, device.mean_crashes
        )?;
    }

    let social = &report.social;
    writeln!(
        w,
        "  Friends: mean {:.1}, max {}",
        social.mean_friends, social.max_friends
    )?;
    writeln!(
        w,
        "  Guild members: {} ({:.1}%)",
        social.guild_members, social.guild_share_pct
    )
}

/// Retention averaged over day ranges, weighted by players.
#[expect(clippy::cast_precision_loss)]
fn write_retention<W: Write>(w: &mut W, curve: &RetentionCurve) -> io::Result<()> {
    write!(w, "  {:<20}", curve.segmentation.to_string())?;
    for (from, to) in RETENTION_BUCKETS {
        let label = if to == u32::MAX {
            format!("{from}+ d")
        } else {
            format!("{from}-{to} d")
        };
        write!(w, " {label:>10}")?;
    }
    writeln!(w)?;

    for segment in curve.segments() {
        write!(w, "  {segment:<20}")?;
        for (from, to) in RETENTION_BUCKETS {
            let (active, players) = curve
                .points_for(segment)
                .filter(|p| (from..=to).contains(&p.day))
                .fold((0.0, 0), |(active, players), p| {
                    (active + p.retention_pct * p.players as f64, players + p.players)
                });
            if players == 0 {
                write!(w, " {:>10}", "-")?;
            } else {
                write!(w, " {:>9.1}%", ratio_or_zero(active, players as f64))?;
            }
        }
        writeln!(w)?;
    }
    Ok(())
}

fn write_cohorts<W: Write>(w: &mut W, matrix: &CohortMatrix) -> io::Result<()> {
    write!(w, "  {:<12} {:>6}", "Week", "Size")?;
    for age in matrix.ages.iter().take(MAX_COHORT_COLUMNS) {
        write!(w, " {:>6}", format!("W{age}"))?;
    }
    writeln!(w)?;

    let rows = matrix
        .signup_weeks
        .iter()
        .zip(&matrix.cohort_sizes)
        .zip(&matrix.retention_pct);
    let skip = matrix.signup_weeks.len().saturating_sub(MAX_COHORT_ROWS);
    for ((week, size), pct) in rows.skip(skip) {
        write!(w, "  {week:<12} {size:>6}")?;
        for value in pct.iter().take(MAX_COHORT_COLUMNS) {
            write!(w, " {value:>5.1}%")?;
        }
        writeln!(w)?;
    }
    if skip > 0 {
        writeln!(w, "  ({skip} earlier cohorts omitted)")?;
    }
    if matrix.dropped_records > 0 {
        writeln!(
            w,
            "  {} records with last activity before signup were dropped",
            matrix.dropped_records
        )?;
    }
    Ok(())
}

fn write_segmentation<W: Write>(w: &mut W, segmentation: &Segmentation) -> io::Result<()> {
    if let Some(warning) = &segmentation.warning {
        writeln!(w, "  Warning: {warning}")?;
    }
    write!(w, "  {:<20} {:>8}", "Segment", "Players")?;
    for feature in SegmentFeature::ALL {
        write!(w, " {:>12}", abbreviate(&feature.to_string()))?;
    }
    writeln!(w)?;
    for cluster in &segmentation.clusters {
        write!(w, "  {:<20} {:>8}", cluster.label, cluster.players)?;
        for feature in SegmentFeature::ALL {
            write!(w, " {:>12.1}", cluster.mean_of(feature))?;
        }
        writeln!(w)?;
    }
    Ok(())
}

fn abbreviate(name: &str) -> String {
    name.chars().take(12).collect()
}

fn write_ab_test<W: Write>(w: &mut W, result: &AbTestResult) -> io::Result<()> {
    writeln!(w, "  Metric: {}", result.metric.description())?;
    for group in [&result.group_a, &result.group_b] {
        writeln!(
            w,
            "  Group {}: {} players, mean {:.4}, std dev {:.4}",
            group.group, group.players, group.mean, group.std_dev
        )?;
    }
    writeln!(
        w,
        "  Statistic {:.4}, p-value {:.4}, {}",
        result.statistic,
        result.p_value,
        if result.significant {
            "significant"
        } else {
            "not significant"
        }
    )?;
    match result.effect {
        EffectSize::OddsRatio(ratio) => writeln!(w, "  Odds ratio: {ratio:.3}")?,
        EffectSize::CohensD(d) => writeln!(w, "  Cohen's d: {d:.3}")?,
    }
    let ci = &result.confidence_interval;
    writeln!(
        w,
        "  {:.0}% CI of B - A: [{:.4}, {:.4}]",
        ci.level * 100.0,
        ci.lower,
        ci.upper
    )?;
    writeln!(w, "  {}", result.interpretation)
}
