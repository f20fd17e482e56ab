//! Report command
//!
//! Runs every analysis over the filtered dataset and prints the results as
//! text tables, or as a single JSON document with `--json`.

use std::path::PathBuf;

use gamelytics_analysis::{
    AnalysisError,
    ab_test::{self, AbMetric, AbTestResult},
    cohort::{self, CohortMatrix},
    metrics::{
        AchievementMetrics, OverviewMetrics, PlayerMetrics, RevenueMetrics, SessionMetrics,
        SocialMetrics, TechnicalMetrics,
    },
    retention::{self, RetentionCurve, RetentionSegment},
    segmentation::{self, Segmentation},
};
use gamelytics_data::{FilterSpec, FilteredView};
use serde::Serialize;

use crate::{command::FilterArg, util};

mod text;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ReportArg {
    /// Dataset CSV file path
    dataset: PathBuf,
    #[clap(flatten)]
    pub(super) filter: FilterArg,
    /// Dimension splitting the retention curves
    /// (Overall, Device, GameGenre, EngagementLevel, GameDifficulty)
    #[arg(long, default_value_t = RetentionSegment::Overall)]
    segment_by: RetentionSegment,
    /// Metric compared by the A/B test (Conversion, Spending, PlayTime)
    #[arg(long, default_value_t = AbMetric::Conversion)]
    ab_metric: AbMetric,
    /// Seed of the player segmentation
    #[arg(long, default_value_t = segmentation::DEFAULT_SEED)]
    seed: u64,
    /// Print JSON instead of text tables
    #[arg(long)]
    json: bool,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Report {
    pub filter: FilterSpec,
    pub overview: OverviewMetrics,
    pub players: PlayerMetrics,
    pub revenue: RevenueMetrics,
    pub sessions: SessionMetrics,
    pub achievements: AchievementMetrics,
    pub technical: TechnicalMetrics,
    pub social: SocialMetrics,
    pub retention: Result<RetentionCurve, AnalysisError>,
    pub cohorts: Result<CohortMatrix, AnalysisError>,
    pub segmentation: Result<Segmentation, AnalysisError>,
    pub ab_test: Result<AbTestResult, AnalysisError>,
}

impl Report {
    fn compute(
        filter: FilterSpec,
        view: &FilteredView<'_>,
        segment_by: RetentionSegment,
        ab_metric: AbMetric,
        seed: u64,
    ) -> Self {
        Self {
            filter,
            overview: OverviewMetrics::compute(view),
            players: PlayerMetrics::compute(view),
            revenue: RevenueMetrics::compute(view),
            sessions: SessionMetrics::compute(view),
            achievements: AchievementMetrics::compute(view),
            technical: TechnicalMetrics::compute(view),
            social: SocialMetrics::compute(view),
            retention: retention::retention_curve(view, segment_by),
            cohorts: cohort::weekly_cohorts(view),
            segmentation: segmentation::segment_players(view, seed),
            ab_test: ab_test::ab_test(view, ab_metric),
        }
    }
}

pub(crate) fn run(arg: &ReportArg) -> anyhow::Result<()> {
    let ReportArg {
        dataset,
        filter,
        segment_by,
        ab_metric,
        seed,
        json,
        output,
    } = arg;

    let session = util::load_session(dataset)?;
    let spec = filter.to_spec();
    let view = session.view(&spec);
    log::info!("Analyzing {} of {} players", view.len(), session.dataset().len());

    let report = Report::compute(spec, &view, *segment_by, *ab_metric, *seed);
    if *json {
        util::Output::save_json(&report, output.clone())?;
    } else {
        let mut output = util::Output::from_output_path(output.clone())?;
        text::write_report(&mut output, &report)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use gamelytics_data::generator::{self, GeneratorConfig};

    use super::*;

    #[test]
    fn test_report_serializes_errors_in_place() {
        let config = GeneratorConfig {
            players: 3,
            ..GeneratorConfig::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
        };
        let dataset = generator::generate(&config).unwrap();
        let view = FilteredView::all(&dataset);
        let report = Report::compute(
            FilterSpec::default(),
            &view,
            RetentionSegment::Device,
            AbMetric::Spending,
            7,
        );
        assert!(report.retention.is_ok());
        assert_eq!(
            report.segmentation,
            Err(AnalysisError::InsufficientData {
                required: 4,
                actual: 3
            })
        );

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["overview"]["players"], 3);
        assert_eq!(
            json["segmentation"]["Err"]["InsufficientData"]["required"],
            4
        );
    }

    #[test]
    fn test_text_report_on_empty_view() {
        let dataset = gamelytics_data::Dataset::default();
        let view = FilteredView::all(&dataset);
        let report = Report::compute(
            FilterSpec::default(),
            &view,
            RetentionSegment::Overall,
            AbMetric::Conversion,
            42,
        );
        let mut buf = vec![];
        text::write_report(&mut buf, &report).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Players: 0"));
        assert!(text.contains("no players match the current filters"));
    }
}
