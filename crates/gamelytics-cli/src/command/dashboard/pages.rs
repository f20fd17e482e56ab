use gamelytics_analysis::{
    AnalysisError,
    ab_test::{self, AbMetric, AbTestResult, EffectSize},
    cohort::{self, CohortMatrix},
    metrics::{
        AchievementMetrics, GroupDistribution, OverviewMetrics, PlayerMetrics, RevenueMetrics,
        SessionMetrics, SocialMetrics, TechnicalMetrics,
    },
    retention::{self, RetentionCurve, RetentionSegment},
    segmentation::{self, SegmentFeature, Segmentation},
};
use gamelytics_data::FilteredView;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::merge::MergeStrategy,
    text::Line,
    widgets::{Block, Cell, Row, Table},
};

use super::widgets::{
    HistogramChart, KpiRow, LabeledBars, LineChart, Notice, SERIES_COLORS, Series, TextPanel,
};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Page {
    #[default]
    Overview,
    Players,
    Revenue,
    Sessions,
    Achievements,
    Technical,
    Social,
    Retention,
    Segments,
    AbTest,
}

impl Page {
    pub const ALL: [Self; 10] = [
        Self::Overview,
        Self::Players,
        Self::Revenue,
        Self::Sessions,
        Self::Achievements,
        Self::Technical,
        Self::Social,
        Self::Retention,
        Self::Segments,
        Self::AbTest,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::Players => "Players",
            Self::Revenue => "Revenue",
            Self::Sessions => "Sessions",
            Self::Achievements => "Achievements",
            Self::Technical => "Technical",
            Self::Social => "Social",
            Self::Retention => "Retention",
            Self::Segments => "Segments",
            Self::AbTest => "A/B Test",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Page bound to a digit key: `1`..`9` then `0` for the tenth.
    pub fn from_digit(digit: char) -> Option<Self> {
        let n = digit.to_digit(10)?;
        let idx = if n == 0 { 9 } else { n - 1 };
        Self::ALL.get(usize::try_from(idx).ok()?).copied()
    }
}

/// Parameters of the page analyses other than the filter.
#[derive(Debug, Clone, Copy)]
pub(super) struct PageParams {
    pub retention_segment: RetentionSegment,
    pub ab_metric: AbMetric,
    pub seed: u64,
}

/// Analysis results of one page, computed when the page or filter changes.
#[derive(Debug)]
pub(super) enum PageContent {
    Overview(OverviewMetrics),
    Players(PlayerMetrics),
    Revenue(RevenueMetrics),
    Sessions(SessionMetrics),
    Achievements(AchievementMetrics),
    Technical(TechnicalMetrics),
    Social(SocialMetrics),
    Retention {
        curve: Result<RetentionCurve, AnalysisError>,
        cohorts: Result<CohortMatrix, AnalysisError>,
    },
    Segments(Result<Segmentation, AnalysisError>),
    AbTest(Result<AbTestResult, AnalysisError>),
}

impl PageContent {
    pub fn compute(page: Page, view: &FilteredView<'_>, params: PageParams) -> Self {
        match page {
            Page::Overview => Self::Overview(OverviewMetrics::compute(view)),
            Page::Players => Self::Players(PlayerMetrics::compute(view)),
            Page::Revenue => Self::Revenue(RevenueMetrics::compute(view)),
            Page::Sessions => Self::Sessions(SessionMetrics::compute(view)),
            Page::Achievements => Self::Achievements(AchievementMetrics::compute(view)),
            Page::Technical => Self::Technical(TechnicalMetrics::compute(view)),
            Page::Social => Self::Social(SocialMetrics::compute(view)),
            Page::Retention => Self::Retention {
                curve: retention::retention_curve(view, params.retention_segment),
                cohorts: cohort::weekly_cohorts(view),
            },
            Page::Segments => Self::Segments(segmentation::segment_players(view, params.seed)),
            Page::AbTest => Self::AbTest(ab_test::ab_test(view, params.ab_metric)),
        }
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        match self {
            Self::Overview(metrics) => draw_overview(frame, area, metrics),
            Self::Players(metrics) => draw_players(frame, area, metrics),
            Self::Revenue(metrics) => draw_revenue(frame, area, metrics),
            Self::Sessions(metrics) => draw_sessions(frame, area, metrics),
            Self::Achievements(metrics) => draw_achievements(frame, area, metrics),
            Self::Technical(metrics) => draw_technical(frame, area, metrics),
            Self::Social(metrics) => draw_social(frame, area, metrics),
            Self::Retention { curve, cohorts } => draw_retention(frame, area, curve, cohorts),
            Self::Segments(segmentation) => draw_segments(frame, area, segmentation),
            Self::AbTest(result) => draw_ab_test(frame, area, result),
        }
    }
}

fn kpi_layout(area: Rect) -> [Rect; 2] {
    Layout::vertical([Constraint::Length(3), Constraint::Fill(1)]).areas(area)
}

fn halves(area: Rect) -> [Rect; 2] {
    Layout::horizontal([Constraint::Fill(1), Constraint::Fill(1)]).areas(area)
}

fn money(value: f64) -> String {
    format!("${value:.2}")
}

fn draw_overview(frame: &mut Frame, area: Rect, metrics: &OverviewMetrics) {
    let [kpi_area, body] = kpi_layout(area);
    let kpis = [
        ("Players", metrics.players.to_string()),
        ("Active", metrics.active_players.to_string()),
        ("Revenue", money(metrics.total_revenue)),
        ("ARPU", money(metrics.arpu)),
        ("Playtime (h)", format!("{:.1}", metrics.mean_play_time_hours)),
        ("Sessions/week", format!("{:.1}", metrics.mean_sessions_per_week)),
        ("Retention", format!("{:.1}%", metrics.retention_rate_pct)),
    ];
    frame.render_widget(KpiRow { kpis: &kpis }, kpi_area);

    let [left, right] = halves(body);
    frame.render_widget(
        LabeledBars::counts("Players by genre", &metrics.genre_distribution),
        left,
    );
    frame.render_widget(
        LabeledBars::counts("Players by engagement", &metrics.engagement_distribution),
        right,
    );
}

fn draw_players(frame: &mut Frame, area: Rect, metrics: &PlayerMetrics) {
    let [kpi_area, body] = kpi_layout(area);
    let kpis = [
        ("Players", metrics.players.to_string()),
        ("Mean age", format!("{:.1}", metrics.mean_age)),
    ];
    frame.render_widget(KpiRow { kpis: &kpis }, kpi_area);

    let [top, bottom] =
        Layout::vertical([Constraint::Fill(1), Constraint::Fill(1)]).areas(body);
    let [age_area, gender_area] = halves(top);
    frame.render_widget(
        HistogramChart {
            title: "Age distribution",
            histogram: &metrics.age_histogram,
        },
        age_area,
    );
    frame.render_widget(
        LabeledBars::counts("Gender", &metrics.gender_distribution),
        gender_area,
    );

    let [location_area, level_area] = halves(bottom);
    frame.render_widget(
        LabeledBars::counts("Top locations", &metrics.location_distribution),
        location_area,
    );
    frame.render_widget(
        LabeledBars {
            title: "Mean level by engagement",
            bars: metrics
                .mean_level_by_engagement
                .iter()
                .map(|(level, mean)| (level.to_string(), *mean))
                .collect(),
            precision: 1,
        },
        level_area,
    );
}

fn draw_revenue(frame: &mut Frame, area: Rect, metrics: &RevenueMetrics) {
    let [kpi_area, body] = kpi_layout(area);
    let kpis = [
        ("Paying players", metrics.paying_players.to_string()),
        ("Conversion", format!("{:.1}%", metrics.conversion_pct)),
        ("ARPPU", money(metrics.arppu)),
        ("ARPU", money(metrics.arpu)),
        ("LTV", money(metrics.ltv)),
        ("Median LTV", money(metrics.median_ltv)),
    ];
    frame.render_widget(KpiRow { kpis: &kpis }, kpi_area);

    let [top, bottom] =
        Layout::vertical([Constraint::Fill(1), Constraint::Fill(1)]).areas(body);
    let [device_area, engagement_area] = halves(top);
    frame.render_widget(
        LabeledBars {
            title: "Mean spend by device",
            bars: metrics
                .spend_by_device
                .iter()
                .map(|g| (g.key.clone(), g.mean))
                .collect(),
            precision: 2,
        },
        device_area,
    );
    frame.render_widget(
        LabeledBars {
            title: "Mean spend by engagement",
            bars: metrics
                .spend_by_engagement
                .iter()
                .map(|(level, mean)| (level.to_string(), *mean))
                .collect(),
            precision: 2,
        },
        engagement_area,
    );
    frame.render_widget(
        HistogramChart {
            title: "Spend of paying players (USD)",
            histogram: &metrics.paying_spend_histogram,
        },
        bottom,
    );
}

fn draw_sessions(frame: &mut Frame, area: Rect, metrics: &SessionMetrics) {
    let [kpi_area, body] = kpi_layout(area);
    let kpis = [
        ("Sessions/week", format!("{:.1}", metrics.mean_sessions_per_week)),
        (
            "Session length (min)",
            format!("{:.1}", metrics.mean_session_duration_minutes),
        ),
    ];
    frame.render_widget(KpiRow { kpis: &kpis }, kpi_area);

    let [top, bottom] =
        Layout::vertical([Constraint::Fill(1), Constraint::Fill(1)]).areas(body);
    let [sessions_area, duration_area] = halves(top);
    frame.render_widget(
        HistogramChart {
            title: "Sessions per week",
            histogram: &metrics.sessions_histogram,
        },
        sessions_area,
    );
    frame.render_widget(
        HistogramChart {
            title: "Session duration (min)",
            histogram: &metrics.duration_histogram,
        },
        duration_area,
    );

    let [playtime_area, guild_area] =
        Layout::horizontal([Constraint::Fill(2), Constraint::Fill(1)]).areas(bottom);
    let series = [Series {
        name: "Mean playtime".to_owned(),
        points: metrics
            .play_time_by_days_since_signup
            .iter()
            .map(|(day, hours)| (f64::from(*day), *hours))
            .collect(),
    }];
    frame.render_widget(
        LineChart {
            title: "Playtime by days since signup",
            series: &series,
            x_title: "Days",
            y_title: "Hours",
            y_bounds: None,
        },
        playtime_area,
    );
    let lines = metrics
        .duration_by_guild
        .iter()
        .flat_map(|group| {
            let stats = &group.stats;
            [
                Line::raw(group.key.clone()).style(Style::default().add_modifier(Modifier::BOLD)),
                Line::raw(format!(
                    "  min {:.0} / median {:.0} / max {:.0}",
                    stats.min, stats.median, stats.max
                )),
                Line::raw(format!("  mean {:.1} min", stats.mean)),
            ]
        })
        .collect();
    frame.render_widget(
        TextPanel {
            title: "Duration by guild membership",
            lines,
        },
        guild_area,
    );
}

fn draw_achievements(frame: &mut Frame, area: Rect, metrics: &AchievementMetrics) {
    let [kpi_area, body] = kpi_layout(area);
    let kpis = [
        ("Mean unlocked", format!("{:.1}", metrics.mean_unlocked)),
        ("Max unlocked", metrics.max_unlocked.to_string()),
        ("Total unlocked", metrics.total_unlocked.to_string()),
        ("Completion", format!("{:.1}%", metrics.completion_rate_pct)),
    ];
    frame.render_widget(KpiRow { kpis: &kpis }, kpi_area);

    let [left, right] = halves(body);
    frame.render_widget(
        HistogramChart {
            title: "Achievements unlocked",
            histogram: &metrics.histogram,
        },
        left,
    );
    frame.render_widget(
        LabeledBars {
            title: "Mean unlocked by engagement",
            bars: metrics
                .mean_unlocked_by_engagement
                .iter()
                .map(|(level, mean)| (level.to_string(), *mean))
                .collect(),
            precision: 1,
        },
        right,
    );
}

fn draw_technical(frame: &mut Frame, area: Rect, metrics: &TechnicalMetrics) {
    let [kpi_area, body] = kpi_layout(area);
    let kpis = [
        ("Mean FPS", format!("{:.1}", metrics.mean_fps)),
        ("Min FPS", format!("{:.1}", metrics.min_fps)),
        ("Max FPS", format!("{:.1}", metrics.max_fps)),
        ("Crashes", metrics.total_crashes.to_string()),
        ("Crashes/player", format!("{:.2}", metrics.mean_crashes)),
    ];
    frame.render_widget(KpiRow { kpis: &kpis }, kpi_area);

    let [top, bottom] =
        Layout::vertical([Constraint::Fill(1), Constraint::Fill(1)]).areas(body);
    let [fps_area, crash_area] = halves(top);
    frame.render_widget(
        HistogramChart {
            title: "FPS distribution",
            histogram: &metrics.fps_histogram,
        },
        fps_area,
    );
    #[expect(clippy::cast_precision_loss)]
    let crash_bars = metrics
        .crash_distribution
        .iter()
        .map(|(crashes, players)| (format!("{crashes} crashes"), *players as f64))
        .collect();
    frame.render_widget(
        LabeledBars {
            title: "Players by crash count",
            bars: crash_bars,
            precision: 0,
        },
        crash_area,
    );

    let rows = metrics.by_device.iter().map(|device| {
        Row::new([
            Cell::from(device.device.clone()),
            Cell::from(device.players.to_string()),
            Cell::from(format!("{:.1}", device.mean_fps)),
            Cell::from(format!("{:.2}", device.mean_crashes)),
        ])
    });
    let rows = rows.chain(metrics.mean_crashes_by_guild.iter().map(|(guild, crashes)| {
        Row::new([
            Cell::from(format!("Guild: {guild}")),
            Cell::from(""),
            Cell::from(""),
            Cell::from(format!("{crashes:.2}")),
        ])
    }));
    let widths = [
        Constraint::Fill(2),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Fill(1),
    ];
    let table = Table::new(rows, widths)
        .header(header_row(["Device", "Players", "Mean FPS", "Crashes"]))
        .block(
            Block::bordered()
                .merge_borders(MergeStrategy::Exact)
                .title("Performance by device"),
        );
    frame.render_widget(table, bottom);
}

fn draw_social(frame: &mut Frame, area: Rect, metrics: &SocialMetrics) {
    let [kpi_area, body] = kpi_layout(area);
    let kpis = [
        ("Mean friends", format!("{:.1}", metrics.mean_friends)),
        ("Max friends", metrics.max_friends.to_string()),
        ("Guild members", metrics.guild_members.to_string()),
        ("Guild share", format!("{:.1}%", metrics.guild_share_pct)),
    ];
    frame.render_widget(KpiRow { kpis: &kpis }, kpi_area);

    let [left, right] = halves(body);
    frame.render_widget(
        HistogramChart {
            title: "Friends count",
            histogram: &metrics.friends_histogram,
        },
        left,
    );
    let describe = |title: &'static str, groups: &[GroupDistribution]| {
        let mut lines =
            vec![Line::raw(title).style(Style::default().add_modifier(Modifier::BOLD))];
        lines.extend(groups.iter().map(|g| {
            Line::raw(format!(
                "  {:<12} n={:<6} mean {:>8.2} median {:>8.2}",
                g.key, g.stats.count, g.stats.mean, g.stats.median
            ))
        }));
        lines
    };
    let mut lines = describe("Playtime (h) by guild", &metrics.play_time_by_guild);
    lines.push(Line::raw(""));
    lines.extend(describe("Spend of spenders (USD) by guild", &metrics.spend_by_guild));
    frame.render_widget(
        TextPanel {
            title: "Guild membership",
            lines,
        },
        right,
    );
}

fn draw_retention(
    frame: &mut Frame,
    area: Rect,
    curve: &Result<RetentionCurve, AnalysisError>,
    cohorts: &Result<CohortMatrix, AnalysisError>,
) {
    let [curve_area, cohort_area] =
        Layout::vertical([Constraint::Fill(1), Constraint::Fill(1)]).areas(area);
    match curve {
        Ok(curve) => {
            let series = curve
                .segments()
                .into_iter()
                .map(|segment| Series {
                    name: segment.to_owned(),
                    points: curve
                        .points_for(segment)
                        .map(|p| (f64::from(p.day), p.retention_pct))
                        .collect(),
                })
                .collect::<Vec<_>>();
            let title = format!("Retention by {} (s: change)", curve.segmentation);
            frame.render_widget(
                LineChart {
                    title: &title,
                    series: &series,
                    x_title: "Days since signup",
                    y_title: "Active %",
                    y_bounds: Some([0.0, 100.0]),
                },
                curve_area,
            );
        }
        Err(error) => frame.render_widget(
            Notice {
                title: "Retention",
                error,
            },
            curve_area,
        ),
    }
    match cohorts {
        Ok(matrix) => draw_cohort_table(frame, cohort_area, matrix),
        Err(error) => frame.render_widget(
            Notice {
                title: "Weekly cohorts",
                error,
            },
            cohort_area,
        ),
    }
}

fn header_row<const N: usize>(titles: [&str; N]) -> Row<'_> {
    Row::new(titles.map(Cell::from)).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    )
}

/// Background shade of a retention cell, darker for lower retention.
fn heat(pct: f64) -> Color {
    match pct {
        p if p >= 50.0 => Color::Green,
        p if p >= 20.0 => Color::Cyan,
        p if p >= 5.0 => Color::Blue,
        p if p > 0.0 => Color::DarkGray,
        _ => Color::Reset,
    }
}

fn draw_cohort_table(frame: &mut Frame, area: Rect, matrix: &CohortMatrix) {
    // most recent cohorts first; they fit the visible rows
    let rows = matrix
        .signup_weeks
        .iter()
        .zip(&matrix.cohort_sizes)
        .zip(&matrix.retention_pct)
        .rev()
        .map(|((week, size), pct)| {
            let mut cells = vec![Cell::from(week.to_string()), Cell::from(size.to_string())];
            cells.extend(pct.iter().map(|p| {
                Cell::from(format!("{p:.0}%")).style(Style::default().bg(heat(*p)))
            }));
            Row::new(cells)
        });
    let mut header = vec!["Week".to_owned(), "Size".to_owned()];
    header.extend(matrix.ages.iter().map(|age| format!("W{age}")));
    let header = Row::new(header).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );
    let mut widths = vec![Constraint::Length(11), Constraint::Length(6)];
    widths.extend(matrix.ages.iter().map(|_| Constraint::Length(5)));

    let title = if matrix.dropped_records > 0 {
        format!(
            "Weekly cohorts ({} records dropped)",
            matrix.dropped_records
        )
    } else {
        "Weekly cohorts".to_owned()
    };
    let table = Table::new(rows, widths).header(header).block(
        Block::bordered()
            .merge_borders(MergeStrategy::Exact)
            .title(title),
    );
    frame.render_widget(table, area);
}

fn draw_segments(
    frame: &mut Frame,
    area: Rect,
    segmentation: &Result<Segmentation, AnalysisError>,
) {
    let segmentation = match segmentation {
        Ok(segmentation) => segmentation,
        Err(error) => {
            frame.render_widget(
                Notice {
                    title: "Player segments",
                    error,
                },
                area,
            );
            return;
        }
    };
    let [table_area, bars_area] =
        Layout::vertical([Constraint::Length(8), Constraint::Fill(1)]).areas(area);

    let mut header = vec!["Segment".to_owned(), "Players".to_owned()];
    header.extend(SegmentFeature::ALL.iter().map(ToString::to_string));
    let rows = segmentation.clusters.iter().map(|cluster| {
        let mut cells = vec![
            Cell::from(cluster.label.clone())
                .style(Style::default().fg(SERIES_COLORS[cluster.cluster % SERIES_COLORS.len()])),
            Cell::from(cluster.players.to_string()),
        ];
        cells.extend(
            SegmentFeature::ALL
                .iter()
                .map(|f| Cell::from(format!("{:.1}", cluster.mean_of(*f)))),
        );
        Row::new(cells)
    });
    let mut widths = vec![Constraint::Length(20), Constraint::Length(8)];
    widths.extend(SegmentFeature::ALL.iter().map(|_| Constraint::Fill(1)));
    let title = match &segmentation.warning {
        Some(warning) => format!("Player segments ({warning})"),
        None => "Player segments".to_owned(),
    };
    let table = Table::new(rows, widths)
        .header(Row::new(header).style(Style::default().fg(Color::Yellow)))
        .block(
            Block::bordered()
                .merge_borders(MergeStrategy::Exact)
                .title(title),
        );
    frame.render_widget(table, table_area);

    #[expect(clippy::cast_precision_loss)]
    let bars = segmentation
        .clusters
        .iter()
        .map(|c| (c.label.clone(), c.players as f64))
        .collect();
    frame.render_widget(
        LabeledBars {
            title: "Players per segment",
            bars,
            precision: 0,
        },
        bars_area,
    );
}

fn draw_ab_test(frame: &mut Frame, area: Rect, result: &Result<AbTestResult, AnalysisError>) {
    let result = match result {
        Ok(result) => result,
        Err(error) => {
            frame.render_widget(
                Notice {
                    title: "A/B test (m: change metric)",
                    error,
                },
                area,
            );
            return;
        }
    };
    let [kpi_area, body] = kpi_layout(area);
    let effect = match result.effect {
        EffectSize::OddsRatio(ratio) => ("Odds ratio", format!("{ratio:.3}")),
        EffectSize::CohensD(d) => ("Cohen's d", format!("{d:.3}")),
    };
    let kpis = [
        ("Statistic", format!("{:.3}", result.statistic)),
        ("p-value", format!("{:.4}", result.p_value)),
        effect,
        (
            "Significant",
            if result.significant { "yes" } else { "no" }.to_owned(),
        ),
    ];
    frame.render_widget(KpiRow { kpis: &kpis }, kpi_area);

    let [groups_area, text_area] = halves(body);
    let is_conversion = result.metric == AbMetric::Conversion;
    let bars = [&result.group_a, &result.group_b]
        .into_iter()
        .map(|g| {
            let mean = if is_conversion { g.mean * 100.0 } else { g.mean };
            (format!("Group {}", g.group), mean)
        })
        .collect();
    let title = format!("{} by group", result.metric.description());
    frame.render_widget(
        LabeledBars {
            title: &title,
            bars,
            precision: 2,
        },
        groups_area,
    );

    let ci = &result.confidence_interval;
    let mut lines = [&result.group_a, &result.group_b]
        .into_iter()
        .map(|g| {
            Line::raw(format!(
                "Group {}: {} players, mean {:.4}, std dev {:.4}",
                g.group, g.players, g.mean, g.std_dev
            ))
        })
        .collect::<Vec<_>>();
    lines.extend([
        Line::raw(format!(
            "{:.0}% CI of B - A: [{:.4}, {:.4}]",
            ci.level * 100.0,
            ci.lower,
            ci.upper
        )),
        Line::raw(""),
        Line::raw(result.interpretation.clone()).style(Style::default().fg(Color::Yellow)),
    ]);
    frame.render_widget(
        TextPanel {
            title: "Interpretation (m: change metric)",
            lines,
        },
        text_area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_keys_map_to_pages() {
        assert_eq!(Page::from_digit('1'), Some(Page::Overview));
        assert_eq!(Page::from_digit('9'), Some(Page::Segments));
        assert_eq!(Page::from_digit('0'), Some(Page::AbTest));
        assert_eq!(Page::from_digit('x'), None);
    }

    #[test]
    fn test_page_cycle_wraps() {
        assert_eq!(Page::AbTest.next(), Page::Overview);
        assert_eq!(Page::Overview.prev(), Page::AbTest);
        for page in Page::ALL {
            assert_eq!(page.next().prev(), page);
        }
    }
}
