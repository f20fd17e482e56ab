use std::fmt::Display;

use gamelytics_analysis::{AnalysisError, aggregate::ValueCount};
use gamelytics_stats::histogram::Histogram;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    prelude::Direction,
    style::{Color, Modifier, Style},
    symbols::{Marker, merge::MergeStrategy},
    text::Line,
    widgets::{
        Axis, Bar, BarChart, Block, Chart, Dataset, GraphType, Paragraph, Widget, Wrap,
    },
};

pub(super) const SERIES_COLORS: [Color; 6] = [
    Color::Cyan,
    Color::Yellow,
    Color::Magenta,
    Color::Green,
    Color::LightRed,
    Color::LightBlue,
];

fn titled(title: &str) -> Block<'_> {
    Block::bordered()
        .merge_borders(MergeStrategy::Exact)
        .title(title)
}

/// A row of headline figures.
pub(super) struct KpiRow<'a> {
    pub kpis: &'a [(&'a str, String)],
}

impl Widget for KpiRow<'_> {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        if self.kpis.is_empty() {
            return;
        }
        let areas = Layout::horizontal(self.kpis.iter().map(|_| Constraint::Fill(1))).split(area);
        for ((label, value), area) in self.kpis.iter().zip(areas.iter()) {
            let text = vec![
                Line::raw(value.clone()).style(
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ),
            ];
            Paragraph::new(text)
                .centered()
                .block(titled(label))
                .render(*area, buf);
        }
    }
}

/// Vertical bars over the bins of a histogram.
pub(super) struct HistogramChart<'a> {
    pub title: &'a str,
    pub histogram: &'a Histogram,
}

impl Widget for HistogramChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        let bars = self
            .histogram
            .bins
            .iter()
            .map(|bin| Bar::with_label(format!("{:.0}", bin.range.start), bin.count))
            .collect::<Vec<_>>();
        let inner_width = usize::from(area.width.saturating_sub(2));
        let bar_width = u16::try_from(inner_width / bars.len().max(1))
            .unwrap_or(1)
            .clamp(1, 8);
        BarChart::new(bars)
            .block(titled(self.title))
            .bar_width(bar_width)
            .bar_gap(0)
            .bar_style(Style::default().fg(Color::Cyan))
            .render(area, buf);
    }
}

/// Horizontal bars of labeled values.
pub(super) struct LabeledBars<'a> {
    pub title: &'a str,
    pub bars: Vec<(String, f64)>,
    pub precision: usize,
}

impl LabeledBars<'_> {
    #[expect(clippy::cast_precision_loss)]
    pub fn counts<'t, K: Display>(title: &'t str, counts: &[ValueCount<K>]) -> LabeledBars<'t> {
        LabeledBars {
            title,
            bars: counts
                .iter()
                .map(|c| (c.key.to_string(), c.count as f64))
                .collect(),
            precision: 0,
        }
    }
}

impl Widget for LabeledBars<'_> {
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        // bar heights are integral; scale so small means keep their shape
        let scale = if self.precision == 0 { 1.0 } else { 100.0 };
        let bars = self
            .bars
            .iter()
            .map(|(label, value)| {
                Bar::with_label(label.clone(), (value.max(0.0) * scale).round() as u64)
                    .text_value(format!("{value:.*}", self.precision))
            })
            .collect::<Vec<_>>();
        BarChart::new(bars)
            .block(titled(self.title))
            .direction(Direction::Horizontal)
            .bar_gap(0)
            .bar_style(Style::default().fg(Color::Green))
            .render(area, buf);
    }
}

/// One named series of a line chart.
pub(super) struct Series {
    pub name: String,
    pub points: Vec<(f64, f64)>,
}

pub(super) struct LineChart<'a> {
    pub title: &'a str,
    pub series: &'a [Series],
    pub x_title: &'a str,
    pub y_title: &'a str,
    /// Fixed Y bounds; derived from the data when `None`.
    pub y_bounds: Option<[f64; 2]>,
}

impl Widget for LineChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        let all_points = || self.series.iter().flat_map(|s| s.points.iter().copied());
        let x_max = all_points().map(|(x, _)| x).fold(0.0, f64::max);
        let y_bounds = self
            .y_bounds
            .unwrap_or_else(|| [0.0, all_points().map(|(_, y)| y).fold(0.0, f64::max)]);
        let x_bounds = [0.0, x_max.max(1.0)];
        let y_bounds = [y_bounds[0], y_bounds[1].max(y_bounds[0] + 1.0)];

        let datasets = self
            .series
            .iter()
            .zip(SERIES_COLORS.iter().cycle())
            .map(|(series, color)| {
                Dataset::default()
                    .name(series.name.clone())
                    .marker(Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(*color))
                    .data(&series.points)
            })
            .collect::<Vec<_>>();
        let axis_labels = |bounds: [f64; 2]| {
            [
                format!("{:.0}", bounds[0]),
                format!("{:.0}", f64::midpoint(bounds[0], bounds[1])),
                format!("{:.0}", bounds[1]),
            ]
        };
        Chart::new(datasets)
            .block(titled(self.title))
            .x_axis(
                Axis::default()
                    .title(self.x_title)
                    .bounds(x_bounds)
                    .labels(axis_labels(x_bounds)),
            )
            .y_axis(
                Axis::default()
                    .title(self.y_title)
                    .bounds(y_bounds)
                    .labels(axis_labels(y_bounds)),
            )
            .render(area, buf);
    }
}

/// Lines of text in a bordered box.
pub(super) struct TextPanel<'a> {
    pub title: &'a str,
    pub lines: Vec<Line<'a>>,
}

impl Widget for TextPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        Paragraph::new(self.lines)
            .wrap(Wrap { trim: false })
            .block(titled(self.title))
            .render(area, buf);
    }
}

/// Shown in place of a chart whose analysis failed.
pub(super) struct Notice<'a> {
    pub title: &'a str,
    pub error: &'a AnalysisError,
}

impl Widget for Notice<'_> {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        Paragraph::new(Line::raw(format!("Not available: {}", self.error)))
            .style(Style::default().fg(Color::DarkGray))
            .centered()
            .wrap(Wrap { trim: true })
            .block(titled(self.title))
            .render(area, buf);
    }
}
