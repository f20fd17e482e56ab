use std::{fs, path::PathBuf};

use anyhow::Context as _;
use chrono::{Datelike as _, Months, NaiveDate};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use gamelytics_analysis::{ab_test::AbMetric, retention::RetentionSegment, session::Session};
use gamelytics_data::{Dataset, FilterSpec, GameDifficulty, LocationFilter, Selection};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::Tabs,
};

use super::{
    pages::{Page, PageContent, PageParams},
    widgets::TextPanel,
};

const SIDEBAR_WIDTH: u16 = 30;
const HELP_TEXT: &str = "Tab/1-0: Page | g/d/v/l: Filter | f/t: Signup | r: Reset | \
                         s: Segment | m: Metric | e: Export | q/Esc: Quit";

/// Values each sidebar selector cycles through, after "All".
#[derive(Debug)]
struct FilterOptions {
    genres: Vec<String>,
    difficulties: Vec<GameDifficulty>,
    devices: Vec<String>,
    locations: Vec<LocationFilter>,
    /// First days of the months the signups span.
    signup_starts: Vec<NaiveDate>,
    /// Last days of the same months.
    signup_ends: Vec<NaiveDate>,
}

impl FilterOptions {
    fn new(session: &Session) -> Self {
        let dataset = session.dataset();
        let locations = dataset
            .top_locations()
            .iter()
            .cloned()
            .map(LocationFilter::Only)
            .chain([LocationFilter::Other])
            .collect();
        let (signup_starts, signup_ends) = signup_months(dataset).into_iter().unzip();
        Self {
            genres: dataset.distinct_values(|r| r.game_genre.as_str()),
            difficulties: GameDifficulty::ALL.to_vec(),
            devices: dataset.distinct_values(|r| r.device.as_str()),
            locations,
            signup_starts,
            signup_ends,
        }
    }
}

/// First and last day of every calendar month from the earliest to the
/// latest signup.
fn signup_months(dataset: &Dataset) -> Vec<(NaiveDate, NaiveDate)> {
    let Some((first, last)) = dataset.signup_range() else {
        return vec![];
    };
    let mut months = vec![];
    let mut start = first.with_day(1);
    while let Some(month_start) = start.filter(|s| *s <= last) {
        let next = month_start.checked_add_months(Months::new(1));
        let month_end = next.and_then(|n| n.pred_opt()).unwrap_or(NaiveDate::MAX);
        months.push((month_start, month_end));
        start = next;
    }
    months
}

fn date_label(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| "All".to_owned(), |d| d.to_string())
}

/// The option after `current`, or `None` ("All") past the last one.
fn cycle<T>(current: Option<&T>, options: &[T]) -> Option<T>
where
    T: Clone + PartialEq,
{
    let next = match current {
        None => 0,
        Some(current) => options.iter().position(|o| o == current)? + 1,
    };
    options.get(next).cloned()
}

fn cycle_selection<T>(current: &Selection<T>, options: &[T]) -> Selection<T>
where
    T: Clone + PartialEq,
{
    cycle(current.as_only(), options).map_or(Selection::All, Selection::Only)
}

#[derive(Debug)]
pub(crate) struct App {
    session: Session,
    options: FilterOptions,
    filter: FilterSpec,
    page: Page,
    params: PageParams,
    export_path: PathBuf,
    view_len: usize,
    content: PageContent,
    status: Option<String>,
    should_exit: bool,
}

impl App {
    pub(crate) fn new(session: Session, seed: u64, export_path: PathBuf) -> Self {
        let options = FilterOptions::new(&session);
        let params = PageParams {
            retention_segment: RetentionSegment::default(),
            ab_metric: AbMetric::default(),
            seed,
        };
        let filter = FilterSpec::default();
        let (view_len, content) = {
            let view = session.view(&filter);
            (view.len(), PageContent::compute(Page::default(), &view, params))
        };
        Self {
            session,
            options,
            filter,
            page: Page::default(),
            params,
            export_path,
            view_len,
            content,
            status: None,
            should_exit: false,
        }
    }

    pub(crate) fn run(&mut self, terminal: &mut DefaultTerminal) -> anyhow::Result<()> {
        while !self.should_exit {
            terminal.draw(|f| self.draw(f))?;
            self.handle_events()?;
        }
        Ok(())
    }

    /// Recomputes the current page over the current filter.
    fn refresh(&mut self) {
        let view = self.session.view(&self.filter);
        self.view_len = view.len();
        self.content = PageContent::compute(self.page, &view, self.params);
    }

    fn draw(&self, frame: &mut Frame) {
        let [tabs_area, main_area, help_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(frame.area());
        let [sidebar_area, page_area] =
            Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Fill(1)])
                .areas(main_area);

        let titles = Page::ALL
            .iter()
            .enumerate()
            .map(|(i, page)| format!("{} {}", (i + 1) % 10, page.title()));
        let tabs = Tabs::new(titles)
            .select(self.page.index())
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, tabs_area);

        self.draw_sidebar(frame, sidebar_area);
        self.content.draw(frame, page_area);

        let help_text = Text::from(HELP_TEXT)
            .style(Style::default().fg(Color::DarkGray))
            .centered();
        frame.render_widget(help_text, help_area);
    }

    fn draw_sidebar(&self, frame: &mut Frame, area: Rect) {
        let entry = |key: &'static str, label: &'static str, value: String| {
            Line::from(vec![
                Span::styled(format!("{key} "), Style::default().fg(Color::DarkGray)),
                Span::raw(format!("{label}: ")),
                Span::styled(value, Style::default().fg(Color::Cyan)),
            ])
        };
        let mut lines = vec![
            entry("g", "Genre", self.filter.genre.to_string()),
            entry("d", "Difficulty", self.filter.difficulty.to_string()),
            entry("v", "Device", self.filter.device.to_string()),
            entry("l", "Location", self.filter.location.to_string()),
            entry("f", "Signup from", date_label(self.filter.signup_from)),
            entry("t", "Signup to", date_label(self.filter.signup_to)),
            Line::raw(""),
            Line::raw(format!(
                "Players: {} of {}",
                self.view_len,
                self.session.dataset().len()
            )),
            Line::raw(""),
            entry("s", "Segment", self.params.retention_segment.to_string()),
            entry("m", "A/B metric", self.params.ab_metric.to_string()),
            Line::raw(format!("  Seed: {}", self.params.seed)),
        ];
        if let Some(status) = &self.status {
            lines.push(Line::raw(""));
            lines.push(Line::raw(status.clone()).style(Style::default().fg(Color::Yellow)));
        }
        frame.render_widget(
            TextPanel {
                title: "Filters",
                lines,
            },
            area,
        );
    }

    fn handle_events(&mut self) -> anyhow::Result<()> {
        match event::read()? {
            Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
                self.handle_key_event(key_event);
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_key_event(&mut self, key_event: KeyEvent) {
        let options = &self.options;
        match key_event.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_exit = true;
                return;
            }
            KeyCode::Tab => self.page = self.page.next(),
            KeyCode::BackTab => self.page = self.page.prev(),
            KeyCode::Char(c) if c.is_ascii_digit() => match Page::from_digit(c) {
                Some(page) => self.page = page,
                None => return,
            },
            KeyCode::Char('g') => {
                self.filter.genre = cycle_selection(&self.filter.genre, &options.genres);
            }
            KeyCode::Char('d') => {
                self.filter.difficulty =
                    cycle_selection(&self.filter.difficulty, &options.difficulties);
            }
            KeyCode::Char('v') => {
                self.filter.device = cycle_selection(&self.filter.device, &options.devices);
            }
            KeyCode::Char('l') => {
                let current = match &self.filter.location {
                    LocationFilter::All => None,
                    location => Some(location),
                };
                self.filter.location =
                    cycle(current, &options.locations).unwrap_or(LocationFilter::All);
            }
            KeyCode::Char('f') => {
                self.filter.signup_from =
                    cycle(self.filter.signup_from.as_ref(), &options.signup_starts);
            }
            KeyCode::Char('t') => {
                self.filter.signup_to =
                    cycle(self.filter.signup_to.as_ref(), &options.signup_ends);
            }
            KeyCode::Char('r') => self.filter = FilterSpec::default(),
            KeyCode::Char('s') => {
                self.params.retention_segment = self.params.retention_segment.next();
            }
            KeyCode::Char('m') => self.params.ab_metric = self.params.ab_metric.next(),
            KeyCode::Char('e') => {
                self.status = Some(match self.export() {
                    Ok(message) => message,
                    Err(error) => format!("Export failed: {error:#}"),
                });
                return;
            }
            _ => return,
        }
        self.status = None;
        self.refresh();
    }

    fn export(&self) -> anyhow::Result<String> {
        let bytes = self
            .session
            .export_csv(&self.filter)
            .context("Failed to serialize filtered dataset")?;
        fs::write(&self.export_path, &*bytes)
            .with_context(|| format!("Failed to write {}", self.export_path.display()))?;
        log::debug!(
            "Exported {} bytes to {}",
            bytes.len(),
            self.export_path.display()
        );
        Ok(format!(
            "Exported {} players to {}",
            self.view_len,
            self.export_path.display()
        ))
    }
}
