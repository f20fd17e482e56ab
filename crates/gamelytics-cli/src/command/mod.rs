use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use gamelytics_data::{FilterSpec, GameDifficulty, LocationFilter, Selection};

use self::{
    dashboard::DashboardArg, export::ExportArg, generate::GenerateArg, report::ReportArg,
};

mod dashboard;
mod export;
mod generate;
mod report;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Generate a synthetic player dataset as CSV
    Generate(#[clap(flatten)] GenerateArg),
    /// Explore a dataset in the interactive dashboard
    Dashboard(#[clap(flatten)] DashboardArg),
    /// Print the analyses of a filtered dataset as text or JSON
    Report(#[clap(flatten)] ReportArg),
    /// Write the filtered dataset as CSV
    Export(#[clap(flatten)] ExportArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Generate(arg) => generate::run(&arg)?,
        Mode::Dashboard(arg) => dashboard::run(&arg)?,
        Mode::Report(arg) => report::run(&arg)?,
        Mode::Export(arg) => export::run(&arg)?,
    }
    Ok(())
}

/// Filter flags shared by the commands reading a dataset.
#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct FilterArg {
    /// Game genre to keep, or "All"
    #[arg(long, default_value = "All")]
    genre: Selection<String>,
    /// Game difficulty to keep (Easy, Medium, Hard), or "All"
    #[arg(long, default_value = "All")]
    difficulty: Selection<GameDifficulty>,
    /// Device to keep, or "All"
    #[arg(long, default_value = "All")]
    device: Selection<String>,
    /// Location to keep, "outside-top" for locations outside the top ten, or
    /// "All"
    #[arg(long, default_value = "All")]
    location: LocationFilter,
    /// Earliest signup date to keep (YYYY-MM-DD)
    #[arg(long)]
    signup_from: Option<NaiveDate>,
    /// Latest signup date to keep (YYYY-MM-DD)
    #[arg(long)]
    signup_to: Option<NaiveDate>,
}

impl FilterArg {
    pub(crate) fn to_spec(&self) -> FilterSpec {
        FilterSpec {
            genre: self.genre.clone(),
            difficulty: self.difficulty.clone(),
            device: self.device.clone(),
            location: self.location.clone(),
            signup_from: self.signup_from,
            signup_to: self.signup_to,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn test_command_definition_is_valid() {
        CommandArgs::command().debug_assert();
    }

    #[test]
    fn test_filter_flags_build_spec() {
        let args = CommandArgs::parse_from([
            "gamelytics",
            "export",
            "players.csv",
            "--genre",
            "Strategy",
            "--difficulty",
            "Hard",
            "--location",
            "outside-top",
            "--signup-from",
            "2024-01-01",
        ]);
        let Mode::Export(arg) = args.mode else {
            panic!("expected export mode");
        };
        let spec = arg.filter.to_spec();
        assert_eq!(spec.genre, Selection::Only("Strategy".to_owned()));
        assert_eq!(spec.difficulty, Selection::Only(GameDifficulty::Hard));
        assert!(spec.device.is_all());
        assert_eq!(spec.location, LocationFilter::Other);
        assert_eq!(spec.signup_from, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(spec.signup_to, None);
    }

    #[test]
    fn test_location_named_other_is_selectable() {
        let args = CommandArgs::parse_from([
            "gamelytics",
            "report",
            "players.csv",
            "--location",
            "Other",
        ]);
        let Mode::Report(arg) = args.mode else {
            panic!("expected report mode");
        };
        assert_eq!(
            arg.filter.to_spec().location,
            LocationFilter::Only("Other".to_owned())
        );
    }

    #[test]
    fn test_default_filter_flags_are_wildcard() {
        let args = CommandArgs::parse_from(["gamelytics", "report", "players.csv"]);
        let Mode::Report(arg) = args.mode else {
            panic!("expected report mode");
        };
        assert!(arg.filter.to_spec().is_wildcard());
    }
}
