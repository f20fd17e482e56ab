//! Interactive dashboard command
//!
//! One page per analysis, a sidebar of filter selectors, and analyses
//! recomputed whenever the filter, page or analysis parameters change.

use std::path::PathBuf;

use gamelytics_analysis::segmentation;

use self::app::App;
use crate::util;

mod app;
mod pages;
mod widgets;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct DashboardArg {
    /// Dataset CSV file path
    dataset: PathBuf,
    /// Seed of the player segmentation
    #[arg(long, default_value_t = segmentation::DEFAULT_SEED)]
    seed: u64,
    /// File the `e` key exports the filtered view to
    #[arg(long, default_value = "filtered_players.csv")]
    export_path: PathBuf,
}

pub(crate) fn run(arg: &DashboardArg) -> anyhow::Result<()> {
    let DashboardArg {
        dataset,
        seed,
        export_path,
    } = arg;

    let session = util::load_session(dataset)?;
    log::info!("Loaded {} players", session.dataset().len());

    let mut app = App::new(session, *seed, export_path.clone());
    ratatui::run(|terminal| app.run(terminal))?;
    Ok(())
}
