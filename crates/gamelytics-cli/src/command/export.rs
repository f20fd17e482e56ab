use std::path::PathBuf;

use anyhow::Context;

use crate::{command::FilterArg, util};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ExportArg {
    /// Dataset CSV file path
    dataset: PathBuf,
    #[clap(flatten)]
    pub(super) filter: FilterArg,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &ExportArg) -> anyhow::Result<()> {
    let ExportArg {
        dataset,
        filter,
        output,
    } = arg;

    let session = util::load_session(dataset)?;
    let spec = filter.to_spec();
    let records = session.view(&spec).len();
    let bytes = session
        .export_csv(&spec)
        .context("Failed to serialize filtered dataset")?;
    let output = util::Output::save_bytes(&bytes, output.clone())?;
    if !output.is_stdout() {
        eprintln!("Exported {records} players to {}", output.display_path());
    }
    Ok(())
}
