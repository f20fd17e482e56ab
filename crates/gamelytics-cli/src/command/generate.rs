use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use gamelytics_data::{
    csv_io,
    generator::{self, DEFAULT_PLAYERS, DEFAULT_SEED, GeneratorConfig},
};

use crate::util::Output;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct GenerateArg {
    /// Number of players to generate
    #[arg(long, default_value_t = DEFAULT_PLAYERS)]
    players: usize,
    /// Random seed
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
    /// Date the data is generated relative to (YYYY-MM-DD); defaults to today
    #[arg(long)]
    reference_date: Option<NaiveDate>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &GenerateArg) -> anyhow::Result<()> {
    let GenerateArg {
        players,
        seed,
        reference_date,
        output,
    } = arg;

    let config = GeneratorConfig {
        players: *players,
        seed: *seed,
        reference_date: reference_date.unwrap_or_else(|| Local::now().date_naive()),
    };
    let dataset = generator::generate(&config).context("Failed to generate dataset")?;

    let mut output = Output::from_output_path(output.clone())?;
    csv_io::write_records(&mut output, dataset.records())
        .with_context(|| format!("Failed to write dataset to {}", output.display_path()))?;
    if !output.is_stdout() {
        eprintln!(
            "Wrote {} players to {}",
            dataset.len(),
            output.display_path()
        );
    }
    Ok(())
}
