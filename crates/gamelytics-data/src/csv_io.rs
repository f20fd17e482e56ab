//! Reading and writing the dataset as CSV.
//!
//! The header is validated once, before any row is parsed: it must list
//! exactly the columns of [`COLUMNS`] in that order. Rows are then
//! deserialized into [`PlayerRecord`]s through serde, and the first malformed
//! row aborts the load with its CSV position.
//!
//! Writing always emits the header, even for zero records, so that any
//! exported view can be loaded back.

use std::{
    fs::File,
    io::{self, BufReader},
    path::{Path, PathBuf},
};

use crate::{
    dataset::Dataset,
    player::{COLUMNS, PlayerRecord},
};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum LoadError {
    #[display("failed to open dataset file {}", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[display("malformed dataset: {_0}")]
    Csv(csv::Error),
    #[display("unexpected dataset header: expected {expected:?}, found {found:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
}

impl From<csv::Error> for LoadError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Loads a dataset from a CSV file.
pub fn load_dataset<P>(path: P) -> Result<Dataset, LoadError>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_owned(),
        source,
    })?;
    let dataset = read_dataset(BufReader::new(file))?;
    log::info!(
        "Loaded {} players from {}",
        dataset.len(),
        path.display()
    );
    Ok(dataset)
}

/// Reads a dataset from any CSV source.
///
/// ```
/// use gamelytics_data::csv_io::read_dataset;
///
/// let header = gamelytics_data::COLUMNS.join(",");
/// let dataset = read_dataset(header.as_bytes()).unwrap();
/// assert!(dataset.is_empty());
/// ```
pub fn read_dataset<R>(reader: R) -> Result<Dataset, LoadError>
where
    R: io::Read,
{
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let header = reader.headers()?;
    if !header.iter().eq(COLUMNS) {
        return Err(LoadError::SchemaMismatch {
            expected: COLUMNS.iter().map(|&c| c.to_owned()).collect(),
            found: header.iter().map(str::to_owned).collect(),
        });
    }

    let records = reader
        .deserialize::<PlayerRecord>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Dataset::new(records))
}

/// Writes records as CSV, header first.
pub fn write_records<'a, W, I>(writer: W, records: I) -> Result<(), csv::Error>
where
    W: io::Write,
    I: IntoIterator<Item = &'a PlayerRecord>,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    writer.write_record(COLUMNS)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Serializes records to CSV bytes.
pub fn to_csv_bytes<'a, I>(records: I) -> Result<Vec<u8>, csv::Error>
where
    I: IntoIterator<Item = &'a PlayerRecord>,
{
    let mut buf = vec![];
    write_records(&mut buf, records)?;
    Ok(buf)
}
