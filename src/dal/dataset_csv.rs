use std::{
    fmt,
    fs::{self, File},
    io::{Read, Write},
    path::Path,
    str::FromStr,
};

use serde::Deserialize;

use crate::{
    domain::{Dataset, DatasetRow, COLUMNS, COLUMN_COUNT},
    error::{Result, ScrapeError},
};

#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Tsv,
}

impl ExportFormat {
    pub fn delimiter(&self) -> u8 {
        match self {
            ExportFormat::Csv => b',',
            ExportFormat::Tsv => b'\t',
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "tsv" => Ok(ExportFormat::Tsv),
            other => Err(format!("Unknown format: {}", other)),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Csv => write!(f, "csv"),
            ExportFormat::Tsv => write!(f, "tsv"),
        }
    }
}

/// Header row first, then one line per dataset row. Nulls are empty cells.
pub fn write_dataset<W: Write>(writer: W, dataset: &Dataset, format: ExportFormat) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(format.delimiter())
        .from_writer(writer);

    wtr.write_record(dataset.columns())?;
    for row in dataset.rows() {
        wtr.write_record(&row.to_cells())?;
    }
    wtr.flush()?;

    Ok(())
}

pub fn export_dataset(path: &Path, dataset: &Dataset, format: ExportFormat) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    write_dataset(file, dataset, format)?;

    log::info!("Wrote {} rows to {}", dataset.len(), path.display());
    Ok(())
}

/// Reads an export back. The header must match the fixed column order.
pub fn read_dataset<R: Read>(reader: R, format: ExportFormat) -> Result<Dataset> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(format.delimiter())
        .from_reader(reader);

    let headers = rdr.headers()?;
    if headers.iter().ne(COLUMNS.iter().copied()) {
        return Err(ScrapeError::MalformedExport(format!(
            "unexpected header: {:?}",
            headers.iter().collect::<Vec<_>>()
        )));
    }

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let cells: [Option<String>; COLUMN_COUNT] = std::array::from_fn(|i| {
            record
                .get(i)
                .filter(|cell| !cell.is_empty())
                .map(|cell| cell.to_string())
        });
        rows.push(DatasetRow::from_cells(cells));
    }

    Ok(Dataset::new(rows))
}

pub fn import_dataset(path: &Path, format: ExportFormat) -> Result<Dataset> {
    read_dataset(File::open(path)?, format)
}
