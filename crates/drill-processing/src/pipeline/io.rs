//! Reading and writing datasets by file extension.

use crate::error::{ProcessingError, Result};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Supported on-disk formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Parquet,
    Csv,
    Ipc,
}

impl FileFormat {
    /// Detect the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "parquet" | "pq" => Some(Self::Parquet),
            "csv" => Some(Self::Csv),
            "ipc" | "arrow" | "feather" => Some(Self::Ipc),
            _ => None,
        }
    }
}

/// Read a dataset. Every failure is reported as [`ProcessingError::DataLoad`].
pub fn read_frame(path: &Path) -> Result<DataFrame> {
    let format = FileFormat::from_path(path).ok_or_else(|| {
        ProcessingError::DataLoad(format!("Unsupported file format: {}", path.display()))
    })?;

    if !path.is_file() {
        return Err(ProcessingError::DataLoad(format!(
            "File not found: {}",
            path.display()
        )));
    }

    let result = match format {
        FileFormat::Parquet => open(path).and_then(|file| ParquetReader::new(file).finish()),
        FileFormat::Ipc => open(path).and_then(|file| IpcReader::new(file).finish()),
        FileFormat::Csv => read_csv(path),
    };

    result.map_err(|e| ProcessingError::DataLoad(format!("{}: {}", path.display(), e)))
}

/// Write a dataset, choosing the format from the extension.
pub fn write_frame(df: &mut DataFrame, path: &Path) -> Result<()> {
    let format = FileFormat::from_path(path).ok_or_else(|| {
        ProcessingError::DataLoad(format!("Unsupported output format: {}", path.display()))
    })?;

    let file = File::create(path)?;
    match format {
        FileFormat::Parquet => {
            ParquetWriter::new(file).finish(df)?;
        }
        FileFormat::Csv => CsvWriter::new(file).include_header(true).finish(df)?,
        FileFormat::Ipc => IpcWriter::new(file).finish(df)?,
    }
    Ok(())
}

fn open(path: &Path) -> PolarsResult<File> {
    Ok(File::open(path)?)
}

/// CSV with quote handling first, then plain parsing.
fn read_csv(path: &Path) -> PolarsResult<DataFrame> {
    let quoted = CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish();

    match quoted {
        Ok(df) => Ok(df),
        Err(e) => {
            debug!("Quoted CSV parsing failed, retrying without quotes: {}", e);
            CsvReadOptions::default()
                .with_infer_schema_length(Some(100))
                .with_has_header(true)
                .with_parse_options(CsvParseOptions::default().with_quote_char(None))
                .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
                .finish()
        }
    }
}
