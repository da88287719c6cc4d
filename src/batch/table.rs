//! Row-by-row reading of delimited tables (CSV, TSV, SSV).
//!
//! Rows come out as ordered `column -> value` maps. Cells are typed the way a
//! dataframe reader types them: missing markers become `null`, integers,
//! floats and booleans become JSON scalars, and everything else stays a
//! string. Only string cells are classification candidates.

use std::fs::File;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde_json::{Number, Value};
use thiserror::Error;
use tracing::debug;

use crate::compound::Compound;

/// One table row: column name to typed cell value, in column order.
pub type Row = IndexMap<String, Value>;

/// Classifications found in one row: column name to compound, in column order.
pub type RowClassification = IndexMap<String, Compound>;

/// File extensions recognized as tables.
pub const TABLE_EXTENSIONS: [&str; 4] = ["csv", "tsv", "ssv", "txt"];

/// Cell contents read as missing values.
const MISSING_MARKERS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Errors raised while reading a table.
#[derive(Debug, Error)]
pub enum TableError {
    /// The file could not be opened or its header read.
    #[error("failed to open table {path}: {source}")]
    Open {
        /// Path of the table.
        path: PathBuf,
        /// The underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// A record could not be read.
    #[error("failed to read row {row} of {path}: {source}")]
    Read {
        /// Path of the table.
        path: PathBuf,
        /// 1-based data row number.
        row: u64,
        /// The underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// The separator is not a single ASCII character.
    #[error("separator must be a single ASCII character, got '{value}'")]
    InvalidSeparator {
        /// The rejected separator.
        value: String,
    },
}

/// Parses a separator argument; accepts `\t` and `tab` for tabs.
///
/// # Errors
///
/// Returns [`TableError::InvalidSeparator`] unless `value` is one ASCII character.
pub fn parse_separator(value: &str) -> Result<u8, TableError> {
    match value {
        "\\t" | "tab" => Ok(b'\t'),
        _ => match value.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(TableError::InvalidSeparator {
                value: value.to_string(),
            }),
        },
    }
}

/// Separator implied by the file extension (`.tsv` tab, `.ssv` space), else `fallback`.
#[must_use]
pub fn separator_for_path(path: &Path, fallback: u8) -> u8 {
    match extension(path).as_deref() {
        Some("tsv") => b'\t',
        Some("ssv") => b' ',
        _ => fallback,
    }
}

/// Whether `path` has one of the [`TABLE_EXTENSIONS`].
#[must_use]
pub fn is_table_path(path: &Path) -> bool {
    extension(path).is_some_and(|ext| TABLE_EXTENSIONS.contains(&ext.as_str()))
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// Types one raw cell.
#[must_use]
pub fn parse_cell(raw: &str) -> Value {
    if MISSING_MARKERS.contains(&raw) {
        return Value::Null;
    }
    match raw {
        "True" | "TRUE" | "true" => return Value::Bool(true),
        "False" | "FALSE" | "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(integer) = raw.parse::<i64>() {
        return Value::Number(integer.into());
    }
    if let Some(number) = raw.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(number);
    }
    Value::String(raw.to_string())
}

/// Makes header names unique and non-empty (`a`, `a.1`, `Unnamed: 2`).
fn column_names(header: &csv::StringRecord) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(header.len());
    for (index, raw) in header.iter().enumerate() {
        let base = if raw.is_empty() {
            format!("Unnamed: {index}")
        } else {
            raw.to_string()
        };
        let mut name = base.clone();
        let mut suffix = 1;
        while names.contains(&name) {
            name = format!("{base}.{suffix}");
            suffix += 1;
        }
        names.push(name);
    }
    names
}

/// Lazily reads a table one row at a time.
pub struct TableReader {
    path: PathBuf,
    records: csv::StringRecordsIntoIter<File>,
    columns: Option<Vec<String>>,
    row: u64,
}

impl std::fmt::Debug for TableReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableReader")
            .field("path", &self.path)
            .field("columns", &self.columns)
            .field("row", &self.row)
            .finish_non_exhaustive()
    }
}

impl TableReader {
    /// Opens `path`. With `header`, the first record names the columns;
    /// without, columns are named by position (`"0"`, `"1"`, ...).
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Open`] when the file or its header cannot be read.
    pub fn open(path: impl AsRef<Path>, separator: u8, header: bool) -> Result<Self, TableError> {
        let path = path.as_ref().to_path_buf();
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(separator)
            .has_headers(header)
            .flexible(true)
            .from_path(&path)
            .map_err(|source| TableError::Open {
                path: path.clone(),
                source,
            })?;

        let columns = if header {
            let header = reader.headers().map_err(|source| TableError::Open {
                path: path.clone(),
                source,
            })?;
            Some(column_names(header))
        } else {
            None
        };
        debug!(path = %path.display(), ?columns, "opened table");

        Ok(Self {
            path,
            records: reader.into_records(),
            columns,
            row: 0,
        })
    }

    /// Column names from the header, if the table has one.
    #[must_use]
    pub fn columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    fn to_row(&self, record: &csv::StringRecord) -> Row {
        let mut row = Row::new();
        match &self.columns {
            Some(columns) => {
                for (index, name) in columns.iter().enumerate() {
                    row.insert(name.clone(), record.get(index).map_or(Value::Null, parse_cell));
                }
                for (index, raw) in record.iter().enumerate().skip(columns.len()) {
                    row.insert(index.to_string(), parse_cell(raw));
                }
            }
            None => {
                for (index, raw) in record.iter().enumerate() {
                    row.insert(index.to_string(), parse_cell(raw));
                }
            }
        }
        row
    }
}

impl Iterator for TableReader {
    type Item = Result<Row, TableError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        self.row += 1;
        Some(
            record
                .map(|record| self.to_row(&record))
                .map_err(|source| TableError::Read {
                    path: self.path.clone(),
                    row: self.row,
                    source,
                }),
        )
    }
}

/// Reads every row of a table.
///
/// # Errors
///
/// Returns the first [`TableError`] encountered.
pub fn read_table(
    path: impl AsRef<Path>,
    separator: u8,
    header: bool,
) -> Result<Vec<Row>, TableError> {
    TableReader::open(path, separator, header)?.collect()
}
