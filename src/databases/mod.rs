//! One adapter per source database, all driving the shared resolution
//! engine over that database's record format.

pub mod amrfinderplus;
pub mod argannot;
pub mod bacmet;
pub mod card;
pub mod csabapal;
pub mod megares;
pub mod metalres;
pub mod panres;
pub mod resfinder;
pub mod resfinderfg;

use camino::Utf8Path;
use csv::StringRecord;

use crate::error::PanResError;

/// A fully loaded delimited annotation table with named-column access.
/// Structural problems (missing file, unreadable rows, absent required
/// columns) are fatal; adapters never work around them.
pub(crate) struct Table {
    name: String,
    headers: StringRecord,
    records: Vec<StringRecord>,
}

impl Table {
    /// Loads a table, skipping `skip_lines` physical lines before the
    /// header row (the base gene table carries one line of front matter).
    pub(crate) fn open(path: &Utf8Path, skip_lines: usize) -> Result<Self, PanResError> {
        if !path.as_std_path().exists() {
            return Err(PanResError::InputNotFound(path.to_path_buf().into_std_path_buf()));
        }
        let content = std::fs::read_to_string(path.as_std_path())
            .map_err(|err| PanResError::Filesystem(format!("read {path}: {err}")))?;
        let body: String = content
            .lines()
            .skip(skip_lines)
            .collect::<Vec<_>>()
            .join("\n");
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter_for(path))
            .flexible(true)
            .from_reader(body.as_bytes());
        let malformed = |err: csv::Error| PanResError::MalformedTable {
            path: path.to_path_buf().into_std_path_buf(),
            message: err.to_string(),
        };
        let headers = reader.headers().map_err(malformed)?.clone();
        let records = reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(malformed)?;
        Ok(Self {
            name: path.as_str().to_string(),
            headers,
            records,
        })
    }

    pub(crate) fn column(&self, name: &str) -> Result<usize, PanResError> {
        self.headers
            .iter()
            .position(|header| header.trim() == name)
            .ok_or_else(|| PanResError::MissingColumn {
                sheet: self.name.clone(),
                column: name.to_string(),
            })
    }

    pub(crate) fn records(&self) -> &[StringRecord] {
        &self.records
    }
}

pub(crate) fn delimiter_for(path: &Utf8Path) -> u8 {
    match path.extension() {
        Some("csv") => b',',
        _ => b'\t',
    }
}

pub(crate) fn field<'a>(record: &'a StringRecord, index: usize) -> &'a str {
    record.get(index).unwrap_or("").trim()
}
