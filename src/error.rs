use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum PanResError {
    #[error("invalid pan-gene identifier: {0}")]
    InvalidPanGeneId(String),

    #[error("unknown source database tag: {0}")]
    UnknownDatabase(String),

    #[error("missing config file panres-kb.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("input file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("malformed input table {path}: {message}")]
    MalformedTable { path: PathBuf, message: String },

    #[error("reference workbook sheet not found: {0}")]
    MissingSheet(String),

    #[error("sheet {sheet} is missing required column {column}")]
    MissingColumn { sheet: String, column: String },

    #[error("snapshot not found: {0}")]
    SnapshotNotFound(PathBuf),

    #[error("failed to parse snapshot: {0}")]
    SnapshotParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
