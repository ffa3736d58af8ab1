use thiserror::Error;

use crate::schema::GeoLevel;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("required column `{0}` missing from block table")]
    MissingColumn(String),
    #[error("invalid value {value:?} in column `{column}` (row {row})")]
    InvalidNumber {
        column: String,
        row: usize,
        value: String,
    },
    #[error("{level} table is empty after {stage}")]
    EmptyLevel { level: GeoLevel, stage: &'static str },
    #[error("{rows} rows cannot be split into {folds} folds")]
    TooFewRows { rows: usize, folds: usize },
    #[error("archive {archive} has no entry matching {wanted}")]
    NoArchiveEntry { archive: String, wanted: String },
    #[error("boundary feature {index}: {reason}")]
    InvalidBoundary { index: usize, reason: String },
    #[error("least-squares solve failed: {0}")]
    Solve(String),
}
