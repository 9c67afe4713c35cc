//! Error types for destilar

use thiserror::Error;

use crate::config::ValidationError;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("Cannot split {rows} rows into {n_crops} equal crops")]
    UnevenCrops { rows: usize, n_crops: usize },

    #[error("Empty input: {rows} rows x {cols} classes")]
    EmptyBatch { rows: usize, cols: usize },

    #[error("Epoch {epoch} out of range for a {num_epochs}-epoch schedule")]
    EpochOutOfRange { epoch: usize, num_epochs: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, Error>;
