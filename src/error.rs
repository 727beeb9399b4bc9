use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeyForgeError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Geometry Error: {0}")]
    Geometry(String),

    #[error("Invalid Chromosome: {0}")]
    InvalidChromosome(String),

    #[error("Continuation Mismatch: {0}")]
    ContinuationMismatch(String),

    #[error("Run cancelled")]
    Cancelled,

    #[error("Runtime Error: {0}")]
    Runtime(String),
}

pub type KfResult<T> = Result<T, KeyForgeError>;

/// Failure of a single evaluation job. Always recovered by the coordinator.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EvalError {
    #[error("dataset '{0}' is not registered with this worker")]
    UnknownDataset(String),

    #[error("chromosome rejected: {0}")]
    InvalidChromosome(String),

    #[error("simulation failed: {0}")]
    Simulation(String),

    #[error("evaluation panicked: {0}")]
    Panicked(String),

    #[error("evaluation exceeded {0} ms")]
    TimedOut(u64),
}
