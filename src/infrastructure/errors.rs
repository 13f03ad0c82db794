use crate::domain::DomainError;
use thiserror::Error;

/// Failures at the edges of the grid: files, network and clipboard.
#[derive(Debug, Error)]
pub enum InfrastructureError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Clipboard unavailable: {0}")]
    Clipboard(#[from] arboard::Error),
    #[error("Unexpected data shape: {0}")]
    Shape(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

pub type InfrastructureResult<T> = Result<T, InfrastructureError>;
