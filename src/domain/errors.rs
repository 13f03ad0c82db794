use thiserror::Error;

/// Errors raised when a grid is constructed from an inconsistent column set.
///
/// Interactive operations never fail; these only surface when the caller
/// hands the engine descriptors that cannot describe a table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("Column key must not be empty (column {0})")]
    EmptyColumnKey(usize),
    #[error("Duplicate column key: {0}")]
    DuplicateColumnKey(String),
    #[error("Column {key}: minWidth {min} exceeds maxWidth {max}")]
    InvalidWidthBounds { key: String, min: u32, max: u32 },
}

pub type DomainResult<T> = Result<T, DomainError>;
