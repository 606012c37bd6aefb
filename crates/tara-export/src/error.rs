//! Error types for DOT export

use tara_core::EngineError;

/// Export error
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The tree filter matched no attack tree
    #[error("no attack tree matches '{0}'")]
    TreeNotFound(String),

    /// Writing the output failed
    #[error("formatting failed: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// Engine error
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Result alias for export operations
pub type ExportResult<T> = Result<T, ExportError>;
