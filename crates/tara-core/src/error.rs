//! Error types for the risk engine
//!
//! Scoring, propagation and residual derivation never fail on a
//! structurally valid tree; errors only arise at the document boundary
//! (parsing, lookups by id).

use tara_config::ConfigError;

/// Risk engine error
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// No tree with this uid or display id
    #[error("attack tree not found: {0}")]
    TreeNotFound(String),

    /// No leaf with this uid in the tree
    #[error("leaf {leaf} not found in tree {tree}")]
    LeafNotFound {
        /// Tree uid
        tree: String,
        /// Leaf uid
        leaf: String,
    },

    /// Analysis document could not be (de)serialized
    #[error("invalid analysis document: {0}")]
    Document(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl EngineError {
    /// Check if the error is a failed lookup
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::TreeNotFound(_) | Self::LeafNotFound { .. })
    }
}

/// Result alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
