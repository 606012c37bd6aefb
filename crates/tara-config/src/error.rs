//! Error types for configuration loading and validation

use std::path::PathBuf;

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Document is not valid JSON or does not match the section schema
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Document is not valid YAML
    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    /// Top-level value is not an object
    #[error("configuration root must be an object")]
    NotAnObject,

    /// One or more required sections are absent
    #[error("missing required sections: {}", .0.join(", "))]
    MissingSections(Vec<String>),

    /// A section is present but violates its constraints
    #[error("invalid section `{section}`: {reason}")]
    InvalidSection {
        /// Section name as it appears in the document
        section: &'static str,
        /// Human readable reason
        reason: String,
    },

    /// File could not be read
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Create an invalid-section error
    #[inline]
    pub fn invalid(section: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidSection {
            section,
            reason: reason.into(),
        }
    }

    /// Check if the error is a missing-section error
    #[inline]
    #[must_use]
    pub fn is_missing_section(&self) -> bool {
        matches!(self, Self::MissingSections(_))
    }
}

/// Result alias for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sections_lists_every_name() {
        let err = ConfigError::MissingSections(vec!["riskUnknown".into(), "impactScale".into()]);
        assert_eq!(
            err.to_string(),
            "missing required sections: riskUnknown, impactScale"
        );
        assert!(err.is_missing_section());
    }

    #[test]
    fn invalid_section_message() {
        let err = ConfigError::invalid("riskThresholds", "must contain at least 2 entries");
        assert_eq!(
            err.to_string(),
            "invalid section `riskThresholds`: must contain at least 2 entries"
        );
        assert!(!err.is_missing_section());
    }
}
