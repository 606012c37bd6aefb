//! TARA Assessment Configuration
//!
//! Validated, immutable configuration consumed by the risk engine.
//!
//! # Core Concepts
//!
//! - [`AssessmentConfig`]: The validated document with typed accessors
//! - [`RiskThreshold`]: Classification tier; [`AssessmentConfig::classify`] maps a score to one
//! - [`ConfigFingerprint`]: Blake3 hash of the canonical document
//! - [`Dimension`]: The four likelihood dimensions K, S, T, U
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tara_config::AssessmentConfig;
//!
//! let config = Arc::new(AssessmentConfig::from_path("assessment_config.json")?);
//! let tier = config.classify(1.5);
//! assert_eq!(tier.label_en, "medium");
//! println!("config {} ({})", config.version().unwrap_or("?"), config.fingerprint().short());
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

mod config;
mod error;
mod fingerprint;
mod sections;

pub use config::{AssessmentConfig, RiskMeta, NO_VALUE};
pub use error::{ConfigError, ConfigResult};
pub use fingerprint::ConfigFingerprint;
pub use sections::{
    Criterion, CriterionOption, DamageScenarioTemplate, Dimension, ImpactScale, Meta,
    ProbabilityCriteria, ProtectionLevels, RiskThreshold, RiskUnknown,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
