//! TARA Risk Engine
//!
//! Attack-tree risk scoring and residual-risk derivation.
//!
//! # Core Concepts
//!
//! - [`AttackTree`]: Root [`Node`] with child nodes and impact [`Leaf`] entries
//! - [`Kstu`]: The four likelihood values of a leaf or node
//! - [`propagate`]: Worst-case (per-dimension maximum) aggregation towards the root
//! - [`ImpactAggregator`]: Normalised impact I(N) from assets and the impact matrix
//! - [`Score`]: `R = I(N) * (K + S + T + U)`, rounded and classified
//! - [`ResidualStore`]: Residual twins of the trees, rebuilt by [`ResidualStore::sync`]
//! - [`RiskEngine`]: Refreshes an [`Analysis`] and reports R and RR per tree
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tara_config::AssessmentConfig;
//! use tara_core::{Analysis, RiskEngine};
//!
//! let engine = RiskEngine::new(Arc::new(AssessmentConfig::builtin()?));
//! let mut analysis = Analysis::from_json(&std::fs::read_to_string("analysis.json")?)?;
//! for tree in engine.assess(&mut analysis) {
//!     println!("{}: R = {} RR = {}", tree.id, tree.risk.display(), tree.residual.display());
//! }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

mod analysis;
mod engine;
mod error;
mod impact;
mod kstu;
mod model;
mod propagation;
mod residual;
mod scoring;
mod treatment;

pub use analysis::{Analysis, Asset, DamageScenario, ImpactMatrix, DEFAULT_IMPACT_LEVEL};
pub use engine::{RiskEngine, TreeAssessment};
pub use error::{EngineError, EngineResult};
pub use impact::ImpactAggregator;
pub use kstu::{display_raw, format_level, parse_level, Kstu, WorstCase};
pub use model::{
    new_leaf_uid, new_node_uid, new_tree_uid, AttackTree, Leaf, Node, ResidualAssessment,
};
pub use propagation::{propagate, propagate_node};
pub use residual::{derive_residual, ResidualStore, ResidualView};
pub use scoring::{format_score, risk_score, round2, Score};
pub use treatment::{Treatment, TreatmentSummary};

pub use tara_config::{AssessmentConfig, Dimension};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
