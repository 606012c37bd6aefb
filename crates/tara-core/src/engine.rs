//! Risk engine
//!
//! Ties the pieces together for one analysis: impact assignment,
//! worst-case propagation, residual store synchronisation and residual
//! derivation. The configuration is shared read-only.

use std::sync::Arc;

use serde::Serialize;

use tara_config::AssessmentConfig;

use crate::analysis::Analysis;
use crate::error::{EngineError, EngineResult};
use crate::impact::ImpactAggregator;
use crate::model::{AttackTree, ResidualAssessment};
use crate::propagation::propagate;
use crate::residual::{derive_residual, ResidualView};
use crate::scoring::Score;
use crate::treatment::TreatmentSummary;

/// Risk and residual risk of one attack tree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeAssessment {
    /// Tree uid
    pub uid: String,
    /// Display id
    pub id: String,
    /// Root label
    pub root_name: String,
    /// Number of impact leaves
    pub leaf_count: usize,
    /// Original risk (R)
    pub risk: Score,
    /// Residual risk (RR)
    pub residual: Score,
    /// Tree-level treatment label
    pub treatment: TreatmentSummary,
}

impl TreeAssessment {
    /// Check if the residual differs from the original risk
    #[inline]
    #[must_use]
    pub fn is_reduced(&self) -> bool {
        self.residual.value < self.risk.value
    }
}

/// Risk engine over a shared configuration
#[derive(Debug, Clone)]
pub struct RiskEngine {
    config: Arc<AssessmentConfig>,
}

impl RiskEngine {
    /// Create engine
    #[must_use]
    pub fn new(config: Arc<AssessmentConfig>) -> Self {
        Self { config }
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &AssessmentConfig {
        &self.config
    }

    /// I(N) of a damage-scenario set within an analysis
    #[must_use]
    pub fn impact<S: AsRef<str>>(&self, analysis: &Analysis, scenarios: &[S]) -> Option<f64> {
        ImpactAggregator::for_analysis(&self.config, analysis).normalized_impact(scenarios)
    }

    /// Score a propagated tree with its own impact
    #[must_use]
    pub fn score(&self, tree: &AttackTree) -> Score {
        Score::compute(&self.config, tree.i_norm, &tree.kstu)
    }

    /// Recompute every derived value of the analysis
    ///
    /// Assigns impacts, propagates every tree and resynchronises the
    /// residual store. Returns `true` if the residual store changed.
    pub fn refresh(&self, analysis: &mut Analysis) -> bool {
        let aggregator =
            ImpactAggregator::new(&self.config, &analysis.assets, &analysis.impact_matrix);
        for tree in &mut analysis.risk_entries {
            aggregator.apply(tree);
            propagate(tree);
        }
        self.ensure_synced(analysis)
    }

    /// Bring the residual store in line with the attack trees
    ///
    /// Elements without a uid get their positional id first. Returns `true`
    /// if the store changed.
    pub fn ensure_synced(&self, analysis: &mut Analysis) -> bool {
        analysis.assign_missing_uids();
        analysis.residual_risk.sync(&analysis.risk_entries)
    }

    /// Record the residual assessment of a leaf
    ///
    /// # Errors
    /// Returns error if the tree or the leaf does not exist
    pub fn set_residual(
        &self,
        analysis: &mut Analysis,
        tree_key: &str,
        leaf_uid: &str,
        assessment: ResidualAssessment,
    ) -> EngineResult<()> {
        self.ensure_synced(analysis);
        let uid = analysis.tree(tree_key)?.uid.clone();
        analysis.residual_risk.set_assessment(&uid, leaf_uid, assessment)
    }

    /// Residual view of one tree (by uid or display id)
    ///
    /// # Errors
    /// Returns [`EngineError::TreeNotFound`] if no tree matches
    pub fn residual(&self, analysis: &mut Analysis, tree_key: &str) -> EngineResult<ResidualView> {
        self.refresh(analysis);
        let source = analysis.tree(tree_key)?;
        let entry = analysis
            .residual_risk
            .entry(&source.uid)
            .ok_or_else(|| EngineError::TreeNotFound(source.uid.clone()))?;
        Ok(derive_residual(&self.config, source, entry))
    }

    /// Risk and residual risk of every tree, in document order
    pub fn assess(&self, analysis: &mut Analysis) -> Vec<TreeAssessment> {
        self.refresh(analysis);
        let assessments: Vec<TreeAssessment> = analysis
            .risk_entries
            .iter()
            .zip(analysis.residual_risk.entries())
            .map(|(source, entry)| {
                let view = derive_residual(&self.config, source, entry);
                TreeAssessment {
                    uid: source.uid.clone(),
                    id: source.id.clone(),
                    root_name: source.root_name.clone(),
                    leaf_count: source.root.leaf_count(),
                    risk: self.score(source),
                    residual: view.score,
                    treatment: view.treatment,
                }
            })
            .collect();
        tracing::info!("Assessed {} attack trees", assessments.len());
        assessments
    }
}
