//! Normalised impact I(N)
//!
//! For a set of damage scenarios, every asset with a matrix row contributes
//! `severity(rating) * weight(protection need)` per scenario; I(N) is the
//! largest such product. Pairs without a positive factor do not count, and
//! a set with no counting pair has no impact at all.

use tara_config::AssessmentConfig;

use crate::analysis::{Analysis, Asset, ImpactMatrix};
use crate::model::{AttackTree, Node};
use crate::scoring::round2;

/// Impact calculator over one analysis' assets and matrix
#[derive(Debug, Clone, Copy)]
pub struct ImpactAggregator<'a> {
    config: &'a AssessmentConfig,
    assets: &'a [Asset],
    matrix: &'a ImpactMatrix,
}

impl<'a> ImpactAggregator<'a> {
    /// Create over explicit inputs
    #[must_use]
    pub fn new(config: &'a AssessmentConfig, assets: &'a [Asset], matrix: &'a ImpactMatrix) -> Self {
        Self {
            config,
            assets,
            matrix,
        }
    }

    /// Create over an analysis
    #[must_use]
    pub fn for_analysis(config: &'a AssessmentConfig, analysis: &'a Analysis) -> Self {
        Self::new(config, &analysis.assets, &analysis.impact_matrix)
    }

    /// Weighted impact of one (asset, scenario) pair
    ///
    /// Ratings missing from the severity table count as the lowest level;
    /// protection needs without a weight use the lowest weight.
    #[must_use]
    pub fn weighted_impact(&self, asset: &Asset, scenario: &str) -> f64 {
        let level = self.matrix.level(&asset.id, scenario);
        let severity = self
            .config
            .severity_factor(level)
            .unwrap_or_else(|| self.config.lowest_severity_factor());
        let need = asset.protection_need(self.config);
        let weight = self
            .config
            .protection_weight(&need)
            .unwrap_or_else(|| self.config.lowest_protection_weight());
        severity * weight
    }

    /// I(N) for a set of damage scenarios, rounded to 2 decimals
    ///
    /// Returns `None` when no asset rates any of the scenarios above zero.
    #[must_use]
    pub fn normalized_impact<S: AsRef<str>>(&self, scenarios: &[S]) -> Option<f64> {
        let mut max: Option<f64> = None;
        for asset in self.assets {
            if self.matrix.row(&asset.id).is_none() {
                continue;
            }
            for scenario in scenarios {
                let weighted = self.weighted_impact(asset, scenario.as_ref());
                if weighted > 0.0 {
                    max = Some(max.map_or(weighted, |m: f64| m.max(weighted)));
                }
            }
        }
        max.map(round2)
    }

    /// Assign I(N) to every leaf and the maximum below to every node
    pub fn apply(&self, tree: &mut AttackTree) {
        tree.i_norm = self.apply_node(&mut tree.root);
        tracing::trace!("Impact of tree {}: {:?}", tree.uid, tree.i_norm);
    }

    fn apply_node(&self, node: &mut Node) -> Option<f64> {
        let mut max: Option<f64> = None;
        for leaf in &mut node.impacts {
            leaf.i_norm = self.normalized_impact(&leaf.ds);
            max = max_opt(max, leaf.i_norm);
        }
        for child in &mut node.children {
            let child_impact = self.apply_node(child);
            max = max_opt(max, child_impact);
        }
        node.i_norm = max;
        max
    }
}

fn max_opt(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, None) => x,
        (None, y) => y,
    }
}
