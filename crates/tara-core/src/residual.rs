//! Residual twins of attack trees
//!
//! Every attack tree has a residual entry: a structural clone that carries
//! the per-leaf residual assessment. The store is rebuilt from the source
//! trees by id matching ([`ResidualStore::sync`]); residual assessments
//! survive for every leaf whose uid still exists. Residual scores are then
//! derived on a disposable copy ([`derive_residual`]).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use tara_config::{AssessmentConfig, Dimension};

use crate::error::{EngineError, EngineResult};
use crate::kstu::{parse_level, Kstu};
use crate::model::{AttackTree, Leaf, ResidualAssessment};
use crate::propagation::propagate;
use crate::scoring::Score;
use crate::treatment::TreatmentSummary;

/// Residual entries, one per attack tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResidualStore {
    #[serde(default)]
    entries: Vec<AttackTree>,
}

impl ResidualStore {
    /// All entries, in source order
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[AttackTree] {
        &self.entries
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [AttackTree] {
        &mut self.entries
    }

    /// Entry for a tree uid
    #[must_use]
    pub fn entry(&self, uid: &str) -> Option<&AttackTree> {
        self.entries.iter().find(|e| e.uid == uid)
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rebuild the entries from the source trees
    ///
    /// Each entry becomes a fresh clone of its source with derived node
    /// values cleared; leaf assessments are carried over by leaf uid, new
    /// leaves start untreated and entries of removed trees are dropped.
    /// Returns `true` if anything changed. Running it twice in a row leaves
    /// the store untouched the second time.
    pub fn sync(&mut self, sources: &[AttackTree]) -> bool {
        let previous = std::mem::take(&mut self.entries);

        let mut carried: HashMap<&str, HashMap<&str, &ResidualAssessment>> = HashMap::new();
        for entry in &previous {
            let leaves = carried.entry(entry.uid.as_str()).or_default();
            entry.for_each_leaf(&mut |leaf: &Leaf| {
                leaves.insert(leaf.uid.as_str(), &leaf.rr);
            });
        }

        let next: Vec<AttackTree> = sources
            .iter()
            .map(|source| mirror(source, carried.get(source.uid.as_str())))
            .collect();

        let changed = next != previous;
        if changed {
            let pruned = previous
                .iter()
                .filter(|p| !sources.iter().any(|s| s.uid == p.uid))
                .count();
            tracing::debug!(
                "Residual store resynchronised: {} entries, {} pruned",
                next.len(),
                pruned
            );
        }
        self.entries = next;
        changed
    }

    /// Record the residual assessment of one leaf
    ///
    /// # Errors
    /// Returns error if the tree or the leaf has no residual entry
    pub fn set_assessment(
        &mut self,
        tree_uid: &str,
        leaf_uid: &str,
        assessment: ResidualAssessment,
    ) -> EngineResult<()> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.uid == tree_uid)
            .ok_or_else(|| EngineError::TreeNotFound(tree_uid.to_string()))?;
        let leaf = entry.leaf_mut(leaf_uid).ok_or_else(|| EngineError::LeafNotFound {
            tree: tree_uid.to_string(),
            leaf: leaf_uid.to_string(),
        })?;
        leaf.rr = assessment;
        Ok(())
    }
}

fn mirror(source: &AttackTree, carried: Option<&HashMap<&str, &ResidualAssessment>>) -> AttackTree {
    let mut entry = source.clone();
    entry.kstu = Kstu::unset();
    entry.root.for_each_node_mut(&mut |node| node.kstu = Kstu::unset());
    entry.root.for_each_leaf_mut(&mut |leaf| {
        leaf.rr = carried
            .and_then(|m| m.get(leaf.uid.as_str()))
            .map(|rr| (*rr).clone())
            .unwrap_or_default();
    });
    entry
}

/// Residual view of one tree
#[derive(Debug, Clone, PartialEq)]
pub struct ResidualView {
    /// Propagated copy with mitigated leaf values substituted
    pub tree: AttackTree,
    /// Residual score (RR) with the source tree's impact
    pub score: Score,
    /// Tree-level treatment label
    pub treatment: TreatmentSummary,
}

/// Derive the residual view of `source` from its residual entry
///
/// Works on a copy of `entry`. Leaves treated as mitigated take their
/// non-empty residual values; all other leaves keep their original values.
/// A non-numeric residual value replaces the original and counts as unset.
/// A residual value above the original one is capped at the original so
/// that a mitigation never raises exposure.
#[must_use]
pub fn derive_residual(config: &AssessmentConfig, source: &AttackTree, entry: &AttackTree) -> ResidualView {
    let mut tree = entry.clone();
    tree.root.for_each_leaf_mut(&mut |leaf| {
        if leaf.rr.treatment.reduces_exposure() {
            leaf.kstu = mitigated_values(leaf);
        }
    });
    propagate(&mut tree);
    tree.i_norm = source.i_norm;

    let score = Score::compute(config, source.i_norm, &tree.kstu);
    let treatment = TreatmentSummary::of_node(&tree.root);
    tracing::debug!(
        "Residual risk of {}: {} ({})",
        source.id,
        score.display(),
        treatment
    );
    ResidualView {
        tree,
        score,
        treatment,
    }
}

fn mitigated_values(leaf: &Leaf) -> Kstu {
    let mut out = leaf.kstu.clone();
    for dimension in Dimension::ALL {
        let raw = leaf.rr.kstu.get(dimension).trim();
        if raw.is_empty() {
            continue;
        }
        let Some(residual) = parse_level(raw) else {
            tracing::warn!(
                "Leaf {}: residual {} value '{}' is not numeric, treated as unset",
                leaf.uid,
                dimension,
                raw
            );
            *out.get_mut(dimension) = raw.to_string();
            continue;
        };
        match leaf.kstu.value(dimension) {
            Some(original) if residual > original => {
                tracing::warn!(
                    "Leaf {}: residual {} = {} exceeds original {}, capped",
                    leaf.uid,
                    dimension,
                    residual,
                    original
                );
            }
            _ => *out.get_mut(dimension) = raw.to_string(),
        }
    }
    out
}
