//! Analysis document: assets, damage scenarios, impact matrix and trees

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use tara_config::{AssessmentConfig, DamageScenarioTemplate};

use crate::error::{EngineError, EngineResult};
use crate::kstu::lenient_string;
use crate::model::AttackTree;
use crate::residual::ResidualStore;

/// Impact level used when the matrix has no entry
pub const DEFAULT_IMPACT_LEVEL: &str = "N/A";

/// Protected asset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Identifier
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Confidentiality protection level
    #[serde(default, deserialize_with = "lenient_string")]
    pub confidentiality: String,
    /// Integrity protection level
    #[serde(default, deserialize_with = "lenient_string")]
    pub integrity: String,
    /// Availability / authenticity protection level
    #[serde(default, alias = "authenticity", deserialize_with = "lenient_string")]
    pub availability: String,
    /// Stored overall protection need
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schutzbedarf: Option<String>,
}

impl Asset {
    /// New asset with C/I/A levels
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        cia: [&str; 3],
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            confidentiality: cia[0].to_string(),
            integrity: cia[1].to_string(),
            availability: cia[2].to_string(),
            schutzbedarf: None,
        }
    }

    /// Overall protection need: the highest-ranked C/I/A level
    ///
    /// Falls back to the stored value when none of the three is rated.
    #[must_use]
    pub fn protection_need(&self, config: &AssessmentConfig) -> String {
        let derived = config.max_protection_level([
            self.confidentiality.as_str(),
            self.integrity.as_str(),
            self.availability.as_str(),
        ]);
        match (&self.schutzbedarf, config.protection_rank(&derived)) {
            (Some(stored), 0) if config.protection_rank(stored) > 0 => stored.clone(),
            _ => derived,
        }
    }
}

/// Damage scenario
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageScenario {
    /// Identifier (e.g. `DS1`)
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Short code
    #[serde(default)]
    pub short: String,
    /// Description
    #[serde(default)]
    pub description: String,
}

impl From<&DamageScenarioTemplate> for DamageScenario {
    fn from(t: &DamageScenarioTemplate) -> Self {
        Self {
            id: t.id.clone(),
            name: t.name.clone(),
            short: t.short.clone(),
            description: t.description.clone(),
        }
    }
}

/// Impact ratings: asset id -> damage scenario id -> impact level
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImpactMatrix(BTreeMap<String, BTreeMap<String, String>>);

impl ImpactMatrix {
    /// Empty matrix
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a rating
    pub fn set(
        &mut self,
        asset: impl Into<String>,
        scenario: impl Into<String>,
        level: impl Into<String>,
    ) {
        self.0
            .entry(asset.into())
            .or_default()
            .insert(scenario.into(), level.into());
    }

    /// Builder form of [`ImpactMatrix::set`]
    #[must_use]
    pub fn with(
        mut self,
        asset: impl Into<String>,
        scenario: impl Into<String>,
        level: impl Into<String>,
    ) -> Self {
        self.set(asset, scenario, level);
        self
    }

    /// Ratings of one asset, if it has a row
    #[inline]
    #[must_use]
    pub fn row(&self, asset: &str) -> Option<&BTreeMap<String, String>> {
        self.0.get(asset)
    }

    /// Rating of a pair, `N/A` when unset
    #[must_use]
    pub fn level(&self, asset: &str, scenario: &str) -> &str {
        self.row(asset)
            .and_then(|r| r.get(scenario))
            .map_or(DEFAULT_IMPACT_LEVEL, String::as_str)
    }
}

/// One analysis document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    /// Identifier
    #[serde(default)]
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Assets
    #[serde(default)]
    pub assets: Vec<Asset>,
    /// Damage scenarios
    #[serde(default)]
    pub damage_scenarios: Vec<DamageScenario>,
    /// Impact matrix
    #[serde(default)]
    pub impact_matrix: ImpactMatrix,
    /// Attack trees
    #[serde(default)]
    pub risk_entries: Vec<AttackTree>,
    /// Residual twins of the attack trees
    #[serde(default)]
    pub residual_risk: ResidualStore,
}

impl Analysis {
    /// New analysis seeded with the configured default damage scenarios
    pub fn new(id: impl Into<String>, name: impl Into<String>, config: &AssessmentConfig) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            damage_scenarios: config
                .default_damage_scenarios()
                .iter()
                .map(DamageScenario::from)
                .collect(),
            ..Self::default()
        }
    }

    /// Parse from JSON
    ///
    /// # Errors
    /// Returns error if the document is malformed
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let mut analysis: Self = serde_json::from_str(json)?;
        analysis.assign_missing_uids();
        Ok(analysis)
    }

    /// Give uid-less trees, nodes and leaves their positional ids
    ///
    /// Applied alike to the attack trees and their residual entries, so a
    /// document without ids keeps matching its residual assessments.
    /// Returns the number of ids assigned.
    pub fn assign_missing_uids(&mut self) -> usize {
        let mut assigned = 0;
        for (position, tree) in self.risk_entries.iter_mut().enumerate() {
            assigned += tree.assign_missing_uids(position);
        }
        for (position, entry) in self.residual_risk.entries_mut().iter_mut().enumerate() {
            assigned += entry.assign_missing_uids(position);
        }
        if assigned > 0 {
            tracing::debug!("Assigned {} positional ids in analysis {}", assigned, self.id);
        }
        assigned
    }

    /// Serialize to pretty JSON
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Find a tree by uid or display id
    ///
    /// # Errors
    /// Returns [`EngineError::TreeNotFound`] if no tree matches
    pub fn tree(&self, key: &str) -> EngineResult<&AttackTree> {
        self.risk_entries
            .iter()
            .find(|t| t.uid == key)
            .or_else(|| self.risk_entries.iter().find(|t| t.id == key))
            .ok_or_else(|| EngineError::TreeNotFound(key.to_string()))
    }

    /// Find a tree mutably by uid or display id
    ///
    /// # Errors
    /// Returns [`EngineError::TreeNotFound`] if no tree matches
    pub fn tree_mut(&mut self, key: &str) -> EngineResult<&mut AttackTree> {
        let idx = self
            .risk_entries
            .iter()
            .position(|t| t.uid == key)
            .or_else(|| self.risk_entries.iter().position(|t| t.id == key))
            .ok_or_else(|| EngineError::TreeNotFound(key.to_string()))?;
        Ok(&mut self.risk_entries[idx])
    }

    /// Next free display id (`R01`, `R02`, ...)
    #[must_use]
    pub fn next_risk_id(&self) -> String {
        let max = self
            .risk_entries
            .iter()
            .filter_map(|t| t.id.strip_prefix('R'))
            .filter(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
            .filter_map(|n| n.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        format!("R{:02}", max + 1)
    }

    /// Add a tree, assigning the next display id when it has none
    pub fn add_tree(&mut self, mut tree: AttackTree) -> &AttackTree {
        if tree.id.trim().is_empty() {
            tree.id = self.next_risk_id();
        }
        self.risk_entries.push(tree);
        let last = self.risk_entries.len() - 1;
        &self.risk_entries[last]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AssessmentConfig {
        AssessmentConfig::builtin().unwrap()
    }

    #[test]
    fn protection_need_is_max_ranked_level() {
        let cfg = config();
        assert_eq!(Asset::new("A", "a", ["I", "III", "II"]).protection_need(&cfg), "III");
        assert_eq!(Asset::new("A", "a", ["-", "II", ""]).protection_need(&cfg), "II");
        assert_eq!(Asset::new("A", "a", ["-", "-", "-"]).protection_need(&cfg), "-");

        let mut stored = Asset::new("A", "a", ["", "", ""]);
        stored.schutzbedarf = Some("II".into());
        assert_eq!(stored.protection_need(&cfg), "II");
    }

    #[test]
    fn authenticity_alias() {
        let asset: Asset =
            serde_json::from_str(r#"{"id": "A", "authenticity": "III"}"#).unwrap();
        assert_eq!(asset.availability, "III");
    }

    #[test]
    fn matrix_defaults_to_na() {
        let m = ImpactMatrix::new().with("A01", "DS1", "3");
        assert_eq!(m.level("A01", "DS1"), "3");
        assert_eq!(m.level("A01", "DS9"), "N/A");
        assert_eq!(m.level("A99", "DS1"), "N/A");
        assert!(m.row("A99").is_none());
    }

    #[test]
    fn new_analysis_has_default_scenarios() {
        let a = Analysis::new("tara-001", "Test", &config());
        let ids: Vec<_> = a.damage_scenarios.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["DS1", "DS2", "DS3", "DS4", "DS5"]);
    }

    #[test]
    fn next_risk_id_skips_foreign_ids() {
        let mut a = Analysis::default();
        assert_eq!(a.next_risk_id(), "R01");
        a.add_tree(AttackTree::new("", "first"));
        a.add_tree(AttackTree::new("R07", "second"));
        a.add_tree(AttackTree::new("T01", "third"));
        assert_eq!(a.risk_entries[0].id, "R01");
        assert_eq!(a.next_risk_id(), "R08");
    }

    #[test]
    fn documents_without_uids_load_identically() {
        let json = r#"{
            "riskEntries": [{"id": "R01", "treeV2": {"children": [{"impacts": [{"k": "0.5"}]}]}}],
            "residualRisk": {"entries": [{"id": "R01", "treeV2": {"children": [{"impacts": [
                {"k": "0.5", "rr": {"treatment": "Mitigiert", "k": "0.1"}}
            ]}]}}]}
        }"#;
        let first = Analysis::from_json(json).unwrap();
        let second = Analysis::from_json(json).unwrap();
        assert_eq!(first, second);

        let source = &first.risk_entries[0];
        let entry = &first.residual_risk.entries()[0];
        assert_eq!(source.uid, "risk_R01");
        assert_eq!(entry.uid, source.uid);
        assert_eq!(source.leaves()[0].uid, "risk_R01_root_N0_L0");
        assert_eq!(entry.leaf("risk_R01_root_N0_L0").unwrap().rr.kstu.k, "0.1");
    }

    #[test]
    fn tree_lookup_by_uid_or_id() {
        let mut a = Analysis::default();
        a.add_tree(AttackTree::with_uid("risk_a", "R01", "A"));
        assert_eq!(a.tree("risk_a").unwrap().id, "R01");
        assert_eq!(a.tree("R01").unwrap().uid, "risk_a");
        assert!(matches!(a.tree("R02"), Err(EngineError::TreeNotFound(k)) if k == "R02"));
        a.tree_mut("R01").unwrap().root_name = "B".into();
        assert_eq!(a.risk_entries[0].root_name, "B");
    }
}
