//! Typed configuration sections
//!
//! Each struct mirrors one top-level section of the assessment document.
//! Field names follow the document's camelCase keys.

use std::fmt::{self, Display, Formatter};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One of the four likelihood dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Dimension {
    /// Knowledge / complexity
    #[serde(rename = "K")]
    K,
    /// Scaling
    #[serde(rename = "S")]
    S,
    /// Time / effort
    #[serde(rename = "T")]
    T,
    /// Utility for the attacker
    #[serde(rename = "U")]
    U,
}

impl Dimension {
    /// All dimensions in display order
    pub const ALL: [Dimension; 4] = [Self::K, Self::S, Self::T, Self::U];

    /// Upper-case key as used in configuration documents
    #[inline]
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::K => "K",
            Self::S => "S",
            Self::T => "T",
            Self::U => "U",
        }
    }
}

impl Display for Dimension {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// `_meta` block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    /// Configuration version string
    pub version: String,
    /// Free-text description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Impact scale definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactScale {
    /// Ordered valid impact levels
    pub valid_values: Vec<String>,
    /// Display label per level
    #[serde(default)]
    pub labels: IndexMap<String, String>,
    /// Presentation class per level
    #[serde(default)]
    pub css_classes: IndexMap<String, String>,
}

impl ImpactScale {
    /// Check if a level is part of the scale
    #[inline]
    #[must_use]
    pub fn is_valid(&self, level: &str) -> bool {
        self.valid_values.iter().any(|v| v == level)
    }

    /// Display label for a level, falling back to the level itself
    #[must_use]
    pub fn label<'a>(&'a self, level: &'a str) -> &'a str {
        self.labels.get(level).map_or(level, String::as_str)
    }
}

/// Protection level weights and ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtectionLevels {
    /// Weight per protection level, in (0, 1]
    pub weights: IndexMap<String, f64>,
    /// Ascending rank per protection level
    pub ranking: IndexMap<String, u32>,
}

/// Selectable value of a probability criterion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionOption {
    /// Decimal value as string
    pub value: String,
    /// Display text
    pub text: String,
}

/// One probability criterion (K, S, T or U)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    /// Short label
    pub label: String,
    /// Long label
    #[serde(default)]
    pub full_label: String,
    /// Selectable options
    pub options: Vec<CriterionOption>,
}

/// The four probability criteria
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityCriteria {
    /// Knowledge / complexity
    #[serde(rename = "K")]
    pub k: Criterion,
    /// Scaling
    #[serde(rename = "S")]
    pub s: Criterion,
    /// Time / effort
    #[serde(rename = "T")]
    pub t: Criterion,
    /// Utility
    #[serde(rename = "U")]
    pub u: Criterion,
}

impl ProbabilityCriteria {
    /// Criterion for a dimension
    #[inline]
    #[must_use]
    pub fn get(&self, dimension: Dimension) -> &Criterion {
        match dimension {
            Dimension::K => &self.k,
            Dimension::S => &self.s,
            Dimension::T => &self.t,
            Dimension::U => &self.u,
        }
    }

    /// Iterate criteria with their dimension
    pub fn iter(&self) -> impl Iterator<Item = (Dimension, &Criterion)> {
        Dimension::ALL.into_iter().map(move |d| (d, self.get(d)))
    }
}

/// Risk classification tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskThreshold {
    /// Inclusive lower bound
    pub min: f64,
    /// Display label
    pub label: String,
    /// Stable classification key
    pub label_en: String,
    /// Hex colour
    pub color: String,
    /// Optional RGB triple
    #[serde(rename = "colorRGB", default, skip_serializing_if = "Option::is_none")]
    pub color_rgb: Option<[u8; 3]>,
}

/// Fallback presentation when no score exists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskUnknown {
    /// Display label
    pub label: String,
    /// Hex colour
    pub color: String,
    /// Optional RGB triple
    #[serde(rename = "colorRGB", default, skip_serializing_if = "Option::is_none")]
    pub color_rgb: Option<[u8; 3]>,
}

/// Damage scenario template seeded into new analyses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageScenarioTemplate {
    /// Identifier (e.g. `DS1`)
    pub id: String,
    /// Display name
    pub name: String,
    /// Short code
    pub short: String,
    /// Description
    #[serde(default)]
    pub description: String,
}

/// Full typed document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConfigDocument {
    #[serde(rename = "_meta", default, skip_serializing_if = "Option::is_none")]
    pub(crate) meta: Option<Meta>,
    pub(crate) impact_scale: ImpactScale,
    pub(crate) severity_level_factors: IndexMap<String, f64>,
    pub(crate) protection_levels: ProtectionLevels,
    pub(crate) probability_criteria: ProbabilityCriteria,
    pub(crate) risk_thresholds: Vec<RiskThreshold>,
    pub(crate) risk_unknown: RiskUnknown,
    pub(crate) default_damage_scenarios: Vec<DamageScenarioTemplate>,
}

/// Required top-level keys
pub(crate) const REQUIRED_SECTIONS: [&str; 7] = [
    "impactScale",
    "severityLevelFactors",
    "protectionLevels",
    "probabilityCriteria",
    "riskThresholds",
    "riskUnknown",
    "defaultDamageScenarios",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_keys_round_trip_through_serde() {
        for d in Dimension::ALL {
            let json = serde_json::to_string(&d).unwrap();
            assert_eq!(json, format!("\"{}\"", d.key()));
            let back: Dimension = serde_json::from_str(&json).unwrap();
            assert_eq!(back, d);
        }
    }

    #[test]
    fn impact_scale_label_falls_back_to_level() {
        let scale = ImpactScale {
            valid_values: vec!["N/A".into(), "1".into()],
            labels: IndexMap::from([("1".to_string(), "Low".to_string())]),
            css_classes: IndexMap::new(),
        };
        assert_eq!(scale.label("1"), "Low");
        assert_eq!(scale.label("N/A"), "N/A");
        assert!(scale.is_valid("N/A"));
        assert!(!scale.is_valid("4"));
    }

    #[test]
    fn threshold_accepts_missing_rgb() {
        let t: RiskThreshold = serde_json::from_str(
            r##"{"min": 0.8, "label": "Mittel", "labelEn": "medium", "color": "#f39c12"}"##,
        )
        .unwrap();
        assert_eq!(t.label_en, "medium");
        assert!(t.color_rgb.is_none());
    }
}
