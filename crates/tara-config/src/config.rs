//! Assessment configuration
//!
//! Loaded once, validated, then handed out read-only (typically behind an
//! `Arc`). All scoring functions receive it explicitly.

use std::collections::HashSet;
use std::path::Path;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::error::{ConfigError, ConfigResult};
use crate::fingerprint::ConfigFingerprint;
use crate::sections::{
    ConfigDocument, DamageScenarioTemplate, ImpactScale, ProbabilityCriteria, ProtectionLevels,
    RiskThreshold, RiskUnknown, REQUIRED_SECTIONS,
};

/// Reference configuration shipped with the crate
const BUILTIN_JSON: &str = include_str!("../config/assessment_config.json");

/// Placeholder shown for a missing score
pub const NO_VALUE: &str = "-";

/// Validated, immutable assessment configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentConfig {
    doc: ConfigDocument,
    fingerprint: ConfigFingerprint,
}

/// Presentation data for a score (or for its absence)
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskMeta {
    /// Display label of the matched tier or of `riskUnknown`
    pub label: String,
    /// Classification key, `None` when no score exists
    pub label_en: Option<String>,
    /// Hex colour
    pub color: String,
    /// Optional RGB triple
    pub color_rgb: Option<[u8; 3]>,
    /// Score formatted with 2 decimals, or `-`
    pub display: String,
}

impl AssessmentConfig {
    /// Parse and validate a JSON document
    ///
    /// # Errors
    /// Returns error if the JSON is malformed, a section is missing or a
    /// section violates its constraints
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let value: JsonValue = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Parse and validate a YAML document
    ///
    /// # Errors
    /// Returns error if the YAML is malformed or validation fails
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        let value: JsonValue = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Load from a file; `.yaml`/`.yml` are read as YAML, anything else as JSON
    ///
    /// # Errors
    /// Returns error if the file cannot be read or validation fails
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

        let config = if is_yaml {
            Self::from_yaml(&raw)?
        } else {
            Self::from_json(&raw)?
        };
        tracing::info!(
            "Assessment config v{} loaded from {}",
            config.version().unwrap_or("?"),
            path.display()
        );
        Ok(config)
    }

    /// Reference configuration compiled into the crate
    ///
    /// # Errors
    /// Only fails if the embedded document is broken
    pub fn builtin() -> ConfigResult<Self> {
        Self::from_json(BUILTIN_JSON)
    }

    /// Validate an already parsed document
    ///
    /// # Errors
    /// Returns error if a section is missing or invalid
    pub fn from_value(value: JsonValue) -> ConfigResult<Self> {
        let object = value.as_object().ok_or(ConfigError::NotAnObject)?;
        let missing: Vec<String> = REQUIRED_SECTIONS
            .iter()
            .filter(|key| !object.contains_key(**key))
            .map(|key| (*key).to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingSections(missing));
        }

        let fingerprint = ConfigFingerprint::of(&value);
        let doc: ConfigDocument = serde_json::from_value(value)?;
        validate(&doc)?;

        tracing::debug!(
            "Assessment config validated: {} thresholds, fingerprint {}",
            doc.risk_thresholds.len(),
            fingerprint.short()
        );
        Ok(Self { doc, fingerprint })
    }

    /// `_meta.version`, if present
    #[inline]
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.doc.meta.as_ref().map(|m| m.version.as_str())
    }

    /// Content fingerprint
    #[inline]
    #[must_use]
    pub fn fingerprint(&self) -> &ConfigFingerprint {
        &self.fingerprint
    }

    /// Impact scale
    #[inline]
    #[must_use]
    pub fn impact_scale(&self) -> &ImpactScale {
        &self.doc.impact_scale
    }

    /// Severity factor per impact level
    #[inline]
    #[must_use]
    pub fn severity_factors(&self) -> &IndexMap<String, f64> {
        &self.doc.severity_level_factors
    }

    /// Protection level weights and ranking
    #[inline]
    #[must_use]
    pub fn protection_levels(&self) -> &ProtectionLevels {
        &self.doc.protection_levels
    }

    /// Probability criteria
    #[inline]
    #[must_use]
    pub fn probability_criteria(&self) -> &ProbabilityCriteria {
        &self.doc.probability_criteria
    }

    /// Thresholds, sorted descending by `min`
    #[inline]
    #[must_use]
    pub fn thresholds(&self) -> &[RiskThreshold] {
        &self.doc.risk_thresholds
    }

    /// Fallback presentation
    #[inline]
    #[must_use]
    pub fn risk_unknown(&self) -> &RiskUnknown {
        &self.doc.risk_unknown
    }

    /// Damage scenario templates
    #[inline]
    #[must_use]
    pub fn default_damage_scenarios(&self) -> &[DamageScenarioTemplate] {
        &self.doc.default_damage_scenarios
    }

    /// Severity factor of an impact level
    #[inline]
    #[must_use]
    pub fn severity_factor(&self, level: &str) -> Option<f64> {
        self.doc.severity_level_factors.get(level).copied()
    }

    /// Factor of the lowest impact level, used for lookup misses
    #[must_use]
    pub fn lowest_severity_factor(&self) -> f64 {
        self.doc
            .severity_level_factors
            .values()
            .copied()
            .fold(f64::INFINITY, f64::min)
            .min(1.0)
            .max(0.0)
    }

    /// Weight of a protection level
    #[inline]
    #[must_use]
    pub fn protection_weight(&self, level: &str) -> Option<f64> {
        self.doc.protection_levels.weights.get(level).copied()
    }

    /// Weight of the lowest-ranked weighted level
    #[must_use]
    pub fn lowest_protection_weight(&self) -> f64 {
        let levels = &self.doc.protection_levels;
        levels
            .weights
            .iter()
            .min_by_key(|(level, _)| levels.ranking.get(*level).copied().unwrap_or(u32::MAX))
            .map_or(0.0, |(_, w)| *w)
    }

    /// Rank of a protection level (0 for unknown levels)
    #[inline]
    #[must_use]
    pub fn protection_rank(&self, level: &str) -> u32 {
        self.doc
            .protection_levels
            .ranking
            .get(level.trim())
            .copied()
            .unwrap_or(0)
    }

    /// Highest-ranked of the given levels, `-` when none is ranked above zero
    #[must_use]
    pub fn max_protection_level<'a>(&self, levels: impl IntoIterator<Item = &'a str>) -> String {
        levels
            .into_iter()
            .map(str::trim)
            .filter(|l| self.protection_rank(l) > 0)
            .max_by_key(|l| self.protection_rank(l))
            .map_or_else(|| NO_VALUE.to_string(), str::to_string)
    }

    /// Threshold tier for a score
    ///
    /// Returns the first tier whose `min` is not above the score. Scores below
    /// every tier (and NaN) fall into the lowest tier.
    #[must_use]
    pub fn classify(&self, score: f64) -> &RiskThreshold {
        let thresholds = &self.doc.risk_thresholds;
        let idx = thresholds
            .iter()
            .position(|t| score >= t.min)
            .unwrap_or(thresholds.len() - 1);
        &thresholds[idx]
    }

    /// Presentation data for an optional score
    #[must_use]
    pub fn risk_meta(&self, score: Option<f64>) -> RiskMeta {
        match score.filter(|s| s.is_finite()) {
            Some(s) => {
                let tier = self.classify(s);
                RiskMeta {
                    label: tier.label.clone(),
                    label_en: Some(tier.label_en.clone()),
                    color: tier.color.clone(),
                    color_rgb: tier.color_rgb,
                    display: format!("{s:.2}"),
                }
            }
            None => {
                let unknown = &self.doc.risk_unknown;
                RiskMeta {
                    label: unknown.label.clone(),
                    label_en: None,
                    color: unknown.color.clone(),
                    color_rgb: unknown.color_rgb,
                    display: NO_VALUE.to_string(),
                }
            }
        }
    }

    /// Serialize back to pretty JSON
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(&self.doc)?)
    }
}

fn validate(doc: &ConfigDocument) -> ConfigResult<()> {
    if doc.impact_scale.valid_values.is_empty() {
        return Err(ConfigError::invalid("impactScale", "validValues must not be empty"));
    }

    for (level, factor) in &doc.severity_level_factors {
        if !(0.0..=1.0).contains(factor) {
            return Err(ConfigError::invalid(
                "severityLevelFactors",
                format!("factor for `{level}` must be within [0, 1], got {factor}"),
            ));
        }
    }

    let levels = &doc.protection_levels;
    if levels.weights.is_empty() {
        return Err(ConfigError::invalid("protectionLevels", "weights must not be empty"));
    }
    for (level, weight) in &levels.weights {
        if !(*weight > 0.0 && *weight <= 1.0) {
            return Err(ConfigError::invalid(
                "protectionLevels",
                format!("weight for `{level}` must be within (0, 1], got {weight}"),
            ));
        }
        if !levels.ranking.contains_key(level) {
            return Err(ConfigError::invalid(
                "protectionLevels",
                format!("weighted level `{level}` has no ranking"),
            ));
        }
    }
    if levels.ranking.values().zip(levels.ranking.values().skip(1)).any(|(a, b)| b <= a) {
        return Err(ConfigError::invalid(
            "protectionLevels",
            "ranking must be strictly ascending",
        ));
    }

    for (dimension, criterion) in doc.probability_criteria.iter() {
        if criterion.options.is_empty() {
            return Err(ConfigError::invalid(
                "probabilityCriteria",
                format!("{dimension} has no options"),
            ));
        }
        for option in &criterion.options {
            let ok = option
                .value
                .trim()
                .parse::<f64>()
                .is_ok_and(|v| (0.0..=1.0).contains(&v));
            if !ok {
                return Err(ConfigError::invalid(
                    "probabilityCriteria",
                    format!("{dimension} option `{}` is not a decimal in [0, 1]", option.value),
                ));
            }
        }
    }

    let thresholds = &doc.risk_thresholds;
    if thresholds.len() < 2 {
        return Err(ConfigError::invalid(
            "riskThresholds",
            format!("must contain at least 2 entries, got {}", thresholds.len()),
        ));
    }
    if thresholds.iter().any(|t| !t.min.is_finite()) {
        return Err(ConfigError::invalid("riskThresholds", "min must be finite"));
    }
    if thresholds.windows(2).any(|w| w[1].min >= w[0].min) {
        return Err(ConfigError::invalid(
            "riskThresholds",
            "must be sorted strictly descending by min",
        ));
    }
    let mut seen = HashSet::new();
    for t in thresholds {
        if t.label_en.trim().is_empty() {
            return Err(ConfigError::invalid("riskThresholds", "labelEn must not be empty"));
        }
        if !seen.insert(t.label_en.as_str()) {
            return Err(ConfigError::invalid(
                "riskThresholds",
                format!("duplicate labelEn `{}`", t.label_en),
            ));
        }
    }

    let mut ids = HashSet::new();
    for ds in &doc.default_damage_scenarios {
        if !ids.insert(ds.id.as_str()) {
            return Err(ConfigError::invalid(
                "defaultDamageScenarios",
                format!("duplicate id `{}`", ds.id),
            ));
        }
    }

    Ok(())
}
