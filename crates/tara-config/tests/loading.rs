//! Configuration Loading Tests
//!
//! Loads configuration documents from disk in both supported formats and
//! checks that classification holds at every tier boundary.

use std::io::Write;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tara_config::{AssessmentConfig, ConfigError};

fn builtin() -> AssessmentConfig {
    AssessmentConfig::builtin().unwrap()
}

/// Tenet: a file on disk loads to the same configuration as the embedded reference
#[test]
fn json_file_matches_builtin() {
    let config = builtin();
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(config.to_json().unwrap().as_bytes()).unwrap();

    let loaded = AssessmentConfig::from_path(file.path()).unwrap();
    assert_eq!(loaded, config);
}

/// Tenet: YAML files are detected by extension
#[test]
fn yaml_file_is_accepted() {
    let config = builtin();
    let value: serde_json::Value = serde_json::from_str(&config.to_json().unwrap()).unwrap();
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(serde_yaml::to_string(&value).unwrap().as_bytes())
        .unwrap();

    let loaded = AssessmentConfig::from_path(file.path()).unwrap();
    assert_eq!(loaded.thresholds(), config.thresholds());
    assert_eq!(loaded.fingerprint(), config.fingerprint());
}

/// Tenet: an unreadable path is an I/O error naming the path
#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let err = AssessmentConfig::from_path(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("absent.json"));
}

/// Tenet: an empty document is missing every section
#[test]
fn empty_object_misses_all_sections() {
    let err = AssessmentConfig::from_json("{}").unwrap_err();
    match err {
        ConfigError::MissingSections(names) => assert_eq!(names.len(), 7),
        other => panic!("unexpected error: {other}"),
    }
}

/// Tenet: each tier's own minimum classifies into that tier, and just below it
/// into the next lower tier
#[test]
fn every_threshold_boundary() {
    let config = builtin();
    let thresholds = config.thresholds();
    for (i, t) in thresholds.iter().enumerate() {
        assert_eq!(config.classify(t.min).label_en, t.label_en);
        let below = config.classify(t.min - 0.01);
        let expected = thresholds.get(i + 1).unwrap_or(t);
        assert_eq!(below.label_en, expected.label_en);
    }
}

proptest! {
    /// Tenet: the tier returned never has a minimum above the score unless it is the floor
    #[test]
    fn classification_is_monotone(a in -1.0f64..5.0, b in -1.0f64..5.0) {
        let config = builtin();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(config.classify(lo).min <= config.classify(hi).min);

        let tier = config.classify(hi);
        let floor = config.thresholds().last().unwrap();
        prop_assert!(tier.min <= hi || tier.label_en == floor.label_en);
    }
}
