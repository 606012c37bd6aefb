//! Testing utilities for TARA workspace
//!
//! Shared fixtures: the reference configuration and a calculation analysis
//! whose trees have hand-checked R and RR values.

#![allow(missing_docs)]

use std::sync::Arc;

use tara_config::AssessmentConfig;
use tara_core::{
    Analysis, Asset, AttackTree, ImpactMatrix, Kstu, Leaf, Node, ResidualAssessment, RiskEngine,
    Treatment,
};

/// Hand-checked result for one fixture tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Expected {
    pub uid: &'static str,
    pub id: &'static str,
    pub risk: f64,
    pub risk_level: &'static str,
    pub residual: f64,
    pub residual_level: &'static str,
    pub treatment: &'static str,
}

pub const EXPECTED: [Expected; 6] = [
    Expected {
        uid: "risk_calc_0001",
        id: "T01",
        risk: 1.50,
        risk_level: "medium",
        residual: 0.40,
        residual_level: "low",
        treatment: "Mitigiert",
    },
    Expected {
        uid: "risk_calc_0002",
        id: "T02",
        risk: 1.80,
        risk_level: "high",
        residual: 1.80,
        residual_level: "high",
        treatment: "Akzeptiert",
    },
    Expected {
        uid: "risk_calc_0003",
        id: "T03",
        risk: 2.20,
        risk_level: "critical",
        residual: 1.40,
        residual_level: "medium",
        treatment: "Gemischt",
    },
    Expected {
        uid: "risk_calc_0004",
        id: "T04",
        risk: 2.00,
        risk_level: "critical",
        residual: 2.00,
        residual_level: "critical",
        treatment: "-",
    },
    Expected {
        uid: "risk_calc_0005",
        id: "T05",
        risk: 1.60,
        risk_level: "high",
        residual: 1.60,
        residual_level: "high",
        treatment: "Delegiert",
    },
    Expected {
        uid: "risk_calc_0006",
        id: "T06",
        risk: 2.20,
        risk_level: "critical",
        residual: 1.40,
        residual_level: "medium",
        treatment: "Gemischt",
    },
];

pub fn reference_config() -> Arc<AssessmentConfig> {
    Arc::new(AssessmentConfig::builtin().unwrap())
}

pub fn reference_engine() -> RiskEngine {
    RiskEngine::new(reference_config())
}

pub fn kstu(k: &str, s: &str, t: &str, u: &str) -> Kstu {
    Kstu::new(k, s, t, u)
}

pub fn low() -> Kstu {
    kstu("0.1", "0.1", "0.1", "0.1")
}

/// Leaf hitting DS1 (I(N) = 1.00 in the fixture)
pub fn leaf(uid: &str, values: Kstu) -> Leaf {
    Leaf::with_uid(uid, format!("Attack step {uid}"))
        .scenarios(["DS1"])
        .likelihood(values)
}

/// Two assets, three rated damage scenarios
pub fn base_analysis() -> Analysis {
    let mut analysis = Analysis::new("tara-calc", "Calculation fixture", &reference_config());
    analysis.assets = vec![
        Asset::new("A01", "Steering controller", ["III", "II", "I"]),
        Asset::new("A02", "Telematics gateway", ["II", "I", "-"]),
    ];
    analysis.impact_matrix = ImpactMatrix::new()
        .with("A01", "DS1", "3")
        .with("A01", "DS2", "2")
        .with("A01", "DS3", "1")
        .with("A02", "DS1", "2")
        .with("A02", "DS2", "3")
        .with("A02", "DS3", "2");
    analysis
}

fn trees() -> Vec<AttackTree> {
    vec![
        AttackTree::with_uid("risk_calc_0001", "T01", "All mitigated")
            .path(Node::with_uid("node_t01_a", "Path A").leaf(leaf("leaf_t01_a", kstu("0.5", "0.3", "0.2", "0.1"))))
            .path(Node::with_uid("node_t01_b", "Path B").leaf(leaf("leaf_t01_b", kstu("0.3", "0.1", "0.4", "0.3")))),
        AttackTree::with_uid("risk_calc_0002", "T02", "All accepted")
            .path(Node::with_uid("node_t02_a", "Path A").leaf(leaf("leaf_t02_a", kstu("0.5", "0.3", "0.5", "0.5")))),
        AttackTree::with_uid("risk_calc_0003", "T03", "Mixed treatment")
            .path(
                Node::with_uid("node_t03_a", "Path A")
                    .leaf(leaf("leaf_t03_a", kstu("0.7", "0.5", "0.5", "0.5")))
                    .leaf(leaf("leaf_t03_c", kstu("0.3", "0.1", "0.2", "0.1"))),
            )
            .path(Node::with_uid("node_t03_b", "Path B").leaf(leaf("leaf_t03_b", kstu("0.5", "0.3", "0.3", "0.3")))),
        AttackTree::with_uid("risk_calc_0004", "T04", "Untreated")
            .path(Node::with_uid("node_t04_a", "Path A").leaf(leaf("leaf_t04_a", kstu("0.5", "0.5", "0.5", "0.5")))),
        AttackTree::with_uid("risk_calc_0005", "T05", "Delegated")
            .path(Node::with_uid("node_t05_a", "Path A").leaf(leaf("leaf_t05_a", kstu("0.3", "0.3", "0.5", "0.5")))),
        AttackTree::with_uid("risk_calc_0006", "T06", "Deep nesting")
            .path(
                Node::with_uid("node_t06_path_a", "Path A")
                    .child(
                        Node::with_uid("node_t06_a1", "A1")
                            .leaf(leaf("leaf_t06_a1a", kstu("0.3", "0.1", "0.3", "0.3")))
                            .leaf(leaf("leaf_t06_a1b", kstu("0.5", "0.3", "0.5", "0.1"))),
                    )
                    .child(Node::with_uid("node_t06_a2", "A2").leaf(leaf("leaf_t06_a2", kstu("0.1", "0.5", "0.1", "0.5")))),
            )
            .path(
                Node::with_uid("node_t06_path_b", "Path B")
                    .child(Node::with_uid("node_t06_b1", "B1").leaf(leaf("leaf_t06_b1", kstu("0.7", "0.3", "0.3", "0.3")))),
            ),
    ]
}

/// Residual assessments of the fixture: (tree uid, leaf uid, assessment)
pub fn treatments() -> Vec<(&'static str, &'static str, ResidualAssessment)> {
    let mitigated = |values: Kstu| ResidualAssessment::new(Treatment::Mitigated, values);
    let accepted = || ResidualAssessment::new(Treatment::Accepted, Kstu::unset());
    vec![
        ("risk_calc_0001", "leaf_t01_a", mitigated(low())),
        ("risk_calc_0001", "leaf_t01_b", mitigated(low())),
        ("risk_calc_0002", "leaf_t02_a", accepted()),
        ("risk_calc_0003", "leaf_t03_a", mitigated(kstu("0.3", "0.1", "0.1", "0.1"))),
        ("risk_calc_0003", "leaf_t03_b", accepted()),
        ("risk_calc_0003", "leaf_t03_c", mitigated(low())),
        (
            "risk_calc_0005",
            "leaf_t05_a",
            ResidualAssessment::new(Treatment::Delegated, Kstu::unset()),
        ),
        ("risk_calc_0006", "leaf_t06_a1a", mitigated(low())),
        ("risk_calc_0006", "leaf_t06_a1b", accepted()),
        ("risk_calc_0006", "leaf_t06_a2", mitigated(low())),
        ("risk_calc_0006", "leaf_t06_b1", mitigated(low())),
    ]
}

/// Calculation fixture, refreshed and with every treatment recorded
pub fn calc_fixture() -> Analysis {
    let engine = reference_engine();
    let mut analysis = base_analysis();
    for tree in trees() {
        analysis.add_tree(tree);
    }
    engine.refresh(&mut analysis);
    for (tree, leaf, assessment) in treatments() {
        engine.set_residual(&mut analysis, tree, leaf, assessment).unwrap();
    }
    analysis
}

/// Compare two scores at the 2-decimal display precision
pub fn assert_score(actual: f64, expected: f64, context: &str) {
    assert!(
        (actual - expected).abs() < 0.005,
        "{context}: expected {expected:.2}, got {actual:.2}"
    );
}
