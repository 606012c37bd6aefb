//! Functional tests for the DOT risk and residual views.
//!
//! Renders the calculation fixture and checks:
//! - Node ids, labels and fill colours of both views.
//! - Residual values and treatment labels at every level.
//! - Tree filtering and empty documents.

use pretty_assertions::assert_eq;
use regex::Regex;

use tara_core::{Analysis, AttackTree, Kstu, Leaf, Node};
use tara_export::{DotExporter, DotOptions, ExportError};
use tara_test_utils::{calc_fixture, reference_engine};

fn line<'a>(dot: &'a str, id: &str) -> &'a str {
    let prefix = format!("    {id} [");
    dot.lines()
        .find(|l| l.starts_with(&prefix))
        .unwrap_or_else(|| panic!("no node {id} in\n{dot}"))
}

/// Tenet: the risk view shows original values with a classification colour.
#[test]
fn risk_view_labels() {
    let engine = reference_engine();
    let mut analysis = calc_fixture();
    let dot = DotExporter::new(&engine, DotOptions::default())
        .risk_view(&mut analysis)
        .unwrap()
        .unwrap();

    assert!(dot.starts_with("digraph {\n\n"));
    assert!(dot.ends_with("}\n"));
    assert_eq!(dot.matches("(treeV2)").count(), 6);

    assert_eq!(
        line(&dot, "T01_Root"),
        "    T01_Root [label=\"{All mitigated | P = 0,5 / 0,3 / 0,4 / 0,3 | I[norm] = 1,00 | R = 1,50}\", style=filled, fillcolor=\"#ffffcc\"]"
    );
    assert_eq!(
        line(&dot, "T01_Lleaf_t01_a"),
        "    T01_Lleaf_t01_a [label=\"{Attack step leaf_t01_a | P = 0,5 / 0,3 / 0,2 / 0,1 | I[norm] = 1,00 | R = 1,10}\", style=filled, fillcolor=\"#ffffcc\"]"
    );
    assert!(line(&dot, "T03_Root").ends_with("fillcolor=\"#ffcccc\"]"));
    assert!(line(&dot, "T02_Root").ends_with("fillcolor=\"#ffe0b3\"]"));
}

/// Tenet: edges follow the tree and every depth shares a rank.
#[test]
fn risk_view_structure() {
    let engine = reference_engine();
    let mut analysis = calc_fixture();
    let dot = DotExporter::new(&engine, DotOptions::default().tree("T01"))
        .risk_view(&mut analysis)
        .unwrap()
        .unwrap();

    let expected_tail = [
        "    T01_Root -> T01_Nnode_t01_a",
        "    T01_Nnode_t01_a -> T01_Lleaf_t01_a",
        "    T01_Root -> T01_Nnode_t01_b",
        "    T01_Nnode_t01_b -> T01_Lleaf_t01_b",
        "    { rank=source; T01_Root; }",
        "    { rank=same; T01_Nnode_t01_a; T01_Nnode_t01_b; }",
        "    { rank=same; T01_Lleaf_t01_a; T01_Lleaf_t01_b; }",
        "",
        "}",
        "",
    ]
    .join("\n");
    assert!(dot.ends_with(&expected_tail), "{dot}");
    assert!(dot.contains("    // Tree T01 (treeV2)\n"));
    assert!(!dot.contains("T02_"));
}

/// Tenet: the residual view adds P(RR), RR and the treatment per element.
#[test]
fn residual_view_labels() {
    let engine = reference_engine();
    let mut analysis = calc_fixture();
    let dot = DotExporter::new(&engine, DotOptions::default())
        .residual_view(&mut analysis)
        .unwrap()
        .unwrap();

    assert!(dot.contains("    node [shape=record, fontname=\"Arial\", fontsize=9];\n"));
    assert_eq!(dot.matches("(Residual Risk)").count(), 6);
    assert_eq!(
        line(&dot, "T01_Root_RR"),
        "    T01_Root_RR [label=\"{All mitigated | P = 0,5 / 0,3 / 0,4 / 0,3 | I[norm] = 1,00 | R = 1,50 | P(RR) = 0,1 / 0,1 / 0,1 / 0,1 | RR = 0,40 | Behandlung: Mitigiert}\", style=filled, fillcolor=\"#ccffcc\"]"
    );

    let root = Regex::new(r"(?m)^    (T\d\d)_Root_RR \[label=.*\| RR = (\d+,\d\d) \| Behandlung: ([^}]+)\}").unwrap();
    let found: Vec<(String, String, String)> = root
        .captures_iter(&dot)
        .map(|c| (c[1].to_string(), c[2].to_string(), c[3].to_string()))
        .collect();
    let expected = [
        ("T01", "0,40", "Mitigiert"),
        ("T02", "1,80", "Akzeptiert"),
        ("T03", "1,40", "Gemischt"),
        ("T04", "2,00", "-"),
        ("T05", "1,60", "Delegiert"),
        ("T06", "1,40", "Gemischt"),
    ];
    assert_eq!(found.len(), expected.len());
    for ((id, rr, treatment), (want_id, want_rr, want_treatment)) in found.iter().zip(expected) {
        assert_eq!((id.as_str(), rr.as_str(), treatment.as_str()), (want_id, want_rr, want_treatment));
    }
}

/// Tenet: leaves show their own treatment and nested nodes their residual values.
#[test]
fn residual_view_inner_elements() {
    let engine = reference_engine();
    let mut analysis = calc_fixture();
    let dot = DotExporter::new(&engine, DotOptions::default())
        .residual_view(&mut analysis)
        .unwrap()
        .unwrap();

    let mitigated = line(&dot, "T03_L_RRleaf_t03_a");
    assert!(mitigated.contains("P(RR) = 0,3 / 0,1 / 0,1 / 0,1 | RR = 0,60 | Behandlung: Mitigiert"));
    let accepted = line(&dot, "T03_L_RRleaf_t03_b");
    assert!(accepted.contains("P(RR) = 0,5 / 0,3 / 0,3 / 0,3 | RR = 1,40 | Behandlung: Akzeptiert"));

    let a1 = line(&dot, "T06_N_RRnode_t06_a1");
    assert!(a1.contains("P = 0,5 / 0,3 / 0,5 / 0,3"));
    assert!(a1.contains("P(RR) = 0,5 / 0,3 / 0,5 / 0,1 | RR = 1,40 | Behandlung: Gemischt"));
    let path_b = line(&dot, "T06_N_RRnode_t06_path_b");
    assert!(path_b.contains("P(RR) = 0,1 / 0,1 / 0,1 / 0,1 | RR = 0,40 | Behandlung: Mitigiert"));

    for node in ["node_t06_path_a", "node_t06_a1", "node_t06_a2", "node_t06_path_b", "node_t06_b1"] {
        let l = line(&dot, &format!("T06_N_RR{node}"));
        assert!(!l.contains("P(RR) = - / - / - / -"), "{l}");
    }
}

/// Tenet: the residual view never stores derived values in the document.
#[test]
fn rendering_does_not_change_assessments() {
    let engine = reference_engine();
    let mut analysis = calc_fixture();
    engine.refresh(&mut analysis);
    let before = analysis.clone();
    let exporter = DotExporter::new(&engine, DotOptions::default());
    exporter.residual_view(&mut analysis).unwrap();
    exporter.risk_view(&mut analysis).unwrap();
    assert_eq!(analysis, before);
}

const WITHOUT_UIDS: &str = r#"{
    "riskEntries": [{
        "id": "R01", "rootName": "Root",
        "treeV2": {"title": "Root", "children": [{"title": "Path", "impacts": [
            {"text": "Step", "k": "0.5", "s": "0.3", "t": "0.4", "u": "0.3"}
        ]}]}
    }],
    "residualRisk": {"entries": [{
        "id": "R01", "rootName": "Root",
        "treeV2": {"title": "Root", "children": [{"title": "Path", "impacts": [
            {"text": "Step", "k": "0.5", "s": "0.3", "t": "0.4", "u": "0.3",
             "rr": {"treatment": "Mitigiert", "k": "0.1", "s": "0.1", "t": "0.1", "u": "0.1"}}
        ]}]}
    }]}
}"#;

/// Tenet: a document without ids renders the same on every load and keeps
/// its stored residual assessments.
#[test]
fn documents_without_uids_render_stably() {
    let engine = reference_engine();
    let exporter = DotExporter::new(&engine, DotOptions::default());
    let render = || {
        let mut analysis = Analysis::from_json(WITHOUT_UIDS).unwrap();
        exporter.residual_view(&mut analysis).unwrap().unwrap()
    };
    let first = render();
    assert_eq!(first, render());

    let root = line(&first, "R01_Root_RR");
    assert!(
        root.contains("P(RR) = 0,1 / 0,1 / 0,1 / 0,1 | RR = 0,00 | Behandlung: Mitigiert"),
        "{root}"
    );
    assert!(first.contains("    R01_L_RRrisk_R01_root_N0_L0 ["));
}

#[test]
fn unknown_tree_filter_is_an_error() {
    let engine = reference_engine();
    let mut analysis = calc_fixture();
    let exporter = DotExporter::new(&engine, DotOptions::default().tree("T99"));
    assert!(matches!(
        exporter.residual_view(&mut analysis),
        Err(ExportError::TreeNotFound(key)) if key == "T99"
    ));
}

#[test]
fn empty_analysis_renders_nothing() {
    let engine = reference_engine();
    let mut analysis = Analysis::default();
    let exporter = DotExporter::new(&engine, DotOptions::default());
    assert_eq!(exporter.risk_view(&mut analysis).unwrap(), None);
    assert_eq!(exporter.residual_view(&mut analysis).unwrap(), None);
}

fn without_impact() -> Analysis {
    let mut analysis = Analysis::default();
    analysis.add_tree(
        AttackTree::with_uid("risk_x", "R01", "No \"impact\" | yet").path(
            Node::with_uid("p", "Path").leaf(
                Leaf::with_uid("l", "Leaf").likelihood(Kstu::new("0.5", "", "0.1", "")),
            ),
        ),
    );
    analysis
}

/// Tenet: elements without impact are shown as unknown, not as low risk,
/// while their score still reads as a number.
#[test]
fn missing_impact_uses_unknown_fill() {
    let engine = reference_engine();
    let mut analysis = without_impact();
    let dot = DotExporter::new(&engine, DotOptions::default().decimal_separator('.'))
        .risk_view(&mut analysis)
        .unwrap()
        .unwrap();
    assert_eq!(
        line(&dot, "R01_Root"),
        "    R01_Root [label=\"{No 'impact' ' yet | P = 0.5 / - / 0.1 / - | I[norm] = - | R = 0.00}\", style=filled, fillcolor=\"#d6dbdf\"]"
    );
}

#[test]
fn missing_impact_scores_zero_in_residual_view() {
    let engine = reference_engine();
    let mut analysis = without_impact();
    let dot = DotExporter::new(&engine, DotOptions::default())
        .residual_view(&mut analysis)
        .unwrap()
        .unwrap();
    let root = line(&dot, "R01_Root_RR");
    assert!(
        root.contains("| I[norm] = - | R = 0,00 | P(RR) = 0,5 / - / 0,1 / - | RR = 0,00 | Behandlung: -}"),
        "{root}"
    );
    assert!(root.ends_with("fillcolor=\"#d6dbdf\"]"));
    let leaf = line(&dot, "R01_L_RRl");
    assert!(leaf.contains("| R = 0,00 |") && leaf.contains("| RR = 0,00 |"), "{leaf}");
}
