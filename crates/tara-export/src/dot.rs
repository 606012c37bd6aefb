//! Graphviz rendering
//!
//! Two views share one layout: the risk view shows the original values of
//! every node and leaf, the residual view adds the residual values, RR and
//! the treatment. Nodes are `record` shapes coloured by classification and
//! ranked by depth.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use once_cell::sync::Lazy;
use regex::Regex;

use tara_config::NO_VALUE;
use tara_core::{
    derive_residual, format_score, risk_score, Analysis, AttackTree, Kstu, Leaf, Node,
    ResidualView, RiskEngine, TreatmentSummary,
};

use crate::error::{ExportError, ExportResult};
use crate::options::DotOptions;

static UNSAFE_ID_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]").expect("Invalid regex"));

const GRAPH_ATTRS: [&str; 7] = [
    "rankdir=TB",
    "overlap=false",
    "splines=spline",
    "nodesep=1.0",
    "ranksep=1.2",
    "concentrate=true",
    "ordering=out",
];

/// Replace every character outside `[A-Za-z0-9_]` with `_`
#[must_use]
pub fn safe_id(raw: &str) -> String {
    UNSAFE_ID_CHARS.replace_all(raw, "_").into_owned()
}

/// Make text safe inside a record label
#[must_use]
pub fn clean_label(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push(' '),
            '\r' => {}
            '{' | '}' | '<' | '>' | '|' | '"' => out.push('\''),
            other => out.push(other),
        }
    }
    out
}

/// Graph element handed to a label style
#[derive(Clone, Copy)]
enum Element<'a> {
    Root(&'a AttackTree),
    Node(&'a Node),
    Leaf(&'a Leaf),
}

/// Label and fill of one graph node
struct Styled {
    label: String,
    fill: String,
}

/// Node id suffixes of one view
struct IdScheme {
    root: &'static str,
    node: &'static str,
    leaf: &'static str,
    caption: &'static str,
}

const RISK_IDS: IdScheme = IdScheme {
    root: "_Root",
    node: "_N",
    leaf: "_L",
    caption: "treeV2",
};

const RESIDUAL_IDS: IdScheme = IdScheme {
    root: "_Root_RR",
    node: "_N_RR",
    leaf: "_L_RR",
    caption: "Residual Risk",
};

#[derive(Default)]
struct Layout {
    root: String,
    nodes: Vec<String>,
    edges: Vec<String>,
    ranks: BTreeMap<usize, Vec<String>>,
}

impl Layout {
    fn build<F>(tree: &AttackTree, ids: &IdScheme, mut style: F) -> Self
    where
        F: FnMut(Element<'_>) -> Styled,
    {
        let prefix = safe_id(if tree.id.is_empty() { &tree.uid } else { &tree.id });
        let root = format!("{prefix}{}", ids.root);
        let mut layout = Self::default();
        layout.push_node(&root, &style(Element::Root(tree)));
        layout.root = root.clone();

        for leaf in &tree.root.impacts {
            layout.visit_leaf(&prefix, ids, &root, leaf, 1, &mut style);
        }
        for child in &tree.root.children {
            layout.visit_node(&prefix, ids, &root, child, 1, &mut style);
        }
        layout
    }

    fn visit_node<F>(&mut self, prefix: &str, ids: &IdScheme, parent: &str, node: &Node, depth: usize, style: &mut F)
    where
        F: FnMut(Element<'_>) -> Styled,
    {
        let id = format!("{prefix}{}{}", ids.node, safe_id(&node.uid));
        self.push_node(&id, &style(Element::Node(node)));
        self.edges.push(format!("    {parent} -> {id}"));
        self.ranks.entry(depth).or_default().push(id.clone());

        for leaf in &node.impacts {
            self.visit_leaf(prefix, ids, &id, leaf, depth + 1, style);
        }
        for child in &node.children {
            self.visit_node(prefix, ids, &id, child, depth + 1, style);
        }
    }

    fn visit_leaf<F>(&mut self, prefix: &str, ids: &IdScheme, parent: &str, leaf: &Leaf, depth: usize, style: &mut F)
    where
        F: FnMut(Element<'_>) -> Styled,
    {
        let id = format!("{prefix}{}{}", ids.leaf, safe_id(&leaf.uid));
        self.push_node(&id, &style(Element::Leaf(leaf)));
        self.edges.push(format!("    {parent} -> {id}"));
        self.ranks.entry(depth).or_default().push(id);
    }

    fn push_node(&mut self, id: &str, styled: &Styled) {
        self.nodes.push(format!(
            "    {id} [label=\"{{{}}}\", style=filled, fillcolor=\"{}\"]",
            styled.label, styled.fill
        ));
    }

    fn write(&self, out: &mut String, tree: &AttackTree, caption: &str) -> std::fmt::Result {
        writeln!(out, "    // Tree {} ({caption})", tree.id)?;
        for line in self.nodes.iter().chain(&self.edges) {
            writeln!(out, "{line}")?;
        }
        writeln!(out, "    {{ rank=source; {}; }}", self.root)?;
        for ids in self.ranks.values() {
            writeln!(out, "    {{ rank=same; {}; }}", ids.join("; "))?;
        }
        writeln!(out)
    }
}

fn header(out: &mut String, node_font: u8, edge_font: u8) -> std::fmt::Result {
    out.push_str("digraph {\n\n");
    writeln!(out, "    node [shape=record, fontname=\"Arial\", fontsize={node_font}];")?;
    writeln!(out, "    edge [fontname=\"Arial\", fontsize={edge_font}];")?;
    for attr in GRAPH_ATTRS {
        writeln!(out, "    {attr};")?;
    }
    writeln!(out)
}

/// DOT exporter over a risk engine
#[derive(Debug, Clone)]
pub struct DotExporter<'e> {
    engine: &'e RiskEngine,
    options: DotOptions,
}

impl<'e> DotExporter<'e> {
    /// Create exporter
    #[must_use]
    pub fn new(engine: &'e RiskEngine, options: DotOptions) -> Self {
        Self { engine, options }
    }

    /// Get options
    #[inline]
    #[must_use]
    pub fn options(&self) -> &DotOptions {
        &self.options
    }

    /// Render the original risk of the selected trees
    ///
    /// Refreshes the analysis first. Returns `None` if it has no trees.
    ///
    /// # Errors
    /// Returns [`ExportError::TreeNotFound`] if the tree filter matches nothing
    pub fn risk_view(&self, analysis: &mut Analysis) -> ExportResult<Option<String>> {
        self.engine.refresh(analysis);
        if analysis.risk_entries.is_empty() {
            return Ok(None);
        }
        let trees = self.select(analysis)?;

        let mut out = String::new();
        header(&mut out, 10, 9)?;
        for tree in &trees {
            let layout = Layout::build(tree, &RISK_IDS, |element| self.risk_style(element));
            layout.write(&mut out, tree, RISK_IDS.caption)?;
        }
        out.push_str("}\n");
        tracing::info!("Rendered risk view of {} attack trees", trees.len());
        Ok(Some(out))
    }

    /// Render the residual risk of the selected trees
    ///
    /// Refreshes the analysis (including the residual store) first. Returns
    /// `None` if it has no trees.
    ///
    /// # Errors
    /// Returns [`ExportError::TreeNotFound`] if the tree filter matches nothing
    pub fn residual_view(&self, analysis: &mut Analysis) -> ExportResult<Option<String>> {
        self.engine.refresh(analysis);
        if analysis.risk_entries.is_empty() {
            return Ok(None);
        }
        let trees = self.select(analysis)?;

        let mut out = String::new();
        header(&mut out, 9, 8)?;
        for tree in &trees {
            let entry = analysis
                .residual_risk
                .entry(&tree.uid)
                .ok_or_else(|| ExportError::TreeNotFound(tree.uid.clone()))?;
            let view = derive_residual(self.engine.config(), tree, entry);
            let lookup = ResidualLookup::new(&view);
            let layout = Layout::build(tree, &RESIDUAL_IDS, |element| {
                self.residual_style(element, &view, &lookup)
            });
            layout.write(&mut out, tree, RESIDUAL_IDS.caption)?;
        }
        out.push_str("}\n");
        tracing::info!("Rendered residual view of {} attack trees", trees.len());
        Ok(Some(out))
    }

    fn select<'a>(&self, analysis: &'a Analysis) -> ExportResult<Vec<&'a AttackTree>> {
        match &self.options.tree {
            None => Ok(analysis.risk_entries.iter().collect()),
            Some(key) => analysis
                .tree(key)
                .map(|tree| vec![tree])
                .map_err(|_| ExportError::TreeNotFound(key.clone())),
        }
    }

    fn number(&self, value: Option<f64>) -> String {
        value.map_or_else(
            || NO_VALUE.to_string(),
            |v| format_score(v, self.options.decimal_separator),
        )
    }

    /// Score and fill; without an impact the score is 0 and the fill unknown
    fn score(&self, i_norm: Option<f64>, kstu: &Kstu) -> (f64, &str) {
        let score = risk_score(i_norm, kstu);
        let fill = match i_norm {
            Some(_) => {
                let level = &self.engine.config().classify(score).label_en;
                self.options.palette.fill(Some(level))
            }
            None => self.options.palette.fill(None),
        };
        (score, fill)
    }

    fn base_fields(&self, text: &str, kstu: &Kstu, i_norm: Option<f64>) -> (String, String) {
        let (score, fill) = self.score(i_norm, kstu);
        let fields = format!(
            "{} | P = {} | I[norm] = {} | R = {}",
            clean_label(text),
            kstu.display(self.options.decimal_separator),
            self.number(i_norm),
            format_score(score, self.options.decimal_separator),
        );
        (fields, fill.to_string())
    }

    fn risk_style(&self, element: Element<'_>) -> Styled {
        let (text, kstu, i_norm) = parts(element);
        let (label, fill) = self.base_fields(text, kstu, i_norm);
        Styled { label, fill }
    }

    fn residual_style(&self, element: Element<'_>, view: &ResidualView, lookup: &ResidualLookup<'_>) -> Styled {
        let (text, kstu, i_norm) = parts(element);
        let (base, _) = self.base_fields(text, kstu, i_norm);

        let (residual_kstu, treatment) = match element {
            Element::Root(_) => (&view.tree.kstu, view.treatment.label()),
            Element::Node(node) => lookup.nodes.get(node.uid.as_str()).map_or(
                (&node.kstu, TreatmentSummary::of_node(node).label()),
                |r| (&r.kstu, TreatmentSummary::of_node(r).label()),
            ),
            Element::Leaf(leaf) => lookup.leaves.get(leaf.uid.as_str()).map_or(
                (&leaf.kstu, leaf.rr.treatment.label()),
                |r| (&r.kstu, r.rr.treatment.label()),
            ),
        };
        let (rr, fill) = self.score(i_norm, residual_kstu);
        let label = format!(
            "{base} | P(RR) = {} | RR = {} | Behandlung: {treatment}",
            residual_kstu.display(self.options.decimal_separator),
            format_score(rr, self.options.decimal_separator),
        );
        Styled {
            label,
            fill: fill.to_string(),
        }
    }
}

fn parts(element: Element<'_>) -> (&str, &Kstu, Option<f64>) {
    match element {
        Element::Root(tree) => {
            let text = if tree.root_name.trim().is_empty() {
                tree.root.title.as_str()
            } else {
                tree.root_name.as_str()
            };
            (text, &tree.kstu, tree.i_norm)
        }
        Element::Node(node) => (node.title.as_str(), &node.kstu, node.i_norm),
        Element::Leaf(leaf) => (leaf.text.as_str(), &leaf.kstu, leaf.i_norm),
    }
}

/// Derived residual nodes and leaves by uid
struct ResidualLookup<'a> {
    nodes: HashMap<&'a str, &'a Node>,
    leaves: HashMap<&'a str, &'a Leaf>,
}

impl<'a> ResidualLookup<'a> {
    fn new(view: &'a ResidualView) -> Self {
        let mut nodes = HashMap::new();
        view.tree.root.for_each_node(&mut |n: &'a Node| {
            nodes.insert(n.uid.as_str(), n);
        });
        let mut leaves = HashMap::new();
        view.tree.for_each_leaf(&mut |l: &'a Leaf| {
            leaves.insert(l.uid.as_str(), l);
        });
        Self { nodes, leaves }
    }
}
