//! Attack-tree document model
//!
//! A tree is a root [`Node`] with ordered child nodes and ordered impact
//! [`Leaf`] entries on every node. Leaves carry the analyst's likelihood
//! values and the residual assessment; node values are derived.

use serde::{Deserialize, Serialize};

use crate::kstu::{lenient_string, Kstu};
use crate::treatment::Treatment;

/// Generate a node identifier
#[must_use]
pub fn new_node_uid() -> String {
    format!("node_{}", uuid::Uuid::new_v4().simple())
}

/// Generate a leaf identifier
#[must_use]
pub fn new_leaf_uid() -> String {
    format!("leaf_{}", uuid::Uuid::new_v4().simple())
}

/// Generate a tree identifier
#[must_use]
pub fn new_tree_uid() -> String {
    format!("risk_{}", uuid::Uuid::new_v4().simple())
}

/// Residual assessment recorded on a leaf
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResidualAssessment {
    /// Treatment decision
    #[serde(default)]
    pub treatment: Treatment,
    /// Free-text note
    #[serde(default, deserialize_with = "lenient_string")]
    pub note: String,
    /// Reference to the security concept / control
    #[serde(default, deserialize_with = "lenient_string")]
    pub security_concept: String,
    /// Residual likelihood values
    #[serde(flatten)]
    pub kstu: Kstu,
}

impl ResidualAssessment {
    /// Assessment with a treatment and residual values
    #[must_use]
    pub fn new(treatment: Treatment, kstu: Kstu) -> Self {
        Self {
            treatment,
            kstu,
            ..Self::default()
        }
    }
}

/// Impact leaf
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaf {
    /// Stable identifier, positional when loaded without one
    #[serde(default)]
    pub uid: String,
    /// Attack step description
    #[serde(default, deserialize_with = "lenient_string")]
    pub text: String,
    /// Affected damage scenario ids
    #[serde(default)]
    pub ds: Vec<String>,
    /// Likelihood values
    #[serde(flatten)]
    pub kstu: Kstu,
    /// Normalised impact, derived from `ds`
    #[serde(default, with = "impact_norm")]
    pub i_norm: Option<f64>,
    /// Residual assessment
    #[serde(default)]
    pub rr: ResidualAssessment,
}

impl Leaf {
    /// New leaf with a generated id
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_uid(new_leaf_uid(), text)
    }

    /// New leaf with a given id
    pub fn with_uid(uid: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            text: text.into(),
            ds: Vec::new(),
            kstu: Kstu::unset(),
            i_norm: None,
            rr: ResidualAssessment::default(),
        }
    }

    /// Set likelihood values
    #[must_use]
    pub fn likelihood(mut self, kstu: Kstu) -> Self {
        self.kstu = kstu;
        self
    }

    /// Set affected damage scenarios
    #[must_use]
    pub fn scenarios<I, S>(mut self, ds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ds = ds.into_iter().map(Into::into).collect();
        self
    }

    /// Set the residual assessment
    #[must_use]
    pub fn residual(mut self, rr: ResidualAssessment) -> Self {
        self.rr = rr;
        self
    }
}

/// Tree node (root, path or intermediate)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Stable identifier, positional when loaded without one
    #[serde(default)]
    pub uid: String,
    /// Node title
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    /// Derived worst-case likelihood
    #[serde(default)]
    pub kstu: Kstu,
    /// Derived maximum impact
    #[serde(default, with = "impact_norm")]
    pub i_norm: Option<f64>,
    /// Child nodes, in order
    #[serde(default)]
    pub children: Vec<Node>,
    /// Impact leaves attached to this node, in order
    #[serde(default)]
    pub impacts: Vec<Leaf>,
}

impl Node {
    /// New node with a generated id
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_uid(new_node_uid(), title)
    }

    /// New node with a given id
    pub fn with_uid(uid: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            title: title.into(),
            kstu: Kstu::unset(),
            i_norm: None,
            children: Vec::new(),
            impacts: Vec::new(),
        }
    }

    /// Append a child node
    #[must_use]
    pub fn child(mut self, node: Node) -> Self {
        self.children.push(node);
        self
    }

    /// Append an impact leaf
    #[must_use]
    pub fn leaf(mut self, leaf: Leaf) -> Self {
        self.impacts.push(leaf);
        self
    }

    /// Check if the node only holds leaves
    #[inline]
    #[must_use]
    pub fn is_leaf_container(&self) -> bool {
        self.children.is_empty() && !self.impacts.is_empty()
    }

    /// Visit every leaf in pre-order (own leaves first, then children)
    pub fn for_each_leaf<'a>(&'a self, f: &mut impl FnMut(&'a Leaf)) {
        for leaf in &self.impacts {
            f(leaf);
        }
        for child in &self.children {
            child.for_each_leaf(f);
        }
    }

    /// Visit every leaf mutably in pre-order
    pub fn for_each_leaf_mut(&mut self, f: &mut impl FnMut(&mut Leaf)) {
        for leaf in &mut self.impacts {
            f(leaf);
        }
        for child in &mut self.children {
            child.for_each_leaf_mut(f);
        }
    }

    /// Visit every node in pre-order, including this one
    pub fn for_each_node<'a>(&'a self, f: &mut impl FnMut(&'a Node)) {
        f(self);
        for child in &self.children {
            child.for_each_node(f);
        }
    }

    /// Visit every node mutably in pre-order, including this one
    pub fn for_each_node_mut(&mut self, f: &mut impl FnMut(&mut Node)) {
        f(self);
        for child in &mut self.children {
            child.for_each_node_mut(f);
        }
    }

    /// Number of leaves in the subtree
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.impacts.len() + self.children.iter().map(Node::leaf_count).sum::<usize>()
    }

    /// Give uid-less elements of the subtree a positional id
    ///
    /// The node itself takes `fallback`; leaves become `<uid>_L<index>` and
    /// children `<uid>_N<index>` of their parent. Returns the number of ids
    /// assigned.
    pub fn assign_missing_uids(&mut self, fallback: &str) -> usize {
        let mut assigned = 0;
        if self.uid.trim().is_empty() {
            self.uid = fallback.to_string();
            assigned += 1;
        }
        for (idx, leaf) in self.impacts.iter_mut().enumerate() {
            if leaf.uid.trim().is_empty() {
                leaf.uid = format!("{}_L{idx}", self.uid);
                assigned += 1;
            }
        }
        for (idx, child) in self.children.iter_mut().enumerate() {
            assigned += child.assign_missing_uids(&format!("{}_N{idx}", self.uid));
        }
        assigned
    }
}

/// Attack tree (`riskEntry`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackTree {
    /// Stable identifier, derived from the display id when loaded without one
    #[serde(default)]
    pub uid: String,
    /// Display id (e.g. `R01`)
    #[serde(default)]
    pub id: String,
    /// Root label
    #[serde(default, deserialize_with = "lenient_string")]
    pub root_name: String,
    /// Root node
    #[serde(rename = "treeV2")]
    pub root: Node,
    /// Root likelihood, mirrors `root.kstu`
    #[serde(default)]
    pub kstu: Kstu,
    /// Tree impact, mirrors `root.i_norm`
    #[serde(default, rename = "i_norm", with = "impact_norm")]
    pub i_norm: Option<f64>,
}

impl AttackTree {
    /// New tree with a generated uid
    pub fn new(id: impl Into<String>, root_name: impl Into<String>) -> Self {
        Self::with_uid(new_tree_uid(), id, root_name)
    }

    /// New tree with a given uid
    pub fn with_uid(
        uid: impl Into<String>,
        id: impl Into<String>,
        root_name: impl Into<String>,
    ) -> Self {
        let root_name = root_name.into();
        Self {
            uid: uid.into(),
            id: id.into(),
            root: Node::new(root_name.clone()),
            root_name,
            kstu: Kstu::unset(),
            i_norm: None,
        }
    }

    /// Append a path below the root
    #[must_use]
    pub fn path(mut self, node: Node) -> Self {
        self.root.children.push(node);
        self
    }

    /// Give the tree and its uid-less elements positional ids
    ///
    /// A missing tree uid becomes `risk_<id>`, or `risk_<position + 1>` when
    /// the display id is empty too; the root falls back to `<uid>_root`.
    /// The same document always yields the same ids. Returns the number of
    /// ids assigned.
    pub fn assign_missing_uids(&mut self, position: usize) -> usize {
        let mut assigned = 0;
        if self.uid.trim().is_empty() {
            self.uid = match self.id.trim() {
                "" => format!("risk_{}", position + 1),
                id => format!("risk_{id}"),
            };
            assigned += 1;
        }
        let root = format!("{}_root", self.uid);
        assigned + self.root.assign_missing_uids(&root)
    }

    /// Visit every leaf in pre-order
    pub fn for_each_leaf<'a>(&'a self, f: &mut impl FnMut(&'a Leaf)) {
        self.root.for_each_leaf(f);
    }

    /// All leaves in pre-order
    #[must_use]
    pub fn leaves(&self) -> Vec<&Leaf> {
        let mut out = Vec::new();
        self.root.for_each_leaf(&mut |leaf| out.push(leaf));
        out
    }

    /// Find a leaf by uid
    #[must_use]
    pub fn leaf(&self, uid: &str) -> Option<&Leaf> {
        self.leaves().into_iter().find(|l| l.uid == uid)
    }

    /// Find a leaf by uid, mutably
    pub fn leaf_mut(&mut self, uid: &str) -> Option<&mut Leaf> {
        fn find<'a>(node: &'a mut Node, uid: &str) -> Option<&'a mut Leaf> {
            if let Some(pos) = node.impacts.iter().position(|l| l.uid == uid) {
                return node.impacts.get_mut(pos);
            }
            node.children.iter_mut().find_map(|child| find(child, uid))
        }
        find(&mut self.root, uid)
    }

    /// Find a node by uid
    #[must_use]
    pub fn node(&self, uid: &str) -> Option<&Node> {
        let mut found = None;
        self.root.for_each_node(&mut |n| {
            if found.is_none() && n.uid == uid {
                found = Some(n);
            }
        });
        found
    }
}

/// Serde for normalised impact values
///
/// Stored as a 2-decimal string, empty when unset; numbers are accepted too.
pub(crate) mod impact_norm {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::kstu::parse_level;

    pub(crate) fn serialize<S: Serializer>(value: &Option<f64>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => s.serialize_str(&format!("{v:.2}")),
            None => s.serialize_str(""),
        }
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        let value = Option::<serde_json::Value>::deserialize(d)?;
        Ok(match value {
            Some(serde_json::Value::Number(n)) => n.as_f64(),
            Some(serde_json::Value::String(s)) => parse_level(&s),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AttackTree {
        AttackTree::with_uid("risk_1", "R01", "Root")
            .path(
                Node::with_uid("p1", "Path 1")
                    .leaf(Leaf::with_uid("l1", "first"))
                    .child(Node::with_uid("n1", "Inner").leaf(Leaf::with_uid("l2", "second"))),
            )
            .path(Node::with_uid("p2", "Path 2").leaf(Leaf::with_uid("l3", "third")))
    }

    #[test]
    fn leaves_are_visited_in_pre_order() {
        let tree = sample();
        let uids: Vec<_> = tree.leaves().iter().map(|l| l.uid.as_str()).collect();
        assert_eq!(uids, ["l1", "l2", "l3"]);
        assert_eq!(tree.root.leaf_count(), 3);
    }

    #[test]
    fn lookup_by_uid() {
        let mut tree = sample();
        assert_eq!(tree.node("n1").map(|n| n.title.as_str()), Some("Inner"));
        assert!(tree.node("missing").is_none());
        tree.leaf_mut("l2").unwrap().text = "changed".into();
        assert_eq!(tree.leaf("l2").unwrap().text, "changed");
    }

    #[test]
    fn generated_ids_are_prefixed_and_unique() {
        let a = Node::new("a");
        let b = Node::new("b");
        assert!(a.uid.starts_with("node_"));
        assert_ne!(a.uid, b.uid);
        assert!(Leaf::new("x").uid.starts_with("leaf_"));
    }

    #[test]
    fn missing_uids_are_positional() {
        let json = r#"{
            "id": "R03", "rootName": "Root",
            "treeV2": {
                "title": "Root",
                "impacts": [{"text": "direct"}],
                "children": [
                    {"uid": "p", "title": "Kept", "impacts": [{"text": "a"}, {"uid": "l", "text": "b"}]},
                    {"title": "Anonymous", "children": [{"title": "Inner", "impacts": [{"text": "c"}]}]}
                ]
            }
        }"#;
        let mut first: AttackTree = serde_json::from_str(json).unwrap();
        let mut second: AttackTree = serde_json::from_str(json).unwrap();
        assert_eq!(first.assign_missing_uids(0), 7);
        second.assign_missing_uids(0);
        assert_eq!(first, second);

        assert_eq!(first.uid, "risk_R03");
        assert_eq!(first.root.uid, "risk_R03_root");
        let leaves: Vec<_> = first.leaves().iter().map(|l| l.uid.as_str()).collect();
        assert_eq!(leaves, ["risk_R03_root_L0", "p_L0", "l", "risk_R03_root_N1_N0_L0"]);
        assert!(first.node("risk_R03_root_N1").is_some());

        assert_eq!(first.assign_missing_uids(0), 0);
    }

    #[test]
    fn tree_without_any_id_uses_position() {
        let mut tree: AttackTree = serde_json::from_str(r#"{"treeV2": {"title": "T"}}"#).unwrap();
        tree.assign_missing_uids(4);
        assert_eq!(tree.uid, "risk_5");
        assert_eq!(tree.root.uid, "risk_5_root");
    }

    #[test]
    fn document_field_names() {
        let tree = AttackTree::with_uid("risk_1", "R01", "Root")
            .path(Node::with_uid("p1", "P").leaf(Leaf::with_uid("l1", "L").likelihood(Kstu::new("0.5", "", "", ""))));
        let value = serde_json::to_value(&tree).unwrap();
        assert_eq!(value["rootName"], "Root");
        assert_eq!(value["i_norm"], "");
        let leaf = &value["treeV2"]["children"][0]["impacts"][0];
        assert_eq!(leaf["k"], "0.5");
        assert_eq!(leaf["rr"]["treatment"], "-");
        assert_eq!(leaf["rr"]["securityConcept"], "");
    }

    #[test]
    fn lenient_document_parsing() {
        let json = r#"{
            "uid": "risk_x", "id": "R07", "rootName": "Root",
            "treeV2": {
                "uid": "root", "title": "Root",
                "children": [{
                    "uid": "p", "title": "Path",
                    "impacts": [{
                        "uid": "l", "text": "Leaf", "ds": ["DS1"],
                        "k": 0.7, "s": "0.5", "t": null, "u": "",
                        "i_norm": "1.00",
                        "rr": {"treatment": "Mitigiert", "k": "0.1"}
                    }]
                }]
            },
            "i_norm": 0.8
        }"#;
        let tree: AttackTree = serde_json::from_str(json).unwrap();
        let leaf = tree.leaf("l").unwrap();
        assert_eq!(leaf.kstu, Kstu::new("0.7", "0.5", "", ""));
        assert_eq!(leaf.i_norm, Some(1.0));
        assert_eq!(leaf.rr.treatment, Treatment::Mitigated);
        assert_eq!(leaf.rr.kstu.k, "0.1");
        assert_eq!(tree.i_norm, Some(0.8));
    }
}
