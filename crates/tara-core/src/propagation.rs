//! Worst-case propagation
//!
//! Every node's KSTU becomes the per-dimension maximum over its own leaves
//! and its children's (already propagated) values. One post-order pass;
//! leaves are read, never written.

use crate::kstu::WorstCase;
use crate::model::{AttackTree, Node};

/// Propagate a whole tree and mirror the root values onto the tree
pub fn propagate(tree: &mut AttackTree) {
    propagate_node(&mut tree.root);
    tree.kstu = tree.root.kstu.clone();
    tracing::trace!("Propagated tree {} -> {:?}", tree.uid, tree.kstu);
}

/// Propagate a subtree rooted at `node`
pub fn propagate_node(node: &mut Node) {
    for child in &mut node.children {
        propagate_node(child);
    }

    let mut acc = WorstCase::default();
    for leaf in &node.impacts {
        acc.observe(&leaf.kstu);
    }
    for child in &node.children {
        acc.observe(&child.kstu);
    }
    node.kstu = acc.finish();
}
