//! Reverted-branch location
//!
//! Depth-first search for the first node carrying a non-ignored error,
//! returning the full root-to-failure path. Children are searched in their
//! stored emission order, so the result is deterministic; failures in later
//! sibling subtrees are not reported.

use crate::types::{BranchStep, TraceNode};

/// Finds the first (traversal-order) reverted branch across the given roots.
///
/// Each step carries the node's sibling count and index at its level; the
/// last step is the offending node itself. Returns `None` when no node in
/// any subtree holds a non-ignored error.
pub fn find_reverted_branch(roots: &[TraceNode]) -> Option<Vec<BranchStep>> {
    roots
        .iter()
        .enumerate()
        .find_map(|(index, root)| locate(root, roots.len(), index))
}

fn locate(node: &TraceNode, total_siblings: usize, index: usize) -> Option<Vec<BranchStep>> {
    if node.has_unignored_error() {
        return Some(vec![step(node, total_siblings, index)]);
    }
    // The subtree flag was computed bottom-up during construction; a clean
    // subtree cannot contain the branch we are looking for.
    if !node.has_error_in_subtree {
        return None;
    }
    node.children
        .iter()
        .enumerate()
        .find_map(|(child_index, child)| locate(child, node.children.len(), child_index))
        .map(|mut path| {
            path.insert(0, step(node, total_siblings, index));
            path
        })
}

fn step(node: &TraceNode, total_siblings: usize, index: usize) -> BranchStep {
    // Children are cleared to keep the diagnostic payload small.
    let mut node = node.clone();
    node.children = Vec::new();
    BranchStep {
        total_siblings,
        index,
        node,
    }
}
