//! Fat-binary search over prefix handles.
//!
//! Finds the parent of the deepest node whose extent is a prefix of the
//! query vector, in O(log L) dictionary probes by binary-searching over
//! the handle-length axis rather than walking the trie level by level.
//! `None` means the exit node's parent is the root, i.e. the exit node
//! itself is the root of the trie.

use crate::bitvec::BitVector;
use crate::handle_dict::HandleDict;
use crate::hash::PreprocessedHash;
use crate::node::{InternalIndex, NodeGraph, NodeIndex};

/// `stack`, when supplied, accumulates the *fat ancestors* visited on the
/// way down — the nodes later consulted by `add`'s jump-pointer repair.
/// `exact` selects exact-mode (always correct) or fast-mode (may return a
/// wrong parent on a hash false positive, which the caller must detect and
/// retry in exact mode).
pub(crate) fn get_parent_exit_node(
    graph: &NodeGraph,
    dict: &HandleDict,
    v: &BitVector,
    prehash: &PreprocessedHash,
    mut stack: Option<&mut Vec<InternalIndex>>,
    exact: bool,
) -> Option<InternalIndex> {
    let len = v.len();
    if len == 0 {
        return None;
    }
    let log_l = 63 - len.leading_zeros() as u64;
    let mut l = 0u64;
    let mut r = len;
    let mut parent = None;

    for shift in (0..=log_l).rev() {
        if r - l <= 1 {
            break;
        }
        let check_mask = 1u64 << shift;
        let compute_mask = (!0u64) << shift;
        if (l & check_mask) == ((r - 1) & check_mask) {
            continue;
        }
        let f = (r - 1) & compute_mask;
        let sig = prehash.murmur_prefix(v, f);
        match dict.get(graph, sig, v, f, exact) {
            None => r = f,
            Some(node) => {
                let g = graph[node].extent_length;
                let matches = f <= g
                    && g <= len
                    && v.range_equals(graph.key(NodeIndex::from(node)), f, g);
                if matches {
                    if let Some(stack) = stack.as_deref_mut() {
                        stack.push(node);
                    }
                    parent = Some(node);
                    l = g;
                } else {
                    r = f;
                }
            }
        }
    }
    parent
}
