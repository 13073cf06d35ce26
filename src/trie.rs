//! The public dictionary: `ZFastTrie`, its insertion algorithm, and its
//! predecessor/successor queries.
//!
//! Insertion always locates the attachment point in exact mode: correctness
//! of the structure matters more than insertion throughput, and fast mode
//! earns its keep on the read path (`contains`, `pred`, `succ`), which try
//! fast mode first and fall back to exact mode only if the fast-mode
//! candidate doesn't verify — a signature false positive, not a structural
//! bug.

use crate::bitvec::BitVector;
use crate::error::{Error, Result};
use crate::handle_dict::{self, HandleDict};
use crate::hash::{preprocess_murmur, PreprocessedHash};
use crate::node::{InternalIndex, LeafIndex, NodeGraph, NodeIndex};
use crate::search;

/// A predecessor/successor dictionary over a prefix-free set of bit strings.
pub struct ZFastTrie {
    graph: NodeGraph,
    dict: HandleDict,
    seed: u64,
}

impl ZFastTrie {
    /// The seed handed to the handle-signature hash. Fixed rather than
    /// randomized per instance: reproducible signatures make serialized
    /// tries portable between processes without also persisting the
    /// seed.
    pub(crate) const SEED: u64 = 0x5A5A_5A5A_5A5A_5A5A;

    pub fn new() -> Self {
        Self::with_capacity(HandleDict::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            graph: NodeGraph::with_capacity(capacity),
            dict: HandleDict::with_capacity(capacity),
            seed: Self::SEED,
        }
    }

    /// Assembles a trie from an already-built graph, used by [`crate::io`]
    /// once it has reconstructed the node arena from a serialized stream.
    pub(crate) fn from_parts(graph: NodeGraph, dict: HandleDict, seed: u64) -> Self {
        Self { graph, dict, seed }
    }

    pub(crate) fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    pub(crate) fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.graph.size()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.root.is_none()
    }

    fn register_handle(&mut self, node: InternalIndex) {
        crate::handle_dict::register_handle(&self.graph, &mut self.dict, self.seed, node);
    }

    /// Finds the node at which `v` departs from the trie: `parent` is the
    /// immediate trie-parent of the returned exit node (`None` if the exit
    /// node is the root), and `d` is the length of the common prefix shared
    /// between `v` and the exit node's key.
    fn locate(
        &self,
        v: &BitVector,
        prehash: &PreprocessedHash,
        stack: Option<&mut Vec<InternalIndex>>,
        exact: bool,
    ) -> (Option<InternalIndex>, NodeIndex, u64) {
        let parent = search::get_parent_exit_node(&self.graph, &self.dict, v, prehash, stack, exact);
        match parent {
            None => {
                let root = self.graph.root.expect("locate called on an empty trie");
                let d = v.lcp(self.graph.key(root));
                (None, root, d)
            }
            Some(p) => {
                let pe = self.graph[p].extent_length;
                if pe >= v.len() {
                    // `v` ends exactly at or before this node's extent: there is
                    // no further bit of `v` to branch on, so the node itself is
                    // the effective exit point.
                    (Some(p), NodeIndex::from(p), v.len())
                } else {
                    let bit = v.get(pe);
                    let child = self.graph[p].child(bit);
                    let d = v.lcp(self.graph.key(child));
                    (Some(p), child, d)
                }
            }
        }
    }

    /// `true` iff `v` is already stored.
    pub fn contains(&self, v: &BitVector) -> bool {
        if self.is_empty() {
            return false;
        }
        let prehash = preprocess_murmur(v, self.seed);
        for exact in [false, true] {
            let (_, exit, d) = self.locate(v, &prehash, None, exact);
            if exit.is_leaf() && d == v.len() && d == self.graph.extent_length(exit) {
                return true;
            }
            if exact {
                return false;
            }
        }
        false
    }

    /// Inserts `v`. Returns `Ok(false)` if `v` was already present,
    /// `Err(Error::KeyNotPrefixFree)` if `v` is a proper prefix of an
    /// existing key or an existing key is a proper prefix of `v`.
    pub fn add(&mut self, v: BitVector) -> Result<bool> {
        if self.graph.root.is_none() {
            self.graph.root = Some(NodeIndex::from(self.graph.push_leaf(v, 0)));
            return Ok(true);
        }

        let prehash = preprocess_murmur(&v, self.seed);
        let mut stack = Vec::new();
        let (parent, exit, d) = self.locate(&v, &prehash, Some(&mut stack), true);

        let exit_extent = self.graph.extent_length(exit);
        let effective = exit_extent.min(v.len());
        if d >= effective {
            if v.len() == exit_extent && exit.is_leaf() {
                return Ok(false);
            }
            return Err(Error::KeyNotPrefixFree);
        }

        // `d < effective`: `v` and the exit node's key genuinely diverge at
        // bit `d`, which is where the new internal node is spliced in.
        let bit_v = v.get(d);
        let new_leaf = self.graph.push_leaf(v.clone(), d);
        let new_leaf_node = NodeIndex::from(new_leaf);

        let (left, right) = if bit_v { (exit, new_leaf_node) } else { (new_leaf_node, exit) };
        let reference = if left.is_leaf() {
            left.as_leaf()
        } else {
            self.graph[left.as_internal()].reference
        };
        let parent_extent = parent.map(|p| self.graph[p].extent_length).unwrap_or(0);
        let new_internal = self.graph.push_internal(parent_extent, d, reference);
        self.graph[new_internal].left = left;
        self.graph[new_internal].right = right;

        // Splicing `new_internal` in at depth `d` changes `exit`'s parent
        // extent, which can change `exit`'s handle length and so invalidate
        // its dictionary entry (internal nodes only; leaves are never
        // registered). Whether it does is exactly the cut-low/cut-high
        // distinction: if `d` falls at or past `exit`'s *old* handle length,
        // the old handle is now a prefix of `new_internal` too (same bits,
        // same length), so `new_internal` inherits that dictionary slot by
        // having it repointed, and `exit` gets a fresh entry for its new,
        // deeper handle. Otherwise `exit`'s handle length doesn't move and
        // its existing entry stays valid untouched.
        let cut_low = if exit.is_internal() {
            let exit_internal = exit.as_internal();
            let old_handle_length = self.graph[exit_internal].handle_length();
            let cut_low = d >= old_handle_length;
            if cut_low {
                handle_dict::rekey_handle(&self.graph, &mut self.dict, self.seed, exit_internal, new_internal);
            }
            cut_low
        } else {
            false
        };

        if exit.is_leaf() {
            self.graph[exit.as_leaf()].parent_extent_length = d;
        } else {
            self.graph[exit.as_internal()].parent_extent_length = d;
        }

        self.graph.set_jumps(new_internal);

        match parent {
            None => self.graph.root = Some(NodeIndex::from(new_internal)),
            Some(p) => {
                let pe = self.graph[p].extent_length;
                let bit = v.get(pe);
                *self.graph[p].child_mut(bit) = NodeIndex::from(new_internal);
            }
        }

        if bit_v {
            let rightmost = self.graph.leaf_via_jump(exit, true);
            self.graph.insert_after(new_leaf, rightmost);
        } else {
            let leftmost = self.graph.leaf_via_jump(exit, false);
            self.graph.insert_before(new_leaf, leftmost);
        }

        self.fix_jumps(&stack, exit, NodeIndex::from(new_internal), d);

        if cut_low {
            // `new_internal` already owns the rekeyed slot above; `exit`
            // needs a brand new entry for its now-deeper handle.
            self.register_handle(exit.as_internal());
        } else {
            self.register_handle(new_internal);
        }

        log::trace!("inserted key of {} bits, trie now holds {} keys", v.len(), self.len());
        Ok(true)
    }

    /// Repairs ancestor jump pointers that used to target `exit` directly
    /// but must now target the freshly spliced-in `new_internal`. Only
    /// ancestors whose jump length falls at or before the new node's extent
    /// `d` are affected: those are exactly the ones for which `new_internal`
    /// is now the shallower node satisfying the jump.
    fn fix_jumps(&mut self, stack: &[InternalIndex], exit: NodeIndex, new_internal: NodeIndex, d: u64) {
        for &anc in stack {
            if self.graph[anc].jump_left == exit && self.graph[anc].jump_length() <= d {
                self.graph[anc].jump_left = new_internal;
            }
            if self.graph[anc].jump_right == exit && self.graph[anc].jump_length() <= d {
                self.graph[anc].jump_right = new_internal;
            }
        }
    }

    /// Immediate predecessor/successor leaves of `v`, assuming `v` is not
    /// itself present.
    fn neighbors(&self, v: &BitVector) -> (LeafIndex, LeafIndex) {
        let prehash = preprocess_murmur(v, self.seed);
        let (_, exit, d) = self.locate(v, &prehash, None, true);
        let exit_extent = self.graph.extent_length(exit);

        if exit.is_leaf() && d == exit_extent && v.len() > d {
            // `v` is a strict extension of this leaf's key, not a divergence
            // within it: a prefix always sorts before its extensions, so `v`
            // lands immediately after this leaf rather than to either side
            // of some subtree.
            let leaf = exit.as_leaf();
            return (leaf, self.graph[leaf].next);
        }

        let bit_v = d < v.len() && v.get(d);
        if bit_v {
            let rightmost = self.graph.leaf_via_jump(exit, true);
            (rightmost, self.graph[rightmost].next)
        } else {
            let leftmost = self.graph.leaf_via_jump(exit, false);
            (self.graph[leftmost].prev, leftmost)
        }
    }

    /// Greatest stored key `<= v`, or `None` if every stored key is `> v`.
    pub fn pred(&self, v: &BitVector) -> Option<BitVector> {
        if self.is_empty() {
            return None;
        }
        if self.contains(v) {
            return Some(v.clone());
        }
        let (pred, _) = self.neighbors(v);
        (pred != LeafIndex::HEAD).then(|| self.graph[pred].key.clone())
    }

    /// Smallest stored key `>= v`, or `None` if every stored key is `< v`.
    pub fn succ(&self, v: &BitVector) -> Option<BitVector> {
        if self.is_empty() {
            return None;
        }
        if self.contains(v) {
            return Some(v.clone());
        }
        let (_, succ) = self.neighbors(v);
        (succ != LeafIndex::TAIL).then(|| self.graph[succ].key.clone())
    }

    /// Always fails: this dictionary supports insertion and queries only.
    pub fn remove(&mut self, _v: &BitVector) -> Result<bool> {
        Err(Error::UnsupportedOperation("remove"))
    }
}

impl Default for ZFastTrie {
    fn default() -> Self {
        Self::new()
    }
}
