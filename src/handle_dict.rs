//! The signature-indexed handle dictionary: an open-addressed,
//! linear-probing table mapping a node handle's 64-bit signature to the
//! internal node that owns that handle.
//!
//! The `dup` flag per slot is a load-bearing micro-optimization: it lets a
//! lookup skip the (relatively) expensive length + longest-common-prefix
//! verification for any slot whose signature has never collided with
//! another, so most probes reduce to a single 64-bit comparison.

use crate::bitvec::BitVector;
use crate::node::{Internal, InternalIndex, LeafIndex, NodeGraph, NodeIndex};

#[derive(Clone, Copy)]
struct Slot {
    sig: u64,
    node: InternalIndex,
    dup: bool,
}

pub(crate) struct HandleDict {
    slots: Vec<Option<Slot>>,
    size: usize,
}

impl HandleDict {
    /// Initial capacity.
    pub(crate) const DEFAULT_CAPACITY: usize = 64;

    pub(crate) fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.next_power_of_two().max(1);
        Self { slots: vec![None; capacity], size: 0 }
    }

    #[inline]
    fn mask(&self) -> usize {
        self.slots.len() - 1
    }

    pub(crate) fn len(&self) -> usize {
        self.size
    }

    /// Probes from `sig`'s home slot until an empty slot is found. Any
    /// occupied slot visited along the way whose signature equals `sig`
    /// has its `dup` flag set.
    fn find_free_pos(&mut self, sig: u64) -> usize {
        let mut idx = sig as usize & self.mask();
        loop {
            match &mut self.slots[idx] {
                None => return idx,
                Some(slot) => {
                    if slot.sig == sig {
                        slot.dup = true;
                    }
                    idx = (idx + 1) & self.mask();
                }
            }
        }
    }

    /// Fast-mode probe: stops at the first slot whose signature matches
    /// *and* either has never collided (`!dup`) or passes the explicit
    /// handle-length + lcp check. Returns the matching index, or the
    /// terminating empty index if no match was found.
    fn find_pos(&self, graph: &NodeGraph, v: &BitVector, prefix_len: u64, sig: u64) -> usize {
        let mut idx = sig as usize & self.mask();
        loop {
            match &self.slots[idx] {
                None => return idx,
                Some(slot) => {
                    if slot.sig == sig
                        && (!slot.dup || Self::verifies(graph, &self.slots[idx], v, prefix_len))
                    {
                        return idx;
                    }
                    idx = (idx + 1) & self.mask();
                }
            }
        }
    }

    /// Exact-mode probe: like `find_pos` but always performs the length +
    /// lcp verification, never relying on the `dup` shortcut.
    fn find_exact_pos(&self, graph: &NodeGraph, v: &BitVector, prefix_len: u64, sig: u64) -> usize {
        let mut idx = sig as usize & self.mask();
        loop {
            match &self.slots[idx] {
                None => return idx,
                Some(slot) => {
                    if slot.sig == sig && Self::verifies(graph, &self.slots[idx], v, prefix_len) {
                        return idx;
                    }
                    idx = (idx + 1) & self.mask();
                }
            }
        }
    }

    fn verifies(graph: &NodeGraph, slot: &Option<Slot>, v: &BitVector, prefix_len: u64) -> bool {
        let Some(slot) = slot else { return false };
        let node: &Internal = &graph[slot.node];
        node.handle_length() == prefix_len
            && v.lcp(graph.key(NodeIndex::from(slot.node))) >= prefix_len
    }

    /// Returns the internal node registered under `sig` whose handle is
    /// `v[0..prefix_len]`, in fast mode (may return a false positive with
    /// probability ~2^-64 per slot) or exact mode.
    pub(crate) fn get(
        &self,
        graph: &NodeGraph,
        sig: u64,
        v: &BitVector,
        prefix_len: u64,
        exact: bool,
    ) -> Option<InternalIndex> {
        let idx = if exact {
            self.find_exact_pos(graph, v, prefix_len, sig)
        } else {
            self.find_pos(graph, v, prefix_len, sig)
        };
        self.slots[idx].map(|s| s.node)
    }

    /// Registers `node` (whose handle signature is `sig`) in the
    /// dictionary, growing it first if the load factor would exceed 3/4.
    pub(crate) fn add_new(&mut self, node: InternalIndex, sig: u64) {
        if (self.size + 1) * 4 > self.slots.len() * 3 {
            self.grow();
        }
        let idx = self.find_free_pos(sig);
        self.slots[idx] = Some(Slot { sig, node, dup: false });
        self.size += 1;
    }

    /// Re-points the slot registered under `sig` for `old` so it names `new`
    /// instead, without moving the slot or touching `size`. `old` must
    /// currently be registered under `sig`; used when a split hands `old`'s
    /// handle off to a node that now owns the same prefix at the same
    /// length, so the existing signature stays correct and only the node it
    /// resolves to changes.
    pub(crate) fn replace(&mut self, sig: u64, old: InternalIndex, new: InternalIndex) {
        let mut idx = sig as usize & self.mask();
        loop {
            match &mut self.slots[idx] {
                None => unreachable!("replace called for an unregistered handle"),
                Some(slot) if slot.sig == sig && slot.node == old => {
                    slot.node = new;
                    return;
                }
                _ => idx = (idx + 1) & self.mask(),
            }
        }
    }

    /// Doubles capacity and rehashes every slot in place into a fresh
    /// array, re-establishing `dup` flags by the same collision rule used
    /// for ordinary insertion.
    fn grow(&mut self) {
        let new_capacity = self.slots.len() * 2;
        let old = std::mem::replace(&mut self.slots, vec![None; new_capacity]);
        log::debug!(
            "handle dictionary resize: {} -> {} slots ({} entries)",
            old.len(),
            new_capacity,
            self.size
        );
        self.size = 0;
        for slot in old.into_iter().flatten() {
            let idx = self.find_free_pos(slot.sig);
            self.slots[idx] = Some(Slot { sig: slot.sig, node: slot.node, dup: false });
            self.size += 1;
        }
    }
}

/// Computes `node`'s handle signature and registers it in `dict`. Shared by
/// insertion ([`crate::trie`]) and by deserialization ([`crate::io`]), which
/// rebuilds the dictionary from scratch rather than persisting it.
pub(crate) fn register_handle(graph: &NodeGraph, dict: &mut HandleDict, seed: u64, node: InternalIndex) {
    let handle_len = graph[node].handle_length();
    let reference: LeafIndex = graph[node].reference;
    let key = &graph[reference].key;
    let sig = crate::hash::murmur(&key.prefix(handle_len), seed);
    dict.add_new(node, sig);
}

/// Hands `old`'s current dictionary entry off to `new`. `old`'s handle
/// (length and bits) must not yet have changed when this is called — it is
/// used to recompute the signature that was used to register it, so the
/// matching slot can be found and repointed at `new`.
pub(crate) fn rekey_handle(
    graph: &NodeGraph,
    dict: &mut HandleDict,
    seed: u64,
    old: InternalIndex,
    new: InternalIndex,
) {
    let handle_len = graph[old].handle_length();
    let reference: LeafIndex = graph[old].reference;
    let key = &graph[reference].key;
    let sig = crate::hash::murmur(&key.prefix(handle_len), seed);
    dict.replace(sig, old, new);
}
