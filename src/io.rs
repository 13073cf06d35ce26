//! Serialization of a trie to and from a byte stream.
//!
//! The wire format is a preorder traversal of the binary trie: each node is
//! a one-byte tag followed by its payload (an 8-byte big-endian
//! `pathLength` — the node's extent length minus its parent's extent
//! length, i.e. the number of bits it adds beyond its parent — and, for
//! leaves, the packed key bits). Encoding a relative path length rather
//! than the absolute extent keeps a subtree's bytes independent of how
//! deep it happens to sit in the full trie. Jump pointers and the handle
//! dictionary are not persisted — both are cheap to rebuild from the
//! topology alone, and reconstructing them in [`read`] is what keeps the
//! format itself simple.
//!
//! [`read`] is written iteratively against an explicit work stack rather
//! than by recursive descent, so that deserializing an adversarially deep
//! or malformed stream can't blow the native call stack.

use std::io::{Read, Write};

use crate::bitvec::BitVector;
use crate::error::{Error, Result};
use crate::handle_dict::{self, HandleDict};
use crate::node::{InternalIndex, LeafIndex, NodeGraph, NodeIndex};
use crate::trie::ZFastTrie;

const FLAG_LEAF: u8 = 0;
const FLAG_INTERNAL: u8 = 1;
const FLAG_EMPTY: u8 = 2;

/// Writes `trie` to `w` in the format `read` understands.
pub fn write<W: Write>(trie: &ZFastTrie, w: &mut W) -> Result<()> {
    match trie.graph().root {
        None => w.write_all(&[FLAG_EMPTY]).map_err(Error::from),
        Some(root) => write_node(trie.graph(), root, 0, w),
    }
}

fn write_node<W: Write>(graph: &NodeGraph, n: NodeIndex, parent_extent: u64, w: &mut W) -> Result<()> {
    if n.is_leaf() {
        let leaf = &graph[n.as_leaf()];
        let path_length = leaf.key.len() - parent_extent;
        w.write_all(&[FLAG_LEAF])?;
        w.write_all(&path_length.to_be_bytes())?;
        w.write_all(&leaf.key.to_bytes())?;
    } else {
        let node = &graph[n.as_internal()];
        let path_length = node.extent_length - parent_extent;
        w.write_all(&[FLAG_INTERNAL])?;
        w.write_all(&path_length.to_be_bytes())?;
        let (left, right, extent) = (node.left, node.right, node.extent_length);
        write_node(graph, left, extent, w)?;
        write_node(graph, right, extent, w)?;
    }
    Ok(())
}

/// Reads a trie previously written by [`write`].
pub fn read<R: Read>(r: &mut R) -> Result<ZFastTrie> {
    let mut flag = [0u8; 1];
    read_exact(r, &mut flag)?;
    if flag[0] == FLAG_EMPTY {
        return Ok(ZFastTrie::new());
    }

    let mut graph = NodeGraph::new();
    let mut dict = HandleDict::new();
    let seed = ZFastTrie::SEED;
    let mut last_leaf = LeafIndex::HEAD;
    let mut stack: Vec<Task> = Vec::new();

    let root = read_one(r, &mut graph, 0, flag[0], &mut last_leaf, &mut stack)?;
    graph.root = Some(root);

    while let Some(task) = stack.pop() {
        match task {
            Task::Expand { parent_extent, attach: (parent, dir) } => {
                let mut f = [0u8; 1];
                read_exact(r, &mut f)?;
                let node = read_one(r, &mut graph, parent_extent, f[0], &mut last_leaf, &mut stack)?;
                *graph[parent].child_mut(dir) = node;
            }
            Task::Finish(internal) => {
                let left = graph[internal].left;
                let reference = if left.is_leaf() {
                    left.as_leaf()
                } else {
                    graph[left.as_internal()].reference
                };
                graph[internal].reference = reference;
                graph.set_jumps(internal);
                handle_dict::register_handle(&graph, &mut dict, seed, internal);
            }
        }
    }

    Ok(ZFastTrie::from_parts(graph, dict, seed))
}

enum Task {
    /// Read the next node from the stream; once built, attach it as the
    /// `dir` child of `attach.0`.
    Expand { parent_extent: u64, attach: (InternalIndex, bool) },
    /// Both children of this internal node have been attached: fix its
    /// reference leaf, jump pointers, and handle-dictionary entry.
    Finish(InternalIndex),
}

fn read_one<R: Read>(
    r: &mut R,
    graph: &mut NodeGraph,
    parent_extent: u64,
    flag: u8,
    last_leaf: &mut LeafIndex,
    stack: &mut Vec<Task>,
) -> Result<NodeIndex> {
    match flag {
        FLAG_LEAF => {
            let key = read_key(r, parent_extent)?;
            let leaf = graph.push_leaf(key, parent_extent);
            graph.insert_after(leaf, *last_leaf);
            *last_leaf = leaf;
            Ok(NodeIndex::from(leaf))
        }
        FLAG_INTERNAL => {
            let path_length = read_path_length(r)?;
            let extent = parent_extent + path_length;
            let internal = graph.push_internal(parent_extent, extent, LeafIndex::HEAD);
            // Pushed in reverse so the stack (LIFO) expands left, then
            // right, then finishes this node — preorder, left to right.
            stack.push(Task::Finish(internal));
            stack.push(Task::Expand { parent_extent: extent, attach: (internal, true) });
            stack.push(Task::Expand { parent_extent: extent, attach: (internal, false) });
            Ok(NodeIndex::from(internal))
        }
        _ => Err(Error::CorruptFraming),
    }
}

fn read_path_length<R: Read>(r: &mut R) -> Result<u64> {
    let mut len_buf = [0u8; 8];
    read_exact(r, &mut len_buf)?;
    Ok(u64::from_be_bytes(len_buf))
}

fn read_key<R: Read>(r: &mut R, parent_extent: u64) -> Result<BitVector> {
    let path_length = read_path_length(r)?;
    let len = parent_extent + path_length;
    let nbytes = ((len + 7) / 8) as usize;
    let mut bytes = vec![0u8; nbytes];
    read_exact(r, &mut bytes)?;
    Ok(BitVector::from_bits(&bytes, len))
}

fn read_exact<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<()> {
    match r.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(Error::Truncated),
        Err(e) => Err(Error::Io(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(s: &str) -> BitVector {
        s.chars().map(|c| c == '1').collect()
    }

    #[test]
    fn empty_trie_roundtrips() {
        let trie = ZFastTrie::new();
        let mut buf = Vec::new();
        write(&trie, &mut buf).unwrap();
        let back = read(&mut buf.as_slice()).unwrap();
        assert!(back.is_empty());
    }

    #[test]
    fn populated_trie_roundtrips() {
        let mut trie = ZFastTrie::new();
        let keys = ["000", "001", "01", "100", "1010", "1011", "11"];
        for k in keys {
            trie.add(bits(k)).unwrap();
        }

        let mut buf = Vec::new();
        write(&trie, &mut buf).unwrap();
        let back = read(&mut buf.as_slice()).unwrap();

        assert_eq!(back.len(), keys.len());
        for k in keys {
            assert!(back.contains(&bits(k)), "missing {k} after round trip");
        }
        assert_eq!(back.pred(&bits("010")), Some(bits("01")));
        assert_eq!(back.succ(&bits("010")), Some(bits("100")));
    }

    #[test]
    fn truncated_stream_is_rejected() {
        let mut trie = ZFastTrie::new();
        trie.add(bits("1010")).unwrap();
        let mut buf = Vec::new();
        write(&trie, &mut buf).unwrap();
        buf.truncate(buf.len() - 1);
        assert!(matches!(read(&mut buf.as_slice()), Err(Error::Truncated)));
    }
}
