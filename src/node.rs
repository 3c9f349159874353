//! Trie node representation and the RLP "raw form" / inlining rule.

use sha3::{Digest, Keccak256};

use crate::nibble::Nibbles;
use crate::rlp::RlpItem;

/// Number of slots in a branch node (one per nibble value).
pub const BRANCH_WIDTH: usize = 16;

/// A node in the trie.
///
/// `Hash` is a lazy reference to a subtree that has been committed to
/// storage and not yet read back — nodes are only materialized into
/// `Leaf`/`Extension`/`Branch` on demand as a walk touches them.
#[derive(Clone, Debug)]
pub enum Node {
    Leaf {
        path: Nibbles,
        value: Vec<u8>,
        dirty: bool,
    },
    Extension {
        path: Nibbles,
        child: Box<Node>,
        dirty: bool,
    },
    Branch {
        children: Box<[Option<Box<Node>>; BRANCH_WIDTH]>,
        value: Option<Vec<u8>>,
        dirty: bool,
    },
    Hash {
        hash: [u8; 32],
    },
}

impl Node {
    pub fn new_leaf(path: Nibbles, value: Vec<u8>) -> Node {
        Node::Leaf {
            path,
            value,
            dirty: true,
        }
    }

    pub fn new_extension(path: Nibbles, child: Node) -> Node {
        Node::Extension {
            path,
            child: Box::new(child),
            dirty: true,
        }
    }

    pub fn new_branch() -> Node {
        Node::Branch {
            children: Box::new(Default::default()),
            value: None,
            dirty: true,
        }
    }

    pub fn is_dirty(&self) -> bool {
        match self {
            Node::Leaf { dirty, .. } => *dirty,
            Node::Extension { dirty, .. } => *dirty,
            Node::Branch { dirty, .. } => *dirty,
            Node::Hash { .. } => false,
        }
    }

    pub fn mark_dirty(&mut self) {
        match self {
            Node::Leaf { dirty, .. } => *dirty = true,
            Node::Extension { dirty, .. } => *dirty = true,
            Node::Branch { dirty, .. } => *dirty = true,
            Node::Hash { .. } => {}
        }
    }

    /// The node's RLP "raw form": the list structure that gets hashed
    /// or embedded inline, per spec. Children are resolved through
    /// [`Node::child_ref`], applying the inlining rule recursively.
    ///
    /// Calling this on a `Hash` node is a programmer error in this
    /// crate: a `Hash` node's raw form is never needed, only its
    /// already-known hash (see [`Node::hash`]). Still, we fall back to
    /// treating the hash bytes as an opaque byte string rather than
    /// panicking.
    pub fn raw_form(&self) -> RlpItem {
        match self {
            Node::Leaf { path, value, .. } => RlpItem::List(vec![
                RlpItem::Bytes(path.compact(true).to_bytes()),
                RlpItem::Bytes(value.clone()),
            ]),
            Node::Extension { path, child, .. } => RlpItem::List(vec![
                RlpItem::Bytes(path.compact(false).to_bytes()),
                Node::child_ref(child),
            ]),
            Node::Branch {
                children, value, ..
            } => {
                let mut items = Vec::with_capacity(BRANCH_WIDTH + 1);
                for slot in children.iter() {
                    match slot {
                        Some(child) => items.push(Node::child_ref(child)),
                        None => items.push(RlpItem::Bytes(Vec::new())),
                    }
                }
                items.push(RlpItem::Bytes(value.clone().unwrap_or_default()));
                RlpItem::List(items)
            }
            Node::Hash { hash } => RlpItem::Bytes(hash.to_vec()),
        }
    }

    /// The RLP item used to reference `node` from its parent: the
    /// node's raw form if its encoding is under 32 bytes, otherwise the
    /// 32-byte Keccak-256 hash of that encoding. This is the central
    /// inlining rule every node variant's encoding depends on.
    pub fn child_ref(node: &Node) -> RlpItem {
        if let Node::Hash { hash } = node {
            return RlpItem::Bytes(hash.to_vec());
        }
        let raw = node.raw_form();
        let encoded = raw.encode();
        if encoded.len() >= 32 {
            RlpItem::Bytes(keccak256(&encoded).to_vec())
        } else {
            raw
        }
    }

    /// The node's own hash: for a `Hash` node this is simply the
    /// stored value; for any materialized node it is
    /// `keccak256(rlp(raw_form))`, regardless of whether the encoding
    /// would have been inlined as someone else's child.
    pub fn hash(&self) -> [u8; 32] {
        match self {
            Node::Hash { hash } => *hash,
            _ => keccak256(&self.raw_form().encode()),
        }
    }
}

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // Scenario 4 from spec.md §8, literal keccak256 vectors.
    #[test]
    fn keccak256_matches_known_vectors() {
        let empty = keccak256(&[]);
        assert_eq!(
            hex::encode(empty),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a47"
        );

        let abc = keccak256(b"abc");
        assert_eq!(
            hex::encode(abc),
            "4e03657aea45a94fc7d47ba826c8d667c0d1e6e33a64a036ec44f58fa12d6c4"
        );
    }

    #[test]
    fn leaf_raw_form_is_two_element_list() {
        let leaf = Node::new_leaf(Nibbles(vec![1, 2, 3]), b"value".to_vec());
        let raw = leaf.raw_form();
        let items = raw.as_list().unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn short_child_inlines_long_child_hashes() {
        let short_leaf = Node::new_leaf(Nibbles(vec![1]), b"v".to_vec());
        let short_ref = Node::child_ref(&short_leaf);
        assert!(matches!(short_ref, RlpItem::List(_)));

        let long_leaf = Node::new_leaf(Nibbles(vec![1; 40]), vec![0xAB; 40]);
        let long_ref = Node::child_ref(&long_leaf);
        match long_ref {
            RlpItem::Bytes(b) => assert_eq!(b.len(), 32),
            RlpItem::List(_) => panic!("expected inlining rule to hash a long child"),
        }
    }

    #[test]
    fn branch_empty_slots_encode_as_empty_strings() {
        let branch = Node::new_branch();
        let raw = branch.raw_form();
        let items = raw.as_list().unwrap();
        assert_eq!(items.len(), BRANCH_WIDTH + 1);
        assert_eq!(items[0], RlpItem::Bytes(Vec::new()));
    }
}
