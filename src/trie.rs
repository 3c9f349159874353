//! The trie engine: `Trie<S>` ties the node representation, the
//! nibble/compact codec, and a pluggable [`Storage`] backend together
//! into Get/Put/Del/Hash/Commit/Proof.
//!
//! Reads and writes walk the tree using an explicit mutable "slot"
//! (`&mut Option<Box<Node>>`) so a lazily-loaded [`Node::Hash`] can be
//! replaced by its materialized form in place, without restarting the
//! walk from the root.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::config::TrieConfig;
use crate::error::TrieError;
use crate::nibble::Nibbles;
use crate::node::{keccak256, Node};
use crate::ports::storage::ROOT_HASH_KEY;
use crate::ports::Storage;
use crate::rlp::RlpItem;

/// Result of a deletion walk: whether the target key was actually
/// present, and whether the slot the walk descended through is now
/// empty and should be collapsed by its parent.
struct DelOutcome {
    found: bool,
    now_empty: bool,
}

/// A Merkle Patricia Trie over a pluggable [`Storage`] backend.
pub struct Trie<S: Storage> {
    root: RwLock<Option<Box<Node>>>,
    storage: S,
    config: TrieConfig,
}

impl<S: Storage> Trie<S> {
    /// Open a trie against `storage`, resuming from its persisted
    /// `"rootHash"` entry if one exists.
    pub fn new(storage: S) -> Result<Self, TrieError> {
        Self::with_config(storage, TrieConfig::default())
    }

    pub fn with_config(storage: S, config: TrieConfig) -> Result<Self, TrieError> {
        let root = match storage.get(ROOT_HASH_KEY)? {
            Some(bytes) if bytes.len() == 32 => {
                let mut hash = [0u8; 32];
                hash.copy_from_slice(&bytes);
                Some(Box::new(Node::Hash { hash }))
            }
            Some(_) => {
                return Err(TrieError::DecodeError(
                    "stored root hash has unexpected length".into(),
                ))
            }
            None => None,
        };
        Ok(Trie {
            root: RwLock::new(root),
            storage,
            config,
        })
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn validate_key(&self, key: &[u8]) -> Result<(), TrieError> {
        if key.len() > self.config.max_key_len {
            return Err(TrieError::InvariantViolation(format!(
                "key length {} exceeds configured maximum {}",
                key.len(),
                self.config.max_key_len
            )));
        }
        Ok(())
    }

    /// Look up `key`. Materializing a lazily-loaded node along the way
    /// mutates the in-memory tree, so this takes the same exclusive
    /// lock mutating operations use.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, TrieError> {
        self.validate_key(key)?;
        let path = Nibbles::from_bytes(key);
        let mut root = self.root.write();
        let result = self.get_in_slot(&mut root, &path, 0);
        tracing::trace!(key_len = key.len(), found = result.as_ref().map(|r| r.is_some()).unwrap_or(false), "trie get");
        result
    }

    fn get_in_slot(
        &self,
        slot: &mut Option<Box<Node>>,
        path: &Nibbles,
        depth: usize,
    ) -> Result<Option<Vec<u8>>, TrieError> {
        match slot {
            None => Ok(None),
            Some(boxed) => self.get_in_box(boxed, path, depth),
        }
    }

    fn get_in_box(
        &self,
        boxed: &mut Box<Node>,
        path: &Nibbles,
        depth: usize,
    ) -> Result<Option<Vec<u8>>, TrieError> {
        self.materialize(boxed)?;
        match &mut **boxed {
            Node::Leaf { path: leaf_path, value, .. } => {
                let remaining = path.slice(depth);
                if remaining == *leaf_path {
                    Ok(Some(value.clone()))
                } else {
                    Ok(None)
                }
            }
            Node::Extension { path: ext_path, child, .. } => {
                let remaining = path.slice(depth);
                if remaining.starts_with(ext_path) {
                    let consumed = ext_path.len();
                    self.get_in_box(child, path, depth + consumed)
                } else {
                    Ok(None)
                }
            }
            Node::Branch { children, value, .. } => {
                if depth == path.len() {
                    Ok(value.clone())
                } else {
                    let idx = path.at(depth) as usize;
                    self.get_in_slot(&mut children[idx], path, depth + 1)
                }
            }
            Node::Hash { .. } => unreachable!("materialized above"),
        }
    }

    /// Insert or overwrite `key` with `value`.
    pub fn put(&self, key: &[u8], value: Vec<u8>) -> Result<(), TrieError> {
        self.validate_key(key)?;
        let path = Nibbles::from_bytes(key);
        let mut root = self.root.write();
        tracing::trace!(key_len = key.len(), value_len = value.len(), "trie put");
        self.put_in_slot(&mut root, &path, 0, value)
    }

    fn put_in_slot(
        &self,
        slot: &mut Option<Box<Node>>,
        path: &Nibbles,
        depth: usize,
        value: Vec<u8>,
    ) -> Result<(), TrieError> {
        match slot {
            None => {
                *slot = Some(Box::new(Node::new_leaf(path.slice(depth), value)));
                Ok(())
            }
            Some(boxed) => {
                self.materialize(boxed)?;
                self.put_in_box(boxed, path, depth, value)
            }
        }
    }

    fn put_in_box(
        &self,
        boxed: &mut Box<Node>,
        path: &Nibbles,
        depth: usize,
        value: Vec<u8>,
    ) -> Result<(), TrieError> {
        enum Step {
            Done,
            Replace(Node),
        }

        let step = match &mut **boxed {
            Node::Leaf { path: leaf_path, value: leaf_value, dirty } => {
                let remaining = path.slice(depth);
                if remaining == *leaf_path {
                    *leaf_value = value;
                    *dirty = true;
                    Step::Done
                } else {
                    Step::Replace(split_leaf(leaf_path, leaf_value.as_slice(), &remaining, value))
                }
            }
            Node::Extension { path: ext_path, child, dirty } => {
                let remaining = path.slice(depth);
                let cpl = remaining.common_prefix_len(ext_path);
                if cpl == ext_path.len() {
                    let consumed = ext_path.len();
                    self.put_in_box(child, path, depth + consumed, value)?;
                    *dirty = true;
                    Step::Done
                } else {
                    Step::Replace(split_extension(ext_path, child, &remaining, cpl, value))
                }
            }
            Node::Branch { children, value: bvalue, dirty } => {
                let remaining_len = path.len() - depth;
                if remaining_len == 0 {
                    *bvalue = Some(value);
                } else {
                    let idx = path.at(depth) as usize;
                    self.put_in_slot(&mut children[idx], path, depth + 1, value)?;
                }
                *dirty = true;
                Step::Done
            }
            Node::Hash { .. } => unreachable!("materialized above"),
        };

        if let Step::Replace(new_node) = step {
            **boxed = new_node;
        }
        Ok(())
    }

    /// Remove `key`. Returns `TrieError::NotFound` if the key isn't
    /// present: a mismatched leaf, a mismatched extension prefix, a
    /// branch with no value at the terminal position, or a nil slot
    /// reached during the walk all count as absent, matching the Go
    /// reference's `errKeyNotFound` (`trie/trie.go:234,252,257,281`).
    pub fn del(&self, key: &[u8]) -> Result<(), TrieError> {
        self.validate_key(key)?;
        let path = Nibbles::from_bytes(key);
        let mut root = self.root.write();
        tracing::trace!(key_len = key.len(), "trie del");
        let outcome = self.del_in_slot(&mut root, &path, 0)?;
        if !outcome.found {
            return Err(TrieError::NotFound);
        }
        Ok(())
    }

    fn del_in_slot(
        &self,
        slot: &mut Option<Box<Node>>,
        path: &Nibbles,
        depth: usize,
    ) -> Result<DelOutcome, TrieError> {
        match slot {
            None => Ok(DelOutcome { found: false, now_empty: true }),
            Some(boxed) => {
                let outcome = self.del_in_box(boxed, path, depth)?;
                if outcome.now_empty {
                    *slot = None;
                }
                Ok(outcome)
            }
        }
    }

    fn del_in_box(&self, boxed: &mut Box<Node>, path: &Nibbles, depth: usize) -> Result<DelOutcome, TrieError> {
        self.materialize(boxed)?;

        enum Outcome {
            Leaf { found: bool },
            ExtensionMismatch,
            ExtensionDescend(DelOutcome),
            BranchNoValue,
            BranchValueRemoved,
            BranchDescend(DelOutcome),
        }

        let outcome = match &mut **boxed {
            Node::Leaf { path: leaf_path, .. } => {
                let remaining = path.slice(depth);
                Outcome::Leaf { found: remaining == *leaf_path }
            }
            Node::Extension { path: ext_path, child, .. } => {
                let remaining = path.slice(depth);
                if !remaining.starts_with(ext_path) {
                    Outcome::ExtensionMismatch
                } else {
                    let consumed = ext_path.len();
                    let child_outcome = self.del_in_box(child, path, depth + consumed)?;
                    Outcome::ExtensionDescend(child_outcome)
                }
            }
            Node::Branch { children, value, .. } => {
                let remaining_len = path.len() - depth;
                if remaining_len == 0 {
                    if value.is_some() {
                        *value = None;
                        Outcome::BranchValueRemoved
                    } else {
                        Outcome::BranchNoValue
                    }
                } else {
                    let idx = path.at(depth) as usize;
                    let child_outcome = self.del_in_slot(&mut children[idx], path, depth + 1)?;
                    Outcome::BranchDescend(child_outcome)
                }
            }
            Node::Hash { .. } => unreachable!("materialized above"),
        };

        match outcome {
            Outcome::Leaf { found: true } => Ok(DelOutcome { found: true, now_empty: true }),
            Outcome::Leaf { found: false } | Outcome::ExtensionMismatch | Outcome::BranchNoValue => {
                Ok(DelOutcome { found: false, now_empty: false })
            }
            Outcome::ExtensionDescend(child_outcome) => {
                if !child_outcome.found {
                    return Ok(DelOutcome { found: false, now_empty: false });
                }
                if child_outcome.now_empty {
                    Ok(DelOutcome { found: true, now_empty: true })
                } else {
                    boxed.mark_dirty();
                    compress_extension(boxed);
                    Ok(DelOutcome { found: true, now_empty: false })
                }
            }
            Outcome::BranchValueRemoved => {
                boxed.mark_dirty();
                self.compress_branch(boxed)?;
                Ok(DelOutcome { found: true, now_empty: is_empty_branch(boxed) })
            }
            Outcome::BranchDescend(child_outcome) => {
                if !child_outcome.found {
                    return Ok(DelOutcome { found: false, now_empty: false });
                }
                boxed.mark_dirty();
                self.compress_branch(boxed)?;
                Ok(DelOutcome { found: true, now_empty: is_empty_branch(boxed) })
            }
        }
    }

    /// Collapse a branch with at most one remaining slot into an
    /// extension or leaf. Left as a plain branch otherwise.
    fn compress_branch(&self, boxed: &mut Box<Node>) -> Result<(), TrieError> {
        let single_idx = {
            let children = match &**boxed {
                Node::Branch { children, .. } => children,
                _ => return Ok(()),
            };
            let mut count = 0usize;
            let mut idx = None;
            for (i, c) in children.iter().enumerate() {
                if c.is_some() {
                    count += 1;
                    idx = Some(i);
                }
            }
            let has_value = matches!(&**boxed, Node::Branch { value: Some(_), .. });
            if count == 0 {
                if has_value {
                    if let Node::Branch { value, .. } = &mut **boxed {
                        let v = value.take().unwrap();
                        **boxed = Node::Leaf {
                            path: Nibbles(Vec::new()),
                            value: v,
                            dirty: true,
                        };
                    }
                }
                return Ok(());
            }
            if count == 1 && !has_value {
                idx
            } else {
                return Ok(());
            }
        };

        let idx = single_idx.expect("count == 1 implies an index");
        let mut only_child = match &mut **boxed {
            Node::Branch { children, .. } => children[idx].take().expect("counted child must be present"),
            _ => unreachable!(),
        };
        self.materialize(&mut only_child)?;
        let new_node = match *only_child {
            Node::Leaf { path, value, .. } => Node::Leaf {
                path: Nibbles::prepend(idx as u8, &path),
                value,
                dirty: true,
            },
            Node::Extension { path, child, .. } => Node::Extension {
                path: Nibbles::prepend(idx as u8, &path),
                child,
                dirty: true,
            },
            branch @ Node::Branch { .. } => Node::Extension {
                path: Nibbles(vec![idx as u8]),
                child: Box::new(branch),
                dirty: true,
            },
            Node::Hash { .. } => unreachable!("materialized above"),
        };
        **boxed = new_node;
        Ok(())
    }

    /// The trie's current root hash, or `None` for an empty trie.
    /// Reflects any uncommitted mutations. Pure in-memory computation:
    /// a `Hash` child's stored value is used as-is without touching
    /// storage.
    ///
    /// An empty trie has no root node to hash, so this returns `None`
    /// rather than the conventional `keccak256(rlp(""))` constant —
    /// that constant is what strict Ethereum-parity implementations
    /// report; this trie instead preserves the absent/nil result the
    /// reference implementation returns (`trie/trie.go: Hash()`
    /// returns `nil` when `t.root == nil`).
    pub fn hash(&self) -> Option<[u8; 32]> {
        let root = self.root.write();
        root.as_ref().map(|boxed| boxed.hash())
    }

    /// Persist every dirty node reachable from the root, keyed by its
    /// own hash, then persist the root hash under the reserved
    /// `"rootHash"` key and detach the in-memory tree to a single lazy
    /// `Hash` reference.
    ///
    /// Committing an empty trie clears any previously-persisted
    /// `"rootHash"` entry instead of writing the canonical empty-trie
    /// hash: that hash is never backed by a stored node, and writing
    /// it as a root reference would make a later `get`/`materialize`
    /// on a freshly reopened empty trie fail looking for a node that
    /// was never written.
    pub fn commit(&self) -> Result<[u8; 32], TrieError> {
        let mut root = self.root.write();
        let root_hash = match &mut *root {
            None => {
                self.storage.delete(ROOT_HASH_KEY)?;
                empty_trie_root()
            }
            Some(boxed) => {
                self.commit_node(boxed)?;
                let root_hash = boxed.hash();
                self.storage.put(ROOT_HASH_KEY, &root_hash)?;
                *boxed = Box::new(Node::Hash { hash: root_hash });
                root_hash
            }
        };
        tracing::debug!(root_hash = %hex::encode(root_hash), "trie committed");
        Ok(root_hash)
    }

    fn commit_node(&self, boxed: &mut Box<Node>) -> Result<(), TrieError> {
        match &mut **boxed {
            Node::Leaf { .. } => {}
            Node::Extension { child, .. } => self.commit_node(child)?,
            Node::Branch { children, .. } => {
                for slot in children.iter_mut() {
                    if let Some(child) = slot {
                        self.commit_node(child)?;
                    }
                }
            }
            Node::Hash { .. } => return Ok(()),
        }

        if boxed.is_dirty() {
            let encoded = boxed.raw_form().encode();
            let hash = keccak256(&encoded);
            self.storage.put(&hash, &encoded)?;
            **boxed = Node::Hash { hash };
        } else {
            let hash = boxed.hash();
            **boxed = Node::Hash { hash };
        }
        Ok(())
    }

    /// Build a witness store mapping `hash(node) -> rlp(raw(node))`
    /// for every node touched walking down to `key`, alongside whether
    /// the walk actually ends in a match. A leaf-path mismatch, an
    /// unmatched extension prefix, a branch with no value at the
    /// terminal position, or a nil child all report `found = false`,
    /// matching the Go reference's `GenerateProof` returning an error
    /// alongside its witness store for an absent key.
    pub fn proof(&self, key: &[u8]) -> Result<(HashMap<[u8; 32], Vec<u8>>, bool), TrieError> {
        self.validate_key(key)?;
        let path = Nibbles::from_bytes(key);
        let mut witness = HashMap::new();
        let mut root = self.root.write();
        let found = self.proof_walk(&mut root, &path, 0, &mut witness)?;
        Ok((witness, found))
    }

    fn proof_walk(
        &self,
        slot: &mut Option<Box<Node>>,
        path: &Nibbles,
        depth: usize,
        witness: &mut HashMap<[u8; 32], Vec<u8>>,
    ) -> Result<bool, TrieError> {
        match slot {
            None => Ok(false),
            Some(boxed) => self.proof_walk_box(boxed, path, depth, witness),
        }
    }

    fn proof_walk_box(
        &self,
        boxed: &mut Box<Node>,
        path: &Nibbles,
        depth: usize,
        witness: &mut HashMap<[u8; 32], Vec<u8>>,
    ) -> Result<bool, TrieError> {
        self.materialize(boxed)?;
        let encoded = boxed.raw_form().encode();
        witness.insert(boxed.hash(), encoded);
        match &mut **boxed {
            Node::Leaf { path: leaf_path, .. } => {
                let remaining = path.slice(depth);
                Ok(remaining == *leaf_path)
            }
            Node::Extension { path: ext_path, child, .. } => {
                let remaining = path.slice(depth);
                if remaining.starts_with(ext_path) {
                    let consumed = ext_path.len();
                    self.proof_walk_box(child, path, depth + consumed, witness)
                } else {
                    Ok(false)
                }
            }
            Node::Branch { children, value, .. } => {
                if depth == path.len() {
                    Ok(value.is_some())
                } else {
                    let idx = path.at(depth) as usize;
                    self.proof_walk(&mut children[idx], path, depth + 1, witness)
                }
            }
            Node::Hash { .. } => unreachable!("materialized above"),
        }
    }

    fn materialize(&self, node: &mut Node) -> Result<(), TrieError> {
        if let Node::Hash { hash } = node {
            let hash = *hash;
            let data = self.storage.get(&hash)?.ok_or_else(|| {
                TrieError::DecodeError(format!("missing node for hash {}", hex::encode(hash)))
            })?;
            *node = decode_node(&data)?;
        }
        Ok(())
    }
}

fn split_leaf(leaf_path: &Nibbles, leaf_value: &[u8], remaining: &Nibbles, value: Vec<u8>) -> Node {
    let cpl = remaining.common_prefix_len(leaf_path);
    let mut branch = Node::new_branch();
    if cpl == leaf_path.len() {
        if let Node::Branch { value: bval, .. } = &mut branch {
            *bval = Some(leaf_value.to_vec());
        }
    } else {
        let nib = leaf_path.at(cpl);
        let rest = leaf_path.slice(cpl + 1);
        if let Node::Branch { children, .. } = &mut branch {
            children[nib as usize] = Some(Box::new(Node::new_leaf(rest, leaf_value.to_vec())));
        }
    }
    if cpl == remaining.len() {
        if let Node::Branch { value: bval, .. } = &mut branch {
            *bval = Some(value);
        }
    } else {
        let nib = remaining.at(cpl);
        let rest = remaining.slice(cpl + 1);
        if let Node::Branch { children, .. } = &mut branch {
            children[nib as usize] = Some(Box::new(Node::new_leaf(rest, value)));
        }
    }
    if cpl > 0 {
        Node::new_extension(remaining.slice_range(0, cpl), branch)
    } else {
        branch
    }
}

fn split_extension(
    ext_path: &Nibbles,
    child: &mut Box<Node>,
    remaining: &Nibbles,
    cpl: usize,
    value: Vec<u8>,
) -> Node {
    let mut branch = Node::new_branch();
    if ext_path.len() - cpl == 1 {
        let nib = ext_path.at(cpl);
        if let Node::Branch { children, .. } = &mut branch {
            children[nib as usize] = Some(child.clone());
        }
    } else {
        let nib = ext_path.at(cpl);
        let rest = ext_path.slice(cpl + 1);
        if let Node::Branch { children, .. } = &mut branch {
            children[nib as usize] = Some(Box::new(Node::new_extension(rest, (**child).clone())));
        }
    }
    if cpl == remaining.len() {
        if let Node::Branch { value: bval, .. } = &mut branch {
            *bval = Some(value);
        }
    } else {
        let nib = remaining.at(cpl);
        let rest = remaining.slice(cpl + 1);
        if let Node::Branch { children, .. } = &mut branch {
            children[nib as usize] = Some(Box::new(Node::new_leaf(rest, value)));
        }
    }
    if cpl > 0 {
        Node::new_extension(remaining.slice_range(0, cpl), branch)
    } else {
        branch
    }
}

fn compress_extension(boxed: &mut Box<Node>) {
    let ext_path;
    let taken;
    match &mut **boxed {
        Node::Extension { path, child, .. } => {
            ext_path = path.clone();
            taken = std::mem::replace(&mut **child, Node::Hash { hash: [0u8; 32] });
        }
        _ => return,
    }
    match taken {
        Node::Leaf { path: cp, value, .. } => {
            **boxed = Node::Leaf {
                path: ext_path.concat(&cp),
                value,
                dirty: true,
            };
        }
        Node::Extension { path: cp, child: cc, .. } => {
            **boxed = Node::Extension {
                path: ext_path.concat(&cp),
                child: cc,
                dirty: true,
            };
        }
        other => {
            if let Node::Extension { child, dirty, .. } = &mut **boxed {
                **child = other;
                *dirty = true;
            }
        }
    }
}

fn is_empty_branch(boxed: &Box<Node>) -> bool {
    matches!(
        &**boxed,
        Node::Branch { children, value, .. } if value.is_none() && children.iter().all(|c| c.is_none())
    )
}

/// `keccak256(rlp(""))`: the canonical hash of an empty trie.
pub fn empty_trie_root() -> [u8; 32] {
    keccak256(&RlpItem::Bytes(Vec::new()).encode())
}

fn decode_node(data: &[u8]) -> Result<Node, TrieError> {
    let item = RlpItem::decode_exact(data)?;
    node_from_item(&item)
}

fn node_from_item(item: &RlpItem) -> Result<Node, TrieError> {
    let list = item.as_list()?;
    match list.len() {
        2 => {
            let path_bytes = list[0].as_bytes()?;
            let nibbles = Nibbles::from_bytes(path_bytes);
            let is_leaf = Nibbles::is_leaf(&nibbles);
            let path = Nibbles::remove_compact(&nibbles);
            if is_leaf {
                let value = list[1].as_bytes()?.to_vec();
                Ok(Node::Leaf { path, value, dirty: false })
            } else {
                let child = child_from_item(&list[1])?;
                Ok(Node::Extension {
                    path,
                    child: Box::new(child),
                    dirty: false,
                })
            }
        }
        17 => {
            let mut children: [Option<Box<Node>>; 16] = Default::default();
            for (i, slot) in children.iter_mut().enumerate() {
                *slot = match &list[i] {
                    RlpItem::Bytes(b) if b.is_empty() => None,
                    other => Some(Box::new(child_from_item(other)?)),
                };
            }
            let value_bytes = list[16].as_bytes()?;
            let value = if value_bytes.is_empty() {
                None
            } else {
                Some(value_bytes.to_vec())
            };
            Ok(Node::Branch {
                children: Box::new(children),
                value,
                dirty: false,
            })
        }
        other => Err(TrieError::DecodeError(format!(
            "node RLP list has unexpected arity {other}"
        ))),
    }
}

fn child_from_item(item: &RlpItem) -> Result<Node, TrieError> {
    match item {
        RlpItem::Bytes(b) if b.len() == 32 => {
            let mut hash = [0u8; 32];
            hash.copy_from_slice(b);
            Ok(Node::Hash { hash })
        }
        RlpItem::Bytes(b) if b.is_empty() => Err(TrieError::DecodeError(
            "empty byte string is not a valid child reference".into(),
        )),
        RlpItem::Bytes(_) => Err(TrieError::DecodeError(
            "inline child reference has invalid length".into(),
        )),
        RlpItem::List(_) => node_from_item(item),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStorage;

    fn fresh_trie() -> Trie<MemoryStorage> {
        Trie::new(MemoryStorage::new()).unwrap()
    }

    #[test]
    fn empty_trie_hash_is_absent() {
        let trie = fresh_trie();
        assert_eq!(trie.hash(), None);
    }

    #[test]
    fn non_empty_trie_hash_is_present() {
        let trie = fresh_trie();
        trie.put(b"dog", b"puppy".to_vec()).unwrap();
        assert!(trie.hash().is_some());
    }

    #[test]
    fn get_returns_none_for_missing_key() {
        let trie = fresh_trie();
        assert_eq!(trie.get(b"missing").unwrap(), None);
    }

    #[test]
    fn put_then_get_round_trips() {
        let trie = fresh_trie();
        trie.put(b"dog", b"puppy".to_vec()).unwrap();
        assert_eq!(trie.get(b"dog").unwrap(), Some(b"puppy".to_vec()));
    }

    #[test]
    fn put_overwrites_existing_value() {
        let trie = fresh_trie();
        trie.put(b"dog", b"puppy".to_vec()).unwrap();
        trie.put(b"dog", b"hound".to_vec()).unwrap();
        assert_eq!(trie.get(b"dog").unwrap(), Some(b"hound".to_vec()));
    }

    #[test]
    fn put_diverging_keys_share_a_branch() {
        let trie = fresh_trie();
        trie.put(b"dog", b"puppy".to_vec()).unwrap();
        trie.put(b"doge", b"coin".to_vec()).unwrap();
        trie.put(b"cat", b"meow".to_vec()).unwrap();
        assert_eq!(trie.get(b"dog").unwrap(), Some(b"puppy".to_vec()));
        assert_eq!(trie.get(b"doge").unwrap(), Some(b"coin".to_vec()));
        assert_eq!(trie.get(b"cat").unwrap(), Some(b"meow".to_vec()));
    }

    #[test]
    fn del_removes_key_and_leaves_siblings_intact() {
        let trie = fresh_trie();
        trie.put(b"dog", b"puppy".to_vec()).unwrap();
        trie.put(b"doge", b"coin".to_vec()).unwrap();
        trie.del(b"dog").unwrap();
        assert_eq!(trie.get(b"dog").unwrap(), None);
        assert_eq!(trie.get(b"doge").unwrap(), Some(b"coin".to_vec()));
    }

    #[test]
    fn del_of_missing_key_returns_not_found() {
        let trie = fresh_trie();
        trie.put(b"dog", b"puppy".to_vec()).unwrap();
        let before = trie.hash();
        assert!(matches!(trie.del(b"cat"), Err(TrieError::NotFound)));
        assert_eq!(trie.hash(), before);
    }

    #[test]
    fn del_of_missing_key_in_empty_trie_returns_not_found() {
        let trie = fresh_trie();
        assert!(matches!(trie.del(b"cat"), Err(TrieError::NotFound)));
    }

    #[test]
    fn deleting_every_key_restores_the_empty_root() {
        let trie = fresh_trie();
        trie.put(b"dog", b"puppy".to_vec()).unwrap();
        trie.put(b"doge", b"coin".to_vec()).unwrap();
        trie.put(b"cat", b"meow".to_vec()).unwrap();
        trie.del(b"dog").unwrap();
        trie.del(b"doge").unwrap();
        trie.del(b"cat").unwrap();
        assert_eq!(trie.hash(), None);
    }

    #[test]
    fn commit_persists_and_reload_resumes_from_storage() {
        let storage = MemoryStorage::new();
        let trie = Trie::new(storage).unwrap();
        trie.put(b"dog", b"puppy".to_vec()).unwrap();
        trie.put(b"doge", b"coin".to_vec()).unwrap();
        let committed_hash = trie.commit().unwrap();

        let reopened = Trie::new(trie.storage).unwrap();
        assert_eq!(reopened.hash(), Some(committed_hash));
        assert_eq!(reopened.get(b"dog").unwrap(), Some(b"puppy".to_vec()));
        assert_eq!(reopened.get(b"doge").unwrap(), Some(b"coin".to_vec()));
    }

    #[test]
    fn commit_of_empty_trie_reopens_empty() {
        let storage = MemoryStorage::new();
        let trie = Trie::new(storage).unwrap();
        trie.commit().unwrap();

        let reopened = Trie::new(trie.storage).unwrap();
        assert_eq!(reopened.hash(), None);
        assert_eq!(reopened.get(b"anything").unwrap(), None);
    }

    #[test]
    fn hash_is_stable_across_insertion_order() {
        let a = fresh_trie();
        a.put(b"dog", b"puppy".to_vec()).unwrap();
        a.put(b"doge", b"coin".to_vec()).unwrap();
        a.put(b"cat", b"meow".to_vec()).unwrap();

        let b = fresh_trie();
        b.put(b"cat", b"meow".to_vec()).unwrap();
        b.put(b"doge", b"coin".to_vec()).unwrap();
        b.put(b"dog", b"puppy".to_vec()).unwrap();

        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn proof_witness_includes_the_root_hash_entry() {
        let trie = fresh_trie();
        trie.put(b"dog", b"puppy".to_vec()).unwrap();
        trie.put(b"doge", b"coin".to_vec()).unwrap();
        let root_hash = trie.hash().unwrap();
        let (witness, found) = trie.proof(b"dog").unwrap();
        assert!(found);
        assert!(witness.contains_key(&root_hash));
    }

    #[test]
    fn proof_for_absent_key_reports_not_found() {
        let trie = fresh_trie();
        trie.put(b"dog", b"puppy".to_vec()).unwrap();
        let (witness, found) = trie.proof(b"cat").unwrap();
        assert!(!found);
        assert!(!witness.is_empty());
    }

    #[test]
    fn over_long_key_is_rejected() {
        let trie = Trie::with_config(
            MemoryStorage::new(),
            TrieConfig { max_key_len: 4 },
        )
        .unwrap();
        assert!(matches!(
            trie.put(b"toolong", vec![1]),
            Err(TrieError::InvariantViolation(_))
        ));
    }

    proptest::proptest! {
        #[test]
        fn order_independent_insertion_yields_same_hash(
            mut pairs in proptest::collection::vec(
                (proptest::collection::vec(proptest::prelude::any::<u8>(), 1..8),
                 proptest::collection::vec(proptest::prelude::any::<u8>(), 0..8)),
                1..12,
            )
        ) {
            pairs.sort();
            pairs.dedup_by(|a, b| a.0 == b.0);

            let forward = fresh_trie();
            for (k, v) in pairs.iter() {
                forward.put(k, v.clone()).unwrap();
            }

            let mut shuffled = pairs.clone();
            shuffled.reverse();
            let backward = fresh_trie();
            for (k, v) in shuffled.iter() {
                backward.put(k, v.clone()).unwrap();
            }

            proptest::prop_assert_eq!(forward.hash(), backward.hash());
        }

        #[test]
        fn deleting_everything_reaches_the_empty_root(
            mut keys in proptest::collection::vec(
                proptest::collection::vec(proptest::prelude::any::<u8>(), 1..8),
                1..10,
            )
        ) {
            keys.sort();
            keys.dedup();

            let trie = fresh_trie();
            for k in keys.iter() {
                trie.put(k, vec![0xAA]).unwrap();
            }
            for k in keys.iter() {
                trie.del(k).unwrap();
            }
            proptest::prop_assert_eq!(trie.hash(), None);
        }
    }
}
