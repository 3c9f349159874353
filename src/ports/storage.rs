//! The storage port: the single trait every backing key-value store
//! must implement for the trie core to persist nodes against it.

use crate::error::TrieError;

/// A raw byte-keyed key-value store.
///
/// Keys are opaque bytes, not `Hash`-typed: the reserved root-hash
/// entry is stored under the UTF-8 key `"rootHash"`, which is not a
/// 32-byte hash, so the trait cannot be narrowed to `[u8; 32]` keys.
pub trait Storage {
    fn has(&self, key: &[u8]) -> Result<bool, TrieError>;
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, TrieError>;
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), TrieError>;
    fn delete(&self, key: &[u8]) -> Result<(), TrieError>;
}

/// Reserved storage key under which the trie's root hash is persisted
/// on [`crate::trie::Trie::commit`].
pub const ROOT_HASH_KEY: &[u8] = b"rootHash";
