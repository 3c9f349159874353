//! In-memory storage adapter, backed by a mutex-protected hash map.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::TrieError;
use crate::ports::Storage;

/// A `Storage` implementation that keeps everything in a
/// `HashMap<Vec<u8>, Vec<u8>>` guarded by a `parking_lot::Mutex`.
///
/// Useful for tests and for short-lived tries that never need to
/// survive a process restart.
#[derive(Default)]
pub struct MemoryStorage {
    data: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage {
            data: Mutex::new(HashMap::new()),
        }
    }
}

impl Storage for MemoryStorage {
    fn has(&self, key: &[u8]) -> Result<bool, TrieError> {
        Ok(self.data.lock().contains_key(key))
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, TrieError> {
        Ok(self.data.lock().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), TrieError> {
        self.data.lock().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), TrieError> {
        self.data.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips() {
        let store = MemoryStorage::new();
        store.put(b"k", b"v").unwrap();
        assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));
        assert!(store.has(b"k").unwrap());
    }

    #[test]
    fn delete_removes_key() {
        let store = MemoryStorage::new();
        store.put(b"k", b"v").unwrap();
        store.delete(b"k").unwrap();
        assert_eq!(store.get(b"k").unwrap(), None);
        assert!(!store.has(b"k").unwrap());
    }

    #[test]
    fn get_missing_key_returns_none() {
        let store = MemoryStorage::new();
        assert_eq!(store.get(b"missing").unwrap(), None);
    }
}
