//! A configurable mock storage adapter for exercising error paths and
//! edge-case behavior in tests without standing up a real backend.

use crate::error::TrieError;
use crate::ports::Storage;

type HasFn = Box<dyn Fn(&[u8]) -> Result<bool, TrieError> + Send + Sync>;
type GetFn = Box<dyn Fn(&[u8]) -> Result<Option<Vec<u8>>, TrieError> + Send + Sync>;
type PutFn = Box<dyn Fn(&[u8], &[u8]) -> Result<(), TrieError> + Send + Sync>;
type DeleteFn = Box<dyn Fn(&[u8]) -> Result<(), TrieError> + Send + Sync>;

/// A `Storage` stand-in whose methods delegate to caller-supplied
/// closures, each defaulting to an empty/no-op behavior when unset:
/// `has` defaults to `false`, `get` to `None`, and `put`/`delete`
/// default to `Ok(())` without recording anything.
#[derive(Default)]
pub struct MockStorage {
    pub has_fn: Option<HasFn>,
    pub get_fn: Option<GetFn>,
    pub put_fn: Option<PutFn>,
    pub delete_fn: Option<DeleteFn>,
}

impl MockStorage {
    pub fn new() -> Self {
        MockStorage {
            has_fn: None,
            get_fn: None,
            put_fn: None,
            delete_fn: None,
        }
    }

    pub fn with_has(mut self, f: impl Fn(&[u8]) -> Result<bool, TrieError> + Send + Sync + 'static) -> Self {
        self.has_fn = Some(Box::new(f));
        self
    }

    pub fn with_get(
        mut self,
        f: impl Fn(&[u8]) -> Result<Option<Vec<u8>>, TrieError> + Send + Sync + 'static,
    ) -> Self {
        self.get_fn = Some(Box::new(f));
        self
    }

    pub fn with_put(
        mut self,
        f: impl Fn(&[u8], &[u8]) -> Result<(), TrieError> + Send + Sync + 'static,
    ) -> Self {
        self.put_fn = Some(Box::new(f));
        self
    }

    pub fn with_delete(mut self, f: impl Fn(&[u8]) -> Result<(), TrieError> + Send + Sync + 'static) -> Self {
        self.delete_fn = Some(Box::new(f));
        self
    }
}

impl Storage for MockStorage {
    fn has(&self, key: &[u8]) -> Result<bool, TrieError> {
        match &self.has_fn {
            Some(f) => f(key),
            None => Ok(false),
        }
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, TrieError> {
        match &self.get_fn {
            Some(f) => f(key),
            None => Ok(None),
        }
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), TrieError> {
        match &self.put_fn {
            Some(f) => f(key, value),
            None => Ok(()),
        }
    }

    fn delete(&self, key: &[u8]) -> Result<(), TrieError> {
        match &self.delete_fn {
            Some(f) => f(key),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_empty() {
        let store = MockStorage::new();
        assert_eq!(store.has(b"k").unwrap(), false);
        assert_eq!(store.get(b"k").unwrap(), None);
        store.put(b"k", b"v").unwrap();
        store.delete(b"k").unwrap();
    }

    #[test]
    fn overridden_get_is_used() {
        let store = MockStorage::new().with_get(|_| Ok(Some(b"fixed".to_vec())));
        assert_eq!(store.get(b"anything").unwrap(), Some(b"fixed".to_vec()));
    }

    #[test]
    fn overridden_put_can_return_storage_error() {
        let store =
            MockStorage::new().with_put(|_, _| Err(TrieError::StorageError("disk full".into())));
        assert!(store.put(b"k", b"v").is_err());
    }
}
