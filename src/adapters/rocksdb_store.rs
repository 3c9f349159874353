//! An embedded LSM storage adapter over `rocksdb`.
//!
//! The reference Go implementation persists trie nodes in `pebble`; no
//! crate in this codebase's lineage wraps pebble, but `rocksdb` is
//! already a first-class dependency elsewhere in the workspace, so it
//! is the natural substitute for an embedded LSM backend here.

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use rocksdb::{BlockBasedOptions, Cache, Options, DB};

use crate::error::TrieError;
use crate::ports::Storage;

/// Tuning knobs for [`RocksDbStorage`], mirroring the handful of
/// settings that matter for a trie-node workload: most keys are
/// small (<= a few hundred bytes), reads dominate writes, and point
/// lookups by node hash are the only access pattern.
#[derive(Clone, Debug)]
pub struct RocksDbConfig {
    pub path: std::path::PathBuf,
    pub block_cache_size: usize,
    pub write_buffer_size: usize,
    pub max_write_buffer_number: i32,
    pub enable_statistics: bool,
}

impl RocksDbConfig {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        RocksDbConfig {
            path: path.into(),
            block_cache_size: 64 * 1024 * 1024,
            write_buffer_size: 32 * 1024 * 1024,
            max_write_buffer_number: 2,
            enable_statistics: false,
        }
    }

    /// A configuration tuned down for unit/integration tests: small
    /// buffers, no statistics collection.
    pub fn for_testing(path: impl Into<std::path::PathBuf>) -> Self {
        RocksDbConfig {
            path: path.into(),
            block_cache_size: 4 * 1024 * 1024,
            write_buffer_size: 4 * 1024 * 1024,
            max_write_buffer_number: 2,
            enable_statistics: false,
        }
    }
}

/// A `Storage` implementation backed by a single RocksDB column
/// family. Trie nodes (keyed by hash) and the reserved `"rootHash"`
/// entry share the same keyspace, matching the reference Go `pebble`
/// adapter, which has no column families at all.
pub struct RocksDbStorage {
    db: Arc<RwLock<DB>>,
}

impl RocksDbStorage {
    pub fn open(config: &RocksDbConfig) -> Result<Self, TrieError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_max_write_buffer_number(config.max_write_buffer_number);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);
        if config.enable_statistics {
            opts.enable_statistics();
        }

        let mut block_opts = BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let db = DB::open(&opts, &config.path)
            .map_err(|e| TrieError::StorageError(format!("rocksdb open failed: {e}")))?;

        Ok(RocksDbStorage {
            db: Arc::new(RwLock::new(db)),
        })
    }

    pub fn open_path(path: impl AsRef<Path>) -> Result<Self, TrieError> {
        Self::open(&RocksDbConfig::new(path.as_ref().to_path_buf()))
    }
}

impl Storage for RocksDbStorage {
    fn has(&self, key: &[u8]) -> Result<bool, TrieError> {
        self.db
            .read()
            .get(key)
            .map(|v| v.is_some())
            .map_err(|e| TrieError::StorageError(e.to_string()))
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, TrieError> {
        self.db
            .read()
            .get(key)
            .map_err(|e| TrieError::StorageError(e.to_string()))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), TrieError> {
        self.db
            .write()
            .put(key, value)
            .map_err(|e| TrieError::StorageError(e.to_string()))
    }

    fn delete(&self, key: &[u8]) -> Result<(), TrieError> {
        self.db
            .write()
            .delete(key)
            .map_err(|e| TrieError::StorageError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn put_then_get_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = RocksDbStorage::open(&RocksDbConfig::for_testing(dir.path())).unwrap();
        store.put(b"k", b"v").unwrap();
        assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));
        assert!(store.has(b"k").unwrap());
    }

    #[test]
    fn delete_removes_key() {
        let dir = TempDir::new().unwrap();
        let store = RocksDbStorage::open(&RocksDbConfig::for_testing(dir.path())).unwrap();
        store.put(b"k", b"v").unwrap();
        store.delete(b"k").unwrap();
        assert_eq!(store.get(b"k").unwrap(), None);
    }
}
