//! Storage port implementations shipped with this crate.

pub mod memory;
pub mod mock;
pub mod rocksdb_store;

pub use memory::MemoryStorage;
pub use mock::MockStorage;
pub use rocksdb_store::RocksDbStorage;
