//! A Merkle Patricia Trie core library.
//!
//! This crate implements the 16-ary radix trie Ethereum-family chains
//! use for state and storage roots: path-compressed nodes (leaf,
//! extension, branch), lazy hash references to an on-disk node store,
//! and the RLP encoding and inlining rule that give every subtree its
//! hash.
//!
//! ```
//! use patricia_trie::{Trie, adapters::MemoryStorage};
//!
//! let trie = Trie::new(MemoryStorage::new()).unwrap();
//! trie.put(b"dog", b"puppy".to_vec()).unwrap();
//! assert_eq!(trie.get(b"dog").unwrap(), Some(b"puppy".to_vec()));
//! ```
//!
//! The trie itself only depends on [`ports::Storage`]; `adapters`
//! ships three conforming backends (in-memory, a configurable mock for
//! tests, and an embedded RocksDB store) and callers are free to
//! supply their own.

pub mod adapters;
pub mod config;
pub mod error;
pub mod nibble;
pub mod node;
pub mod ports;
pub mod rlp;
pub mod trie;

pub use config::TrieConfig;
pub use error::TrieError;
pub use trie::Trie;
