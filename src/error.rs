//! Error types for the trie core and its storage adapters.

use thiserror::Error;

/// Errors produced by [`crate::trie::Trie`] operations and its storage
/// adapters.
#[derive(Error, Debug)]
pub enum TrieError {
    /// The requested key is not present in the trie.
    #[error("key not found")]
    NotFound,

    /// The storage backend returned an error.
    #[error("storage error: {0}")]
    StorageError(String),

    /// A node read back from storage could not be decoded (malformed
    /// RLP, wrong arity, or a child of unexpected length).
    #[error("decode error: {0}")]
    DecodeError(String),

    /// A structural invariant of the trie was violated.
    ///
    /// Returned as a normal error rather than a panic/abort: unwinding
    /// through the lock guard in [`crate::trie::Trie`] would leave
    /// inconsistent state, and Rust has no cheaper "abort this
    /// operation but keep the process alive" primitive. Callers that
    /// want fatal semantics can match on this variant and abort
    /// themselves.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}
