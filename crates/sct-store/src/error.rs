//! Store error types.

use sct_types::SctId;
use thiserror::Error;

/// Errors that can occur in the persistence layer.
///
/// A lookup that finds nothing is *not* an error: getters return `Option`.
/// The variants here cover genuinely broken states such as a
/// version-mismatched store or a dangling reverse index.
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O error touching the store directory.
    #[error("IO error accessing store: {0}")]
    Io(#[from] std::io::Error),

    /// The sled backend reported a failure.
    #[error("storage backend error: {0}")]
    Backend(#[from] sled::Error),

    /// The store could not be opened, typically because another process
    /// holds the write lock on the directory.
    #[error("unable to open store at {path}: {source}")]
    Open {
        /// The store directory.
        path: String,
        /// The underlying backend error.
        source: sled::Error,
    },

    /// The on-disk descriptor does not match the supported schema version.
    #[error("incompatible store format v{found}, needed v{expected}")]
    SchemaMismatch {
        /// Version found in the descriptor.
        found: f32,
        /// Version this build supports.
        expected: f32,
    },

    /// The descriptor file could not be read or written.
    #[error("invalid store descriptor: {0}")]
    Descriptor(#[from] serde_json::Error),

    /// A write was attempted on a store opened read-only.
    #[error("store is opened read-only")]
    ReadOnly,

    /// A stored payload failed to decode.
    #[error("corrupt payload under key {key}: {source}")]
    CorruptPayload {
        /// Hex rendering of the offending key.
        key: String,
        /// The protobuf decode failure.
        source: prost::DecodeError,
    },

    /// A reverse index entry points at a record that does not exist.
    #[error("dangling reverse index for {kind} {id}")]
    DanglingIndex {
        /// The kind of record the index points at.
        kind: &'static str,
        /// The identifier in the dangling entry.
        id: SctId,
    },

    /// A concept referenced by another record is missing (integrity break).
    #[error("referenced concept {id} not found")]
    MissingConcept {
        /// The missing concept identifier.
        id: SctId,
    },

    /// A stored key is shorter than its fixed-width layout requires.
    #[error("malformed key in keyspace '{keyspace}'")]
    MalformedKey {
        /// The one-byte keyspace discriminator, as a char.
        keyspace: char,
    },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
