//! # sct-search
//!
//! Inverted full-text index over extended descriptions.
//!
//! One document is indexed per description: its term and the concept's
//! preferred term are analysed text, everything else (identifiers, flags,
//! parent and refset ids) is indexed raw as keywords. Searches compile a
//! [`SearchRequest`] into a boolean query of per-token prefix (optionally
//! fuzzy) clauses conjoined with the structural filters, and return
//! `(concept_id, description_id)` pairs in scored order.

mod index;
mod query;
mod request;

use thiserror::Error;

pub use index::SearchService;
pub use request::{FuzzyMode, SearchRequest};

/// Errors raised by the search index.
#[derive(Error, Debug)]
pub enum SearchError {
    /// I/O error touching the index directory.
    #[error("IO error accessing search index: {0}")]
    Io(#[from] std::io::Error),

    /// The tantivy backend reported a failure.
    #[error("search index error: {0}")]
    Index(#[from] tantivy::TantivyError),

    /// An indexing write was attempted on an index opened read-only.
    #[error("search index is opened read-only")]
    ReadOnly,
}

/// Result type for search operations.
pub type SearchResult<T> = Result<T, SearchError>;
