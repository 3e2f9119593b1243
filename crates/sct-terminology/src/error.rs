//! Semantic-layer error types.

use sct_search::SearchError;
use sct_store::StoreError;
use sct_types::SctId;
use thiserror::Error;

/// Errors raised by the semantic layer.
///
/// Plain lookups that find nothing return `Ok(None)`; the `NotFound`-style
/// variants here are produced only where an identifier was *required* (an
/// RPC argument, a `must_` lookup) and its absence is the answer.
#[derive(Error, Debug)]
pub enum TerminologyError {
    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Search index failure.
    #[error(transparent)]
    Search(#[from] SearchError),

    /// A required concept does not exist.
    #[error("concept {id} not found")]
    ConceptNotFound {
        /// The missing identifier.
        id: SctId,
    },

    /// A concept is missing a preferred synonym or FSN; every concept in a
    /// well-formed release has one, so this indicates a corrupt dataset.
    #[error("could not determine {kind} for concept {concept_id}")]
    MissingPreferredDescription {
        /// "preferred synonym" or "fully specified name".
        kind: &'static str,
        /// The concept whose name could not be resolved.
        concept_id: SctId,
    },

    /// The concept cannot be generalised into the requested target set.
    #[error("unable to genericise {concept_id} to a member of refset {refset_id}")]
    NoTranslation {
        /// The source concept.
        concept_id: SctId,
        /// The target refset.
        refset_id: SctId,
    },

    /// No path from the concept passes through the requested root.
    #[error("root concept {root_id} not found on any path from concept {concept_id}")]
    RootNotOnPath {
        /// The starting concept.
        concept_id: SctId,
        /// The requested root.
        root_id: SctId,
    },
}

/// Result type for semantic-layer operations.
pub type TerminologyResult<T> = Result<T, TerminologyError>;
