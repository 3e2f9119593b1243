//! # sct-terminology
//!
//! The semantic layer of the terminology engine: a practical SNOMED CT API
//! over the entity store and the search index.
//!
//! [`TerminologySvc`] combines the two backends and extends them with
//! inference (transitive parents, subsumption, paths to root,
//! genericisation) and locale-sensitive name resolution. All query paths
//! are shared-nothing reads over the store snapshot and may be called from
//! any number of threads.
//!
//! Relationships stay on disk and are resolved on demand, so hierarchy
//! walks are pure DAG traversals over borrowed data with no in-memory
//! cycles.

mod builder;
mod error;
mod export;
mod language;
mod semantic;
mod svc;

pub use error::{TerminologyError, TerminologyResult};
pub use language::parse_accept_language;
pub use semantic::{Subsumption, TranslateOutcome};
pub use svc::{SvcOptions, TerminologySvc};

pub use sct_search::{FuzzyMode, SearchRequest};
pub use sct_store::Statistics;
