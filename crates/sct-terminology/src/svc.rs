//! Service construction and lifecycle.

use std::path::{Path, PathBuf};

use sct_search::{SearchRequest, SearchService};
use sct_store::{EntityStore, Statistics};
use sct_types::SctId;
use tracing::info;
use unic_langid::LanguageIdentifier;

use crate::error::TerminologyResult;

/// Options for opening a terminology service.
#[derive(Debug, Clone)]
pub struct SvcOptions {
    /// Alternate directory for the search index; defaults to the data
    /// directory itself.
    pub index_dir: Option<PathBuf>,
    /// Whether the search index is opened read-only. The `index` command
    /// opens the entity store read-only but the index writable.
    pub index_read_only: bool,
    /// Locale applied when a request carries no usable `Accept-Language`.
    pub default_language: LanguageIdentifier,
}

impl Default for SvcOptions {
    fn default() -> Self {
        Self {
            index_dir: None,
            index_read_only: true,
            default_language: unic_langid::langid!("en-GB"),
        }
    }
}

/// The terminology service: entity store + search index + locale defaults.
pub struct TerminologySvc {
    pub(crate) store: EntityStore,
    pub(crate) search: SearchService,
    pub(crate) default_language: LanguageIdentifier,
}

impl TerminologySvc {
    /// Opens the service rooted at `path`.
    ///
    /// The entity store is opened read-only or read-write according to
    /// `read_only`; the index according to `options.index_read_only`.
    pub fn open<P: AsRef<Path>>(
        path: P,
        read_only: bool,
        options: SvcOptions,
    ) -> TerminologyResult<Self> {
        let path = path.as_ref();
        let store = EntityStore::open(path, read_only)?;
        let index_dir = options.index_dir.unwrap_or_else(|| path.to_path_buf());
        let search = SearchService::open(index_dir, options.index_read_only)?;
        info!(path = %path.display(), read_only, "terminology service opened");
        Ok(Self {
            store,
            search,
            default_language: options.default_language,
        })
    }

    /// The entity store backing this service.
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// The default locale for name resolution.
    pub fn default_language(&self) -> &LanguageIdentifier {
        &self.default_language
    }

    /// Executes a free-text search against the index.
    pub fn search(&self, request: &SearchRequest) -> TerminologyResult<Vec<(SctId, SctId)>> {
        Ok(self.search.search(request)?)
    }

    /// Store-wide statistics.
    pub fn statistics(&self) -> TerminologyResult<Statistics> {
        Ok(self.store.statistics()?)
    }

    /// Flushes both backends and releases their resources.
    pub fn close(&self) -> TerminologyResult<()> {
        self.store.close()?;
        Ok(())
    }
}
