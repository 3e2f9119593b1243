//! Tantivy-backed search service.

use std::path::Path;
use std::sync::Mutex;

use sct_types::{DescriptionType, ExtendedDescription, SctId};
use tantivy::directory::MmapDirectory;
use tantivy::schema::{Field, Schema, Value, STORED, STRING, TEXT};
use tantivy::{Index, IndexReader, IndexWriter, TantivyDocument, TantivyError, Term};
use tracing::info;

use crate::query::compile_query;
use crate::request::{FuzzyMode, SearchRequest};
use crate::{SearchError, SearchResult};

const INDEX_DIR: &str = "search_index";
const WRITER_HEAP_BYTES: usize = 50_000_000;

/// The indexed fields of one extended-description document.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Fields {
    pub term: Field,
    pub preferred_term: Field,
    pub concept_id: Field,
    pub description_id: Field,
    pub description_type: Field,
    pub module_id: Field,
    pub language: Field,
    pub concept_active: Field,
    pub description_active: Field,
    pub recursive_parent_ids: Field,
    pub direct_parent_ids: Field,
    pub concept_refset_ids: Field,
    pub description_refset_ids: Field,
}

fn build_schema() -> (Schema, Fields) {
    let mut builder = Schema::builder();
    let fields = Fields {
        term: builder.add_text_field("term", TEXT),
        preferred_term: builder.add_text_field("preferred_term", TEXT),
        concept_id: builder.add_text_field("concept_id", STRING | STORED),
        description_id: builder.add_text_field("description_id", STRING | STORED),
        description_type: builder.add_text_field("description_type", STRING),
        module_id: builder.add_text_field("module_id", STRING),
        language: builder.add_text_field("language", STRING),
        concept_active: builder.add_text_field("concept_active", STRING),
        description_active: builder.add_text_field("description_active", STRING),
        recursive_parent_ids: builder.add_text_field("recursive_parent_ids", STRING),
        direct_parent_ids: builder.add_text_field("direct_parent_ids", STRING),
        concept_refset_ids: builder.add_text_field("concept_refset_ids", STRING),
        description_refset_ids: builder.add_text_field("description_refset_ids", STRING),
    };
    (builder.build(), fields)
}

/// Full-text search over extended descriptions.
///
/// Writable handles own a single tantivy writer behind a mutex; read paths
/// share the reader and are freely concurrent.
pub struct SearchService {
    index: Index,
    reader: IndexReader,
    writer: Option<Mutex<IndexWriter>>,
    fields: Fields,
}

impl SearchService {
    /// Opens (or creates) the index in the `search_index` sub-directory of
    /// `path`. Read-only handles cannot index or commit.
    pub fn open<P: AsRef<Path>>(path: P, read_only: bool) -> SearchResult<Self> {
        let dir = path.as_ref().join(INDEX_DIR);
        std::fs::create_dir_all(&dir)?;

        let (schema, fields) = build_schema();
        let directory = MmapDirectory::open(&dir).map_err(TantivyError::from)?;
        let index = Index::open_or_create(directory, schema)?;
        let reader = index.reader()?;
        let writer = if read_only {
            None
        } else {
            Some(Mutex::new(index.writer(WRITER_HEAP_BYTES)?))
        };

        Ok(Self {
            index,
            reader,
            writer,
            fields,
        })
    }

    /// Deletes the on-disk index beneath `path`, dropping every document.
    pub fn reset<P: AsRef<Path>>(path: P) -> SearchResult<()> {
        let dir = path.as_ref().join(INDEX_DIR);
        if dir.exists() {
            std::fs::remove_dir_all(&dir)?;
        }
        info!(path = %dir.display(), "search index dropped");
        Ok(())
    }

    fn writer(&self) -> SearchResult<&Mutex<IndexWriter>> {
        self.writer.as_ref().ok_or(SearchError::ReadOnly)
    }

    /// Indexes a batch of extended descriptions, replacing any previous
    /// document for the same description id.
    pub fn index_batch(&self, batch: &[ExtendedDescription]) -> SearchResult<()> {
        let writer = self.writer()?.lock().unwrap();

        for extended in batch {
            let Some(ref description) = extended.description else {
                continue;
            };
            let Some(ref concept) = extended.concept else {
                continue;
            };

            let description_id = description.id.to_string();
            writer.delete_term(Term::from_field_text(
                self.fields.description_id,
                &description_id,
            ));

            let mut doc = TantivyDocument::new();
            doc.add_text(self.fields.term, &description.term);
            if let Some(ref preferred) = extended.preferred_description {
                doc.add_text(self.fields.preferred_term, &preferred.term);
            }
            doc.add_text(self.fields.concept_id, concept.id.to_string());
            doc.add_text(self.fields.description_id, &description_id);
            doc.add_text(self.fields.description_type, description.type_id.to_string());
            doc.add_text(self.fields.module_id, description.module_id.to_string());
            doc.add_text(self.fields.language, &description.language_code);
            doc.add_text(self.fields.concept_active, flag(concept.active));
            doc.add_text(self.fields.description_active, flag(description.active));
            for id in &extended.recursive_parent_ids {
                doc.add_text(self.fields.recursive_parent_ids, id.to_string());
            }
            for id in &extended.direct_parent_ids {
                doc.add_text(self.fields.direct_parent_ids, id.to_string());
            }
            for id in &extended.concept_refset_ids {
                doc.add_text(self.fields.concept_refset_ids, id.to_string());
            }
            for id in &extended.description_refset_ids {
                doc.add_text(self.fields.description_refset_ids, id.to_string());
            }

            writer.add_document(doc)?;
        }
        Ok(())
    }

    /// Commits buffered documents and refreshes the shared reader.
    pub fn commit(&self) -> SearchResult<()> {
        self.writer()?.lock().unwrap().commit()?;
        self.reader.reload()?;
        Ok(())
    }

    /// Executes a search, returning `(concept_id, description_id)` pairs in
    /// scored order.
    ///
    /// With [`FuzzyMode::Fallback`] an empty result set triggers exactly one
    /// fuzzy re-run; the other modes never fall back.
    pub fn search(&self, request: &SearchRequest) -> SearchResult<Vec<(SctId, SctId)>> {
        let results = self.search_once(request, request.fuzzy == FuzzyMode::Always)?;
        if results.is_empty() && request.fuzzy == FuzzyMode::Fallback {
            return self.search_once(request, true);
        }
        Ok(results)
    }

    fn search_once(
        &self,
        request: &SearchRequest,
        fuzzy: bool,
    ) -> SearchResult<Vec<(SctId, SctId)>> {
        let tokens = self.tokenize(&request.search);
        let query = compile_query(&self.fields, request, &tokens, fuzzy);

        let searcher = self.reader.searcher();
        let top_docs = searcher.search(
            &query,
            &tantivy::collector::TopDocs::with_limit(request.effective_limit()),
        )?;

        let mut results = Vec::with_capacity(top_docs.len());
        for (_score, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address)?;
            let concept_id = stored_id(&doc, self.fields.concept_id);
            let description_id = stored_id(&doc, self.fields.description_id);
            if let (Some(concept_id), Some(description_id)) = (concept_id, description_id) {
                results.push((concept_id, description_id));
            }
        }
        Ok(results)
    }

    /// Runs the query text through the same analyser used at index time.
    fn tokenize(&self, text: &str) -> Vec<String> {
        let mut analyzer = self
            .index
            .tokenizer_for_field(self.fields.term)
            .expect("term field is analysed text");
        let mut stream = analyzer.token_stream(text);
        let mut tokens = Vec::new();
        while let Some(token) = stream.next() {
            tokens.push(token.text.clone());
        }
        tokens
    }
}

fn flag(active: bool) -> &'static str {
    if active {
        "T"
    } else {
        "F"
    }
}

fn stored_id(doc: &TantivyDocument, field: Field) -> Option<SctId> {
    doc.get_first(field)?.as_str()?.parse().ok()
}

/// SCTID of the FSN description type, excluded from every search.
pub(crate) fn fsn_type_id() -> String {
    DescriptionType::Fsn.to_id().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sct_types::{Concept, Description};

    fn make_extended(
        concept_id: SctId,
        description_id: SctId,
        term: &str,
        type_id: SctId,
        concept_active: bool,
        description_active: bool,
        recursive_parents: Vec<SctId>,
        concept_refsets: Vec<SctId>,
    ) -> ExtendedDescription {
        ExtendedDescription {
            concept: Some(Concept {
                id: concept_id,
                effective_time: 20020131,
                active: concept_active,
                module_id: 900000000000207008,
                definition_status_id: 900000000000074008,
            }),
            description: Some(Description {
                id: description_id,
                effective_time: 20020131,
                active: description_active,
                module_id: 900000000000207008,
                concept_id,
                language_code: "en".to_string(),
                type_id,
                term: term.to_string(),
                case_significance_id: 900000000000448009,
            }),
            preferred_description: Some(Description {
                id: description_id,
                effective_time: 20020131,
                active: true,
                module_id: 900000000000207008,
                concept_id,
                language_code: "en".to_string(),
                type_id: DescriptionType::SYNONYM_ID,
                term: term.to_string(),
                case_significance_id: 900000000000448009,
            }),
            recursive_parent_ids: recursive_parents,
            direct_parent_ids: vec![404684003],
            concept_refset_ids: concept_refsets,
            description_refset_ids: vec![],
        }
    }

    fn indexed_service(dir: &tempfile::TempDir) -> SearchService {
        let service = SearchService::open(dir.path(), false).unwrap();
        service
            .index_batch(&[
                make_extended(
                    56265001,
                    1002,
                    "Heart disease",
                    DescriptionType::SYNONYM_ID,
                    true,
                    true,
                    vec![404684003, 138875005],
                    vec![447562003],
                ),
                make_extended(
                    56265001,
                    1001,
                    "Heart disease (disorder)",
                    DescriptionType::FSN_ID,
                    true,
                    true,
                    vec![404684003, 138875005],
                    vec![447562003],
                ),
                make_extended(
                    22298006,
                    2002,
                    "Myocardial infarction",
                    DescriptionType::SYNONYM_ID,
                    true,
                    true,
                    vec![404684003, 138875005],
                    vec![],
                ),
                make_extended(
                    56265001,
                    1003,
                    "Old term",
                    DescriptionType::SYNONYM_ID,
                    true,
                    false,
                    vec![404684003, 138875005],
                    vec![],
                ),
            ])
            .unwrap();
        service.commit().unwrap();
        service
    }

    #[test]
    fn test_prefix_search_finds_description() {
        let dir = tempfile::tempdir().unwrap();
        let service = indexed_service(&dir);

        let hits = service
            .search(&SearchRequest::new("heart dis"))
            .unwrap();
        assert!(hits.contains(&(56265001, 1002)));
    }

    #[test]
    fn test_fsn_is_excluded() {
        let dir = tempfile::tempdir().unwrap();
        let service = indexed_service(&dir);

        let hits = service.search(&SearchRequest::new("heart")).unwrap();
        assert!(hits.iter().all(|&(_, description_id)| description_id != 1001));
    }

    #[test]
    fn test_fuzzy_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let service = indexed_service(&dir);

        let exact = service
            .search(&SearchRequest {
                fuzzy: FuzzyMode::Never,
                ..SearchRequest::new("heart diseese")
            })
            .unwrap();
        assert!(exact.is_empty());

        let fallback = service
            .search(&SearchRequest {
                fuzzy: FuzzyMode::Fallback,
                ..SearchRequest::new("heart diseese")
            })
            .unwrap();
        assert!(fallback.contains(&(56265001, 1002)));
        // Fallback never returns fewer results than the exact run.
        assert!(fallback.len() >= exact.len());
    }

    #[test]
    fn test_refset_filter() {
        let dir = tempfile::tempdir().unwrap();
        let service = indexed_service(&dir);

        let hits = service
            .search(&SearchRequest {
                refsets: vec![447562003],
                ..SearchRequest::new("myocardial")
            })
            .unwrap();
        assert!(hits.is_empty());

        let hits = service
            .search(&SearchRequest {
                refsets: vec![447562003],
                ..SearchRequest::new("heart")
            })
            .unwrap();
        assert!(hits.contains(&(56265001, 1002)));
    }

    #[test]
    fn test_recursive_parent_filter() {
        let dir = tempfile::tempdir().unwrap();
        let service = indexed_service(&dir);

        let hits = service
            .search(&SearchRequest {
                recursive_parents: vec![999999],
                ..SearchRequest::new("heart")
            })
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_inactive_description_filter() {
        let dir = tempfile::tempdir().unwrap();
        let service = indexed_service(&dir);

        let hidden = service.search(&SearchRequest::new("old term")).unwrap();
        assert!(hidden.is_empty());

        let shown = service
            .search(&SearchRequest {
                include_inactive: true,
                ..SearchRequest::new("old term")
            })
            .unwrap();
        assert!(shown.iter().any(|&(concept_id, _)| concept_id == 56265001));
    }

    #[test]
    fn test_search_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let service = indexed_service(&dir);

        let request = SearchRequest::new("heart");
        let first = service.search(&request).unwrap();
        let second = service.search(&request).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_reindex_replaces_document() {
        let dir = tempfile::tempdir().unwrap();
        let service = indexed_service(&dir);

        service
            .index_batch(&[make_extended(
                56265001,
                1002,
                "Cardiac disease",
                DescriptionType::SYNONYM_ID,
                true,
                true,
                vec![404684003, 138875005],
                vec![],
            )])
            .unwrap();
        service.commit().unwrap();

        let old = service.search(&SearchRequest {
            fuzzy: FuzzyMode::Never,
            ..SearchRequest::new("heart")
        });
        assert!(old.unwrap().iter().all(|&(_, d)| d != 1002));
        let new = service.search(&SearchRequest::new("cardiac")).unwrap();
        assert!(new.contains(&(56265001, 1002)));
    }

    #[test]
    fn test_read_only_rejects_indexing() {
        let dir = tempfile::tempdir().unwrap();
        drop(indexed_service(&dir));

        let service = SearchService::open(dir.path(), true).unwrap();
        assert!(matches!(
            service.index_batch(&[]),
            Err(SearchError::ReadOnly)
        ));
        assert!(!service.search(&SearchRequest::new("heart")).unwrap().is_empty());
    }
}
