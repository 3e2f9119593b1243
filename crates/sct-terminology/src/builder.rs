//! Extended-description builder and index precomputation.

use sct_types::{well_known, Concept, ExtendedDescription};
use tracing::info;

use crate::error::TerminologyResult;
use crate::svc::TerminologySvc;

const INDEX_BATCH_SIZE: usize = 10_000;
const BUILD_CHUNK_SIZE: usize = 1_024;

impl TerminologySvc {
    /// Builds the extended descriptions of one concept.
    ///
    /// The per-concept parts (preferred description, recursive and direct
    /// parents, concept refsets) are computed once and shared by every
    /// emitted record; only the description and its refsets vary.
    pub fn extended_descriptions_for(
        &self,
        concept: &Concept,
    ) -> TerminologyResult<Vec<ExtendedDescription>> {
        let tags = [self.default_language.clone()];

        let descriptions = self.get_descriptions(concept.id)?;
        let preferred =
            self.language_match(&descriptions, sct_types::DescriptionType::Synonym, &tags)?;
        let recursive_parent_ids = self.get_all_parent_ids(concept.id)?;
        let direct_parent_ids = self.get_parent_ids_of_kind(concept.id, &[well_known::IS_A])?;
        let concept_refset_ids = self.get_reference_sets(concept.id)?;

        let template = ExtendedDescription {
            concept: Some(concept.clone()),
            description: None,
            preferred_description: preferred,
            recursive_parent_ids,
            direct_parent_ids,
            concept_refset_ids,
            description_refset_ids: Vec::new(),
        };

        let mut result = Vec::with_capacity(descriptions.len());
        for description in descriptions {
            let mut extended = template.clone();
            extended.description_refset_ids = self.get_reference_sets(description.id)?;
            extended.description = Some(description);
            result.push(extended);
        }
        Ok(result)
    }

    /// Rebuilds the search index from the entity store.
    ///
    /// Walks every concept, builds its extended descriptions on a
    /// CPU-count-sized worker pool and submits them to the index in batches.
    /// Returns the number of documents indexed.
    pub fn build_index(&self) -> TerminologyResult<usize> {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("sct-index-{i}"))
            .build()
            .expect("unable to build index worker pool");

        let mut pending: Vec<ExtendedDescription> = Vec::with_capacity(INDEX_BATCH_SIZE);
        let mut chunk: Vec<Concept> = Vec::with_capacity(BUILD_CHUNK_SIZE);
        let mut indexed = 0;

        // The concept iterator only carries store errors, so a build failure
        // is stashed here and a marker error stops the walk.
        let mut failure: Option<crate::TerminologyError> = None;
        let walked = self.store.iterate_concepts(|concept| {
            chunk.push(concept);
            if chunk.len() >= BUILD_CHUNK_SIZE {
                let concepts = std::mem::take(&mut chunk);
                match self.build_chunk(&pool, concepts, &mut pending) {
                    Ok(count) => indexed += count,
                    Err(e) => {
                        failure = Some(e);
                        return Err(sct_store::StoreError::Io(std::io::Error::other(
                            "index build aborted",
                        )));
                    }
                }
            }
            Ok(())
        });
        if let Some(e) = failure {
            return Err(e);
        }
        walked?;

        if !chunk.is_empty() {
            indexed += self.build_chunk(&pool, chunk, &mut pending)?;
        }
        if !pending.is_empty() {
            self.search.index_batch(&pending)?;
        }
        self.search.commit()?;

        info!(documents = indexed, "search index built");
        Ok(indexed)
    }

    /// Builds one chunk of concepts in parallel and flushes full batches to
    /// the index. Returns the number of documents handed over.
    fn build_chunk(
        &self,
        pool: &rayon::ThreadPool,
        concepts: Vec<Concept>,
        pending: &mut Vec<ExtendedDescription>,
    ) -> TerminologyResult<usize> {
        use rayon::prelude::*;

        let built: Vec<TerminologyResult<Vec<ExtendedDescription>>> = pool.install(|| {
            concepts
                .par_iter()
                .map(|concept| self.extended_descriptions_for(concept))
                .collect()
        });

        let mut count = 0;
        for result in built {
            let extended = result?;
            count += extended.len();
            pending.extend(extended);
            if pending.len() >= INDEX_BATCH_SIZE {
                self.search.index_batch(pending)?;
                pending.clear();
            }
        }
        Ok(count)
    }

    /// The total count of descriptions indexed so far is not persisted;
    /// precompute is idempotent and simply rebuilds.
    pub fn precompute(&self) -> TerminologyResult<usize> {
        self.build_index()
    }
}
