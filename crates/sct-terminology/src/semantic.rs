//! Traversal and inference over the entity layer.

use std::collections::HashSet;

use sct_types::{well_known, Concept, Description, RefsetItem, Relationship, SctId};

use crate::error::{TerminologyError, TerminologyResult};
use crate::svc::TerminologySvc;

/// Outcome of a subsumption test, following the FHIR terminology-service
/// definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subsumption {
    /// The two codes are the same concept.
    Equivalent,
    /// Code A subsumes code B (B is-a A).
    Subsumes,
    /// Code A is subsumed by code B (A is-a B).
    SubsumedBy,
    /// Neither code subsumes the other.
    NotSubsumed,
}

/// Outcome of translating a concept through a reference set.
#[derive(Debug, Clone, PartialEq)]
pub enum TranslateOutcome {
    /// The concept (or a generalisation of it) is itself a member.
    Concept(Concept),
    /// The concept maps through the refset item (e.g. a map to ICD-10).
    RefsetItem(RefsetItem),
}

impl TerminologySvc {
    /// Fetches a concept, or `None`.
    pub fn get_concept(&self, id: SctId) -> TerminologyResult<Option<Concept>> {
        Ok(self.store.get_concept(id)?)
    }

    /// Fetches a concept that a caller named explicitly; absence is an
    /// error surfaced as NotFound.
    pub fn require_concept(&self, id: SctId) -> TerminologyResult<Concept> {
        self.get_concept(id)?
            .ok_or(TerminologyError::ConceptNotFound { id })
    }

    /// Fetches several concepts; all of them must exist.
    pub fn get_concepts(&self, ids: &[SctId]) -> TerminologyResult<Vec<Concept>> {
        Ok(self.store.get_concepts(ids)?)
    }

    /// Fetches a description by its own identifier.
    pub fn get_description(&self, id: SctId) -> TerminologyResult<Option<Description>> {
        Ok(self.store.get_description(id)?)
    }

    /// Fetches all descriptions of a concept.
    pub fn get_descriptions(&self, concept_id: SctId) -> TerminologyResult<Vec<Description>> {
        Ok(self.store.get_descriptions(concept_id)?)
    }

    /// Relationships in which the concept is the source.
    pub fn get_parent_relationships(
        &self,
        concept_id: SctId,
    ) -> TerminologyResult<Vec<Relationship>> {
        Ok(self.store.get_parent_relationships(concept_id)?)
    }

    /// Relationships in which the concept is the destination.
    pub fn get_child_relationships(
        &self,
        concept_id: SctId,
    ) -> TerminologyResult<Vec<Relationship>> {
        Ok(self.store.get_child_relationships(concept_id)?)
    }

    /// Direct IS-A parents of the concept.
    pub fn get_parent_ids(&self, concept_id: SctId) -> TerminologyResult<Vec<SctId>> {
        self.get_parent_ids_of_kind(concept_id, &[well_known::IS_A])
    }

    /// Destinations of the concept's active relationships of the given
    /// kinds. SNOMED CT releases contain duplicate relationships, so the
    /// result is deduplicated (and sorted for determinism).
    pub fn get_parent_ids_of_kind(
        &self,
        concept_id: SctId,
        kinds: &[SctId],
    ) -> TerminologyResult<Vec<SctId>> {
        let relationships = self.get_parent_relationships(concept_id)?;
        let mut ids: Vec<SctId> = relationships
            .iter()
            .filter(|r| r.active && kinds.contains(&r.type_id))
            .map(|r| r.destination_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    /// Direct IS-A children of the concept.
    pub fn get_child_ids(&self, concept_id: SctId) -> TerminologyResult<Vec<SctId>> {
        self.get_children_of_kind(concept_id, well_known::IS_A)
    }

    /// Sources of the concept's active incoming relationships of the given
    /// kind, deduplicated.
    pub fn get_children_of_kind(
        &self,
        concept_id: SctId,
        kind: SctId,
    ) -> TerminologyResult<Vec<SctId>> {
        let relationships = self.get_child_relationships(concept_id)?;
        let mut ids: Vec<SctId> = relationships
            .iter()
            .filter(|r| r.active && r.type_id == kind)
            .map(|r| r.source_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    /// All transitive IS-A ancestors of the concept.
    ///
    /// Iterative DFS with a visited set; the ontology is a DAG, so the set
    /// bounds the walk and suppresses duplicates.
    pub fn get_all_parent_ids(&self, concept_id: SctId) -> TerminologyResult<Vec<SctId>> {
        let mut visited: HashSet<SctId> = HashSet::new();
        let mut stack = self.get_parent_ids(concept_id)?;

        while let Some(current) = stack.pop() {
            if visited.insert(current) {
                stack.extend(self.get_parent_ids(current)?);
            }
        }

        let mut ids: Vec<SctId> = visited.into_iter().collect();
        ids.sort_unstable();
        Ok(ids)
    }

    /// All transitive ancestors, resolved to concepts.
    pub fn get_all_parents(&self, concept_id: SctId) -> TerminologyResult<Vec<Concept>> {
        let ids = self.get_all_parent_ids(concept_id)?;
        self.get_concepts(&ids)
    }

    /// All transitive IS-A descendants of the concept. Use with caution
    /// near the top of the hierarchy.
    pub fn get_all_children_ids(&self, concept_id: SctId) -> TerminologyResult<Vec<SctId>> {
        let mut visited: HashSet<SctId> = HashSet::new();
        let mut stack = self.get_child_ids(concept_id)?;

        while let Some(current) = stack.pop() {
            if visited.insert(current) {
                stack.extend(self.get_child_ids(current)?);
            }
        }

        let mut ids: Vec<SctId> = visited.into_iter().collect();
        ids.sort_unstable();
        Ok(ids)
    }

    /// Tests whether the concept is a type of `ancestor_id`, directly or
    /// transitively. Reflexive: every concept is-a itself.
    pub fn is_a(&self, concept_id: SctId, ancestor_id: SctId) -> TerminologyResult<bool> {
        if concept_id == ancestor_id {
            return Ok(true);
        }
        let mut visited: HashSet<SctId> = HashSet::new();
        let mut stack = self.get_parent_ids(concept_id)?;
        while let Some(current) = stack.pop() {
            if current == ancestor_id {
                return Ok(true);
            }
            if visited.insert(current) {
                stack.extend(self.get_parent_ids(current)?);
            }
        }
        Ok(false)
    }

    /// Siblings: concepts sharing at least one direct parent, excluding the
    /// concept itself.
    pub fn get_sibling_ids(&self, concept_id: SctId) -> TerminologyResult<Vec<SctId>> {
        let mut siblings: Vec<SctId> = Vec::new();
        for parent in self.get_parent_ids(concept_id)? {
            for child in self.get_child_ids(parent)? {
                if child != concept_id {
                    siblings.push(child);
                }
            }
        }
        siblings.sort_unstable();
        siblings.dedup();
        Ok(siblings)
    }

    /// Every distinct path from the concept up to a top-level concept.
    ///
    /// The concept is the first entry of each path and a parentless concept
    /// (the SNOMED CT root, in a well-formed release) the last.
    pub fn paths_to_root(&self, concept_id: SctId) -> TerminologyResult<Vec<Vec<SctId>>> {
        let parents = self.get_parent_ids(concept_id)?;
        let mut results = Vec::with_capacity(parents.len().max(1));
        if parents.is_empty() {
            results.push(vec![concept_id]);
        }
        for parent in parents {
            for parent_path in self.paths_to_root(parent)? {
                let mut path = Vec::with_capacity(parent_path.len() + 1);
                path.push(concept_id);
                path.extend(parent_path);
                results.push(path);
            }
        }
        Ok(results)
    }

    /// The longest of the concept's root paths.
    pub fn longest_path_to_root(&self, concept_id: SctId) -> TerminologyResult<Vec<SctId>> {
        let paths = self.paths_to_root(concept_id)?;
        Ok(paths
            .into_iter()
            .max_by_key(|path| path.len())
            .unwrap_or_default())
    }

    /// The shortest of the concept's root paths.
    pub fn shortest_path_to_root(&self, concept_id: SctId) -> TerminologyResult<Vec<SctId>> {
        let paths = self.paths_to_root(concept_id)?;
        Ok(paths
            .into_iter()
            .min_by_key(|path| path.len())
            .unwrap_or_default())
    }

    /// Maps the concept to its best match within `generics`.
    ///
    /// The best match is the closest one: the smallest distance from the
    /// concept along any root path, ties broken in favour of the match
    /// sitting on the longest path (the most specific lineage).
    pub fn genericise_to(
        &self,
        concept_id: SctId,
        generics: &HashSet<SctId>,
    ) -> TerminologyResult<Option<SctId>> {
        if generics.contains(&concept_id) {
            return Ok(Some(concept_id));
        }
        let paths = self.paths_to_root(concept_id)?;

        let mut best: Option<(usize, usize, SctId)> = None; // (pos, path_len, id)
        for path in &paths {
            for (pos, id) in path.iter().enumerate() {
                if !generics.contains(id) {
                    continue;
                }
                let better = match best {
                    None => true,
                    Some((best_pos, best_len, _)) => {
                        pos < best_pos || (pos == best_pos && path.len() > best_len)
                    }
                };
                if better {
                    best = Some((pos, path.len(), *id));
                }
            }
        }
        Ok(best.map(|(_, _, id)| id))
    }

    /// Walks the hierarchy to the most general concept beneath `root_id`:
    /// the entry one step down from the root on the shortest path that
    /// passes through it.
    pub fn genericise_to_root(
        &self,
        concept_id: SctId,
        root_id: SctId,
    ) -> TerminologyResult<SctId> {
        let paths = self.paths_to_root(concept_id)?;

        let mut best: Option<(usize, SctId)> = None; // (pos, id one step down)
        for path in &paths {
            for (pos, id) in path.iter().enumerate() {
                if *id == root_id && pos > 0 {
                    let better = match best {
                        None => true,
                        Some((best_pos, _)) => pos < best_pos,
                    };
                    if better {
                        best = Some((pos, path[pos - 1]));
                    }
                }
            }
        }
        best.map(|(_, id)| id)
            .ok_or(TerminologyError::RootNotOnPath {
                concept_id,
                root_id,
            })
    }

    /// Refset identifiers of which the component is a member.
    pub fn get_reference_sets(&self, component_id: SctId) -> TerminologyResult<Vec<SctId>> {
        Ok(self.store.get_reference_sets(component_id)?)
    }

    /// Component identifiers that are members of the refset.
    pub fn get_reference_set_items(
        &self,
        refset_id: SctId,
    ) -> TerminologyResult<HashSet<SctId>> {
        Ok(self.store.get_reference_set_items(refset_id)?)
    }

    /// The refset item for a component within a refset, if any.
    pub fn get_from_reference_set(
        &self,
        refset_id: SctId,
        component_id: SctId,
    ) -> TerminologyResult<Option<RefsetItem>> {
        Ok(self.store.get_from_reference_set(refset_id, component_id)?)
    }

    /// Every installed reference set.
    pub fn get_all_reference_sets(&self) -> TerminologyResult<Vec<SctId>> {
        Ok(self.store.get_all_reference_sets()?)
    }

    /// Determines whether `code_a` subsumes `code_b` per the HL7 FHIR
    /// terminology service definition.
    pub fn subsumes(&self, code_a: SctId, code_b: SctId) -> TerminologyResult<Subsumption> {
        if code_a == code_b {
            return Ok(Subsumption::Equivalent);
        }
        self.require_concept(code_b)?;
        if self.is_a(code_b, code_a)? {
            return Ok(Subsumption::Subsumes);
        }
        self.require_concept(code_a)?;
        if self.is_a(code_a, code_b)? {
            return Ok(Subsumption::SubsumedBy);
        }
        Ok(Subsumption::NotSubsumed)
    }

    /// Maps a concept through a reference set: directly when the concept is
    /// a member (returning the map item for map refsets), otherwise by
    /// generalising the concept to the nearest member.
    pub fn translate(
        &self,
        concept_id: SctId,
        target_refset_id: SctId,
    ) -> TerminologyResult<TranslateOutcome> {
        if let Some(item) = self.get_from_reference_set(target_refset_id, concept_id)? {
            // A plain membership refset carries no mapping payload, so the
            // concept itself is the answer.
            if item.simple().is_some() {
                return Ok(TranslateOutcome::Concept(self.require_concept(concept_id)?));
            }
            return Ok(TranslateOutcome::RefsetItem(item));
        }

        let concept = self.require_concept(concept_id)?;
        let members = self.get_reference_set_items(target_refset_id)?;
        match self.genericise_to(concept.id, &members)? {
            Some(generic_id) => Ok(TranslateOutcome::Concept(self.require_concept(generic_id)?)),
            None => Err(TerminologyError::NoTranslation {
                concept_id,
                refset_id: target_refset_id,
            }),
        }
    }
}
