//! Typed entity accessors over the KV store.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::Path;

use prost::Message;
use sct_types::{Concept, Description, RefsetItem, Relationship, SctId};
use sled::Batch;

use crate::descriptor::{Descriptor, CURRENT_VERSION};
use crate::error::{StoreError, StoreResult};
use crate::keys;
use crate::kv::KvStore;

/// Counts of stored entities plus the names of every installed refset.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    /// Number of stored concepts.
    pub concepts: usize,
    /// Number of stored descriptions.
    pub descriptions: usize,
    /// Number of stored relationships.
    pub relationships: usize,
    /// Number of stored reference set items.
    pub refset_items: usize,
    /// Human-readable names of every installed reference set.
    pub refsets: Vec<String>,
}

impl std::fmt::Display for Statistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Number of concepts: {}", self.concepts)?;
        writeln!(f, "Number of descriptions: {}", self.descriptions)?;
        writeln!(f, "Number of relationships: {}", self.relationships)?;
        writeln!(f, "Number of reference set items: {}", self.refset_items)?;
        writeln!(f, "Number of installed refsets: {}:", self.refsets.len())?;
        for refset in &self.refsets {
            writeln!(f, "  Installed refset: {refset}")?;
        }
        Ok(())
    }
}

/// Typed SNOMED CT persistence over the ordered KV store.
///
/// Each component kind has a batch writer that maintains the forward record
/// and its reverse index together, so the two mappings can never drift.
/// Getters return `Ok(None)` for absent entities; only broken states
/// (undecodable payloads, dangling reverse entries) are errors.
#[derive(Debug, Clone)]
pub struct EntityStore {
    kv: KvStore,
}

impl EntityStore {
    /// Opens the store inside `path`, verifying the descriptor version.
    pub fn open<P: AsRef<Path>>(path: P, read_only: bool) -> StoreResult<Self> {
        std::fs::create_dir_all(path.as_ref())?;
        let descriptor = Descriptor::create_or_open(path.as_ref())?;
        descriptor.check_version()?;

        let kv = KvStore::open(path.as_ref(), read_only)?;
        let store = Self { kv };
        if !read_only {
            store.write_schema_record()?;
        }
        Ok(store)
    }

    /// Returns the underlying KV store.
    pub fn kv(&self) -> &KvStore {
        &self.kv
    }

    /// Returns true if the store was opened read-only.
    pub fn is_read_only(&self) -> bool {
        self.kv.is_read_only()
    }

    fn write_schema_record(&self) -> StoreResult<()> {
        let mut batch = Batch::default();
        batch.insert(keys::schema(), CURRENT_VERSION.to_be_bytes().to_vec());
        self.kv.apply_batch(batch)
    }

    fn decode<M: Message + Default>(key: &[u8], value: &[u8]) -> StoreResult<M> {
        M::decode(value).map_err(|source| {
            let mut hex = String::with_capacity(key.len() * 2);
            for byte in key {
                let _ = write!(hex, "{byte:02x}");
            }
            StoreError::CorruptPayload { key: hex, source }
        })
    }

    // ── Writes ──────────────────────────────────────────────────────────

    /// Persists a batch of concepts under `C` ‖ id.
    pub fn put_concepts(&self, concepts: &[Concept]) -> StoreResult<()> {
        let mut batch = Batch::default();
        for concept in concepts {
            batch.insert(keys::concept(concept.id), concept.encode_to_vec());
        }
        self.kv.apply_batch(batch)
    }

    /// Persists a batch of descriptions with their reverse index entries.
    pub fn put_descriptions(&self, descriptions: &[Description]) -> StoreResult<()> {
        let mut batch = Batch::default();
        for description in descriptions {
            batch.insert(
                keys::description(description.concept_id, description.id),
                description.encode_to_vec(),
            );
            batch.insert(
                keys::description_reverse(description.id),
                keys::encode_id(description.concept_id).to_vec(),
            );
        }
        self.kv.apply_batch(batch)
    }

    /// Persists a batch of relationships: the full payload under the source
    /// and a pointer-only back-reference under the destination.
    pub fn put_relationships(&self, relationships: &[Relationship]) -> StoreResult<()> {
        let mut batch = Batch::default();
        for relationship in relationships {
            batch.insert(
                keys::parent_rel(relationship.source_id, relationship.id),
                relationship.encode_to_vec(),
            );
            batch.insert(
                keys::child_rel(relationship.destination_id, relationship.id),
                keys::encode_id(relationship.source_id).to_vec(),
            );
        }
        self.kv.apply_batch(batch)
    }

    /// Persists a batch of refset items: forward under the referenced
    /// component, reverse membership under the refset.
    pub fn put_refset_items(&self, items: &[RefsetItem]) -> StoreResult<()> {
        let mut batch = Batch::default();
        for item in items {
            batch.insert(
                keys::refset_item(item.referenced_component_id, item.refset_id),
                item.encode_to_vec(),
            );
            batch.insert(
                keys::refset_member(item.refset_id, &item.id),
                keys::encode_id(item.referenced_component_id).to_vec(),
            );
        }
        self.kv.apply_batch(batch)
    }

    // ── Reads ───────────────────────────────────────────────────────────

    /// Fetches a concept by identifier.
    pub fn get_concept(&self, id: SctId) -> StoreResult<Option<Concept>> {
        let key = keys::concept(id);
        match self.kv.get(&key)? {
            Some(value) => Ok(Some(Self::decode(&key, &value)?)),
            None => Ok(None),
        }
    }

    /// Fetches several concepts; any missing identifier is an integrity
    /// break (used when resolving ids that other records reference).
    pub fn get_concepts(&self, ids: &[SctId]) -> StoreResult<Vec<Concept>> {
        let mut result = Vec::with_capacity(ids.len());
        for &id in ids {
            let concept = self
                .get_concept(id)?
                .ok_or(StoreError::MissingConcept { id })?;
            result.push(concept);
        }
        Ok(result)
    }

    /// Fetches a description by identifier through the reverse index.
    pub fn get_description(&self, description_id: SctId) -> StoreResult<Option<Description>> {
        let reverse = match self.kv.get(&keys::description_reverse(description_id))? {
            Some(value) => value,
            None => return Ok(None),
        };
        let concept_id = keys::decode_id(&reverse, keys::DESCRIPTION_REVERSE)?;

        let key = keys::description(concept_id, description_id);
        match self.kv.get(&key)? {
            Some(value) => Ok(Some(Self::decode(&key, &value)?)),
            None => Err(StoreError::DanglingIndex {
                kind: "description",
                id: description_id,
            }),
        }
    }

    /// Fetches all descriptions of a concept via a prefix scan.
    pub fn get_descriptions(&self, concept_id: SctId) -> StoreResult<Vec<Description>> {
        let prefix = keys::description_prefix(concept_id);
        let mut result = Vec::new();
        for entry in self.kv.scan_prefix(&prefix) {
            let (key, value) = entry?;
            result.push(Self::decode(&key, &value)?);
        }
        Ok(result)
    }

    /// Fetches the relationships in which `source_id` is the source.
    pub fn get_parent_relationships(&self, source_id: SctId) -> StoreResult<Vec<Relationship>> {
        let prefix = keys::parent_rel_prefix(source_id);
        let mut result = Vec::new();
        for entry in self.kv.scan_prefix(&prefix) {
            let (key, value) = entry?;
            result.push(Self::decode(&key, &value)?);
        }
        Ok(result)
    }

    /// Fetches the relationships in which `destination_id` is the
    /// destination, resolving each back-reference to its full payload
    /// through the forward key.
    pub fn get_child_relationships(&self, destination_id: SctId) -> StoreResult<Vec<Relationship>> {
        let prefix = keys::child_rel_prefix(destination_id);
        let mut result = Vec::new();
        for entry in self.kv.scan_prefix(&prefix) {
            let (key, value) = entry?;
            let relationship_id = keys::decode_id(&key[prefix.len()..], keys::CHILD_REL)?;
            let source_id = keys::decode_id(&value, keys::CHILD_REL)?;

            let forward = keys::parent_rel(source_id, relationship_id);
            match self.kv.get(&forward)? {
                Some(payload) => result.push(Self::decode(&forward, &payload)?),
                None => {
                    return Err(StoreError::DanglingIndex {
                        kind: "relationship",
                        id: relationship_id,
                    })
                }
            }
        }
        Ok(result)
    }

    /// Returns the refset identifiers of which `component_id` is a member.
    pub fn get_reference_sets(&self, component_id: SctId) -> StoreResult<Vec<SctId>> {
        let prefix = keys::refset_item_prefix(component_id);
        let mut result = Vec::new();
        for entry in self.kv.scan_prefix(&prefix) {
            let (key, _) = entry?;
            result.push(keys::decode_id(&key[prefix.len()..], keys::REFSET_ITEM)?);
        }
        Ok(result)
    }

    /// Returns the component identifiers that are members of `refset_id`.
    pub fn get_reference_set_items(&self, refset_id: SctId) -> StoreResult<HashSet<SctId>> {
        let prefix = keys::refset_member_prefix(refset_id);
        let mut result = HashSet::new();
        for entry in self.kv.scan_prefix(&prefix) {
            let (_, value) = entry?;
            result.insert(keys::decode_id(&value, keys::REFSET_MEMBER)?);
        }
        Ok(result)
    }

    /// Fetches the refset item for `component_id` within `refset_id`.
    pub fn get_from_reference_set(
        &self,
        refset_id: SctId,
        component_id: SctId,
    ) -> StoreResult<Option<RefsetItem>> {
        let key = keys::refset_item(component_id, refset_id);
        match self.kv.get(&key)? {
            Some(value) => Ok(Some(Self::decode(&key, &value)?)),
            None => Ok(None),
        }
    }

    /// Lists every installed reference set.
    pub fn get_all_reference_sets(&self) -> StoreResult<Vec<SctId>> {
        let prefix = keys::refset_member_all_prefix();
        let mut result = Vec::new();
        let mut previous: Option<SctId> = None;
        for entry in self.kv.scan_prefix(&prefix) {
            let (key, _) = entry?;
            let refset_id = keys::decode_id(&key[prefix.len()..], keys::REFSET_MEMBER)?;
            if previous != Some(refset_id) {
                result.push(refset_id);
                previous = Some(refset_id);
            }
        }
        Ok(result)
    }

    /// Iterates every stored concept in id order, stopping at the first
    /// callback error.
    pub fn iterate_concepts<F>(&self, mut f: F) -> StoreResult<()>
    where
        F: FnMut(Concept) -> StoreResult<()>,
    {
        for entry in self.kv.scan_prefix(&keys::concept_prefix()) {
            let (key, value) = entry?;
            f(Self::decode(&key, &value)?)?;
        }
        Ok(())
    }

    /// Computes store-wide statistics. Walks every keyspace, so this is a
    /// full scan.
    pub fn statistics(&self) -> StoreResult<Statistics> {
        let mut stats = Statistics {
            concepts: self.kv.count_prefix(&keys::concept_prefix())?,
            descriptions: self.kv.count_prefix(&keys::description_reverse_prefix())?,
            relationships: self.kv.count_prefix(&keys::parent_rel_all_prefix())?,
            refset_items: self.kv.count_prefix(&keys::refset_member_all_prefix())?,
            refsets: Vec::new(),
        };

        for refset_id in self.get_all_reference_sets()? {
            // A refset is named by the concept whose id equals the refset id.
            let name = match self.get_descriptions(refset_id)?.first() {
                Some(description) => format!("{} ({})", description.term, refset_id),
                None => format!("({refset_id})"),
            };
            stats.refsets.push(name);
        }
        Ok(stats)
    }

    /// Flushes buffered writes and asks the backend to reclaim space.
    pub fn compact(&self) -> StoreResult<()> {
        self.kv.compact()
    }

    /// Flushes and releases the store.
    pub fn close(&self) -> StoreResult<()> {
        self.kv.close()
    }
}
