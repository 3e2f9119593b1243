//! Key schema and fixed-width integer codec.
//!
//! All identifiers are encoded as 8-byte big-endian signed integers so that
//! byte order equals numeric order. SCTIDs are positive, so the sign bit is
//! never set and lexicographic ordering of encoded keys matches numeric
//! ordering of the identifiers.

use sct_types::SctId;

use crate::error::{StoreError, StoreResult};

/// Keyspace discriminator for concept payloads.
pub const CONCEPT: u8 = b'C';
/// Keyspace discriminator for description payloads, keyed by owning concept.
pub const DESCRIPTION: u8 = b'D';
/// Keyspace discriminator for the description → concept reverse index.
pub const DESCRIPTION_REVERSE: u8 = b'd';
/// Keyspace discriminator for relationship payloads, keyed by source.
pub const PARENT_REL: u8 = b'P';
/// Keyspace discriminator for the destination → source reverse index.
pub const CHILD_REL: u8 = b'c';
/// Keyspace discriminator for refset item payloads, keyed by component.
pub const REFSET_ITEM: u8 = b'R';
/// Keyspace discriminator for the refset → member reverse index.
pub const REFSET_MEMBER: u8 = b'M';
/// Keyspace discriminator for the schema record.
pub const SCHEMA: u8 = b'S';

/// Encodes an SCTID as 8 big-endian bytes.
pub fn encode_id(id: SctId) -> [u8; 8] {
    id.to_be_bytes()
}

/// Decodes 8 big-endian bytes back into an SCTID.
///
/// Fails with [`StoreError::MalformedKey`] if fewer than 8 bytes remain.
pub fn decode_id(bytes: &[u8], keyspace: u8) -> StoreResult<SctId> {
    let arr: [u8; 8] = bytes
        .get(..8)
        .and_then(|b| b.try_into().ok())
        .ok_or(StoreError::MalformedKey {
            keyspace: keyspace as char,
        })?;
    Ok(SctId::from_be_bytes(arr))
}

/// Builds a key from a discriminator and id segments.
fn key(discriminator: u8, ids: &[SctId]) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + 8 * ids.len());
    out.push(discriminator);
    for id in ids {
        out.extend_from_slice(&encode_id(*id));
    }
    out
}

/// `C` ‖ conceptId: primary concept lookup.
pub fn concept(id: SctId) -> Vec<u8> {
    key(CONCEPT, &[id])
}

/// Prefix covering every concept.
pub fn concept_prefix() -> Vec<u8> {
    vec![CONCEPT]
}

/// `D` ‖ conceptId ‖ descriptionId: descriptions of a concept.
pub fn description(concept_id: SctId, description_id: SctId) -> Vec<u8> {
    key(DESCRIPTION, &[concept_id, description_id])
}

/// Prefix covering all descriptions of one concept.
pub fn description_prefix(concept_id: SctId) -> Vec<u8> {
    key(DESCRIPTION, &[concept_id])
}

/// `d` ‖ descriptionId: reverse description → concept lookup.
pub fn description_reverse(description_id: SctId) -> Vec<u8> {
    key(DESCRIPTION_REVERSE, &[description_id])
}

/// Prefix covering the whole description reverse index.
pub fn description_reverse_prefix() -> Vec<u8> {
    vec![DESCRIPTION_REVERSE]
}

/// `P` ‖ sourceId ‖ relationshipId: parent relationships of a concept.
pub fn parent_rel(source_id: SctId, relationship_id: SctId) -> Vec<u8> {
    key(PARENT_REL, &[source_id, relationship_id])
}

/// Prefix covering all parent relationships of one concept.
pub fn parent_rel_prefix(source_id: SctId) -> Vec<u8> {
    key(PARENT_REL, &[source_id])
}

/// Prefix covering every forward relationship record.
pub fn parent_rel_all_prefix() -> Vec<u8> {
    vec![PARENT_REL]
}

/// `c` ‖ destinationId ‖ relationshipId: child back-references.
pub fn child_rel(destination_id: SctId, relationship_id: SctId) -> Vec<u8> {
    key(CHILD_REL, &[destination_id, relationship_id])
}

/// Prefix covering all child back-references of one concept.
pub fn child_rel_prefix(destination_id: SctId) -> Vec<u8> {
    key(CHILD_REL, &[destination_id])
}

/// `R` ‖ componentId ‖ refsetId: refsets containing a component.
pub fn refset_item(component_id: SctId, refset_id: SctId) -> Vec<u8> {
    key(REFSET_ITEM, &[component_id, refset_id])
}

/// Prefix covering all refset memberships of one component.
pub fn refset_item_prefix(component_id: SctId) -> Vec<u8> {
    key(REFSET_ITEM, &[component_id])
}

/// `M` ‖ refsetId ‖ memberGuid: members of a refset.
pub fn refset_member(refset_id: SctId, member_guid: &str) -> Vec<u8> {
    let mut out = key(REFSET_MEMBER, &[refset_id]);
    out.extend_from_slice(member_guid.as_bytes());
    out
}

/// Prefix covering all members of one refset.
pub fn refset_member_prefix(refset_id: SctId) -> Vec<u8> {
    key(REFSET_MEMBER, &[refset_id])
}

/// Prefix covering the whole refset member index.
pub fn refset_member_all_prefix() -> Vec<u8> {
    vec![REFSET_MEMBER]
}

/// `S` ‖ `schema`: schema version record.
pub fn schema() -> Vec<u8> {
    let mut out = vec![SCHEMA];
    out.extend_from_slice(b"schema");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_preserves_order() {
        let ids: [SctId; 5] = [1, 100, 138875005, 900000000000207008, i64::MAX];
        for pair in ids.windows(2) {
            assert!(encode_id(pair[0]) < encode_id(pair[1]));
        }
    }

    #[test]
    fn test_id_roundtrip() {
        for id in [0, 1, 56265001, 900000000000508004] {
            assert_eq!(decode_id(&encode_id(id), CONCEPT).unwrap(), id);
        }
    }

    #[test]
    fn test_decode_short_buffer() {
        assert!(decode_id(&[1, 2, 3], CONCEPT).is_err());
    }

    #[test]
    fn test_description_keys_share_concept_prefix() {
        let k1 = description(56265001, 1);
        let k2 = description(56265001, 2);
        let prefix = description_prefix(56265001);
        assert!(k1.starts_with(&prefix));
        assert!(k2.starts_with(&prefix));
        assert!(k1 < k2);
    }

    #[test]
    fn test_keyspaces_disjoint() {
        // 'C' < 'D' < 'M' < 'P' < 'R' < 'S' < 'c' < 'd' in byte order; a
        // prefix scan in one keyspace must never leak into another.
        let concept_key = concept(SctId::MAX);
        let description_key = description(0, 0);
        assert!(concept_key < description_key);
        assert!(!description_key.starts_with(&concept_prefix()));
    }
}
