//! SNOMED CT Concept type.
//!
//! This module provides the `Concept` struct representing a concept
//! from an RF2 Concept file.

use serde::{Deserialize, Serialize};

use crate::SctId;

/// A SNOMED CT concept from the RF2 Concept file.
///
/// Represents a row from `sct2_Concept_*.txt` files in an RF2 release.
/// The prost field tags define the on-disk payload encoding. The
/// `definition_status_id` coded value is validated against
/// [`DefinitionStatus`](crate::DefinitionStatus) at import time.
///
/// # Examples
///
/// ```
/// use sct_types::{Concept, DefinitionStatus};
///
/// let concept = Concept {
///     id: 73211009,
///     effective_time: 20020131,
///     active: true,
///     module_id: 900000000000207008,
///     definition_status_id: DefinitionStatus::PRIMITIVE_ID,
/// };
///
/// assert_eq!(
///     DefinitionStatus::from_id(concept.definition_status_id),
///     Some(DefinitionStatus::Primitive)
/// );
/// ```
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Concept {
    /// Unique identifier for this concept (SCTID).
    #[prost(int64, tag = "1")]
    pub id: SctId,
    /// Effective date in YYYYMMDD format (stored as u32 for efficiency).
    #[prost(uint32, tag = "2")]
    pub effective_time: u32,
    /// Whether this concept is active (true) or inactive (false).
    #[prost(bool, tag = "3")]
    pub active: bool,
    /// The module containing this concept.
    #[prost(int64, tag = "4")]
    pub module_id: SctId,
    /// Whether this concept is primitive or fully defined.
    #[prost(int64, tag = "5")]
    pub definition_status_id: SctId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DefinitionStatus;
    use prost::Message;

    #[test]
    fn test_payload_roundtrip() {
        let concept = Concept {
            id: 73211009,
            effective_time: 20020131,
            active: true,
            module_id: 900000000000207008,
            definition_status_id: DefinitionStatus::FULLY_DEFINED_ID,
        };

        let bytes = concept.encode_to_vec();
        let decoded = Concept::decode(bytes.as_slice()).unwrap();
        assert_eq!(concept, decoded);
    }
}
