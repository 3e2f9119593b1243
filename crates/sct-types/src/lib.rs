//! # sct-types
//!
//! Type definitions for SNOMED CT clinical terminology.
//!
//! This crate provides the entity model persisted by the terminology engine:
//! concepts, descriptions, relationships and reference set items, plus the
//! derived [`ExtendedDescription`] view used by the search index.
//!
//! Entity payloads carry prost field tags so that the on-disk encoding is
//! plain protobuf wire format, forward- and backward-compatible across
//! release versions. The same types derive serde for the JSON HTTP surface.
//!
//! ## Usage
//!
//! ```rust
//! use sct_types::{Concept, DefinitionStatus, SctId, well_known};
//!
//! let concept = Concept {
//!     id: 73211009,
//!     effective_time: 20020131,
//!     active: true,
//!     module_id: well_known::SNOMED_CT_CORE_MODULE,
//!     definition_status_id: DefinitionStatus::PRIMITIVE_ID,
//! };
//!
//! assert_eq!(
//!     DefinitionStatus::from_id(concept.definition_status_id),
//!     Some(DefinitionStatus::Primitive)
//! );
//!
//! let is_a_type: SctId = well_known::IS_A;
//! assert_eq!(is_a_type, 116680003);
//! ```

#![warn(missing_docs)]

mod component;
mod concept;
mod description;
mod enums;
mod extended;
pub mod refset;
mod relationship;
mod sctid;
pub mod well_known;

pub use component::Component;
pub use concept::Concept;
pub use description::Description;
pub use enums::{
    Acceptability, CaseSignificance, CharacteristicType, DefinitionStatus, DescriptionType,
    ModifierType,
};
pub use extended::ExtendedDescription;
pub use refset::{RefsetBody, RefsetItem};
pub use relationship::Relationship;
pub use sctid::SctId;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_accessible() {
        assert_eq!(well_known::IS_A, 116680003);
        assert_eq!(well_known::SNOMED_CT_ROOT, 138875005);
        assert_eq!(well_known::CLINICAL_FINDING, 404684003);
    }

    #[test]
    fn test_serde_roundtrip() {
        let concept = Concept {
            id: 404684003,
            effective_time: 20020131,
            active: true,
            module_id: 900000000000207008,
            definition_status_id: 900000000000074008,
        };

        let json = serde_json::to_string(&concept).unwrap();
        let parsed: Concept = serde_json::from_str(&json).unwrap();
        assert_eq!(concept, parsed);
    }
}
