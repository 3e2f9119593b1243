//! Extended description: the denormalised search/export document.

use serde::{Deserialize, Serialize};

use crate::{Concept, Description, SctId};

/// A denormalised join of a description with its concept, the concept's
/// preferred term, transitive and direct parents, and refset memberships.
///
/// One extended description is produced per description during precompute;
/// it is the unit indexed for search and the frame streamed by `export`.
/// Identity is the `(concept.id, description.id)` pair; the recursive-parent
/// set is never persisted separately but flows straight into the document.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedDescription {
    /// The concept the description belongs to.
    #[prost(message, optional, tag = "1")]
    pub concept: Option<Concept>,
    /// The description itself.
    #[prost(message, optional, tag = "2")]
    pub description: Option<Description>,
    /// The concept's preferred synonym for the build locale.
    #[prost(message, optional, tag = "3")]
    pub preferred_description: Option<Description>,
    /// All transitive IS-A ancestors of the concept.
    #[prost(int64, repeated, tag = "4")]
    pub recursive_parent_ids: Vec<SctId>,
    /// Direct IS-A parents of the concept.
    #[prost(int64, repeated, tag = "5")]
    pub direct_parent_ids: Vec<SctId>,
    /// Reference sets containing the concept.
    #[prost(int64, repeated, tag = "6")]
    pub concept_refset_ids: Vec<SctId>,
    /// Reference sets containing the description.
    #[prost(int64, repeated, tag = "7")]
    pub description_refset_ids: Vec<SctId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_payload_roundtrip() {
        let ed = ExtendedDescription {
            concept: Some(Concept {
                id: 56265001,
                effective_time: 20020131,
                active: true,
                module_id: 900000000000207008,
                definition_status_id: 900000000000074008,
            }),
            description: Some(Description {
                id: 93771000,
                effective_time: 20020131,
                active: true,
                module_id: 900000000000207008,
                concept_id: 56265001,
                language_code: "en".to_string(),
                type_id: 900000000000013009,
                term: "Heart disease".to_string(),
                case_significance_id: 900000000000448009,
            }),
            preferred_description: None,
            recursive_parent_ids: vec![404684003, 138875005],
            direct_parent_ids: vec![404684003],
            concept_refset_ids: vec![],
            description_refset_ids: vec![],
        };

        let bytes = ed.encode_to_vec();
        let decoded = ExtendedDescription::decode(bytes.as_slice()).unwrap();
        assert_eq!(ed, decoded);
    }
}
