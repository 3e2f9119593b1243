//! SNOMED CT Description type.
//!
//! This module provides the `Description` struct representing a description
//! from an RF2 Description file.

use serde::{Deserialize, Serialize};

use crate::{DescriptionType, SctId};

/// A SNOMED CT description from the RF2 Description file.
///
/// Represents a row from `sct2_Description_*.txt` files in an RF2 release.
/// The prost field tags define the on-disk payload encoding. The `type_id`
/// and `case_significance_id` coded values are validated at import time.
///
/// # Examples
///
/// ```
/// use sct_types::{Description, DescriptionType};
///
/// let description = Description {
///     id: 754786011,
///     effective_time: 20020131,
///     active: true,
///     module_id: 900000000000207008,
///     concept_id: 73211009,
///     language_code: "en".to_string(),
///     type_id: DescriptionType::FSN_ID,
///     term: "Diabetes mellitus (disorder)".to_string(),
///     case_significance_id: 900000000000448009,
/// };
///
/// assert!(description.is_fsn());
/// ```
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Description {
    /// Unique identifier for this description (SCTID).
    #[prost(int64, tag = "1")]
    pub id: SctId,
    /// Effective date in YYYYMMDD format.
    #[prost(uint32, tag = "2")]
    pub effective_time: u32,
    /// Whether this description is active.
    #[prost(bool, tag = "3")]
    pub active: bool,
    /// The module containing this description.
    #[prost(int64, tag = "4")]
    pub module_id: SctId,
    /// The concept this description belongs to.
    #[prost(int64, tag = "5")]
    pub concept_id: SctId,
    /// ISO language code (e.g., "en").
    #[prost(string, tag = "6")]
    pub language_code: String,
    /// Type of description (FSN, Synonym, Definition).
    #[prost(int64, tag = "7")]
    pub type_id: SctId,
    /// The description text/term.
    #[prost(string, tag = "8")]
    pub term: String,
    /// Case significance rules for this term.
    #[prost(int64, tag = "9")]
    pub case_significance_id: SctId,
}

impl Description {
    /// Returns true if this is a Fully Specified Name.
    ///
    /// FSN descriptions are unambiguous and include a semantic tag in
    /// parentheses; response filters and the search index exclude them by
    /// default.
    pub fn is_fsn(&self) -> bool {
        self.type_id == DescriptionType::FSN_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    fn make_description(type_id: SctId) -> Description {
        Description {
            id: 754786011,
            effective_time: 20020131,
            active: true,
            module_id: 900000000000207008,
            concept_id: 73211009,
            language_code: "en".to_string(),
            type_id,
            term: "Diabetes mellitus (disorder)".to_string(),
            case_significance_id: 900000000000448009,
        }
    }

    #[test]
    fn test_description_fsn() {
        assert!(make_description(DescriptionType::FSN_ID).is_fsn());
        assert!(!make_description(DescriptionType::SYNONYM_ID).is_fsn());
    }

    #[test]
    fn test_payload_roundtrip() {
        let desc = make_description(DescriptionType::SYNONYM_ID);
        let bytes = desc.encode_to_vec();
        let decoded = Description::decode(bytes.as_slice()).unwrap();
        assert_eq!(desc, decoded);
    }
}
