//! SNOMED CT Reference Set types.
//!
//! Reference sets (refsets) group components together for various purposes:
//!
//! - **Simple refsets**: basic membership (component belongs to refset)
//! - **Map refsets**: mappings to other terminologies (simple and complex)
//! - **Language refsets**: preferred/acceptable descriptions per dialect
//! - **Attribute value / Association / RefsetDescriptor**: metadata
//!
//! A single [`RefsetItem`] carries the columns common to every refset file
//! plus a tagged [`RefsetBody`] variant for the subtype-specific columns, so
//! dispatch over refset kinds is exhaustive at compile time.
//!
//! # Example
//!
//! ```
//! use sct_types::refset::{LanguageRefset, RefsetBody, RefsetItem};
//! use sct_types::Acceptability;
//!
//! let member = RefsetItem {
//!     id: "80000517-8513-5ca0-a44c-dc66f3c3a1c6".to_string(),
//!     effective_time: 20020131,
//!     active: true,
//!     module_id: 900000000000207008,
//!     refset_id: 900000000000508004, // GB English language refset
//!     referenced_component_id: 2638271011,
//!     body: Some(RefsetBody::Language(LanguageRefset {
//!         acceptability_id: Acceptability::PREFERRED_ID,
//!     })),
//! };
//!
//! assert!(member.language().map(LanguageRefset::is_preferred).unwrap_or(false));
//! ```

use serde::{Deserialize, Serialize};

use crate::{Acceptability, SctId};

/// A reference set member from an RF2 refset file.
///
/// The identifier is a GUID string (column 0 of every refset file); the
/// subtype-specific columns live in the tagged [`RefsetBody`].
/// The prost field tags define the on-disk payload encoding.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefsetItem {
    /// Unique identifier for this member (GUID string).
    #[prost(string, tag = "1")]
    pub id: String,
    /// Effective date in YYYYMMDD format.
    #[prost(uint32, tag = "2")]
    pub effective_time: u32,
    /// Whether this membership is currently active.
    #[prost(bool, tag = "3")]
    pub active: bool,
    /// Module this member belongs to.
    #[prost(int64, tag = "4")]
    pub module_id: SctId,
    /// The reference set this member belongs to.
    #[prost(int64, tag = "5")]
    pub refset_id: SctId,
    /// The component (concept or description) that is a member.
    #[prost(int64, tag = "6")]
    pub referenced_component_id: SctId,
    /// Subtype-specific columns.
    #[prost(oneof = "RefsetBody", tags = "7, 8, 9, 10, 11, 12, 13")]
    #[serde(flatten)]
    pub body: Option<RefsetBody>,
}

impl RefsetItem {
    /// Returns the simple-refset body, if this is a simple refset member.
    pub fn simple(&self) -> Option<&SimpleRefset> {
        match self.body {
            Some(RefsetBody::Simple(ref b)) => Some(b),
            _ => None,
        }
    }

    /// Returns the simple-map body, if this is a simple map member.
    pub fn simple_map(&self) -> Option<&SimpleMapRefset> {
        match self.body {
            Some(RefsetBody::SimpleMap(ref b)) => Some(b),
            _ => None,
        }
    }

    /// Returns the complex-map body, if this is a complex/extended map member.
    pub fn complex_map(&self) -> Option<&ComplexMapRefset> {
        match self.body {
            Some(RefsetBody::ComplexMap(ref b)) => Some(b),
            _ => None,
        }
    }

    /// Returns the language body, if this is a language refset member.
    pub fn language(&self) -> Option<&LanguageRefset> {
        match self.body {
            Some(RefsetBody::Language(ref b)) => Some(b),
            _ => None,
        }
    }

    /// Returns the association body, if this is an association member.
    pub fn association(&self) -> Option<&AssociationRefset> {
        match self.body {
            Some(RefsetBody::Association(ref b)) => Some(b),
            _ => None,
        }
    }
}

/// Subtype-specific columns of a reference set member.
#[derive(Clone, PartialEq, ::prost::Oneof, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RefsetBody {
    /// Simple membership, no additional columns.
    #[prost(message, tag = "7")]
    Simple(SimpleRefset),
    /// Map to a single code in another terminology.
    #[prost(message, tag = "8")]
    SimpleMap(SimpleMapRefset),
    /// Complex or extended map to another terminology.
    #[prost(message, tag = "9")]
    ComplexMap(ComplexMapRefset),
    /// Description acceptability in a language/dialect.
    #[prost(message, tag = "10")]
    Language(LanguageRefset),
    /// Attribute value applied to the referenced component.
    #[prost(message, tag = "11")]
    AttributeValue(AttributeValueRefset),
    /// Association with another component (e.g. replacement).
    #[prost(message, tag = "12")]
    Association(AssociationRefset),
    /// Descriptor of another reference set's structure.
    #[prost(message, tag = "13")]
    RefsetDescriptor(RefsetDescriptorRefset),
}

/// Simple refset membership; carries no additional columns.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
pub struct SimpleRefset {}

/// Map to a single code in another terminology (e.g. ICD-10).
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleMapRefset {
    /// The code in the target terminology.
    #[prost(string, tag = "1")]
    pub map_target: String,
}

/// Complex or extended map to another terminology.
///
/// Extended maps carry `map_category`, complex maps `map_block`; both files
/// share the remaining columns.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexMapRefset {
    /// Group of complex map records this record belongs to.
    #[prost(int64, tag = "1")]
    pub map_group: i64,
    /// Priority of this map within its group.
    #[prost(int64, tag = "2")]
    pub map_priority: i64,
    /// Machine-readable rule for when this map applies.
    #[prost(string, tag = "3")]
    pub map_rule: String,
    /// Human-readable advice for applying this map.
    #[prost(string, tag = "4")]
    pub map_advice: String,
    /// The code in the target terminology.
    #[prost(string, tag = "5")]
    pub map_target: String,
    /// Correlation between the source and target codes.
    #[prost(int64, tag = "6")]
    pub correlation: i64,
    /// Map category (extended maps).
    #[prost(int64, tag = "7")]
    pub map_category: i64,
    /// Map block (complex maps, UK releases).
    #[prost(int64, tag = "8")]
    pub map_block: i64,
}

/// Description acceptability within a language/dialect refset.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageRefset {
    /// Preferred (900000000000548007) or Acceptable (900000000000549004).
    #[prost(int64, tag = "1")]
    pub acceptability_id: SctId,
}

impl LanguageRefset {
    /// Decodes the acceptability coded value; `None` if the stored
    /// identifier is outside the acceptability value set.
    pub fn acceptability(&self) -> Option<Acceptability> {
        Acceptability::from_id(self.acceptability_id)
    }

    /// Returns true if this description is preferred in this dialect.
    pub fn is_preferred(&self) -> bool {
        self.acceptability() == Some(Acceptability::Preferred)
    }
}

/// Attribute value applied to the referenced component.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeValueRefset {
    /// The attribute value concept.
    #[prost(int64, tag = "1")]
    pub value_id: SctId,
}

/// Association between the referenced component and a target component.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationRefset {
    /// The associated target component.
    #[prost(int64, tag = "1")]
    pub target_component_id: SctId,
}

/// Descriptor of another reference set's structure.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefsetDescriptorRefset {
    /// Concept describing the attribute.
    #[prost(int64, tag = "1")]
    pub attribute_description_id: SctId,
    /// Concept describing the attribute's type.
    #[prost(int64, tag = "2")]
    pub attribute_type_id: SctId,
    /// Position of the attribute within the refset.
    #[prost(uint32, tag = "3")]
    pub attribute_order: u32,
}
