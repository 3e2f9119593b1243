//! SNOMED CT Relationship type.
//!
//! This module provides the `Relationship` struct representing a relationship
//! from an RF2 Relationship file.

use serde::{Deserialize, Serialize};

use crate::{well_known, SctId};

/// A SNOMED CT relationship from the RF2 Relationship file.
///
/// Represents a row from `sct2_Relationship_*.txt` files in an RF2 release.
/// A relationship links a source concept to a destination concept through a
/// type concept; IS-A relationships form the subsumption hierarchy.
/// The prost field tags define the on-disk payload encoding; the
/// `characteristic_type_id` and `modifier_id` coded values are validated at
/// import time.
///
/// # Examples
///
/// ```
/// use sct_types::{Relationship, well_known};
///
/// // 56265001 |Heart disease| IS-A 404684003 |Clinical finding|
/// let relationship = Relationship {
///     id: 1000001,
///     effective_time: 20020131,
///     active: true,
///     module_id: 900000000000207008,
///     source_id: 56265001,
///     destination_id: 404684003,
///     relationship_group: 0,
///     type_id: well_known::IS_A,
///     characteristic_type_id: 900000000000011006,
///     modifier_id: 900000000000451002,
/// };
///
/// assert!(relationship.is_is_a());
/// ```
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    /// Unique identifier for this relationship (SCTID).
    #[prost(int64, tag = "1")]
    pub id: SctId,
    /// Effective date in YYYYMMDD format.
    #[prost(uint32, tag = "2")]
    pub effective_time: u32,
    /// Whether this relationship is active.
    #[prost(bool, tag = "3")]
    pub active: bool,
    /// The module containing this relationship.
    #[prost(int64, tag = "4")]
    pub module_id: SctId,
    /// The source concept of this relationship.
    #[prost(int64, tag = "5")]
    pub source_id: SctId,
    /// The destination concept of this relationship.
    #[prost(int64, tag = "6")]
    pub destination_id: SctId,
    /// Relationship group number (0 = ungrouped).
    #[prost(int64, tag = "7")]
    pub relationship_group: i64,
    /// The relationship type concept (IS-A or an attribute).
    #[prost(int64, tag = "8")]
    pub type_id: SctId,
    /// Stated or inferred characteristic type.
    #[prost(int64, tag = "9")]
    pub characteristic_type_id: SctId,
    /// Existential or universal modifier.
    #[prost(int64, tag = "10")]
    pub modifier_id: SctId,
}

impl Relationship {
    /// Returns true if this is an IS-A relationship.
    pub fn is_is_a(&self) -> bool {
        self.type_id == well_known::IS_A
    }
}
