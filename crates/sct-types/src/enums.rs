//! Decoders for SNOMED CT coded-value columns.
//!
//! Several RF2 columns hold an SCTID drawn from a small metadata value set:
//! a concept's definition status, a description's type and case
//! significance, a relationship's characteristic type and modifier, and the
//! acceptability of a language refset member. Each enum here names one of
//! those value sets.
//!
//! The ingest pipeline decodes these columns with `from_id` and rejects
//! rows carrying an identifier outside the value set; the semantic layer
//! matches on the decoded variants (preferred-term resolution turns on
//! [`Acceptability::Preferred`], name lookups select by
//! [`DescriptionType`]). The `*_ID` constants are the raw identifiers for
//! callers that compare without decoding.

use serde::{Deserialize, Serialize};

use crate::SctId;

/// Definition status of a concept: primitively defined (necessary
/// conditions only) or fully defined (necessary and sufficient).
///
/// Validated on every concept row during import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefinitionStatus {
    /// Necessary conditions only.
    Primitive,
    /// Necessary and sufficient conditions.
    FullyDefined,
}

impl DefinitionStatus {
    /// SCTID for primitive definition status.
    pub const PRIMITIVE_ID: SctId = 900000000000074008;
    /// SCTID for fully defined definition status.
    pub const FULLY_DEFINED_ID: SctId = 900000000000073002;

    /// Decodes a `definitionStatusId`; `None` for anything outside the
    /// value set.
    pub fn from_id(id: SctId) -> Option<Self> {
        match id {
            Self::PRIMITIVE_ID => Some(Self::Primitive),
            Self::FULLY_DEFINED_ID => Some(Self::FullyDefined),
            _ => None,
        }
    }
}

/// Type of a description: Fully Specified Name, Synonym, or Definition.
///
/// Validated on every description row during import; name resolution and
/// the search index's FSN exclusion select descriptions by this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DescriptionType {
    /// Unambiguous name carrying a semantic tag, e.g. "Heart disease
    /// (disorder)".
    Fsn,
    /// An additional acceptable term for the concept.
    Synonym,
    /// A textual definition of the concept.
    Definition,
}

impl DescriptionType {
    /// SCTID for Fully Specified Name type.
    pub const FSN_ID: SctId = 900000000000003001;
    /// SCTID for Synonym type.
    pub const SYNONYM_ID: SctId = 900000000000013009;
    /// SCTID for Definition type.
    pub const DEFINITION_ID: SctId = 900000000000550004;

    /// Decodes a `typeId`; `None` for anything outside the value set.
    pub fn from_id(id: SctId) -> Option<Self> {
        match id {
            Self::FSN_ID => Some(Self::Fsn),
            Self::SYNONYM_ID => Some(Self::Synonym),
            Self::DEFINITION_ID => Some(Self::Definition),
            _ => None,
        }
    }

    /// The SCTID this description type is stored as.
    pub fn to_id(self) -> SctId {
        match self {
            Self::Fsn => Self::FSN_ID,
            Self::Synonym => Self::SYNONYM_ID,
            Self::Definition => Self::DEFINITION_ID,
        }
    }
}

/// Acceptability of a description within a language reference set.
///
/// A concept has exactly one [`Acceptability::Preferred`] synonym per
/// language refset; locale-sensitive name resolution selects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Acceptability {
    /// The single preferred description of its type for the dialect.
    Preferred,
    /// An acceptable alternative description.
    Acceptable,
}

impl Acceptability {
    /// SCTID for preferred acceptability.
    pub const PREFERRED_ID: SctId = 900000000000548007;
    /// SCTID for acceptable acceptability.
    pub const ACCEPTABLE_ID: SctId = 900000000000549004;

    /// Decodes an `acceptabilityId`; `None` for anything outside the value
    /// set.
    pub fn from_id(id: SctId) -> Option<Self> {
        match id {
            Self::PREFERRED_ID => Some(Self::Preferred),
            Self::ACCEPTABLE_ID => Some(Self::Acceptable),
            _ => None,
        }
    }
}

/// Case significance of a description term.
///
/// Validated on every description row during import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseSignificance {
    /// Entire term is case insensitive.
    CaseInsensitive,
    /// Entire term is case sensitive.
    EntireTermCaseSensitive,
    /// Only the initial character is case sensitive.
    InitialCharacterCaseSensitive,
}

impl CaseSignificance {
    /// SCTID for case insensitive.
    pub const CASE_INSENSITIVE_ID: SctId = 900000000000448009;
    /// SCTID for entire term case sensitive.
    pub const ENTIRE_TERM_CASE_SENSITIVE_ID: SctId = 900000000000017005;
    /// SCTID for initial character case sensitive.
    pub const INITIAL_CHAR_CASE_SENSITIVE_ID: SctId = 900000000000020002;

    /// Decodes a `caseSignificanceId`; `None` for anything outside the
    /// value set.
    pub fn from_id(id: SctId) -> Option<Self> {
        match id {
            Self::CASE_INSENSITIVE_ID => Some(Self::CaseInsensitive),
            Self::ENTIRE_TERM_CASE_SENSITIVE_ID => Some(Self::EntireTermCaseSensitive),
            Self::INITIAL_CHAR_CASE_SENSITIVE_ID => Some(Self::InitialCharacterCaseSensitive),
            _ => None,
        }
    }
}

/// Characteristic type of a relationship: stated as authored, inferred by
/// the classifier, or additional.
///
/// Validated on every relationship row during import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacteristicType {
    /// Stated relationship (as authored).
    Stated,
    /// Inferred relationship (computed by classifier).
    Inferred,
    /// Additional relationship.
    Additional,
}

impl CharacteristicType {
    /// SCTID for stated relationship.
    pub const STATED_ID: SctId = 900000000000010007;
    /// SCTID for inferred relationship.
    pub const INFERRED_ID: SctId = 900000000000011006;
    /// SCTID for additional relationship.
    pub const ADDITIONAL_ID: SctId = 900000000000227009;

    /// Decodes a `characteristicTypeId`; `None` for anything outside the
    /// value set.
    pub fn from_id(id: SctId) -> Option<Self> {
        match id {
            Self::STATED_ID => Some(Self::Stated),
            Self::INFERRED_ID => Some(Self::Inferred),
            Self::ADDITIONAL_ID => Some(Self::Additional),
            _ => None,
        }
    }
}

/// Relationship modifier: existential (some) or universal (all)
/// quantification.
///
/// Validated on every relationship row during import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierType {
    /// Existential modifier (some).
    Existential,
    /// Universal modifier (all).
    Universal,
}

impl ModifierType {
    /// SCTID for existential (some) modifier.
    pub const EXISTENTIAL_ID: SctId = 900000000000451002;
    /// SCTID for universal (all) modifier.
    pub const UNIVERSAL_ID: SctId = 900000000000450001;

    /// Decodes a `modifierId`; `None` for anything outside the value set.
    pub fn from_id(id: SctId) -> Option<Self> {
        match id {
            Self::EXISTENTIAL_ID => Some(Self::Existential),
            Self::UNIVERSAL_ID => Some(Self::Universal),
            _ => None,
        }
    }
}
