//! Well-known SNOMED CT concept IDs.
//!
//! This module provides constants for commonly used SNOMED CT concept
//! identifiers: the root concept, top-level hierarchies, relationship types,
//! modules and language reference sets.
//!
//! # Examples
//!
//! ```
//! use sct_types::well_known;
//!
//! // Check if a concept is the IS_A type
//! let type_id: i64 = 116680003;
//! assert_eq!(type_id, well_known::IS_A);
//!
//! // Reference top-level hierarchies
//! assert_eq!(well_known::CLINICAL_FINDING, 404684003);
//! ```

use crate::SctId;

// =============================================================================
// Root Concepts
// =============================================================================

/// SNOMED CT root concept (138875005).
///
/// The single root of the entire SNOMED CT hierarchy.
pub const SNOMED_CT_ROOT: SctId = 138875005;

// =============================================================================
// Top-Level Hierarchies
// =============================================================================

/// Clinical finding (finding) - 404684003.
///
/// Represents disorders, diseases, symptoms, signs, and other clinical observations.
pub const CLINICAL_FINDING: SctId = 404684003;

/// Procedure (procedure) - 71388002.
pub const PROCEDURE: SctId = 71388002;

/// Body structure (body structure) - 123037004.
pub const BODY_STRUCTURE: SctId = 123037004;

/// Substance (substance) - 105590001.
pub const SUBSTANCE: SctId = 105590001;

/// Pharmaceutical/biologic product - 373873005.
///
/// Represents medications and biological products.
pub const PHARMACEUTICAL_PRODUCT: SctId = 373873005;

// =============================================================================
// Common Relationship Types
// =============================================================================

/// IS_A relationship type - 116680003.
///
/// Defines the taxonomic (hierarchical) relationships between concepts.
pub const IS_A: SctId = 116680003;

/// Finding site attribute - 363698007.
pub const FINDING_SITE: SctId = 363698007;

// =============================================================================
// Modules
// =============================================================================

/// SNOMED CT core module - 900000000000207008.
pub const SNOMED_CT_CORE_MODULE: SctId = 900000000000207008;

/// SNOMED CT model component module - 900000000000012004.
pub const SNOMED_CT_MODEL_COMPONENT_MODULE: SctId = 900000000000012004;

// =============================================================================
// Language Reference Sets
// =============================================================================

/// GB English language reference set - 900000000000508004.
pub const GB_ENGLISH_LANG_REFSET: SctId = 900000000000508004;

/// US English language reference set - 900000000000509007.
pub const US_ENGLISH_LANG_REFSET: SctId = 900000000000509007;

// =============================================================================
// Map Reference Sets
// =============================================================================

/// ICD-10 complex map reference set - 447562003.
pub const ICD10_COMPLEX_MAP: SctId = 447562003;
