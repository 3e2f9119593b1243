//! Locale-sensitive name resolution.
//!
//! Resolution is two-stage. First the requested locales are negotiated
//! against the known language reference sets and the winning refset decides
//! which description is preferred. If the concept has no preferred entry in
//! that refset (a release without the refset installed, or content like the
//! UK drug extension), resolution falls back to plain language-tag matching
//! over the description language codes.

use fluent_langneg::{negotiate_languages, NegotiationStrategy};
use sct_types::{well_known, Acceptability, Description, DescriptionType, SctId};
use unic_langid::LanguageIdentifier;

use crate::error::{TerminologyError, TerminologyResult};
use crate::svc::TerminologySvc;

/// The language reference sets this build knows how to negotiate against.
const LANGUAGE_REFSETS: [(&str, SctId); 2] = [
    ("en-GB", well_known::GB_ENGLISH_LANG_REFSET),
    ("en-US", well_known::US_ENGLISH_LANG_REFSET),
];

/// Parses an `Accept-Language` header into ordered locale preferences.
/// Unparseable input yields an empty list, letting the service default
/// apply.
pub fn parse_accept_language(header: &str) -> Vec<LanguageIdentifier> {
    fluent_langneg::accepted_languages::parse(header)
}

impl TerminologySvc {
    /// The concept's fully specified name under the given locale
    /// preferences, or `None`.
    pub fn get_fully_specified_name(
        &self,
        concept_id: SctId,
        tags: &[LanguageIdentifier],
    ) -> TerminologyResult<Option<Description>> {
        let descriptions = self.get_descriptions(concept_id)?;
        self.language_match(&descriptions, DescriptionType::Fsn, tags)
    }

    /// As [`get_fully_specified_name`](Self::get_fully_specified_name), but
    /// a miss is a fatal error: every concept in a well-formed release has
    /// an FSN.
    pub fn must_get_fully_specified_name(
        &self,
        concept_id: SctId,
        tags: &[LanguageIdentifier],
    ) -> TerminologyResult<Description> {
        self.get_fully_specified_name(concept_id, tags)?.ok_or(
            TerminologyError::MissingPreferredDescription {
                kind: "fully specified name",
                concept_id,
            },
        )
    }

    /// The concept's preferred synonym under the given locale preferences,
    /// or `None`.
    pub fn get_preferred_synonym(
        &self,
        concept_id: SctId,
        tags: &[LanguageIdentifier],
    ) -> TerminologyResult<Option<Description>> {
        let descriptions = self.get_descriptions(concept_id)?;
        self.language_match(&descriptions, DescriptionType::Synonym, tags)
    }

    /// As [`get_preferred_synonym`](Self::get_preferred_synonym), but a
    /// miss is a fatal error.
    pub fn must_get_preferred_synonym(
        &self,
        concept_id: SctId,
        tags: &[LanguageIdentifier],
    ) -> TerminologyResult<Description> {
        self.get_preferred_synonym(concept_id, tags)?.ok_or(
            TerminologyError::MissingPreferredDescription {
                kind: "preferred synonym",
                concept_id,
            },
        )
    }

    /// Finds the best description of the given type for the locale
    /// preferences: refset-based first, then language-tag fallback.
    pub(crate) fn language_match(
        &self,
        descriptions: &[Description],
        description_type: DescriptionType,
        tags: &[LanguageIdentifier],
    ) -> TerminologyResult<Option<Description>> {
        if let Some(description) =
            self.refset_language_match(descriptions, description_type, tags)?
        {
            return Ok(Some(description));
        }
        Ok(self.simple_language_match(descriptions, description_type, tags))
    }

    /// Selects the description whose acceptability decodes to
    /// [`Acceptability::Preferred`] in the language refset negotiated from
    /// `tags`.
    fn refset_language_match(
        &self,
        descriptions: &[Description],
        description_type: DescriptionType,
        tags: &[LanguageIdentifier],
    ) -> TerminologyResult<Option<Description>> {
        let refset_id = self.match_language_refset(tags);
        for description in descriptions {
            if description.type_id != description_type.to_id() {
                continue;
            }
            if let Some(item) = self.get_from_reference_set(refset_id, description.id)? {
                let acceptability = item.language().and_then(|l| l.acceptability());
                if item.active && acceptability == Some(Acceptability::Preferred) {
                    return Ok(Some(description.clone()));
                }
            }
        }
        Ok(None)
    }

    /// Negotiates the requested locales against the known language refsets,
    /// falling back to the service default.
    fn match_language_refset(&self, tags: &[LanguageIdentifier]) -> SctId {
        let available: Vec<LanguageIdentifier> = LANGUAGE_REFSETS
            .iter()
            .map(|(tag, _)| tag.parse().expect("static language tag"))
            .collect();

        let negotiated = negotiate_languages(
            tags,
            &available,
            Some(&self.default_language),
            NegotiationStrategy::Filtering,
        );
        let chosen = negotiated.first().copied().unwrap_or(&self.default_language);

        available
            .iter()
            .position(|lang| lang == chosen)
            .map(|i| LANGUAGE_REFSETS[i].1)
            .unwrap_or(well_known::GB_ENGLISH_LANG_REFSET)
    }

    /// Matches on description language codes alone. Useful when a concept
    /// is not covered by any installed language refset.
    fn simple_language_match(
        &self,
        descriptions: &[Description],
        description_type: DescriptionType,
        tags: &[LanguageIdentifier],
    ) -> Option<Description> {
        let candidates: Vec<&Description> = descriptions
            .iter()
            .filter(|d| d.type_id == description_type.to_id() && d.active)
            .collect();
        if candidates.is_empty() {
            return None;
        }

        let available: Vec<LanguageIdentifier> = candidates
            .iter()
            .map(|d| d.language_code.parse().unwrap_or_default())
            .collect();
        let negotiated = negotiate_languages(
            tags,
            &available,
            Some(&self.default_language),
            NegotiationStrategy::Filtering,
        );

        let index = negotiated
            .first()
            .and_then(|chosen| available.iter().position(|lang| lang == *chosen))
            .unwrap_or(0);
        Some(candidates[index].clone())
    }
}
