//! Search request model.

use sct_types::{well_known, SctId};

/// How fuzzy matching applies to a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FuzzyMode {
    /// Exact prefix matching only; never falls back.
    Never,
    /// Every token additionally matches at edit distance 2.
    Always,
    /// Exact first; re-run once as [`FuzzyMode::Always`] if nothing matched.
    #[default]
    Fallback,
}

/// Parameters for a description search.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Free-text search terms.
    pub search: String,
    /// Restrict hits to descendants of any of these concepts.
    /// Empty means the SNOMED CT root.
    pub recursive_parents: Vec<SctId>,
    /// Restrict hits to direct children of any of these concepts.
    pub direct_parents: Vec<SctId>,
    /// Restrict hits to concepts within any of these refsets.
    pub refsets: Vec<SctId>,
    /// Maximum number of hits; 0 means the default of 200.
    pub limit: usize,
    /// Whether inactive concepts may appear in results.
    pub include_inactive: bool,
    /// Fuzzy matching behaviour.
    pub fuzzy: FuzzyMode,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            search: String::new(),
            recursive_parents: Vec::new(),
            direct_parents: Vec::new(),
            refsets: Vec::new(),
            limit: 0,
            include_inactive: false,
            fuzzy: FuzzyMode::default(),
        }
    }
}

impl SearchRequest {
    /// Default maximum number of hits.
    pub const DEFAULT_LIMIT: usize = 200;

    /// Builds a request searching for `text` beneath the SNOMED CT root.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            search: text.into(),
            ..Self::default()
        }
    }

    /// The effective hit limit.
    pub fn effective_limit(&self) -> usize {
        if self.limit == 0 {
            Self::DEFAULT_LIMIT
        } else {
            self.limit
        }
    }

    /// The effective recursive-parent filter; defaults to the SNOMED root.
    pub fn effective_recursive_parents(&self) -> Vec<SctId> {
        if self.recursive_parents.is_empty() {
            vec![well_known::SNOMED_CT_ROOT]
        } else {
            self.recursive_parents.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let request = SearchRequest::new("heart");
        assert_eq!(request.effective_limit(), 200);
        assert_eq!(
            request.effective_recursive_parents(),
            vec![well_known::SNOMED_CT_ROOT]
        );
        assert_eq!(request.fuzzy, FuzzyMode::Fallback);
        assert!(!request.include_inactive);
    }

    #[test]
    fn test_explicit_values_win() {
        let request = SearchRequest {
            limit: 10,
            recursive_parents: vec![404684003],
            ..SearchRequest::new("heart")
        };
        assert_eq!(request.effective_limit(), 10);
        assert_eq!(request.effective_recursive_parents(), vec![404684003]);
    }
}
