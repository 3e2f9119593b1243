//! HTTP gateway.
//!
//! A thin JSON surface over the same in-process service the RPC routes use.
//! `Accept-Language` drives locale-sensitive name resolution, with the
//! service default applying when the header is absent or unparseable.

use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header::ACCEPT_LANGUAGE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use sct_search::{FuzzyMode, SearchRequest};
use sct_terminology::{parse_accept_language, TerminologyError, TerminologySvc};
use sct_types::{Concept, Description, RefsetItem, SctId};
use serde::Serialize;
use unic_langid::LanguageIdentifier;

/// Builds the gateway router over the shared service.
pub fn router(svc: Arc<TerminologySvc>) -> Router {
    Router::new()
        .route("/concept/:id", get(get_concept))
        .route("/concept/:id/descriptions", get(get_concept_descriptions))
        .route("/concept/:id/crossmap", get(crossmap))
        .route("/concept/:id/genericize", get(genericize))
        .route("/search", get(search))
        .route("/synonyms", get(synonyms))
        .with_state(svc)
}

/// A gateway error: status code plus a JSON error body.
struct ApiError(StatusCode, String);

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self(StatusCode::BAD_REQUEST, message.into())
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self(StatusCode::NOT_FOUND, message.into())
    }
}

impl From<TerminologyError> for ApiError {
    fn from(error: TerminologyError) -> Self {
        match error {
            TerminologyError::ConceptNotFound { .. }
            | TerminologyError::NoTranslation { .. }
            | TerminologyError::RootNotOnPath { .. } => {
                Self(StatusCode::NOT_FOUND, error.to_string())
            }
            other => Self(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.1 }));
        (self.0, body).into_response()
    }
}

/// A returned concept including useful additional information.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConceptView {
    #[serde(flatten)]
    concept: Concept,
    is_a: Vec<SctId>,
    descriptions: Vec<Description>,
    preferred_description: Description,
    preferred_fsn: Description,
    reference_sets: Vec<SctId>,
}

/// A minimal search hit.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchHit {
    term: String,
    concept_id: SctId,
    preferred_term: String,
}

/// Which descriptions of a concept are included in a response.
#[derive(Debug, Clone, Copy, Default)]
struct DescriptionFilter {
    include_inactive: bool,
    include_fsn: bool,
}

impl DescriptionFilter {
    fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            include_inactive: flag_of(pairs, "includeInactive").unwrap_or(false),
            include_fsn: flag_of(pairs, "includeFsn").unwrap_or(false),
        }
    }

    fn test(&self, description: &Description) -> bool {
        if !description.active && !self.include_inactive {
            return false;
        }
        if description.is_fsn() && !self.include_fsn {
            return false;
        }
        true
    }

    fn filter(&self, descriptions: Vec<Description>) -> Vec<Description> {
        descriptions.into_iter().filter(|d| self.test(d)).collect()
    }
}

fn ids_of(pairs: &[(String, String)], key: &str) -> Result<Vec<SctId>, ApiError> {
    pairs
        .iter()
        .filter(|(k, _)| k == key)
        .map(|(_, v)| {
            v.parse()
                .map_err(|_| ApiError::bad_request(format!("invalid identifier in {key}: {v}")))
        })
        .collect()
}

fn flag_of(pairs: &[(String, String)], key: &str) -> Option<bool> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .and_then(|(_, v)| v.parse().ok())
}

fn value_of<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn language_tags(svc: &TerminologySvc, headers: &HeaderMap) -> Vec<LanguageIdentifier> {
    headers
        .get(ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok())
        .map(parse_accept_language)
        .filter(|tags| !tags.is_empty())
        .unwrap_or_else(|| vec![svc.default_language().clone()])
}

/// Renders a full concept view for `concept`.
fn concept_view(
    svc: &TerminologySvc,
    concept: Concept,
    headers: &HeaderMap,
    filter: DescriptionFilter,
) -> Result<ConceptView, ApiError> {
    let tags = language_tags(svc, headers);
    let descriptions = svc.get_descriptions(concept.id)?;
    let preferred_description = svc.must_get_preferred_synonym(concept.id, &tags)?;
    let preferred_fsn = svc.must_get_fully_specified_name(concept.id, &tags)?;
    let reference_sets = svc.get_reference_sets(concept.id)?;
    let is_a = svc.get_all_parent_ids(concept.id)?;

    Ok(ConceptView {
        concept,
        is_a,
        descriptions: filter.filter(descriptions),
        preferred_description,
        preferred_fsn,
        reference_sets,
    })
}

async fn get_concept(
    State(svc): State<Arc<TerminologySvc>>,
    Path(id): Path<SctId>,
    Query(pairs): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Result<Json<ConceptView>, ApiError> {
    let concept = svc.require_concept(id)?;
    let view = concept_view(&svc, concept, &headers, DescriptionFilter::from_pairs(&pairs))?;
    Ok(Json(view))
}

async fn get_concept_descriptions(
    State(svc): State<Arc<TerminologySvc>>,
    Path(id): Path<SctId>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Description>>, ApiError> {
    svc.require_concept(id)?;
    let descriptions = svc.get_descriptions(id)?;
    Ok(Json(
        DescriptionFilter::from_pairs(&pairs).filter(descriptions),
    ))
}

async fn crossmap(
    State(svc): State<Arc<TerminologySvc>>,
    Path(id): Path<SctId>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<RefsetItem>, ApiError> {
    let refset_id: SctId = value_of(&pairs, "refset")
        .ok_or_else(|| ApiError::bad_request("missing parameter: refset"))?
        .parse()
        .map_err(|_| ApiError::bad_request("invalid parameter: refset"))?;

    match svc.get_from_reference_set(refset_id, id)? {
        Some(item) => Ok(Json(item)),
        None => Err(ApiError::not_found(format!(
            "concept {id} is not a member of refset {refset_id}"
        ))),
    }
}

async fn genericize(
    State(svc): State<Arc<TerminologySvc>>,
    Path(id): Path<SctId>,
    Query(pairs): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Result<Json<ConceptView>, ApiError> {
    let concept = svc.require_concept(id)?;
    let filter = DescriptionFilter::from_pairs(&pairs);

    let roots = ids_of(&pairs, "root")?;
    if !roots.is_empty() {
        let targets: HashSet<SctId> = roots.into_iter().collect();
        let generic = svc
            .genericise_to(concept.id, &targets)?
            .ok_or_else(|| ApiError::not_found(format!("no generic match for concept {id}")))?;
        let generic = svc.require_concept(generic)?;
        return Ok(Json(concept_view(&svc, generic, &headers, filter)?));
    }

    if let Some(refset) = value_of(&pairs, "refset") {
        let refset_id: SctId = refset
            .parse()
            .map_err(|_| ApiError::bad_request("invalid parameter: refset"))?;
        let members = svc.get_reference_set_items(refset_id)?;
        let generic = svc.genericise_to(concept.id, &members)?.ok_or_else(|| {
            ApiError::not_found(format!(
                "unable to genericise {id} to a member of refset {refset_id}"
            ))
        })?;
        let generic = svc.require_concept(generic)?;
        return Ok(Json(concept_view(&svc, generic, &headers, filter)?));
    }

    Err(ApiError::bad_request("must specify either a root or refset"))
}

/// Builds a search request from query parameters.
fn search_request(pairs: &[(String, String)]) -> Result<SearchRequest, ApiError> {
    let text = value_of(pairs, "s").ok_or_else(|| ApiError::bad_request("missing parameter: s"))?;

    let fuzzy = if flag_of(pairs, "fuzzy").unwrap_or(false) {
        FuzzyMode::Always
    } else if flag_of(pairs, "fallbackFuzzy") == Some(false) {
        FuzzyMode::Never
    } else {
        FuzzyMode::Fallback
    };

    Ok(SearchRequest {
        search: text.to_string(),
        recursive_parents: ids_of(pairs, "root")?,
        direct_parents: ids_of(pairs, "is")?,
        refsets: ids_of(pairs, "refset")?,
        limit: value_of(pairs, "maxHits")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0),
        include_inactive: flag_of(pairs, "inactive").unwrap_or(false),
        fuzzy,
    })
}

async fn search(
    State(svc): State<Arc<TerminologySvc>>,
    Query(pairs): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Result<Json<Vec<SearchHit>>, ApiError> {
    let request = search_request(&pairs)?;
    let tags = language_tags(&svc, &headers);

    let mut hits = Vec::new();
    for (concept_id, description_id) in svc.search(&request)? {
        let description = svc
            .get_description(description_id)?
            .ok_or_else(|| ApiError::not_found(format!("description {description_id} not found")))?;
        let preferred = svc.must_get_preferred_synonym(concept_id, &tags)?;
        hits.push(SearchHit {
            term: description.term,
            concept_id,
            preferred_term: preferred.term,
        });
    }
    Ok(Json(hits))
}

async fn synonyms(
    State(svc): State<Arc<TerminologySvc>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<String>>, ApiError> {
    let request = search_request(&pairs)?;
    let filter = DescriptionFilter::from_pairs(&pairs);

    let mut terms = Vec::new();
    for (concept_id, _) in svc.search(&request)? {
        let descriptions = svc.get_descriptions(concept_id)?;
        terms.extend(filter.filter(descriptions).into_iter().map(|d| d.term));
    }
    Ok(Json(terms))
}
