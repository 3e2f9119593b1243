//! Gateway tests driving the axum router directly with tower.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use sct_terminology::{SvcOptions, TerminologySvc};
use sct_types::refset::{LanguageRefset, RefsetBody, RefsetItem, SimpleMapRefset};
use sct_types::{
    well_known, Acceptability, CharacteristicType, Concept, Description, DescriptionType,
    ModifierType, Relationship, SctId,
};
use tower::ServiceExt;

const ROOT: SctId = well_known::SNOMED_CT_ROOT;
const CLINICAL_FINDING: SctId = well_known::CLINICAL_FINDING;
const HEART_DISEASE: SctId = 56265001;
const ICD10_MAP: SctId = 447562003;

fn concept(id: SctId) -> Concept {
    Concept {
        id,
        effective_time: 20020131,
        active: true,
        module_id: well_known::SNOMED_CT_CORE_MODULE,
        definition_status_id: 900000000000074008,
    }
}

fn description(id: SctId, concept_id: SctId, type_id: SctId, term: &str) -> Description {
    Description {
        id,
        effective_time: 20020131,
        active: true,
        module_id: well_known::SNOMED_CT_CORE_MODULE,
        concept_id,
        language_code: "en".to_string(),
        type_id,
        term: term.to_string(),
        case_significance_id: 900000000000448009,
    }
}

fn is_a(id: SctId, source: SctId, destination: SctId) -> Relationship {
    Relationship {
        id,
        effective_time: 20020131,
        active: true,
        module_id: well_known::SNOMED_CT_CORE_MODULE,
        source_id: source,
        destination_id: destination,
        relationship_group: 0,
        type_id: well_known::IS_A,
        characteristic_type_id: CharacteristicType::INFERRED_ID,
        modifier_id: ModifierType::EXISTENTIAL_ID,
    }
}

fn preferred(guid: &str, description_id: SctId) -> RefsetItem {
    RefsetItem {
        id: guid.to_string(),
        effective_time: 20020131,
        active: true,
        module_id: well_known::SNOMED_CT_CORE_MODULE,
        refset_id: well_known::GB_ENGLISH_LANG_REFSET,
        referenced_component_id: description_id,
        body: Some(RefsetBody::Language(LanguageRefset {
            acceptability_id: Acceptability::PREFERRED_ID,
        })),
    }
}

fn open_svc(dir: &tempfile::TempDir) -> Arc<TerminologySvc> {
    let svc = TerminologySvc::open(
        dir.path(),
        false,
        SvcOptions {
            index_read_only: false,
            ..SvcOptions::default()
        },
    )
    .unwrap();

    let store = svc.store();
    store
        .put_concepts(&[
            concept(ROOT),
            concept(CLINICAL_FINDING),
            concept(HEART_DISEASE),
            concept(ICD10_MAP),
        ])
        .unwrap();
    store
        .put_descriptions(&[
            description(102, ROOT, DescriptionType::SYNONYM_ID, "SNOMED CT Concept"),
            description(103, ROOT, DescriptionType::FSN_ID, "SNOMED CT Concept (SNOMED RT+CTV3)"),
            description(202, CLINICAL_FINDING, DescriptionType::SYNONYM_ID, "Clinical finding"),
            description(203, CLINICAL_FINDING, DescriptionType::FSN_ID, "Clinical finding (finding)"),
            description(301, HEART_DISEASE, DescriptionType::FSN_ID, "Heart disease (disorder)"),
            description(302, HEART_DISEASE, DescriptionType::SYNONYM_ID, "Heart disease"),
        ])
        .unwrap();
    store
        .put_relationships(&[
            is_a(5001, CLINICAL_FINDING, ROOT),
            is_a(5002, HEART_DISEASE, CLINICAL_FINDING),
        ])
        .unwrap();
    store
        .put_refset_items(&[
            preferred("lang-302", 302),
            preferred("lang-301", 301),
            RefsetItem {
                id: "map-1".to_string(),
                effective_time: 20020131,
                active: true,
                module_id: well_known::SNOMED_CT_CORE_MODULE,
                refset_id: ICD10_MAP,
                referenced_component_id: HEART_DISEASE,
                body: Some(RefsetBody::SimpleMap(SimpleMapRefset {
                    map_target: "I51.9".to_string(),
                })),
            },
        ])
        .unwrap();

    svc.build_index().unwrap();
    Arc::new(svc)
}

async fn get_json(
    router: axum::Router,
    uri: &str,
) -> (StatusCode, serde_json::Value) {
    let response = router
        .oneshot(
            Request::builder()
                .uri(uri)
                .header("Accept-Language", "en-GB")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_get_concept() {
    let dir = tempfile::tempdir().unwrap();
    let router = sct_server::http::router(open_svc(&dir));

    let (status, body) = get_json(router, "/concept/56265001").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 56265001);
    assert_eq!(body["preferredDescription"]["term"], "Heart disease");
    assert_eq!(body["preferredFsn"]["term"], "Heart disease (disorder)");
    let is_a: Vec<i64> = body["isA"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_i64().unwrap())
        .collect();
    assert!(is_a.contains(&ROOT));
    assert!(is_a.contains(&CLINICAL_FINDING));
    // The FSN is filtered from the description list by default.
    assert!(body["descriptions"]
        .as_array()
        .unwrap()
        .iter()
        .all(|d| d["typeId"] != DescriptionType::FSN_ID));
}

#[tokio::test]
async fn test_get_concept_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let router = sct_server::http::router(open_svc(&dir));

    let (status, _) = get_json(router, "/concept/999999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_crossmap() {
    let dir = tempfile::tempdir().unwrap();
    let router = sct_server::http::router(open_svc(&dir));

    let (status, body) = get_json(
        router.clone(),
        "/concept/56265001/crossmap?refset=447562003",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["simpleMap"]["mapTarget"], "I51.9");

    let (status, _) = get_json(router.clone(), "/concept/404684003/crossmap?refset=447562003").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get_json(router, "/concept/56265001/crossmap").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_genericize() {
    let dir = tempfile::tempdir().unwrap();
    let router = sct_server::http::router(open_svc(&dir));

    let (status, body) = get_json(
        router.clone(),
        "/concept/56265001/genericize?root=404684003",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], CLINICAL_FINDING);

    let (status, _) = get_json(router.clone(), "/concept/56265001/genericize?root=999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get_json(router, "/concept/56265001/genericize").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search() {
    let dir = tempfile::tempdir().unwrap();
    let router = sct_server::http::router(open_svc(&dir));

    let (status, body) = get_json(router.clone(), "/search?s=heart&maxHits=10").await;
    assert_eq!(status, StatusCode::OK);
    let hits = body.as_array().unwrap();
    assert!(hits
        .iter()
        .any(|hit| hit["conceptId"] == HEART_DISEASE && hit["preferredTerm"] == "Heart disease"));

    // Misspelling only matches through the fuzzy fallback.
    let (_, strict) = get_json(router.clone(), "/search?s=diseese&fallbackFuzzy=false").await;
    assert!(strict.as_array().unwrap().is_empty());
    let (_, relaxed) = get_json(router.clone(), "/search?s=diseese").await;
    assert!(!relaxed.as_array().unwrap().is_empty());

    let (status, _) = get_json(router, "/search").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_synonyms() {
    let dir = tempfile::tempdir().unwrap();
    let router = sct_server::http::router(open_svc(&dir));

    let (status, body) = get_json(router, "/synonyms?s=heart").await;
    assert_eq!(status, StatusCode::OK);
    let terms: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert!(terms.contains(&"Heart disease"));
}
