//! End-to-end tests over a minimal in-temp-dir release: SNOMED root →
//! Clinical finding → Heart disease → Myocardial infarction, with
//! descriptions, language refset entries and an ICD-10 map.

use std::collections::HashSet;

use sct_store::EntityStore;
use sct_terminology::{
    parse_accept_language, FuzzyMode, SearchRequest, Subsumption, SvcOptions, TerminologyError,
    TerminologySvc, TranslateOutcome,
};
use sct_types::refset::{LanguageRefset, RefsetBody, RefsetItem, SimpleMapRefset, SimpleRefset};
use sct_types::{
    well_known, Acceptability, CharacteristicType, Concept, Description, DescriptionType,
    ModifierType, Relationship, SctId,
};

const ROOT: SctId = well_known::SNOMED_CT_ROOT;
const CLINICAL_FINDING: SctId = well_known::CLINICAL_FINDING;
const HEART_DISEASE: SctId = 56265001;
const MYOCARDIAL_INFARCTION: SctId = 22298006;
const BODY_STRUCTURE: SctId = well_known::BODY_STRUCTURE;
const ICD10_MAP: SctId = 447562003;
const FINDINGS_REFSET: SctId = 723264001;

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

fn relationship(id: SctId, source: SctId, destination: SctId) -> Relationship {
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

fn preferred_language_entry(guid: &str, description_id: SctId) -> RefsetItem {
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

fn load_minimal_release(store: &EntityStore) {
    store
        .put_concepts(&[
            concept(ROOT),
            concept(CLINICAL_FINDING),
            concept(HEART_DISEASE),
            concept(MYOCARDIAL_INFARCTION),
            concept(BODY_STRUCTURE),
            concept(ICD10_MAP),
            concept(FINDINGS_REFSET),
        ])
        .unwrap();

    store
        .put_descriptions(&[
            description(101, ROOT, DescriptionType::FSN_ID, "SNOMED CT Concept (SNOMED RT+CTV3)"),
            description(102, ROOT, DescriptionType::SYNONYM_ID, "SNOMED CT Concept"),
            description(201, CLINICAL_FINDING, DescriptionType::FSN_ID, "Clinical finding (finding)"),
            description(202, CLINICAL_FINDING, DescriptionType::SYNONYM_ID, "Clinical finding"),
            description(301, HEART_DISEASE, DescriptionType::FSN_ID, "Heart disease (disorder)"),
            description(302, HEART_DISEASE, DescriptionType::SYNONYM_ID, "Heart disease"),
            Description {
                active: false,
                ..description(303, HEART_DISEASE, DescriptionType::SYNONYM_ID, "Old term")
            },
            description(401, MYOCARDIAL_INFARCTION, DescriptionType::FSN_ID, "Myocardial infarction (disorder)"),
            description(402, MYOCARDIAL_INFARCTION, DescriptionType::SYNONYM_ID, "Myocardial infarction"),
            description(501, ICD10_MAP, DescriptionType::SYNONYM_ID, "ICD-10 complex and map reference set"),
            description(601, FINDINGS_REFSET, DescriptionType::SYNONYM_ID, "Findings reference set"),
        ])
        .unwrap();

    store
        .put_relationships(&[
            relationship(5001, CLINICAL_FINDING, ROOT),
            relationship(5002, HEART_DISEASE, CLINICAL_FINDING),
            // Releases contain duplicates; queries must deduplicate.
            relationship(5003, HEART_DISEASE, CLINICAL_FINDING),
            relationship(5004, MYOCARDIAL_INFARCTION, HEART_DISEASE),
            relationship(5005, BODY_STRUCTURE, ROOT),
            Relationship {
                active: false,
                ..relationship(5006, HEART_DISEASE, BODY_STRUCTURE)
            },
        ])
        .unwrap();

    store
        .put_refset_items(&[
            preferred_language_entry("lang-102", 102),
            preferred_language_entry("lang-201", 201),
            preferred_language_entry("lang-202", 202),
            preferred_language_entry("lang-301", 301),
            preferred_language_entry("lang-302", 302),
            // 22298006 deliberately has no language refset entries so the
            // fallback language matcher is exercised.
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
            RefsetItem {
                id: "simple-1".to_string(),
                effective_time: 20020131,
                active: true,
                module_id: well_known::SNOMED_CT_CORE_MODULE,
                refset_id: FINDINGS_REFSET,
                referenced_component_id: CLINICAL_FINDING,
                body: Some(RefsetBody::Simple(SimpleRefset {})),
            },
        ])
        .unwrap();
}

fn open_svc(dir: &tempfile::TempDir) -> TerminologySvc {
    let svc = TerminologySvc::open(
        dir.path(),
        false,
        SvcOptions {
            index_read_only: false,
            ..SvcOptions::default()
        },
    )
    .unwrap();
    load_minimal_release(svc.store());
    svc
}

#[test]
fn test_subsumption() {
    let dir = tempfile::tempdir().unwrap();
    let svc = open_svc(&dir);

    assert_eq!(
        svc.subsumes(CLINICAL_FINDING, HEART_DISEASE).unwrap(),
        Subsumption::Subsumes
    );
    assert_eq!(
        svc.subsumes(HEART_DISEASE, CLINICAL_FINDING).unwrap(),
        Subsumption::SubsumedBy
    );
    assert_eq!(
        svc.subsumes(HEART_DISEASE, HEART_DISEASE).unwrap(),
        Subsumption::Equivalent
    );
    assert_eq!(
        svc.subsumes(HEART_DISEASE, BODY_STRUCTURE).unwrap(),
        Subsumption::NotSubsumed
    );
}

#[test]
fn test_hierarchy_walks() {
    let dir = tempfile::tempdir().unwrap();
    let svc = open_svc(&dir);

    // Duplicate relationships are collapsed.
    assert_eq!(
        svc.get_parent_ids(HEART_DISEASE).unwrap(),
        vec![CLINICAL_FINDING]
    );

    // Inactive relationships never participate in inference.
    let ancestors = svc.get_all_parent_ids(HEART_DISEASE).unwrap();
    assert_eq!(ancestors, vec![ROOT, CLINICAL_FINDING]);
    assert!(!ancestors.contains(&BODY_STRUCTURE));

    // No duplicates in the transitive set.
    let unique: HashSet<_> = ancestors.iter().collect();
    assert_eq!(unique.len(), ancestors.len());

    assert!(svc.is_a(HEART_DISEASE, HEART_DISEASE).unwrap());
    assert!(svc.is_a(MYOCARDIAL_INFARCTION, ROOT).unwrap());
    assert!(!svc.is_a(HEART_DISEASE, BODY_STRUCTURE).unwrap());

    let descendants = svc.get_all_children_ids(CLINICAL_FINDING).unwrap();
    assert_eq!(descendants, vec![MYOCARDIAL_INFARCTION, HEART_DISEASE]);

    let siblings = svc.get_sibling_ids(CLINICAL_FINDING).unwrap();
    assert_eq!(siblings, vec![BODY_STRUCTURE]);
}

#[test]
fn test_paths_to_root() {
    let dir = tempfile::tempdir().unwrap();
    let svc = open_svc(&dir);

    let paths = svc.paths_to_root(MYOCARDIAL_INFARCTION).unwrap();
    assert!(!paths.is_empty());
    for path in &paths {
        assert_eq!(path.first(), Some(&MYOCARDIAL_INFARCTION));
        assert_eq!(path.last(), Some(&ROOT));
        // Every concept on every path is an ancestor-or-self.
        for id in path {
            assert!(svc.is_a(MYOCARDIAL_INFARCTION, *id).unwrap());
        }
    }

    assert_eq!(
        svc.shortest_path_to_root(MYOCARDIAL_INFARCTION).unwrap(),
        vec![MYOCARDIAL_INFARCTION, HEART_DISEASE, CLINICAL_FINDING, ROOT]
    );
}

#[test]
fn test_genericise() {
    let dir = tempfile::tempdir().unwrap();
    let svc = open_svc(&dir);

    let targets: HashSet<SctId> = [CLINICAL_FINDING].into_iter().collect();
    assert_eq!(
        svc.genericise_to(HEART_DISEASE, &targets).unwrap(),
        Some(CLINICAL_FINDING)
    );

    // A concept already in the target set maps to itself.
    assert_eq!(
        svc.genericise_to(CLINICAL_FINDING, &targets).unwrap(),
        Some(CLINICAL_FINDING)
    );

    let unrelated: HashSet<SctId> = [999].into_iter().collect();
    assert_eq!(svc.genericise_to(HEART_DISEASE, &unrelated).unwrap(), None);

    // One step down from the root on the shortest path through it.
    assert_eq!(
        svc.genericise_to_root(MYOCARDIAL_INFARCTION, ROOT).unwrap(),
        CLINICAL_FINDING
    );
    assert!(matches!(
        svc.genericise_to_root(BODY_STRUCTURE, CLINICAL_FINDING),
        Err(TerminologyError::RootNotOnPath { .. })
    ));
}

#[test]
fn test_preferred_term_resolution() {
    let dir = tempfile::tempdir().unwrap();
    let svc = open_svc(&dir);
    let tags = parse_accept_language("en-GB");

    let synonym = svc
        .must_get_preferred_synonym(HEART_DISEASE, &tags)
        .unwrap();
    assert_eq!(synonym.term, "Heart disease");

    let fsn = svc
        .must_get_fully_specified_name(HEART_DISEASE, &tags)
        .unwrap();
    assert_eq!(fsn.term, "Heart disease (disorder)");

    // No language refset entries: the fallback matcher picks the synonym by
    // language code alone.
    let fallback = svc
        .must_get_preferred_synonym(MYOCARDIAL_INFARCTION, &tags)
        .unwrap();
    assert_eq!(fallback.term, "Myocardial infarction");

    // The refset concept has no FSN at all.
    assert!(svc
        .get_fully_specified_name(FINDINGS_REFSET, &tags)
        .unwrap()
        .is_none());
    assert!(matches!(
        svc.must_get_fully_specified_name(FINDINGS_REFSET, &tags),
        Err(TerminologyError::MissingPreferredDescription { .. })
    ));
}

#[test]
fn test_reference_set_consistency() {
    let dir = tempfile::tempdir().unwrap();
    let svc = open_svc(&dir);

    // Forward and reverse refset mappings agree.
    for refset_id in svc.get_all_reference_sets().unwrap() {
        for component in svc.get_reference_set_items(refset_id).unwrap() {
            assert!(svc
                .get_reference_sets(component)
                .unwrap()
                .contains(&refset_id));
        }
    }

    // The description reverse index resolves back to the owning concept.
    for description in svc.get_descriptions(HEART_DISEASE).unwrap() {
        let fetched = svc.get_description(description.id).unwrap().unwrap();
        assert_eq!(fetched.concept_id, HEART_DISEASE);
    }
}

#[test]
fn test_translate() {
    let dir = tempfile::tempdir().unwrap();
    let svc = open_svc(&dir);

    // Direct map membership returns the map item.
    match svc.translate(HEART_DISEASE, ICD10_MAP).unwrap() {
        TranslateOutcome::RefsetItem(item) => {
            assert_eq!(item.simple_map().unwrap().map_target, "I51.9");
        }
        other => panic!("expected refset item, got {other:?}"),
    }

    // Non-members generalise to the nearest member of the refset.
    match svc.translate(MYOCARDIAL_INFARCTION, FINDINGS_REFSET).unwrap() {
        TranslateOutcome::Concept(found) => assert_eq!(found.id, CLINICAL_FINDING),
        other => panic!("expected concept, got {other:?}"),
    }

    assert!(matches!(
        svc.translate(BODY_STRUCTURE, ICD10_MAP),
        Err(TerminologyError::NoTranslation { .. })
    ));
}

#[test]
fn test_statistics() {
    let dir = tempfile::tempdir().unwrap();
    let svc = open_svc(&dir);

    let stats = svc.statistics().unwrap();
    assert_eq!(stats.concepts, 7);
    assert_eq!(stats.descriptions, 11);
    assert_eq!(stats.relationships, 6);
    assert_eq!(stats.refset_items, 7);
    assert!(stats
        .refsets
        .iter()
        .any(|name| name.contains("Findings reference set")));
}

#[test]
fn test_precompute_then_search() {
    let dir = tempfile::tempdir().unwrap();
    let svc = open_svc(&dir);

    let indexed = svc.build_index().unwrap();
    assert_eq!(indexed, 11);

    // Plain prefix search resolves the synonym, never the FSN.
    let hits = svc.search(&SearchRequest::new("heart dis")).unwrap();
    assert!(hits.contains(&(HEART_DISEASE, 302)));
    assert!(hits.iter().all(|&(_, description_id)| description_id != 301));

    // Misspelled query only matches once fuzzy fallback kicks in.
    let strict = svc
        .search(&SearchRequest {
            fuzzy: FuzzyMode::Never,
            ..SearchRequest::new("heart diseese")
        })
        .unwrap();
    assert!(strict.is_empty());
    let relaxed = svc
        .search(&SearchRequest {
            fuzzy: FuzzyMode::Fallback,
            limit: 10,
            ..SearchRequest::new("heart diseese")
        })
        .unwrap();
    assert!(relaxed.iter().any(|&(concept_id, _)| concept_id == HEART_DISEASE));

    // Inactive descriptions only surface when asked for.
    assert!(svc.search(&SearchRequest::new("old term")).unwrap().is_empty());
    let inactive = svc
        .search(&SearchRequest {
            include_inactive: true,
            ..SearchRequest::new("old term")
        })
        .unwrap();
    assert!(inactive.iter().any(|&(concept_id, _)| concept_id == HEART_DISEASE));

    // Restricting to a refset keeps only its members' descriptions.
    let mapped = svc
        .search(&SearchRequest {
            refsets: vec![ICD10_MAP],
            ..SearchRequest::new("heart")
        })
        .unwrap();
    assert!(mapped.contains(&(HEART_DISEASE, 302)));
    let filtered = svc
        .search(&SearchRequest {
            refsets: vec![ICD10_MAP],
            ..SearchRequest::new("myocardial")
        })
        .unwrap();
    assert!(filtered.is_empty());
}

#[test]
fn test_export_stream() {
    use prost::Message;

    let dir = tempfile::tempdir().unwrap();
    let svc = open_svc(&dir);

    let mut out = Vec::new();
    let frames = svc.export(&mut out).unwrap();
    assert_eq!(frames, 11);

    // The stream decodes back into extended descriptions.
    let mut remaining = out.as_slice();
    let mut decoded = 0;
    while !remaining.is_empty() {
        let frame =
            sct_types::ExtendedDescription::decode_length_delimited(&mut remaining).unwrap();
        assert!(frame.concept.is_some());
        assert!(frame.description.is_some());
        decoded += 1;
    }
    assert_eq!(decoded, frames);
}
