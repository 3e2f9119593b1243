//! gRPC server implementation.

use std::sync::Arc;

use sct_search::{FuzzyMode, SearchRequest};
use sct_terminology::{Subsumption, TerminologyError, TerminologySvc, TranslateOutcome};
use sct_types::refset::RefsetBody;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Request, Response, Status};
use unic_langid::LanguageIdentifier;

use crate::proto;
use crate::proto::snomed_ct_server::SnomedCt;

/// The terminology gRPC server.
#[derive(Clone)]
pub struct TerminologyServer {
    svc: Arc<TerminologySvc>,
}

impl TerminologyServer {
    /// Creates a new server over the given service.
    pub fn new(svc: Arc<TerminologySvc>) -> Self {
        Self { svc }
    }

    /// Returns the underlying terminology service.
    pub fn svc(&self) -> &TerminologySvc {
        &self.svc
    }

    /// Locale preferences for a request, falling back to the service
    /// default when the caller sent none (or only unparseable tags).
    fn language_tags(&self, accepted: &[String]) -> Vec<LanguageIdentifier> {
        let tags: Vec<LanguageIdentifier> = accepted
            .iter()
            .filter_map(|tag| tag.parse().ok())
            .collect();
        if tags.is_empty() {
            vec![self.svc.default_language().clone()]
        } else {
            tags
        }
    }
}

/// Maps semantic-layer errors onto RPC status codes.
pub(crate) fn status_from(error: TerminologyError) -> Status {
    match error {
        TerminologyError::ConceptNotFound { .. }
        | TerminologyError::NoTranslation { .. }
        | TerminologyError::RootNotOnPath { .. } => Status::not_found(error.to_string()),
        other => Status::internal(other.to_string()),
    }
}

pub(crate) fn concept_to_proto(concept: &sct_types::Concept) -> proto::Concept {
    proto::Concept {
        id: concept.id,
        effective_time: concept.effective_time,
        active: concept.active,
        module_id: concept.module_id,
        definition_status_id: concept.definition_status_id,
    }
}

pub(crate) fn description_to_proto(description: &sct_types::Description) -> proto::Description {
    proto::Description {
        id: description.id,
        effective_time: description.effective_time,
        active: description.active,
        module_id: description.module_id,
        concept_id: description.concept_id,
        language_code: description.language_code.clone(),
        type_id: description.type_id,
        term: description.term.clone(),
        case_significance_id: description.case_significance_id,
    }
}

pub(crate) fn relationship_to_proto(relationship: &sct_types::Relationship) -> proto::Relationship {
    proto::Relationship {
        id: relationship.id,
        effective_time: relationship.effective_time,
        active: relationship.active,
        module_id: relationship.module_id,
        source_id: relationship.source_id,
        destination_id: relationship.destination_id,
        relationship_group: relationship.relationship_group,
        type_id: relationship.type_id,
        characteristic_type_id: relationship.characteristic_type_id,
        modifier_id: relationship.modifier_id,
    }
}

pub(crate) fn refset_item_to_proto(item: &sct_types::RefsetItem) -> proto::RefsetItem {
    use proto::refset_item::Body;

    let body = item.body.as_ref().map(|body| match body {
        RefsetBody::Simple(_) => Body::Simple(proto::SimpleRefset {}),
        RefsetBody::SimpleMap(map) => Body::SimpleMap(proto::SimpleMapRefset {
            map_target: map.map_target.clone(),
        }),
        RefsetBody::ComplexMap(map) => Body::ComplexMap(proto::ComplexMapRefset {
            map_group: map.map_group,
            map_priority: map.map_priority,
            map_rule: map.map_rule.clone(),
            map_advice: map.map_advice.clone(),
            map_target: map.map_target.clone(),
            correlation: map.correlation,
            map_category: map.map_category,
            map_block: map.map_block,
        }),
        RefsetBody::Language(language) => Body::Language(proto::LanguageRefset {
            acceptability_id: language.acceptability_id,
        }),
        RefsetBody::AttributeValue(value) => Body::AttributeValue(proto::AttributeValueRefset {
            value_id: value.value_id,
        }),
        RefsetBody::Association(association) => Body::Association(proto::AssociationRefset {
            target_component_id: association.target_component_id,
        }),
        RefsetBody::RefsetDescriptor(descriptor) => {
            Body::RefsetDescriptor(proto::RefsetDescriptorRefset {
                attribute_description_id: descriptor.attribute_description_id,
                attribute_type_id: descriptor.attribute_type_id,
                attribute_order: descriptor.attribute_order,
            })
        }
    });

    proto::RefsetItem {
        id: item.id.clone(),
        effective_time: item.effective_time,
        active: item.active,
        module_id: item.module_id,
        refset_id: item.refset_id,
        referenced_component_id: item.referenced_component_id,
        body,
    }
}

#[tonic::async_trait]
impl SnomedCt for TerminologyServer {
    async fn get_concept(
        &self,
        request: Request<proto::SctId>,
    ) -> Result<Response<proto::Concept>, Status> {
        let id = request.into_inner().identifier;
        let concept = self.svc.require_concept(id).map_err(status_from)?;
        Ok(Response::new(concept_to_proto(&concept)))
    }

    async fn get_extended_concept(
        &self,
        request: Request<proto::SctId>,
    ) -> Result<Response<proto::ExtendedConcept>, Status> {
        let id = request.into_inner().identifier;
        let svc = &self.svc;

        let concept = svc.require_concept(id).map_err(status_from)?;
        let relationships = svc.get_parent_relationships(id).map_err(status_from)?;
        let recursive_parent_ids = svc.get_all_parent_ids(id).map_err(status_from)?;
        let direct_parent_ids = svc.get_parent_ids(id).map_err(status_from)?;
        let concept_refset_ids = svc.get_reference_sets(id).map_err(status_from)?;
        let tags = vec![svc.default_language().clone()];
        let preferred = svc
            .must_get_preferred_synonym(id, &tags)
            .map_err(status_from)?;

        Ok(Response::new(proto::ExtendedConcept {
            concept: Some(concept_to_proto(&concept)),
            relationships: relationships.iter().map(relationship_to_proto).collect(),
            recursive_parent_ids,
            direct_parent_ids,
            concept_refset_ids,
            preferred_description: Some(description_to_proto(&preferred)),
        }))
    }

    type GetDescriptionsStream = ReceiverStream<Result<proto::Description, Status>>;

    async fn get_descriptions(
        &self,
        request: Request<proto::SctId>,
    ) -> Result<Response<Self::GetDescriptionsStream>, Status> {
        let id = request.into_inner().identifier;
        self.svc.require_concept(id).map_err(status_from)?;
        let descriptions = self.svc.get_descriptions(id).map_err(status_from)?;

        let (tx, rx) = tokio::sync::mpsc::channel(16);
        tokio::spawn(async move {
            for description in &descriptions {
                if tx.send(Ok(description_to_proto(description))).await.is_err() {
                    // Caller went away; abandon the stream.
                    break;
                }
            }
        });
        Ok(Response::new(ReceiverStream::new(rx)))
    }

    async fn translate(
        &self,
        request: Request<proto::TranslateRequest>,
    ) -> Result<Response<proto::TranslateResponse>, Status> {
        let request = request.into_inner();
        let outcome = self
            .svc
            .translate(request.concept_id, request.target_id)
            .map_err(status_from)?;

        let result = match outcome {
            TranslateOutcome::Concept(concept) => {
                proto::translate_response::Result::Concept(concept_to_proto(&concept))
            }
            TranslateOutcome::RefsetItem(item) => {
                proto::translate_response::Result::RefsetItem(refset_item_to_proto(&item))
            }
        };
        Ok(Response::new(proto::TranslateResponse {
            result: Some(result),
        }))
    }

    async fn subsumes(
        &self,
        request: Request<proto::SubsumptionRequest>,
    ) -> Result<Response<proto::SubsumptionResponse>, Status> {
        use proto::subsumption_response::Result as SubsumptionResult;

        let request = request.into_inner();
        let outcome = self
            .svc
            .subsumes(request.code_a, request.code_b)
            .map_err(status_from)?;

        let result = match outcome {
            Subsumption::Equivalent => SubsumptionResult::Equivalent,
            Subsumption::Subsumes => SubsumptionResult::Subsumes,
            Subsumption::SubsumedBy => SubsumptionResult::SubsumedBy,
            Subsumption::NotSubsumed => SubsumptionResult::NotSubsumed,
        };
        Ok(Response::new(proto::SubsumptionResponse {
            result: result as i32,
        }))
    }

    async fn search(
        &self,
        request: Request<proto::SearchRequest>,
    ) -> Result<Response<proto::SearchResponse>, Status> {
        use proto::search_request::Fuzzy;

        let request = request.into_inner();
        let fuzzy = match request.fuzzy() {
            Fuzzy::FallbackFuzzy => FuzzyMode::Fallback,
            Fuzzy::NoFuzzy => FuzzyMode::Never,
            Fuzzy::AlwaysFuzzy => FuzzyMode::Always,
        };
        let tags = self.language_tags(&request.accepted_languages);

        let search = SearchRequest {
            search: request.search,
            recursive_parents: request.recursive_parent_ids,
            direct_parents: request.direct_parent_ids,
            refsets: request.refset_ids,
            limit: request.maximum_hits.max(0) as usize,
            include_inactive: request.include_inactive,
            fuzzy,
        };

        let hits = self.svc.search(&search).map_err(status_from)?;
        let mut items = Vec::with_capacity(hits.len());
        for (concept_id, description_id) in hits {
            let description = self
                .svc
                .get_description(description_id)
                .map_err(status_from)?
                .ok_or_else(|| Status::internal("search hit lost its description"))?;
            let preferred = self
                .svc
                .must_get_preferred_synonym(concept_id, &tags)
                .map_err(status_from)?;
            items.push(proto::search_response::Item {
                term: description.term,
                concept_id,
                preferred_term: preferred.term,
            });
        }
        Ok(Response::new(proto::SearchResponse { items }))
    }
}
