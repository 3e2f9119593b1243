//! Search request → tantivy query compilation.

use tantivy::query::{BooleanQuery, FuzzyTermQuery, Occur, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption};
use tantivy::Term;

use crate::index::{fsn_type_id, Fields};
use crate::request::SearchRequest;

const FUZZY_DISTANCE: u8 = 2;
const MIN_PREFIX_LEN: usize = 3;

fn term_query(field: Field, text: &str) -> Box<dyn Query> {
    Box::new(TermQuery::new(
        Term::from_field_text(field, text),
        IndexRecordOption::Basic,
    ))
}

fn prefix_query(field: Field, text: &str) -> Box<dyn Query> {
    // A zero-distance fuzzy term with prefix semantics is a prefix query.
    Box::new(FuzzyTermQuery::new_prefix(
        Term::from_field_text(field, text),
        0,
        true,
    ))
}

fn fuzzy_query(field: Field, text: &str) -> Box<dyn Query> {
    Box::new(FuzzyTermQuery::new(
        Term::from_field_text(field, text),
        FUZZY_DISTANCE,
        true,
    ))
}

/// Disjunction of term queries over `field`, one per id.
fn any_of(field: Field, ids: &[i64]) -> Box<dyn Query> {
    let clauses: Vec<(Occur, Box<dyn Query>)> = ids
        .iter()
        .map(|id| (Occur::Should, term_query(field, &id.to_string())))
        .collect();
    Box::new(BooleanQuery::new(clauses))
}

/// Compiles a search request into a boolean query.
///
/// Each analysed token becomes a MUST clause: a prefix match for tokens of
/// three or more characters (ORed with an edit-distance-2 fuzzy match when
/// `fuzzy` is set), an exact term match for shorter tokens. FSN descriptions
/// are always excluded, and the structural filters (refsets, active flags,
/// recursive and direct parents) are conjoined.
pub(crate) fn compile_query(
    fields: &Fields,
    request: &SearchRequest,
    tokens: &[String],
    fuzzy: bool,
) -> BooleanQuery {
    let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();

    for token in tokens {
        if token.chars().count() >= MIN_PREFIX_LEN {
            if fuzzy {
                let either = BooleanQuery::new(vec![
                    (Occur::Should, prefix_query(fields.term, token)),
                    (Occur::Should, fuzzy_query(fields.term, token)),
                ]);
                clauses.push((Occur::Must, Box::new(either)));
            } else {
                clauses.push((Occur::Must, prefix_query(fields.term, token)));
            }
        } else {
            clauses.push((Occur::Must, term_query(fields.term, token)));
        }
    }

    clauses.push((
        Occur::MustNot,
        term_query(fields.description_type, &fsn_type_id()),
    ));

    for refset in &request.refsets {
        clauses.push((
            Occur::Must,
            term_query(fields.concept_refset_ids, &refset.to_string()),
        ));
    }

    if !request.include_inactive {
        clauses.push((Occur::Must, term_query(fields.concept_active, "T")));
        clauses.push((Occur::Must, term_query(fields.description_active, "T")));
    }

    clauses.push((
        Occur::Must,
        any_of(
            fields.recursive_parent_ids,
            &request.effective_recursive_parents(),
        ),
    ));

    if !request.direct_parents.is_empty() {
        clauses.push((
            Occur::Must,
            any_of(fields.direct_parent_ids, &request.direct_parents),
        ));
    }

    BooleanQuery::new(clauses)
}
