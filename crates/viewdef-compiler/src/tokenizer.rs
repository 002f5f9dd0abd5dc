//! Predicate tokenizer - splits join criteria text into comparisons
//!
//! The scan is left to right and flat: each step ends the current segment at
//! whichever of ` OR ` / ` AND ` occurs first. Parentheses, nesting and
//! string literals are not understood, so `A.x = B.y AND (A.z = B.w OR ...)`
//! or a literal containing ` AND ` is split in the wrong place. Stored view
//! text depends on this exact behavior; keep it.

use viewdef_model::{Combiner, ComparisonOperator, CriteriaPredicate, LEFT_ALIAS, RIGHT_ALIAS};

const OR_MARKER: &str = " OR ";
const AND_MARKER: &str = " AND ";

/// Split `criteria` into predicates in input order.
///
/// Segments that cannot be fully understood come back as incomplete
/// predicates (see [`CriteriaPredicate::is_complete`]); callers decide
/// whether to drop them.
pub fn tokenize_predicates(criteria: &str) -> Vec<CriteriaPredicate> {
    let mut predicates = Vec::new();
    let mut rest = criteria;

    while !rest.trim().is_empty() {
        let or_index = rest.find(OR_MARKER);
        let and_index = rest.find(AND_MARKER);

        let split = match (or_index, and_index) {
            (None, None) => None,
            (Some(or), None) => Some((or, OR_MARKER, Combiner::Or)),
            (None, Some(and)) => Some((and, AND_MARKER, Combiner::And)),
            (Some(or), Some(and)) if or < and => Some((or, OR_MARKER, Combiner::Or)),
            (Some(_), Some(and)) => Some((and, AND_MARKER, Combiner::And)),
        };

        match split {
            Some((index, marker, combiner)) => {
                predicates.push(parse_predicate(&rest[..index], combiner));
                rest = &rest[index + marker.len()..];
            }
            None => {
                predicates.push(parse_predicate(rest, Combiner::And));
                rest = "";
            }
        }
    }

    predicates
}

/// Parse one `A.<col> <op> B.<col>` segment.
///
/// Operators are tried in [`ComparisonOperator::ALL`] order and must be
/// surrounded by single spaces to be detected.
fn parse_predicate(segment: &str, combiner: Combiner) -> CriteriaPredicate {
    let mut predicate = CriteriaPredicate {
        combiner,
        ..Default::default()
    };

    let Some(operator) = ComparisonOperator::ALL
        .into_iter()
        .find(|op| segment.contains(&format!(" {} ", op.symbol())))
    else {
        return predicate;
    };
    predicate.operator = Some(operator);

    for side in segment.split(operator.symbol()) {
        let side = side.trim();
        if let Some(column) = strip_alias(side, LEFT_ALIAS) {
            predicate.left_column = Some(column.to_string());
        } else if let Some(column) = strip_alias(side, RIGHT_ALIAS) {
            predicate.right_column = Some(column.to_string());
        }
    }

    predicate
}

/// `A.col` -> `col` for the given alias
fn strip_alias<'a>(text: &'a str, alias: &str) -> Option<&'a str> {
    text.strip_prefix(alias)
        .and_then(|rest| rest.strip_prefix('.'))
        .filter(|column| !column.is_empty())
}
