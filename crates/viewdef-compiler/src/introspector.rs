//! View SQL introspector - reads view SQL back into a [`ViewSpec`]
//!
//! Extraction is substring-driven and keyed on the generator's own output
//! conventions (`AS A`, `AS B ON`, the four join phrases). Anything it cannot
//! attribute is dropped and shows up as `editable == false`; it never fails.

use tracing::debug;
use viewdef_model::{
    ColumnRef, IntrospectionResult, JoinCriteria, JoinType, TableColumns, TableRef, ViewSpec,
    LEFT_ALIAS, RIGHT_ALIAS,
};

use crate::generator::ROW_NUMBER_PREFIX;
use crate::tokenizer::tokenize_predicates;

const CREATE_VIEW: &str = "CREATE VIEW";
const AS: &str = "AS";
const SELECT: &str = "SELECT";
const FROM: &str = "FROM ";
const JOIN: &str = "JOIN ";
const LEFT_AS: &str = "AS A";
const RIGHT_AS: &str = "AS B";
const CRITERIA_MARKER: &str = "AS B ON";

/// Recover as much of a view's structure as the text allows.
///
/// Accepts either a bare `SELECT` body or a full `CREATE VIEW ... AS SELECT
/// ...;` statement.
pub fn introspect(raw_ddl: &str) -> IntrospectionResult {
    let text = normalize(raw_ddl);
    let (view_name, body) = split_header(text);

    let columns = projected_columns(body);
    let from_clause = body.find(FROM).map(|i| &body[i + FROM.len()..]).unwrap_or("");

    let spec = if has_join(from_clause) {
        join_spec(view_name, body, from_clause, &columns)
    } else {
        single_spec(view_name, from_clause, columns)
    };

    let result = IntrospectionResult::new(spec, raw_ddl);
    if !result.editable() {
        debug!(
            tables = result.spec().tables.len(),
            attributed = result.spec().projected_columns.len(),
            has_join = result.spec().join.is_some(),
            "view SQL is not editable"
        );
    }
    result
}

/// Trim whitespace and one terminating `;`
fn normalize(raw: &str) -> &str {
    let text = raw.trim();
    text.strip_suffix(';').map(str::trim_end).unwrap_or(text)
}

/// Split a `CREATE VIEW <name> (<definitions>) AS` header from the query.
///
/// The returned body starts at the query so that column names in the
/// definition list are never scanned as keywords.
fn split_header(text: &str) -> (String, &str) {
    let Some(rest) = text.strip_prefix(CREATE_VIEW) else {
        return (String::new(), text);
    };
    let rest = rest.trim_start();
    let end = rest
        .find(|c: char| c.is_whitespace() || c == '(')
        .unwrap_or(rest.len());
    let name = rest[..end].to_string();

    let mut body = rest[end..].trim_start();
    if body.starts_with('(') {
        body = skip_parenthesized(body);
    }
    let body = body.trim_start();
    let body = body
        .strip_prefix(AS)
        .filter(|query| query.starts_with(char::is_whitespace))
        .unwrap_or(body);
    (name, body)
}

/// Text after the group opened by the leading `(`; empty when unbalanced
fn skip_parenthesized(text: &str) -> &str {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return &text[i + 1..];
                }
            }
            _ => {}
        }
    }
    ""
}

/// Column texts between the first `SELECT` and the first `FROM `, minus the
/// synthesized row-number key
fn projected_columns(body: &str) -> Vec<String> {
    let (Some(select), Some(from)) = (body.find(SELECT), body.find(FROM)) else {
        return Vec::new();
    };
    let start = select + SELECT.len();
    if from <= start {
        return Vec::new();
    }

    body[start..from]
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty() && !c.starts_with(ROW_NUMBER_PREFIX))
        .map(str::to_string)
        .collect()
}

fn has_join(text: &str) -> bool {
    JoinType::ALL.iter().any(|jt| text.contains(jt.keyword()))
}

fn detect_join_type(text: &str) -> Option<JoinType> {
    JoinType::ALL.into_iter().find(|jt| text.contains(jt.keyword()))
}

fn single_spec(view_name: String, from_clause: &str, columns: Vec<String>) -> ViewSpec {
    let table_name = from_clause.trim();
    if table_name.is_empty() {
        return ViewSpec {
            view_name,
            ..Default::default()
        };
    }

    let table = TableRef::new(table_name);
    let columns: Vec<ColumnRef> = columns.into_iter().map(ColumnRef::new).collect();
    let projected_columns = if columns.is_empty() {
        Vec::new()
    } else {
        vec![TableColumns {
            table: table.clone(),
            columns,
        }]
    };

    ViewSpec {
        view_name,
        tables: vec![table],
        projected_columns,
        join: None,
    }
}

fn join_spec(view_name: String, body: &str, from_clause: &str, columns: &[String]) -> ViewSpec {
    let left_name = from_clause
        .find(LEFT_AS)
        .map(|end| from_clause[..end].trim())
        .filter(|name| !name.is_empty());

    let right_name = match (from_clause.find(JOIN), from_clause.find(RIGHT_AS)) {
        (Some(start), Some(end)) if end >= start + JOIN.len() => {
            Some(from_clause[start + JOIN.len()..end].trim()).filter(|name| !name.is_empty())
        }
        _ => None,
    };

    let join = join_criteria(body);

    let (Some(left_name), Some(right_name)) = (left_name, right_name) else {
        debug!(?left_name, ?right_name, "join tables could not be resolved");
        return ViewSpec {
            view_name,
            join,
            ..Default::default()
        };
    };

    let left = TableRef::left(left_name);
    let right = TableRef::right(right_name);

    let mut projected_columns = Vec::new();
    for (table, alias) in [(&left, LEFT_ALIAS), (&right, RIGHT_ALIAS)] {
        let prefix = format!("{}.", alias);
        let attributed: Vec<ColumnRef> = columns
            .iter()
            .filter_map(|c| c.strip_prefix(prefix.as_str()))
            .map(|name| ColumnRef::aliased(name, alias))
            .collect();
        if !attributed.is_empty() {
            projected_columns.push(TableColumns {
                table: table.clone(),
                columns: attributed,
            });
        }
    }

    ViewSpec {
        view_name,
        tables: vec![left, right],
        projected_columns,
        join,
    }
}

/// Join type plus the complete predicates after `AS B ON`.
///
/// Partially understood predicates are dropped; `None` when none remain.
fn join_criteria(body: &str) -> Option<JoinCriteria> {
    let join_type = detect_join_type(body)?;
    let criteria = body
        .find(CRITERIA_MARKER)
        .map(|i| &body[i + CRITERIA_MARKER.len()..])
        .unwrap_or("");

    let tokenized = tokenize_predicates(criteria);
    let found = tokenized.len();
    let predicates: Vec<_> = tokenized.into_iter().filter(|p| p.is_complete()).collect();
    if predicates.len() < found {
        debug!(criteria, dropped = found - predicates.len(), "incomplete predicates dropped");
    }
    if predicates.is_empty() {
        return None;
    }

    Some(JoinCriteria {
        join_type,
        predicates,
    })
}
