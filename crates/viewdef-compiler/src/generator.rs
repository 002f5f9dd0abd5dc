//! View DDL generator - builds `CREATE VIEW` text from source tables
//!
//! Every generated view gets a leading `RowId` surrogate key computed with
//! `ROW_NUMBER() OVER (ORDER BY <key>)`, so the view is addressable by a
//! single column whether or not the source has a primary key. Two-table
//! views always alias the left table `A` and the right table `B`.

use thiserror::Error;
use viewdef_model::{
    ColumnRef, CriteriaPredicate, JoinType, SpecError, SourceTable, TableCatalog, ViewSpec,
    LEFT_ALIAS, RIGHT_ALIAS,
};

/// Name of the synthesized key column
pub const ROW_ID_COLUMN: &str = "RowId";

/// Prefix of the synthesized key expression in the projection list
pub const ROW_NUMBER_PREFIX: &str = "ROW_NUMBER()";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidSpecError {
    #[error("Missing source table: {0}")]
    MissingTable(String),

    #[error("Join {0} has no complete criteria predicates")]
    MissingJoinCriteria(JoinType),

    #[error("Malformed view spec: {0}")]
    Malformed(#[from] SpecError),
}

impl InvalidSpecError {
    /// Stable reason code for callers that report errors by code
    pub fn reason(&self) -> &'static str {
        match self {
            InvalidSpecError::MissingTable(_) => "MISSING_TABLE",
            InvalidSpecError::MissingJoinCriteria(_) => "MISSING_JOIN_CRITERIA",
            InvalidSpecError::Malformed(_) => "MALFORMED_SPEC",
        }
    }
}

fn require_table(table: &SourceTable) -> Result<(), InvalidSpecError> {
    if table.name.trim().is_empty() || table.columns.is_empty() {
        return Err(InvalidSpecError::MissingTable(table.name.clone()));
    }
    Ok(())
}

fn is_blank(name: &str) -> bool {
    name.trim().is_empty()
}

/// Requested column names, or every column of `table` when none are requested
fn selected_names(
    table: &SourceTable,
    columns: &[ColumnRef],
) -> Result<Vec<String>, InvalidSpecError> {
    if columns.iter().any(|c| is_blank(&c.name)) {
        return Err(SpecError::EmptyColumn.into());
    }
    if columns.is_empty() {
        Ok(table.columns.clone())
    } else {
        Ok(columns.iter().map(|c| c.name.clone()).collect())
    }
}

/// Every predicate must name both columns and an operator
fn check_predicates(
    join_type: JoinType,
    predicates: &[CriteriaPredicate],
) -> Result<(), InvalidSpecError> {
    if predicates.is_empty() || predicates.iter().any(|p| !p.is_complete()) {
        return Err(InvalidSpecError::MissingJoinCriteria(join_type));
    }
    let blank_side = predicates.iter().any(|p| {
        [&p.left_column, &p.right_column]
            .into_iter()
            .flatten()
            .any(|c| is_blank(c.as_str()))
    });
    if blank_side {
        return Err(SpecError::EmptyColumn.into());
    }
    Ok(())
}

/// Primary key when projected, otherwise the first projected column
fn order_key<'a>(table: &'a SourceTable, names: &'a [String]) -> &'a str {
    table
        .primary_key
        .as_deref()
        .filter(|pk| names.iter().any(|n| n == pk))
        .unwrap_or_else(|| names[0].as_str())
}

/// `CREATE VIEW <v> (RowId, <cols>) AS SELECT ROW_NUMBER() OVER (...), <cols> FROM <table>;`
///
/// An empty `columns` slice selects every column of `table`.
pub fn generate_single_table_view(
    view_name: &str,
    table: &SourceTable,
    columns: &[ColumnRef],
) -> Result<String, InvalidSpecError> {
    require_table(table)?;

    let names = selected_names(table, columns)?;
    let key = order_key(table, &names);

    Ok(format!(
        "CREATE VIEW {} ({}, {}) AS SELECT {} OVER (ORDER BY {}), {} FROM {};",
        view_name,
        ROW_ID_COLUMN,
        names.join(", "),
        ROW_NUMBER_PREFIX,
        key,
        names.join(", "),
        table.name,
    ))
}

/// Two-table form: `... FROM <left> AS A <JOIN> <right> AS B ON A.x = B.y ...;`
///
/// Right-hand columns whose bare name matches a left-hand column are dropped
/// from the projection; the left table wins.
pub fn generate_join_view(
    view_name: &str,
    left: &SourceTable,
    left_columns: &[ColumnRef],
    right: &SourceTable,
    right_columns: &[ColumnRef],
    join_type: JoinType,
    predicates: &[CriteriaPredicate],
) -> Result<String, InvalidSpecError> {
    require_table(left)?;
    require_table(right)?;

    check_predicates(join_type, predicates)?;

    let left_names = selected_names(left, left_columns)?;
    let right_names: Vec<String> = selected_names(right, right_columns)?
        .into_iter()
        .filter(|n| !left_names.contains(n))
        .collect();

    let key = order_key(left, &left_names);

    let definitions: Vec<&str> = std::iter::once(ROW_ID_COLUMN)
        .chain(left_names.iter().map(String::as_str))
        .chain(right_names.iter().map(String::as_str))
        .collect();

    let projection: Vec<String> = left_names
        .iter()
        .map(|n| format!("{}.{}", LEFT_ALIAS, n))
        .chain(right_names.iter().map(|n| format!("{}.{}", RIGHT_ALIAS, n)))
        .collect();

    Ok(format!(
        "CREATE VIEW {} ({}) AS SELECT {} OVER (ORDER BY {}.{}), {} FROM {} AS {} {} {} AS {} ON {};",
        view_name,
        definitions.join(", "),
        ROW_NUMBER_PREFIX,
        LEFT_ALIAS,
        key,
        projection.join(", "),
        left.name,
        LEFT_ALIAS,
        join_type.keyword(),
        right.name,
        RIGHT_ALIAS,
        render_criteria(predicates),
    ))
}

/// Predicates joined by the combiner of the predicate on their left.
/// The final predicate's combiner is not rendered.
fn render_criteria(predicates: &[CriteriaPredicate]) -> String {
    let mut out = String::new();
    for (i, predicate) in predicates.iter().enumerate() {
        if i > 0 {
            out.push(' ');
            out.push_str(predicates[i - 1].combiner.keyword());
            out.push(' ');
        }
        if let Some(rendered) = predicate.render() {
            out.push_str(&rendered);
        }
    }
    out
}

/// Generate DDL for a complete [`ViewSpec`], resolving its tables through
/// `catalog`.
pub fn generate_view(spec: &ViewSpec, catalog: &dyn TableCatalog) -> Result<String, InvalidSpecError> {
    let Some(left_ref) = spec.left_table() else {
        return Err(InvalidSpecError::MissingTable(String::new()));
    };
    if let (Some(_), None) = (spec.right_table(), &spec.join) {
        return Err(InvalidSpecError::MissingJoinCriteria(JoinType::Inner));
    }
    spec.check()?;

    let resolve = |name: &str| {
        catalog
            .get_table(name)
            .map_err(|_| InvalidSpecError::MissingTable(name.to_string()))
    };

    let left = resolve(&left_ref.qualified_name)?;
    let left_columns = spec.columns_for(left_ref).unwrap_or_default();

    match (spec.right_table(), &spec.join) {
        (Some(right_ref), Some(join)) => {
            let right = resolve(&right_ref.qualified_name)?;
            let right_columns = spec.columns_for(right_ref).unwrap_or_default();
            generate_join_view(
                &spec.view_name,
                &left,
                left_columns,
                &right,
                right_columns,
                join.join_type,
                &join.predicates,
            )
        }
        _ => generate_single_table_view(&spec.view_name, &left, left_columns),
    }
}
