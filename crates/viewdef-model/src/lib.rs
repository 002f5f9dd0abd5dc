//! Viewdef data model
//!
//! Plain value types shared by the view DDL generator and the view SQL
//! introspector. Every value is built per call, owned by the caller and
//! never mutated after construction.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

mod catalog;
mod types;

pub use catalog::{CatalogError, StaticCatalog, TableCatalog, TableDefinition};
pub use types::SourceTable;

/// Alias of the left-hand table in a two-table view.
pub const LEFT_ALIAS: &str = "A";
/// Alias of the right-hand table in a two-table view.
pub const RIGHT_ALIAS: &str = "B";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpecError {
    #[error("View spec must reference one or two tables, found {0}")]
    TableCount(usize),

    #[error("Join is present but the view references {0} table(s)")]
    UnexpectedJoin(usize),

    #[error("Two-table view is missing its join")]
    MissingJoin,

    #[error("Table {table} must use alias {expected:?}, found {actual:?}")]
    WrongAlias {
        table: String,
        expected: Option<String>,
        actual: Option<String>,
    },

    #[error("Projected columns reference unknown table: {0}")]
    UnknownProjectionTable(String),

    #[error("Column name must not be empty")]
    EmptyColumn,
}

/// A column projected from one of the view's source tables
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_table_alias: Option<String>,
}

impl ColumnRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner_table_alias: None,
        }
    }

    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner_table_alias: Some(alias.into()),
        }
    }
}

/// A source table referenced by a view
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRef {
    pub qualified_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(qualified_name: impl Into<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            alias: None,
        }
    }

    pub fn left(qualified_name: impl Into<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            alias: Some(LEFT_ALIAS.to_string()),
        }
    }

    pub fn right(qualified_name: impl Into<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            alias: Some(RIGHT_ALIAS.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JoinType {
    Inner,
    LeftOuter,
    RightOuter,
    FullOuter,
}

impl JoinType {
    pub const ALL: [JoinType; 4] = [
        JoinType::Inner,
        JoinType::LeftOuter,
        JoinType::RightOuter,
        JoinType::FullOuter,
    ];

    /// The fixed upper-case join phrase used in generated SQL
    pub fn keyword(self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::LeftOuter => "LEFT OUTER JOIN",
            JoinType::RightOuter => "RIGHT OUTER JOIN",
            JoinType::FullOuter => "FULL OUTER JOIN",
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Comparison operators allowed in join criteria.
///
/// `ALL` is the detection priority order used when splitting criteria text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOperator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<>")]
    Ne,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">=")]
    Ge,
}

impl ComparisonOperator {
    pub const ALL: [ComparisonOperator; 6] = [
        ComparisonOperator::Eq,
        ComparisonOperator::Lt,
        ComparisonOperator::Gt,
        ComparisonOperator::Ne,
        ComparisonOperator::Le,
        ComparisonOperator::Ge,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            ComparisonOperator::Eq => "=",
            ComparisonOperator::Lt => "<",
            ComparisonOperator::Gt => ">",
            ComparisonOperator::Ne => "<>",
            ComparisonOperator::Le => "<=",
            ComparisonOperator::Ge => ">=",
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Boolean keyword joining a predicate to the one after it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Combiner {
    #[default]
    And,
    Or,
}

impl Combiner {
    pub fn keyword(self) -> &'static str {
        match self {
            Combiner::And => "AND",
            Combiner::Or => "OR",
        }
    }
}

impl fmt::Display for Combiner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// One binary comparison between a left-table and a right-table column.
///
/// Fields are optional because the tokenizer may recover only part of a
/// predicate from hand-written SQL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriteriaPredicate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<ComparisonOperator>,
    #[serde(default)]
    pub combiner: Combiner,
}

impl CriteriaPredicate {
    pub fn new(
        left_column: impl Into<String>,
        operator: ComparisonOperator,
        right_column: impl Into<String>,
    ) -> Self {
        Self {
            left_column: Some(left_column.into()),
            right_column: Some(right_column.into()),
            operator: Some(operator),
            combiner: Combiner::And,
        }
    }

    pub fn with_combiner(mut self, combiner: Combiner) -> Self {
        self.combiner = combiner;
        self
    }

    pub fn is_complete(&self) -> bool {
        self.operator.is_some() && self.left_column.is_some() && self.right_column.is_some()
    }

    /// Renders `A.<left> <op> B.<right>`, or `None` when incomplete
    pub fn render(&self) -> Option<String> {
        match (&self.left_column, self.operator, &self.right_column) {
            (Some(left), Some(op), Some(right)) => Some(format!(
                "{}.{} {} {}.{}",
                LEFT_ALIAS, left, op, RIGHT_ALIAS, right
            )),
            _ => None,
        }
    }
}

/// Join type plus its criteria
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinCriteria {
    pub join_type: JoinType,
    pub predicates: Vec<CriteriaPredicate>,
}

/// Columns projected from one table of the view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumns {
    pub table: TableRef,
    pub columns: Vec<ColumnRef>,
}

/// Structured description of a view over one or two source tables
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSpec {
    pub view_name: String,
    pub tables: Vec<TableRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projected_columns: Vec<TableColumns>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join: Option<JoinCriteria>,
}

impl ViewSpec {
    pub fn single(view_name: impl Into<String>, table: TableRef, columns: Vec<ColumnRef>) -> Self {
        Self {
            view_name: view_name.into(),
            tables: vec![table.clone()],
            projected_columns: vec![TableColumns { table, columns }],
            join: None,
        }
    }

    pub fn columns_for(&self, table: &TableRef) -> Option<&[ColumnRef]> {
        self.projected_columns
            .iter()
            .find(|entry| &entry.table == table)
            .map(|entry| entry.columns.as_slice())
    }

    pub fn left_table(&self) -> Option<&TableRef> {
        self.tables.first()
    }

    pub fn right_table(&self) -> Option<&TableRef> {
        self.tables.get(1)
    }

    /// Check the structural invariants of a complete spec
    pub fn check(&self) -> Result<(), SpecError> {
        match (self.tables.len(), &self.join) {
            (1, None) | (2, Some(_)) => {}
            (2, None) => return Err(SpecError::MissingJoin),
            (1, Some(_)) => return Err(SpecError::UnexpectedJoin(1)),
            (n, _) => return Err(SpecError::TableCount(n)),
        }

        if self.tables.len() == 2 {
            for (table, expected) in self.tables.iter().zip([LEFT_ALIAS, RIGHT_ALIAS]) {
                if table.alias.as_deref() != Some(expected) {
                    return Err(SpecError::WrongAlias {
                        table: table.qualified_name.clone(),
                        expected: Some(expected.to_string()),
                        actual: table.alias.clone(),
                    });
                }
            }
        } else if let Some(alias) = &self.tables[0].alias {
            return Err(SpecError::WrongAlias {
                table: self.tables[0].qualified_name.clone(),
                expected: None,
                actual: Some(alias.clone()),
            });
        }

        for entry in &self.projected_columns {
            if !self.tables.contains(&entry.table) {
                return Err(SpecError::UnknownProjectionTable(
                    entry.table.qualified_name.clone(),
                ));
            }
            if entry.columns.iter().any(|c| c.name.is_empty()) {
                return Err(SpecError::EmptyColumn);
            }
        }

        Ok(())
    }
}

/// Outcome of reading an existing view's SQL back into a [`ViewSpec`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionResult {
    spec: ViewSpec,
    editable: bool,
    raw_ddl: String,
}

impl IntrospectionResult {
    /// Builds a result, deriving `editable` from the recovered structure.
    ///
    /// A result is editable when every discovered table has at least one
    /// attributed column and, for two tables, join criteria were recovered.
    pub fn new(spec: ViewSpec, raw_ddl: impl Into<String>) -> Self {
        let attributed = spec
            .projected_columns
            .iter()
            .filter(|entry| !entry.columns.is_empty())
            .count();

        let editable = !spec.tables.is_empty()
            && spec
                .tables
                .iter()
                .all(|t| spec.columns_for(t).is_some_and(|cols| !cols.is_empty()))
            && attributed == spec.tables.len()
            && (spec.tables.len() != 2 || spec.join.is_some());

        Self {
            spec,
            editable,
            raw_ddl: raw_ddl.into(),
        }
    }

    pub fn spec(&self) -> &ViewSpec {
        &self.spec
    }

    pub fn editable(&self) -> bool {
        self.editable
    }

    pub fn raw_ddl(&self) -> &str {
        &self.raw_ddl
    }

    pub fn into_spec(self) -> ViewSpec {
        self.spec
    }

    /// Per-table summary with each table's owning connection resolved
    /// through `catalog`. The first table is the left-hand side.
    pub fn view_info(&self, catalog: &dyn TableCatalog) -> Vec<ViewTableInfo> {
        self.spec
            .tables
            .iter()
            .enumerate()
            .map(|(i, table)| ViewTableInfo {
                side: if i == 0 { TableSide::Left } else { TableSide::Right },
                table_name: table.qualified_name.clone(),
                connection: catalog.connection_of(table),
                column_names: self
                    .spec
                    .columns_for(table)
                    .unwrap_or_default()
                    .iter()
                    .map(|c| c.name.clone())
                    .collect(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TableSide {
    Left,
    Right,
}

/// Source table summary for a view editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewTableInfo {
    pub side: TableSide,
    pub table_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<String>,
    pub column_names: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn join_spec() -> ViewSpec {
        let left = TableRef::left("pg.public.orders");
        let right = TableRef::right("pg.public.customers");
        ViewSpec {
            view_name: "OrdersView".to_string(),
            tables: vec![left.clone(), right.clone()],
            projected_columns: vec![
                TableColumns {
                    table: left,
                    columns: vec![ColumnRef::aliased("id", "A")],
                },
                TableColumns {
                    table: right,
                    columns: vec![ColumnRef::aliased("name", "B")],
                },
            ],
            join: Some(JoinCriteria {
                join_type: JoinType::Inner,
                predicates: vec![CriteriaPredicate::new(
                    "customer_id",
                    ComparisonOperator::Eq,
                    "id",
                )],
            }),
        }
    }

    #[test]
    fn test_predicate_completeness() {
        let complete = CriteriaPredicate::new("x", ComparisonOperator::Eq, "y");
        assert!(complete.is_complete());
        assert_eq!(complete.render().as_deref(), Some("A.x = B.y"));

        let partial = CriteriaPredicate {
            left_column: Some("x".to_string()),
            operator: Some(ComparisonOperator::Lt),
            ..Default::default()
        };
        assert!(!partial.is_complete());
        assert_eq!(partial.render(), None);
    }

    #[test]
    fn test_check_join_spec() {
        assert_eq!(join_spec().check(), Ok(()));
    }

    #[test]
    fn test_check_rejects_swapped_aliases() {
        let mut spec = join_spec();
        spec.tables.swap(0, 1);
        assert!(matches!(spec.check(), Err(SpecError::WrongAlias { .. })));
    }

    #[test]
    fn test_check_requires_join_for_two_tables() {
        let mut spec = join_spec();
        spec.join = None;
        assert_eq!(spec.check(), Err(SpecError::MissingJoin));
    }

    #[test]
    fn test_check_single_table() {
        let spec = ViewSpec::single("V", TableRef::new("t"), vec![ColumnRef::new("c")]);
        assert_eq!(spec.check(), Ok(()));

        let mut bad = spec.clone();
        bad.projected_columns[0].table = TableRef::new("other");
        assert_eq!(
            bad.check(),
            Err(SpecError::UnknownProjectionTable("other".to_string()))
        );
    }

    #[test]
    fn test_editable_derivation() {
        let result = IntrospectionResult::new(join_spec(), "SELECT ...");
        assert!(result.editable());

        let mut no_criteria = join_spec();
        no_criteria.join = None;
        assert!(!IntrospectionResult::new(no_criteria, "").editable());

        let mut missing_right = join_spec();
        missing_right.projected_columns[1].columns.clear();
        assert!(!IntrospectionResult::new(missing_right, "").editable());

        assert!(!IntrospectionResult::new(ViewSpec::default(), "").editable());
    }

    #[test]
    fn test_view_info_resolves_connections() {
        let catalog: StaticCatalog = [SourceTable::new("pg.public.orders", ["id"])
            .with_connection("pgDS")]
        .into_iter()
        .collect();

        let info = IntrospectionResult::new(join_spec(), "").view_info(&catalog);
        assert_eq!(info.len(), 2);
        assert_eq!(info[0].side, TableSide::Left);
        assert_eq!(info[0].connection.as_deref(), Some("pgDS"));
        assert_eq!(info[0].column_names, vec!["id"]);
        assert_eq!(info[1].side, TableSide::Right);
        assert_eq!(info[1].table_name, "pg.public.customers");
        assert_eq!(info[1].connection, None);
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(join_spec()).unwrap();
        assert_eq!(json["join"]["joinType"], "INNER");
        assert_eq!(json["join"]["predicates"][0]["operator"], "=");
        assert_eq!(json["join"]["predicates"][0]["combiner"], "AND");
        assert_eq!(json["tables"][1]["alias"], "B");

        let parsed: ViewSpec = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, join_spec());
    }
}
