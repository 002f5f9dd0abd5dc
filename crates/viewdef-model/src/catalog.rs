//! Metadata adapter: turns externally supplied table definitions into
//! [`SourceTable`] values and resolves them by name.

use std::collections::HashMap;
use thiserror::Error;

use crate::{SourceTable, TableRef};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Table {0} has no columns")]
    NoColumns(String),
}

/// A table definition owned by an external catalog (repository node,
/// JDBC metadata, configuration file).
pub trait TableDefinition {
    fn name(&self) -> String;

    /// Column names in catalog order
    fn columns(&self) -> Vec<String>;

    fn primary_key(&self) -> Option<String> {
        None
    }

    fn connection(&self) -> Option<String> {
        None
    }
}

impl SourceTable {
    /// Field extraction only; no validation beyond what the compiler needs.
    pub fn from_definition(definition: &dyn TableDefinition) -> Self {
        Self {
            name: definition.name(),
            columns: definition.columns(),
            primary_key: definition.primary_key(),
            connection: definition.connection(),
        }
    }
}

/// Trait for resolving source tables by qualified name
pub trait TableCatalog {
    fn get_table(&self, name: &str) -> Result<SourceTable, CatalogError>;

    /// Connection owning `table`, when the catalog knows it
    fn connection_of(&self, table: &TableRef) -> Option<String> {
        self.get_table(&table.qualified_name)
            .ok()
            .and_then(|t| t.connection)
    }
}

/// Catalog loaded once and read-only afterwards
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    tables: HashMap<String, SourceTable>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(&mut self, table: SourceTable) {
        self.tables.insert(table.name.clone(), table);
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl FromIterator<SourceTable> for StaticCatalog {
    fn from_iter<I: IntoIterator<Item = SourceTable>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for table in iter {
            catalog.add_table(table);
        }
        catalog
    }
}

impl TableCatalog for StaticCatalog {
    fn get_table(&self, name: &str) -> Result<SourceTable, CatalogError> {
        let table = self
            .tables
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::TableNotFound(name.to_string()))?;

        if table.columns.is_empty() {
            return Err(CatalogError::NoColumns(name.to_string()));
        }
        Ok(table)
    }
}
