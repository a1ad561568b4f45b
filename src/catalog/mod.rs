//! The table catalog: a small, linearly-scanned list of defined tables.
//!
//! Real catalogs hash by name; this one mirrors the source's flat array of
//! table definitions, since a session rarely holds more than a handful of
//! tables and the scan cost is irrelevant next to re-reading the CSV file.

use crate::ast::Identifier;

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableDef {
    pub identifier: Identifier,
    pub columns: Vec<ColumnDef>,
    pub file_path: String,
    pub column_delimiter: char,
    pub strict: bool,
}

impl TableDef {
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tables: Vec<TableDef>,
}

impl Catalog {
    pub fn new() -> Self {
        Self { tables: Vec::new() }
    }

    pub fn lookup(&self, id: &Identifier) -> Option<&TableDef> {
        self.tables.iter().find(|t| &t.identifier == id)
    }

    pub fn contains(&self, id: &Identifier) -> bool {
        self.lookup(id).is_some()
    }

    pub fn insert(&mut self, table: TableDef) {
        self.tables.push(table);
    }

    pub fn iter(&self) -> impl Iterator<Item = &TableDef> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Roll back a catalog to a known-good length, discarding any tables
    /// created after it — used when a statement in a script fails and the
    /// session needs to forget partial effects of that statement alone.
    pub fn truncate(&mut self, len: usize) {
        self.tables.truncate(len);
    }
}
