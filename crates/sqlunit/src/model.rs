//! In-memory model of a test specification
//!
//! The parser owns construction of everything in this module; the generator
//! and runner only read it. A specification file yields one [`TestFile`],
//! which holds the [`TestCase`]s in source order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell value exactly as written in the specification.
///
/// Quoted cells keep their surrounding single quotes so they can be passed
/// through to the generated SQL verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// The raw token text, quotes included for quoted cells
    pub text: String,
    /// Whether the token carried single quotes in the source
    pub quoted: bool,
}

impl Cell {
    /// Create a new cell
    pub fn new(text: impl Into<String>, quoted: bool) -> Self {
        Self {
            text: text.into(),
            quoted,
        }
    }
}

/// One data row of a table, aligned positionally with the table's columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }
}

/// A column of a table: its name and the type inferred from its cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub sql_type: crate::types::SqlType,
}

/// A table name, optionally qualified with its owning database
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableName {
    pub database: Option<String>,
    pub name: String,
}

impl TableName {
    /// An unqualified table name
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            database: None,
            name: name.into(),
        }
    }

    /// Parse `name` or `database.name`. Both parts must be identifiers
    /// (letter or underscore followed by word characters).
    pub fn parse(spec: &str) -> Option<Self> {
        fn is_identifier(part: &str) -> bool {
            let mut chars = part.chars();
            match chars.next() {
                Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
                _ => return false,
            }
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }

        match spec.split_once('.') {
            Some((db, name)) if is_identifier(db) && is_identifier(name) => Some(Self {
                database: Some(db.to_string()),
                name: name.to_string(),
            }),
            None if is_identifier(spec) => Some(Self::bare(spec)),
            _ => None,
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.database {
            Some(db) => write!(f, "{}.{}", db, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A setup table: name, typed columns, and data rows.
///
/// Rows are rectangular; the parser rejects a row whose cell count differs
/// from the column count before a `Table` is ever built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: TableName,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

/// Whether a query yields an anonymous result set or creates a named object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryKind {
    Select,
    Create,
}

/// Query text pulled in from an external file via `INCLUDE`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludedQuery {
    /// The path exactly as written in the directive
    pub path: String,
    /// The file's content, as supplied to the parser
    pub text: String,
}

/// The query under test.
///
/// A case may take its query from an `INCLUDE` directive, a literal
/// `BEGIN SELECT`/`BEGIN CREATE` block, or both; included text always
/// precedes the literal text in the generated script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub kind: QueryKind,
    pub included: Option<IncludedQuery>,
    pub literal: Option<String>,
}

/// The expected result of a test case.
///
/// `target` names the object a CREATE-style query produced; an anonymous
/// SELECT-style result leaves it empty and is checked through the
/// materialized result view instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedResult {
    pub target: Option<TableName>,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

/// One setup/query/result unit of a specification file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub setup: Vec<Table>,
    pub query: Query,
    pub result: ExpectedResult,
}

/// A parsed specification file: the cases in source order plus the file
/// name used for report labeling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestFile {
    pub name: String,
    pub cases: Vec<TestCase>,
}

impl TestFile {
    /// Database qualifiers declared anywhere in the file, in first-appearance
    /// order. These drive ephemeral database creation and the rewriting of
    /// database references inside query text.
    pub fn declared_databases(&self) -> Vec<String> {
        fn push(seen: &mut Vec<String>, database: Option<&String>) {
            if let Some(database) = database {
                if !seen.iter().any(|s| s == database) {
                    seen.push(database.clone());
                }
            }
        }

        let mut seen: Vec<String> = Vec::new();
        for case in &self.cases {
            for table in &case.setup {
                push(&mut seen, table.name.database.as_ref());
            }
            if let Some(target) = &case.result.target {
                push(&mut seen, target.database.as_ref());
            }
        }
        seen
    }
}
