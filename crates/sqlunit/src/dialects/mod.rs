//! Dialect adapters for the supported backends
//!
//! Each backend implements [`DialectImpl`]; [`Dialect`] is a lightweight
//! copyable handle that selects one implementation for a whole run. The
//! capability surface covers identifier quoting, boolean and column-type
//! spelling, the ephemeral database lifecycle, and the relation-comparison
//! idiom, so the generator itself contains no backend conditionals.

mod mysql;
mod postgres;
mod sqlite;

pub use mysql::MySQLDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SQLiteDialect;

use crate::types::SqlType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The supported backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectType {
    MySQL,
    PostgreSQL,
    SQLite,
}

impl DialectType {
    /// Canonical lowercase selector name
    pub fn name(&self) -> &'static str {
        match self {
            DialectType::MySQL => "mysql",
            DialectType::PostgreSQL => "postgresql",
            DialectType::SQLite => "sqlite",
        }
    }
}

impl fmt::Display for DialectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Backend-specific SQL spelling.
///
/// Defaults follow the common ANSI behavior; each backend overrides what it
/// must. All methods are pure text producers.
pub trait DialectImpl: Sync {
    fn dialect_type(&self) -> DialectType;

    /// Client commands emitted once at the top of a generated script
    fn initialize(&self) -> Option<&'static str> {
        None
    }

    /// Quote one identifier part
    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Statement removing the ephemeral database, when the backend needs one
    fn drop_database(&self, name: &str) -> Option<String> {
        let _ = name;
        None
    }

    /// Statement creating the ephemeral database
    fn create_database(&self, name: &str) -> String;

    /// Statement selecting the default database, when the backend has one
    fn use_database(&self, name: &str) -> Option<String> {
        let _ = name;
        None
    }

    /// Opening line of a view definition; the query text follows on the
    /// next line
    fn create_view(&self, name: &str) -> String {
        format!("CREATE VIEW {} AS", name)
    }

    /// SQL spelling of a boolean literal
    fn boolean_literal(&self, value: bool) -> &'static str {
        if value {
            "TRUE"
        } else {
            "FALSE"
        }
    }

    /// Column type spelling for an inferred type. All-null columns take the
    /// generic nullable text type.
    fn type_name(&self, sql_type: SqlType) -> &'static str {
        match sql_type {
            SqlType::Boolean => "BOOLEAN",
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Text | SqlType::Null => "VARCHAR(255)",
        }
    }

    /// A condition that holds when `actual` and `expected` contain the same
    /// multiset of rows: order-independent but duplicate-count-sensitive.
    /// `columns` is the expected relation's column count, for backends whose
    /// idiom needs positional grouping.
    fn multiset_equal_condition(&self, actual: &str, expected: &str, columns: usize) -> String;
}

/// Symmetric difference via `EXCEPT ALL`, for backends that support it.
/// The condition is true when the difference is empty in both directions.
pub(crate) fn except_all_condition(actual: &str, expected: &str) -> String {
    format!(
        "(SELECT COUNT(*) FROM (\n  \
           (SELECT * FROM {expected} EXCEPT ALL SELECT * FROM {actual})\n  \
           UNION ALL\n  \
           (SELECT * FROM {actual} EXCEPT ALL SELECT * FROM {expected})\n\
         ) AS diff) = 0"
    )
}

/// Handle to a dialect implementation, selected once per run
#[derive(Clone, Copy)]
pub struct Dialect {
    imp: &'static dyn DialectImpl,
}

impl Dialect {
    /// Get the implementation for a dialect type
    pub fn get(dialect_type: DialectType) -> Self {
        let imp: &'static dyn DialectImpl = match dialect_type {
            DialectType::MySQL => &MySQLDialect,
            DialectType::PostgreSQL => &PostgresDialect,
            DialectType::SQLite => &SQLiteDialect,
        };
        Self { imp }
    }

    /// Look a dialect up by selector name. Accepts the canonical names plus
    /// the common `postgres` alias; anything else is unsupported.
    pub fn get_by_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "mysql" => Some(Self::get(DialectType::MySQL)),
            "postgresql" | "postgres" => Some(Self::get(DialectType::PostgreSQL)),
            "sqlite" => Some(Self::get(DialectType::SQLite)),
            _ => None,
        }
    }

    pub fn dialect_type(&self) -> DialectType {
        self.imp.dialect_type()
    }

    pub fn initialize(&self) -> Option<&'static str> {
        self.imp.initialize()
    }

    pub fn quote_identifier(&self, name: &str) -> String {
        self.imp.quote_identifier(name)
    }

    pub fn drop_database(&self, name: &str) -> Option<String> {
        self.imp.drop_database(name)
    }

    pub fn create_database(&self, name: &str) -> String {
        self.imp.create_database(name)
    }

    pub fn use_database(&self, name: &str) -> Option<String> {
        self.imp.use_database(name)
    }

    pub fn create_view(&self, name: &str) -> String {
        self.imp.create_view(name)
    }

    pub fn boolean_literal(&self, value: bool) -> &'static str {
        self.imp.boolean_literal(value)
    }

    pub fn type_name(&self, sql_type: SqlType) -> &'static str {
        self.imp.type_name(sql_type)
    }

    pub fn multiset_equal_condition(
        &self,
        actual: &str,
        expected: &str,
        columns: usize,
    ) -> String {
        self.imp.multiset_equal_condition(actual, expected, columns)
    }
}

impl fmt::Debug for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Dialect").field(&self.dialect_type()).finish()
    }
}
