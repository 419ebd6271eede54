//! MySQL dialect
//!
//! Key differences from the other backends:
//! - Backticks for identifiers
//! - Real databases are cheap, so each test run gets `CREATE DATABASE` plus
//!   `USE` for its ephemeral namespace
//! - `EXCEPT ALL` (8.0.31+) makes the multiset comparison a plain symmetric
//!   difference

use super::{except_all_condition, DialectImpl, DialectType};

/// MySQL dialect
pub struct MySQLDialect;

impl DialectImpl for MySQLDialect {
    fn dialect_type(&self) -> DialectType {
        DialectType::MySQL
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn drop_database(&self, name: &str) -> Option<String> {
        Some(format!(
            "DROP DATABASE IF EXISTS {};",
            self.quote_identifier(name)
        ))
    }

    fn create_database(&self, name: &str) -> String {
        format!("CREATE DATABASE {};", self.quote_identifier(name))
    }

    fn use_database(&self, name: &str) -> Option<String> {
        Some(format!("USE {};", self.quote_identifier(name)))
    }

    fn multiset_equal_condition(&self, actual: &str, expected: &str, _columns: usize) -> String {
        except_all_condition(actual, expected)
    }
}
