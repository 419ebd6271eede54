//! PostgreSQL dialect
//!
//! Key differences from the other backends:
//! - Ephemeral namespaces are schemas, selected with `search_path`, not
//!   databases (a psql session cannot hop databases mid-script)
//! - The script preamble configures psql to stop on errors and silence
//!   NOTICE chatter so the TAP lines pass through cleanly
//! - `EXCEPT ALL` is native, so the multiset comparison is a plain
//!   symmetric difference

use super::{except_all_condition, DialectImpl, DialectType};

/// PostgreSQL dialect
pub struct PostgresDialect;

impl DialectImpl for PostgresDialect {
    fn dialect_type(&self) -> DialectType {
        DialectType::PostgreSQL
    }

    fn initialize(&self) -> Option<&'static str> {
        Some("\\set ON_ERROR_STOP true\nSET client_min_messages='ERROR';")
    }

    fn drop_database(&self, name: &str) -> Option<String> {
        Some(format!(
            "DROP SCHEMA IF EXISTS {} CASCADE;",
            self.quote_identifier(name)
        ))
    }

    fn create_database(&self, name: &str) -> String {
        format!("CREATE SCHEMA {};", self.quote_identifier(name))
    }

    fn use_database(&self, name: &str) -> Option<String> {
        Some(format!("SET search_path TO {};", self.quote_identifier(name)))
    }

    fn multiset_equal_condition(&self, actual: &str, expected: &str, _columns: usize) -> String {
        except_all_condition(actual, expected)
    }
}
