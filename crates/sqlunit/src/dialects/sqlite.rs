//! SQLite dialect
//!
//! Key differences from the other backends:
//! - No separate server databases; ephemeral namespaces are in-memory
//!   attachments and nothing needs dropping or selecting
//! - Booleans are integers, so literals spell as `1`/`0`
//! - Views for materializing a SELECT result are `TEMP` so they never leak
//!   into an attached file
//! - No `EXCEPT ALL`: the multiset comparison annotates each distinct row
//!   with its duplicate count (positional `GROUP BY`) and takes the
//!   symmetric difference of the annotated relations with plain `EXCEPT`

use super::{DialectImpl, DialectType};

/// SQLite dialect
pub struct SQLiteDialect;

impl DialectImpl for SQLiteDialect {
    fn dialect_type(&self) -> DialectType {
        DialectType::SQLite
    }

    fn create_database(&self, name: &str) -> String {
        format!(
            "ATTACH DATABASE ':memory:' AS {};",
            self.quote_identifier(name)
        )
    }

    fn create_view(&self, name: &str) -> String {
        format!("CREATE TEMP VIEW {} AS", name)
    }

    fn boolean_literal(&self, value: bool) -> &'static str {
        if value {
            "1"
        } else {
            "0"
        }
    }

    fn multiset_equal_condition(&self, actual: &str, expected: &str, columns: usize) -> String {
        let ordinals = (1..=columns)
            .map(|position| position.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "(SELECT COUNT(*) FROM (\n  \
               SELECT * FROM (SELECT *, COUNT(*) AS dup_count FROM {expected} GROUP BY {ordinals}\n                 \
                              EXCEPT\n                 \
                              SELECT *, COUNT(*) FROM {actual} GROUP BY {ordinals})\n  \
               UNION ALL\n  \
               SELECT * FROM (SELECT *, COUNT(*) AS dup_count FROM {actual} GROUP BY {ordinals}\n                 \
                              EXCEPT\n                 \
                              SELECT *, COUNT(*) FROM {expected} GROUP BY {ordinals})\n\
             ) AS diff) = 0"
        )
    }
}
