//! SQL script emission
//!
//! Turns parsed test cases into a dialect-correct script: ephemeral database
//! creation, `CREATE TABLE`/`INSERT` statements for the setup tables, the
//! query under test, the expected relation, and a comparison whose outcome
//! is reported as a TAP line produced by the SQL itself.
//!
//! Database references in query text are rewritten to their ephemeral
//! `test_` counterparts so the query runs against the tables the script just
//! created rather than any real data.

use crate::dialects::{Dialect, DialectType};
use crate::model::{Column, Query, QueryKind, Row, TableName, TestCase, TestFile};
use crate::types;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Single-line `CREATE INDEX` statements inside included query files
static RE_FULL_CREATE_INDEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)CREATE\s+INDEX\s+[^;]+;").unwrap());

/// A `CREATE INDEX` opening that continues on following lines
static RE_PARTIAL_CREATE_INDEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)CREATE\s+INDEX\b[^;]*$").unwrap());

/// `ATTACH` statements inside included query files
static RE_FULL_ATTACH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)ATTACH\s+[^;]+;").unwrap());

/// Name of the view that materializes an anonymous SELECT result
const SELECT_RESULT: &str = "test_select_result";

/// Name of the table holding a case's expected rows
const EXPECTED: &str = "test_expected";

/// Options controlling script emission
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratorOptions {
    /// Emit each case's actual rows instead of the equality check. No
    /// ok/not-ok lines are produced in this mode.
    pub capture_results: bool,
    /// Assume the default database already exists and is selected; skip
    /// creating the ephemeral one.
    pub use_existing_database: bool,
    /// Default database name, without the `test_` prefix
    pub database: Option<String>,
}

/// Emits the script for one run. Holds the dialect, the options, and the
/// set of ephemeral databases created so far so none is created twice.
pub struct Generator {
    dialect: Dialect,
    options: GeneratorOptions,
    created: HashSet<String>,
    database_refs: Option<Regex>,
}

impl Generator {
    /// Create a generator with default options
    pub fn new(dialect_type: DialectType) -> Self {
        Self::with_options(dialect_type, GeneratorOptions::default())
    }

    /// Create a generator with explicit options
    pub fn with_options(dialect_type: DialectType, options: GeneratorOptions) -> Self {
        Self {
            dialect: Dialect::get(dialect_type),
            options,
            created: HashSet::new(),
            database_refs: None,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The script header: a marker comment, engine initialization, and the
    /// ephemeral default database.
    pub fn preamble(&mut self) -> String {
        let mut out = String::new();
        out.push_str("-- Auto generated test script from sqlunit\n");
        if let Some(init) = self.dialect.initialize() {
            out.push_str(init);
            out.push('\n');
        }
        let default = self
            .options
            .database
            .clone()
            .unwrap_or_else(|| "default".to_string());
        if self.options.use_existing_database {
            // The caller manages the database; just never try to create it
            self.created.insert(default);
        } else {
            let name = format!("test_{}", default);
            if let Some(drop) = self.dialect.drop_database(&name) {
                out.push_str(&drop);
                out.push('\n');
            }
            out.push_str(&self.dialect.create_database(&name));
            out.push('\n');
            if let Some(use_stmt) = self.dialect.use_database(&name) {
                out.push_str(&use_stmt);
                out.push('\n');
            }
            self.created.insert(default);
        }
        out
    }

    /// Per-file header: a provenance comment plus creation of the databases
    /// the file declares and this run has not created yet. Also compiles the
    /// reference-rewriting pattern used for the file's query text.
    pub fn begin_file(&mut self, file: &TestFile) -> String {
        let mut out = String::new();
        out.push_str(&format!("-- Input from {}\n", file.name));
        let declared = file.declared_databases();
        for database in &declared {
            if self.created.insert(database.clone()) {
                let name = format!("test_{}", database);
                if let Some(drop) = self.dialect.drop_database(&name) {
                    out.push_str(&drop);
                    out.push('\n');
                }
                out.push_str(&self.dialect.create_database(&name));
                out.push('\n');
            }
        }
        self.database_refs = database_pattern(&declared);
        out
    }

    /// Emit one complete test case with the given 1-based report ordinal
    pub fn emit_case(&self, file_name: &str, case: &TestCase, ordinal: usize) -> String {
        let mut out = String::new();
        out.push_str(&format!("\n-- Test case {}\n", ordinal));

        for table in &case.setup {
            let sql_name = self.table_sql_name(&table.name);
            self.emit_table(&mut out, &sql_name, &table.columns, &table.rows);
        }

        self.emit_query(&mut out, &case.query);

        let expected_sql = self.dialect.quote_identifier(EXPECTED);
        self.emit_table(&mut out, &expected_sql, &case.result.columns, &case.result.rows);

        let (actual_sql, label) = match &case.result.target {
            Some(target) => (self.table_sql_name(target), table_label(target)),
            None => (
                self.dialect.quote_identifier(SELECT_RESULT),
                SELECT_RESULT.to_string(),
            ),
        };

        if self.options.capture_results {
            out.push_str(&format!("SELECT * FROM {};\n", actual_sql));
        } else {
            let condition = self.dialect.multiset_equal_condition(
                &actual_sql,
                &expected_sql,
                case.result.columns.len(),
            );
            let ok = sql_string(&format!("ok {} - {}: {}", ordinal, file_name, label));
            let not_ok = sql_string(&format!("not ok {} - {}: {}", ordinal, file_name, label));
            out.push_str(&format!(
                "SELECT CASE WHEN\n  {}\nTHEN {} ELSE\n{} END;\n",
                condition, ok, not_ok
            ));
        }
        out
    }

    /// Drop, create, and populate one relation
    fn emit_table(&self, out: &mut String, sql_name: &str, columns: &[Column], rows: &[Row]) {
        out.push_str(&format!("DROP TABLE IF EXISTS {};\n", sql_name));
        let definitions = columns
            .iter()
            .map(|column| {
                format!(
                    "{} {}",
                    self.dialect.quote_identifier(&column.name),
                    self.dialect.type_name(column.sql_type)
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!("CREATE TABLE {}({});\n", sql_name, definitions));
        for row in rows {
            let values = row
                .cells
                .iter()
                .zip(columns)
                .map(|(cell, column)| types::render_cell(cell, column.sql_type, self.dialect))
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!("INSERT INTO {} VALUES ({});\n", sql_name, values));
        }
    }

    /// Emit the query under test. SELECT-style queries materialize through
    /// a view so their output can be compared like any other relation;
    /// CREATE-style queries run verbatim and are inspected through the
    /// object they create.
    fn emit_query(&self, out: &mut String, query: &Query) {
        if query.kind == QueryKind::Select {
            let view = self.dialect.quote_identifier(SELECT_RESULT);
            out.push_str(&format!("DROP VIEW IF EXISTS {};\n", view));
            out.push_str(&self.dialect.create_view(&view));
            out.push('\n');
        }
        out.push_str(&self.query_text(query));
        out.push('\n');
    }

    /// Assemble the query text: preprocessed included text first, then any
    /// literal block, with database references rewritten throughout.
    fn query_text(&self, query: &Query) -> String {
        let mut text = String::new();
        if let Some(included) = &query.included {
            text.push_str(&strip_unsupported_statements(&included.text));
        }
        if let Some(literal) = &query.literal {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(literal);
        }
        let text = text.trim_end().to_string();
        match &self.database_refs {
            Some(pattern) => pattern.replace_all(&text, "test_${1}.").into_owned(),
            None => text,
        }
    }

    /// Quoted SQL name for a table, mapping its declared database to the
    /// ephemeral `test_` one
    fn table_sql_name(&self, name: &TableName) -> String {
        match &name.database {
            Some(database) => format!(
                "{}.{}",
                self.dialect.quote_identifier(&format!("test_{}", database)),
                self.dialect.quote_identifier(&name.name)
            ),
            None => self.dialect.quote_identifier(&name.name),
        }
    }
}

/// Unquoted report label for a named result
fn table_label(name: &TableName) -> String {
    match &name.database {
        Some(database) => format!("test_{}.{}", database, name.name),
        None => name.name.clone(),
    }
}

/// Quote a string as a SQL literal
fn sql_string(value: &str) -> String {
    types::quote_string(value)
}

/// Pattern matching a reference to any declared database, as `db.` with a
/// word boundary, case-insensitively
fn database_pattern(databases: &[String]) -> Option<Regex> {
    if databases.is_empty() {
        return None;
    }
    let alternatives = databases
        .iter()
        .map(|database| regex::escape(database))
        .collect::<Vec<_>>()
        .join("|");
    // Declared names are plain identifiers, so the pattern always compiles
    Some(Regex::new(&format!(r"(?i)\b({})\.", alternatives)).unwrap())
}

/// Drop statements the ephemeral environment cannot honor from included
/// query files: index creation (possibly spanning lines) and database
/// attachment.
fn strip_unsupported_statements(text: &str) -> String {
    let mut out = Vec::new();
    let mut lines = text.lines();
    while let Some(raw) = lines.next() {
        let line = raw.trim_end();
        let mut line = RE_FULL_CREATE_INDEX.replace_all(line, "").into_owned();
        line = RE_FULL_ATTACH.replace_all(&line, "").into_owned();
        if RE_PARTIAL_CREATE_INDEX.is_match(&line) {
            let head = RE_PARTIAL_CREATE_INDEX.replace(&line, "").into_owned();
            let mut tail = String::new();
            for continuation in lines.by_ref() {
                if let Some(position) = continuation.find(';') {
                    tail = continuation[position + 1..].trim_end().to_string();
                    break;
                }
            }
            line = head + &tail;
        }
        out.push(line);
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Cell;

    #[test]
    fn test_database_pattern_rewrites_case_insensitively() {
        let pattern = database_pattern(&["leadership".to_string()]).unwrap();
        let rewritten = pattern.replace_all(
            "SELECT * FROM Leadership.commits JOIN leadership.leaders",
            "test_${1}.",
        );
        assert_eq!(
            rewritten,
            "SELECT * FROM test_Leadership.commits JOIN test_leadership.leaders"
        );
    }

    #[test]
    fn test_database_pattern_respects_word_boundaries() {
        let pattern = database_pattern(&["db".to_string()]).unwrap();
        let rewritten = pattern.replace_all("SELECT mydb.x, db.y", "test_${1}.");
        assert_eq!(rewritten, "SELECT mydb.x, test_db.y");
    }

    #[test]
    fn test_no_pattern_for_no_databases() {
        assert!(database_pattern(&[]).is_none());
    }

    #[test]
    fn test_strip_single_line_statements() {
        let text = "CREATE INDEX idx ON t(x);\nSELECT 1;\nATTACH DATABASE 'f' AS d;\n";
        let stripped = strip_unsupported_statements(text);
        assert!(!stripped.contains("CREATE INDEX"));
        assert!(!stripped.contains("ATTACH"));
        assert!(stripped.contains("SELECT 1;"));
    }

    #[test]
    fn test_strip_multi_line_create_index() {
        let text = "SELECT 1; CREATE INDEX idx\n  ON t(x)\n  ;SELECT 2;\nSELECT 3;";
        let stripped = strip_unsupported_statements(text);
        assert!(!stripped.contains("CREATE INDEX"));
        assert!(!stripped.contains("ON t(x)"));
        assert!(stripped.contains("SELECT 1;"));
        assert!(stripped.contains("SELECT 2;"));
        assert!(stripped.contains("SELECT 3;"));
    }

    #[test]
    fn test_table_sql_name_and_label() {
        let generator = Generator::new(DialectType::MySQL);
        let qualified = TableName::parse("leadership.commits").unwrap();
        assert_eq!(
            generator.table_sql_name(&qualified),
            "`test_leadership`.`commits`"
        );
        assert_eq!(table_label(&qualified), "test_leadership.commits");

        let bare = TableName::bare("sales");
        assert_eq!(generator.table_sql_name(&bare), "`sales`");
        assert_eq!(table_label(&bare), "sales");
    }

    #[test]
    fn test_emit_table_renders_types_and_rows() {
        let generator = Generator::new(DialectType::MySQL);
        let columns = types::infer_columns(
            &["month".to_string(), "revenue".to_string()],
            &[Row::new(vec![
                Cell::new("March", false),
                Cell::new("130", false),
            ])],
        );
        let rows = vec![Row::new(vec![
            Cell::new("March", false),
            Cell::new("130", false),
        ])];
        let mut out = String::new();
        generator.emit_table(&mut out, "`sales`", &columns, &rows);
        assert!(out.contains("DROP TABLE IF EXISTS `sales`;"));
        assert!(out.contains("CREATE TABLE `sales`(`month` VARCHAR(255), `revenue` INTEGER);"));
        assert!(out.contains("INSERT INTO `sales` VALUES ('March', 130);"));
    }
}
