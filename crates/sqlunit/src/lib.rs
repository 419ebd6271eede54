//! sqlunit - relational query unit testing
//!
//! This library compiles a compact test-specification language into a SQL
//! script that sets up input tables, runs the query under test, and checks
//! the produced result, reporting each case as a TAP `ok`/`not ok` line
//! produced by the SQL itself. The script is written for one of three
//! backends (MySQL, PostgreSQL, SQLite) and is meant to be piped into that
//! backend's command-line client, whose output becomes the test report.
//!
//! # Architecture
//!
//! The library follows a pipeline architecture:
//! 1. **Parser** - Converts specification text to a structured [`TestFile`]
//! 2. **Type inference** - Derives column types from the literal cell values
//! 3. **Generator** - Emits dialect-correct SQL for each test case
//! 4. **Runner** - Sequences files, assigns report ordinals, adds the plan
//!
//! Each backend's spelling lives behind one [`Dialect`] adapter.
//!
//! # Example
//!
//! ```
//! use sqlunit::{compile, DialectType, IncludeMap};
//!
//! let spec = "\
//! BEGIN SETUP
//! sales:
//! month   revenue
//! March   130
//! April   50
//!
//! END
//! BEGIN SELECT
//! SELECT MAX(revenue) AS max_revenue FROM sales;
//! END
//! BEGIN RESULT
//! max_revenue
//! 130
//! END
//! ";
//! let script = compile(spec, "sales.rdbu", &IncludeMap::new(), DialectType::SQLite).unwrap();
//! assert!(script.contains("ok 1 - sales.rdbu: test_select_result"));
//! assert!(script.ends_with("SELECT '1..1';\n"));
//! ```

pub mod dialects;
pub mod error;
pub mod generator;
pub mod model;
pub mod parser;
pub mod runner;
pub mod types;

pub use dialects::{Dialect, DialectImpl, DialectType};
pub use error::{Error, Result};
pub use generator::{Generator, GeneratorOptions};
pub use model::{
    Cell, Column, ExpectedResult, IncludedQuery, Query, QueryKind, Row, Table, TableName,
    TestCase, TestFile,
};
pub use parser::{collect_includes, IncludeMap, Parser};
pub use runner::TestRun;
pub use types::SqlType;

use std::path::Path;

/// Parse one specification file into its structured form.
///
/// `name` is the file name used in error messages and report labels;
/// `includes` maps the paths of `INCLUDE` directives to their content.
pub fn parse_spec(text: &str, name: &str, includes: &IncludeMap) -> Result<TestFile> {
    Parser::parse(text, name, includes)
}

/// Compile one specification file into a complete SQL script with default
/// options.
pub fn compile(
    text: &str,
    name: &str,
    includes: &IncludeMap,
    dialect_type: DialectType,
) -> Result<String> {
    compile_with_options(text, name, includes, dialect_type, GeneratorOptions::default())
}

/// Compile one specification file into a complete SQL script.
pub fn compile_with_options(
    text: &str,
    name: &str,
    includes: &IncludeMap,
    dialect_type: DialectType,
    options: GeneratorOptions,
) -> Result<String> {
    let file = Parser::parse(text, name, includes)?;
    let mut run = TestRun::with_options(dialect_type, options);
    run.add_file(&file);
    Ok(run.finish())
}

/// Compile using a string backend selector (`mysql`, `postgresql`,
/// `sqlite`). An unknown selector fails before any parsing happens.
pub fn compile_by_name(
    text: &str,
    name: &str,
    includes: &IncludeMap,
    dialect: &str,
) -> Result<String> {
    let selected = Dialect::get_by_name(dialect)
        .ok_or_else(|| Error::unknown_dialect(dialect))?;
    compile(text, name, includes, selected.dialect_type())
}

/// Load every query file a specification references through `INCLUDE`
/// directives, resolving paths relative to `root`.
pub fn load_includes(text: &str, root: &Path) -> Result<IncludeMap> {
    let mut includes = IncludeMap::new();
    for path in collect_includes(text) {
        let content = std::fs::read_to_string(root.join(&path)).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;
        includes.insert(path, content);
    }
    Ok(includes)
}
