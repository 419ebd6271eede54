//! Line-scanning parser for test specification files
//!
//! The grammar is line-oriented: block keywords (`BEGIN SETUP`,
//! `BEGIN SELECT`, `BEGIN CREATE`, `BEGIN RESULT`, `END`), `INCLUDE`
//! directives, table headers (`[database.]name:`), a column-name line, and
//! whitespace-separated data rows. Parsing is an explicit state machine with
//! one transition per state so every failure can name the offending 1-based
//! line.
//!
//! The parser performs no I/O: query files referenced by `INCLUDE` must be
//! supplied up front in an [`IncludeMap`].

use crate::error::{Error, Result};
use crate::model::{
    Cell, ExpectedResult, IncludedQuery, Query, QueryKind, Row, Table, TableName, TestCase,
    TestFile,
};
use crate::types;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Map of include path (as written in the directive) to file content
pub type IncludeMap = HashMap<String, String>;

static RE_INCLUDE_SELECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^INCLUDE\s+SELECT\s+(.+)$").unwrap());
static RE_INCLUDE_CREATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^INCLUDE\s+CREATE\s+(.+)$").unwrap());

/// Parser state, one value per block kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Between blocks
    Outside,
    /// Inside `BEGIN SETUP`, between tables
    Setup,
    /// A table header was read; waiting for the column-name line
    TableHeader,
    /// Reading data rows
    TableRows,
    /// Inside `BEGIN SELECT` / `BEGIN CREATE`, capturing query text
    Query,
    /// Inside `BEGIN RESULT`, between the name line and the table
    Result,
}

/// Which block the table under construction belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableContext {
    Setup,
    Result,
}

/// Parser for the specification language
pub struct Parser<'a> {
    file: String,
    includes: &'a IncludeMap,
    state: State,

    cases: Vec<TestCase>,

    // Test case under construction
    setup: Vec<Table>,
    query_kind: Option<QueryKind>,
    included: Option<IncludedQuery>,
    literal: Option<String>,
    literal_lines: Vec<String>,
    result_target: Option<TableName>,
    result_table: Option<(Vec<String>, Vec<Row>)>,

    // Table under construction
    context: TableContext,
    table_name: Option<TableName>,
    column_names: Vec<String>,
    rows: Vec<Row>,
}

impl<'a> Parser<'a> {
    /// Parse the full text of one specification file. `file` is the name
    /// used in error messages and report labels.
    pub fn parse(text: &str, file: &str, includes: &'a IncludeMap) -> Result<TestFile> {
        let parser = Parser {
            file: file.to_string(),
            includes,
            state: State::Outside,
            cases: Vec::new(),
            setup: Vec::new(),
            query_kind: None,
            included: None,
            literal: None,
            literal_lines: Vec::new(),
            result_target: None,
            result_table: None,
            context: TableContext::Setup,
            table_name: None,
            column_names: Vec::new(),
            rows: Vec::new(),
        };
        parser.run(text)
    }

    fn run(mut self, text: &str) -> Result<TestFile> {
        let mut last_line = 0;
        for (number, raw) in text.lines().enumerate() {
            let number = number + 1;
            last_line = number;
            let line = raw.trim_end();

            // Comments are ignored in every state
            if line.starts_with('#') {
                continue;
            }
            if line.is_empty() {
                self.blank_line();
                continue;
            }

            match self.state {
                State::Outside => self.outside(line, number)?,
                State::Setup => self.in_setup(line, number)?,
                State::TableHeader => self.in_table_header(line),
                State::TableRows => self.in_table_rows(line, number)?,
                State::Query => self.in_query(line),
                State::Result => self.in_result(line, number)?,
            }
        }
        self.end_of_input(last_line)?;

        Ok(TestFile {
            name: self.file,
            cases: self.cases,
        })
    }

    /// A blank line ends the data rows of the current table; everywhere
    /// else it is insignificant.
    fn blank_line(&mut self) {
        if self.state == State::TableRows {
            self.finish_table();
        }
    }

    fn outside(&mut self, line: &str, number: usize) -> Result<()> {
        match line {
            "BEGIN SETUP" => {
                if self.query_kind.is_some() {
                    return Err(self.err(number, "test case is missing its RESULT block"));
                }
                self.state = State::Setup;
            }
            "BEGIN SELECT" => self.begin_query_block(QueryKind::Select, number)?,
            "BEGIN CREATE" => self.begin_query_block(QueryKind::Create, number)?,
            "BEGIN RESULT" => match self.query_kind {
                Some(QueryKind::Select) => {
                    // Anonymous result: the next line is the column header
                    self.context = TableContext::Result;
                    self.table_name = None;
                    self.state = State::TableHeader;
                }
                Some(QueryKind::Create) => self.state = State::Result,
                None => {
                    return Err(self.err(number, "RESULT block without a preceding query"));
                }
            },
            "END" => return Err(self.err(number, "unmatched END")),
            _ => {
                if let Some(captures) = RE_INCLUDE_SELECT.captures(line) {
                    self.include_query(QueryKind::Select, &captures[1], number)?;
                } else if let Some(captures) = RE_INCLUDE_CREATE.captures(line) {
                    self.include_query(QueryKind::Create, &captures[1], number)?;
                } else {
                    return Err(self.err(number, format!("unexpected line: {}", line)));
                }
            }
        }
        Ok(())
    }

    fn begin_query_block(&mut self, kind: QueryKind, number: usize) -> Result<()> {
        if self.literal.is_some() {
            return Err(self.err(number, "test case already has a query block"));
        }
        if let Some(existing) = self.query_kind {
            if existing != kind {
                return Err(self.err(
                    number,
                    "query block kind conflicts with the INCLUDE directive",
                ));
            }
        }
        self.query_kind = Some(kind);
        self.literal_lines.clear();
        self.state = State::Query;
        Ok(())
    }

    fn include_query(&mut self, kind: QueryKind, path: &str, number: usize) -> Result<()> {
        if self.included.is_some() {
            return Err(self.err(number, "test case already has an INCLUDE directive"));
        }
        if let Some(existing) = self.query_kind {
            if existing != kind {
                return Err(self.err(
                    number,
                    "INCLUDE directive kind conflicts with the query block",
                ));
            }
        }
        let text = self
            .includes
            .get(path)
            .ok_or_else(|| Error::missing_include(path))?;
        self.included = Some(IncludedQuery {
            path: path.to_string(),
            text: text.clone(),
        });
        self.query_kind = Some(kind);
        Ok(())
    }

    fn in_setup(&mut self, line: &str, number: usize) -> Result<()> {
        if line == "END" {
            self.state = State::Outside;
            return Ok(());
        }
        match line.strip_suffix(':').and_then(TableName::parse) {
            Some(name) => {
                self.context = TableContext::Setup;
                self.table_name = Some(name);
                self.state = State::TableHeader;
                Ok(())
            }
            None => Err(self.err(
                number,
                format!("expected a table header such as `name:` or `db.name:`, got: {}", line),
            )),
        }
    }

    fn in_table_header(&mut self, line: &str) {
        self.column_names = line.split_whitespace().map(str::to_string).collect();
        self.rows = Vec::new();
        self.state = State::TableRows;
    }

    fn in_table_rows(&mut self, line: &str, number: usize) -> Result<()> {
        if line == "END" {
            self.finish_table();
            return self.end_block(number);
        }
        let cells = self.split_cells(line, number)?;
        if cells.len() != self.column_names.len() {
            return Err(self.err(
                number,
                format!(
                    "row has {} values but the table has {} columns",
                    cells.len(),
                    self.column_names.len()
                ),
            ));
        }
        self.rows.push(Row::new(cells));
        Ok(())
    }

    fn in_query(&mut self, line: &str) {
        if line == "END" {
            let text = self.literal_lines.join("\n");
            self.literal = if text.is_empty() { None } else { Some(text) };
            self.literal_lines.clear();
            self.state = State::Outside;
        } else {
            self.literal_lines.push(line.to_string());
        }
    }

    fn in_result(&mut self, line: &str, number: usize) -> Result<()> {
        if line == "END" {
            return self.finish_case(number);
        }
        if self.result_table.is_some() {
            return Err(self.err(number, "a test case has exactly one result table"));
        }
        match line.strip_suffix(':').and_then(TableName::parse) {
            Some(name) => {
                if self.result_target.is_some() {
                    return Err(self.err(number, "result table is already named"));
                }
                self.context = TableContext::Result;
                self.table_name = Some(name);
                self.state = State::TableHeader;
                Ok(())
            }
            None => Err(self.err(
                number,
                format!("expected a result table header or END, got: {}", line),
            )),
        }
    }

    /// Close the table whose rows just ended and return to the owning block
    fn finish_table(&mut self) {
        let names = std::mem::take(&mut self.column_names);
        let rows = std::mem::take(&mut self.rows);
        match self.context {
            TableContext::Setup => {
                let name = self.table_name.take().expect("setup table has a header");
                let columns = types::infer_columns(&names, &rows);
                self.setup.push(Table {
                    name,
                    columns,
                    rows,
                });
                self.state = State::Setup;
            }
            TableContext::Result => {
                self.result_target = self.table_name.take();
                self.result_table = Some((names, rows));
                self.state = State::Result;
            }
        }
    }

    /// An `END` read while still in data rows closes the table and its
    /// enclosing block in one step.
    fn end_block(&mut self, number: usize) -> Result<()> {
        match self.context {
            TableContext::Setup => {
                self.state = State::Outside;
                Ok(())
            }
            TableContext::Result => self.finish_case(number),
        }
    }

    fn finish_case(&mut self, number: usize) -> Result<()> {
        let kind = match self.query_kind.take() {
            Some(kind) => kind,
            None => return Err(self.err(number, "test case is missing its query")),
        };
        let included = self.included.take();
        let literal = self.literal.take();
        if included.is_none() && literal.is_none() {
            return Err(self.err(number, "query block is empty"));
        }
        let (names, rows) = match self.result_table.take() {
            Some(table) => table,
            None => return Err(self.err(number, "RESULT block has no table")),
        };
        let target = self.result_target.take();
        let columns = types::infer_columns(&names, &rows);
        self.cases.push(TestCase {
            setup: std::mem::take(&mut self.setup),
            query: Query {
                kind,
                included,
                literal,
            },
            result: ExpectedResult {
                target,
                columns,
                rows,
            },
        });
        self.state = State::Outside;
        Ok(())
    }

    fn end_of_input(&mut self, last_line: usize) -> Result<()> {
        if self.state != State::Outside {
            let block = match self.state {
                State::Setup | State::TableHeader | State::TableRows
                    if self.context == TableContext::Setup =>
                {
                    "SETUP block"
                }
                State::Query => "query block",
                State::Result | State::TableHeader | State::TableRows => "RESULT block",
                _ => "block",
            };
            return Err(self.err(last_line, format!("end of input inside {}", block)));
        }
        if self.query_kind.is_some() {
            return Err(self.err(last_line, "test case is missing its RESULT block"));
        }
        if !self.setup.is_empty() {
            return Err(self.err(last_line, "test case is missing its query"));
        }
        Ok(())
    }

    /// Split a data row into cells: whitespace separated, with single quotes
    /// grouping words. Quoted cells keep their quotes.
    fn split_cells(&self, line: &str, number: usize) -> Result<Vec<Cell>> {
        let mut cells = Vec::new();
        let mut chars = line.chars().peekable();
        loop {
            while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
                chars.next();
            }
            if chars.peek().is_none() {
                break;
            }
            let mut text = String::new();
            let mut quoted = false;
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                chars.next();
                text.push(c);
                if c == '\'' {
                    quoted = true;
                    loop {
                        match chars.next() {
                            Some('\'') => {
                                text.push('\'');
                                break;
                            }
                            Some(inner) => text.push(inner),
                            None => {
                                return Err(
                                    self.err(number, "unterminated quote in data row")
                                );
                            }
                        }
                    }
                }
            }
            cells.push(Cell::new(text, quoted));
        }
        Ok(cells)
    }

    fn err(&self, line: usize, message: impl Into<String>) -> Error {
        Error::syntax(&self.file, line, message)
    }
}

/// List the include paths referenced by a specification, in order of first
/// appearance. Useful for loading an [`IncludeMap`] before parsing.
pub fn collect_includes(text: &str) -> Vec<String> {
    let mut paths: Vec<String> = Vec::new();
    for line in text.lines() {
        let line = line.trim_end();
        let captured = RE_INCLUDE_SELECT
            .captures(line)
            .or_else(|| RE_INCLUDE_CREATE.captures(line));
        if let Some(captures) = captured {
            let path = captures[1].to_string();
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }
    paths
}
