//! Column type inference
//!
//! Cell tokens are classified into a small ordered set of SQL types; a
//! column's type is the least upper bound (join) of the classifications of
//! every cell observed in that column position. The order forms a chain,
//! so the join of two types is simply the greater one:
//!
//! `Null < Boolean < Integer < Real < Text`
//!
//! Quoted cells are special: they are always classified as text and their
//! token is emitted verbatim, on the assumption that the author supplied a
//! dialect-correct literal (typically a date or a string with spaces).

use crate::dialects::Dialect;
use crate::model::{Cell, Column, Row};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer literal: optional sign followed by digits
static RE_INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?\d+$").unwrap());

/// Real literal: decimal point and/or exponent forms
static RE_REAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?((\d+\.\d*)|(\d*\.\d+))([Ee][+-]?\d+)?$|^[+-]?\d+[Ee][+-]?\d+$").unwrap()
});

/// The inferable column types, ordered from least to most general
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SqlType {
    /// No non-null value observed in the column
    Null,
    Boolean,
    Integer,
    Real,
    Text,
}

impl SqlType {
    /// Least upper bound of two classifications. Total on all pairs: the
    /// ordering is a chain, so the join is the maximum.
    ///
    /// # Example
    ///
    /// ```
    /// use sqlunit::SqlType;
    ///
    /// assert_eq!(SqlType::Boolean.join(SqlType::Integer), SqlType::Integer);
    /// assert_eq!(SqlType::Integer.join(SqlType::Text), SqlType::Text);
    /// assert_eq!(SqlType::Null.join(SqlType::Real), SqlType::Real);
    /// ```
    pub fn join(self, other: SqlType) -> SqlType {
        self.max(other)
    }

    /// Classify a single raw cell.
    ///
    /// `Null` (exactly) and the empty token are null; `True`/`False`
    /// (exactly) are boolean; integer and decimal/exponent grammars map to
    /// the numeric types; quoted tokens and everything else are text.
    pub fn of_cell(cell: &Cell) -> SqlType {
        if cell.quoted {
            return SqlType::Text;
        }
        match cell.text.as_str() {
            "" | "Null" => SqlType::Null,
            "True" | "False" => SqlType::Boolean,
            t if RE_INTEGER.is_match(t) => SqlType::Integer,
            t if RE_REAL.is_match(t) => SqlType::Real,
            _ => SqlType::Text,
        }
    }

    /// Infer a column's type from every cell observed in that position
    pub fn infer<'a>(cells: impl IntoIterator<Item = &'a Cell>) -> SqlType {
        cells
            .into_iter()
            .fold(SqlType::Null, |acc, cell| acc.join(SqlType::of_cell(cell)))
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SqlType::Null => "null",
            SqlType::Boolean => "boolean",
            SqlType::Integer => "integer",
            SqlType::Real => "real",
            SqlType::Text => "text",
        };
        write!(f, "{}", name)
    }
}

/// Build typed columns from header names and the rows beneath them.
///
/// Rows must be rectangular; the parser guarantees this before calling.
pub fn infer_columns(names: &[String], rows: &[Row]) -> Vec<Column> {
    names
        .iter()
        .enumerate()
        .map(|(position, name)| Column {
            name: name.clone(),
            sql_type: SqlType::infer(rows.iter().map(move |row| &row.cells[position])),
        })
        .collect()
}

/// Render one cell as a SQL literal for a column of the given final type.
///
/// Quoted cells pass through verbatim and nulls render as `NULL` regardless
/// of the column type. Booleans that were promoted into a numeric column
/// render as `1`/`0`; any value landing in a text column is single-quoted.
pub fn render_cell(cell: &Cell, column_type: SqlType, dialect: Dialect) -> String {
    if cell.quoted {
        return cell.text.clone();
    }
    let class = SqlType::of_cell(cell);
    if class == SqlType::Null {
        return "NULL".to_string();
    }
    match column_type {
        SqlType::Boolean => dialect.boolean_literal(cell.text == "True").to_string(),
        SqlType::Integer | SqlType::Real => {
            if class == SqlType::Boolean {
                if cell.text == "True" { "1" } else { "0" }.to_string()
            } else {
                cell.text.clone()
            }
        }
        SqlType::Text | SqlType::Null => quote_string(&cell.text),
    }
}

/// Quote a string as a SQL literal, doubling embedded single quotes
pub fn quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialects::{Dialect, DialectType};

    fn bare(text: &str) -> Cell {
        Cell::new(text, false)
    }

    fn quoted(text: &str) -> Cell {
        Cell::new(text, true)
    }

    #[test]
    fn test_classification() {
        assert_eq!(SqlType::of_cell(&bare("Null")), SqlType::Null);
        assert_eq!(SqlType::of_cell(&bare("True")), SqlType::Boolean);
        assert_eq!(SqlType::of_cell(&bare("False")), SqlType::Boolean);
        assert_eq!(SqlType::of_cell(&bare("42")), SqlType::Integer);
        assert_eq!(SqlType::of_cell(&bare("-7")), SqlType::Integer);
        assert_eq!(SqlType::of_cell(&bare("3.25")), SqlType::Real);
        assert_eq!(SqlType::of_cell(&bare(".5")), SqlType::Real);
        assert_eq!(SqlType::of_cell(&bare("1e9")), SqlType::Real);
        assert_eq!(SqlType::of_cell(&bare("2.5E-3")), SqlType::Real);
        assert_eq!(SqlType::of_cell(&bare("March")), SqlType::Text);
        assert_eq!(SqlType::of_cell(&bare("2024-01-05")), SqlType::Text);
    }

    #[test]
    fn test_classification_is_case_sensitive() {
        // Only the exact spellings are special; anything else is text
        assert_eq!(SqlType::of_cell(&bare("true")), SqlType::Text);
        assert_eq!(SqlType::of_cell(&bare("NULL")), SqlType::Text);
        assert_eq!(SqlType::of_cell(&bare("null")), SqlType::Text);
    }

    #[test]
    fn test_quoted_cells_are_text() {
        assert_eq!(SqlType::of_cell(&quoted("'2024-01-05'")), SqlType::Text);
        assert_eq!(SqlType::of_cell(&quoted("'42'")), SqlType::Text);
        assert_eq!(SqlType::of_cell(&quoted("'Null'")), SqlType::Text);
    }

    #[test]
    fn test_join_is_total_and_monotone() {
        let all = [
            SqlType::Null,
            SqlType::Boolean,
            SqlType::Integer,
            SqlType::Real,
            SqlType::Text,
        ];
        for &a in &all {
            for &b in &all {
                let joined = a.join(b);
                assert_eq!(joined, b.join(a), "join must be commutative");
                assert!(joined >= a && joined >= b, "join must be an upper bound");
            }
            assert_eq!(a.join(a), a, "join must be idempotent");
            assert_eq!(a.join(SqlType::Null), a, "null is the identity");
            assert_eq!(a.join(SqlType::Text), SqlType::Text, "text absorbs");
        }
    }

    #[test]
    fn test_infer_boolean_plus_integer_is_integer() {
        let cells = [bare("True"), bare("1")];
        assert_eq!(SqlType::infer(cells.iter()), SqlType::Integer);
    }

    #[test]
    fn test_infer_boolean_plus_quoted_is_text() {
        let cells = [bare("True"), quoted("'x'")];
        assert_eq!(SqlType::infer(cells.iter()), SqlType::Text);
    }

    #[test]
    fn test_infer_all_null_column() {
        let cells = [bare("Null"), bare("Null")];
        assert_eq!(SqlType::infer(cells.iter()), SqlType::Null);
    }

    #[test]
    fn test_infer_integer_plus_real_is_real() {
        let cells = [bare("1"), bare("2.5")];
        assert_eq!(SqlType::infer(cells.iter()), SqlType::Real);
    }

    #[test]
    fn test_render_boolean_spellings() {
        let mysql = Dialect::get(DialectType::MySQL);
        let sqlite = Dialect::get(DialectType::SQLite);
        assert_eq!(render_cell(&bare("True"), SqlType::Boolean, mysql), "TRUE");
        assert_eq!(render_cell(&bare("False"), SqlType::Boolean, mysql), "FALSE");
        assert_eq!(render_cell(&bare("True"), SqlType::Boolean, sqlite), "1");
        assert_eq!(render_cell(&bare("False"), SqlType::Boolean, sqlite), "0");
    }

    #[test]
    fn test_render_boolean_promoted_to_integer() {
        let mysql = Dialect::get(DialectType::MySQL);
        assert_eq!(render_cell(&bare("True"), SqlType::Integer, mysql), "1");
        assert_eq!(render_cell(&bare("False"), SqlType::Integer, mysql), "0");
        assert_eq!(render_cell(&bare("7"), SqlType::Integer, mysql), "7");
    }

    #[test]
    fn test_render_text_column_quotes_everything_unquoted() {
        let pg = Dialect::get(DialectType::PostgreSQL);
        assert_eq!(render_cell(&bare("March"), SqlType::Text, pg), "'March'");
        assert_eq!(render_cell(&bare("1"), SqlType::Text, pg), "'1'");
        assert_eq!(render_cell(&bare("True"), SqlType::Text, pg), "'True'");
        assert_eq!(render_cell(&bare("O'Brien"), SqlType::Text, pg), "'O''Brien'");
    }

    #[test]
    fn test_render_quoted_cell_verbatim() {
        let pg = Dialect::get(DialectType::PostgreSQL);
        assert_eq!(
            render_cell(&quoted("'2024-01-05'"), SqlType::Text, pg),
            "'2024-01-05'"
        );
    }

    #[test]
    fn test_render_null_in_any_column() {
        let mysql = Dialect::get(DialectType::MySQL);
        assert_eq!(render_cell(&bare("Null"), SqlType::Integer, mysql), "NULL");
        assert_eq!(render_cell(&bare("Null"), SqlType::Text, mysql), "NULL");
    }

    #[test]
    fn test_infer_columns_positions() {
        let rows = vec![
            Row::new(vec![bare("March"), bare("130")]),
            Row::new(vec![bare("April"), bare("50")]),
        ];
        let columns = infer_columns(&["month".to_string(), "revenue".to_string()], &rows);
        assert_eq!(columns[0].sql_type, SqlType::Text);
        assert_eq!(columns[1].sql_type, SqlType::Integer);
    }
}
