//! Orchestration Tests
//!
//! Report ordinals must be monotonic across files with a single closing
//! plan line, and ephemeral databases must be created once per run.

use sqlunit::{parse_spec, DialectType, IncludeMap, TestRun};

fn spec_for(table: &str, database: Option<&str>) -> String {
    let qualified = match database {
        Some(db) => format!("{}.{}", db, table),
        None => table.to_string(),
    };
    format!(
        "BEGIN SETUP\n\
         {qualified}:\n\
         x\n\
         1\n\
         END\n\
         BEGIN SELECT\n\
         SELECT x FROM {qualified};\n\
         END\n\
         BEGIN RESULT\n\
         x\n\
         1\n\
         END\n"
    )
}

fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

#[test]
fn test_ordinals_continue_across_files() {
    let includes = IncludeMap::new();
    let first = parse_spec(&spec_for("a", None), "first.rdbu", &includes).unwrap();
    let second = parse_spec(&spec_for("b", None), "second.rdbu", &includes).unwrap();

    let mut run = TestRun::new(DialectType::MySQL);
    run.add_file(&first);
    assert_eq!(run.cases_emitted(), 1);
    run.add_file(&second);
    assert_eq!(run.cases_emitted(), 2);

    let script = run.finish();
    assert!(script.contains("'ok 1 - first.rdbu: test_select_result'"));
    assert!(script.contains("'ok 2 - second.rdbu: test_select_result'"));
    assert_eq!(count(&script, "SELECT '1.."), 1, "exactly one plan line");
    assert!(script.ends_with("SELECT '1..2';\n"));
}

#[test]
fn test_ordinals_within_one_file() {
    let text = format!(
        "{}{}{}",
        spec_for("a", None),
        spec_for("b", None),
        spec_for("c", None)
    );
    let file = parse_spec(&text, "multi.rdbu", &IncludeMap::new()).unwrap();
    assert_eq!(file.cases.len(), 3);

    let mut run = TestRun::new(DialectType::SQLite);
    run.add_file(&file);
    let script = run.finish();
    for ordinal in 1..=3 {
        assert!(
            script.contains(&format!("'ok {} - multi.rdbu: test_select_result'", ordinal)),
            "missing ordinal {}",
            ordinal
        );
    }
    assert!(script.ends_with("SELECT '1..3';\n"));
}

#[test]
fn test_shared_database_created_once_per_run() {
    let includes = IncludeMap::new();
    let first = parse_spec(&spec_for("a", Some("shared")), "first.rdbu", &includes).unwrap();
    let second = parse_spec(&spec_for("b", Some("shared")), "second.rdbu", &includes).unwrap();

    let mut run = TestRun::new(DialectType::MySQL);
    run.add_file(&first);
    run.add_file(&second);
    let script = run.finish();

    assert_eq!(count(&script, "CREATE DATABASE `test_shared`;"), 1);
    // Both files' queries still run against the ephemeral database
    assert_eq!(count(&script, "SELECT x FROM test_shared.a;"), 1);
    assert_eq!(count(&script, "SELECT x FROM test_shared.b;"), 1);
}

#[test]
fn test_default_database_emitted_once() {
    let includes = IncludeMap::new();
    let first = parse_spec(&spec_for("a", None), "first.rdbu", &includes).unwrap();
    let second = parse_spec(&spec_for("b", None), "second.rdbu", &includes).unwrap();

    let mut run = TestRun::new(DialectType::PostgreSQL);
    run.add_file(&first);
    run.add_file(&second);
    let script = run.finish();

    assert_eq!(count(&script, "CREATE SCHEMA \"test_default\";"), 1);
    assert_eq!(count(&script, "-- Input from first.rdbu"), 1);
    assert_eq!(count(&script, "-- Input from second.rdbu"), 1);
}
