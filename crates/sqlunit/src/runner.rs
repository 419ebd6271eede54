//! Test run orchestration
//!
//! A [`TestRun`] sequences the cases of one or more parsed files into a
//! single script, assigning each case a 1-based report ordinal that keeps
//! increasing across files, and closes the script with the TAP plan line.
//! All counter state lives in the run value itself, so concurrent runs never
//! interfere.

use crate::generator::{Generator, GeneratorOptions};
use crate::model::TestFile;
use crate::DialectType;

/// An in-progress script covering any number of specification files
pub struct TestRun {
    generator: Generator,
    script: String,
    next_ordinal: usize,
}

impl TestRun {
    /// Start a run with default options
    pub fn new(dialect_type: DialectType) -> Self {
        Self::with_options(dialect_type, GeneratorOptions::default())
    }

    /// Start a run with explicit options
    pub fn with_options(dialect_type: DialectType, options: GeneratorOptions) -> Self {
        let mut generator = Generator::with_options(dialect_type, options);
        let script = generator.preamble();
        Self {
            generator,
            script,
            next_ordinal: 1,
        }
    }

    /// Append a parsed file's cases, continuing the ordinal sequence
    pub fn add_file(&mut self, file: &TestFile) {
        let header = self.generator.begin_file(file);
        self.script.push_str(&header);
        for case in &file.cases {
            let fragment = self.generator.emit_case(&file.name, case, self.next_ordinal);
            self.script.push_str(&fragment);
            self.next_ordinal += 1;
        }
    }

    /// Number of cases emitted so far
    pub fn cases_emitted(&self) -> usize {
        self.next_ordinal - 1
    }

    /// Close the script with the plan line and return it
    pub fn finish(mut self) -> String {
        self.script
            .push_str(&format!("SELECT '1..{}';\n", self.cases_emitted()));
        self.script
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_run_still_emits_plan() {
        let run = TestRun::new(DialectType::SQLite);
        assert_eq!(run.cases_emitted(), 0);
        let script = run.finish();
        assert!(script.ends_with("SELECT '1..0';\n"));
    }
}
