//! Stryker mutation-testing-elements reports.
//!
//! Only the parts of the schema the quality analysis needs are modelled;
//! unknown fields are ignored. After loading, mutants and tests are flattened
//! in file-path order and addressed by dense indices that double as matrix
//! columns and rows.

use crate::config::MutantSelection;
use crate::error::{QualityError, Result};
use crate::matrix::{MutantCoverage, MutationMatrices};
use crate::operators::{deduce_operator_name, find_code};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationReport {
    pub schema_version: String,
    pub files: BTreeMap<String, FileResult>,
    pub test_files: Option<BTreeMap<String, TestFile>>,
    pub project_root: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResult {
    pub language: String,
    pub source: String,
    pub mutants: Vec<Mutant>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mutant {
    pub id: String,
    pub mutator_name: String,
    pub replacement: Option<String>,
    pub location: Location,
    pub status: MutantStatus,
    pub status_reason: Option<String>,
    pub killed_by: Option<Vec<String>>,
    pub covered_by: Option<Vec<String>>,
    /// Loaded once at startup, so coverage could not be measured per test.
    #[serde(rename = "static")]
    pub is_static: Option<bool>,
    pub tests_completed: Option<f64>,
}

impl Mutant {
    pub fn is_static(&self) -> bool {
        self.is_static.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutantStatus {
    Killed,
    Survived,
    NoCoverage,
    CompileError,
    RuntimeError,
    Timeout,
    Ignored,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub start: Position,
    pub end: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestFile {
    pub source: Option<String>,
    pub tests: Vec<TestDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestDefinition {
    pub id: String,
    pub name: String,
}

/// A mutant together with the operator it is scored under.
#[derive(Debug, Clone)]
pub struct IndexedMutant {
    pub operator: String,
    pub file: String,
    pub mutant: Mutant,
}

/// A loaded report with mutants and tests flattened to dense indices.
#[derive(Debug, Clone)]
pub struct Report {
    pub schema_version: String,
    mutants: Vec<IndexedMutant>,
    tests: Vec<TestDefinition>,
    test_index: HashMap<String, usize>,
    sources: BTreeMap<String, String>,
}

impl Report {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let raw: MutationReport = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    pub fn from_raw(raw: MutationReport) -> Result<Self> {
        let test_files = raw.test_files.ok_or_else(|| {
            QualityError::InvalidInput(
                "report has no testFiles section; per-test kill data is required".to_string(),
            )
        })?;

        let tests: Vec<TestDefinition> = test_files
            .into_values()
            .flat_map(|file| file.tests)
            .collect();
        let mut test_index = HashMap::with_capacity(tests.len());
        for (index, test) in tests.iter().enumerate() {
            if test_index.insert(test.id.clone(), index).is_some() {
                return Err(QualityError::InvalidInput(format!(
                    "duplicate test id '{}'",
                    test.id
                )));
            }
        }

        let mut mutants = Vec::new();
        let mut sources = BTreeMap::new();
        let mut seen_ids = HashSet::new();
        for (path, file) in raw.files {
            for mutant in file.mutants {
                if !seen_ids.insert(mutant.id.clone()) {
                    return Err(QualityError::InvalidInput(format!(
                        "duplicate mutant id '{}'",
                        mutant.id
                    )));
                }
                mutants.push(IndexedMutant {
                    operator: mutant.mutator_name.clone(),
                    file: path.clone(),
                    mutant,
                });
            }
            sources.insert(path, file.source);
        }

        Ok(Self {
            schema_version: raw.schema_version,
            mutants,
            tests,
            test_index,
            sources,
        })
    }

    pub fn mutants(&self) -> &[IndexedMutant] {
        &self.mutants
    }

    pub fn tests(&self) -> &[TestDefinition] {
        &self.tests
    }

    /// Renames every mutant's operator to its fine-grained rewrite name. Mutants
    /// without a replacement or with a location outside the source keep their
    /// mutator name.
    pub fn deduce_operators(&mut self) {
        for entry in &mut self.mutants {
            let Some(replacement) = entry.mutant.replacement.as_deref() else {
                continue;
            };
            let original = self
                .sources
                .get(&entry.file)
                .and_then(|source| find_code(source, &entry.mutant.location));
            match original {
                Some(original) => {
                    entry.operator =
                        deduce_operator_name(&entry.mutant.mutator_name, &original, replacement);
                }
                None => tracing::warn!(
                    mutant = %entry.mutant.id,
                    file = %entry.file,
                    "mutant location lies outside the file source; keeping mutator name"
                ),
            }
        }
    }

    /// Operator names in use, sorted and de-duplicated.
    pub fn used_operators(&self) -> Vec<String> {
        let mut operators: Vec<String> = self.mutants.iter().map(|m| m.operator.clone()).collect();
        operators.sort();
        operators.dedup();
        operators
    }

    /// Column indices of the operator's mutants that pass `selection`.
    pub fn mutants_by_operator(&self, operator: &str, selection: MutantSelection) -> Vec<usize> {
        self.mutants
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.operator == operator)
            .filter(|(_, entry)| {
                !selection.killed_only || entry.mutant.status == MutantStatus::Killed
            })
            .filter(|(_, entry)| selection.include_static || !entry.mutant.is_static())
            .map(|(index, _)| index)
            .collect()
    }

    /// Total tests run against the operator's mutants, static ones included.
    pub fn count_test_executions(&self, operator: &str) -> u64 {
        let total: f64 = self
            .mutants
            .iter()
            .filter(|entry| entry.operator == operator)
            .filter_map(|entry| entry.mutant.tests_completed)
            .sum();
        total as u64
    }

    /// Killers and coverers of every mutant as test indices.
    pub fn coverage(&self) -> Result<Vec<MutantCoverage>> {
        self.mutants
            .iter()
            .map(|entry| {
                let mutant = &entry.mutant;
                Ok(MutantCoverage {
                    killed_by: self.resolve_tests(mutant, mutant.killed_by.as_deref())?,
                    covered_by: self.resolve_tests(mutant, mutant.covered_by.as_deref())?,
                    independently_coverable: !mutant.is_static(),
                })
            })
            .collect()
    }

    pub fn matrices(&self) -> Result<MutationMatrices> {
        MutationMatrices::from_mutants(self.tests.len(), &self.coverage()?)
    }

    /// Drops operators whose selected mutants nobody kills; they have no
    /// coverage quality to speak of.
    pub fn operators_with_killed_mutants(
        &self,
        operators: &[String],
        matrices: &MutationMatrices,
        selection: MutantSelection,
    ) -> Vec<String> {
        operators
            .iter()
            .filter(|operator| {
                let has_killed = self
                    .mutants_by_operator(operator, selection)
                    .into_iter()
                    .any(|mutant| !matrices.is_equivalent(mutant));
                if !has_killed {
                    tracing::info!(
                        "mutation operator {} has no killed mutants and therefore no coverage quality",
                        operator
                    );
                }
                has_killed
            })
            .cloned()
            .collect()
    }

    fn resolve_tests(&self, mutant: &Mutant, ids: Option<&[String]>) -> Result<Vec<usize>> {
        ids.unwrap_or_default()
            .iter()
            .map(|id| {
                self.test_index
                    .get(id)
                    .copied()
                    .ok_or_else(|| QualityError::UnknownTest {
                        mutant: mutant.id.clone(),
                        test: id.clone(),
                    })
            })
            .collect()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::REPORT;
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_flattening_order() {
        let report = Report::from_json(REPORT).unwrap();
        let ids: Vec<&str> = report.mutants().iter().map(|m| m.mutant.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1", "2", "3"]);
        let tests: Vec<&str> = report.tests().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(tests, vec!["adds", "subtracts", "compares"]);
        assert_eq!(report.schema_version, "1.0");
    }

    #[test]
    fn test_from_path() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(REPORT.as_bytes()).unwrap();
        let report = Report::from_path(file.path()).unwrap();
        assert_eq!(report.mutants().len(), 4);
        assert_eq!(report.tests().len(), 3);
    }

    #[test]
    fn test_used_operators() {
        let report = Report::from_json(REPORT).unwrap();
        assert_eq!(
            report.used_operators(),
            vec!["ArithmeticOperator", "BooleanLiteral", "EqualityOperator"]
        );
    }

    #[test]
    fn test_mutants_by_operator_selection() {
        let report = Report::from_json(REPORT).unwrap();
        assert_eq!(report.mutants_by_operator("EqualityOperator", MutantSelection::ALL), vec![1, 2]);
        assert_eq!(report.mutants_by_operator("EqualityOperator", MutantSelection::KILLED), vec![1]);

        let no_static = MutantSelection {
            killed_only: false,
            include_static: false,
        };
        assert!(report.mutants_by_operator("BooleanLiteral", no_static).is_empty());
        assert_eq!(report.mutants_by_operator("BooleanLiteral", MutantSelection::ALL), vec![3]);
    }

    #[test]
    fn test_count_test_executions() {
        let report = Report::from_json(REPORT).unwrap();
        assert_eq!(report.count_test_executions("EqualityOperator"), 3);
        assert_eq!(report.count_test_executions("BooleanLiteral"), 3);
        assert_eq!(report.count_test_executions("Missing"), 0);
    }

    #[test]
    fn test_matrices() {
        let report = Report::from_json(REPORT).unwrap();
        let matrices = report.matrices().unwrap();
        assert_eq!(matrices.number_of_tests(), 3);
        assert_eq!(matrices.number_of_mutants(), 4);
        assert_eq!(matrices.killers_of_mutant(0), vec![0]);
        assert_eq!(matrices.coverers_of_mutant(0), vec![0, 1]);
        assert_eq!(matrices.equivalent_mutants(), &[2]);
        // static mutant: coverage mirrors kills
        assert_eq!(matrices.coverers_of_mutant(3), vec![1]);
    }

    #[test]
    fn test_operators_with_killed_mutants() {
        let report = Report::from_json(REPORT).unwrap();
        let matrices = report.matrices().unwrap();
        let operators = report.used_operators();
        let no_static = MutantSelection::default();
        assert_eq!(
            report.operators_with_killed_mutants(&operators, &matrices, no_static),
            vec!["ArithmeticOperator", "EqualityOperator"]
        );
    }

    #[test]
    fn test_deduce_operators() {
        let mut report = Report::from_json(REPORT).unwrap();
        report.deduce_operators();
        assert_eq!(
            report.used_operators(),
            vec![
                "ArithmeticOperator+To-",
                "BooleanLiteraltrueTofalse",
                "EqualityOperator<To<=",
                "EqualityOperator<To>=",
            ]
        );
    }

    #[test]
    fn test_unknown_test_id() {
        let broken = REPORT.replace(r#""killedBy": ["2"]"#, r#""killedBy": ["9"]"#);
        let report = Report::from_json(&broken).unwrap();
        assert!(matches!(
            report.matrices(),
            Err(QualityError::UnknownTest { ref test, .. }) if test == "9"
        ));
    }

    #[test]
    fn test_missing_test_files() {
        let json = r#"{ "schemaVersion": "1.0", "files": {} }"#;
        assert!(matches!(
            Report::from_json(json),
            Err(QualityError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_duplicate_mutant_id() {
        let broken = REPORT.replace(r#""id": "3""#, r#""id": "0""#);
        assert!(matches!(
            Report::from_json(&broken),
            Err(QualityError::InvalidInput(_))
        ));
    }
}
