//! Kill and coverage matrices for one mutation report.
//!
//! Rows are tests, columns are mutants. Every transformation returns a fresh
//! [`MutationMatrices`]; nothing is modified in place, so a matrix narrowed to
//! one operator can be scored independently of every other operator.

use crate::config::{CoverageBasis, SolverConfig};
use crate::error::{QualityError, Result};
use crate::minimize::{self, CoverWarning};
use std::collections::HashSet;
use std::sync::OnceLock;

/// Upper bound on how many basis mutants the covering tests of a mutant may
/// reach before it stops counting as difficult to reach.
pub const MCOV: usize = 4;

/// Dense row-major boolean grid that knows its own shape, so an empty
/// dimension never hides the other one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoolMatrix {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
}

impl BoolMatrix {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![false; rows * cols],
        }
    }

    /// Builds a matrix from nested rows. An empty `rows` yields a `0x0` matrix;
    /// use [`BoolMatrix::new`] when the column count must survive zero rows.
    pub fn from_rows(rows: Vec<Vec<bool>>) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let height = rows.len();
        let mut cells = Vec::with_capacity(height * cols);
        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != cols {
                return Err(QualityError::InvalidInput(format!(
                    "row {} has {} columns, expected {}",
                    index,
                    row.len(),
                    cols
                )));
            }
            cells.extend(row);
        }
        Ok(Self {
            rows: height,
            cols,
            cells,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// # Panics
    /// If `row` or `col` is out of range.
    pub fn get(&self, row: usize, col: usize) -> bool {
        self.check(row, col);
        self.cells[row * self.cols + col]
    }

    /// # Panics
    /// If `row` or `col` is out of range.
    pub fn set(&mut self, row: usize, col: usize, value: bool) {
        self.check(row, col);
        self.cells[row * self.cols + col] = value;
    }

    /// # Panics
    /// If `row` is out of range.
    pub fn row(&self, row: usize) -> &[bool] {
        assert!(row < self.rows, "row {} out of range ({} rows)", row, self.rows);
        &self.cells[row * self.cols..(row + 1) * self.cols]
    }

    /// # Panics
    /// If `col` is out of range.
    pub fn column(&self, col: usize) -> impl Iterator<Item = bool> + '_ {
        assert!(col < self.cols, "column {} out of range ({} columns)", col, self.cols);
        (0..self.rows).map(move |row| self.cells[row * self.cols + col])
    }

    pub fn to_rows(&self) -> Vec<Vec<bool>> {
        (0..self.rows).map(|row| self.row(row).to_vec()).collect()
    }

    fn select_rows(&self, keep: &[usize]) -> Self {
        let mut cells = Vec::with_capacity(keep.len() * self.cols);
        for &row in keep {
            cells.extend_from_slice(self.row(row));
        }
        Self {
            rows: keep.len(),
            cols: self.cols,
            cells,
        }
    }

    fn select_columns(&self, keep: &[usize]) -> Self {
        let mut cells = Vec::with_capacity(self.rows * keep.len());
        for row in 0..self.rows {
            let source = self.row(row);
            cells.extend(keep.iter().map(|&col| source[col]));
        }
        Self {
            rows: self.rows,
            cols: keep.len(),
            cells,
        }
    }

    fn check(&self, row: usize, col: usize) {
        assert!(
            row < self.rows && col < self.cols,
            "cell ({}, {}) out of range for {}x{} matrix",
            row,
            col,
            self.rows,
            self.cols
        );
    }
}

/// Which tests killed and covered one mutant, as supplied by a report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutantCoverage {
    pub killed_by: Vec<usize>,
    pub covered_by: Vec<usize>,
    /// False when the framework could not measure coverage for this mutant on
    /// its own; its coverage column then mirrors its kill column.
    pub independently_coverable: bool,
}

#[derive(Debug, Clone)]
pub struct MutationMatrices {
    kill: BoolMatrix,
    coverage: BoolMatrix,
    equivalent: OnceLock<Vec<usize>>,
}

impl PartialEq for MutationMatrices {
    fn eq(&self, other: &Self) -> bool {
        self.kill == other.kill && self.coverage == other.coverage
    }
}

/// Result of [`MutationMatrices::minimize`].
#[derive(Debug, Clone)]
pub struct Minimized {
    pub matrices: MutationMatrices,
    pub warnings: Vec<CoverWarning>,
}

impl MutationMatrices {
    pub fn new(kill: BoolMatrix, coverage: BoolMatrix) -> Result<Self> {
        if kill.rows() != coverage.rows() || kill.cols() != coverage.cols() {
            return Err(QualityError::ShapeMismatch {
                kill_rows: kill.rows(),
                kill_cols: kill.cols(),
                coverage_rows: coverage.rows(),
                coverage_cols: coverage.cols(),
            });
        }
        Ok(Self::from_parts(kill, coverage))
    }

    pub fn from_rows(kill: Vec<Vec<bool>>, coverage: Vec<Vec<bool>>) -> Result<Self> {
        Self::new(BoolMatrix::from_rows(kill)?, BoolMatrix::from_rows(coverage)?)
    }

    /// Builds the matrices for `test_count` tests and one column per entry of
    /// `mutants`, in order.
    pub fn from_mutants(test_count: usize, mutants: &[MutantCoverage]) -> Result<Self> {
        let mut kill = BoolMatrix::new(test_count, mutants.len());
        let mut coverage = BoolMatrix::new(test_count, mutants.len());

        for (mutant, info) in mutants.iter().enumerate() {
            for &test in &info.killed_by {
                check_index("test", test, test_count)?;
                kill.set(test, mutant, true);
            }
            let covering = if info.independently_coverable {
                &info.covered_by
            } else {
                &info.killed_by
            };
            for &test in covering {
                check_index("test", test, test_count)?;
                coverage.set(test, mutant, true);
            }
        }

        Ok(Self::from_parts(kill, coverage))
    }

    fn from_parts(kill: BoolMatrix, coverage: BoolMatrix) -> Self {
        Self {
            kill,
            coverage,
            equivalent: OnceLock::new(),
        }
    }

    pub fn kill_matrix(&self) -> &BoolMatrix {
        &self.kill
    }

    pub fn coverage_matrix(&self) -> &BoolMatrix {
        &self.coverage
    }

    pub fn number_of_tests(&self) -> usize {
        self.kill.rows()
    }

    pub fn number_of_mutants(&self) -> usize {
        self.kill.cols()
    }

    /// Drops the given test rows. Remaining rows keep their relative order.
    pub fn remove_rows(&self, rows: &[usize]) -> Result<Self> {
        if rows.is_empty() {
            return Ok(self.clone());
        }
        let drop = index_mask("test", rows, self.number_of_tests())?;
        let keep: Vec<usize> = (0..self.number_of_tests()).filter(|&t| !drop[t]).collect();
        Ok(Self::from_parts(
            self.kill.select_rows(&keep),
            self.coverage.select_rows(&keep),
        ))
    }

    /// Keeps only the given mutant columns, in ascending column order.
    pub fn extract_columns(&self, columns: &[usize]) -> Result<Self> {
        let wanted = index_mask("mutant", columns, self.number_of_mutants())?;
        let keep: Vec<usize> = (0..self.number_of_mutants()).filter(|&m| wanted[m]).collect();
        Ok(Self::from_parts(
            self.kill.select_columns(&keep),
            self.coverage.select_columns(&keep),
        ))
    }

    /// Keeps the first of every group of tests with identical kill rows.
    pub fn remove_duplicate_tests(&self) -> Self {
        let mut seen: HashSet<&[bool]> = HashSet::with_capacity(self.number_of_tests());
        let keep: Vec<usize> = (0..self.number_of_tests())
            .filter(|&test| seen.insert(self.kill.row(test)))
            .collect();
        if keep.len() == self.number_of_tests() {
            return self.clone();
        }
        Self::from_parts(self.kill.select_rows(&keep), self.coverage.select_rows(&keep))
    }

    /// Removes duplicate tests, then every test the set-cover solve finds
    /// redundant. A zero-mutant model is only deduplicated.
    pub fn minimize(&self, solver: &SolverConfig) -> Result<Minimized> {
        let deduplicated = self.remove_duplicate_tests();
        if deduplicated.number_of_mutants() == 0 {
            return Ok(Minimized {
                matrices: deduplicated,
                warnings: Vec::new(),
            });
        }

        let outcome = minimize::redundant_tests(&deduplicated.kill, solver)?;
        let matrices = deduplicated.remove_rows(&outcome.redundant_tests)?;
        Ok(Minimized {
            matrices,
            warnings: outcome.warnings,
        })
    }

    /// # Panics
    /// If `mutant` is out of range.
    pub fn is_killed(&self, mutant: usize) -> bool {
        self.kill.column(mutant).any(|killed| killed)
    }

    /// Mutants no test kills, ascending. Computed once per instance.
    pub fn equivalent_mutants(&self) -> &[usize] {
        self.equivalent.get_or_init(|| {
            (0..self.number_of_mutants())
                .filter(|&mutant| !self.is_killed(mutant))
                .collect()
        })
    }

    pub fn is_equivalent(&self, mutant: usize) -> bool {
        self.equivalent_mutants().binary_search(&mutant).is_ok()
    }

    /// Whether `mutant` belongs to the set a covering test is credited for.
    pub fn in_basis(&self, mutant: usize, basis: CoverageBasis) -> bool {
        match basis {
            CoverageBasis::Equivalent => self.is_equivalent(mutant),
            CoverageBasis::Killed => !self.is_equivalent(mutant),
        }
    }

    /// # Panics
    /// If `mutant` is out of range.
    pub fn killers_of_mutant(&self, mutant: usize) -> Vec<usize> {
        positions(self.kill.column(mutant))
    }

    /// # Panics
    /// If `mutant` is out of range.
    pub fn coverers_of_mutant(&self, mutant: usize) -> Vec<usize> {
        positions(self.coverage.column(mutant))
    }

    /// # Panics
    /// If `test` is out of range.
    pub fn mutants_killed_by_test(&self, test: usize) -> Vec<usize> {
        positions(self.kill.row(test).iter().copied())
    }

    /// # Panics
    /// If `test` is out of range.
    pub fn mutants_covered_by_test(&self, test: usize) -> Vec<usize> {
        positions(self.coverage.row(test).iter().copied())
    }

    /// True when the tests covering `mutant` together cover at most [`MCOV`]
    /// other equivalent mutants.
    pub fn is_mutant_difficult_to_reach(&self, mutant: usize) -> bool {
        self.is_mutant_difficult_to_reach_by(mutant, CoverageBasis::Equivalent)
    }

    /// Same check against an explicit basis. The equivalent basis skips
    /// `mutant` itself; the killed basis counts it like any other killed
    /// mutant a covering test reaches.
    pub fn is_mutant_difficult_to_reach_by(&self, mutant: usize, basis: CoverageBasis) -> bool {
        let reach: usize = self
            .coverers_of_mutant(mutant)
            .into_iter()
            .map(|test| {
                self.coverage
                    .row(test)
                    .iter()
                    .enumerate()
                    .filter(|&(other, &covered)| {
                        covered
                            && match basis {
                                CoverageBasis::Equivalent => {
                                    other != mutant && self.is_equivalent(other)
                                }
                                CoverageBasis::Killed => !self.is_equivalent(other),
                            }
                    })
                    .count()
            })
            .sum();
        reach <= MCOV
    }
}

fn positions(cells: impl Iterator<Item = bool>) -> Vec<usize> {
    cells
        .enumerate()
        .filter_map(|(index, set)| set.then_some(index))
        .collect()
}

fn check_index(axis: &'static str, index: usize, len: usize) -> Result<()> {
    if index >= len {
        return Err(QualityError::IndexOutOfRange { axis, index, len });
    }
    Ok(())
}

fn index_mask(axis: &'static str, indices: &[usize], len: usize) -> Result<Vec<bool>> {
    let mut mask = vec![false; len];
    for &index in indices {
        check_index(axis, index, len)?;
        mask[index] = true;
    }
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SolverKind;
    use std::time::Duration;

    const T: bool = true;
    const F: bool = false;

    fn fixture() -> MutationMatrices {
        MutationMatrices::from_rows(
            vec![
                vec![T, F, F, F, F, F, T],
                vec![T, T, F, F, T, F, F],
                vec![F, F, T, T, F, T, F],
                vec![F, F, F, T, F, F, F],
                vec![F, T, F, T, T, F, T],
            ],
            vec![
                vec![T, F, F, T, T, F, T],
                vec![T, T, F, F, T, T, F],
                vec![T, F, T, T, F, T, T],
                vec![F, T, T, T, F, T, F],
                vec![T, T, F, T, T, T, T],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_dimensions() {
        let matrices = fixture();
        assert_eq!(matrices.number_of_tests(), 5);
        assert_eq!(matrices.number_of_mutants(), 7);
        assert!(matrices.kill_matrix().get(4, 6));
        assert!(!matrices.coverage_matrix().get(3, 0));
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let result = MutationMatrices::from_rows(vec![vec![T, F]], vec![vec![T, F], vec![F, F]]);
        assert!(matches!(result, Err(QualityError::ShapeMismatch { .. })));

        let ragged = BoolMatrix::from_rows(vec![vec![T, F], vec![T]]);
        assert!(matches!(ragged, Err(QualityError::InvalidInput(_))));
    }

    #[test]
    fn test_zero_tests_keeps_mutant_count() {
        let matrices = MutationMatrices::new(BoolMatrix::new(0, 3), BoolMatrix::new(0, 3)).unwrap();
        assert_eq!(matrices.number_of_tests(), 0);
        assert_eq!(matrices.number_of_mutants(), 3);
        assert_eq!(matrices.equivalent_mutants(), &[0, 1, 2]);
    }

    #[test]
    fn test_killers_and_coverers() {
        let matrices = fixture();
        assert_eq!(matrices.killers_of_mutant(0), vec![0, 1]);
        assert_eq!(matrices.coverers_of_mutant(0), vec![0, 1, 2, 4]);
        assert_eq!(matrices.mutants_killed_by_test(0), vec![0, 6]);
        assert_eq!(matrices.mutants_covered_by_test(0), vec![0, 3, 4, 6]);
    }

    #[test]
    fn test_remove_rows() {
        let reduced = fixture().remove_rows(&[1, 3]).unwrap();
        assert_eq!(
            reduced.kill_matrix().to_rows(),
            vec![
                vec![T, F, F, F, F, F, T],
                vec![F, F, T, T, F, T, F],
                vec![F, T, F, T, T, F, T],
            ]
        );
        assert_eq!(
            reduced.coverage_matrix().to_rows(),
            vec![
                vec![T, F, F, T, T, F, T],
                vec![T, F, T, T, F, T, T],
                vec![T, T, F, T, T, T, T],
            ]
        );
    }

    #[test]
    fn test_remove_rows_empty_is_identity() {
        let matrices = fixture();
        assert_eq!(matrices.remove_rows(&[]).unwrap(), matrices);
    }

    #[test]
    fn test_remove_rows_out_of_range() {
        let result = fixture().remove_rows(&[5]);
        assert!(matches!(
            result,
            Err(QualityError::IndexOutOfRange { axis: "test", index: 5, len: 5 })
        ));
    }

    #[test]
    fn test_extract_columns() {
        let reduced = fixture().extract_columns(&[3, 1]).unwrap();
        assert_eq!(
            reduced.kill_matrix().to_rows(),
            vec![vec![F, F], vec![T, F], vec![F, T], vec![F, T], vec![T, T]]
        );
        assert_eq!(
            reduced.coverage_matrix().to_rows(),
            vec![vec![F, T], vec![T, F], vec![F, T], vec![T, T], vec![T, T]]
        );
    }

    #[test]
    fn test_extract_no_columns() {
        let reduced = fixture().extract_columns(&[]).unwrap();
        assert_eq!(reduced.number_of_tests(), 5);
        assert_eq!(reduced.number_of_mutants(), 0);
        assert!(fixture().extract_columns(&[7]).is_err());
    }

    #[test]
    fn test_remove_duplicate_tests() {
        let matrices = MutationMatrices::from_rows(
            vec![
                vec![F, T, F],
                vec![T, F, F],
                vec![F, F, T],
                vec![T, F, F],
                vec![F, F, T],
                vec![T, F, F],
            ],
            vec![
                vec![F, T, T],
                vec![T, T, T],
                vec![F, T, T],
                vec![T, F, F],
                vec![F, F, T],
                vec![T, F, F],
            ],
        )
        .unwrap();

        let reduced = matrices.remove_duplicate_tests();
        assert_eq!(
            reduced.kill_matrix().to_rows(),
            vec![vec![F, T, F], vec![T, F, F], vec![F, F, T]]
        );
        // coverage travels with the first occurrence
        assert_eq!(
            reduced.coverage_matrix().to_rows(),
            vec![vec![F, T, T], vec![T, T, T], vec![F, T, T]]
        );
        assert_eq!(reduced.remove_duplicate_tests(), reduced);
    }

    #[test]
    fn test_is_killed_and_equivalent() {
        let matrices = fixture();
        assert!((0..7).all(|m| matrices.is_killed(m)));
        assert!(matrices.equivalent_mutants().is_empty());

        let matrices = MutationMatrices::from_rows(
            vec![vec![T, T, F, F, F, T, F], vec![T, F, F, T, F, F, F]],
            vec![vec![F, T, T, T, T, T, T], vec![T; 7]],
        )
        .unwrap();
        assert_eq!(matrices.equivalent_mutants(), &[2, 4, 6]);
        assert!(matrices.is_equivalent(4));
        assert!(!matrices.is_equivalent(5));
    }

    #[test]
    fn test_difficult_to_reach_killed_basis() {
        let matrices = MutationMatrices::from_rows(
            vec![vec![F, T, F], vec![T, F, F], vec![F, F, T]],
            vec![vec![F, T, T], vec![T, T, T], vec![F, T, T]],
        )
        .unwrap();

        assert!(matrices.is_mutant_difficult_to_reach_by(0, CoverageBasis::Killed));
        assert!(!matrices.is_mutant_difficult_to_reach_by(1, CoverageBasis::Killed));
        assert!(!matrices.is_mutant_difficult_to_reach_by(2, CoverageBasis::Killed));
    }

    #[test]
    fn test_difficult_to_reach_equivalent_basis() {
        // mutants 1..=5 are equivalent; tests 0 and 1 both cover all of them
        let kill = vec![vec![T, F, F, F, F, F], vec![F; 6]];
        let coverage = vec![vec![T; 6], vec![T; 6]];
        let matrices = MutationMatrices::from_rows(kill, coverage).unwrap();
        assert_eq!(matrices.equivalent_mutants(), &[1, 2, 3, 4, 5]);
        // 5 + 5 equivalent mutants reached
        assert!(!matrices.is_mutant_difficult_to_reach(0));
        // equivalent mutant 1 does not count itself: 4 + 4
        assert!(!matrices.is_mutant_difficult_to_reach(1));

        let kill = vec![vec![T, F, F, F, F, F]];
        let coverage = vec![vec![T, T, T, T, T, F]];
        let matrices = MutationMatrices::from_rows(kill, coverage).unwrap();
        assert!(matrices.is_mutant_difficult_to_reach(0));
        // uncovered mutant has no covering tests at all
        assert!(matrices.is_mutant_difficult_to_reach(5));
    }

    #[test]
    fn test_from_mutants_mirrors_kills_for_static() {
        let mutants = vec![
            MutantCoverage {
                killed_by: vec![0],
                covered_by: vec![0, 1],
                independently_coverable: true,
            },
            MutantCoverage {
                killed_by: vec![1],
                covered_by: vec![],
                independently_coverable: false,
            },
            MutantCoverage::default(),
        ];
        let matrices = MutationMatrices::from_mutants(2, &mutants).unwrap();
        assert_eq!(matrices.kill_matrix().to_rows(), vec![vec![T, F, F], vec![F, T, F]]);
        assert_eq!(matrices.coverage_matrix().to_rows(), vec![vec![T, F, F], vec![T, T, F]]);
    }

    #[test]
    fn test_from_mutants_rejects_unknown_test() {
        let mutants = vec![MutantCoverage {
            killed_by: vec![3],
            covered_by: vec![],
            independently_coverable: true,
        }];
        let result = MutationMatrices::from_mutants(2, &mutants);
        assert!(matches!(result, Err(QualityError::IndexOutOfRange { axis: "test", .. })));
    }

    #[test]
    fn test_minimize_keeps_cover() {
        let matrices = MutationMatrices::from_rows(
            vec![
                vec![T, F, F],
                vec![T, F, F],
                vec![F, T, F],
                vec![T, T, F],
            ],
            vec![vec![T; 3]; 4],
        )
        .unwrap();
        let minimized = matrices.minimize(&SolverConfig::default()).unwrap();
        assert!(minimized.warnings.is_empty());
        assert_eq!(minimized.matrices.number_of_tests(), 1);
        assert_eq!(minimized.matrices.kill_matrix().to_rows(), vec![vec![T, T, F]]);
    }

    #[test]
    fn test_minimize_timeout_keeps_every_test() {
        let kill: Vec<Vec<bool>> = (0..40).map(|r| (0..40).map(|c| c <= r).collect()).collect();
        let matrices = MutationMatrices::from_rows(kill.clone(), kill).unwrap();
        let solver = SolverConfig {
            kind: SolverKind::Exact,
            timeout: Some(Duration::from_nanos(1)),
        };

        let minimized = matrices.minimize(&solver).unwrap();
        assert_eq!(minimized.matrices, matrices);
        assert_eq!(minimized.matrices.number_of_tests(), 40);
        assert!(matches!(minimized.warnings.as_slice(), [CoverWarning::TimedOut(_)]));
    }

    #[test]
    fn test_minimize_zero_mutants_skips_solver() {
        let matrices = MutationMatrices::new(BoolMatrix::new(3, 0), BoolMatrix::new(3, 0)).unwrap();
        let minimized = matrices.minimize(&SolverConfig::default()).unwrap();
        assert_eq!(minimized.matrices.number_of_mutants(), 0);
        assert_eq!(minimized.matrices.number_of_tests(), 1);
    }
}
