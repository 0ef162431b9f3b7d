//! Per-mutant and per-operator coverage quality.
//!
//! A mutant scores high when the tests killing it kill little else, measured
//! against how much the tests that reach it cover. Callers pass matrices that
//! hold a single operator's mutants and whose tests are already minimized.

use crate::config::CoverageBasis;
use crate::matrix::MutationMatrices;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MutantQuality {
    /// Never killed; scores 0.
    Equivalent,
    Scored(f64),
    /// The tests considered cover no mutant of the chosen basis, so the score
    /// would divide by zero.
    Undefined,
}

impl MutantQuality {
    /// The score that enters the operator average, if there is one.
    pub fn value(self) -> Option<f64> {
        match self {
            MutantQuality::Equivalent => Some(0.0),
            MutantQuality::Scored(quality) => Some(quality),
            MutantQuality::Undefined => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CoverageQuality {
    pub quality: f64,
    /// Mean absolute deviation of the mutant scores from `quality`.
    pub deviation: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OperatorQuality {
    Scored(CoverageQuality),
    /// At least one mutant has no defined score; these are the offenders.
    Undefined { mutants: Vec<usize> },
}

pub fn mutant_quality(
    matrices: &MutationMatrices,
    mutant: usize,
    basis: CoverageBasis,
) -> MutantQuality {
    if matrices.is_equivalent(mutant) {
        return MutantQuality::Equivalent;
    }

    // killers that kill many mutants discriminate poorly for this one
    let numerator: usize = matrices
        .killers_of_mutant(mutant)
        .into_iter()
        .map(|test| matrices.mutants_killed_by_test(test).len())
        .sum();

    let consider: Vec<usize> = if matrices.is_mutant_difficult_to_reach_by(mutant, basis) {
        (0..matrices.number_of_tests()).collect()
    } else {
        matrices.coverers_of_mutant(mutant)
    };

    let denominator: usize = consider
        .into_iter()
        .map(|test| {
            matrices
                .mutants_covered_by_test(test)
                .into_iter()
                .filter(|&covered| matrices.in_basis(covered, basis))
                .count()
        })
        .sum();

    if denominator == 0 {
        return MutantQuality::Undefined;
    }
    MutantQuality::Scored(1.0 - numerator as f64 / denominator as f64)
}

/// Averages the mutant scores of one operator.
///
/// Equivalent mutants count with a score of 0. An operator without mutants
/// scores `(0, 0)`.
pub fn operator_quality(matrices: &MutationMatrices, basis: CoverageBasis) -> OperatorQuality {
    let count = matrices.number_of_mutants();
    if count == 0 {
        return OperatorQuality::Scored(CoverageQuality::default());
    }

    let mut scores = Vec::with_capacity(count);
    let mut undefined = Vec::new();
    for mutant in 0..count {
        match mutant_quality(matrices, mutant, basis).value() {
            Some(score) => scores.push(score),
            None => undefined.push(mutant),
        }
    }
    if !undefined.is_empty() {
        return OperatorQuality::Undefined { mutants: undefined };
    }

    let quality = scores.iter().sum::<f64>() / count as f64;
    let deviation = scores.iter().map(|score| (score - quality).abs()).sum::<f64>() / count as f64;
    OperatorQuality::Scored(CoverageQuality { quality, deviation })
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: bool = true;
    const F: bool = false;

    fn matrices(kill: Vec<Vec<bool>>, coverage: Vec<Vec<bool>>) -> MutationMatrices {
        MutationMatrices::from_rows(kill, coverage).unwrap()
    }

    fn scored(outcome: OperatorQuality) -> CoverageQuality {
        match outcome {
            OperatorQuality::Scored(quality) => quality,
            OperatorQuality::Undefined { mutants } => panic!("undefined mutants {:?}", mutants),
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-3,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    fn small() -> MutationMatrices {
        matrices(
            vec![vec![T, F, F], vec![F, T, F], vec![F, F, F]],
            vec![vec![T, T, T], vec![F, T, F], vec![T, T, T]],
        )
    }

    #[test]
    fn test_quality_killed_basis() {
        let result = scored(operator_quality(&small(), CoverageBasis::Killed));
        assert_close(result.quality, 8.0 / 15.0);
        assert_close(result.deviation, 16.0 / 45.0);
    }

    #[test]
    fn test_quality_equivalent_basis() {
        let matrices = small();
        assert_eq!(
            mutant_quality(&matrices, 0, CoverageBasis::Equivalent),
            MutantQuality::Scored(0.5)
        );
        assert_eq!(
            mutant_quality(&matrices, 2, CoverageBasis::Equivalent),
            MutantQuality::Equivalent
        );

        let result = scored(operator_quality(&matrices, CoverageBasis::Equivalent));
        assert_close(result.quality, 1.0 / 3.0);
        assert_close(result.deviation, 2.0 / 9.0);
    }

    #[test]
    fn test_quality_big() {
        let matrices = matrices(
            vec![
                vec![T, F, T, F],
                vec![F, T, F, F],
                vec![T, T, F, T],
                vec![F, F, F, T],
            ],
            vec![
                vec![T, T, T, F],
                vec![F, T, F, T],
                vec![T, T, T, T],
                vec![T, F, T, T],
            ],
        );
        let result = scored(operator_quality(&matrices, CoverageBasis::Killed));
        assert_close(result.quality, 217.0 / 360.0);
    }

    #[test]
    fn test_quality_all_equivalent() {
        let matrices = matrices(
            vec![vec![F; 3], vec![F; 3], vec![F; 3]],
            vec![vec![T, T, T], vec![F, T, F], vec![T, T, T]],
        );
        for basis in [CoverageBasis::Equivalent, CoverageBasis::Killed] {
            let result = scored(operator_quality(&matrices, basis));
            assert_eq!(result.quality, 0.0);
            assert_eq!(result.deviation, 0.0);
        }
    }

    #[test]
    fn test_quality_hard_to_reach() {
        let matrices = matrices(
            vec![vec![T, T, F], vec![F, F, F], vec![F, F, T]],
            vec![vec![T, T, T], vec![F, T, F], vec![F, F, T]],
        );
        let result = scored(operator_quality(&matrices, CoverageBasis::Killed));
        assert_close(result.quality, 2.0 / 3.0);
    }

    #[test]
    fn test_no_equivalent_mutants_is_undefined() {
        // every mutant is killed, so the equivalent basis has nothing to count
        let matrices = matrices(
            vec![vec![T, T, F], vec![F, F, F], vec![F, F, T]],
            vec![vec![T, T, T], vec![F, T, F], vec![F, F, T]],
        );
        assert_eq!(
            mutant_quality(&matrices, 0, CoverageBasis::Equivalent),
            MutantQuality::Undefined
        );
        assert_eq!(
            operator_quality(&matrices, CoverageBasis::Equivalent),
            OperatorQuality::Undefined {
                mutants: vec![0, 1, 2]
            }
        );
    }

    #[test]
    fn test_zero_mutants() {
        let matrices = small().extract_columns(&[]).unwrap();
        assert_eq!(
            operator_quality(&matrices, CoverageBasis::Equivalent),
            OperatorQuality::Scored(CoverageQuality {
                quality: 0.0,
                deviation: 0.0
            })
        );
    }
}
