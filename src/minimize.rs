//! Test-suite minimization as an exact set cover.
//!
//! Every test gets a decision variable, every killable mutant a covering
//! constraint, and the solver minimizes the number of selected tests. The tests
//! left unselected are redundant: dropping them loses no kill.

use crate::config::{SolverConfig, SolverKind};
use crate::error::{QualityError, Result};
use crate::matrix::BoolMatrix;
use good_lp::{
    constraint, microlp, variable, Expression, ProblemVariables, Solution, SolverModel, Variable,
};
use std::fmt;
use std::sync::{mpsc, Once};
use std::thread;
use std::time::Duration;

/// Upper bound of every covering constraint. It must exceed any test-suite
/// size; an infinite bound makes the backend numerically unstable.
pub const CONSTRAINT_UPPER_BOUND: f64 = 1e6;

/// Decision values closer than this to 0 or 1 count as integral.
const INTEGRALITY_TOLERANCE: f64 = 1e-9;

static SOLVER_INIT: Once = Once::new();

/// One-time, idempotent backend setup. Called before every solve; only the
/// first call does anything.
pub fn init_solver() {
    SOLVER_INIT.call_once(|| {
        tracing::debug!("set-cover solver ready (good_lp/microlp backend)");
    });
}

/// Recoverable conditions raised while minimizing. None of them invalidates the
/// returned redundant-test list.
#[derive(Debug, Clone, PartialEq)]
pub enum CoverWarning {
    /// The solver did not report an optimal solution; nothing was removed.
    NotOptimal(String),
    /// The solve exceeded its time budget; nothing was removed.
    TimedOut(Duration),
    /// The relaxed formulation left at least one fractional decision. The first
    /// one seen is reported.
    Indecisive { test: usize, value: f64 },
}

impl fmt::Display for CoverWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoverWarning::NotOptimal(reason) => {
                write!(f, "no optimal test-suite cover found ({}); keeping every test", reason)
            }
            CoverWarning::TimedOut(limit) => write!(
                f,
                "set-cover solve exceeded {:?}; keeping every test",
                limit
            ),
            CoverWarning::Indecisive { test, value } => write!(
                f,
                "indecisive minimization: test {} has decision value {:.4}; use the exact solver to avoid this",
                test, value
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverOutcome {
    /// Ascending indices of tests outside the cover.
    pub redundant_tests: Vec<usize>,
    pub warnings: Vec<CoverWarning>,
}

/// Finds the tests of `kill` that a minimum cover of all killable mutants does
/// not need.
///
/// A matrix without mutant columns is rejected. Solver failure and timeouts
/// degrade to "no redundant tests" with a warning.
pub fn redundant_tests(kill: &BoolMatrix, solver: &SolverConfig) -> Result<CoverOutcome> {
    if kill.cols() == 0 {
        return Err(QualityError::InvalidInput(
            "cannot minimize a kill matrix without mutant columns".to_string(),
        ));
    }
    if kill.rows() == 0 {
        return Ok(CoverOutcome::default());
    }

    // equivalent mutants have no killers and impose no constraint
    let constraints: Vec<Vec<usize>> = (0..kill.cols())
        .map(|mutant| {
            kill.column(mutant)
                .enumerate()
                .filter_map(|(test, killed)| killed.then_some(test))
                .collect::<Vec<_>>()
        })
        .filter(|killers| !killers.is_empty())
        .collect();

    init_solver();
    tracing::debug!(
        tests = kill.rows(),
        constraints = constraints.len(),
        kind = %solver.kind,
        "solving set cover"
    );

    let values = match solve_with_timeout(kill.rows(), constraints, solver) {
        Ok(values) => values,
        Err(warning) => {
            tracing::warn!("{}", warning);
            return Ok(CoverOutcome {
                redundant_tests: Vec::new(),
                warnings: vec![warning],
            });
        }
    };

    Ok(classify(&values))
}

/// Splits decision values into redundant (zero) and kept (anything else).
fn classify(values: &[f64]) -> CoverOutcome {
    let mut outcome = CoverOutcome::default();
    for (test, &value) in values.iter().enumerate() {
        let integral =
            value.abs() <= INTEGRALITY_TOLERANCE || (value - 1.0).abs() <= INTEGRALITY_TOLERANCE;
        if !integral && outcome.warnings.is_empty() {
            let warning = CoverWarning::Indecisive { test, value };
            tracing::warn!("{}", warning);
            outcome.warnings.push(warning);
        }
        if value.abs() <= INTEGRALITY_TOLERANCE {
            outcome.redundant_tests.push(test);
        }
    }
    outcome
}

fn solve_with_timeout(
    tests: usize,
    constraints: Vec<Vec<usize>>,
    solver: &SolverConfig,
) -> std::result::Result<Vec<f64>, CoverWarning> {
    let kind = solver.kind;
    let (sender, receiver) = mpsc::channel();

    // the worker owns the model; it is dropped when the worker returns,
    // whether the solve succeeded, failed or outlived the timeout
    thread::Builder::new()
        .name("set-cover".to_string())
        .spawn(move || {
            let _ = sender.send(solve_cover(tests, &constraints, kind));
        })
        .map_err(|e| CoverWarning::NotOptimal(format!("could not start solver thread: {}", e)))?;

    let received = match solver.timeout {
        Some(limit) => receiver.recv_timeout(limit).map_err(|e| match e {
            mpsc::RecvTimeoutError::Timeout => CoverWarning::TimedOut(limit),
            mpsc::RecvTimeoutError::Disconnected => {
                CoverWarning::NotOptimal("solver thread terminated".to_string())
            }
        })?,
        None => receiver
            .recv()
            .map_err(|_| CoverWarning::NotOptimal("solver thread terminated".to_string()))?,
    };

    received.map_err(CoverWarning::NotOptimal)
}

fn solve_cover(
    tests: usize,
    constraints: &[Vec<usize>],
    kind: SolverKind,
) -> std::result::Result<Vec<f64>, String> {
    let mut vars = ProblemVariables::new();
    let selected: Vec<Variable> = (0..tests)
        .map(|_| match kind {
            SolverKind::Exact => vars.add(variable().binary()),
            SolverKind::Relaxed => vars.add(variable().min(0.0).max(1.0)),
        })
        .collect();

    let objective: Expression = selected.iter().copied().sum();
    let mut model = vars.minimise(objective).using(microlp);
    for killers in constraints {
        let covering: Expression = killers.iter().map(|&test| selected[test]).sum();
        model = model
            .with(constraint!(covering.clone() >= 1.0))
            .with(constraint!(covering <= CONSTRAINT_UPPER_BOUND));
    }

    let solution = model.solve().map_err(|e| e.to_string())?;
    Ok(selected.iter().map(|&var| solution.value(var)).collect())
}
