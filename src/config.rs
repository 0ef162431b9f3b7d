//! Analysis settings shared by the engine and the command line.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default wall-clock budget for a single set-cover solve.
pub const DEFAULT_SOLVER_TIMEOUT: Duration = Duration::from_secs(60);

/// Formulation handed to the optimization backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    /// Binary decision variables, solved by branch and bound.
    #[default]
    Exact,
    /// Continuous variables in `[0, 1]`. Faster, but may leave fractional
    /// decisions that keep more tests than necessary.
    Relaxed,
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverKind::Exact => write!(f, "exact"),
            SolverKind::Relaxed => write!(f, "relaxed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverConfig {
    pub kind: SolverKind,
    /// `None` waits for the solver indefinitely. The backend has no time
    /// limit of its own: on timeout the caller stops waiting and keeps every
    /// test, but the solver thread runs on until it finishes. Many timed-out
    /// solves in one run therefore keep burning CPU in the background.
    pub timeout: Option<Duration>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            kind: SolverKind::Exact,
            timeout: Some(DEFAULT_SOLVER_TIMEOUT),
        }
    }
}

impl SolverConfig {
    pub fn new(kind: SolverKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Builds a config from a CLI-style seconds value, where 0 disables the timeout.
    pub fn with_timeout_secs(kind: SolverKind, secs: u64) -> Self {
        Self {
            kind,
            timeout: (secs > 0).then(|| Duration::from_secs(secs)),
        }
    }
}

/// Which mutants a covering test is credited for, both when deciding whether a
/// mutant is difficult to reach and in the quality denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CoverageBasis {
    /// Count covered mutants that no test kills.
    #[default]
    Equivalent,
    /// Count covered mutants that at least one test kills.
    Killed,
}

impl fmt::Display for CoverageBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoverageBasis::Equivalent => write!(f, "equivalent"),
            CoverageBasis::Killed => write!(f, "killed"),
        }
    }
}

/// Filter applied when picking an operator's mutants out of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MutantSelection {
    /// Keep only mutants whose status is `Killed`.
    pub killed_only: bool,
    /// Keep mutants that were only loaded once at startup (Stryker "static").
    pub include_static: bool,
}

impl MutantSelection {
    /// Every mutant of the operator, killed or not, static or not.
    pub const ALL: MutantSelection = MutantSelection {
        killed_only: false,
        include_static: true,
    };

    /// Killed mutants only, static included.
    pub const KILLED: MutantSelection = MutantSelection {
        killed_only: true,
        include_static: true,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub solver: SolverConfig,
    pub basis: CoverageBasis,
    pub selection: MutantSelection,
    /// Replace Stryker mutator names with fine-grained operator names.
    pub deduce_operators: bool,
}
