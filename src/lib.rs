//! # Mutator Quality
//!
//! Measures how well each mutation operator's mutants are covered by a test
//! suite, from Stryker mutation-testing reports.
//!
//! This library provides functionality to:
//! - Build kill and coverage matrices from a report
//! - Minimize the test suite with a set-cover integer program
//! - Score mutants and operators by how specifically their killers kill them
//! - Combine operator scores over several reports
//! - Test how well a mutation level (a subset of operators) stands in for all of them
//!
//! ## Example
//!
//! ```rust,no_run
//! use mutator_quality::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let report = Report::from_path("reports/mutation.json".as_ref())?;
//!     let config = AnalysisConfig {
//!         basis: CoverageBasis::Killed,
//!         ..AnalysisConfig::default()
//!     };
//!     for result in analyze_report(&report, &config)? {
//!         println!("{}", result);
//!     }
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod analyze;
pub mod config;
pub mod error;
pub mod matrix;
pub mod minimize;
pub mod operators;
pub mod quality;
pub mod report;
pub mod stryker;

pub use error::{QualityError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::aggregate::{aggregate_reports, OperatorResult};
    pub use crate::analyze::{analyze_report, run_analysis, run_level_test};
    pub use crate::config::{
        AnalysisConfig, CoverageBasis, MutantSelection, SolverConfig, SolverKind,
    };
    pub use crate::error::{QualityError, Result};
    pub use crate::matrix::{BoolMatrix, MutationMatrices};
    pub use crate::quality::{mutant_quality, operator_quality, CoverageQuality, OperatorQuality};
    pub use crate::report::OutputFormat;
    pub use crate::stryker::Report;
}
