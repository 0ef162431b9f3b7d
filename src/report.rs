use crate::aggregate::OperatorResult;
use crate::config::{CoverageBasis, SolverKind};
use crate::error::Result;
use chrono::{DateTime, Local};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    /// An explicit format wins; otherwise a `.json` output path selects JSON.
    pub fn resolve(requested: Option<OutputFormat>, output: &Path) -> OutputFormat {
        requested.unwrap_or_else(|| {
            if output.extension().is_some_and(|ext| ext == "json") {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            }
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QualityReport {
    pub date: String,
    pub inputs: Vec<String>,
    pub solver: SolverKind,
    pub coverage_basis: CoverageBasis,
    pub results: Vec<OperatorResult>,
}

impl QualityReport {
    pub fn new(
        inputs: Vec<String>,
        solver: SolverKind,
        coverage_basis: CoverageBasis,
        results: Vec<OperatorResult>,
    ) -> Self {
        let now: DateTime<Local> = Local::now();
        Self {
            date: now.format("%d/%m/%Y %H:%M:%S").to_string(),
            inputs,
            solver,
            coverage_basis,
            results,
        }
    }
}

/// Outcome of testing a mutation level against a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSummary {
    pub operators: Vec<String>,
    pub input: String,
    pub level_suite_size: usize,
    pub all_suite_size: usize,
    pub level_mutants: usize,
    pub total_mutants: usize,
    pub level_test_executions: u64,
    pub total_test_executions: u64,
}

impl LevelSummary {
    /// Level minimal suite size relative to the all-operator one, in percent.
    pub fn effectiveness(&self) -> f64 {
        percentage(self.level_suite_size as f64, self.all_suite_size as f64)
    }

    pub fn mutant_reduction(&self) -> f64 {
        percentage(
            self.total_mutants.saturating_sub(self.level_mutants) as f64,
            self.total_mutants as f64,
        )
    }

    pub fn execution_reduction(&self) -> f64 {
        percentage(
            self.total_test_executions.saturating_sub(self.level_test_executions) as f64,
            self.total_test_executions as f64,
        )
    }
}

fn percentage(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}

pub fn render_text(results: &[OperatorResult]) -> String {
    let mut text = String::new();
    for result in results {
        let _ = writeln!(text, "{}", result);
    }
    text
}

pub fn render_level_summary(summary: &LevelSummary) -> String {
    let mut text = String::from("Mutation level consisting of operators:\n");
    for operator in &summary.operators {
        let _ = writeln!(text, "  {}", operator);
    }
    let _ = writeln!(text, "Tested using program {}", summary.input);
    let _ = writeln!(
        text,
        "Mutation level effectiveness: {:.0}%: {} / {}  (level minimal test suite size / all operators minimal test suite size)",
        summary.effectiveness(),
        summary.level_suite_size,
        summary.all_suite_size
    );
    let _ = writeln!(
        text,
        "Kept {} out of {} mutants. Reduction of {:.0}% ({} mutants)",
        summary.level_mutants,
        summary.total_mutants,
        summary.mutant_reduction(),
        summary.total_mutants.saturating_sub(summary.level_mutants)
    );
    let _ = writeln!(
        text,
        "Kept {} out of {} test executions. Reduction of {:.0}% ({} test executions)",
        summary.level_test_executions,
        summary.total_test_executions,
        summary.execution_reduction(),
        summary
            .total_test_executions
            .saturating_sub(summary.level_test_executions)
    );
    text
}

pub async fn save_report(report: &QualityReport, output: &Path, format: OutputFormat) -> Result<()> {
    let content = match format {
        OutputFormat::Text => render_text(&report.results),
        OutputFormat::Json => serde_json::to_string_pretty(report)?,
    };
    tokio::fs::write(output, content).await?;
    println!("Report saved to {}", output.display());
    Ok(())
}

pub async fn save_level_summary(summary: &LevelSummary, output: &Path) -> Result<()> {
    tokio::fs::write(output, render_level_summary(summary)).await?;
    println!("Report saved to {}", output.display());
    Ok(())
}
