use crate::aggregate::{aggregate_reports, OperatorResult};
use crate::config::{AnalysisConfig, MutantSelection, SolverConfig};
use crate::error::{QualityError, Result};
use crate::matrix::MutationMatrices;
use crate::quality::{operator_quality, OperatorQuality};
use crate::report::{
    save_level_summary, save_report, LevelSummary, OutputFormat, QualityReport,
};
use crate::stryker::Report;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Scores every operator of every input report and writes the combined result.
pub async fn run_analysis(
    inputs: &[PathBuf],
    output: &Path,
    format: OutputFormat,
    config: AnalysisConfig,
) -> Result<Vec<OperatorResult>> {
    let paths = find_report_files(inputs)?;
    println!("* {} REPORTS *", paths.len());

    let tasks = paths.iter().cloned().map(|path| {
        tokio::task::spawn_blocking(move || -> Result<Vec<OperatorResult>> {
            println!("Processing inputfile {}", path.display());
            let mut report = Report::from_path(&path)?;
            if config.deduce_operators {
                report.deduce_operators();
            }
            analyze_report(&report, &config)
        })
    });
    let per_report = futures::future::try_join_all(tasks)
        .await?
        .into_iter()
        .collect::<Result<Vec<_>>>()?;

    let results = aggregate_reports(per_report);
    let document = QualityReport::new(
        paths.iter().map(|p| p.display().to_string()).collect(),
        config.solver.kind,
        config.basis,
        results,
    );
    save_report(&document, output, format).await?;
    Ok(document.results)
}

/// Inputs may be report files or directories holding `*.json` reports.
pub fn find_report_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_file() {
            files.push(input.clone());
            continue;
        }
        if !input.is_dir() {
            return Err(QualityError::InvalidInput(format!(
                "input {} does not exist",
                input.display()
            )));
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(input) {
            let entry = entry?;
            if entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == "json")
            {
                found.push(entry.path().to_path_buf());
            }
        }
        found.sort();
        files.extend(found);
    }

    if files.is_empty() {
        return Err(QualityError::InvalidInput(
            "no mutation reports found in the provided inputs".to_string(),
        ));
    }
    Ok(files)
}

/// Scores the operators of one report.
///
/// Tests are minimized once over all mutants and again per operator. Operators
/// without killed mutants are left out with a log line; those whose quality is
/// undefined under the configured basis are kept with `quality: None`.
pub fn analyze_report(report: &Report, config: &AnalysisConfig) -> Result<Vec<OperatorResult>> {
    let minimized = report.matrices()?.minimize(&config.solver)?;
    let matrices = minimized.matrices;
    tracing::debug!(
        "minimized report to {} tests over {} mutants",
        matrices.number_of_tests(),
        matrices.number_of_mutants()
    );

    let operators = report.operators_with_killed_mutants(
        &report.used_operators(),
        &matrices,
        config.selection,
    );

    let results = operators
        .par_iter()
        .map(|operator| score_operator(report, &matrices, operator, config))
        .collect::<Result<Vec<_>>>()?;
    Ok(results)
}

fn score_operator(
    report: &Report,
    matrices: &MutationMatrices,
    operator: &str,
    config: &AnalysisConfig,
) -> Result<OperatorResult> {
    let columns = report.mutants_by_operator(operator, config.selection);
    let narrowed = matrices.extract_columns(&columns)?.minimize(&config.solver)?;
    let narrowed = narrowed.matrices;

    let (quality, deviation) = match operator_quality(&narrowed, config.basis) {
        OperatorQuality::Scored(quality) => (Some(quality.quality), quality.deviation),
        OperatorQuality::Undefined { mutants } => {
            tracing::warn!(
                "quality of {} is undefined under the {} basis ({} mutants reach no basis mutant)",
                operator,
                config.basis,
                mutants.len()
            );
            (None, 0.0)
        }
    };

    Ok(OperatorResult {
        operator: operator.to_string(),
        quality,
        deviation,
        mutant_count: narrowed.number_of_mutants(),
        test_executions: report.count_test_executions(operator),
        reports: 1,
    })
}

/// Compares the minimal test suite needed for a mutation level's killed mutants
/// with the one needed for every mutant, and writes a summary.
pub async fn run_level_test(
    level: &Path,
    input: &Path,
    output: &Path,
    solver: SolverConfig,
) -> Result<LevelSummary> {
    let operators = parse_level(&tokio::fs::read_to_string(level).await?);
    tracing::debug!("testing effectiveness of level with operators {:?}", operators);

    println!("Processing inputfile {}", input.display());
    let path = input.to_path_buf();
    let summary = tokio::task::spawn_blocking(move || -> Result<LevelSummary> {
        let mut report = Report::from_path(&path)?;
        report.deduce_operators();
        evaluate_level(&report, operators, &path.display().to_string(), &solver)
    })
    .await??;

    save_level_summary(&summary, output).await?;
    Ok(summary)
}

/// One operator per line; blank lines and `#` comments are skipped and repeats
/// are dropped.
pub fn parse_level(content: &str) -> Vec<String> {
    let mut operators: Vec<String> = Vec::new();
    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if !operators.iter().any(|existing| existing == line) {
            operators.push(line.to_string());
        }
    }
    operators
}

pub fn evaluate_level(
    report: &Report,
    operators: Vec<String>,
    input: &str,
    solver: &SolverConfig,
) -> Result<LevelSummary> {
    let used = report.used_operators();
    let total_test_executions = used.iter().map(|op| report.count_test_executions(op)).sum();

    let matrices = report.matrices()?;
    let total_mutants = matrices.number_of_mutants();
    let all_suite_size = matrices.minimize(solver)?.matrices.number_of_tests();
    tracing::debug!("minimal test suite size using all operators: {}", all_suite_size);

    let mut level_mutants = 0;
    let mut level_test_executions = 0;
    let mut killed = Vec::new();
    for operator in &operators {
        if used.binary_search(operator).is_err() {
            tracing::warn!("mutation operator {} does not occur in {}", operator, input);
            continue;
        }
        level_mutants += report
            .mutants_by_operator(operator, MutantSelection::ALL)
            .len();
        // unkilled mutants have no influence on the cover
        killed.extend(report.mutants_by_operator(operator, MutantSelection::KILLED));
        level_test_executions += report.count_test_executions(operator);
    }
    tracing::debug!("kept {} out of {} mutants", level_mutants, total_mutants);

    let level_suite_size = matrices
        .extract_columns(&killed)?
        .minimize(solver)?
        .matrices
        .number_of_tests();
    tracing::debug!("minimal test suite size using level operators: {}", level_suite_size);

    Ok(LevelSummary {
        operators,
        input: input.to_string(),
        level_suite_size,
        all_suite_size,
        level_mutants,
        total_mutants,
        level_test_executions,
        total_test_executions,
    })
}
