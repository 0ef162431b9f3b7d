//! Combining operator results computed from several independent reports.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Quality of one mutation operator, from one report or combined from several.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorResult {
    pub operator: String,
    /// `None` when the quality is undefined, in this report or, for a combined
    /// result, in any report it was combined from. Serialized as `null`.
    pub quality: Option<f64>,
    /// Always 0 when `reports > 1`: mean absolute deviations of separate
    /// reports cannot be merged without the underlying mutant scores.
    pub deviation: f64,
    pub mutant_count: usize,
    pub test_executions: u64,
    /// Number of reports this result was combined from.
    pub reports: usize,
}

impl OperatorResult {
    pub fn deviation_combinable(&self) -> bool {
        self.reports <= 1
    }
}

impl fmt::Display for OperatorResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Mutator: {}, Count: {}, Tests Executed: {}, ",
            self.operator, self.mutant_count, self.test_executions
        )?;
        match self.quality {
            Some(quality) => write!(f, "Quality: {:.3}, Deviation: {:.3}", quality, self.deviation)?,
            None => write!(f, "Quality: undefined, Deviation: undefined")?,
        }
        if !self.deviation_combinable() {
            write!(
                f,
                " (not combinable across {} reports)",
                self.reports
            )?;
        }
        Ok(())
    }
}

/// Merges per-report results into one result per operator.
///
/// A single report passes through untouched. Otherwise every operator seen in
/// any report (in first-seen order) gets the mutant-count weighted mean quality,
/// summed counts, and a deviation of 0. An operator undefined in any report
/// stays undefined.
pub fn aggregate_reports(mut reports: Vec<Vec<OperatorResult>>) -> Vec<OperatorResult> {
    if reports.len() == 1 {
        return reports.remove(0);
    }

    let mut combined: Vec<(OperatorResult, Option<f64>)> = Vec::new();
    for result in reports.iter().flatten() {
        let weighted = result.quality.map(|q| result.mutant_count as f64 * q);
        match combined
            .iter_mut()
            .find(|(entry, _)| entry.operator == result.operator)
        {
            Some((entry, weighted_sum)) => {
                entry.mutant_count += result.mutant_count;
                entry.test_executions += result.test_executions;
                entry.reports += 1;
                *weighted_sum = weighted_sum.zip(weighted).map(|(sum, w)| sum + w);
            }
            None => combined.push((
                OperatorResult {
                    operator: result.operator.clone(),
                    quality: None,
                    deviation: 0.0,
                    mutant_count: result.mutant_count,
                    test_executions: result.test_executions,
                    reports: 1,
                },
                weighted,
            )),
        }
    }

    combined
        .into_iter()
        .map(|(mut entry, weighted_sum)| {
            entry.quality = weighted_sum.map(|sum| {
                if entry.mutant_count > 0 {
                    sum / entry.mutant_count as f64
                } else {
                    0.0
                }
            });
            entry
        })
        .collect()
}
