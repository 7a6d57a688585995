//! Plain-text and JSON reporting of pipeline outcomes.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use sigrank_core::{
    Branch, EvaluationResults, LevelOrder, SampleData, SplitOutcome, TestOutcome,
    CONTINGENCY_MEASURE,
};

/// Serialized form of one split outcome.
#[derive(Debug, Serialize)]
pub struct SplitReport<'a> {
    pub label: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<&'a EvaluationResults>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<'a> From<&'a SplitOutcome> for SplitReport<'a> {
    fn from(outcome: &'a SplitOutcome) -> Self {
        match &outcome.result {
            Ok(results) => Self {
                label: &outcome.label,
                results: Some(results),
                error: None,
            },
            Err(err) => Self {
                label: &outcome.label,
                results: None,
                error: Some(err.to_string()),
            },
        }
    }
}

/// Write every outcome as one pretty-printed JSON array.
pub fn write_json(outcomes: &[SplitOutcome], path: &Path) -> Result<()> {
    let reports: Vec<SplitReport<'_>> = outcomes.iter().map(SplitReport::from).collect();
    let json = serde_json::to_string_pretty(&reports)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write results to {}", path.display()))
}

fn model_names(data: &SampleData, models: impl IntoIterator<Item = usize>) -> String {
    models
        .into_iter()
        .map(|i| {
            data.model_metadata()
                .get(i)
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("#{i}"))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_p<T>(outcome: &TestOutcome<T>, p: impl Fn(&T) -> f64) -> String {
    match outcome {
        TestOutcome::Completed(result) => format!("p = {:.4}", p(result)),
        TestOutcome::Failed(reason) => format!("failed ({reason})"),
    }
}

/// Render a human-readable summary of one split.
pub fn summary(outcome: &SplitOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", outcome.label);

    let results = match &outcome.result {
        Ok(results) => results,
        Err(err) => {
            let _ = writeln!(out, "  evaluation failed: {err}");
            return out;
        }
    };

    let data = &results.sample_data;
    let _ = writeln!(
        out,
        "  models: {}{}",
        data.model_count(),
        if results.is_baseline_evaluation {
            format!(" (baseline: {})", model_names(data, [0]))
        } else {
            String::new()
        }
    );

    for (measure, evaluation) in &results.measures {
        let _ = writeln!(out, "  {measure}");
        for branch in Branch::BOTH {
            let result = evaluation.branch(branch);
            let _ = writeln!(
                out,
                "    {branch:?}: omnibus {}",
                format_p(&result.omnibus, |r| r.p_value)
            );
            let Some(ordering) = &result.ordering else {
                if let Some(TestOutcome::Failed(reason)) = &result.post_hoc {
                    let _ = writeln!(out, "      post-hoc failed ({reason})");
                }
                continue;
            };
            match &ordering.order {
                LevelOrder::Valid(levels) => {
                    for (level, models) in levels.iter().rev() {
                        let _ = writeln!(
                            out,
                            "      level {level}: {}",
                            model_names(data, models.iter().copied())
                        );
                    }
                }
                LevelOrder::Rejected(reason) => {
                    let _ = writeln!(out, "      no valid order ({reason:?})");
                }
            }
        }
    }

    if let Some(contingency) = &results.contingency {
        let _ = writeln!(
            out,
            "  {CONTINGENCY_MEASURE}: {}",
            format_p(contingency, |r| r.p_value)
        );
    }
    out
}
