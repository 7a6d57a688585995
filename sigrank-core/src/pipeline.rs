//! End-to-end pipeline: split, select, evaluate.

use tracing::{error, info};

use crate::config::StatsConfig;
use crate::engine::{EngineHandle, StatisticsEngine};
use crate::evaluation::EvaluationResults;
use crate::evaluator::{EvalError, Evaluator};
use crate::sample::{split_by_fixed_variable, SampleData};
use crate::select::truncate_to_best_n;

/// Outcome of evaluating one split of the sample data.
#[derive(Debug)]
pub struct SplitOutcome {
    /// Value of the fixed variable, or `"all"` when the data was not split.
    pub label: String,
    pub result: Result<EvaluationResults, EvalError>,
}

/// Split `data` by the configured fixed variable, truncate every split to
/// the best N models and evaluate it.
///
/// Configuration and split errors abort the pipeline. A fatal error while
/// evaluating one split is recorded in its outcome and the remaining splits
/// still run.
pub fn evaluate_pipeline<E: StatisticsEngine>(
    config: &StatsConfig,
    data: &SampleData,
    engine: &EngineHandle<E>,
) -> Result<Vec<SplitOutcome>, EvalError> {
    let evaluator = Evaluator::new(config, engine)?;
    let splits = split_by_fixed_variable(data, config.fix_independent_variable)?;

    info!(splits = splits.len(), "running evaluation pipeline");

    Ok(splits
        .into_iter()
        .map(|(label, split)| {
            let selected =
                truncate_to_best_n(split, config.select_best_n, &config.select_by_measure);
            let result = evaluator.evaluate(&selected);
            if let Err(err) = &result {
                error!(split = %label, error = %err, "split evaluation failed");
            }
            SplitOutcome { label, result }
        })
        .collect())
}
