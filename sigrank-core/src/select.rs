//! Model selection: keep the best N models by one measure.

use thiserror::Error;
use tracing::{debug, error};

use crate::sample::SampleData;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("neither '{measure}' nor 'Averaged {measure}' is available for model selection")]
    MissingMeasure { measure: String },
}

/// Indices of the models to drop so that `keep` remain.
///
/// Models are ranked by ascending average of `measure` (falling back to
/// `"Averaged <measure>"`); the lowest `count - keep` are dropped, except
/// that a baseline model is never dropped. A baseline among the lowest
/// therefore leaves `keep + 1` models.
pub fn models_to_drop(
    data: &SampleData,
    keep: usize,
    measure: &str,
) -> Result<Vec<usize>, SelectionError> {
    let count = data.model_count();
    if count <= keep || count <= 1 {
        return Ok(Vec::new());
    }

    let averages = data
        .averages(measure)
        .or_else(|| data.averages(&format!("Averaged {measure}")))
        .ok_or_else(|| SelectionError::MissingMeasure {
            measure: measure.to_string(),
        })?;

    let mut ranked: Vec<usize> = (0..averages.len()).collect();
    ranked.sort_by(|&a, &b| averages[a].total_cmp(&averages[b]));

    let baselines = data.baseline_indices();
    Ok(ranked
        .into_iter()
        .take(count - keep)
        .filter(|i| !baselines.contains(i))
        .collect())
}

/// Truncate `data` to its best `keep` models by `measure`.
///
/// Returns the input unchanged when the measure is unavailable.
pub fn truncate_to_best_n(mut data: SampleData, keep: usize, measure: &str) -> SampleData {
    match models_to_drop(&data, keep, measure) {
        Ok(drop) if drop.is_empty() => data,
        Ok(drop) => {
            debug!(measure, keep, dropped = drop.len(), "truncating model set");
            data.remove_models(&drop);
            data
        }
        Err(err) => {
            error!(error = %err, "model selection skipped");
            data
        }
    }
}
