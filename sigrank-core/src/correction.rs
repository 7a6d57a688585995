//! Multiple-comparison correction of post-hoc p-value matrices.

use tracing::warn;

use crate::config::CorrectionMethod;
use crate::engine::{EngineHandle, StatisticsEngine};
use crate::result::{FailureReason, PairwiseTestResult, TestOutcome, TriangularMatrix};

/// Correct one p-value matrix with one method.
///
/// The matrix is flattened row-major for the engine and the adjusted values
/// are reshaped into the same triangular layout.
pub fn correct<E: StatisticsEngine>(
    p_values: &TriangularMatrix,
    method: CorrectionMethod,
    engine: &EngineHandle<E>,
) -> TestOutcome<TriangularMatrix> {
    let flat = p_values.flatten();
    match engine.with(|e| e.adjust(&flat, method)) {
        Ok(adjusted) => match p_values.reshape(&adjusted) {
            Some(matrix) => TestOutcome::Completed(matrix),
            None => {
                warn!(%method, expected = flat.len(), got = adjusted.len(), "correction returned a misshaped matrix");
                TestOutcome::Failed(FailureReason::Engine(format!(
                    "{method} returned {} values for {} cells",
                    adjusted.len(),
                    flat.len()
                )))
            }
        },
        Err(err) => {
            warn!(%method, error = %err, "correction failed");
            TestOutcome::Failed(FailureReason::Engine(err.to_string()))
        }
    }
}

/// Apply every configured method to `result`, storing one outcome per method.
pub fn apply_corrections<E: StatisticsEngine>(
    result: &mut PairwiseTestResult,
    methods: &[CorrectionMethod],
    engine: &EngineHandle<E>,
) {
    for &method in methods {
        let outcome = correct(&result.p_values, method, engine);
        result.corrections.insert(method, outcome);
    }
}
