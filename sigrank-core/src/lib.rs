//! SigRank Core: significance evaluation and model ordering.
//!
//! This crate provides:
//! - Sample data model with baseline handling and variable splits
//! - Best-N model selection
//! - Test selection policy and a test registry resolved at config time
//! - A statistics engine abstraction plus a pure-Rust engine
//! - Multiple-comparison corrections (R `p.adjust` semantics)
//! - Significance graphs and validated level orderings
//! - Parallel per-measure evaluation and a split/select/evaluate pipeline

pub mod config;
pub mod correction;
pub mod engine;
pub mod evaluation;
pub mod evaluator;
pub mod graph;
pub mod ordering;
pub mod pipeline;
pub mod policy;
pub mod registry;
pub mod result;
pub mod sample;
pub mod select;

pub use config::{
    ConfigError, CorrectionMethod, SignificanceLevels, StatsConfig, TestClass, TestId, TestSuite,
};
pub use correction::{apply_corrections, correct};
pub use engine::{EngineError, EngineHandle, NativeEngine, StatisticsEngine};
pub use evaluation::{
    BranchResult, EvaluationResults, MeasureEvaluation, CONTINGENCY_MEASURE, SCHEMA_VERSION,
};
pub use evaluator::{EvalError, Evaluator};
pub use graph::{build_significance_graph, SignificanceGraph};
pub use ordering::{order_models, LevelOrder, ModelOrdering, OrderRejection};
pub use pipeline::{evaluate_pipeline, SplitOutcome};
pub use policy::{select_tests, Branch, PolicyError, PostHocMode, TestPlan};
pub use registry::{CallShape, TestHandle, TestRegistry};
pub use result::{FailureReason, PairwiseTestResult, TestOutcome, TestResult, TriangularMatrix};
pub use sample::{
    split_by_fixed_variable, ContingencyTable, FixedVariable, ModelMetadata, PipelineKind,
    SampleData, SampleError, MIN_SAMPLES,
};
pub use select::{models_to_drop, truncate_to_best_n, SelectionError};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn sample_data_is_send_sync() {
        assert_send::<SampleData>();
        assert_sync::<SampleData>();
    }

    #[test]
    fn config_is_send_sync() {
        assert_send::<StatsConfig>();
        assert_sync::<StatsConfig>();
        assert_send::<TestRegistry>();
        assert_sync::<TestRegistry>();
    }

    #[test]
    fn engine_handle_is_sync() {
        assert_send::<EngineHandle<NativeEngine>>();
        assert_sync::<EngineHandle<NativeEngine>>();
    }

    #[test]
    fn results_are_send_sync() {
        assert_send::<EvaluationResults>();
        assert_sync::<EvaluationResults>();
        assert_send::<PairwiseTestResult>();
        assert_sync::<PairwiseTestResult>();
    }

    #[test]
    fn graph_types_are_send_sync() {
        assert_send::<SignificanceGraph>();
        assert_sync::<SignificanceGraph>();
        assert_send::<ModelOrdering>();
        assert_sync::<ModelOrdering>();
    }
}
