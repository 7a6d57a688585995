//! Evaluator: runs the planned tests for every measure.
//!
//! Per measure, both branches run their omnibus test. When an omnibus test
//! succeeds and the plan has a post-hoc step, the post-hoc test runs, its
//! p-values are corrected with every configured method, and a significance
//! graph built from the uncorrected p-values is leveled into an ordering.
//!
//! Engine failures are local: they are recorded in the result slot and the
//! evaluation continues. Fewer than two models, or no measures at all,
//! abort the whole run.

use chrono::Utc;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::{ConfigError, StatsConfig, TestClass};
use crate::correction::apply_corrections;
use crate::engine::{EngineError, EngineHandle, StatisticsEngine};
use crate::evaluation::{
    BranchResult, EvaluationResults, MeasureEvaluation, CONTINGENCY_MEASURE, SCHEMA_VERSION,
};
use crate::graph::build_significance_graph;
use crate::ordering::{LevelOrder, ModelOrdering};
use crate::policy::{select_tests, Branch, PolicyError, TestPlan};
use crate::registry::{TestHandle, TestRegistry};
use crate::result::{FailureReason, PairwiseTestResult, TestOutcome, TestResult};
use crate::sample::{SampleData, SampleError};

/// Fatal evaluation errors. Local test failures never surface here.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("sample data error: {0}")]
    Sample(#[from] SampleError),

    #[error("measure '{measure}' has {count} model(s); at least two are required")]
    InsufficientModels { measure: String, count: usize },

    #[error("no measure data to evaluate")]
    NoMeasures,

    #[error("no per-model averages for measure '{0}'")]
    MissingAverages(String),

    #[error("no test resolved for class {0}")]
    UnresolvedTest(TestClass),
}

/// Evaluates sample data against one configuration and engine session.
pub struct Evaluator<'a, E: StatisticsEngine> {
    config: &'a StatsConfig,
    registry: TestRegistry,
    engine: &'a EngineHandle<E>,
}

impl<'a, E: StatisticsEngine> Evaluator<'a, E> {
    /// Validate `config` and resolve its tests.
    pub fn new(config: &'a StatsConfig, engine: &'a EngineHandle<E>) -> Result<Self, EvalError> {
        config.validate()?;
        let registry = TestRegistry::resolve(&config.tests)?;
        Ok(Self {
            config,
            registry,
            engine,
        })
    }

    pub fn config(&self) -> &StatsConfig {
        self.config
    }

    /// Evaluate every measure of `data`.
    pub fn evaluate(&self, data: &SampleData) -> Result<EvaluationResults, EvalError> {
        let Some(first) = data.measures().next() else {
            error!("evaluation aborted: no measure data");
            return Err(EvalError::NoMeasures);
        };

        data.check_baseline().map_err(|err| {
            error!(error = %err, "evaluation aborted");
            EvalError::Sample(err)
        })?;

        let count = data.model_count();
        let plan = select_tests(count, data.is_baseline_evaluation(), &self.registry)
            .map_err(|err| {
                let err = match err {
                    PolicyError::InsufficientModels(count) => EvalError::InsufficientModels {
                        measure: first.to_string(),
                        count,
                    },
                    PolicyError::Unresolved(class) => EvalError::UnresolvedTest(class),
                };
                error!(error = %err, "evaluation aborted");
                err
            })?;

        info!(
            models = count,
            measures = data.samples().len(),
            baseline = data.is_baseline_evaluation(),
            "starting evaluation"
        );

        let measures = data
            .samples()
            .par_iter()
            .map(|(measure, rows)| {
                self.evaluate_measure(measure, rows, data, &plan)
                    .map(|evaluation| (measure.clone(), evaluation))
            })
            .collect::<Result<Vec<_>, EvalError>>()
            .map_err(|err| {
                error!(error = %err, "evaluation aborted");
                err
            })?;

        let contingency = plan
            .contingency()
            .map(|handle| self.run_contingency(handle, data));

        Ok(EvaluationResults {
            schema_version: SCHEMA_VERSION,
            measures: measures.into_iter().collect(),
            plan,
            corrections: self.config.corrections.clone(),
            significance: self.config.significance,
            is_baseline_evaluation: data.is_baseline_evaluation(),
            contingency,
            sample_data: data.clone(),
            fingerprint: data.fingerprint(),
            evaluated_at: Utc::now(),
        })
    }

    fn evaluate_measure(
        &self,
        measure: &str,
        rows: &[Vec<f64>],
        data: &SampleData,
        plan: &TestPlan,
    ) -> Result<MeasureEvaluation, EvalError> {
        if rows.len() <= 1 {
            return Err(EvalError::InsufficientModels {
                measure: measure.to_string(),
                count: rows.len(),
            });
        }
        let averages = data
            .averages(measure)
            .ok_or_else(|| EvalError::MissingAverages(measure.to_string()))?;

        info!(measure, models = rows.len(), "evaluating measure");

        Ok(MeasureEvaluation {
            model_count: rows.len(),
            parametric: self.evaluate_branch(measure, Branch::Parametric, rows, averages, plan),
            non_parametric: self.evaluate_branch(
                measure,
                Branch::NonParametric,
                rows,
                averages,
                plan,
            ),
        })
    }

    fn evaluate_branch(
        &self,
        measure: &str,
        branch: Branch,
        rows: &[Vec<f64>],
        averages: &[f64],
        plan: &TestPlan,
    ) -> BranchResult {
        let handle = plan.omnibus(branch);
        let omnibus = match plan {
            TestPlan::TwoSample { .. } => {
                self.scalar(measure, handle, |e| e.two_sample(handle.test, &rows[0], &rows[1]))
            }
            TestPlan::MultiSample { .. } => {
                self.scalar(measure, handle, |e| e.multi_sample(handle.test, rows))
            }
        };

        let Some(post_hoc_handle) = plan.post_hoc(branch) else {
            return BranchResult::omnibus_only(omnibus);
        };
        if !omnibus.is_completed() {
            return BranchResult::omnibus_only(omnibus);
        }

        let mut post_hoc = self.pairwise(measure, post_hoc_handle, rows);
        let ordering = match &mut post_hoc {
            TestOutcome::Completed(result) => {
                if result.requires_correction {
                    apply_corrections(result, &self.config.corrections, self.engine);
                }
                let graph =
                    build_significance_graph(result, averages, self.config.significance.medium);
                let ordering = ModelOrdering::from_graph(&graph);
                if let LevelOrder::Rejected(reason) = &ordering.order {
                    warn!(measure, ?branch, ?reason, "no valid ordering");
                }
                Some(ordering)
            }
            TestOutcome::Failed(_) => None,
        };

        BranchResult {
            omnibus,
            post_hoc: Some(post_hoc),
            ordering,
        }
    }

    fn run_contingency(&self, handle: TestHandle, data: &SampleData) -> TestOutcome<TestResult> {
        match data.contingency() {
            Some(table) => {
                self.scalar(CONTINGENCY_MEASURE, handle, |e| e.contingency(handle.test, table))
            }
            None => {
                error!(test = %handle.test, "contingency table required but not available");
                TestOutcome::Failed(FailureReason::MissingContingencyTable)
            }
        }
    }

    fn scalar(
        &self,
        measure: &str,
        handle: TestHandle,
        call: impl FnOnce(&mut E) -> Result<TestResult, EngineError>,
    ) -> TestOutcome<TestResult> {
        match self.engine.with(call) {
            Ok(result) if result.p_value.is_nan() => {
                warn!(measure, test = %handle.test, "test returned a NaN p-value");
                TestOutcome::Failed(FailureReason::NanPValue)
            }
            Ok(result) => TestOutcome::Completed(result),
            Err(err) => {
                warn!(measure, test = %handle.test, error = %err, "test failed");
                TestOutcome::Failed(FailureReason::Engine(err.to_string()))
            }
        }
    }

    fn pairwise(
        &self,
        measure: &str,
        handle: TestHandle,
        rows: &[Vec<f64>],
    ) -> TestOutcome<PairwiseTestResult> {
        match self.engine.with(|e| e.post_hoc(handle.test, rows)) {
            Ok(result) if result.all_failed() => {
                warn!(measure, test = %handle.test, "post-hoc test returned no p-values");
                TestOutcome::Failed(FailureReason::NanPValue)
            }
            Ok(result) => TestOutcome::Completed(result),
            Err(err) => {
                warn!(measure, test = %handle.test, error = %err, "post-hoc test failed");
                TestOutcome::Failed(FailureReason::Engine(err.to_string()))
            }
        }
    }
}
