//! Test selection policy.
//!
//! Decides which tests an evaluation needs from the number of models and
//! whether one of them is a baseline. Both the parametric and the
//! non-parametric branch are always planned.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::TestClass;
use crate::registry::{TestHandle, TestRegistry};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("{0} model(s) cannot be compared; at least two are required")]
    InsufficientModels(usize),

    #[error("no test resolved for class {0}")]
    Unresolved(TestClass),
}

/// The two evaluation branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Branch {
    Parametric,
    NonParametric,
}

impl Branch {
    pub const BOTH: [Branch; 2] = [Branch::Parametric, Branch::NonParametric];
}

/// Which comparisons a post-hoc test makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostHocMode {
    /// All C(n, 2) pairs.
    AllPairs,
    /// Model 0 (the baseline) against every other model.
    VersusControl,
}

/// Tests selected for one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TestPlan {
    /// Exactly two models: omnibus two-sample tests only.
    TwoSample {
        parametric: TestHandle,
        non_parametric: TestHandle,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        contingency: Option<TestHandle>,
    },
    /// Three or more models: omnibus tests followed by post-hoc tests.
    MultiSample {
        parametric: TestHandle,
        non_parametric: TestHandle,
        post_hoc_parametric: TestHandle,
        post_hoc_non_parametric: TestHandle,
        mode: PostHocMode,
    },
}

impl TestPlan {
    pub fn omnibus(&self, branch: Branch) -> TestHandle {
        match (self, branch) {
            (TestPlan::TwoSample { parametric, .. }, Branch::Parametric)
            | (TestPlan::MultiSample { parametric, .. }, Branch::Parametric) => *parametric,
            (TestPlan::TwoSample { non_parametric, .. }, Branch::NonParametric)
            | (TestPlan::MultiSample { non_parametric, .. }, Branch::NonParametric) => {
                *non_parametric
            }
        }
    }

    pub fn post_hoc(&self, branch: Branch) -> Option<TestHandle> {
        match self {
            TestPlan::TwoSample { .. } => None,
            TestPlan::MultiSample {
                post_hoc_parametric,
                post_hoc_non_parametric,
                ..
            } => Some(match branch {
                Branch::Parametric => *post_hoc_parametric,
                Branch::NonParametric => *post_hoc_non_parametric,
            }),
        }
    }

    pub fn contingency(&self) -> Option<TestHandle> {
        match self {
            TestPlan::TwoSample { contingency, .. } => *contingency,
            TestPlan::MultiSample { .. } => None,
        }
    }
}

/// Select the tests for `model_count` models.
pub fn select_tests(
    model_count: usize,
    is_baseline_evaluation: bool,
    registry: &TestRegistry,
) -> Result<TestPlan, PolicyError> {
    let resolve = |class: TestClass| registry.handle(class).ok_or(PolicyError::Unresolved(class));

    match model_count {
        0 | 1 => Err(PolicyError::InsufficientModels(model_count)),
        2 => Ok(TestPlan::TwoSample {
            parametric: resolve(TestClass::TwoSamplesParametric)?,
            non_parametric: resolve(TestClass::TwoSamplesNonParametric)?,
            contingency: registry.handle(TestClass::TwoSamplesNonParametricContingency),
        }),
        _ => {
            let (post_hoc_parametric, post_hoc_non_parametric, mode) = if is_baseline_evaluation {
                (
                    resolve(TestClass::MultipleSamplesParametricPostHocBaseline)?,
                    resolve(TestClass::MultipleSamplesNonParametricPostHocBaseline)?,
                    PostHocMode::VersusControl,
                )
            } else {
                (
                    resolve(TestClass::MultipleSamplesParametricPostHoc)?,
                    resolve(TestClass::MultipleSamplesNonParametricPostHoc)?,
                    PostHocMode::AllPairs,
                )
            };
            Ok(TestPlan::MultiSample {
                parametric: resolve(TestClass::MultipleSamplesParametric)?,
                non_parametric: resolve(TestClass::MultipleSamplesNonParametric)?,
                post_hoc_parametric,
                post_hoc_non_parametric,
                mode,
            })
        }
    }
}
