//! Evaluation results: everything one evaluation run produced.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{CorrectionMethod, SignificanceLevels};
use crate::ordering::ModelOrdering;
use crate::policy::{Branch, TestPlan};
use crate::result::{PairwiseTestResult, TestOutcome, TestResult};
use crate::sample::SampleData;

/// Label under which the contingency test result is reported.
pub const CONTINGENCY_MEASURE: &str = "Contingency Table";

/// Current schema version for persisted results.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Results of one branch (parametric or non-parametric) for one measure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchResult {
    pub omnibus: TestOutcome<TestResult>,
    /// Absent for two-model evaluations and when the omnibus test failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_hoc: Option<TestOutcome<PairwiseTestResult>>,
    /// Present whenever a post-hoc result was obtained.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordering: Option<ModelOrdering>,
}

impl BranchResult {
    pub fn omnibus_only(omnibus: TestOutcome<TestResult>) -> Self {
        Self {
            omnibus,
            post_hoc: None,
            ordering: None,
        }
    }
}

/// Results of both branches for one measure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureEvaluation {
    pub model_count: usize,
    pub parametric: BranchResult,
    pub non_parametric: BranchResult,
}

impl MeasureEvaluation {
    pub fn branch(&self, branch: Branch) -> &BranchResult {
        match branch {
            Branch::Parametric => &self.parametric,
            Branch::NonParametric => &self.non_parametric,
        }
    }
}

/// Aggregate results of an evaluation run. Read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResults {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub measures: BTreeMap<String, MeasureEvaluation>,
    pub plan: TestPlan,
    pub corrections: Vec<CorrectionMethod>,
    pub significance: SignificanceLevels,
    pub is_baseline_evaluation: bool,
    /// Result of the contingency test, when one was configured and applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contingency: Option<TestOutcome<TestResult>>,
    pub sample_data: SampleData,
    pub fingerprint: String,
    pub evaluated_at: DateTime<Utc>,
}

impl EvaluationResults {
    pub fn measure(&self, name: &str) -> Option<&MeasureEvaluation> {
        self.measures.get(name)
    }

    /// Every ordering as `(measure, branch, ordering)`.
    pub fn orderings(&self) -> impl Iterator<Item = (&str, Branch, &ModelOrdering)> {
        self.measures.iter().flat_map(|(name, eval)| {
            Branch::BOTH.into_iter().filter_map(move |branch| {
                eval.branch(branch)
                    .ordering
                    .as_ref()
                    .map(|ordering| (name.as_str(), branch, ordering))
            })
        })
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
