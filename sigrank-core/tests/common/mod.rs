//! Shared fixtures for integration tests: a scripted statistics engine and
//! sample data builders.

#![allow(dead_code)]

use std::collections::BTreeMap;

use sigrank_core::{
    ContingencyTable, CorrectionMethod, EngineError, ModelMetadata, PairwiseTestResult,
    PipelineKind, SampleData, StatisticsEngine, TestId, TestResult, TriangularMatrix,
};

/// One engine call, as seen by the scripted engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    TwoSample(TestId),
    MultiSample(TestId),
    PostHoc(TestId),
    Contingency(TestId),
    Adjust(CorrectionMethod),
}

/// Engine returning canned results and recording every call it receives.
#[derive(Debug, Clone)]
pub struct ScriptedEngine {
    pub calls: Vec<Call>,
    /// p-value returned by every scalar test.
    pub omnibus_p: f64,
    /// p-values returned by every post-hoc test.
    pub post_hoc_p: TriangularMatrix,
    /// Adjusted p-values are `min(1, p * adjust_factor)`.
    pub adjust_factor: f64,
    /// Tests that fail with an engine error.
    pub failing: Vec<TestId>,
}

impl ScriptedEngine {
    pub fn new(post_hoc_p: TriangularMatrix) -> Self {
        Self {
            calls: Vec::new(),
            omnibus_p: 0.001,
            post_hoc_p,
            adjust_factor: 1.0,
            failing: Vec::new(),
        }
    }

    pub fn with_omnibus_p(mut self, p: f64) -> Self {
        self.omnibus_p = p;
        self
    }

    pub fn with_adjust_factor(mut self, factor: f64) -> Self {
        self.adjust_factor = factor;
        self
    }

    pub fn failing(mut self, test: TestId) -> Self {
        self.failing.push(test);
        self
    }

    fn scalar(&mut self, call: Call, test: TestId) -> Result<TestResult, EngineError> {
        self.calls.push(call);
        if self.failing.contains(&test) {
            return Err(EngineError::Failed(format!("scripted failure for {test}")));
        }
        Ok(TestResult::new(test.display_name(), self.omnibus_p, 1.0))
    }
}

impl StatisticsEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    fn two_sample(&mut self, test: TestId, _: &[f64], _: &[f64]) -> Result<TestResult, EngineError> {
        self.scalar(Call::TwoSample(test), test)
    }

    fn multi_sample(&mut self, test: TestId, _: &[Vec<f64>]) -> Result<TestResult, EngineError> {
        self.scalar(Call::MultiSample(test), test)
    }

    fn post_hoc(
        &mut self,
        test: TestId,
        _: &[Vec<f64>],
    ) -> Result<PairwiseTestResult, EngineError> {
        self.calls.push(Call::PostHoc(test));
        if self.failing.contains(&test) {
            return Err(EngineError::Failed(format!("scripted failure for {test}")));
        }
        let statistics = self.post_hoc_p.clone();
        Ok(PairwiseTestResult::new(
            test.display_name(),
            self.post_hoc_p.clone(),
            statistics,
            true,
        ))
    }

    fn contingency(
        &mut self,
        test: TestId,
        _: &ContingencyTable,
    ) -> Result<TestResult, EngineError> {
        self.scalar(Call::Contingency(test), test)
    }

    fn adjust(
        &mut self,
        p_values: &[f64],
        method: CorrectionMethod,
    ) -> Result<Vec<f64>, EngineError> {
        self.calls.push(Call::Adjust(method));
        Ok(p_values
            .iter()
            .map(|p| (p * self.adjust_factor).min(1.0))
            .collect())
    }
}

/// Sample data for one measure where model `i` averages roughly `means[i]`.
pub fn sample_data(measure: &str, means: &[f64], samples: usize) -> SampleData {
    let metadata = (0..means.len())
        .map(|i| ModelMetadata::new(format!("clf{i}"), "fs"))
        .collect();
    SampleData::new(
        BTreeMap::from([(measure.to_string(), model_rows(means, samples))]),
        metadata,
        PipelineKind::Cv,
    )
    .unwrap()
}

/// Model-major rows with a small deterministic wobble around each mean.
pub fn model_rows(means: &[f64], samples: usize) -> Vec<Vec<f64>> {
    means
        .iter()
        .map(|&m| {
            (0..samples)
                .map(|k| m + ((k % 3) as f64 - 1.0) * 0.002)
                .collect()
        })
        .collect()
}

/// All-pairs matrix where every cell holds `p`.
pub fn uniform_matrix(models: usize, p: f64) -> TriangularMatrix {
    TriangularMatrix::from_rows((0..models - 1).map(|i| vec![p; i + 1]).collect())
}
