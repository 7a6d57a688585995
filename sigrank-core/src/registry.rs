//! Test registry: resolves configured test identifiers to typed handles.
//!
//! Every configured test is checked against its class once, when the
//! registry is built. The evaluator only ever dispatches through handles,
//! so a test that cannot serve its class is a configuration error rather
//! than a failure discovered mid-evaluation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, TestClass, TestId, TestSuite};

/// Input/output shape of a statistics engine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallShape {
    /// Two sample vectors in, scalar result out.
    TwoSample,
    /// Model-major sample matrix in, scalar result out.
    MultiSample,
    /// Model-major sample matrix in, pairwise matrix out.
    PostHoc,
    /// 2×2 contingency counts in, scalar result out.
    Contingency,
}

impl TestId {
    pub fn call_shape(&self) -> CallShape {
        match self {
            TestId::McNemar => CallShape::Contingency,
            TestId::DependentT | TestId::WilcoxonSignedRank => CallShape::TwoSample,
            TestId::RepeatedMeasuresOneWayANOVA | TestId::Friedman => CallShape::MultiSample,
            TestId::PairwiseDependentT
            | TestId::Tukey
            | TestId::Nemenyi
            | TestId::Dunnett
            | TestId::PairwiseWilcoxonSignedRank => CallShape::PostHoc,
        }
    }
}

impl TestClass {
    pub fn call_shape(&self) -> CallShape {
        match self {
            TestClass::TwoSamplesNonParametricContingency => CallShape::Contingency,
            TestClass::TwoSamplesParametric | TestClass::TwoSamplesNonParametric => {
                CallShape::TwoSample
            }
            TestClass::MultipleSamplesParametric | TestClass::MultipleSamplesNonParametric => {
                CallShape::MultiSample
            }
            TestClass::MultipleSamplesParametricPostHoc
            | TestClass::MultipleSamplesNonParametricPostHoc
            | TestClass::MultipleSamplesParametricPostHocBaseline
            | TestClass::MultipleSamplesNonParametricPostHocBaseline => CallShape::PostHoc,
        }
    }
}

/// A resolved test: identifier plus the call shape it is dispatched with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestHandle {
    pub test: TestId,
    pub shape: CallShape,
}

/// Lookup table from test class to resolved handle.
#[derive(Debug, Clone, PartialEq)]
pub struct TestRegistry {
    handles: BTreeMap<TestClass, TestHandle>,
}

impl TestRegistry {
    /// Resolve every configured test of `suite`.
    pub fn resolve(suite: &TestSuite) -> Result<Self, ConfigError> {
        let mut handles = BTreeMap::new();
        for (class, test) in suite.entries() {
            if !class.allows(test) {
                return Err(ConfigError::TestNotAllowed { class, test });
            }
            let shape = test.call_shape();
            if shape != class.call_shape() {
                return Err(ConfigError::ShapeMismatch { class, test });
            }
            handles.insert(class, TestHandle { test, shape });
        }
        Ok(Self { handles })
    }

    pub fn handle(&self, class: TestClass) -> Option<TestHandle> {
        self.handles.get(&class).copied()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
