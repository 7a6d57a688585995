//! Test result types returned by a statistics engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::CorrectionMethod;

/// Scalar result of an omnibus or two-sample test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub method: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, f64>,
    #[serde(with = "nullable")]
    pub p_value: f64,
    #[serde(with = "nullable")]
    pub statistic: f64,
    /// Assumption checks (normality, sphericity, ...) run alongside the test.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub assumptions: BTreeMap<String, TestResult>,
}

impl TestResult {
    pub fn new(method: impl Into<String>, p_value: f64, statistic: f64) -> Self {
        Self {
            method: method.into(),
            parameters: BTreeMap::new(),
            p_value,
            statistic,
            assumptions: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: f64) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    pub fn with_assumption(mut self, name: impl Into<String>, result: TestResult) -> Self {
        self.assumptions.insert(name.into(), result);
        self
    }
}

/// Ragged lower-triangular matrix of pairwise values.
///
/// Row `i` compares model `i + 1` against model `j` for every stored column
/// `j <= i`. All-pairs matrices store `i + 1` cells in row `i`; control
/// matrices store a single column (model `i + 1` against model 0). Cells
/// holding NaN mark comparisons that could not be computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TriangularMatrix {
    #[serde(with = "nullable_rows")]
    rows: Vec<Vec<f64>>,
}

impl TriangularMatrix {
    /// All-pairs matrix for `models` models, every cell NaN.
    pub fn all_pairs(models: usize) -> Self {
        let rows = (0..models.saturating_sub(1))
            .map(|i| vec![f64::NAN; i + 1])
            .collect();
        Self { rows }
    }

    /// Control matrix: `values[i]` compares model `i + 1` against model 0.
    pub fn control_column(values: Vec<f64>) -> Self {
        Self {
            rows: values.into_iter().map(|v| vec![v]).collect(),
        }
    }

    /// Build from explicit rows. Cells above the diagonal are discarded.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Self {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(i, mut row)| {
                row.truncate(i + 1);
                row
            })
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Number of models the matrix covers.
    pub fn model_count(&self) -> usize {
        self.rows.len() + 1
    }

    /// Defined value at `(i, j)`: `None` above the diagonal, outside the
    /// stored cells, or where the comparison failed.
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        if j > i {
            return None;
        }
        self.rows
            .get(i)
            .and_then(|row| row.get(j))
            .copied()
            .filter(|v| !v.is_nan())
    }

    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        if j > i {
            return;
        }
        if let Some(cell) = self.rows.get_mut(i).and_then(|row| row.get_mut(j)) {
            *cell = value;
        }
    }

    /// Every stored cell as `(i, j, value)`, NaN cells included.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .flat_map(|(i, row)| row.iter().enumerate().map(move |(j, &v)| (i, j, v)))
    }

    /// Stored cells in row-major order.
    pub fn flatten(&self) -> Vec<f64> {
        self.rows.iter().flatten().copied().collect()
    }

    /// Refill a matrix of this shape from row-major values.
    pub fn reshape(&self, flat: &[f64]) -> Option<Self> {
        let cells: usize = self.rows.iter().map(Vec::len).sum();
        if flat.len() != cells {
            return None;
        }
        let mut offset = 0;
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let next = flat[offset..offset + row.len()].to_vec();
                offset += row.len();
                next
            })
            .collect();
        Some(Self { rows })
    }
}

/// Matrix result of a post-hoc test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwiseTestResult {
    pub method: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, f64>,
    pub p_values: TriangularMatrix,
    pub statistics: TriangularMatrix,
    pub requires_correction: bool,
    /// Corrected p-values per method; filled in after the engine call.
    #[serde(default)]
    pub corrections: BTreeMap<CorrectionMethod, TestOutcome<TriangularMatrix>>,
}

impl PairwiseTestResult {
    pub fn new(
        method: impl Into<String>,
        p_values: TriangularMatrix,
        statistics: TriangularMatrix,
        requires_correction: bool,
    ) -> Self {
        Self {
            method: method.into(),
            parameters: BTreeMap::new(),
            p_values,
            statistics,
            requires_correction,
            corrections: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: f64) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    /// True when no stored p-value is defined.
    pub fn all_failed(&self) -> bool {
        self.p_values.cells().all(|(_, _, p)| p.is_nan())
    }
}

/// Why a test slot holds no result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    #[error("engine call failed: {0}")]
    Engine(String),
    #[error("test returned a NaN p-value")]
    NanPValue,
    #[error("no contingency table available")]
    MissingContingencyTable,
}

/// Result slot: either the engine's result or the reason it is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum TestOutcome<T> {
    Completed(T),
    Failed(FailureReason),
}

impl<T> TestOutcome<T> {
    pub fn completed(&self) -> Option<&T> {
        match self {
            TestOutcome::Completed(value) => Some(value),
            TestOutcome::Failed(_) => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, TestOutcome::Completed(_))
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match self {
            TestOutcome::Completed(_) => None,
            TestOutcome::Failed(reason) => Some(reason),
        }
    }
}

/// NaN is written as `null` and read back as NaN.
mod nullable {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_none()
        } else {
            serializer.serialize_some(value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}

mod nullable_rows {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(rows: &[Vec<f64>], serializer: S) -> Result<S::Ok, S::Error> {
        let rows: Vec<Vec<Option<f64>>> = rows
            .iter()
            .map(|row| row.iter().map(|v| (!v.is_nan()).then_some(*v)).collect())
            .collect();
        rows.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Vec<f64>>, D::Error> {
        let rows = Vec::<Vec<Option<f64>>>::deserialize(deserializer)?;
        Ok(rows
            .into_iter()
            .map(|row| row.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
            .collect())
    }
}
