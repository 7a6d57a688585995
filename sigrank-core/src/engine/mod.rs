//! Statistics engine abstraction.
//!
//! The evaluator never computes a p-value itself. It dispatches resolved
//! [`TestHandle`](crate::registry::TestHandle)s to a [`StatisticsEngine`]
//! through an [`EngineHandle`], which owns the engine session and serializes
//! access to it.

pub mod adjust;
pub mod distributions;
pub mod native;

use std::sync::Mutex;

use thiserror::Error;

use crate::config::{CorrectionMethod, TestId};
use crate::result::{PairwiseTestResult, TestResult};
use crate::sample::ContingencyTable;

pub use native::NativeEngine;

/// Errors raised by a statistics engine call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("method not found: {0}")]
    Unsupported(String),

    #[error("invalid input for {test}: {reason}")]
    InvalidInput { test: String, reason: String },

    #[error("engine call failed: {0}")]
    Failed(String),

    #[error("engine session is closed")]
    SessionClosed,
}

impl EngineError {
    pub fn invalid(test: impl ToString, reason: impl Into<String>) -> Self {
        EngineError::InvalidInput {
            test: test.to_string(),
            reason: reason.into(),
        }
    }
}

/// A stateful statistics backend, one method per call shape.
///
/// Methods take `&mut self`: backends are sessions (an interpreter, a
/// remote service) and are driven through an [`EngineHandle`].
pub trait StatisticsEngine: Send {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    fn open(&mut self) -> Result<(), EngineError> {
        Ok(())
    }

    fn close(&mut self) -> Result<(), EngineError> {
        Ok(())
    }

    /// Omnibus test on two paired sample vectors.
    fn two_sample(&mut self, test: TestId, a: &[f64], b: &[f64])
        -> Result<TestResult, EngineError>;

    /// Omnibus test on a model-major sample matrix.
    fn multi_sample(&mut self, test: TestId, samples: &[Vec<f64>])
        -> Result<TestResult, EngineError>;

    /// Post-hoc test on a model-major sample matrix.
    fn post_hoc(
        &mut self,
        test: TestId,
        samples: &[Vec<f64>],
    ) -> Result<PairwiseTestResult, EngineError>;

    /// Test on 2×2 contingency counts.
    fn contingency(
        &mut self,
        test: TestId,
        table: &ContingencyTable,
    ) -> Result<TestResult, EngineError>;

    /// Adjust row-major flattened p-values. NaN entries stay NaN.
    fn adjust(
        &mut self,
        p_values: &[f64],
        method: CorrectionMethod,
    ) -> Result<Vec<f64>, EngineError>;
}

/// Owned engine session with serialized access.
#[derive(Debug)]
pub struct EngineHandle<E: StatisticsEngine> {
    engine: Mutex<E>,
}

impl<E: StatisticsEngine> EngineHandle<E> {
    /// Open the engine session and take ownership of it.
    pub fn open(mut engine: E) -> Result<Self, EngineError> {
        engine.open()?;
        tracing::debug!(engine = engine.name(), "statistics engine opened");
        Ok(Self {
            engine: Mutex::new(engine),
        })
    }

    /// Run `f` with exclusive access to the engine.
    pub fn with<R>(
        &self,
        f: impl FnOnce(&mut E) -> Result<R, EngineError>,
    ) -> Result<R, EngineError> {
        let mut guard = self.engine.lock().map_err(|_| EngineError::SessionClosed)?;
        f(&mut guard)
    }

    /// Close the session and hand the engine back.
    pub fn close(self) -> Result<E, EngineError> {
        let mut engine = self
            .engine
            .into_inner()
            .map_err(|_| EngineError::SessionClosed)?;
        engine.close()?;
        tracing::debug!(engine = engine.name(), "statistics engine closed");
        Ok(engine)
    }
}
