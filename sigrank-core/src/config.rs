//! Serializable evaluation configuration.
//!
//! A [`StatsConfig`] names one test per test class, the correction methods
//! applied to post-hoc matrices, the three significance thresholds and the
//! model selection settings. It is validated on load and is read-only
//! afterwards.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sample::FixedVariable;

/// Errors raised while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("test {test} is not allowed for test class {class}")]
    TestNotAllowed { class: TestClass, test: TestId },

    #[error("test {test} cannot serve test class {class}: call shapes differ")]
    ShapeMismatch { class: TestClass, test: TestId },

    #[error("at least one correction method is required")]
    NoCorrections,

    #[error("significance level {name} = {value} is outside [0, 1]")]
    ThresholdOutOfRange { name: &'static str, value: f64 },

    #[error("significance levels must satisfy 0 < high <= medium <= low (got high={high}, medium={medium}, low={low})")]
    ThresholdOrder { low: f64, medium: f64, high: f64 },

    #[error("select_best_n must be at least 1")]
    ZeroSelectBestN,

    #[error("select_by_measure must not be empty")]
    EmptyRankingMeasure,
}

/// Statistical test identifiers known to the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TestId {
    McNemar,
    DependentT,
    WilcoxonSignedRank,
    RepeatedMeasuresOneWayANOVA,
    Friedman,
    PairwiseDependentT,
    Tukey,
    Nemenyi,
    #[serde(alias = "Dunett")]
    Dunnett,
    PairwiseWilcoxonSignedRank,
}

impl TestId {
    pub const ALL: [TestId; 10] = [
        TestId::McNemar,
        TestId::DependentT,
        TestId::WilcoxonSignedRank,
        TestId::RepeatedMeasuresOneWayANOVA,
        TestId::Friedman,
        TestId::PairwiseDependentT,
        TestId::Tukey,
        TestId::Nemenyi,
        TestId::Dunnett,
        TestId::PairwiseWilcoxonSignedRank,
    ];

    /// Identifier as it appears in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            TestId::McNemar => "McNemar",
            TestId::DependentT => "DependentT",
            TestId::WilcoxonSignedRank => "WilcoxonSignedRank",
            TestId::RepeatedMeasuresOneWayANOVA => "RepeatedMeasuresOneWayANOVA",
            TestId::Friedman => "Friedman",
            TestId::PairwiseDependentT => "PairwiseDependentT",
            TestId::Tukey => "Tukey",
            TestId::Nemenyi => "Nemenyi",
            TestId::Dunnett => "Dunnett",
            TestId::PairwiseWilcoxonSignedRank => "PairwiseWilcoxonSignedRank",
        }
    }

    /// Human-readable name used in reports.
    pub fn display_name(&self) -> &'static str {
        match self {
            TestId::McNemar => "McNemar test",
            TestId::DependentT => "dependent t-test",
            TestId::WilcoxonSignedRank => "Wilcoxon signed-rank test",
            TestId::RepeatedMeasuresOneWayANOVA => "repeated-measures one-way ANOVA",
            TestId::Friedman => "Friedman test",
            TestId::PairwiseDependentT => "pairwise dependent t-test",
            TestId::Tukey => "Tukey's test",
            TestId::Nemenyi => "Nemenyi test",
            TestId::Dunnett => "Dunnett's test",
            TestId::PairwiseWilcoxonSignedRank => "pairwise Wilcoxon signed-rank test",
        }
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Categories of tests; each configured test serves exactly one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TestClass {
    TwoSamplesNonParametricContingency,
    TwoSamplesParametric,
    TwoSamplesNonParametric,
    MultipleSamplesParametric,
    MultipleSamplesNonParametric,
    MultipleSamplesParametricPostHoc,
    MultipleSamplesNonParametricPostHoc,
    MultipleSamplesParametricPostHocBaseline,
    MultipleSamplesNonParametricPostHocBaseline,
}

impl TestClass {
    /// Tests permitted for this class.
    pub fn allowed(&self) -> &'static [TestId] {
        match self {
            TestClass::TwoSamplesNonParametricContingency => &[TestId::McNemar],
            TestClass::TwoSamplesParametric => &[TestId::DependentT],
            TestClass::TwoSamplesNonParametric => &[TestId::WilcoxonSignedRank],
            TestClass::MultipleSamplesParametric => &[TestId::RepeatedMeasuresOneWayANOVA],
            TestClass::MultipleSamplesNonParametric => &[TestId::Friedman],
            TestClass::MultipleSamplesParametricPostHoc => {
                &[TestId::PairwiseDependentT, TestId::Tukey]
            }
            TestClass::MultipleSamplesNonParametricPostHoc => &[TestId::Nemenyi],
            TestClass::MultipleSamplesParametricPostHocBaseline => &[TestId::Dunnett],
            TestClass::MultipleSamplesNonParametricPostHocBaseline => {
                &[TestId::PairwiseWilcoxonSignedRank]
            }
        }
    }

    pub fn allows(&self, test: TestId) -> bool {
        self.allowed().contains(&test)
    }
}

impl fmt::Display for TestClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Multiple-comparison correction methods, named as in R's `p.adjust`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CorrectionMethod {
    #[serde(rename = "bonferroni")]
    Bonferroni,
    #[serde(rename = "holm")]
    Holm,
    #[serde(rename = "hochberg")]
    Hochberg,
    #[serde(rename = "hommel")]
    Hommel,
    #[serde(rename = "BH")]
    BenjaminiHochberg,
    #[serde(rename = "BY")]
    BenjaminiYekutieli,
}

impl CorrectionMethod {
    pub const ALL: [CorrectionMethod; 6] = [
        CorrectionMethod::Bonferroni,
        CorrectionMethod::Holm,
        CorrectionMethod::Hochberg,
        CorrectionMethod::Hommel,
        CorrectionMethod::BenjaminiHochberg,
        CorrectionMethod::BenjaminiYekutieli,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CorrectionMethod::Bonferroni => "bonferroni",
            CorrectionMethod::Holm => "holm",
            CorrectionMethod::Hochberg => "hochberg",
            CorrectionMethod::Hommel => "hommel",
            CorrectionMethod::BenjaminiHochberg => "BH",
            CorrectionMethod::BenjaminiYekutieli => "BY",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CorrectionMethod::Bonferroni => "Bonferroni",
            CorrectionMethod::Holm => "Holm",
            CorrectionMethod::Hochberg => "Hochberg",
            CorrectionMethod::Hommel => "Hommel",
            CorrectionMethod::BenjaminiHochberg => "Benjamini-Hochberg",
            CorrectionMethod::BenjaminiYekutieli => "Benjamini-Yekutieli",
        }
    }
}

impl fmt::Display for CorrectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three p-value thresholds, strictest last.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignificanceLevels {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

impl Default for SignificanceLevels {
    fn default() -> Self {
        Self {
            low: 0.1,
            medium: 0.05,
            high: 0.01,
        }
    }
}

impl SignificanceLevels {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("low", self.low), ("medium", self.medium), ("high", self.high)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ThresholdOutOfRange { name, value });
            }
        }
        if !(self.high > 0.0 && self.high <= self.medium && self.medium <= self.low) {
            return Err(ConfigError::ThresholdOrder {
                low: self.low,
                medium: self.medium,
                high: self.high,
            });
        }
        Ok(())
    }
}

/// One configured test per test class. The contingency test is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSuite {
    pub two_samples_parametric: TestId,
    pub two_samples_non_parametric: TestId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub two_samples_non_parametric_contingency: Option<TestId>,
    pub multiple_samples_parametric: TestId,
    pub multiple_samples_non_parametric: TestId,
    pub multiple_samples_parametric_post_hoc: TestId,
    pub multiple_samples_non_parametric_post_hoc: TestId,
    pub multiple_samples_parametric_post_hoc_baseline: TestId,
    pub multiple_samples_non_parametric_post_hoc_baseline: TestId,
}

impl TestSuite {
    /// The configured test for `class`, if any.
    pub fn get(&self, class: TestClass) -> Option<TestId> {
        match class {
            TestClass::TwoSamplesNonParametricContingency => {
                self.two_samples_non_parametric_contingency
            }
            TestClass::TwoSamplesParametric => Some(self.two_samples_parametric),
            TestClass::TwoSamplesNonParametric => Some(self.two_samples_non_parametric),
            TestClass::MultipleSamplesParametric => Some(self.multiple_samples_parametric),
            TestClass::MultipleSamplesNonParametric => Some(self.multiple_samples_non_parametric),
            TestClass::MultipleSamplesParametricPostHoc => {
                Some(self.multiple_samples_parametric_post_hoc)
            }
            TestClass::MultipleSamplesNonParametricPostHoc => {
                Some(self.multiple_samples_non_parametric_post_hoc)
            }
            TestClass::MultipleSamplesParametricPostHocBaseline => {
                Some(self.multiple_samples_parametric_post_hoc_baseline)
            }
            TestClass::MultipleSamplesNonParametricPostHocBaseline => {
                Some(self.multiple_samples_non_parametric_post_hoc_baseline)
            }
        }
    }

    /// All configured (class, test) pairs.
    pub fn entries(&self) -> Vec<(TestClass, TestId)> {
        [
            TestClass::TwoSamplesNonParametricContingency,
            TestClass::TwoSamplesParametric,
            TestClass::TwoSamplesNonParametric,
            TestClass::MultipleSamplesParametric,
            TestClass::MultipleSamplesNonParametric,
            TestClass::MultipleSamplesParametricPostHoc,
            TestClass::MultipleSamplesNonParametricPostHoc,
            TestClass::MultipleSamplesParametricPostHocBaseline,
            TestClass::MultipleSamplesNonParametricPostHocBaseline,
        ]
        .into_iter()
        .filter_map(|class| self.get(class).map(|test| (class, test)))
        .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (class, test) in self.entries() {
            if !class.allows(test) {
                return Err(ConfigError::TestNotAllowed { class, test });
            }
        }
        Ok(())
    }
}

impl Default for TestSuite {
    fn default() -> Self {
        Self {
            two_samples_parametric: TestId::DependentT,
            two_samples_non_parametric: TestId::WilcoxonSignedRank,
            two_samples_non_parametric_contingency: Some(TestId::McNemar),
            multiple_samples_parametric: TestId::RepeatedMeasuresOneWayANOVA,
            multiple_samples_non_parametric: TestId::Friedman,
            multiple_samples_parametric_post_hoc: TestId::Tukey,
            multiple_samples_non_parametric_post_hoc: TestId::Nemenyi,
            multiple_samples_parametric_post_hoc_baseline: TestId::Dunnett,
            multiple_samples_non_parametric_post_hoc_baseline: TestId::PairwiseWilcoxonSignedRank,
        }
    }
}

/// Top-level evaluation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Keep at most this many models, ranked by `select_by_measure`.
    pub select_best_n: usize,

    /// Measure used to rank models for truncation.
    pub select_by_measure: String,

    /// Variable held fixed when both classifiers and feature sets vary.
    #[serde(default)]
    pub fix_independent_variable: FixedVariable,

    /// Corrections applied to every post-hoc matrix that requests one.
    pub corrections: Vec<CorrectionMethod>,

    #[serde(default)]
    pub significance: SignificanceLevels,

    pub tests: TestSuite,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            select_best_n: 10,
            select_by_measure: "Weighted F-Measure".to_string(),
            fix_independent_variable: FixedVariable::FeatureSet,
            corrections: vec![
                CorrectionMethod::Bonferroni,
                CorrectionMethod::Hochberg,
                CorrectionMethod::Holm,
            ],
            significance: SignificanceLevels::default(),
            tests: TestSuite::default(),
        }
    }
}

impl StatsConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: StatsConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.select_best_n == 0 {
            return Err(ConfigError::ZeroSelectBestN);
        }
        if self.select_by_measure.trim().is_empty() {
            return Err(ConfigError::EmptyRankingMeasure);
        }
        if self.corrections.is_empty() {
            return Err(ConfigError::NoCorrections);
        }
        self.significance.validate()?;
        self.tests.validate()
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
