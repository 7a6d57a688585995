//! Sample data: per-measure, per-model performance samples plus model metadata.
//!
//! Every measure holds one sample vector per model, all models in the same
//! order. The model index is the model's identity everywhere downstream
//! (averages, metadata, graph vertices, ordering levels). In a baseline
//! evaluation the baseline model always sits at index 0.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum number of samples per model and measure.
pub const MIN_SAMPLES: usize = 5;

/// 2×2 contingency counts for two models evaluated on a single domain.
pub type ContingencyTable = [[u64; 2]; 2];

/// Errors raised while constructing or reshaping sample data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleError {
    #[error("sample data contains no measures")]
    NoMeasures,
    #[error("measure '{measure}' has {found} models, expected {expected}")]
    ModelCountMismatch {
        measure: String,
        expected: usize,
        found: usize,
    },
    #[error("measure '{measure}': model {model} has {found} samples, expected {expected}")]
    RaggedSamples {
        measure: String,
        model: usize,
        expected: usize,
        found: usize,
    },
    #[error("measure '{measure}' has {found} samples per model, at least {required} required")]
    TooFewSamples {
        measure: String,
        found: usize,
        required: usize,
    },
    #[error("baseline index {index} out of range for {models} models")]
    BaselineOutOfRange { index: usize, models: usize },
    #[error("averages '{name}' have {found} entries, expected {expected}")]
    AverageLengthMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("no baseline model matches '{0}' after splitting")]
    MissingBaseline(String),
    #[error("group '{group}' has {count} baseline models, expected one")]
    AmbiguousBaseline { group: String, count: usize },
    #[error("a contingency table describes two models and cannot follow a split into {groups} groups")]
    SplitContingency { groups: usize },
}

/// Identity of a model: a classifier trained on a feature set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub classifier: String,
    pub feature_set: String,
}

impl ModelMetadata {
    pub fn new(classifier: impl Into<String>, feature_set: impl Into<String>) -> Self {
        Self {
            classifier: classifier.into(),
            feature_set: feature_set.into(),
        }
    }

    /// Value of the given independent variable for this model.
    pub fn variable(&self, variable: FixedVariable) -> &str {
        match variable {
            FixedVariable::Classifier => &self.classifier,
            FixedVariable::FeatureSet => &self.feature_set,
        }
    }
}

impl fmt::Display for ModelMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.classifier, self.feature_set)
    }
}

/// Which independent variable is held fixed when both vary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixedVariable {
    Classifier,
    #[default]
    FeatureSet,
}

/// Sampling scheme that produced the samples. Bookkeeping only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineKind {
    /// One n-fold cross-validation; one sample per fold.
    #[default]
    Cv,
    /// Repeated n-fold cross-validation; one sample per repetition.
    RepeatedCv,
    /// Cross-validation on several datasets; one sample per dataset.
    DatasetCv,
    /// Repeated cross-validation on several datasets.
    DatasetRepeatedCv,
    /// Train/test splits; one sample per train/test combination.
    TrainTest,
}

/// Complete sample information for one evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleData {
    samples: BTreeMap<String, Vec<Vec<f64>>>,
    sample_averages: BTreeMap<String, Vec<f64>>,
    model_metadata: Vec<ModelMetadata>,
    baseline_indices: BTreeSet<usize>,
    contingency: Option<ContingencyTable>,
    dataset_names: Vec<String>,
    pipeline: PipelineKind,
    folds: Option<usize>,
    repetitions: Option<usize>,
}

impl SampleData {
    /// Build sample data from model-major sample vectors per measure.
    ///
    /// Validates that every measure has one equal-length vector per model
    /// with at least [`MIN_SAMPLES`] samples, and computes the per-model
    /// averages for every measure.
    pub fn new(
        samples: BTreeMap<String, Vec<Vec<f64>>>,
        model_metadata: Vec<ModelMetadata>,
        pipeline: PipelineKind,
    ) -> Result<Self, SampleError> {
        if samples.is_empty() {
            return Err(SampleError::NoMeasures);
        }

        let models = model_metadata.len();
        for (measure, per_model) in &samples {
            if per_model.len() != models {
                return Err(SampleError::ModelCountMismatch {
                    measure: measure.clone(),
                    expected: models,
                    found: per_model.len(),
                });
            }
            let expected = per_model.first().map(Vec::len).unwrap_or(0);
            for (model, values) in per_model.iter().enumerate() {
                if values.len() != expected {
                    return Err(SampleError::RaggedSamples {
                        measure: measure.clone(),
                        model,
                        expected,
                        found: values.len(),
                    });
                }
            }
            if models > 0 && expected < MIN_SAMPLES {
                return Err(SampleError::TooFewSamples {
                    measure: measure.clone(),
                    found: expected,
                    required: MIN_SAMPLES,
                });
            }
        }

        let sample_averages = samples
            .iter()
            .map(|(measure, per_model)| {
                (
                    measure.clone(),
                    per_model.iter().map(|v| mean(v)).collect(),
                )
            })
            .collect();

        Ok(Self {
            samples,
            sample_averages,
            model_metadata,
            baseline_indices: BTreeSet::new(),
            contingency: None,
            dataset_names: Vec::new(),
            pipeline,
            folds: None,
            repetitions: None,
        })
    }

    /// Flag `index` as the baseline model and move it to index 0.
    pub fn with_baseline(mut self, index: usize) -> Result<Self, SampleError> {
        let models = self.model_count();
        if index >= models {
            return Err(SampleError::BaselineOutOfRange { index, models });
        }
        self.move_to_front(index);
        self.baseline_indices = BTreeSet::from([0]);
        Ok(self)
    }

    /// Flag several baseline models, one per group of the fixed variable.
    /// A single index behaves like [`SampleData::with_baseline`]; with more,
    /// models keep their positions until the data is split, and evaluating
    /// the data unsplit fails with [`SampleError::AmbiguousBaseline`].
    pub fn with_baselines(mut self, indices: &[usize]) -> Result<Self, SampleError> {
        let models = self.model_count();
        if let Some(&index) = indices.iter().find(|&&i| i >= models) {
            return Err(SampleError::BaselineOutOfRange { index, models });
        }
        let flagged: BTreeSet<usize> = indices.iter().copied().collect();
        match flagged.len() {
            0 => Ok(self),
            1 => {
                let index = indices[0];
                self.with_baseline(index)
            }
            _ => {
                self.baseline_indices = flagged;
                Ok(self)
            }
        }
    }

    pub fn with_contingency(mut self, table: ContingencyTable) -> Self {
        self.contingency = Some(table);
        self
    }

    pub fn with_datasets(mut self, names: Vec<String>) -> Self {
        self.dataset_names = names;
        self
    }

    pub fn with_folds(mut self, folds: usize) -> Self {
        self.folds = Some(folds);
        self
    }

    pub fn with_repetitions(mut self, repetitions: usize) -> Self {
        self.repetitions = Some(repetitions);
        self
    }

    /// Register an externally computed per-model aggregate, e.g.
    /// `"Averaged F-Measure"`. Must have one value per model.
    pub fn insert_averages(
        &mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), SampleError> {
        let name = name.into();
        if values.len() != self.model_count() {
            return Err(SampleError::AverageLengthMismatch {
                name,
                expected: self.model_count(),
                found: values.len(),
            });
        }
        self.sample_averages.insert(name, values);
        Ok(())
    }

    pub fn samples(&self) -> &BTreeMap<String, Vec<Vec<f64>>> {
        &self.samples
    }

    /// Model-major sample vectors for one measure.
    pub fn measure_samples(&self, measure: &str) -> Option<&[Vec<f64>]> {
        self.samples.get(measure).map(Vec::as_slice)
    }

    pub fn measures(&self) -> impl Iterator<Item = &str> {
        self.samples.keys().map(String::as_str)
    }

    pub fn sample_averages(&self) -> &BTreeMap<String, Vec<f64>> {
        &self.sample_averages
    }

    /// Per-model averages for `name` (a measure or an inserted aggregate).
    pub fn averages(&self, name: &str) -> Option<&[f64]> {
        self.sample_averages.get(name).map(Vec::as_slice)
    }

    pub fn model_metadata(&self) -> &[ModelMetadata] {
        &self.model_metadata
    }

    pub fn model_count(&self) -> usize {
        self.model_metadata.len()
    }

    pub fn baseline_indices(&self) -> &BTreeSet<usize> {
        &self.baseline_indices
    }

    pub fn is_baseline_evaluation(&self) -> bool {
        !self.baseline_indices.is_empty()
    }

    /// Checks that a baseline evaluation has exactly one baseline, at index 0.
    pub fn check_baseline(&self) -> Result<(), SampleError> {
        match self.baseline_indices.len() {
            0 => Ok(()),
            1 if self.baseline_indices.contains(&0) => Ok(()),
            1 => Err(SampleError::MissingBaseline("index 0".to_string())),
            count => Err(SampleError::AmbiguousBaseline {
                group: "all".to_string(),
                count,
            }),
        }
    }

    pub fn contingency(&self) -> Option<&ContingencyTable> {
        self.contingency.as_ref()
    }

    pub fn dataset_names(&self) -> &[String] {
        &self.dataset_names
    }

    pub fn pipeline(&self) -> PipelineKind {
        self.pipeline
    }

    pub fn folds(&self) -> Option<usize> {
        self.folds
    }

    pub fn repetitions(&self) -> Option<usize> {
        self.repetitions
    }

    /// Content hash of samples and model identities.
    ///
    /// Two evaluations over identical inputs share the same fingerprint.
    pub fn fingerprint(&self) -> String {
        let payload =
            serde_json::to_vec(&(&self.samples, &self.model_metadata)).unwrap_or_default();
        blake3::hash(&payload).to_hex().to_string()
    }

    /// Remove the given models from every parallel structure.
    ///
    /// Indices are removed highest first so earlier indices stay valid.
    /// Baseline indices are shifted to follow their models.
    pub(crate) fn remove_models(&mut self, indices: &[usize]) {
        let mut doomed: Vec<usize> = indices.to_vec();
        doomed.sort_unstable();
        doomed.dedup();

        for &index in doomed.iter().rev() {
            for per_model in self.samples.values_mut() {
                if index < per_model.len() {
                    per_model.remove(index);
                }
            }
            for averages in self.sample_averages.values_mut() {
                if index < averages.len() {
                    averages.remove(index);
                }
            }
            if index < self.model_metadata.len() {
                self.model_metadata.remove(index);
            }
        }

        self.baseline_indices = self
            .baseline_indices
            .iter()
            .filter(|b| doomed.binary_search(b).is_err())
            .map(|&b| b - doomed.iter().filter(|&&d| d < b).count())
            .collect();
    }

    /// Keep only the models at `indices`, in that order.
    fn subset(&self, indices: &[usize]) -> Self {
        let pick_rows = |rows: &Vec<Vec<f64>>| -> Vec<Vec<f64>> {
            indices.iter().map(|&i| rows[i].clone()).collect()
        };
        let pick = |values: &Vec<f64>| -> Vec<f64> { indices.iter().map(|&i| values[i]).collect() };

        Self {
            samples: self
                .samples
                .iter()
                .map(|(k, v)| (k.clone(), pick_rows(v)))
                .collect(),
            sample_averages: self
                .sample_averages
                .iter()
                .map(|(k, v)| (k.clone(), pick(v)))
                .collect(),
            model_metadata: indices
                .iter()
                .map(|&i| self.model_metadata[i].clone())
                .collect(),
            baseline_indices: BTreeSet::new(),
            contingency: None,
            dataset_names: self.dataset_names.clone(),
            pipeline: self.pipeline,
            folds: self.folds,
            repetitions: self.repetitions,
        }
    }

    fn move_to_front(&mut self, index: usize) {
        if index == 0 {
            return;
        }
        for per_model in self.samples.values_mut() {
            let row = per_model.remove(index);
            per_model.insert(0, row);
        }
        for averages in self.sample_averages.values_mut() {
            let value = averages.remove(index);
            averages.insert(0, value);
        }
        let model = self.model_metadata.remove(index);
        self.model_metadata.insert(0, model);
    }
}

/// Split sample data into one group per value of the fixed variable.
///
/// Data is only split when both classifiers and feature sets vary; otherwise
/// a single group labelled `"all"` is returned. Groups follow the first
/// appearance order of the fixed variable's values. In a baseline
/// evaluation every group must contain exactly one baseline model, which is
/// moved to index 0 of that group. A contingency table only survives when
/// the data is not split.
pub fn split_by_fixed_variable(
    data: &SampleData,
    fixed: FixedVariable,
) -> Result<Vec<(String, SampleData)>, SampleError> {
    let mut classifiers: Vec<&str> = Vec::new();
    let mut feature_sets: Vec<&str> = Vec::new();
    for model in data.model_metadata() {
        if !classifiers.contains(&model.classifier.as_str()) {
            classifiers.push(&model.classifier);
        }
        if !feature_sets.contains(&model.feature_set.as_str()) {
            feature_sets.push(&model.feature_set);
        }
    }

    if classifiers.len() <= 1 || feature_sets.len() <= 1 {
        data.check_baseline()?;
        return Ok(vec![("all".to_string(), data.clone())]);
    }

    let values = match fixed {
        FixedVariable::Classifier => classifiers,
        FixedVariable::FeatureSet => feature_sets,
    };
    if data.contingency().is_some() {
        return Err(SampleError::SplitContingency {
            groups: values.len(),
        });
    }

    let mut groups = Vec::with_capacity(values.len());
    for value in values {
        let indices: Vec<usize> = data
            .model_metadata()
            .iter()
            .enumerate()
            .filter(|(_, m)| m.variable(fixed) == value)
            .map(|(i, _)| i)
            .collect();

        let mut group = data.subset(&indices);

        if data.is_baseline_evaluation() {
            let flagged: Vec<usize> = indices
                .iter()
                .enumerate()
                .filter(|(_, i)| data.baseline_indices().contains(i))
                .map(|(position, _)| position)
                .collect();
            let position = match flagged.as_slice() {
                [] => return Err(SampleError::MissingBaseline(value.to_string())),
                [position] => *position,
                _ => {
                    return Err(SampleError::AmbiguousBaseline {
                        group: value.to_string(),
                        count: flagged.len(),
                    })
                }
            };
            group = group.with_baseline(position)?;
        }

        groups.push((value.to_string(), group));
    }

    Ok(groups)
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// One measure, models with constant offsets so averages are predictable.
    pub fn offsets(measure: &str, offsets: &[f64], n: usize) -> SampleData {
        let per_model: Vec<Vec<f64>> = offsets
            .iter()
            .map(|&o| (0..n).map(|k| o + k as f64 * 0.001).collect())
            .collect();
        let metadata = (0..offsets.len())
            .map(|i| ModelMetadata::new(format!("clf{i}"), "fs"))
            .collect();
        SampleData::new(
            BTreeMap::from([(measure.to_string(), per_model)]),
            metadata,
            PipelineKind::Cv,
        )
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::offsets;
    use super::*;

    fn grid_data() -> SampleData {
        // 2 classifiers × 2 feature sets
        let metadata = vec![
            ModelMetadata::new("svm", "ngrams"),
            ModelMetadata::new("svm", "pos"),
            ModelMetadata::new("nb", "ngrams"),
            ModelMetadata::new("nb", "pos"),
        ];
        let rows: Vec<Vec<f64>> = (0..4).map(|m| vec![m as f64; 5]).collect();
        SampleData::new(
            BTreeMap::from([("Accuracy".to_string(), rows)]),
            metadata,
            PipelineKind::Cv,
        )
        .unwrap()
    }

    #[test]
    fn averages_are_computed_per_model() {
        let data = offsets("F1", &[0.5, 0.7], 5);
        let avg = data.averages("F1").unwrap();
        assert!((avg[0] - 0.502).abs() < 1e-12);
        assert!((avg[1] - 0.702).abs() < 1e-12);
    }

    #[test]
    fn rejects_too_few_samples() {
        let err = SampleData::new(
            BTreeMap::from([("F1".to_string(), vec![vec![1.0; 4], vec![2.0; 4]])]),
            vec![ModelMetadata::new("a", "x"), ModelMetadata::new("b", "x")],
            PipelineKind::Cv,
        )
        .unwrap_err();
        assert!(matches!(err, SampleError::TooFewSamples { found: 4, .. }));
    }

    #[test]
    fn rejects_ragged_samples() {
        let err = SampleData::new(
            BTreeMap::from([("F1".to_string(), vec![vec![1.0; 5], vec![2.0; 6]])]),
            vec![ModelMetadata::new("a", "x"), ModelMetadata::new("b", "x")],
            PipelineKind::Cv,
        )
        .unwrap_err();
        assert!(matches!(err, SampleError::RaggedSamples { model: 1, .. }));
    }

    #[test]
    fn rejects_metadata_model_mismatch() {
        let err = SampleData::new(
            BTreeMap::from([("F1".to_string(), vec![vec![1.0; 5]; 3])]),
            vec![ModelMetadata::new("a", "x"), ModelMetadata::new("b", "x")],
            PipelineKind::Cv,
        )
        .unwrap_err();
        assert!(matches!(err, SampleError::ModelCountMismatch { expected: 2, found: 3, .. }));
    }

    #[test]
    fn baseline_moves_to_front_everywhere() {
        let data = offsets("F1", &[0.1, 0.2, 0.3], 5).with_baseline(2).unwrap();
        assert_eq!(data.model_metadata()[0].classifier, "clf2");
        assert_eq!(data.measure_samples("F1").unwrap()[0][0], 0.3);
        assert!((data.averages("F1").unwrap()[0] - 0.302).abs() < 1e-12);
        assert_eq!(data.baseline_indices(), &BTreeSet::from([0]));
        assert!(data.is_baseline_evaluation());
    }

    #[test]
    fn baseline_out_of_range_is_rejected() {
        let err = offsets("F1", &[0.1, 0.2], 5).with_baseline(2).unwrap_err();
        assert_eq!(err, SampleError::BaselineOutOfRange { index: 2, models: 2 });
    }

    #[test]
    fn remove_models_keeps_structures_aligned() {
        let mut data = offsets("F1", &[0.1, 0.2, 0.3, 0.4], 5).with_baseline(3).unwrap();
        // order now: clf3 (baseline), clf0, clf1, clf2
        data.remove_models(&[1, 3]);
        let names: Vec<_> = data
            .model_metadata()
            .iter()
            .map(|m| m.classifier.as_str())
            .collect();
        assert_eq!(names, vec!["clf3", "clf1"]);
        assert_eq!(data.measure_samples("F1").unwrap().len(), 2);
        assert_eq!(data.averages("F1").unwrap().len(), 2);
        assert_eq!(data.baseline_indices(), &BTreeSet::from([0]));
    }

    #[test]
    fn fingerprint_is_deterministic_and_content_sensitive() {
        let a = offsets("F1", &[0.1, 0.2], 5);
        let b = offsets("F1", &[0.1, 0.2], 5);
        let c = offsets("F1", &[0.1, 0.3], 5);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn split_by_feature_set_groups_in_appearance_order() {
        let groups = split_by_fixed_variable(&grid_data(), FixedVariable::FeatureSet).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "ngrams");
        let clfs: Vec<_> = groups[0]
            .1
            .model_metadata()
            .iter()
            .map(|m| m.classifier.as_str())
            .collect();
        assert_eq!(clfs, vec!["svm", "nb"]);
        assert_eq!(groups[1].1.measure_samples("Accuracy").unwrap()[1][0], 3.0);
    }

    #[test]
    fn split_is_noop_when_only_one_variable_varies() {
        let data = offsets("F1", &[0.1, 0.2, 0.3], 5);
        let groups = split_by_fixed_variable(&data, FixedVariable::Classifier).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].1, data);
    }

    #[test]
    fn split_requires_baseline_in_every_group() {
        let data = grid_data().with_baseline(0).unwrap(); // svm/ngrams
        let err = split_by_fixed_variable(&data, FixedVariable::FeatureSet).unwrap_err();
        assert_eq!(err, SampleError::MissingBaseline("pos".into()));
    }

    #[test]
    fn several_baselines_stay_in_place() {
        let data = grid_data().with_baselines(&[2, 3]).unwrap();
        assert_eq!(data.baseline_indices(), &BTreeSet::from([2, 3]));
        assert_eq!(data.model_metadata()[0].classifier, "svm");

        let single = grid_data().with_baselines(&[3, 3]).unwrap();
        assert_eq!(single.baseline_indices(), &BTreeSet::from([0]));

        let err = grid_data().with_baselines(&[1, 9]).unwrap_err();
        assert!(matches!(err, SampleError::BaselineOutOfRange { index: 9, .. }));
    }

    #[test]
    fn split_moves_group_baseline_to_front() {
        let mut data = grid_data();
        data.baseline_indices = BTreeSet::from([2, 3]); // nb/ngrams, nb/pos
        let groups = split_by_fixed_variable(&data, FixedVariable::FeatureSet).unwrap();
        for (_, group) in &groups {
            assert_eq!(group.model_metadata()[0].classifier, "nb");
            assert!(group.is_baseline_evaluation());
        }
    }

    #[test]
    fn unsplit_data_rejects_several_baselines() {
        let data = offsets("F1", &[0.1, 0.2, 0.3], 5)
            .with_baselines(&[1, 2])
            .unwrap();
        assert_eq!(
            data.check_baseline(),
            Err(SampleError::AmbiguousBaseline {
                group: "all".into(),
                count: 2
            })
        );
        let err = split_by_fixed_variable(&data, FixedVariable::Classifier).unwrap_err();
        assert!(matches!(err, SampleError::AmbiguousBaseline { count: 2, .. }));

        let single = offsets("F1", &[0.1, 0.2, 0.3], 5).with_baselines(&[2]).unwrap();
        assert_eq!(single.check_baseline(), Ok(()));
        assert_eq!(split_by_fixed_variable(&single, FixedVariable::Classifier).unwrap().len(), 1);
    }

    #[test]
    fn group_with_two_baselines_is_rejected() {
        let mut data = grid_data();
        data.baseline_indices = BTreeSet::from([0, 2, 3]); // svm/ngrams, nb/ngrams, nb/pos
        let err = split_by_fixed_variable(&data, FixedVariable::FeatureSet).unwrap_err();
        assert_eq!(
            err,
            SampleError::AmbiguousBaseline {
                group: "ngrams".into(),
                count: 2
            }
        );
    }

    #[test]
    fn contingency_table_is_kept_only_without_split() {
        let table = [[30, 10], [2, 25]];
        let pair = offsets("F1", &[0.1, 0.2], 5).with_contingency(table);
        let groups = split_by_fixed_variable(&pair, FixedVariable::FeatureSet).unwrap();
        assert_eq!(groups[0].1.contingency(), Some(&table));

        let grid = grid_data().with_contingency(table);
        let err = split_by_fixed_variable(&grid, FixedVariable::FeatureSet).unwrap_err();
        assert_eq!(err, SampleError::SplitContingency { groups: 2 });
    }

    #[test]
    fn insert_averages_checks_length() {
        let mut data = offsets("F1", &[0.1, 0.2], 5);
        assert!(data.insert_averages("Averaged F1", vec![0.1, 0.2]).is_ok());
        assert!(data.insert_averages("Averaged F1", vec![0.1]).is_err());
    }
}
