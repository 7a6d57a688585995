//! CSV import of per-fold model samples.
//!
//! One row per (model, measure, fold):
//!
//! ```text
//! classifier,feature_set,measure,fold,value,baseline
//! svm,ngrams,Accuracy,0,0.81,false
//! ```
//!
//! `baseline` is `1`/`0` (or `true`/`false`) and may be omitted. Models are indexed in first-appearance order
//! and samples are ordered by fold.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Deserializer};
use tracing::debug;

use sigrank_core::{ContingencyTable, ModelMetadata, PipelineKind, SampleData};

#[derive(Debug, Deserialize)]
struct SampleRow {
    classifier: String,
    feature_set: String,
    measure: String,
    fold: usize,
    value: f64,
    #[serde(default, deserialize_with = "flag")]
    baseline: bool,
}

/// `1`/`0`, `true`/`false` or empty.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let text = String::deserialize(deserializer)?;
    match text.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "invalid baseline flag '{other}'"
        ))),
    }
}

/// Options that shape the imported sample data.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub delimiter: u8,
    pub pipeline: PipelineKind,
    pub folds: Option<usize>,
    pub repetitions: Option<usize>,
    pub contingency: Option<ContingencyTable>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            pipeline: PipelineKind::Cv,
            folds: None,
            repetitions: None,
            contingency: None,
        }
    }
}

/// Read a samples CSV file.
pub fn load_samples(path: &Path, options: &ImportOptions) -> Result<SampleData> {
    let reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("failed to open samples file {}", path.display()))?;
    read_samples(reader, options).with_context(|| format!("invalid samples file {}", path.display()))
}

fn read_samples<R: std::io::Read>(
    mut reader: csv::Reader<R>,
    options: &ImportOptions,
) -> Result<SampleData> {
    let mut models: Vec<ModelMetadata> = Vec::new();
    let mut baselines: Vec<usize> = Vec::new();
    // measure -> model -> fold -> value
    let mut cells: BTreeMap<String, BTreeMap<usize, BTreeMap<usize, f64>>> = BTreeMap::new();

    for (line, row) in reader.deserialize::<SampleRow>().enumerate() {
        let row = row.with_context(|| format!("malformed record {}", line + 1))?;
        let model = ModelMetadata::new(row.classifier, row.feature_set);
        let index = match models.iter().position(|m| *m == model) {
            Some(index) => index,
            None => {
                models.push(model);
                models.len() - 1
            }
        };
        if row.baseline && !baselines.contains(&index) {
            baselines.push(index);
        }

        let folds = cells
            .entry(row.measure.clone())
            .or_default()
            .entry(index)
            .or_default();
        if folds.insert(row.fold, row.value).is_some() {
            bail!(
                "duplicate sample for {} / {} fold {}",
                models[index],
                row.measure,
                row.fold
            );
        }
    }

    if models.is_empty() {
        bail!("no samples found");
    }

    let mut samples = BTreeMap::new();
    for (measure, per_model) in cells {
        let mut rows = Vec::with_capacity(models.len());
        for (index, model) in models.iter().enumerate() {
            let Some(folds) = per_model.get(&index) else {
                bail!("model {model} has no samples for measure '{measure}'");
            };
            rows.push(folds.values().copied().collect::<Vec<f64>>());
        }
        samples.insert(measure, rows);
    }

    debug!(
        models = models.len(),
        measures = samples.len(),
        baselines = baselines.len(),
        "samples imported"
    );

    let mut data = SampleData::new(samples, models, options.pipeline)?;
    data = data.with_baselines(&baselines)?;
    if let Some(folds) = options.folds {
        data = data.with_folds(folds);
    }
    if let Some(repetitions) = options.repetitions {
        data = data.with_repetitions(repetitions);
    }
    if let Some(table) = options.contingency {
        data = data.with_contingency(table);
    }
    Ok(data)
}

/// Parse `a,b,c,d` into a 2×2 contingency table, row-major.
pub fn parse_contingency(text: &str) -> Result<ContingencyTable> {
    let counts = text
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<u64>()
                .with_context(|| format!("invalid contingency count '{part}'"))
        })
        .collect::<Result<Vec<u64>>>()?;
    let &[a, b, c, d] = counts.as_slice() else {
        bail!("contingency table needs exactly four counts, got {}", counts.len());
    };
    Ok([[a, b], [c, d]])
}
