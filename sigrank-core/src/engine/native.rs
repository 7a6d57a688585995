//! Pure-Rust statistics engine.
//!
//! Covers every test the registry accepts, so a complete evaluation runs
//! without an external interpreter. Tukey and Dunnett use the residual mean
//! square of the repeated-measures ANOVA; Nemenyi uses Friedman mean ranks.
//! Their p-values already hold the family-wise error rate, so their results
//! do not request correction.

use crate::config::{CorrectionMethod, TestId};
use crate::result::{PairwiseTestResult, TestResult, TriangularMatrix};
use crate::sample::{mean, ContingencyTable};

use super::adjust::adjust_p_values;
use super::distributions::{
    chi_squared_sf, dunnett_two_sided_p, f_sf, normal_two_sided_p, studentized_range_sf,
    t_two_sided_p,
};
use super::{EngineError, StatisticsEngine};

const CONSTANT_EPS: f64 = 1e-12;

/// In-process engine backed by [`distributions`](super::distributions).
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeEngine;

impl NativeEngine {
    pub fn new() -> Self {
        Self
    }
}

impl StatisticsEngine for NativeEngine {
    fn name(&self) -> &str {
        "native"
    }

    fn two_sample(&mut self, test: TestId, a: &[f64], b: &[f64]) -> Result<TestResult, EngineError> {
        if a.len() != b.len() {
            return Err(EngineError::invalid(test, "paired samples differ in length"));
        }
        match test {
            TestId::DependentT => paired_t(a, b),
            TestId::WilcoxonSignedRank => Ok(wilcoxon_signed_rank(a, b)),
            other => Err(EngineError::Unsupported(other.to_string())),
        }
    }

    fn multi_sample(&mut self, test: TestId, samples: &[Vec<f64>]) -> Result<TestResult, EngineError> {
        check_matrix(test, samples)?;
        match test {
            TestId::RepeatedMeasuresOneWayANOVA => repeated_measures_anova(samples),
            TestId::Friedman => Ok(friedman(samples)),
            other => Err(EngineError::Unsupported(other.to_string())),
        }
    }

    fn post_hoc(
        &mut self,
        test: TestId,
        samples: &[Vec<f64>],
    ) -> Result<PairwiseTestResult, EngineError> {
        check_matrix(test, samples)?;
        match test {
            TestId::PairwiseDependentT => Ok(all_pairs(test, samples.len(), true, |i, j| {
                paired_t(&samples[i], &samples[j]).ok().map(|r| (r.p_value, r.statistic))
            })),
            TestId::PairwiseWilcoxonSignedRank => {
                Ok(versus_control(test, samples.len(), true, |i| {
                    let r = wilcoxon_signed_rank(&samples[i], &samples[0]);
                    Some((r.p_value, r.statistic))
                }))
            }
            TestId::Tukey => tukey(samples),
            TestId::Nemenyi => Ok(nemenyi(samples)),
            TestId::Dunnett => dunnett(samples),
            other => Err(EngineError::Unsupported(other.to_string())),
        }
    }

    fn contingency(
        &mut self,
        test: TestId,
        table: &ContingencyTable,
    ) -> Result<TestResult, EngineError> {
        match test {
            TestId::McNemar => mcnemar(table),
            other => Err(EngineError::Unsupported(other.to_string())),
        }
    }

    fn adjust(
        &mut self,
        p_values: &[f64],
        method: CorrectionMethod,
    ) -> Result<Vec<f64>, EngineError> {
        Ok(adjust_p_values(p_values, method))
    }
}

fn check_matrix(test: TestId, samples: &[Vec<f64>]) -> Result<(), EngineError> {
    if samples.len() < 2 {
        return Err(EngineError::invalid(test, "at least two models required"));
    }
    let n = samples[0].len();
    if n < 2 {
        return Err(EngineError::invalid(test, "at least two samples per model required"));
    }
    if samples.iter().any(|s| s.len() != n) {
        return Err(EngineError::invalid(test, "sample vectors differ in length"));
    }
    Ok(())
}

// ─── Two-sample tests ────────────────────────────────────────────────

fn paired_t(a: &[f64], b: &[f64]) -> Result<TestResult, EngineError> {
    let diffs: Vec<f64> = a.iter().zip(b).map(|(x, y)| x - y).collect();
    let n = diffs.len();
    if n < 2 {
        return Err(EngineError::invalid(TestId::DependentT, "at least two pairs required"));
    }

    let nf = n as f64;
    let m = mean(&diffs);
    let variance = diffs.iter().map(|d| (d - m).powi(2)).sum::<f64>() / (nf - 1.0);
    let std_err = (variance / nf).sqrt();
    if std_err < CONSTANT_EPS {
        return Err(EngineError::invalid(
            TestId::DependentT,
            "differences are essentially constant",
        ));
    }

    let t = m / std_err;
    let df = nf - 1.0;
    Ok(TestResult::new(TestId::DependentT.as_str(), t_two_sided_p(t, df), t)
        .with_parameter("df", df))
}

/// Normal approximation with average ranks for ties, tie-corrected
/// variance and continuity correction. Zero differences are dropped.
fn wilcoxon_signed_rank(a: &[f64], b: &[f64]) -> TestResult {
    let nonzero: Vec<f64> = a
        .iter()
        .zip(b)
        .map(|(x, y)| x - y)
        .filter(|d| d.abs() > CONSTANT_EPS)
        .collect();

    let n = nonzero.len();
    if n == 0 {
        return TestResult::new(TestId::WilcoxonSignedRank.as_str(), 1.0, 0.0)
            .with_parameter("n", 0.0);
    }

    let magnitudes: Vec<f64> = nonzero.iter().map(|d| d.abs()).collect();
    let (ranks, tie_sizes) = average_ranks(&magnitudes);

    let w_plus: f64 = nonzero
        .iter()
        .zip(&ranks)
        .filter(|(d, _)| **d > 0.0)
        .map(|(_, r)| r)
        .sum();

    let nf = n as f64;
    let expected = nf * (nf + 1.0) / 4.0;
    let tie_term: f64 = tie_sizes.iter().map(|&t| t * t * t - t).sum::<f64>() / 48.0;
    let variance = nf * (nf + 1.0) * (2.0 * nf + 1.0) / 24.0 - tie_term;

    let p_value = if variance > 0.0 {
        let diff = w_plus - expected;
        let correction = 0.5 * diff.signum();
        normal_two_sided_p((diff - correction) / variance.sqrt())
    } else {
        1.0
    };

    TestResult::new(TestId::WilcoxonSignedRank.as_str(), p_value, w_plus)
        .with_parameter("n", nf)
}

// ─── Multi-sample tests ──────────────────────────────────────────────

/// Sums of squares of a one-way repeated-measures design; each sample
/// position is a subject.
struct RepeatedMeasures {
    ss_models: f64,
    ss_error: f64,
    df_models: f64,
    df_error: f64,
}

impl RepeatedMeasures {
    fn new(samples: &[Vec<f64>]) -> Self {
        let k = samples.len();
        let n = samples[0].len();
        let (kf, nf) = (k as f64, n as f64);

        let grand = samples.iter().flatten().sum::<f64>() / (kf * nf);
        let ss_total: f64 = samples.iter().flatten().map(|v| (v - grand).powi(2)).sum();
        let ss_models: f64 = samples.iter().map(|s| nf * (mean(s) - grand).powi(2)).sum();
        let ss_subjects: f64 = (0..n)
            .map(|i| {
                let subject = samples.iter().map(|s| s[i]).sum::<f64>() / kf;
                kf * (subject - grand).powi(2)
            })
            .sum();

        Self {
            ss_models,
            ss_error: ss_total - ss_models - ss_subjects,
            df_models: kf - 1.0,
            df_error: (kf - 1.0) * (nf - 1.0),
        }
    }

    /// Residual mean square, or an error when the residuals vanish.
    fn ms_error(&self, test: TestId) -> Result<f64, EngineError> {
        if self.ss_error <= CONSTANT_EPS {
            return Err(EngineError::invalid(test, "residual variance is zero"));
        }
        Ok(self.ss_error / self.df_error)
    }
}

fn repeated_measures_anova(samples: &[Vec<f64>]) -> Result<TestResult, EngineError> {
    let test = TestId::RepeatedMeasuresOneWayANOVA;
    let design = RepeatedMeasures::new(samples);
    let ms_error = design.ms_error(test)?;

    let f = (design.ss_models / design.df_models) / ms_error;
    Ok(
        TestResult::new(test.as_str(), f_sf(f, design.df_models, design.df_error), f)
            .with_parameter("df1", design.df_models)
            .with_parameter("df2", design.df_error),
    )
}

/// Friedman rank sum test with tie correction.
fn friedman(samples: &[Vec<f64>]) -> TestResult {
    let k = samples.len();
    let n = samples[0].len();
    let (kf, nf) = (k as f64, n as f64);

    let (rank_sums, tie_total) = block_rank_sums(samples);

    let raw = 12.0 / (nf * kf * (kf + 1.0)) * rank_sums.iter().map(|r| r * r).sum::<f64>()
        - 3.0 * nf * (kf + 1.0);
    let denominator = 1.0 - tie_total / (nf * (kf * kf * kf - kf));
    let df = kf - 1.0;

    let (statistic, p_value) = if denominator > CONSTANT_EPS {
        let chi = raw / denominator;
        (chi, chi_squared_sf(chi, df))
    } else {
        // every block fully tied
        (0.0, 1.0)
    };

    TestResult::new(TestId::Friedman.as_str(), p_value, statistic).with_parameter("df", df)
}

/// Per-model rank sums over blocks (sample positions), plus the summed
/// `t^3 - t` tie term of every block.
fn block_rank_sums(samples: &[Vec<f64>]) -> (Vec<f64>, f64) {
    let n = samples[0].len();
    let mut rank_sums = vec![0.0; samples.len()];
    let mut tie_total = 0.0;
    for i in 0..n {
        let block: Vec<f64> = samples.iter().map(|s| s[i]).collect();
        let (ranks, ties) = average_ranks(&block);
        for (sum, r) in rank_sums.iter_mut().zip(ranks) {
            *sum += r;
        }
        tie_total += ties.iter().map(|&t| t * t * t - t).sum::<f64>();
    }
    (rank_sums, tie_total)
}

// ─── Post-hoc tests ──────────────────────────────────────────────────

/// Fills cell `(i, j)` with `pair(i + 1, j)`, the comparison of model
/// `i + 1` against model `j`.
fn all_pairs(
    test: TestId,
    k: usize,
    requires_correction: bool,
    pair: impl Fn(usize, usize) -> Option<(f64, f64)>,
) -> PairwiseTestResult {
    let mut p_values = TriangularMatrix::all_pairs(k);
    let mut statistics = TriangularMatrix::all_pairs(k);
    for i in 0..k - 1 {
        for j in 0..=i {
            if let Some((p, statistic)) = pair(i + 1, j) {
                p_values.set(i, j, p);
                statistics.set(i, j, statistic);
            }
        }
    }
    PairwiseTestResult::new(test.as_str(), p_values, statistics, requires_correction)
}

/// One column: every model `1..k` against the control at index 0.
fn versus_control(
    test: TestId,
    k: usize,
    requires_correction: bool,
    pair: impl Fn(usize) -> Option<(f64, f64)>,
) -> PairwiseTestResult {
    let (p, s): (Vec<f64>, Vec<f64>) = (1..k)
        .map(|i| pair(i).unwrap_or((f64::NAN, f64::NAN)))
        .unzip();
    PairwiseTestResult::new(
        test.as_str(),
        TriangularMatrix::control_column(p),
        TriangularMatrix::control_column(s),
        requires_correction,
    )
}

/// Tukey HSD on model means with the repeated-measures residual.
fn tukey(samples: &[Vec<f64>]) -> Result<PairwiseTestResult, EngineError> {
    let design = RepeatedMeasures::new(samples);
    let ms_error = design.ms_error(TestId::Tukey)?;
    let k = samples.len();
    let std_err = (ms_error / samples[0].len() as f64).sqrt();
    let means: Vec<f64> = samples.iter().map(|s| mean(s)).collect();

    let result = all_pairs(TestId::Tukey, k, false, |i, j| {
        let q = (means[i] - means[j]) / std_err;
        Some((studentized_range_sf(q.abs(), k, design.df_error), q))
    });
    Ok(result.with_parameter("df", design.df_error))
}

/// Nemenyi test on Friedman mean ranks, studentized range with infinite df.
fn nemenyi(samples: &[Vec<f64>]) -> PairwiseTestResult {
    let k = samples.len();
    let (kf, nf) = (k as f64, samples[0].len() as f64);
    let (rank_sums, _) = block_rank_sums(samples);
    let std_err = (kf * (kf + 1.0) / (12.0 * nf)).sqrt();

    all_pairs(TestId::Nemenyi, k, false, |i, j| {
        let q = (rank_sums[i] - rank_sums[j]) / nf / std_err;
        Some((studentized_range_sf(q.abs(), k, f64::INFINITY), q))
    })
}

/// Dunnett's test of every model against the control at index 0.
fn dunnett(samples: &[Vec<f64>]) -> Result<PairwiseTestResult, EngineError> {
    let design = RepeatedMeasures::new(samples);
    let ms_error = design.ms_error(TestId::Dunnett)?;
    let k = samples.len();
    let std_err = (2.0 * ms_error / samples[0].len() as f64).sqrt();
    let control = mean(&samples[0]);

    let result = versus_control(TestId::Dunnett, k, false, |i| {
        let t = (mean(&samples[i]) - control) / std_err;
        Some((dunnett_two_sided_p(t, k - 1, design.df_error), t))
    });
    Ok(result.with_parameter("df", design.df_error))
}

// ─── Contingency ─────────────────────────────────────────────────────

fn mcnemar(table: &ContingencyTable) -> Result<TestResult, EngineError> {
    let b = table[0][1] as f64;
    let c = table[1][0] as f64;
    if b + c == 0.0 {
        return Err(EngineError::invalid(TestId::McNemar, "no discordant pairs"));
    }
    let chi = ((b - c).abs() - 1.0).max(0.0).powi(2) / (b + c);
    Ok(TestResult::new(TestId::McNemar.as_str(), chi_squared_sf(chi, 1.0), chi)
        .with_parameter("df", 1.0))
}

/// 1-based average ranks, plus the size of every tie group larger than one.
fn average_ranks(values: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut ties = Vec::new();
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && (values[order[end]] - values[order[start]]).abs() < CONSTANT_EPS {
            end += 1;
        }
        let rank = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        if end - start > 1 {
            ties.push((end - start) as f64);
        }
        start = end;
    }
    (ranks, ties)
}
