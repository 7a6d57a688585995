//! Multiple-comparison p-value adjustment, following R's `p.adjust`.
//!
//! NaN entries are ignored: they keep their position and stay NaN, and the
//! number of comparisons `n` counts only defined p-values.

use crate::config::CorrectionMethod;

/// Adjust `p_values` with `method`. Output is index-aligned with the input.
pub fn adjust_p_values(p_values: &[f64], method: CorrectionMethod) -> Vec<f64> {
    let defined: Vec<usize> = (0..p_values.len())
        .filter(|&i| !p_values[i].is_nan())
        .collect();
    let values: Vec<f64> = defined.iter().map(|&i| p_values[i]).collect();

    let adjusted = adjust_defined(&values, method);

    let mut out = p_values.to_vec();
    for (k, &i) in defined.iter().enumerate() {
        out[i] = adjusted[k];
    }
    out
}

fn adjust_defined(p: &[f64], method: CorrectionMethod) -> Vec<f64> {
    let n = p.len();
    if n <= 1 {
        return p.to_vec();
    }
    let nf = n as f64;

    match method {
        CorrectionMethod::Bonferroni => p.iter().map(|&v| (nf * v).min(1.0)).collect(),

        CorrectionMethod::Holm => {
            let order = ascending_order(p);
            let mut out = vec![0.0; n];
            let mut running = 0.0_f64;
            for (rank, &idx) in order.iter().enumerate() {
                running = running.max((nf - rank as f64) * p[idx]);
                out[idx] = running.min(1.0);
            }
            out
        }

        CorrectionMethod::Hochberg => step_up(p, |rank| rank as f64 + 1.0),

        CorrectionMethod::BenjaminiHochberg => step_up(p, |rank| nf / (nf - rank as f64)),

        CorrectionMethod::BenjaminiYekutieli => {
            let q: f64 = (1..=n).map(|k| 1.0 / k as f64).sum();
            step_up(p, |rank| q * nf / (nf - rank as f64))
        }

        CorrectionMethod::Hommel => {
            if n == 2 {
                step_up(p, |rank| rank as f64 + 1.0)
            } else {
                hommel(p)
            }
        }
    }
}

/// Walk p-values from largest to smallest, scaling the value at descending
/// rank `rank` by `factor(rank)` and keeping a running minimum.
fn step_up(p: &[f64], factor: impl Fn(usize) -> f64) -> Vec<f64> {
    let order = descending_order(p);
    let mut out = vec![0.0; p.len()];
    let mut running = f64::INFINITY;
    for (rank, &idx) in order.iter().enumerate() {
        running = running.min(factor(rank) * p[idx]);
        out[idx] = running.min(1.0);
    }
    out
}

fn hommel(p: &[f64]) -> Vec<f64> {
    let n = p.len();
    let order = ascending_order(p);
    let sorted: Vec<f64> = order.iter().map(|&i| p[i]).collect();

    let initial = sorted
        .iter()
        .enumerate()
        .map(|(k, &v)| n as f64 * v / (k as f64 + 1.0))
        .fold(f64::INFINITY, f64::min);

    let mut q = vec![initial; n];
    let mut pa = vec![initial; n];

    for m in (2..n).rev() {
        let mf = m as f64;
        let split = n - m + 1;

        let q1 = (split..n)
            .enumerate()
            .map(|(t, k)| mf * sorted[k] / (t as f64 + 2.0))
            .fold(f64::INFINITY, f64::min);

        for k in 0..split {
            q[k] = (mf * sorted[k]).min(q1);
        }
        let fill = q[n - m];
        for value in q.iter_mut().skip(split) {
            *value = fill;
        }
        for (a, &b) in pa.iter_mut().zip(&q) {
            *a = a.max(b);
        }
    }

    let mut out = vec![0.0; n];
    for (k, &idx) in order.iter().enumerate() {
        out[idx] = pa[k].max(sorted[k]);
    }
    out
}

fn ascending_order(p: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..p.len()).collect();
    order.sort_by(|&a, &b| p[a].total_cmp(&p[b]));
    order
}

fn descending_order(p: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..p.len()).collect();
    order.sort_by(|&a, &b| p[b].total_cmp(&p[a]));
    order
}
