//! Row-wise numerics shared by the distillation loss
//!
//! Every function treats rows as samples and columns as classes.

use ndarray::{Array2, ArrayView2, Axis};

use crate::error::{Error, Result};

/// Compute softmax along last axis for 2D array
///
/// softmax(x)_i = exp(x_i - max) / Σ exp(x_j - max)
pub fn softmax_rows(x: ArrayView2<'_, f32>) -> Array2<f32> {
    let mut result = x.to_owned();

    for mut row in result.axis_iter_mut(Axis(0)) {
        // Subtract max for numerical stability
        let max_val = row.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        row.mapv_inplace(|v| (v - max_val).exp());

        let sum: f32 = row.sum();
        row.mapv_inplace(|v| v / sum);
    }

    result
}

/// Compute log-softmax along last axis for 2D array
///
/// log_softmax(x)_i = (x_i - max) - ln Σ exp(x_j - max)
///
/// Never produces `-inf` for finite input, unlike `softmax(x).ln()`.
pub fn log_softmax_rows(x: ArrayView2<'_, f32>) -> Array2<f32> {
    let mut result = x.to_owned();

    for mut row in result.axis_iter_mut(Axis(0)) {
        let max_val = row.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        let log_sum_exp = row.iter().map(|&v| (v - max_val).exp()).sum::<f32>().ln();
        row.mapv_inplace(|v| v - max_val - log_sum_exp);
    }

    result
}

/// Split rows into `n_chunks` contiguous, equally sized blocks
///
/// Block `i` is rows `[i * rows / n, (i + 1) * rows / n)`.
pub fn chunk_rows(x: ArrayView2<'_, f32>, n_chunks: usize) -> Result<Vec<ArrayView2<'_, f32>>> {
    let rows = x.nrows();
    if n_chunks == 0 || rows % n_chunks != 0 {
        return Err(Error::UnevenCrops {
            rows,
            n_crops: n_chunks,
        });
    }
    if rows == 0 {
        return Err(Error::EmptyBatch {
            rows,
            cols: x.ncols(),
        });
    }

    let batch = rows / n_chunks;
    let mut chunks = Vec::with_capacity(n_chunks);
    let mut rest = x;
    for _ in 1..n_chunks {
        let (head, tail) = rest.split_at(Axis(0), batch);
        chunks.push(head);
        rest = tail;
    }
    chunks.push(rest);

    Ok(chunks)
}

/// Cross-entropy of a target distribution against log-probabilities
///
/// Σ_rows Σ_c -target * log_probs, divided by the row count ("batchmean").
pub fn cross_entropy_batchmean(target: ArrayView2<'_, f32>, log_probs: ArrayView2<'_, f32>) -> f32 {
    debug_assert_eq!(target.dim(), log_probs.dim());

    let total: f32 = target
        .iter()
        .zip(log_probs.iter())
        .map(|(&t, &lq)| -t * lq)
        .sum();

    total / target.nrows() as f32
}

/// KL divergence of a target distribution from log-probabilities
///
/// Σ_rows Σ_c target * (ln target - log_probs), divided by the row count.
/// Entries with `target == 0` contribute nothing.
pub fn kl_div_batchmean(target: ArrayView2<'_, f32>, log_probs: ArrayView2<'_, f32>) -> f32 {
    debug_assert_eq!(target.dim(), log_probs.dim());

    let total: f32 = target
        .iter()
        .zip(log_probs.iter())
        .filter(|(t, _)| **t > 0.0)
        .map(|(&t, &lq)| t * (t.ln() - lq))
        .sum();

    total / target.nrows() as f32
}
