//! Squared-error loss.
//!
//! The network trains against the summed squared error
//! `E = sum_j (y[j] - t[j])^2`, not divided by the output count. These are
//! small, allocation-free helpers: the driver reports `E`, and
//! [`crate::Network::step_errors`] seeds the output stage with its gradient.

/// Summed squared error `sum((pred - target)^2)`.
///
/// # Panics
///
/// If `pred.len() != target.len()`.
#[inline]
pub fn squared_error(pred: &[f32], target: &[f32]) -> f32 {
    assert_eq!(
        pred.len(),
        target.len(),
        "pred len {} does not match target len {}",
        pred.len(),
        target.len()
    );

    let mut sum_sq = 0.0_f32;
    for (&p, &t) in pred.iter().zip(target) {
        let diff = p - t;
        sum_sq = diff.mul_add(diff, sum_sq);
    }
    sum_sq
}

/// Squared error + gradient w.r.t. `pred`.
///
/// Writes `d_pred[i] = 2 * (pred[i] - target[i])` and returns the loss.
///
/// # Panics
///
/// If `pred`, `target` and `d_pred` differ in length.
#[inline]
pub fn squared_error_backward(pred: &[f32], target: &[f32], d_pred: &mut [f32]) -> f32 {
    assert_eq!(
        pred.len(),
        target.len(),
        "pred len {} does not match target len {}",
        pred.len(),
        target.len()
    );
    assert_eq!(
        pred.len(),
        d_pred.len(),
        "pred len {} does not match d_pred len {}",
        pred.len(),
        d_pred.len()
    );

    let mut sum_sq = 0.0_f32;
    for i in 0..pred.len() {
        let diff = pred[i] - target[i];
        sum_sq = diff.mul_add(diff, sum_sq);
        d_pred[i] = 2.0 * diff;
    }
    sum_sq
}
