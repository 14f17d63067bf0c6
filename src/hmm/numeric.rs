//! Numeric helpers shared by the evaluators: log-sum-exp, argmax with a
//! lowest-index tie-break, row rescaling, underflow detection and
//! probability-vector validation.

use approx::abs_diff_eq;
use log::warn;
use ndarray::{ArrayView1, ArrayViewMut1};
use num_traits::Float;

use crate::error::{Error, Result};

/// Numerically stable `ln(Σ exp(x))`.
///
/// Returns negative infinity for an empty slice or when every term is
/// negative infinity.
pub fn log_sum_exp<T: Float>(xs: &[T]) -> T {
    let max = xs.iter().copied().fold(T::neg_infinity(), T::max);
    if max == T::neg_infinity() {
        return max;
    }
    let sum = xs.iter().fold(T::zero(), |acc, &x| acc + (x - max).exp());
    max + sum.ln()
}

/// Index and value of the largest element.
///
/// Ties resolve to the lowest index: a later element replaces the current
/// best only when it is strictly greater. Returns `None` for an empty input.
pub fn argmax<T, I>(values: I) -> Option<(usize, T)>
where
    T: Float,
    I: IntoIterator<Item = T>,
{
    let mut iter = values.into_iter().enumerate();
    let (mut best_idx, mut best_val) = iter.next()?;
    for (idx, val) in iter {
        if val > best_val {
            best_idx = idx;
            best_val = val;
        }
    }
    Some((best_idx, best_val))
}

/// `exp(log_probability)`, or [`Error::NumericDegenerate`] when a finite
/// log-probability underflows to 0.0.
pub fn checked_exp(log_probability: f64) -> Result<f64> {
    let probability = log_probability.exp();
    if probability == 0.0 && log_probability.is_finite() {
        warn!("probability underflows to zero (log probability = {log_probability})");
        return Err(Error::NumericDegenerate { log_probability });
    }
    Ok(probability)
}

/// Divides `row` by `factor` and returns `ln(factor)`.
///
/// A zero factor leaves the row untouched and reports negative infinity, so an
/// impossible time step stays impossible instead of turning into NaN.
pub fn rescale(mut row: ArrayViewMut1<'_, f64>, factor: f64) -> f64 {
    if factor > 0.0 {
        row /= factor;
    }
    factor.ln()
}

/// Checks that `row` is a probability distribution: every entry finite and in
/// `[0, 1]`, and the entries sum to 1 within `tolerance`.
///
/// `label` names the row in the error message (e.g. `"transition row 2"`).
pub fn check_distribution(label: &str, row: ArrayView1<'_, f64>, tolerance: f64) -> Result<()> {
    for (k, &p) in row.iter().enumerate() {
        if !p.is_finite() || !(0.0..=1.0).contains(&p) {
            return Err(Error::invalid_model(format!(
                "{label} entry {k} = {p} is not a probability"
            )));
        }
    }
    let sum = row.sum();
    if !abs_diff_eq!(sum, 1.0, epsilon = tolerance) {
        return Err(Error::invalid_model(format!(
            "{label} sums to {sum}, expected 1.0 (tolerance {tolerance})"
        )));
    }
    Ok(())
}
