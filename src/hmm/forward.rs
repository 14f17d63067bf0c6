//! Forward algorithm: total probability of an observation sequence under a
//! [`Model`], summed over every hidden-state path.
//!
//! The recurrence, zero-based over time `t` and states `i`, `j`:
//!
//! ```text
//! alpha[0][i]   = pi[i] * B[i][O[0]]
//! alpha[t+1][j] = (sum_i alpha[t][i] * A[i][j]) * B[j][O[t+1]]
//! P(O | model)  = sum_i alpha[T-1][i]
//! ```
//!
//! The lattice is never held as raw probabilities. Depending on
//! [`Arithmetic`], it stores log-probabilities (induction sums with
//! log-sum-exp) or per-step normalised values with the cumulative log of the
//! normalisers kept alongside.

use log::{debug, trace};
use ndarray::{Array1, Array2};

use super::config::{Arithmetic, EvalConfig};
use super::model::Model;
use super::numeric::{checked_exp, log_sum_exp, rescale};
use crate::error::Result;

/// The alpha lattice produced by one forward evaluation (T rows × N columns).
#[derive(Debug, Clone)]
pub struct ForwardLattice {
    arithmetic: Arithmetic,
    values: Array2<f64>,
    /// Cumulative log of the per-step normalisers; all zero in log-space mode.
    log_scale: Array1<f64>,
}

impl ForwardLattice {
    pub fn arithmetic(&self) -> Arithmetic {
        self.arithmetic
    }

    /// Number of time steps (T).
    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of states (N).
    pub fn n_states(&self) -> usize {
        self.values.ncols()
    }

    /// The stored values, in the lattice's own representation: natural logs
    /// for [`Arithmetic::LogSpace`], normalised probabilities for
    /// [`Arithmetic::Scaled`] (each row sums to 1 unless every path is impossible).
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Cumulative log normaliser per time step. Zero in log-space mode.
    pub fn log_scale(&self) -> &Array1<f64> {
        &self.log_scale
    }

    /// `ln alpha[t][i]`, independent of representation.
    ///
    /// # Panics
    ///
    /// Panics if `t` or `i` is out of range.
    pub fn log_alpha(&self, t: usize, i: usize) -> f64 {
        match self.arithmetic {
            Arithmetic::LogSpace => self.values[[t, i]],
            Arithmetic::Scaled => self.values[[t, i]].ln() + self.log_scale[t],
        }
    }

    /// `alpha[t][i]` as a plain probability. May underflow to 0.0 for long sequences.
    pub fn alpha(&self, t: usize, i: usize) -> f64 {
        self.log_alpha(t, i).exp()
    }

    /// The whole lattice as log-probabilities.
    pub fn to_log_alphas(&self) -> Array2<f64> {
        Array2::from_shape_fn(self.values.dim(), |(t, i)| self.log_alpha(t, i))
    }
}

/// Outcome of a forward evaluation.
#[derive(Debug, Clone)]
pub struct ForwardResult {
    lattice: ForwardLattice,
    log_probability: f64,
}

impl ForwardResult {
    /// `ln P(O | model)`. Negative infinity when every path has probability zero.
    pub fn log_probability(&self) -> f64 {
        self.log_probability
    }

    /// `P(O | model)`. Underflows to 0.0 for long sequences; see
    /// [`probability_checked`](Self::probability_checked).
    pub fn probability(&self) -> f64 {
        self.log_probability.exp()
    }

    /// `P(O | model)`, or
    /// [`Error::NumericDegenerate`](crate::Error::NumericDegenerate) if the
    /// probability is non-zero but not representable as an `f64`.
    pub fn probability_checked(&self) -> Result<f64> {
        checked_exp(self.log_probability)
    }

    pub fn lattice(&self) -> &ForwardLattice {
        &self.lattice
    }

    pub fn into_lattice(self) -> ForwardLattice {
        self.lattice
    }
}

/// Runs the forward algorithm in log-space.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`](crate::Error::InvalidInput) if
/// `observations` is empty or contains a symbol outside `0..model.n_symbols()`.
///
/// # Examples
///
/// ```
/// use hmm_lattice::hmm::{forward, Model};
///
/// let model = Model::new(
///     vec![0.5, 0.5],
///     vec![vec![0.9, 0.1], vec![0.2, 0.8]],
///     vec![vec![0.5, 0.5], vec![0.8, 0.2]],
/// )
/// .unwrap();
///
/// let result = forward(&model, &[0]).unwrap();
/// assert!((result.probability() - 0.65).abs() < 1e-12);
/// ```
pub fn forward(model: &Model, observations: &[usize]) -> Result<ForwardResult> {
    forward_with(model, observations, &EvalConfig::default())
}

/// Runs the forward algorithm with the given configuration.
pub fn forward_with(
    model: &Model,
    observations: &[usize],
    config: &EvalConfig,
) -> Result<ForwardResult> {
    model.validate_observations(observations)?;

    let lattice = match config.arithmetic {
        Arithmetic::LogSpace => forward_log_space(model, observations),
        Arithmetic::Scaled => forward_scaled(model, observations),
    };

    let last = lattice.len() - 1;
    let log_probability = match lattice.arithmetic {
        Arithmetic::LogSpace => log_sum_exp(&lattice.values.row(last).to_vec()),
        // Rows are normalised, so the total is the product of the normalisers.
        Arithmetic::Scaled => lattice.log_scale[last],
    };

    debug!(
        "forward: T={}, N={}, {:?}, log P = {log_probability}",
        observations.len(),
        model.n_states(),
        config.arithmetic
    );

    Ok(ForwardResult {
        lattice,
        log_probability,
    })
}

fn forward_log_space(model: &Model, observations: &[usize]) -> ForwardLattice {
    let n = model.n_states();
    let t_len = observations.len();
    let log_a = model.log_transition();
    let log_b = model.log_emission();
    let log_pi = model.log_initial();

    let mut alpha = Array2::from_elem((t_len, n), f64::NEG_INFINITY);

    // Initialization
    let o0 = observations[0];
    for i in 0..n {
        alpha[[0, i]] = log_pi[i] + log_b[[i, o0]];
    }

    // Induction
    let mut terms = vec![f64::NEG_INFINITY; n];
    for t in 0..t_len - 1 {
        let next_obs = observations[t + 1];
        for j in 0..n {
            for (i, term) in terms.iter_mut().enumerate() {
                *term = alpha[[t, i]] + log_a[[i, j]];
            }
            alpha[[t + 1, j]] = log_sum_exp(&terms) + log_b[[j, next_obs]];
        }
        trace!("forward t={}: {:?}", t + 1, alpha.row(t + 1));
    }

    ForwardLattice {
        arithmetic: Arithmetic::LogSpace,
        values: alpha,
        log_scale: Array1::zeros(t_len),
    }
}

fn forward_scaled(model: &Model, observations: &[usize]) -> ForwardLattice {
    let n = model.n_states();
    let t_len = observations.len();
    let a = model.transition();
    let b = model.emission();
    let pi = model.initial();

    let mut alpha = Array2::<f64>::zeros((t_len, n));
    let mut log_scale = Array1::<f64>::zeros(t_len);

    // Initialization
    let o0 = observations[0];
    for i in 0..n {
        alpha[[0, i]] = pi[i] * b[[i, o0]];
    }
    let sum = alpha.row(0).sum();
    log_scale[0] = rescale(alpha.row_mut(0), sum);

    // Induction
    for t in 0..t_len - 1 {
        let next_obs = observations[t + 1];
        for j in 0..n {
            let sum: f64 = (0..n).map(|i| alpha[[t, i]] * a[[i, j]]).sum();
            alpha[[t + 1, j]] = sum * b[[j, next_obs]];
        }
        let sum = alpha.row(t + 1).sum();
        log_scale[t + 1] = log_scale[t] + rescale(alpha.row_mut(t + 1), sum);
        trace!("forward t={}: log scale {}", t + 1, log_scale[t + 1]);
    }

    ForwardLattice {
        arithmetic: Arithmetic::Scaled,
        values: alpha,
        log_scale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use approx::assert_relative_eq;

    fn weather() -> Model {
        Model::new(
            vec![0.6, 0.4],
            vec![vec![0.7, 0.3], vec![0.4, 0.6]],
            vec![vec![0.1, 0.4, 0.5], vec![0.6, 0.3, 0.1]],
        )
        .unwrap()
    }

    #[test]
    fn test_forward_weather() {
        let model = weather();
        for config in [EvalConfig::log_space(), EvalConfig::scaled()] {
            let result = forward_with(&model, &[0, 1, 2], &config).unwrap();
            assert_relative_eq!(result.probability(), 0.033612, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_forward_lattice_matches_hand_computation() {
        let model = weather();
        let expected = [[0.06, 0.24], [0.0552, 0.0486], [0.02904, 0.004572]];
        for config in [EvalConfig::log_space(), EvalConfig::scaled()] {
            let result = forward_with(&model, &[0, 1, 2], &config).unwrap();
            let lattice = result.lattice();
            assert_eq!(lattice.len(), 3);
            assert_eq!(lattice.n_states(), 2);
            assert_eq!(lattice.arithmetic(), config.arithmetic);
            for (t, row) in expected.iter().enumerate() {
                for (i, &alpha) in row.iter().enumerate() {
                    assert_relative_eq!(lattice.alpha(t, i), alpha, epsilon = 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_forward_emission_uses_own_time_step() {
        // State 0 only emits symbol 0 and state 1 only emits symbol 1; the
        // chain flips deterministically, so [0, 1, 0] has probability 1 and
        // [0, 0, 0] has probability 0.
        let model = Model::new(
            vec![1.0, 0.0],
            vec![vec![0.0, 1.0], vec![1.0, 0.0]],
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        )
        .unwrap();
        let alternating = forward(&model, &[0, 1, 0]).unwrap();
        assert_relative_eq!(alternating.probability(), 1.0, epsilon = 1e-12);

        let constant = forward(&model, &[0, 0, 0]).unwrap();
        assert_eq!(constant.probability(), 0.0);
        assert_eq!(constant.log_probability(), f64::NEG_INFINITY);
        // Impossible is a genuine zero, not an underflow
        assert_eq!(constant.probability_checked(), Ok(0.0));

        let scaled = forward_with(&model, &[0, 0, 0], &EvalConfig::scaled()).unwrap();
        assert_eq!(scaled.log_probability(), f64::NEG_INFINITY);
    }

    #[test]
    fn test_forward_terminates_over_all_states() {
        // All probability mass ends in the last state
        let model = Model::new(
            vec![0.0, 0.0, 1.0],
            vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 1.0]],
            vec![vec![1.0], vec![1.0], vec![1.0]],
        )
        .unwrap();
        let result = forward(&model, &[0, 0]).unwrap();
        assert_relative_eq!(result.probability(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_forward_invalid_input() {
        let model = weather();
        assert!(matches!(forward(&model, &[]), Err(Error::InvalidInput(_))));
        assert!(matches!(
            forward(&model, &[0, 5]),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_scaled_rows_are_normalised() {
        let model = weather();
        let result = forward_with(&model, &[0, 1, 2, 2, 1], &EvalConfig::scaled()).unwrap();
        for row in result.lattice().values().rows() {
            assert_relative_eq!(row.sum(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_log_alphas_agree_between_representations() {
        let model = weather();
        let obs = [2, 0, 1, 1, 0, 2];
        let log = forward_with(&model, &obs, &EvalConfig::log_space()).unwrap();
        let scaled = forward_with(&model, &obs, &EvalConfig::scaled()).unwrap();
        let a = log.lattice().to_log_alphas();
        let b = scaled.lattice().to_log_alphas();
        for (x, y) in a.iter().zip(b.iter()) {
            assert_relative_eq!(*x, *y, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_long_sequence_does_not_underflow() {
        let model = weather();
        let obs: Vec<usize> = (0..2000).map(|t| t % 3).collect();
        let log = forward_with(&model, &obs, &EvalConfig::log_space()).unwrap();
        let scaled = forward_with(&model, &obs, &EvalConfig::scaled()).unwrap();

        assert!(log.log_probability().is_finite());
        assert_relative_eq!(
            log.log_probability(),
            scaled.log_probability(),
            max_relative = 1e-9
        );
        assert_eq!(log.probability(), 0.0);
        assert!(matches!(
            log.probability_checked(),
            Err(Error::NumericDegenerate { .. })
        ));
    }
}
