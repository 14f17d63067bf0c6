//! Viterbi decoding: the single most probable hidden-state path for an
//! observation sequence.
//!
//! Ties are broken towards the lowest state index, both when choosing a
//! predecessor and when choosing the final state, so decoding the same
//! `(model, observations)` pair always yields the same path.

use std::ops::Index;

use log::{debug, trace};
use ndarray::{Array1, Array2};

use super::config::{Arithmetic, EvalConfig};
use super::model::Model;
use super::numeric::{argmax, checked_exp, rescale};
use crate::error::Result;

/// A sequence of hidden state indices, one per observation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatePath(Vec<usize>);

impl StatePath {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, usize> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<usize> {
        self.0
    }
}

impl Index<usize> for StatePath {
    type Output = usize;

    fn index(&self, t: usize) -> &usize {
        &self.0[t]
    }
}

impl<'a> IntoIterator for &'a StatePath {
    type Item = &'a usize;
    type IntoIter = std::slice::Iter<'a, usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<StatePath> for Vec<usize> {
    fn from(path: StatePath) -> Self {
        path.0
    }
}

/// The `delta` and `psi` lattices produced by one decode (T rows × N columns).
#[derive(Debug, Clone)]
pub struct ViterbiLattice {
    arithmetic: Arithmetic,
    // delta[t][s]: best path score ending in state s at time t
    delta: Array2<f64>,
    // psi[t][s]: predecessor of s on that path; None at t = 0
    psi: Array2<Option<usize>>,
    log_scale: Array1<f64>,
}

impl ViterbiLattice {
    pub fn arithmetic(&self) -> Arithmetic {
        self.arithmetic
    }

    /// Number of time steps (T).
    pub fn len(&self) -> usize {
        self.delta.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.delta.is_empty()
    }

    /// Number of states (N).
    pub fn n_states(&self) -> usize {
        self.delta.ncols()
    }

    /// The stored `delta` values: natural logs for [`Arithmetic::LogSpace`],
    /// values divided by the per-step maximum for [`Arithmetic::Scaled`].
    pub fn delta_values(&self) -> &Array2<f64> {
        &self.delta
    }

    /// Cumulative log of the per-step maxima. Zero in log-space mode.
    pub fn log_scale(&self) -> &Array1<f64> {
        &self.log_scale
    }

    /// `ln delta[t][i]`, independent of representation.
    ///
    /// # Panics
    ///
    /// Panics if `t` or `i` is out of range.
    pub fn log_delta(&self, t: usize, i: usize) -> f64 {
        match self.arithmetic {
            Arithmetic::LogSpace => self.delta[[t, i]],
            Arithmetic::Scaled => self.delta[[t, i]].ln() + self.log_scale[t],
        }
    }

    /// `delta[t][i]` as a plain probability.
    pub fn delta(&self, t: usize, i: usize) -> f64 {
        self.log_delta(t, i).exp()
    }

    /// The best predecessor of state `i` at time `t`, or `None` at `t = 0` or
    /// when `(t, i)` is outside the lattice.
    pub fn predecessor(&self, t: usize, i: usize) -> Option<usize> {
        self.psi.get([t, i]).copied().flatten()
    }

    /// Follows the backpointers from state `last` at the final time step.
    ///
    /// Returns `None` if `last` is not a state of this lattice.
    pub fn backtrack(&self, last: usize) -> Option<StatePath> {
        let t_len = self.len();
        if t_len == 0 || last >= self.n_states() {
            return None;
        }
        let mut path = vec![0_usize; t_len];
        path[t_len - 1] = last;
        for t in (0..t_len - 1).rev() {
            // The predecessor of the state chosen at t+1 lives in row t+1.
            path[t] = self.predecessor(t + 1, path[t + 1])?;
        }
        Some(StatePath(path))
    }
}

/// Outcome of a Viterbi decode.
#[derive(Debug, Clone)]
pub struct Decoding {
    path: StatePath,
    log_probability: f64,
    lattice: ViterbiLattice,
}

impl Decoding {
    /// The most probable state sequence.
    pub fn path(&self) -> &StatePath {
        &self.path
    }

    pub fn into_path(self) -> StatePath {
        self.path
    }

    /// `ln` of the best path's joint probability with the observations.
    pub fn log_probability(&self) -> f64 {
        self.log_probability
    }

    /// The best path's joint probability. Underflows to 0.0 for long sequences.
    pub fn probability(&self) -> f64 {
        self.log_probability.exp()
    }

    /// Like [`probability`](Self::probability), but reports
    /// [`Error::NumericDegenerate`](crate::Error::NumericDegenerate) instead of
    /// a silent underflow.
    pub fn probability_checked(&self) -> Result<f64> {
        checked_exp(self.log_probability)
    }

    pub fn lattice(&self) -> &ViterbiLattice {
        &self.lattice
    }
}

/// Runs the Viterbi algorithm for a given HMM and a sequence of observations,
/// in log-space.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`](crate::Error::InvalidInput) if
/// `observations` is empty or contains a symbol outside
/// `0..model.n_symbols()`.
///
/// # Examples
///
/// ```
/// use hmm_lattice::hmm::{viterbi, Model};
///
/// // Fair (0) and loaded (1) coin; heads = 0, tails = 1
/// let model = Model::new(
///     vec![0.5, 0.5],
///     vec![vec![0.9, 0.1], vec![0.2, 0.8]],
///     vec![vec![0.5, 0.5], vec![0.9, 0.1]],
/// )
/// .unwrap();
///
/// let decoding = viterbi(&model, &[0, 0, 0, 0]).unwrap();
/// assert_eq!(decoding.path().as_slice(), &[1, 1, 1, 1]);
/// ```
pub fn viterbi(model: &Model, observations: &[usize]) -> Result<Decoding> {
    viterbi_with(model, observations, &EvalConfig::default())
}

/// Runs the Viterbi algorithm with the given configuration.
pub fn viterbi_with(
    model: &Model,
    observations: &[usize],
    config: &EvalConfig,
) -> Result<Decoding> {
    model.validate_observations(observations)?;

    let lattice = match config.arithmetic {
        Arithmetic::LogSpace => decode_log_space(model, observations),
        Arithmetic::Scaled => decode_scaled(model, observations),
    };

    // Termination: find best final state
    let last = lattice.len() - 1;
    let (best_final, best_score) = argmax(lattice.delta.row(last).iter().copied())
        .unwrap_or((0, f64::NEG_INFINITY));
    let log_probability = match lattice.arithmetic {
        Arithmetic::LogSpace => best_score,
        Arithmetic::Scaled => best_score.ln() + lattice.log_scale[last],
    };

    let path = lattice.backtrack(best_final).unwrap_or_else(|| {
        // Unreachable with at least one state; keep the length invariant anyway.
        StatePath(vec![best_final; observations.len()])
    });

    debug!(
        "viterbi: T={}, N={}, {:?}, log P* = {log_probability}",
        observations.len(),
        model.n_states(),
        config.arithmetic
    );

    Ok(Decoding {
        path,
        log_probability,
        lattice,
    })
}

fn decode_log_space(model: &Model, observations: &[usize]) -> ViterbiLattice {
    let n = model.n_states();
    let t_len = observations.len();
    let log_a = model.log_transition();
    let log_b = model.log_emission();
    let log_pi = model.log_initial();

    let mut delta = Array2::from_elem((t_len, n), f64::NEG_INFINITY);
    let mut psi = Array2::from_elem((t_len, n), None);

    // Initialization step (time 0)
    let o0 = observations[0];
    for s in 0..n {
        delta[[0, s]] = log_pi[s] + log_b[[s, o0]];
    }

    // Recursion
    for time in 1..t_len {
        let obs = observations[time];
        for s in 0..n {
            // argmax_{s'} [ delta[time-1][s'] + ln(transition[s'->s]) ]
            let candidates = (0..n).map(|s_prev| delta[[time - 1, s_prev]] + log_a[[s_prev, s]]);
            let (best_prev, best_val) = argmax(candidates).unwrap_or((0, f64::NEG_INFINITY));
            delta[[time, s]] = best_val + log_b[[s, obs]];
            psi[[time, s]] = Some(best_prev);
        }
        trace!("viterbi t={time}: {:?}", delta.row(time));
    }

    ViterbiLattice {
        arithmetic: Arithmetic::LogSpace,
        delta,
        psi,
        log_scale: Array1::zeros(t_len),
    }
}

fn decode_scaled(model: &Model, observations: &[usize]) -> ViterbiLattice {
    let n = model.n_states();
    let t_len = observations.len();
    let a = model.transition();
    let b = model.emission();
    let pi = model.initial();

    let mut delta = Array2::<f64>::zeros((t_len, n));
    let mut psi = Array2::from_elem((t_len, n), None);
    let mut log_scale = Array1::<f64>::zeros(t_len);

    let o0 = observations[0];
    for s in 0..n {
        delta[[0, s]] = pi[s] * b[[s, o0]];
    }
    let max = delta.row(0).fold(0.0_f64, |m, &v| m.max(v));
    log_scale[0] = rescale(delta.row_mut(0), max);

    for time in 1..t_len {
        let obs = observations[time];
        for s in 0..n {
            let candidates = (0..n).map(|s_prev| delta[[time - 1, s_prev]] * a[[s_prev, s]]);
            let (best_prev, best_val) = argmax(candidates).unwrap_or((0, 0.0));
            delta[[time, s]] = best_val * b[[s, obs]];
            psi[[time, s]] = Some(best_prev);
        }
        let max = delta.row(time).fold(0.0_f64, |m, &v| m.max(v));
        log_scale[time] = log_scale[time - 1] + rescale(delta.row_mut(time), max);
        trace!("viterbi t={time}: log scale {}", log_scale[time]);
    }

    ViterbiLattice {
        arithmetic: Arithmetic::Scaled,
        delta,
        psi,
        log_scale,
    }
}
