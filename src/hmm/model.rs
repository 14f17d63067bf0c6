use log::debug;
use ndarray::{Array1, Array2};

use super::config::DEFAULT_TOLERANCE;
use super::numeric::check_distribution;
use crate::error::{Error, Result};

/// Represents a discrete Hidden Markov Model (HMM), storing:
/// - `initial[i]`: probability of starting in state i
/// - `transition[[i, j]]`: probability of moving from state i at t to state j at t+1
/// - `emission[[i, k]]`: probability of emitting symbol k while in state i
///
/// # Constraints
/// - `initial`, every transition row and every emission row are probability
///   distributions (entries in [0, 1], summing to 1 within the tolerance).
/// - At least one state and one symbol.
///
/// A `Model` is validated once at construction and immutable afterwards, so it
/// can be shared by reference across any number of concurrent evaluations.
#[derive(Debug, Clone)]
pub struct Model {
    n_states: usize,
    n_symbols: usize,
    tolerance: f64,
    initial: Array1<f64>,
    transition: Array2<f64>,
    emission: Array2<f64>,
    // Natural-log copies; ln(0) = -inf.
    log_initial: Array1<f64>,
    log_transition: Array2<f64>,
    log_emission: Array2<f64>,
}

impl Model {
    /// Create a new `Model` from nested vectors, validated with [`DEFAULT_TOLERANCE`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidModel`] if a dimension is zero, the shapes do not
    /// agree, or any row is not a probability distribution.
    pub fn new(
        initial: Vec<f64>,
        transition: Vec<Vec<f64>>,
        emission: Vec<Vec<f64>>,
    ) -> Result<Self> {
        Self::with_tolerance(initial, transition, emission, DEFAULT_TOLERANCE)
    }

    /// Like [`Model::new`], with a caller-chosen row-sum tolerance.
    pub fn with_tolerance(
        initial: Vec<f64>,
        transition: Vec<Vec<f64>>,
        emission: Vec<Vec<f64>>,
        tolerance: f64,
    ) -> Result<Self> {
        let n_states = initial.len();
        let transition = to_matrix("transition", transition, n_states)?;
        let n_symbols = emission.first().map_or(0, Vec::len);
        let emission = to_matrix("emission", emission, n_symbols)?;
        Self::from_arrays(Array1::from(initial), transition, emission, tolerance)
    }

    /// Create a new `Model` from `ndarray` values.
    ///
    /// The state count is taken from `initial`, the symbol count from the
    /// number of emission columns.
    pub fn from_arrays(
        initial: Array1<f64>,
        transition: Array2<f64>,
        emission: Array2<f64>,
        tolerance: f64,
    ) -> Result<Self> {
        if !(tolerance.is_finite() && tolerance >= 0.0) {
            return Err(Error::invalid_model(format!(
                "tolerance must be a non-negative finite number, got {tolerance}"
            )));
        }

        let n_states = initial.len();
        let n_symbols = emission.ncols();
        if n_states == 0 {
            return Err(Error::invalid_model("model must have at least one state"));
        }
        if n_symbols == 0 {
            return Err(Error::invalid_model("model must have at least one symbol"));
        }
        if transition.dim() != (n_states, n_states) {
            return Err(Error::invalid_model(format!(
                "transition shape {:?} does not match {n_states} states",
                transition.dim()
            )));
        }
        if emission.nrows() != n_states {
            return Err(Error::invalid_model(format!(
                "emission has {} rows, expected {n_states}",
                emission.nrows()
            )));
        }

        check_distribution("initial distribution", initial.view(), tolerance)?;
        for (i, row) in transition.rows().into_iter().enumerate() {
            check_distribution(&format!("transition row {i}"), row, tolerance)?;
        }
        for (i, row) in emission.rows().into_iter().enumerate() {
            check_distribution(&format!("emission row {i}"), row, tolerance)?;
        }

        debug!("built HMM with {n_states} states and {n_symbols} symbols");

        Ok(Self {
            n_states,
            n_symbols,
            tolerance,
            log_initial: initial.mapv(f64::ln),
            log_transition: transition.mapv(f64::ln),
            log_emission: emission.mapv(f64::ln),
            initial,
            transition,
            emission,
        })
    }

    /// Number of hidden states (N).
    pub fn n_states(&self) -> usize {
        self.n_states
    }

    /// Number of observable symbols (M).
    pub fn n_symbols(&self) -> usize {
        self.n_symbols
    }

    /// Row-sum tolerance the model was validated with.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn initial(&self) -> &Array1<f64> {
        &self.initial
    }

    pub fn transition(&self) -> &Array2<f64> {
        &self.transition
    }

    pub fn emission(&self) -> &Array2<f64> {
        &self.emission
    }

    pub(crate) fn log_initial(&self) -> &Array1<f64> {
        &self.log_initial
    }

    pub(crate) fn log_transition(&self) -> &Array2<f64> {
        &self.log_transition
    }

    pub(crate) fn log_emission(&self) -> &Array2<f64> {
        &self.log_emission
    }

    /// Checks that `observations` is non-empty and every symbol is below
    /// [`n_symbols`](Self::n_symbols).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] naming the first offending position.
    pub fn validate_observations(&self, observations: &[usize]) -> Result<()> {
        if observations.is_empty() {
            return Err(Error::invalid_input("observation sequence is empty"));
        }
        if let Some((t, &o)) = observations
            .iter()
            .enumerate()
            .find(|&(_, &o)| o >= self.n_symbols)
        {
            return Err(Error::invalid_input(format!(
                "observation {t} is symbol {o}, out of range (n_symbols = {})",
                self.n_symbols
            )));
        }
        Ok(())
    }
}

fn to_matrix(name: &str, rows: Vec<Vec<f64>>, n_cols: usize) -> Result<Array2<f64>> {
    let n_rows = rows.len();
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_cols) {
        return Err(Error::invalid_model(format!(
            "{name} row {i} has {} entries, expected {n_cols}",
            row.len()
        )));
    }
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((n_rows, n_cols), flat)
        .map_err(|e| Error::invalid_model(format!("{name} matrix: {e}")))
}
