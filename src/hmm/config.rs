/// Default tolerance for row-sum validation of probability tables.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// How lattice values are represented to avoid underflow on long sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Arithmetic {
    /// Lattices hold natural logarithms of probabilities.
    #[default]
    LogSpace,
    /// Lattices hold per-step normalised probabilities; the cumulative log of
    /// the normalisers is tracked alongside.
    Scaled,
}

/// Configuration options for the forward evaluator and Viterbi decoder.
#[derive(Debug, Clone, Default)]
pub struct EvalConfig {
    /// Lattice representation
    pub arithmetic: Arithmetic,
}

impl EvalConfig {
    pub fn new(arithmetic: Arithmetic) -> Self {
        Self { arithmetic }
    }

    pub fn log_space() -> Self {
        Self::new(Arithmetic::LogSpace)
    }

    pub fn scaled() -> Self {
        Self::new(Arithmetic::Scaled)
    }
}
