//! Discrete Hidden Markov Model evaluation.
//!
//! This module provides:
//! - [`Model`]: an immutable, validated HMM (initial distribution, transition
//!   and emission matrices)
//! - [`forward()`]: total probability of an observation sequence
//! - [`viterbi()`]: the single most probable hidden-state path
//! - [`forward_batch`] / [`viterbi_batch`]: the same, over many sequences in parallel
//!
//! Both algorithms guard against underflow, either in log-space or with
//! per-step scaling (see [`Arithmetic`]).
//!
//! # Examples
//!
//! ```rust
//! use hmm_lattice::hmm::{forward, viterbi, Model};
//!
//! // Rainy = 0, Sunny = 1; Walk = 0, Shop = 1, Clean = 2
//! let model = Model::new(
//!     vec![0.6, 0.4],
//!     vec![vec![0.7, 0.3], vec![0.4, 0.6]],
//!     vec![vec![0.1, 0.4, 0.5], vec![0.6, 0.3, 0.1]],
//! )
//! .unwrap();
//!
//! let observations = [0, 1, 2];
//! let total = forward(&model, &observations).unwrap();
//! assert!((total.probability() - 0.033612).abs() < 1e-9);
//!
//! let decoding = viterbi(&model, &observations).unwrap();
//! assert_eq!(decoding.path().as_slice(), &[1, 0, 0]);
//! ```

pub mod batch;
pub mod config;
pub mod forward;
pub mod model;
pub mod numeric;
pub mod viterbi;


pub use batch::{forward_batch, viterbi_batch};
pub use config::{Arithmetic, EvalConfig, DEFAULT_TOLERANCE};
pub use forward::{forward, forward_with, ForwardLattice, ForwardResult};
pub use model::Model;
pub use viterbi::{viterbi, viterbi_with, Decoding, StatePath, ViterbiLattice};
