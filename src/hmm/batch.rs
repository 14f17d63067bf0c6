//! Parallel evaluation of many observation sequences against one model.
//!
//! A [`Model`] is immutable and every call allocates its own lattice, so the
//! sequences are spread over the rayon thread pool with no synchronisation.
//! Results come back in input order, one per sequence; an invalid sequence
//! fails only its own slot.

use log::debug;
use rayon::prelude::*;

use super::config::EvalConfig;
use super::forward::{forward_with, ForwardResult};
use super::model::Model;
use super::viterbi::{viterbi_with, Decoding};
use crate::error::Result;

/// Runs [`forward_with`] over every sequence in parallel.
pub fn forward_batch<S>(
    model: &Model,
    sequences: &[S],
    config: &EvalConfig,
) -> Vec<Result<ForwardResult>>
where
    S: AsRef<[usize]> + Sync,
{
    debug!("forward batch of {} sequences", sequences.len());
    sequences
        .par_iter()
        .map(|obs| forward_with(model, obs.as_ref(), config))
        .collect()
}

/// Runs [`viterbi_with`] over every sequence in parallel.
pub fn viterbi_batch<S>(
    model: &Model,
    sequences: &[S],
    config: &EvalConfig,
) -> Vec<Result<Decoding>>
where
    S: AsRef<[usize]> + Sync,
{
    debug!("viterbi batch of {} sequences", sequences.len());
    sequences
        .par_iter()
        .map(|obs| viterbi_with(model, obs.as_ref(), config))
        .collect()
}
