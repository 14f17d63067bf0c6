pub mod error;
pub mod hmm;

pub use error::{Error, Result};
pub use hmm::{
    forward, forward_batch, forward_with, viterbi, viterbi_batch, viterbi_with, Arithmetic,
    Decoding, EvalConfig, ForwardLattice, ForwardResult, Model, StatePath, ViterbiLattice,
};
