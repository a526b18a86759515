//! Typed error taxonomy for every fallible public operation in this crate.
//!
//! Internal call sites that merely need contextual chaining (e.g. the integer-stream
//! persistence path) keep using `anyhow` and convert to [`Error::Io`]/[`Error::Serialization`]
//! at the public boundary, the same split the teacher draws between its own panicking
//! invariants and `anyhow::Result` return types.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A caller-observable precondition was violated: a NaN priority, mismatched array
    /// lengths, non-monotonic slice boundaries in a stacked RAG, or an attempt to contract
    /// an edge whose endpoints already share a representative.
    #[error("precondition violated: {0}")]
    PrecondViolation(String),

    /// Two or more configuration fields conflict with each other before any work began.
    #[error("configuration conflict: {0}")]
    ConfigConflict(String),

    /// The operation understood the request but cannot honor it; distinct from
    /// [`Error::PrecondViolation`] so callers can match on it and fall back to another
    /// strategy (e.g. [`crate::perturb_and_map::ChainedSolvers`] trying the next solver).
    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, Error>;
