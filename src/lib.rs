//! Incremental Gram-Schmidt orthogonalization engine for integer lattices.
//!
//! This crate is the numeric substrate reduction drivers (LLL, BKZ,
//! enumeration) build on: given an ordered sequence of integer basis
//! vectors, it maintains the orthogonalization coefficients `mu(i,j)` and
//! the squared Gram-Schmidt norms `r(i,i)` lazily and incrementally under
//! in-place row operations. See [`gso::Gso`] for the engine itself and
//! [`metrics`] for the derived quantities (log-det, slope, Gaussian
//! heuristic) built on top of it.

pub mod error;
pub mod gso;
pub mod matrix;
pub mod metrics;
pub mod scalar;
pub mod vector;

pub use error::{ConfigError, GsoError, PreconditionError};
pub use gso::{Gso, GsoConfig};
pub use scalar::{F, Z};
