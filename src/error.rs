//! Error types for the simulation core

use thiserror::Error;

/// Result type for simulation operations
pub type SimResult<T> = Result<T, SimError>;

/// Errors that can occur while building or running a simulation.
///
/// Numeric degeneracies are raised at the point they are detected; none of
/// them are recovered from internally.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("bodies {i} and {j} occupy the same position")]
    CoincidentBodies { i: usize, j: usize },

    #[error("cannot normalize a zero-length vector")]
    ZeroLengthVector,

    #[error("body {index} has non-positive mass {mass}")]
    NonPositiveMass { index: usize, mass: f64 },

    #[error("eccentricity {0} is outside [0, 1)")]
    InvalidEccentricity(f64),

    #[error("orbital period {0} must be positive")]
    NonPositivePeriod(f64),

    #[error("cannot distribute {total} over zero satellites")]
    EmptyDistribution { total: f64 },

    #[error("force pair ({i}, {j}) is out of bounds for {n} bodies")]
    PairOutOfBounds { i: usize, j: usize, n: usize },

    #[error("force pair ({0}, {0}) couples a body with itself")]
    SelfPair(usize),

    #[error("buffer length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("force law `{0}` depends on velocity and cannot run on the Verlet integrator, which keeps no velocity state; use the Euler integrator")]
    VelocityDependentLaw(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
