//! Core state types for the N-body simulation.
//!
//! - `Body`: a point mass with position and velocity
//! - `System`: the list of bodies and the current simulation time `t`
//! - `ForcePair`: an unordered index pair a pairwise force acts across
//!
//! Body `i` keeps index `i` for the whole lifetime of a simulation; every
//! snapshot lines up with the input body list.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
pub use crate::simulation::vector::NVec3;

#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub m: f64, // mass, > 0
    pub x: NVec3, // position
    pub v: NVec3, // velocity
}

impl Body {
    pub fn new(m: f64, x: NVec3, v: NVec3) -> Self {
        Self { m, x, v }
    }

    /// Body sitting still at `x`
    pub fn at_rest(m: f64, x: NVec3) -> Self {
        Self::new(m, x, NVec3::zeros())
    }

    /// Linear momentum m·v
    pub fn momentum(&self) -> NVec3 {
        self.m * self.v
    }
}

#[derive(Debug, Clone, Default)]
pub struct System {
    pub bodies: Vec<Body>, // collection of bodies
    pub t: f64, // time
}

impl System {
    pub fn new(bodies: Vec<Body>) -> Self {
        Self { bodies, t: 0.0 }
    }

    pub fn masses(&self) -> Vec<f64> {
        self.bodies.iter().map(|b| b.m).collect()
    }

    pub fn positions(&self) -> Vec<NVec3> {
        self.bodies.iter().map(|b| b.x).collect()
    }

    pub fn velocities(&self) -> Vec<NVec3> {
        self.bodies.iter().map(|b| b.v).collect()
    }

    /// Reject any body whose mass is not strictly positive (NaN included)
    pub fn validate(&self) -> SimResult<()> {
        validate_masses(&self.masses())
    }
}

pub fn validate_masses(masses: &[f64]) -> SimResult<()> {
    match masses.iter().position(|m| !(*m > 0.0)) {
        Some(index) => Err(SimError::NonPositiveMass { index, mass: masses[index] }),
        None => Ok(()),
    }
}

/// Unordered pair of body indices. The force law evaluates the force on `i`
/// from `j`; the caller applies the reaction to `j`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForcePair {
    pub i: usize,
    pub j: usize,
}

impl ForcePair {
    pub fn new(i: usize, j: usize) -> Self {
        Self { i, j }
    }

    /// Check the pair against a system of `n` bodies
    pub fn check(&self, n: usize) -> SimResult<()> {
        if self.i == self.j {
            return Err(SimError::SelfPair(self.i));
        }
        if self.i >= n || self.j >= n {
            return Err(SimError::PairOutOfBounds { i: self.i, j: self.j, n });
        }
        Ok(())
    }
}

impl From<(usize, usize)> for ForcePair {
    fn from((i, j): (usize, usize)) -> Self {
        Self::new(i, j)
    }
}
