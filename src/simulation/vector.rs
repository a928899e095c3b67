//! 3D vector helpers on top of `nalgebra`
//!
//! `NVec3` already provides add/sub/negate/scale, `dot`, `cross`, `norm`
//! and `norm_squared`. What lives here is the part nalgebra leaves to the
//! caller: normalization that refuses the zero vector, and the random
//! draws used by the orbital generator.

use nalgebra::Vector3;
use rand::Rng;
use std::f64::consts::TAU;

use crate::error::{SimError, SimResult};

pub type NVec3 = Vector3<f64>;

/// Unit vector along `v`. Fails on the zero vector instead of returning NaN.
pub fn unit(v: &NVec3) -> SimResult<NVec3> {
    v.try_normalize(0.0).ok_or(SimError::ZeroLengthVector)
}

/// Random vector with each component uniform in [-1, 1)
pub fn random_vector<R: Rng + ?Sized>(rng: &mut R) -> NVec3 {
    NVec3::new(
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
    )
}

/// Random unit vector
pub fn random_direction<R: Rng + ?Sized>(rng: &mut R) -> SimResult<NVec3> {
    unit(&random_vector(rng))
}

/// Random angle in [0, 2π)
pub fn random_angle<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen::<f64>() * TAU
}
