//! Energy and momentum of a body list. Read-only; the integrators never
//! call into this module.

use crate::error::{SimError, SimResult};
use crate::simulation::pairs::force_pairs;
use crate::simulation::states::{Body, NVec3};

/// ½·m·|v|²
pub fn kinetic_energy(body: &Body) -> f64 {
    0.5 * body.m * body.v.norm_squared()
}

/// -G·mi·mj / |xi - xj| for bodies `i` and `j` of `bodies`
pub fn potential_energy(bodies: &[Body], i: usize, j: usize, g: f64) -> SimResult<f64> {
    let d = (bodies[i].x - bodies[j].x).norm();
    if d == 0.0 {
        return Err(SimError::CoincidentBodies { i, j });
    }
    Ok(-g * bodies[i].m * bodies[j].m / d)
}

pub fn total_kinetic_energy(bodies: &[Body]) -> f64 {
    bodies.iter().map(kinetic_energy).sum()
}

/// Gravitational potential summed over every unique pair, canonical order
pub fn total_potential_energy(bodies: &[Body], g: f64) -> SimResult<f64> {
    force_pairs(bodies.len())
        .into_iter()
        .map(|p| potential_energy(bodies, p.i, p.j, g))
        .sum()
}

pub fn total_energy(bodies: &[Body], g: f64) -> SimResult<f64> {
    Ok(total_kinetic_energy(bodies) + total_potential_energy(bodies, g)?)
}

/// Σ mi·vi
pub fn total_momentum(bodies: &[Body]) -> NVec3 {
    bodies.iter().map(Body::momentum).sum()
}

/// Mass-weighted mean position; `None` for an empty list
pub fn center_of_mass(bodies: &[Body]) -> Option<NVec3> {
    let total: f64 = bodies.iter().map(|b| b.m).sum();
    if bodies.is_empty() || total == 0.0 {
        return None;
    }
    let weighted: NVec3 = bodies.iter().map(|b| b.m * b.x).sum();
    Some(weighted / total)
}
