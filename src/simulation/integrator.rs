//! Fixed-step time integrators for the N-body system
//!
//! Two schemes, both driven by a force set and a fixed `dt`:
//! - [`VerletIntegrator`]: position-only Störmer–Verlet. Holds two position
//!   buffers and no velocities, so it only accepts a [`ConservativeSet`].
//! - [`EulerIntegrator`]: average-velocity Euler with explicit velocities.
//!   Accepts any [`ForceSet`], dissipative terms included.
//!
//! Every `step()` first recomputes the acceleration from the current
//! positions, then applies the position/velocity update and advances `t`.

use tracing::debug;

use crate::error::{SimError, SimResult};
use crate::simulation::forces::{ConservativeSet, ForceSet};
use crate::simulation::states::{validate_masses, Body, NVec3};

/// Position after one Euler step: r + v·dt + ½·a·dt²
pub fn euler_step_r(r: NVec3, v: NVec3, a: NVec3, dt: f64) -> NVec3 {
    r + v * dt + 0.5 * a * dt * dt
}

/// Average-velocity Euler step.
/// v' = v + a·dt, r' = r + ½·(v + v')·dt
pub fn euler_step(r: NVec3, v: NVec3, a: NVec3, dt: f64) -> (NVec3, NVec3) {
    let v_next = v + a * dt;
    let r_next = r + 0.5 * (v + v_next) * dt;
    (r_next, v_next)
}

/// Störmer–Verlet position recurrence: 2·r - r_prev + a·dt²
pub fn verlet_step_r(r: NVec3, r_prev: NVec3, a: NVec3, dt: f64) -> NVec3 {
    2.0 * r - r_prev + a * dt * dt
}

/// Read-only view of an integrator snapshot, shared by both schemes
pub trait FrameState {
    fn positions(&self) -> &[NVec3];

    /// `None` for schemes that keep no velocity state
    fn velocities(&self) -> Option<&[NVec3]>;

    fn accelerations(&self) -> &[NVec3];

    fn time(&self) -> f64;
}

/// A fixed-step integrator
pub trait Integrator {
    type State: FrameState;

    /// Advance exactly one `dt`
    fn step(&mut self) -> SimResult<()>;

    /// Copy of the current state. Never mutates the integrator
    fn state(&self) -> Self::State;

    /// Recompute accelerations from the current positions (and velocities,
    /// where the scheme has them). Called by `step()` before the update
    fn update_acceleration(&mut self) -> SimResult<()>;

    fn masses(&self) -> &[f64];

    fn time(&self) -> f64;

    fn dt(&self) -> f64;
}

fn split_bodies(bodies: &[Body], dt: f64) -> SimResult<(Vec<f64>, Vec<NVec3>, Vec<NVec3>)> {
    if !(dt > 0.0 && dt.is_finite()) {
        return Err(SimError::InvalidConfig(format!("time step must be positive, got {dt}")));
    }
    let masses: Vec<f64> = bodies.iter().map(|b| b.m).collect();
    validate_masses(&masses)?;
    let x = bodies.iter().map(|b| b.x).collect();
    let v = bodies.iter().map(|b| b.v).collect();
    Ok((masses, x, v))
}

// divide summed forces by mass, once per body
fn forces_to_accels(acc: &mut [NVec3], masses: &[f64]) {
    for (a, m) in acc.iter_mut().zip(masses) {
        *a /= *m;
    }
}

// =========================================================================================
// Verlet
// =========================================================================================

/// Where the Verlet recurrence stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerletPhase {
    /// Only the initial positions exist; the next step is the Euler bootstrap
    Uninitialized,
    /// One bootstrap step taken; both buffers hold real positions
    Bootstrapped,
    /// At least one recurrence step taken
    Stepping,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerletState {
    pub x: Vec<NVec3>,
    pub a: Vec<NVec3>,
    pub t: f64,
}

impl FrameState for VerletState {
    fn positions(&self) -> &[NVec3] {
        &self.x
    }

    fn velocities(&self) -> Option<&[NVec3]> {
        None
    }

    fn accelerations(&self) -> &[NVec3] {
        &self.a
    }

    fn time(&self) -> f64 {
        self.t
    }
}

/// Position-only Störmer–Verlet integrator.
///
/// The recurrence needs two earlier positions, so the first step is an
/// Euler position update from the initial velocities:
/// `r1 = r0 + v0·dt + ½·a0·dt²`. After that, each step computes
/// `r_{n+1} = 2·r_n - r_{n-1} + a_n·dt²`.
///
/// Positions live in two buffers. `positions[current]` holds `r_n` and the
/// other buffer holds `r_{n-1}`. A step overwrites the other buffer with
/// `r_{n+1}` element by element, then flips `current`. Initial velocities
/// are dropped after the bootstrap; no velocity is stored afterwards.
pub struct VerletIntegrator {
    masses: Vec<f64>,
    positions: [Vec<NVec3>; 2],
    current: usize,
    initial_velocities: Vec<NVec3>,
    acc: Vec<NVec3>,
    forces: ConservativeSet,
    dt: f64,
    t: f64,
    phase: VerletPhase,
}

impl VerletIntegrator {
    pub fn new(bodies: &[Body], forces: ConservativeSet, dt: f64) -> SimResult<Self> {
        let (masses, x, v) = split_bodies(bodies, dt)?;
        forces.validate(bodies.len())?;
        debug!(bodies = bodies.len(), terms = forces.len(), dt, "built verlet integrator");

        let n = masses.len();
        Ok(Self {
            masses,
            positions: [x, vec![NVec3::zeros(); n]],
            current: 0,
            initial_velocities: v,
            acc: vec![NVec3::zeros(); n],
            forces,
            dt,
            t: 0.0,
            phase: VerletPhase::Uninitialized,
        })
    }

    pub fn phase(&self) -> VerletPhase {
        self.phase
    }

    pub fn positions(&self) -> &[NVec3] {
        &self.positions[self.current]
    }

    /// Velocity estimate from the two stored positions, (r_n - r_{n-1}) / dt.
    /// This lags the true velocity by half a step. Before the first step
    /// the initial velocities are returned as given.
    pub fn estimated_velocities(&self) -> Vec<NVec3> {
        match self.phase {
            VerletPhase::Uninitialized => self.initial_velocities.clone(),
            VerletPhase::Bootstrapped | VerletPhase::Stepping => {
                let current = &self.positions[self.current];
                let previous = &self.positions[1 - self.current];
                current
                    .iter()
                    .zip(previous)
                    .map(|(r, r_prev)| (r - r_prev) / self.dt)
                    .collect()
            }
        }
    }

    /// Bodies at the current positions with estimated velocities
    pub fn bodies(&self) -> Vec<Body> {
        self.masses
            .iter()
            .zip(self.positions())
            .zip(self.estimated_velocities())
            .map(|((&m, &x), v)| Body::new(m, x, v))
            .collect()
    }
}

impl Integrator for VerletIntegrator {
    type State = VerletState;

    fn step(&mut self) -> SimResult<()> {
        self.update_acceleration()?;

        let dt = self.dt;
        let [first, second] = &mut self.positions;
        let (current, other) = if self.current == 0 {
            (&*first, second)
        } else {
            (&*second, first)
        };

        match self.phase {
            VerletPhase::Uninitialized => {
                // other buffer is still empty: bootstrap from v0
                for i in 0..current.len() {
                    other[i] = euler_step_r(current[i], self.initial_velocities[i], self.acc[i], dt);
                }
                self.initial_velocities = Vec::new();
                self.phase = VerletPhase::Bootstrapped;
            }
            VerletPhase::Bootstrapped | VerletPhase::Stepping => {
                // other buffer holds r_{n-1}; overwrite it with r_{n+1}
                for i in 0..current.len() {
                    other[i] = verlet_step_r(current[i], other[i], self.acc[i], dt);
                }
                self.phase = VerletPhase::Stepping;
            }
        }

        self.current = 1 - self.current;
        self.t += dt;
        Ok(())
    }

    fn state(&self) -> VerletState {
        VerletState {
            x: self.positions().to_vec(),
            a: self.acc.clone(),
            t: self.t,
        }
    }

    fn update_acceleration(&mut self) -> SimResult<()> {
        let x = &self.positions[self.current];
        self.forces.accumulate_forces(x, &self.masses, &mut self.acc)?;
        forces_to_accels(&mut self.acc, &self.masses);
        Ok(())
    }

    fn masses(&self) -> &[f64] {
        &self.masses
    }

    fn time(&self) -> f64 {
        self.t
    }

    fn dt(&self) -> f64 {
        self.dt
    }
}

// =========================================================================================
// Euler
// =========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct EulerState {
    pub x: Vec<NVec3>,
    pub v: Vec<NVec3>,
    pub a: Vec<NVec3>,
    pub t: f64,
}

impl FrameState for EulerState {
    fn positions(&self) -> &[NVec3] {
        &self.x
    }

    fn velocities(&self) -> Option<&[NVec3]> {
        Some(&self.v)
    }

    fn accelerations(&self) -> &[NVec3] {
        &self.a
    }

    fn time(&self) -> f64 {
        self.t
    }
}

/// Explicit Euler with velocity, using the average of old and new velocity
/// for the position update
pub struct EulerIntegrator {
    masses: Vec<f64>,
    x: Vec<NVec3>,
    v: Vec<NVec3>,
    acc: Vec<NVec3>,
    forces: ForceSet,
    dt: f64,
    t: f64,
}

impl EulerIntegrator {
    pub fn new(bodies: &[Body], forces: impl Into<ForceSet>, dt: f64) -> SimResult<Self> {
        let forces = forces.into();
        let (masses, x, v) = split_bodies(bodies, dt)?;
        forces.validate(bodies.len())?;
        debug!(bodies = bodies.len(), terms = forces.len(), dt, "built euler integrator");

        let n = masses.len();
        Ok(Self {
            masses,
            x,
            v,
            acc: vec![NVec3::zeros(); n],
            forces,
            dt,
            t: 0.0,
        })
    }

    pub fn bodies(&self) -> Vec<Body> {
        self.masses
            .iter()
            .zip(&self.x)
            .zip(&self.v)
            .map(|((&m, &x), &v)| Body::new(m, x, v))
            .collect()
    }
}

impl Integrator for EulerIntegrator {
    type State = EulerState;

    fn step(&mut self) -> SimResult<()> {
        self.update_acceleration()?;
        for ((x, v), a) in self.x.iter_mut().zip(self.v.iter_mut()).zip(&self.acc) {
            let (x_next, v_next) = euler_step(*x, *v, *a, self.dt);
            *x = x_next;
            *v = v_next;
        }
        self.t += self.dt;
        Ok(())
    }

    fn state(&self) -> EulerState {
        EulerState {
            x: self.x.clone(),
            v: self.v.clone(),
            a: self.acc.clone(),
            t: self.t,
        }
    }

    fn update_acceleration(&mut self) -> SimResult<()> {
        self.forces
            .accumulate_forces(&self.x, &self.v, &self.masses, &mut self.acc)?;
        forces_to_accels(&mut self.acc, &self.masses);
        Ok(())
    }

    fn masses(&self) -> &[f64] {
        &self.masses
    }

    fn time(&self) -> f64 {
        self.t
    }

    fn dt(&self) -> f64 {
        self.dt
    }
}
