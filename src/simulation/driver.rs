//! Drives an integrator in coarse frames of `steps_per_frame` fine steps.
//!
//! Batch playback uses [`Simulation::iterate`]; live playback calls
//! [`Simulation::step`] once per rendered frame and reads the result with
//! [`Simulation::record`]. Both run the same integrator steps in the same
//! order, so they produce identical trajectories.

use tracing::trace;

use crate::error::{SimError, SimResult};
use crate::simulation::integrator::{FrameState, Integrator};
use crate::simulation::states::NVec3;

/// One body in a snapshot, aligned by index with the input body list
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodySnapshot {
    pub m: f64,
    pub x: NVec3,
    pub v: Option<NVec3>,
}

/// Per-frame snapshot handed to a renderer
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub t: f64,
    pub bodies: Vec<BodySnapshot>,
}

impl Snapshot {
    pub fn capture<S: FrameState>(masses: &[f64], state: &S) -> Self {
        let velocities = state.velocities();
        let bodies = masses
            .iter()
            .zip(state.positions())
            .enumerate()
            .map(|(i, (&m, &x))| BodySnapshot {
                m,
                x,
                v: velocities.map(|v| v[i]),
            })
            .collect();
        Self {
            t: state.time(),
            bodies,
        }
    }

    /// `(mass, position)` pairs in body order
    pub fn mass_positions(&self) -> Vec<(f64, NVec3)> {
        self.bodies.iter().map(|b| (b.m, b.x)).collect()
    }
}

pub struct Simulation<I: Integrator> {
    integrator: I,
    steps_per_frame: usize,
    num_frames: usize,
    frame: usize, // frames completed so far
}

impl<I: Integrator> Simulation<I> {
    pub fn new(integrator: I, steps_per_frame: usize, num_frames: usize) -> SimResult<Self> {
        if steps_per_frame == 0 {
            return Err(SimError::InvalidConfig("steps_per_frame must be at least 1".into()));
        }
        Ok(Self {
            integrator,
            steps_per_frame,
            num_frames,
            frame: 0,
        })
    }

    pub fn integrator(&self) -> &I {
        &self.integrator
    }

    pub fn into_integrator(self) -> I {
        self.integrator
    }

    pub fn steps_per_frame(&self) -> usize {
        self.steps_per_frame
    }

    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    /// Frames advanced so far
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Advance one frame: `steps_per_frame` integrator steps
    pub fn step(&mut self) -> SimResult<()> {
        for _ in 0..self.steps_per_frame {
            self.integrator.step()?;
        }
        self.frame += 1;
        trace!(frame = self.frame, t = self.integrator.time(), "frame advanced");
        Ok(())
    }

    /// Apply `transform` to the current state
    pub fn record<T, F>(&self, transform: F) -> T
    where
        F: FnOnce(&I::State) -> T,
    {
        transform(&self.integrator.state())
    }

    /// Run `num_frames` frames from the current state and collect one
    /// transformed snapshot after each. The first entry is the state after
    /// the first `steps_per_frame` steps, not the initial condition.
    pub fn iterate<T, F>(&mut self, transform: F) -> SimResult<Vec<T>>
    where
        F: FnMut(&I::State) -> T,
    {
        self.frames(transform).collect()
    }

    /// Lazy form of [`Simulation::iterate`]: each `next()` advances one frame
    pub fn frames<T, F>(&mut self, transform: F) -> Frames<'_, I, F>
    where
        F: FnMut(&I::State) -> T,
    {
        Frames {
            remaining: self.num_frames,
            simulation: self,
            transform,
        }
    }

    /// Batch run that keeps `(mass, position, velocity)` snapshots
    pub fn snapshots(&mut self) -> SimResult<Vec<Snapshot>> {
        let masses = self.integrator.masses().to_vec();
        self.iterate(|state| Snapshot::capture(&masses, state))
    }
}

/// Iterator over the frames of a [`Simulation`]. Stops after the first error
pub struct Frames<'a, I: Integrator, F> {
    simulation: &'a mut Simulation<I>,
    transform: F,
    remaining: usize,
}

impl<I, T, F> Iterator for Frames<'_, I, F>
where
    I: Integrator,
    F: FnMut(&I::State) -> T,
{
    type Item = SimResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        match self.simulation.step() {
            Ok(()) => {
                self.remaining -= 1;
                let state = self.simulation.integrator.state();
                Some(Ok((self.transform)(&state)))
            }
            Err(err) => {
                self.remaining = 0;
                Some(Err(err))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}
