//! High-level runtime engine settings
//!
//! Selects the integrator and the frame decimation used when building and
//! running a `Scenario`

use crate::configuration::config::IntegratorConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct Engine {
    pub integrator: IntegratorConfig, // verlet or euler
    pub steps_per_frame: usize, // integrator steps between snapshots
    pub num_frames: usize, // snapshots per batch run
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            integrator: IntegratorConfig::Verlet,
            steps_per_frame: 10,
            num_frames: 500,
        }
    }
}
