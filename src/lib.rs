pub mod error;
pub mod simulation;
pub mod configuration;

pub use error::{SimError, SimResult};

pub use simulation::states::{Body, ForcePair, System, NVec3};
pub use simulation::forces::{
    ConservativeForce, ConservativeSet, DampedSpring, DissipativeForce, ForceLaw, ForceSet,
    HarmonicSpring, NewtonianGravity, UniformField,
};
pub use simulation::integrator::{EulerIntegrator, FrameState, Integrator, VerletIntegrator};
pub use simulation::driver::{Simulation, Snapshot};
pub use simulation::scenario::{Scenario, ScenarioSimulation};

pub use configuration::config::{IntegratorConfig, EngineConfig, ParametersConfig, BodyConfig, ScenarioConfig};
