//! Configuration types for loading simulation scenarios from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! simulation scenario. A scenario consists of:
//!
//! - [`EngineConfig`]     – integrator choice and frame decimation
//! - [`ParametersConfig`] – gravitational constant, time step and seed
//! - [`SystemConfig`]     – explicit bodies or one of the orbital generators
//! - [`ForceConfig`]      – the force laws acting on the bodies
//! - [`ScenarioConfig`]   – top-level wrapper used to load a scenario from YAML
//!
//! # YAML format
//! A flat solar system integrated with Verlet:
//!
//! ```yaml
//! engine:
//!   integrator: "verlet"    # or "euler"
//!   steps_per_frame: 10
//!   num_frames: 500
//!
//! parameters:
//!   g: 1.0                  # gravitational constant
//!   dt: 0.001               # fixed step size
//!   seed: 42                # optional, makes generated systems reproducible
//!
//! system:
//!   kind: solar_system
//!   sun_mass: 200.0
//!   planets:
//!     - { mass: 5.0, period: 4.0, eccentricity: 0.1 }
//!     - { mass: 1.0, period: 9.0 }
//!
//! forces:                   # optional, defaults to gravity alone
//!   - kind: gravity
//! ```
//!
//! Springs take a pair topology:
//!
//! ```yaml
//! forces:
//!   - kind: damped_spring
//!     spring_constant: 20.0
//!     equilibrium_distance: 1.0
//!     damping: 0.3
//!     pairs: { topology: mesh, width: 3, height: 3 }
//! ```
//!
//! `Scenario::build_scenario` maps this into runtime types and rejects
//! invalid combinations before any step runs.

use serde::Deserialize;

/// Which integrator the engine uses
/// `integrator: "verlet"` or `integrator: "euler"`
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegratorConfig {
    #[serde(rename = "verlet")] // Störmer–Verlet, position only, conservative forces only
    Verlet,

    #[serde(rename = "euler")] // Average-velocity Euler, keeps velocities, accepts damping
    Euler,
}

/// High-level engine configuration
#[derive(Deserialize, Debug, Clone)]
pub struct EngineConfig {
    pub integrator: IntegratorConfig, // Time integrator used for advancing the system state
    pub steps_per_frame: usize, // Integrator steps between two output snapshots
    pub num_frames: usize, // Snapshots produced by a batch run
}

/// Global numerical and physical parameters for a scenario
#[derive(Deserialize, Debug, Clone)]
pub struct ParametersConfig {
    pub g: f64, // gravitational constant
    pub dt: f64, // time step size
    #[serde(default)]
    pub seed: Option<u64>, // deterministic seed to make generated systems reproducible
}

/// Initial state of one explicitly listed body
#[derive(Deserialize, Debug, Clone)]
pub struct BodyConfig {
    pub m: f64, // Mass of the body
    pub x: [f64; 3], // Initial position
    #[serde(default)]
    pub v: [f64; 3], // Initial velocity, at rest when omitted
}

/// One planet of a flat solar system
#[derive(Deserialize, Debug, Clone)]
pub struct PlanetConfig {
    pub mass: f64,
    pub period: f64,
    #[serde(default)]
    pub eccentricity: f64,
}

/// One node of an orbital tree. `period`/`eccentricity` are ignored on the root
#[derive(Deserialize, Debug, Clone)]
pub struct NodeConfig {
    pub mass: f64,
    #[serde(default)]
    pub period: f64,
    #[serde(default)]
    pub eccentricity: f64,
    #[serde(default)]
    pub satellites: Vec<NodeConfig>,
}

/// Where the initial bodies come from
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SystemConfig {
    /// Explicit list of bodies
    Bodies { bodies: Vec<BodyConfig> },
    /// Two bodies on one Kepler orbit around a resting barycenter
    TwoBody {
        m1: f64,
        m2: f64,
        period: f64,
        #[serde(default)]
        eccentricity: f64,
    },
    /// Star with independent planets; the star is the last body
    SolarSystem { sun_mass: f64, planets: Vec<PlanetConfig> },
    /// Star with planets drawn from ranges
    RandomSolarSystem {
        sun_mass: f64,
        count: usize,
        mass: [f64; 2],
        period: [f64; 2],
        eccentricity: [f64; 2],
    },
    /// Orbital tree; the root is the last body
    Hierarchy { root: NodeConfig },
    /// Random orbital tree
    RandomHierarchy {
        mass: f64,
        period: f64,
        eccentricity: [f64; 2],
        satellites: [usize; 2], // half-open range of satellite counts
        depth: usize,
    },
    /// Sun, earth and moon with masses 50/50/5
    SunEarthMoon,
    /// Equal masses on a ring
    Circle { count: usize, radius: f64 },
}

/// Which body pairs a spring connects
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "topology", rename_all = "snake_case")]
pub enum PairsConfig {
    All,
    Strand,
    Ring,
    RingCenter,
    Mesh {
        width: usize,
        height: usize,
        #[serde(default)]
        rest: usize,
    },
    MeshNext {
        width: usize,
        height: usize,
        #[serde(default)]
        rest: usize,
    },
    Explicit { pairs: Vec<[usize; 2]> },
}

/// One force law
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ForceConfig {
    Gravity,
    Spring {
        spring_constant: f64,
        equilibrium_distance: f64,
        #[serde(default)]
        driving: [f64; 3],
        pairs: PairsConfig,
    },
    DampedSpring {
        spring_constant: f64,
        equilibrium_distance: f64,
        damping: f64,
        #[serde(default)]
        driving: [f64; 3],
        pairs: PairsConfig,
    },
    Uniform { force: [f64; 3] },
}

fn default_forces() -> Vec<ForceConfig> {
    vec![ForceConfig::Gravity]
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone)]
pub struct ScenarioConfig {
    pub engine: EngineConfig, // Integrator and frame settings
    pub parameters: ParametersConfig, // Global numerical and physical parameters
    pub system: SystemConfig, // Initial bodies
    #[serde(default = "default_forces")]
    pub forces: Vec<ForceConfig>, // Force laws acting on the bodies
}
