//! Build fully-initialized simulation scenarios from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces a runtime bundle
//! containing:
//! - engine settings (`Engine`)
//! - numerical parameters (`Parameters`)
//! - system state (`System` with bodies at t = 0)
//! - active force laws (`ForceLaw`)
//!
//! Everything that can be rejected is rejected here, before any step runs:
//! bad masses, bad orbital parameters, out-of-range spring pairs, and a
//! velocity-dependent force law paired with the Verlet integrator.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::configuration::config::{
    ForceConfig, IntegratorConfig, NodeConfig, PairsConfig, ScenarioConfig, SystemConfig,
};
use crate::error::{SimError, SimResult};
use crate::simulation::diagnostics::total_momentum;
use crate::simulation::driver::{Simulation, Snapshot};
use crate::simulation::engine::Engine;
use crate::simulation::forces::{
    ConservativeSet, ForceLaw, ForceSet, HarmonicSpring, NewtonianGravity, UniformField,
};
use crate::simulation::integrator::{EulerIntegrator, Integrator, VerletIntegrator};
use crate::simulation::orbits::{
    build_a_solar_system, check_gravity, generate_circle_of_planets, random_gravity_node,
    resting_two_body_system, simulate_a_solar_system, sun_earth_moon, Barycenter, GravityNode,
    Orbit, OrbitOrientation, PlanetSpec, SolarSystemRanges,
};
use crate::simulation::pairs::{
    force_pairs, rectangular_mesh, rectangular_mesh_next_nearest, ring_strand, ring_with_center,
    single_strand,
};
use crate::simulation::params::Parameters;
use crate::simulation::states::{Body, ForcePair, NVec3, System};

/// Fully-initialized simulation scenario.
///
/// This is the main "runtime bundle" constructed from a [`ScenarioConfig`]:
/// it contains the engine settings, parameters, initial system state and
/// the force laws. Call [`Scenario::simulation`] to get a steppable
/// simulation, or [`Scenario::run`] for a batch of snapshots.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub engine: Engine,
    pub parameters: Parameters,
    pub system: System,
    pub forces: Vec<ForceLaw>,
}

impl Scenario {
    pub fn build_scenario(cfg: ScenarioConfig) -> SimResult<Self> {
        // Parameters (runtime) from ParametersConfig
        let p_cfg = cfg.parameters;
        let seed = p_cfg.seed.unwrap_or_else(|| rand::thread_rng().gen());
        let parameters = Parameters {
            g: p_cfg.g,
            dt: p_cfg.dt,
            seed: Some(seed),
        };
        if !(parameters.dt > 0.0 && parameters.dt.is_finite()) {
            return Err(SimError::InvalidConfig(format!("dt must be positive, got {}", parameters.dt)));
        }
        check_gravity(parameters.g)?;

        // Engine (runtime) from EngineConfig
        let e_cfg = cfg.engine;
        let engine = Engine {
            integrator: e_cfg.integrator,
            steps_per_frame: e_cfg.steps_per_frame,
            num_frames: e_cfg.num_frames,
        };
        if engine.steps_per_frame == 0 {
            return Err(SimError::InvalidConfig("steps_per_frame must be at least 1".into()));
        }

        // Bodies: explicit list or one of the orbital generators, all drawing
        // from the same seeded source
        let mut rng = StdRng::seed_from_u64(seed);
        let bodies = build_bodies(cfg.system, parameters.g, &mut rng)?;
        let system = System::new(bodies);
        system.validate()?;

        // Forces: resolve pair topologies against the body count
        let n = system.bodies.len();
        let forces = cfg
            .forces
            .into_iter()
            .map(|f| build_force(f, parameters.g, n))
            .collect::<SimResult<Vec<_>>>()?;

        if engine.integrator == IntegratorConfig::Verlet {
            if let Some(law) = forces.iter().find(|law| !law.is_conservative()) {
                return Err(SimError::VelocityDependentLaw(law.name().to_string()));
            }
        }

        info!(
            bodies = n,
            forces = forces.len(),
            integrator = ?engine.integrator,
            seed,
            "scenario built"
        );

        let scenario = Self {
            engine,
            parameters,
            system,
            forces,
        };
        // surface bad pairs now rather than on the first step
        scenario.simulation()?;
        Ok(scenario)
    }

    /// Fresh steppable simulation at t = 0
    pub fn simulation(&self) -> SimResult<ScenarioSimulation> {
        let bodies = &self.system.bodies;
        let dt = self.parameters.dt;
        let Engine {
            integrator,
            steps_per_frame,
            num_frames,
        } = self.engine;

        match integrator {
            IntegratorConfig::Verlet => {
                let forces = self
                    .forces
                    .iter()
                    .cloned()
                    .try_fold(ConservativeSet::new(), ConservativeSet::try_with_law)?;
                let integrator = VerletIntegrator::new(bodies, forces, dt)?;
                Ok(ScenarioSimulation::Verlet(Simulation::new(
                    integrator,
                    steps_per_frame,
                    num_frames,
                )?))
            }
            IntegratorConfig::Euler => {
                let forces = self
                    .forces
                    .iter()
                    .cloned()
                    .fold(ForceSet::new(), ForceSet::with_law);
                let integrator = EulerIntegrator::new(bodies, forces, dt)?;
                Ok(ScenarioSimulation::Euler(Simulation::new(
                    integrator,
                    steps_per_frame,
                    num_frames,
                )?))
            }
        }
    }

    /// Batch run: `num_frames` snapshots
    pub fn run(&self) -> SimResult<Vec<Snapshot>> {
        let mut simulation = self.simulation()?;
        (0..self.engine.num_frames)
            .map(|_| {
                simulation.step()?;
                Ok(simulation.snapshot())
            })
            .collect()
    }
}

/// A [`Simulation`] over whichever integrator the scenario selected
pub enum ScenarioSimulation {
    Verlet(Simulation<VerletIntegrator>),
    Euler(Simulation<EulerIntegrator>),
}

impl ScenarioSimulation {
    /// Advance one frame
    pub fn step(&mut self) -> SimResult<()> {
        match self {
            ScenarioSimulation::Verlet(sim) => sim.step(),
            ScenarioSimulation::Euler(sim) => sim.step(),
        }
    }

    /// Snapshot of the current state. Velocities are present for Euler only
    pub fn snapshot(&self) -> Snapshot {
        match self {
            ScenarioSimulation::Verlet(sim) => {
                sim.record(|state| Snapshot::capture(sim.integrator().masses(), state))
            }
            ScenarioSimulation::Euler(sim) => {
                sim.record(|state| Snapshot::capture(sim.integrator().masses(), state))
            }
        }
    }

    /// Current bodies for diagnostics. Verlet velocities are estimated from
    /// the last two positions
    pub fn bodies(&self) -> Vec<Body> {
        match self {
            ScenarioSimulation::Verlet(sim) => sim.integrator().bodies(),
            ScenarioSimulation::Euler(sim) => sim.integrator().bodies(),
        }
    }

    pub fn frame(&self) -> usize {
        match self {
            ScenarioSimulation::Verlet(sim) => sim.frame(),
            ScenarioSimulation::Euler(sim) => sim.frame(),
        }
    }

    pub fn time(&self) -> f64 {
        match self {
            ScenarioSimulation::Verlet(sim) => sim.integrator().time(),
            ScenarioSimulation::Euler(sim) => sim.integrator().time(),
        }
    }
}

fn vec3(a: [f64; 3]) -> NVec3 {
    NVec3::new(a[0], a[1], a[2])
}

fn node_from_config(node: NodeConfig) -> GravityNode {
    GravityNode {
        mass: node.mass,
        period: node.period,
        eccentricity: node.eccentricity,
        satellites: node.satellites.into_iter().map(node_from_config).collect(),
    }
}

fn build_bodies(system: SystemConfig, g: f64, rng: &mut StdRng) -> SimResult<Vec<Body>> {
    let origin = Barycenter::origin();
    let bodies = match system {
        SystemConfig::Bodies { bodies } => {
            let bodies: Vec<Body> = bodies
                .into_iter()
                .map(|bc| Body::new(bc.m, vec3(bc.x), vec3(bc.v)))
                .collect();
            let p = total_momentum(&bodies);
            if p.norm() > 1e-9 {
                warn!(px = p.x, py = p.y, pz = p.z, "explicit bodies carry net momentum");
            }
            bodies
        }
        SystemConfig::TwoBody {
            m1,
            m2,
            period,
            eccentricity,
        } => {
            let orientation = OrbitOrientation::random(rng)?;
            let (b1, b2) =
                resting_two_body_system(g, m1, m2, Orbit::new(period, eccentricity), &orientation)?;
            vec![b1, b2]
        }
        SystemConfig::SolarSystem { sun_mass, planets } => {
            let planets: Vec<PlanetSpec> = planets
                .into_iter()
                .map(|p| PlanetSpec {
                    mass: p.mass,
                    orbit: Orbit::new(p.period, p.eccentricity),
                })
                .collect();
            build_a_solar_system(g, sun_mass, &planets, &origin, rng)?
        }
        SystemConfig::RandomSolarSystem {
            sun_mass,
            count,
            mass,
            period,
            eccentricity,
        } => {
            let ranges = SolarSystemRanges {
                count,
                mass: mass[0]..mass[1],
                period: period[0]..period[1],
                eccentricity: eccentricity[0]..eccentricity[1],
            };
            simulate_a_solar_system(g, sun_mass, &ranges, &origin, rng)?
        }
        SystemConfig::Hierarchy { root } => node_from_config(root).build_planets(g, &origin, rng)?,
        SystemConfig::RandomHierarchy {
            mass,
            period,
            eccentricity,
            satellites,
            depth,
        } => {
            let node = random_gravity_node(
                rng,
                mass,
                period,
                &(eccentricity[0]..eccentricity[1]),
                &(satellites[0]..satellites[1]),
                depth,
            )?;
            node.build_planets(g, &origin, rng)?
        }
        SystemConfig::SunEarthMoon => sun_earth_moon(g, rng)?,
        SystemConfig::Circle { count, radius } => generate_circle_of_planets(g, count, radius)?,
    };
    debug!(bodies = bodies.len(), "initial bodies built");
    Ok(bodies)
}

fn build_pairs(pairs: PairsConfig, n: usize) -> SimResult<Vec<ForcePair>> {
    let pairs = match pairs {
        PairsConfig::All => force_pairs(n),
        PairsConfig::Strand => single_strand(n),
        PairsConfig::Ring => ring_strand(n),
        PairsConfig::RingCenter => ring_with_center(n),
        PairsConfig::Mesh { width, height, rest } => rectangular_mesh(width, height, rest),
        PairsConfig::MeshNext { width, height, rest } => {
            rectangular_mesh_next_nearest(width, height, rest)
        }
        PairsConfig::Explicit { pairs } => pairs.into_iter().map(|[i, j]| ForcePair::new(i, j)).collect(),
    };
    pairs.iter().try_for_each(|p| p.check(n))?;
    Ok(pairs)
}

fn build_force(force: ForceConfig, g: f64, n: usize) -> SimResult<ForceLaw> {
    let law = match force {
        ForceConfig::Gravity => ForceLaw::Gravity(NewtonianGravity::new(g, n)),
        ForceConfig::Spring {
            spring_constant,
            equilibrium_distance,
            driving,
            pairs,
        } => ForceLaw::Spring(
            HarmonicSpring::new(spring_constant, equilibrium_distance, build_pairs(pairs, n)?)
                .driven(vec3(driving)),
        ),
        ForceConfig::DampedSpring {
            spring_constant,
            equilibrium_distance,
            damping,
            driving,
            pairs,
        } => ForceLaw::DampedSpring(
            HarmonicSpring::new(spring_constant, equilibrium_distance, build_pairs(pairs, n)?)
                .driven(vec3(driving))
                .damped(damping),
        ),
        ForceConfig::Uniform { force } => ForceLaw::Uniform(UniformField { force: vec3(force) }),
    };
    Ok(law)
}
