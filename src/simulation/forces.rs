//! Force contributors for the n-body engine
//!
//! Force laws come in two capabilities:
//! - [`ConservativeForce`]: depends on positions (and masses) only. Safe for
//!   every integrator, including Verlet which keeps no velocity state.
//! - [`DissipativeForce`]: also reads velocities. Only the Euler integrator
//!   accepts these; the Verlet integrator's force set has no slot for them.
//!
//! Laws write *forces* into the output buffer. The integrator divides by
//! mass once after every law has contributed.

use tracing::debug;

use crate::error::{SimError, SimResult};
use crate::simulation::pairs::force_pairs;
use crate::simulation::states::{ForcePair, NVec3};
use crate::simulation::vector::unit;

/// Force law that depends only on position. Implementations add their
/// contribution into `out[i]` for each body
pub trait ConservativeForce {
    fn name(&self) -> &'static str;

    fn accumulate_forces(&self, x: &[NVec3], m: &[f64], out: &mut [NVec3]) -> SimResult<()>;

    /// Check the law against a system of `n` bodies before any step runs
    fn validate(&self, _n: usize) -> SimResult<()> {
        Ok(())
    }
}

/// Force law that depends on position and velocity
pub trait DissipativeForce {
    fn name(&self) -> &'static str;

    fn accumulate_forces(
        &self,
        x: &[NVec3],
        v: &[NVec3],
        m: &[f64],
        out: &mut [NVec3],
    ) -> SimResult<()>;

    fn validate(&self, _n: usize) -> SimResult<()> {
        Ok(())
    }
}

fn validate_pairs(pairs: &[ForcePair], n: usize) -> SimResult<()> {
    pairs.iter().try_for_each(|p| p.check(n))
}

// =========================================================================================
// Newtonian gravity
// =========================================================================================

/// Newtonian gravity over a set of force pairs, no softening.
/// Coincident bodies are an error, not a clamp.
#[derive(Debug, Clone)]
pub struct NewtonianGravity {
    pub g: f64, // gravitational constant
    pub pairs: Vec<ForcePair>,
}

impl NewtonianGravity {
    /// Gravity between every unique pair of `n` bodies
    pub fn new(g: f64, n: usize) -> Self {
        Self::with_pairs(g, force_pairs(n))
    }

    pub fn with_pairs(g: f64, pairs: Vec<ForcePair>) -> Self {
        Self { g, pairs }
    }

    /// Force on `i` from `j`: G·mi·mj·(xj - xi) / |xj - xi|³
    pub fn force_on_from(&self, pair: ForcePair, x: &[NVec3], m: &[f64]) -> SimResult<NVec3> {
        let ForcePair { i, j } = pair;
        let r = x[j] - x[i];
        let r2 = r.norm_squared();
        if r2 == 0.0 {
            return Err(SimError::CoincidentBodies { i, j });
        }
        let inv_r3 = (r2 * r2.sqrt()).recip();
        Ok(self.g * m[i] * m[j] * inv_r3 * r)
    }
}

impl ConservativeForce for NewtonianGravity {
    fn name(&self) -> &'static str {
        "gravity"
    }

    fn accumulate_forces(&self, x: &[NVec3], m: &[f64], out: &mut [NVec3]) -> SimResult<()> {
        for &pair in &self.pairs {
            let f = self.force_on_from(pair, x, m)?;
            out[pair.i] += f;
            out[pair.j] -= f;
        }
        Ok(())
    }

    fn validate(&self, n: usize) -> SimResult<()> {
        validate_pairs(&self.pairs, n)
    }
}

// =========================================================================================
// Harmonic springs
// =========================================================================================

/// Hooke's-law spring between force pairs, with an optional constant
/// driving term. Neither term reads velocity, so this law is conservative.
///
/// Force on `i` from `j`:
/// `D + k·(|xj - xi| - L0)·unit(xj - xi)`
///
/// Add damping with [`HarmonicSpring::damped`], which turns it into a
/// [`DampedSpring`].
#[derive(Debug, Clone)]
pub struct HarmonicSpring {
    pub spring_constant: f64, // k
    pub equilibrium_distance: f64, // L0
    pub driving: NVec3, // D, zero for an undriven spring
    pub pairs: Vec<ForcePair>,
}

impl HarmonicSpring {
    pub fn new(spring_constant: f64, equilibrium_distance: f64, pairs: Vec<ForcePair>) -> Self {
        Self {
            spring_constant,
            equilibrium_distance,
            driving: NVec3::zeros(),
            pairs,
        }
    }

    /// Add a constant driving term, applied to `i` and reacted on `j`
    pub fn driven(mut self, driving: NVec3) -> Self {
        self.driving = driving;
        self
    }

    /// Add a damping term `-c·(vi - vj)`. The result needs velocities.
    pub fn damped(self, damping: f64) -> DampedSpring {
        DampedSpring { spring: self, damping }
    }

    fn elastic_force(&self, pair: ForcePair, x: &[NVec3]) -> SimResult<NVec3> {
        let ForcePair { i, j } = pair;
        let r = x[j] - x[i];
        let direction = unit(&r).map_err(|_| SimError::CoincidentBodies { i, j })?;
        let extension = r.norm() - self.equilibrium_distance;
        Ok(self.driving + self.spring_constant * extension * direction)
    }
}

impl ConservativeForce for HarmonicSpring {
    fn name(&self) -> &'static str {
        "spring"
    }

    fn accumulate_forces(&self, x: &[NVec3], _m: &[f64], out: &mut [NVec3]) -> SimResult<()> {
        for &pair in &self.pairs {
            let f = self.elastic_force(pair, x)?;
            out[pair.i] += f;
            out[pair.j] -= f;
        }
        Ok(())
    }

    fn validate(&self, n: usize) -> SimResult<()> {
        validate_pairs(&self.pairs, n)
    }
}

/// [`HarmonicSpring`] with a velocity damping term
#[derive(Debug, Clone)]
pub struct DampedSpring {
    pub spring: HarmonicSpring,
    pub damping: f64, // c
}

impl DampedSpring {
    /// Force on `i` from `j`, spring term minus `c·(vi - vj)`
    pub fn force_on_from(&self, pair: ForcePair, x: &[NVec3], v: &[NVec3]) -> SimResult<NVec3> {
        let elastic = self.spring.elastic_force(pair, x)?;
        Ok(elastic - self.damping * (v[pair.i] - v[pair.j]))
    }
}

impl DissipativeForce for DampedSpring {
    fn name(&self) -> &'static str {
        "damped_spring"
    }

    fn accumulate_forces(
        &self,
        x: &[NVec3],
        v: &[NVec3],
        _m: &[f64],
        out: &mut [NVec3],
    ) -> SimResult<()> {
        for &pair in &self.spring.pairs {
            let f = self.force_on_from(pair, x, v)?;
            out[pair.i] += f;
            out[pair.j] -= f;
        }
        Ok(())
    }

    fn validate(&self, n: usize) -> SimResult<()> {
        validate_pairs(&self.spring.pairs, n)
    }
}

// =========================================================================================
// Uniform field
// =========================================================================================

/// Same force on every body, independent of pairing
#[derive(Debug, Clone)]
pub struct UniformField {
    pub force: NVec3,
}

impl ConservativeForce for UniformField {
    fn name(&self) -> &'static str {
        "uniform"
    }

    fn accumulate_forces(&self, _x: &[NVec3], _m: &[f64], out: &mut [NVec3]) -> SimResult<()> {
        for f in out.iter_mut() {
            *f += self.force;
        }
        Ok(())
    }
}

// =========================================================================================
// Force law selection
// =========================================================================================

/// Every force law the engine knows, for callers that pick laws at runtime
/// (e.g. from a scenario file)
#[derive(Debug, Clone)]
pub enum ForceLaw {
    Gravity(NewtonianGravity),
    Spring(HarmonicSpring),
    DampedSpring(DampedSpring),
    Uniform(UniformField),
}

impl ForceLaw {
    pub fn name(&self) -> &'static str {
        match self {
            ForceLaw::Gravity(law) => law.name(),
            ForceLaw::Spring(law) => law.name(),
            ForceLaw::DampedSpring(law) => DissipativeForce::name(law),
            ForceLaw::Uniform(law) => law.name(),
        }
    }

    pub fn is_conservative(&self) -> bool {
        !matches!(self, ForceLaw::DampedSpring(_))
    }
}

// =========================================================================================
// Force sets
// =========================================================================================

/// Collection of position-only force terms, the only kind the Verlet
/// integrator accepts. Contributions are summed per body
#[derive(Default)]
pub struct ConservativeSet {
    terms: Vec<Box<dyn ConservativeForce + Send + Sync>>,
}

impl ConservativeSet {
    /// Create an empty force set
    pub fn new() -> Self {
        Self { terms: Vec::new() }
    }

    /// Add a force term
    pub fn with<T>(mut self, term: T) -> Self
    where
        T: ConservativeForce + Send + Sync + 'static,
    {
        self.terms.push(Box::new(term));
        self
    }

    /// Add a runtime-selected law. Velocity-dependent laws are refused
    pub fn try_with_law(self, law: ForceLaw) -> SimResult<Self> {
        match law {
            ForceLaw::Gravity(term) => Ok(self.with(term)),
            ForceLaw::Spring(term) => Ok(self.with(term)),
            ForceLaw::Uniform(term) => Ok(self.with(term)),
            ForceLaw::DampedSpring(term) => Err(SimError::VelocityDependentLaw(
                DissipativeForce::name(&term).to_string(),
            )),
        }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn validate(&self, n: usize) -> SimResult<()> {
        self.terms.iter().try_for_each(|term| term.validate(n))
    }

    /// Zero `out`, then sum every term's force on each body
    pub fn accumulate_forces(&self, x: &[NVec3], m: &[f64], out: &mut [NVec3]) -> SimResult<()> {
        out.fill(NVec3::zeros());
        for term in &self.terms {
            term.accumulate_forces(x, m, out)?;
        }
        Ok(())
    }
}

/// Collection of conservative and dissipative force terms, for integrators
/// that carry explicit velocities
#[derive(Default)]
pub struct ForceSet {
    conservative: ConservativeSet,
    dissipative: Vec<Box<dyn DissipativeForce + Send + Sync>>,
}

impl ForceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a position-only term
    pub fn with<T>(mut self, term: T) -> Self
    where
        T: ConservativeForce + Send + Sync + 'static,
    {
        self.conservative = self.conservative.with(term);
        self
    }

    /// Add a velocity-dependent term
    pub fn with_dissipative<T>(mut self, term: T) -> Self
    where
        T: DissipativeForce + Send + Sync + 'static,
    {
        self.dissipative.push(Box::new(term));
        self
    }

    /// Add a runtime-selected law; every variant is accepted here
    pub fn with_law(self, law: ForceLaw) -> Self {
        match law {
            ForceLaw::Gravity(term) => self.with(term),
            ForceLaw::Spring(term) => self.with(term),
            ForceLaw::Uniform(term) => self.with(term),
            ForceLaw::DampedSpring(term) => self.with_dissipative(term),
        }
    }

    pub fn len(&self) -> usize {
        self.conservative.len() + self.dissipative.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn validate(&self, n: usize) -> SimResult<()> {
        self.conservative.validate(n)?;
        self.dissipative.iter().try_for_each(|term| term.validate(n))
    }

    /// Zero `out`, then sum every term's force on each body
    pub fn accumulate_forces(
        &self,
        x: &[NVec3],
        v: &[NVec3],
        m: &[f64],
        out: &mut [NVec3],
    ) -> SimResult<()> {
        self.conservative.accumulate_forces(x, m, out)?;
        for term in &self.dissipative {
            term.accumulate_forces(x, v, m, out)?;
        }
        Ok(())
    }
}

impl From<ConservativeSet> for ForceSet {
    fn from(conservative: ConservativeSet) -> Self {
        debug!(terms = conservative.len(), "promoting conservative force set");
        Self {
            conservative,
            dissipative: Vec::new(),
        }
    }
}
