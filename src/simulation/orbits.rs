//! Initial conditions from orbital parameters
//!
//! Every system here is assembled from bound two-body Kepler orbits. A pair
//! `(m1, m2)` with period `t` and eccentricity `e` is reduced to a single
//! body of mass μ = m1·m2/(m1+m2) moving in the central field γ/r², γ = G·m1·m2.
//! Kepler's third law fixes the angular momentum:
//!
//! ```text
//! L = m1·m2·(G²·t / (2π·M))^(1/3) / √(1 - e²)
//! ```
//!
//! and at true anomaly θ the relative position and velocity are
//!
//! ```text
//! r = (L² / (μ·γ)) / (1 + e·cos θ) · r̂
//! v = (γ / L) · (e·sin θ · r̂ + (1 + e·cos θ) · θ̂)
//! ```
//!
//! The relative motion is split back onto the two bodies in proportion
//! μ/m1 and -μ/m2, which keeps the pair's center of mass on the barycenter
//! and its total momentum at M·v_bary.
//!
//! Builders that return a star with its planets always put the star **last**
//! in the list.
//!
//! Randomness comes only from the `rng` argument; seed it for reproducible
//! systems. Each orbital pair gets its own independent orientation and
//! anomaly.

use rand::Rng;
use std::f64::consts::{PI, TAU};
use std::ops::Range;
use tracing::debug;

use crate::error::{SimError, SimResult};
use crate::simulation::states::{Body, NVec3};
use crate::simulation::vector::{random_angle, random_direction, unit};

/// Orientation of an orbit: radial direction r̂, in-plane tangent θ̂ and
/// true anomaly θ
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitOrientation {
    pub r_hat: NVec3,
    pub theta_hat: NVec3,
    pub theta: f64,
}

impl OrbitOrientation {
    /// Normalizes both directions; θ̂ is taken as given, so pass one
    /// orthogonal to r̂
    pub fn new(r_hat: NVec3, theta_hat: NVec3, theta: f64) -> SimResult<Self> {
        Ok(Self {
            r_hat: unit(&r_hat)?,
            theta_hat: unit(&theta_hat)?,
            theta,
        })
    }

    /// Random orbital plane and anomaly. θ̂ is r̂ crossed with a second random
    /// direction
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> SimResult<Self> {
        let r_hat = random_direction(rng)?;
        let theta_hat = unit(&r_hat.cross(&random_direction(rng)?))?;
        Ok(Self {
            r_hat,
            theta_hat,
            theta: random_angle(rng),
        })
    }
}

/// Period and eccentricity of a bound orbit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orbit {
    pub period: f64,
    pub eccentricity: f64,
}

impl Orbit {
    pub fn new(period: f64, eccentricity: f64) -> Self {
        Self { period, eccentricity }
    }

    pub fn circular(period: f64) -> Self {
        Self::new(period, 0.0)
    }

    pub fn validate(&self) -> SimResult<()> {
        if !(self.period > 0.0 && self.period.is_finite()) {
            return Err(SimError::NonPositivePeriod(self.period));
        }
        if !(0.0..1.0).contains(&self.eccentricity) {
            return Err(SimError::InvalidEccentricity(self.eccentricity));
        }
        Ok(())
    }
}

/// Position and velocity of a (sub)system's center of mass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Barycenter {
    pub x: NVec3,
    pub v: NVec3,
}

impl Barycenter {
    pub fn new(x: NVec3, v: NVec3) -> Self {
        Self { x, v }
    }

    pub fn origin() -> Self {
        Self::new(NVec3::zeros(), NVec3::zeros())
    }
}

impl Default for Barycenter {
    fn default() -> Self {
        Self::origin()
    }
}

fn check_mass(index: usize, mass: f64) -> SimResult<()> {
    if mass > 0.0 && mass.is_finite() {
        Ok(())
    } else {
        Err(SimError::NonPositiveMass { index, mass })
    }
}

/// G must be positive and finite; anything else yields NaN orbits
pub fn check_gravity(g: f64) -> SimResult<()> {
    if g > 0.0 && g.is_finite() {
        Ok(())
    } else {
        Err(SimError::InvalidConfig(format!(
            "gravitational constant must be positive, got {g}"
        )))
    }
}

/// Reject reversed ranges. `start == end` is a fixed value, not an error
fn check_range(name: &str, range: &Range<f64>) -> SimResult<()> {
    if range.start <= range.end {
        Ok(())
    } else {
        Err(SimError::InvalidConfig(format!(
            "{name} range {range:?} is reversed"
        )))
    }
}

/// Relative position and velocity (r, v) of the reduced one-body problem
pub fn central_force_position_velocity(
    g: f64,
    m1: f64,
    m2: f64,
    orbit: Orbit,
    orientation: &OrbitOrientation,
) -> SimResult<(NVec3, NVec3)> {
    check_gravity(g)?;
    check_mass(0, m1)?;
    check_mass(1, m2)?;
    orbit.validate()?;

    let Orbit { period: t, eccentricity: e } = orbit;
    let OrbitOrientation { r_hat, theta_hat, theta } = *orientation;

    let mu = m1 * m2 / (m1 + m2);
    let m = m1 + m2;
    let gamma = g * m1 * m2;

    let l = m1 * m2 * (g * g * t / (2.0 * PI * m)).powf(1.0 / 3.0) / (1.0 - e * e).sqrt();

    let (sin, cos) = theta.sin_cos();
    let r = (l * l / (mu * gamma)) / (1.0 + e * cos) * r_hat;
    let v = (gamma / l) * (e * sin * r_hat + (1.0 + e * cos) * theta_hat);
    Ok((r, v))
}

/// Two bodies on a bound orbit around `barycenter`. Returns `(b1, b2)` with
/// masses `m1` and `m2`
pub fn two_body_system(
    g: f64,
    m1: f64,
    m2: f64,
    orbit: Orbit,
    barycenter: &Barycenter,
    orientation: &OrbitOrientation,
) -> SimResult<(Body, Body)> {
    let (r, v) = central_force_position_velocity(g, m1, m2, orbit, orientation)?;
    let mu = m1 * m2 / (m1 + m2);

    let b1 = Body::new(m1, barycenter.x + mu / m1 * r, barycenter.v + mu / m1 * v);
    let b2 = Body::new(m2, barycenter.x - mu / m2 * r, barycenter.v - mu / m2 * v);
    Ok((b1, b2))
}

/// [`two_body_system`] around a barycenter resting at the origin
pub fn resting_two_body_system(
    g: f64,
    m1: f64,
    m2: f64,
    orbit: Orbit,
    orientation: &OrbitOrientation,
) -> SimResult<(Body, Body)> {
    two_body_system(g, m1, m2, orbit, &Barycenter::origin(), orientation)
}

// =========================================================================================
// Flat systems
// =========================================================================================

/// Mass and orbit of one planet around a single star
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanetSpec {
    pub mass: f64,
    pub orbit: Orbit,
}

/// One star with independent planets, no moons. Each planet is its own
/// two-body split against the star; the star collects every reaction.
/// The star is the last element.
pub fn build_a_solar_system<R: Rng + ?Sized>(
    g: f64,
    sun_mass: f64,
    planets: &[PlanetSpec],
    barycenter: &Barycenter,
    rng: &mut R,
) -> SimResult<Vec<Body>> {
    check_mass(planets.len(), sun_mass)?;

    let mut sun = Body::new(sun_mass, barycenter.x, barycenter.v);
    let mut bodies = Vec::with_capacity(planets.len() + 1);
    for (index, spec) in planets.iter().enumerate() {
        check_mass(index, spec.mass)?;
        let orientation = OrbitOrientation::random(rng)?;
        let (fict_sun, mut planet) =
            resting_two_body_system(g, sun_mass, spec.mass, spec.orbit, &orientation)?;
        planet.x += barycenter.x;
        planet.v += barycenter.v;
        bodies.push(planet);
        sun.x += fict_sun.x;
        sun.v += fict_sun.v;
    }
    bodies.push(sun);
    Ok(bodies)
}

/// Ranges for a randomized flat solar system
#[derive(Debug, Clone, PartialEq)]
pub struct SolarSystemRanges {
    pub count: usize,
    pub mass: Range<f64>,
    pub period: Range<f64>,
    pub eccentricity: Range<f64>,
}

impl Default for SolarSystemRanges {
    fn default() -> Self {
        Self {
            count: 10,
            mass: 1.0..20.0,
            period: 1.0..20.0,
            eccentricity: 0.0..0.8,
        }
    }
}

// uniform draw; a degenerate range (start == end) yields its start
fn uniform<R: Rng + ?Sized>(rng: &mut R, range: &Range<f64>) -> f64 {
    if range.end > range.start {
        rng.gen_range(range.clone())
    } else {
        range.start
    }
}

/// [`build_a_solar_system`] with planet mass, period and eccentricity each
/// drawn uniformly from `ranges`
pub fn simulate_a_solar_system<R: Rng + ?Sized>(
    g: f64,
    sun_mass: f64,
    ranges: &SolarSystemRanges,
    barycenter: &Barycenter,
    rng: &mut R,
) -> SimResult<Vec<Body>> {
    check_range("mass", &ranges.mass)?;
    check_range("period", &ranges.period)?;
    check_range("eccentricity", &ranges.eccentricity)?;
    let planets: Vec<PlanetSpec> = (0..ranges.count)
        .map(|_| PlanetSpec {
            mass: uniform(rng, &ranges.mass),
            orbit: Orbit::new(uniform(rng, &ranges.period), uniform(rng, &ranges.eccentricity)),
        })
        .collect();
    build_a_solar_system(g, sun_mass, &planets, barycenter, rng)
}

/// Sun, earth and moon with masses 50, 50 and 5, earth period 5 and moon
/// period 0.5, all circular. The earth–moon pair is split off the sun first,
/// then split again around its own barycenter.
///
/// Returned in the order `[sun, earth, moon]`.
pub fn sun_earth_moon<R: Rng + ?Sized>(g: f64, rng: &mut R) -> SimResult<Vec<Body>> {
    let m_sun = 50.0;
    let m_earth = 50.0;
    let m_moon = 5.0;

    let (sun, earth_moon) = two_body_system(
        g,
        m_sun,
        m_earth + m_moon,
        Orbit::circular(5.0),
        &Barycenter::origin(),
        &OrbitOrientation::random(rng)?,
    )?;
    let (earth, moon) = two_body_system(
        g,
        m_earth,
        m_moon,
        Orbit::circular(0.5),
        &Barycenter::new(earth_moon.x, earth_moon.v),
        &OrbitOrientation::random(rng)?,
    )?;
    Ok(vec![sun, earth, moon])
}

/// `n` bodies of mass 0.1 evenly spaced on a circle of `radius` in the
/// xy-plane, each moving tangentially at the speed that makes the pull of
/// the others exactly centripetal
pub fn generate_circle_of_planets(g: f64, n: usize, radius: f64) -> SimResult<Vec<Body>> {
    check_gravity(g)?;
    if n < 2 {
        return Err(SimError::InvalidConfig(format!(
            "a circle of planets needs at least 2 bodies, got {n}"
        )));
    }
    if !(radius > 0.0) {
        return Err(SimError::InvalidConfig(format!("circle radius must be positive, got {radius}")));
    }
    let m = 0.1;
    let normal = NVec3::z();
    let positions: Vec<NVec3> = (0..n)
        .map(|i| {
            let angle = i as f64 * TAU / n as f64;
            radius * NVec3::new(angle.cos(), angle.sin(), 0.0)
        })
        .collect();

    let reference = positions[n - 1];
    let pull: NVec3 = positions[..n - 1]
        .iter()
        .map(|pos| {
            let d = reference - pos;
            d / d.norm().powi(3)
        })
        .sum();
    let speed = (g * m * pull.dot(&reference)).sqrt();

    positions
        .into_iter()
        .map(|x| -> SimResult<Body> { Ok(Body::new(m, x, speed * unit(&normal.cross(&x))?)) })
        .collect()
}

// =========================================================================================
// Hierarchical systems
// =========================================================================================

/// Node of an orbital tree: a body with its satellites. `period` and
/// `eccentricity` describe the orbit of this node's whole subtree around
/// its parent and are ignored on the root.
#[derive(Debug, Clone, PartialEq)]
pub struct GravityNode {
    pub mass: f64,
    pub satellites: Vec<GravityNode>,
    pub period: f64,
    pub eccentricity: f64,
}

impl GravityNode {
    /// Childless node
    pub fn leaf(mass: f64, period: f64, eccentricity: f64) -> Self {
        Self {
            mass,
            satellites: Vec::new(),
            period,
            eccentricity,
        }
    }

    pub fn with_satellite(mut self, satellite: GravityNode) -> Self {
        self.satellites.push(satellite);
        self
    }

    /// Own mass plus the total mass of every satellite subtree
    pub fn total_mass(&self) -> f64 {
        self.mass + self.satellites.iter().map(GravityNode::total_mass).sum::<f64>()
    }

    /// Number of bodies the tree expands into
    pub fn body_count(&self) -> usize {
        1 + self.satellites.iter().map(GravityNode::body_count).sum::<usize>()
    }

    /// Flatten the tree into bodies around `barycenter`.
    ///
    /// Each satellite subtree is treated as one body of its total mass in a
    /// two-body split against this node. The subtree is then built around
    /// the barycenter that split produced, and this node absorbs the
    /// reaction (the fictitious sun). Descendants come first, in satellite
    /// order and depth first; this node's own body is always the **last**
    /// element.
    pub fn build_planets<R: Rng + ?Sized>(
        self,
        g: f64,
        barycenter: &Barycenter,
        rng: &mut R,
    ) -> SimResult<Vec<Body>> {
        let mut bodies = Vec::with_capacity(self.body_count());
        self.build_into(g, barycenter, rng, &mut bodies)?;
        debug!(bodies = bodies.len(), "built hierarchical system");
        Ok(bodies)
    }

    fn build_into<R: Rng + ?Sized>(
        self,
        g: f64,
        barycenter: &Barycenter,
        rng: &mut R,
        out: &mut Vec<Body>,
    ) -> SimResult<()> {
        check_mass(out.len(), self.mass)?;

        let mut sun = Body::new(self.mass, barycenter.x, barycenter.v);
        for satellite in self.satellites {
            let orbit = Orbit::new(satellite.period, satellite.eccentricity);
            let orientation = OrbitOrientation::random(rng)?;
            let (fict_sun, sub_center) = resting_two_body_system(
                g,
                self.mass,
                satellite.total_mass(),
                orbit,
                &orientation,
            )?;
            let sub_barycenter = Barycenter::new(barycenter.x + sub_center.x, barycenter.v + sub_center.v);
            satellite.build_into(g, &sub_barycenter, rng, out)?;
            sun.x += fict_sun.x;
            sun.v += fict_sun.v;
        }
        out.push(sun);
        Ok(())
    }
}

/// `n` positive parts summing to `total`, drawn with uniform random weights
pub fn random_distribution_averaging_to<R: Rng + ?Sized>(
    rng: &mut R,
    total: f64,
    n: usize,
) -> SimResult<Vec<f64>> {
    if n == 0 {
        return Err(SimError::EmptyDistribution { total });
    }
    // 1 - [0, 1) keeps every weight strictly positive
    let weights: Vec<f64> = (0..n).map(|_| 1.0 - rng.gen::<f64>()).collect();
    let sum: f64 = weights.iter().sum();
    Ok(weights.into_iter().map(|w| w * total / sum).collect())
}

/// Random orbital tree.
///
/// The node keeps 90% of `mass` and 40% of `period` for itself. The
/// remainder is split among `satellites` children (drawn from the
/// half-open range) by [`random_distribution_averaging_to`], and each child
/// recurses with one less level of depth. At `remaining_depth == 0` the node
/// is a leaf. Eccentricity is drawn per node from `eccentricity`.
pub fn random_gravity_node<R: Rng + ?Sized>(
    rng: &mut R,
    mass: f64,
    period: f64,
    eccentricity: &Range<f64>,
    satellites: &Range<usize>,
    remaining_depth: usize,
) -> SimResult<GravityNode> {
    check_mass(0, mass)?;
    if eccentricity.start < 0.0
        || eccentricity.start >= 1.0
        || eccentricity.end > 1.0
        || eccentricity.start > eccentricity.end
    {
        return Err(SimError::InvalidConfig(format!(
            "eccentricity range {eccentricity:?} must lie within [0, 1)"
        )));
    }

    let own_mass = mass * 0.90;
    let own_period = period * 0.40;

    let mut children = Vec::new();
    if remaining_depth > 0 {
        if satellites.start == 0 || satellites.is_empty() {
            return Err(SimError::InvalidConfig(format!(
                "satellite count range {satellites:?} must be non-empty and exclude zero"
            )));
        }
        let number = rng.gen_range(satellites.clone());
        let masses = random_distribution_averaging_to(rng, mass - own_mass, number)?;
        let periods = random_distribution_averaging_to(rng, period - own_period, number)?;
        for (m, t) in masses.into_iter().zip(periods) {
            children.push(random_gravity_node(rng, m, t, eccentricity, satellites, remaining_depth - 1)?);
        }
    }

    Ok(GravityNode {
        mass: own_mass,
        satellites: children,
        period: own_period,
        eccentricity: uniform(rng, eccentricity),
    })
}

/// Sun (2000) with an earth (1, period 50) that has a moon (0.01, period 50/12)
pub fn sun_earth_moon_node() -> GravityNode {
    let t_earth = 50.0;
    let moon = GravityNode::leaf(0.01, t_earth / 12.0, 0.0);
    let earth = GravityNode::leaf(1.0, t_earth, 0.0).with_satellite(moon);
    GravityNode::leaf(2000.0, 0.0, 0.0).with_satellite(earth)
}
