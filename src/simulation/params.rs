//! Numerical and physical parameters for the simulation
//!
//! `Parameters` holds runtime settings:
//! - gravitational constant `g`,
//! - integration step size `dt`,
//! - random seed for generated initial conditions (`None` draws one)

#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub g: f64, // gravitational constant
    pub dt: f64, // step size
    pub seed: Option<u64>, // deterministic seed
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            g: 1.0,
            dt: 0.001,
            seed: None,
        }
    }
}
