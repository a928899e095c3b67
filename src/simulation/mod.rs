pub mod vector;
pub mod states;
pub mod pairs;
pub mod params;
pub mod engine;
pub mod forces;
pub mod integrator;
pub mod driver;
pub mod orbits;
pub mod diagnostics;
pub mod scenario;
