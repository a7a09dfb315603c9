pub mod error;
pub mod geometry;
pub mod lru;
pub mod simulation;
pub mod stats;
pub mod trace;

pub use error::Error;

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
use wasm_bindgen::prelude::*;

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
#[wasm_bindgen]
pub fn run_simulation(
    trace: &str,
    size: Option<u32>,
    associativity: Option<u32>,
    line_size: Option<u32>,
) -> String {
    use geometry::GeometryParams;
    use simulation::Simulation;
    use trace::AddressTrace;

    let params = GeometryParams {
        size: size.map(|size| size as usize),
        associativity: associativity.map(|associativity| associativity as usize),
        line_size: line_size.map(|line_size| line_size as usize),
        levels: None,
    };

    let mut simulation = match Simulation::new(params) {
        Ok(simulation) => simulation,
        Err(e) => return e.to_string(),
    };
    let trace = match AddressTrace::try_from(trace) {
        Ok(trace) => trace,
        Err(e) => return Error::from(e).to_string(),
    };

    let stats = simulation.run(trace);
    [simulation.geometry().to_string(), stats.to_string()].join("\n\n")
}
