/// hydrotel-core — distributed watershed water-transport engine in Rust.
///
/// A port of the HYDROTEL water-transport core: the BV3C three-layer
/// vertical soil-moisture balance and the kinematic-wave unit-hydrograph
/// routing that turns per-catchment production into time-lagged lateral
/// inflow to the channel network.
pub mod bv3c;
pub mod checkpoint;
pub mod error;
pub mod hydrograph;
pub mod router;
pub mod simulation;
pub mod soil;
pub mod traits;
pub mod zone;

pub use error::{Error, Result};
pub use simulation::Simulation;
