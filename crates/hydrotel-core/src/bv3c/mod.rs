/// BV3C three-layer vertical soil-moisture balance.
///
/// Splits each external timestep into stability-bounded internal substeps,
/// moves water between layers by Darcy fluxes on the Brooks-Corey curves,
/// and partitions the result into surface, hypodermic and base production.
pub mod constants;
pub mod fluxes;
pub mod params;
pub mod processes;
pub mod run;
pub mod state;
pub mod substep;
