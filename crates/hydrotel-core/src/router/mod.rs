/// Flow router.
///
/// Convolves each zone's per-timestep production against its precomputed
/// unit-hydrograph ordinates through rolling FIFO accumulators and emits
/// the head slot as lateral inflow to the channel network.
pub mod run;
pub mod state;
