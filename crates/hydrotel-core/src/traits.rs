/// Interfaces between the engine's interchangeable pieces.
///
/// The balance and routing sub-models are strategy seams: concrete variants
/// implement `VerticalBalanceModel` / `RoutingModel` and the simulation is
/// generic over them. Checkpointable per-zone state implements `ZoneState`.
use crate::bv3c::fluxes::Fluxes;
use crate::error::Result;
use crate::hydrograph::precompute::UnitHydrographs;
use crate::router::run::LateralInflow;
use crate::soil::SoilTable;
use crate::zone::{Zone, ZoneForcing};

/// A vertical soil-moisture balance variant.
pub trait VerticalBalanceModel {
    type Params;
    type State: ZoneState;

    /// Validate configuration and build the initial moisture state.
    fn initialise(params: &Self::Params, soils: &SoilTable, zones: &[Zone]) -> Result<Self::State>;

    /// Advance every zone by one external timestep, returning per-zone
    /// production fluxes.
    fn step(
        params: &Self::Params,
        soils: &SoilTable,
        zones: &[Zone],
        state: &mut Self::State,
        forcing: &[ZoneForcing],
        timestep_s: f64,
    ) -> Vec<Fluxes>;
}

/// A surface-routing variant converting production into lateral inflow.
pub trait RoutingModel {
    type State: ZoneState;

    /// Allocate rolling state sized to the global lag count.
    fn initialise(zones: &[Zone], n_lags: usize) -> Self::State;

    /// Route one timestep of production, emitting lateral inflow to the
    /// channel network and returning per-zone outflow contributions.
    fn step(
        state: &mut Self::State,
        zones: &[Zone],
        hydrographs: &UnitHydrographs,
        production: &[Fluxes],
        timestep_s: f64,
        network: &mut dyn ReachNetwork,
    ) -> Vec<LateralInflow>;
}

/// Per-zone state that round-trips through checkpoint rows.
pub trait ZoneState: Sized {
    /// Number of values in one zone's row.
    fn row_len(&self) -> usize;

    /// Number of zones carried.
    fn n_zones(&self) -> usize;

    /// Snapshot one zone's values.
    fn zone_row(&self, index: usize) -> Vec<f64>;

    /// Overwrite one zone's values from a checkpoint row.
    fn restore_zone_row(&mut self, index: usize, row: &[f64]) -> Result<()>;
}

/// Downstream channel network: the external collaborator that receives
/// lateral inflow. Channel routing itself happens elsewhere.
pub trait ReachNetwork {
    /// Add `flow` [m³/s] of lateral inflow to reach `reach` for the current
    /// timestep.
    fn add_lateral_inflow(&mut self, reach: u32, flow: f64);
}

/// Sink that drops all lateral inflow; for demos and tests that only look
/// at per-zone outputs.
#[derive(Debug, Default)]
pub struct DiscardInflow;

impl ReachNetwork for DiscardInflow {
    fn add_lateral_inflow(&mut self, _reach: u32, _flow: f64) {}
}
