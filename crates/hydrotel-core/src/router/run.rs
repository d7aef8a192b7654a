/// Router timestep.
///
/// For each zone and channel: scale the zone's ordinates by the current
/// production, add into the rolling accumulator, emit the head slot as this
/// timestep's lateral inflow, then shift the accumulator left by one slot.
/// The router keeps no other memory: the accumulator alone encodes "volume
/// scheduled to arrive k steps from now". Lake zones bypass convolution.
use super::state::{Channel, RouterState};
use crate::bv3c::fluxes::Fluxes;
use crate::hydrograph::precompute::UnitHydrographs;
use crate::traits::{ReachNetwork, RoutingModel};
use crate::zone::{Zone, ZoneKind};

/// One zone's outflow contribution for the current timestep [m³/s].
#[derive(Debug, Clone, Copy, Default)]
pub struct LateralInflow {
    pub total: f64,
    pub surface: f64,
    pub hypodermic: f64,
    pub base: f64,
}

const CHANNELS: [Channel; 4] = [
    Channel::Total,
    Channel::Surface,
    Channel::Hypodermic,
    Channel::Base,
];

/// Production depth routed into each channel [mm].
fn channel_production(fluxes: &Fluxes) -> [f64; 4] {
    let total = fluxes.prod_surf + fluxes.prod_hypo + fluxes.prod_base;
    [total, fluxes.prod_surf, fluxes.prod_hypo, fluxes.prod_base]
}

/// Convert an arriving depth [mm over the zone] into a flow rate [m³/s].
fn depth_to_flow(depth_mm: f64, area: f64, timestep: f64) -> f64 {
    depth_mm / 1000.0 * area / timestep
}

/// Route one timestep of production for every zone.
pub fn step(
    state: &mut RouterState,
    zones: &[Zone],
    hydrographs: &UnitHydrographs,
    production: &[Fluxes],
    timestep: f64,
    network: &mut dyn ReachNetwork,
) -> Vec<LateralInflow> {
    let mut outputs = Vec::with_capacity(zones.len());

    for (index, zone) in zones.iter().enumerate() {
        let produced = channel_production(&production[index]);

        let arriving = if zone.kind == ZoneKind::Lake {
            // Instantaneous conversion: no accumulator involved.
            produced
        } else {
            let ordinates = hydrographs.zone(index);
            let mut heads = [0.0; 4];
            for (slot, &channel) in CHANNELS.iter().enumerate() {
                let accumulator = state.channel_mut(index, channel);
                for (lag, &ordinate) in ordinates.iter().enumerate() {
                    accumulator[lag] += produced[slot] * ordinate;
                }
                heads[slot] = accumulator[0];
                accumulator.rotate_left(1);
                let last = accumulator.len() - 1;
                accumulator[last] = 0.0;
            }
            heads
        };

        let inflow = LateralInflow {
            total: depth_to_flow(arriving[0], zone.area, timestep),
            surface: depth_to_flow(arriving[1], zone.area, timestep),
            hypodermic: depth_to_flow(arriving[2], zone.area, timestep),
            base: depth_to_flow(arriving[3], zone.area, timestep),
        };
        network.add_lateral_inflow(zone.reach, inflow.total);
        outputs.push(inflow);
    }

    outputs
}

/// The unit-hydrograph convolution routing variant.
pub struct HydrographRouter;

impl RoutingModel for HydrographRouter {
    type State = RouterState;

    fn initialise(zones: &[Zone], n_lags: usize) -> RouterState {
        RouterState::new(zones.len(), n_lags)
    }

    fn step(
        state: &mut RouterState,
        zones: &[Zone],
        hydrographs: &UnitHydrographs,
        production: &[Fluxes],
        timestep: f64,
        network: &mut dyn ReachNetwork,
    ) -> Vec<LateralInflow> {
        step(state, zones, hydrographs, production, timestep, network)
    }
}
