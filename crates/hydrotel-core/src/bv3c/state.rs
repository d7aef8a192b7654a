/// BV3C moisture state.
///
/// One moisture triplet per simulated zone. Created at initialisation,
/// mutated once per timestep, optionally overwritten by a checkpoint load.
use smallvec::SmallVec;

use super::params::Parameters;
use crate::error::{Error, Result};
use crate::soil::SoilTable;
use crate::traits::ZoneState;
use crate::zone::{Zone, N_LAYERS};

#[derive(Debug, Clone)]
pub struct MoistureState {
    /// Per-zone volumetric moisture [theta1, theta2, theta3].
    pub theta: SmallVec<[[f64; N_LAYERS]; 4]>,
}

impl MoistureState {
    /// Seed every zone at `initial_saturation * theta_s` of its layer-1..3
    /// soil classes.
    pub fn initialise(params: &Parameters, soils: &SoilTable, zones: &[Zone]) -> Self {
        let theta = zones
            .iter()
            .map(|zone| {
                let mut layers = [0.0; N_LAYERS];
                for (layer, value) in layers.iter_mut().enumerate() {
                    let class = soils.class(zone.soil[layer]);
                    *value = params.initial_saturation[layer] * class.theta_s;
                }
                layers
            })
            .collect();
        Self { theta }
    }

    /// Drop all moisture state at run teardown.
    pub fn clear(&mut self) {
        self.theta.clear();
    }
}

impl ZoneState for MoistureState {
    fn row_len(&self) -> usize {
        N_LAYERS
    }

    fn n_zones(&self) -> usize {
        self.theta.len()
    }

    fn zone_row(&self, index: usize) -> Vec<f64> {
        self.theta[index].to_vec()
    }

    fn restore_zone_row(&mut self, index: usize, row: &[f64]) -> Result<()> {
        if row.len() != N_LAYERS {
            return Err(Error::InvalidParameter(format!(
                "moisture row has {} values, expected {N_LAYERS}",
                row.len()
            )));
        }
        self.theta[index] = [row[0], row[1], row[2]];
        Ok(())
    }
}
