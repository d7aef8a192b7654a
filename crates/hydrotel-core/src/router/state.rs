/// Router convolution state.
///
/// Per zone, four parallel accumulators (total / surface / hypodermic /
/// base), each `n_lags` slots long. Slot `k` holds the production depth
/// [mm] scheduled to reach the outlet `k` timesteps from now.
use crate::error::{Error, Result};
use crate::traits::ZoneState;

/// Number of routed channels.
pub const N_CHANNELS: usize = 4;

/// Accumulator index per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Total = 0,
    Surface = 1,
    Hypodermic = 2,
    Base = 3,
}

#[derive(Debug, Clone)]
pub struct RouterState {
    n_lags: usize,
    /// Per zone: `N_CHANNELS` accumulators laid out back to back.
    debits: Vec<Vec<f64>>,
}

impl RouterState {
    pub fn new(n_zones: usize, n_lags: usize) -> Self {
        Self {
            n_lags,
            debits: vec![vec![0.0; N_CHANNELS * n_lags]; n_zones],
        }
    }

    pub fn n_lags(&self) -> usize {
        self.n_lags
    }

    /// One zone's accumulator for one channel.
    pub fn channel(&self, zone: usize, channel: Channel) -> &[f64] {
        let start = channel as usize * self.n_lags;
        &self.debits[zone][start..start + self.n_lags]
    }

    pub fn channel_mut(&mut self, zone: usize, channel: Channel) -> &mut [f64] {
        let start = channel as usize * self.n_lags;
        &mut self.debits[zone][start..start + self.n_lags]
    }

    /// Drop all in-flight volume at run teardown.
    pub fn clear(&mut self) {
        self.debits.clear();
    }
}

impl ZoneState for RouterState {
    fn row_len(&self) -> usize {
        N_CHANNELS * self.n_lags
    }

    fn n_zones(&self) -> usize {
        self.debits.len()
    }

    fn zone_row(&self, index: usize) -> Vec<f64> {
        self.debits[index].clone()
    }

    fn restore_zone_row(&mut self, index: usize, row: &[f64]) -> Result<()> {
        if row.len() != N_CHANNELS * self.n_lags {
            return Err(Error::InvalidParameter(format!(
                "router row has {} values, expected {}",
                row.len(),
                N_CHANNELS * self.n_lags
            )));
        }
        self.debits[index].copy_from_slice(row);
        Ok(())
    }
}
