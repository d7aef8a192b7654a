/// Per-zone unit-hydrograph computation.
///
/// For every drainage zone, inject a unit depth on all pixels and route it
/// to the channel network with the implicit kinematic-wave solver, binning
/// the outlet arrivals per external-timestep lag. Zones are independent and
/// run one task each on a bounded worker pool; the raster is shared
/// read-only and each task writes its own result slot.
use std::collections::HashMap;

use rayon::prelude::*;

use super::raster::FlowRaster;
use super::solver::{manning_unit_flow, solve_depth, wave_celerity};
use super::topology::visitation_order;
use crate::error::{Error, Result};
use crate::zone::{Zone, ZoneKind};

/// Precomputation configuration.
#[derive(Debug, Clone)]
pub struct HydrographConfig {
    /// External simulation timestep [s].
    pub timestep: f64,
    /// Unit pulse depth [mm].
    pub unit_depth: f64,
    /// Cap on the ordinate sequence length.
    pub max_lags: usize,
    /// Fraction of the injected volume that must leave before draining
    /// stops.
    pub drained_fraction: f64,
    /// Newton-Raphson tolerance, scaled by cell size.
    pub epsilon: f64,
    /// Newton-Raphson iteration cap.
    pub max_iterations: usize,
    /// Safety factor on the celerity-derived sub-timestep.
    pub safety: f64,
    /// Worker pool size; capped at hardware concurrency.
    pub threads: usize,
}

impl Default for HydrographConfig {
    fn default() -> Self {
        Self {
            timestep: 86_400.0,
            unit_depth: 10.0,
            max_lags: 48,
            drained_fraction: 0.95,
            epsilon: 1.0e-6,
            max_iterations: 20,
            safety: 1.3,
            threads: 4,
        }
    }
}

impl HydrographConfig {
    pub fn validate(&self) -> Result<()> {
        if self.timestep <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "timestep {} must be positive",
                self.timestep
            )));
        }
        if self.unit_depth <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "unit_depth {} must be positive",
                self.unit_depth
            )));
        }
        if self.max_lags == 0 {
            return Err(Error::InvalidParameter("max_lags must be at least 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.drained_fraction) || self.drained_fraction == 0.0 {
            return Err(Error::InvalidParameter(format!(
                "drained_fraction {} must be in (0, 1]",
                self.drained_fraction
            )));
        }
        if self.safety < 1.0 {
            return Err(Error::InvalidParameter(format!(
                "safety {} must be at least 1",
                self.safety
            )));
        }
        if self.threads == 0 {
            return Err(Error::InvalidParameter("threads must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// The precomputed ordinates, one row per zone, all padded to the global
/// lag count.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitHydrographs {
    pub n_lags: usize,
    pub ordinates: Vec<Vec<f64>>,
}

impl UnitHydrographs {
    /// Pad per-zone rows to a common length.
    ///
    /// The global lag count is the longest response observed; shorter
    /// zones' tails are implicitly zero.
    pub fn new(rows: Vec<Vec<f64>>) -> Self {
        let n_lags = rows.iter().map(Vec::len).max().unwrap_or(0).max(1);
        let ordinates = rows
            .into_iter()
            .map(|mut row| {
                row.resize(n_lags, 0.0);
                row
            })
            .collect();
        Self { n_lags, ordinates }
    }

    pub fn zone(&self, index: usize) -> &[f64] {
        &self.ordinates[index]
    }

    pub fn n_zones(&self) -> usize {
        self.ordinates.len()
    }
}

/// Compute every zone's unit hydrograph on a bounded worker pool.
///
/// Any per-zone failure aborts the whole precomputation.
pub fn compute(raster: &FlowRaster, zones: &[Zone], config: &HydrographConfig) -> Result<UnitHydrographs> {
    config.validate()?;

    let hardware = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let threads = config.threads.min(hardware).max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| Error::InvalidParameter(format!("worker pool: {e}")))?;

    log::info!(
        "precomputing unit hydrographs: {} zones on {} threads",
        zones.len(),
        threads
    );

    let rows: Result<Vec<Vec<f64>>> = pool.install(|| {
        zones
            .par_iter()
            .map(|zone| zone_hydrograph(raster, zone, config))
            .collect()
    });

    let hydrographs = UnitHydrographs::new(rows?);
    log::info!("unit hydrographs ready: {} lags", hydrographs.n_lags);
    Ok(hydrographs)
}

/// Route a unit pulse through one zone and bin outlet arrivals per lag.
fn zone_hydrograph(raster: &FlowRaster, zone: &Zone, config: &HydrographConfig) -> Result<Vec<f64>> {
    if zone.kind == ZoneKind::Lake {
        // Lakes convert instantaneously: the whole pulse arrives at lag 0.
        return Ok(vec![1.0]);
    }

    let pixels = raster.zone_pixels(zone.id);
    if pixels.is_empty() {
        return Err(Error::EmptyZone { zone: zone.id });
    }
    let order = visitation_order(raster, zone.id, &pixels)?;
    let position: HashMap<usize, usize> = order.iter().enumerate().map(|(i, &g)| (g, i)).collect();

    let n = order.len();
    let cell = raster.cell_size();
    let cell_area = cell * cell;
    let unit_m = config.unit_depth / 1000.0;

    // Per-pixel attributes in visitation order.
    let mut slope = vec![0.0; n];
    let mut manning = vec![0.0; n];
    let mut channel = vec![false; n];
    let mut receiver = vec![None; n];
    for (i, &g) in order.iter().enumerate() {
        slope[i] = raster.slope_at(g);
        manning[i] = raster.manning_at(g, &zone.manning);
        channel[i] = raster.is_channel(g);
        if !channel[i] {
            // Validated by visitation_order: the receiver exists in-zone.
            receiver[i] = raster.downstream(g).and_then(|d| position.get(&d).copied());
        }
    }

    // Sub-timestep from the fastest celerity at the unit depth.
    let c_max = (0..n)
        .filter(|&i| !channel[i])
        .map(|i| wave_celerity(slope[i], manning[i], unit_m))
        .fold(0.0_f64, f64::max);
    let dt_raw = if c_max > 0.0 {
        (cell / (config.safety * c_max)).max(1.0).min(config.timestep)
    } else {
        config.timestep
    };
    let steps_per_lag = (config.timestep / dt_raw).ceil().max(1.0) as usize;
    let dt = config.timestep / steps_per_lag as f64;

    // Initial condition: a unit depth everywhere. The share sitting on
    // channel pixels arrives at lag 0 without routing.
    let mut depth = vec![unit_m; n];
    let mut channel_volume = 0.0;
    for i in 0..n {
        if channel[i] {
            depth[i] = 0.0;
            channel_volume += unit_m * cell_area;
        }
    }
    let injected = unit_m * cell_area * n as f64;

    let mut bins: Vec<f64> = Vec::new();
    let mut drained = 0.0;
    let mut capped_solves = 0usize;
    let mut inflow = vec![0.0; n];

    for lag in 0..config.max_lags {
        let mut arrivals = if lag == 0 { channel_volume } else { 0.0 };

        for _ in 0..steps_per_lag {
            inflow.iter_mut().for_each(|v| *v = 0.0);
            for i in 0..n {
                if channel[i] {
                    arrivals += inflow[i] * dt;
                    continue;
                }
                let solution = solve_depth(
                    depth[i],
                    inflow[i] / cell,
                    cell,
                    dt,
                    slope[i],
                    manning[i],
                    config.epsilon,
                    config.max_iterations,
                );
                if !solution.converged {
                    capped_solves += 1;
                }
                depth[i] = solution.depth;
                let out_rate = manning_unit_flow(slope[i], manning[i], depth[i]) * cell;
                if let Some(r) = receiver[i] {
                    inflow[r] += out_rate;
                }
            }
        }

        drained += arrivals;
        bins.push(arrivals);
        if drained >= config.drained_fraction * injected {
            break;
        }
    }

    if capped_solves > 0 {
        log::warn!(
            "zone {}: {capped_solves} kinematic solves hit the iteration cap; last iterates kept",
            zone.id
        );
    }

    // Spread the undrained remainder evenly over the lags actually used,
    // then normalise so the ordinates sum to exactly one.
    let mut ordinates: Vec<f64> = bins.iter().map(|&v| v / injected).collect();
    let deficit = 1.0 - ordinates.iter().sum::<f64>();
    if deficit > 0.0 {
        log::debug!(
            "zone {}: redistributing {:.2}% undrained volume over {} lags",
            zone.id,
            deficit * 100.0,
            ordinates.len()
        );
        let share = deficit / ordinates.len() as f64;
        for value in &mut ordinates {
            *value += share;
        }
    }
    let total: f64 = ordinates.iter().sum();
    for value in &mut ordinates {
        *value /= total;
    }

    Ok(ordinates)
}
