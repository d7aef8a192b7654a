//! BV3C flux outputs.
//!
//! Two levels: `Fluxes` holds one zone-timestep, `FluxesTimeseries` collects
//! a full simulation (Vec of each field). All depths in mm over the external
//! timestep; moisture as volumetric fractions.

/// Single zone-timestep fluxes — returned by `step()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fluxes {
    pub net_input: f64,
    pub pet: f64,
    pub actual_et: f64,
    pub infiltration: f64,
    /// Simulated-surface runoff depth (infiltration excess + saturation
    /// excess), before land-cover apportionment.
    pub surface_runoff: f64,
    pub q12: f64,
    pub q23: f64,
    pub hypodermic: f64,
    pub base: f64,
    /// Water the deficit sink removed to keep the column non-negative.
    pub missing_water: f64,
    pub theta1: f64,
    pub theta2: f64,
    pub theta3: f64,
    pub prod_surf: f64,
    pub prod_hypo: f64,
    pub prod_base: f64,
}

/// Full timeseries of fluxes for one zone.
#[derive(Debug, Default)]
pub struct FluxesTimeseries {
    pub net_input: Vec<f64>,
    pub pet: Vec<f64>,
    pub actual_et: Vec<f64>,
    pub infiltration: Vec<f64>,
    pub surface_runoff: Vec<f64>,
    pub q12: Vec<f64>,
    pub q23: Vec<f64>,
    pub hypodermic: Vec<f64>,
    pub base: Vec<f64>,
    pub missing_water: Vec<f64>,
    pub theta1: Vec<f64>,
    pub theta2: Vec<f64>,
    pub theta3: Vec<f64>,
    pub prod_surf: Vec<f64>,
    pub prod_hypo: Vec<f64>,
    pub prod_base: Vec<f64>,
}

impl FluxesTimeseries {
    /// Pre-allocate all vectors for `n` timesteps.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            net_input: Vec::with_capacity(n),
            pet: Vec::with_capacity(n),
            actual_et: Vec::with_capacity(n),
            infiltration: Vec::with_capacity(n),
            surface_runoff: Vec::with_capacity(n),
            q12: Vec::with_capacity(n),
            q23: Vec::with_capacity(n),
            hypodermic: Vec::with_capacity(n),
            base: Vec::with_capacity(n),
            missing_water: Vec::with_capacity(n),
            theta1: Vec::with_capacity(n),
            theta2: Vec::with_capacity(n),
            theta3: Vec::with_capacity(n),
            prod_surf: Vec::with_capacity(n),
            prod_hypo: Vec::with_capacity(n),
            prod_base: Vec::with_capacity(n),
        }
    }

    /// Push one timestep's fluxes.
    pub fn push(&mut self, f: &Fluxes) {
        self.net_input.push(f.net_input);
        self.pet.push(f.pet);
        self.actual_et.push(f.actual_et);
        self.infiltration.push(f.infiltration);
        self.surface_runoff.push(f.surface_runoff);
        self.q12.push(f.q12);
        self.q23.push(f.q23);
        self.hypodermic.push(f.hypodermic);
        self.base.push(f.base);
        self.missing_water.push(f.missing_water);
        self.theta1.push(f.theta1);
        self.theta2.push(f.theta2);
        self.theta3.push(f.theta3);
        self.prod_surf.push(f.prod_surf);
        self.prod_hypo.push(f.prod_hypo);
        self.prod_base.push(f.prod_base);
    }

    /// Number of timesteps.
    pub fn len(&self) -> usize {
        self.prod_surf.len()
    }

    /// Returns `true` if there are no timesteps.
    pub fn is_empty(&self) -> bool {
        self.prod_surf.is_empty()
    }
}
