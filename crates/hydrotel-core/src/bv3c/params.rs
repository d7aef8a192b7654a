/// BV3C tunable parameters.
use super::constants::{
    Bounds, CIN_BOUNDS, INITIAL_SATURATION_BOUNDS, MIN_SUBSTEP_BOUNDS, RECESSION_BOUNDS,
};
use crate::error::{Error, Result};
use crate::zone::N_LAYERS;

#[derive(Debug, Clone, Copy)]
pub struct Parameters {
    /// Stability factor: a substep may move at most `cin * theta` out of a
    /// layer.
    pub cin: f64,
    /// Floor on the internal substep length [s].
    pub min_substep: f64,
    /// Initial moisture as a fraction of saturation, per layer.
    pub initial_saturation: [f64; N_LAYERS],
    /// Fraction of the evapotranspiration demand drawn from each layer.
    pub root_fractions: [f64; N_LAYERS],
    /// Layer-3 linear recession coefficient [1/s].
    pub recession: f64,
}

fn check(name: &str, value: f64, bounds: &Bounds) -> Result<()> {
    if !(bounds.min..=bounds.max).contains(&value) {
        return Err(Error::InvalidParameter(format!(
            "{name} = {value} is out of bounds [{}, {}]",
            bounds.min, bounds.max
        )));
    }
    Ok(())
}

impl Parameters {
    /// Create new Parameters, returning an error if any value is out of
    /// bounds or the root fractions do not sum to one.
    pub fn new(
        cin: f64,
        min_substep: f64,
        initial_saturation: [f64; N_LAYERS],
        root_fractions: [f64; N_LAYERS],
        recession: f64,
    ) -> Result<Self> {
        check("cin", cin, &CIN_BOUNDS)?;
        check("min_substep", min_substep, &MIN_SUBSTEP_BOUNDS)?;
        for (layer, &frac) in initial_saturation.iter().enumerate() {
            check(
                &format!("initial_saturation[{layer}]"),
                frac,
                &INITIAL_SATURATION_BOUNDS,
            )?;
        }
        let root_sum: f64 = root_fractions.iter().sum();
        if root_fractions.iter().any(|&r| !(0.0..=1.0).contains(&r)) || (root_sum - 1.0).abs() > 1e-6
        {
            return Err(Error::InvalidParameter(format!(
                "root_fractions {root_fractions:?} must be in [0, 1] and sum to 1"
            )));
        }
        check("recession", recession, &RECESSION_BOUNDS)?;
        Ok(Self {
            cin,
            min_substep,
            initial_saturation,
            root_fractions,
            recession,
        })
    }
}
