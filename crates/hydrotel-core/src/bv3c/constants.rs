/// BV3C numerical constants and parameter contract.
///
/// Centralises the fixed values used by the balance integrator.

// -- Hydraulic safeguards --

/// Floor on relative saturation when evaluating the retention curves.
pub const OMEGA_FLOOR: f64 = 0.05;

/// Snow depth [m] above which the pack insulates the ground and frost
/// corrections are skipped.
pub const SNOW_INSULATION_DEPTH: f64 = 0.10;

/// Flux reduction applied to a layer partially invaded by the frost front.
pub const PARTIAL_FROST_FACTOR: f64 = 0.5;

// -- Substep control --

/// Fallback substep divisors tried, in order, when the rounded substep
/// still violates the stability bound. The last one is used regardless.
pub const SUBSTEP_LADDER: [f64; 3] = [48.0, 288.0, 1152.0];

/// Slack added to the stability comparison so a zero flux against a zero
/// moisture bound does not force the ladder.
pub const STABILITY_EPS: f64 = 1e-12;

/// Remaining-time threshold [s] below which the substep loop stops.
pub const TIME_EPS: f64 = 1e-6;

// -- Parameter bounds --

/// Parameter bounds for validation: (min, max).
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

/// Stability factor on the fraction of a layer's moisture a substep may move.
pub const CIN_BOUNDS: Bounds = Bounds {
    min: 1e-3,
    max: 1.0,
};

/// Minimum internal substep [s].
pub const MIN_SUBSTEP_BOUNDS: Bounds = Bounds {
    min: 1.0,
    max: 3600.0,
};

/// Initial saturation fraction of each layer.
pub const INITIAL_SATURATION_BOUNDS: Bounds = Bounds { min: 0.0, max: 1.0 };

/// Layer-3 linear recession coefficient [1/s].
pub const RECESSION_BOUNDS: Bounds = Bounds {
    min: 0.0,
    max: 1e-3,
};
