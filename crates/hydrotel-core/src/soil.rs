/// Soil hydraulic classes and their derived retention-curve constants.
///
/// Each class carries the measured Brooks-Corey parameters; the curve
/// constants used by the two-branch matric-potential formula are computed
/// once at load time and are immutable for the rest of the run.
use crate::error::{Error, Result};

/// Relative saturation above which the matric-potential curve switches from
/// the Brooks-Corey power law to the parabolic near-saturation cap.
pub const OMEGA_PI: f64 = 0.92;

/// Measured hydraulic parameters of one soil class.
#[derive(Debug, Clone, Copy)]
pub struct SoilClass {
    /// Saturated volumetric moisture content [-].
    pub theta_s: f64,
    /// Saturated hydraulic conductivity [m/s].
    pub ks: f64,
    /// Air-entry suction [m].
    pub psi_s: f64,
    /// Brooks-Corey pore-size-distribution index [-].
    pub lambda: f64,
    /// Field-capacity moisture content [-].
    pub theta_cc: f64,
    /// Wilting-point moisture content [-].
    pub theta_pf: f64,
}

impl SoilClass {
    /// Create a soil class, rejecting physically impossible values.
    pub fn new(
        theta_s: f64,
        ks: f64,
        psi_s: f64,
        lambda: f64,
        theta_cc: f64,
        theta_pf: f64,
    ) -> std::result::Result<Self, String> {
        if !(theta_s > 0.0 && theta_s <= 1.0) {
            return Err(format!("theta_s = {theta_s} must be in (0, 1]"));
        }
        if ks <= 0.0 {
            return Err(format!("ks = {ks} must be positive"));
        }
        if psi_s <= 0.0 {
            return Err(format!("psi_s = {psi_s} must be positive"));
        }
        if lambda <= 0.0 {
            return Err(format!("lambda = {lambda} must be positive"));
        }
        if theta_cc <= 0.0 {
            return Err(format!("theta_cc = {theta_cc} must be positive"));
        }
        if theta_pf <= 0.0 {
            return Err(format!("theta_pf = {theta_pf} must be positive"));
        }
        if theta_pf >= theta_cc {
            return Err(format!(
                "theta_pf = {theta_pf} must be below theta_cc = {theta_cc}"
            ));
        }
        if theta_cc >= theta_s {
            return Err(format!(
                "theta_cc = {theta_cc} must be below theta_s = {theta_s}"
            ));
        }
        Ok(Self {
            theta_s,
            ks,
            psi_s,
            lambda,
            theta_cc,
            theta_pf,
        })
    }
}

/// Retention-curve constants derived once per class.
///
/// Below `OMEGA_PI` the suction follows the Brooks-Corey power law
/// `psi = psi_s * omega^(-b)`. Above it, the parabola
/// `psi = mm * (omega - nn) * (omega - 1)` takes over; `mm` and `nn` are
/// chosen so that suction and its slope are continuous at the switch point
/// and suction vanishes at saturation.
#[derive(Debug, Clone, Copy)]
pub struct SoilCurves {
    /// Power-law exponent `b = 1/lambda`.
    pub b: f64,
    /// Switch point between the two branches.
    pub omega_pi: f64,
    /// Parabola scale constant.
    pub mm: f64,
    /// Parabola root constant.
    pub nn: f64,
}

impl SoilCurves {
    /// Derive the curve constants for a class.
    pub fn from_class(class: &SoilClass) -> Self {
        let b = 1.0 / class.lambda;
        let omega_pi = OMEGA_PI;

        // Suction and slope of the power branch at the switch point.
        let psi_pi = class.psi_s * omega_pi.powf(-b);
        let slope_pi = -b * psi_pi / omega_pi;

        let v = omega_pi - 1.0;
        let mm = (slope_pi * v - psi_pi) / (v * v);
        let nn = omega_pi - psi_pi / (mm * v);

        Self {
            b,
            omega_pi,
            mm,
            nn,
        }
    }
}

/// Immutable table of soil classes with their derived constants.
#[derive(Debug, Clone)]
pub struct SoilTable {
    classes: Vec<SoilClass>,
    curves: Vec<SoilCurves>,
}

impl SoilTable {
    /// Build the table, validating every class.
    pub fn new(classes: Vec<SoilClass>) -> Result<Self> {
        if classes.is_empty() {
            return Err(Error::InvalidParameter(
                "soil table must contain at least one class".to_string(),
            ));
        }
        let curves = classes.iter().map(SoilCurves::from_class).collect();
        Ok(Self { classes, curves })
    }

    /// Build the table from raw parameter tuples, tagging failures with the
    /// offending class index.
    pub fn from_raw(raw: &[(f64, f64, f64, f64, f64, f64)]) -> Result<Self> {
        let mut classes = Vec::with_capacity(raw.len());
        for (index, &(theta_s, ks, psi_s, lambda, theta_cc, theta_pf)) in raw.iter().enumerate() {
            let class = SoilClass::new(theta_s, ks, psi_s, lambda, theta_cc, theta_pf)
                .map_err(|reason| Error::InvalidSoilClass { index, reason })?;
            classes.push(class);
        }
        Self::new(classes)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn class(&self, index: usize) -> &SoilClass {
        &self.classes[index]
    }

    pub fn curves(&self, index: usize) -> &SoilCurves {
        &self.curves[index]
    }
}
