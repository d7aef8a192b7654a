/// BV3C core process functions.
///
/// Pure functions implementing the hydraulic relations used inside one
/// substep. All fluxes are in m/s, depths in m, suction heads in m
/// (positive), moisture as volumetric fractions.
use super::constants::{OMEGA_FLOOR, PARTIAL_FROST_FACTOR, SNOW_INSULATION_DEPTH};
use crate::soil::SoilCurves;
use crate::zone::N_LAYERS;

/// Relative saturation of a layer, clamped to the curve floor.
pub fn relative_saturation(theta: f64, theta_s: f64) -> f64 {
    (theta / theta_s).clamp(OMEGA_FLOOR, 1.0)
}

/// Unsaturated conductivity from the Brooks-Corey power law
/// `K = Ks * omega^(2b + 3)`.
pub fn unsaturated_conductivity(ks: f64, b: f64, omega: f64) -> f64 {
    ks * omega.powf(2.0 * b + 3.0)
}

/// Matric suction [m] from the two-branch retention curve.
///
/// Power law below the switch point, parabolic cap above it; the two
/// branches and their slopes meet at `omega_pi` by construction of the
/// curve constants.
pub fn matric_potential(curves: &SoilCurves, psi_s: f64, omega: f64) -> f64 {
    if omega < curves.omega_pi {
        psi_s * omega.powf(-curves.b)
    } else {
        curves.mm * (omega - curves.nn) * (omega - 1.0)
    }
}

/// Partition the net input rate into infiltration and immediate runoff.
///
/// Infiltration is capped at the surface layer's saturated conductivity and
/// suppressed entirely when the layer is already saturated or the ground is
/// sealed by frost.
pub fn infiltration_partition(
    input_rate: f64,
    ks_surface: f64,
    theta1: f64,
    theta_s1: f64,
    sealed: bool,
) -> (f64, f64) {
    if sealed || theta1 >= theta_s1 {
        return (0.0, input_rate);
    }
    let infiltration = input_rate.min(ks_surface);
    (infiltration, input_rate - infiltration)
}

/// Darcy flux between two adjacent layers (positive downward).
///
/// Uses the larger of the two conductivities and the suction difference
/// across the distance between layer centres, plus the unit gravity
/// gradient.
pub fn interlayer_flux(k_upper: f64, k_lower: f64, psi_upper: f64, psi_lower: f64, dz: f64) -> f64 {
    let k = k_upper.max(k_lower);
    k * ((psi_lower - psi_upper) / dz + 1.0)
}

/// Flux correction for a layer crossed by the frost front.
///
/// A snow blanket deeper than the insulation depth cancels the correction;
/// otherwise a fully frozen layer passes nothing and a partially frozen
/// layer passes half.
pub fn frost_flux_factor(frost_depth: f64, layer_top: f64, layer_bottom: f64, snow_depth: f64) -> f64 {
    if snow_depth >= SNOW_INSULATION_DEPTH || frost_depth <= layer_top {
        1.0
    } else if frost_depth >= layer_bottom {
        0.0
    } else {
        PARTIAL_FROST_FACTOR
    }
}

/// Slope-driven lateral flux out of layer 2.
pub fn hypodermic_flux(k2: f64, slope: f64) -> f64 {
    k2 * slope
}

/// Linear recession flux out of layer 3.
pub fn base_flux(recession: f64, theta3: f64, thickness3: f64) -> f64 {
    recession * theta3 * thickness3
}

/// Evapotranspiration draw on one layer.
///
/// The layer's share of the demand, scaled by the water available between
/// wilting point and field capacity.
pub fn et_extraction(pet_rate: f64, root_fraction: f64, theta: f64, theta_cc: f64, theta_pf: f64) -> f64 {
    let availability = ((theta - theta_pf) / (theta_cc - theta_pf)).clamp(0.0, 1.0);
    pet_rate * root_fraction * availability
}

/// Clamp the moisture column back into [0, theta_s] after an integration
/// step.
///
/// Excess cascades upward in saturation order (3 → 2 → 1 → surface), each
/// push converted through the layer thicknesses so mass is preserved.
/// Deficits pull from neighbours with available water; when the whole
/// column cannot cover a deficit, all layers are forced to zero and the
/// unmet amount is reported as missing water.
///
/// Returns (clamped moisture, surface excess [m], missing water [m]).
pub fn cascade_clamp(
    mut theta: [f64; N_LAYERS],
    theta_s: [f64; N_LAYERS],
    thickness: [f64; N_LAYERS],
) -> ([f64; N_LAYERS], f64, f64) {
    let mut surface_excess = 0.0;

    // Saturation excess, bottom to top.
    for layer in (1..N_LAYERS).rev() {
        if theta[layer] > theta_s[layer] {
            let excess = (theta[layer] - theta_s[layer]) * thickness[layer];
            theta[layer] = theta_s[layer];
            theta[layer - 1] += excess / thickness[layer - 1];
        }
    }
    if theta[0] > theta_s[0] {
        surface_excess = (theta[0] - theta_s[0]) * thickness[0];
        theta[0] = theta_s[0];
    }

    // Deficits: pull from neighbours in preference order.
    const NEIGHBOURS: [[usize; 2]; N_LAYERS] = [[1, 2], [2, 0], [1, 0]];
    let mut missing = 0.0;
    for layer in 0..N_LAYERS {
        if theta[layer] >= 0.0 {
            continue;
        }
        let mut need = -theta[layer] * thickness[layer];
        theta[layer] = 0.0;
        for &donor in &NEIGHBOURS[layer] {
            if need <= 0.0 {
                break;
            }
            let available = (theta[donor] * thickness[donor]).max(0.0);
            let take = need.min(available);
            theta[donor] -= take / thickness[donor];
            need -= take;
        }
        if need > 0.0 {
            // No water anywhere to cover the deficit: the column empties.
            missing += need;
            theta = [0.0; N_LAYERS];
        }
    }

    (theta, surface_excess, missing)
}
