/// Internal substep selection.
///
/// The integrator may not move more than `cin * theta` out of a layer in
/// one substep. The candidate substep derived from the current fluxes is
/// rounded down to the external timestep divided by an even count, floored
/// at the configured minimum, and pushed down a fixed divisor ladder if the
/// bound is still violated. Selection always succeeds; the last ladder step
/// is used even when nothing satisfies the bound.
use super::constants::{STABILITY_EPS, SUBSTEP_LADDER};

/// Pick the next substep length [s].
///
/// `rate1` / `rate2` are the moisture drain rates `|q12|/z1` and
/// `|(q23 + q2)|/z2` [1/s]; `limit1` / `limit2` the corresponding
/// `cin * theta` bounds.
pub fn select_substep(
    remaining: f64,
    timestep: f64,
    rate1: f64,
    rate2: f64,
    limit1: f64,
    limit2: f64,
    min_substep: f64,
) -> f64 {
    let stable =
        |dt: f64| rate1 * dt <= limit1 + STABILITY_EPS && rate2 * dt <= limit2 + STABILITY_EPS;

    if stable(remaining) {
        return remaining;
    }

    // Candidate from the two stability ratios.
    let mut candidate = remaining;
    if rate1 > 0.0 {
        candidate = candidate.min(limit1 / rate1);
    }
    if rate2 > 0.0 {
        candidate = candidate.min(limit2 / rate2);
    }

    // Round down to the timestep divided by an even count.
    let mut count = (timestep / candidate.max(f64::MIN_POSITIVE)).ceil();
    if !count.is_finite() {
        count = SUBSTEP_LADDER[SUBSTEP_LADDER.len() - 1];
    }
    if count as u64 % 2 == 1 {
        count += 1.0;
    }
    let mut dtc = (timestep / count).max(min_substep);

    if !stable(dtc) {
        // Best effort: walk the ladder, keep the last step regardless.
        for &divisor in &SUBSTEP_LADDER {
            dtc = timestep / divisor;
            if stable(dtc) {
                break;
            }
        }
    }

    dtc.min(remaining)
}
