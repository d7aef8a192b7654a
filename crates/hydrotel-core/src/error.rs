/// Engine error type.
///
/// Covers the fatal, fail-fast tier only: configuration and IO problems that
/// abort a run. Tolerated numerical degradations (substep ladder fallback,
/// Newton non-convergence) never surface here.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A soil hydraulic class failed validation at initialisation.
    #[error("soil class {index}: {reason}")]
    InvalidSoilClass { index: usize, reason: String },

    /// A zone references a soil class index outside the loaded table.
    #[error("zone {zone}: soil class index {class} out of range ({count} classes loaded)")]
    UnknownSoilClass { zone: u32, class: usize, count: usize },

    /// A parameter value failed validation.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A zone has no pixels in the membership raster.
    #[error("zone {zone} has no pixels in the membership raster")]
    EmptyZone { zone: u32 },

    /// A non-channel pixel drains out of its zone without reaching a
    /// channel pixel.
    #[error("zone {zone}: pixel ({row}, {col}) drains outside the zone without reaching a channel")]
    DrainsOutsideZone { zone: u32, row: usize, col: usize },

    /// The flow-direction graph of a zone never settles into a visitation
    /// order (a cycle in the raster input).
    #[error("zone {zone}: flow graph did not resolve ({unresolved} pixels left unordered)")]
    CyclicFlowGraph { zone: u32, unresolved: usize },

    /// A checkpoint's zone-id set differs from the simulated set.
    #[error("checkpoint zone ids do not match the simulated set: {detail}")]
    CheckpointZoneMismatch { detail: String },

    /// A checkpoint row has the wrong number of values for its zone.
    #[error("checkpoint row for zone {zone} has {found} values, expected {expected}")]
    CheckpointRowLength {
        zone: u32,
        found: usize,
        expected: usize,
    },

    /// Mismatched per-timestep forcing slice.
    #[error("forcing has {found} entries for {expected} simulated zones")]
    ForcingLength { found: usize, expected: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
