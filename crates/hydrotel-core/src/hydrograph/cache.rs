/// Hydrograph cache persistence.
///
/// A cache file records the configuration it was computed under plus one
/// ordinate row per zone. On load, every candidate file in the cache
/// directory is tried in turn; a file is usable only when its whole header
/// equals the active configuration and its rows cover exactly the simulated
/// zones. An unusable or unreadable candidate is skipped, not an error; the
/// engine recomputes when no candidate matches.
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::precompute::{HydrographConfig, UnitHydrographs};
use crate::error::Result;
use crate::zone::{CoverClasses, Zone};

/// On-disk format version.
pub const CACHE_VERSION: u32 = 1;

/// Everything the ordinates depend on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheHeader {
    pub version: u32,
    /// External timestep [s].
    pub timestep: f64,
    /// Unit pulse depth [mm].
    pub unit_depth: f64,
    /// Integrated land-cover class sets.
    pub forest_classes: Vec<usize>,
    pub water_classes: Vec<usize>,
    /// Per-zone Manning roughness triplet (forest / water / other).
    pub manning: Vec<(u32, [f64; 3])>,
}

impl CacheHeader {
    /// Header describing the active run configuration.
    pub fn for_run(config: &HydrographConfig, classes: &CoverClasses, zones: &[Zone]) -> Self {
        Self {
            version: CACHE_VERSION,
            timestep: config.timestep,
            unit_depth: config.unit_depth,
            forest_classes: classes.forest.clone(),
            water_classes: classes.water.clone(),
            manning: zones.iter().map(|z| (z.id, z.manning)).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    header: CacheHeader,
    n_lags: usize,
    /// One row per zone: id plus its ordinates.
    rows: Vec<(u32, Vec<f64>)>,
}

/// Try every cache file in `dir` against the active header.
///
/// Returns the first matching ordinate set, or `None` when no candidate is
/// usable. A missing directory is also a clean miss: an absent cache is
/// expected, not an error.
pub fn load_matching(dir: &Path, header: &CacheHeader, zones: &[Zone]) -> Option<UnitHydrographs> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return None,
    };

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|ext| ext.to_str()) == Some("json"))
        .collect();
    candidates.sort();

    for path in candidates {
        match read_candidate(&path, header, zones) {
            Some(hydrographs) => {
                log::info!("loaded unit hydrographs from {}", path.display());
                return Some(hydrographs);
            }
            None => {
                log::debug!("cache candidate {} does not match", path.display());
            }
        }
    }
    None
}

fn read_candidate(path: &Path, header: &CacheHeader, zones: &[Zone]) -> Option<UnitHydrographs> {
    let text = fs::read_to_string(path).ok()?;
    let file: CacheFile = serde_json::from_str(&text).ok()?;

    if file.header != *header {
        return None;
    }
    if file.rows.len() != zones.len() {
        return None;
    }

    // Rows must cover exactly the simulated zones, in any order.
    let mut ordinates = vec![Vec::new(); zones.len()];
    for (id, row) in file.rows {
        let index = zones.iter().position(|z| z.id == id)?;
        if row.len() != file.n_lags || !ordinates[index].is_empty() {
            return None;
        }
        ordinates[index] = row;
    }
    if ordinates.iter().any(Vec::is_empty) {
        return None;
    }

    Some(UnitHydrographs {
        n_lags: file.n_lags,
        ordinates,
    })
}

/// Persist freshly computed ordinates next to any existing cache files.
pub fn store(
    dir: &Path,
    header: &CacheHeader,
    zones: &[Zone],
    hydrographs: &UnitHydrographs,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let mut path = dir.join("hydrographs-0.json");
    let mut counter = 0usize;
    while path.exists() {
        counter += 1;
        path = dir.join(format!("hydrographs-{counter}.json"));
    }

    let file = CacheFile {
        header: header.clone(),
        n_lags: hydrographs.n_lags,
        rows: zones
            .iter()
            .zip(&hydrographs.ordinates)
            .map(|(zone, row)| (zone.id, row.clone()))
            .collect(),
    };
    fs::write(&path, serde_json::to_string(&file)?)?;
    log::info!("stored unit hydrographs in {}", path.display());
    Ok(path)
}
