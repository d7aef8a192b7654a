/// State checkpoints.
///
/// One row per simulated zone: the zone id followed by its state vector
/// (moisture triplet for the balance, the four debit accumulators for the
/// router). A checkpoint restores only when its id set equals the active
/// simulated set exactly; anything else is a fatal read error, since a
/// partial restore would silently desynchronise the run.
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::traits::ZoneState;
use crate::zone::Zone;

#[derive(Debug, Serialize, Deserialize)]
struct CheckpointFile {
    rows: Vec<(u32, Vec<f64>)>,
}

/// Write one state's per-zone rows.
pub fn save<S: ZoneState>(path: &Path, zones: &[Zone], state: &S) -> Result<()> {
    let rows = zones
        .iter()
        .enumerate()
        .map(|(index, zone)| (zone.id, state.zone_row(index)))
        .collect();
    fs::write(path, serde_json::to_string(&CheckpointFile { rows })?)?;
    Ok(())
}

/// Restore a state from a checkpoint written for the same zone set.
pub fn load<S: ZoneState>(path: &Path, zones: &[Zone], state: &mut S) -> Result<()> {
    let text = fs::read_to_string(path)?;
    let file: CheckpointFile = serde_json::from_str(&text)?;

    let active: BTreeSet<u32> = zones.iter().map(|z| z.id).collect();
    let stored: BTreeSet<u32> = file.rows.iter().map(|&(id, _)| id).collect();
    if active != stored || file.rows.len() != zones.len() {
        let missing: Vec<u32> = active.difference(&stored).copied().collect();
        let extra: Vec<u32> = stored.difference(&active).copied().collect();
        return Err(Error::CheckpointZoneMismatch {
            detail: format!("missing {missing:?}, unexpected {extra:?}"),
        });
    }

    let expected = state.row_len();
    for (id, row) in &file.rows {
        if row.len() != expected {
            return Err(Error::CheckpointRowLength {
                zone: *id,
                found: row.len(),
                expected,
            });
        }
        // Set equality plus equal counts make this lookup total.
        let index = zones.iter().position(|z| z.id == *id).unwrap();
        state.restore_zone_row(index, row)?;
    }
    log::info!("restored checkpoint {} ({} zones)", path.display(), zones.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bv3c::params::Parameters;
    use crate::bv3c::state::MoistureState;
    use crate::router::state::{Channel, RouterState};
    use crate::soil::{SoilClass, SoilTable};
    use crate::zone::{CoverFractions, ZoneKind};

    fn test_zone(id: u32) -> Zone {
        Zone {
            id,
            area: 1.0e6,
            slope: 0.03,
            depths: [0.2, 0.6, 1.5],
            soil: [0, 0, 0],
            cover: CoverFractions {
                forest: 0.0,
                water: 0.0,
                impervious: 0.0,
                other: 1.0,
            },
            manning: [0.4, 0.03, 0.1],
            kind: ZoneKind::Subbasin,
            reach: 1,
        }
    }

    fn moisture_for(zones: &[Zone]) -> MoistureState {
        let params =
            Parameters::new(0.1, 60.0, [0.5, 0.5, 0.5], [0.6, 0.3, 0.1], 1.0e-7).unwrap();
        let soils = SoilTable::new(vec![
            SoilClass::new(0.45, 3.0e-6, 0.2, 0.3, 0.30, 0.12).unwrap(),
        ])
        .unwrap();
        MoistureState::initialise(&params, &soils, zones)
    }

    #[test]
    fn moisture_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("moisture.json");
        let zones = vec![test_zone(3), test_zone(8)];

        let mut original = moisture_for(&zones);
        original.theta[1] = [0.11, 0.22, 0.33];
        save(&path, &zones, &original).unwrap();

        let mut restored = moisture_for(&zones);
        load(&path, &zones, &mut restored).unwrap();
        assert_eq!(restored.theta[0], original.theta[0]);
        assert_eq!(restored.theta[1], [0.11, 0.22, 0.33]);
    }

    #[test]
    fn router_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debits.json");
        let zones = vec![test_zone(3)];

        let mut original = RouterState::new(1, 4);
        original.channel_mut(0, Channel::Surface)[2] = 6.5;
        save(&path, &zones, &original).unwrap();

        let mut restored = RouterState::new(1, 4);
        load(&path, &zones, &mut restored).unwrap();
        assert_eq!(restored.channel(0, Channel::Surface), &[0.0, 0.0, 6.5, 0.0]);
    }

    #[test]
    fn id_set_mismatch_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("moisture.json");
        let written = vec![test_zone(3), test_zone(8)];
        save(&path, &written, &moisture_for(&written)).unwrap();

        let active = vec![test_zone(3), test_zone(9)];
        let mut state = moisture_for(&active);
        assert!(matches!(
            load(&path, &active, &mut state),
            Err(Error::CheckpointZoneMismatch { .. })
        ));
    }

    #[test]
    fn subset_is_fatal_too() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("moisture.json");
        let written = vec![test_zone(3)];
        save(&path, &written, &moisture_for(&written)).unwrap();

        let active = vec![test_zone(3), test_zone(8)];
        let mut state = moisture_for(&active);
        assert!(load(&path, &active, &mut state).is_err());
    }

    #[test]
    fn row_order_does_not_matter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("moisture.json");
        let zones = vec![test_zone(3), test_zone(8)];

        let mut original = moisture_for(&zones);
        original.theta[0] = [0.1, 0.1, 0.1];
        original.theta[1] = [0.2, 0.2, 0.2];
        save(&path, &zones, &original).unwrap();

        // Load against the same set declared in reverse order.
        let reversed = vec![test_zone(8), test_zone(3)];
        let mut restored = moisture_for(&reversed);
        load(&path, &reversed, &mut restored).unwrap();
        assert_eq!(restored.theta[0], [0.2, 0.2, 0.2]); // zone 8
        assert_eq!(restored.theta[1], [0.1, 0.1, 0.1]); // zone 3
    }

    #[test]
    fn wrong_row_length_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debits.json");
        let zones = vec![test_zone(3)];

        let written = RouterState::new(1, 4);
        save(&path, &zones, &written).unwrap();

        // Reload into a router sized for a different lag count.
        let mut restored = RouterState::new(1, 6);
        assert!(matches!(
            load(&path, &zones, &mut restored),
            Err(Error::CheckpointRowLength { zone: 3, .. })
        ));
    }
}
