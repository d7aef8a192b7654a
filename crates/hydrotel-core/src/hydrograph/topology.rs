/// Visitation order over a zone's flow-direction graph.
///
/// Order indices are assigned by relaxation: every overland edge pushes its
/// receiver's index above its sender's, repeated until nothing changes.
/// Valid input is acyclic, so the relaxation settles in at most one pass
/// per graph depth; a graph still changing after `n` passes is cyclic and
/// fatal. A non-channel pixel whose flow leaves the zone (off-grid, pit, or
/// into foreign pixels) can never reach the zone's outlet and is equally
/// fatal.
use std::collections::HashMap;

use super::raster::FlowRaster;
use crate::error::{Error, Result};

/// Compute the order in which a zone's pixels must be visited so that every
/// overland sender precedes its receiver.
///
/// `pixels` is the zone's pixel set in raster order. Returns the same
/// indices, topologically sorted.
pub fn visitation_order(raster: &FlowRaster, zone_id: u32, pixels: &[usize]) -> Result<Vec<usize>> {
    let local: HashMap<usize, usize> = pixels
        .iter()
        .enumerate()
        .map(|(l, &g)| (g, l))
        .collect();

    // Overland edges: sender local index -> receiver local index. Channel
    // pixels absorb flow and send nothing onward here.
    let mut edges = Vec::with_capacity(pixels.len());
    for (l, &g) in pixels.iter().enumerate() {
        if raster.is_channel(g) {
            continue;
        }
        let receiver = raster.downstream(g).and_then(|d| local.get(&d).copied());
        match receiver {
            Some(r) => edges.push((l, r)),
            None => {
                let (row, col) = raster.position(g);
                return Err(Error::DrainsOutsideZone { zone: zone_id, row, col });
            }
        }
    }

    let mut order = vec![0usize; pixels.len()];
    let max_passes = pixels.len() + 1;
    let mut settled = false;
    for _ in 0..max_passes {
        let mut changed = 0usize;
        for &(sender, receiver) in &edges {
            if order[receiver] <= order[sender] {
                order[receiver] = order[sender] + 1;
                changed += 1;
            }
        }
        if changed == 0 {
            settled = true;
            break;
        }
    }
    if !settled {
        let deepest = order.iter().filter(|&&o| o >= pixels.len()).count();
        return Err(Error::CyclicFlowGraph {
            zone: zone_id,
            unresolved: deepest.max(1),
        });
    }

    let mut sorted: Vec<usize> = pixels.to_vec();
    sorted.sort_by_key(|g| order[local[g]]);
    Ok(sorted)
}
