/// Catchment (UHRH) static data model.
///
/// A zone is the elementary sub-catchment unit: geometry, land cover, soil
/// class assignment, and routing attachment. Read-only during a run; the
/// mutable moisture and convolution state lives in the respective model
/// state structs.
use crate::error::{Error, Result};

/// Number of simulated soil layers.
pub const N_LAYERS: usize = 3;

/// Integrated land-cover class-index sets.
///
/// The occupation table assigns each zone a fraction per land-cover class;
/// these sets say which class indices are folded into the forest, water and
/// impervious categories. Everything else is "other".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverClasses {
    pub forest: Vec<usize>,
    pub water: Vec<usize>,
    pub impervious: Vec<usize>,
}

/// Per-zone land-cover fractions, integrated from the occupation table.
#[derive(Debug, Clone, Copy)]
pub struct CoverFractions {
    pub forest: f64,
    pub water: f64,
    pub impervious: f64,
    pub other: f64,
}

impl CoverFractions {
    /// Integrate a zone's occupation-table row into the four categories.
    ///
    /// `row[i]` is the zone-area fraction covered by class `i`. "Other" is
    /// the remainder, clamped at zero against rounding noise.
    pub fn from_occupation(row: &[f64], classes: &CoverClasses) -> Self {
        let sum_of = |indices: &[usize]| -> f64 {
            indices
                .iter()
                .filter_map(|&i| row.get(i))
                .copied()
                .sum::<f64>()
        };
        let forest = sum_of(&classes.forest);
        let water = sum_of(&classes.water);
        let impervious = sum_of(&classes.impervious);
        let other = (1.0 - forest - water - impervious).max(0.0);
        Self {
            forest,
            water,
            impervious,
            other,
        }
    }

    /// Fraction whose production is simulated by the vertical balance
    /// (everything that is neither open water nor impervious).
    pub fn simulated(&self) -> f64 {
        self.forest + self.other
    }
}

/// What kind of response a zone has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneKind {
    /// Ordinary drainage sub-basin: full balance + hydrograph routing.
    Subbasin,
    /// Lake: input converts to outlet flow within one timestep.
    Lake,
}

/// One sub-catchment.
#[derive(Debug, Clone)]
pub struct Zone {
    /// Stable external id.
    pub id: u32,
    /// Drained area [m²].
    pub area: f64,
    /// Mean surface slope [m/m].
    pub slope: f64,
    /// Cumulative soil-layer depths z1 < z2 < z3 [m].
    pub depths: [f64; N_LAYERS],
    /// Dominant soil-class index per layer.
    pub soil: [usize; N_LAYERS],
    /// Integrated land-cover fractions.
    pub cover: CoverFractions,
    /// Manning roughness triplet (forest / water / other).
    pub manning: [f64; 3],
    pub kind: ZoneKind,
    /// Downstream channel reach receiving this zone's lateral inflow.
    pub reach: u32,
}

impl Zone {
    /// Thickness of each layer [m], from the cumulative depths.
    pub fn thicknesses(&self) -> [f64; N_LAYERS] {
        [
            self.depths[0],
            self.depths[1] - self.depths[0],
            self.depths[2] - self.depths[1],
        ]
    }

    /// Depth interval [top, bottom] of one layer [m].
    pub fn layer_span(&self, layer: usize) -> (f64, f64) {
        let top = if layer == 0 {
            0.0
        } else {
            self.depths[layer - 1]
        };
        (top, self.depths[layer])
    }
}

/// Validate that every zone's layer geometry and soil indices are usable
/// against the loaded soil table.
pub fn validate_zones(zones: &[Zone], n_soil_classes: usize) -> Result<()> {
    for zone in zones {
        if !(zone.depths[0] > 0.0 && zone.depths[1] > zone.depths[0] && zone.depths[2] > zone.depths[1])
        {
            return Err(Error::InvalidParameter(format!(
                "zone {}: cumulative depths {:?} must be strictly increasing from zero",
                zone.id, zone.depths
            )));
        }
        if zone.area <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "zone {}: area {} must be positive",
                zone.id, zone.area
            )));
        }
        for &class in &zone.soil {
            if class >= n_soil_classes {
                return Err(Error::UnknownSoilClass {
                    zone: zone.id,
                    class,
                    count: n_soil_classes,
                });
            }
        }
    }
    Ok(())
}

/// External inputs for one zone over one timestep.
///
/// Supplied by the meteorology / snowmelt / soil-temperature collaborators.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZoneForcing {
    /// Net water input reaching the ground (rain + melt) [mm].
    pub net_input: f64,
    /// Potential evapotranspiration [mm].
    pub pet: f64,
    /// Snow-cover depth [m].
    pub snow_depth: f64,
    /// Frost-front depth [m].
    pub frost_depth: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() < tol,
            "expected {expected} ± {tol}, got {actual}"
        );
    }

    fn test_zone(id: u32) -> Zone {
        Zone {
            id,
            area: 2.0e6,
            slope: 0.03,
            depths: [0.2, 0.6, 1.5],
            soil: [0, 0, 0],
            cover: CoverFractions {
                forest: 0.4,
                water: 0.05,
                impervious: 0.05,
                other: 0.5,
            },
            manning: [0.4, 0.03, 0.1],
            kind: ZoneKind::Subbasin,
            reach: 1,
        }
    }

    // -- Cover integration --

    #[test]
    fn occupation_integrates_class_sets() {
        let classes = CoverClasses {
            forest: vec![0, 1],
            water: vec![2],
            impervious: vec![3],
        };
        let row = [0.3, 0.2, 0.1, 0.05, 0.35];
        let cover = CoverFractions::from_occupation(&row, &classes);
        assert_approx(cover.forest, 0.5, 1e-12);
        assert_approx(cover.water, 0.1, 1e-12);
        assert_approx(cover.impervious, 0.05, 1e-12);
        assert_approx(cover.other, 0.35, 1e-12);
    }

    #[test]
    fn occupation_ignores_out_of_range_indices() {
        let classes = CoverClasses {
            forest: vec![7],
            water: vec![],
            impervious: vec![],
        };
        let cover = CoverFractions::from_occupation(&[0.5, 0.5], &classes);
        assert_eq!(cover.forest, 0.0);
        assert_approx(cover.other, 1.0, 1e-12);
    }

    #[test]
    fn other_never_negative() {
        let classes = CoverClasses {
            forest: vec![0],
            water: vec![1],
            impervious: vec![],
        };
        // Fractions that overshoot 1.0 by rounding.
        let cover = CoverFractions::from_occupation(&[0.7, 0.31], &classes);
        assert_eq!(cover.other, 0.0);
    }

    // -- Geometry --

    #[test]
    fn thicknesses_from_cumulative_depths() {
        let zone = test_zone(1);
        let t = zone.thicknesses();
        assert_approx(t[0], 0.2, 1e-12);
        assert_approx(t[1], 0.4, 1e-12);
        assert_approx(t[2], 0.9, 1e-12);
    }

    #[test]
    fn layer_span_covers_column() {
        let zone = test_zone(1);
        assert_eq!(zone.layer_span(0), (0.0, 0.2));
        assert_eq!(zone.layer_span(2), (0.6, 1.5));
    }

    // -- Validation --

    #[test]
    fn validates_soil_index_range() {
        let mut zone = test_zone(1);
        zone.soil = [0, 2, 0];
        match validate_zones(&[zone], 1) {
            Err(Error::UnknownSoilClass { zone: 1, class: 2, .. }) => {}
            other => panic!("expected UnknownSoilClass, got {other:?}"),
        }
    }

    #[test]
    fn validates_depth_ordering() {
        let mut zone = test_zone(1);
        zone.depths = [0.5, 0.4, 1.0];
        assert!(validate_zones(&[zone], 1).is_err());
    }
}
