//! Elevation sampling under masks
//!
//! Two modes feed the snowline outputs:
//! - **edge**: median DEM elevation under an edge band
//! - **interior**: p10 / p50 / p90 DEM elevation under a cleaned mask

use serde::{Deserialize, Serialize};
use glacis_core::dem::ElevationModel;
use glacis_core::raster::BinaryMask;
use glacis_core::Result;

use super::reduce::{Reduction, RegionReducer};

/// Quantiles of elevation under a mask, in metres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationPercentiles {
    pub p10: f64,
    pub p50: f64,
    pub p90: f64,
}

/// Samples an elevation model through a region reducer
#[derive(Debug, Clone, Copy)]
pub struct ElevationSampler<'a> {
    reducer: RegionReducer<'a>,
    dem: &'a ElevationModel,
}

impl<'a> ElevationSampler<'a> {
    pub fn new(reducer: RegionReducer<'a>, dem: &'a ElevationModel) -> Self {
        Self { reducer, dem }
    }

    /// Median elevation under `edges`; `None` when no edge pixel has a
    /// valid elevation.
    pub fn edge_median(&self, edges: &BinaryMask, scale_m: f64) -> Result<Reduction<Option<f64>>> {
        self.reducer.median(self.dem.elevation(), Some(edges), scale_m)
    }

    /// p10 / p50 / p90 elevation under `mask`
    pub fn interior_percentiles(
        &self,
        mask: &BinaryMask,
        scale_m: f64,
    ) -> Result<Reduction<Option<ElevationPercentiles>>> {
        let reduction = self
            .reducer
            .percentiles(self.dem.elevation(), Some(mask), &[0.1, 0.5, 0.9], scale_m)?;
        Ok(reduction.map(|q| {
            q.map(|q| ElevationPercentiles {
                p10: q[0],
                p50: q[1],
                p90: q[2],
            })
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glacis_core::geometry::Footprint;
    use glacis_core::raster::Raster;
    use glacis_core::GeoTransform;

    /// Elevation rising 10 m per row, starting at 3000 m
    fn ramp(rows: usize, cols: usize) -> (Footprint, ElevationModel) {
        let gt = GeoTransform::new(0.0, rows as f64 * 30.0, 30.0, -30.0);
        let fp = Footprint::full(gt, rows, cols);
        let mut dem = Raster::new(rows, cols).with_transform(gt);
        for r in 0..rows {
            for c in 0..cols {
                dem.set(r, c, 3000.0 + 10.0 * r as f64).unwrap();
            }
        }
        let model = ElevationModel::new(&dem, &fp, "test").unwrap();
        (fp, model)
    }

    #[test]
    fn test_edge_median() {
        let (fp, dem) = ramp(11, 3);
        let mut edges = BinaryMask::new(11, 3);
        edges.set(4, 1, 1).unwrap();
        edges.set(6, 1, 1).unwrap();
        let sampler = ElevationSampler::new(RegionReducer::exact(&fp), &dem);
        let median = sampler.edge_median(&edges, 30.0).unwrap();
        assert_relative_eq!(median.value.unwrap(), 3050.0);
    }

    #[test]
    fn test_interior_percentiles() {
        let (fp, dem) = ramp(11, 1);
        let mask = BinaryMask::filled(11, 1, 1);
        let sampler = ElevationSampler::new(RegionReducer::exact(&fp), &dem);
        let p = sampler.interior_percentiles(&mask, 30.0).unwrap().value.unwrap();
        assert_relative_eq!(p.p10, 3010.0);
        assert_relative_eq!(p.p50, 3050.0);
        assert_relative_eq!(p.p90, 3090.0);
    }

    #[test]
    fn test_empty_edges_are_none() {
        let (fp, dem) = ramp(5, 5);
        let sampler = ElevationSampler::new(RegionReducer::exact(&fp), &dem);
        let median = sampler.edge_median(&BinaryMask::new(5, 5), 30.0).unwrap();
        assert!(median.value.is_none());
        let p = sampler.interior_percentiles(&BinaryMask::new(5, 5), 30.0).unwrap();
        assert!(p.value.is_none());
    }
}
