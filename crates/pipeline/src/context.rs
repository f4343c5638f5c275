//! Validated, read-only inputs shared by every year of a run

use geo::{MultiPolygon, Rect};
use tracing::info;
use glacis_algorithms::statistics::{ElevationBands, ReductionStrategy, RegionReducer};
use glacis_core::raster::Raster;
use glacis_core::{AnalysisGeometry, ElevationModel, Footprint, Result};
use glacis_parallel::ProcessingMode;

use crate::config::PipelineConfig;

/// Analysis geometry, its footprint on the DEM grid, the clipped DEM and its
/// elevation bands.
///
/// Built once per run; construction fails on invalid configuration or a
/// degenerate geometry, before any per-year work starts.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    geometry: AnalysisGeometry,
    footprint: Footprint,
    dem: ElevationModel,
    bands: ElevationBands,
    search_buffer_m: f64,
    reduction: ReductionStrategy,
}

impl AnalysisContext {
    /// Buffer and simplify `outline` per `config`, burn it onto the DEM grid
    /// and clip the DEM to it.
    pub fn new(outline: impl Into<MultiPolygon<f64>>, dem: &Raster<f64>, config: &PipelineConfig) -> Result<Self> {
        config.validate()?;

        let geometry = AnalysisGeometry::new(
            outline,
            config.geometry.analysis_buffer_m,
            config.geometry.simplify_m,
        )?;
        let (rows, cols) = dem.shape();
        let footprint = geometry.rasterize(dem.transform(), rows, cols)?;
        let dem = ElevationModel::new(dem, &footprint, config.dem_label.clone())?;
        let bands = ElevationBands::new(&dem, config.hypsometry.bin_size_m)?;

        info!(
            covered_pixels = footprint.covered_pixels(),
            area_km2 = footprint.area_km2(),
            dem = dem.label(),
            "analysis context ready"
        );

        Ok(Self {
            geometry,
            footprint,
            dem,
            bands,
            search_buffer_m: config.geometry.search_buffer_m,
            reduction: config.reduction,
        })
    }

    pub fn geometry(&self) -> &AnalysisGeometry {
        &self.geometry
    }

    pub fn footprint(&self) -> &Footprint {
        &self.footprint
    }

    pub fn dem(&self) -> &ElevationModel {
        &self.dem
    }

    pub fn elevation_bands(&self) -> &ElevationBands {
        &self.bands
    }

    /// Bounding box used to query scene archives
    pub fn search_bbox(&self) -> Rect<f64> {
        self.geometry.search_bbox(self.search_buffer_m)
    }

    /// Reducer over the footprint with the configured strategy
    pub fn reducer(&self) -> Result<RegionReducer<'_>> {
        RegionReducer::new(&self.footprint, self.reduction, ProcessingMode::Parallel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon};
    use glacis_core::{Error, GeoTransform};

    fn dem(rows: usize, cols: usize) -> Raster<f64> {
        Raster::filled(rows, cols, 1200.0).with_transform(GeoTransform::new(0.0, rows as f64 * 30.0, 30.0, -30.0))
    }

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
        Polygon::new(LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]), vec![])
    }

    #[test]
    fn test_builds_footprint_on_dem_grid() {
        let config = PipelineConfig {
            geometry: crate::config::GeometryConfig {
                analysis_buffer_m: 0.0,
                search_buffer_m: 1000.0,
                simplify_m: 0.0,
            },
            ..PipelineConfig::default()
        };
        let ctx = AnalysisContext::new(rect(0.0, 0.0, 150.0, 150.0), &dem(10, 10), &config).unwrap();
        // centres at 15, 45, ..., 135 fall inside: 5 x 5 pixels
        assert_eq!(ctx.footprint().covered_pixels(), 25);
        assert_eq!(ctx.dem().label(), "NASADEM_HGT_001");
        let bbox = ctx.search_bbox();
        assert_eq!(bbox.min().x, -1000.0);
        assert_eq!(bbox.max().y, 1150.0);
    }

    #[test]
    fn test_degenerate_geometry_fails_early() {
        let config = PipelineConfig::default();
        let flat = rect(0.0, 0.0, 100.0, 0.0);
        let err = AnalysisContext::new(flat, &dem(10, 10), &config).unwrap_err();
        assert!(matches!(err, Error::DegenerateGeometry(_)));
    }

    #[test]
    fn test_invalid_config_fails_early() {
        let mut config = PipelineConfig::default();
        config.cleaning.edge_radius = 0;
        assert!(AnalysisContext::new(rect(0.0, 0.0, 150.0, 150.0), &dem(10, 10), &config).is_err());
    }
}
