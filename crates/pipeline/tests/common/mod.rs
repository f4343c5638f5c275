//! Synthetic glacier shared by the integration tests
//!
//! A 40 x 40 grid of 30 m pixels whose elevation rises 5 m per row from
//! 1000 m at the top. Snow always covers whole rows from the top, so every
//! elevation band (10 rows at 50 m bins) is either fully covered or empty.

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use geo::{LineString, Polygon};
use glacis_core::{GeoTransform, Raster, SceneSet};
use glacis_pipeline::config::Period;
use glacis_pipeline::sensor::{SensorProfile, LANDSAT_C2_REFLECTANCE, LANDSAT_C2_THERMAL};
use glacis_pipeline::{AnalysisContext, MemoryArchive, PipelineConfig, RawScene, SceneArchive, SceneIngestor};

pub const ROWS: usize = 40;
pub const COLS: usize = 40;
pub const CELL: f64 = 30.0;

/// km² of one fully covered row at the native scale
pub const ROW_KM2: f64 = COLS as f64 * CELL * CELL / 1.0e6;

/// Raw thermal value written into every scene
pub const THERMAL_DN: f64 = 40_000.0;

pub fn grid() -> GeoTransform {
    GeoTransform::new(0.0, ROWS as f64 * CELL, CELL, -CELL)
}

pub fn outline() -> Polygon<f64> {
    outline_from_row(0)
}

/// Outline covering rows `first_row..ROWS` by pixel centre; use it with a
/// zero analysis buffer
pub fn outline_from_row(first_row: usize) -> Polygon<f64> {
    let size = ROWS as f64 * CELL;
    let top = (ROWS - first_row) as f64 * CELL;
    Polygon::new(
        LineString::from(vec![(0.0, 0.0), (size, 0.0), (size, top), (0.0, top), (0.0, 0.0)]),
        vec![],
    )
}

pub fn elevation_of_row(row: usize) -> f64 {
    1000.0 + 5.0 * row as f64
}

pub fn dem() -> Raster<f64> {
    let data = (0..ROWS)
        .flat_map(|r| std::iter::repeat_n(elevation_of_row(r), COLS))
        .collect();
    Raster::from_vec(data, ROWS, COLS).unwrap().with_transform(grid())
}

/// Raw reflectance number that scales back to `reflectance`
pub fn reflectance_dn(reflectance: f64) -> f64 {
    (reflectance - LANDSAT_C2_REFLECTANCE.offset) / LANDSAT_C2_REFLECTANCE.scale
}

pub fn expected_lst_c() -> f64 {
    LANDSAT_C2_THERMAL.apply(THERMAL_DN) - 273.15
}

/// Scene with snow (NDSI 0.71, SWIR1 0.10) on rows `0..snow_rows` and bare
/// ground (NDSI 0.09) below
pub fn raw_scene(profile: &SensorProfile, id: &str, ymd: (i32, u32, u32), snow_rows: usize) -> RawScene {
    let band = |snow: f64, bare: f64| {
        let data = (0..ROWS)
            .flat_map(|r| {
                let v = if r < snow_rows { snow } else { bare };
                std::iter::repeat_n(reflectance_dn(v), COLS)
            })
            .collect();
        Raster::from_vec(data, ROWS, COLS).unwrap().with_transform(grid())
    };
    let (y, m, d) = ymd;
    let mut scene = RawScene::new(id, Utc.with_ymd_and_hms(y, m, d, 14, 30, 0).unwrap())
        .with_quality(profile.qa_band.clone(), Raster::new(ROWS, COLS).with_transform(grid()))
        .with_band(profile.green_band.clone(), band(0.6, 0.3))
        .with_band(profile.swir1_band.clone(), band(0.1, 0.25));
    if let Some(thermal) = &profile.thermal_band {
        scene = scene.with_band(thermal.clone(), Raster::filled(ROWS, COLS, THERMAL_DN).with_transform(grid()));
    }
    scene
}

/// Nine OLI scenes:
/// - 2000 season (Sep-Nov 2000): snow on 30 rows
/// - 2001 season (Sep-Nov 2001): snow on 20 rows
/// - 2000 summer (Jan-Mar 2000): snow on 20 rows
pub fn reference_archive() -> MemoryArchive {
    let oli = SensorProfile::landsat_oli("LC08");
    let mut archive = MemoryArchive::new("LC08");
    for month in [9, 10, 11] {
        archive.push(raw_scene(&oli, &format!("season2000-{month}"), (2000, month, 10), 30));
        archive.push(raw_scene(&oli, &format!("season2001-{month}"), (2001, month, 10), 20));
    }
    for month in [1, 2, 3] {
        archive.push(raw_scene(&oli, &format!("summer2000-{month}"), (2000, month, 10), 20));
    }
    archive
}

/// Reference configuration relaxed so that the small synthetic glacier
/// passes the snowline and hypsometry gates
pub fn config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.years.first = Some(2000);
    config.years.last = 2001;
    config.gates.snowline.min_glacier_km2 = 0.5;
    config.gates.hypsometry.min_scenes = 3;
    config.hypsometry.periods = vec![Period::new("Test", 2000, 2001)];
    config.threads = Some(2);
    config
}

pub fn context(config: &PipelineConfig) -> AnalysisContext {
    AnalysisContext::new(outline(), &dem(), config).unwrap()
}

pub fn ingest(context: &AnalysisContext, config: &PipelineConfig, archive: &MemoryArchive) -> SceneSet {
    let archives: [&dyn SceneArchive; 1] = [archive];
    SceneIngestor::new(context, &config.sensors).ingest(&archives).0
}
