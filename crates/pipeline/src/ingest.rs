//! Scene ingestion
//!
//! Each archive is queried with the search bounding box. Its raw scenes are
//! cloud/shadow masked from the quality band, converted to the derived
//! `green` / `swir1` / `lst` bands and clipped to the footprint, then merged
//! into one [`SceneSet`].
//!
//! A misconfigured sensor (no profile, missing required band, grid mismatch,
//! failing query) is skipped as a whole with a warning. Other sensors still
//! contribute.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use geo::{Intersects, Rect};
use serde::Serialize;
use tracing::{debug, info, warn};
use glacis_core::raster::Raster;
use glacis_core::scene::bands;
use glacis_core::{DateWindow, Error, Footprint, Result, Scene, SceneSet};

use crate::context::AnalysisContext;
use crate::sensor::SensorProfile;

/// A scene as delivered by an archive: raw band values and quality bitmasks
#[derive(Debug, Clone)]
pub struct RawScene {
    pub id: String,
    pub acquired: DateTime<Utc>,
    /// Raw digital numbers keyed by archive band name
    pub bands: BTreeMap<String, Raster<f64>>,
    /// Bit-packed quality bands keyed by archive band name
    pub quality: BTreeMap<String, Raster<u16>>,
}

impl RawScene {
    pub fn new(id: impl Into<String>, acquired: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            acquired,
            bands: BTreeMap::new(),
            quality: BTreeMap::new(),
        }
    }

    /// Builder-style band insertion
    pub fn with_band(mut self, name: impl Into<String>, raster: Raster<f64>) -> Self {
        self.bands.insert(name.into(), raster);
        self
    }

    /// Builder-style quality band insertion
    pub fn with_quality(mut self, name: impl Into<String>, raster: Raster<u16>) -> Self {
        self.quality.insert(name.into(), raster);
        self
    }

    /// Ground extent of the scene grid, `None` for a scene without rasters
    pub fn extent(&self) -> Option<Rect<f64>> {
        let (rows, cols, transform) = match self.quality.values().next() {
            Some(q) => (q.rows(), q.cols(), q.transform()),
            None => {
                let b = self.bands.values().next()?;
                (b.rows(), b.cols(), b.transform())
            }
        };
        Some(transform.extent(rows, cols))
    }
}

/// A queryable source of raw scenes for one sensor
pub trait SceneArchive: Send + Sync {
    /// Sensor id, matched against [`SensorProfile::sensor`]
    fn sensor(&self) -> &str;

    /// Scenes intersecting `bbox`, optionally restricted to a date window
    fn query(&self, bbox: &Rect<f64>, window: Option<&DateWindow>) -> Result<Vec<RawScene>>;
}

/// In-memory archive
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    sensor: String,
    scenes: Vec<RawScene>,
}

impl MemoryArchive {
    pub fn new(sensor: impl Into<String>) -> Self {
        Self {
            sensor: sensor.into(),
            scenes: Vec::new(),
        }
    }

    pub fn push(&mut self, scene: RawScene) {
        self.scenes.push(scene);
    }

    pub fn with_scene(mut self, scene: RawScene) -> Self {
        self.push(scene);
        self
    }
}

impl SceneArchive for MemoryArchive {
    fn sensor(&self) -> &str {
        &self.sensor
    }

    fn query(&self, bbox: &Rect<f64>, window: Option<&DateWindow>) -> Result<Vec<RawScene>> {
        Ok(self
            .scenes
            .iter()
            .filter(|s| s.extent().is_some_and(|e| e.intersects(bbox)))
            .filter(|s| window.is_none_or(|w| w.contains(&s.acquired)))
            .cloned()
            .collect())
    }
}

/// Why a sensor contributed nothing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedSensor {
    pub sensor: String,
    pub reason: String,
}

/// Ingestion totals
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    /// Scenes accepted per sensor
    pub scenes_per_sensor: BTreeMap<String, usize>,
    pub skipped: Vec<SkippedSensor>,
    /// Scenes dropped because their id was already present
    pub duplicates: usize,
}

/// Builds the run's [`SceneSet`] from a list of archives
pub struct SceneIngestor<'a> {
    context: &'a AnalysisContext,
    profiles: &'a [SensorProfile],
}

impl<'a> SceneIngestor<'a> {
    pub fn new(context: &'a AnalysisContext, profiles: &'a [SensorProfile]) -> Self {
        Self { context, profiles }
    }

    /// Ingest every archive. Never fails as a whole: per-sensor problems are
    /// reported in the [`IngestReport`].
    pub fn ingest(&self, archives: &[&dyn SceneArchive]) -> (SceneSet, IngestReport) {
        let bbox = self.context.search_bbox();
        let mut set = SceneSet::new();
        let mut report = IngestReport::default();

        for archive in archives {
            let sensor = archive.sensor();
            match self.ingest_sensor(*archive, &bbox) {
                Ok(scenes) => {
                    let mut accepted = 0usize;
                    for scene in scenes {
                        let id = scene.id().to_string();
                        if set.insert(scene) {
                            accepted += 1;
                        } else {
                            debug!(sensor, scene = %id, "duplicate scene id, keeping the first");
                            report.duplicates += 1;
                        }
                    }
                    debug!(sensor, accepted, "sensor ingested");
                    *report.scenes_per_sensor.entry(sensor.to_string()).or_insert(0) += accepted;
                }
                Err(e) => {
                    warn!(sensor, error = %e, "skipping sensor");
                    report.skipped.push(SkippedSensor {
                        sensor: sensor.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            scenes = set.len(),
            sensors = report.scenes_per_sensor.len(),
            skipped = report.skipped.len(),
            "ingestion complete"
        );
        (set, report)
    }

    fn ingest_sensor(&self, archive: &dyn SceneArchive, bbox: &Rect<f64>) -> Result<Vec<Scene>> {
        let sensor = archive.sensor();
        let profile = self
            .profiles
            .iter()
            .find(|p| p.sensor == sensor)
            .ok_or_else(|| Error::UnknownSensor(sensor.to_string()))?;

        archive
            .query(bbox, None)?
            .iter()
            .map(|raw| prepare_scene(raw, profile, self.context.footprint()))
            .collect()
    }
}

/// Mask, convert and clip one raw scene
///
/// The quality band named by the profile is required like the reflectance
/// bands; without it the scene fails with [`Error::MissingBand`].
pub fn prepare_scene(raw: &RawScene, profile: &SensorProfile, footprint: &Footprint) -> Result<Scene> {
    let missing = |name: &str| Error::MissingBand {
        sensor: profile.sensor.clone(),
        scene: raw.id.clone(),
        band: name.to_string(),
    };
    let required = |name: &str| raw.bands.get(name).ok_or_else(|| missing(name));

    let quality = raw.quality.get(&profile.qa_band).ok_or_else(|| missing(&profile.qa_band))?;
    let coverage = footprint.coverage();
    coverage.ensure_same_shape(quality)?;

    // 1 where the pixel is clear and inside the footprint
    let usable = quality.zip_map(coverage, |q, inside| u8::from(inside == 1 && !profile.is_excluded(q)))?;

    let mut derived = BTreeMap::new();
    derived.insert(
        bands::GREEN.to_string(),
        convert(&usable, required(&profile.green_band)?, |v| profile.reflectance(v))?,
    );
    derived.insert(
        bands::SWIR1.to_string(),
        convert(&usable, required(&profile.swir1_band)?, |v| profile.reflectance(v))?,
    );
    if let Some(thermal) = profile.thermal_band.as_deref() {
        match raw.bands.get(thermal) {
            Some(source) => {
                derived.insert(bands::LST.to_string(), convert(&usable, source, |v| profile.temperature_c(v))?);
            }
            None => debug!(scene = %raw.id, band = thermal, "thermal band absent"),
        }
    }

    Ok(Scene::new(
        raw.id.clone(),
        profile.sensor.clone(),
        raw.acquired,
        derived,
    ))
}

/// Apply `f` to usable, valid raw values; NaN everywhere else
fn convert(usable: &Raster<u8>, source: &Raster<f64>, f: impl Fn(f64) -> f64) -> Result<Raster<f64>> {
    let nodata = source.nodata();
    usable.zip_map(source, |ok, v| {
        if ok == 1 && !v.is_nan() && nodata != Some(v) {
            f(v)
        } else {
            f64::NAN
        }
    })
}
