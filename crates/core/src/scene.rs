//! Ingested scenes and the merged scene set

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::raster::Raster;
use crate::time::DateWindow;

/// Derived band names carried by every ingested scene
pub mod bands {
    pub const GREEN: &str = "green";
    pub const SWIR1: &str = "swir1";
    /// Land surface temperature in °C
    pub const LST: &str = "lst";
}

/// One cloud-masked, band-derived, footprint-clipped acquisition.
///
/// Band rasters hold NaN where the pixel was flagged cloud/shadow or lies
/// outside the analysis footprint.
#[derive(Debug, Clone)]
pub struct Scene {
    id: String,
    sensor: String,
    acquired: DateTime<Utc>,
    bands: BTreeMap<String, Raster<f64>>,
}

impl Scene {
    pub fn new(
        id: impl Into<String>,
        sensor: impl Into<String>,
        acquired: DateTime<Utc>,
        bands: BTreeMap<String, Raster<f64>>,
    ) -> Self {
        Self {
            id: id.into(),
            sensor: sensor.into(),
            acquired,
            bands,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn sensor(&self) -> &str {
        &self.sensor
    }

    pub fn acquired(&self) -> DateTime<Utc> {
        self.acquired
    }

    pub fn band(&self, name: &str) -> Option<&Raster<f64>> {
        self.bands.get(name)
    }
}

/// Read-only set of scenes from every sensor, unique by scene id.
#[derive(Debug, Clone, Default)]
pub struct SceneSet {
    scenes: BTreeMap<String, Scene>,
}

impl SceneSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless a scene with the same id is already present.
    ///
    /// Returns `false` for a duplicate id; the first scene wins.
    pub fn insert(&mut self, scene: Scene) -> bool {
        if self.scenes.contains_key(scene.id()) {
            return false;
        }
        self.scenes.insert(scene.id().to_string(), scene);
        true
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Scene> {
        self.scenes.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.values()
    }

    /// Scenes acquired inside `window`, in acquisition order
    pub fn within(&self, window: &DateWindow) -> Vec<&Scene> {
        let mut hits: Vec<&Scene> = self
            .scenes
            .values()
            .filter(|s| window.contains(&s.acquired))
            .collect();
        hits.sort_by(|a, b| a.acquired.cmp(&b.acquired).then_with(|| a.id.cmp(&b.id)));
        hits
    }

    pub fn first_acquired(&self) -> Option<DateTime<Utc>> {
        self.scenes.values().map(|s| s.acquired).min()
    }

    pub fn last_acquired(&self) -> Option<DateTime<Utc>> {
        self.scenes.values().map(|s| s.acquired).max()
    }
}

impl Extend<Scene> for SceneSet {
    fn extend<I: IntoIterator<Item = Scene>>(&mut self, iter: I) {
        for scene in iter {
            self.insert(scene);
        }
    }
}
