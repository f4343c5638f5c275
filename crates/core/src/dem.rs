//! Elevation model on the analysis grid

use crate::error::{Error, Result};
use crate::geometry::Footprint;
use crate::raster::Raster;

/// DEM clipped to the analysis footprint; NaN outside it or where the source
/// carries no-data.
#[derive(Debug, Clone)]
pub struct ElevationModel {
    elevation: Raster<f64>,
    label: String,
}

impl ElevationModel {
    /// Clip `elevation` to `footprint`; source no-data becomes NaN
    pub fn new(elevation: &Raster<f64>, footprint: &Footprint, label: impl Into<String>) -> Result<Self> {
        let source_nodata = elevation.nodata();
        let cleaned = elevation.map(|v| if v.is_nan() || source_nodata.is_some_and(|nd| v == nd) { f64::NAN } else { v });
        let clipped = footprint.clip(&cleaned)?;
        if clipped.valid_count() == 0 {
            return Err(Error::DegenerateGeometry(
                "elevation model has no valid cell inside the analysis footprint".into(),
            ));
        }
        Ok(Self {
            elevation: clipped,
            label: label.into(),
        })
    }

    pub fn elevation(&self) -> &Raster<f64> {
        &self.elevation
    }

    pub fn shape(&self) -> (usize, usize) {
        self.elevation.shape()
    }

    /// Dataset label recorded in output rows
    pub fn label(&self) -> &str {
        &self.label
    }
}
