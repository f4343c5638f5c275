//! Elevation bands for hypsometry

use glacis_core::dem::ElevationModel;
use glacis_core::raster::{Raster, RasterElement};
use glacis_core::{Error, Result};

/// DEM binned into `floor(elevation / bin_size)` band ids.
///
/// Cells without elevation carry `i32::MIN`, which is also the raster's
/// no-data value.
#[derive(Debug, Clone)]
pub struct ElevationBands {
    bands: Raster<i32>,
    bin_size: f64,
}

impl ElevationBands {
    pub fn new(dem: &ElevationModel, bin_size: f64) -> Result<Self> {
        if !(bin_size.is_finite() && bin_size > 0.0) {
            return Err(Error::invalid("bin_size", bin_size, "must be finite and > 0"));
        }
        let nodata = i32::default_nodata();
        let mut bands = dem
            .elevation()
            .map(|elev| if elev.is_nan() { nodata } else { band_of(elev, bin_size) });
        bands.set_nodata(Some(nodata));
        Ok(Self { bands, bin_size })
    }

    pub fn raster(&self) -> &Raster<i32> {
        &self.bands
    }

    pub fn bin_size(&self) -> f64 {
        self.bin_size
    }

    /// Lower elevation bound, in metres, of a band id
    pub fn lower_bound_m(&self, band: i32) -> f64 {
        band as f64 * self.bin_size
    }
}

/// Band id of an elevation
pub fn band_of(elevation: f64, bin_size: f64) -> i32 {
    (elevation / bin_size).floor() as i32
}
