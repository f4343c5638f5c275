//! Normalized-difference spectral indices
//!
//! The pipeline only needs NDSI, but the two-band normalized difference is
//! kept generic since NDSI is one instance of it.

use ndarray::Array2;
use crate::maybe_rayon::*;
use glacis_core::raster::Raster;
use glacis_core::{Error, Result};

/// Compute the normalized difference between two bands:
///
/// `(band_a - band_b) / (band_a + band_b)`
///
/// Result is in the range [-1, 1] for non-negative inputs. Pixels where the
/// band sum is ~0 or either band is no-data are set to NaN.
///
/// # Arguments
/// * `band_a` - Numerator positive band
/// * `band_b` - Numerator negative band
pub fn normalized_difference(band_a: &Raster<f64>, band_b: &Raster<f64>) -> Result<Raster<f64>> {
    band_a.ensure_same_shape(band_b)?;

    let (rows, cols) = band_a.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let a = unsafe { band_a.get_unchecked(row, col) };
                let b = unsafe { band_b.get_unchecked(row, col) };
                *out = normalized_difference_value(a, b);
            }
            row_data
        })
        .collect();

    let array = Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    let mut output = band_a.with_data(array)?;
    output.set_nodata(Some(f64::NAN));
    Ok(output)
}

/// Single-pixel normalized difference; NaN for no-data or a ~0 sum
pub fn normalized_difference_value(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        return f64::NAN;
    }
    let sum = a + b;
    if sum.abs() < 1e-10 {
        return f64::NAN;
    }
    (a - b) / sum
}

/// Normalized Difference Snow Index
///
/// `NDSI = (Green - SWIR1) / (Green + SWIR1)`
///
/// Snow and ice reflect strongly in the green and absorb in the shortwave
/// infrared, so values well above zero indicate snow/ice.
///
/// # Arguments
/// * `green` - Green reflectance
/// * `swir1` - Shortwave infrared (~1.6 µm) reflectance
pub fn ndsi(green: &Raster<f64>, swir1: &Raster<f64>) -> Result<Raster<f64>> {
    normalized_difference(green, swir1)
}
