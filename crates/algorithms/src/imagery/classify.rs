//! Snow/ice classification from green and SWIR1 reflectance
//!
//! A pixel is snow/ice when its NDSI is strictly above a threshold and its
//! SWIR1 reflectance is strictly below a ceiling. The second test rejects
//! bright surfaces (some clouds, bare rock in low sun) that pass on NDSI
//! alone.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use crate::maybe_rayon::*;
use glacis_core::raster::{BinaryMask, Raster};
use glacis_core::{Algorithm, Error, Result};

use super::indices::normalized_difference_value;

/// Thresholds shared by every classification in a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierParams {
    /// NDSI must be strictly greater than this
    pub ndsi_threshold: f64,
    /// SWIR1 reflectance must be strictly less than this
    pub swir1_max: f64,
}

impl Default for ClassifierParams {
    fn default() -> Self {
        Self {
            ndsi_threshold: 0.40,
            swir1_max: 0.20,
        }
    }
}

impl ClassifierParams {
    pub fn validate(&self) -> Result<()> {
        if !(-1.0..=1.0).contains(&self.ndsi_threshold) {
            return Err(Error::invalid(
                "ndsi_threshold",
                self.ndsi_threshold,
                "must lie in [-1, 1]",
            ));
        }
        if !self.swir1_max.is_finite() {
            return Err(Error::invalid("swir1_max", self.swir1_max, "must be finite"));
        }
        Ok(())
    }

    /// Classify one pixel; NaN in either band is never snow
    #[inline]
    pub fn is_snow(&self, green: f64, swir1: f64) -> bool {
        let index = normalized_difference_value(green, swir1);
        // NaN comparisons are false, so no-data falls through to 0
        index > self.ndsi_threshold && swir1 < self.swir1_max
    }
}

/// Input bands for [`SnowIceClassifier`]
#[derive(Debug, Clone)]
pub struct SpectralPair {
    pub green: Raster<f64>,
    pub swir1: Raster<f64>,
}

/// NDSI + SWIR1 threshold classifier
#[derive(Debug, Clone, Default)]
pub struct SnowIceClassifier;

impl Algorithm for SnowIceClassifier {
    type Input = SpectralPair;
    type Output = BinaryMask;
    type Params = ClassifierParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "SnowIceClassifier"
    }

    fn description(&self) -> &'static str {
        "Binary snow/ice mask from NDSI and SWIR1 thresholds"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        classify(&input.green, &input.swir1, &params)
    }
}

/// Classify a green/SWIR1 pair into a 0/1 snow/ice mask.
///
/// Pixels where either band is no-data (NaN) resolve to 0.
///
/// # Arguments
/// * `green` - Green reflectance composite
/// * `swir1` - SWIR1 reflectance composite, same grid as `green`
/// * `params` - Run-wide thresholds
pub fn classify(green: &Raster<f64>, swir1: &Raster<f64>, params: &ClassifierParams) -> Result<BinaryMask> {
    params.validate()?;
    green.ensure_same_shape(swir1)?;

    let (rows, cols) = green.shape();

    let data: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![0u8; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let g = unsafe { green.get_unchecked(row, col) };
                let s = unsafe { swir1.get_unchecked(row, col) };
                if params.is_snow(g, s) {
                    *out = 1;
                }
            }
            row_data
        })
        .collect();

    let array = Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    green.with_data(array)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(green: f64, swir1: f64) -> (Raster<f64>, Raster<f64>) {
        (Raster::filled(2, 2, green), Raster::filled(2, 2, swir1))
    }

    #[test]
    fn test_bright_green_dark_swir_is_snow() {
        // NDSI = 0.5 / 0.7 = 0.714
        let (g, s) = pair(0.6, 0.1);
        let mask = classify(&g, &s, &ClassifierParams::default()).unwrap();
        assert_eq!(mask.get(0, 0).unwrap(), 1);
        assert_eq!(mask.count_ones(), 4);
    }

    #[test]
    fn test_low_ndsi_is_not_snow() {
        // NDSI = 0.05 / 0.55 = 0.091
        let (g, s) = pair(0.3, 0.25);
        let mask = classify(&g, &s, &ClassifierParams::default()).unwrap();
        assert_eq!(mask.count_ones(), 0);
    }

    #[test]
    fn test_high_swir_rejected_despite_ndsi() {
        // NDSI = 0.6 / 1.0 = 0.6, but SWIR1 0.2 is not < 0.2
        let (g, s) = pair(0.8, 0.2);
        let mask = classify(&g, &s, &ClassifierParams::default()).unwrap();
        assert_eq!(mask.count_ones(), 0);
    }

    #[test]
    fn test_threshold_is_strict() {
        // NDSI exactly 0.4: green = 0.7, swir = 0.3 -> 0.4 / 1.0
        let params = ClassifierParams { ndsi_threshold: 0.4, swir1_max: 1.0 };
        assert!(!params.is_snow(0.7, 0.3));
        assert!(params.is_snow(0.71, 0.3));
    }

    #[test]
    fn test_nodata_resolves_to_zero() {
        let (mut g, s) = pair(0.6, 0.1);
        g.set(1, 1, f64::NAN).unwrap();
        let mask = classify(&g, &s, &ClassifierParams::default()).unwrap();
        assert_eq!(mask.get(1, 1).unwrap(), 0);
        assert_eq!(mask.count_ones(), 3);
    }

    #[test]
    fn test_algorithm_trait() {
        let (green, swir1) = pair(0.6, 0.1);
        let mask = SnowIceClassifier.execute_default(SpectralPair { green, swir1 }).unwrap();
        assert_eq!(mask.count_ones(), 4);
    }

    #[test]
    fn test_invalid_threshold() {
        let (g, s) = pair(0.6, 0.1);
        let params = ClassifierParams { ndsi_threshold: 2.0, swir1_max: 0.2 };
        assert!(classify(&g, &s, &params).is_err());
    }
}
