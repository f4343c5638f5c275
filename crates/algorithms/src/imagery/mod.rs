//! Spectral imagery algorithms
//!
//! - Normalized difference: generic two-band index and NDSI
//! - Classification: binary snow/ice mask from NDSI and SWIR1 thresholds

mod classify;
mod indices;

pub use classify::{classify, ClassifierParams, SnowIceClassifier, SpectralPair};
pub use indices::{ndsi, normalized_difference, normalized_difference_value};
