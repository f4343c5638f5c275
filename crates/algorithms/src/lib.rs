//! # Glacis Algorithms
//!
//! Raster algorithms for glacier-state analysis.
//!
//! ## Available Algorithm Categories
//!
//! - **imagery**: NDSI and the snow/ice threshold classifier
//! - **morphology**: despeckling, focal max/min, edge bands
//! - **statistics**: region reductions, elevation sampling, elevation bands

mod maybe_rayon;

pub mod imagery;
pub mod morphology;
pub mod statistics;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::imagery::{classify, ndsi, ClassifierParams, SnowIceClassifier, SpectralPair};
    pub use crate::morphology::{
        component_sizes, despeckle, edge_band, focal_max, focal_min, CleaningParams, Despeckle,
        StructuringElement,
    };
    pub use crate::statistics::{
        ElevationBands, ElevationPercentiles, ElevationSampler, Reduction, ReductionStrategy,
        RegionReducer,
    };
    pub use glacis_core::prelude::*;
}
