//! Region statistics over the analysis footprint
//!
//! - **reduce**: area, valid fraction, percentiles and grouped sums at a
//!   sampling scale, exact or tiled
//! - **elevation**: DEM elevation under edge bands and masks
//! - **bands**: DEM binned into fixed-width elevation bands

pub mod bands;
pub mod elevation;
pub mod reduce;

pub use bands::{band_of, ElevationBands};
pub use elevation::{ElevationPercentiles, ElevationSampler};
pub use reduce::{Reduction, ReductionStrategy, RegionReducer};
