//! # Glacis Core
//!
//! Core types for glacier-state analysis from optical satellite archives.
//!
//! This crate provides:
//! - `Raster<T>`: generic raster grid on ndarray, with `GeoTransform`
//! - `AnalysisGeometry` / `Footprint`: validated outline burned onto the grid
//! - `Scene` / `SceneSet`: ingested acquisitions, unique by id
//! - `ElevationModel`: DEM clipped to the footprint
//! - `DateWindow`: half-open acquisition windows

pub mod dem;
pub mod error;
pub mod geometry;
pub mod raster;
pub mod scene;
pub mod time;

pub use dem::ElevationModel;
pub use error::{Error, Result};
pub use geometry::{AnalysisGeometry, Footprint};
pub use raster::{BinaryMask, GeoTransform, Raster, RasterElement};
pub use scene::{Scene, SceneSet};
pub use time::DateWindow;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::geometry::{AnalysisGeometry, Footprint};
    pub use crate::raster::{BinaryMask, GeoTransform, Raster, RasterElement};
    pub use crate::scene::{Scene, SceneSet};
    pub use crate::time::DateWindow;
    pub use crate::ElevationModel;
    pub use crate::Algorithm;
}

/// Core trait for raster algorithms in Glacis.
///
/// Algorithms are pure functions of their input and parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
