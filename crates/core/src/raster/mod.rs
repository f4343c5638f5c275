//! Raster data structures and operations

mod element;
mod geotransform;
mod grid;
mod neighborhood;

pub use element::RasterElement;
pub use geotransform::GeoTransform;
pub use grid::Raster;
pub use neighborhood::{neighbors_within, Neighborhood};

/// 0/1 mask raster; no-data always resolves to 0
pub type BinaryMask = Raster<u8>;
