//! Binary mask morphology
//!
//! - **Despeckle**: drop small 8-connected components
//! - **Focal max/min**: dilation and erosion with border-truncated windows
//! - **Edge band**: pixels where focal max and focal min disagree

mod despeckle;
mod edge;
mod element;
mod focal;

pub use despeckle::{component_sizes, despeckle, CleaningParams, Despeckle};
pub use edge::edge_band;
pub use element::StructuringElement;
pub use focal::{
    focal_max, focal_max_within, focal_min, focal_min_within, FocalExtreme, FocalMask, FocalMaskParams,
};
