//! Boundary band of a cleaned mask
//!
//! A pixel is on the edge when the focal max and focal min of the mask
//! differ over its window, which yields a band a few pixels wide on both
//! sides of every 0/1 transition rather than a one-pixel skeleton.

use glacis_core::geometry::Footprint;
use glacis_core::raster::BinaryMask;
use glacis_core::Result;

use super::element::StructuringElement;
use super::focal::{focal_max_within, focal_min_within};

/// Edge band of `mask` within `footprint`.
///
/// Only footprint pixels take part in a window, so a mask that reaches the
/// footprint boundary has no edge there. No-data inside the footprint reads
/// as 0. The result is 0 outside the footprint.
///
/// # Arguments
/// * `mask` - Cleaned 0/1 mask on the footprint grid
/// * `footprint` - Analysis coverage
/// * `radius` - Disk radius in pixels
pub fn edge_band(mask: &BinaryMask, footprint: &Footprint, radius: usize) -> Result<BinaryMask> {
    let element = StructuringElement::Disk(radius);
    element.validate()?;

    let coverage = footprint.coverage();
    let unmasked = mask.zip_map(coverage, |m, inside| u8::from(m == 1 && inside == 1))?;

    let max = focal_max_within(&unmasked, &element, coverage)?;
    let min = focal_min_within(&unmasked, &element, coverage)?;

    let changes = max.zip_map(&min, |hi, lo| u8::from(hi != lo))?;
    changes.zip_map(coverage, |edge, inside| edge & inside)
}
