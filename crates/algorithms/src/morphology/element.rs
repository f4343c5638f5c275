//! Structuring elements for focal mask operations
//!
//! A structuring element is the window shape used by focal max/min and
//! therefore by the edge band.

use serde::{Deserialize, Serialize};
use glacis_core::raster::Neighborhood;
use glacis_core::{Error, Result};

/// Shape of a focal window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "radius", rename_all = "snake_case")]
pub enum StructuringElement {
    /// Square window of given radius (side = 2*radius + 1)
    Square(usize),
    /// Plus-shaped window of given radius
    Cross(usize),
    /// Cells within Euclidean distance `radius` of the center
    Disk(usize),
}

impl Default for StructuringElement {
    fn default() -> Self {
        StructuringElement::Disk(2)
    }
}

impl StructuringElement {
    pub fn validate(&self) -> Result<()> {
        if self.radius() == 0 {
            return Err(Error::InvalidParameter {
                name: "radius",
                value: "0".to_string(),
                reason: "structuring element radius must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn radius(&self) -> usize {
        match self {
            StructuringElement::Square(r)
            | StructuringElement::Cross(r)
            | StructuringElement::Disk(r) => *r,
        }
    }

    /// (dr, dc) offsets relative to the center for all active cells
    pub fn offsets(&self) -> Vec<(isize, isize)> {
        match self {
            StructuringElement::Square(r) => Neighborhood::Square(*r).offsets(),
            StructuringElement::Disk(r) => Neighborhood::Circle(*r).offsets(),
            StructuringElement::Cross(r) => {
                let r = *r as isize;
                let mut offsets = Vec::with_capacity(4 * r as usize + 1);
                for d in -r..=r {
                    offsets.push((d, 0));
                    if d != 0 {
                        offsets.push((0, d));
                    }
                }
                offsets
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_disk_two() {
        let se = StructuringElement::default();
        assert_eq!(se, StructuringElement::Disk(2));
        // 5x5 square minus the four corners and the eight cells at distance sqrt(5)
        assert_eq!(se.offsets().len(), 13);
    }

    #[test]
    fn test_square_offsets() {
        let offsets = StructuringElement::Square(1).offsets();
        assert_eq!(offsets.len(), 9);
        assert!(offsets.contains(&(-1, -1)));
    }

    #[test]
    fn test_cross_offsets() {
        let offsets = StructuringElement::Cross(2).offsets();
        assert_eq!(offsets.len(), 9);
        assert!(offsets.contains(&(0, -2)));
        assert!(!offsets.contains(&(1, 1)));
    }

    #[test]
    fn test_validate_zero_radius() {
        assert!(StructuringElement::Square(0).validate().is_err());
        assert!(StructuringElement::Cross(0).validate().is_err());
        assert!(StructuringElement::Disk(0).validate().is_err());
        assert!(StructuringElement::Disk(1).validate().is_ok());
    }
}
