//! Focal maximum and minimum over binary masks
//!
//! Unlike a full-window filter, the window is truncated at the raster
//! border: a border pixel takes the max/min over the in-grid part of its
//! window only, so an all-ones mask stays all ones. The `_within` variants
//! truncate the window to a support mask the same way.

use ndarray::Array2;
use crate::maybe_rayon::*;
use glacis_core::raster::{neighbors_within, BinaryMask};
use glacis_core::{Algorithm, Error, Result};

use super::element::StructuringElement;

/// Reduction applied over the focal window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocalExtreme {
    Max,
    Min,
}

/// Parameters for [`FocalMask`]
#[derive(Debug, Clone, Default)]
pub struct FocalMaskParams {
    pub element: StructuringElement,
    pub extreme: Option<FocalExtreme>,
}

/// Focal max (dilation) or min (erosion) of a 0/1 mask
#[derive(Debug, Clone, Default)]
pub struct FocalMask;

impl Algorithm for FocalMask {
    type Input = BinaryMask;
    type Output = BinaryMask;
    type Params = FocalMaskParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "FocalMask"
    }

    fn description(&self) -> &'static str {
        "Focal maximum or minimum of a binary mask with border-truncated windows"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        match params.extreme.unwrap_or(FocalExtreme::Max) {
            FocalExtreme::Max => focal_max(&input, &params.element),
            FocalExtreme::Min => focal_min(&input, &params.element),
        }
    }
}

/// Focal maximum: 1 if any in-grid window cell is non-zero
pub fn focal_max(mask: &BinaryMask, element: &StructuringElement) -> Result<BinaryMask> {
    focal_extreme(mask, element, FocalExtreme::Max, None)
}

/// Focal minimum: 0 if any in-grid window cell is zero
pub fn focal_min(mask: &BinaryMask, element: &StructuringElement) -> Result<BinaryMask> {
    focal_extreme(mask, element, FocalExtreme::Min, None)
}

/// Focal maximum over the window cells where `support` is 1
pub fn focal_max_within(
    mask: &BinaryMask,
    element: &StructuringElement,
    support: &BinaryMask,
) -> Result<BinaryMask> {
    focal_extreme(mask, element, FocalExtreme::Max, Some(support))
}

/// Focal minimum over the window cells where `support` is 1
pub fn focal_min_within(
    mask: &BinaryMask,
    element: &StructuringElement,
    support: &BinaryMask,
) -> Result<BinaryMask> {
    focal_extreme(mask, element, FocalExtreme::Min, Some(support))
}

fn focal_extreme(
    mask: &BinaryMask,
    element: &StructuringElement,
    extreme: FocalExtreme,
    support: Option<&BinaryMask>,
) -> Result<BinaryMask> {
    element.validate()?;
    if let Some(support) = support {
        mask.ensure_same_shape(support)?;
    }

    let (rows, cols) = mask.shape();
    let offsets = element.offsets();

    let data: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![0u8; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let mut window = neighbors_within(row, col, rows, cols, &offsets)
                    .filter(|&(nr, nc)| support.is_none_or(|s| unsafe { s.get_unchecked(nr, nc) } == 1))
                    .map(|(nr, nc)| unsafe { mask.get_unchecked(nr, nc) } != 0);
                let hit = match extreme {
                    FocalExtreme::Max => window.any(|set| set),
                    FocalExtreme::Min => window.all(|set| set),
                };
                *out = u8::from(hit);
            }
            row_data
        })
        .collect();

    let array = Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    mask.with_data(array)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_pixel(rows: usize, cols: usize, r: usize, c: usize) -> BinaryMask {
        let mut m = BinaryMask::new(rows, cols);
        m.set(r, c, 1).unwrap();
        m
    }

    #[test]
    fn test_max_grows_disk() {
        let m = single_pixel(9, 9, 4, 4);
        let result = focal_max(&m, &StructuringElement::Disk(2)).unwrap();
        assert_eq!(result.count_ones(), 13);
        assert_eq!(result.get(4, 6).unwrap(), 1);
        assert_eq!(result.get(6, 6).unwrap(), 0);
    }

    #[test]
    fn test_min_removes_isolated_pixel() {
        let m = single_pixel(9, 9, 4, 4);
        let result = focal_min(&m, &StructuringElement::Square(1)).unwrap();
        assert_eq!(result.count_ones(), 0);
    }

    #[test]
    fn test_border_truncation_keeps_full_mask() {
        let m = BinaryMask::filled(5, 5, 1);
        let result = focal_min(&m, &StructuringElement::Disk(2)).unwrap();
        assert_eq!(result.count_ones(), 25);
    }

    #[test]
    fn test_max_near_corner() {
        let m = single_pixel(4, 4, 0, 0);
        let result = focal_max(&m, &StructuringElement::Square(1)).unwrap();
        assert_eq!(result.count_ones(), 4);
    }

    #[test]
    fn test_support_truncates_window() {
        // Ones inside a 3x3 support block, zeros around it
        let mut support = BinaryMask::new(7, 7);
        for r in 2..5 {
            for c in 2..5 {
                support.set(r, c, 1).unwrap();
            }
        }
        let m = support.clone();
        let element = StructuringElement::Disk(2);

        let min = focal_min_within(&m, &element, &support).unwrap();
        assert_eq!(min.get(2, 2).unwrap(), 1);
        assert_eq!(focal_min(&m, &element).unwrap().get(2, 2).unwrap(), 0);

        let max = focal_max_within(&BinaryMask::new(7, 7), &element, &support).unwrap();
        assert_eq!(max.count_ones(), 0);
    }

    #[test]
    fn test_algorithm_trait_min() {
        let m = single_pixel(5, 5, 2, 2);
        let params = FocalMaskParams {
            element: StructuringElement::Square(1),
            extreme: Some(FocalExtreme::Min),
        };
        let result = FocalMask.execute(m, params).unwrap();
        assert_eq!(result.count_ones(), 0);
    }
}
