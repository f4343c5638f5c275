//! Removal of small connected patches from a binary mask
//!
//! Components are 8-connected groups of 1-pixels. Each pixel gets the size
//! of its component, saturated at a search cap, and is kept only when that
//! size reaches the minimum. Because whole components are either kept or
//! dropped, applying the filter twice gives the same mask as applying it
//! once.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;
use glacis_core::raster::{BinaryMask, Neighborhood, Raster};
use glacis_core::{Algorithm, Error, Result};

/// Parameters for despeckling and the edge band that follows it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningParams {
    /// Components smaller than this many pixels are removed
    pub min_component_pixels: u32,
    /// Component sizes saturate at this count
    pub max_component_search: u32,
    /// Disk radius, in pixels, of the focal window used for edges
    pub edge_radius: usize,
}

impl Default for CleaningParams {
    fn default() -> Self {
        Self {
            min_component_pixels: 200,
            max_component_search: 1024,
            edge_radius: 2,
        }
    }
}

impl CleaningParams {
    pub fn validate(&self) -> Result<()> {
        if self.max_component_search == 0 {
            return Err(Error::invalid(
                "max_component_search",
                self.max_component_search,
                "must be at least 1",
            ));
        }
        if self.min_component_pixels > self.max_component_search {
            return Err(Error::invalid(
                "min_component_pixels",
                self.min_component_pixels,
                format!(
                    "cannot exceed max_component_search ({}), no component could qualify",
                    self.max_component_search
                ),
            ));
        }
        if self.edge_radius == 0 {
            return Err(Error::invalid("edge_radius", self.edge_radius, "must be at least 1"));
        }
        Ok(())
    }
}

/// Despeckle algorithm
#[derive(Debug, Clone, Default)]
pub struct Despeckle;

impl Algorithm for Despeckle {
    type Input = BinaryMask;
    type Output = BinaryMask;
    type Params = CleaningParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Despeckle"
    }

    fn description(&self) -> &'static str {
        "Drop 8-connected mask components below a minimum pixel count"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        despeckle(&input, &params)
    }
}

/// Per-pixel 8-connected component size, saturated at `cap`.
///
/// Pixels with value 0 get size 0.
pub fn component_sizes(mask: &BinaryMask, cap: u32) -> Result<Raster<u32>> {
    let (rows, cols) = mask.shape();
    let offsets = Neighborhood::Queen3x3.offsets_no_center();

    let mut sizes = vec![0u32; rows * cols];
    let mut visited = vec![false; rows * cols];
    let mut members: Vec<usize> = Vec::new();
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for r in 0..rows {
        for c in 0..cols {
            let idx = r * cols + c;
            if visited[idx] || unsafe { mask.get_unchecked(r, c) } == 0 {
                continue;
            }

            members.clear();
            stack.push((r, c));
            visited[idx] = true;

            while let Some((cr, cc)) = stack.pop() {
                members.push(cr * cols + cc);
                for &(dr, dc) in &offsets {
                    let nr = cr as isize + dr;
                    let nc = cc as isize + dc;
                    if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
                        continue;
                    }
                    let (nr, nc) = (nr as usize, nc as usize);
                    let nidx = nr * cols + nc;
                    if !visited[nidx] && unsafe { mask.get_unchecked(nr, nc) } != 0 {
                        visited[nidx] = true;
                        stack.push((nr, nc));
                    }
                }
            }

            let size = u32::try_from(members.len()).unwrap_or(u32::MAX).min(cap);
            for &m in &members {
                sizes[m] = size;
            }
        }
    }

    let array = Array2::from_shape_vec((rows, cols), sizes).map_err(|e| Error::Other(e.to_string()))?;
    mask.with_data(array)
}

/// Keep mask pixels whose (capped) component size is at least
/// `params.min_component_pixels`.
pub fn despeckle(mask: &BinaryMask, params: &CleaningParams) -> Result<BinaryMask> {
    params.validate()?;

    let sizes = component_sizes(mask, params.max_component_search)?;
    let min = params.min_component_pixels;
    let cleaned = sizes.map(|size| u8::from(size > 0 && size >= min));

    debug!(
        before = mask.count_ones(),
        after = cleaned.count_ones(),
        min_component_pixels = min,
        "despeckled mask"
    );
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(min: u32) -> CleaningParams {
        CleaningParams {
            min_component_pixels: min,
            ..CleaningParams::default()
        }
    }

    /// A 4x4 block at the top-left and a lone pixel at the bottom-right
    fn block_and_speck() -> BinaryMask {
        let mut m = BinaryMask::new(10, 10);
        for r in 0..4 {
            for c in 0..4 {
                m.set(r, c, 1).unwrap();
            }
        }
        m.set(9, 9, 1).unwrap();
        m
    }

    #[test]
    fn test_component_sizes() {
        let sizes = component_sizes(&block_and_speck(), 1024).unwrap();
        assert_eq!(sizes.get(0, 0).unwrap(), 16);
        assert_eq!(sizes.get(9, 9).unwrap(), 1);
        assert_eq!(sizes.get(5, 5).unwrap(), 0);
    }

    #[test]
    fn test_sizes_saturate_at_cap() {
        let sizes = component_sizes(&block_and_speck(), 10).unwrap();
        assert_eq!(sizes.get(3, 3).unwrap(), 10);
    }

    #[test]
    fn test_diagonal_pixels_connect() {
        let mut m = BinaryMask::new(3, 3);
        m.set(0, 0, 1).unwrap();
        m.set(1, 1, 1).unwrap();
        m.set(2, 2, 1).unwrap();
        let sizes = component_sizes(&m, 1024).unwrap();
        assert_eq!(sizes.get(2, 2).unwrap(), 3);
    }

    #[test]
    fn test_removes_small_components() {
        let cleaned = despeckle(&block_and_speck(), &params(5)).unwrap();
        assert_eq!(cleaned.count_ones(), 16);
        assert_eq!(cleaned.get(9, 9).unwrap(), 0);
    }

    #[test]
    fn test_idempotent() {
        let p = params(5);
        let once = despeckle(&block_and_speck(), &p).unwrap();
        let twice = despeckle(&once, &p).unwrap();
        assert_eq!(once.data(), twice.data());
    }

    #[test]
    fn test_all_zero_stays_zero() {
        let cleaned = despeckle(&BinaryMask::new(6, 6), &params(1)).unwrap();
        assert_eq!(cleaned.count_ones(), 0);
    }

    #[test]
    fn test_min_above_cap_rejected() {
        let p = CleaningParams {
            min_component_pixels: 2000,
            ..CleaningParams::default()
        };
        assert!(despeckle(&block_and_speck(), &p).is_err());
    }

    #[test]
    fn test_default_removes_everything_small() {
        // 16 + 1 pixels, both below 200
        let cleaned = Despeckle.execute_default(block_and_speck()).unwrap();
        assert_eq!(cleaned.count_ones(), 0);
    }
}
