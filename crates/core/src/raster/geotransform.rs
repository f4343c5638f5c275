//! North-up affine georeferencing for analysis grids

use geo::{Coord, Rect};
use serde::{Deserialize, Serialize};

/// Maps pixel indices to projected coordinates (metres) and back.
///
/// ```text
/// x = origin_x + col * pixel_width
/// y = origin_y + row * pixel_height
/// ```
///
/// `pixel_height` is negative for north-up grids. Area computations assume a
/// metric projected CRS, which is what the DEM and scene archives are delivered in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Pixel width in metres
    pub pixel_width: f64,
    /// Pixel height in metres (negative when north-up)
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// Projected coordinates of the pixel center
    pub fn pixel_center(&self, row: usize, col: usize) -> Coord<f64> {
        Coord {
            x: self.origin_x + (col as f64 + 0.5) * self.pixel_width,
            y: self.origin_y + (row as f64 + 0.5) * self.pixel_height,
        }
    }

    /// Fractional (col, row) for a projected coordinate
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        if self.pixel_width.abs() < 1e-12 || self.pixel_height.abs() < 1e-12 {
            return (f64::NAN, f64::NAN);
        }
        (
            (x - self.origin_x) / self.pixel_width,
            (y - self.origin_y) / self.pixel_height,
        )
    }

    /// Cell size (assumes square pixels)
    pub fn cell_size(&self) -> f64 {
        self.pixel_width.abs()
    }

    /// Ground area of one pixel in m²
    pub fn pixel_area(&self) -> f64 {
        (self.pixel_width * self.pixel_height).abs()
    }

    /// Extent of a grid with the given dimensions
    pub fn extent(&self, rows: usize, cols: usize) -> Rect<f64> {
        let x1 = self.origin_x + cols as f64 * self.pixel_width;
        let y1 = self.origin_y + rows as f64 * self.pixel_height;
        Rect::new(
            Coord { x: self.origin_x, y: self.origin_y },
            Coord { x: x1, y: y1 },
        )
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}
