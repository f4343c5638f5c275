//! Analysis geometry and its rasterised footprint
//!
//! The glacier outline arrives from an external ROI-delineation step as a
//! polygon set. Here it is validated, optionally simplified (Douglas-Peucker),
//! buffered and burned onto the analysis grid as a 0/1 [`Footprint`]. All
//! clipping and every region reduction downstream works on the footprint.

use geo::{Area, BoundingRect, Coord, Distance, Euclidean, MultiPolygon, Point, Rect, Simplify};

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster};

/// Glacier outline plus the buffer and simplification applied to it.
#[derive(Debug, Clone)]
pub struct AnalysisGeometry {
    outline: MultiPolygon<f64>,
    buffer_m: f64,
    simplify_m: f64,
}

impl AnalysisGeometry {
    /// Validate and wrap an outline.
    ///
    /// Fails with [`Error::DegenerateGeometry`] for empty, non-finite or
    /// zero-area outlines, and [`Error::InvalidParameter`] for negative buffer
    /// or tolerance values.
    pub fn new(
        outline: impl Into<MultiPolygon<f64>>,
        buffer_m: f64,
        simplify_m: f64,
    ) -> Result<Self> {
        let outline = outline.into();
        if !(buffer_m.is_finite() && buffer_m >= 0.0) {
            return Err(Error::invalid("buffer_m", buffer_m, "must be finite and >= 0"));
        }
        if !(simplify_m.is_finite() && simplify_m >= 0.0) {
            return Err(Error::invalid("simplify_m", simplify_m, "must be finite and >= 0"));
        }
        if outline.0.is_empty() {
            return Err(Error::DegenerateGeometry("outline has no polygons".into()));
        }
        let all_finite = outline
            .0
            .iter()
            .flat_map(|p| p.exterior().coords().chain(p.interiors().iter().flat_map(|r| r.coords())))
            .all(|c| c.x.is_finite() && c.y.is_finite());
        if !all_finite {
            return Err(Error::DegenerateGeometry("outline has non-finite coordinates".into()));
        }

        let geometry = Self {
            outline,
            buffer_m,
            simplify_m,
        };
        let area = geometry.resolved_outline().unsigned_area();
        if area <= 0.0 || !area.is_finite() {
            return Err(Error::DegenerateGeometry(format!(
                "outline area is {area} after simplification"
            )));
        }
        Ok(geometry)
    }

    pub fn outline(&self) -> &MultiPolygon<f64> {
        &self.outline
    }

    pub fn buffer_m(&self) -> f64 {
        self.buffer_m
    }

    pub fn simplify_m(&self) -> f64 {
        self.simplify_m
    }

    /// Outline after simplification (unchanged when the tolerance is 0)
    pub fn resolved_outline(&self) -> MultiPolygon<f64> {
        if self.simplify_m > 0.0 {
            self.outline.simplify(&self.simplify_m)
        } else {
            self.outline.clone()
        }
    }

    /// Bounding box of the buffered outline, grown by `extra_m` more metres.
    ///
    /// Scene archives are queried with `extra_m` set to the search buffer.
    pub fn search_bbox(&self, extra_m: f64) -> Rect<f64> {
        let grow = self.buffer_m + extra_m.max(0.0);
        // new() guarantees a non-empty outline
        let rect = self
            .outline
            .bounding_rect()
            .unwrap_or_else(|| Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 0.0, y: 0.0 }));
        Rect::new(
            Coord { x: rect.min().x - grow, y: rect.min().y - grow },
            Coord { x: rect.max().x + grow, y: rect.max().y + grow },
        )
    }

    /// Burn the buffered outline onto a grid.
    ///
    /// A pixel is covered when its center lies inside the simplified outline
    /// or within `buffer_m` of its boundary. Simplification is applied before
    /// buffering; with tolerances well below the buffer distance the
    /// difference is sub-pixel.
    pub fn rasterize(&self, transform: &GeoTransform, rows: usize, cols: usize) -> Result<Footprint> {
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidDimensions { width: cols, height: rows });
        }
        let outline = self.resolved_outline();
        let reach = outline
            .bounding_rect()
            .map(|r| {
                Rect::new(
                    Coord { x: r.min().x - self.buffer_m, y: r.min().y - self.buffer_m },
                    Coord { x: r.max().x + self.buffer_m, y: r.max().y + self.buffer_m },
                )
            })
            .ok_or_else(|| Error::DegenerateGeometry("outline has no extent".into()))?;

        let mut coverage: Raster<u8> = Raster::new(rows, cols);
        coverage.set_transform(*transform);
        let mut covered = 0usize;

        for row in 0..rows {
            for col in 0..cols {
                let c = transform.pixel_center(row, col);
                if c.x < reach.min().x || c.x > reach.max().x || c.y < reach.min().y || c.y > reach.max().y {
                    continue;
                }
                // Zero inside the outline
                if Euclidean::distance(&Point::from(c), &outline) <= self.buffer_m {
                    coverage.data_mut()[(row, col)] = 1;
                    covered += 1;
                }
            }
        }

        if covered == 0 {
            return Err(Error::DegenerateGeometry(
                "analysis geometry covers no pixel of the elevation grid".into(),
            ));
        }

        Ok(Footprint { coverage, covered })
    }
}

/// 0/1 coverage of the analysis geometry on the analysis grid.
#[derive(Debug, Clone)]
pub struct Footprint {
    coverage: Raster<u8>,
    covered: usize,
}

impl Footprint {
    /// Footprint covering every pixel of a grid (synthetic runs and tests)
    pub fn full(transform: GeoTransform, rows: usize, cols: usize) -> Self {
        let coverage = Raster::filled(rows, cols, 1u8).with_transform(transform);
        Self {
            covered: rows * cols,
            coverage,
        }
    }

    /// Wrap an existing 0/1 coverage raster
    pub fn from_mask(coverage: Raster<u8>) -> Result<Self> {
        let covered = coverage.count_ones();
        if covered == 0 {
            return Err(Error::DegenerateGeometry("footprint covers no pixel".into()));
        }
        Ok(Self { coverage, covered })
    }

    pub fn coverage(&self) -> &Raster<u8> {
        &self.coverage
    }

    pub fn shape(&self) -> (usize, usize) {
        self.coverage.shape()
    }

    pub fn transform(&self) -> &GeoTransform {
        self.coverage.transform()
    }

    /// Whether (row, col) lies inside the footprint; false outside the grid
    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.coverage.get(row, col).is_ok_and(|v| v == 1)
    }

    pub fn covered_pixels(&self) -> usize {
        self.covered
    }

    /// Covered ground area in km²
    pub fn area_km2(&self) -> f64 {
        self.covered as f64 * self.coverage.pixel_area() / 1.0e6
    }

    /// Set every pixel outside the footprint to NaN
    pub fn clip(&self, raster: &Raster<f64>) -> Result<Raster<f64>> {
        self.coverage
            .zip_map(raster, |inside, v| if inside == 1 { v } else { f64::NAN })
    }
}
