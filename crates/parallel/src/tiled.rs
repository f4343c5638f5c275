//! Tiling for memory-bounded region reductions

/// A rectangular window of a raster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// Row offset in the source raster
    pub row_offset: usize,
    /// Column offset in the source raster
    pub col_offset: usize,
    /// Number of rows in this tile
    pub rows: usize,
    /// Number of columns in this tile
    pub cols: usize,
}

impl Tile {
    pub fn new(row_offset: usize, col_offset: usize, rows: usize, cols: usize) -> Self {
        Self {
            row_offset,
            col_offset,
            rows,
            cols,
        }
    }

    /// Tile covering a whole `rows x cols` raster
    pub fn whole(rows: usize, cols: usize) -> Self {
        Self::new(0, 0, rows, cols)
    }

    /// Source-raster rows spanned by this tile
    pub fn row_range(&self) -> std::ops::Range<usize> {
        self.row_offset..self.row_offset + self.rows
    }

    /// Source-raster columns spanned by this tile
    pub fn col_range(&self) -> std::ops::Range<usize> {
        self.col_offset..self.col_offset + self.cols
    }

    /// Source (row, col) positions inside this tile that fall on the global
    /// sampling lattice `row % stride == 0 && col % stride == 0`.
    ///
    /// Using a global lattice keeps the sampled set independent of tiling.
    pub fn lattice(&self, stride: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        let stride = stride.max(1);
        let first_row = self.row_offset.div_ceil(stride) * stride;
        let first_col = self.col_offset.div_ceil(stride) * stride;
        let row_end = self.row_offset + self.rows;
        let col_end = self.col_offset + self.cols;
        (first_row..row_end)
            .step_by(stride)
            .flat_map(move |r| (first_col..col_end).step_by(stride).map(move |c| (r, c)))
    }
}

/// Iterator over non-overlapping tiles covering a raster
pub struct TileIterator {
    total_rows: usize,
    total_cols: usize,
    tile_size: usize,
    current_row: usize,
    current_col: usize,
}

impl TileIterator {
    pub fn new(total_rows: usize, total_cols: usize, tile_size: usize) -> Self {
        Self {
            total_rows,
            total_cols,
            tile_size: tile_size.max(1),
            current_row: 0,
            current_col: 0,
        }
    }
}

impl Iterator for TileIterator {
    type Item = Tile;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_row >= self.total_rows || self.total_cols == 0 {
            return None;
        }

        let row_end = (self.current_row + self.tile_size).min(self.total_rows);
        let col_end = (self.current_col + self.tile_size).min(self.total_cols);
        let tile = Tile::new(
            self.current_row,
            self.current_col,
            row_end - self.current_row,
            col_end - self.current_col,
        );

        self.current_col += self.tile_size;
        if self.current_col >= self.total_cols {
            self.current_col = 0;
            self.current_row += self.tile_size;
        }

        Some(tile)
    }
}
