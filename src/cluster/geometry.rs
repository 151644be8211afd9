//! Rectangles and sizes in the flat projected map space
//!
//! The y axis grows downward (map origin is the north-west corner).

use super::point::Point;
use crate::error::{ClusterError, Result};

/// Width and height of a map region, used for cell sizes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapSize {
    pub width: f64,
    pub height: f64,
}

impl MapSize {
    pub fn new(width: f64, height: f64) -> Self {
        MapSize { width, height }
    }

    /// Rejects non-finite or non-positive dimensions
    pub fn validate_cell(&self) -> Result<()> {
        if self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
        {
            Ok(())
        } else {
            Err(ClusterError::InvalidCellSize {
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Length of the shorter side
    pub fn min_side(&self) -> f64 {
        self.width.min(self.height)
    }

    /// Index of the column `k` with `k * width <= x < (k + 1) * width`
    pub fn column_of(&self, x: f64) -> f64 {
        cell_index(x, self.width)
    }

    /// Index of the row `k` with `k * height <= y < (k + 1) * height`
    pub fn row_of(&self, y: f64) -> f64 {
        cell_index(y, self.height)
    }
}

/// Whole-cell index of `v`, checked against the same products `k * size` that
/// grid edges are built from so a value on an edge lands in the cell it starts.
fn cell_index(v: f64, size: f64) -> f64 {
    let k = (v / size).floor();
    if v < k * size {
        k - 1.0
    } else if v >= (k + 1.0) * size {
        k + 1.0
    } else {
        k
    }
}

/// First cell and exclusive end cell of the cells covering `[min, max]`
fn cell_range(min: f64, max: f64, size: f64) -> (f64, f64) {
    let first = cell_index(min, size);
    let last = cell_index(max, size);
    let end = if last * size == max { last } else { last + 1.0 };
    (first, end.max(first + 1.0))
}

/// Axis-aligned map rectangle stored as its two corners
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MapRect {
    min: Point,
    max: Point,
}

impl MapRect {
    /// Creates a rectangle from origin and size
    ///
    /// No validation is done here; negative sizes produce an inverted
    /// rectangle that [`MapRect::validate`] rejects.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        MapRect {
            min: Point([x, y]),
            max: Point([x + width, y + height]),
        }
    }

    pub fn from_corners(min: Point, max: Point) -> Self {
        MapRect { min, max }
    }

    /// Degenerate rectangle covering a single point
    pub fn from_point(p: Point) -> Self {
        MapRect { min: p, max: p }
    }

    pub fn min(&self) -> Point {
        self.min
    }

    pub fn max(&self) -> Point {
        self.max
    }

    pub fn min_x(&self) -> f64 {
        self.min.0[0]
    }

    pub fn min_y(&self) -> f64 {
        self.min.0[1]
    }

    pub fn max_x(&self) -> f64 {
        self.max.0[0]
    }

    pub fn max_y(&self) -> f64 {
        self.max.0[1]
    }

    pub fn width(&self) -> f64 {
        self.max_x() - self.min_x()
    }

    pub fn height(&self) -> f64 {
        self.max_y() - self.min_y()
    }

    pub fn mid_x(&self) -> f64 {
        (self.min_x() + self.max_x()) / 2.0
    }

    pub fn mid_y(&self) -> f64 {
        (self.min_y() + self.max_y()) / 2.0
    }

    pub fn center(&self) -> Point {
        Point([self.mid_x(), self.mid_y()])
    }

    /// A viewport must be finite with strictly positive extent
    pub fn validate(&self) -> Result<()> {
        if self.is_finite() && self.max_x() > self.min_x() && self.max_y() > self.min_y() {
            Ok(())
        } else {
            Err(self.invalid())
        }
    }

    /// A range query may be degenerate (a line or a point) but not inverted
    pub fn validate_query(&self) -> Result<()> {
        if self.is_finite() && self.max.greater_eq(&self.min) {
            Ok(())
        } else {
            Err(self.invalid())
        }
    }

    fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    fn invalid(&self) -> ClusterError {
        ClusterError::InvalidRectangle {
            x: self.min_x(),
            y: self.min_y(),
            width: self.width(),
            height: self.height(),
        }
    }

    /// Closed containment test, edges included
    pub fn contains_point(&self, p: &Point) -> bool {
        p.greater_eq(&self.min) && p.less_eq(&self.max)
    }

    pub fn contains_rect(&self, other: &MapRect) -> bool {
        other.min.greater_eq(&self.min) && other.max.less_eq(&self.max)
    }

    /// Closed intersection test: rectangles sharing only an edge intersect
    pub fn intersects(&self, other: &MapRect) -> bool {
        !(self.max_x() < other.min_x()
            || self.min_x() > other.max_x()
            || self.max_y() < other.min_y()
            || self.min_y() > other.max_y())
    }

    /// Grows the rectangle to include `p`
    pub fn include(&mut self, p: &Point) {
        for d in 0..2 {
            self.min.0[d] = self.min.0[d].min(p.0[d]);
            self.max.0[d] = self.max.0[d].max(p.0[d]);
        }
    }

    pub fn union(&self, other: &MapRect) -> MapRect {
        let mut result = *self;
        result.include(&other.min);
        result.include(&other.max);
        result
    }

    /// Snaps the origin down and the far edge up to multiples of the cell size
    ///
    /// Rectangles normalized to the same cell size share cell boundaries, so the
    /// distance between two normalized origins is a whole number of cells.
    pub fn normalize_to_cell_size(&self, cell: &MapSize) -> MapRect {
        let [(col, col_end), (row, row_end)] = self.cell_span(cell);
        MapRect {
            min: Point([col * cell.width, row * cell.height]),
            max: Point([col_end * cell.width, row_end * cell.height]),
        }
    }

    /// Column and row ranges `(first, end)` of the cells covering the rectangle
    ///
    /// The end is exclusive; a far edge lying exactly on a cell boundary does not
    /// open another cell. At least one cell is covered on each axis.
    pub fn cell_span(&self, cell: &MapSize) -> [(f64, f64); 2] {
        [
            cell_range(self.min_x(), self.max_x(), cell.width),
            cell_range(self.min_y(), self.max_y(), cell.height),
        ]
    }
}
