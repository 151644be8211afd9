//! Sparse grid of clusters covering a normalized viewport

use super::geometry::{MapRect, MapSize};
use super::point::{CellCoord, Cluster, ClusterId, Point};
use super::quadrant::Neighbor;
use super::storage::{ClusterStorage, MAX_SLOTS};
use crate::error::{ClusterError, Result};
use bitvec::prelude::*;

/// Largest absolute cell index a grid may reach on either axis
///
/// Cell indices up to this bound are exact in `f64`, so cell edges computed as
/// `index * size` stay ordered and index arithmetic cannot overflow `i64`.
pub const MAX_CELL_INDEX: i64 = 1 << 52;

/// Placement of a grid on the map: absolute origin cell, dimensions and cell size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridFrame {
    pub origin: CellCoord,
    pub cols: usize,
    pub rows: usize,
    pub cell: MapSize,
}

impl GridFrame {
    /// Normalizes `rect` to `cell` and derives the grid covering it
    ///
    /// Rejects invalid rectangles and cell sizes, grids with more cells than
    /// the cluster storage can address, and grids reaching past
    /// [`MAX_CELL_INDEX`].
    pub fn new(rect: &MapRect, cell: MapSize) -> Result<GridFrame> {
        rect.validate()?;
        cell.validate_cell()?;

        let [(col, col_end), (row, row_end)] = rect.cell_span(&cell);
        for index in [col, col_end, row, row_end] {
            if index.is_nan() || index.abs() > MAX_CELL_INDEX as f64 {
                return Err(ClusterError::GridOverflow {
                    cells: index.abs(),
                    max: MAX_CELL_INDEX as usize,
                });
            }
        }

        let cols = col_end - col;
        let rows = row_end - row;
        let cells = cols * rows;
        if cells > MAX_SLOTS as f64 {
            return Err(ClusterError::GridOverflow {
                cells,
                max: MAX_SLOTS,
            });
        }

        Ok(GridFrame {
            origin: CellCoord::new(col as i64, row as i64),
            cols: cols as usize,
            rows: rows as usize,
            cell,
        })
    }

    pub fn cell_count(&self) -> usize {
        self.cols * self.rows
    }

    /// North-west corner of an absolute cell
    fn corner(&self, col: i64, row: i64) -> Point {
        Point::new(col as f64 * self.cell.width, row as f64 * self.cell.height)
    }

    /// The normalized map rectangle covered by the grid
    pub fn rect(&self) -> MapRect {
        let end = self.absolute(self.cols, self.rows);
        MapRect::from_corners(
            self.corner(self.origin.col, self.origin.row),
            self.corner(end.col, end.row),
        )
    }

    /// Absolute cell containing `p`; cells are closed on their west and north edges
    pub fn absolute_cell(&self, p: &Point) -> CellCoord {
        CellCoord::new(
            self.cell.column_of(p.x()) as i64,
            self.cell.row_of(p.y()) as i64,
        )
    }

    /// Grid position of an absolute cell, `None` outside the grid
    pub fn local(&self, cell: CellCoord) -> Option<(usize, usize)> {
        let col = cell.col.checked_sub(self.origin.col)?;
        let row = cell.row.checked_sub(self.origin.row)?;
        if col < 0 || row < 0 || col as usize >= self.cols || row as usize >= self.rows {
            return None;
        }
        Some((col as usize, row as usize))
    }

    /// Grid position of the cell containing `p`
    ///
    /// Agrees with a half-open test against [`GridFrame::rect`]: `p` is located
    /// exactly when `min <= p < max` on both axes.
    pub fn locate(&self, p: &Point) -> Option<(usize, usize)> {
        self.local(self.absolute_cell(p))
    }

    pub fn absolute(&self, col: usize, row: usize) -> CellCoord {
        CellCoord::new(
            self.origin.col.saturating_add(col as i64),
            self.origin.row.saturating_add(row as i64),
        )
    }

    pub fn cell_rect(&self, col: usize, row: usize) -> MapRect {
        let cell = self.absolute(col, row);
        MapRect::from_corners(
            self.corner(cell.col, cell.row),
            self.corner(cell.col.saturating_add(1), cell.row.saturating_add(1)),
        )
    }

    /// True when both grids use the same cells and share at least one
    pub fn overlaps(&self, other: &GridFrame) -> bool {
        let (self_end, other_end) = (
            self.absolute(self.cols, self.rows),
            other.absolute(other.cols, other.rows),
        );
        self.cell == other.cell
            && self.origin.col < other_end.col
            && other.origin.col < self_end.col
            && self.origin.row < other_end.row
            && other.origin.row < self_end.row
    }
}

/// Grid of cluster slots backed by its own [`ClusterStorage`]
///
/// Each cell holds at most one cluster and each live cluster sits in exactly
/// one cell.
#[derive(Debug)]
pub struct ClusterGrid {
    frame: GridFrame,
    cells: Vec<Option<u16>>,
    /// Cells whose points are accounted for by a cluster carried over by a pan
    covered: BitVec,
    storage: ClusterStorage,
}

impl ClusterGrid {
    pub fn new(frame: GridFrame) -> Result<ClusterGrid> {
        Self::with_generation_base(frame, 0)
    }

    /// Empty grid whose cluster ids start at `generation_base`
    pub fn with_generation_base(frame: GridFrame, generation_base: u32) -> Result<ClusterGrid> {
        let n = frame.cell_count();
        let mut storage = ClusterStorage::with_generation_base(generation_base);
        storage.reserve(n)?;
        let mut cells = Vec::new();
        cells.try_reserve_exact(n)?;
        cells.resize(n, None);

        Ok(ClusterGrid {
            frame,
            cells,
            covered: bitvec![0; n],
            storage,
        })
    }

    pub fn frame(&self) -> &GridFrame {
        &self.frame
    }

    pub fn cols(&self) -> usize {
        self.frame.cols
    }

    pub fn rows(&self) -> usize {
        self.frame.rows
    }

    pub fn storage(&self) -> &ClusterStorage {
        &self.storage
    }

    fn offset(&self, col: usize, row: usize) -> Result<usize> {
        if col >= self.frame.cols || row >= self.frame.rows {
            return Err(ClusterError::OutOfBounds {
                col: col as i64,
                row: row as i64,
                cols: self.frame.cols,
                rows: self.frame.rows,
            });
        }
        Ok(row * self.frame.cols + col)
    }

    pub fn cell_at(&self, col: usize, row: usize) -> Result<Option<&Cluster>> {
        let offset = self.offset(col, row)?;
        Ok(self.cells[offset].and_then(|slot| self.storage.slot(slot)))
    }

    pub fn cell_id_at(&self, col: usize, row: usize) -> Result<Option<ClusterId>> {
        Ok(self.cell_at(col, row)?.map(|c| c.id()))
    }

    /// True when the cell's points belong to a cluster carried over by the last pan
    pub fn is_covered(&self, col: usize, row: usize) -> Result<bool> {
        let offset = self.offset(col, row)?;
        Ok(self.covered[offset])
    }

    pub fn cluster(&self, id: ClusterId) -> Option<&Cluster> {
        self.storage.get(id)
    }

    /// Grid position of the neighbouring cell, `None` past the grid edge
    pub fn neighbor(&self, col: usize, row: usize, n: Neighbor) -> Option<(usize, usize)> {
        let (dc, dr) = n.delta();
        let col = col.checked_add_signed(dc as isize)?;
        let row = row.checked_add_signed(dr as isize)?;
        (col < self.frame.cols && row < self.frame.rows).then_some((col, row))
    }

    /// Clusters in row-major cell order
    pub fn clusters(&self) -> impl Iterator<Item = &Cluster> {
        self.cells
            .iter()
            .filter_map(|slot| slot.and_then(|s| self.storage.slot(s)))
    }

    /// Positions of occupied cells in row-major order
    pub fn occupied_cells(&self) -> Vec<(usize, usize)> {
        let cols = self.frame.cols;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| (i % cols, i / cols))
            .collect()
    }

    /// Adds point `point_id` to the cell, creating a single cluster in an empty cell
    pub fn place(&mut self, col: usize, row: usize, point_id: usize, p: &Point) -> Result<ClusterId> {
        let offset = self.offset(col, row)?;
        if let Some(cluster) = self.cells[offset].and_then(|slot| self.storage.slot_mut(slot)) {
            cluster.add_point(p);
            return Ok(cluster.id());
        }

        let cluster = Cluster::single(
            point_id,
            *p,
            self.frame.cell_rect(col, row),
            self.frame.absolute(col, row),
        );
        let id = self.storage.allocate(cluster)?;
        self.cells[offset] = Some(id.slot());
        Ok(id)
    }

    /// Folds `absorbed` into `survivor`, frees its slot and empties its cell
    ///
    /// Returns the absorbed cluster as it was before the merge.
    pub fn merge(&mut self, survivor: ClusterId, absorbed: ClusterId) -> Result<Cluster> {
        if self.storage.get(survivor).is_none() {
            return Err(ClusterError::DoubleRelease {
                slot: survivor.slot(),
            });
        }
        let released = self.storage.release(absorbed)?;
        if let Some((col, row)) = self.frame.local(released.cell) {
            let offset = self.offset(col, row)?;
            self.cells[offset] = None;
        }
        if let Some(cluster) = self.storage.get_mut(survivor) {
            cluster.absorb(&released);
        }
        Ok(released)
    }

    /// Gives a live cluster a fresh identity, see [`ClusterStorage::rekey`]
    pub fn rekey(&mut self, id: ClusterId) -> Result<ClusterId> {
        self.storage.rekey(id)
    }

    pub(crate) fn thaw(&mut self, id: ClusterId) {
        if let Some(cluster) = self.storage.get_mut(id) {
            cluster.thaw();
        }
    }

    /// Re-maps the grid onto `frame` (same cell size), keeping clusters in the overlap
    ///
    /// A cluster is kept, unchanged and marked `DoNotRecluster`, when every cell
    /// it owns lies inside the new grid; its cells become covered so their
    /// points are not clustered again. Every other cluster is released and
    /// returned, in row-major order of the old grid. Nothing changes if the new
    /// grid cannot be allocated.
    pub fn copy_into(&mut self, frame: GridFrame) -> Result<Vec<Cluster>> {
        if frame.cell != self.frame.cell {
            return Err(ClusterError::InvalidCellSize {
                width: frame.cell.width,
                height: frame.cell.height,
            });
        }

        let n = frame.cell_count();
        let mut cells: Vec<Option<u16>> = Vec::new();
        cells.try_reserve_exact(n)?;
        cells.resize(n, None);
        let mut covered = bitvec![0; n];
        self.storage.reserve(n)?;

        let mut margin = Vec::new();
        for cluster in self.clusters() {
            let kept: Option<Vec<usize>> = cluster
                .owned_cells()
                .map(|c| frame.local(c).map(|(col, row)| row * frame.cols + col))
                .collect();
            match kept {
                Some(offsets) => {
                    for &offset in &offsets {
                        covered.set(offset, true);
                    }
                    cells[offsets[0]] = Some(cluster.id().slot());
                }
                None => margin.push(cluster.id()),
            }
        }

        let mut released = Vec::with_capacity(margin.len());
        for id in margin {
            released.push(self.storage.release(id)?);
        }
        for slot in cells.iter().flatten() {
            if let Some(cluster) = self.storage.slot_mut(*slot) {
                cluster.retain();
            }
        }

        self.frame = frame;
        self.cells = cells;
        self.covered = covered;
        Ok(released)
    }

    /// Releases every cluster and returns them in row-major order
    pub fn into_clusters(self) -> Vec<Cluster> {
        let ClusterGrid {
            cells, mut storage, ..
        } = self;
        cells
            .into_iter()
            .flatten()
            .filter_map(|slot| {
                let id = storage.slot(slot)?.id();
                storage.release(id).ok()
            })
            .collect()
    }

    pub fn debug_dump(&self) -> String {
        let mut out = format!(
            "grid: origin=({}, {}) {}x{} cell={}x{}\n",
            self.frame.origin.col,
            self.frame.origin.row,
            self.frame.cols,
            self.frame.rows,
            self.frame.cell.width,
            self.frame.cell.height
        );
        for row in 0..self.frame.rows {
            let line: Vec<String> = (0..self.frame.cols)
                .map(|col| {
                    let offset = row * self.frame.cols + col;
                    match self.cells[offset].and_then(|s| self.storage.slot(s)) {
                        Some(c) => format!("{:>4}", c.count()),
                        None if self.covered[offset] => "   +".to_string(),
                        None => "   .".to_string(),
                    }
                })
                .collect();
            out.push_str(&line.join(""));
            out.push('\n');
        }
        out.push_str(&self.storage.debug_dump());
        out
    }
}
