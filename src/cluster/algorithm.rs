//! Grid clustering session: assignment, overlap merge and pan reuse
//!
//! A pass over a viewport runs in three phases:
//!
//! 1. Grid setup. A pan to an overlapping viewport at the same cell size
//!    re-maps the previous grid ([`ClusterGrid::copy_into`]); clusters that
//!    left the viewport are reported as old. Any other request starts from an
//!    empty grid and reports every previous cluster as old.
//! 2. Assignment. Every indexed point inside the normalized viewport goes to
//!    its cell, unless the cell is covered by a cluster carried over by the pan.
//! 3. Overlap merge. Cells are visited in row-major order; each cluster is
//!    compared with the three neighbours its quadrant allows, and clusters
//!    closer than the merge distance are merged. A cluster that survives a
//!    merge is then checked against the neighbours of its new quadrant.

use super::geometry::{MapRect, MapSize};
use super::grid::{ClusterGrid, GridFrame};
use super::kdtree::PointIndex;
use super::point::Cluster;
use super::quadrant::Neighbor;
use crate::config::ClusteringConfig;
use crate::error::Result;
use log::{debug, trace, warn};

/// Outcome of one clustering pass
///
/// Both sequences are in row-major cell order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusteringResult {
    /// Clusters to add to the display: created or changed by this pass
    pub new_clusters: Vec<Cluster>,
    /// Clusters to remove from the display
    pub old_clusters: Vec<Cluster>,
}

/// Clustering session owning the grid and its cluster storage
///
/// Not synchronized: every pass takes `&mut self`, callers sharing a session
/// across threads must wrap it in a lock. The [`PointIndex`] is only read and
/// may be shared freely.
#[derive(Debug)]
pub struct GridClusteringAlgorithm {
    config: ClusteringConfig,
    grid: Option<ClusterGrid>,
    buffer: Vec<usize>,
}

impl GridClusteringAlgorithm {
    pub fn new(config: ClusteringConfig) -> Self {
        GridClusteringAlgorithm {
            config,
            grid: None,
            buffer: Vec::new(),
        }
    }

    pub fn config(&self) -> &ClusteringConfig {
        &self.config
    }

    pub fn grid(&self) -> Option<&ClusterGrid> {
        self.grid.as_ref()
    }

    /// Currently displayed clusters in row-major cell order
    pub fn clusters(&self) -> impl Iterator<Item = &Cluster> {
        self.grid.iter().flat_map(|g| g.clusters())
    }

    /// Normalized rectangle of the last successful pass
    pub fn last_rect(&self) -> Option<MapRect> {
        self.grid.as_ref().map(|g| g.frame().rect())
    }

    /// Drops the grid and returns every displayed cluster
    pub fn reset(&mut self) -> Vec<Cluster> {
        self.grid
            .take()
            .map(ClusterGrid::into_clusters)
            .unwrap_or_default()
    }

    /// Clusters `rect` with the configured cell size
    pub fn cluster(
        &mut self,
        index: &PointIndex,
        rect: &MapRect,
        pan: bool,
    ) -> Result<ClusteringResult> {
        let cell_size = self.config.cell_size();
        self.perform_clustering(index, rect, cell_size, pan)
    }

    /// Clusters the points of `index` inside `rect` at `cell_size`
    ///
    /// With `pan` set and a previous grid at the same cell size overlapping the
    /// new one, clusters inside the overlap are kept as they are and only the
    /// exposed margin is clustered. Invalid input is rejected before the
    /// session changes.
    pub fn perform_clustering(
        &mut self,
        index: &PointIndex,
        rect: &MapRect,
        cell_size: MapSize,
        pan: bool,
    ) -> Result<ClusteringResult> {
        let frame = GridFrame::new(rect, cell_size)?;
        let merge_distance = self.config.merge_distance_for(&cell_size)?;

        let mut result = ClusteringResult::default();
        let incremental = pan
            && self
                .grid
                .as_ref()
                .is_some_and(|g| g.frame().overlaps(&frame));
        if pan && !incremental && self.grid.is_some() {
            warn!(
                "Pan to {:?} does not overlap the previous grid, clustering from scratch",
                frame.rect()
            );
        }

        let mut grid = match self.grid.take() {
            Some(mut grid) if incremental => match grid.copy_into(frame) {
                Ok(margin) => {
                    result.old_clusters = margin;
                    grid
                }
                Err(e) => {
                    self.grid = Some(grid);
                    return Err(e);
                }
            },
            previous => {
                let base = previous
                    .as_ref()
                    .map_or(0, |g| g.storage().next_generation());
                match ClusterGrid::with_generation_base(frame, base) {
                    Ok(grid) => {
                        if let Some(previous) = previous {
                            result.old_clusters = previous.into_clusters();
                        }
                        grid
                    }
                    Err(e) => {
                        self.grid = previous;
                        return Err(e);
                    }
                }
            }
        };

        let outcome = assign_points(&mut grid, index, &mut self.buffer).and_then(|placed| {
            let merges = merge_overlapping(&mut grid, merge_distance, &mut result)?;
            Ok((placed, merges))
        });
        result.new_clusters = grid
            .clusters()
            .filter(|c| !c.is_retained())
            .cloned()
            .collect();
        self.grid = Some(grid);
        let (placed, merges) = outcome?;

        debug!(
            "Clustered {} points on {}x{} grid: {} merges, {} new, {} old",
            placed,
            frame.cols,
            frame.rows,
            merges,
            result.new_clusters.len(),
            result.old_clusters.len()
        );
        Ok(result)
    }
}

/// Places every point of the grid's rectangle into its cell
///
/// Points on the far edges belong to the next cell outside the grid and are
/// skipped, as are points of covered cells. Returns the number of points placed.
fn assign_points(
    grid: &mut ClusterGrid,
    index: &PointIndex,
    buffer: &mut Vec<usize>,
) -> Result<usize> {
    let frame = *grid.frame();
    let mut ids = std::mem::take(buffer);
    ids.clear();
    let ids = index.query_into(&frame.rect(), ids)?;

    let mut placed = 0;
    for &id in &ids {
        let Some(p) = index.point(id) else { continue };
        let Some((col, row)) = frame.locate(p) else {
            continue;
        };
        if grid.is_covered(col, row)? {
            continue;
        }
        grid.place(col, row, id, p)?;
        placed += 1;
    }

    *buffer = ids;
    Ok(placed)
}

/// Merges neighbouring clusters closer than `merge_distance`
///
/// Retained clusters touched by a merge move to the old sequence: an absorbed
/// one as it was, a surviving one as it was before it got a new identity.
fn merge_overlapping(
    grid: &mut ClusterGrid,
    merge_distance: f64,
    result: &mut ClusteringResult,
) -> Result<usize> {
    let threshold = merge_distance * merge_distance;
    let mut merges = 0;

    for (col, row) in grid.occupied_cells() {
        // Absorbing a neighbour moves the centroid and may change its quadrant,
        // so the next direction comes from the current quadrant each time.
        let mut checked: Vec<Neighbor> = Vec::with_capacity(Neighbor::ALL.len());
        loop {
            let Some(current) = grid.cell_at(col, row)? else {
                break;
            };
            let Some(&n) = current
                .quadrant()
                .adjacent()
                .iter()
                .find(|n| !checked.contains(n))
            else {
                break;
            };
            checked.push(n);

            let Some((ncol, nrow)) = grid.neighbor(col, row, n) else {
                continue;
            };
            let Some(other) = grid.cell_at(ncol, nrow)? else {
                continue;
            };
            if current.is_retained() && other.is_retained() {
                continue;
            }
            if current.coordinate().sq_dist(&other.coordinate()) >= threshold {
                continue;
            }

            let current_id = current.id();
            let (winner, loser) = if survives(current, other) {
                (current, other)
            } else {
                (other, current)
            };
            let absorbed = loser.id();
            let mut survivor = winner.id();
            let snapshot = winner.is_retained().then(|| winner.clone());

            if let Some(snapshot) = snapshot {
                result.old_clusters.push(snapshot);
                grid.thaw(survivor);
                survivor = grid.rekey(survivor)?;
            }
            let released = grid.merge(survivor, absorbed)?;
            trace!(
                "Merged cluster {:?} ({} points) into {:?}",
                absorbed,
                released.count(),
                survivor
            );
            if released.is_retained() {
                result.old_clusters.push(released);
            }
            merges += 1;

            if absorbed == current_id {
                break;
            }
        }
    }

    Ok(merges)
}

/// Whether `a` absorbs `b`: more points wins, then a retained cluster, then the lower slot
fn survives(a: &Cluster, b: &Cluster) -> bool {
    a.count()
        .cmp(&b.count())
        .then_with(|| a.is_retained().cmp(&b.is_retained()))
        .then_with(|| b.id().slot().cmp(&a.id().slot()))
        .is_ge()
}
