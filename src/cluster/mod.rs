//! Package cluster implements incremental grid clustering of map points using a K-D Tree
pub mod algorithm;
pub mod geometry;
pub mod grid;
pub mod kdtree;
pub mod point;
pub mod quadrant;
pub mod storage;

#[cfg(test)]
mod geometry_test;
#[cfg(test)]
mod point_test;
#[cfg(test)]
mod storage_test;

pub use algorithm::{ClusteringResult, GridClusteringAlgorithm};
pub use geometry::{MapRect, MapSize};
pub use grid::{ClusterGrid, GridFrame, MAX_CELL_INDEX};
pub use kdtree::{Aggregate, PointIndex};
pub use point::{CellCoord, Cluster, ClusterId, ClusterKind, Point, PointList};
pub use quadrant::{Neighbor, Quadrant};
pub use storage::{ClusterStorage, MAX_SLOTS};
