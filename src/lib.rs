//! Incremental grid clustering of map points
//!
//! Points are indexed once in a [`PointIndex`]; a [`GridClusteringAlgorithm`]
//! session then clusters whatever part of them a viewport shows, reusing its
//! previous grid when the viewport only pans.
//!
//! ```
//! use rust_gridcluster::{ClusteringConfig, GridClusteringAlgorithm, MapRect, Point, PointIndex};
//!
//! let index = PointIndex::build(vec![
//!     Point::new(10.0, 10.0),
//!     Point::new(20.0, 20.0),
//!     Point::new(500.0, 500.0),
//! ]);
//! let mut session = GridClusteringAlgorithm::new(ClusteringConfig::default());
//! let result = session.cluster(&index, &MapRect::new(0.0, 0.0, 512.0, 512.0), false)?;
//! assert_eq!(result.new_clusters.len(), 2);
//! # Ok::<(), rust_gridcluster::ClusterError>(())
//! ```

pub mod cluster;
pub mod config;
pub mod error;

pub use cluster::{
    Cluster, ClusterId, ClusterKind, ClusteringResult, GridClusteringAlgorithm, MapRect, MapSize,
    Point, PointIndex, PointList, Quadrant,
};
pub use config::ClusteringConfig;
pub use error::{ClusterError, Result};
