//! Error type shared by the index, the cluster grid and the clustering pass

use std::collections::TryReserveError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClusterError {
    /// Zero/negative extent, inverted corners or non-finite coordinates
    #[error("invalid rectangle: origin ({x}, {y}), size ({width}, {height})")]
    InvalidRectangle {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    #[error("invalid cell size: {width} x {height}")]
    InvalidCellSize { width: f64, height: f64 },
    /// Merge distance must be positive and at most half of the smaller cell side
    #[error("invalid merge distance {distance} for cell size {width} x {height}")]
    InvalidMergeDistance {
        distance: f64,
        width: f64,
        height: f64,
    },
    #[error("grid spans {cells} cells, limit is {max}")]
    GridOverflow { cells: f64, max: usize },
    #[error("cluster storage could not grow: {0}")]
    GridAllocationFailure(#[from] TryReserveError),
    #[error("cell ({col}, {row}) is outside of {cols} x {rows} grid")]
    OutOfBounds {
        col: i64,
        row: i64,
        cols: usize,
        rows: usize,
    },
    #[error("storage slot {slot} is already free")]
    DoubleRelease { slot: u16 },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ClusterError>;
