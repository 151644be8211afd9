//! Clustering configuration

use crate::cluster::MapSize;
use crate::error::{ClusterError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Cell size and merge distance of a clustering session
///
/// Loaded from TOML with every field optional:
///
/// ```toml
/// cell_width = 256.0
/// cell_height = 256.0
/// merge_ratio = 0.5
/// # merge_distance = 100.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    pub cell_width: f64,
    pub cell_height: f64,
    /// Merge distance as a fraction of the shorter cell side
    pub merge_ratio: f64,
    /// Absolute merge distance; overrides `merge_ratio` when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_distance: Option<f64>,
}

impl ClusteringConfig {
    const fn default_cell_side() -> f64 {
        256.0
    }

    /// Largest ratio that keeps the quadrant neighbour pruning exact
    pub const MAX_MERGE_RATIO: f64 = 0.5;

    pub fn with_cell_size(mut self, width: f64, height: f64) -> Self {
        self.cell_width = width;
        self.cell_height = height;
        self
    }

    pub fn with_merge_distance(mut self, distance: f64) -> Self {
        self.merge_distance = Some(distance);
        self
    }

    pub fn cell_size(&self) -> MapSize {
        MapSize::new(self.cell_width, self.cell_height)
    }

    /// Merge distance for `cell`
    ///
    /// Must be positive and no larger than half of the shorter cell side.
    pub fn merge_distance_for(&self, cell: &MapSize) -> Result<f64> {
        let distance = self
            .merge_distance
            .unwrap_or(self.merge_ratio * cell.min_side());
        if !distance.is_finite()
            || distance <= 0.0
            || distance > cell.min_side() * Self::MAX_MERGE_RATIO
        {
            return Err(ClusterError::InvalidMergeDistance {
                distance,
                width: cell.width,
                height: cell.height,
            });
        }
        Ok(distance)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let cell = self.cell_size();
        if cell.validate_cell().is_err() {
            return Err(ClusterError::InvalidConfig(format!(
                "cell size must be positive and finite, got {} x {}",
                self.cell_width, self.cell_height
            )));
        }
        if !self.merge_ratio.is_finite()
            || self.merge_ratio <= 0.0
            || self.merge_ratio > Self::MAX_MERGE_RATIO
        {
            return Err(ClusterError::InvalidConfig(format!(
                "merge ratio must be in (0, {}], got {}",
                Self::MAX_MERGE_RATIO,
                self.merge_ratio
            )));
        }
        if self.merge_distance_for(&cell).is_err() {
            return Err(ClusterError::InvalidConfig(format!(
                "merge distance must be in (0, {}], got {:?}",
                cell.min_side() * Self::MAX_MERGE_RATIO,
                self.merge_distance
            )));
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: ClusteringConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Save configuration as TOML string
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ClusterError::InvalidConfig(e.to_string()))
    }
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            cell_width: Self::default_cell_side(),
            cell_height: Self::default_cell_side(),
            merge_ratio: Self::MAX_MERGE_RATIO,
            merge_distance: None,
        }
    }
}
