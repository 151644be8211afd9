//! Free-list arena of cluster records addressed by 16-bit slots

use super::point::{Cluster, ClusterId, ClusterKind};
use crate::error::{ClusterError, Result};
use std::fmt::Write;

/// Largest number of slots addressable by a `u16` slot index
pub const MAX_SLOTS: usize = u16::MAX as usize + 1;

const MIN_GROWTH: usize = 16;

/// Growable storage of cluster records with a stack of free slots
///
/// Every slot is either in use (non-`Empty` kind) or on the free stack, never
/// both. Released slots get a new generation so ids handed out before the
/// release no longer resolve.
#[derive(Debug, Default)]
pub struct ClusterStorage {
    slots: Vec<Cluster>,
    free: Vec<u16>,
    used: usize,
    generation_base: u32,
}

impl ClusterStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage whose fresh slots start at `generation_base`
    ///
    /// Lets a rebuilt storage hand out ids that differ from every id of the
    /// storage it replaces.
    pub fn with_generation_base(generation_base: u32) -> Self {
        ClusterStorage {
            generation_base,
            ..Self::default()
        }
    }

    /// Number of materialized slots, used or free
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Materializes free slots until the capacity reaches `total`
    pub fn reserve(&mut self, total: usize) -> Result<()> {
        if total <= self.slots.len() {
            return Ok(());
        }
        if total > MAX_SLOTS {
            return Err(ClusterError::GridOverflow {
                cells: total as f64,
                max: MAX_SLOTS,
            });
        }

        let start = self.slots.len();
        let additional = total - start;
        self.slots.try_reserve_exact(additional)?;
        let mut free = Vec::new();
        free.try_reserve_exact(self.free.len() + additional)?;

        // Fresh slots go under the already freed ones, lowest index on top
        free.extend((start..total).rev().map(|slot| slot as u16));
        free.extend_from_slice(&self.free);
        let generation = self.generation_base;
        self.slots.extend(
            (start..total).map(|slot| Cluster::vacant(ClusterId::new(slot as u16, generation))),
        );
        self.free = free;
        Ok(())
    }

    /// Stores `cluster` in a free slot and returns its id
    ///
    /// The most recently released slot is reused first; without free slots the
    /// storage doubles.
    pub fn allocate(&mut self, mut cluster: Cluster) -> Result<ClusterId> {
        if self.free.is_empty() {
            let grown = (self.slots.len() * 2).max(MIN_GROWTH).min(MAX_SLOTS);
            if grown == self.slots.len() {
                return Err(ClusterError::GridOverflow {
                    cells: (grown + 1) as f64,
                    max: MAX_SLOTS,
                });
            }
            self.reserve(grown)?;
        }

        let slot = self.free.pop().ok_or(ClusterError::GridOverflow {
            cells: (self.slots.len() + 1) as f64,
            max: MAX_SLOTS,
        })?;
        let entry = &mut self.slots[slot as usize];
        debug_assert_eq!(entry.kind, ClusterKind::Empty);
        cluster.id = entry.id;
        *entry = cluster;
        self.used += 1;
        Ok(entry.id)
    }

    /// Frees the slot of `id` and returns the cluster it held
    pub fn release(&mut self, id: ClusterId) -> Result<Cluster> {
        let entry = self
            .slots
            .get_mut(id.slot() as usize)
            .filter(|c| c.kind != ClusterKind::Empty && c.id == id)
            .ok_or(ClusterError::DoubleRelease { slot: id.slot() })?;

        let next = ClusterId::new(id.slot(), id.generation().wrapping_add(1));
        let released = std::mem::replace(entry, Cluster::vacant(next));
        self.free.push(id.slot());
        self.used -= 1;
        Ok(released)
    }

    /// Gives a live cluster a new generation and returns the new id
    pub fn rekey(&mut self, id: ClusterId) -> Result<ClusterId> {
        let cluster = self
            .get_mut(id)
            .ok_or(ClusterError::DoubleRelease { slot: id.slot() })?;
        cluster.id = ClusterId::new(id.slot(), id.generation().wrapping_add(1));
        Ok(cluster.id)
    }

    pub fn get(&self, id: ClusterId) -> Option<&Cluster> {
        self.slot(id.slot()).filter(|c| c.id == id)
    }

    pub fn get_mut(&mut self, id: ClusterId) -> Option<&mut Cluster> {
        self.slot_mut(id.slot()).filter(|c| c.id == id)
    }

    /// Live cluster in `slot` regardless of generation
    pub fn slot(&self, slot: u16) -> Option<&Cluster> {
        self.slots
            .get(slot as usize)
            .filter(|c| c.kind != ClusterKind::Empty)
    }

    pub fn slot_mut(&mut self, slot: u16) -> Option<&mut Cluster> {
        self.slots
            .get_mut(slot as usize)
            .filter(|c| c.kind != ClusterKind::Empty)
    }

    /// Live clusters in slot order
    pub fn iter(&self) -> impl Iterator<Item = &Cluster> {
        self.slots.iter().filter(|c| c.kind != ClusterKind::Empty)
    }

    /// Smallest generation not used by any slot so far
    pub fn next_generation(&self) -> u32 {
        self.slots
            .iter()
            .map(|c| c.id.generation().wrapping_add(1))
            .max()
            .unwrap_or(self.generation_base)
            .max(self.generation_base)
    }

    /// Human-readable slot table for diagnostics
    pub fn debug_dump(&self) -> String {
        let mut out = format!(
            "storage: capacity={} used={} free={}\n",
            self.capacity(),
            self.used,
            self.free.len()
        );
        for c in &self.slots {
            let _ = writeln!(
                out,
                "  [{:5}] gen={} {:?} count={} cell=({}, {})",
                c.id.slot(),
                c.id.generation(),
                c.kind,
                c.count,
                c.cell.col,
                c.cell.row
            );
        }
        let _ = writeln!(out, "  free stack: {:?}", self.free);
        out
    }
}
