//! Distribution quadrants and the neighbour pruning table
//!
//! A cell is split into four quadrants around its centre:
//!
//! ```text
//!  --------
//! | NW  NE |
//! |        |
//! | SW  SE |
//!  --------
//! ```
//!
//! With a merge distance of at most half a cell side, a representative point
//! in the NE quadrant is at least half a cell away from the west, south-west,
//! south, south-east and north-west neighbours, so only E, NE and N can hold
//! an overlapping cluster. The other quadrants are symmetric.
//!
//! ```text
//!  -------- -------- --------
//! |   NW   |   N    |   NE   |
//!  -------- -------- --------
//! |   W    |  cell  |   E    |
//!  -------- -------- --------
//! |   SW   |   S    |   SE   |
//!  -------- -------- --------
//! ```

use super::geometry::MapRect;
use super::point::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Quadrant {
    #[default]
    NorthEast,
    NorthWest,
    SouthWest,
    SouthEast,
}

/// One of the eight cells around a grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Neighbor {
    East,
    NorthEast,
    North,
    NorthWest,
    West,
    SouthWest,
    South,
    SouthEast,
}

const ADJACENT_NEIGHBORS: [[Neighbor; 3]; 4] = [
    [Neighbor::East, Neighbor::NorthEast, Neighbor::North],
    [Neighbor::North, Neighbor::NorthWest, Neighbor::West],
    [Neighbor::West, Neighbor::SouthWest, Neighbor::South],
    [Neighbor::South, Neighbor::SouthEast, Neighbor::East],
];

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::NorthEast,
        Quadrant::NorthWest,
        Quadrant::SouthWest,
        Quadrant::SouthEast,
    ];

    /// Quadrant of `p` relative to the centre of `rect`
    ///
    /// Points on the centre lines fall east and south.
    pub fn of_point(rect: &MapRect, p: &Point) -> Quadrant {
        let east = p.x() >= rect.mid_x();
        let south = p.y() >= rect.mid_y();
        match (east, south) {
            (true, false) => Quadrant::NorthEast,
            (false, false) => Quadrant::NorthWest,
            (false, true) => Quadrant::SouthWest,
            (true, true) => Quadrant::SouthEast,
        }
    }

    /// The three neighbours that may hold a cluster overlapping this quadrant
    pub fn adjacent(self) -> &'static [Neighbor; 3] {
        &ADJACENT_NEIGHBORS[self as usize]
    }
}

impl Neighbor {
    pub const ALL: [Neighbor; 8] = [
        Neighbor::East,
        Neighbor::NorthEast,
        Neighbor::North,
        Neighbor::NorthWest,
        Neighbor::West,
        Neighbor::SouthWest,
        Neighbor::South,
        Neighbor::SouthEast,
    ];

    /// `(column, row)` delta from the current cell; rows grow southward
    pub fn delta(self) -> (i64, i64) {
        match self {
            Neighbor::East => (1, 0),
            Neighbor::NorthEast => (1, -1),
            Neighbor::North => (0, -1),
            Neighbor::NorthWest => (-1, -1),
            Neighbor::West => (-1, 0),
            Neighbor::SouthWest => (-1, 1),
            Neighbor::South => (0, 1),
            Neighbor::SouthEast => (1, 1),
        }
    }
}
