//! Points and cluster records

use super::geometry::MapRect;
use super::quadrant::Quadrant;

/// Point represents a coordinate in the flat projected map space
///
/// The point is stored as [x, y] where:
/// - `[0]` is x, growing eastward
/// - `[1]` is y, growing southward
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point(pub [f64; 2]);

/// PointList is a collection of Points
///
/// The position of a point in the list is its identifier: clusters and index
/// queries refer to points by that position.
pub type PointList = Vec<Point>;

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point([x, y])
    }

    pub fn x(&self) -> f64 {
        self.0[0]
    }

    pub fn y(&self) -> f64 {
        self.0[1]
    }

    /// Returns squared euclidean distance between two points
    pub fn sq_dist(&self, b: &Point) -> f64 {
        let dx = self.0[0] - b.0[0];
        let dy = self.0[1] - b.0[1];
        dx * dx + dy * dy
    }

    /// Checks if this point is less than or equal to another point
    /// (a <= b)
    pub fn less_eq(&self, b: &Point) -> bool {
        self.0[0] <= b.0[0] && self.0[1] <= b.0[1]
    }

    /// Checks if this point is greater than or equal to another point
    /// (a >= b)
    pub fn greater_eq(&self, b: &Point) -> bool {
        self.0[0] >= b.0[0] && self.0[1] >= b.0[1]
    }

    pub fn is_finite(&self) -> bool {
        self.0[0].is_finite() && self.0[1].is_finite()
    }
}

/// Absolute cell coordinate: `floor(x / cell_width)`, `floor(y / cell_height)`
///
/// Absolute coordinates do not depend on the viewport, so a cell keeps its
/// coordinate across pans at the same cell size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct CellCoord {
    pub col: i64,
    pub row: i64,
}

impl CellCoord {
    pub fn new(col: i64, row: i64) -> Self {
        CellCoord { col, row }
    }
}

/// Identity of a cluster: storage slot plus generation
///
/// The generation changes whenever the slot is released or the cluster it
/// holds changes after being handed out, so a stale id never matches a live
/// cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ClusterId {
    slot: u16,
    generation: u32,
}

impl ClusterId {
    pub(crate) const fn new(slot: u16, generation: u32) -> Self {
        ClusterId { slot, generation }
    }

    pub fn slot(self) -> u16 {
        self.slot
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

/// Lifecycle state of a cluster slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClusterKind {
    /// Slot is free
    #[default]
    Empty,
    /// Exactly one point
    Single,
    /// Several points that fell into the same cell
    Merged,
    /// Absorbed at least one neighbouring cluster
    Merger,
    /// Carried over unchanged by a pan; reverts to its prior kind when touched
    DoNotRecluster,
}

/// Cluster represents one marker: a single point or an aggregate of points
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cluster {
    pub(crate) id: ClusterId,
    pub(crate) rect: MapRect,
    pub(crate) cell: CellCoord,
    pub(crate) count: usize,
    pub(crate) sum: [f64; 2],
    pub(crate) representative: usize,
    pub(crate) kind: ClusterKind,
    prior_kind: ClusterKind,
    pub(crate) quadrant: Quadrant,
    /// Cells whose points this cluster took over in the overlap pass
    pub(crate) absorbed: Vec<CellCoord>,
}

impl Cluster {
    /// A single-point cluster sitting in the cell `rect`
    pub(crate) fn single(point_id: usize, p: Point, rect: MapRect, cell: CellCoord) -> Self {
        Cluster {
            id: ClusterId::default(),
            rect,
            cell,
            count: 1,
            sum: p.0,
            representative: point_id,
            kind: ClusterKind::Single,
            prior_kind: ClusterKind::Empty,
            quadrant: Quadrant::of_point(&rect, &p),
            absorbed: Vec::new(),
        }
    }

    /// Free slot placeholder carrying the slot's next identity
    pub(crate) fn vacant(id: ClusterId) -> Self {
        Cluster {
            id,
            ..Cluster::default()
        }
    }

    pub fn id(&self) -> ClusterId {
        self.id
    }

    /// Map rectangle of the cell the cluster sits in
    pub fn rect(&self) -> MapRect {
        self.rect
    }

    pub fn cell(&self) -> CellCoord {
        self.cell
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn kind(&self) -> ClusterKind {
        self.kind
    }

    pub fn quadrant(&self) -> Quadrant {
        self.quadrant
    }

    /// Identifier of the first point placed in the cluster
    pub fn representative(&self) -> usize {
        self.representative
    }

    pub fn absorbed_cells(&self) -> &[CellCoord] {
        &self.absorbed
    }

    pub fn is_single(&self) -> bool {
        self.count == 1
    }

    pub fn is_retained(&self) -> bool {
        self.kind == ClusterKind::DoNotRecluster
    }

    /// Centroid of the member points
    pub fn coordinate(&self) -> Point {
        if self.count == 0 {
            return self.rect.center();
        }
        let n = self.count as f64;
        Point([self.sum[0] / n, self.sum[1] / n])
    }

    /// Adds a point falling into the cluster's own cell
    pub(crate) fn add_point(&mut self, p: &Point) {
        self.thaw();
        self.count += 1;
        self.sum[0] += p.0[0];
        self.sum[1] += p.0[1];
        if self.kind == ClusterKind::Single {
            self.kind = ClusterKind::Merged;
        }
        self.quadrant = Quadrant::of_point(&self.rect, &self.coordinate());
    }

    /// Takes over the members and cells of a neighbouring cluster
    pub(crate) fn absorb(&mut self, other: &Cluster) {
        self.thaw();
        self.count += other.count;
        self.sum[0] += other.sum[0];
        self.sum[1] += other.sum[1];
        self.kind = ClusterKind::Merger;
        self.absorbed.push(other.cell);
        self.absorbed.extend_from_slice(&other.absorbed);
        self.quadrant = Quadrant::of_point(&self.rect, &self.coordinate());
    }

    pub(crate) fn retain(&mut self) {
        if self.kind != ClusterKind::DoNotRecluster {
            self.prior_kind = self.kind;
            self.kind = ClusterKind::DoNotRecluster;
        }
    }

    pub(crate) fn thaw(&mut self) {
        if self.kind == ClusterKind::DoNotRecluster {
            self.kind = self.prior_kind;
        }
    }

    /// Cell coordinates whose points are accounted for by this cluster
    pub fn owned_cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        std::iter::once(self.cell).chain(self.absorbed.iter().copied())
    }
}
