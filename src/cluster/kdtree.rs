//! 2-D K-D tree over map points with per-subtree aggregates
//!
//! Construction follows <https://godoc.org/code.google.com/p/eaburns/kdtree>:
//! points are pre-sorted once on each axis and split at the median.
//!
//! Original code is under New BSD License.
//! Author: Ethan Burns <burns.ethan@gmail.com>

use super::geometry::MapRect;
use super::point::{Point, PointList};
use crate::error::Result;

/// Point count and coordinate sum of a set of points
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Aggregate {
    pub count: usize,
    pub sum: [f64; 2],
}

impl Aggregate {
    fn add_point(&mut self, p: &Point, n: usize) {
        self.count += n;
        self.sum[0] += p.0[0] * n as f64;
        self.sum[1] += p.0[1] * n as f64;
    }

    fn add(&mut self, other: &Aggregate) {
        self.count += other.count;
        self.sum[0] += other.sum[0];
        self.sum[1] += other.sum[1];
    }

    /// Mean position, `None` for an empty aggregate
    pub fn centroid(&self) -> Option<Point> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f64;
        Some(Point([self.sum[0] / n, self.sum[1] / n]))
    }
}

/// Spatial index over all clusterable points
///
/// Points are separated from nodes. Nodes hold only indices into the Points slice,
/// and those indices are the point identifiers handed out by queries.
pub struct PointIndex {
    points: PointList,
    root: Option<Box<IndexNode>>,
}

/// A node in the K-D tree
///
/// Left subtree holds points strictly less than this node on the split axis,
/// right subtree holds points greater or equal.
pub struct IndexNode {
    /// Index of the point associated with this node
    pub point_id: usize,
    /// Indices of points equal to this node's point
    pub equal_ids: Vec<usize>,
    /// Bounding rectangle of every point in the subtree
    pub bounds: MapRect,
    /// Count and coordinate sum of every point in the subtree
    pub aggregate: Aggregate,

    split: usize,
    left: Option<Box<IndexNode>>,
    right: Option<Box<IndexNode>>,
}

impl PointIndex {
    /// Builds a balanced index from the given points
    ///
    /// Points with non-finite coordinates keep their identifier but are not
    /// indexed, so no query returns them.
    pub fn build(points: PointList) -> PointIndex {
        let root = build_tree(&points, 0, &pre_sort(&points));

        PointIndex { points, root }
    }

    /// Number of point identifiers handed out, indexed or not
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, id: usize) -> Option<&Point> {
        self.points.get(id)
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Bounding rectangle of all indexed points
    pub fn bounds(&self) -> Option<MapRect> {
        self.root.as_ref().map(|r| r.bounds)
    }

    /// Inserts a point into the tree and returns its identifier
    ///
    /// Insertion does not rebalance; build the index from the full point set
    /// when possible.
    pub fn insert(&mut self, point: Point) -> usize {
        self.points.push(point);
        let point_id = self.points.len() - 1;
        if point.is_finite() {
            insert_node(&self.points, &mut self.root, 0, point_id);
        }
        point_id
    }

    /// Returns identifiers of every point inside the closed rectangle
    pub fn query(&self, rect: &MapRect) -> Result<Vec<usize>> {
        self.query_into(rect, Vec::new())
    }

    /// Same as [`PointIndex::query`], appending to `nodes`
    ///
    /// To avoid allocation, the `nodes` vector can be pre-allocated with a larger
    /// capacity and re-used across multiple calls.
    pub fn query_into(&self, rect: &MapRect, mut nodes: Vec<usize>) -> Result<Vec<usize>> {
        rect.validate_query()?;
        self.query_recursive(self.root.as_deref(), rect, &mut nodes);
        Ok(nodes)
    }

    fn query_recursive(&self, t: Option<&IndexNode>, rect: &MapRect, nodes: &mut Vec<usize>) {
        let t = match t {
            None => return,
            Some(t) => t,
        };

        if !rect.intersects(&t.bounds) {
            return;
        }
        if rect.contains_rect(&t.bounds) {
            t.collect(nodes);
            return;
        }

        let p = &self.points[t.point_id];
        if rect.contains_point(p) {
            nodes.push(t.point_id);
            nodes.extend_from_slice(&t.equal_ids);
        }

        let pivot = p.0[t.split];
        if rect.min().0[t.split] < pivot {
            self.query_recursive(t.left.as_deref(), rect, nodes);
        }
        if rect.max().0[t.split] >= pivot {
            self.query_recursive(t.right.as_deref(), rect, nodes);
        }
    }

    /// Count and coordinate sum of the points inside the closed rectangle
    ///
    /// Subtrees lying entirely inside the rectangle contribute their stored
    /// aggregate without being visited.
    pub fn aggregate(&self, rect: &MapRect) -> Result<Aggregate> {
        rect.validate_query()?;
        let mut result = Aggregate::default();
        self.aggregate_recursive(self.root.as_deref(), rect, &mut result);
        Ok(result)
    }

    fn aggregate_recursive(&self, t: Option<&IndexNode>, rect: &MapRect, acc: &mut Aggregate) {
        let Some(t) = t else { return };

        if !rect.intersects(&t.bounds) {
            return;
        }
        if rect.contains_rect(&t.bounds) {
            acc.add(&t.aggregate);
            return;
        }

        let p = &self.points[t.point_id];
        if rect.contains_point(p) {
            acc.add_point(p, 1 + t.equal_ids.len());
        }
        self.aggregate_recursive(t.left.as_deref(), rect, acc);
        self.aggregate_recursive(t.right.as_deref(), rect, acc);
    }

    /// Returns the height of the K-D tree
    pub fn height(&self) -> usize {
        self.root.as_ref().map_or(0, |r| r.height())
    }
}

impl IndexNode {
    fn new(
        points: &[Point],
        point_id: usize,
        equal_ids: Vec<usize>,
        split: usize,
        left: Option<Box<IndexNode>>,
        right: Option<Box<IndexNode>>,
    ) -> IndexNode {
        let p = points[point_id];
        let mut bounds = MapRect::from_point(p);
        let mut aggregate = Aggregate::default();
        aggregate.add_point(&p, 1 + equal_ids.len());

        for child in [&left, &right].into_iter().flatten() {
            bounds = bounds.union(&child.bounds);
            aggregate.add(&child.aggregate);
        }

        IndexNode {
            point_id,
            equal_ids,
            bounds,
            aggregate,
            split,
            left,
            right,
        }
    }

    fn collect(&self, nodes: &mut Vec<usize>) {
        if let Some(l) = &self.left {
            l.collect(nodes);
        }
        nodes.push(self.point_id);
        nodes.extend_from_slice(&self.equal_ids);
        if let Some(r) = &self.right {
            r.collect(nodes);
        }
    }

    fn height(&self) -> usize {
        let ht = self.left.as_ref().map_or(0, |l| l.height());
        let rht = self.right.as_ref().map_or(0, |r| r.height());
        ht.max(rht) + 1
    }
}

fn insert_node(points: &[Point], t: &mut Option<Box<IndexNode>>, depth: usize, point_id: usize) {
    let p = points[point_id];
    match t {
        None => {
            *t = Some(Box::new(IndexNode::new(
                points,
                point_id,
                Vec::new(),
                depth % 2,
                None,
                None,
            )));
        }
        Some(node) => {
            node.bounds.include(&p);
            node.aggregate.add_point(&p, 1);
            if p.0[node.split] < points[node.point_id].0[node.split] {
                insert_node(points, &mut node.left, depth + 1, point_id);
            } else {
                insert_node(points, &mut node.right, depth + 1, point_id);
            }
        }
    }
}

/// Builds a tree node by finding the median point and recursively building left and right subtrees
fn build_tree(points: &[Point], depth: usize, nodes: &PreSorted) -> Option<Box<IndexNode>> {
    let split = depth % 2;
    match nodes.cur[split].len() {
        0 => None,
        1 => Some(Box::new(IndexNode::new(
            points,
            nodes.cur[split][0],
            Vec::new(),
            split,
            None,
            None,
        ))),
        _ => {
            let (med, equal, left, right) = nodes.split_med(split);
            let left = build_tree(points, depth + 1, &left);
            let right = build_tree(points, depth + 1, &right);
            Some(Box::new(IndexNode::new(
                points, med, equal, split, left, right,
            )))
        }
    }
}

/// Holds nodes pre-sorted on each dimension
struct PreSorted<'a> {
    points: &'a [Point],
    /// Currently sorted set of point IDs by dimension
    cur: [Vec<usize>; 2],
}

/// Pre-sorts nodes on each dimension
fn pre_sort(points: &[Point]) -> PreSorted<'_> {
    let mut p = PreSorted {
        points,
        cur: [Vec::new(), Vec::new()],
    };
    for i in 0..2 {
        p.cur[i] = (0..points.len()).filter(|&n| points[n].is_finite()).collect();
        p.cur[i].sort_by(|&a, &b| {
            // For equal values, sort by the other dimension
            points[a].0[i]
                .total_cmp(&points[b].0[i])
                .then_with(|| points[a].0[1 - i].total_cmp(&points[b].0[1 - i]))
        });
    }
    p
}

impl<'a> PreSorted<'a> {
    /// Returns the median node on the split dimension and two PreSorted structs
    /// that contain the nodes (still sorted on each dimension) that are less than
    /// and greater than or equal to the median node value on the given splitting dimension.
    fn split_med(&self, dim: usize) -> (usize, Vec<usize>, PreSorted<'a>, PreSorted<'a>) {
        let cur = &self.cur[dim];
        let mut m = cur.len() / 2;
        while m > 0 && self.points[cur[m - 1]].0[dim] == self.points[cur[m]].0[dim] {
            m -= 1;
        }
        let mut mh = m;
        while mh < cur.len() - 1 && self.points[cur[mh + 1]] == self.points[cur[m]] {
            mh += 1;
        }
        let med = cur[m];
        let equal = cur[m + 1..=mh].to_vec();
        let pivot = self.points[med].0[dim];

        // Median and its duplicates stay at this node
        let mut taken = cur[m..=mh].to_vec();
        taken.sort_unstable();

        let mut left = PreSorted {
            points: self.points,
            cur: [Vec::new(), Vec::new()],
        };
        left.cur[dim] = cur[..m].to_vec();

        let mut right = PreSorted {
            points: self.points,
            cur: [Vec::new(), Vec::new()],
        };
        right.cur[dim] = cur[mh + 1..].to_vec();

        let other = 1 - dim;
        left.cur[other] = Vec::with_capacity(left.cur[dim].len());
        right.cur[other] = Vec::with_capacity(right.cur[dim].len());

        for &n in &self.cur[other] {
            if taken.binary_search(&n).is_ok() {
                continue;
            }
            if self.points[n].0[dim] < pivot {
                left.cur[other].push(n);
            } else {
                right.cur[other].push(n);
            }
        }

        (med, equal, left, right)
    }
}
