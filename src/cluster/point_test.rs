#[cfg(test)]
mod tests {
    use super::super::*;

    fn cell_rect() -> MapRect {
        MapRect::new(0.0, 0.0, 256.0, 256.0)
    }

    #[test]
    fn test_sq_dist() {
        let p1 = Point::new(0.0, 0.0);
        let p2 = Point::new(3.0, 4.0);
        assert_eq!(p1.sq_dist(&p2), 25.0);
        assert_eq!(p2.sq_dist(&p1), 25.0);
        assert_eq!(p1.sq_dist(&p1), 0.0);
    }

    #[test]
    fn test_single_cluster() {
        let c = Cluster::single(7, Point::new(200.0, 40.0), cell_rect(), CellCoord::new(0, 0));
        assert_eq!(c.count(), 1);
        assert_eq!(c.kind(), ClusterKind::Single);
        assert_eq!(c.representative(), 7);
        assert_eq!(c.coordinate(), Point::new(200.0, 40.0));
        assert_eq!(c.quadrant(), Quadrant::NorthEast);
        assert!(c.is_single());
        assert!(c.absorbed_cells().is_empty());
    }

    #[test]
    fn test_add_point_moves_centroid_and_quadrant() {
        let mut c = Cluster::single(0, Point::new(200.0, 40.0), cell_rect(), CellCoord::new(0, 0));
        c.add_point(&Point::new(10.0, 240.0));

        assert_eq!(c.count(), 2);
        assert_eq!(c.kind(), ClusterKind::Merged);
        assert_eq!(c.coordinate(), Point::new(105.0, 140.0));
        assert_eq!(c.quadrant(), Quadrant::SouthWest);
        assert_eq!(c.representative(), 0);
    }

    #[test]
    fn test_absorb_takes_over_cells() {
        let mut a = Cluster::single(0, Point::new(200.0, 40.0), cell_rect(), CellCoord::new(0, 0));
        let b = Cluster::single(
            1,
            Point::new(300.0, 40.0),
            MapRect::new(256.0, 0.0, 256.0, 256.0),
            CellCoord::new(1, 0),
        );
        a.absorb(&b);

        assert_eq!(a.count(), 2);
        assert_eq!(a.kind(), ClusterKind::Merger);
        assert_eq!(a.coordinate(), Point::new(250.0, 40.0));
        assert_eq!(a.quadrant(), Quadrant::NorthEast);
        assert_eq!(a.absorbed_cells(), &[CellCoord::new(1, 0)]);
        let owned: Vec<CellCoord> = a.owned_cells().collect();
        assert_eq!(owned, vec![CellCoord::new(0, 0), CellCoord::new(1, 0)]);
    }

    #[test]
    fn test_retain_and_thaw() {
        let mut c = Cluster::single(0, Point::new(10.0, 10.0), cell_rect(), CellCoord::new(0, 0));
        c.add_point(&Point::new(20.0, 20.0));
        c.retain();
        assert!(c.is_retained());
        assert_eq!(c.kind(), ClusterKind::DoNotRecluster);

        // Retaining twice keeps the prior kind
        c.retain();
        c.thaw();
        assert_eq!(c.kind(), ClusterKind::Merged);
        assert!(!c.is_retained());
    }

    #[test]
    fn test_touching_retained_cluster_restores_kind() {
        let mut c = Cluster::single(0, Point::new(10.0, 10.0), cell_rect(), CellCoord::new(0, 0));
        c.retain();
        c.add_point(&Point::new(30.0, 30.0));
        assert_eq!(c.kind(), ClusterKind::Merged);
        assert_eq!(c.count(), 2);
    }
}
