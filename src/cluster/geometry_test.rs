#[cfg(test)]
mod tests {
    use crate::cluster::{MapRect, MapSize, Point};
    use crate::error::ClusterError;

    #[test]
    fn test_validate_rect() {
        assert!(MapRect::new(0.0, 0.0, 10.0, 10.0).validate().is_ok());

        let bad = [
            MapRect::new(0.0, 0.0, 0.0, 10.0),
            MapRect::new(0.0, 0.0, 10.0, -1.0),
            MapRect::new(f64::NAN, 0.0, 10.0, 10.0),
            MapRect::new(0.0, 0.0, f64::INFINITY, 10.0),
        ];
        for rect in bad {
            assert!(
                matches!(rect.validate(), Err(ClusterError::InvalidRectangle { .. })),
                "{:?} should be rejected",
                rect
            );
        }
    }

    #[test]
    fn test_validate_query_allows_degenerate() {
        let p = Point::new(5.0, 5.0);
        assert!(MapRect::from_point(p).validate_query().is_ok());
        assert!(MapRect::new(0.0, 0.0, 10.0, 0.0).validate_query().is_ok());
        assert!(MapRect::new(0.0, 0.0, -1.0, 5.0).validate_query().is_err());
        assert!(MapRect::new(0.0, f64::NAN, 1.0, 5.0).validate_query().is_err());
    }

    #[test]
    fn test_validate_cell_size() {
        assert!(MapSize::new(256.0, 128.0).validate_cell().is_ok());
        for cell in [
            MapSize::new(0.0, 256.0),
            MapSize::new(256.0, -1.0),
            MapSize::new(f64::NAN, 256.0),
        ] {
            assert!(matches!(
                cell.validate_cell(),
                Err(ClusterError::InvalidCellSize { .. })
            ));
        }
    }

    #[test]
    fn test_normalize_aligned_rect_is_unchanged() {
        let cell = MapSize::new(256.0, 256.0);
        let rect = MapRect::new(0.0, 0.0, 512.0, 512.0);
        assert_eq!(rect.normalize_to_cell_size(&cell), rect);
    }

    #[test]
    fn test_normalize_rounds_outward() {
        let cell = MapSize::new(256.0, 256.0);
        let n = MapRect::new(100.0, 300.0, 500.0, 10.0).normalize_to_cell_size(&cell);
        assert_eq!(n.min(), Point::new(0.0, 256.0));
        assert_eq!(n.max(), Point::new(768.0, 512.0));
        assert_eq!(n.width(), 768.0);
        assert_eq!(n.height(), 256.0);
    }

    #[test]
    fn test_normalize_negative_origin() {
        let cell = MapSize::new(256.0, 256.0);
        let n = MapRect::new(-10.0, -300.0, 20.0, 20.0).normalize_to_cell_size(&cell);
        assert_eq!(n.min(), Point::new(-256.0, -512.0));
        assert_eq!(n.max(), Point::new(256.0, -256.0));
    }

    #[test]
    fn test_cell_index_matches_cell_edges() {
        for size in [0.1, 0.01, 0.3, 0.7, 256.0] {
            let cell = MapSize::new(size, size);
            for i in -200..200 {
                let v = i as f64 * size * 0.5;
                let k = cell.column_of(v);
                assert!(k * size <= v && v < (k + 1.0) * size, "{} in cells of {}", v, size);
                assert_eq!(cell.row_of(v), k);
            }
        }
    }

    #[test]
    fn test_cell_span_of_fractional_cells() {
        let cell = MapSize::new(0.1, 0.1);
        let [(col, col_end), (row, row_end)] =
            MapRect::new(0.3, 0.0, 4.0, 0.25).cell_span(&cell);
        // 3.0 * 0.1 lies above 0.3, so 0.3 falls in cell 2
        assert_eq!((col, row), (2.0, 0.0));
        assert_eq!(row_end, 3.0);
        // 0.3 + 4.0 lands exactly on the west edge of cell 43
        assert_eq!(col_end, 43.0);
        let n = MapRect::new(0.3, 0.0, 4.0, 0.25).normalize_to_cell_size(&cell);
        assert_eq!(n.min_x(), 2.0 * 0.1);
        assert_eq!(n.max_x(), 43.0 * 0.1);
    }

    #[test]
    fn test_contains_and_intersects() {
        let rect = MapRect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rect.contains_point(&Point::new(0.0, 0.0)));
        assert!(rect.contains_point(&Point::new(10.0, 10.0)));
        assert!(!rect.contains_point(&Point::new(10.1, 5.0)));

        assert!(rect.contains_rect(&MapRect::new(2.0, 2.0, 3.0, 3.0)));
        assert!(!rect.contains_rect(&MapRect::new(8.0, 8.0, 3.0, 3.0)));

        assert!(rect.intersects(&MapRect::new(10.0, 0.0, 5.0, 5.0)));
        assert!(rect.intersects(&MapRect::new(-5.0, -5.0, 30.0, 30.0)));
        assert!(!rect.intersects(&MapRect::new(10.5, 0.0, 5.0, 5.0)));
    }

    #[test]
    fn test_include_and_union() {
        let mut rect = MapRect::from_point(Point::new(1.0, 1.0));
        rect.include(&Point::new(-2.0, 4.0));
        assert_eq!(rect.min(), Point::new(-2.0, 1.0));
        assert_eq!(rect.max(), Point::new(1.0, 4.0));

        let u = rect.union(&MapRect::new(0.0, 0.0, 5.0, 2.0));
        assert_eq!(u.min(), Point::new(-2.0, 0.0));
        assert_eq!(u.max(), Point::new(5.0, 4.0));
        assert_eq!(u.center(), Point::new(1.5, 2.0));
    }
}
