#[cfg(test)]
mod tests {
    use crate::cluster::{CellCoord, Cluster, ClusterId, ClusterStorage, MapRect, Point, MAX_SLOTS};
    use crate::error::ClusterError;
    use quickcheck::quickcheck;
    use std::collections::HashSet;

    fn cluster(x: f64) -> Cluster {
        Cluster::single(0, Point::new(x, 0.0), MapRect::new(0.0, 0.0, 256.0, 256.0), CellCoord::new(0, 0))
    }

    #[test]
    fn test_released_slots_are_reused_last_in_first_out() {
        let mut storage = ClusterStorage::new();
        storage.reserve(4).unwrap();
        assert_eq!(storage.capacity(), 4);
        assert_eq!(storage.free_count(), 4);

        let a = storage.allocate(cluster(1.0)).unwrap();
        let b = storage.allocate(cluster(2.0)).unwrap();
        let c = storage.allocate(cluster(3.0)).unwrap();
        assert_eq!((a.slot(), b.slot(), c.slot()), (0, 1, 2));
        assert_eq!(storage.used(), 3);

        storage.release(b).unwrap();
        storage.release(a).unwrap();
        assert_eq!(storage.used(), 1);
        assert_eq!(storage.free_count(), 3);

        let d = storage.allocate(cluster(4.0)).unwrap();
        let e = storage.allocate(cluster(5.0)).unwrap();
        assert_eq!(d.slot(), 0);
        assert_eq!(e.slot(), 1);
        assert_ne!(d, a);
        assert_ne!(e, b);

        // Fresh slot comes after the reused ones
        let f = storage.allocate(cluster(6.0)).unwrap();
        assert_eq!(f.slot(), 3);
    }

    #[test]
    fn test_double_release() {
        let mut storage = ClusterStorage::new();
        let id = storage.allocate(cluster(1.0)).unwrap();
        let released = storage.release(id).unwrap();
        assert_eq!(released.count(), 1);
        assert_eq!(released.id(), id);

        assert!(matches!(
            storage.release(id),
            Err(ClusterError::DoubleRelease { slot: 0 })
        ));
        assert_eq!(storage.used(), 0);
    }

    #[test]
    fn test_stale_id_does_not_resolve() {
        let mut storage = ClusterStorage::new();
        let old = storage.allocate(cluster(1.0)).unwrap();
        storage.release(old).unwrap();
        let new = storage.allocate(cluster(2.0)).unwrap();

        assert_eq!(old.slot(), new.slot());
        assert!(new.generation() > old.generation());
        assert!(storage.get(old).is_none());
        assert_eq!(storage.get(new).map(|c| c.coordinate().x()), Some(2.0));
        assert!(storage.release(old).is_err());
        assert_eq!(storage.used(), 1);
    }

    #[test]
    fn test_growth_doubles() {
        let mut storage = ClusterStorage::new();
        assert_eq!(storage.capacity(), 0);
        for i in 0..16 {
            storage.allocate(cluster(i as f64)).unwrap();
        }
        assert_eq!(storage.capacity(), 16);
        assert_eq!(storage.free_count(), 0);

        let id = storage.allocate(cluster(16.0)).unwrap();
        assert_eq!(id.slot(), 16);
        assert_eq!(storage.capacity(), 32);
        assert_eq!(storage.used(), 17);
    }

    #[test]
    fn test_rekey() {
        let mut storage = ClusterStorage::new();
        let id = storage.allocate(cluster(1.0)).unwrap();
        let rekeyed = storage.rekey(id).unwrap();

        assert_eq!(rekeyed.slot(), id.slot());
        assert_ne!(rekeyed, id);
        assert!(storage.get(id).is_none());
        assert_eq!(storage.get(rekeyed).map(|c| c.id()), Some(rekeyed));
        assert!(storage.rekey(id).is_err());

        // The slot's next identity differs from both
        storage.release(rekeyed).unwrap();
        let next = storage.allocate(cluster(2.0)).unwrap();
        assert_ne!(next, id);
        assert_ne!(next, rekeyed);
    }

    #[test]
    fn test_overflow() {
        let mut storage = ClusterStorage::new();
        assert!(matches!(
            storage.reserve(MAX_SLOTS + 1),
            Err(ClusterError::GridOverflow { .. })
        ));
        assert_eq!(storage.capacity(), 0);

        storage.reserve(MAX_SLOTS).unwrap();
        for i in 0..MAX_SLOTS {
            storage.allocate(cluster(i as f64)).unwrap();
        }
        assert!(matches!(
            storage.allocate(cluster(0.0)),
            Err(ClusterError::GridOverflow { .. })
        ));
        assert_eq!(storage.used(), MAX_SLOTS);
    }

    #[test]
    fn test_generation_base() {
        let mut storage = ClusterStorage::with_generation_base(7);
        assert_eq!(storage.next_generation(), 7);
        let id = storage.allocate(cluster(1.0)).unwrap();
        assert_eq!(id.generation(), 7);
        storage.release(id).unwrap();
        assert_eq!(storage.next_generation(), 9);

        let fresh = ClusterStorage::with_generation_base(storage.next_generation());
        assert_eq!(fresh.next_generation(), 9);
    }

    #[test]
    fn test_iter_and_debug_dump() {
        let mut storage = ClusterStorage::new();
        storage.reserve(3).unwrap();
        let a = storage.allocate(cluster(1.0)).unwrap();
        let b = storage.allocate(cluster(2.0)).unwrap();
        storage.release(a).unwrap();

        let live: Vec<ClusterId> = storage.iter().map(|c| c.id()).collect();
        assert_eq!(live, vec![b]);

        let dump = storage.debug_dump();
        assert!(dump.starts_with("storage: capacity=3 used=1 free=2"));
        assert!(dump.contains("Single"));
        assert!(dump.contains("free stack: [2, 0]"));
    }

    #[test]
    fn prop_live_ids_stay_consistent() {
        // Each op allocates when even, releases the n-th live id when odd
        fn prop(ops: Vec<u8>) -> bool {
            let mut storage = ClusterStorage::new();
            let mut live: Vec<ClusterId> = Vec::new();
            let mut seen = HashSet::new();

            for op in ops {
                if op % 2 == 0 || live.is_empty() {
                    let id = match storage.allocate(cluster(op as f64)) {
                        Ok(id) => id,
                        Err(_) => return false,
                    };
                    if !seen.insert(id) {
                        return false;
                    }
                    live.push(id);
                } else {
                    let id = live.swap_remove(op as usize % live.len());
                    if storage.release(id).is_err() {
                        return false;
                    }
                }

                let slots: HashSet<u16> = live.iter().map(|id| id.slot()).collect();
                if slots.len() != live.len()
                    || storage.used() != live.len()
                    || storage.used() + storage.free_count() != storage.capacity()
                    || live.iter().any(|&id| storage.get(id).is_none())
                {
                    return false;
                }
            }
            true
        }
        quickcheck(prop as fn(Vec<u8>) -> bool);
    }
}
