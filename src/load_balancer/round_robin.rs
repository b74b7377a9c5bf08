// src/load_balancer/round_robin.rs
use crate::proxy::Backend;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Lock-free round-robin cursor that skips unhealthy backends.
///
/// Every candidate, including the ones skipped, costs one atomic increment.
/// Concurrent callers therefore start their scans from different positions
/// instead of all retrying the same dead index.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self {
            cursor: AtomicUsize::new(0),
        }
    }

    /// Total number of candidates examined so far.
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Relaxed)
    }

    fn next_index(&self, len: usize) -> usize {
        self.cursor.fetch_add(1, Ordering::Relaxed) % len
    }

    /// Returns the next healthy backend, examining at most `backends.len()`
    /// candidates. `None` when the slice is empty or every candidate is down.
    pub fn select<'a>(&self, backends: &'a [Arc<Backend>]) -> Option<&'a Arc<Backend>> {
        let len = backends.len();
        if len == 0 {
            return None;
        }

        for _ in 0..len {
            let backend = &backends[self.next_index(len)];
            if backend.is_healthy() {
                return Some(backend);
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn make_backends(n: usize) -> Vec<Arc<Backend>> {
        (0..n)
            .map(|i| Arc::new(Backend::parse(&format!("http://10.0.0.{}:8080", i + 1)).unwrap()))
            .collect()
    }

    #[test]
    fn test_round_robin_cycling() {
        let backends = make_backends(3);
        let rr = RoundRobin::new();

        let picks: Vec<_> = (0..6)
            .map(|_| rr.select(&backends).unwrap().id.clone())
            .collect();

        assert_eq!(
            picks,
            vec![
                "10.0.0.1:8080",
                "10.0.0.2:8080",
                "10.0.0.3:8080",
                "10.0.0.1:8080",
                "10.0.0.2:8080",
                "10.0.0.3:8080",
            ]
        );
    }

    #[test]
    fn test_empty_returns_none_without_touching_cursor() {
        let rr = RoundRobin::new();
        assert!(rr.select(&[]).is_none());
        assert_eq!(rr.cursor(), 0);
    }

    #[test]
    fn test_skips_unhealthy() {
        let backends = make_backends(3);
        backends[1].set_healthy(false);
        let rr = RoundRobin::new();

        for _ in 0..30 {
            assert_ne!(rr.select(&backends).unwrap().id, backends[1].id);
        }
    }

    #[test]
    fn test_all_unhealthy_examines_exactly_n() {
        let backends = make_backends(4);
        backends.iter().for_each(|b| {
            b.set_healthy(false);
        });
        let rr = RoundRobin::new();

        assert!(rr.select(&backends).is_none());
        assert_eq!(rr.cursor(), 4);
        assert!(rr.select(&backends).is_none());
        assert_eq!(rr.cursor(), 8);
    }

    #[test]
    fn test_recovered_backend_rejoins_rotation() {
        let backends = make_backends(2);
        backends[0].set_healthy(false);
        let rr = RoundRobin::new();

        assert_eq!(rr.select(&backends).unwrap().id, backends[1].id);
        backends[0].set_healthy(true);

        let seen: HashSet<_> = (0..2).map(|_| rr.select(&backends).unwrap().id.clone()).collect();
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_concurrent_selection_spreads_load() {
        let backends = Arc::new(make_backends(4));
        let rr = Arc::new(RoundRobin::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let backends = backends.clone();
                let rr = rr.clone();
                std::thread::spawn(move || {
                    (0..1000)
                        .map(|_| rr.select(&backends).unwrap().id.clone())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut counts = std::collections::HashMap::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                *counts.entry(id).or_insert(0usize) += 1;
            }
        }

        // Every pick is one increment, so the split is exact.
        assert_eq!(rr.cursor(), 8000);
        assert!(counts.values().all(|&c| c == 2000));
    }

    proptest! {
        #[test]
        fn prop_window_of_n_visits_each_once(n in 1usize..12, start in 0usize..50) {
            let backends = make_backends(n);
            let rr = RoundRobin::new();
            for _ in 0..start {
                rr.select(&backends);
            }

            let window: HashSet<_> = (0..n)
                .map(|_| rr.select(&backends).unwrap().id.clone())
                .collect();
            prop_assert_eq!(window.len(), n);
        }

        #[test]
        fn prop_never_returns_unhealthy_while_one_is_up(
            health in proptest::collection::vec(any::<bool>(), 1..10),
            picks in 1usize..40,
        ) {
            let backends = make_backends(health.len());
            for (backend, healthy) in backends.iter().zip(&health) {
                backend.set_healthy(*healthy);
            }
            let rr = RoundRobin::new();

            for _ in 0..picks {
                let before = rr.cursor();
                match rr.select(&backends) {
                    Some(b) => prop_assert!(b.is_healthy()),
                    None => prop_assert!(health.iter().all(|h| !h)),
                }
                prop_assert!(rr.cursor() - before <= backends.len());
            }
        }
    }
}
