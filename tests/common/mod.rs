//! Shared harness for multi-rank protocol tests: each rank runs as a thread
//! over `ThreadComm`. Tests sharing a process must use disjoint tag bases.

use std::sync::Arc;

/// Runs `f(rank)` on `procs` threads and returns the per-rank results,
/// indexed by rank. Panics in any rank propagate on join.
pub fn spmd<R, F>(procs: usize, f: F) -> Vec<R>
where
    R: Send + 'static,
    F: Fn(usize) -> R + Send + Sync + 'static,
{
    let f = Arc::new(f);
    let handles: Vec<_> = (0..procs)
        .map(|rank| {
            let f = Arc::clone(&f);
            std::thread::spawn(move || f(rank))
        })
        .collect();
    handles
        .into_iter()
        .map(|h| h.join().expect("rank thread panicked"))
        .collect()
}
