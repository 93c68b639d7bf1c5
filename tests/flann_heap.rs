//! FLANN's index state lives on the C heap, out of reach of Rust's
//! allocator. Repeated build/destroy cycles must not grow it.
//!
//! Kept to a single test: the glibc counters are process-wide.

#![cfg(all(target_os = "linux", target_env = "gnu"))]

use flann_shim::capi::{flBuildIndex, flDeleteIndex};
use flann_shim::{FLANNParameters, IndexParams};

const ROWS: usize = 2000;
const COLS: usize = 8;
const CYCLES: usize = 25;

/// Bytes in use on the C heap, small chunks plus mmapped ones.
fn c_heap_in_use() -> usize {
    // SAFETY: mallinfo2 only reads allocator statistics.
    let info = unsafe { libc::mallinfo2() };
    info.uordblks + info.hblkhd
}

fn dataset() -> Vec<f32> {
    // deterministic, well spread points
    (0..ROWS * COLS)
        .map(|i| ((i * 7919) % 1009) as f32 / 1009.0)
        .collect()
}

fn build_and_destroy(data: &mut [f32], params: &mut FLANNParameters) {
    unsafe {
        let handle = flBuildIndex(data.as_mut_ptr(), ROWS as i32, COLS as i32, params);
        assert!(!handle.is_null());
        flDeleteIndex(handle);
    }
}

#[test]
fn destroy_returns_flann_memory() {
    let mut data = dataset();
    let mut params = IndexParams::kdtree(4).to_raw();

    // first builds may set up FLANN's lazily allocated globals
    for _ in 0..3 {
        build_and_destroy(&mut data, &mut params);
    }

    let before = c_heap_in_use();
    let footprint = unsafe {
        let handle = flBuildIndex(data.as_mut_ptr(), ROWS as i32, COLS as i32, &mut params);
        assert!(!handle.is_null());
        let live = c_heap_in_use().saturating_sub(before);
        flDeleteIndex(handle);
        live
    };
    assert!(footprint > 0, "a live index should occupy C heap");

    let start = c_heap_in_use();
    for _ in 0..CYCLES {
        build_and_destroy(&mut data, &mut params);
    }
    let grown = c_heap_in_use().saturating_sub(start);

    // a leak would grow by roughly CYCLES * footprint
    assert!(
        grown < footprint,
        "C heap grew {} bytes over {} cycles (one index is {} bytes)",
        grown,
        CYCLES,
        footprint
    );
}
