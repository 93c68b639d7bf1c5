//! Build/destroy must hand back every byte the shim allocates.
//!
//! Counts live bytes per thread so that the test harness's own allocations
//! on other threads do not interfere. FLANN's own heap is covered by
//! `tests/flann_heap.rs`.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;
use std::mem::size_of;

use flann_shim::capi::{flBuildIndex, flDeleteIndex};
use flann_shim::handle::FlIndex;
use flann_shim::{FLANNParameters, Index, IndexParams, Matrix};

struct Counting;

thread_local! {
    static LIVE: Cell<isize> = const { Cell::new(0) };
}

fn track(delta: isize) {
    let _ = LIVE.try_with(|live| live.set(live.get() + delta));
}

fn live() -> isize {
    LIVE.with(|live| live.get())
}

unsafe impl GlobalAlloc for Counting {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let p = System.alloc(layout);
        if !p.is_null() {
            track(layout.size() as isize);
        }
        p
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
        track(-(layout.size() as isize));
    }
}

#[global_allocator]
static GLOBAL: Counting = Counting;

#[test]
fn build_then_destroy_releases_everything() {
    let mut data = vec![0.0f32, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0];
    let mut params = FLANNParameters::default();

    let before = live();
    unsafe {
        let handle = flBuildIndex(data.as_mut_ptr(), 4, 2, &mut params);
        assert!(!handle.is_null());
        assert_eq!(live() - before, size_of::<FlIndex>() as isize);
        flDeleteIndex(handle);
    }
    assert_eq!(live(), before);

    unsafe {
        for _ in 0..50 {
            let handle = flBuildIndex(data.as_mut_ptr(), 4, 2, &mut params);
            flDeleteIndex(handle);
        }
        // failed builds allocate nothing
        assert!(flBuildIndex(data.as_mut_ptr(), 0, 2, &mut params).is_null());
    }
    assert_eq!(live(), before);

    {
        let dataset = Matrix::new(&data, 2).unwrap();
        let index = Index::build(dataset, &IndexParams::linear()).unwrap();
        let hits = index.find_nearest(dataset, 1).unwrap();
        assert_eq!(hits.indices, vec![0, 1, 2, 3]);
    }
    assert_eq!(live(), before);
}
