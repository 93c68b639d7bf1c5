//! C entry points. Declared for C callers in `include/flann_shim.h`.
//!
//! These forward to FLANN unchanged. The only checks are for null pointers
//! and non-positive sizes, which FLANN itself would dereference or trip
//! over; everything else (dangling handles, short buffers, a handle used
//! after `flDeleteIndex`) stays the caller's responsibility.
//!
//! Handles built here always use FLANN's default Euclidean distance. Every
//! call still goes through [`with_distance`] so that Rust-side indices
//! built with another distance in the same process cannot switch the
//! selector underneath them.

use std::os::raw::{c_float, c_int};
use std::ptr;

use log::{error, warn};

use crate::distance::{with_distance, Distance};
use crate::ffi::FLANNParameters;
use crate::handle::FlIndex;

/// Search succeeded.
pub const FL_OK: c_int = 0;
/// `flFindNearest` was given a null handle.
pub const FL_INVALID_HANDLE: c_int = -2;
/// A buffer was null or a size was not positive.
pub const FL_INVALID_ARGUMENT: c_int = -3;

/// Builds an index over `rows x cols` floats at `data`.
///
/// Returns null when an argument is null or not positive, or when FLANN
/// fails to build. FLANN references `data` without copying it; it must
/// outlive the returned handle. `pp` is copied and may be freed on return.
///
/// # Safety
///
/// `data` must point to `rows * cols` floats and `pp` to a
/// `FLANNParameters`.
#[no_mangle]
pub unsafe extern "C" fn flBuildIndex(
    data: *mut c_float,
    rows: c_int,
    cols: c_int,
    pp: *mut FLANNParameters,
) -> *mut FlIndex {
    if data.is_null() || pp.is_null() {
        warn!("flBuildIndex: null {}", if data.is_null() { "dataset" } else { "parameters" });
        return ptr::null_mut();
    }
    if rows <= 0 || cols <= 0 {
        warn!("flBuildIndex: invalid shape {}x{}", rows, cols);
        return ptr::null_mut();
    }

    // The speedup figure is not part of this ABI.
    let params = &*pp;
    match with_distance(Distance::Euclidean, || unsafe { FlIndex::build(data, rows, cols, params) }) {
        Some((index, _speedup)) => Box::into_raw(Box::new(index)),
        None => ptr::null_mut(),
    }
}

/// Finds `nn` neighbours for each of `rows` queries, writing `rows * nn`
/// entries to `indices` and `dists`. Returns FLANN's status (0 on
/// success), [`FL_INVALID_HANDLE`] or [`FL_INVALID_ARGUMENT`].
///
/// `cols` is accepted for symmetry with `flBuildIndex`; FLANN uses the
/// width the index was built with.
///
/// # Safety
///
/// `index` must be null or a live handle from `flBuildIndex`; the buffers
/// must match the sizes above.
#[no_mangle]
pub unsafe extern "C" fn flFindNearest(
    index: *mut FlIndex,
    data: *mut c_float,
    rows: c_int,
    _cols: c_int,
    indices: *mut c_int,
    dists: *mut c_float,
    nn: c_int,
) -> c_int {
    let Some(index) = index.as_ref() else {
        error!("flFindNearest: null handle");
        return FL_INVALID_HANDLE;
    };
    if data.is_null() || indices.is_null() || dists.is_null() || rows <= 0 || nn <= 0 {
        error!("flFindNearest: invalid arguments (rows={}, nn={})", rows, nn);
        return FL_INVALID_ARGUMENT;
    }

    with_distance(Distance::Euclidean, || unsafe {
        index.find_nearest(data, rows, indices, dists, nn)
    })
}

/// Releases a handle from `flBuildIndex` and the FLANN index it owns.
/// Null is a no-op.
///
/// # Safety
///
/// `index` must be null or a live handle; it is invalid afterwards.
#[no_mangle]
pub unsafe extern "C" fn flDeleteIndex(index: *mut FlIndex) {
    if index.is_null() {
        return;
    }
    let index = Box::from_raw(index);
    with_distance(Distance::Euclidean, move || drop(index));
}

/// Installs the crate's logger (`RUST_LOG` controls the level). Safe to
/// call more than once.
#[no_mangle]
pub extern "C" fn flInitLogging() {
    crate::utils::logger::init_logging();
}
