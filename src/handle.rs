//! The handle record shared by both surfaces.
//!
//! `FlIndex` pairs the FLANN index with the exact parameters it was built
//! from, since FLANN wants them again on every search and on free. Its
//! field order is part of the C ABI (`include/flann_shim.h`).

use std::os::raw::{c_float, c_int, c_void};
use std::ptr::NonNull;

use log::{debug, trace, warn};

use crate::ffi::{self, FLANNParameters};

#[repr(C)]
pub struct FlIndex {
    parameters: FLANNParameters,
    index: NonNull<c_void>,
}

// SAFETY: the record exclusively owns its FLANN index. FLANN builds operate
// on independent state and a built index has no writer path, so concurrent
// searches through `&FlIndex` only read shared immutable state.
unsafe impl Send for FlIndex {}
unsafe impl Sync for FlIndex {}

impl FlIndex {
    /// Builds a FLANN index over `rows x cols` floats at `data`.
    ///
    /// `params` is copied; the caller's struct is not retained. Returns the
    /// record with the speedup FLANN measured, or `None` when FLANN reports
    /// failure, in which case nothing is allocated.
    ///
    /// # Safety
    ///
    /// `data` must point to `rows * cols` floats that stay valid and
    /// unmodified until the returned record is dropped.
    pub unsafe fn build(
        data: *const f32,
        rows: c_int,
        cols: c_int,
        params: &FLANNParameters,
    ) -> Option<(FlIndex, f32)> {
        let mut parameters = *params;
        let mut speedup: c_float = 0.0;

        trace!("flann_build_index rows={} cols={} algorithm={}", rows, cols, parameters.algorithm);
        let raw = ffi::flann_build_index(data as *mut c_float, rows, cols, &mut speedup, &mut parameters);

        match NonNull::new(raw) {
            Some(index) => {
                debug!("Built FLANN index {:p} ({}x{}, speedup {:.2})", raw, rows, cols, speedup);
                Some((FlIndex { parameters, index }, speedup))
            }
            None => {
                warn!("flann_build_index returned null for {}x{} dataset", rows, cols);
                None
            }
        }
    }

    pub fn parameters(&self) -> &FLANNParameters {
        &self.parameters
    }

    /// k-NN search; returns FLANN's status code unchanged.
    ///
    /// # Safety
    ///
    /// `queries` must hold `rows` query vectors of the build column count,
    /// and `indices`/`dists` must each have room for `rows * nn` entries.
    pub unsafe fn find_nearest(
        &self,
        queries: *const f32,
        rows: c_int,
        indices: *mut c_int,
        dists: *mut f32,
        nn: c_int,
    ) -> c_int {
        // FLANN takes a mutable pointer but only reads the parameters.
        let mut parameters = self.parameters;
        ffi::flann_find_nearest_neighbors_index(
            self.index.as_ptr(),
            queries as *mut c_float,
            rows,
            indices,
            dists,
            nn,
            &mut parameters,
        )
    }

    /// Radius search for one query; returns the neighbour count, or a
    /// negative FLANN status.
    ///
    /// # Safety
    ///
    /// `query` must hold one vector of the build column count and
    /// `indices`/`dists` must each have room for `max_nn` entries.
    pub unsafe fn radius_search(
        &self,
        query: *const f32,
        indices: *mut c_int,
        dists: *mut f32,
        max_nn: c_int,
        radius: f32,
    ) -> c_int {
        let mut parameters = self.parameters;
        ffi::flann_radius_search(
            self.index.as_ptr(),
            query as *mut c_float,
            indices,
            dists,
            max_nn,
            radius,
            &mut parameters,
        )
    }

    pub fn as_ptr(&self) -> *const c_void {
        self.index.as_ptr() as *const _
    }
}

impl Drop for FlIndex {
    fn drop(&mut self) {
        let raw = self.index.as_ptr();
        // SAFETY: `index` came from flann_build_index and ownership is
        // exclusive, so this is the single release.
        let status = unsafe { ffi::flann_free_index(raw, &mut self.parameters) };
        if status != 0 {
            warn!("flann_free_index({:p}) returned {}", raw, status);
        } else {
            debug!("Freed FLANN index {:p}", raw);
        }
    }
}
