//! Raw bindings to the FLANN C API (`flann.h`, FLANN 1.9).
//!
//! Only the float entry points the shim forwards to are declared here.
//! Nothing in this module is safe to call directly; [`crate::handle::FlIndex`]
//! and [`crate::index::Index`] provide the owning wrappers.
//!
//! # Layout
//!
//! [`FLANNParameters`] is dictated by FLANN's ABI, not by this crate. Every
//! field must stay in the order and width of the C struct or builds and
//! searches will read garbage tuning values. C enums are carried as `c_int`
//! so that whatever a foreign caller stores is a valid Rust value.

#![allow(non_camel_case_types)]

use std::os::raw::{c_float, c_int, c_long, c_uint, c_void};

use bytemuck::{Pod, Zeroable};

/// Opaque FLANN index (`flann_index_t`).
pub type flann_index_t = *mut c_void;

// ========== flann_algorithm_t ==========

pub const FLANN_INDEX_LINEAR: c_int = 0;
pub const FLANN_INDEX_KDTREE: c_int = 1;
pub const FLANN_INDEX_KMEANS: c_int = 2;
pub const FLANN_INDEX_COMPOSITE: c_int = 3;
pub const FLANN_INDEX_KDTREE_SINGLE: c_int = 4;
pub const FLANN_INDEX_HIERARCHICAL: c_int = 5;
pub const FLANN_INDEX_LSH: c_int = 6;
pub const FLANN_INDEX_AUTOTUNED: c_int = 255;

// ========== flann_centers_init_t ==========

pub const FLANN_CENTERS_RANDOM: c_int = 0;
pub const FLANN_CENTERS_GONZALES: c_int = 1;
pub const FLANN_CENTERS_KMEANSPP: c_int = 2;
pub const FLANN_CENTERS_GROUPWISE: c_int = 3;

// ========== flann_log_level_t ==========

pub const FLANN_LOG_NONE: c_int = 0;
pub const FLANN_LOG_FATAL: c_int = 1;
pub const FLANN_LOG_ERROR: c_int = 2;
pub const FLANN_LOG_WARN: c_int = 3;
pub const FLANN_LOG_INFO: c_int = 4;
pub const FLANN_LOG_DEBUG: c_int = 5;

// ========== flann_distance_t ==========

pub const FLANN_DIST_EUCLIDEAN: c_int = 1;
pub const FLANN_DIST_MANHATTAN: c_int = 2;
pub const FLANN_DIST_MINKOWSKI: c_int = 3;
pub const FLANN_DIST_MAX: c_int = 4;
pub const FLANN_DIST_HIST_INTERSECT: c_int = 5;
pub const FLANN_DIST_HELLINGER: c_int = 6;
pub const FLANN_DIST_CHI_SQUARE: c_int = 7;
pub const FLANN_DIST_KULLBACK_LEIBLER: c_int = 8;

/// Mirror of `struct FLANNParameters`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FLANNParameters {
    pub algorithm: c_int,

    // search time parameters
    pub checks: c_int,
    pub eps: c_float,
    pub sorted: c_int,
    pub max_neighbors: c_int,
    pub cores: c_int,

    // kdtree
    pub trees: c_int,
    pub leaf_max_size: c_int,

    // kmeans
    pub branching: c_int,
    pub iterations: c_int,
    pub centers_init: c_int,
    pub cb_index: c_float,

    // autotuned
    pub target_precision: c_float,
    pub build_weight: c_float,
    pub memory_weight: c_float,
    pub sample_fraction: c_float,

    // LSH
    pub table_number_: c_uint,
    pub key_size_: c_uint,
    pub multi_probe_level_: c_uint,

    pub log_level: c_int,
    pub random_seed: c_long,
}

impl Default for FLANNParameters {
    /// A copy of the library's exported `DEFAULT_FLANN_PARAMETERS`.
    fn default() -> Self {
        // SAFETY: FLANN initialises the static at load time and never
        // writes it afterwards; the struct is plain data.
        unsafe { DEFAULT_FLANN_PARAMETERS }
    }
}

extern "C" {
    /// FLANN's own defaults. The LSH fields in particular differ between
    /// releases, so they are read from the library rather than restated.
    pub static DEFAULT_FLANN_PARAMETERS: FLANNParameters;

    /// Selects the distance used by every subsequent call in the process.
    pub fn flann_set_distance_type(distance_type: c_int, order: c_int);

    /// Builds an index over `rows x cols` floats. Returns null on failure.
    /// FLANN keeps pointers into `dataset`; it must outlive the index.
    pub fn flann_build_index(
        dataset: *mut c_float,
        rows: c_int,
        cols: c_int,
        speedup: *mut c_float,
        flann_params: *mut FLANNParameters,
    ) -> flann_index_t;

    /// k-NN search for `trows` queries. Returns 0 on success.
    pub fn flann_find_nearest_neighbors_index(
        index_id: flann_index_t,
        testset: *mut c_float,
        trows: c_int,
        indices: *mut c_int,
        dists: *mut c_float,
        nn: c_int,
        flann_params: *mut FLANNParameters,
    ) -> c_int;

    /// Radius search for a single query. Returns the number of neighbours
    /// found, or a negative value on failure.
    pub fn flann_radius_search(
        index_ptr: flann_index_t,
        query: *mut c_float,
        indices: *mut c_int,
        dists: *mut c_float,
        max_nn: c_int,
        radius: c_float,
        flann_params: *mut FLANNParameters,
    ) -> c_int;

    /// Releases an index. Returns 0 on success.
    pub fn flann_free_index(index_id: flann_index_t, flann_params: *mut FLANNParameters) -> c_int;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{align_of, size_of};

    #[test]
    fn parameters_match_c_layout() {
        // twenty 4-byte fields followed by a C long
        assert_eq!(
            size_of::<FLANNParameters>(),
            20 * 4 + size_of::<c_long>().max(align_of::<c_long>())
        );
        assert_eq!(align_of::<FLANNParameters>(), align_of::<c_long>().max(4));
    }

    #[cfg(all(target_pointer_width = "64", not(windows)))]
    #[test]
    fn parameters_lp64_offsets() {
        let p = FLANNParameters::zeroed();
        let base = &p as *const _ as usize;
        assert_eq!(&p.centers_init as *const _ as usize - base, 40);
        assert_eq!(&p.table_number_ as *const _ as usize - base, 64);
        assert_eq!(&p.log_level as *const _ as usize - base, 76);
        assert_eq!(&p.random_seed as *const _ as usize - base, 80);
        assert_eq!(size_of::<FLANNParameters>(), 88);
    }

    #[test]
    fn defaults_come_from_the_library() {
        let p = FLANNParameters::default();
        assert_eq!(p, unsafe { DEFAULT_FLANN_PARAMETERS });
        assert_eq!(p.algorithm, FLANN_INDEX_KDTREE);
        assert_eq!(p.checks, 32);
        assert_eq!(p.max_neighbors, -1);
        assert_eq!(p.trees, 4);
        assert_eq!(p.branching, 32);
        assert_eq!(p.iterations, 11);
        assert_eq!(p.centers_init, FLANN_CENTERS_RANDOM);
        assert_eq!(p.sample_fraction, 0.1);
    }
}
