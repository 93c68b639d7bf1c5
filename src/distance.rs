//! FLANN's distance selector.
//!
//! The C API does not carry the distance in `FLANNParameters`; it is a
//! process-global set by `flann_set_distance_type` and consulted on every
//! build, search and free to pick the index's concrete type. An index must
//! therefore always be called back with the distance it was built under.
//! [`with_distance`] serialises switches while letting calls that agree on
//! the current distance run concurrently.

use std::os::raw::c_int;
use std::sync::RwLock;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::ffi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "order")]
pub enum Distance {
    /// Squared L2. FLANN's process default.
    #[default]
    Euclidean,
    Manhattan,
    Minkowski(i32),
    Max,
    HistIntersect,
    Hellinger,
    ChiSquare,
    KullbackLeibler,
}

impl Distance {
    /// `(flann_distance_t, order)` as passed to `flann_set_distance_type`.
    pub fn to_raw(self) -> (c_int, c_int) {
        match self {
            Distance::Euclidean => (ffi::FLANN_DIST_EUCLIDEAN, 0),
            Distance::Manhattan => (ffi::FLANN_DIST_MANHATTAN, 0),
            Distance::Minkowski(order) => (ffi::FLANN_DIST_MINKOWSKI, order),
            Distance::Max => (ffi::FLANN_DIST_MAX, 0),
            Distance::HistIntersect => (ffi::FLANN_DIST_HIST_INTERSECT, 0),
            Distance::Hellinger => (ffi::FLANN_DIST_HELLINGER, 0),
            Distance::ChiSquare => (ffi::FLANN_DIST_CHI_SQUARE, 0),
            Distance::KullbackLeibler => (ffi::FLANN_DIST_KULLBACK_LEIBLER, 0),
        }
    }
}

static CURRENT: RwLock<Distance> = RwLock::new(Distance::Euclidean);

/// Runs `f` while FLANN's global distance is `distance`.
///
/// Callers sharing the current distance hold the read lock together; a
/// caller needing a different one waits for them, switches under the write
/// lock, then retries as a reader.
pub fn with_distance<R>(distance: Distance, f: impl FnOnce() -> R) -> R {
    loop {
        {
            let current = CURRENT.read().unwrap_or_else(|e| e.into_inner());
            if *current == distance {
                return f();
            }
        }

        let mut current = CURRENT.write().unwrap_or_else(|e| e.into_inner());
        if *current != distance {
            let (kind, order) = distance.to_raw();
            debug!("Switching FLANN distance {:?} -> {:?}", *current, distance);
            // SAFETY: no other call is inside FLANN while the write lock is held.
            unsafe { ffi::flann_set_distance_type(kind, order) };
            *current = distance;
        }
    }
}
