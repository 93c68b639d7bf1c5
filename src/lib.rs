//! Native shim over the FLANN approximate nearest-neighbour library.
//!
//! Two surfaces share one handle record ([`handle::FlIndex`]):
//!
//! * the C entry points in [`capi`] (`flBuildIndex`, `flFindNearest`,
//!   `flDeleteIndex`), which forward to FLANN unchanged, and
//! * [`Index`], an owning Rust handle that frees FLANN's state on drop and
//!   borrows the dataset for as long as FLANN references it.
//!
//! FLANN does all of the index construction and search; this crate only
//! marshals buffers and parameters across the boundary.

pub mod capi;
pub mod distance;
pub mod error;
pub mod ffi;
pub mod handle;
pub mod index;
pub mod matrix;
pub mod params;
pub mod utils;

pub use distance::Distance;
pub use error::{FlannError, Result};
pub use ffi::FLANNParameters;
pub use index::Index;
pub use matrix::{Matrix, Neighbors};
pub use params::{Algorithm, CentersInit, IndexParams, LogLevel};
pub use utils::logger::init_logging;
