//! Typed build/search configuration.
//!
//! [`IndexParams`] is what Rust callers (and JSON config files) work with.
//! It lowers losslessly to the foreign-layout [`FLANNParameters`] that FLANN
//! reads, and can be lifted back from one as long as its enum fields hold
//! values FLANN defines.

use std::fs;
use std::os::raw::{c_int, c_long};
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{FlannError, Result};
use crate::ffi::{self, FLANNParameters};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    Linear,
    #[serde(rename = "kdtree")]
    KdTree,
    #[serde(rename = "kmeans")]
    KMeans,
    Composite,
    #[serde(rename = "kdtree_single")]
    KdTreeSingle,
    Hierarchical,
    Lsh,
    Autotuned,
}

impl Algorithm {
    pub fn to_raw(self) -> c_int {
        match self {
            Algorithm::Linear => ffi::FLANN_INDEX_LINEAR,
            Algorithm::KdTree => ffi::FLANN_INDEX_KDTREE,
            Algorithm::KMeans => ffi::FLANN_INDEX_KMEANS,
            Algorithm::Composite => ffi::FLANN_INDEX_COMPOSITE,
            Algorithm::KdTreeSingle => ffi::FLANN_INDEX_KDTREE_SINGLE,
            Algorithm::Hierarchical => ffi::FLANN_INDEX_HIERARCHICAL,
            Algorithm::Lsh => ffi::FLANN_INDEX_LSH,
            Algorithm::Autotuned => ffi::FLANN_INDEX_AUTOTUNED,
        }
    }

    pub fn from_raw(value: c_int) -> Result<Self> {
        Ok(match value {
            ffi::FLANN_INDEX_LINEAR => Algorithm::Linear,
            ffi::FLANN_INDEX_KDTREE => Algorithm::KdTree,
            ffi::FLANN_INDEX_KMEANS => Algorithm::KMeans,
            ffi::FLANN_INDEX_COMPOSITE => Algorithm::Composite,
            ffi::FLANN_INDEX_KDTREE_SINGLE => Algorithm::KdTreeSingle,
            ffi::FLANN_INDEX_HIERARCHICAL => Algorithm::Hierarchical,
            ffi::FLANN_INDEX_LSH => Algorithm::Lsh,
            ffi::FLANN_INDEX_AUTOTUNED => Algorithm::Autotuned,
            other => return Err(FlannError::UnknownEnum { kind: "algorithm", value: other as i64 }),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CentersInit {
    Random,
    Gonzales,
    #[serde(rename = "kmeanspp")]
    KMeansPP,
    Groupwise,
}

impl CentersInit {
    pub fn to_raw(self) -> c_int {
        match self {
            CentersInit::Random => ffi::FLANN_CENTERS_RANDOM,
            CentersInit::Gonzales => ffi::FLANN_CENTERS_GONZALES,
            CentersInit::KMeansPP => ffi::FLANN_CENTERS_KMEANSPP,
            CentersInit::Groupwise => ffi::FLANN_CENTERS_GROUPWISE,
        }
    }

    pub fn from_raw(value: c_int) -> Result<Self> {
        Ok(match value {
            ffi::FLANN_CENTERS_RANDOM => CentersInit::Random,
            ffi::FLANN_CENTERS_GONZALES => CentersInit::Gonzales,
            ffi::FLANN_CENTERS_KMEANSPP => CentersInit::KMeansPP,
            ffi::FLANN_CENTERS_GROUPWISE => CentersInit::Groupwise,
            other => return Err(FlannError::UnknownEnum { kind: "centers_init", value: other as i64 }),
        })
    }
}

/// FLANN's own stderr verbosity. Independent of the `log` facade used by
/// this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    None,
    Fatal,
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    pub fn to_raw(self) -> c_int {
        match self {
            LogLevel::None => ffi::FLANN_LOG_NONE,
            LogLevel::Fatal => ffi::FLANN_LOG_FATAL,
            LogLevel::Error => ffi::FLANN_LOG_ERROR,
            LogLevel::Warn => ffi::FLANN_LOG_WARN,
            LogLevel::Info => ffi::FLANN_LOG_INFO,
            LogLevel::Debug => ffi::FLANN_LOG_DEBUG,
        }
    }

    pub fn from_raw(value: c_int) -> Result<Self> {
        Ok(match value {
            ffi::FLANN_LOG_NONE => LogLevel::None,
            ffi::FLANN_LOG_FATAL => LogLevel::Fatal,
            ffi::FLANN_LOG_ERROR => LogLevel::Error,
            ffi::FLANN_LOG_WARN => LogLevel::Warn,
            ffi::FLANN_LOG_INFO => LogLevel::Info,
            ffi::FLANN_LOG_DEBUG => LogLevel::Debug,
            other => return Err(FlannError::UnknownEnum { kind: "log_level", value: other as i64 }),
        })
    }
}

/// Build and search configuration for one index.
///
/// Missing fields in JSON fall back to FLANN's defaults, so a config file
/// only needs to name what it changes:
///
/// ```
/// use flann_shim::{Algorithm, IndexParams};
///
/// let params = IndexParams::from_json(r#"{ "algorithm": "kmeans", "branching": 16 }"#).unwrap();
/// assert_eq!(params.algorithm, Algorithm::KMeans);
/// assert_eq!(params.branching, 16);
/// assert_eq!(params.checks, 32);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexParams {
    pub algorithm: Algorithm,

    pub checks: i32,
    pub eps: f32,
    pub sorted: bool,
    pub max_neighbors: i32,
    pub cores: i32,

    pub trees: i32,
    pub leaf_max_size: i32,

    pub branching: i32,
    pub iterations: i32,
    pub centers_init: CentersInit,
    pub cb_index: f32,

    pub target_precision: f32,
    pub build_weight: f32,
    pub memory_weight: f32,
    pub sample_fraction: f32,

    pub table_number: u32,
    pub key_size: u32,
    pub multi_probe_level: u32,

    pub log_level: LogLevel,
    pub random_seed: i32,
}

impl Default for IndexParams {
    fn default() -> Self {
        let raw = FLANNParameters::default();
        IndexParams {
            algorithm: Algorithm::from_raw(raw.algorithm).unwrap_or(Algorithm::KdTree),
            checks: raw.checks,
            eps: raw.eps,
            sorted: raw.sorted != 0,
            max_neighbors: raw.max_neighbors,
            cores: raw.cores,
            trees: raw.trees,
            leaf_max_size: raw.leaf_max_size,
            branching: raw.branching,
            iterations: raw.iterations,
            centers_init: CentersInit::from_raw(raw.centers_init).unwrap_or(CentersInit::Random),
            cb_index: raw.cb_index,
            target_precision: raw.target_precision,
            build_weight: raw.build_weight,
            memory_weight: raw.memory_weight,
            sample_fraction: raw.sample_fraction,
            table_number: raw.table_number_,
            key_size: raw.key_size_,
            multi_probe_level: raw.multi_probe_level_,
            log_level: LogLevel::from_raw(raw.log_level).unwrap_or(LogLevel::None),
            random_seed: i32::try_from(raw.random_seed).unwrap_or(0),
        }
    }
}

impl IndexParams {
    /// Exhaustive scan. Exact results, no build cost.
    pub fn linear() -> Self {
        IndexParams { algorithm: Algorithm::Linear, ..Default::default() }
    }

    /// Randomised k-d forest with `trees` trees.
    pub fn kdtree(trees: i32) -> Self {
        IndexParams { algorithm: Algorithm::KdTree, trees, ..Default::default() }
    }

    /// Hierarchical k-means tree.
    pub fn kmeans(branching: i32, iterations: i32) -> Self {
        IndexParams {
            algorithm: Algorithm::KMeans,
            branching,
            iterations,
            ..Default::default()
        }
    }

    /// Let FLANN pick the algorithm and tuning for `target_precision`.
    pub fn autotuned(target_precision: f32) -> Self {
        IndexParams {
            algorithm: Algorithm::Autotuned,
            target_precision,
            ..Default::default()
        }
    }

    pub fn with_checks(mut self, checks: i32) -> Self {
        self.checks = checks;
        self
    }

    pub fn with_eps(mut self, eps: f32) -> Self {
        self.eps = eps;
        self
    }

    pub fn with_cores(mut self, cores: i32) -> Self {
        self.cores = cores;
        self
    }

    pub fn with_seed(mut self, seed: i32) -> Self {
        self.random_seed = seed;
        self
    }

    pub fn to_raw(&self) -> FLANNParameters {
        FLANNParameters {
            algorithm: self.algorithm.to_raw(),
            checks: self.checks,
            eps: self.eps,
            sorted: self.sorted as c_int,
            max_neighbors: self.max_neighbors,
            cores: self.cores,
            trees: self.trees,
            leaf_max_size: self.leaf_max_size,
            branching: self.branching,
            iterations: self.iterations,
            centers_init: self.centers_init.to_raw(),
            cb_index: self.cb_index,
            target_precision: self.target_precision,
            build_weight: self.build_weight,
            memory_weight: self.memory_weight,
            sample_fraction: self.sample_fraction,
            table_number_: self.table_number,
            key_size_: self.key_size,
            multi_probe_level_: self.multi_probe_level,
            log_level: self.log_level.to_raw(),
            random_seed: c_long::from(self.random_seed),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let params: IndexParams = serde_json::from_str(json)?;
        debug!("Parsed index params: {:?}", params);
        Ok(params)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Loads a JSON config file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let params = Self::from_json(&text)?;
        info!("Loaded index params from {} (algorithm={:?})", path.display(), params.algorithm);
        Ok(params)
    }
}

impl From<&IndexParams> for FLANNParameters {
    fn from(params: &IndexParams) -> Self {
        params.to_raw()
    }
}

impl TryFrom<&FLANNParameters> for IndexParams {
    type Error = FlannError;

    fn try_from(raw: &FLANNParameters) -> Result<Self> {
        Ok(IndexParams {
            algorithm: Algorithm::from_raw(raw.algorithm)?,
            checks: raw.checks,
            eps: raw.eps,
            sorted: raw.sorted != 0,
            max_neighbors: raw.max_neighbors,
            cores: raw.cores,
            trees: raw.trees,
            leaf_max_size: raw.leaf_max_size,
            branching: raw.branching,
            iterations: raw.iterations,
            centers_init: CentersInit::from_raw(raw.centers_init)?,
            cb_index: raw.cb_index,
            target_precision: raw.target_precision,
            build_weight: raw.build_weight,
            memory_weight: raw.memory_weight,
            sample_fraction: raw.sample_fraction,
            table_number: raw.table_number_,
            key_size: raw.key_size_,
            multi_probe_level: raw.multi_probe_level_,
            log_level: LogLevel::from_raw(raw.log_level)?,
            random_seed: i32::try_from(raw.random_seed).map_err(|_| FlannError::OutOfRange {
                what: "random_seed",
                value: raw.random_seed as i64,
            })?,
        })
    }
}
