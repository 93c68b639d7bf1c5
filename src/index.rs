//! Safe, owning handle over a FLANN index.

use std::fmt;
use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::os::raw::c_int;

use log::{debug, error, info};

use crate::distance::{with_distance, Distance};
use crate::error::{FlannError, Result};
use crate::ffi::FLANNParameters;
use crate::handle::FlIndex;
use crate::matrix::{Matrix, Neighbors};
use crate::params::IndexParams;

fn to_c_int(what: &'static str, value: usize) -> Result<c_int> {
    c_int::try_from(value).map_err(|_| FlannError::TooLarge { what, value })
}

/// A built FLANN index.
///
/// FLANN keeps pointers into the dataset rows instead of copying them, so
/// the index borrows the dataset for `'data`. Dropping the index releases
/// FLANN's state exactly once; there is no other way to destroy it.
///
/// ```no_run
/// use flann_shim::{Index, IndexParams, Matrix};
///
/// let points = [[0.0f32, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
/// let dataset = Matrix::from_rows(&points)?;
/// let index = Index::build(dataset, &IndexParams::default())?;
/// let hits = index.find_nearest(dataset, 1)?;
/// assert_eq!(hits.indices, vec![0, 1, 2, 3]);
/// # Ok::<(), flann_shim::FlannError>(())
/// ```
pub struct Index<'data> {
    raw: ManuallyDrop<FlIndex>,
    distance: Distance,
    rows: usize,
    cols: usize,
    speedup: f32,
    _data: PhantomData<&'data [f32]>,
}

impl<'data> Index<'data> {
    /// Builds with FLANN's default (Euclidean) distance.
    pub fn build(dataset: Matrix<'data>, params: &IndexParams) -> Result<Self> {
        Self::build_with_distance(dataset, params, Distance::Euclidean)
    }

    pub fn build_with_distance(
        dataset: Matrix<'data>,
        params: &IndexParams,
        distance: Distance,
    ) -> Result<Self> {
        Self::build_raw(dataset, &params.into(), distance)
    }

    /// Builds from a foreign-layout parameter struct, e.g. one received
    /// from a C caller. The struct is copied.
    pub fn build_raw(
        dataset: Matrix<'data>,
        params: &FLANNParameters,
        distance: Distance,
    ) -> Result<Self> {
        if dataset.is_empty() {
            error!("Refusing to build index over empty dataset");
            return Err(FlannError::EmptyDataset);
        }
        let rows = to_c_int("row count", dataset.rows())?;
        let cols = to_c_int("column count", dataset.cols())?;

        // SAFETY: the slice holds rows * cols floats and 'data keeps it
        // alive and immutable for as long as the index exists.
        let built = with_distance(distance, || unsafe {
            FlIndex::build(dataset.as_slice().as_ptr(), rows, cols, params)
        });
        let (raw, speedup) = built.ok_or(FlannError::BuildFailed)?;

        info!(
            "Index built: {}x{} vectors, algorithm={}, distance={:?}",
            rows, cols, params.algorithm, distance
        );

        Ok(Index {
            raw: ManuallyDrop::new(raw),
            distance,
            rows: dataset.rows(),
            cols: dataset.cols(),
            speedup,
            _data: PhantomData,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn distance(&self) -> Distance {
        self.distance
    }

    /// Speedup over linear search that FLANN estimated while building.
    pub fn speedup(&self) -> f32 {
        self.speedup
    }

    /// The exact parameters the index was built with.
    pub fn raw_params(&self) -> &FLANNParameters {
        self.raw.parameters()
    }

    pub fn params(&self) -> Result<IndexParams> {
        IndexParams::try_from(self.raw.parameters())
    }

    fn check_queries(&self, queries: &Matrix<'_>, nn: usize) -> Result<()> {
        if queries.cols() != self.cols {
            return Err(FlannError::DimensionMismatch { expected: self.cols, got: queries.cols() });
        }
        if nn == 0 {
            return Err(FlannError::InvalidNeighbors);
        }
        if nn > self.rows {
            return Err(FlannError::TooManyNeighbors { requested: nn, rows: self.rows });
        }
        Ok(())
    }

    /// `nn` nearest neighbours of every query row.
    pub fn find_nearest(&self, queries: Matrix<'_>, nn: usize) -> Result<Neighbors> {
        self.check_queries(&queries, nn)?;
        let mut out = Neighbors::zeroed(queries.rows(), nn);
        self.find_nearest_into(queries, &mut out.indices, &mut out.dists, nn)?;
        Ok(out)
    }

    /// Like [`find_nearest`](Self::find_nearest) but writes into caller
    /// buffers of at least `queries.rows() * nn` entries.
    pub fn find_nearest_into(
        &self,
        queries: Matrix<'_>,
        indices: &mut [i32],
        dists: &mut [f32],
        nn: usize,
    ) -> Result<()> {
        self.check_queries(&queries, nn)?;
        let needed = queries.rows() * nn;
        let got = indices.len().min(dists.len());
        if got < needed {
            return Err(FlannError::OutputTooSmall { needed, got });
        }
        if queries.is_empty() {
            return Ok(());
        }

        let rows = to_c_int("query count", queries.rows())?;
        let nn_c = to_c_int("neighbour count", nn)?;

        // SAFETY: shapes checked above.
        let status = with_distance(self.distance, || unsafe {
            self.raw.find_nearest(
                queries.as_slice().as_ptr(),
                rows,
                indices.as_mut_ptr(),
                dists.as_mut_ptr(),
                nn_c,
            )
        });

        if status != 0 {
            error!("FLANN search failed with status {}", status);
            return Err(FlannError::Search { code: status });
        }
        debug!("Answered {} queries (nn={})", rows, nn);
        Ok(())
    }

    /// Neighbours of `query` within `radius`, at most `max_nn`, as
    /// `(index, distance)` pairs. For the Euclidean distance both `radius`
    /// and the returned distances are squared.
    pub fn radius_search(&self, query: &[f32], max_nn: usize, radius: f32) -> Result<Vec<(i32, f32)>> {
        if query.len() != self.cols {
            return Err(FlannError::DimensionMismatch { expected: self.cols, got: query.len() });
        }
        if max_nn == 0 {
            return Err(FlannError::InvalidNeighbors);
        }
        let max_nn_c = to_c_int("neighbour count", max_nn)?;
        let mut indices = vec![-1; max_nn];
        let mut dists = vec![0.0f32; max_nn];

        // SAFETY: one query of the build width; buffers hold max_nn entries.
        let found = with_distance(self.distance, || unsafe {
            self.raw.radius_search(
                query.as_ptr(),
                indices.as_mut_ptr(),
                dists.as_mut_ptr(),
                max_nn_c,
                radius,
            )
        });

        if found < 0 {
            error!("FLANN radius search failed with status {}", found);
            return Err(FlannError::Search { code: found });
        }
        let found = (found as usize).min(max_nn);
        Ok(indices.into_iter().zip(dists).take(found).collect())
    }
}

impl Drop for Index<'_> {
    fn drop(&mut self) {
        let raw = &mut self.raw;
        // SAFETY: dropped once, here, under the distance it was built with.
        with_distance(self.distance, || unsafe { ManuallyDrop::drop(raw) });
    }
}

impl fmt::Debug for Index<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Index")
            .field("handle", &self.raw.as_ptr())
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("distance", &self.distance)
            .field("algorithm", &self.raw.parameters().algorithm)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Algorithm;

    const SQUARE: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];

    /// `n x n` grid of 2-d points, row-major.
    fn grid(n: usize) -> Vec<f32> {
        (0..n * n).flat_map(|i| [(i % n) as f32, (i / n) as f32]).collect()
    }

    #[test]
    fn each_point_finds_itself() {
        let dataset = Matrix::from_rows(&SQUARE).unwrap();
        let index = Index::build(dataset, &IndexParams::default()).unwrap();

        let hits = index.find_nearest(dataset, 1).unwrap();
        assert_eq!(hits.indices, vec![0, 1, 2, 3]);
        assert!(hits.dists.iter().all(|d| *d == 0.0));
    }

    #[test]
    fn linear_search_ranks_neighbours() {
        let dataset = Matrix::from_rows(&SQUARE).unwrap();
        let index = Index::build(dataset, &IndexParams::linear()).unwrap();

        let query = [[0.1f32, 0.0]];
        let hits = index.find_nearest(Matrix::from_rows(&query).unwrap(), 2).unwrap();
        let (indices, dists) = hits.row(0).unwrap();
        assert_eq!(indices, &[0, 1]);
        // squared L2
        assert!((dists[0] - 0.01).abs() < 1e-6);
        assert!((dists[1] - 0.81).abs() < 1e-6);
    }

    #[test]
    fn autotuned_reports_speedup_and_chosen_algorithm() {
        let data = grid(32);
        let dataset = Matrix::new(&data, 2).unwrap();
        // large enough sample for FLANN to tune instead of falling back to linear
        let params = IndexParams { sample_fraction: 0.5, ..IndexParams::autotuned(0.99) };
        let index = Index::build(dataset, &params).unwrap();

        assert!(index.speedup() > 0.0, "speedup {}", index.speedup());
        assert_ne!(index.raw_params().algorithm, crate::ffi::FLANN_INDEX_AUTOTUNED);
        assert_ne!(index.params().unwrap().algorithm, Algorithm::Autotuned);

        let hits = index.find_nearest(dataset, 1).unwrap();
        let exact = hits.nearest().enumerate().filter(|(i, (j, _))| *i as i32 == *j).count();
        assert!(exact * 10 >= index.rows() * 9, "{} of {} self-matches", exact, index.rows());
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let dataset = Matrix::new(&[], 2).unwrap();
        assert!(matches!(
            Index::build(dataset, &IndexParams::default()),
            Err(FlannError::EmptyDataset)
        ));
    }

    #[test]
    fn query_shape_is_checked() {
        let dataset = Matrix::from_rows(&SQUARE).unwrap();
        let index = Index::build(dataset, &IndexParams::linear()).unwrap();

        let wide = [[0.0f32, 0.0, 0.0]];
        assert!(matches!(
            index.find_nearest(Matrix::from_rows(&wide).unwrap(), 1),
            Err(FlannError::DimensionMismatch { expected: 2, got: 3 })
        ));
        assert!(matches!(index.find_nearest(dataset, 0), Err(FlannError::InvalidNeighbors)));
        assert!(matches!(
            index.find_nearest(dataset, 5),
            Err(FlannError::TooManyNeighbors { requested: 5, rows: 4 })
        ));

        let mut indices = [0i32; 3];
        let mut dists = [0.0f32; 4];
        assert!(matches!(
            index.find_nearest_into(dataset, &mut indices, &mut dists, 1),
            Err(FlannError::OutputTooSmall { needed: 4, got: 3 })
        ));
    }

    #[test]
    fn stored_params_are_the_build_params() {
        let dataset = Matrix::from_rows(&SQUARE).unwrap();
        let params = IndexParams::kdtree(2).with_checks(64).with_seed(11);
        let index = Index::build(dataset, &params).unwrap();

        assert_eq!(index.raw_params(), &params.to_raw());
        let lifted = index.params().unwrap();
        assert_eq!(lifted.algorithm, Algorithm::KdTree);
        assert_eq!(lifted.trees, 2);
        assert_eq!(lifted.checks, 64);
        assert_eq!(index.rows(), 4);
        assert_eq!(index.cols(), 2);
    }

    #[test]
    fn radius_search_finds_the_centre() {
        let dataset = Matrix::from_rows(&SQUARE).unwrap();
        let index = Index::build(dataset, &IndexParams::linear()).unwrap();

        let hits = index.radius_search(&[1.0, 1.0], 4, 0.5).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, 3);

        assert!(index.radius_search(&[1.0], 4, 0.5).is_err());
    }

    #[test]
    fn distances_coexist() {
        let dataset = Matrix::from_rows(&SQUARE).unwrap();
        let l2 = Index::build(dataset, &IndexParams::linear()).unwrap();
        let l1 = Index::build_with_distance(dataset, &IndexParams::linear(), Distance::Manhattan).unwrap();

        let query = [[0.5f32, 0.5]];
        let query = Matrix::from_rows(&query).unwrap();
        let l2_hits = l2.find_nearest(query, 1).unwrap();
        let l1_hits = l1.find_nearest(query, 1).unwrap();

        // every corner is equidistant: 0.25 + 0.25 squared L2, 0.5 + 0.5 L1
        assert!((l2_hits.dists[0] - 0.5).abs() < 1e-6);
        assert!((l1_hits.dists[0] - 1.0).abs() < 1e-6);

        // the first index still answers with its own metric
        let again = l2.find_nearest(query, 1).unwrap();
        assert!((again.dists[0] - 0.5).abs() < 1e-6);
        assert_eq!(l1.distance(), Distance::Manhattan);
    }
}
