use bytemuck::Pod;

use crate::error::{FlannError, Result};

/// Borrowed row-major `rows x cols` block of floats.
///
/// Used for both datasets and query batches. Never copied; FLANN reads it
/// in place.
#[derive(Debug, Clone, Copy)]
pub struct Matrix<'a> {
    data: &'a [f32],
    rows: usize,
    cols: usize,
}

impl<'a> Matrix<'a> {
    /// Views a flat buffer as rows of `cols` floats.
    pub fn new(data: &'a [f32], cols: usize) -> Result<Self> {
        if cols == 0 || data.len() % cols != 0 {
            return Err(FlannError::ShapeMismatch { len: data.len(), cols });
        }
        Ok(Matrix { data, rows: data.len() / cols, cols })
    }

    /// Views fixed-width rows as one contiguous buffer.
    pub fn from_rows<const D: usize>(rows: &'a [[f32; D]]) -> Result<Self>
    where
        [f32; D]: Pod,
    {
        if D == 0 {
            return Err(FlannError::ShapeMismatch { len: 0, cols: 0 });
        }
        Self::new(bytemuck::cast_slice(rows), D)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn as_slice(&self) -> &'a [f32] {
        self.data
    }

    pub fn row(&self, i: usize) -> Option<&'a [f32]> {
        if i >= self.rows {
            return None;
        }
        Some(&self.data[i * self.cols..(i + 1) * self.cols])
    }
}

/// k-NN results for a query batch, `rows x nn`, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbors {
    pub indices: Vec<i32>,
    pub dists: Vec<f32>,
    nn: usize,
}

impl Neighbors {
    pub(crate) fn zeroed(rows: usize, nn: usize) -> Self {
        Neighbors { indices: vec![0; rows * nn], dists: vec![0.0; rows * nn], nn }
    }

    pub fn nn(&self) -> usize {
        self.nn
    }

    pub fn rows(&self) -> usize {
        if self.nn == 0 {
            0
        } else {
            self.indices.len() / self.nn
        }
    }

    /// `(indices, dists)` for query `i`.
    pub fn row(&self, i: usize) -> Option<(&[i32], &[f32])> {
        if i >= self.rows() {
            return None;
        }
        let span = i * self.nn..(i + 1) * self.nn;
        Some((&self.indices[span.clone()], &self.dists[span]))
    }

    /// Nearest neighbour of each query.
    pub fn nearest(&self) -> impl Iterator<Item = (i32, f32)> + '_ {
        (0..self.rows()).map(move |i| (self.indices[i * self.nn], self.dists[i * self.nn]))
    }
}
