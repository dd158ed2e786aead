use std::slice::{ChunksExact, ChunksExactMut};
use num_traits::Float;
use rand::Rng;
use crate::core::{Error, ErrorKind, Result};

/// Dense row-major matrix, stored as one flat buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>
}

impl<T: Copy> Matrix<T> {
    /// Wraps a flat row-major buffer.
    ///
    /// # Errors
    /// [`ErrorKind::ShapeUnsupported`] if `data.len() != rows * cols`.
    pub fn from_vec (rows: usize, cols: usize, data: Vec<T>) -> Result<Self> {
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(Error::new(ErrorKind::ShapeUnsupported, format!("{} values can't fill a {rows}x{cols} matrix", data.len())))
        }

        Ok(Self { rows, cols, data })
    }

    pub fn from_fn<F: FnMut(usize, usize) -> T> (rows: usize, cols: usize, mut f: F) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j));
            }
        }

        Self { rows, cols, data }
    }

    #[inline(always)]
    pub fn rows (&self) -> usize {
        self.rows
    }

    #[inline(always)]
    pub fn cols (&self) -> usize {
        self.cols
    }

    #[inline(always)]
    pub fn shape (&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline(always)]
    pub fn get (&self, i: usize, j: usize) -> Option<T> {
        if i < self.rows && j < self.cols {
            return Some(self.data[i * self.cols + j])
        }
        None
    }

    #[inline(always)]
    pub fn row (&self, i: usize) -> &[T] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    #[inline(always)]
    pub fn row_iter (&self) -> ChunksExact<'_, T> {
        self.data.chunks_exact(self.cols.max(1))
    }

    #[inline(always)]
    pub fn row_iter_mut (&mut self) -> ChunksExactMut<'_, T> {
        self.data.chunks_exact_mut(self.cols.max(1))
    }

    #[inline(always)]
    pub fn as_slice (&self) -> &[T] {
        &self.data
    }

    #[inline(always)]
    pub fn as_mut_slice (&mut self) -> &mut [T] {
        &mut self.data
    }

    #[inline(always)]
    pub fn into_vec (self) -> Vec<T> {
        self.data
    }

    pub fn transpose (&self) -> Self {
        Self::from_fn(self.cols, self.rows, |i, j| self.data[j * self.cols + i])
    }
}

impl<T: Float> Matrix<T> {
    #[inline(always)]
    pub fn zeros (rows: usize, cols: usize) -> Self {
        Self { rows, cols, data: vec![T::zero(); rows * cols] }
    }

    /// Fills a matrix with values in `[-5, 5]`, in steps of `0.01`.
    pub fn random<R: Rng + ?Sized> (rows: usize, cols: usize, rng: &mut R) -> Self {
        let scale = T::from(10.0 / 1000.0).unwrap_or_else(T::zero);
        let five = T::from(5.0).unwrap_or_else(T::zero);

        Self::from_fn(rows, cols, |_, _| {
            let step = T::from(rng.gen_range(0..=1000u32)).unwrap_or_else(T::zero);
            step * scale - five
        })
    }

    /// Reference product of `a` and the transpose `bt` of the right operand: every output cell is
    /// the dot product of a row of `a` with a row of `bt`.
    ///
    /// # Errors
    /// [`ErrorKind::ShapeUnsupported`] if the rows of `a` and `bt` have different lengths.
    pub fn transpose_multiply (a: &Self, bt: &Self) -> Result<Self> {
        if a.cols != bt.cols {
            return Err(Error::new(ErrorKind::ShapeUnsupported, format!("shared dimension mismatch: {} vs {}", a.cols, bt.cols)))
        }

        let mut result = Self::zeros(a.rows, bt.rows);
        for (r, out) in a.row_iter().zip(result.row_iter_mut()) {
            for (c, cell) in bt.row_iter().zip(out.iter_mut()) {
                let mut x = T::zero();
                for k in 0..r.len() {
                    x = x + r[k] * c[k];
                }
                *cell = x;
            }
        }

        Ok(result)
    }

    /// Largest cell-wise absolute difference.
    ///
    /// # Errors
    /// [`ErrorKind::ShapeUnsupported`] if the shapes differ.
    pub fn max_abs_diff (&self, other: &Self) -> Result<T> {
        if self.shape() != other.shape() {
            return Err(Error::new(
                ErrorKind::ShapeUnsupported,
                format!("different matrix size: {}x{} vs {}x{}", self.rows, self.cols, other.rows, other.cols)
            ))
        }

        Ok(self.data.iter()
            .zip(other.data.iter())
            .map(|(&x, &y)| (x - y).abs())
            .fold(T::zero(), T::max)
        )
    }
}
