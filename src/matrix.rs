//! Dense row-major matrix, used for the basis factorization and for small
//! dense working storage (the teacher's `lpsolver::matrix::Matrix`, carried
//! over essentially unchanged since a dense basis representation is still
//! the right tool for the LU factorization step).

use crate::types::Fractional;
use std::fmt;

/// A dense, row-major matrix of `Fractional` values.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<Fractional>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Matrix { rows, cols, data: vec![0.0; rows * cols] }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Matrix::zeros(n, n);
        for i in 0..n {
            m.set(i, i, 1.0);
        }
        m
    }

    pub fn from_rows(rows: Vec<Vec<Fractional>>) -> Self {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, |r| r.len());
        let mut data = Vec::with_capacity(nrows * ncols);
        for row in rows {
            debug_assert_eq!(row.len(), ncols, "ragged row matrix");
            data.extend(row);
        }
        Matrix { rows: nrows, cols: ncols, data }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, r: usize, c: usize) -> Fractional {
        self.data[r * self.cols + c]
    }

    #[inline]
    pub fn set(&mut self, r: usize, c: usize, value: Fractional) {
        self.data[r * self.cols + c] = value;
    }

    pub fn row(&self, r: usize) -> &[Fractional] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn row_mut(&mut self, r: usize) -> &mut [Fractional] {
        &mut self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn col(&self, c: usize) -> Vec<Fractional> {
        (0..self.rows).map(|r| self.get(r, c)).collect()
    }

    pub fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for c in 0..self.cols {
            self.data.swap(a * self.cols + c, b * self.cols + c);
        }
    }

    pub fn scale_row(&mut self, r: usize, factor: Fractional) {
        for v in self.row_mut(r) {
            *v *= factor;
        }
    }

    /// `row[target] += factor * row[source]`
    pub fn add_scaled_row(&mut self, target: usize, source: usize, factor: Fractional) {
        for c in 0..self.cols {
            let add = factor * self.get(source, c);
            let current = self.get(target, c);
            self.set(target, c, current + add);
        }
    }

    pub fn mul_vec(&self, x: &[Fractional]) -> Vec<Fractional> {
        debug_assert_eq!(x.len(), self.cols);
        (0..self.rows)
            .map(|r| self.row(r).iter().zip(x.iter()).map(|(a, b)| a * b).sum())
            .collect()
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| crate::types::is_finite(*v))
    }

    pub fn frobenius_norm(&self) -> Fractional {
        self.data.iter().map(|v| v * v).sum::<Fractional>().sqrt()
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.rows {
            for c in 0..self.cols {
                write!(f, "{:>10.4} ", self.get(r, c))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_times_vector_is_identity() {
        let m = Matrix::identity(3);
        assert_eq!(m.mul_vec(&[1.0, 2.0, 3.0]), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn swap_rows_exchanges_contents() {
        let mut m = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        m.swap_rows(0, 1);
        assert_eq!(m.row(0), &[3.0, 4.0]);
        assert_eq!(m.row(1), &[1.0, 2.0]);
    }

    #[test]
    fn add_scaled_row_eliminates_entry() {
        let mut m = Matrix::from_rows(vec![vec![2.0, 1.0], vec![4.0, 3.0]]);
        let factor = -m.get(1, 0) / m.get(0, 0);
        m.add_scaled_row(1, 0, factor);
        assert_eq!(m.get(1, 0), 0.0);
    }

    #[test]
    fn frobenius_norm_of_identity_is_sqrt_n() {
        let m = Matrix::identity(4);
        assert!((m.frobenius_norm() - 2.0).abs() < 1e-12);
    }
}
