//! LU factorization with partial pivoting, used to factorize the current
//! basis matrix `B` for `B^-1 a_q` (`ftran`) and `B^-T c_B` (`btran`) solves.
//!
//! Grounded in the teacher's `lpsolver::lu::LuDecomposition`: Gaussian
//! elimination with partial pivoting over a dense working copy, stored as a
//! combined L/U matrix plus a row permutation. Generalized here to expose
//! the `ftran`/`btran` naming the revised-simplex driver actually calls
//! (spec §4.3) and to report the singular-pivot step through `LpError`
//! instead of a bespoke bool.

use crate::error::{LpError, LpResult};
use crate::matrix::Matrix;
use crate::types::Fractional;

/// A factorized basis matrix: `P * A = L * U` where `P` is the row
/// permutation recorded in `permutation` (`permutation[i]` is the original
/// row now sitting at position `i`).
#[derive(Debug, Clone)]
pub struct LuDecomposition {
    lu: Matrix,
    permutation: Vec<usize>,
    sign: Fractional,
}

impl LuDecomposition {
    /// Factorize `matrix` in place (on a working copy), pivoting on the
    /// largest-magnitude entry in each column. Returns `LpError::SingularBasis`
    /// naming the elimination step at which no usable pivot remains.
    pub fn decompose(matrix: &Matrix, tolerance: Fractional) -> LpResult<Self> {
        let n = matrix.rows();
        debug_assert_eq!(matrix.cols(), n, "basis factorization requires a square matrix");
        let mut lu = matrix.clone();
        let mut permutation: Vec<usize> = (0..n).collect();
        let mut sign = 1.0;

        for k in 0..n {
            let mut pivot_row = k;
            let mut pivot_value = lu.get(k, k).abs();
            for r in (k + 1)..n {
                let candidate = lu.get(r, k).abs();
                if candidate > pivot_value {
                    pivot_value = candidate;
                    pivot_row = r;
                }
            }
            if pivot_value <= tolerance {
                return Err(LpError::SingularBasis { step: k });
            }
            if pivot_row != k {
                lu.swap_rows(pivot_row, k);
                permutation.swap(pivot_row, k);
                sign = -sign;
            }
            let pivot = lu.get(k, k);
            for r in (k + 1)..n {
                let factor = lu.get(r, k) / pivot;
                if factor == 0.0 {
                    continue;
                }
                lu.set(r, k, factor);
                for c in (k + 1)..n {
                    let updated = lu.get(r, c) - factor * lu.get(k, c);
                    lu.set(r, c, updated);
                }
            }
        }
        Ok(LuDecomposition { lu, permutation, sign })
    }

    pub fn dim(&self) -> usize {
        self.lu.rows()
    }

    /// Solves `B x = rhs` (the "ftran" direction: pushing a right-hand side
    /// through the factorization to get the corresponding basic solution).
    pub fn ftran(&self, rhs: &[Fractional]) -> Vec<Fractional> {
        let n = self.dim();
        let mut permuted = vec![0.0; n];
        for i in 0..n {
            permuted[i] = rhs[self.permutation[i]];
        }
        // Forward substitution with L (unit diagonal).
        let mut y = permuted;
        for i in 0..n {
            let mut sum = y[i];
            for j in 0..i {
                sum -= self.lu.get(i, j) * y[j];
            }
            y[i] = sum;
        }
        // Back substitution with U.
        let mut x = vec![0.0; n];
        for i in (0..n).rev() {
            let mut sum = y[i];
            for j in (i + 1)..n {
                sum -= self.lu.get(i, j) * x[j];
            }
            x[i] = sum / self.lu.get(i, i);
        }
        x
    }

    /// Solves `B^T y = rhs` (the "btran" direction used to compute the
    /// simplex multipliers `y` from `c_B`).
    pub fn btran(&self, rhs: &[Fractional]) -> Vec<Fractional> {
        let n = self.dim();
        // Solve U^T z = rhs (forward, since U^T is lower triangular).
        let mut z = vec![0.0; n];
        for i in 0..n {
            let mut sum = rhs[i];
            for j in 0..i {
                sum -= self.lu.get(j, i) * z[j];
            }
            z[i] = sum / self.lu.get(i, i);
        }
        // Solve L^T w = z (backward, since L^T is upper triangular with
        // unit diagonal).
        let mut w = vec![0.0; n];
        for i in (0..n).rev() {
            let mut sum = z[i];
            for j in (i + 1)..n {
                sum -= self.lu.get(j, i) * w[j];
            }
            w[i] = sum;
        }
        // Undo the row permutation: w is indexed in permuted-row order.
        let mut result = vec![0.0; n];
        for i in 0..n {
            result[self.permutation[i]] = w[i];
        }
        result
    }

    pub fn determinant(&self) -> Fractional {
        let mut det = self.sign;
        for i in 0..self.dim() {
            det *= self.lu.get(i, i);
        }
        det
    }

    /// Smallest magnitude on the U diagonal, used by the driver's stability
    /// checks to decide whether a refactorization is overdue.
    pub fn smallest_pivot_magnitude(&self) -> Fractional {
        (0..self.dim()).map(|i| self.lu.get(i, i).abs()).fold(Fractional::INFINITY, Fractional::min)
    }
}
