use crate::error::LikelihoodError;
use faer::linalg::solvers::Solve;
use faer::sparse::linalg::solvers::Llt as SparseLlt;
use faer::sparse::{SparseColMat, Triplet};
use faer::{Mat, Side};
use ndarray::ArrayView1;

/// Assembles one symmetric resolution block from its coordinate triplets.
/// The triplet list carries the full (both-triangle) nonzero pattern, with
/// indices local to the block.
pub(crate) fn assemble_block(
    order: usize,
    triplets: &[Triplet<usize, usize, f64>],
) -> Result<SparseColMat<usize, f64>, LikelihoodError> {
    SparseColMat::try_new_from_triplets(order, order, triplets).map_err(|_| {
        LikelihoodError::InvalidInput(format!(
            "failed to assemble an order-{order} sparse block from triplets"
        ))
    })
}

/// Log-determinant of a sparse SPD block.
///
/// faer's sparse LLT keeps its factor internal, so the determinant is taken
/// from a dense LLT of the densified block, with the diagonal of the factor
/// giving 2 * sum(log(diag(L))). A failed factorization means the block is
/// not positive definite.
pub(crate) fn spd_logdet(
    matrix: &SparseColMat<usize, f64>,
    resolution: usize,
) -> Result<f64, LikelihoodError> {
    let n = matrix.nrows();
    let mut dense = Mat::<f64>::zeros(n, n);
    let (symbolic, values) = matrix.parts();
    let col_ptr = symbolic.col_ptr();
    let row_idx = symbolic.row_idx();
    for col in 0..n {
        for idx in col_ptr[col]..col_ptr[col + 1] {
            dense[(row_idx[idx], col)] = values[idx];
        }
    }
    let llt = dense
        .as_ref()
        .llt(Side::Lower)
        .map_err(|_| LikelihoodError::BlockNotPositiveDefinite { resolution })?;
    let l = llt.L();
    let mut logdet = 0.0;
    for i in 0..n {
        logdet += l[(i, i)].ln();
    }
    Ok(2.0 * logdet)
}

/// Sparse Cholesky factor of an SPD block, used for quadratic-form solves.
/// The fill-reducing permutation chosen by faer is applied consistently to
/// both sides of the solve, so callers never see it.
pub(crate) struct SpdBlockFactor {
    factor: SparseLlt<usize, f64>,
    n: usize,
}

pub(crate) fn factorize_spd(
    matrix: &SparseColMat<usize, f64>,
    resolution: usize,
) -> Result<SpdBlockFactor, LikelihoodError> {
    let factor = matrix
        .as_ref()
        .sp_cholesky(Side::Lower)
        .map_err(|_| LikelihoodError::BlockNotPositiveDefinite { resolution })?;
    Ok(SpdBlockFactor {
        factor,
        n: matrix.nrows(),
    })
}

impl SpdBlockFactor {
    /// v' A^{-1} v for the factored block A.
    pub(crate) fn inverse_quadratic_form(&self, v: ArrayView1<'_, f64>) -> f64 {
        let rhs = Mat::from_fn(self.n, 1, |i, _| v[i]);
        let solved = self.factor.solve(rhs.as_ref());
        let mut quad = 0.0;
        for i in 0..self.n {
            quad += v[i] * solved[(i, 0)];
        }
        quad
    }
}

/// v' A v via a single CSC traversal. Every stored entry is accumulated
/// unconditionally; the traversal never branches on the values of `v`.
pub(crate) fn quadratic_form(matrix: &SparseColMat<usize, f64>, v: ArrayView1<'_, f64>) -> f64 {
    let (symbolic, values) = matrix.parts();
    let col_ptr = symbolic.col_ptr();
    let row_idx = symbolic.row_idx();
    let mut quad = 0.0;
    for col in 0..matrix.ncols() {
        let x = v[col];
        for idx in col_ptr[col]..col_ptr[col + 1] {
            quad += v[row_idx[idx]] * values[idx] * x;
        }
    }
    quad
}
