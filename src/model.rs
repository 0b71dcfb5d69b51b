use crate::error::LikelihoodError;
use crate::matrix::DesignMatrix;
use crate::types::{CovarianceType, LinkFunction, ResponseFamily};
use ndarray::{Array1, Array2};

/// Immutable per-evaluation inputs: observations, design matrices, sparse
/// structure descriptors and the three configuration selectors.
///
/// Triplet indices are local to their resolution block; the caller supplies
/// them already offset for the chosen covariance type. Entries belonging to
/// resolution `i` occupy a contiguous slice of length `nnz[i]` of the three
/// parallel arrays.
pub struct ModelData {
    /// Observation vector Z, length m.
    pub z: Array1<f64>,
    /// Fixed-effect design matrix X, m x p.
    pub x: Array2<f64>,
    /// Basis design matrix S, m x r.
    pub s: DesignMatrix,
    /// Basis-function count per resolution; r = sum(ri).
    pub ri: Vec<usize>,
    /// Measurement-error variance (Gaussian response only).
    pub sigma2e: f64,
    pub covariance: CovarianceType,
    pub response: ResponseFamily,
    pub link: LinkFunction,
    /// Trial count / size parameter, length m (binomial and
    /// negative-binomial responses only).
    pub k_z: Array1<f64>,
    /// Taper radius per resolution (block-exponential only).
    pub alpha: Vec<f64>,
    /// Coordinate-triplet structure of the per-resolution blocks.
    pub row_indices: Vec<usize>,
    pub col_indices: Vec<usize>,
    pub values: Vec<f64>,
    /// Nonzero count per resolution.
    pub nnz: Vec<usize>,
    /// Kronecker factor dimensions per resolution (separable only), with
    /// n_r[i] * n_c[i] == ri[i].
    pub n_r: Vec<usize>,
    pub n_c: Vec<usize>,
}

impl ModelData {
    pub fn n_obs(&self) -> usize {
        self.z.len()
    }

    pub fn n_resolutions(&self) -> usize {
        self.ri.len()
    }

    pub fn n_random(&self) -> usize {
        self.ri.iter().sum()
    }
}

/// Everything the outer optimizer moves. Variance and scale components are
/// carried on the log scale and exponentiated inside the evaluator, so any
/// real-valued search point maps to a strictly positive variance.
pub struct Parameters {
    /// Fixed-effect coefficients, length p.
    pub beta: Array1<f64>,
    /// log of the fine-scale variance sigma2xi.
    pub logsigma2xi: f64,
    /// log of the dispersion phi.
    pub logphi: f64,
    /// Per-resolution log variance parameters, length 2 * nres. The first
    /// nres entries drive the row direction of the separable factorization
    /// and double as kappa for the precision type; the last nres entries are
    /// the column direction.
    pub logsigma2: Array1<f64>,
    /// Per-resolution log scale parameters, length 2 * nres; same split as
    /// `logsigma2`, doubling as rho for the precision type.
    pub logtau: Array1<f64>,
    /// Basis-function random weights, length r, partitioned by `ri`.
    pub eta: Array1<f64>,
    /// Fine-scale random effect at observation sites, length m.
    pub xi_o: Array1<f64>,
}

fn shape_error(message: String) -> LikelihoodError {
    LikelihoodError::InvalidInput(message)
}

/// Checks every caller-contract precondition once, before the hot path.
pub fn validate(data: &ModelData, params: &Parameters) -> Result<(), LikelihoodError> {
    let m = data.n_obs();
    let nres = data.n_resolutions();
    let r = data.n_random();

    if nres == 0 {
        return Err(shape_error("at least one resolution is required".to_string()));
    }
    if let Some(i) = data.ri.iter().position(|&count| count == 0) {
        return Err(shape_error(format!("resolution {i} has zero basis functions")));
    }
    if data.x.nrows() != m {
        return Err(shape_error(format!(
            "X has {} rows but Z has {} observations",
            data.x.nrows(),
            m
        )));
    }
    if data.s.nrows() != m {
        return Err(shape_error(format!(
            "S has {} rows but Z has {} observations",
            data.s.nrows(),
            m
        )));
    }
    if data.s.ncols() != r {
        return Err(shape_error(format!(
            "S has {} columns but the resolution partition sums to {}",
            data.s.ncols(),
            r
        )));
    }
    if params.beta.len() != data.x.ncols() {
        return Err(shape_error(format!(
            "beta has length {} but X has {} columns",
            params.beta.len(),
            data.x.ncols()
        )));
    }
    if params.eta.len() != r {
        return Err(shape_error(format!(
            "eta has length {} but the resolution partition sums to {}",
            params.eta.len(),
            r
        )));
    }
    if params.xi_o.len() != m {
        return Err(shape_error(format!(
            "xi_O has length {} but there are {} observations",
            params.xi_o.len(),
            m
        )));
    }
    if params.logsigma2.len() != 2 * nres || params.logtau.len() != 2 * nres {
        return Err(shape_error(format!(
            "logsigma2/logtau must have length 2 * nres = {}, got {} and {}",
            2 * nres,
            params.logsigma2.len(),
            params.logtau.len()
        )));
    }
    if data.response.uses_trial_counts() && data.k_z.len() != m {
        return Err(shape_error(format!(
            "k_Z has length {} but there are {} observations",
            data.k_z.len(),
            m
        )));
    }

    match data.covariance {
        CovarianceType::Precision | CovarianceType::BlockExponential => {
            validate_triplets(data, nres)?;
            if data.covariance == CovarianceType::BlockExponential && data.alpha.len() != nres {
                return Err(shape_error(format!(
                    "alpha has length {} but there are {} resolutions",
                    data.alpha.len(),
                    nres
                )));
            }
        }
        CovarianceType::Separable => {
            if data.n_r.len() != nres || data.n_c.len() != nres {
                return Err(shape_error(format!(
                    "n_r/n_c must have length nres = {}, got {} and {}",
                    nres,
                    data.n_r.len(),
                    data.n_c.len()
                )));
            }
            for i in 0..nres {
                if data.n_r[i] * data.n_c[i] != data.ri[i] {
                    return Err(shape_error(format!(
                        "resolution {i}: n_r * n_c = {} does not match ri = {}",
                        data.n_r[i] * data.n_c[i],
                        data.ri[i]
                    )));
                }
            }
        }
    }

    Ok(())
}

fn validate_triplets(data: &ModelData, nres: usize) -> Result<(), LikelihoodError> {
    if data.nnz.len() != nres {
        return Err(shape_error(format!(
            "nnz has length {} but there are {nres} resolutions",
            data.nnz.len()
        )));
    }
    let nnz_total: usize = data.nnz.iter().sum();
    if data.row_indices.len() != nnz_total
        || data.col_indices.len() != nnz_total
        || data.values.len() != nnz_total
    {
        return Err(shape_error(format!(
            "triplet arrays have lengths {}/{}/{} but nnz sums to {nnz_total}",
            data.row_indices.len(),
            data.col_indices.len(),
            data.values.len()
        )));
    }
    let mut start = 0usize;
    for i in 0..nres {
        let order = data.ri[i];
        let end = start + data.nnz[i];
        for j in start..end {
            if data.row_indices[j] >= order || data.col_indices[j] >= order {
                return Err(shape_error(format!(
                    "triplet {j} indexes ({}, {}) outside the order-{order} block of resolution {i}",
                    data.row_indices[j], data.col_indices[j]
                )));
            }
        }
        start = end;
    }
    Ok(())
}
