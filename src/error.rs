use thiserror::Error;

/// Failure taxonomy of a likelihood evaluation.
///
/// Configuration errors (`UnknownCovarianceType`, `UnknownResponse`,
/// `UnknownLink`) and precondition violations (`InvalidInput`) are caller
/// mistakes detected before the hot path. `BlockNotPositiveDefinite` is a
/// numerical failure: the optimizer wandered into a region of parameter space
/// where a resolution block loses positive definiteness, and the caller is
/// expected to reject that parameter point rather than abort.
#[derive(Debug, Error)]
pub enum LikelihoodError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(
        "Unknown covariance type '{0}' (expected 'precision', 'block-exponential' or 'separable')"
    )]
    UnknownCovarianceType(String),

    #[error("Unknown response distribution '{0}'")]
    UnknownResponse(String),

    #[error("Unknown link function '{0}'")]
    UnknownLink(String),

    #[error("Cholesky factorization failed: resolution block {resolution} is not positive definite")]
    BlockNotPositiveDefinite { resolution: usize },
}
