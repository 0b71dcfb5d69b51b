use crate::error::LikelihoodError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Parameterization of the multi-resolution prior for the basis-function
/// random weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CovarianceType {
    /// Sparse precision matrix per resolution.
    Precision,
    /// Exponential covariance per resolution, multiplied by a spherical taper.
    BlockExponential,
    /// Kronecker product of AR(1)-type row and column factors per resolution.
    Separable,
}

impl FromStr for CovarianceType {
    type Err = LikelihoodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "precision" => Ok(Self::Precision),
            "block-exponential" => Ok(Self::BlockExponential),
            "separable" => Ok(Self::Separable),
            other => Err(LikelihoodError::UnknownCovarianceType(other.to_string())),
        }
    }
}

/// Exponential-family response distribution of the observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseFamily {
    Gaussian,
    Poisson,
    Bernoulli,
    Gamma,
    InverseGaussian,
    NegativeBinomial,
    Binomial,
}

impl ResponseFamily {
    /// Families whose density involves the per-observation trial count /
    /// size parameter `k_Z`.
    pub fn uses_trial_counts(self) -> bool {
        matches!(self, Self::NegativeBinomial | Self::Binomial)
    }
}

impl FromStr for ResponseFamily {
    type Err = LikelihoodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gaussian" => Ok(Self::Gaussian),
            "poisson" => Ok(Self::Poisson),
            "bernoulli" => Ok(Self::Bernoulli),
            "gamma" => Ok(Self::Gamma),
            "inverse-gaussian" => Ok(Self::InverseGaussian),
            "negative-binomial" => Ok(Self::NegativeBinomial),
            "binomial" => Ok(Self::Binomial),
            other => Err(LikelihoodError::UnknownResponse(other.to_string())),
        }
    }
}

/// Link between the Gaussian-scale linear predictor and the conditional mean
/// (or probability) of the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkFunction {
    Identity,
    Inverse,
    InverseSquared,
    Log,
    SquareRoot,
    Logit,
    Probit,
    Cloglog,
}

impl LinkFunction {
    /// Links that map the predictor to a probability rather than a mean.
    pub fn is_probability_scale(self) -> bool {
        matches!(self, Self::Logit | Self::Probit | Self::Cloglog)
    }
}

impl FromStr for LinkFunction {
    type Err = LikelihoodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "identity" => Ok(Self::Identity),
            "inverse" => Ok(Self::Inverse),
            "inverse-squared" => Ok(Self::InverseSquared),
            "log" => Ok(Self::Log),
            "square-root" => Ok(Self::SquareRoot),
            "logit" => Ok(Self::Logit),
            "probit" => Ok(Self::Probit),
            "cloglog" => Ok(Self::Cloglog),
            other => Err(LikelihoodError::UnknownLink(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_documented_name_parses() {
        for name in ["precision", "block-exponential", "separable"] {
            assert!(name.parse::<CovarianceType>().is_ok(), "{name}");
        }
        for name in [
            "gaussian",
            "poisson",
            "bernoulli",
            "gamma",
            "inverse-gaussian",
            "negative-binomial",
            "binomial",
        ] {
            assert!(name.parse::<ResponseFamily>().is_ok(), "{name}");
        }
        for name in [
            "identity",
            "inverse",
            "inverse-squared",
            "log",
            "square-root",
            "logit",
            "probit",
            "cloglog",
        ] {
            assert!(name.parse::<LinkFunction>().is_ok(), "{name}");
        }
    }

    #[test]
    fn unknown_names_are_fatal() {
        assert!(matches!(
            "dense".parse::<CovarianceType>(),
            Err(LikelihoodError::UnknownCovarianceType(_))
        ));
        assert!(matches!(
            "lognormal".parse::<ResponseFamily>(),
            Err(LikelihoodError::UnknownResponse(_))
        ));
        assert!(matches!(
            "cauchit".parse::<LinkFunction>(),
            Err(LikelihoodError::UnknownLink(_))
        ));
    }
}
