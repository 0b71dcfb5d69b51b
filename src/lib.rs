#![deny(dead_code)]
#![deny(unused_imports)]

pub mod covariance;
pub mod error;
pub mod family;
pub mod likelihood;
pub mod matrix;
pub mod model;
pub mod sparse;
pub mod types;

pub use covariance::PriorTerms;
pub use error::LikelihoodError;
pub use likelihood::{LogDensityParts, log_density_parts, negative_log_likelihood};
pub use matrix::DesignMatrix;
pub use model::{ModelData, Parameters};
pub use types::{CovarianceType, LinkFunction, ResponseFamily};
