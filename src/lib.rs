// Principal component analysis (PCA)

#![doc = include_str!("../README.md")]

pub mod dimension;
pub mod error;
pub mod fit;
pub mod linalg_backends;
pub mod mean;
pub mod model;

pub use dimension::{choose_output_dim, descending_order};
pub use error::{PcaError, Result};
pub use fit::{
    fit, fit_covariance, fit_covariance_with_backend, fit_svd, fit_svd_with_backend, fit_with_backend,
    validate_params, FitMethod, FitOptions, DEFAULT_PRATIO,
};
pub use mean::{centralize, covariance, resolve_mean, MeanSpec};
pub use model::PcaModel;
