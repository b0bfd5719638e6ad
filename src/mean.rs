// src/mean.rs

//! Centering: resolving which mean vector to subtract, subtracting it, and the
//! covariance estimator built on top of it.
//!
//! Data matrices are laid out with features as rows (`d`) and observations as
//! columns (`n`).

use log::trace;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{PcaError, Result};

/// How the centering vector is obtained before fitting.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum MeanSpec {
    /// Use the sample mean of the observations.
    #[default]
    Compute,
    /// Do not center; the model stores no mean.
    Zero,
    /// Use the given vector as-is. An empty vector means no centering.
    Explicit(Array1<f64>),
}

/// Resolves `spec` against `data` (d x n).
///
/// Returns `None` when no centering applies, otherwise a vector of length `d`.
pub fn resolve_mean(data: ArrayView2<f64>, spec: &MeanSpec) -> Result<Option<Array1<f64>>> {
    let n_features = data.nrows();
    match spec {
        MeanSpec::Zero => Ok(None),
        MeanSpec::Compute => {
            let mean_vector = data.mean_axis(Axis(1)).ok_or_else(|| {
                PcaError::InvalidArgument(
                    "cannot compute the sample mean of a data matrix with zero observations".into(),
                )
            })?;
            trace!("Computed sample mean over {} observations: {:?}", data.ncols(), mean_vector);
            Ok(Some(mean_vector))
        }
        MeanSpec::Explicit(mean_vector) => {
            if mean_vector.is_empty() {
                Ok(None)
            } else if mean_vector.len() != n_features {
                Err(PcaError::dimension_mismatch("mean vector length", n_features, mean_vector.len()))
            } else {
                Ok(Some(mean_vector.clone()))
            }
        }
    }
}

/// Subtracts `mean` from every column of `data`. With no mean, returns a copy.
pub fn centralize(data: ArrayView2<f64>, mean: Option<ArrayView1<f64>>) -> Array2<f64> {
    match mean {
        Some(m) => &data - &m.insert_axis(Axis(1)),
        None => data.to_owned(),
    }
}

/// Sample covariance of `data` (d x n) around `mean`: `Z Zᵀ / max(n - 1, 1)`.
pub fn covariance(data: ArrayView2<f64>, mean: Option<ArrayView1<f64>>) -> Array2<f64> {
    let n_samples = data.ncols();
    let centered = centralize(data, mean);
    let mut cov_matrix = centered.dot(&centered.t());
    cov_matrix /= (n_samples as f64 - 1.0).max(1.0);
    cov_matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn sample_data() -> Array2<f64> {
        // 2 features, 4 observations
        array![[1.0, 2.0, 3.0, 6.0], [0.0, 4.0, 4.0, 0.0]]
    }

    #[test]
    fn test_compute_takes_row_means() {
        let data = sample_data();
        let mean = resolve_mean(data.view(), &MeanSpec::Compute).unwrap().unwrap();
        assert_abs_diff_eq!(mean[0], 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(mean[1], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_yields_no_mean() {
        let data = sample_data();
        assert_eq!(resolve_mean(data.view(), &MeanSpec::Zero).unwrap(), None);
    }

    #[test]
    fn test_explicit_mean_is_used_verbatim() {
        let data = sample_data();
        let given = array![10.0, -1.0];
        let mean = resolve_mean(data.view(), &MeanSpec::Explicit(given.clone())).unwrap();
        assert_eq!(mean, Some(given));
    }

    #[test]
    fn test_explicit_empty_mean_means_no_centering() {
        let data = sample_data();
        let mean = resolve_mean(data.view(), &MeanSpec::Explicit(Array1::zeros(0))).unwrap();
        assert_eq!(mean, None);
    }

    #[test]
    fn test_explicit_mean_of_wrong_length_is_rejected() {
        let data = sample_data();
        let err = resolve_mean(data.view(), &MeanSpec::Explicit(array![1.0, 2.0, 3.0])).unwrap_err();
        assert!(matches!(err, PcaError::DimensionMismatch { expected: 2, found: 3, .. }));
    }

    #[test]
    fn test_compute_on_empty_observations_fails() {
        let data = Array2::<f64>::zeros((3, 0));
        let err = resolve_mean(data.view(), &MeanSpec::Compute).unwrap_err();
        assert!(matches!(err, PcaError::InvalidArgument(_)));
    }

    #[test]
    fn test_centralize_subtracts_from_each_column() {
        let data = sample_data();
        let mean = array![3.0, 2.0];
        let centered = centralize(data.view(), Some(mean.view()));
        assert_eq!(centered, array![[-2.0, -1.0, 0.0, 3.0], [-2.0, 2.0, 2.0, -2.0]]);
        assert_eq!(centralize(data.view(), None), data);
    }

    #[test]
    fn test_covariance_matches_hand_computation() {
        let data = sample_data();
        let mean = array![3.0, 2.0];
        let cov = covariance(data.view(), Some(mean.view()));
        // Z = [[-2,-1,0,3],[-2,2,2,-2]], Z Zᵀ = [[14,-4],[-4,16]], / 3
        assert_abs_diff_eq!(cov[[0, 0]], 14.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(cov[[0, 1]], -4.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(cov[[1, 0]], -4.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(cov[[1, 1]], 16.0 / 3.0, epsilon = 1e-12);
    }
}
