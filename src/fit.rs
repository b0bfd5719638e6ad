// src/fit.rs

use log::{debug, info, trace, warn};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use crate::dimension::{choose_output_dim, descending_order};
use crate::error::{PcaError, Result};
use crate::linalg_backends::{BackendEigh, BackendSVD, EighOutput, LinAlgBackendProvider, SVDOutput};
use crate::mean::{centralize, covariance, resolve_mean, MeanSpec};
use crate::model::PcaModel;

/// Default fraction of total variance the selected components must retain.
pub const DEFAULT_PRATIO: f64 = 0.99;

/// Which numerical route computes the principal directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMethod {
    /// Covariance when there are fewer features than observations, SVD otherwise.
    #[default]
    Auto,
    /// Eigendecomposition of the (d x d) covariance matrix.
    #[serde(alias = "cov")]
    Covariance,
    /// Thin SVD of the centered (d x n) data matrix.
    Svd,
}

impl FitMethod {
    /// Resolves `Auto` for data with `n_features` rows and `n_samples` columns.
    /// Explicit choices are returned unchanged.
    pub fn resolve(self, n_features: usize, n_samples: usize) -> FitMethod {
        match self {
            FitMethod::Auto => {
                if n_features < n_samples {
                    FitMethod::Covariance
                } else {
                    FitMethod::Svd
                }
            }
            explicit => explicit,
        }
    }
}

impl FromStr for FitMethod {
    type Err = PcaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(FitMethod::Auto),
            "cov" | "covariance" => Ok(FitMethod::Covariance),
            "svd" => Ok(FitMethod::Svd),
            other => Err(PcaError::InvalidArgument(format!(
                "unknown fit method '{}', expected one of auto, cov, svd",
                other
            ))),
        }
    }
}

impl fmt::Display for FitMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FitMethod::Auto => "auto",
            FitMethod::Covariance => "cov",
            FitMethod::Svd => "svd",
        };
        f.write_str(name)
    }
}

/// Parameters for [`fit`].
#[derive(Clone, Debug, PartialEq)]
pub struct FitOptions {
    /// Numerical route, see [`FitMethod`].
    pub method: FitMethod,
    /// Upper bound on retained components. `None` means the input dimensionality `d`.
    pub max_out_dim: Option<usize>,
    /// Fraction of total variance to retain, in `(0, 1]`.
    pub pratio: f64,
    /// Centering applied before decomposition.
    pub mean: MeanSpec,
}

impl Default for FitOptions {
    fn default() -> Self {
        FitOptions {
            method: FitMethod::Auto,
            max_out_dim: None,
            pratio: DEFAULT_PRATIO,
            mean: MeanSpec::Compute,
        }
    }
}

impl FitOptions {
    pub fn with_method(mut self, method: FitMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_max_out_dim(mut self, max_out_dim: usize) -> Self {
        self.max_out_dim = Some(max_out_dim);
        self
    }

    pub fn with_pratio(mut self, pratio: f64) -> Self {
        self.pratio = pratio;
        self
    }

    pub fn with_mean(mut self, mean: MeanSpec) -> Self {
        self.mean = mean;
        self
    }
}

/// Checks the parameters shared by both fitting paths.
///
/// Runs before any decomposition so bad input never reaches the numerical kernels.
///
/// # Errors
/// - `DimensionMismatch` if `mean` is non-empty and its length differs from `n_features`.
/// - `Precondition` if `max_out_dim` is zero.
/// - `InvalidArgument` if `pratio` is not in `(0, 1]` (NaN included).
pub fn validate_params(
    n_features: usize,
    mean: Option<&Array1<f64>>,
    max_out_dim: usize,
    pratio: f64,
) -> Result<()> {
    if let Some(m) = mean {
        if !m.is_empty() && m.len() != n_features {
            return Err(PcaError::dimension_mismatch("mean vector length", n_features, m.len()));
        }
    }
    if max_out_dim == 0 {
        return Err(PcaError::Precondition(
            "max_out_dim must be a positive integer".into(),
        ));
    }
    if !(pratio > 0.0 && pratio <= 1.0) {
        return Err(PcaError::InvalidArgument(format!(
            "pratio must lie in (0, 1], got {}",
            pratio
        )));
    }
    Ok(())
}

/// Gathers the `selected` directions and their variances into a model.
fn assemble_model(
    mean: Option<Array1<f64>>,
    variances: &[f64],
    directions: &Array2<f64>,
    selected: &[usize],
    total_variance: f64,
) -> Result<PcaModel> {
    let projection = directions.select(Axis(1), selected);
    let principal_variances = Array1::from_iter(selected.iter().map(|&i| variances[i]));
    trace!("Retained variances: {:?}", principal_variances);
    if total_variance == 0.0 {
        warn!("Data has zero total variance; the retained-variance ratio is undefined.");
    }
    PcaModel::new(mean, projection, principal_variances, total_variance)
}

/// Fits a model from a (d x d) covariance matrix using the default backend.
///
/// * `cov_matrix` - Symmetric covariance matrix.
/// * `mean` - The mean used to produce `cov_matrix`, stored in the model. `None` for no centering.
/// * `max_out_dim` - Upper bound on retained components.
/// * `pratio` - Fraction of total variance to retain.
///
/// The model's total variance is the trace of `cov_matrix` (the sum of all eigenvalues).
pub fn fit_covariance(
    cov_matrix: &Array2<f64>,
    mean: Option<Array1<f64>>,
    max_out_dim: usize,
    pratio: f64,
) -> Result<PcaModel> {
    fit_covariance_with_backend(&LinAlgBackendProvider::<f64>::new(), cov_matrix, mean, max_out_dim, pratio)
}

/// [`fit_covariance`] with an explicit eigendecomposition backend.
pub fn fit_covariance_with_backend<B: BackendEigh<f64>>(
    backend: &B,
    cov_matrix: &Array2<f64>,
    mean: Option<Array1<f64>>,
    max_out_dim: usize,
    pratio: f64,
) -> Result<PcaModel> {
    let n_features = cov_matrix.nrows();
    if cov_matrix.ncols() != n_features {
        return Err(PcaError::dimension_mismatch(
            "covariance matrix columns",
            n_features,
            cov_matrix.ncols(),
        ));
    }
    validate_params(n_features, mean.as_ref(), max_out_dim, pratio)?;

    let EighOutput { eigenvalues, eigenvectors } = backend
        .eigh_upper(cov_matrix)
        .map_err(|e| PcaError::Decomposition(format!("Eigen decomposition of covariance matrix failed: {}", e)))?;

    let variances = eigenvalues.to_vec();
    let negatives = variances.iter().filter(|&&v| v < 0.0).count();
    if negatives > 0 {
        debug!(
            "Covariance spectrum has {} negative eigenvalue(s), smallest {:e}; kept as reported.",
            negatives,
            variances.iter().cloned().fold(f64::INFINITY, f64::min)
        );
    }

    let order = descending_order(&variances);
    let total_variance: f64 = variances.iter().sum();
    let k = choose_output_dim(&variances, &order, total_variance, max_out_dim, pratio);
    debug!(
        "Covariance path: keeping {} of {} components (max_out_dim={}, pratio={}), total variance {:e}",
        k, n_features, max_out_dim, pratio, total_variance
    );

    assemble_model(mean, &variances, &eigenvectors, &order[..k], total_variance)
}

/// Fits a model from centered data (d x n) via SVD using the default backend.
///
/// * `centered` - Data with the mean already subtracted from every column. Consumed.
/// * `mean` - The mean that was subtracted, stored in the model. `None` for no centering.
/// * `tw` - Effective sample weight; each singular value `s` becomes the variance `s² / tw`.
/// * `max_out_dim` - Upper bound on retained components.
/// * `pratio` - Fraction of total variance to retain.
pub fn fit_svd(
    centered: Array2<f64>,
    mean: Option<Array1<f64>>,
    tw: f64,
    max_out_dim: usize,
    pratio: f64,
) -> Result<PcaModel> {
    fit_svd_with_backend(&LinAlgBackendProvider::<f64>::new(), centered, mean, tw, max_out_dim, pratio)
}

/// [`fit_svd`] with an explicit SVD backend.
pub fn fit_svd_with_backend<B: BackendSVD<f64>>(
    backend: &B,
    centered: Array2<f64>,
    mean: Option<Array1<f64>>,
    tw: f64,
    max_out_dim: usize,
    pratio: f64,
) -> Result<PcaModel> {
    let n_features = centered.nrows();
    validate_params(n_features, mean.as_ref(), max_out_dim, pratio)?;
    if !(tw.is_finite() && tw > 0.0) {
        return Err(PcaError::InvalidArgument(format!(
            "sample weight must be positive and finite, got {}",
            tw
        )));
    }

    let SVDOutput { u, s, .. } = backend
        .svd_into(centered, true, false)
        .map_err(|e| PcaError::Decomposition(format!("SVD of centered data failed: {}", e)))?;
    let left_vectors = u.ok_or_else(|| {
        PcaError::Decomposition("SVD backend did not return left singular vectors".into())
    })?;

    let variances: Vec<f64> = s.iter().map(|&sv| sv * sv / tw).collect();
    let order = descending_order(&variances);
    let total_variance: f64 = variances.iter().sum();
    let k = choose_output_dim(&variances, &order, total_variance, max_out_dim, pratio);
    debug!(
        "SVD path: keeping {} of {} components (max_out_dim={}, pratio={}), total variance {:e}",
        k,
        variances.len(),
        max_out_dim,
        pratio,
        total_variance
    );

    assemble_model(mean, &variances, &left_vectors, &order[..k], total_variance)
}

/// Fits a PCA model to `data` (d features as rows, n observations as columns)
/// using the default linear-algebra backend.
///
/// # Errors
/// - `DimensionMismatch` if an explicit mean has the wrong length.
/// - `Precondition` if `max_out_dim` is zero.
/// - `InvalidArgument` if `pratio` is outside `(0, 1]`, `data` has no observations,
///   or `data` holds non-finite values.
/// - `Decomposition` if the eigendecomposition or SVD fails.
///
/// # Examples
///
/// ```
/// use linear_pca::{fit, FitOptions};
/// use ndarray::array;
///
/// // 2 features, 5 observations lying on a line
/// let data = array![
///     [0.0, 1.0, 2.0, 3.0, 4.0],
///     [0.0, 2.0, 4.0, 6.0, 8.0]
/// ];
/// let model = fit(data.view(), &FitOptions::default()).unwrap();
/// assert_eq!(model.output_dim(), 1);
/// ```
pub fn fit(data: ArrayView2<f64>, options: &FitOptions) -> Result<PcaModel> {
    fit_with_backend(&LinAlgBackendProvider::<f64>::new(), data, options)
}

/// [`fit`] with an explicit backend providing both decompositions.
pub fn fit_with_backend<B>(backend: &B, data: ArrayView2<f64>, options: &FitOptions) -> Result<PcaModel>
where
    B: BackendEigh<f64> + BackendSVD<f64>,
{
    let (n_features, n_samples) = data.dim();
    let max_out_dim = options.max_out_dim.unwrap_or(n_features);

    let explicit_mean = match &options.mean {
        MeanSpec::Explicit(m) => Some(m),
        _ => None,
    };
    validate_params(n_features, explicit_mean, max_out_dim, options.pratio)?;
    if n_samples == 0 {
        return Err(PcaError::InvalidArgument(
            "data matrix has zero observations (columns)".into(),
        ));
    }
    if data.iter().any(|v| !v.is_finite()) {
        return Err(PcaError::InvalidArgument(
            "data matrix contains NaN or infinite values".into(),
        ));
    }

    let method = options.method.resolve(n_features, n_samples);
    info!(
        "Fitting PCA on {} features x {} observations using the {} path (requested {}).",
        n_features, n_samples, method, options.method
    );
    let start_time = Instant::now();

    let mean = resolve_mean(data, &options.mean)?;
    let mean_view = mean.as_ref().map(|m| m.view());

    let model = if method == FitMethod::Covariance {
        let cov_matrix = covariance(data, mean_view);
        fit_covariance_with_backend(backend, &cov_matrix, mean, max_out_dim, options.pratio)?
    } else {
        let centered = centralize(data, mean_view);
        fit_svd_with_backend(backend, centered, mean, n_samples as f64, max_out_dim, options.pratio)?
    };

    info!(
        "Fitted PCA with {} of {} dimensions retaining {:.4} of total variance in {:?}",
        model.output_dim(),
        model.input_dim(),
        model.principal_ratio(),
        start_time.elapsed()
    );
    Ok(model)
}
