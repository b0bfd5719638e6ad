// src/model.rs

use float_cmp::approx_eq;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::error::{PcaError, Result};
use crate::mean::centralize;

/// Absolute slack allowed when retained variance exceeds total variance.
const VARIANCE_EPSILON: f64 = 1e-12;
/// Relative slack, in units in the last place. 2^26 ULPs is about `sqrt(f64::EPSILON)`.
const VARIANCE_ULPS: i64 = 1 << 26;

/// Whether `retained <= total` holds up to accumulated rounding.
pub(crate) fn retained_within_total(retained: f64, total: f64) -> bool {
    retained <= total
        || approx_eq!(f64, retained, total, epsilon = VARIANCE_EPSILON, ulps = VARIANCE_ULPS)
}

/// A fitted principal component analysis model.
///
/// Immutable once constructed. Holds the centering vector, the `d x p`
/// projection whose columns are the retained principal directions, and the
/// variance bookkeeping used for ratios and residuals.
///
/// Observations are columns: `transform` maps `d x n` inputs to `p x n` codes
/// and `reconstruct` maps them back.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PcaModel {
    /// Centering vector of length `d`, or `None` when no centering was applied.
    mean: Option<Array1<f64>>,
    /// Principal directions as columns. Shape: (d, p)
    projection: Array2<f64>,
    /// Variance along each retained direction, non-increasing. Shape: (p)
    principal_variances: Array1<f64>,
    /// Sum of `principal_variances`.
    total_principal_variance: f64,
    /// Variance of the input data over all directions.
    total_variance: f64,
}

impl PcaModel {
    /// Builds a model from its parts, checking structural invariants.
    ///
    /// * `mean` - Centering vector of length `d`. `None`, or an empty vector, means no centering.
    /// * `projection` - (d x p) matrix of principal directions.
    /// * `principal_variances` - Variance of each of the `p` directions.
    /// * `total_variance` - Total variance of the data the model describes.
    ///
    /// # Errors
    /// - `DimensionMismatch` if the mean length is neither 0 nor `d`, or if
    ///   `principal_variances` does not have `p` entries.
    /// - `InvalidArgument` if the summed variances exceed `total_variance`
    ///   beyond floating-point tolerance.
    ///
    /// # Examples
    ///
    /// ```
    /// use linear_pca::PcaModel;
    /// use ndarray::array;
    ///
    /// let model = PcaModel::new(
    ///     Some(array![1.0, 2.0]),
    ///     array![[1.0], [0.0]],
    ///     array![4.0],
    ///     5.0,
    /// ).unwrap();
    /// assert_eq!(model.input_dim(), 2);
    /// assert_eq!(model.output_dim(), 1);
    /// assert!((model.principal_ratio() - 0.8).abs() < 1e-12);
    /// ```
    pub fn new(
        mean: Option<Array1<f64>>,
        projection: Array2<f64>,
        principal_variances: Array1<f64>,
        total_variance: f64,
    ) -> Result<Self> {
        let (d_features, p_components) = projection.dim();

        let mean = mean.filter(|m| !m.is_empty());
        if let Some(m) = mean.as_ref() {
            if m.len() != d_features {
                return Err(PcaError::dimension_mismatch(
                    "mean length vs projection rows",
                    d_features,
                    m.len(),
                ));
            }
        }
        if principal_variances.len() != p_components {
            return Err(PcaError::dimension_mismatch(
                "principal variances vs projection columns",
                p_components,
                principal_variances.len(),
            ));
        }

        let total_principal_variance = principal_variances.sum();
        if !retained_within_total(total_principal_variance, total_variance) {
            return Err(PcaError::InvalidArgument(format!(
                "retained variance {} exceeds total variance {}",
                total_principal_variance, total_variance
            )));
        }

        Ok(Self {
            mean,
            projection,
            principal_variances,
            total_principal_variance,
            total_variance,
        })
    }

    /// Input dimensionality `d`.
    pub fn input_dim(&self) -> usize {
        self.projection.nrows()
    }

    /// Output dimensionality `p`.
    pub fn output_dim(&self) -> usize {
        self.projection.ncols()
    }

    /// Whether a centering vector is stored.
    pub fn has_mean(&self) -> bool {
        self.mean.is_some()
    }

    /// The effective centering vector: the stored mean, or zeros of length `d`.
    pub fn mean(&self) -> Array1<f64> {
        match self.mean.as_ref() {
            Some(m) => m.clone(),
            None => Array1::zeros(self.input_dim()),
        }
    }

    /// The stored centering vector, if any.
    pub fn stored_mean(&self) -> Option<&Array1<f64>> {
        self.mean.as_ref()
    }

    /// The (d x p) projection matrix.
    pub fn projection(&self) -> ArrayView2<'_, f64> {
        self.projection.view()
    }

    /// Variance captured by the `i`-th retained component, if it exists.
    pub fn principal_variance(&self, i: usize) -> Option<f64> {
        self.principal_variances.get(i).copied()
    }

    /// Variances of all retained components, largest first.
    pub fn principal_variances(&self) -> ArrayView1<'_, f64> {
        self.principal_variances.view()
    }

    /// Sum of retained variances.
    pub fn total_principal_variance(&self) -> f64 {
        self.total_principal_variance
    }

    /// Variance not captured by the retained components.
    pub fn total_residual_variance(&self) -> f64 {
        self.total_variance - self.total_principal_variance
    }

    /// Total variance of the data.
    pub fn total_variance(&self) -> f64 {
        self.total_variance
    }

    /// Fraction of total variance retained. NaN when the total variance is zero.
    pub fn principal_ratio(&self) -> f64 {
        self.total_principal_variance / self.total_variance
    }

    /// Per-component fraction of total variance.
    pub fn explained_variance_ratio(&self) -> Array1<f64> {
        self.principal_variances.mapv(|v| v / self.total_variance)
    }

    /// Projection columns scaled by the standard deviation along each direction.
    pub fn loadings(&self) -> Array2<f64> {
        let std_devs = self.principal_variances.mapv(|v| v.max(0.0).sqrt());
        &self.projection * &std_devs.view().insert_axis(Axis(0))
    }

    /// Projects observations (d x n) into the principal subspace, giving (p x n).
    ///
    /// # Errors
    /// `DimensionMismatch` if `x` does not have `d` rows.
    pub fn transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        if x.nrows() != self.input_dim() {
            return Err(PcaError::dimension_mismatch("input rows", self.input_dim(), x.nrows()));
        }
        let centered = centralize(x, self.mean.as_ref().map(|m| m.view()));
        Ok(self.projection.t().dot(&centered))
    }

    /// Projects a single observation of length `d` to a code of length `p`.
    pub fn transform_vector(&self, x: ArrayView1<f64>) -> Result<Array1<f64>> {
        if x.len() != self.input_dim() {
            return Err(PcaError::dimension_mismatch("input length", self.input_dim(), x.len()));
        }
        let centered = match self.mean.as_ref() {
            Some(m) => &x - m,
            None => x.to_owned(),
        };
        Ok(self.projection.t().dot(&centered))
    }

    /// Maps codes (p x n) back to the input space, giving (d x n).
    ///
    /// Lossy whenever `p < d`.
    pub fn reconstruct(&self, y: ArrayView2<f64>) -> Result<Array2<f64>> {
        if y.nrows() != self.output_dim() {
            return Err(PcaError::dimension_mismatch("code rows", self.output_dim(), y.nrows()));
        }
        let mut restored = self.projection.dot(&y);
        if let Some(m) = self.mean.as_ref() {
            restored += &m.view().insert_axis(Axis(1));
        }
        Ok(restored)
    }

    /// Maps a single code of length `p` back to length `d`.
    pub fn reconstruct_vector(&self, y: ArrayView1<f64>) -> Result<Array1<f64>> {
        if y.len() != self.output_dim() {
            return Err(PcaError::dimension_mismatch("code length", self.output_dim(), y.len()));
        }
        let mut restored = self.projection.dot(&y);
        if let Some(m) = self.mean.as_ref() {
            restored += m;
        }
        Ok(restored)
    }

    /// Saves the model to a file using bincode.
    ///
    /// # Errors
    /// `Persistence` if the file cannot be created or serialization fails.
    pub fn save_model<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref()).map_err(|e| {
            PcaError::Persistence(format!("Failed to create file at {:?}: {}", path.as_ref(), e))
        })?;
        let mut writer = BufWriter::new(file);

        bincode::serde::encode_into_std_write(self, &mut writer, bincode::config::standard())
            .map_err(|e| PcaError::Persistence(format!("Failed to serialize PCA model: {}", e)))?;
        Ok(())
    }

    /// Loads a model previously written by [`PcaModel::save_model`].
    ///
    /// The decoded parts go back through [`PcaModel::new`], so a corrupted or
    /// hand-edited file cannot yield a model that violates its invariants.
    pub fn load_model<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref()).map_err(|e| {
            PcaError::Persistence(format!("Failed to open file at {:?}: {}", path.as_ref(), e))
        })?;
        let mut reader = BufReader::new(file);

        let decoded: PcaModel =
            bincode::serde::decode_from_std_read(&mut reader, bincode::config::standard())
                .map_err(|e| PcaError::Persistence(format!("Failed to deserialize PCA model: {}", e)))?;

        PcaModel::new(
            decoded.mean,
            decoded.projection,
            decoded.principal_variances,
            decoded.total_variance,
        )
    }
}

/// Text report of the dimensions, variance breakdown, mean and projection.
impl fmt::Display for PcaModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "PCA(indim = {}, outdim = {}, principalratio = {:.5})",
            self.input_dim(),
            self.output_dim(),
            self.principal_ratio()
        )?;
        writeln!(f)?;
        writeln!(f, "{:<12} {:>14} {:>14}", "component", "variance", "ratio")?;
        for (i, (variance, ratio)) in self
            .principal_variances
            .iter()
            .zip(self.explained_variance_ratio().iter())
            .enumerate()
        {
            writeln!(f, "{:<12} {:>14.6} {:>14.6}", format!("PC{}", i + 1), variance, ratio)?;
        }
        writeln!(
            f,
            "principal {:.6}, residual {:.6}, total {:.6}",
            self.total_principal_variance,
            self.total_residual_variance(),
            self.total_variance
        )?;
        writeln!(f)?;
        match self.mean.as_ref() {
            Some(m) => writeln!(f, "mean: {:.6}", m)?,
            None => writeln!(f, "mean: none (zero)")?,
        }
        write!(f, "projection:\n{:.6}", self.projection)
    }
}
