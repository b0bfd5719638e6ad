// src/linalg_backends.rs

#[derive(Debug, Default, Copy, Clone)]
pub struct LinAlgBackendProvider<F: 'static + Copy + Send + Sync> {
    _phantom: PhantomData<F>,
}

impl<F: 'static + Copy + Send + Sync> LinAlgBackendProvider<F> {
    pub fn new() -> Self {
        Self { _phantom: PhantomData }
    }
}

// --- Common imports needed by multiple sections ---
use ndarray::{Array1, Array2};
use std::error::Error;
use std::marker::PhantomData;

// --- Trait Definitions ---

/// Output of a symmetric eigendecomposition.
#[derive(Debug)]
pub struct EighOutput<F: 'static> {
    /// Eigenvalues, in whatever order the backend produces (typically ascending).
    pub eigenvalues: Array1<F>,
    /// Eigenvectors as columns of the matrix.
    /// eigenvectors.column(i) corresponds to eigenvalues[i].
    pub eigenvectors: Array2<F>,
}

/// Trait for symmetric eigendecomposition (similar to LAPACK's DSYEVR or DSYEVD).
/// Implementers read the upper triangle of `matrix`, which is expected to be symmetric.
pub trait BackendEigh<F: 'static + Copy + Send + Sync> {
    fn eigh_upper(&self, matrix: &Array2<F>) -> Result<EighOutput<F>, Box<dyn Error + Send + Sync>>;
}

/// Output of a thin Singular Value Decomposition.
#[derive(Debug)]
pub struct SVDOutput<F: 'static> {
    /// Left singular vectors, (m x min(m, n)), when requested.
    pub u: Option<Array2<F>>,
    /// Singular values in non-increasing order.
    pub s: Array1<F>,
    /// Transposed right singular vectors, (min(m, n) x n), when requested.
    pub vt: Option<Array2<F>>,
}

/// Trait for Singular Value Decomposition.
pub trait BackendSVD<F: 'static + Copy + Send + Sync> {
    fn svd_into(&self, matrix: Array2<F>, compute_u: bool, compute_v: bool) -> Result<SVDOutput<F>, Box<dyn Error + Send + Sync>>;
}

// --- FaerLinAlgBackend Implementation ---
mod faer_specific_code {
    use super::{BackendEigh, BackendSVD, EighOutput, SVDOutput};
    use faer::{Mat, MatRef, Side};
    use ndarray::{Array1, Array2};
    use std::error::Error;

    fn to_dyn_error_faer(msg: String) -> Box<dyn Error + Send + Sync> {
        Box::new(std::io::Error::new(std::io::ErrorKind::Other, msg))
    }

    /// Pure-Rust backend built on `faer`. Needs no system LAPACK.
    #[derive(Debug, Default, Copy, Clone)]
    pub struct FaerLinAlgBackend;

    fn ndarray_to_faer(matrix: &Array2<f64>) -> Mat<f64> {
        let (nrows, ncols) = matrix.dim();
        Mat::from_fn(nrows, ncols, |i, j| matrix[[i, j]])
    }

    fn faer_mat_to_ndarray(faer_mat: MatRef<'_, f64>) -> Array2<f64> {
        Array2::from_shape_fn((faer_mat.nrows(), faer_mat.ncols()), |(i, j)| faer_mat[(i, j)])
    }

    impl BackendEigh<f64> for FaerLinAlgBackend {
        fn eigh_upper(&self, matrix: &Array2<f64>) -> Result<EighOutput<f64>, Box<dyn Error + Send + Sync>> {
            if matrix.nrows() != matrix.ncols() {
                return Err(to_dyn_error_faer(format!(
                    "Matrix must be square for eigendecomposition, got {}x{}.",
                    matrix.nrows(),
                    matrix.ncols()
                )));
            }
            if matrix.is_empty() {
                return Ok(EighOutput { eigenvalues: Array1::zeros(0), eigenvectors: Array2::zeros((0, 0)) });
            }
            let faer_matrix = ndarray_to_faer(matrix);
            let eig = faer_matrix
                .as_ref()
                .self_adjoint_eigen(Side::Upper)
                .map_err(|e| to_dyn_error_faer(format!("Faer self-adjoint eigendecomposition failed: {:?}", e)))?;

            let values = eig.S();
            let eigenvalues = Array1::from_shape_fn(values.dim(), |i| values[i]);
            let eigenvectors = faer_mat_to_ndarray(eig.U());
            Ok(EighOutput { eigenvalues, eigenvectors })
        }
    }

    impl BackendSVD<f64> for FaerLinAlgBackend {
        fn svd_into(&self, matrix: Array2<f64>, compute_u: bool, compute_v: bool) -> Result<SVDOutput<f64>, Box<dyn Error + Send + Sync>> {
            let (nrows, ncols) = matrix.dim();
            if matrix.is_empty() {
                let k_dim = nrows.min(ncols);
                return Ok(SVDOutput {
                    u: if compute_u { Some(Array2::zeros((nrows, k_dim))) } else { None },
                    s: Array1::zeros(k_dim),
                    vt: if compute_v { Some(Array2::zeros((k_dim, ncols))) } else { None },
                });
            }
            let faer_matrix = ndarray_to_faer(&matrix);
            let svd = faer_matrix
                .as_ref()
                .thin_svd()
                .map_err(|e| to_dyn_error_faer(format!("Faer SVD computation failed: {:?}", e)))?;

            let singular = svd.S();
            let s = Array1::from_shape_fn(singular.dim(), |i| singular[i]);

            let u = if compute_u { Some(faer_mat_to_ndarray(svd.U())) } else { None };
            let vt = if compute_v {
                Some(faer_mat_to_ndarray(svd.V()).reversed_axes())
            } else {
                None
            };

            Ok(SVDOutput { u, s, vt })
        }
    }
}

pub use faer_specific_code::FaerLinAlgBackend;

// --- NdarrayLinAlgBackend Implementation ---
#[cfg(feature = "backend_lapack")]
mod lapack_specific_code {
    use super::{BackendEigh, BackendSVD, EighOutput, SVDOutput};
    use ndarray::Array2;
    use ndarray_linalg::{Eigh as NdLinalgEigh, SVDInto as NdLinalgSVDInto, UPLO};
    use std::error::Error;

    /// Backend delegating to LAPACK through `ndarray-linalg`.
    #[derive(Debug, Default, Copy, Clone)]
    pub struct NdarrayLinAlgBackend;

    // Helper to convert ndarray-linalg's error to Box<dyn Error + Send + Sync>
    fn to_dyn_error<E: Error + Send + Sync + 'static>(e: E) -> Box<dyn Error + Send + Sync> {
        Box::new(e)
    }

    impl BackendEigh<f64> for NdarrayLinAlgBackend {
        fn eigh_upper(&self, matrix: &Array2<f64>) -> Result<EighOutput<f64>, Box<dyn Error + Send + Sync>> {
            let (eigenvalues, eigenvectors) = matrix.eigh(UPLO::Upper).map_err(to_dyn_error)?;
            Ok(EighOutput { eigenvalues, eigenvectors })
        }
    }

    impl BackendSVD<f64> for NdarrayLinAlgBackend {
        fn svd_into(&self, matrix: Array2<f64>, compute_u: bool, compute_v: bool) -> Result<SVDOutput<f64>, Box<dyn Error + Send + Sync>> {
            let (u, s, vt) = matrix.svd_into(compute_u, compute_v).map_err(to_dyn_error)?;
            Ok(SVDOutput { u, s, vt })
        }
    }
}

#[cfg(feature = "backend_lapack")]
pub use lapack_specific_code::NdarrayLinAlgBackend;

// --- LinAlgBackendProvider Dispatch ---
//
// Dispatches to the backend selected by compile-time feature flags:
// `backend_lapack` routes through ndarray-linalg, otherwise faer is used.

impl BackendEigh<f64> for LinAlgBackendProvider<f64> {
    fn eigh_upper(&self, matrix: &Array2<f64>) -> Result<EighOutput<f64>, Box<dyn Error + Send + Sync>> {
        #[cfg(feature = "backend_lapack")]
        {
            NdarrayLinAlgBackend.eigh_upper(matrix)
        }
        #[cfg(not(feature = "backend_lapack"))]
        {
            FaerLinAlgBackend.eigh_upper(matrix)
        }
    }
}

impl BackendSVD<f64> for LinAlgBackendProvider<f64> {
    fn svd_into(&self, matrix: Array2<f64>, compute_u: bool, compute_v: bool) -> Result<SVDOutput<f64>, Box<dyn Error + Send + Sync>> {
        #[cfg(feature = "backend_lapack")]
        {
            NdarrayLinAlgBackend.svd_into(matrix, compute_u, compute_v)
        }
        #[cfg(not(feature = "backend_lapack"))]
        {
            FaerLinAlgBackend.svd_into(matrix, compute_u, compute_v)
        }
    }
}
