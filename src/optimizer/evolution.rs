//! Discretized unitary time evolution.
//!
//! The evolution operator U = exp(−i·H·dt) is built once per sector from
//! the spectral decomposition of the real symmetric Hamiltonian
//! (H = VΛVᵀ ⇒ U = V·e^{−iΛdt}·Vᵀ) and applied `time_steps` times to a
//! uniform initial superposition. The state is renormalized after every
//! application to contain floating-point drift; a zero or non-finite
//! norm aborts the sector instead of being masked.

use nalgebra::{DMatrix, DVector, SymmetricEigen};
use num_complex::Complex64;

use super::OptimizeError;

/// Build the discrete evolution operator exp(−i·H·dt).
///
/// H must be symmetric; its eigendecomposition is real, so each
/// eigenvalue contributes a pure phase and the operator is unitary up to
/// floating-point error.
pub(crate) fn evolution_operator(hamiltonian: &DMatrix<f64>, dt: f64) -> DMatrix<Complex64> {
    let n = hamiltonian.nrows();
    let eigen = SymmetricEigen::new(hamiltonian.clone());

    let mut operator = DMatrix::from_element(n, n, Complex64::new(0.0, 0.0));
    for k in 0..n {
        let phase = (-Complex64::i() * eigen.eigenvalues[k] * dt).exp();
        let v = eigen.eigenvectors.column(k);
        for a in 0..n {
            for b in 0..n {
                operator[(a, b)] += phase * v[a] * v[b];
            }
        }
    }
    operator
}

/// Evolve a uniform superposition under the operator.
///
/// Renormalizes after every application. Returns the final amplitude
/// vector, or [`OptimizeError::NumericalFailure`] if the norm collapses.
pub(crate) fn evolve(
    operator: &DMatrix<Complex64>,
    node_count: usize,
    time_steps: u32,
) -> Result<DVector<Complex64>, OptimizeError> {
    let amplitude = Complex64::new(1.0 / (node_count as f64).sqrt(), 0.0);
    let mut psi = DVector::from_element(node_count, amplitude);

    for step in 0..time_steps {
        psi = operator * &psi;
        let norm = psi.norm();
        if !norm.is_finite() || norm == 0.0 {
            return Err(OptimizeError::NumericalFailure { step, norm });
        }
        psi.unscale_mut(norm);
    }

    Ok(psi)
}
