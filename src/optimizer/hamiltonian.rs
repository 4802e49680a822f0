//! Hamiltonian assembly for the sector walk.
//!
//! The Hamiltonian is a real symmetric matrix summing four energy terms:
//! the graph Laplacian (connectivity reward), the mirrored harmony map
//! (pairwise compatibility), the veil penalty (visibility), and the
//! optional caller preference/penalty context. Symmetry of the sum is
//! what keeps the evolution operator unitary.

use nalgebra::DMatrix;
use std::collections::BTreeMap;

use super::{ExtraContext, OptimizeError, OptimizerConfig};

/// Assemble the sector Hamiltonian.
///
/// `adjacency` must be square; `veil` must match its dimension (both
/// checked by the caller). Harmony indices and extra-context shapes are
/// validated here.
pub(crate) fn build(
    config: &OptimizerConfig,
    adjacency: &DMatrix<f64>,
    harmonies: &BTreeMap<(usize, usize), f64>,
    veil: &[f64],
    extra: Option<&ExtraContext>,
) -> Result<DMatrix<f64>, OptimizeError> {
    let n = adjacency.nrows();

    // Laplacian term: degree diagonal minus adjacency.
    let mut h = DMatrix::zeros(n, n);
    for i in 0..n {
        let degree: f64 = adjacency.row(i).sum();
        h[(i, i)] = config.laplacian_weight * degree;
    }
    h -= adjacency * config.laplacian_weight;

    // Harmony term, mirrored across the diagonal.
    for (&(i, j), &value) in harmonies {
        if i >= n || j >= n {
            return Err(OptimizeError::HarmonyIndex {
                i,
                j,
                node_count: n,
            });
        }
        h[(i, j)] += config.harmony_weight * value;
        h[(j, i)] += config.harmony_weight * value;
    }

    // Veil term: lower visibility raises the node's energy penalty.
    for (k, &factor) in veil.iter().enumerate() {
        h[(k, k)] += config.veil_weight * (1.0 - factor.clamp(0.0, 1.0));
    }

    if let Some(context) = extra {
        if let Some(preference) = &context.preference_vector {
            if preference.len() != n {
                return Err(OptimizeError::PreferenceLength {
                    expected: n,
                    got: preference.len(),
                });
            }
            for k in 0..n {
                h[(k, k)] -= config.preference_weight * preference[k];
            }
        }

        if let Some(penalty) = &context.penalty_matrix {
            if penalty.nrows() != n || penalty.ncols() != n {
                return Err(OptimizeError::PenaltyShape {
                    expected: n,
                    rows: penalty.nrows(),
                    cols: penalty.ncols(),
                });
            }
            h += penalty;
        }
    }

    Ok(h)
}
