//! Optimization result types.
//!
//! ## Float Normalization for Deterministic Fingerprints
//!
//! Probabilities are quantized to integers before hashing to avoid
//! cross-platform serialization differences. The quantization factor is
//! 1e6 (multiply by 1,000,000 and round to i64), so two runs whose
//! probabilities agree within 1e-6 produce the same fingerprint.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::canonical::canonical_hash_hex;
use super::node::NodeId;

/// Quantization factor for float normalization.
const FLOAT_QUANTIZATION_FACTOR: f64 = 1_000_000.0;

fn quantize_float(value: f64) -> i64 {
    (value * FLOAT_QUANTIZATION_FACTOR).round() as i64
}

/// Outcome of optimizing a single sector.
///
/// Created once per successfully optimized sector and immutable
/// thereafter; consumed by the downstream rendering/reporting stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Sector this result belongs to.
    pub sector_id: u32,
    /// Per-node selection probability. Values sum to 1 within numerical
    /// tolerance.
    pub node_probabilities: BTreeMap<NodeId, f64>,
    /// Ids of the selected nodes, in sector node order.
    ///
    /// Selection is tie-inclusive: every node whose probability reaches
    /// the cutoff is selected, so the list may exceed
    /// `ceil(n · selection_ratio)` entries.
    pub selected_nodes: Vec<NodeId>,
    /// Raw complex amplitude vector after evolution, in sector node
    /// order. Diagnostic output; `|ψ_k|²` yields the probabilities.
    pub wavefunction: Vec<Complex64>,
}

/// Quantized result view for deterministic hashing.
#[derive(Serialize)]
struct QuantizedResult<'a> {
    sector_id: u32,
    probabilities: BTreeMap<&'a NodeId, i64>,
    selected: &'a [NodeId],
}

impl OptimizationResult {
    /// Compute a canonical fingerprint of this result.
    ///
    /// Covers the sector id, quantized probabilities, and the selected
    /// set. Two runs over identical inputs produce identical
    /// fingerprints; the raw wavefunction is excluded because global
    /// phase is not meaningful.
    pub fn fingerprint(&self) -> String {
        let quantized = QuantizedResult {
            sector_id: self.sector_id,
            probabilities: self
                .node_probabilities
                .iter()
                .map(|(id, p)| (id, quantize_float(*p)))
                .collect(),
            selected: &self.selected_nodes,
        };
        canonical_hash_hex(&quantized)
    }

    /// Probability assigned to a node, if it belongs to this sector.
    pub fn probability(&self, id: &NodeId) -> Option<f64> {
        self.node_probabilities.get(id).copied()
    }

    /// Whether a node made the selection cut.
    pub fn is_selected(&self, id: &NodeId) -> bool {
        self.selected_nodes.iter().any(|s| s == id)
    }
}
