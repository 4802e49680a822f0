//! Quantum-walk sector optimizer.
//!
//! Assembles a real symmetric Hamiltonian from a sector's proximity
//! graph, veil factors, and optional caller context, simulates
//! discretized unitary time evolution of a uniform initial
//! superposition, and selects the nodes whose final probability clears
//! the configured ratio threshold.
//!
//! ## Algorithm
//!
//! 1. H = laplacian_weight · (D − A)
//!      + harmony_weight · mirror(harmonies)
//!      + veil_weight · diag(1 − clamp(veil, 0, 1))
//!      − preference_weight · diag(preference)
//!      + penalty
//! 2. ψ₀ = uniform superposition, every entry 1/√n
//! 3. U = exp(−i·H·dt), built once from the spectrum of H
//! 4. ψ ← normalize(U·ψ), `time_steps` times
//! 5. p_k = |ψ_k|², renormalized to sum 1
//! 6. select every node with p ≥ the c-th largest probability,
//!    c = max(1, ceil(n · selection_ratio))
//!
//! Every step is deterministic; identical inputs yield identical
//! probabilities and an identical result fingerprint.

pub mod hamiltonian;
pub mod evolution;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::partition::SectorGraph;
use crate::types::{OptimizationResult, SectorConfig};

/// Error type for optimizer configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Evolution must run at least one step.
    #[error("time_steps must be greater than zero")]
    InvalidTimeSteps,
    /// Time increment must be positive and finite.
    #[error("dt must be positive and finite, got {0}")]
    InvalidDt(f64),
    /// Selection ratio must lie in (0, 1].
    #[error("selection_ratio must be in (0, 1], got {0}")]
    InvalidSelectionRatio(f64),
}

/// Error type for sector optimization.
///
/// Shape and index violations are validation failures and are never
/// silently corrected; numerical collapse aborts only the affected
/// sector. None are retried internally.
#[derive(Debug, thiserror::Error)]
pub enum OptimizeError {
    /// Sector carried no nodes.
    #[error("sector {sector_id} has no nodes")]
    EmptySector {
        /// Offending sector.
        sector_id: u32,
    },
    /// Adjacency matrix shape does not match the node count.
    #[error("adjacency must be {expected}x{expected}, got {rows}x{cols}")]
    AdjacencyShape {
        /// Expected dimension (node count).
        expected: usize,
        /// Actual row count.
        rows: usize,
        /// Actual column count.
        cols: usize,
    },
    /// Veil factor vector length does not match the node count.
    #[error("veil factor length {got} does not match node count {expected}")]
    VeilLength {
        /// Expected length (node count).
        expected: usize,
        /// Actual length.
        got: usize,
    },
    /// Preference vector length does not match the node count.
    #[error("preference vector length {got} does not match node count {expected}")]
    PreferenceLength {
        /// Expected length (node count).
        expected: usize,
        /// Actual length.
        got: usize,
    },
    /// Penalty matrix shape does not match the adjacency.
    #[error("penalty matrix must be {expected}x{expected}, got {rows}x{cols}")]
    PenaltyShape {
        /// Expected dimension (node count).
        expected: usize,
        /// Actual row count.
        rows: usize,
        /// Actual column count.
        cols: usize,
    },
    /// Harmony map references an index outside the sector.
    #[error("harmony pair ({i}, {j}) outside sector of {node_count} nodes")]
    HarmonyIndex {
        /// First index of the offending pair.
        i: usize,
        /// Second index of the offending pair.
        j: usize,
        /// Sector node count.
        node_count: usize,
    },
    /// Wavefunction norm collapsed to zero or a non-finite value.
    #[error("wavefunction norm became {norm} at step {step}")]
    NumericalFailure {
        /// Evolution step at which the collapse was detected.
        step: u32,
        /// The invalid norm value.
        norm: f64,
    },
}

/// Optimizer configuration.
///
/// Weight scalars are unconstrained reals; the remaining parameters are
/// validated strictly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Number of discrete evolution steps.
    pub time_steps: u32,
    /// Time increment per step.
    pub dt: f64,
    /// Weight of the graph Laplacian term (rewards connectivity).
    pub laplacian_weight: f64,
    /// Weight of the pairwise harmony term.
    pub harmony_weight: f64,
    /// Weight of the visibility penalty term.
    pub veil_weight: f64,
    /// Weight of the caller preference term.
    pub preference_weight: f64,
    /// Fraction of each sector's nodes to select, in (0, 1].
    pub selection_ratio: f64,
}

impl OptimizerConfig {
    /// Validate the configuration.
    ///
    /// Violations are surfaced, never clamped or corrected.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.time_steps == 0 {
            return Err(ConfigError::InvalidTimeSteps);
        }
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return Err(ConfigError::InvalidDt(self.dt));
        }
        if !(self.selection_ratio > 0.0 && self.selection_ratio <= 1.0) {
            return Err(ConfigError::InvalidSelectionRatio(self.selection_ratio));
        }
        Ok(())
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            time_steps: 48,
            dt: 0.05,
            laplacian_weight: 1.0,
            harmony_weight: 1.0,
            veil_weight: 0.35,
            preference_weight: 0.5,
            selection_ratio: 0.25,
        }
    }
}

/// Optional caller-supplied context for one sector.
#[derive(Debug, Clone, Default)]
pub struct ExtraContext {
    /// Per-node preference. Higher preference lowers a node's energy
    /// and raises its eventual probability. Length must equal the
    /// sector's node count.
    pub preference_vector: Option<DVector<f64>>,
    /// Arbitrary penalty matrix added to the Hamiltonian unweighted.
    /// Shape must equal the adjacency shape.
    pub penalty_matrix: Option<DMatrix<f64>>,
}

/// Quantum-walk optimizer for single sectors.
///
/// Holds only validated configuration and no per-call state; all methods
/// take `&self`, so one optimizer is safely reused across concurrent
/// sector tasks.
#[derive(Debug, Clone)]
pub struct SectorOptimizer {
    config: OptimizerConfig,
}

impl SectorOptimizer {
    /// Create an optimizer from a validated configuration.
    pub fn new(config: OptimizerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the active configuration.
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Optimize one sector.
    ///
    /// `veil` must align with `sector.nodes`; `graph` must have been
    /// built over the same node order. Shape violations, out-of-range
    /// harmony indices, and numerical collapse are surfaced as
    /// [`OptimizeError`].
    pub fn optimize_sector(
        &self,
        sector: &SectorConfig,
        graph: &SectorGraph,
        veil: &[f64],
        extra: Option<&ExtraContext>,
    ) -> Result<OptimizationResult, OptimizeError> {
        let node_count = sector.nodes.len();
        if node_count == 0 {
            return Err(OptimizeError::EmptySector {
                sector_id: sector.sector_id,
            });
        }
        if graph.adjacency.nrows() != node_count || graph.adjacency.ncols() != node_count {
            return Err(OptimizeError::AdjacencyShape {
                expected: node_count,
                rows: graph.adjacency.nrows(),
                cols: graph.adjacency.ncols(),
            });
        }
        if veil.len() != node_count {
            return Err(OptimizeError::VeilLength {
                expected: node_count,
                got: veil.len(),
            });
        }

        let h = hamiltonian::build(&self.config, &graph.adjacency, &graph.harmonies, veil, extra)?;
        let operator = evolution::evolution_operator(&h, self.config.dt);
        let psi = evolution::evolve(&operator, node_count, self.config.time_steps)?;

        // |ψ_k|², renormalized against accumulated floating-point drift.
        let raw: Vec<f64> = psi.iter().map(|amp| amp.norm_sqr()).collect();
        let total: f64 = raw.iter().sum();
        let probabilities: Vec<f64> = raw.iter().map(|p| p / total).collect();

        let threshold = selection_threshold(&probabilities, self.config.selection_ratio);
        let selected_nodes = sector
            .nodes
            .iter()
            .zip(&probabilities)
            .filter(|(_, &p)| p >= threshold)
            .map(|(node, _)| node.id.clone())
            .collect();

        let node_probabilities: BTreeMap<_, _> = sector
            .nodes
            .iter()
            .zip(&probabilities)
            .map(|(node, &p)| (node.id.clone(), p))
            .collect();

        Ok(OptimizationResult {
            sector_id: sector.sector_id,
            node_probabilities,
            selected_nodes,
            wavefunction: psi.iter().copied().collect(),
        })
    }
}

/// Probability cutoff for selection.
///
/// The cutoff is the c-th largest probability, c = max(1,
/// ceil(n · ratio)) capped at n. Callers select every node at or above
/// it, so ties at the cutoff are never arbitrarily broken and the
/// selected set may exceed c.
fn selection_threshold(probabilities: &[f64], selection_ratio: f64) -> f64 {
    let n = probabilities.len();
    let count = ((n as f64 * selection_ratio).ceil() as usize).clamp(1, n);

    let mut sorted = probabilities.to_vec();
    sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    sorted[count - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FixtureNode, FixtureType, NodeId, SectorBounds};

    fn make_sector(nodes: Vec<FixtureNode>) -> SectorConfig {
        SectorConfig {
            sector_id: 0,
            nodes,
            boundary_ids: vec![],
            bounds: SectorBounds::new(0.0, 0.0, 100.0, 100.0),
        }
    }

    fn disconnected_graph(n: usize) -> SectorGraph {
        SectorGraph {
            adjacency: DMatrix::zeros(n, n),
            harmonies: BTreeMap::new(),
        }
    }

    fn optimizer() -> SectorOptimizer {
        SectorOptimizer::new(OptimizerConfig::default()).unwrap()
    }

    #[test]
    fn test_single_node_certainty() {
        let sector = make_sector(vec![FixtureNode::new("only", 0.0, 0.0, FixtureType::Socket)]);
        let result = optimizer()
            .optimize_sector(&sector, &disconnected_graph(1), &[1.0], None)
            .unwrap();

        let p = result.node_probabilities[&NodeId::from("only")];
        assert!((p - 1.0).abs() < 1e-9);
        assert_eq!(result.selected_nodes, vec![NodeId::from("only")]);
    }

    #[test]
    fn test_zero_hamiltonian_stays_uniform() {
        // Disconnected nodes, no harmony, full visibility: H is
        // identically zero and the uniform state is stationary.
        let nodes: Vec<FixtureNode> = (0..4)
            .map(|i| FixtureNode::new(format!("n{i}"), i as f64 * 30.0, 0.0, FixtureType::Generic))
            .collect();
        let sector = make_sector(nodes);
        let result = optimizer()
            .optimize_sector(&sector, &disconnected_graph(4), &[1.0; 4], None)
            .unwrap();

        for p in result.node_probabilities.values() {
            assert!((p - 0.25).abs() < 1e-9);
        }
        // ceil(4 * 0.25) = 1, but the four-way tie keeps all of them.
        assert_eq!(result.selected_nodes.len(), 4);
    }

    #[test]
    fn test_veiled_node_loses_probability() {
        let nodes = vec![
            FixtureNode::new("visible", 0.0, 0.0, FixtureType::Socket),
            FixtureNode::new("veiled", 1.0, 0.0, FixtureType::Socket),
        ];
        let sector = make_sector(nodes);

        let mut adjacency = DMatrix::zeros(2, 2);
        adjacency[(0, 1)] = 1.0;
        adjacency[(1, 0)] = 1.0;
        let mut harmonies = BTreeMap::new();
        harmonies.insert((0, 1), -0.9);
        let graph = SectorGraph {
            adjacency,
            harmonies,
        };

        let result = optimizer()
            .optimize_sector(&sector, &graph, &[1.0, 0.0], None)
            .unwrap();

        let visible = result.node_probabilities[&NodeId::from("visible")];
        let veiled = result.node_probabilities[&NodeId::from("veiled")];
        assert!(
            veiled < visible,
            "veiled node must end below the visible one ({veiled} vs {visible})"
        );
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let nodes: Vec<FixtureNode> = (0..7)
            .map(|i| FixtureNode::new(format!("n{i}"), i as f64, (i * i) as f64, FixtureType::Light))
            .collect();
        let sector = make_sector(nodes);
        let partitioner =
            crate::partition::SectorPartitioner::new(crate::partition::PartitionConfig::default())
                .unwrap();
        let graph = partitioner.build_sector_graph(&sector);

        let result = optimizer()
            .optimize_sector(&sector, &graph, &[1.0; 7], None)
            .unwrap();

        let total: f64 = result.node_probabilities.values().sum();
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_preference_raises_probability() {
        // Preference only redistributes probability through coupling, so
        // the pair must be connected.
        let nodes = vec![
            FixtureNode::new("plain", 0.0, 0.0, FixtureType::Generic),
            FixtureNode::new("preferred", 1.0, 0.0, FixtureType::Generic),
        ];
        let sector = make_sector(nodes);
        let mut adjacency = DMatrix::zeros(2, 2);
        adjacency[(0, 1)] = 1.0;
        adjacency[(1, 0)] = 1.0;
        let graph = SectorGraph {
            adjacency,
            harmonies: BTreeMap::new(),
        };
        let extra = ExtraContext {
            preference_vector: Some(DVector::from_vec(vec![0.0, 2.0])),
            penalty_matrix: None,
        };

        let result = optimizer()
            .optimize_sector(&sector, &graph, &[1.0, 1.0], Some(&extra))
            .unwrap();

        let plain = result.node_probabilities[&NodeId::from("plain")];
        let preferred = result.node_probabilities[&NodeId::from("preferred")];
        assert!(preferred > plain);
    }

    #[test]
    fn test_empty_sector_rejected() {
        let sector = make_sector(vec![]);
        let err = optimizer()
            .optimize_sector(&sector, &disconnected_graph(0), &[], None)
            .unwrap_err();
        assert!(matches!(err, OptimizeError::EmptySector { sector_id: 0 }));
    }

    #[test]
    fn test_shape_mismatches_rejected() {
        let sector = make_sector(vec![FixtureNode::new("a", 0.0, 0.0, FixtureType::Generic)]);

        let err = optimizer()
            .optimize_sector(&sector, &disconnected_graph(2), &[1.0], None)
            .unwrap_err();
        assert!(matches!(err, OptimizeError::AdjacencyShape { expected: 1, .. }));

        let err = optimizer()
            .optimize_sector(&sector, &disconnected_graph(1), &[1.0, 1.0], None)
            .unwrap_err();
        assert!(matches!(err, OptimizeError::VeilLength { expected: 1, got: 2 }));
    }

    #[test]
    fn test_extra_context_shapes_rejected() {
        let sector = make_sector(vec![FixtureNode::new("a", 0.0, 0.0, FixtureType::Generic)]);

        let bad_pref = ExtraContext {
            preference_vector: Some(DVector::from_vec(vec![1.0, 2.0])),
            penalty_matrix: None,
        };
        let err = optimizer()
            .optimize_sector(&sector, &disconnected_graph(1), &[1.0], Some(&bad_pref))
            .unwrap_err();
        assert!(matches!(err, OptimizeError::PreferenceLength { expected: 1, got: 2 }));

        let bad_penalty = ExtraContext {
            preference_vector: None,
            penalty_matrix: Some(DMatrix::zeros(3, 3)),
        };
        let err = optimizer()
            .optimize_sector(&sector, &disconnected_graph(1), &[1.0], Some(&bad_penalty))
            .unwrap_err();
        assert!(matches!(err, OptimizeError::PenaltyShape { expected: 1, .. }));
    }

    #[test]
    fn test_harmony_index_out_of_range() {
        let sector = make_sector(vec![
            FixtureNode::new("a", 0.0, 0.0, FixtureType::Generic),
            FixtureNode::new("b", 1.0, 0.0, FixtureType::Generic),
        ]);
        let mut harmonies = BTreeMap::new();
        harmonies.insert((0, 5), -0.4);
        let graph = SectorGraph {
            adjacency: DMatrix::zeros(2, 2),
            harmonies,
        };

        let err = optimizer()
            .optimize_sector(&sector, &graph, &[1.0, 1.0], None)
            .unwrap_err();
        assert!(matches!(
            err,
            OptimizeError::HarmonyIndex { i: 0, j: 5, node_count: 2 }
        ));
    }

    #[test]
    fn test_selection_threshold_tie_inclusive() {
        let probabilities = vec![0.25, 0.25, 0.25, 0.25];
        let threshold = selection_threshold(&probabilities, 0.25);
        assert_eq!(threshold, 0.25);
        assert_eq!(probabilities.iter().filter(|&&p| p >= threshold).count(), 4);
    }

    #[test]
    fn test_selection_count_bounds() {
        let probabilities = vec![0.4, 0.3, 0.2, 0.1];
        let threshold = selection_threshold(&probabilities, 0.5);
        let selected = probabilities.iter().filter(|&&p| p >= threshold).count();
        assert_eq!(selected, 2);

        // Ratio of 1 selects everything.
        let threshold = selection_threshold(&probabilities, 1.0);
        let selected = probabilities.iter().filter(|&&p| p >= threshold).count();
        assert_eq!(selected, 4);
    }

    #[test]
    fn test_config_validation() {
        let bad_steps = OptimizerConfig {
            time_steps: 0,
            ..OptimizerConfig::default()
        };
        assert!(matches!(
            SectorOptimizer::new(bad_steps),
            Err(ConfigError::InvalidTimeSteps)
        ));

        let bad_dt = OptimizerConfig {
            dt: 0.0,
            ..OptimizerConfig::default()
        };
        assert!(matches!(SectorOptimizer::new(bad_dt), Err(ConfigError::InvalidDt(_))));

        let bad_ratio = OptimizerConfig {
            selection_ratio: 1.5,
            ..OptimizerConfig::default()
        };
        assert!(matches!(
            SectorOptimizer::new(bad_ratio),
            Err(ConfigError::InvalidSelectionRatio(_))
        ));
    }

    #[test]
    fn test_determinism_across_runs() {
        let nodes: Vec<FixtureNode> = (0..6)
            .map(|i| {
                FixtureNode::new(
                    format!("n{i}"),
                    (i as f64 * 2.5).sin() * 20.0 + 20.0,
                    (i as f64 * 1.7).cos() * 20.0 + 20.0,
                    if i % 2 == 0 { FixtureType::Socket } else { FixtureType::Switch },
                )
            })
            .collect();
        let sector = make_sector(nodes);
        let partitioner =
            crate::partition::SectorPartitioner::new(crate::partition::PartitionConfig::default())
                .unwrap();
        let graph = partitioner.build_sector_graph(&sector);
        let opt = optimizer();

        let first = opt
            .optimize_sector(&sector, &graph, &[1.0; 6], None)
            .unwrap();
        for _ in 0..10 {
            let again = opt
                .optimize_sector(&sector, &graph, &[1.0; 6], None)
                .unwrap();
            assert_eq!(first.fingerprint(), again.fingerprint());
            for (id, p) in &first.node_probabilities {
                assert_eq!(*p, again.node_probabilities[id]);
            }
        }
    }
}
