//! # blueprint-kernel
//!
//! Quantum-walk sector optimization for blueprint fixture graphs.
//!
//! The kernel answers one question:
//!
//! > Given a dense set of fixture candidates, which of them are **most
//! > likely relevant** in each region of the blueprint?
//!
//! ## Core Contract
//!
//! 1. Partition the candidate set into spatial sectors bounded by a
//!    node-count capacity
//! 2. Per sector, build a proximity graph with pairwise harmony weights
//! 3. Simulate a discretized quantum walk over the sector Hamiltonian
//!    and select the nodes whose probability clears the ratio threshold
//! 4. Run sectors in parallel, aggregating successes and failures
//!
//! ## Architecture
//!
//! ```text
//! Vec<FixtureNode> → SectorPartitioner.create_sectors → {SectorConfig}
//!                           ↓ (per sector, in parallel)
//!        veil_factors + build_sector_graph → SectorOptimizer
//!                           ↓
//!              BatchOutcome / BlueprintReport
//! ```
//!
//! ## Determinism Guarantees
//!
//! - No randomness anywhere: same nodes + same configuration → identical
//!   probabilities and identical result fingerprints
//! - Sector ids are dense in row-major grid order over kept sectors
//! - Batch reports are sorted by sector id regardless of completion order
//!
//! ## Failure Model
//!
//! Over-capacity grid cells are dropped (observable accounting, not an
//! error). Shape and index violations, and numerical collapse during
//! evolution, fail only the affected sector; the batch aggregate always
//! carries every other sector's result.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod batch;
pub mod canonical;
pub mod optimizer;
pub mod partition;
pub mod types;
pub mod veil;

// Re-exports
pub use types::{FixtureNode, FixtureType, NodeId, Position};
pub use types::{OptimizationResult, SectorBounds, SectorConfig};
pub use veil::{veil_factors, LayerProfile};
pub use partition::{
    fixture_harmony, DroppedCell, PartitionConfig, PartitionConfigError, PartitionOutcome,
    SectorGraph, SectorPartitioner,
};
pub use optimizer::{
    ConfigError, ExtraContext, OptimizeError, OptimizerConfig, SectorOptimizer,
};
pub use batch::{
    BatchConfigError, BatchOutcome, BlueprintReport, SectorFailure, SectorProcessor, SectorTask,
};
pub use canonical::{canonical_hash, canonical_hash_hex, to_canonical_bytes};

/// Schema version for all kernel types.
/// Increment on breaking changes to any schema type.
pub const KERNEL_SCHEMA_VERSION: &str = "1.0.0";
