//! Parallel sector optimization.
//!
//! Fans independent sector tasks out across a bounded worker pool and
//! aggregates per-sector outcomes. Tasks share no mutable state: each
//! owns its sector snapshot, graph, and veil vector, so no locks are
//! involved and completion order carries no meaning. Partial failure is
//! a first-class outcome — one failing sector never blocks, corrupts, or
//! discards the results of the others.

use rayon::prelude::*;
use serde::Serialize;

use crate::optimizer::{ExtraContext, OptimizeError, SectorOptimizer};
use crate::partition::{DroppedCell, SectorPartitioner};
use crate::types::{FixtureNode, OptimizationResult, SectorConfig};
use crate::veil::{veil_factors, LayerProfile};

/// Error type for batch processor construction.
#[derive(Debug, thiserror::Error)]
pub enum BatchConfigError {
    /// The dedicated worker pool could not be built.
    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// One unit of batch work: a sector plus its optimization context.
#[derive(Debug, Clone)]
pub struct SectorTask {
    /// Sector to optimize.
    pub sector: SectorConfig,
    /// Layer profile for veil computation.
    pub profile: LayerProfile,
    /// Optional caller preferences and penalties.
    pub extra: Option<ExtraContext>,
}

impl SectorTask {
    /// Create a task without extra context.
    pub fn new(sector: SectorConfig, profile: LayerProfile) -> Self {
        Self {
            sector,
            profile,
            extra: None,
        }
    }
}

/// A sector whose optimization failed.
#[derive(Debug)]
pub struct SectorFailure {
    /// The failed sector.
    pub sector_id: u32,
    /// Why it failed.
    pub error: OptimizeError,
}

/// Aggregate outcome of a batch run.
///
/// Contains exactly one entry — a result or a failure — per submitted
/// task, each list sorted by sector id for deterministic reporting.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Successfully optimized sectors.
    pub results: Vec<OptimizationResult>,
    /// Sectors that failed, with their errors.
    pub failures: Vec<SectorFailure>,
}

impl BatchOutcome {
    /// Whether every task succeeded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Result for a sector, if it succeeded.
    pub fn result_for(&self, sector_id: u32) -> Option<&OptimizationResult> {
        self.results.iter().find(|r| r.sector_id == sector_id)
    }
}

/// End-to-end outcome of optimizing a full blueprint.
///
/// Capacity drops and optimization failures are reported distinctly:
/// dropped cells never became sectors, failed sectors did but could not
/// be optimized. Downstream consumers must tolerate a result set
/// covering fewer nodes than the input.
#[derive(Debug)]
pub struct BlueprintReport {
    /// Total nodes in the input.
    pub total_nodes: usize,
    /// Cells dropped by the partitioner for exceeding capacity.
    pub dropped: Vec<DroppedCell>,
    /// Successfully optimized sectors.
    pub results: Vec<OptimizationResult>,
    /// Sectors that failed optimization.
    pub failures: Vec<SectorFailure>,
}

/// Partition-then-optimize pipeline over a bounded worker pool.
///
/// Explicitly constructed and explicitly scoped: the processor owns its
/// partitioner, optimizer, and (optionally) a dedicated worker pool, and
/// is passed by reference into the pipeline by its owner. It holds no
/// per-call mutable state, so concurrent reuse is safe.
pub struct SectorProcessor {
    partitioner: SectorPartitioner,
    optimizer: SectorOptimizer,
    pool: Option<rayon::ThreadPool>,
}

impl SectorProcessor {
    /// Create a processor that shares the global worker pool.
    pub fn new(partitioner: SectorPartitioner, optimizer: SectorOptimizer) -> Self {
        Self {
            partitioner,
            optimizer,
            pool: None,
        }
    }

    /// Create a processor with a dedicated pool of `max_workers` threads.
    pub fn with_max_workers(
        partitioner: SectorPartitioner,
        optimizer: SectorOptimizer,
        max_workers: usize,
    ) -> Result<Self, BatchConfigError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(max_workers)
            .build()?;
        Ok(Self {
            partitioner,
            optimizer,
            pool: Some(pool),
        })
    }

    /// Get the partitioner.
    pub fn partitioner(&self) -> &SectorPartitioner {
        &self.partitioner
    }

    /// Get the optimizer.
    pub fn optimizer(&self) -> &SectorOptimizer {
        &self.optimizer
    }

    /// Optimize a single sector task.
    ///
    /// Synchronous and suspension-free: veil factors and the proximity
    /// graph are derived here, then the optimizer runs to completion.
    pub fn optimize_sector(&self, task: &SectorTask) -> Result<OptimizationResult, OptimizeError> {
        let veil = veil_factors(&task.sector.nodes, task.profile);
        let graph = self.partitioner.build_sector_graph(&task.sector);
        self.optimizer
            .optimize_sector(&task.sector, &graph, &veil, task.extra.as_ref())
    }

    /// Optimize a set of sector tasks in parallel.
    ///
    /// All tasks run to completion (or failure) before this returns; no
    /// ordering is assumed among completions. The outcome lists are
    /// sorted by sector id afterwards so reports are deterministic.
    pub fn optimize_sectors(&self, tasks: &[SectorTask]) -> BatchOutcome {
        tracing::debug!(task_count = tasks.len(), "starting sector batch");

        let run = || {
            tasks
                .par_iter()
                .map(|task| (task.sector.sector_id, self.optimize_sector(task)))
                .collect::<Vec<_>>()
        };
        let outcomes = match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        };

        let mut results = Vec::new();
        let mut failures = Vec::new();
        for (sector_id, outcome) in outcomes {
            match outcome {
                Ok(result) => results.push(result),
                Err(error) => {
                    tracing::warn!(sector_id, error = %error, "sector optimization failed");
                    failures.push(SectorFailure { sector_id, error });
                }
            }
        }

        results.sort_by_key(|r| r.sector_id);
        failures.sort_by_key(|f| f.sector_id);

        BatchOutcome { results, failures }
    }

    /// Partition a blueprint's node set and optimize every kept sector.
    ///
    /// Capacity drops from partitioning are carried through to the
    /// report alongside per-sector optimization failures.
    pub fn optimize_blueprint(
        &self,
        nodes: &[FixtureNode],
        profile: LayerProfile,
    ) -> BlueprintReport {
        let partition = self.partitioner.create_sectors(nodes);
        let tasks: Vec<SectorTask> = partition
            .sectors
            .iter()
            .map(|sector| SectorTask::new(sector.clone(), profile))
            .collect();

        let batch = self.optimize_sectors(&tasks);

        BlueprintReport {
            total_nodes: partition.total_nodes,
            dropped: partition.dropped,
            results: batch.results,
            failures: batch.failures,
        }
    }
}

// Serialize for report consumers; failures carry error text.
impl Serialize for SectorFailure {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("SectorFailure", 2)?;
        state.serialize_field("sector_id", &self.sector_id)?;
        state.serialize_field("error", &self.error.to_string())?;
        state.end()
    }
}
