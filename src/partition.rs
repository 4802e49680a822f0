//! Spatial sector partitioning and proximity-graph construction.
//!
//! The partitioner divides the blueprint's bounding box into a fixed grid
//! of cells and turns each populated, within-capacity cell into a
//! [`SectorConfig`]. Sectoring exists to bound per-unit cost: evolution
//! cost grows faster than linearly with node count, so many small sectors
//! beat one global system.
//!
//! ## Cell assignment
//!
//! Cells are half-open `[x1, x2) × [y1, y2)` intervals. Assignment is by
//! clamped cell index, which closes the outer edge of the last row and
//! column: a node sitting exactly on the global maximum boundary belongs
//! to the last cell rather than to none.
//!
//! ## Capacity drops
//!
//! Cells whose population exceeds `max_nodes_per_sector` are dropped
//! entirely — not split, not truncated. The drop is accounting, not an
//! error: [`PartitionOutcome::dropped`] records every dropped cell.
//! TODO: make the over-capacity policy configurable (subdivide or
//! truncate) once a downstream consumer needs it.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{FixtureNode, FixtureType, NodeId, SectorBounds, SectorConfig};

/// Error type for partition configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum PartitionConfigError {
    /// Sector capacity must be positive.
    #[error("max_nodes_per_sector must be greater than zero")]
    InvalidCapacity,
    /// Grid must have at least one row and one column.
    #[error("sector grid must be at least 1x1, got {rows}x{cols}")]
    InvalidGrid {
        /// Configured rows.
        rows: usize,
        /// Configured columns.
        cols: usize,
    },
    /// Connection threshold must be positive and finite.
    #[error("connection_threshold must be positive and finite, got {0}")]
    InvalidThreshold(f64),
    /// Boundary margin must lie in [0, 0.5).
    #[error("boundary_margin must be in [0, 0.5), got {0}")]
    InvalidMargin(f64),
}

/// Partitioner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionConfig {
    /// Maximum nodes a cell may hold before it is dropped.
    pub max_nodes_per_sector: usize,
    /// Grid rows.
    pub grid_rows: usize,
    /// Grid columns.
    pub grid_cols: usize,
    /// Two nodes closer than this distance (drawing units) are connected.
    pub connection_threshold: f64,
    /// Fraction of a cell's extent that counts as its boundary band.
    pub boundary_margin: f64,
}

impl PartitionConfig {
    /// Validate the configuration.
    ///
    /// Violations are surfaced, never clamped or corrected.
    pub fn validate(&self) -> Result<(), PartitionConfigError> {
        if self.max_nodes_per_sector == 0 {
            return Err(PartitionConfigError::InvalidCapacity);
        }
        if self.grid_rows == 0 || self.grid_cols == 0 {
            return Err(PartitionConfigError::InvalidGrid {
                rows: self.grid_rows,
                cols: self.grid_cols,
            });
        }
        if !(self.connection_threshold > 0.0 && self.connection_threshold.is_finite()) {
            return Err(PartitionConfigError::InvalidThreshold(self.connection_threshold));
        }
        if !(0.0..0.5).contains(&self.boundary_margin) {
            return Err(PartitionConfigError::InvalidMargin(self.boundary_margin));
        }
        Ok(())
    }
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            max_nodes_per_sector: 512,
            grid_rows: 4,
            grid_cols: 4,
            connection_threshold: 10.0,
            boundary_margin: 0.1,
        }
    }
}

/// A grid cell excluded from the output for exceeding capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedCell {
    /// Grid row of the dropped cell.
    pub row: usize,
    /// Grid column of the dropped cell.
    pub col: usize,
    /// How many nodes the cell held.
    pub node_count: usize,
}

/// Result of partitioning a node set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionOutcome {
    /// Kept sectors, sector ids dense in row-major order.
    pub sectors: Vec<SectorConfig>,
    /// Cells dropped for exceeding capacity.
    pub dropped: Vec<DroppedCell>,
    /// Total nodes in the input.
    pub total_nodes: usize,
}

impl PartitionOutcome {
    /// Nodes carried by the kept sectors.
    pub fn assigned_nodes(&self) -> usize {
        self.sectors.iter().map(|s| s.nodes.len()).sum()
    }

    /// Nodes lost to capacity drops.
    pub fn dropped_nodes(&self) -> usize {
        self.dropped.iter().map(|d| d.node_count).sum()
    }
}

/// Proximity graph of one sector.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorGraph {
    /// Symmetric 0/1 adjacency with zero diagonal. Entry (i, j) is 1 iff
    /// the Euclidean distance between nodes i and j is strictly below
    /// the connection threshold.
    pub adjacency: DMatrix<f64>,
    /// Harmony weights keyed by unordered index pair (i < j). Only
    /// nonzero values are present.
    pub harmonies: BTreeMap<(usize, usize), f64>,
}

/// Pairwise compatibility weight between two fixture types at a distance.
///
/// Symmetric in its type arguments: `fixture_harmony(a, b, d) ==
/// fixture_harmony(b, a, d)` for every pair. Negative values encode
/// attraction (the pair is favored for joint retention); zero is neutral
/// and omitted from the harmony map.
pub fn fixture_harmony(a: FixtureType, b: FixtureType, distance: f64) -> f64 {
    let pair_matches = |x: FixtureType, y: FixtureType| (a == x && b == y) || (a == y && b == x);

    if pair_matches(FixtureType::Socket, FixtureType::Switch) {
        return -0.5 / (1.0 + distance * 0.1);
    }
    if pair_matches(FixtureType::Vent, FixtureType::Duct) {
        return -0.8 / (1.0 + distance * 0.1);
    }
    if a == FixtureType::Beam && b == FixtureType::Beam {
        return -0.3 / (1.0 + distance * 0.1);
    }
    if distance < 3.0 {
        return -0.2;
    }
    0.0
}

/// Grid partitioner for blueprint node sets.
///
/// Holds only validated configuration; all methods take `&self` and share
/// no mutable state, so one partitioner may serve concurrent callers.
#[derive(Debug, Clone)]
pub struct SectorPartitioner {
    config: PartitionConfig,
}

impl SectorPartitioner {
    /// Create a partitioner from a validated configuration.
    pub fn new(config: PartitionConfig) -> Result<Self, PartitionConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the active configuration.
    pub fn config(&self) -> &PartitionConfig {
        &self.config
    }

    /// Partition a node list into grid sectors.
    ///
    /// Every input node lands in exactly one cell. Empty cells emit no
    /// sector; over-capacity cells are dropped and recorded. Sector ids
    /// are assigned sequentially over kept sectors in row-major
    /// traversal order, so they are dense but do not encode grid
    /// coordinates.
    pub fn create_sectors(&self, nodes: &[FixtureNode]) -> PartitionOutcome {
        let total_nodes = nodes.len();
        if nodes.is_empty() {
            return PartitionOutcome {
                sectors: Vec::new(),
                dropped: Vec::new(),
                total_nodes,
            };
        }

        let rows = self.config.grid_rows;
        let cols = self.config.grid_cols;

        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for node in nodes {
            min_x = min_x.min(node.position.x);
            min_y = min_y.min(node.position.y);
            max_x = max_x.max(node.position.x);
            max_y = max_y.max(node.position.y);
        }

        let span_x = max_x - min_x;
        let span_y = max_y - min_y;
        let cell_width = span_x / cols as f64;
        let cell_height = span_y / rows as f64;

        // Clamped index assignment: the global max edge folds into the
        // last row/column, and a zero-span axis collapses to index 0.
        let cell_index = |value: f64, min: f64, span: f64, count: usize| -> usize {
            let idx = if span > 0.0 {
                (((value - min) / span) * count as f64).floor() as usize
            } else {
                0
            };
            idx.min(count - 1)
        };

        let mut cells: Vec<Vec<FixtureNode>> = vec![Vec::new(); rows * cols];
        for node in nodes {
            let col = cell_index(node.position.x, min_x, span_x, cols);
            let row = cell_index(node.position.y, min_y, span_y, rows);
            cells[row * cols + col].push(node.clone());
        }

        let mut sectors = Vec::new();
        let mut dropped = Vec::new();
        let mut sector_id: u32 = 0;

        for row in 0..rows {
            for col in 0..cols {
                let cell_nodes = std::mem::take(&mut cells[row * cols + col]);
                if cell_nodes.is_empty() {
                    continue;
                }
                if cell_nodes.len() > self.config.max_nodes_per_sector {
                    tracing::warn!(
                        row,
                        col,
                        node_count = cell_nodes.len(),
                        capacity = self.config.max_nodes_per_sector,
                        "dropping over-capacity cell"
                    );
                    dropped.push(DroppedCell {
                        row,
                        col,
                        node_count: cell_nodes.len(),
                    });
                    continue;
                }

                let bounds = SectorBounds::new(
                    min_x + col as f64 * cell_width,
                    min_y + row as f64 * cell_height,
                    min_x + (col + 1) as f64 * cell_width,
                    min_y + (row + 1) as f64 * cell_height,
                );
                let boundary_ids = self.boundary_ids(&cell_nodes, &bounds);

                sectors.push(SectorConfig {
                    sector_id,
                    nodes: cell_nodes,
                    boundary_ids,
                    bounds,
                });
                sector_id += 1;
            }
        }

        let outcome = PartitionOutcome {
            sectors,
            dropped,
            total_nodes,
        };
        tracing::debug!(
            total_nodes,
            sectors = outcome.sectors.len(),
            dropped_cells = outcome.dropped.len(),
            dropped_nodes = outcome.dropped_nodes(),
            "partitioned node set"
        );
        outcome
    }

    /// Ids of nodes inside the margin band along any of the four edges.
    ///
    /// Computed and carried for downstream reconciliation; nothing in
    /// this crate consumes the set.
    fn boundary_ids(&self, nodes: &[FixtureNode], bounds: &SectorBounds) -> Vec<NodeId> {
        let margin_x = self.config.boundary_margin * bounds.width();
        let margin_y = self.config.boundary_margin * bounds.height();

        nodes
            .iter()
            .filter(|node| {
                node.position.x < bounds.x1 + margin_x
                    || node.position.x > bounds.x2 - margin_x
                    || node.position.y < bounds.y1 + margin_y
                    || node.position.y > bounds.y2 - margin_y
            })
            .map(|node| node.id.clone())
            .collect()
    }

    /// Build the proximity graph of one sector.
    ///
    /// Produces the symmetric adjacency matrix and the harmony map over
    /// unordered index pairs, both in the sector's node order.
    pub fn build_sector_graph(&self, sector: &SectorConfig) -> SectorGraph {
        let n = sector.nodes.len();
        let mut adjacency = DMatrix::zeros(n, n);
        let mut harmonies = BTreeMap::new();

        for i in 0..n {
            for j in (i + 1)..n {
                let distance = sector.nodes[i]
                    .position
                    .distance_to(&sector.nodes[j].position);
                if distance >= self.config.connection_threshold {
                    continue;
                }

                adjacency[(i, j)] = 1.0;
                adjacency[(j, i)] = 1.0;

                let harmony = fixture_harmony(
                    sector.nodes[i].fixture_type,
                    sector.nodes[j].fixture_type,
                    distance,
                );
                if harmony != 0.0 {
                    harmonies.insert((i, j), harmony);
                }
            }
        }

        SectorGraph {
            adjacency,
            harmonies,
        }
    }
}
