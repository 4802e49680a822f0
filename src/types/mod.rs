//! Core types for the blueprint kernel.

pub mod node;
pub mod result;
pub mod sector;

pub use node::{FixtureNode, FixtureType, NodeId, Position};
pub use result::OptimizationResult;
pub use sector::{SectorBounds, SectorConfig};
