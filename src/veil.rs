//! Layer veiling: per-node visibility weights from a trade-layer profile.
//!
//! A veil factor is a weight in `[0, 1]` expressing how visible a fixture
//! is under the active layer profile. Low factors raise a node's energy
//! penalty in the Hamiltonian, biasing selection probability away from it
//! without removing it from the graph.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{FixtureNode, FixtureType};

/// Visibility weight for fixtures outside a single-trade profile.
const DAMPENED_VISIBILITY: f64 = 0.05;

/// Layer visibility presets.
///
/// The set is closed and matched exhaustively; unrecognized profile tags
/// fall back to [`LayerProfile::AllLayers`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerProfile {
    /// Every fixture fully visible.
    AllLayers,
    /// Electrical trade only; everything else dampened.
    ElectricalOnly,
    /// HVAC trade only; everything else dampened.
    HvacOnly,
    /// Structural trade only; everything else dampened.
    StructuralOnly,
    /// Combined electrical and HVAC view.
    ElectricalHvac,
    /// Mechanical systems view (HVAC, piping, structure).
    Mechanical,
}

impl LayerProfile {
    /// Parse a profile from its tag.
    ///
    /// Total: unrecognized tags fall back to `AllLayers`.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "electrical_only" => Self::ElectricalOnly,
            "hvac_only" => Self::HvacOnly,
            "structural_only" => Self::StructuralOnly,
            "electrical_hvac" => Self::ElectricalHvac,
            "mechanical" => Self::Mechanical,
            _ => Self::AllLayers,
        }
    }

    /// Visibility weight for a fixture type under this profile.
    ///
    /// Pure function of its inputs; exhaustive over both enums.
    pub fn weight(self, fixture_type: FixtureType) -> f64 {
        match self {
            Self::AllLayers => 1.0,
            Self::ElectricalOnly => {
                if fixture_type.is_electrical() {
                    1.0
                } else {
                    DAMPENED_VISIBILITY
                }
            }
            Self::HvacOnly => {
                if fixture_type.is_hvac() {
                    1.0
                } else {
                    DAMPENED_VISIBILITY
                }
            }
            Self::StructuralOnly => {
                if fixture_type.is_structural() {
                    1.0
                } else {
                    DAMPENED_VISIBILITY
                }
            }
            Self::ElectricalHvac => {
                if fixture_type.is_electrical() {
                    0.8
                } else if fixture_type.is_hvac() {
                    0.7
                } else {
                    0.2
                }
            }
            Self::Mechanical => {
                if fixture_type.is_mechanical() {
                    0.9
                } else {
                    0.3
                }
            }
        }
    }
}

impl Default for LayerProfile {
    fn default() -> Self {
        Self::AllLayers
    }
}

impl fmt::Display for LayerProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllLayers => write!(f, "all_layers"),
            Self::ElectricalOnly => write!(f, "electrical_only"),
            Self::HvacOnly => write!(f, "hvac_only"),
            Self::StructuralOnly => write!(f, "structural_only"),
            Self::ElectricalHvac => write!(f, "electrical_hvac"),
            Self::Mechanical => write!(f, "mechanical"),
        }
    }
}

// Serialized as the snake_case tag; deserialization reuses the total
// parse, so unknown tags fall back to all_layers instead of erroring.
impl Serialize for LayerProfile {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LayerProfile {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::parse(&tag))
    }
}

/// Compute the veil factor vector for a node list under a profile.
///
/// Pure and stateless. Output length and order match `nodes`; empty
/// input yields an empty vector.
pub fn veil_factors(nodes: &[FixtureNode], profile: LayerProfile) -> Vec<f64> {
    nodes
        .iter()
        .map(|node| profile.weight(node.fixture_type))
        .collect()
}
