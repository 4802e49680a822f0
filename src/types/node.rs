//! Fixture node types for the blueprint kernel.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Unique identifier for a fixture candidate on the blueprint.
///
/// Wraps the opaque string id assigned by the upstream extraction stage
/// and implements `Ord` for deterministic ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a new NodeId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Category of a fixture candidate.
///
/// The set is closed: tags the extraction stage cannot classify degrade
/// to [`FixtureType::Generic`] rather than failing the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixtureType {
    /// Electrical socket.
    Socket,
    /// Electrical switch.
    Switch,
    /// Light fitting.
    Light,
    /// Electrical outlet.
    Outlet,
    /// HVAC vent.
    Vent,
    /// HVAC duct segment.
    Duct,
    /// Plumbing or mechanical pipe.
    Pipe,
    /// Structural beam.
    Beam,
    /// Unclassified fixture.
    Generic,
}

impl FixtureType {
    /// Parse a fixture type from its tag.
    ///
    /// Total: unrecognized tags map to `Generic`, never an error.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "socket" => Self::Socket,
            "switch" => Self::Switch,
            "light" => Self::Light,
            "outlet" => Self::Outlet,
            "vent" => Self::Vent,
            "duct" => Self::Duct,
            "pipe" => Self::Pipe,
            "beam" => Self::Beam,
            _ => Self::Generic,
        }
    }

    /// Whether this type belongs to the electrical trade layer.
    pub fn is_electrical(self) -> bool {
        matches!(self, Self::Socket | Self::Switch | Self::Light | Self::Outlet)
    }

    /// Whether this type belongs to the HVAC trade layer.
    pub fn is_hvac(self) -> bool {
        matches!(self, Self::Vent | Self::Duct)
    }

    /// Whether this type belongs to the structural trade layer.
    pub fn is_structural(self) -> bool {
        matches!(self, Self::Beam)
    }

    /// Whether this type belongs to the mechanical trade layer.
    pub fn is_mechanical(self) -> bool {
        matches!(self, Self::Vent | Self::Duct | Self::Pipe | Self::Beam)
    }
}

impl Default for FixtureType {
    fn default() -> Self {
        Self::Generic
    }
}

impl fmt::Display for FixtureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Socket => write!(f, "socket"),
            Self::Switch => write!(f, "switch"),
            Self::Light => write!(f, "light"),
            Self::Outlet => write!(f, "outlet"),
            Self::Vent => write!(f, "vent"),
            Self::Duct => write!(f, "duct"),
            Self::Pipe => write!(f, "pipe"),
            Self::Beam => write!(f, "beam"),
            Self::Generic => write!(f, "generic"),
        }
    }
}

// Serialized as the lowercase tag; deserialization reuses the total
// parse, so unknown tags degrade to Generic instead of erroring.
impl Serialize for FixtureType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FixtureType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::parse(&tag))
    }
}

/// 2D position on the blueprint, in drawing units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Position {
    /// Create a new position.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another position.
    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A single fixture candidate on the blueprint.
///
/// Nodes are created by the upstream extraction stage and are read-only
/// inside the kernel. Positions are finite 2D coordinates; ids are unique
/// across the input set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureNode {
    /// Unique node id.
    pub id: NodeId,
    /// Position on the blueprint.
    pub position: Position,
    /// Fixture category.
    pub fixture_type: FixtureType,
    /// Optional extraction attributes (confidence, area, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<BTreeMap<String, f64>>,
}

impl FixtureNode {
    /// Create a new fixture node without attributes.
    pub fn new(id: impl Into<NodeId>, x: f64, y: f64, fixture_type: FixtureType) -> Self {
        Self {
            id: id.into(),
            position: Position::new(x, y),
            fixture_type,
            attributes: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_types() {
        assert_eq!(FixtureType::parse("socket"), FixtureType::Socket);
        assert_eq!(FixtureType::parse("BEAM"), FixtureType::Beam);
        assert_eq!(FixtureType::parse("Vent"), FixtureType::Vent);
    }

    #[test]
    fn test_parse_unknown_degrades_to_generic() {
        assert_eq!(FixtureType::parse("sprinkler"), FixtureType::Generic);
        assert_eq!(FixtureType::parse(""), FixtureType::Generic);
    }

    #[test]
    fn test_serde_unknown_tag_degrades_to_generic() {
        let t: FixtureType = serde_json::from_str("\"sprinkler\"").unwrap();
        assert_eq!(t, FixtureType::Generic);
    }

    #[test]
    fn test_layer_membership() {
        assert!(FixtureType::Outlet.is_electrical());
        assert!(FixtureType::Duct.is_hvac());
        assert!(FixtureType::Beam.is_structural());
        assert!(FixtureType::Pipe.is_mechanical());
        assert!(!FixtureType::Generic.is_electrical());
        assert!(!FixtureType::Light.is_mechanical());
    }

    #[test]
    fn test_distance() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(3.0, 4.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-12);
    }
}
