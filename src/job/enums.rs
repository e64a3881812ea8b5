//! Enumerations carried by the job tree.
//!
//! Values the crate does not know deserialize to `Unknown` instead of
//! failing, so a newer host never breaks an older postprocessor.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ClampingCorner {
    #[default]
    FrontLeft,
    FrontRight,
    BackLeft,
    BackRight,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ClampingBodyType {
    #[default]
    Workpiece,
    WorkpieceWithOversize,
    Part,
    PartWithoutCovers,
    PartWithoutTopAndBottomCovers,
    PartWithoutSideCovers,
    WorkpieceWithMainCoversAndOversize,
    WorkpieceWithMainCovers,
    WorkpieceWithOversizeAndCalibration,
    WorkpieceWithOversizeCalibrationAndTopBottomCovers,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RotationDirection {
    #[default]
    Clockwise,
    Counterclockwise,
    #[serde(other)]
    Unknown,
}

/// How the machine picks the tool: by its code or by the hole diameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ToolIdentifiedBy {
    #[default]
    ByCode,
    ByHoleDiameter,
    #[serde(other)]
    Unknown,
}

/// Hardware offsets are applied by the controller, software offsets are
/// already baked into the geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OffsetType {
    #[default]
    Hardware,
    Software,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OffsetSide {
    Left,
    Right,
    #[default]
    Center,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LeadType {
    #[default]
    Direct,
    Tangent,
    Arc,
    Ramp,
    Perpendicular,
    #[serde(other)]
    Unknown,
}

impl LeadType {
    pub fn name(&self) -> &'static str {
        match self {
            LeadType::Direct => "Direct",
            LeadType::Tangent => "Tangent",
            LeadType::Arc => "Arc",
            LeadType::Ramp => "Ramp",
            LeadType::Perpendicular => "Perpendicular",
            LeadType::Unknown => "Unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_values_do_not_fail() {
        let lead: LeadType = serde_json::from_str("\"Spiral\"").unwrap();
        assert_eq!(lead, LeadType::Unknown);
        assert_eq!(lead.name(), "Unknown");

        let side: OffsetSide = serde_json::from_str("\"Left\"").unwrap();
        assert_eq!(side, OffsetSide::Left);
    }
}
