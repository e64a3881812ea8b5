//! Read-only job tree handed to the postprocessors
//!
//! Field names follow the CAM host (PascalCase) so a job exported by the
//! host loads as-is and the dump postprocessors can reflect it back.
//! Lengths are host units (centimetres), angles are radians.

use cgmath::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{PostError, Result};

pub mod enums;

pub use enums::*;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct Point3d {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3d {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn to_point(&self) -> Point3<f64> {
        Point3::new(self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct Vector3d {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3d {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }
}

/// Root of a postprocessing run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct Job {
    pub call_environment: String,
    pub clampings: Vec<Clamping>,
    pub machine: Machine,
    pub output_options: OutputOptions,
}

impl Job {
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Unique label of a clamping, used as the logical name of its output.
    pub fn clamping_label(&self, index: usize) -> String {
        match self.clampings.get(index) {
            Some(clamping) if !clamping.name.is_empty() => clamping.name.clone(),
            _ if self.output_options.called_from_nesting => format!("Nest{}", index),
            _ => format!("Clamp{}", index),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct Machine {
    pub safe_plane_height: f64,
    pub clearance_height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct OutputOptions {
    pub called_from_nesting: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct Clamping {
    pub name: String,
    pub clamping_corner: ClampingCorner,
    pub clamping_body_type: ClampingBodyType,
    pub part: Part,
    pub sides: Vec<Side>,
    pub operations: Vec<Operation>,
}

impl Clamping {
    pub fn side(&self, name: &str) -> Option<&Side> {
        self.sides.iter().find(|side| side.name == name)
    }

    /// The side an operation is machined on.
    pub fn side_of(&self, operation: &Operation) -> Result<&Side> {
        self.side(&operation.side).ok_or_else(|| PostError::MissingSide {
            operation: operation.name.clone(),
            side: operation.side.clone(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct Part {
    pub name: String,
    pub code: String,
    pub length: f64,
    pub width: f64,
    pub thickness: f64,
}

/// A face of the stock with its own frame, expressed in clamping coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Side {
    pub name: String,
    pub inclined_plane: bool,
    pub origin: Point3d,
    pub xaxis: Vector3d,
    pub yaxis: Vector3d,
    pub zaxis: Vector3d,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_data: Option<InclinedPlaneData>,
}

impl Default for Side {
    fn default() -> Self {
        Self {
            name: "Top".to_string(),
            inclined_plane: false,
            origin: Point3d::default(),
            xaxis: Vector3d::new(1.0, 0.0, 0.0),
            yaxis: Vector3d::new(0.0, 1.0, 0.0),
            zaxis: Vector3d::new(0.0, 0.0, 1.0),
            extended_data: None,
        }
    }
}

/// Three points spanning an inclined face.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct InclinedPlaneData {
    pub p1: Point3d,
    pub p2: Point3d,
    pub p3: Point3d,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct Spindle {
    pub name: String,
    pub code: String,
    pub tool_identified_by: ToolIdentifiedBy,
    pub tool: Tool,
}

impl Spindle {
    /// Tool number for `T`/`H` words: the leading number of the code.
    pub fn tool_number(&self) -> f64 {
        let code = self.code.trim();
        let end = code
            .char_indices()
            .find(|(i, c)| !(c.is_ascii_digit() || *c == '.' || (*i == 0 && (*c == '-' || *c == '+'))))
            .map(|(i, _)| i)
            .unwrap_or(code.len());
        code[..end].parse().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct Tool {
    pub diameter: f64,
    pub rotation_direction: RotationDirection,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct CuttingParameters {
    pub cutting_feedrate: f64,
    pub speed: f64,
    pub lead_in_feedrate: f64,
    pub direct_landing_feedrate: f64,
    pub orbital_landing_feedrate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct OperatingToolData {
    pub tilt_angle: f64,
}

/// One machining operation. `side` names a side of the owning clamping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Operation {
    #[serde(default)]
    pub name: String,
    pub side: String,
    #[serde(default)]
    pub spindle: Spindle,
    #[serde(default)]
    pub cutting_parameters: CuttingParameters,
    #[serde(flatten)]
    pub kind: OperationKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "OperationType")]
pub enum OperationKind {
    #[serde(rename = "DrillOperation")]
    Drill(DrillOperation),
    #[serde(rename = "MillOperation")]
    Mill(TrajectoryList),
    #[serde(rename = "PocketOperation")]
    Pocket(TrajectoryList),
    #[serde(rename = "CutOperation")]
    Cut(SawOperation),
    #[serde(rename = "GrooveOperation")]
    Groove(SawOperation),
    #[serde(rename = "NestingOperation")]
    Nesting(TrajectoryList),
    #[serde(rename = "CalibrationOperation")]
    MillCalibration(TrajectoryList),
    #[serde(rename = "CutCalibrationOperation")]
    CutCalibration(SawOperation),
    #[serde(rename = "MacroOperation")]
    Macro(MacroOperation),
    #[serde(other)]
    Unknown,
}

impl OperationKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            OperationKind::Drill(_) => "DrillOperation",
            OperationKind::Mill(_) => "MillOperation",
            OperationKind::Pocket(_) => "PocketOperation",
            OperationKind::Cut(_) => "CutOperation",
            OperationKind::Groove(_) => "GrooveOperation",
            OperationKind::Nesting(_) => "NestingOperation",
            OperationKind::MillCalibration(_) => "CalibrationOperation",
            OperationKind::CutCalibration(_) => "CutCalibrationOperation",
            OperationKind::Macro(_) => "MacroOperation",
            OperationKind::Unknown => "Unknown",
        }
    }

    pub fn trajectories(&self) -> &[Trajectory] {
        match self {
            OperationKind::Drill(op) => &op.trajectories,
            OperationKind::Cut(op) | OperationKind::Groove(op) | OperationKind::CutCalibration(op) => {
                &op.trajectories
            }
            OperationKind::Mill(op)
            | OperationKind::Pocket(op)
            | OperationKind::Nesting(op)
            | OperationKind::MillCalibration(op) => &op.trajectories,
            OperationKind::Macro(op) => &op.trajectories,
            OperationKind::Unknown => &[],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct DrillOperation {
    pub is_thru: bool,
    pub trajectories: Vec<Trajectory>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct TrajectoryList {
    pub trajectories: Vec<Trajectory>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct MacroOperation {
    pub macro_name: String,
    pub trajectories: Vec<Trajectory>,
}

/// Cut, groove and cut calibration operations run a saw blade.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct SawOperation {
    pub operating_tool_data: OperatingToolData,
    pub trajectories: Vec<Trajectory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "TrajectoryType")]
pub enum Trajectory {
    #[serde(rename = "DrillTrajectory")]
    Drill(DrillTrajectory),
    #[serde(rename = "MillTrajectory")]
    Mill(MillTrajectory),
    #[serde(rename = "PocketTrajectory")]
    Pocket(PockTrajectory),
    #[serde(rename = "CutTrajectory")]
    Cut(CutTrajectory),
    #[serde(rename = "GrooveTrajectory")]
    Groove(GrooveTrajectory),
    #[serde(rename = "NestingTrajectory")]
    Nesting(NestTrajectory),
    #[serde(rename = "CalibrationTrajectory")]
    MillCalibration(MillTrajectory),
    #[serde(rename = "CutCalibrationTrajectory")]
    CutCalibration(CutTrajectory),
    #[serde(rename = "MacroTrajectory")]
    Macro(MacroTrajectory),
    #[serde(other)]
    Unknown,
}

impl Trajectory {
    pub fn type_name(&self) -> &'static str {
        match self {
            Trajectory::Drill(_) => "DrillTrajectory",
            Trajectory::Mill(_) => "MillTrajectory",
            Trajectory::Pocket(_) => "PocketTrajectory",
            Trajectory::Cut(_) => "CutTrajectory",
            Trajectory::Groove(_) => "GrooveTrajectory",
            Trajectory::Nesting(_) => "NestingTrajectory",
            Trajectory::MillCalibration(_) => "CalibrationTrajectory",
            Trajectory::CutCalibration(_) => "CutCalibrationTrajectory",
            Trajectory::Macro(_) => "MacroTrajectory",
            Trajectory::Unknown => "Unknown",
        }
    }

    pub(crate) fn mismatch(&self, operation: &Operation) -> PostError {
        PostError::TrajectoryMismatch {
            operation: operation.kind.type_name().to_string(),
            trajectory: self.type_name().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct DrillTrajectory {
    pub full_depth: f64,
    pub breakthrough_depth: f64,
    pub geometry: Vec<Geometry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct MillTrajectory {
    pub full_depth: f64,
    pub stepover: f64,
    pub mill_contour: Contour,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct PockTrajectory {
    pub full_depth: f64,
    pub stepover: f64,
    pub finish_contour_stepover: bool,
    pub middle_removal_contours: Vec<Contour>,
    pub finish_contours: Vec<Contour>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct NestTrajectory {
    pub full_depth: f64,
    pub stepover: f64,
    pub bridge_height: f64,
    pub nest_contour: Contour,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct CutTrajectory {
    pub depth: f64,
    pub width: f64,
    pub scoring_enabled: bool,
    pub scoring_cut_depth: f64,
    pub cut_from_inside: bool,
    pub cut_paths: CutPaths,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct CutPaths {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_path: Option<CutPath>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scoring_path: Option<CutPath>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct GrooveTrajectory {
    pub depth: f64,
    pub width: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groove_path: Option<CutPath>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct MacroTrajectory {
    pub geometry: Vec<Geometry>,
}

/// One straight saw pass with its approach and departure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct CutPath {
    pub depth: f64,
    pub offset_side: OffsetSide,
    pub offset_type: OffsetType,
    pub cut: Vec<Geometry>,
    pub lead_in: Lead,
    pub lead_out: Lead,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct Contour {
    pub offset_side: OffsetSide,
    pub offset_type: OffsetType,
    pub main_contour: MainContour,
    pub lead_in: Lead,
    pub lead_out: Lead,
    pub orbital_landing: OrbitalLanding,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct MainContour {
    pub is_closed: bool,
    pub geometry: Vec<Geometry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct Lead {
    pub lead_type: LeadType,
    pub geometry: Vec<Geometry>,
}

/// Helical plunge. `geometry[0]` starts on the circle, `geometry[1]` starts
/// at its center and the optional `geometry[2]` joins the lead-in.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct OrbitalLanding {
    pub exists: bool,
    pub pitch: f64,
    pub full_depth: f64,
    pub radius: f64,
    pub counterclockwise: bool,
    pub geometry: Vec<Geometry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "GeometryType")]
pub enum Geometry {
    Point(Point3d),
    Segment(Segment),
    Arc(Arc),
    #[serde(other)]
    Unknown,
}

impl Geometry {
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::Segment(_) => "Segment",
            Geometry::Arc(_) => "Arc",
            Geometry::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct Segment {
    pub start_point: Point3d,
    pub end_point: Point3d,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct Arc {
    pub start_point: Point3d,
    pub end_point: Point3d,
    pub center_point: Point3d,
    pub radius: f64,
    pub counterclockwise: bool,
    pub angle: f64,
}
