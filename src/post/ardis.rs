//! Ardis optimizer XML
//!
//! Each clamping becomes a `<PartDraw>` list of `<Draw>` elements: drill
//! holes, polyline pieces (lines and arcs, grouped by `ID` and ordered by
//! `SEQ`) and saw grooves. Only faces square to the stock axes are written.

use cgmath::{Point3, Vector3};
use tracing::{debug, warn};

use super::{PostOutput, PostProcessor};
use crate::config::{OutputUnit, PostConfig};
use crate::emitter::{LineWriter, NumberFormat, RenderState, Scale};
use crate::error::{PostError, Result};
use crate::frame::{Frame, NamedFrame, PartSizes, ReferenceFrames};
use crate::geometry;
use crate::job::{Clamping, Contour, CutPath, Job, Lead, Operation, OperationKind, ToolIdentifiedBy, Trajectory};
use crate::math::{is_parallel, is_same_direction, X_AXIS, Y_AXIS, Z_AXIS};
use crate::sequencer::{self, LeadEnd, OrbitalLandingPlan, PathStep};

const NAME: &str = "ARDIS XML";

pub struct ArdisPost {
    unit: OutputUnit,
}

impl ArdisPost {
    pub fn new(config: &PostConfig) -> Self {
        Self { unit: config.unit }
    }
}

impl PostProcessor for ArdisPost {
    fn name(&self) -> &str {
        NAME
    }

    fn file_extension(&self) -> &str {
        "xml"
    }

    fn side_transforms(&self, sizes: &PartSizes, _called_from_nesting: bool) -> Vec<NamedFrame> {
        let (l, w, t) = (sizes.length, sizes.width, sizes.thickness);
        vec![
            NamedFrame::new("Top", (0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (0.0, 1.0, 0.0), (0.0, 0.0, 1.0)),
            NamedFrame::new("Front", (0.0, 0.0, -t), (1.0, 0.0, 0.0), (0.0, 0.0, 1.0), (0.0, 1.0, 0.0)),
            NamedFrame::new("Back", (l, w, -t), (-1.0, 0.0, 0.0), (0.0, 0.0, 1.0), (0.0, -1.0, 0.0)),
            NamedFrame::new("Left", (0.0, w, -t), (0.0, -1.0, 0.0), (0.0, 0.0, 1.0), (1.0, 0.0, 0.0)),
            NamedFrame::new("Right", (l, 0.0, -t), (0.0, 1.0, 0.0), (0.0, 0.0, 1.0), (-1.0, 0.0, 0.0)),
            NamedFrame::new("Bottom", (l, w, -t), (-1.0, 0.0, 0.0), (0.0, -1.0, 0.0), (0.0, 0.0, -1.0)),
        ]
    }

    fn process(&self, job: &Job) -> Result<Vec<PostOutput>> {
        let mut state = RenderState::new();
        let mut outputs = Vec::with_capacity(job.clampings.len());
        for (index, clamping) in job.clampings.iter().enumerate() {
            let label = job.clamping_label(index);
            debug!(clamping = %label, "writing Ardis drawing");
            let transforms = self.side_transforms(
                &PartSizes::from(&clamping.part),
                job.output_options.called_from_nesting,
            );
            let mut frames = ReferenceFrames::new(NAME, transforms);
            let mut drawing = Drawing::new(self.unit, &mut state);
            let content = drawing.clamping(clamping, &mut frames)?;
            outputs.push(PostOutput {
                file_stem: label.clone(),
                extension: self.file_extension().to_string(),
                logical_name: label,
                content,
            });
        }
        Ok(outputs)
    }
}

/// `SIDE` code of a face normal given in clamping coordinates, `-1` when
/// the face is not square to the stock.
pub fn side_code(normal: Vector3<f64>) -> i32 {
    let faces = [
        (Z_AXIS, 0),
        (X_AXIS, 2),
        (Y_AXIS, 1),
        (-Y_AXIS, 3),
        (-X_AXIS, 4),
        (-Z_AXIS, 5),
    ];
    faces
        .iter()
        .find(|(axis, _)| is_same_direction(*axis, normal))
        .map(|(_, code)| *code)
        .unwrap_or(-1)
}

/// Fields shared by every piece of one contour pass.
struct PieceContext {
    tool: String,
    opside: String,
    side: String,
}

struct Drawing<'s> {
    state: &'s mut RenderState,
    double: NumberFormat,
    int: NumberFormat,
    degrees: NumberFormat,
    out: LineWriter,
    frame: Frame,
}

impl<'s> Drawing<'s> {
    fn new(unit: OutputUnit, state: &'s mut RenderState) -> Self {
        Self {
            state,
            double: NumberFormat::new(4).trim().scale(Scale::length(unit)),
            int: NumberFormat::new(0).trim(),
            degrees: NumberFormat::new(4).trim().scale(Scale::Degree),
            out: LineWriter::new(),
            frame: Frame::identity(),
        }
    }

    fn clamping(&mut self, clamping: &Clamping, frames: &mut ReferenceFrames) -> Result<String> {
        if clamping.operations.is_empty() {
            return Ok(String::new());
        }
        frames.set_to_clamping(clamping);

        for operation in &clamping.operations {
            let checkpoint = self.out.clone();
            match self.operation(clamping, operation, frames) {
                Ok(()) => {}
                Err(err) if err.is_recoverable() => {
                    warn!(operation = %operation.name, error = %err, "skipping operation");
                    self.out = checkpoint;
                }
                Err(err) => return Err(err),
            }
        }
        if self.out.is_empty() {
            return Ok(String::new());
        }

        let mut drawing = LineWriter::new();
        drawing.open_tag("PartDraw");
        drawing.append(std::mem::take(&mut self.out));
        drawing.close_tag();
        Ok(drawing.to_string())
    }

    fn operation(&mut self, clamping: &Clamping, operation: &Operation, frames: &mut ReferenceFrames) -> Result<()> {
        let normal = clamping.side_of(operation)?.zaxis.to_vector();
        if ![X_AXIS, Y_AXIS, Z_AXIS].iter().any(|axis| is_parallel(*axis, normal)) {
            debug!(operation = %operation.name, "slanted side rejected");
            return Ok(());
        }
        self.frame = *frames.set_to_side_axis(&clamping.sides, normal)?;

        let ctx = |opside: u32| PieceContext {
            tool: tool_code(operation),
            opside: opside.to_string(),
            side: side_code(normal).to_string(),
        };

        match &operation.kind {
            OperationKind::Drill(drill) => {
                let ctx = ctx(0);
                let diameter = self.double.format(operation.spindle.tool.diameter);
                for trajectory in &drill.trajectories {
                    let Trajectory::Drill(t) = trajectory else {
                        return Err(trajectory.mismatch(operation));
                    };
                    for g in &t.geometry {
                        let p = geometry::start(g, &self.frame)?;
                        let mut fields = vec![
                            ("FUNCTNAME", "DRILL".to_string()),
                            ("X", self.double.format(p.x)),
                            ("Y", self.double.format(p.y)),
                            ("DIAMETER", diameter.clone()),
                        ];
                        push_tool(&mut fields, &ctx.tool);
                        fields.push(("Z2", self.double.format(t.full_depth)));
                        fields.push(("OPSIDE", ctx.opside.clone()));
                        fields.push(("SIDE", ctx.side.clone()));
                        self.draw(&fields);
                    }
                }
            }
            OperationKind::Mill(list) => {
                for trajectory in &list.trajectories {
                    let Trajectory::Mill(t) = trajectory else {
                        return Err(trajectory.mismatch(operation));
                    };
                    let c = &t.mill_contour;
                    self.contour(c, t.full_depth, t.stepover, &ctx(contour_opside(c)))?;
                }
            }
            OperationKind::Pocket(list) => {
                for trajectory in &list.trajectories {
                    let Trajectory::Pocket(t) = trajectory else {
                        return Err(trajectory.mismatch(operation));
                    };
                    for c in t.middle_removal_contours.iter().chain(&t.finish_contours) {
                        self.contour(c, t.full_depth, t.stepover, &ctx(contour_opside(c)))?;
                    }
                }
            }
            OperationKind::Cut(saw) => {
                for trajectory in &saw.trajectories {
                    let Trajectory::Cut(t) = trajectory else {
                        return Err(trajectory.mismatch(operation));
                    };
                    if let Some(path) = &t.cut_paths.main_path {
                        self.groove(path, t.width, t.depth, &ctx(2))?;
                    }
                }
            }
            OperationKind::Groove(saw) => {
                for trajectory in &saw.trajectories {
                    let Trajectory::Groove(t) = trajectory else {
                        return Err(trajectory.mismatch(operation));
                    };
                    if let Some(path) = &t.groove_path {
                        self.groove(path, t.width, t.depth, &ctx(2))?;
                    }
                }
            }
            OperationKind::Nesting(_)
            | OperationKind::CutCalibration(_)
            | OperationKind::MillCalibration(_)
            | OperationKind::Macro(_) => {
                debug!(operation = %operation.name, "not part of an Ardis drawing");
            }
            OperationKind::Unknown => warn!(operation = %operation.name, "unknown operation type"),
        }
        Ok(())
    }

    fn draw(&mut self, fields: &[(&str, String)]) {
        self.out.open_tag("Draw");
        for (tag, value) in fields {
            self.out.tag_value(tag, value);
        }
        self.out.close_tag();
    }

    fn contour(&mut self, contour: &Contour, full_depth: f64, stepover: f64, ctx: &PieceContext) -> Result<()> {
        self.orbital_landing(contour, ctx)?;
        let main = sequencer::walk_path(&contour.main_contour.geometry, &self.frame)?;
        for depth in sequencer::stepover_depths(full_depth, stepover) {
            self.state.next_polyline();
            self.lead(&contour.lead_in, LeadEnd::In, depth, ctx)?;
            self.pieces(&main, depth, depth, ctx);
            self.lead(&contour.lead_out, LeadEnd::Out, depth, ctx)?;
        }
        Ok(())
    }

    fn lead(&mut self, lead: &Lead, end: LeadEnd, depth: f64, ctx: &PieceContext) -> Result<()> {
        if let Some((z1, z2)) = sequencer::lead_depths(lead.lead_type, end, depth) {
            let steps = sequencer::walk_path(&lead.geometry, &self.frame)?;
            self.pieces(&steps, z1, z2, ctx);
        }
        Ok(())
    }

    /// Lines and arcs of one polyline. Points have no extent and are skipped.
    fn pieces(&mut self, steps: &[PathStep], z1: f64, z2: f64, ctx: &PieceContext) {
        for step in steps {
            let (name, arc) = match *step {
                PathStep::Point { .. } => continue,
                PathStep::Line { .. } => ("LINE", None),
                PathStep::Arc {
                    radius,
                    counterclockwise,
                    angle,
                    ..
                } => ("ARC", Some((radius, sequencer::ardis_arc_dir(counterclockwise, angle)))),
            };
            let sequence = self.state.next_sequence();
            self.piece(name, step.start(), step.end(), arc, (z1, z2), sequence, ctx);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn piece(
        &mut self,
        name: &str,
        start: Point3<f64>,
        end: Point3<f64>,
        arc: Option<(f64, u32)>,
        (z1, z2): (f64, f64),
        sequence: u32,
        ctx: &PieceContext,
    ) {
        let mut fields = vec![
            ("FUNCTNAME", name.to_string()),
            ("X", self.double.format(start.x)),
            ("Y", self.double.format(start.y)),
            ("LENGTH", self.double.format(end.x - start.x)),
            ("WIDTH", self.double.format(end.y - start.y)),
        ];
        if let Some((radius, dir)) = arc {
            fields.push(("RADIUS", self.double.format(radius)));
            fields.push(("DIR", self.int.format(dir as f64)));
        }
        if z1 != z2 {
            fields.push(("Z1", self.double.format(z1)));
        }
        fields.push(("Z2", self.double.format(z2)));
        push_tool(&mut fields, &ctx.tool);
        fields.push(("ID", self.int.format(self.state.polyline_id() as f64)));
        fields.push(("SEQ", self.int.format(sequence as f64)));
        fields.push(("OPSIDE", ctx.opside.clone()));
        fields.push(("OPTYPE", "1".to_string()));
        fields.push(("SIDE", ctx.side.clone()));
        self.draw(&fields);
    }

    /// Helical plunge as one polyline of arcs going down from the start height.
    fn orbital_landing(&mut self, contour: &Contour, ctx: &PieceContext) -> Result<()> {
        let landing = &contour.orbital_landing;
        if !landing.exists {
            return Ok(());
        }
        let start = geometry::start(geometry::first(&landing.geometry, "orbital landing")?, &self.frame)?;
        let center_geometry = landing
            .geometry
            .get(1)
            .ok_or_else(|| PostError::MissingGeometry("orbital landing center".to_string()))?;
        let center = geometry::start(center_geometry, &self.frame)?;

        let plan = OrbitalLandingPlan::new(landing.full_depth, landing.pitch, landing.counterclockwise);
        let dir = sequencer::ardis_arc_dir(landing.counterclockwise, plan.one_arc_angle.abs());

        self.state.next_polyline();
        let mut z1 = 0.0;
        for arc in plan.arcs(center, start) {
            let z2 = start.z + arc.descent;
            let sequence = self.state.next_sequence();
            self.piece("ARC", arc.start, arc.end, Some((landing.radius, dir)), (z1, z2), sequence, ctx);
            z1 = z2;
        }
        Ok(())
    }

    /// Saw cut or groove reduced to the channel reference point and heading.
    fn groove(&mut self, path: &CutPath, width: f64, depth: f64, ctx: &PieceContext) -> Result<()> {
        let cut = geometry::first(&path.cut, "saw cut")?;
        let start = geometry::start(cut, &self.frame)?;
        let end = geometry::end(cut, &self.frame)?;
        let direction = geometry::segment_direction(cut, &self.frame)?;
        let opside = sequencer::ardis_opside(path.offset_type, path.offset_side);
        let channel = sequencer::recentre_saw_path(start, end, direction, width, opside);

        let mut fields = vec![
            ("FUNCTNAME", "GROOVE".to_string()),
            ("X", self.double.format(channel.start.x)),
            ("Y", self.double.format(channel.start.y)),
            ("LENGTH", self.double.format(channel.length)),
            ("WIDTH", self.double.format(width)),
        ];
        push_tool(&mut fields, &ctx.tool);
        fields.push(("Z2", self.double.format(depth)));
        fields.push(("OPSIDE", ctx.opside.clone()));
        if channel.angle != 0.0 {
            fields.push(("ANGLE", self.degrees.format(channel.angle)));
        }
        fields.push(("SIDE", ctx.side.clone()));
        self.draw(&fields);
        Ok(())
    }
}

fn contour_opside(contour: &Contour) -> u32 {
    sequencer::ardis_opside(contour.offset_type, contour.offset_side)
}

/// Tool code when the spindle identifies tools by code.
fn tool_code(operation: &Operation) -> String {
    match operation.spindle.tool_identified_by {
        ToolIdentifiedBy::ByCode => operation.spindle.code.clone(),
        _ => String::new(),
    }
}

fn push_tool(fields: &mut Vec<(&str, String)>, tool: &str) {
    if !tool.is_empty() {
        fields.push(("TOOL", tool.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn job(operations: &str) -> Job {
        let json = format!(
            r#"{{
            "Clampings": [{{
                "Name": "Fixture A",
                "Part": {{ "Code": "P01", "Length": 60, "Width": 30, "Thickness": 1.8 }},
                "Sides": [
                    {{ "Name": "Top" }},
                    {{ "Name": "Slope", "InclinedPlane": true, "Zaxis": {{ "X": 0, "Y": -0.6, "Z": 0.8 }} }}
                ],
                "Operations": [{}]
            }}]
        }}"#,
            operations
        );
        Job::from_json_str(&json).unwrap()
    }

    fn render(job: &Job) -> String {
        let outputs = ArdisPost::new(&PostConfig::default()).process(job).unwrap();
        assert_eq!(outputs[0].file_name(), "Fixture A.xml");
        outputs[0].content.clone()
    }

    const DRILL: &str = r#"{
        "Name": "Holes", "Side": "Top", "OperationType": "DrillOperation",
        "Spindle": { "Code": "12", "ToolIdentifiedBy": "ByCode", "Tool": { "Diameter": 0.5 } },
        "Trajectories": [{
            "TrajectoryType": "DrillTrajectory", "FullDepth": 1.2,
            "Geometry": [{ "GeometryType": "Point", "X": 5, "Y": 2.5, "Z": 0 }]
        }]
    }"#;

    #[test]
    fn test_drill_element() {
        let xml = render(&job(DRILL));
        assert_eq!(
            xml,
            "<PartDraw>\n<Draw>\n<FUNCTNAME>DRILL</FUNCTNAME>\n<X>50</X>\n<Y>25</Y>\n<DIAMETER>5</DIAMETER>\n\
             <TOOL>12</TOOL>\n<Z2>12</Z2>\n<OPSIDE>0</OPSIDE>\n<SIDE>0</SIDE>\n</Draw>\n</PartDraw>\n"
        );
    }

    #[test]
    fn test_tool_omitted_when_identified_by_diameter() {
        let xml = render(&job(&DRILL.replace("ByCode", "ByHoleDiameter")));
        assert!(!xml.contains("<TOOL>"));
    }

    #[test]
    fn test_slanted_side_is_rejected() {
        let xml = render(&job(&DRILL.replace("\"Side\": \"Top\"", "\"Side\": \"Slope\"")));
        assert_eq!(xml, "");
    }

    #[test]
    fn test_nesting_produces_nothing() {
        let xml = render(&job(r#"{ "Name": "Nest", "Side": "Top", "OperationType": "NestingOperation" }"#));
        assert_eq!(xml, "");
    }

    const MILL: &str = r#"{
        "Name": "Profile", "Side": "Top", "OperationType": "MillOperation",
        "Spindle": { "Code": "3", "ToolIdentifiedBy": "ByCode" },
        "Trajectories": [{
            "TrajectoryType": "MillTrajectory", "FullDepth": 1.0, "Stepover": 0.5,
            "MillContour": {
                "OffsetType": "Hardware", "OffsetSide": "Right",
                "LeadIn": { "LeadType": "Ramp", "Geometry": [
                    { "GeometryType": "Segment", "StartPoint": { "X": 0, "Y": 1 }, "EndPoint": { "X": 1, "Y": 1 } }
                ] },
                "LeadOut": { "LeadType": "Direct" },
                "MainContour": { "Geometry": [
                    { "GeometryType": "Point", "X": 1, "Y": 1 },
                    { "GeometryType": "Arc", "StartPoint": { "X": 1, "Y": 1 }, "EndPoint": { "X": 3, "Y": 1 },
                      "CenterPoint": { "X": 2, "Y": 1 }, "Radius": 1, "Counterclockwise": false, "Angle": 3.14159 }
                ] }
            }
        }]
    }"#;

    #[test]
    fn test_contour_polylines() {
        let xml = render(&job(MILL));
        let draws: Vec<&str> = xml.split("<Draw>\n").skip(1).collect();
        // two depths, each a ramp line and an arc
        assert_eq!(draws.len(), 4);

        assert!(draws[0].starts_with("<FUNCTNAME>LINE</FUNCTNAME>\n<X>0</X>\n<Y>10</Y>\n<LENGTH>10</LENGTH>\n<WIDTH>0</WIDTH>\n"));
        assert!(draws[0].contains("<Z1>0</Z1>\n<Z2>5</Z2>\n<TOOL>3</TOOL>\n<ID>1</ID>\n<SEQ>1</SEQ>\n<OPSIDE>1</OPSIDE>\n<OPTYPE>1</OPTYPE>\n<SIDE>0</SIDE>\n"));
        assert!(draws[1].contains("<RADIUS>10</RADIUS>\n<DIR>2</DIR>\n<Z2>5</Z2>\n"));
        assert!(draws[1].contains("<ID>1</ID>\n<SEQ>2</SEQ>\n"));
        assert!(draws[2].contains("<Z2>10</Z2>"));
        assert!(draws[3].contains("<ID>2</ID>\n<SEQ>2</SEQ>\n"));
    }

    #[test]
    fn test_polyline_ids_continue_across_clampings() {
        let mut job = job(MILL);
        let second = job.clampings[0].clone();
        job.clampings.push(second);
        job.clampings[1].name = String::new();
        let outputs = ArdisPost::new(&PostConfig::default()).process(&job).unwrap();
        assert_eq!(outputs[1].file_name(), "Clamp1.xml");
        assert!(outputs[1].content.contains("<ID>3</ID>"));
        assert!(!outputs[1].content.contains("<ID>1</ID>"));
    }

    #[test]
    fn test_groove_along_x() {
        let ops = r#"{
            "Name": "Groove", "Side": "Top", "OperationType": "GrooveOperation",
            "Spindle": { "Code": "S1" },
            "Trajectories": [{
                "TrajectoryType": "GrooveTrajectory", "Depth": 0.8, "Width": 0.4,
                "GroovePath": {
                    "OffsetType": "Hardware", "OffsetSide": "Right",
                    "Cut": [{ "GeometryType": "Segment", "StartPoint": { "X": 0, "Y": 5 }, "EndPoint": { "X": 60, "Y": 5 } }]
                }
            }]
        }"#;
        let xml = render(&job(ops));
        assert!(xml.contains("<FUNCTNAME>GROOVE</FUNCTNAME>\n<X>0</X>\n<Y>50</Y>\n<LENGTH>600</LENGTH>\n<WIDTH>4</WIDTH>\n"));
        assert!(xml.contains("<Z2>8</Z2>\n<OPSIDE>2</OPSIDE>\n<SIDE>0</SIDE>\n"));
        assert!(!xml.contains("<ANGLE>"));
    }

    #[test]
    fn test_side_codes() {
        assert_eq!(side_code(Z_AXIS), 0);
        assert_eq!(side_code(Y_AXIS), 1);
        assert_eq!(side_code(X_AXIS), 2);
        assert_eq!(side_code(-Y_AXIS), 3);
        assert_eq!(side_code(-X_AXIS), 4);
        assert_eq!(side_code(-Z_AXIS), 5);
        assert_eq!(side_code(Vector3::new(0.0, -0.6, 0.8)), -1);
    }
}
