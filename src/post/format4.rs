//! tpaCAD Format-4 (`.tcn`)
//!
//! A program is a header, a few fixed sections and one `SIDE#n{ }SIDE`
//! block per machined face. Every machining step is a `W#code{ ... }W`
//! line whose `#n=value` words are defined by tpaCAD.

use cgmath::Point3;
use tracing::{debug, warn};

use super::{program_stem, PostOutput, PostProcessor};
use crate::config::{OutputUnit, PostConfig};
use crate::emitter::{LineWriter, NumberFormat, Scale};
use crate::error::{PostError, Result};
use crate::frame::{Frame, NamedFrame, PartSizes, ReferenceFrames};
use crate::geometry;
use crate::job::{
    Clamping, Contour, CutPath, CuttingParameters, Job, Lead, LeadType, Operation, OperationKind, Side,
    ToolIdentifiedBy, Trajectory,
};
use crate::math::{approx_equal, is_same_direction};
use crate::sequencer::{self, PathStep, SawRoute};

const NAME: &str = "Format-4 for tpaCAD 4.x";

/// First number given to faces that are not one of the six stock faces.
const FIRST_CUSTOM_SIDE: u32 = 7;

pub struct Format4Post {
    unit: OutputUnit,
}

impl Format4Post {
    pub fn new(config: &PostConfig) -> Self {
        Self { unit: config.unit }
    }
}

impl PostProcessor for Format4Post {
    fn name(&self) -> &str {
        NAME
    }

    fn file_extension(&self) -> &str {
        "tcn"
    }

    fn side_transforms(&self, sizes: &PartSizes, _called_from_nesting: bool) -> Vec<NamedFrame> {
        let (l, w, t) = (sizes.length, sizes.width, sizes.thickness);
        vec![
            NamedFrame::new("Top", (0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (0.0, 1.0, 0.0), (0.0, 0.0, 1.0)),
            NamedFrame::new("Front", (0.0, 0.0, -t), (1.0, 0.0, 0.0), (0.0, 0.0, 1.0), (0.0, -1.0, 0.0)),
            NamedFrame::new("Back", (0.0, w, -t), (1.0, 0.0, 0.0), (0.0, 0.0, 1.0), (0.0, 1.0, 0.0)),
            NamedFrame::new("Left", (0.0, 0.0, -t), (0.0, 1.0, 0.0), (0.0, 0.0, 1.0), (-1.0, 0.0, 0.0)),
            NamedFrame::new("Right", (l, 0.0, -t), (0.0, 1.0, 0.0), (0.0, 0.0, 1.0), (1.0, 0.0, 0.0)),
            NamedFrame::new("Bottom", (0.0, 0.0, -t), (1.0, 0.0, 0.0), (0.0, 1.0, 0.0), (0.0, 0.0, 1.0)),
            NamedFrame::new("Custom", (0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (0.0, 1.0, 0.0), (0.0, 0.0, -1.0)),
        ]
    }

    fn process(&self, job: &Job) -> Result<Vec<PostOutput>> {
        let mut outputs = Vec::with_capacity(job.clampings.len());
        for (index, clamping) in job.clampings.iter().enumerate() {
            debug!(clamping = %job.clamping_label(index), "writing Format-4 program");
            let transforms = self.side_transforms(
                &PartSizes::from(&clamping.part),
                job.output_options.called_from_nesting,
            );
            let mut frames = ReferenceFrames::new(NAME, transforms);
            let content = Program::new(self.unit).clamping(clamping, &mut frames)?;
            outputs.push(PostOutput {
                file_stem: program_stem(&clamping.part.code, index),
                extension: self.file_extension().to_string(),
                logical_name: job.clamping_label(index),
                content,
            });
        }
        Ok(outputs)
    }
}

/// A clamping side with its tpaCAD face name and number.
#[derive(Debug, Clone)]
struct RemappedSide<'a> {
    side: &'a Side,
    name: &'static str,
    number: u32,
    operations: usize,
}

fn remap_sides(clamping: &Clamping) -> Vec<RemappedSide<'_>> {
    let below = cgmath::Vector3::new(0.0, 0.0, -1.0);
    let mut next_custom = FIRST_CUSTOM_SIDE;
    let mut sides: Vec<RemappedSide> = clamping
        .sides
        .iter()
        .map(|side| {
            let (name, number) = match side.name.as_str() {
                "Top" => ("upper face", 1),
                "Back" => ("back face", 5),
                "Front" => ("front face", 3),
                "Left" => ("left face", 6),
                "Right" => ("right face", 4),
                _ if is_same_direction(side.zaxis.to_vector(), below) => ("below face", 2),
                _ => {
                    next_custom += 1;
                    ("custom face", next_custom - 1)
                }
            };
            RemappedSide {
                side,
                name,
                number,
                operations: clamping.operations.iter().filter(|op| op.side == side.name).count(),
            }
        })
        .collect();
    sides.sort_by_key(|s| s.number);
    sides
}

/// Number formats of one program.
struct Formats {
    double: NumberFormat,
    feed: NumberFormat,
    rpm: NumberFormat,
    int: NumberFormat,
    angle: NumberFormat,
}

impl Formats {
    fn new(unit: OutputUnit) -> Self {
        let decimals = if unit.is_metric() { 5 } else { 6 };
        Self {
            double: NumberFormat::new(decimals).trim().scale(Scale::length(unit)),
            feed: NumberFormat::new(0).trim().scale(Scale::length(unit)),
            rpm: NumberFormat::new(0).trim(),
            int: NumberFormat::new(0).trim(),
            angle: NumberFormat::new(5).trim().scale(Scale::Degree),
        }
    }
}

struct Program {
    unit: OutputUnit,
    f: Formats,
    out: LineWriter,
    frame: Frame,
    side_number: u32,
}

impl Program {
    fn new(unit: OutputUnit) -> Self {
        Self {
            unit,
            f: Formats::new(unit),
            out: LineWriter::new(),
            frame: Frame::identity(),
            side_number: 0,
        }
    }

    fn clamping(mut self, clamping: &Clamping, frames: &mut ReferenceFrames) -> Result<String> {
        frames.set_to_clamping(clamping);
        let sides = remap_sides(clamping);

        self.header(clamping, &sides);
        self.execution_section();
        self.variables_section();
        self.optimization_section();
        self.fictitious_faces(&sides);

        for remapped in sides.iter().filter(|s| s.operations > 0) {
            self.out.emit(&format!("SIDE#{}{{", self.f.int.format(remapped.number as f64)));
            self.out.emit(&format!("$={}", remapped.name));
            self.side_number = remapped.number;
            for operation in clamping.operations.iter().filter(|op| op.side == remapped.side.name) {
                let checkpoint = self.out.clone();
                match self.operation(remapped.side, operation, frames) {
                    Ok(()) => {}
                    Err(err) if err.is_recoverable() => {
                        warn!(operation = %operation.name, error = %err, "skipping operation");
                        self.out = checkpoint;
                    }
                    Err(err) => return Err(err),
                }
            }
            self.out.emit("}SIDE");
        }
        Ok(self.out.to_string())
    }

    fn header(&mut self, clamping: &Clamping, sides: &[RemappedSide]) {
        let used: String = sides
            .iter()
            .filter(|s| s.operations > 0)
            .map(|s| format!("{};", s.number))
            .collect();
        let part = &clamping.part;
        let unit = if self.unit.is_metric() { "UNm" } else { "UNi" };

        self.out.emit("TPA\\ALBATROS\\EDICAD\\02.00");
        self.out.emit("$=Generated by Woodwork for Inventor CAM");
        self.out.emit(&format!("$=tcn {}", NAME));
        self.out.emit(&format!("::SIDE={}", used));
        self.out.emit(&format!(
            "::{} DL={} DH={} DS={}",
            unit,
            self.f.double.format(part.length),
            self.f.double.format(part.width),
            self.f.double.format(part.thickness)
        ));
        self.out.emit("::FLT0=0 FLT1=0 FLT2=0 FLT3=0 FLT4=0 FLT5=0 FLT6=0 FLT7=0");
    }

    fn execution_section(&mut self) {
        // normal mode, work area N, no locator offsets
        for line in ["EXE{", "#0=0", "#1=0", "#2=0", "#3=0", "#4=0", "}EXE"] {
            self.out.emit(line);
        }
    }

    fn variables_section(&mut self) {
        for line in ["OFFS{", "#0=0|0", "#1=0|0", "#2=0|0", "}OFFS"] {
            self.out.emit(line);
        }
        self.out.emit("VARV{");
        for (i, value) in [1, 2, 3, 4, 0, 0, 0, 0].iter().enumerate() {
            self.out.emit(&format!("#{}={}|{}", i, value, value));
        }
        self.out.emit("}VARV");
        for line in ["VAR{", "}VAR", "SPEC{", "}SPEC", "INFO{", "}INFO"] {
            self.out.emit(line);
        }
    }

    fn optimization_section(&mut self) {
        self.out.emit("OPTI{");
        self.out.emit(
            "::OPTDEF=1 OPTIMIZE=%;0 OPTMIN=0 OPT3=0 OPT0=0 OPTTOOL=0 OPT2=0 OPTX=0 OPTY=0 OPTR=0 OPT4=0 OPT6=0 \
             OPT7=0 LSTCOD=0%1%2%3 LTOOLFR=0 LTOOLPN=0 OPTF1=0 OOO=0.5",
        );
        self.out.emit("}OPTI");
        self.out.emit("LINK{");
        self.out.emit("}LINK");
    }

    /// `GEO{}` describes inclined faces by three points each.
    fn fictitious_faces(&mut self, sides: &[RemappedSide]) {
        let inclined: Vec<&RemappedSide> = sides.iter().filter(|s| s.side.inclined_plane).collect();
        if inclined.is_empty() {
            return;
        }
        self.out.emit(&format!("GEO{{ ::NF={}", self.f.int.format(inclined.len() as f64)));
        for remapped in inclined {
            let Some(data) = &remapped.side.extended_data else {
                continue;
            };
            self.out.emit(&format!("GSIDE#{}{{ ::NR=1", self.f.int.format(remapped.number as f64)));
            self.out.emit(&format!("$={}", remapped.name));
            for (i, p) in [&data.p1, &data.p2, &data.p3].iter().enumerate() {
                let line = format!(
                    "#{}={}|{}|{}",
                    i + 1,
                    self.f.double.format(p.x),
                    self.f.double.format(p.y),
                    self.f.double.format(p.z)
                );
                self.out.emit(&line);
            }
            self.out.emit("#Z=sf");
            self.out.emit("}GSIDE");
        }
        self.out.emit("}GEO");
    }

    /// Write one operation of `side`.
    ///
    /// Regular sides resolve their transform by name first and fall back to
    /// the transform sharing the side normal, so a face exported under a
    /// non-standard name still lands on the matching tpaCAD face.
    fn operation(&mut self, side: &Side, operation: &Operation, frames: &mut ReferenceFrames) -> Result<()> {
        self.frame = if side.inclined_plane {
            *frames.set_custom_frame(Frame::of_side(side))
        } else {
            *frames.set_to_side_axis(std::slice::from_ref(side), side.zaxis.to_vector())?
        };
        debug!(operation = %operation.name, kind = operation.kind.type_name(), side = self.side_number, "Format-4 operation");

        let mismatch = |t: &Trajectory| t.mismatch(operation);
        match &operation.kind {
            OperationKind::Drill(drill) => {
                for trajectory in &drill.trajectories {
                    let Trajectory::Drill(t) = trajectory else {
                        return Err(mismatch(trajectory));
                    };
                    for g in &t.geometry {
                        let point = geometry::start(g, &self.frame)?;
                        let line = format!(
                            "{}{}{}{}{}{}",
                            block_start(81, "p"),
                            self.tool_definition(operation),
                            self.point(point, -t.full_depth),
                            self.cutting_parameters(&operation.cutting_parameters),
                            tool_type(if drill.is_thru { 1 } else { 0 }),
                            BLOCK_END
                        );
                        self.out.emit(&line);
                    }
                }
            }
            OperationKind::Mill(list) | OperationKind::MillCalibration(list) => {
                for trajectory in &list.trajectories {
                    match trajectory {
                        Trajectory::Mill(t) | Trajectory::MillCalibration(t) => {
                            self.contour(operation, t.full_depth, t.stepover, &t.mill_contour)?
                        }
                        other => return Err(mismatch(other)),
                    }
                }
            }
            OperationKind::Pocket(list) => {
                for trajectory in &list.trajectories {
                    let Trajectory::Pocket(t) = trajectory else {
                        return Err(mismatch(trajectory));
                    };
                    for contour in t.middle_removal_contours.iter().chain(&t.finish_contours) {
                        self.contour(operation, t.full_depth, t.stepover, contour)?;
                    }
                }
            }
            OperationKind::Nesting(list) => {
                for trajectory in &list.trajectories {
                    let Trajectory::Nesting(t) = trajectory else {
                        return Err(mismatch(trajectory));
                    };
                    self.contour(operation, t.full_depth, t.stepover, &t.nest_contour)?;
                }
            }
            OperationKind::Cut(saw) | OperationKind::CutCalibration(saw) => {
                for trajectory in &saw.trajectories {
                    match trajectory {
                        Trajectory::Cut(t) | Trajectory::CutCalibration(t) => {
                            let Some(path) = &t.cut_paths.main_path else {
                                continue;
                            };
                            let scoring = if t.scoring_enabled { t.scoring_cut_depth } else { t.depth };
                            let compensation = sequencer::format4_cut_compensation(path.offset_side, t.cut_from_inside);
                            let cut = SawPass {
                                depth: t.depth,
                                scoring_depth: scoring,
                                width: 0.0,
                                compensation,
                            };
                            self.saw_path(operation, saw.operating_tool_data.tilt_angle, path, cut)?;
                        }
                        other => return Err(mismatch(other)),
                    }
                }
            }
            OperationKind::Groove(saw) => {
                for trajectory in &saw.trajectories {
                    let Trajectory::Groove(t) = trajectory else {
                        return Err(mismatch(trajectory));
                    };
                    let Some(path) = &t.groove_path else {
                        continue;
                    };
                    let groove = SawPass {
                        depth: t.depth,
                        scoring_depth: t.depth,
                        width: t.width,
                        compensation: sequencer::format4_groove_compensation(path.offset_side),
                    };
                    self.saw_path(operation, saw.operating_tool_data.tilt_angle, path, groove)?;
                }
            }
            OperationKind::Macro(_) => {}
            OperationKind::Unknown => warn!(operation = %operation.name, "unknown operation type"),
        }
        Ok(())
    }

    fn contour(&mut self, operation: &Operation, full_depth: f64, stepover: f64, contour: &Contour) -> Result<()> {
        self.orbital_landing(operation, contour)?;

        let depths = sequencer::stepover_depths(full_depth, stepover);
        let start = geometry::start(geometry::first(&contour.lead_in.geometry, "lead-in")?, &self.frame)?;
        let main = sequencer::walk_path(&contour.main_contour.geometry, &self.frame)?;

        if contour.main_contour.is_closed {
            if let Some(&first) = depths.first() {
                self.contour_start(operation, contour, start, first)?;
            }
        }
        for &depth in &depths {
            if !contour.main_contour.is_closed {
                self.contour_start(operation, contour, start, depth)?;
            }
            self.lead_in(&contour.lead_in, depth)?;
            self.path(&main, -depth);
            self.lead_out(&contour.lead_out, depth)?;
        }
        Ok(())
    }

    /// `W#89` setup block. A ramp lead-in starts at the height of its last element.
    fn contour_start(&mut self, operation: &Operation, contour: &Contour, at: Point3<f64>, depth: f64) -> Result<()> {
        let z = match contour.lead_in.lead_type {
            LeadType::Ramp => {
                let last = geometry::last(&contour.lead_in.geometry, "lead-in")?;
                geometry::start(last, &self.frame)?.z
            }
            _ => -depth,
        };
        self.setup_block(operation, contour, at, z);
        Ok(())
    }

    fn setup_block(&mut self, operation: &Operation, contour: &Contour, at: Point3<f64>, z: f64) {
        let compensation =
            sequencer::format4_contour_compensation(contour.offset_type, contour.offset_side, self.side_number);
        let line = format!(
            "{}{}{}{} #40={}{}{}",
            block_start(89, "s"),
            self.tool_definition(operation),
            self.point(at, z),
            self.cutting_parameters(&operation.cutting_parameters),
            self.f.int.format(compensation as f64),
            tool_type(100),
            BLOCK_END
        );
        self.out.emit(&line);
    }

    fn orbital_landing(&mut self, operation: &Operation, contour: &Contour) -> Result<()> {
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

        self.setup_block(operation, contour, start, start.z);

        let plan = sequencer::OrbitalLandingPlan::new(landing.full_depth, landing.pitch, landing.counterclockwise);
        let arcs = plan.arcs(center, start);
        for arc in &arcs {
            let flat_center = Point3::new(center.x, center.y, 0.0);
            self.arc(arc.end, flat_center - arc.start, landing.counterclockwise, start.z - arc.descent);
        }

        let Some(to_lead_in) = landing.geometry.get(2) else {
            return Ok(());
        };
        let reached = arcs.last().map(|a| a.end).unwrap_or(Point3::new(start.x, start.y, 0.0));
        let lead_end = geometry::end(to_lead_in, &self.frame)?;
        if approx_equal(reached.x, lead_end.x, 1e-9) && approx_equal(reached.y, lead_end.y, 1e-9) {
            return Ok(());
        }
        let arc_center = geometry::center(to_lead_in, &self.frame)?;
        let arc_start = geometry::start(to_lead_in, &self.frame)?;
        self.arc(lead_end, arc_center - arc_start, landing.counterclockwise, arc_center.z);
        Ok(())
    }

    fn lead_in(&mut self, lead: &Lead, depth: f64) -> Result<()> {
        match lead.lead_type {
            LeadType::Tangent | LeadType::Arc | LeadType::Ramp => {
                let steps = sequencer::walk_path(&lead.geometry, &self.frame)?;
                self.path(&steps, -depth);
            }
            LeadType::Direct | LeadType::Perpendicular | LeadType::Unknown => {}
        }
        Ok(())
    }

    fn lead_out(&mut self, lead: &Lead, depth: f64) -> Result<()> {
        let z = match lead.lead_type {
            LeadType::Tangent | LeadType::Arc => -depth,
            LeadType::Ramp => geometry::end(geometry::last(&lead.geometry, "lead-out")?, &self.frame)?.z,
            LeadType::Direct | LeadType::Perpendicular | LeadType::Unknown => return Ok(()),
        };
        let steps = sequencer::walk_path(&lead.geometry, &self.frame)?;
        self.path(&steps, z);
        Ok(())
    }

    /// Lines and arcs at a fixed `#3`. Points are written as a line to the point.
    fn path(&mut self, steps: &[PathStep], z: f64) {
        for step in steps {
            match step {
                PathStep::Point { at } | PathStep::Line { end: at, .. } => {
                    let line = format!("{}{}{}", block_start(2201, "l"), self.point(*at, z), BLOCK_END);
                    self.out.emit(&line);
                }
                PathStep::Arc {
                    start,
                    end,
                    center,
                    counterclockwise,
                    ..
                } => self.arc(*end, *center - *start, *counterclockwise, z),
            }
        }
    }

    fn arc(&mut self, end: Point3<f64>, to_center: cgmath::Vector3<f64>, counterclockwise: bool, z: f64) {
        let direction = sequencer::format4_arc_dir(self.side_number, counterclockwise);
        let line = format!(
            "{}{} #31={} #32={} #34={}{}",
            block_start(2101, "a"),
            self.point(end, z),
            self.f.double.format(to_center.x),
            self.f.double.format(to_center.y),
            self.f.int.format(direction as f64),
            BLOCK_END
        );
        self.out.emit(&line);
    }

    fn saw_path(&mut self, operation: &Operation, tilt_angle: f64, path: &CutPath, pass: SawPass) -> Result<()> {
        let first_cut = geometry::first(&path.cut, "saw cut")?;
        let start = match path.lead_in.lead_type {
            LeadType::Perpendicular => geometry::start(first_cut, &self.frame)?,
            _ => geometry::start(geometry::first(&path.lead_in.geometry, "saw lead-in")?, &self.frame)?,
        };
        let end = match path.lead_out.lead_type {
            LeadType::Perpendicular => geometry::end(first_cut, &self.frame)?,
            _ => geometry::end(geometry::first(&path.lead_out.geometry, "saw lead-out")?, &self.frame)?,
        };
        let route = sequencer::route_saw(geometry::segment_direction(first_cut, &self.frame)?, tilt_angle);
        let free_direction = matches!(route, SawRoute::Planar | SawRoute::Angular(_));
        let d = &self.f.double;

        let mut line = block_start(route.block_code(), "2");
        line.push_str(" #8098=..\\custom\\mcr\\lame.tmcr #6=1");
        line.push_str(&format!(" #8503={}", d.format(pass.width)));
        if free_direction {
            line.push_str(" #8504 = subang #8508=0");
        }
        line.push_str(&format!(" #8509={}", route.axis_code()));
        line.push_str(&format!(" #8510={} #8511={}", d.format(start.x), d.format(start.y)));
        if pass.scoring_depth == pass.depth {
            line.push_str(&format!(" #8512={}", d.format(-pass.depth)));
        } else {
            line.push_str(&format!(
                " #8512={} #8513={}",
                d.format(-pass.scoring_depth),
                d.format(-pass.depth)
            ));
        }
        line.push_str(" #8514=1 #8515=1");
        line.push_str(&format!(" #8516={}", operation.spindle.code));
        if route != SawRoute::AlongY {
            line.push_str(&format!(" #8517={}", d.format(end.x)));
        }
        if route != SawRoute::AlongX {
            line.push_str(&format!(" #8518={}", d.format(end.y)));
        }
        match route {
            SawRoute::Planar => line.push_str(" #8521=90.0"),
            SawRoute::Angular(tilt) => line.push_str(&format!(" #8521={}", self.f.angle.format(tilt))),
            SawRoute::AlongX | SawRoute::AlongY => {}
        }
        line.push_str(&format!(" #8525={}", self.f.int.format(pass.compensation as f64)));
        line.push_str(if pass.scoring_depth == pass.depth { " #8526=0" } else { " #8526=1" });
        line.push_str(" #8527=0");
        if free_direction {
            line.push_str(" #8531=0 #8532=0 #8533=1 #8535=0");
        }
        line.push_str(BLOCK_END);
        self.out.emit(&line);
        Ok(())
    }

    fn tool_definition(&self, operation: &Operation) -> String {
        match operation.spindle.tool_identified_by {
            ToolIdentifiedBy::ByHoleDiameter => format!(" #1002={}", self.f.double.format(operation.spindle.tool.diameter)),
            _ => format!(" #205={}", operation.spindle.code),
        }
    }

    fn point(&self, p: Point3<f64>, z: f64) -> String {
        format!(
            " #1={} #2={} #3={} #8015=0",
            self.f.double.format(p.x),
            self.f.double.format(p.y),
            self.f.double.format(z)
        )
    }

    fn cutting_parameters(&self, cutting: &CuttingParameters) -> String {
        let mut words = String::new();
        if cutting.cutting_feedrate != 0.0 {
            words.push_str(&format!(" #2005={}", self.f.feed.format(cutting.cutting_feedrate)));
        }
        if cutting.speed != 0.0 {
            words.push_str(&format!(" #2002={}", self.f.rpm.format(cutting.speed)));
        }
        words
    }
}

/// Depths, width and compensation of one saw block.
#[derive(Debug, Clone, Copy)]
struct SawPass {
    depth: f64,
    scoring_depth: f64,
    width: f64,
    compensation: u32,
}

const BLOCK_END: &str = " }W";

fn block_start(code: u32, work_type: &str) -> String {
    format!("W#{}{{ ::WT{}", code, work_type)
}

fn tool_type(value: u32) -> String {
    format!(" #1001={}", value)
}
