//! Mach3 2D G-code
//!
//! One program per clamping. Only operations on the top side are
//! machined; the program is written in absolute coordinates with the
//! origin on the top face of the clamping.

use cgmath::{EuclideanSpace, Point3, Vector3};
use tracing::{debug, warn};

use super::{program_stem, PostOutput, PostProcessor};
use crate::config::{GcodeSettings, OutputUnit, PostConfig};
use crate::emitter::{LineWriter, Modal, NumberFormat, RenderState, Scale};
use crate::error::{PostError, Result};
use crate::frame::{Frame, NamedFrame, PartSizes, ReferenceFrames};
use crate::geometry;
use crate::job::{
    Clamping, Contour, CuttingParameters, DrillTrajectory, Geometry, Job, Lead, LeadType, MillTrajectory,
    NestTrajectory, Operation, OperationKind, PockTrajectory, RotationDirection, Spindle, Trajectory,
};
use crate::math::{is_same_direction, Z_AXIS};
use crate::sequencer::{self, HalfTurnLanding, PathStep, ToolCorrection};

const NAME: &str = "G-code 2D Mach3";

/// Mach3/Mach4 2D milling and drilling
pub struct Mach3Post {
    unit: OutputUnit,
    settings: GcodeSettings,
}

impl Mach3Post {
    pub fn new(config: &PostConfig) -> Self {
        Self {
            unit: config.unit,
            settings: config.gcode.clone(),
        }
    }
}

impl PostProcessor for Mach3Post {
    fn name(&self) -> &str {
        NAME
    }

    fn file_extension(&self) -> &str {
        "nc"
    }

    fn side_transforms(&self, sizes: &PartSizes, called_from_nesting: bool) -> Vec<NamedFrame> {
        let top = if called_from_nesting {
            // Nesting sheets are turned a quarter turn on the table
            NamedFrame::new(
                "Top",
                (0.0, sizes.width, 0.0),
                (0.0, -1.0, 0.0),
                (1.0, 0.0, 0.0),
                (0.0, 0.0, 1.0),
            )
        } else {
            NamedFrame::new(
                "Top",
                (0.0, 0.0, 0.0),
                (1.0, 0.0, 0.0),
                (0.0, 1.0, 0.0),
                (0.0, 0.0, 1.0),
            )
        };
        vec![top]
    }

    fn process(&self, job: &Job) -> Result<Vec<PostOutput>> {
        let mut state = RenderState::new();
        let mut outputs = Vec::with_capacity(job.clampings.len());

        for (index, clamping) in job.clampings.iter().enumerate() {
            debug!(clamping = %job.clamping_label(index), "writing G-code program");
            let transforms = self.side_transforms(
                &PartSizes::from(&clamping.part),
                job.output_options.called_from_nesting,
            );
            let mut frames = ReferenceFrames::new(NAME, transforms);
            let mut program = Program::new(&self.settings, self.unit);

            program.out.emit_raw("%");
            program.out.emit_raw(&state.next_program_word());
            program.main_info(job, clamping);
            program.clamping(job, clamping, &mut frames)?;
            program.out.emit_raw("%");

            outputs.push(PostOutput {
                file_stem: program_stem(&clamping.part.code, index),
                extension: self.file_extension().to_string(),
                logical_name: job.clamping_label(index),
                content: program.out.to_string(),
            });
        }
        Ok(outputs)
    }
}

/// Word formats and modal caches of one program.
struct Words {
    xyz: NumberFormat,
    g: NumberFormat,
    m: NumberFormat,
    t: NumberFormat,
    h: NumberFormat,
    g_var: Modal,
    m_var: Modal,
    feed: Modal,
    speed: Modal,
    g_modal: Modal,
    g_abs_inc: Modal,
    g_unit: Modal,
    x: Modal,
    y: Modal,
    z: Modal,
    i: Modal,
    j: Modal,
    r: Modal,
}

impl Words {
    fn new(unit: OutputUnit) -> Self {
        let decimals = if unit.is_metric() { 3 } else { 4 };
        let xyz = NumberFormat::new(decimals).scale(Scale::length(unit)).force_decimal();
        let g = NumberFormat::new(0).prefix("G").width(2).zero_pad();
        let m = NumberFormat::new(0).prefix("M").width(2).zero_pad();
        let feed = NumberFormat::new(0).prefix("F").scale(Scale::length(unit));
        Self {
            t: NumberFormat::new(0).prefix("T").zero_pad(),
            h: NumberFormat::new(0).prefix("H").zero_pad(),
            g_var: Modal::new(g.clone()),
            m_var: Modal::new(m.clone()),
            feed: Modal::new(feed),
            speed: Modal::forced(NumberFormat::new(0).prefix("S")),
            g_modal: Modal::new(g.clone()),
            g_abs_inc: Modal::new(g.clone()),
            g_unit: Modal::new(g.clone()),
            x: Modal::new(xyz.clone().prefix("X")),
            y: Modal::new(xyz.clone().prefix("Y")),
            z: Modal::new(xyz.clone().prefix("Z")),
            i: Modal::forced(xyz.clone().prefix("I")),
            j: Modal::forced(xyz.clone().prefix("J")),
            r: Modal::forced(xyz.clone().prefix("R")),
            xyz,
            g,
            m,
        }
    }
}

/// One program file being written.
struct Program<'a> {
    settings: &'a GcodeSettings,
    unit: OutputUnit,
    out: LineWriter,
    w: Words,
    frame: Frame,
    correction: ToolCorrection,
    safe_plane: f64,
    clearance: f64,
    load_tool: bool,
    stop_tool: bool,
}

impl<'a> Program<'a> {
    fn new(settings: &'a GcodeSettings, unit: OutputUnit) -> Self {
        let mut out = LineWriter::new().with_spacer(&settings.words_spacer);
        if settings.line_numbers {
            out = out.with_line_numbers(10.0, 10.0);
        }
        Self {
            settings,
            unit,
            out,
            w: Words::new(unit),
            frame: Frame::identity(),
            correction: ToolCorrection::None,
            safe_plane: 0.0,
            clearance: 0.0,
            load_tool: true,
            stop_tool: true,
        }
    }

    // Lines that are nothing but a motion mode carry no information.
    fn words(&self, words: &[String]) -> String {
        let line = self.out.join_words(words);
        let bare_motion = (0..4).any(|code| line == self.w.g.format(code as f64));
        if bare_motion {
            String::new()
        } else {
            line
        }
    }

    fn emit_words(&mut self, words: &[String]) {
        let line = self.words(words);
        self.out.emit(&line);
    }

    fn comment(&mut self, words: &[&str]) {
        let line = self.out.comment(words);
        self.out.emit(&line);
    }

    fn additional_comment(&mut self, words: &[&str]) {
        if self.settings.additional_comments {
            self.comment(words);
        }
    }

    fn reset_modal(&mut self) {
        self.w.g_var.reset();
        self.w.g_modal.reset();
        self.w.x.reset();
        self.w.y.reset();
        self.w.z.reset();
    }

    fn rapid(&mut self, x: f64, y: f64, z: f64) {
        let words = [
            self.w.g_modal.format(0.0),
            self.w.x.format(x),
            self.w.y.format(y),
            self.w.z.format(z),
        ];
        self.emit_words(&words);
    }

    fn linear(&mut self, x: f64, y: f64, z: f64, feed: f64) {
        let words = [
            self.w.g_modal.format(1.0),
            self.w.x.format(x),
            self.w.y.format(y),
            self.w.z.format(z),
            self.w.feed.format(feed),
        ];
        self.emit_words(&words);
    }

    fn main_info(&mut self, job: &Job, clamping: &Clamping) {
        let part = &clamping.part;
        let xyz = self.w.xyz.clone();
        self.comment(&["File is generated by Woodwork for Inventor CAM"]);
        let name = if part.name.is_empty() {
            String::new()
        } else {
            format!("name= {}", part.name)
        };
        let code = if part.code.is_empty() {
            String::new()
        } else {
            format!("code= {}", part.code)
        };
        self.comment(&["Part:", name.as_str(), code.as_str()]);
        let unit = self.unit.label();
        self.comment(&["Units:", unit]);
        let (length, width, thickness) = (xyz.format(part.length), xyz.format(part.width), xyz.format(part.thickness));
        self.comment(&[
            "Size:",
            "length=",
            length.as_str(),
            "width=",
            width.as_str(),
            "thickness=",
            thickness.as_str(),
        ]);
        let safe = xyz.format(job.machine.safe_plane_height);
        self.comment(&["Safe plane height=", safe.as_str()]);
        let clear = xyz.format(job.machine.clearance_height);
        self.comment(&["Clearance height=", clear.as_str()]);
        self.comment(&["Output generated from", job.call_environment.as_str()]);
    }

    fn clamping(&mut self, job: &Job, clamping: &Clamping, frames: &mut ReferenceFrames) -> Result<()> {
        frames.set_to_clamping(clamping);
        self.job_start();
        for (index, operation) in clamping.operations.iter().enumerate() {
            self.check_tool_load_and_stop(&clamping.operations, index);
            let checkpoint = self.out.clone();
            match self.operation(job, clamping, operation, frames) {
                Ok(()) => {}
                Err(err) if err.is_recoverable() => {
                    warn!(operation = %operation.name, error = %err, "skipping operation");
                    self.out = checkpoint;
                    self.reset_modal();
                    self.w.m_var.reset();
                    self.w.feed.reset();
                    self.correction = ToolCorrection::None;
                    let message = format!("Operation {} skipped: {}", operation.name, err);
                    self.additional_comment(&[message.as_str()]);
                }
                Err(err) => return Err(err),
            }
        }
        self.job_end();
        Ok(())
    }

    fn check_tool_load_and_stop(&mut self, operations: &[Operation], index: usize) {
        let current = &operations[index].spindle;
        self.load_tool = match index.checked_sub(1) {
            Some(prev) => operations[prev].spindle.code != current.code,
            None => true,
        };
        self.stop_tool = match operations.get(index + 1) {
            Some(next) => {
                next.spindle.code != current.code
                    || next.spindle.tool.rotation_direction != current.tool.rotation_direction
            }
            None => true,
        };
    }

    fn job_start(&mut self) {
        let line = self.w.g_abs_inc.format(90.0);
        self.out.emit(&line);
        let unit = if self.unit.is_metric() { 21.0 } else { 20.0 };
        let line = self.w.g_unit.format(unit);
        self.out.emit(&line);
        let words = [
            self.w.g_var.format(92.0),
            self.w.x.format(0.0),
            self.w.y.format(0.0),
            self.w.z.format(0.0),
        ];
        self.emit_words(&words);
    }

    fn job_end(&mut self) {
        let line = self.w.m_var.format(5.0);
        self.out.emit(&line);
        let line = self.w.m_var.format(30.0);
        self.out.emit(&line);
    }

    fn operation(
        &mut self,
        job: &Job,
        clamping: &Clamping,
        operation: &Operation,
        frames: &mut ReferenceFrames,
    ) -> Result<()> {
        let side = clamping.side_of(operation)?;
        let normal = side.zaxis.to_vector();
        if !is_same_direction(Z_AXIS, normal) {
            debug!(operation = %operation.name, side = %side.name, "not a top side operation");
            self.additional_comment(&[
                "Some operations found on the",
                side.name.as_str(),
                "side and were skipped because the postprocessor is 2D and works only on the Top side",
            ]);
            return Ok(());
        }

        self.frame = *frames.set_to_side_axis(&clamping.sides, normal)?;
        let h = self.frame.to_local_point(Point3::origin()).z;
        self.safe_plane = h + job.machine.safe_plane_height;
        self.clearance = h + job.machine.clearance_height;
        debug!(operation = %operation.name, kind = operation.kind.type_name(), "G-code operation");

        match &operation.kind {
            OperationKind::Drill(drill) => {
                let label = if drill.is_thru { "THROUGH DRILLING" } else { "BLIND DRILLING" };
                self.operation_start(label, operation);
                for trajectory in &drill.trajectories {
                    match trajectory {
                        Trajectory::Drill(t) => self.drill_trajectory(t, &operation.cutting_parameters)?,
                        other => return Err(other.mismatch(operation)),
                    }
                }
                self.stop_spindle();
            }
            OperationKind::Mill(list) | OperationKind::MillCalibration(list) => {
                let label = match operation.kind {
                    OperationKind::Mill(_) => "MILLING",
                    _ => "CALIBRATION MILLING",
                };
                self.operation_start(label, operation);
                for trajectory in &list.trajectories {
                    match trajectory {
                        Trajectory::Mill(t) | Trajectory::MillCalibration(t) => self.mill_trajectory(t, operation)?,
                        other => return Err(other.mismatch(operation)),
                    }
                }
                self.stop_spindle();
            }
            OperationKind::Pocket(list) => {
                self.operation_start("POCKETING", operation);
                for trajectory in &list.trajectories {
                    match trajectory {
                        Trajectory::Pocket(t) => self.pocket_trajectory(t, operation)?,
                        other => return Err(other.mismatch(operation)),
                    }
                }
                self.stop_spindle();
            }
            OperationKind::Nesting(list) => {
                self.operation_start("NEST MILLING", operation);
                for trajectory in &list.trajectories {
                    match trajectory {
                        Trajectory::Nesting(t) => self.nest_trajectory(t, operation)?,
                        other => return Err(other.mismatch(operation)),
                    }
                }
                self.stop_spindle();
            }
            OperationKind::Cut(_) | OperationKind::Groove(_) | OperationKind::CutCalibration(_) => {
                self.additional_comment(&["Saw blade operations are not yet implemented"]);
            }
            OperationKind::Macro(_) => {
                self.additional_comment(&["Macro commands are not yet implemented"]);
            }
            OperationKind::Unknown => {
                warn!(operation = %operation.name, "unknown operation type");
            }
        }
        Ok(())
    }

    fn operation_start(&mut self, label: &str, operation: &Operation) {
        let spindle = &operation.spindle;
        let label = format!("{}:", label);
        let name = format!("{}; diameter=", spindle.name);
        let diameter = self.w.xyz.format(spindle.tool.diameter);
        self.comment(&[label.as_str(), name.as_str(), diameter.as_str()]);
        self.tool_change(spindle);
        self.spindle_rotation(operation);
    }

    fn tool_change(&mut self, spindle: &Spindle) {
        self.reset_modal();
        self.w.m_var.reset();
        self.w.feed.reset();
        self.correction = ToolCorrection::None;

        if !self.load_tool {
            return;
        }
        let number = spindle.tool_number();
        let words = [self.w.t.format(number), self.w.m.format(6.0)];
        self.emit_words(&words);
        if self.settings.tool_length_correction {
            let words = [self.w.g.format(43.0), self.w.h.format(number)];
            self.emit_words(&words);
        }
    }

    fn spindle_rotation(&mut self, operation: &Operation) {
        if !self.load_tool {
            return;
        }
        let direction = match operation.spindle.tool.rotation_direction {
            RotationDirection::Clockwise => 3.0,
            _ => 4.0,
        };
        let words = [
            self.w.m.format(direction),
            self.w.speed.format(operation.cutting_parameters.speed),
        ];
        self.emit_words(&words);
    }

    fn stop_spindle(&mut self) {
        if !self.stop_tool {
            return;
        }
        if self.settings.tool_length_correction {
            let words = [self.w.g.format(49.0), self.w.h.format(0.0)];
            self.emit_words(&words);
        }
        let line = self.w.m_var.format(5.0);
        self.out.emit(&line);
    }

    fn drill_trajectory(&mut self, trajectory: &DrillTrajectory, cutting: &CuttingParameters) -> Result<()> {
        let points = trajectory
            .geometry
            .iter()
            .map(|g| geometry::start(g, &self.frame))
            .collect::<Result<Vec<_>>>()?;
        let (Some(first), Some(last)) = (points.first().copied(), points.last().copied()) else {
            return Ok(());
        };

        self.rapid(first.x, first.y, self.safe_plane);
        for p in &points {
            self.rapid(p.x, p.y, self.clearance);
            self.w.g_modal.reset();
            self.linear(p.x, p.y, p.z - trajectory.breakthrough_depth, cutting.cutting_feedrate);
            self.w.g_modal.reset();
            self.rapid(p.x, p.y, self.clearance);
        }
        self.rapid(last.x, last.y, self.safe_plane);
        Ok(())
    }

    fn mill_trajectory(&mut self, trajectory: &MillTrajectory, operation: &Operation) -> Result<()> {
        let offsets = sequencer::stepover_offsets(trajectory.full_depth, trajectory.stepover);
        let cutting = &operation.cutting_parameters;
        self.reset_modal();
        self.additional_comment(&["To milling contour"]);
        self.tool_correction(&trajectory.mill_contour, cutting, tool_radius(operation))?;
        self.contour_passes(&trajectory.mill_contour, &offsets, cutting)?;
        self.tool_correction_off();
        Ok(())
    }

    fn pocket_trajectory(&mut self, trajectory: &PockTrajectory, operation: &Operation) -> Result<()> {
        let cutting = &operation.cutting_parameters;
        let radius = tool_radius(operation);
        let mut offsets = sequencer::stepover_offsets(trajectory.full_depth, trajectory.stepover);

        if let Some(first) = trajectory.middle_removal_contours.first() {
            self.reset_modal();
            self.additional_comment(&["To pocket middle removal"]);
            self.tool_correction(first, cutting, radius)?;
            for contour in &trajectory.middle_removal_contours {
                self.contour_passes(contour, &offsets, cutting)?;
            }
            self.tool_correction_off();
        }

        if let Some(first) = trajectory.finish_contours.first() {
            if !trajectory.finish_contour_stepover {
                offsets = sequencer::stepover_offsets(trajectory.full_depth, 0.0);
            }
            self.reset_modal();
            self.additional_comment(&["To pocketing finish contour"]);
            self.tool_correction(first, cutting, radius)?;
            for contour in &trajectory.finish_contours {
                self.contour_passes(contour, &offsets, cutting)?;
            }
            self.tool_correction_off();
        }
        Ok(())
    }

    fn nest_trajectory(&mut self, trajectory: &NestTrajectory, operation: &Operation) -> Result<()> {
        let offsets = sequencer::stepover_offsets(trajectory.full_depth, trajectory.stepover);
        let cutting = &operation.cutting_parameters;
        let contour = &trajectory.nest_contour;
        self.reset_modal();
        self.additional_comment(&["To nest milling contour"]);
        self.tool_correction(contour, cutting, tool_radius(operation))?;

        let main = sequencer::walk_path(&contour.main_contour.geometry, &self.frame)?;
        for &depth in &offsets {
            self.lead_in(&contour.lead_in, depth, cutting)?;
            self.additional_comment(&["Contour"]);
            let bridged = main
                .first()
                .map(|step| (step.start().z - depth).abs() - trajectory.bridge_height < 0.0)
                .unwrap_or(false);
            let steps = if bridged { sequencer::remove_bridges(&main) } else { main.clone() };
            for step in &steps {
                self.work_point(step, depth, cutting.cutting_feedrate);
            }
            self.lead_out(&contour.lead_out, depth, cutting)?;
        }

        self.tool_correction_off();
        Ok(())
    }

    /// Orbital landing, then lead-in, contour and lead-out at every depth.
    fn contour_passes(&mut self, contour: &Contour, offsets: &[f64], cutting: &CuttingParameters) -> Result<()> {
        self.orbital_landing(contour, cutting)?;
        let main = sequencer::walk_path(&contour.main_contour.geometry, &self.frame)?;
        for &depth in offsets {
            self.lead_in(&contour.lead_in, depth, cutting)?;
            self.additional_comment(&["Contour"]);
            for step in &main {
                self.work_point(step, depth, cutting.cutting_feedrate);
            }
            self.lead_out(&contour.lead_out, depth, cutting)?;
        }
        Ok(())
    }

    fn tool_correction(&mut self, contour: &Contour, cutting: &CuttingParameters, tool_radius: f64) -> Result<()> {
        let lead = geometry::first(&contour.lead_in.geometry, "lead-in")?;
        let point = geometry::start(lead, &self.frame)?;
        self.correction = ToolCorrection::for_contour(contour.offset_type, contour.offset_side);
        if self.correction == ToolCorrection::None {
            self.rapid(point.x, point.y, self.safe_plane);
            return Ok(());
        }

        let pre_start = match lead {
            Geometry::Arc(_) => geometry::center(lead, &self.frame)?,
            _ => {
                let first = geometry::first(&contour.main_contour.geometry, "main contour")?;
                let direction = match first {
                    Geometry::Point(_) => Vector3::new(0.0, 0.0, 0.0),
                    _ => geometry::direction(first, &self.frame)?,
                };
                point + direction * (tool_radius * 1.1)
            }
        };
        self.rapid(pre_start.x, pre_start.y, self.safe_plane);
        self.rapid(pre_start.x, pre_start.y, self.clearance);

        if contour.lead_in.lead_type != LeadType::Tangent {
            if let Some(code) = self.correction.g_code() {
                let words = [
                    self.w.g_modal.format(1.0),
                    self.w.g_var.format(code as f64),
                    self.w.x.format(point.x),
                    self.w.y.format(point.y),
                    self.w.z.format(self.clearance),
                    self.w.feed.format(cutting.lead_in_feedrate),
                ];
                self.emit_words(&words);
                self.correction = ToolCorrection::Done;
            }
        }
        Ok(())
    }

    fn tool_correction_off(&mut self) {
        if self.correction == ToolCorrection::Done {
            let words = [self.w.g.format(40.0)];
            self.emit_words(&words);
            self.correction = ToolCorrection::None;
        }
        let words = [self.w.g_modal.format(0.0), self.w.z.format(self.safe_plane)];
        self.emit_words(&words);
    }

    fn orbital_landing(&mut self, contour: &Contour, cutting: &CuttingParameters) -> Result<()> {
        let landing = &contour.orbital_landing;
        if !landing.exists {
            return Ok(());
        }
        self.reset_modal();
        self.additional_comment(&["Orbital landing"]);

        let start = geometry::start(geometry::first(&landing.geometry, "orbital landing")?, &self.frame)?;
        let center_geometry = landing
            .geometry
            .get(1)
            .ok_or_else(|| PostError::MissingGeometry("orbital landing center".to_string()))?;
        let center = geometry::start(center_geometry, &self.frame)?;

        self.rapid(start.x, start.y, self.clearance);
        let words = [self.w.g.format(91.0)];
        self.emit_words(&words);

        let plan = HalfTurnLanding::new(start, center, landing.pitch, landing.full_depth, landing.radius);
        let motion = if landing.counterclockwise { 3.0 } else { 2.0 };
        for arc in &plan.arcs {
            self.w.g_modal.reset();
            self.w.x.reset();
            self.w.y.reset();
            self.w.z.reset();
            self.w.r.reset();
            let words = [
                self.w.g_modal.format(motion),
                self.w.x.format(arc.dx),
                self.w.y.format(arc.dy),
                self.w.z.format(arc.dz),
                self.w.r.format(arc.radius),
                self.w.feed.format(cutting.orbital_landing_feedrate),
            ];
            self.emit_words(&words);
        }

        let words = [self.w.g.format(90.0)];
        self.emit_words(&words);
        self.reset_modal();
        self.rapid(center.x, center.y, self.clearance);
        Ok(())
    }

    fn lead_in(&mut self, lead: &Lead, depth: f64, cutting: &CuttingParameters) -> Result<()> {
        self.additional_comment(&[lead.lead_type.name(), "leadIn"]);
        let plunge_feed = match lead.lead_type {
            LeadType::Direct | LeadType::Tangent => cutting.direct_landing_feedrate,
            LeadType::Arc => cutting.lead_in_feedrate,
            LeadType::Ramp => {
                let start = geometry::start(geometry::first(&lead.geometry, "lead-in")?, &self.frame)?;
                self.rapid(start.x, start.y, self.clearance);
                self.lead_work_points(lead, depth, cutting.lead_in_feedrate)?;
                return Ok(());
            }
            LeadType::Perpendicular | LeadType::Unknown => return Ok(()),
        };

        let start = geometry::start(geometry::first(&lead.geometry, "lead-in")?, &self.frame)?;
        self.rapid(start.x, start.y, self.clearance);
        self.linear(start.x, start.y, start.z - depth, plunge_feed);
        if lead.lead_type != LeadType::Direct {
            self.lead_work_points(lead, depth, cutting.lead_in_feedrate)?;
        }
        Ok(())
    }

    fn lead_out(&mut self, lead: &Lead, depth: f64, cutting: &CuttingParameters) -> Result<()> {
        self.additional_comment(&[lead.lead_type.name(), "leadOut"]);
        match lead.lead_type {
            LeadType::Direct => {}
            LeadType::Tangent | LeadType::Ramp | LeadType::Arc => {
                self.lead_work_points(lead, depth, cutting.lead_in_feedrate)?;
            }
            LeadType::Perpendicular | LeadType::Unknown => return Ok(()),
        }
        let end = geometry::end(geometry::last(&lead.geometry, "lead-out")?, &self.frame)?;
        self.rapid(end.x, end.y, self.clearance);
        Ok(())
    }

    fn lead_work_points(&mut self, lead: &Lead, depth: f64, feed: f64) -> Result<()> {
        for step in sequencer::walk_path(&lead.geometry, &self.frame)? {
            self.work_point(&step, depth, feed);
        }
        Ok(())
    }

    fn work_point(&mut self, step: &PathStep, depth: f64, feed: f64) {
        let end = step.end();
        let words = match step {
            PathStep::Point { .. } => [
                self.w.g_modal.format(1.0),
                String::new(),
                self.w.x.format(end.x),
                self.w.y.format(end.y),
                self.w.z.format(end.z - depth),
                String::new(),
                String::new(),
                self.w.feed.format(feed),
            ],
            PathStep::Line { .. } => {
                let motion = self.w.g_modal.format(1.0);
                let correction = match self.correction.g_code() {
                    Some(code) => {
                        self.correction = ToolCorrection::Done;
                        self.w.g_var.format(code as f64)
                    }
                    None => String::new(),
                };
                [
                    motion,
                    correction,
                    self.w.x.format(end.x),
                    self.w.y.format(end.y),
                    self.w.z.format(end.z - depth),
                    String::new(),
                    String::new(),
                    self.w.feed.format(feed),
                ]
            }
            PathStep::Arc { counterclockwise, .. } => {
                let offset = step.center_offset().unwrap_or_else(|| Vector3::new(0.0, 0.0, 0.0));
                [
                    self.w.g_modal.format(if *counterclockwise { 3.0 } else { 2.0 }),
                    String::new(),
                    self.w.x.format(end.x),
                    self.w.y.format(end.y),
                    self.w.z.format(end.z - depth),
                    self.w.i.format(offset.x),
                    self.w.j.format(offset.y),
                    self.w.feed.format(feed),
                ]
            }
        };
        self.emit_words(&words);
    }
}

fn tool_radius(operation: &Operation) -> f64 {
    operation.spindle.tool.diameter / 2.0
}
