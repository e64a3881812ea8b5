//! Orbital landing: plunging on a helix instead of straight down.

use std::f64::consts::PI;

use cgmath::{InnerSpace, Matrix3, Point3, Rad, Vector3};

/// One helix arc, both points at zero height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandingArc {
    pub start: Point3<f64>,
    pub end: Point3<f64>,
    /// Cumulative step down reached at the end of the arc.
    pub descent: f64,
}

/// Helix split into equal arcs of less than a full turn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitalLandingPlan {
    pub arc_count: usize,
    /// Signed, negative when the landing turns clockwise.
    pub one_arc_angle: f64,
    pub step_down: f64,
}

impl OrbitalLandingPlan {
    pub fn new(full_depth: f64, pitch: f64, counterclockwise: bool) -> Self {
        let loops = if pitch > 0.0 { full_depth / pitch } else { 0.0 };
        let total_angle = 2.0 * PI * loops;
        let mut arc_count = loops.ceil().max(1.0);
        let mut one_arc_angle = total_angle / arc_count;
        if one_arc_angle >= 2.0 * PI {
            arc_count += 1.0;
            one_arc_angle = total_angle / arc_count;
        }
        let step_down = full_depth / arc_count;
        if !counterclockwise {
            one_arc_angle = -one_arc_angle;
        }
        Self {
            arc_count: arc_count as usize,
            one_arc_angle,
            step_down,
        }
    }

    /// Arcs around `center`, starting at `start`. Heights are flattened.
    pub fn arcs(&self, center: Point3<f64>, start: Point3<f64>) -> Vec<LandingArc> {
        let center = Point3::new(center.x, center.y, 0.0);
        let mut start = Point3::new(start.x, start.y, 0.0);
        let rotation = Matrix3::from_angle_z(Rad(self.one_arc_angle));
        let mut radius = start - center;
        let mut descent = 0.0;
        let mut arcs = Vec::with_capacity(self.arc_count);
        for _ in 0..self.arc_count {
            radius = rotation * radius;
            let end = center + radius;
            descent += self.step_down;
            arcs.push(LandingArc { start, end, descent });
            start = end;
        }
        arcs
    }
}

/// Incremental (`G91`) arc move of the half turn landing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncrementalArc {
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
    pub radius: f64,
}

/// Half circles of half a pitch each, then a clean-up turn and an arc
/// back to the center.
#[derive(Debug, Clone, PartialEq)]
pub struct HalfTurnLanding {
    pub arcs: Vec<IncrementalArc>,
}

impl HalfTurnLanding {
    pub fn new(start: Point3<f64>, center: Point3<f64>, pitch: f64, full_depth: f64, radius: f64) -> Self {
        let one_arc_depth = pitch / 2.0;
        let mut across = center - start;
        across.z = 0.0;
        if across.magnitude2() > 0.0 {
            across = across.normalize() * (radius * 2.0);
        }

        let mut arcs = Vec::new();
        let mut at = start;
        let mut push = |at: &mut Point3<f64>, v: Vector3<f64>, dz: f64, r: f64| {
            arcs.push(IncrementalArc { dx: v.x, dy: v.y, dz, radius: r });
            *at += v;
        };

        let mut landing_depth = one_arc_depth;
        loop {
            push(&mut at, across, -one_arc_depth, radius);
            across = -across;
            landing_depth += one_arc_depth;
            // A non-positive pitch would never reach the bottom.
            if !(landing_depth <= full_depth) || one_arc_depth <= 0.0 {
                break;
            }
        }

        landing_depth -= one_arc_depth;
        if landing_depth <= full_depth {
            push(&mut at, across, -(full_depth - landing_depth).abs(), radius);
            across = -across;
        }

        push(&mut at, across, 0.0, radius);

        let home = center - at;
        push(&mut at, home, 0.0, radius / 2.0);

        Self { arcs }
    }
}
