//! Straight saw cuts and grooves.

use std::f64::consts::FRAC_PI_2;

use cgmath::{InnerSpace, Matrix3, Point3, Rad, Vector3};

use crate::math::{angle_between, approx_equal, is_parallel, X_AXIS, Y_AXIS};

/// A saw pass reduced to the blade reference point and its heading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SawCut {
    pub start: Point3<f64>,
    /// Unsigned heading against +X, radians.
    pub angle: f64,
    /// Distance between the input ends.
    pub length: f64,
}

fn rotate_z(v: Vector3<f64>, angle: f64) -> Vector3<f64> {
    Matrix3::from_angle_z(Rad(angle)) * v
}

/// Move a saw path onto the groove channel reference used by optimizers.
///
/// The path is turned to point into +Y (or along +X), the kerf is placed
/// on the side given by `opside` (0 left, 1 right) and the start is
/// rotated about the channel center by the heading.
pub fn recentre_saw_path(
    start: Point3<f64>,
    end: Point3<f64>,
    direction: Vector3<f64>,
    width: f64,
    opside: u32,
) -> SawCut {
    let length = (end - start).magnitude();
    let (mut start, mut end, mut dir, mut opside) = (start, end, direction, opside);

    if dir.y <= 0.0 && dir.x != 1.0 {
        std::mem::swap(&mut start, &mut end);
        opside = match opside {
            0 => 1,
            1 => 0,
            other => other,
        };
        dir = -dir;
    }

    let unit = if dir.magnitude2() > 0.0 { dir.normalize() } else { dir };
    if opside == 0 {
        let shift = rotate_z(unit, -FRAC_PI_2) * width;
        start += shift;
        end += shift;
    }

    let half = (end - start) * 0.5 + rotate_z(unit, FRAC_PI_2) * (width * 0.5);
    let center = start + half;

    let angle = angle_between(dir, X_AXIS);
    let new_start = center + rotate_z(start - center, -angle);

    SawCut {
        start: new_start,
        angle,
        length,
    }
}

/// Saw block variant of a Format-4 program.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SawRoute {
    /// Vertical blade along X, `W#1050`.
    AlongX,
    /// Vertical blade along Y, `W#1051`.
    AlongY,
    /// Vertical blade in any other direction, `W#1052`.
    Planar,
    /// Tilted blade, `W#1052` with the tilt angle in radians.
    Angular(f64),
}

impl SawRoute {
    pub fn block_code(&self) -> u32 {
        match self {
            SawRoute::AlongX => 1050,
            SawRoute::AlongY => 1051,
            SawRoute::Planar | SawRoute::Angular(_) => 1052,
        }
    }

    /// `#8509` of the block.
    pub fn axis_code(&self) -> u32 {
        match self {
            SawRoute::AlongX => 0,
            SawRoute::AlongY => 1,
            SawRoute::Planar | SawRoute::Angular(_) => 2,
        }
    }
}

pub fn route_saw(cut_vector: Vector3<f64>, tilt_angle: f64) -> SawRoute {
    let vertical = approx_equal(tilt_angle, FRAC_PI_2, 1e-9);
    if !vertical {
        SawRoute::Angular(tilt_angle)
    } else if is_parallel(cut_vector, X_AXIS) {
        SawRoute::AlongX
    } else if is_parallel(cut_vector, Y_AXIS) {
        SawRoute::AlongY
    } else {
        SawRoute::Planar
    }
}
