//! Vector and unit helpers shared by all postprocessors.
//!
//! [`plane_angles`] and [`RunCounters`] are public API for macro-based formats.

use cgmath::{InnerSpace, Vector3};
use uom::si::angle::{degree, radian};
use uom::si::f64::{Angle, Length};
use uom::si::length::{centimeter, inch, millimeter};

pub const X_AXIS: Vector3<f64> = Vector3::new(1.0, 0.0, 0.0);
pub const Y_AXIS: Vector3<f64> = Vector3::new(0.0, 1.0, 0.0);
pub const Z_AXIS: Vector3<f64> = Vector3::new(0.0, 0.0, 1.0);

/// Default tolerance for direction comparisons.
pub const DIRECTION_TOLERANCE: f64 = 1e-6;

/// `+1` when turning `v1` toward `v2` is counterclockwise seen from `normal`.
pub fn rotation_sign(v1: Vector3<f64>, v2: Vector3<f64>, normal: Vector3<f64>) -> f64 {
    let n = normal.normalize();
    if v1.cross(v2).dot(n) > 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// Unsigned angle between two vectors in radians, `0` for a zero vector.
pub fn angle_between(a: Vector3<f64>, b: Vector3<f64>) -> f64 {
    if a.magnitude2() == 0.0 || b.magnitude2() == 0.0 {
        return 0.0;
    }
    a.cross(b).magnitude().atan2(a.dot(b))
}

pub fn approx_equal(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() < tolerance
}

pub fn is_same_direction(a: Vector3<f64>, b: Vector3<f64>) -> bool {
    angle_between(a, b) < DIRECTION_TOLERANCE
}

pub fn is_parallel(a: Vector3<f64>, b: Vector3<f64>) -> bool {
    let angle = angle_between(a, b);
    angle < DIRECTION_TOLERANCE || (std::f64::consts::PI - angle) < DIRECTION_TOLERANCE
}

/// Z-X'-Z'' rotation angles (degrees) taking the canonical axes onto a plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneAngles {
    pub z: f64,
    pub x: f64,
    pub z2: f64,
}

/// Decompose the orthonormal basis `(vx, vy, vz)` into [`PlaneAngles`].
///
/// `vy` is implied by the other two axes and kept for call-site symmetry.
pub fn plane_angles(vx: Vector3<f64>, _vy: Vector3<f64>, vz: Vector3<f64>) -> PlaneAngles {
    let tilt = angle_between(vz, Z_AXIS);

    if tilt < 0.01 {
        let z = rad_to_deg(angle_between(vx, X_AXIS)) * rotation_sign(X_AXIS, vx, Z_AXIS);
        return PlaneAngles { z, x: 0.0, z2: 0.0 };
    }

    if approx_equal(tilt, std::f64::consts::PI, 0.01) {
        let z = rad_to_deg(angle_between(vx, X_AXIS)) * rotation_sign(X_AXIS, vx, Z_AXIS);
        return PlaneAngles { z, x: 180.0, z2: 0.0 };
    }

    let nodes = vz.cross(Z_AXIS);
    let z = rad_to_deg(angle_between(nodes, X_AXIS)) * rotation_sign(X_AXIS, nodes, Z_AXIS);
    let x = rad_to_deg(tilt) * rotation_sign(Z_AXIS, vz, nodes);
    let z2 = rad_to_deg(angle_between(nodes, vx)) * rotation_sign(nodes, vx, vz);
    PlaneAngles { z, x, z2 }
}

pub fn cm_to_mm(value: f64) -> f64 {
    Length::new::<centimeter>(value).get::<millimeter>()
}

pub fn cm_to_inch(value: f64) -> f64 {
    Length::new::<centimeter>(value).get::<inch>()
}

pub fn rad_to_deg(value: f64) -> f64 {
    Angle::new::<radian>(value).get::<degree>()
}

/// Fixed three decimals, the precision used in operator facing text.
pub fn precision3(value: f64) -> String {
    format!("{:.3}", value)
}

/// Counters that must stay unique for the whole run.
#[derive(Debug, Default)]
pub struct RunCounters {
    coordinate_system: Option<u32>,
    macro_name: Option<u32>,
}

impl RunCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next coordinate system number. Numbering starts at 10.
    pub fn next_coordinate_system_number(&mut self, increment: u32) -> u32 {
        let next = self.coordinate_system.unwrap_or(10) + increment;
        self.coordinate_system = Some(next);
        next
    }

    /// `name1`, `name2`, ... in call order.
    pub fn unique_macro_name(&mut self, name: &str) -> String {
        let next = self.macro_name.unwrap_or(0) + 1;
        self.macro_name = Some(next);
        format!("{}{}", name, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, Matrix3};
    use proptest::prelude::*;

    fn assert_vec_close(a: Vector3<f64>, b: Vector3<f64>) {
        assert!((a - b).magnitude() < 1e-9, "{:?} != {:?}", a, b);
    }

    fn rebuild(angles: PlaneAngles) -> Matrix3<f64> {
        Matrix3::from_angle_z(Deg(angles.z))
            * Matrix3::from_angle_x(Deg(angles.x))
            * Matrix3::from_angle_z(Deg(angles.z2))
    }

    fn assert_round_trip(vx: Vector3<f64>, vy: Vector3<f64>, vz: Vector3<f64>) {
        let r = rebuild(plane_angles(vx, vy, vz));
        assert_vec_close(r * X_AXIS, vx);
        assert_vec_close(r * Y_AXIS, vy);
        assert_vec_close(r * Z_AXIS, vz);
    }

    #[test]
    fn test_rotation_sign() {
        assert_eq!(rotation_sign(X_AXIS, Y_AXIS, Z_AXIS), 1.0);
        assert_eq!(rotation_sign(Y_AXIS, X_AXIS, Z_AXIS), -1.0);
        // Normal length does not matter
        assert_eq!(rotation_sign(X_AXIS, Y_AXIS, Z_AXIS * 7.0), 1.0);
    }

    #[test]
    fn test_plane_angles_top() {
        let angles = plane_angles(X_AXIS, Y_AXIS, Z_AXIS);
        assert!(angles.z.abs() < 1e-9);
        assert_eq!(angles.x, 0.0);
        assert_eq!(angles.z2, 0.0);
    }

    #[test]
    fn test_plane_angles_rotated_top() {
        let vx = Vector3::new(0.0, 1.0, 0.0);
        let vy = Vector3::new(-1.0, 0.0, 0.0);
        let angles = plane_angles(vx, vy, Z_AXIS);
        assert!(approx_equal(angles.z, 90.0, 1e-9));
        assert_round_trip(vx, vy, Z_AXIS);
    }

    #[test]
    fn test_plane_angles_bottom() {
        let vx = X_AXIS;
        let vy = -Y_AXIS;
        let vz = -Z_AXIS;
        let angles = plane_angles(vx, vy, vz);
        assert_eq!(angles.x, 180.0);
        assert_round_trip(vx, vy, vz);
    }

    #[test]
    fn test_plane_angles_front_face() {
        // Front face: X along part length, Y up, Z pointing out of the front
        assert_round_trip(X_AXIS, Z_AXIS, -Y_AXIS);
    }

    #[test]
    fn test_plane_angles_inclined() {
        let s = std::f64::consts::FRAC_1_SQRT_2;
        let vx = X_AXIS;
        let vy = Vector3::new(0.0, s, s);
        let vz = Vector3::new(0.0, -s, s);
        assert_round_trip(vx, vy, vz);

        let vz = Vector3::new(1.0, 1.0, 1.0).normalize();
        let vx = Vector3::new(1.0, -1.0, 0.0).normalize();
        let vy = vz.cross(vx);
        assert_round_trip(vx, vy, vz);
    }

    #[test]
    fn test_unit_conversions() {
        assert!(approx_equal(cm_to_mm(2.5), 25.0, 1e-12));
        assert!(approx_equal(cm_to_inch(2.54), 1.0, 1e-12));
        assert!(approx_equal(rad_to_deg(std::f64::consts::PI), 180.0, 1e-12));
        assert_eq!(precision3(1.23456), "1.235");
        assert_eq!(precision3(2.0), "2.000");
    }

    #[test]
    fn test_run_counters() {
        let mut counters = RunCounters::new();
        assert_eq!(counters.next_coordinate_system_number(1), 11);
        assert_eq!(counters.next_coordinate_system_number(5), 16);
        assert_eq!(counters.unique_macro_name("Hinge"), "Hinge1");
        assert_eq!(counters.unique_macro_name("Hinge"), "Hinge2");

        let mut fresh = RunCounters::new();
        assert_eq!(fresh.unique_macro_name("Lock"), "Lock1");
    }

    #[test]
    fn test_parallel_checks() {
        assert!(is_parallel(X_AXIS, -X_AXIS));
        assert!(!is_same_direction(X_AXIS, -X_AXIS));
        assert!(is_same_direction(Z_AXIS, Z_AXIS * 3.0));
        assert!(!is_parallel(X_AXIS, Y_AXIS));
    }

    proptest! {
        #[test]
        fn prop_rotation_sign_antisymmetric(
            ax in -10.0f64..10.0, ay in -10.0f64..10.0, az in -10.0f64..10.0,
            bx in -10.0f64..10.0, by in -10.0f64..10.0, bz in -10.0f64..10.0,
        ) {
            let a = Vector3::new(ax, ay, az);
            let b = Vector3::new(bx, by, bz);
            let n = a.cross(b);
            prop_assume!(n.magnitude() > 1e-3);
            prop_assert_eq!(rotation_sign(a, b, n), -rotation_sign(b, a, n));
        }
    }
}
