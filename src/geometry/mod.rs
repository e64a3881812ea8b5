//! Typed access to geometry primitives in a given frame.

use cgmath::{InnerSpace, Point3, Vector3};

use crate::error::{PostError, Result};
use crate::frame::Frame;
use crate::job::{Arc, Geometry};

/// Which point of a primitive to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Start,
    End,
    Center,
}

fn invalid(expected: &str, geometry: &Geometry) -> PostError {
    PostError::InvalidGeometry {
        expected: expected.to_string(),
        got: geometry.type_name().to_string(),
    }
}

/// Point of `geometry` at `position`, projected into `frame`.
///
/// A Point answers every position with itself; only an Arc has a center.
pub fn point_at(geometry: &Geometry, position: Position, frame: &Frame) -> Result<Point3<f64>> {
    let p = match (geometry, position) {
        (Geometry::Point(p), _) => p,
        (Geometry::Segment(s), Position::Start) => &s.start_point,
        (Geometry::Segment(s), Position::End) => &s.end_point,
        (Geometry::Arc(a), Position::Start) => &a.start_point,
        (Geometry::Arc(a), Position::End) => &a.end_point,
        (Geometry::Arc(a), Position::Center) => &a.center_point,
        (Geometry::Segment(_), Position::Center) => return Err(invalid("Arc", geometry)),
        (Geometry::Unknown, _) => return Err(invalid("Point, Segment or Arc", geometry)),
    };
    Ok(frame.to_local_point(p.to_point()))
}

pub fn start(geometry: &Geometry, frame: &Frame) -> Result<Point3<f64>> {
    point_at(geometry, Position::Start, frame)
}

pub fn end(geometry: &Geometry, frame: &Frame) -> Result<Point3<f64>> {
    point_at(geometry, Position::End, frame)
}

pub fn center(geometry: &Geometry, frame: &Frame) -> Result<Point3<f64>> {
    point_at(geometry, Position::Center, frame)
}

/// Unit direction at the start of a Segment or Arc, projected into `frame`.
pub fn direction(geometry: &Geometry, frame: &Frame) -> Result<Vector3<f64>> {
    let v = match geometry {
        Geometry::Segment(s) => s.end_point.to_point() - s.start_point.to_point(),
        Geometry::Arc(a) => arc_start_tangent(a),
        _ => return Err(invalid("Segment or Arc", geometry)),
    };
    Ok(frame.to_local_vector(normalize_or_zero(v)))
}

/// Direction of a straight saw path.
pub fn segment_direction(geometry: &Geometry, frame: &Frame) -> Result<Vector3<f64>> {
    match geometry {
        Geometry::Segment(_) => direction(geometry, frame),
        _ => Err(invalid("Segment", geometry)),
    }
}

/// Down-cast to an Arc.
pub fn as_arc(geometry: &Geometry) -> Result<&Arc> {
    match geometry {
        Geometry::Arc(arc) => Ok(arc),
        _ => Err(invalid("Arc", geometry)),
    }
}

pub fn first<'a>(geometry: &'a [Geometry], what: &str) -> Result<&'a Geometry> {
    geometry
        .first()
        .ok_or_else(|| PostError::MissingGeometry(what.to_string()))
}

pub fn last<'a>(geometry: &'a [Geometry], what: &str) -> Result<&'a Geometry> {
    geometry
        .last()
        .ok_or_else(|| PostError::MissingGeometry(what.to_string()))
}

// Tangent in the arc plane, which is the XY plane of the arc's own frame.
fn arc_start_tangent(arc: &Arc) -> Vector3<f64> {
    let r = arc.start_point.to_point() - arc.center_point.to_point();
    let ccw = Vector3::new(-r.y, r.x, 0.0);
    if arc.counterclockwise {
        ccw
    } else {
        -ccw
    }
}

fn normalize_or_zero(v: Vector3<f64>) -> Vector3<f64> {
    if v.magnitude2() == 0.0 {
        v
    } else {
        v.normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{Point3d, Segment};

    fn segment(x1: f64, y1: f64, x2: f64, y2: f64) -> Geometry {
        Geometry::Segment(Segment {
            start_point: Point3d::new(x1, y1, 0.0),
            end_point: Point3d::new(x2, y2, 0.0),
        })
    }

    fn quarter_arc(ccw: bool) -> Geometry {
        Geometry::Arc(Arc {
            start_point: Point3d::new(1.0, 0.0, 0.0),
            end_point: Point3d::new(0.0, 1.0, 0.0),
            center_point: Point3d::new(0.0, 0.0, 0.0),
            radius: 1.0,
            counterclockwise: ccw,
            angle: std::f64::consts::FRAC_PI_2,
        })
    }

    #[test]
    fn test_point_answers_every_position() {
        let g = Geometry::Point(Point3d::new(1.0, 2.0, 3.0));
        let frame = Frame::identity();
        for pos in [Position::Start, Position::End, Position::Center] {
            assert_eq!(point_at(&g, pos, &frame).unwrap(), Point3::new(1.0, 2.0, 3.0));
        }
    }

    #[test]
    fn test_segment_center_is_invalid() {
        let err = center(&segment(0.0, 0.0, 1.0, 0.0), &Frame::identity()).unwrap_err();
        assert!(matches!(err, PostError::InvalidGeometry { .. }));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_points_are_projected() {
        let frame = Frame::new(
            Point3::new(10.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
        );
        let p = end(&segment(0.0, 0.0, 15.0, 2.0), &frame).unwrap();
        assert_eq!(p, Point3::new(5.0, 2.0, 0.0));
    }

    #[test]
    fn test_directions() {
        let frame = Frame::identity();
        let d = direction(&segment(0.0, 0.0, 0.0, 4.0), &frame).unwrap();
        assert_eq!(d, Vector3::new(0.0, 1.0, 0.0));

        let d = direction(&quarter_arc(true), &frame).unwrap();
        assert!((d - Vector3::new(0.0, 1.0, 0.0)).magnitude() < 1e-12);
        let d = direction(&quarter_arc(false), &frame).unwrap();
        assert!((d - Vector3::new(0.0, -1.0, 0.0)).magnitude() < 1e-12);

        let point = Geometry::Point(Point3d::default());
        assert!(direction(&point, &frame).is_err());
        assert!(segment_direction(&quarter_arc(true), &frame).is_err());
    }

    #[test]
    fn test_empty_list_is_missing_geometry() {
        let err = first(&[], "lead-in").unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(err.to_string(), "missing geometry: lead-in");
        assert!(last(&[segment(0.0, 0.0, 1.0, 1.0)], "contour").is_ok());
    }
}
