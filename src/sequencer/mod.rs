//! Toolpath sequencing
//!
//! Format independent decisions shared by the drivers: which depths a
//! contour is machined at, how a helical plunge is split into arcs, where a
//! saw cut really starts and which compensation code a format expects. The
//! drivers only render what this module computes.

use cgmath::{Point3, Vector3};
use tracing::debug;

use crate::error::Result;
use crate::frame::Frame;
use crate::geometry;
use crate::job::{Geometry, LeadType};
use crate::math::approx_equal;

pub mod compensation;
pub mod landing;
pub mod saw;

pub use compensation::*;
pub use landing::{HalfTurnLanding, IncrementalArc, LandingArc, OrbitalLandingPlan};
pub use saw::{recentre_saw_path, route_saw, SawCut, SawRoute};

/// Smallest depth difference that still makes a separate pass.
const ZERO_DEPTH: f64 = 1e-4;

/// Pass depths below the surface, shallow to deep, ending at `full_depth`.
///
/// A stepover below the depth resolution (zero, negative or NaN) means a
/// single pass at full depth. Passes within [`ZERO_DEPTH`] of the surface,
/// of the full depth or of the previous pass are dropped.
pub fn stepover_depths(full_depth: f64, stepover: f64) -> Vec<f64> {
    if stepover.is_nan() || stepover < ZERO_DEPTH {
        return vec![full_depth];
    }
    let mut candidates = Vec::new();
    let mut k = 1.0;
    while k * stepover < full_depth {
        candidates.push(full_depth - k * stepover);
        k += 1.0;
    }
    candidates.sort_by(|a, b| a.total_cmp(b));

    let mut depths: Vec<f64> = Vec::with_capacity(candidates.len() + 1);
    for depth in candidates {
        let clear_of_previous = depths.last().map_or(true, |prev| depth - prev > ZERO_DEPTH);
        if depth > ZERO_DEPTH && full_depth - depth > ZERO_DEPTH && clear_of_previous {
            depths.push(depth);
        }
    }
    depths.push(full_depth);
    depths
}

/// Raise offsets for geometry that already sits at full depth.
///
/// Each entry is subtracted from the geometry Z, so the negative entries
/// come first (shallow passes) and the last entry is `0`. The passes are
/// the same as [`stepover_depths`].
pub fn stepover_offsets(full_depth: f64, stepover: f64) -> Vec<f64> {
    let depths = stepover_depths(full_depth, stepover);
    let mut offsets: Vec<f64> = depths.iter().rev().skip(1).map(|depth| -depth).collect();
    offsets.push(0.0);
    offsets
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadEnd {
    In,
    Out,
}

/// Depths at the start and end of a lead, `None` when the lead is not cut.
pub fn lead_depths(lead_type: LeadType, end: LeadEnd, depth: f64) -> Option<(f64, f64)> {
    match (lead_type, end) {
        (LeadType::Tangent | LeadType::Arc, _) => Some((depth, depth)),
        (LeadType::Ramp, LeadEnd::In) => Some((0.0, depth)),
        (LeadType::Ramp, LeadEnd::Out) => Some((depth, 0.0)),
        (LeadType::Direct | LeadType::Perpendicular | LeadType::Unknown, _) => None,
    }
}

/// One primitive of a path, already projected into the active frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathStep {
    Point {
        at: Point3<f64>,
    },
    Line {
        start: Point3<f64>,
        end: Point3<f64>,
    },
    Arc {
        start: Point3<f64>,
        end: Point3<f64>,
        center: Point3<f64>,
        radius: f64,
        counterclockwise: bool,
        angle: f64,
    },
}

impl PathStep {
    pub fn start(&self) -> Point3<f64> {
        match *self {
            PathStep::Point { at } => at,
            PathStep::Line { start, .. } | PathStep::Arc { start, .. } => start,
        }
    }

    pub fn end(&self) -> Point3<f64> {
        match *self {
            PathStep::Point { at } => at,
            PathStep::Line { end, .. } | PathStep::Arc { end, .. } => end,
        }
    }

    /// Center relative to the start, the I/J words of an arc move.
    pub fn center_offset(&self) -> Option<Vector3<f64>> {
        match *self {
            PathStep::Arc { start, center, .. } => Some(center - start),
            _ => None,
        }
    }
}

/// Flatten a geometry list into [`PathStep`]s in `frame`.
///
/// Unknown primitives carry no coordinates and are dropped.
pub fn walk_path(path: &[Geometry], frame: &Frame) -> Result<Vec<PathStep>> {
    let mut steps = Vec::with_capacity(path.len());
    for g in path {
        let step = match g {
            Geometry::Point(_) => PathStep::Point {
                at: geometry::start(g, frame)?,
            },
            Geometry::Segment(_) => PathStep::Line {
                start: geometry::start(g, frame)?,
                end: geometry::end(g, frame)?,
            },
            Geometry::Arc(arc) => PathStep::Arc {
                start: geometry::start(g, frame)?,
                end: geometry::end(g, frame)?,
                center: geometry::center(g, frame)?,
                radius: arc.radius,
                counterclockwise: arc.counterclockwise,
                angle: arc.angle,
            },
            Geometry::Unknown => {
                debug!("skipping unknown geometry primitive");
                continue;
            }
        };
        steps.push(step);
    }
    Ok(steps)
}

/// Drop the bridge elements of a nest contour.
///
/// Bridges are the elements that leave the height the contour starts at.
pub fn remove_bridges(steps: &[PathStep]) -> Vec<PathStep> {
    let Some(first) = steps.first() else {
        return Vec::new();
    };
    let height = first.start().z;
    steps
        .iter()
        .filter(|s| approx_equal(s.start().z, height, 1e-9) && approx_equal(s.end().z, height, 1e-9))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{Arc, Point3d, Segment};
    use proptest::prelude::*;

    fn seg(a: (f64, f64, f64), b: (f64, f64, f64)) -> Geometry {
        Geometry::Segment(Segment {
            start_point: Point3d::new(a.0, a.1, a.2),
            end_point: Point3d::new(b.0, b.1, b.2),
        })
    }

    #[test]
    fn test_stepover_depths_scenarios() {
        assert_eq!(stepover_depths(30.0, 10.0), vec![10.0, 20.0, 30.0]);
        assert_eq!(stepover_depths(25.0, 10.0), vec![5.0, 15.0, 25.0]);
        assert_eq!(stepover_depths(10.0, 0.0), vec![10.0]);
        assert_eq!(stepover_depths(5.0, 10.0), vec![5.0]);
    }

    #[test]
    fn test_stepover_offsets() {
        assert_eq!(stepover_offsets(3.0, 1.0), vec![-2.0, -1.0, 0.0]);
        assert_eq!(stepover_offsets(2.5, 1.0), vec![-1.5, -0.5, 0.0]);
        assert_eq!(stepover_offsets(2.0, 0.0), vec![0.0]);
    }

    #[test]
    fn test_stepover_without_surface_pass() {
        // 0.9 - 3 * 0.3 lands just off zero
        let depths = stepover_depths(0.9, 0.3);
        assert_eq!(depths.len(), 3);
        assert!(depths.iter().all(|d| *d > ZERO_DEPTH));
        assert_eq!(*depths.last().unwrap(), 0.9);

        let offsets = stepover_offsets(0.9, 0.3);
        assert_eq!(offsets.len(), 3);
        assert!(offsets.iter().all(|o| *o > -0.9 + ZERO_DEPTH));
        assert_eq!(*offsets.last().unwrap(), 0.0);
    }

    #[test]
    fn test_stepover_close_to_full_depth() {
        assert_eq!(stepover_depths(1.0, 0.99995), vec![1.0]);
        assert_eq!(stepover_offsets(1.0, 0.99995), vec![0.0]);
        assert_eq!(stepover_depths(1.0, 1.0), vec![1.0]);
    }

    #[test]
    fn test_non_positive_stepover_is_single_pass() {
        assert_eq!(stepover_depths(1.0, -0.1), vec![1.0]);
        assert_eq!(stepover_depths(1.0, f64::NAN), vec![1.0]);
        assert_eq!(stepover_depths(1.0, 1e-9), vec![1.0]);
        assert_eq!(stepover_offsets(1.0, -0.1), vec![0.0]);
        assert_eq!(stepover_offsets(1.0, f64::NAN), vec![0.0]);
    }

    #[test]
    fn test_lead_depths() {
        assert_eq!(lead_depths(LeadType::Ramp, LeadEnd::In, 2.0), Some((0.0, 2.0)));
        assert_eq!(lead_depths(LeadType::Ramp, LeadEnd::Out, 2.0), Some((2.0, 0.0)));
        assert_eq!(lead_depths(LeadType::Arc, LeadEnd::Out, 2.0), Some((2.0, 2.0)));
        assert_eq!(lead_depths(LeadType::Direct, LeadEnd::In, 2.0), None);
        assert_eq!(lead_depths(LeadType::Perpendicular, LeadEnd::Out, 2.0), None);
    }

    #[test]
    fn test_walk_path_projects_and_skips_unknown() {
        let frame = Frame::new(
            Point3::new(0.0, 10.0, 0.0),
            Vector3::new(0.0, -1.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
        );
        let arc = Geometry::Arc(Arc {
            start_point: Point3d::new(1.0, 0.0, 0.0),
            end_point: Point3d::new(0.0, 1.0, 0.0),
            center_point: Point3d::new(0.0, 0.0, 0.0),
            radius: 1.0,
            counterclockwise: true,
            angle: std::f64::consts::FRAC_PI_2,
        });
        let steps = walk_path(&[seg((0.0, 0.0, 0.0), (2.0, 0.0, 0.0)), Geometry::Unknown, arc], &frame).unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].start(), Point3::new(10.0, 0.0, 0.0));
        assert_eq!(steps[0].end(), Point3::new(10.0, 2.0, 0.0));
        assert_eq!(steps[1].center_offset(), Some(Vector3::new(0.0, -1.0, 0.0)));
        assert_eq!(steps[0].center_offset(), None);
    }

    #[test]
    fn test_remove_bridges() {
        let path = [
            seg((0.0, 0.0, -1.8), (5.0, 0.0, -1.8)),
            seg((5.0, 0.0, -1.8), (5.0, 0.0, -1.4)),
            seg((5.0, 0.0, -1.4), (7.0, 0.0, -1.4)),
            seg((7.0, 0.0, -1.4), (7.0, 0.0, -1.8)),
            seg((7.0, 0.0, -1.8), (12.0, 0.0, -1.8)),
        ];
        let steps = walk_path(&path, &Frame::identity()).unwrap();
        let kept = remove_bridges(&steps);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[1].end(), Point3::new(12.0, 0.0, -1.8));
        assert!(remove_bridges(&[]).is_empty());
    }

    proptest! {
        #[test]
        fn prop_depths_ascend_to_full_depth(d in 0.1f64..50.0, s in 0.05f64..20.0) {
            let depths = stepover_depths(d, s);
            let (last, passes) = depths.split_last().unwrap();
            prop_assert_eq!(*last, d);
            prop_assert!(passes.iter().all(|v| *v > 0.0 && *v < d));
            prop_assert!(depths.windows(2).all(|w| w[1] - w[0] >= ZERO_DEPTH));
        }

        #[test]
        fn prop_offsets_end_at_zero(d in 0.1f64..50.0, s in 0.05f64..20.0) {
            let offsets = stepover_offsets(d, s);
            let (last, passes) = offsets.split_last().unwrap();
            prop_assert_eq!(*last, 0.0);
            prop_assert!(passes.iter().all(|v| *v > -d && *v < 0.0));
            prop_assert!(offsets.windows(2).all(|w| w[1] - w[0] >= ZERO_DEPTH));
        }
    }
}
