//! Reference frames
//!
//! Job geometry is stored in clamping coordinates. Each postprocessor
//! declares where every stock face puts its machine origin and axes
//! ([`NamedFrame`]s built from [`PartSizes`]); [`ReferenceFrames`] picks
//! the active one per clamping and per side, and the resulting [`Frame`] is
//! handed explicitly to every geometry query.

use cgmath::{EuclideanSpace, InnerSpace, Point3, Vector3};

use crate::error::{PostError, Result};
use crate::job::{Clamping, Part, Side};
use crate::math::{is_same_direction, X_AXIS, Y_AXIS, Z_AXIS};

/// An origin and three axes, all expressed in the parent coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub origin: Point3<f64>,
    pub x: Vector3<f64>,
    pub y: Vector3<f64>,
    pub z: Vector3<f64>,
}

impl Default for Frame {
    fn default() -> Self {
        Self::identity()
    }
}

impl Frame {
    pub fn new(origin: Point3<f64>, x: Vector3<f64>, y: Vector3<f64>, z: Vector3<f64>) -> Self {
        Self { origin, x, y, z }
    }

    pub fn identity() -> Self {
        Self::new(Point3::origin(), X_AXIS, Y_AXIS, Z_AXIS)
    }

    /// Frame of a side as stored in the job.
    pub fn of_side(side: &Side) -> Self {
        Self::new(
            side.origin.to_point(),
            side.xaxis.to_vector(),
            side.yaxis.to_vector(),
            side.zaxis.to_vector(),
        )
    }

    pub fn to_local_point(&self, p: Point3<f64>) -> Point3<f64> {
        let d = p - self.origin;
        Point3::new(d.dot(self.x), d.dot(self.y), d.dot(self.z))
    }

    pub fn to_local_vector(&self, v: Vector3<f64>) -> Vector3<f64> {
        Vector3::new(v.dot(self.x), v.dot(self.y), v.dot(self.z))
    }

    pub fn to_parent_point(&self, p: Point3<f64>) -> Point3<f64> {
        self.origin + self.to_parent_vector(p.to_vec())
    }

    pub fn to_parent_vector(&self, v: Vector3<f64>) -> Vector3<f64> {
        self.x * v.x + self.y * v.y + self.z * v.z
    }

    /// `child` is expressed in this frame; the result is in our parent.
    pub fn compose(&self, child: &Frame) -> Frame {
        Frame::new(
            self.to_parent_point(child.origin),
            self.to_parent_vector(child.x),
            self.to_parent_vector(child.y),
            self.to_parent_vector(child.z),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartSizes {
    pub length: f64,
    pub width: f64,
    pub thickness: f64,
}

impl From<&Part> for PartSizes {
    fn from(part: &Part) -> Self {
        Self {
            length: part.length,
            width: part.width,
            thickness: part.thickness,
        }
    }
}

/// A side transform declared by a postprocessor.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedFrame {
    pub name: String,
    pub frame: Frame,
}

impl NamedFrame {
    pub fn new(
        name: &str,
        origin: (f64, f64, f64),
        x: (f64, f64, f64),
        y: (f64, f64, f64),
        z: (f64, f64, f64),
    ) -> Self {
        Self {
            name: name.to_string(),
            frame: Frame::new(
                Point3::new(origin.0, origin.1, origin.2),
                Vector3::new(x.0, x.1, x.2),
                Vector3::new(y.0, y.1, y.2),
                Vector3::new(z.0, z.1, z.2),
            ),
        }
    }
}

/// Selects the active frame for one clamping at a time.
#[derive(Debug, Clone)]
pub struct ReferenceFrames {
    post: String,
    transforms: Vec<NamedFrame>,
    clamping: Frame,
    current: Frame,
}

impl ReferenceFrames {
    pub fn new(post: &str, transforms: Vec<NamedFrame>) -> Self {
        Self {
            post: post.to_string(),
            transforms,
            clamping: Frame::identity(),
            current: Frame::identity(),
        }
    }

    pub fn current(&self) -> &Frame {
        &self.current
    }

    /// Clamping coordinates become the active frame.
    pub fn set_to_clamping(&mut self, _clamping: &Clamping) -> &Frame {
        self.clamping = Frame::identity();
        self.current = self.clamping;
        &self.current
    }

    /// Activate the transform declared under `name`.
    pub fn set_to_side(&mut self, name: &str) -> Result<&Frame> {
        let transform = self
            .transforms
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| PostError::UnsupportedSide {
                side: name.to_string(),
                post: self.post.clone(),
            })?;
        self.current = self.clamping.compose(&transform.frame);
        Ok(&self.current)
    }

    /// Activate the transform of the clamping side whose normal is `z`.
    ///
    /// Falls back to a transform declared with the same Z axis.
    pub fn set_to_side_axis(&mut self, sides: &[Side], z: Vector3<f64>) -> Result<&Frame> {
        let by_side = sides
            .iter()
            .filter(|side| is_same_direction(side.zaxis.to_vector(), z))
            .find_map(|side| self.transforms.iter().find(|t| t.name == side.name));
        let transform = by_side
            .or_else(|| self.transforms.iter().find(|t| is_same_direction(t.frame.z, z)))
            .ok_or_else(|| PostError::UnsupportedSide {
                side: format!("({}, {}, {})", z.x, z.y, z.z),
                post: self.post.clone(),
            })?;
        self.current = self.clamping.compose(&transform.frame);
        Ok(&self.current)
    }

    /// Activate an arbitrary frame given in clamping coordinates.
    pub fn set_custom_frame(&mut self, frame: Frame) -> &Frame {
        self.current = self.clamping.compose(&frame);
        &self.current
    }
}
