//! Planes and plane/volume classification

use bitflags::bitflags;

use super::AABB;
use crate::foundation::math::{Vec3, Vec4};

bitflags! {
    /// Selects corners of a bounding box
    ///
    /// "Front" is the min-z face, "bottom" min-y and "left" min-x.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BoxCorners: u8 {
        /// (min.x, min.y, min.z)
        const FRONT_BOTTOM_LEFT = 1;
        /// (max.x, min.y, min.z)
        const FRONT_BOTTOM_RIGHT = 2;
        /// (min.x, max.y, min.z)
        const FRONT_TOP_LEFT = 4;
        /// (max.x, max.y, min.z)
        const FRONT_TOP_RIGHT = 8;
        /// (min.x, min.y, max.z)
        const BACK_BOTTOM_LEFT = 16;
        /// (max.x, min.y, max.z)
        const BACK_BOTTOM_RIGHT = 32;
        /// (min.x, max.y, max.z)
        const BACK_TOP_LEFT = 64;
        /// (max.x, max.y, max.z)
        const BACK_TOP_RIGHT = 128;
    }
}

/// Plane defined by normal and distance from origin
///
/// Frustum planes have their normal pointing into the frustum, so a point
/// touching or under a plane (signed distance `<= 0`) counts as outside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Normal vector (unit length for frustum planes, but not required)
    pub normal: Vec3,
    /// Distance term of the plane equation `normal · p + distance = 0`
    pub distance: f32,
}

impl Plane {
    /// Create a new plane from normal and distance, as given
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal, distance }
    }

    /// Build a plane from `(a, b, c, d)` coefficients, dividing all four by
    /// the length of `(a, b, c)`.
    ///
    /// A zero-length normal yields NaN components; that is a caller bug.
    pub fn from_coefficients(coefficients: Vec4) -> Self {
        let normal = coefficients.xyz();
        let length = normal.norm();
        Self {
            normal: normal / length,
            distance: coefficients.w / length,
        }
    }

    /// The plane as `(nx, ny, nz, d)`
    pub fn to_vec4(&self) -> Vec4 {
        Vec4::new(self.normal.x, self.normal.y, self.normal.z, self.distance)
    }

    /// Signed distance from the plane to a point. Negative means under the plane.
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        (self.normal.dot(&point) + self.distance) / self.normal.norm()
    }

    /// True if the point is touching or under the plane
    pub fn point_behind(&self, point: Vec3) -> bool {
        self.distance_to_point(point) <= 0.0
    }

    /// True if the sphere center is no further than `radius` above the plane
    pub fn sphere_behind(&self, center: Vec3, radius: f32) -> bool {
        self.distance_to_point(center) <= radius
    }

    /// True if any corner of the box is touching or under the plane
    pub fn box_touches(&self, aabb: &AABB) -> bool {
        aabb.corners().iter().any(|corner| self.point_behind(*corner))
    }

    /// Which corners of the box are touching or under the plane
    ///
    /// [`BoxCorners::all()`] means the whole box is on the outside.
    pub fn box_corners_behind(&self, aabb: &AABB) -> BoxCorners {
        aabb.corners()
            .iter()
            .enumerate()
            .filter(|(_, corner)| self.point_behind(**corner))
            .fold(BoxCorners::empty(), |flags, (bit, _)| {
                flags | BoxCorners::from_bits_truncate(1 << bit)
            })
    }
}
