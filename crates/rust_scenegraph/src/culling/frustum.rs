//! Camera view frustum and containment tests
//!
//! The six planes are pulled straight out of the combined clip matrix
//! (Gribb-Hartmann extraction), so they live in world space and their normals
//! point into the frustum.

use crate::foundation::math::{Mat4, Vec3, Vec4};
use crate::geometry::{BoxCorners, Plane, AABB};
use crate::render::{Camera, Projection};

/// Names the six frustum planes, indexing [`Frustum::planes`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrustumPlane {
    /// Top clipping plane
    Up = 0,
    /// Bottom clipping plane
    Down = 1,
    /// Left clipping plane
    Left = 2,
    /// Right clipping plane
    Right = 3,
    /// Near clipping plane
    Near = 4,
    /// Far clipping plane
    Far = 5,
}

/// World-space view frustum of a camera
///
/// Rebuilt every frame; it only snapshots the camera it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Camera the frustum was built from
    pub camera: Camera,
    /// Viewport aspect ratio used for the projection
    pub aspect: f32,
    /// View matrix of the camera
    pub view: Mat4,
    /// Projection matrix of the camera
    pub projection: Mat4,
    /// Unit-normalized planes, in [`FrustumPlane`] order
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Build the frustum of a perspective camera
    ///
    /// Returns `None` (with a warning) for orthographic cameras, which are not
    /// supported.
    pub fn from_camera(camera: &Camera, aspect: f32) -> Option<Self> {
        if camera.projection == Projection::Orthographic {
            log::warn!("Frustum extraction is not supported for orthographic cameras");
            return None;
        }

        let view = camera.view_matrix();
        let projection = camera.projection_matrix(aspect);
        let clip = projection * view;

        let row = |i: usize| -> Vec4 { clip.row(i).transpose() };
        let (x, y, z, w) = (row(0), row(1), row(2), row(3));

        let planes = [
            Plane::from_coefficients(w - y), // up
            Plane::from_coefficients(w + y), // down
            Plane::from_coefficients(w + x), // left
            Plane::from_coefficients(w - x), // right
            Plane::from_coefficients(w + z), // near
            Plane::from_coefficients(w - z), // far
        ];

        Some(Self {
            camera: *camera,
            aspect,
            view,
            projection,
            planes,
        })
    }

    /// Access one plane by name
    pub fn plane(&self, which: FrustumPlane) -> &Plane {
        &self.planes[which as usize]
    }

    /// True if the point is strictly above all planes
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.contains_sphere(point, 0.0)
    }

    /// True unless the whole sphere lies under a single plane
    ///
    /// Conservative: spheres near a frustum edge may pass while being outside.
    pub fn contains_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.distance_to_point(center) > -radius)
    }

    /// True unless all 8 corners of the box lie under a single plane
    ///
    /// A box straddling two planes without being behind either still passes.
    pub fn contains_box(&self, aabb: &AABB) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.box_corners_behind(aabb) != BoxCorners::all())
    }
}
