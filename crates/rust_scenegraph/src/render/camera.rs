//! # 3D Camera
//!
//! The camera provider consumed by the frustum builder: a position, a look-at
//! target, an up vector, a vertical field of view and a projection mode.
//!
//! Matrices follow the OpenGL conventions of the rendering API this crate sits
//! on: right-handed view space looking down -Z, clip-space depth in [-1, 1].

use crate::foundation::math::{utils, Mat4, Point3, Vec3};

/// Default near clipping distance
pub const DEFAULT_NEAR: f32 = 0.01;

/// Default far clipping distance
pub const DEFAULT_FAR: f32 = 1000.0;

/// Projection mode of a camera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Perspective projection driven by the vertical field of view
    Perspective,
    /// Orthographic projection; not supported by the frustum builder
    Orthographic,
}

/// 3D camera for frustum extraction
///
/// # Coordinate System
/// Standard right-handed Y-up world; the view matrix looks from `position`
/// toward `target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,

    /// Point the camera is looking at in world space
    pub target: Vec3,

    /// Up vector for camera orientation (typically [0, 1, 0])
    pub up: Vec3,

    /// Vertical field of view in radians
    pub fovy: f32,

    /// Projection mode
    pub projection: Projection,

    /// Distance to near clipping plane
    pub near: f32,

    /// Distance to far clipping plane
    pub far: f32,
}

impl Camera {
    /// Create a perspective camera looking at `target` with a Y-up orientation
    ///
    /// # Example
    /// ```rust
    /// use rust_scenegraph::foundation::math::Vec3;
    /// use rust_scenegraph::render::Camera;
    ///
    /// let camera = Camera::perspective(
    ///     Vec3::new(10.0, 10.0, 10.0),
    ///     Vec3::zeros(),
    ///     45.0,
    /// );
    /// assert!((camera.fovy - std::f32::consts::FRAC_PI_4).abs() < 1e-6);
    /// ```
    pub fn perspective(position: Vec3, target: Vec3, fovy_degrees: f32) -> Self {
        Self {
            position,
            target,
            up: Vec3::new(0.0, 1.0, 0.0),
            fovy: utils::deg_to_rad(fovy_degrees),
            projection: Projection::Perspective,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
        }
    }

    /// Override the clipping distances
    pub fn with_clip_planes(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    /// Update camera position in world space
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        log::trace!("Camera position updated to: {:?}", position);
    }

    /// Configure camera to look at a specific point with custom up vector
    ///
    /// The up vector doesn't need to be perpendicular to the view direction.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        self.target = target;
        self.up = up;
        log::trace!("Camera look_at updated - target: {:?}, up: {:?}", target, up);
    }

    /// Generate the world-to-camera view matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(
            &Point3::from(self.position),
            &Point3::from(self.target),
            &self.up,
        )
    }

    /// Generate the perspective projection matrix for a viewport aspect ratio
    ///
    /// The projection mode is not consulted here; callers that care about
    /// orthographic cameras check [`Camera::projection`] first.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::new_perspective(aspect, self.fovy, self.near, self.far)
    }
}

impl Default for Camera {
    /// Perspective camera at (0, 3, 3) looking at the origin, 45 degree FOV
    fn default() -> Self {
        Self::perspective(Vec3::new(0.0, 3.0, 3.0), Vec3::zeros(), 45.0)
    }
}
