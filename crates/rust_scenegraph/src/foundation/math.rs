//! Math utilities and types
//!
//! Provides the fundamental math types used by the scenegraph, plus the
//! matrix "space travel" helpers needed to decompose a node transform back
//! into position, scale and rotation.
//!
//! All matrices follow nalgebra's column-vector convention: a point `p` is
//! transformed as `m * p` and the translation lives in the fourth column.

pub use nalgebra::{Matrix3, Matrix4, Unit, Vector3, Vector4};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Local transform components of a scene node
///
/// Rotation is kept as a plain 3x3 matrix, separate from scale and
/// translation, so that repeated reparenting never accumulates shear into
/// the stored rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Translation
    pub position: Vec3,

    /// Per-axis scale factors
    pub scale: Vec3,

    /// Pure rotation matrix
    pub rotation: Mat3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            rotation: Mat3::identity(),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Compose into a single matrix: scale first, then rotation, then translation.
    pub fn to_matrix(&self) -> Mat4 {
        let mut rotation = Mat4::identity();
        rotation.fixed_view_mut::<3, 3>(0, 0).copy_from(&self.rotation);

        Mat4::new_translation(&self.position) * rotation * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Decompose an affine matrix into position, scale and rotation
    ///
    /// Scale is recovered as the length of each basis column, rotation as the
    /// normalized basis. Negative (mirroring) scales cannot be recovered: the
    /// column lengths are always positive, so the sign folds into the rotation.
    pub fn from_matrix(matrix: &Mat4) -> Self {
        Self {
            position: matrix_translation(matrix),
            scale: matrix_scale(matrix),
            rotation: matrix_rotation(matrix).fixed_view::<3, 3>(0, 0).into_owned(),
        }
    }
}

/// Normalize each basis axis of the transform matrix, cancelling its scale.
///
/// Does not check for zero-length axes.
pub fn matrix_normalize(matrix: &Mat4) -> Mat4 {
    let mut m = *matrix;
    for axis in 0..3 {
        let len = m.fixed_view::<3, 1>(0, axis).norm();
        m.fixed_view_mut::<3, 1>(0, axis).unscale_mut(len);
    }
    m
}

/// Strip translation and scale, leaving the rotation part in a 4x4 matrix.
pub fn matrix_rotation(matrix: &Mat4) -> Mat4 {
    let mut m = *matrix;
    m[(0, 3)] = 0.0;
    m[(1, 3)] = 0.0;
    m[(2, 3)] = 0.0;
    matrix_normalize(&m)
}

/// Translation part of an affine matrix
pub fn matrix_translation(matrix: &Mat4) -> Vec3 {
    Vec3::new(matrix[(0, 3)], matrix[(1, 3)], matrix[(2, 3)])
}

/// Absolute scale of each basis axis. Negative scales are not supported.
pub fn matrix_scale(matrix: &Mat4) -> Vec3 {
    Vec3::new(
        matrix.fixed_view::<3, 1>(0, 0).norm(),
        matrix.fixed_view::<3, 1>(0, 1).norm(),
        matrix.fixed_view::<3, 1>(0, 2).norm(),
    )
}

/// Rotation matrix around an arbitrary axis (the axis is normalized here)
pub fn rotation_around(axis: &Vec3, angle: f32) -> Mat3 {
    nalgebra::Rotation3::from_axis_angle(&Unit::new_normalize(*axis), angle).into_inner()
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_compose_applies_scale_then_rotation_then_translation() {
        let transform = Transform {
            position: Vec3::new(10.0, 0.0, 0.0),
            scale: Vec3::new(2.0, 1.0, 1.0),
            rotation: rotation_around(&Vec3::z(), constants::PI / 2.0),
        };

        // (1,0,0) -> scaled (2,0,0) -> rotated (0,2,0) -> translated (10,2,0)
        let p = transform.to_matrix().transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(10.0, 2.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_decompose_recovers_components() {
        let original = Transform {
            position: Vec3::new(1.0, -2.0, 3.5),
            scale: Vec3::new(0.5, 2.0, 3.0),
            rotation: rotation_around(&Vec3::new(1.0, 1.0, 0.0), 0.7),
        };

        let decomposed = Transform::from_matrix(&original.to_matrix());

        assert_relative_eq!(decomposed.position, original.position, epsilon = EPSILON);
        assert_relative_eq!(decomposed.scale, original.scale, epsilon = EPSILON);
        assert_relative_eq!(decomposed.rotation, original.rotation, epsilon = EPSILON);
    }

    #[test]
    fn test_negative_scale_loses_sign() {
        let mirrored = Transform {
            scale: Vec3::new(-2.0, 1.0, 1.0),
            ..Default::default()
        };

        let decomposed = Transform::from_matrix(&mirrored.to_matrix());

        // Known limitation: the sign ends up in the rotation block
        assert_relative_eq!(decomposed.scale, Vec3::new(2.0, 1.0, 1.0), epsilon = EPSILON);
        assert_relative_eq!(decomposed.rotation[(0, 0)], -1.0, epsilon = EPSILON);
    }

    #[test]
    fn test_matrix_rotation_drops_translation() {
        let m = Transform {
            position: Vec3::new(4.0, 5.0, 6.0),
            scale: Vec3::new(3.0, 3.0, 3.0),
            rotation: Mat3::identity(),
        }
        .to_matrix();

        assert_relative_eq!(matrix_rotation(&m), Mat4::identity(), epsilon = EPSILON);
    }
}
