//! Axis-aligned bounding boxes

use crate::foundation::math::{Mat4, Point3, Vec3};

/// Axis-Aligned Bounding Box for visibility tests
///
/// Lives either in a model's local space (untransformed bounds) or in world
/// space (transformed bounds); the type does not track which.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Default for AABB {
    fn default() -> Self {
        Self::new(Vec3::zeros(), Vec3::zeros())
    }
}

impl AABB {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Smallest box enclosing every point, or `None` for an empty set
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = *points.next()?;
        Some(points.fold(Self::new(first, first), |mut aabb, p| {
            aabb.min = aabb.min.inf(p);
            aabb.max = aabb.max.sup(p);
            aabb
        }))
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Radius of the sphere circumscribing the box: half the diagonal
    pub fn radius(&self) -> f32 {
        (self.max - self.min).norm() * 0.5
    }

    /// Check if this AABB contains a point (boundary included)
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// The 8 corners, in [`BoxCorners`](super::BoxCorners) bit order:
    /// front-bottom-left, front-bottom-right, front-top-left, front-top-right,
    /// then the same four at the back.
    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Bounding box of this box after an affine transform
    ///
    /// All 8 corners go through the matrix (rotation breaks axis alignment, so
    /// transforming only min/max is wrong). Only four corners are actually
    /// multiplied; the others are rebuilt from the transformed edge vectors.
    pub fn transformed(&self, transform: &Mat4) -> Self {
        //       F---------G
        //      /|        /|
        //     B---------C |
        //     | E-------|-H
        //     |/        |/
        //     A---------D
        let project = |v: Vec3| transform.transform_point(&Point3::from(v)).coords;

        let a = project(self.min);
        let b = project(Vec3::new(self.min.x, self.max.y, self.min.z));
        let d = project(Vec3::new(self.max.x, self.min.y, self.min.z));
        let e = project(Vec3::new(self.min.x, self.min.y, self.max.z));

        let x_edge = d - a;
        let y_edge = b - a;

        let c = b + x_edge;
        let f = e + y_edge;
        let g = f + x_edge;
        let h = e + x_edge;

        let corners = [a, b, c, d, e, f, g, h];
        let mut min = Vec3::repeat(f32::MAX);
        let mut max = Vec3::repeat(f32::MIN);
        for corner in &corners {
            min = min.inf(corner);
            max = max.sup(corner);
        }

        Self { min, max }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{constants::PI, rotation_around, Transform};
    use approx::assert_relative_eq;

    fn sample_box() -> AABB {
        AABB::new(Vec3::new(-1.0, -2.0, -0.5), Vec3::new(3.0, 1.0, 2.0))
    }

    #[test]
    fn test_identity_transform_keeps_box() {
        let aabb = sample_box();
        assert_eq!(aabb.transformed(&Mat4::identity()), aabb);
    }

    #[test]
    fn test_rotated_box_encloses_all_corners() {
        let aabb = sample_box();

        for (axis, angle) in [
            (Vec3::new(0.0, 1.0, 0.0), PI / 4.0),
            (Vec3::new(1.0, 0.0, 0.0), PI / 3.0),
            (Vec3::new(1.0, 2.0, 3.0), 1.1),
            (Vec3::new(-1.0, 0.5, 0.2), 2.5),
        ] {
            let matrix = Transform {
                rotation: rotation_around(&axis, angle),
                ..Default::default()
            }
            .to_matrix();

            let bounds = aabb.transformed(&matrix);
            // Grow by a hair so rounding in the edge reconstruction does not flake
            let slack = AABB::new(bounds.min - Vec3::repeat(1e-4), bounds.max + Vec3::repeat(1e-4));

            for corner in aabb.corners() {
                let p = matrix.transform_point(&Point3::from(corner)).coords;
                assert!(slack.contains_point(p), "corner {p:?} escaped {bounds:?}");
            }
        }
    }

    #[test]
    fn test_rotation_grows_box_unlike_min_max_transform() {
        let aabb = AABB::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        let matrix = Transform {
            rotation: rotation_around(&Vec3::new(0.0, 1.0, 0.0), PI / 4.0),
            ..Default::default()
        }
        .to_matrix();

        let bounds = aabb.transformed(&matrix);
        let sqrt2 = 2.0_f32.sqrt();
        assert_relative_eq!(bounds.max.x, sqrt2, epsilon = 1e-5);
        assert_relative_eq!(bounds.min.z, -sqrt2, epsilon = 1e-5);
        assert_relative_eq!(bounds.max.y, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_translation_and_scale() {
        let matrix = Transform {
            position: Vec3::new(10.0, 0.0, -5.0),
            scale: Vec3::new(2.0, 2.0, 2.0),
            ..Default::default()
        }
        .to_matrix();

        let bounds = sample_box().transformed(&matrix);
        assert_relative_eq!(bounds.min, Vec3::new(8.0, -4.0, -6.0), epsilon = 1e-5);
        assert_relative_eq!(bounds.max, Vec3::new(16.0, 2.0, -1.0), epsilon = 1e-5);
    }

    #[test]
    fn test_center_and_radius() {
        let aabb = AABB::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 2.0, 2.0));
        assert_eq!(aabb.center(), Vec3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(aabb.radius(), 3.0_f32.sqrt(), epsilon = 1e-6);
    }

    #[test]
    fn test_from_points() {
        let points = [Vec3::new(1.0, 5.0, -1.0), Vec3::new(-2.0, 0.0, 4.0)];
        let aabb = AABB::from_points(&points).unwrap();
        assert_eq!(aabb.min, Vec3::new(-2.0, 0.0, -1.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 5.0, 4.0));
        assert!(AABB::from_points(std::iter::empty()).is_none());
    }
}
