//! Geometry primitives: planes, bounding boxes and their classification tests

mod aabb;
mod plane;

pub use aabb::AABB;
pub use plane::{BoxCorners, Plane};
