//! Visibility culling against the camera frustum

mod frustum;

pub use frustum::{Frustum, FrustumPlane};
