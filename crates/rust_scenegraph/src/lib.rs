//! # Rust Scenegraph
//!
//! A scenegraph with camera frustum culling, written against narrow rendering
//! interfaces instead of a GPU API.
//!
//! ## Features
//!
//! - **Frustum culling**: plane extraction from the camera's clip matrix, with
//!   point, sphere and box containment tests
//! - **Node tree**: arena-allocated nodes with parent/child/sibling links,
//!   world transforms chained top-down, and world-space bounds
//! - **Level of detail**: per-node chains of alternate representations picked
//!   by camera distance
//! - **Skeletal playback**: per-node animation timelines with loop events and
//!   bone attachment
//! - **Scene files**: a line-oriented text format to save and load scenes
//!
//! ## Quick Start
//!
//! ```rust
//! use rust_scenegraph::prelude::*;
//!
//! let camera = Camera::perspective(Vec3::new(10.0, 10.0, 10.0), Vec3::zeros(), 45.0);
//! let frustum = Frustum::from_camera(&camera, 800.0 / 450.0).unwrap();
//!
//! assert!(frustum.contains_sphere(Vec3::new(5.0, 3.0, -10.0), 1.0));
//! assert!(!frustum.contains_point(Vec3::new(20.0, 20.0, 20.0)));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod core;
pub mod culling;
pub mod foundation;
pub mod geometry;
pub mod render;
pub mod scene;

/// Common imports for scenegraph users
pub mod prelude {
    pub use crate::{
        core::config::{Config, SceneConfig, SlotConfig, SlotGrowth},
        culling::{Frustum, FrustumPlane},
        foundation::{
            collections::{AnimationsId, ModelId, NodeId},
            math::{Mat3, Mat4, Transform, Vec3},
        },
        geometry::{BoxCorners, Plane, AABB},
        render::{
            AnimationClip, AnimationList, AssetLoader, Camera, Color, DrawRecorder, DrawSink,
            Material, Mesh, Model, PoseApplier,
        },
        scene::{AnimationEvent, Node, NodeTree, Scene, SceneFormatError},
    };
}
