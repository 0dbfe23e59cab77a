//! Rendering collaborators
//!
//! The scenegraph does not talk to a GPU. It consumes a few narrow
//! interfaces instead:
//! - [`Camera`]: where the viewer is, for frustum extraction
//! - [`DrawSink`]: receives mesh/material/transform draw calls
//! - [`PoseApplier`]: poses a model's skeleton at an animation frame
//! - [`AssetLoader`]: loads models and animations for the scene format

mod animation;
mod assets;
mod camera;
mod color;
mod draw;
mod model;

pub use animation::{AnimationClip, AnimationList, FramePoseApplier, PoseApplier};
pub use assets::{AssetError, AssetLoader};
pub use camera::{Camera, Projection, DEFAULT_FAR, DEFAULT_NEAR};
pub use color::Color;
pub use draw::{DrawRecorder, DrawSink, RecordedDraw};
pub use model::{BoneInfo, Material, Mesh, Model};
