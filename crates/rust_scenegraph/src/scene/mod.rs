//! Scenegraph: nodes, their tree, and the scene container
//!
//! - [`Node`]: transform, bounds, LOD links and animation state of one element
//! - [`NodeTree`]: arena owning nodes, models and animation lists, with the
//!   attach/detach/remove, LOD and transform operations
//! - [`Scene`]: slot-indexed container with the text load/save format
//!
//! Per frame, a caller updates transforms top-down, rebuilds the camera
//! frustum, then draws:
//!
//! ```
//! use rust_scenegraph::prelude::*;
//!
//! let mut scene = Scene::new("demo");
//! let model = scene.add_model(Model::from_meshes(vec![Mesh::cube("ball", 1.0)]), "ball.obj").unwrap();
//! let ball = scene.add_model_node("ball", model).unwrap();
//! scene.tree_mut().node_mut(ball).unwrap().set_position(Vec3::new(5.0, 3.0, -10.0));
//! scene.update();
//!
//! let camera = Camera::perspective(Vec3::new(10.0, 10.0, 10.0), Vec3::zeros(), 45.0);
//! let frustum = Frustum::from_camera(&camera, 800.0 / 450.0).unwrap();
//! let mut recorder = DrawRecorder::new();
//! assert_eq!(scene.draw(&frustum, &mut recorder), 1);
//! ```

mod animation;
mod container;
mod format;
mod node;
mod traversal;
mod tree;

#[cfg(test)]
mod tests;

pub use animation::{AnimationEvent, AnimationEventHandler, AnimationTimeline, PlaybackState};
pub use container::{AnimationsSlot, ModelSlot, Scene};
pub use format::SceneFormatError;
pub use node::{BoneBinding, BoundingVolume, Node, Visibility, NODE_NAME_MAX_LEN};
pub use traversal::Walk;
pub use tree::{Children, LodChain, NodeTree};
