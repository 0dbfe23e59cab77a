//! Scene nodes
//!
//! A node is one element of the tree: a local transform, optional model
//! payload, bounding volumes, LOD links and animation playback state. The
//! hierarchy links are handles into the owning [`NodeTree`](super::NodeTree)
//! and are only rewritten by the tree's mutation methods.

use std::fmt;

use super::animation::{AnimationEventHandler, AnimationTimeline};
use crate::culling::Frustum;
use crate::foundation::collections::{AnimationsId, ModelId, NodeId};
use crate::foundation::math::{matrix_translation, rotation_around, Mat4, Transform, Vec3};
use crate::geometry::AABB;
use crate::render::{Color, Model};

/// Longest node name kept, including room for a terminator in saved files
pub const NODE_NAME_MAX_LEN: usize = 256;

/// A bounding box together with its circumscribed sphere
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundingVolume {
    /// Axis-aligned box
    pub aabb: AABB,
    /// Center of the box
    pub center: Vec3,
    /// Half the box diagonal; intentionally loose
    pub radius: f32,
}

impl BoundingVolume {
    /// Derive the sphere from a box
    pub fn from_box(aabb: AABB) -> Self {
        Self {
            aabb,
            center: aabb.center(),
            radius: aabb.radius(),
        }
    }
}

/// Rigid attachment of a node to a bone of its parent's skeleton
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoneBinding {
    /// Bone index in the parent's model
    pub index: usize,
    /// Bone name, kept for saving
    pub name: String,
}

/// Result of the last frustum-gated draw of a node
///
/// Query state only; it never feeds back into culling decisions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Visibility {
    /// Frustum the node was last tested against
    pub last_frustum: Option<Frustum>,
    /// Whether the node was drawn in that frustum
    pub inside_frustum: bool,
    /// Distance from the camera at that time
    pub distance_to_camera: f32,
}

/// One element of the scenegraph
pub struct Node {
    name: String,

    /// Model drawn for this node, if any
    pub(crate) model: Option<ModelId>,

    /// Color multiplied into every material color at draw time
    pub tint: Color,

    /// Transform relative to the parent (or to the world for a root)
    pub local: Transform,

    /// World matrix, refreshed by transform updates
    pub(crate) world: Mat4,

    pub(crate) bone: Option<BoneBinding>,

    pub(crate) untransformed: BoundingVolume,
    pub(crate) transformed: BoundingVolume,

    pub(crate) parent: Option<NodeId>,
    pub(crate) first_child: Option<NodeId>,
    pub(crate) next_sibling: Option<NodeId>,
    pub(crate) prev_sibling: Option<NodeId>,

    pub(crate) next_lod: Option<NodeId>,
    pub(crate) next_distance: f32,
    pub(crate) active_lod: Option<NodeId>,

    pub(crate) animations: Option<AnimationsId>,

    /// Animation playback state
    pub timeline: AnimationTimeline,

    pub(crate) event_handler: Option<AnimationEventHandler>,

    pub(crate) visibility: Visibility,
}

impl Node {
    /// An empty group node
    pub fn group(name: &str) -> Self {
        let mut node = Self {
            name: String::new(),
            model: None,
            tint: Color::WHITE,
            local: Transform::identity(),
            world: Mat4::identity(),
            bone: None,
            untransformed: BoundingVolume::default(),
            transformed: BoundingVolume::default(),
            parent: None,
            first_child: None,
            next_sibling: None,
            prev_sibling: None,
            next_lod: None,
            next_distance: 0.0,
            active_lod: None,
            animations: None,
            timeline: AnimationTimeline::default(),
            event_handler: None,
            visibility: Visibility::default(),
        };
        node.set_name(name);
        node
    }

    /// A node drawing `model`; bounds come from the model's local geometry
    pub fn with_model(name: &str, id: ModelId, model: &Model) -> Self {
        let mut node = Self::group(name);
        node.set_model(Some((id, model)));
        node
    }

    pub(crate) fn set_model(&mut self, model: Option<(ModelId, &Model)>) {
        self.model = model.map(|(id, _)| id);
        self.untransformed = model
            .map(|(_, model)| BoundingVolume::from_box(model.bounding_box()))
            .unwrap_or_default();
        self.refresh_bounds();
    }

    pub(crate) fn refresh_bounds(&mut self) {
        self.transformed = BoundingVolume::from_box(self.untransformed.aabb.transformed(&self.world));
    }

    /// Node name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the node, clipping overlong names with a warning
    pub fn set_name(&mut self, name: &str) {
        let limit = NODE_NAME_MAX_LEN - 1;
        if name.chars().count() > limit {
            self.name = name.chars().take(limit).collect();
            log::warn!(
                "Node name too long ({} chars), clipped to `{}`",
                name.chars().count(),
                self.name
            );
        } else {
            self.name = name.to_string();
        }
    }

    /// Model payload
    pub fn model(&self) -> Option<ModelId> {
        self.model
    }

    /// Animation list used by the timeline
    pub fn animations(&self) -> Option<AnimationsId> {
        self.animations
    }

    /// World matrix as of the last transform update
    pub fn transform(&self) -> &Mat4 {
        &self.world
    }

    /// World-space position as of the last transform update
    pub fn world_position(&self) -> Vec3 {
        matrix_translation(&self.world)
    }

    /// Replace the local components with a decomposition of the world matrix
    pub fn unpack_transforms(&mut self) {
        self.local = Transform::from_matrix(&self.world);
    }

    /// Parent node
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Most recently attached child
    pub fn first_child(&self) -> Option<NodeId> {
        self.first_child
    }

    /// Next node in the parent's child list
    pub fn next_sibling(&self) -> Option<NodeId> {
        self.next_sibling
    }

    /// Previous node in the parent's child list
    pub fn prev_sibling(&self) -> Option<NodeId> {
        self.prev_sibling
    }

    /// Bone of the parent this node is bound to
    pub fn bone_binding(&self) -> Option<&BoneBinding> {
        self.bone.as_ref()
    }

    /// Next entry of the LOD chain
    pub fn next_lod(&self) -> Option<NodeId> {
        self.next_lod
    }

    /// Camera distance beyond which [`next_lod`](Self::next_lod) takes over
    pub fn next_distance(&self) -> f32 {
        self.next_distance
    }

    /// LOD selected by the last draw
    pub fn active_lod(&self) -> Option<NodeId> {
        self.active_lod
    }

    /// Bounds in model space
    pub fn untransformed_bounds(&self) -> &BoundingVolume {
        &self.untransformed
    }

    /// Bounds in world space as of the last transform update
    pub fn transformed_bounds(&self) -> &BoundingVolume {
        &self.transformed
    }

    /// Result of the last frustum-gated draw
    pub fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    // The movers below only touch the local components; the world matrix
    // catches up on the next transform update.

    /// Set the local position
    pub fn set_position(&mut self, position: Vec3) {
        self.local.position = position;
    }

    /// Rotate around a world axis
    pub fn rotate(&mut self, axis: Vec3, angle: f32) {
        self.local.rotation = rotation_around(&axis, angle) * self.local.rotation;
    }

    /// Rotate around the world X axis
    pub fn rotate_x(&mut self, angle: f32) {
        self.rotate(Vec3::x(), angle);
    }

    /// Rotate around the world Y axis
    pub fn rotate_y(&mut self, angle: f32) {
        self.rotate(Vec3::y(), angle);
    }

    /// Rotate around the world Z axis
    pub fn rotate_z(&mut self, angle: f32) {
        self.rotate(Vec3::z(), angle);
    }

    /// Rotate around the node's own X axis
    pub fn pitch(&mut self, angle: f32) {
        self.rotate(self.axis(0), angle);
    }

    /// Rotate around the node's own Y axis
    pub fn yaw(&mut self, angle: f32) {
        self.rotate(self.axis(1), angle);
    }

    /// Rotate around the node's own Z axis
    pub fn roll(&mut self, angle: f32) {
        self.rotate(self.axis(2), angle);
    }

    /// Move along the node's own X axis (scale included)
    pub fn move_sideward(&mut self, distance: f32) {
        self.local.position += self.axis(0) * distance;
    }

    /// Move along the node's own Y axis (scale included)
    pub fn move_upward(&mut self, distance: f32) {
        self.local.position += self.axis(1) * distance;
    }

    /// Move along the node's own Z axis (scale included)
    pub fn move_forward(&mut self, distance: f32) {
        self.local.position += self.axis(2) * distance;
    }

    fn axis(&self, column: usize) -> Vec3 {
        self.world.fixed_view::<3, 1>(0, column).into_owned()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("model", &self.model)
            .field("local", &self.local)
            .field("parent", &self.parent)
            .field("first_child", &self.first_child)
            .field("next_sibling", &self.next_sibling)
            .field("prev_sibling", &self.prev_sibling)
            .field("next_lod", &self.next_lod)
            .field("next_distance", &self.next_distance)
            .field("timeline", &self.timeline)
            .field("has_event_handler", &self.event_handler.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::constants::PI;
    use crate::render::Mesh;
    use approx::assert_relative_eq;

    #[test]
    fn test_group_defaults() {
        let node = Node::group("root");
        assert_eq!(node.name(), "root");
        assert_eq!(node.tint, Color::WHITE);
        assert_eq!(node.local, Transform::identity());
        assert!(node.parent().is_none() && node.first_child().is_none());
        assert_eq!(node.timeline.clip, None);
        assert_eq!(node.timeline.remaining_loops, -1);
    }

    #[test]
    fn test_long_names_are_clipped() {
        let long = "x".repeat(400);
        let node = Node::group(&long);
        assert_eq!(node.name().len(), NODE_NAME_MAX_LEN - 1);
    }

    #[test]
    fn test_model_bounds() {
        let mut models = slotmap::SlotMap::<ModelId, Model>::with_key();
        let model = Model::from_meshes(vec![Mesh::cube("cube", 2.0)]);
        let id = models.insert(model.clone());

        let node = Node::with_model("cube", id, &model);
        assert_eq!(node.model(), Some(id));
        assert_eq!(node.untransformed_bounds().center, Vec3::zeros());
        assert_relative_eq!(node.untransformed_bounds().radius, 3.0_f32.sqrt());
        assert_eq!(node.transformed_bounds(), node.untransformed_bounds());
    }

    #[test]
    fn test_world_rotation_composes_on_the_left() {
        let mut node = Node::group("spinner");
        node.rotate_z(PI / 2.0);
        node.rotate_x(PI / 2.0);

        // X -> Y (about Z) -> Z (about X)
        let x = node.local.rotation * Vec3::x();
        assert_relative_eq!(x, Vec3::z(), epsilon = 1e-6);
    }

    #[test]
    fn test_moves_follow_own_axes() {
        let mut node = Node::group("mover");
        node.world = Transform {
            rotation: rotation_around(&Vec3::y(), PI / 2.0),
            ..Default::default()
        }
        .to_matrix();

        // Own Z axis points along world +X after a quarter turn about Y
        node.move_forward(3.0);
        assert_relative_eq!(node.local.position, Vec3::new(3.0, 0.0, 0.0), epsilon = 1e-6);

        node.move_upward(1.0);
        assert_relative_eq!(node.local.position, Vec3::new(3.0, 1.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_yaw_turns_around_own_y() {
        let mut node = Node::group("turret");
        node.rotate_z(PI / 2.0);
        node.world = node.local.to_matrix();

        node.yaw(PI / 2.0);

        // A turn about the own axis composes on the right
        let expected = rotation_around(&Vec3::z(), PI / 2.0) * rotation_around(&Vec3::y(), PI / 2.0);
        assert_relative_eq!(node.local.rotation, expected, epsilon = 1e-6);
    }

    #[test]
    fn test_pitch_and_roll_ignore_scale() {
        let mut node = Node::group("big");
        node.local.scale = Vec3::new(2.0, 2.0, 2.0);
        node.world = node.local.to_matrix();

        node.pitch(PI / 2.0);
        assert_relative_eq!(node.local.rotation, rotation_around(&Vec3::x(), PI / 2.0), epsilon = 1e-6);
        assert_eq!(node.local.scale, Vec3::new(2.0, 2.0, 2.0));

        let mut node = Node::group("wheel");
        node.local.scale = Vec3::new(3.0, 1.0, 1.0);
        node.world = node.local.to_matrix();

        node.roll(-PI / 2.0);
        assert_relative_eq!(node.local.rotation * Vec3::x(), -Vec3::y(), epsilon = 1e-6);
    }

    #[test]
    fn test_move_sideward_includes_scale() {
        let mut node = Node::group("crab");
        node.world = Transform {
            scale: Vec3::new(2.0, 2.0, 2.0),
            rotation: rotation_around(&Vec3::y(), PI / 2.0),
            ..Default::default()
        }
        .to_matrix();

        // Own X axis is world -Z, twice as long
        node.move_sideward(1.5);
        assert_relative_eq!(node.local.position, Vec3::new(0.0, 0.0, -3.0), epsilon = 1e-6);
    }

    #[test]
    fn test_unpack_transforms_restores_local() {
        let mut node = Node::group("packed");
        let local = Transform {
            position: Vec3::new(1.0, 2.0, 3.0),
            scale: Vec3::new(2.0, 3.0, 4.0),
            rotation: rotation_around(&Vec3::new(1.0, 1.0, 0.0), 0.7),
        };
        node.world = local.to_matrix();
        node.local = Transform::identity();

        node.unpack_transforms();

        assert_relative_eq!(node.local.position, local.position, epsilon = 1e-5);
        assert_relative_eq!(node.local.scale, local.scale, epsilon = 1e-5);
        assert_relative_eq!(node.local.rotation, local.rotation, epsilon = 1e-5);
    }
}
