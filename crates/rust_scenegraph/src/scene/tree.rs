//! Arena-backed node tree
//!
//! Nodes, models and animation lists live in slot maps owned by the
//! [`NodeTree`]; nodes refer to each other through [`NodeId`] handles. Every
//! structural edit (attach, detach, remove, LOD changes) is an index
//! relinking operation on the arena.
//!
//! Handles that no longer resolve are ignored: operations on them are silent
//! no-ops, and no cycle detection is performed when attaching.

use std::fmt;

use super::animation::AnimationEvent;
use super::node::{BoneBinding, Node};
use crate::foundation::collections::{AnimationsId, ModelId, NodeId, SlotMap};
use crate::foundation::math::{Mat4, Transform};
use crate::render::{AnimationList, FramePoseApplier, Model, PoseApplier};

/// Owner of every node, model and animation list of a scenegraph
pub struct NodeTree {
    pub(super) nodes: SlotMap<NodeId, Node>,
    pub(super) models: SlotMap<ModelId, Model>,
    pub(super) animations: SlotMap<AnimationsId, AnimationList>,
    pose_applier: Box<dyn PoseApplier>,
}

impl NodeTree {
    /// Create an empty tree posing skeletons with [`FramePoseApplier`]
    pub fn new() -> Self {
        Self::with_pose_applier(Box::new(FramePoseApplier))
    }

    /// Create an empty tree with a custom pose applier
    pub fn with_pose_applier(pose_applier: Box<dyn PoseApplier>) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            models: SlotMap::with_key(),
            animations: SlotMap::with_key(),
            pose_applier,
        }
    }

    // Resources

    /// Store a model and return its handle
    pub fn add_model(&mut self, model: Model) -> ModelId {
        self.models.insert(model)
    }

    /// Look up a model
    pub fn model(&self, id: ModelId) -> Option<&Model> {
        self.models.get(id)
    }

    /// Look up a model mutably
    pub fn model_mut(&mut self, id: ModelId) -> Option<&mut Model> {
        self.models.get_mut(id)
    }

    /// Store an animation list and return its handle
    pub fn add_animations(&mut self, animations: AnimationList) -> AnimationsId {
        self.animations.insert(animations)
    }

    /// Look up an animation list
    pub fn animations(&self, id: AnimationsId) -> Option<&AnimationList> {
        self.animations.get(id)
    }

    // Nodes

    /// Create a detached group node
    pub fn create_group(&mut self, name: &str) -> NodeId {
        let id = self.nodes.insert(Node::group(name));
        log::debug!("Created group node `{name}`");
        id
    }

    /// Create a detached node drawing `model`
    ///
    /// Returns `None` if the model handle does not resolve.
    pub fn create_model_node(&mut self, name: &str, model: ModelId) -> Option<NodeId> {
        let payload = self.models.get(model)?;
        let id = self.nodes.insert(Node::with_model(name, model, payload));
        log::debug!("Created model node `{name}`");
        Some(id)
    }

    /// Replace a node's model, recomputing its bounds
    ///
    /// Returns false if either handle does not resolve.
    pub fn set_model(&mut self, id: NodeId, model: Option<ModelId>) -> bool {
        let payload = match model {
            Some(model) => match self.models.get(model) {
                Some(payload) => Some((model, payload)),
                None => return false,
            },
            None => None,
        };

        match self.nodes.get_mut(id) {
            Some(node) => {
                node.set_model(payload);
                true
            }
            None => false,
        }
    }

    /// Look up a node
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Look up a node mutably
    ///
    /// Links are not reachable this way; use the tree's mutation methods.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Whether the handle resolves
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of nodes in the arena
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena holds no node
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Children of a node, most recently attached first
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.nodes.get(id).and_then(|node| node.first_child),
        }
    }

    // Hierarchy

    /// Attach `child` under `parent` as its new first child
    ///
    /// A child that already has a parent is detached first. The child's world
    /// matrix is kept: its local transform is re-expressed in the parent's
    /// space and decomposed back into components.
    pub fn attach_child(&mut self, parent: NodeId, child: NodeId) {
        if parent == child || !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            return;
        }

        if self.nodes[child].parent.is_some() {
            self.detach_branch(child);
        }

        let parent_world = self.nodes[parent].world;
        let previous_head = self.nodes[parent].first_child;

        if let Some(head) = previous_head {
            self.nodes[head].prev_sibling = Some(child);
        }
        self.nodes[parent].first_child = Some(child);

        let inverse = parent_world.try_inverse().unwrap_or_else(|| {
            log::warn!("Parent `{}` has a singular transform", self.nodes[parent].name());
            Mat4::identity()
        });

        let node = &mut self.nodes[child];
        node.parent = Some(parent);
        node.next_sibling = previous_head;
        node.prev_sibling = None;

        let world = node.local.to_matrix();
        node.local = Transform::from_matrix(&(inverse * world));
        node.world = world;

        log::debug!("Attached `{}`", node.name());
    }

    /// Attach `child` under `parent`, seeded at one of the parent's bones
    ///
    /// When the parent's model has a bone named `bone`, the child's position
    /// is first set to that bone's bind-pose translation and the binding is
    /// recorded. The attachment happens either way; the return value tells
    /// whether the bone was found.
    pub fn attach_child_to_bone(&mut self, parent: NodeId, child: NodeId, bone: &str) -> bool {
        if parent == child || !self.nodes.contains_key(child) {
            return false;
        }

        if self.nodes[child].parent.is_some() {
            self.detach_branch(child);
        }

        let binding = self
            .nodes
            .get(parent)
            .and_then(|node| node.model)
            .and_then(|model| self.models.get(model))
            .and_then(|model| {
                let index = model.bone_index(bone)?;
                let seed = model.bind_pose.get(index)?.position;
                Some((index, seed))
            });

        if let Some((index, seed)) = binding {
            let node = &mut self.nodes[child];
            node.local.position = seed;
            node.world = node.local.to_matrix();
            node.bone = Some(BoneBinding {
                index,
                name: bone.to_string(),
            });
        } else {
            log::debug!("Bone `{bone}` not found, attaching without binding");
        }

        self.attach_child(parent, child);
        binding.is_some()
    }

    /// Detach a node (and its subtree) from its parent
    ///
    /// The node's transform is brought back to world space; its parent,
    /// sibling and bone links are cleared. Its children stay attached to it.
    pub fn detach_branch(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        let (parent, prev, next) = (node.parent, node.prev_sibling, node.next_sibling);

        if let Some(prev) = prev {
            self.nodes[prev].next_sibling = next;
        }
        if let Some(next) = next {
            self.nodes[next].prev_sibling = prev;
        }

        let parent_world = parent.map(|parent| {
            let parent_node = &mut self.nodes[parent];
            if parent_node.first_child == Some(id) {
                parent_node.first_child = next;
            }
            parent_node.world
        });

        let node = &mut self.nodes[id];
        if let Some(parent_world) = parent_world {
            let world = parent_world * node.local.to_matrix();
            node.local = Transform::from_matrix(&world);
            node.world = world;
        }
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;
        node.bone = None;

        log::debug!("Detached `{}`", node.name());
    }

    /// Remove a node from the tree, promoting its children to its place
    ///
    /// Each child is re-attached to the former parent in its current sibling
    /// order (or detached when there is none). The node itself stays in the arena with all links cleared.
    pub fn remove(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        let parent = node.parent;

        self.detach_branch(id);

        // Tail first, so prepending keeps the children in their old order.
        let mut tail = self.nodes[id].first_child;
        while let Some(next) = tail.and_then(|child| self.nodes[child].next_sibling) {
            tail = Some(next);
        }

        while let Some(child) = tail {
            tail = self.nodes[child].prev_sibling;
            match parent {
                Some(parent) => self.attach_child(parent, child),
                None => self.detach_branch(child),
            }
        }

        log::debug!("Removed `{}`", self.nodes[id].name());
    }

    // Level of detail

    /// Insert `lod` in `node`'s LOD chain, used beyond `distance`
    ///
    /// The chain stays sorted by ascending distance. An entry already using
    /// `distance` is replaced and unlinked.
    pub fn insert_lod(&mut self, node: NodeId, lod: NodeId, distance: f32) {
        if node == lod {
            log::warn!("A node cannot be its own LOD");
            return;
        }
        if !self.nodes.contains_key(node) || !self.nodes.contains_key(lod) {
            return;
        }

        self.remove_lod(node, lod);

        let mut link = node;
        while let Some(next) = self.nodes[link].next_lod {
            if self.nodes[link].next_distance >= distance {
                break;
            }
            link = next;
        }

        let (next, link_distance) = (self.nodes[link].next_lod, self.nodes[link].next_distance);
        match next {
            None => {
                self.nodes[lod].next_lod = None;
            }
            Some(next) if link_distance > distance => {
                let entry = &mut self.nodes[lod];
                entry.next_lod = Some(next);
                entry.next_distance = link_distance;
            }
            Some(replaced) => {
                let (tail, tail_distance) = {
                    let old = &mut self.nodes[replaced];
                    (old.next_lod.take(), old.next_distance)
                };
                let entry = &mut self.nodes[lod];
                entry.next_lod = tail;
                entry.next_distance = tail_distance;
                log::debug!("LOD at distance {distance} replaced");
            }
        }

        let head = &mut self.nodes[link];
        head.next_lod = Some(lod);
        head.next_distance = distance;
    }

    /// Splice `lod` out of `node`'s LOD chain
    ///
    /// The predecessor inherits the removed entry's link and distance.
    /// Returns whether `lod` was found in the chain.
    pub fn remove_lod(&mut self, node: NodeId, lod: NodeId) -> bool {
        if node == lod {
            log::warn!("A node is not part of its own LOD chain");
            return false;
        }
        if !self.nodes.contains_key(node) || !self.nodes.contains_key(lod) {
            return false;
        }

        let mut link = node;
        let found = loop {
            match self.nodes[link].next_lod {
                Some(next) if next == lod => break true,
                Some(next) => link = next,
                None => break false,
            }
        };

        if found {
            let (tail, tail_distance) = {
                let removed = &self.nodes[lod];
                (removed.next_lod, removed.next_distance)
            };
            let head = &mut self.nodes[link];
            head.next_lod = tail;
            head.next_distance = tail_distance;
        }

        self.nodes[lod].next_lod = None;
        found
    }

    /// The LOD chain of a node, starting with the node itself
    pub fn lod_chain(&self, node: NodeId) -> LodChain<'_> {
        LodChain {
            tree: self,
            next: self.nodes.contains_key(node).then_some(node),
        }
    }

    // Transforms

    /// Refresh a node's world matrix and world-space bounds
    ///
    /// The parent's world matrix must already be current. When the node
    /// plays an animation and is its own active LOD (or has none yet), its
    /// model is posed at the current frame first.
    pub fn update_transforms(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };

        if node.active_lod.map_or(true, |lod| lod == id) {
            if let (Some(model), Some(animations), Some(clip)) =
                (node.model, node.animations, node.timeline.clip)
            {
                let clip = self
                    .animations
                    .get(animations)
                    .and_then(|list| list.clips.get(clip));
                if let (Some(model), Some(clip)) = (self.models.get_mut(model), clip) {
                    self.pose_applier.apply_pose(model, clip, node.timeline.frame());
                }
            }
        }

        let parent_world = node
            .parent
            .and_then(|parent| self.nodes.get(parent))
            .map(|parent| parent.world);

        let node = &mut self.nodes[id];
        let local = node.local.to_matrix();
        node.world = match parent_world {
            Some(parent_world) => parent_world * local,
            None => local,
        };
        node.refresh_bounds();

        log::trace!("Updated transforms of `{}`", node.name());
    }

    // Animation

    /// Give a node the animation list its timeline plays from
    pub fn set_animations(&mut self, id: NodeId, animations: Option<AnimationsId>) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.animations = animations;
        }
    }

    /// Start playing a clip by index, rewinding the timeline
    pub fn play_animation_index(&mut self, id: NodeId, index: usize) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.timeline.play(index);
        }
    }

    /// Start playing the first clip with the given name
    ///
    /// Returns false, leaving playback untouched, if no clip has that name.
    pub fn play_animation_name(&mut self, id: NodeId, name: &str) -> bool {
        let index = self
            .nodes
            .get(id)
            .and_then(|node| node.animations)
            .and_then(|animations| self.animations.get(animations))
            .and_then(|list| list.find(name));

        match index {
            Some(index) => {
                self.play_animation_index(id, index);
                true
            }
            None => false,
        }
    }

    /// Set the playback speed multiplier
    pub fn set_animation_speed(&mut self, id: NodeId, speed: f32) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.timeline.speed = speed;
        }
    }

    /// Set how many loops remain; negative loops forever
    pub fn set_animation_loops(&mut self, id: NodeId, loops: i32) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.timeline.remaining_loops = loops;
        }
    }

    /// Install the closure called when the node's timeline loops or completes
    pub fn set_animation_event_handler<F>(&mut self, id: NodeId, handler: F)
    where
        F: FnMut(NodeId, AnimationEvent) + 'static,
    {
        if let Some(node) = self.nodes.get_mut(id) {
            node.event_handler = Some(Box::new(handler));
        }
    }

    /// Remove the node's event handler
    pub fn clear_animation_event_handler(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.event_handler = None;
        }
    }

    /// Advance a node's timeline by `delta` frames
    ///
    /// Invokes the node's handler and returns the event when the clip wraps.
    pub fn advance_animation(&mut self, id: NodeId, delta: f32) -> Option<AnimationEvent> {
        let node = self.nodes.get_mut(id)?;
        let frame_count = node
            .animations
            .and_then(|animations| self.animations.get(animations))
            .zip(node.timeline.clip)
            .and_then(|(list, clip)| list.clips.get(clip))
            .map(|clip| clip.frame_count)?;

        let event = node.timeline.advance(frame_count, delta)?;
        if let Some(handler) = node.event_handler.as_mut() {
            handler(id, event);
        }
        Some(event)
    }
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NodeTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeTree")
            .field("nodes", &self.nodes.len())
            .field("models", &self.models.len())
            .field("animations", &self.animations.len())
            .finish_non_exhaustive()
    }
}

/// Iterator over the children of a node
pub struct Children<'a> {
    tree: &'a NodeTree,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.nodes.get(current).and_then(|node| node.next_sibling);
        Some(current)
    }
}

/// Iterator over a LOD chain
pub struct LodChain<'a> {
    tree: &'a NodeTree,
    next: Option<NodeId>,
}

impl Iterator for LodChain<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.nodes.get(current).and_then(|node| node.next_lod);
        Some(current)
    }
}
