//! Scene container
//!
//! A [`Scene`] owns a [`NodeTree`] plus indexed slot arrays recording which
//! nodes, models and animation lists belong to the scene, in creation order.
//! Slot indices are what the text format refers to.

use super::animation::AnimationEvent;
use super::tree::NodeTree;
use crate::core::config::{ConfigError, SceneConfig, SlotGrowth};
use crate::culling::Frustum;
use crate::foundation::collections::{AnimationsId, ModelId, NodeId};
use crate::render::{AnimationList, DrawSink, Model};

/// Indexed slot array with a capacity policy
#[derive(Debug, Clone)]
struct Slots<T> {
    entries: Vec<T>,
    capacity: usize,
    growth: SlotGrowth,
    kind: &'static str,
}

impl<T> Slots<T> {
    fn new(kind: &'static str, capacity: usize, growth: SlotGrowth) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
            growth,
            kind,
        }
    }

    /// Make room for one more entry, growing if allowed
    fn has_room(&mut self) -> bool {
        if self.entries.len() < self.capacity {
            return true;
        }

        match self.growth {
            SlotGrowth::Grow => {
                self.capacity = (self.capacity * 2).max(1);
                self.entries.reserve(self.capacity - self.entries.len());
                log::debug!("Grew {} slots to {}", self.kind, self.capacity);
                true
            }
            SlotGrowth::Fixed => {
                log::warn!("No free {} slot (capacity {})", self.kind, self.capacity);
                false
            }
        }
    }
}

/// A model stored in a scene slot, with the file it came from
#[derive(Debug, Clone)]
pub struct ModelSlot {
    /// Model handle in the scene's tree
    pub id: ModelId,
    /// Source path, written back by the text format
    pub source: String,
}

/// An animation list stored in a scene slot, with the file it came from
#[derive(Debug, Clone)]
pub struct AnimationsSlot {
    /// Animation list handle in the scene's tree
    pub id: AnimationsId,
    /// Source path, written back by the text format
    pub source: String,
}

/// A named scenegraph with slot-indexed nodes and resources
#[derive(Debug)]
pub struct Scene {
    name: String,
    tree: NodeTree,
    root: NodeId,
    nodes: Slots<NodeId>,
    models: Slots<ModelSlot>,
    animations: Slots<AnimationsSlot>,
    config: SceneConfig,
}

impl Scene {
    /// Create an empty scene with the default configuration
    pub fn new(name: &str) -> Self {
        Self::build(name, SceneConfig::default(), NodeTree::new())
    }

    /// Create an empty scene, validating the configuration first
    pub fn with_config(name: &str, config: SceneConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(name, config, NodeTree::new()))
    }

    /// Create an empty scene around an existing (typically empty) tree
    ///
    /// Useful to install a custom [`PoseApplier`](crate::render::PoseApplier).
    pub fn with_tree(name: &str, config: SceneConfig, tree: NodeTree) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(name, config, tree))
    }

    fn build(name: &str, config: SceneConfig, mut tree: NodeTree) -> Self {
        let root = tree.create_group(name);
        let slots = &config.slots;
        log::info!("Created scene `{name}`");

        Self {
            name: name.to_string(),
            root,
            nodes: Slots::new("node", slots.node_capacity, slots.growth),
            models: Slots::new("model", slots.model_capacity, slots.growth),
            animations: Slots::new("animation", slots.animation_capacity, slots.growth),
            tree,
            config,
        }
    }

    /// Scene name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configuration the scene was built with
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Root group every scene node hangs from; not part of the node slots
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The underlying tree
    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    /// The underlying tree, for hierarchy edits and node access
    pub fn tree_mut(&mut self) -> &mut NodeTree {
        &mut self.tree
    }

    // Slots

    /// Store a model in the next model slot
    ///
    /// Returns `None` when the slots are full and cannot grow.
    pub fn add_model(&mut self, model: Model, source: &str) -> Option<ModelId> {
        if !self.models.has_room() {
            return None;
        }
        let id = self.tree.add_model(model);
        self.models.entries.push(ModelSlot {
            id,
            source: source.to_string(),
        });
        Some(id)
    }

    /// Store an animation list in the next animation slot
    ///
    /// Returns `None` when the slots are full and cannot grow.
    pub fn add_animations(&mut self, animations: AnimationList, source: &str) -> Option<AnimationsId> {
        if !self.animations.has_room() {
            return None;
        }
        let id = self.tree.add_animations(animations);
        self.animations.entries.push(AnimationsSlot {
            id,
            source: source.to_string(),
        });
        Some(id)
    }

    /// Create a group node in the next node slot, under the scene root
    pub fn add_node(&mut self, name: &str) -> Option<NodeId> {
        if !self.nodes.has_room() {
            return None;
        }
        self.warn_duplicate(name);
        let id = self.tree.create_group(name);
        Some(self.adopt(id))
    }

    /// Create a model node in the next node slot, under the scene root
    ///
    /// Returns `None` when the slots are full or the model is unknown.
    pub fn add_model_node(&mut self, name: &str, model: ModelId) -> Option<NodeId> {
        if self.tree.model(model).is_none() || !self.nodes.has_room() {
            return None;
        }
        self.warn_duplicate(name);
        let id = self.tree.create_model_node(name, model)?;
        Some(self.adopt(id))
    }

    fn adopt(&mut self, id: NodeId) -> NodeId {
        self.tree.attach_child(self.root, id);
        self.nodes.entries.push(id);
        id
    }

    fn warn_duplicate(&self, name: &str) {
        if self.find_node(name).is_some() {
            log::warn!("Scene `{}` already has a node named `{name}`", self.name);
        }
    }

    /// First node, in slot order, with the given name
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .entries
            .iter()
            .copied()
            .find(|&id| self.tree.node(id).is_some_and(|node| node.name() == name))
    }

    /// Number of node slots in use
    pub fn node_count(&self) -> usize {
        self.nodes.entries.len()
    }

    /// Current capacity of the node slots
    pub fn node_capacity(&self) -> usize {
        self.nodes.capacity
    }

    /// Slot index of a node
    pub fn node_index(&self, id: NodeId) -> Option<usize> {
        self.nodes.entries.iter().position(|&slot| slot == id)
    }

    /// Node stored in a slot
    pub fn node_at(&self, index: usize) -> Option<NodeId> {
        self.nodes.entries.get(index).copied()
    }

    /// Node slots in index order
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes.entries
    }

    /// Slot index of a model
    pub fn model_index(&self, id: ModelId) -> Option<usize> {
        self.models.entries.iter().position(|slot| slot.id == id)
    }

    /// Model stored in a slot
    pub fn model_at(&self, index: usize) -> Option<ModelId> {
        self.models.entries.get(index).map(|slot| slot.id)
    }

    /// Model slots in index order
    pub fn models(&self) -> &[ModelSlot] {
        &self.models.entries
    }

    /// Slot index of an animation list
    pub fn animations_index(&self, id: AnimationsId) -> Option<usize> {
        self.animations.entries.iter().position(|slot| slot.id == id)
    }

    /// Animation list stored in a slot
    pub fn animations_at(&self, index: usize) -> Option<AnimationsId> {
        self.animations.entries.get(index).map(|slot| slot.id)
    }

    /// Animation slots in index order
    pub fn animation_lists(&self) -> &[AnimationsSlot] {
        &self.animations.entries
    }

    // Hierarchy helpers

    /// Insert a LOD for `node`, taking the LOD node out of the hierarchy
    ///
    /// LOD nodes are drawn through their owner only, so they must not be
    /// reached by the scene traversal themselves.
    pub fn insert_lod(&mut self, node: NodeId, lod: NodeId, distance: f32) {
        if node == lod {
            log::warn!("A node cannot be its own LOD");
            return;
        }
        self.tree.detach_branch(lod);
        self.tree.insert_lod(node, lod, distance);
    }

    // Per-frame

    /// Refresh every transform under the scene root
    pub fn update(&mut self) {
        self.tree.update_tree(self.root);
    }

    /// Draw the nodes under the scene root that are inside the frustum
    ///
    /// Returns how many nodes were drawn.
    pub fn draw(&mut self, frustum: &Frustum, sink: &mut dyn DrawSink) -> usize {
        self.tree.draw_tree_in_frustum(self.root, frustum, sink)
    }

    /// Advance the animation timeline of every scene node
    ///
    /// Returns the events raised, in slot order.
    pub fn advance_animations(&mut self, delta: f32) -> Vec<(NodeId, AnimationEvent)> {
        let mut events = Vec::new();
        for &id in &self.nodes.entries {
            if let Some(event) = self.tree.advance_animation(id, delta) {
                events.push((id, event));
            }
        }
        events
    }
}
