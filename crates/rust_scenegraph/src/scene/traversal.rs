//! Tree traversal and frustum-gated drawing
//!
//! Traversal is a stackless pre-order walk driven by the parent and sibling
//! links: a parent is always visited before its children, and siblings in
//! list order (most recently attached first). Starting from a node, the walk
//! covers its subtree and then the subtrees of its following siblings.

use super::node::Visibility;
use super::tree::NodeTree;
use crate::culling::Frustum;
use crate::foundation::collections::NodeId;
use crate::render::DrawSink;

/// Pre-order iterator over a subtree, see [`NodeTree::walk`]
pub struct Walk<'a> {
    tree: &'a NodeTree,
    boundary: Option<NodeId>,
    next: Option<NodeId>,
}

impl Iterator for Walk<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.walk_successor(current, self.boundary);
        Some(current)
    }
}

impl NodeTree {
    /// Iterate over `root`, its descendants and its following siblings
    pub fn walk(&self, root: NodeId) -> Walk<'_> {
        let start = self.nodes.get(root);
        Walk {
            tree: self,
            boundary: start.and_then(|node| node.parent),
            next: start.map(|_| root),
        }
    }

    /// Node visited after `current` by a walk that must not climb to `boundary`
    ///
    /// A walk started at `root` uses `root`'s parent as its boundary. Holding
    /// the cursor outside the tree lets callers mutate nodes between steps.
    pub fn walk_successor(&self, current: NodeId, boundary: Option<NodeId>) -> Option<NodeId> {
        let node = self.nodes.get(current)?;
        if node.first_child.is_some() {
            return node.first_child;
        }

        let mut cursor = node;
        loop {
            if cursor.next_sibling.is_some() {
                return cursor.next_sibling;
            }
            match cursor.parent {
                Some(parent) if Some(parent) != boundary => cursor = self.nodes.get(parent)?,
                _ => return None,
            }
        }
    }

    /// Refresh the transforms of every node reached by [`walk`](Self::walk)
    ///
    /// Parents are updated before their children, so one call brings the whole
    /// subtree up to date.
    pub fn update_tree(&mut self, root: NodeId) {
        let boundary = self.nodes.get(root).and_then(|node| node.parent);
        let mut cursor = self.nodes.contains_key(root).then_some(root);
        while let Some(id) = cursor {
            self.update_transforms(id);
            cursor = self.walk_successor(id, boundary);
        }
    }

    /// Draw one node if its bounding sphere is inside the frustum
    ///
    /// The camera distance and LOD selection are refreshed even when the node
    /// ends up culled. The selected LOD's meshes are drawn with this node's
    /// world transform, each material color multiplied by this node's tint.
    /// Returns whether anything was drawn.
    pub fn draw_in_frustum(&mut self, id: NodeId, frustum: &Frustum, sink: &mut dyn DrawSink) -> bool {
        let Some(node) = self.nodes.get(id) else {
            return false;
        };
        let transform = node.world;
        let tint = node.tint;
        let bounds = node.transformed;
        let distance = (node.world_position() - frustum.camera.position).norm();

        let mut active = id;
        while let Some(entry) = self.nodes.get(active) {
            match entry.next_lod {
                Some(next) if entry.next_distance < distance && self.nodes.contains_key(next) => {
                    active = next;
                }
                _ => break,
            }
        }

        let model = self
            .nodes
            .get(active)
            .and_then(|lod| lod.model)
            .and_then(|model| self.models.get(model));

        let inside = match model {
            Some(model) if frustum.contains_sphere(bounds.center, bounds.radius) => {
                for (index, mesh) in model.meshes.iter().enumerate() {
                    let mut material = model.mesh_material(index);
                    material.diffuse = material.diffuse.tint(tint);
                    sink.draw_mesh(mesh, &material, &transform);
                }
                true
            }
            _ => false,
        };

        let node = &mut self.nodes[id];
        node.active_lod = Some(active);
        node.visibility = Visibility {
            last_frustum: Some(*frustum),
            inside_frustum: inside,
            distance_to_camera: distance,
        };

        inside
    }

    /// Run [`draw_in_frustum`](Self::draw_in_frustum) over a walk from `root`
    ///
    /// Returns how many nodes were drawn.
    pub fn draw_tree_in_frustum(&mut self, root: NodeId, frustum: &Frustum, sink: &mut dyn DrawSink) -> usize {
        let boundary = self.nodes.get(root).and_then(|node| node.parent);
        let mut cursor = self.nodes.contains_key(root).then_some(root);
        let mut drawn = 0;
        while let Some(id) = cursor {
            if self.draw_in_frustum(id, frustum, sink) {
                drawn += 1;
            }
            cursor = self.walk_successor(id, boundary);
        }
        log::trace!("Drew {drawn} nodes");
        drawn
    }
}
