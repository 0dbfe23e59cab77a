//! Handle types for the scenegraph arenas
//!
//! Nodes, models and animation lists live in slot maps and are referred to by
//! generational keys, so relinking the tree never involves raw pointers and a
//! stale handle simply fails to resolve.

pub use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Handle to a node in a [`NodeTree`](crate::scene::NodeTree)
    pub struct NodeId;

    /// Handle to a model resource owned by a node tree
    pub struct ModelId;

    /// Handle to an animation list owned by a node tree
    pub struct AnimationsId;
}
