//! Draw-call sink consumed by frustum-gated rendering

use super::{Color, Material, Mesh};
use crate::foundation::math::Mat4;

/// Receives the draw calls issued for visible nodes
pub trait DrawSink {
    /// Draw `mesh` with `material` at the world `transform`
    fn draw_mesh(&mut self, mesh: &Mesh, material: &Material, transform: &Mat4);
}

/// A draw call captured by [`DrawRecorder`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    /// Name of the drawn mesh
    pub mesh: String,
    /// Diffuse color after tinting
    pub color: Color,
    /// World transform used for the draw
    pub transform: Mat4,
}

/// Sink that records draw calls instead of submitting them
#[derive(Debug, Clone, Default)]
pub struct DrawRecorder {
    /// Draw calls in submission order
    pub draws: Vec<RecordedDraw>,
}

impl DrawRecorder {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything recorded so far
    pub fn clear(&mut self) {
        self.draws.clear();
    }
}

impl DrawSink for DrawRecorder {
    fn draw_mesh(&mut self, mesh: &Mesh, material: &Material, transform: &Mat4) {
        self.draws.push(RecordedDraw {
            mesh: mesh.name.clone(),
            color: material.diffuse,
            transform: *transform,
        });
    }
}
