//! Renderable payloads: meshes, materials, skeletons
//!
//! These are the plain-data views of the rendering API's model resources.
//! Loading them from disk is the job of an [`AssetLoader`](super::AssetLoader).

use super::Color;
use crate::foundation::math::{Transform, Vec3};
use crate::geometry::AABB;

/// Geometry of a single mesh, in model space
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Mesh name (diagnostics only)
    pub name: String,
    /// Vertex positions
    pub positions: Vec<Vec3>,
}

impl Mesh {
    /// Create a mesh from vertex positions
    pub fn new(name: impl Into<String>, positions: Vec<Vec3>) -> Self {
        Self {
            name: name.into(),
            positions,
        }
    }

    /// Axis-aligned cube of the given size centered on the origin
    pub fn cube(name: impl Into<String>, size: f32) -> Self {
        let h = size * 0.5;
        Self::new(
            name,
            AABB::new(Vec3::repeat(-h), Vec3::repeat(h)).corners().to_vec(),
        )
    }

    /// Bounds of the vertex positions, `None` for an empty mesh
    pub fn bounding_box(&self) -> Option<AABB> {
        AABB::from_points(&self.positions)
    }
}

/// Surface description handed to the draw sink
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Material {
    /// Diffuse map color
    pub diffuse: Color,
}

impl Material {
    /// Material with a plain diffuse color
    pub fn new(diffuse: Color) -> Self {
        Self { diffuse }
    }
}

/// One bone of a skeleton
#[derive(Debug, Clone, PartialEq)]
pub struct BoneInfo {
    /// Bone name, used for attachment lookups
    pub name: String,
    /// Index of the parent bone
    pub parent: Option<usize>,
}

/// A renderable model: meshes, their materials and an optional skeleton
#[derive(Debug, Clone, Default)]
pub struct Model {
    /// Meshes in draw order
    pub meshes: Vec<Mesh>,
    /// Material table
    pub materials: Vec<Material>,
    /// Material index for each mesh
    pub mesh_material: Vec<usize>,
    /// Skeleton bones
    pub bones: Vec<BoneInfo>,
    /// Rest pose of each bone
    pub bind_pose: Vec<Transform>,
    /// Current animated pose of each bone
    pub pose: Vec<Transform>,
}

impl Model {
    /// Model made of the given meshes, all sharing one white material
    pub fn from_meshes(meshes: Vec<Mesh>) -> Self {
        let mesh_material = vec![0; meshes.len()];
        Self {
            meshes,
            materials: vec![Material::default()],
            mesh_material,
            ..Default::default()
        }
    }

    /// Attach a skeleton; the current pose starts at the bind pose
    pub fn with_skeleton(mut self, bones: Vec<BoneInfo>, bind_pose: Vec<Transform>) -> Self {
        self.pose = bind_pose.clone();
        self.bones = bones;
        self.bind_pose = bind_pose;
        self
    }

    /// Material used by a mesh, falling back to the default material when
    /// the model's tables are inconsistent
    pub fn mesh_material(&self, mesh: usize) -> Material {
        self.mesh_material
            .get(mesh)
            .and_then(|&index| self.materials.get(index))
            .copied()
            .unwrap_or_default()
    }

    /// Bounds of all meshes in model space (a zero box for an empty model)
    pub fn bounding_box(&self) -> AABB {
        self.meshes
            .iter()
            .filter_map(Mesh::bounding_box)
            .reduce(|a, b| AABB::new(a.min.inf(&b.min), a.max.sup(&b.max)))
            .unwrap_or_default()
    }

    /// Index of the bone with the given name
    pub fn bone_index(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|bone| bone.name == name)
    }
}
