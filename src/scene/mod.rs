//! Scene model: the editable list of model instances and its snapshots.

pub mod build_task;
pub mod builder;
pub mod loader;

use std::path::{Path, PathBuf};

use glam::Vec3;

use crate::geometry::Material;

pub use build_task::BuildTask;
pub use builder::{build_scene, BuiltScene};

/// One placed model: a mesh file plus the transform and shading attributes
/// applied to every triangle of that mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInstance {
    /// Path of the mesh file to load.
    pub mesh_path: PathBuf,
    /// Human-readable name (defaults to the file stem).
    pub name: String,
    /// World-space translation, applied after scaling.
    pub position: Vec3,
    /// Per-axis scale, applied before translation.
    pub scale: Vec3,
    /// Linear-space color applied to every triangle.
    pub color: Vec3,
    /// Shading classification applied to every triangle.
    pub material: Material,
}

impl ModelInstance {
    /// Instance of the mesh at `path` with identity transform, white matte
    /// shading, and a name derived from the file stem.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let mesh_path = path.into();
        let name = display_name(&mesh_path);
        Self {
            mesh_path,
            name,
            position: Vec3::ZERO,
            scale: Vec3::ONE,
            color: Vec3::splat(0.8),
            material: Material::Matte,
        }
    }

    /// Builder-style position override.
    #[must_use]
    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Builder-style scale override.
    #[must_use]
    pub fn scaled(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Builder-style color override.
    #[must_use]
    pub fn colored(mut self, color: Vec3) -> Self {
        self.color = color;
        self
    }

    /// Builder-style material override.
    #[must_use]
    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }
}

fn display_name(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned())
}

/// Ordered collection of model instances. Owned exclusively by the UI
/// role; worker threads only ever see [`snapshot`]s.
///
/// [`snapshot`]: Scene::snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    instances: Vec<ModelInstance>,
}

impl Scene {
    /// Empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instance.
    pub fn add(&mut self, instance: ModelInstance) {
        self.instances.push(instance);
    }

    /// Remove and return the instance at `index`, if it exists.
    pub fn remove(&mut self, index: usize) -> Option<ModelInstance> {
        (index < self.instances.len()).then(|| self.instances.remove(index))
    }

    /// Remove every instance.
    pub fn clear(&mut self) {
        self.instances.clear();
    }

    /// Number of instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether the scene holds no instances.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Immutable view of the instances, in insertion order.
    #[must_use]
    pub fn instances(&self) -> &[ModelInstance] {
        &self.instances
    }

    /// Mutable access to one instance for UI edits.
    pub fn instance_mut(&mut self, index: usize) -> Option<&mut ModelInstance> {
        self.instances.get_mut(index)
    }

    /// Deep copy safe to hand to a build worker.
    #[must_use]
    pub fn snapshot(&self) -> Self {
        self.clone()
    }
}
