//! Scene building: mesh loading, instance transforms, and BVH assembly.
//!
//! Everything here is CPU-only and runs on the build worker thread. The
//! output is a [`BuiltScene`] package of POD streams ready for GPU upload
//! by the render role.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use super::{loader, Scene};
use crate::bvh;
use crate::error::LumoError;
use crate::geometry::Triangle;

/// Vertex stream record: three vertices, each padded to a vec4 slot so the
/// kernel's storage struct lines up. 48-byte stride.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuTriangle {
    /// First vertex.
    pub v0: [f32; 3],
    _pad0: f32,
    /// Second vertex.
    pub v1: [f32; 3],
    _pad1: f32,
    /// Third vertex.
    pub v2: [f32; 3],
    _pad2: f32,
}

/// Material stream record: linear color plus the shading tag. 16-byte
/// stride.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuMaterial {
    /// Linear-space color.
    pub color: [f32; 3],
    /// Shading classification tag.
    pub tag: f32,
}

/// CPU-side package produced by a scene build, owned by the build task
/// until submission and by the render role until upload completes.
///
/// The triangle streams are in BVH leaf order, so the sign-encoded indices
/// in [`nodes`] address them directly.
///
/// [`nodes`]: Self::nodes
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltScene {
    /// Vertex stream, one record per triangle.
    pub vertices: Vec<GpuTriangle>,
    /// Material stream, one record per triangle.
    pub materials: Vec<GpuMaterial>,
    /// Flattened BVH node records.
    pub nodes: Vec<bvh::FlatBvhNode>,
    /// Number of triangles in the streams.
    pub triangle_count: u32,
}

impl BuiltScene {
    /// The package of a scene with no triangles. Valid: the engine binds
    /// dummy buffers and the kernel renders pure sky.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            vertices: Vec::new(),
            materials: Vec::new(),
            nodes: Vec::new(),
            triangle_count: 0,
        }
    }

    /// Whether the package carries no geometry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangle_count == 0
    }

    /// Vertex stream as raw bytes for upload.
    #[must_use]
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Material stream as raw bytes for upload.
    #[must_use]
    pub fn material_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.materials)
    }

    /// BVH node stream as raw bytes for upload.
    #[must_use]
    pub fn node_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.nodes)
    }
}

/// Apply an instance transform: scale componentwise, then translate.
#[must_use]
pub fn transform_vertex(v: Vec3, scale: Vec3, position: Vec3) -> Vec3 {
    v * scale + position
}

/// Build the GPU-ready package for a scene snapshot.
///
/// Loads every instance's mesh, transforms and tags its triangles, then
/// builds and flattens a single BVH over the whole soup. An instance whose
/// mesh fails to load is skipped with a warning; a scene with no loadable
/// triangles yields [`BuiltScene::empty`].
///
/// # Errors
///
/// [`LumoError::DegenerateGeometry`] when a loaded mesh carries non-finite
/// vertices.
pub fn build_scene(snapshot: &Scene) -> Result<BuiltScene, LumoError> {
    let mut triangles: Vec<Triangle> = Vec::new();

    for instance in snapshot.instances() {
        match loader::load_triangle_soup(&instance.mesh_path) {
            Ok(soup) => {
                triangles.reserve(soup.len());
                for [a, b, c] in soup {
                    triangles.push(Triangle::new(
                        transform_vertex(a, instance.scale, instance.position),
                        transform_vertex(b, instance.scale, instance.position),
                        transform_vertex(c, instance.scale, instance.position),
                        instance.color,
                        instance.material,
                    ));
                }
            }
            Err(e) => {
                log::warn!("skipping instance '{}': {e}", instance.name);
            }
        }
    }

    if triangles.is_empty() {
        log::info!("scene build produced no triangles");
        return Ok(BuiltScene::empty());
    }

    let root = bvh::build(&triangles)?;
    let flat = bvh::flatten(&root, &triangles);

    let vertices = flat
        .triangles
        .iter()
        .map(|t| GpuTriangle {
            v0: t.v0.to_array(),
            _pad0: 0.0,
            v1: t.v1.to_array(),
            _pad1: 0.0,
            v2: t.v2.to_array(),
            _pad2: 0.0,
        })
        .collect();
    let materials = flat
        .triangles
        .iter()
        .map(|t| GpuMaterial {
            color: t.color.to_array(),
            tag: t.material.tag(),
        })
        .collect();

    let triangle_count = flat.triangles.len() as u32;
    log::debug!(
        "scene build: {} triangles, {} BVH nodes",
        triangle_count,
        flat.nodes.len()
    );

    Ok(BuiltScene {
        vertices,
        materials,
        nodes: flat.nodes,
        triangle_count,
    })
}
