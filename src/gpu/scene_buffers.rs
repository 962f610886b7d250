//! Device-side scene storage: one movable bundle per uploaded scene.

use wgpu::util::DeviceExt;

use crate::scene::BuiltScene;

/// The three storage buffers of one uploaded scene plus its triangle
/// count. Created during a hot-swap and dropped (destroying the buffers)
/// only after the render role has waited for device idle.
///
/// A storage-buffer slot may not be empty, so streams with no data leave
/// their field `None` and the bind group falls back to the engine's shared
/// dummy buffer.
pub struct GpuSceneBuffers {
    vertices: Option<wgpu::Buffer>,
    materials: Option<wgpu::Buffer>,
    nodes: Option<wgpu::Buffer>,
    /// Number of triangles addressable by the kernel.
    pub triangle_count: u32,
}

impl GpuSceneBuffers {
    /// Upload a built scene's streams into fresh storage buffers.
    #[must_use]
    pub fn upload(device: &wgpu::Device, scene: &BuiltScene) -> Self {
        Self {
            vertices: make_storage(device, "scene vertices", scene.vertex_bytes()),
            materials: make_storage(device, "scene materials", scene.material_bytes()),
            nodes: make_storage(device, "scene bvh nodes", scene.node_bytes()),
            triangle_count: scene.triangle_count,
        }
    }

    /// The vertex-stream buffer, or `dummy` when the scene is empty.
    #[must_use]
    pub fn vertices_or<'a>(&'a self, dummy: &'a wgpu::Buffer) -> &'a wgpu::Buffer {
        self.vertices.as_ref().unwrap_or(dummy)
    }

    /// The material-stream buffer, or `dummy` when the scene is empty.
    #[must_use]
    pub fn materials_or<'a>(&'a self, dummy: &'a wgpu::Buffer) -> &'a wgpu::Buffer {
        self.materials.as_ref().unwrap_or(dummy)
    }

    /// The BVH-node buffer, or `dummy` when the scene is empty.
    #[must_use]
    pub fn nodes_or<'a>(&'a self, dummy: &'a wgpu::Buffer) -> &'a wgpu::Buffer {
        self.nodes.as_ref().unwrap_or(dummy)
    }
}

fn make_storage(
    device: &wgpu::Device,
    label: &str,
    bytes: &[u8],
) -> Option<wgpu::Buffer> {
    if bytes.is_empty() {
        return None;
    }
    Some(
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytes,
            usage: wgpu::BufferUsages::STORAGE,
        }),
    )
}
