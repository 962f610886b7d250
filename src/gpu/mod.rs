//! GPU resource management. Everything in this module is called only from
//! the render thread, which is the sole owner of every wgpu object.

pub mod context;
pub mod scene_buffers;

pub use context::{GpuContext, GpuError, DEVICE_WAIT_TIMEOUT};
pub use scene_buffers::GpuSceneBuffers;
