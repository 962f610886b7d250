//! wgpu device acquisition for headless compute.

use std::fmt;
use std::time::Duration;

/// Upper bound on any single device wait (per-frame fence, hot-swap idle,
/// shutdown idle). A wait that exceeds this is treated as a hung device,
/// which is fatal to the render role, so no wait can block a thread
/// forever.
pub const DEVICE_WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors raised by the GPU layer. All of them are fatal to the render
/// role: it logs, cleans up, and exits its loop.
#[derive(Debug)]
pub enum GpuError {
    /// No compatible GPU adapter found.
    AdapterRequest(wgpu::RequestAdapterError),
    /// GPU device request failed (limits or features not met).
    DeviceRequest(wgpu::RequestDeviceError),
    /// A device wait exceeded [`DEVICE_WAIT_TIMEOUT`].
    PollTimeout,
    /// The staging buffer could not be mapped for readback.
    ReadbackMap,
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdapterRequest(e) => {
                write!(f, "no compatible GPU adapter found: {e}")
            }
            Self::DeviceRequest(e) => write!(f, "device request failed: {e}"),
            Self::PollTimeout => {
                write!(
                    f,
                    "device wait exceeded {DEVICE_WAIT_TIMEOUT:?}; assuming a hung device"
                )
            }
            Self::ReadbackMap => {
                write!(f, "failed to map the readback staging buffer")
            }
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::AdapterRequest(e) => Some(e),
            Self::DeviceRequest(e) => Some(e),
            Self::PollTimeout | Self::ReadbackMap => None,
        }
    }
}

/// Owns the core wgpu resources: device and queue. No surface — frames are
/// read back to host memory and blitted by the UI.
pub struct GpuContext {
    /// The wgpu logical device.
    pub device: wgpu::Device,
    /// The wgpu command queue.
    pub queue: wgpu::Queue,
}

impl GpuContext {
    /// Acquire a compute-capable device.
    ///
    /// Requests push-constant support (the kernel takes the triangle count
    /// as a 4-byte push constant) and adapter-specific format features
    /// (read-write storage access on the Rgba8Unorm accumulation image).
    ///
    /// Blocking; called once from the render thread at startup.
    ///
    /// # Errors
    ///
    /// [`GpuError`] when no adapter is available or the device request
    /// fails.
    pub fn new() -> Result<Self, GpuError> {
        pollster::block_on(Self::new_async())
    }

    async fn new_async() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::default();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                ..Default::default()
            })
            .await
            .map_err(GpuError::AdapterRequest)?;

        log::info!(
            "render device: {} ({:?})",
            adapter.get_info().name,
            adapter.get_info().backend
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("lumo device"),
                required_features: wgpu::Features::PUSH_CONSTANTS
                    | wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES,
                required_limits: wgpu::Limits {
                    max_push_constant_size: 4,
                    ..wgpu::Limits::default()
                },
                ..Default::default()
            })
            .await
            .map_err(GpuError::DeviceRequest)?;

        Ok(Self { device, queue })
    }

    /// Block until the device has finished all submitted work, or until
    /// [`DEVICE_WAIT_TIMEOUT`] expires. Guards scene-buffer destruction
    /// during hot-swap, the per-frame fence wait, and final cleanup.
    ///
    /// # Errors
    ///
    /// [`GpuError::PollTimeout`] when the device does not go idle within
    /// the bound.
    pub fn wait_idle(&self) -> Result<(), GpuError> {
        self.device
            .poll(wgpu::PollType::Wait)
            .map(|_| ())
            .map_err(|_| GpuError::PollTimeout)
    }
}
