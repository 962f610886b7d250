//! Render-loop internals. Everything here runs on the render thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use super::command::drain_latest;
use super::readback::{padded_bytes_per_row, unpad_rows};
use super::Frame;
use crate::camera::{Camera, CameraUniform};
use crate::error::LumoError;
use crate::gpu::{GpuContext, GpuError, GpuSceneBuffers, DEVICE_WAIT_TIMEOUT};
use crate::options::Options;
use crate::scene::BuiltScene;

/// Kernel workgroup size along x and y; the dispatch is sized to cover the
/// image at this granularity.
const WORKGROUP_SIZE: u32 = 8;

/// Sleep while no camera has ever been received.
const IDLE_SLEEP: Duration = Duration::from_millis(5);

/// All GPU state owned by the render loop.
pub(super) struct EngineCore {
    ctx: GpuContext,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    storage_texture: wgpu::Texture,
    storage_view: wgpu::TextureView,
    staging: wgpu::Buffer,
    uniform: wgpu::Buffer,
    dummy: wgpu::Buffer,
    scene: Option<GpuSceneBuffers>,
    camera: Option<Camera>,
    sky_enabled: bool,
    exposure: f32,
    width: u32,
    height: u32,
    padded_bytes_per_row: u32,
}

impl EngineCore {
    /// Create the device, pipeline, accumulation image, and descriptor
    /// state. Called once, on the render thread, before the loop starts.
    pub(super) fn init(options: &Options) -> Result<Self, LumoError> {
        let shader_path = &options.render.shader_path;
        let shader_src = std::fs::read_to_string(shader_path).map_err(|source| {
            LumoError::ShaderLoad {
                path: shader_path.clone(),
                source,
            }
        })?;

        let ctx = GpuContext::new()?;
        let device = &ctx.device;
        let width = options.render.width;
        let height = options.render.height;

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("raytrace kernel"),
            source: wgpu::ShaderSource::Wgsl(shader_src.into()),
        });

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("raytrace bindings"),
                entries: &[
                    // 0: current-frame output (kernel writes the running mean)
                    storage_texture_entry(0),
                    // 1: per-triangle vertex stream
                    storage_buffer_entry(1),
                    // 2: per-triangle material stream
                    storage_buffer_entry(2),
                    // 3: flat BVH node array
                    storage_buffer_entry(3),
                    // 4: camera + accumulation state
                    wgpu::BindGroupLayoutEntry {
                        binding: 4,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    // 5: previous-frame input for progressive averaging
                    storage_texture_entry(5),
                ],
            });

        let pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("raytrace layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[wgpu::PushConstantRange {
                    stages: wgpu::ShaderStages::COMPUTE,
                    range: 0..4,
                }],
            });

        let pipeline =
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("raytrace pipeline"),
                layout: Some(&pipeline_layout),
                module: &module,
                entry_point: Some("main"),
                compilation_options: Default::default(),
                cache: None,
            });

        // The accumulation image doubles as the kernel's history input: it
        // is bound at 0 and 5 simultaneously and keeps last frame's mean
        // between dispatches.
        let storage_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("accumulation image"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let storage_view =
            storage_texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Readback rows must be aligned to the copy granularity.
        let padded_row = padded_bytes_per_row(width);
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame staging"),
            size: u64::from(padded_row) * u64::from(height),
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("camera uniform"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // A storage-buffer slot may not be empty; this stands in for the
        // scene streams until real geometry arrives.
        let dummy = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("dummy storage"),
            size: 4,
            usage: wgpu::BufferUsages::STORAGE,
            mapped_at_creation: false,
        });

        let bind_group = create_bind_group(
            device,
            &bind_group_layout,
            &storage_view,
            &uniform,
            None,
            &dummy,
        );

        log::info!("render engine initialized ({width}x{height})");

        Ok(Self {
            ctx,
            pipeline,
            bind_group_layout,
            bind_group,
            storage_texture,
            storage_view,
            staging,
            uniform,
            dummy,
            scene: None,
            camera: None,
            sky_enabled: true,
            exposure: 1.0,
            width,
            height,
            padded_bytes_per_row: padded_row,
        })
    }

    /// The main loop: drain queues, render, publish, until `running`
    /// clears or a fatal GPU failure occurs.
    pub(super) fn run(
        &mut self,
        running: &AtomicBool,
        scene_rx: &Receiver<BuiltScene>,
        camera_rx: &Receiver<Camera>,
        sky_rx: &Receiver<bool>,
        exposure_rx: &Receiver<f32>,
        mut frame_tx: triple_buffer::Input<Option<Frame>>,
    ) {
        while running.load(Ordering::Acquire) {
            // Scene uploads are the slow path: at most one per iteration.
            if let Ok(package) = scene_rx.try_recv() {
                if let Err(e) = self.install_scene(&package) {
                    log::error!("render engine: fatal GPU failure: {e}");
                    break;
                }
            }
            // Fast-path queues drain to the last value so the engine never
            // renders against a stale camera while newer ones are pending.
            if let Some(camera) = drain_latest(camera_rx) {
                self.camera = Some(camera);
            }
            if let Some(sky) = drain_latest(sky_rx) {
                self.sky_enabled = sky;
            }
            if let Some(exposure) = drain_latest(exposure_rx) {
                self.exposure = exposure;
            }

            // Nothing to render against until the first camera arrives.
            let Some(camera) = self.camera else {
                std::thread::sleep(IDLE_SLEEP);
                continue;
            };

            // The uniform write must land before this iteration's submit;
            // write_buffer stages it into the same submission.
            self.write_uniform(&camera);

            match self.render_frame() {
                Ok(frame) => frame_tx.write(Some(frame)),
                Err(e) => {
                    log::error!("render engine: fatal GPU failure: {e}");
                    break;
                }
            }
        }

        // Final device-idle before the wgpu handles drop. Best-effort: a
        // hung device cannot hold the thread past the wait bound.
        if self.ctx.wait_idle().is_err() {
            log::warn!("device still busy at shutdown; dropping handles anyway");
        }
        log::info!("render engine stopped");
    }

    /// Hot-swap the device-side scene. No in-flight work may reference the
    /// old buffers, so the swap waits for device idle first.
    fn install_scene(&mut self, package: &BuiltScene) -> Result<(), GpuError> {
        self.ctx.wait_idle()?;
        // Old handles are destroyed before the replacements are created.
        self.scene = None;

        let buffers = GpuSceneBuffers::upload(&self.ctx.device, package);
        self.bind_group = create_bind_group(
            &self.ctx.device,
            &self.bind_group_layout,
            &self.storage_view,
            &self.uniform,
            Some(&buffers),
            &self.dummy,
        );
        log::info!(
            "scene installed: {} triangles, {} BVH nodes",
            package.triangle_count,
            package.nodes.len()
        );
        self.scene = Some(buffers);
        Ok(())
    }

    /// Rewrite the uniform block from the most recent commands.
    ///
    /// The engine never changes the accumulation counter itself; it copies
    /// whatever value the UI last supplied.
    fn write_uniform(&self, camera: &Camera) {
        let uniform = CameraUniform::new(camera, self.sky_enabled, self.exposure);
        self.ctx
            .queue
            .write_buffer(&self.uniform, 0, bytemuck::bytes_of(&uniform));
    }

    /// Record, submit, and wait for one frame, then read it back.
    fn render_frame(&mut self) -> Result<Frame, GpuError> {
        let triangle_count =
            self.scene.as_ref().map_or(0, |scene| scene.triangle_count);

        let mut encoder = self.ctx.device.create_command_encoder(
            &wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            },
        );

        {
            let mut pass =
                encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                    label: Some("raytrace pass"),
                    timestamp_writes: None,
                });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.set_push_constants(0, bytemuck::bytes_of(&triangle_count));
            pass.dispatch_workgroups(
                self.width.div_ceil(WORKGROUP_SIZE),
                self.height.div_ceil(WORKGROUP_SIZE),
                1,
            );
        }

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.storage_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(self.padded_bytes_per_row),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );

        let _ = self.ctx.queue.submit(std::iter::once(encoder.finish()));

        // Fenced wait, then map the staging buffer and unpad the rows.
        // Both waits are bounded so a wedged device fails the frame
        // instead of hanging the thread.
        let buffer_slice = self.staging.slice(..);
        let (sender, receiver) = mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        self.ctx.wait_idle()?;
        match receiver.recv_timeout(DEVICE_WAIT_TIMEOUT) {
            Ok(Ok(())) => {}
            Ok(Err(_)) | Err(mpsc::RecvTimeoutError::Disconnected) => {
                return Err(GpuError::ReadbackMap)
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                return Err(GpuError::PollTimeout)
            }
        }

        let pixels = {
            let data = buffer_slice.get_mapped_range();
            unpad_rows(
                &data,
                self.width,
                self.height,
                self.padded_bytes_per_row as usize,
            )
        };
        self.staging.unmap();

        Ok(Frame {
            width: self.width,
            height: self.height,
            pixels,
        })
    }
}

fn storage_texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::StorageTexture {
            access: wgpu::StorageTextureAccess::ReadWrite,
            format: wgpu::TextureFormat::Rgba8Unorm,
            view_dimension: wgpu::TextureViewDimension::D2,
        },
        count: None,
    }
}

fn storage_buffer_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: true },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Rebuild the six descriptor writes. Bindings 0 and 5 reference the same
/// accumulation image view; empty scene slots fall back to the dummy
/// buffer so the bind group stays valid.
fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    storage_view: &wgpu::TextureView,
    uniform: &wgpu::Buffer,
    scene: Option<&GpuSceneBuffers>,
    dummy: &wgpu::Buffer,
) -> wgpu::BindGroup {
    let vertices = scene.map_or(dummy, |s| s.vertices_or(dummy));
    let materials = scene.map_or(dummy, |s| s.materials_or(dummy));
    let nodes = scene.map_or(dummy, |s| s.nodes_or(dummy));

    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("raytrace bind group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(storage_view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: vertices.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: materials.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: nodes.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 4,
                resource: uniform.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 5,
                resource: wgpu::BindingResource::TextureView(storage_view),
            },
        ],
    })
}
