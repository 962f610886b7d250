// -- Lint policy ---------------------------------------------------------
// Crate-wide lints beyond the Cargo.toml tables.
#![deny(clippy::dbg_macro)]
#![deny(clippy::todo)]
#![deny(clippy::wildcard_imports)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Real-time GPU ray tracing engine built on wgpu.
//!
//! Lumo renders triangulated mesh scenes with a compute kernel, refining the
//! image progressively by averaging successive sample frames until the scene
//! or the view changes.
//!
//! # Key entry points
//!
//! - [`engine::RenderEngine`] - the render role; sole owner of the GPU
//! - [`scene::Scene`] - the editable collection of model instances
//! - [`scene::BuildTask`] - the ephemeral worker that turns a scene snapshot
//!   into GPU-ready streams
//! - [`bvh`] - BVH construction and linearization
//! - [`options::Options`] - runtime configuration (render size, kernel path,
//!   camera)
//!
//! # Architecture
//!
//! Three roles share the work. The UI role owns the scene, the camera, and
//! the accumulation counter; it never calls the GPU API. The render role is
//! one dedicated thread that drains command queues, dispatches the compute
//! kernel, and publishes finished frames through a lock-free single-slot
//! triple buffer. Scene edits spawn an ephemeral build role that loads
//! meshes, builds and flattens the BVH on a worker thread, and hands the
//! finished package back for upload.

#[cfg(feature = "viewer")]
pub mod app;
pub mod bvh;
pub mod camera;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod gpu;
pub mod input;
pub mod options;
pub mod scene;

pub use engine::{Frame, RenderEngine};
pub use error::LumoError;
