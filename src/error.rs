//! Crate-level error types.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::gpu::context::GpuError;
use crate::scene::loader::MeshLoadError;

/// Errors produced by the lumo crate.
#[derive(Debug)]
pub enum LumoError {
    /// BVH construction was invoked with zero triangles.
    EmptyScene,
    /// A triangle carried a NaN or infinite component.
    DegenerateGeometry {
        /// Index of the offending triangle in the input list.
        index: usize,
    },
    /// A mesh file could not be loaded.
    MeshLoad(MeshLoadError),
    /// The scene-build worker exited without delivering a result.
    SceneBuild(String),
    /// GPU device acquisition or a device-side operation failure.
    Gpu(GpuError),
    /// The compute kernel could not be read from disk.
    ShaderLoad {
        /// Path the engine attempted to load the kernel from.
        path: PathBuf,
        /// The underlying I/O failure.
        source: io::Error,
    },
    /// The render thread exited before reporting startup completion.
    EngineStart(String),
    /// Failed to spawn a background thread.
    ThreadSpawn(io::Error),
    /// Generic I/O failure.
    Io(io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
}

impl fmt::Display for LumoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyScene => {
                write!(f, "BVH build requires at least one triangle")
            }
            Self::DegenerateGeometry { index } => {
                write!(f, "triangle {index} has a non-finite component")
            }
            Self::MeshLoad(e) => write!(f, "mesh load error: {e}"),
            Self::SceneBuild(msg) => {
                write!(f, "scene build error: {msg}")
            }
            Self::Gpu(e) => write!(f, "GPU error: {e}"),
            Self::ShaderLoad { path, source } => {
                write!(
                    f,
                    "failed to load compute kernel from '{}': {source}",
                    path.display()
                )
            }
            Self::EngineStart(msg) => {
                write!(f, "render engine startup failed: {msg}")
            }
            Self::ThreadSpawn(e) => {
                write!(f, "failed to spawn thread: {e}")
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
        }
    }
}

impl std::error::Error for LumoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MeshLoad(e) => Some(e),
            Self::Gpu(e) => Some(e),
            Self::ShaderLoad { source, .. } => Some(source),
            Self::ThreadSpawn(e) | Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GpuError> for LumoError {
    fn from(e: GpuError) -> Self {
        Self::Gpu(e)
    }
}

impl From<MeshLoadError> for LumoError {
    fn from(e: MeshLoadError) -> Self {
        Self::MeshLoad(e)
    }
}

impl From<io::Error> for LumoError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
