/*!
# Prism Render

GPU resource and shader/pipeline management core.

This crate provides the platform-agnostic registries that create, deduplicate,
cache and safely destroy backend GPU objects. Backend implementations
(Vulkan, OpenGL ES, ...) plug in through the `Device` trait; `MockDevice`
is a headless backend for tests and tools.

## Architecture

- **RenderHandle**: opaque kind + slot index identity handed out by every registry
- **PipelineLayoutCache**: name-addressable descriptor-set layouts and push constants
- **GraphicsStateCache**: fixed-function state, addressable by name, hash and render slot
- **VertexInputDeclarationRegistry**: vertex bindings and attributes
- **ShaderManager**: shader modules, shaders and compute shaders with base/variant
  resolution, drained once per frame on the thread that owns the device
- **PipelineStateCache**: compiled pipeline objects for a shader, state and render pass

Replaced GPU objects are kept alive until every frame that may still use them
has retired.
*/

// Internal modules
pub mod error;
pub mod log;
pub mod config;
pub mod device;
pub mod handle;
pub mod pipeline;
pub mod pipeline_state;
pub mod reflection;
pub mod resource;
pub mod shader;
pub mod utils;

#[cfg(test)]
mod test_utils;

pub use config::ShaderManagerConfig;
pub use error::{Error, Result};
pub use handle::{RenderHandle, RenderHandleReference, RenderHandleType};
pub use pipeline::PipelineStateCache;
pub use shader::ShaderManager;

// Main prism namespace module
pub mod prism {
    // Error types
    pub use crate::error::{Error, Result};

    // Configuration
    pub use crate::config::ShaderManagerConfig;

    // Handles
    pub use crate::handle::{variant_key, RenderHandle, RenderHandleReference, RenderHandleType};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
    }

    // Backend device interface
    pub mod device {
        pub use crate::device::*;
    }

    // Descriptor and state data model
    pub mod pipeline_state {
        pub use crate::pipeline_state::*;
    }

    // Reflection data
    pub mod reflection {
        pub use crate::reflection::*;
    }

    // Resource caches
    pub mod resource {
        pub use crate::resource::*;
    }

    // Shader registry
    pub mod shader {
        pub use crate::shader::*;
    }

    // Compiled pipelines
    pub mod pipeline {
        pub use crate::pipeline::*;
    }
}
