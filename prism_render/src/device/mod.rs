/// Backend device interface
///
/// The registries depend only on these traits; every GPU API provides one
/// implementation (see the `prism_render_vulkan` crate), and `MockDevice`
/// provides a headless one for tests and tools.

pub mod mock_device;

pub use mock_device::MockDevice;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::pipeline_state::{
    DynamicStateFlags, GraphicsState, PipelineLayout, RenderPassCompatibilityDesc,
    ShaderStageFlags, VertexInputDeclaration,
};
use crate::reflection::{ShaderReflection, ShaderThreadGroupSize};

// ============================================================================
// Device identification
// ============================================================================

/// GPU API behind a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceBackendType {
    /// Explicit API (Vulkan)
    Vulkan,
    /// Legacy API (OpenGL ES)
    OpenGles,
    /// Headless device without GPU objects
    Mock,
}

/// Physical device identification, also used to validate pipeline cache blobs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceProperties {
    /// PCI vendor id
    pub vendor_id: u32,
    /// Vendor-specific device id
    pub device_id: u32,
    /// UUID identifying compatible pipeline cache data
    pub pipeline_cache_uuid: [u8; 16],
    /// Human-readable device name
    pub device_name: String,
}

// ============================================================================
// Creation descriptors
// ============================================================================

/// Shader module creation descriptor
#[derive(Debug, Clone)]
pub struct ShaderModuleDesc {
    /// Stage this module is compiled for (exactly one stage)
    pub stage: ShaderStageFlags,
    /// Entry point function name
    pub entry_point: String,
    /// Backend byte-code (SPIR-V for Vulkan)
    pub code: Vec<u8>,
    /// Reflection of `code`
    pub reflection: ShaderReflection,
}

/// Graphics program creation descriptor (vertex + fragment)
#[derive(Clone)]
pub struct GpuShaderProgramDesc {
    pub vertex_module: Arc<dyn ShaderModule>,
    pub fragment_module: Arc<dyn ShaderModule>,
    /// Layout the program is linked against
    pub pipeline_layout: PipelineLayout,
}

/// Compute program creation descriptor
#[derive(Clone)]
pub struct GpuComputeProgramDesc {
    pub module: Arc<dyn ShaderModule>,
    /// Layout the program is linked against
    pub pipeline_layout: PipelineLayout,
}

/// Graphics pipeline creation descriptor
pub struct GraphicsPipelineDesc<'a> {
    pub program: Arc<dyn GpuShaderProgram>,
    pub graphics_state: &'a GraphicsState,
    pub vertex_input_declaration: &'a VertexInputDeclaration,
    pub render_pass: &'a RenderPassCompatibilityDesc,
    /// Dynamic state requested on top of the graphics state's own flags
    pub dynamic_state_flags: DynamicStateFlags,
}

/// Compute pipeline creation descriptor
pub struct ComputePipelineDesc {
    pub program: Arc<dyn GpuComputeProgram>,
}

// ============================================================================
// Backend objects
// ============================================================================

/// Compiled shader module
pub trait ShaderModule: Send + Sync + fmt::Debug {
    /// Stage of the module
    fn stage(&self) -> ShaderStageFlags;

    /// Reflection the module was created with
    fn reflection(&self) -> &ShaderReflection;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}

/// Linked graphics program (vertex + fragment modules and their layout)
pub trait GpuShaderProgram: Send + Sync + fmt::Debug {
    /// Layout the program was linked against
    fn pipeline_layout(&self) -> &PipelineLayout;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}

/// Linked compute program
pub trait GpuComputeProgram: Send + Sync + fmt::Debug {
    /// Layout the program was linked against
    fn pipeline_layout(&self) -> &PipelineLayout;

    /// Local workgroup size of the module
    fn thread_group_size(&self) -> ShaderThreadGroupSize;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}

/// Pipeline bind point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineBindPoint {
    Graphics,
    Compute,
}

/// Compiled pipeline state object
pub trait GpuPipeline: Send + Sync + fmt::Debug {
    /// Bind point of the pipeline
    fn bind_point(&self) -> PipelineBindPoint;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}

// ============================================================================
// Device trait
// ============================================================================

/// Backend device
///
/// Object creation is only called from the thread that owns the device
/// (the frame loop draining the shader registry); queries may come from anywhere.
pub trait Device: Send + Sync {
    /// GPU API of this device
    fn backend_type(&self) -> DeviceBackendType;

    /// Physical device identification
    fn properties(&self) -> &DeviceProperties;

    /// Create a shader module from byte-code and its reflection
    fn create_shader_module(&self, desc: &ShaderModuleDesc) -> Result<Arc<dyn ShaderModule>>;

    /// Link a vertex and a fragment module into a graphics program
    fn create_gpu_shader_program(&self, desc: &GpuShaderProgramDesc) -> Result<Arc<dyn GpuShaderProgram>>;

    /// Link a compute module into a compute program
    fn create_gpu_compute_program(&self, desc: &GpuComputeProgramDesc) -> Result<Arc<dyn GpuComputeProgram>>;

    /// Compile a graphics pipeline
    fn create_graphics_pipeline(&self, desc: &GraphicsPipelineDesc) -> Result<Arc<dyn GpuPipeline>>;

    /// Compile a compute pipeline
    fn create_compute_pipeline(&self, desc: &ComputePipelineDesc) -> Result<Arc<dyn GpuPipeline>>;

    /// Number of frames submitted so far
    fn frame_count(&self) -> u64;

    /// Maximum number of frames the GPU may still be executing
    fn command_buffering_count(&self) -> u32;

    /// Seed the backend pipeline cache with previously stored data
    ///
    /// The data has already been validated against `properties()`. Returns
    /// false when the backend rejected it.
    fn import_pipeline_cache(&self, data: &[u8]) -> bool;

    /// Current pipeline cache contents (empty when unsupported)
    fn pipeline_cache_data(&self) -> Vec<u8>;
}
