/// Mock device (no GPU required)
///
/// Headless `Device` used by the registry tests and by tools that need the
/// resource bookkeeping without a GPU. Every created object gets a unique id,
/// creation of each object kind can be told to fail, and the frame counter
/// only moves when `advance_frame` is called.

use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::device::{
    ComputePipelineDesc, Device, DeviceBackendType, DeviceProperties, GpuComputeProgram,
    GpuComputeProgramDesc, GpuPipeline, GpuShaderProgram, GpuShaderProgramDesc,
    GraphicsPipelineDesc, PipelineBindPoint, ShaderModule, ShaderModuleDesc,
};
use crate::engine_bail;
use crate::error::Result;
use crate::pipeline::PipelineCacheHeader;
use crate::pipeline_state::{PipelineLayout, ShaderStageFlags};
use crate::reflection::{ShaderReflection, ShaderThreadGroupSize};

/// Vendor id reported by `MockDevice`
pub const MOCK_VENDOR_ID: u32 = 0x1AF4;
/// Device id reported by `MockDevice`
pub const MOCK_DEVICE_ID: u32 = 0x0042;
/// Pipeline cache UUID reported by `MockDevice`
pub const MOCK_PIPELINE_CACHE_UUID: [u8; 16] = *b"prism-mock-cache";

// ============================================================================
// Live object tracking
// ============================================================================

/// Increments a shared counter while alive
#[derive(Debug)]
struct LiveToken(Arc<AtomicUsize>);

impl LiveToken {
    fn new(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for LiveToken {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Mock objects
// ============================================================================

#[derive(Debug)]
pub struct MockShaderModule {
    pub id: u64,
    pub stage: ShaderStageFlags,
    pub entry_point: String,
    pub code_size: usize,
    reflection: ShaderReflection,
    _live: LiveToken,
}

impl ShaderModule for MockShaderModule {
    fn stage(&self) -> ShaderStageFlags {
        self.stage
    }

    fn reflection(&self) -> &ShaderReflection {
        &self.reflection
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct MockGpuShaderProgram {
    pub id: u64,
    pub vertex_module_id: u64,
    pub fragment_module_id: u64,
    pipeline_layout: PipelineLayout,
    _live: LiveToken,
}

impl GpuShaderProgram for MockGpuShaderProgram {
    fn pipeline_layout(&self) -> &PipelineLayout {
        &self.pipeline_layout
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct MockGpuComputeProgram {
    pub id: u64,
    pub module_id: u64,
    thread_group_size: ShaderThreadGroupSize,
    pipeline_layout: PipelineLayout,
    _live: LiveToken,
}

impl GpuComputeProgram for MockGpuComputeProgram {
    fn pipeline_layout(&self) -> &PipelineLayout {
        &self.pipeline_layout
    }

    fn thread_group_size(&self) -> ShaderThreadGroupSize {
        self.thread_group_size
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct MockGpuPipeline {
    pub id: u64,
    pub bind_point: PipelineBindPoint,
    /// Id of the program the pipeline was compiled from
    pub program_id: u64,
    _live: LiveToken,
}

impl GpuPipeline for MockGpuPipeline {
    fn bind_point(&self) -> PipelineBindPoint {
        self.bind_point
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Number of objects created so far, per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MockDeviceStats {
    pub shader_modules: usize,
    pub shader_programs: usize,
    pub compute_programs: usize,
    pub graphics_pipelines: usize,
    pub compute_pipelines: usize,
}

// ============================================================================
// Mock device
// ============================================================================

pub struct MockDevice {
    properties: DeviceProperties,
    command_buffering_count: u32,
    frame_count: AtomicU64,
    next_object_id: AtomicU64,
    live_objects: Arc<AtomicUsize>,

    fail_shader_modules: AtomicBool,
    fail_shader_programs: AtomicBool,
    fail_compute_programs: AtomicBool,
    fail_pipelines: AtomicBool,

    shader_modules: AtomicUsize,
    shader_programs: AtomicUsize,
    compute_programs: AtomicUsize,
    graphics_pipelines: AtomicUsize,
    compute_pipelines: AtomicUsize,

    pipeline_cache_payload: Mutex<Vec<u8>>,
}

impl MockDevice {
    /// Mock device with 3 frames of command buffering
    pub fn new() -> Self {
        Self::with_command_buffering_count(3)
    }

    pub fn with_command_buffering_count(command_buffering_count: u32) -> Self {
        Self {
            properties: DeviceProperties {
                vendor_id: MOCK_VENDOR_ID,
                device_id: MOCK_DEVICE_ID,
                pipeline_cache_uuid: MOCK_PIPELINE_CACHE_UUID,
                device_name: "Prism Mock Device".to_string(),
            },
            command_buffering_count,
            frame_count: AtomicU64::new(0),
            next_object_id: AtomicU64::new(1),
            live_objects: Arc::new(AtomicUsize::new(0)),
            fail_shader_modules: AtomicBool::new(false),
            fail_shader_programs: AtomicBool::new(false),
            fail_compute_programs: AtomicBool::new(false),
            fail_pipelines: AtomicBool::new(false),
            shader_modules: AtomicUsize::new(0),
            shader_programs: AtomicUsize::new(0),
            compute_programs: AtomicUsize::new(0),
            graphics_pipelines: AtomicUsize::new(0),
            compute_pipelines: AtomicUsize::new(0),
            pipeline_cache_payload: Mutex::new(Vec::new()),
        }
    }

    /// Move to the next frame, returning the new frame count
    pub fn advance_frame(&self) -> u64 {
        self.frame_count.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Advance `frames` frames at once
    pub fn advance_frames(&self, frames: u64) -> u64 {
        self.frame_count.fetch_add(frames, Ordering::SeqCst) + frames
    }

    pub fn set_fail_shader_modules(&self, fail: bool) {
        self.fail_shader_modules.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_shader_programs(&self, fail: bool) {
        self.fail_shader_programs.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_compute_programs(&self, fail: bool) {
        self.fail_compute_programs.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_pipelines(&self, fail: bool) {
        self.fail_pipelines.store(fail, Ordering::SeqCst);
    }

    /// Creation counters
    pub fn stats(&self) -> MockDeviceStats {
        MockDeviceStats {
            shader_modules: self.shader_modules.load(Ordering::SeqCst),
            shader_programs: self.shader_programs.load(Ordering::SeqCst),
            compute_programs: self.compute_programs.load(Ordering::SeqCst),
            graphics_pipelines: self.graphics_pipelines.load(Ordering::SeqCst),
            compute_pipelines: self.compute_pipelines.load(Ordering::SeqCst),
        }
    }

    /// Number of mock objects currently alive (created and not yet dropped)
    pub fn live_object_count(&self) -> usize {
        self.live_objects.load(Ordering::SeqCst)
    }

    /// Payload last accepted by `import_pipeline_cache` (header stripped)
    pub fn imported_pipeline_cache_payload(&self) -> Vec<u8> {
        self.pipeline_cache_payload
            .lock()
            .map(|payload| payload.clone())
            .unwrap_or_default()
    }

    fn next_id(&self) -> u64 {
        self.next_object_id.fetch_add(1, Ordering::SeqCst)
    }

    fn live_token(&self) -> LiveToken {
        LiveToken::new(&self.live_objects)
    }
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

/// Id of a mock module, 0 for foreign objects
fn module_id(module: &Arc<dyn ShaderModule>) -> u64 {
    module
        .as_any()
        .downcast_ref::<MockShaderModule>()
        .map(|m| m.id)
        .unwrap_or(0)
}

impl Device for MockDevice {
    fn backend_type(&self) -> DeviceBackendType {
        DeviceBackendType::Mock
    }

    fn properties(&self) -> &DeviceProperties {
        &self.properties
    }

    fn create_shader_module(&self, desc: &ShaderModuleDesc) -> Result<Arc<dyn ShaderModule>> {
        if self.fail_shader_modules.load(Ordering::SeqCst) {
            engine_bail!("prism::MockDevice", "Shader module creation failed (stage {:?})", desc.stage);
        }
        self.shader_modules.fetch_add(1, Ordering::SeqCst);

        Ok(Arc::new(MockShaderModule {
            id: self.next_id(),
            stage: desc.stage,
            entry_point: desc.entry_point.clone(),
            code_size: desc.code.len(),
            reflection: desc.reflection.clone(),
            _live: self.live_token(),
        }))
    }

    fn create_gpu_shader_program(&self, desc: &GpuShaderProgramDesc) -> Result<Arc<dyn GpuShaderProgram>> {
        if self.fail_shader_programs.load(Ordering::SeqCst) {
            engine_bail!("prism::MockDevice", "Shader program creation failed");
        }
        if !desc.vertex_module.stage().contains(ShaderStageFlags::VERTEX)
            || !desc.fragment_module.stage().contains(ShaderStageFlags::FRAGMENT)
        {
            engine_bail!(
                "prism::MockDevice",
                "Shader program stage mismatch (vertex module {:?}, fragment module {:?})",
                desc.vertex_module.stage(),
                desc.fragment_module.stage()
            );
        }
        self.shader_programs.fetch_add(1, Ordering::SeqCst);

        Ok(Arc::new(MockGpuShaderProgram {
            id: self.next_id(),
            vertex_module_id: module_id(&desc.vertex_module),
            fragment_module_id: module_id(&desc.fragment_module),
            pipeline_layout: desc.pipeline_layout.clone(),
            _live: self.live_token(),
        }))
    }

    fn create_gpu_compute_program(&self, desc: &GpuComputeProgramDesc) -> Result<Arc<dyn GpuComputeProgram>> {
        if self.fail_compute_programs.load(Ordering::SeqCst) {
            engine_bail!("prism::MockDevice", "Compute program creation failed");
        }
        if !desc.module.stage().contains(ShaderStageFlags::COMPUTE) {
            engine_bail!(
                "prism::MockDevice",
                "Compute program needs a compute module, got {:?}",
                desc.module.stage()
            );
        }
        self.compute_programs.fetch_add(1, Ordering::SeqCst);

        Ok(Arc::new(MockGpuComputeProgram {
            id: self.next_id(),
            module_id: module_id(&desc.module),
            thread_group_size: desc.module.reflection().thread_group_size,
            pipeline_layout: desc.pipeline_layout.clone(),
            _live: self.live_token(),
        }))
    }

    fn create_graphics_pipeline(&self, desc: &GraphicsPipelineDesc) -> Result<Arc<dyn GpuPipeline>> {
        if self.fail_pipelines.load(Ordering::SeqCst) {
            engine_bail!("prism::MockDevice", "Graphics pipeline creation failed");
        }
        self.graphics_pipelines.fetch_add(1, Ordering::SeqCst);

        let program_id = desc
            .program
            .as_any()
            .downcast_ref::<MockGpuShaderProgram>()
            .map(|p| p.id)
            .unwrap_or(0);

        Ok(Arc::new(MockGpuPipeline {
            id: self.next_id(),
            bind_point: PipelineBindPoint::Graphics,
            program_id,
            _live: self.live_token(),
        }))
    }

    fn create_compute_pipeline(&self, desc: &ComputePipelineDesc) -> Result<Arc<dyn GpuPipeline>> {
        if self.fail_pipelines.load(Ordering::SeqCst) {
            engine_bail!("prism::MockDevice", "Compute pipeline creation failed");
        }
        self.compute_pipelines.fetch_add(1, Ordering::SeqCst);

        let program_id = desc
            .program
            .as_any()
            .downcast_ref::<MockGpuComputeProgram>()
            .map(|p| p.id)
            .unwrap_or(0);

        Ok(Arc::new(MockGpuPipeline {
            id: self.next_id(),
            bind_point: PipelineBindPoint::Compute,
            program_id,
            _live: self.live_token(),
        }))
    }

    fn frame_count(&self) -> u64 {
        self.frame_count.load(Ordering::SeqCst)
    }

    fn command_buffering_count(&self) -> u32 {
        self.command_buffering_count
    }

    fn import_pipeline_cache(&self, data: &[u8]) -> bool {
        let Some(header) = PipelineCacheHeader::parse(data) else {
            return false;
        };
        let payload = data.get(header.header_size as usize..).unwrap_or_default();
        match self.pipeline_cache_payload.lock() {
            Ok(mut stored) => {
                *stored = payload.to_vec();
                true
            }
            Err(_) => false,
        }
    }

    fn pipeline_cache_data(&self) -> Vec<u8> {
        let mut data = PipelineCacheHeader::new(&self.properties).to_bytes();
        data.extend_from_slice(&self.imported_pipeline_cache_payload());
        data
    }
}

#[cfg(test)]
#[path = "mock_device_tests.rs"]
mod tests;
