/// Pending allocation queue and deferred destruction
///
/// Every mutation that needs the backend device travels through one
/// single-consumer channel drained by `ShaderManager::handle_pending_allocations`
/// on the thread that owns the device. Producers on other threads only hold a
/// `ShaderRequestSender`.

use std::sync::Arc;

use crossbeam_channel::Sender;

use crate::device::{GpuComputeProgram, GpuPipeline, GpuShaderProgram, ShaderModuleDesc};
use crate::engine_warn;
use crate::handle::RenderHandle;
use crate::shader::client::{ComputeShaderDesc, ShaderDesc};

/// Request sent from a thread that does not own the shader manager
#[derive(Debug, Clone)]
pub enum ShaderRequest {
    /// Create or hot-reload a shader module
    CreateShaderModule { name: String, desc: ShaderModuleDesc },
    /// Create a graphics shader; module indices of `desc` are resolved from the names
    CreateShader {
        desc: ShaderDesc,
        vertex_module: String,
        fragment_module: String,
    },
    /// Create a compute shader; the module index of `desc` is resolved from the name
    CreateComputeShader { desc: ComputeShaderDesc, module: String },
    /// Destroy any resource handle
    Destroy { handle: RenderHandle },
}

/// A GPU program owned by a shader slot
#[derive(Debug, Clone)]
pub enum GpuProgram {
    Graphics(Arc<dyn GpuShaderProgram>),
    Compute(Arc<dyn GpuComputeProgram>),
}

/// Queue entry consumed by the frame drain
pub(crate) enum PendingOp {
    Request(ShaderRequest),
    /// Compile (or recompile) module `index`
    CreateModule { index: u32 },
    /// Create or replace the program of a shader slot
    CreateProgram { handle: RenderHandle },
    /// Release a destroyed shader slot; the program is kept alive until aged out
    Destroy {
        handle: RenderHandle,
        program: Option<GpuProgram>,
    },
}

/// Cross-thread producer end of the pending queue
#[derive(Clone)]
pub struct ShaderRequestSender {
    tx: Sender<PendingOp>,
}

impl ShaderRequestSender {
    pub(crate) fn new(tx: Sender<PendingOp>) -> Self {
        Self { tx }
    }

    /// Queue a request; returns false once the shader manager is gone
    pub fn send(&self, request: ShaderRequest) -> bool {
        match self.tx.send(PendingOp::Request(request)) {
            Ok(()) => true,
            Err(_) => {
                engine_warn!(
                    "prism::ShaderManager",
                    "Shader request dropped, the shader manager no longer exists"
                );
                false
            }
        }
    }

    pub fn create_shader_module(&self, name: &str, desc: ShaderModuleDesc) -> bool {
        self.send(ShaderRequest::CreateShaderModule {
            name: name.to_string(),
            desc,
        })
    }

    /// Replace the byte-code of an existing module; dependent shaders are recompiled
    pub fn reload_shader_module(&self, name: &str, desc: ShaderModuleDesc) -> bool {
        self.create_shader_module(name, desc)
    }

    pub fn create_shader(&self, desc: ShaderDesc, vertex_module: &str, fragment_module: &str) -> bool {
        self.send(ShaderRequest::CreateShader {
            desc,
            vertex_module: vertex_module.to_string(),
            fragment_module: fragment_module.to_string(),
        })
    }

    pub fn create_compute_shader(&self, desc: ComputeShaderDesc, module: &str) -> bool {
        self.send(ShaderRequest::CreateComputeShader {
            desc,
            module: module.to_string(),
        })
    }

    pub fn destroy(&self, handle: RenderHandle) -> bool {
        self.send(ShaderRequest::Destroy { handle })
    }
}

// ============================================================================
// Deferred destruction
// ============================================================================

/// GPU object waiting for in-flight frames to retire
#[derive(Debug, Clone)]
pub enum DeferredObject {
    ShaderProgram(Arc<dyn GpuShaderProgram>),
    ComputeProgram(Arc<dyn GpuComputeProgram>),
    Pipeline(Arc<dyn GpuPipeline>),
}

impl From<GpuProgram> for DeferredObject {
    fn from(program: GpuProgram) -> Self {
        match program {
            GpuProgram::Graphics(program) => DeferredObject::ShaderProgram(program),
            GpuProgram::Compute(program) => DeferredObject::ComputeProgram(program),
        }
    }
}

/// Superseded GPU objects tagged with the frame they became obsolete in
#[derive(Default)]
pub struct DeferredDestructionQueue {
    entries: Vec<(u64, DeferredObject)>,
}

impl DeferredDestructionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `object` alive, obsolete since `frame`
    pub fn push(&mut self, frame: u64, object: DeferredObject) {
        self.entries.push((frame, object));
    }

    /// Release every object with `frame_count >= recorded + age_limit`
    ///
    /// Returns the number of objects released.
    pub fn purge(&mut self, frame_count: u64, age_limit: u64) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|(recorded, _)| frame_count < recorded.saturating_add(age_limit));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "pending_tests.rs"]
mod tests;
