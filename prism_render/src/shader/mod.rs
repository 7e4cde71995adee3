//! Shader registry
//!
//! Shader modules, graphics and compute shader entries with base/variant
//! resolution per render slot, the pending allocation queue drained once per
//! frame, and deferred destruction of replaced GPU programs.

pub mod client;
pub mod pending;
pub mod shader_manager;

pub use client::{ComputeShaderDesc, IdDesc, ShaderDesc};
pub use pending::{
    DeferredDestructionQueue, DeferredObject, GpuProgram, ShaderRequest, ShaderRequestSender,
};
pub use shader_manager::ShaderManager;
