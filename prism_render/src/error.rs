//! Error types for the Prism render core
//!
//! Errors only cross the backend `Device` boundary. The registries recover
//! locally: they log and hand back empty handles instead of propagating.

use std::fmt;

/// Result of a `Device` call
pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by a backend `Device`
///
/// `ShaderManager` and `PipelineStateCache` turn every variant into a logged
/// entry plus an empty program or pipeline slot; callers of the registries
/// never see one.
#[derive(Debug, Clone)]
pub enum Error {
    /// A backend call failed, e.g. `vkCreateGraphicsPipelines` returned an
    /// error code. Built by `engine_err!` so the message is also logged.
    BackendError(String),

    /// Host or device allocation failed while creating a module, program or
    /// pipeline
    OutOfMemory,

    /// The input cannot be used: malformed byte-code, a module spanning
    /// several stages, an entry point with a NUL byte, or an object created by
    /// another device. Usually built by `engine_warn_err!`.
    InvalidResource(String),

    /// Device setup was refused, e.g. a zero command buffering count
    InitializationFailed(String),

    /// Reflection or pipeline state the backend cannot express, such as an
    /// unknown SPIR-V descriptor type or a non-zero subpass index
    Unsupported(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::Unsupported(msg) => write!(f, "Unsupported: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
