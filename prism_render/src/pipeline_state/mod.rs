//! Descriptor and fixed-function state data model shared by the caches,
//! the shader registry and every backend.

pub mod format;
pub mod graphics_state;
pub mod layout;
pub mod render_pass;
pub mod vertex_input;

pub use format::{Format, SampleCount};
pub use graphics_state::*;
pub use layout::*;
pub use render_pass::RenderPassCompatibilityDesc;
pub use vertex_input::*;
