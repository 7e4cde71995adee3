//! Resource caches
//!
//! Name-, hash- and handle-addressable registries for pipeline layouts,
//! graphics states, vertex input declarations and render slots.

pub mod graphics_state_cache;
pub mod pipeline_layout_cache;
pub mod render_slot;
pub mod vertex_input_registry;
pub(crate) mod variant_table;

pub use graphics_state_cache::{hash_graphics_state, GraphicsStateCache, GraphicsStateVariantDesc};
pub use pipeline_layout_cache::{layout_compatibility, CompatibilityFlags, PipelineLayoutCache};
pub use render_slot::{RenderSlotData, RenderSlotRegistry, INVALID_RENDER_SLOT_ID};
pub use variant_table::full_name;
pub use vertex_input_registry::VertexInputDeclarationRegistry;
