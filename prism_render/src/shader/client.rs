/// Client-facing shader descriptors and identification

use crate::handle::RenderHandle;
use crate::resource::INVALID_RENDER_SLOT_ID;

/// Graphics shader creation descriptor
///
/// Module indices come from `ShaderManager::create_shader_module`. Optional
/// handles left at `None` are derived from the modules' reflection.
#[derive(Debug, Clone)]
pub struct ShaderDesc {
    /// Name used for lookups (`path#variant` for variants)
    pub path: String,
    /// Render slot the shader is used in
    pub render_slot_id: u32,
    pub vertex_module_index: u32,
    pub fragment_module_index: u32,
    /// Explicit pipeline layout (default: merged reflection of both modules)
    pub pipeline_layout: Option<RenderHandle>,
    /// Default graphics state of the shader
    pub graphics_state: Option<RenderHandle>,
    /// Explicit vertex input declaration (default: reflection of the vertex module)
    pub vertex_input_declaration: Option<RenderHandle>,
    /// Path of the shader this one is a variant of
    pub base_shader_path: Option<String>,
    /// Variant name (empty for base shaders)
    pub variant_name: String,
    /// Human-readable name for tools
    pub display_name: String,
}

impl ShaderDesc {
    /// Shader at `path` made of two modules, everything else derived
    pub fn new(path: &str, vertex_module_index: u32, fragment_module_index: u32) -> Self {
        Self {
            path: path.to_string(),
            render_slot_id: INVALID_RENDER_SLOT_ID,
            vertex_module_index,
            fragment_module_index,
            pipeline_layout: None,
            graphics_state: None,
            vertex_input_declaration: None,
            base_shader_path: None,
            variant_name: String::new(),
            display_name: String::new(),
        }
    }
}

/// Compute shader creation descriptor
#[derive(Debug, Clone)]
pub struct ComputeShaderDesc {
    pub path: String,
    pub render_slot_id: u32,
    pub module_index: u32,
    /// Explicit pipeline layout (default: reflection of the module)
    pub pipeline_layout: Option<RenderHandle>,
    pub base_shader_path: Option<String>,
    pub variant_name: String,
    pub display_name: String,
}

impl ComputeShaderDesc {
    pub fn new(path: &str, module_index: u32) -> Self {
        Self {
            path: path.to_string(),
            render_slot_id: INVALID_RENDER_SLOT_ID,
            module_index,
            pipeline_layout: None,
            base_shader_path: None,
            variant_name: String::new(),
            display_name: String::new(),
        }
    }
}

/// Identification of a registered shader
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IdDesc {
    pub path: String,
    pub variant: String,
    pub display_name: String,
    /// Frame count when the GPU program was last (re)compiled
    pub frame_index: u64,
}
