/// Vertex input declaration: buffer bindings and per-location attributes

use crate::pipeline_state::Format;

/// Maximum number of vertex buffer bindings in a declaration
pub const MAX_VERTEX_INPUT_BINDING_COUNT: usize = 8;

/// Maximum number of vertex attributes in a declaration
pub const MAX_VERTEX_INPUT_ATTRIBUTE_COUNT: usize = 8;

/// Vertex input rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VertexInputRate {
    /// Advance per vertex
    #[default]
    Vertex,
    /// Advance per instance
    Instance,
}

/// Vertex buffer binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexInputBinding {
    /// Binding index
    pub binding: u32,
    /// Stride between consecutive elements in bytes
    pub stride: u32,
    /// Input rate
    pub input_rate: VertexInputRate,
}

/// Vertex attribute description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexInputAttribute {
    /// Shader location (layout(location = N))
    pub location: u32,
    /// Binding index this attribute reads from
    pub binding: u32,
    /// Attribute format
    pub format: Format,
    /// Offset in bytes within the vertex
    pub offset: u32,
}

/// Vertex bindings and attributes consumed by a shader
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct VertexInputDeclaration {
    pub bindings: Vec<VertexInputBinding>,
    pub attributes: Vec<VertexInputAttribute>,
}

impl VertexInputDeclaration {
    /// Binding with index `binding`
    pub fn binding(&self, binding: u32) -> Option<&VertexInputBinding> {
        self.bindings.iter().find(|b| b.binding == binding)
    }

    /// Attribute at shader location `location`
    pub fn attribute(&self, location: u32) -> Option<&VertexInputAttribute> {
        self.attributes.iter().find(|a| a.location == location)
    }

    /// True when the declaration has no attributes (e.g. fullscreen triangle shaders)
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty() && self.attributes.is_empty()
    }
}
