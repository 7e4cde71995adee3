/// Shader reflection data and the helpers that combine per-stage reflection
/// into a single program-level description.

use crate::engine_warn;
use crate::pipeline_state::{
    PipelineLayout, ShaderStageFlags, VertexInputDeclaration, MAX_DESCRIPTOR_SET_COUNT,
};

/// Scalar type of a specialization constant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecializationConstantType {
    Bool,
    UInt32,
    Int32,
    Float32,
}

impl SpecializationConstantType {
    /// Size in bytes inside the specialization data blob
    pub fn byte_size(self) -> u32 {
        4
    }
}

/// A specialization constant declared by a shader stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderSpecializationConstant {
    /// constant_id in the shader
    pub id: u32,
    /// Stages declaring the constant
    pub shader_stage: ShaderStageFlags,
    /// Scalar type
    pub constant_type: SpecializationConstantType,
    /// Byte offset inside the specialization data blob
    pub offset: u32,
}

/// Compute local workgroup size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderThreadGroupSize {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl Default for ShaderThreadGroupSize {
    fn default() -> Self {
        Self { x: 1, y: 1, z: 1 }
    }
}

/// Everything extracted from a shader module's byte-code
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShaderReflection {
    /// Descriptor sets and push constant range used by the module
    pub pipeline_layout: PipelineLayout,
    /// Declared specialization constants
    pub specialization_constants: Vec<ShaderSpecializationConstant>,
    /// Vertex inputs (vertex stage only)
    pub vertex_input_declaration: VertexInputDeclaration,
    /// Local workgroup size (compute stage only)
    pub thread_group_size: ShaderThreadGroupSize,
    /// Push constant block size in bytes
    pub push_constant_byte_size: u32,
}

/// Merge two reflected pipeline layouts (typically vertex + fragment)
///
/// Sets are matched by their `set` number, wherever they sit in the input
/// arrays, and land in the slot of that number. Bindings present in both
/// layouts get their stage flags combined. A binding whose descriptor type or
/// count differs between the two keeps the `lhs` description and marks the
/// result incompatible; the merge still completes. Sets numbered past
/// `MAX_DESCRIPTOR_SET_COUNT` are dropped with a warning.
/// Returns the merged layout and whether the inputs were compatible.
pub fn merge_pipeline_layouts(lhs: &PipelineLayout, rhs: &PipelineLayout) -> (PipelineLayout, bool) {
    let mut merged = PipelineLayout {
        push_constant: lhs.push_constant,
        ..Default::default()
    };
    let mut compatible = true;

    let sets = lhs
        .descriptor_set_layouts
        .iter()
        .chain(rhs.descriptor_set_layouts.iter())
        .filter(|set| set.is_used());
    for src in sets {
        let Some(dst) = merged.descriptor_set_layouts.get_mut(src.set as usize) else {
            engine_warn!(
                "prism::PipelineLayout",
                "Merged descriptor set {} is out of range (max {}), dropped",
                src.set,
                MAX_DESCRIPTOR_SET_COUNT - 1
            );
            continue;
        };
        if !dst.is_used() {
            *dst = src.clone();
            dst.sort_bindings();
            continue;
        }

        for binding in &src.bindings {
            match dst.bindings.iter_mut().find(|b| b.binding == binding.binding) {
                Some(existing) => {
                    if existing.descriptor_type != binding.descriptor_type
                        || existing.descriptor_count != binding.descriptor_count
                    {
                        compatible = false;
                    }
                    existing.shader_stage_flags |= binding.shader_stage_flags;
                }
                None => dst.bindings.push(*binding),
            }
        }
        dst.sort_bindings();
    }

    if rhs.push_constant.byte_size > 0 {
        merged.push_constant.byte_size = merged.push_constant.byte_size.max(rhs.push_constant.byte_size);
        merged.push_constant.shader_stage_flags |= rhs.push_constant.shader_stage_flags;
    }

    merged.descriptor_set_count = merged.set_mask().count_ones();
    (merged, compatible)
}

/// Merge the specialization constants of two stages, combining stage flags of shared ids
pub fn merge_specialization_constants(
    lhs: &[ShaderSpecializationConstant],
    rhs: &[ShaderSpecializationConstant],
) -> Vec<ShaderSpecializationConstant> {
    let mut merged: Vec<ShaderSpecializationConstant> = lhs.to_vec();
    for constant in rhs {
        if let Some(existing) = merged.iter_mut().find(|c| c.id == constant.id) {
            existing.shader_stage |= constant.shader_stage;
        } else {
            merged.push(*constant);
        }
    }
    merged.sort_by_key(|c| c.id);
    merged
}

#[cfg(test)]
#[path = "reflection_tests.rs"]
mod tests;
