/// SPIR-V reflection through spirq
///
/// Produces the `ShaderReflection` a `ShaderModuleDesc` carries: descriptor
/// sets, push constant block, specialization constants, vertex inputs and the
/// compute local size.

use prism_render::device::ShaderModuleDesc;
use prism_render::pipeline_state::{
    DescriptorSetLayout, DescriptorSetLayoutBinding, DescriptorType, Format, PipelineLayout,
    PushConstant, ShaderStageFlags, VertexInputAttribute, VertexInputBinding,
    VertexInputDeclaration, VertexInputRate,
};
use prism_render::reflection::{
    ShaderReflection, ShaderSpecializationConstant, ShaderThreadGroupSize,
    SpecializationConstantType,
};
use prism_render::{engine_bail_warn, engine_err, Error, Result};
use spirq::ty::{ScalarType, Type};
use spirq::var::Variable;

const LOG_SOURCE: &str = "prism::vulkan";

/// Reinterpret SPIR-V bytes as words
pub fn spirv_words(code: &[u8]) -> Result<Vec<u32>> {
    if code.len() % 4 != 0 {
        engine_bail_warn!(LOG_SOURCE, "SPIR-V code not 4-byte aligned (size: {} bytes)", code.len());
    }
    Ok(code.chunks_exact(4).map(bytemuck::pod_read_unaligned::<u32>).collect())
}

/// Build a module descriptor by reflecting `code`
pub fn shader_module_desc(stage: ShaderStageFlags, entry_point: &str, code: Vec<u8>) -> Result<ShaderModuleDesc> {
    let reflection = reflect_spirv(&code, stage, entry_point)?;
    Ok(ShaderModuleDesc {
        stage,
        entry_point: entry_point.to_string(),
        code,
        reflection,
    })
}

/// Reflect the `entry_point` of a SPIR-V module compiled for `stage`
pub fn reflect_spirv(code: &[u8], stage: ShaderStageFlags, entry_point: &str) -> Result<ShaderReflection> {
    let words = spirv_words(code)?;
    let entry_points = spirq::ReflectConfig::new()
        .spv(words.as_slice())
        .ref_all_rscs(true)
        .reflect()
        .map_err(|e| engine_err!(LOG_SOURCE, "SPIR-V reflection failed: {:?}", e))?;

    let entry = match entry_points.iter().find(|ep| ep.name == entry_point) {
        Some(entry) => entry,
        None => engine_bail_warn!(LOG_SOURCE, "SPIR-V module has no entry point '{}'", entry_point),
    };

    let mut sets: Vec<DescriptorSetLayout> = Vec::new();
    let mut push_constant = PushConstant::default();
    let mut specialization_constants = Vec::new();
    let mut inputs: Vec<(u32, Format)> = Vec::new();

    for var in entry.vars.iter() {
        match var {
            Variable::Descriptor { desc_bind, desc_ty, nbind, .. } => {
                let binding = DescriptorSetLayoutBinding {
                    binding: desc_bind.bind(),
                    descriptor_type: descriptor_type_from_spirq(desc_ty)?,
                    descriptor_count: (*nbind).max(1),
                    shader_stage_flags: stage,
                };
                match sets.iter_mut().find(|set| set.set == desc_bind.set()) {
                    Some(set) => set.bindings.push(binding),
                    None => sets.push(DescriptorSetLayout::new(desc_bind.set(), vec![binding])),
                }
            }
            Variable::PushConstant { ty, .. } => {
                push_constant = PushConstant {
                    shader_stage_flags: stage,
                    byte_size: ty.nbyte().unwrap_or(0) as u32,
                };
            }
            Variable::SpecConstant { spec_id, ty, .. } => {
                specialization_constants.push(ShaderSpecializationConstant {
                    id: u32::from(*spec_id),
                    shader_stage: stage,
                    constant_type: specialization_type_from_spirq(ty),
                    offset: 0,
                });
            }
            Variable::Input { location, ty, .. } if stage == ShaderStageFlags::VERTEX => {
                inputs.push((location.loc(), attribute_format_from_spirq(ty)?));
            }
            _ => {}
        }
    }

    for set in sets.iter_mut() {
        set.bindings.sort_by_key(|b| b.binding);
    }
    specialization_constants.sort_by_key(|c| c.id);
    let mut offset = 0;
    for constant in specialization_constants.iter_mut() {
        constant.offset = offset;
        offset += constant.constant_type.byte_size();
    }

    Ok(ShaderReflection {
        pipeline_layout: PipelineLayout::from_sets(sets, push_constant),
        specialization_constants,
        vertex_input_declaration: vertex_input_from_locations(inputs),
        thread_group_size: local_size(&words),
        push_constant_byte_size: push_constant.byte_size,
    })
}

/// Interleaved single-binding declaration, attributes packed in location order
fn vertex_input_from_locations(mut inputs: Vec<(u32, Format)>) -> VertexInputDeclaration {
    if inputs.is_empty() {
        return VertexInputDeclaration::default();
    }
    inputs.sort_by_key(|(location, _)| *location);

    let mut attributes = Vec::with_capacity(inputs.len());
    let mut stride = 0;
    for (location, format) in inputs {
        attributes.push(VertexInputAttribute {
            location,
            binding: 0,
            format,
            offset: stride,
        });
        stride += format.byte_size();
    }

    VertexInputDeclaration {
        bindings: vec![VertexInputBinding {
            binding: 0,
            stride,
            input_rate: VertexInputRate::Vertex,
        }],
        attributes,
    }
}

const SPIRV_HEADER_WORD_COUNT: usize = 5;
const OP_EXECUTION_MODE: u32 = 16;
const EXECUTION_MODE_LOCAL_SIZE: u32 = 17;

/// Workgroup size declared by the first `OpExecutionMode LocalSize` instruction
fn local_size(words: &[u32]) -> ShaderThreadGroupSize {
    let mut index = SPIRV_HEADER_WORD_COUNT;
    while index < words.len() {
        let word_count = (words[index] >> 16) as usize;
        let opcode = words[index] & 0xFFFF;
        if word_count == 0 || index + word_count > words.len() {
            break;
        }
        // OpExecutionMode <entry point> LocalSize x y z
        if opcode == OP_EXECUTION_MODE && word_count == 6 && words[index + 2] == EXECUTION_MODE_LOCAL_SIZE {
            return ShaderThreadGroupSize {
                x: words[index + 3],
                y: words[index + 4],
                z: words[index + 5],
            };
        }
        index += word_count;
    }
    ShaderThreadGroupSize::default()
}

fn descriptor_type_from_spirq(desc_ty: &spirq::ty::DescriptorType) -> Result<DescriptorType> {
    use spirq::ty::DescriptorType as Spirq;
    match desc_ty {
        Spirq::Sampler(..) => Ok(DescriptorType::Sampler),
        Spirq::CombinedImageSampler(..) => Ok(DescriptorType::CombinedImageSampler),
        Spirq::SampledImage(..) => Ok(DescriptorType::SampledImage),
        Spirq::StorageImage(..) => Ok(DescriptorType::StorageImage),
        Spirq::UniformTexelBuffer(..) => Ok(DescriptorType::UniformTexelBuffer),
        Spirq::StorageTexelBuffer(..) => Ok(DescriptorType::StorageTexelBuffer),
        Spirq::UniformBuffer(..) => Ok(DescriptorType::UniformBuffer),
        Spirq::StorageBuffer(..) => Ok(DescriptorType::StorageBuffer),
        Spirq::InputAttachment(..) => Ok(DescriptorType::InputAttachment),
        other => Err(Error::Unsupported(format!("SPIR-V descriptor type {:?}", other))),
    }
}

fn specialization_type_from_spirq(ty: &Type) -> SpecializationConstantType {
    match ty {
        Type::Scalar(ScalarType::Boolean) => SpecializationConstantType::Bool,
        Type::Scalar(ScalarType::Integer { is_signed: true, .. }) => SpecializationConstantType::Int32,
        Type::Scalar(ScalarType::Float { .. }) => SpecializationConstantType::Float32,
        _ => SpecializationConstantType::UInt32,
    }
}

fn attribute_format_from_spirq(ty: &Type) -> Result<Format> {
    let (scalar, count) = match ty {
        Type::Scalar(scalar) => (scalar, 1),
        Type::Vector(vector) => (&vector.scalar_ty, vector.nscalar),
        other => {
            return Err(Error::Unsupported(format!("vertex input type {:?}", other)));
        }
    };
    let format = match (scalar, count) {
        (ScalarType::Float { bits: 32 }, 1) => Format::R32_SFLOAT,
        (ScalarType::Float { bits: 32 }, 2) => Format::R32G32_SFLOAT,
        (ScalarType::Float { bits: 32 }, 3) => Format::R32G32B32_SFLOAT,
        (ScalarType::Float { bits: 32 }, 4) => Format::R32G32B32A32_SFLOAT,
        (ScalarType::Integer { is_signed: false, .. }, 1) => Format::R32_UINT,
        (ScalarType::Integer { is_signed: false, .. }, 2) => Format::R32G32_UINT,
        (ScalarType::Integer { is_signed: false, .. }, 4) => Format::R32G32B32A32_UINT,
        (ScalarType::Integer { is_signed: true, .. }, 1) => Format::R32_SINT,
        _ => {
            return Err(Error::Unsupported(format!("vertex input type {:?}", ty)));
        }
    };
    Ok(format)
}

#[cfg(test)]
#[path = "vulkan_reflection_tests.rs"]
mod tests;
