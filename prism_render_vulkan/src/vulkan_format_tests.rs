//! Unit tests for the Vulkan conversion functions
//!
//! Pure mappings, no GPU required.

use super::*;

// ============================================================================
// Tests: Formats
// ============================================================================

#[test]
fn test_attachment_formats() {
    assert_eq!(format_to_vk(Format::Undefined), vk::Format::UNDEFINED);
    assert_eq!(format_to_vk(Format::B8G8R8A8_SRGB), vk::Format::B8G8R8A8_SRGB);
    assert_eq!(format_to_vk(Format::R16G16B16A16_SFLOAT), vk::Format::R16G16B16A16_SFLOAT);
    assert_eq!(format_to_vk(Format::D32_SFLOAT), vk::Format::D32_SFLOAT);
    assert_eq!(format_to_vk(Format::D24_UNORM_S8_UINT), vk::Format::D24_UNORM_S8_UINT);
}

#[test]
fn test_vertex_attribute_formats() {
    assert_eq!(format_to_vk(Format::R32G32B32_SFLOAT), vk::Format::R32G32B32_SFLOAT);
    assert_eq!(format_to_vk(Format::R32G32_UINT), vk::Format::R32G32_UINT);
    assert_eq!(format_to_vk(Format::R32_SINT), vk::Format::R32_SINT);
    assert_eq!(format_to_vk(Format::R8G8B8A8_SNORM), vk::Format::R8G8B8A8_SNORM);
}

#[test]
fn test_sample_counts() {
    assert_eq!(sample_count_to_vk(SampleCount::S1), vk::SampleCountFlags::TYPE_1);
    assert_eq!(sample_count_to_vk(SampleCount::S8), vk::SampleCountFlags::TYPE_8);
}

// ============================================================================
// Tests: Layouts
// ============================================================================

#[test]
fn test_stage_flags() {
    assert_eq!(stage_flags_to_vk(ShaderStageFlags::empty()), vk::ShaderStageFlags::empty());
    assert_eq!(
        stage_flags_to_vk(ShaderStageFlags::ALL_GRAPHICS),
        vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT
    );
    assert_eq!(stage_flags_to_vk(ShaderStageFlags::COMPUTE), vk::ShaderStageFlags::COMPUTE);
}

#[test]
fn test_descriptor_types() {
    assert_eq!(
        descriptor_type_to_vk(DescriptorType::CombinedImageSampler),
        vk::DescriptorType::COMBINED_IMAGE_SAMPLER
    );
    assert_eq!(
        descriptor_type_to_vk(DescriptorType::UniformBufferDynamic),
        vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC
    );
    assert_eq!(
        descriptor_type_to_vk(DescriptorType::StorageBuffer),
        vk::DescriptorType::STORAGE_BUFFER
    );
}

// ============================================================================
// Tests: Fixed-function state
// ============================================================================

#[test]
fn test_rasterization_enums() {
    assert_eq!(cull_mode_to_vk(CullMode::FrontAndBack), vk::CullModeFlags::FRONT_AND_BACK);
    assert_eq!(front_face_to_vk(FrontFace::Clockwise), vk::FrontFace::CLOCKWISE);
    assert_eq!(polygon_mode_to_vk(PolygonMode::Line), vk::PolygonMode::LINE);
    assert_eq!(topology_to_vk(PrimitiveTopology::PatchList), vk::PrimitiveTopology::PATCH_LIST);
}

#[test]
fn test_stencil_op_state() {
    let state = StencilOpState {
        fail_op: StencilOp::Zero,
        pass_op: StencilOp::Replace,
        depth_fail_op: StencilOp::IncrementAndWrap,
        compare_op: CompareOp::Equal,
        compare_mask: 0x0F,
        write_mask: 0xF0,
        reference: 3,
    };

    let vk_state = stencil_op_state_to_vk(&state);

    assert_eq!(vk_state.fail_op, vk::StencilOp::ZERO);
    assert_eq!(vk_state.pass_op, vk::StencilOp::REPLACE);
    assert_eq!(vk_state.depth_fail_op, vk::StencilOp::INCREMENT_AND_WRAP);
    assert_eq!(vk_state.compare_op, vk::CompareOp::EQUAL);
    assert_eq!(vk_state.compare_mask, 0x0F);
    assert_eq!(vk_state.write_mask, 0xF0);
    assert_eq!(vk_state.reference, 3);
}

#[test]
fn test_blend_enums() {
    assert_eq!(blend_factor_to_vk(BlendFactor::OneMinusSrcAlpha), vk::BlendFactor::ONE_MINUS_SRC_ALPHA);
    assert_eq!(blend_factor_to_vk(BlendFactor::ConstantAlpha), vk::BlendFactor::CONSTANT_ALPHA);
    assert_eq!(blend_op_to_vk(BlendOp::ReverseSubtract), vk::BlendOp::REVERSE_SUBTRACT);
    assert_eq!(logic_op_to_vk(LogicOp::Xor), vk::LogicOp::XOR);
}

#[test]
fn test_color_write_mask() {
    assert_eq!(
        color_write_mask_to_vk(ColorComponentFlags::all()),
        vk::ColorComponentFlags::R
            | vk::ColorComponentFlags::G
            | vk::ColorComponentFlags::B
            | vk::ColorComponentFlags::A
    );
    assert_eq!(
        color_write_mask_to_vk(ColorComponentFlags::R | ColorComponentFlags::A),
        vk::ColorComponentFlags::R | vk::ColorComponentFlags::A
    );
    assert_eq!(color_write_mask_to_vk(ColorComponentFlags::empty()), vk::ColorComponentFlags::empty());
}

#[test]
fn test_viewport_and_scissor_always_dynamic() {
    let states = dynamic_states_to_vk(DynamicStateFlags::empty());
    assert_eq!(states, vec![vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR]);

    let states = dynamic_states_to_vk(DynamicStateFlags::DEPTH_BIAS | DynamicStateFlags::STENCIL_REFERENCE);
    assert_eq!(
        states,
        vec![
            vk::DynamicState::VIEWPORT,
            vk::DynamicState::SCISSOR,
            vk::DynamicState::DEPTH_BIAS,
            vk::DynamicState::STENCIL_REFERENCE,
        ]
    );
}
