/// Vulkan graphics and compute pipeline objects

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use ash::vk;
use prism_render::device::{
    ComputePipelineDesc, GpuComputeProgram, GpuPipeline, GpuShaderProgram, GraphicsPipelineDesc,
    PipelineBindPoint,
};
use prism_render::pipeline_state::{ColorBlendAttachmentState, RenderPassCompatibilityDesc};
use prism_render::{engine_err, engine_warn_err, Error, Result};

use crate::vulkan_device::creation_error;
use crate::vulkan_format::*;
use crate::vulkan_shader::{as_vulkan_module, VulkanGpuComputeProgram, VulkanGpuShaderProgram};

const LOG_SOURCE: &str = "prism::vulkan";

/// Compiled Vulkan pipeline
///
/// Holds its program so the pipeline layout outlives the pipeline.
pub struct VulkanGpuPipeline {
    pub(crate) pipeline: vk::Pipeline,
    bind_point: PipelineBindPoint,
    _graphics_program: Option<Arc<dyn GpuShaderProgram>>,
    _compute_program: Option<Arc<dyn GpuComputeProgram>>,
    device: ash::Device,
}

impl VulkanGpuPipeline {
    /// Vulkan pipeline handle
    pub fn vk_pipeline(&self) -> vk::Pipeline {
        self.pipeline
    }
}

impl GpuPipeline for VulkanGpuPipeline {
    fn bind_point(&self) -> PipelineBindPoint {
        self.bind_point
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for VulkanGpuPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VulkanGpuPipeline")
            .field("pipeline", &self.pipeline)
            .field("bind_point", &self.bind_point)
            .finish_non_exhaustive()
    }
}

impl Drop for VulkanGpuPipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline(self.pipeline, None);
        }
    }
}

// ===== RENDER PASS =====

/// Render pass owned for the duration of one pipeline creation
struct CompatibleRenderPass {
    render_pass: vk::RenderPass,
    device: ash::Device,
}

impl CompatibleRenderPass {
    /// Minimal render pass compatible with `desc` (formats, samples, one subpass)
    fn new(device: &ash::Device, desc: &RenderPassCompatibilityDesc) -> Result<Self> {
        if desc.subpass_index != 0 {
            return Err(Error::Unsupported(format!(
                "pipeline for subpass {} of a compatibility render pass",
                desc.subpass_index
            )));
        }
        let samples = sample_count_to_vk(desc.sample_count);

        let mut attachments: Vec<vk::AttachmentDescription> = desc
            .color_attachment_formats
            .iter()
            .map(|format| {
                vk::AttachmentDescription::default()
                    .format(format_to_vk(*format))
                    .samples(samples)
                    .load_op(vk::AttachmentLoadOp::DONT_CARE)
                    .store_op(vk::AttachmentStoreOp::STORE)
                    .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                    .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                    .initial_layout(vk::ImageLayout::UNDEFINED)
                    .final_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
            })
            .collect();
        let color_refs: Vec<vk::AttachmentReference> = (0..attachments.len() as u32)
            .map(|attachment| {
                vk::AttachmentReference::default()
                    .attachment(attachment)
                    .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
            })
            .collect();

        let depth_ref = vk::AttachmentReference::default()
            .attachment(attachments.len() as u32)
            .layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);
        if desc.has_depth_stencil() {
            attachments.push(
                vk::AttachmentDescription::default()
                    .format(format_to_vk(desc.depth_stencil_format))
                    .samples(samples)
                    .load_op(vk::AttachmentLoadOp::DONT_CARE)
                    .store_op(vk::AttachmentStoreOp::DONT_CARE)
                    .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                    .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                    .initial_layout(vk::ImageLayout::UNDEFINED)
                    .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL),
            );
        }

        let mut subpass = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_refs);
        if desc.has_depth_stencil() {
            subpass = subpass.depth_stencil_attachment(&depth_ref);
        }

        let create_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(std::slice::from_ref(&subpass));

        let render_pass = unsafe {
            device
                .create_render_pass(&create_info, None)
                .map_err(|e| creation_error("compatibility render pass", e))?
        };
        Ok(Self {
            render_pass,
            device: device.clone(),
        })
    }
}

impl Drop for CompatibleRenderPass {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_render_pass(self.render_pass, None);
        }
    }
}

// ===== CREATION =====

pub(crate) fn create_graphics_pipeline(
    device: &ash::Device,
    cache: vk::PipelineCache,
    desc: &GraphicsPipelineDesc,
) -> Result<VulkanGpuPipeline> {
    let program = desc
        .program
        .as_any()
        .downcast_ref::<VulkanGpuShaderProgram>()
        .ok_or_else(|| engine_warn_err!(LOG_SOURCE, "Program {:?} was not created by this device", desc.program))?;
    let vertex_module = as_vulkan_module(&program.vertex_module)?;
    let fragment_module = as_vulkan_module(&program.fragment_module)?;
    let render_pass = CompatibleRenderPass::new(device, desc.render_pass)?;

    let state = desc.graphics_state;
    let stages = [vertex_module.stage_create_info(), fragment_module.stage_create_info()];

    // Vertex input
    let vertex_bindings: Vec<vk::VertexInputBindingDescription> = desc
        .vertex_input_declaration
        .bindings
        .iter()
        .map(|binding| vk::VertexInputBindingDescription {
            binding: binding.binding,
            stride: binding.stride,
            input_rate: vertex_input_rate_to_vk(binding.input_rate),
        })
        .collect();
    let vertex_attributes: Vec<vk::VertexInputAttributeDescription> = desc
        .vertex_input_declaration
        .attributes
        .iter()
        .map(|attribute| vk::VertexInputAttributeDescription {
            location: attribute.location,
            binding: attribute.binding,
            format: format_to_vk(attribute.format),
            offset: attribute.offset,
        })
        .collect();
    let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
        .vertex_binding_descriptions(&vertex_bindings)
        .vertex_attribute_descriptions(&vertex_attributes);

    let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
        .topology(topology_to_vk(state.input_assembly.primitive_topology))
        .primitive_restart_enable(state.input_assembly.enable_primitive_restart);

    // Viewport and scissor are dynamic, only their counts matter
    let viewport_state = vk::PipelineViewportStateCreateInfo::default()
        .viewport_count(1)
        .scissor_count(1);

    let raster = &state.rasterization_state;
    let mut rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
        .depth_clamp_enable(raster.enable_depth_clamp)
        .rasterizer_discard_enable(raster.enable_rasterizer_discard)
        .polygon_mode(polygon_mode_to_vk(raster.polygon_mode))
        .cull_mode(cull_mode_to_vk(raster.cull_mode))
        .front_face(front_face_to_vk(raster.front_face))
        .line_width(raster.line_width);
    if let Some(bias) = raster.depth_bias {
        rasterization_state = rasterization_state
            .depth_bias_enable(true)
            .depth_bias_constant_factor(bias.constant_factor)
            .depth_bias_slope_factor(bias.slope_factor)
            .depth_bias_clamp(bias.clamp);
    }

    let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
        .rasterization_samples(sample_count_to_vk(desc.render_pass.sample_count));

    let depth = &state.depth_stencil_state;
    let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo::default()
        .depth_test_enable(depth.enable_depth_test)
        .depth_write_enable(depth.enable_depth_write)
        .depth_compare_op(compare_op_to_vk(depth.depth_compare_op))
        .depth_bounds_test_enable(depth.enable_depth_bounds_test)
        .stencil_test_enable(depth.enable_stencil_test)
        .front(stencil_op_state_to_vk(&depth.front_stencil_op_state))
        .back(stencil_op_state_to_vk(&depth.back_stencil_op_state))
        .min_depth_bounds(depth.min_depth_bounds)
        .max_depth_bounds(depth.max_depth_bounds);

    // One blend attachment per color attachment of the render pass
    let blend = &state.color_blend_state;
    let color_attachment_count = desc.render_pass.color_attachment_formats.len();
    let blend_attachments: Vec<vk::PipelineColorBlendAttachmentState> = (0..color_attachment_count)
        .map(|index| {
            let attachment: ColorBlendAttachmentState =
                blend.color_attachments.get(index).copied().unwrap_or_default();
            vk::PipelineColorBlendAttachmentState::default()
                .blend_enable(attachment.enable_blend)
                .color_write_mask(color_write_mask_to_vk(attachment.color_write_mask))
                .src_color_blend_factor(blend_factor_to_vk(attachment.src_color_blend_factor))
                .dst_color_blend_factor(blend_factor_to_vk(attachment.dst_color_blend_factor))
                .color_blend_op(blend_op_to_vk(attachment.color_blend_op))
                .src_alpha_blend_factor(blend_factor_to_vk(attachment.src_alpha_blend_factor))
                .dst_alpha_blend_factor(blend_factor_to_vk(attachment.dst_alpha_blend_factor))
                .alpha_blend_op(blend_op_to_vk(attachment.alpha_blend_op))
        })
        .collect();
    let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
        .logic_op_enable(blend.enable_logic_op)
        .logic_op(logic_op_to_vk(blend.logic_op))
        .attachments(&blend_attachments)
        .blend_constants(blend.blend_constants);

    let dynamic_states = dynamic_states_to_vk(state.dynamic_state_flags | desc.dynamic_state_flags);
    let dynamic_state = vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

    let create_info = vk::GraphicsPipelineCreateInfo::default()
        .stages(&stages)
        .vertex_input_state(&vertex_input_state)
        .input_assembly_state(&input_assembly_state)
        .viewport_state(&viewport_state)
        .rasterization_state(&rasterization_state)
        .multisample_state(&multisample_state)
        .depth_stencil_state(&depth_stencil_state)
        .color_blend_state(&color_blend_state)
        .dynamic_state(&dynamic_state)
        .layout(program.vk_pipeline_layout())
        .render_pass(render_pass.render_pass)
        .subpass(0);

    let pipelines = unsafe {
        device
            .create_graphics_pipelines(cache, std::slice::from_ref(&create_info), None)
            .map_err(|(_, e)| creation_error("graphics pipeline", e))?
    };
    let pipeline = pipelines
        .into_iter()
        .next()
        .ok_or_else(|| engine_err!(LOG_SOURCE, "Graphics pipeline creation returned no pipeline"))?;

    Ok(VulkanGpuPipeline {
        pipeline,
        bind_point: PipelineBindPoint::Graphics,
        _graphics_program: Some(Arc::clone(&desc.program)),
        _compute_program: None,
        device: device.clone(),
    })
}

pub(crate) fn create_compute_pipeline(
    device: &ash::Device,
    cache: vk::PipelineCache,
    desc: &ComputePipelineDesc,
) -> Result<VulkanGpuPipeline> {
    let program = desc
        .program
        .as_any()
        .downcast_ref::<VulkanGpuComputeProgram>()
        .ok_or_else(|| engine_warn_err!(LOG_SOURCE, "Program {:?} was not created by this device", desc.program))?;
    let module = as_vulkan_module(&program.module)?;

    let create_info = vk::ComputePipelineCreateInfo::default()
        .stage(module.stage_create_info())
        .layout(program.vk_pipeline_layout());

    let pipelines = unsafe {
        device
            .create_compute_pipelines(cache, std::slice::from_ref(&create_info), None)
            .map_err(|(_, e)| creation_error("compute pipeline", e))?
    };
    let pipeline = pipelines
        .into_iter()
        .next()
        .ok_or_else(|| engine_err!(LOG_SOURCE, "Compute pipeline creation returned no pipeline"))?;

    Ok(VulkanGpuPipeline {
        pipeline,
        bind_point: PipelineBindPoint::Compute,
        _graphics_program: None,
        _compute_program: Some(Arc::clone(&desc.program)),
        device: device.clone(),
    })
}
