/// Vulkan shader modules and linked programs
///
/// A program owns the descriptor-set layouts and the `vk::PipelineLayout`
/// built from its `PipelineLayout`, and keeps its modules alive for pipeline
/// creation.

use std::any::Any;
use std::ffi::CString;
use std::fmt;
use std::sync::Arc;

use ash::vk;
use prism_render::device::{GpuComputeProgram, GpuShaderProgram, ShaderModule};
use prism_render::pipeline_state::{PipelineLayout, ShaderStageFlags};
use prism_render::reflection::{ShaderReflection, ShaderThreadGroupSize};
use prism_render::{engine_warn_err, Result};

use crate::vulkan_device::creation_error;
use crate::vulkan_format::{descriptor_type_to_vk, stage_flags_to_vk};

const LOG_SOURCE: &str = "prism::vulkan";

// ===== SHADER MODULE =====

/// Vulkan shader module
pub struct VulkanShaderModule {
    pub(crate) module: vk::ShaderModule,
    pub(crate) stage: ShaderStageFlags,
    pub(crate) entry_point: CString,
    reflection: ShaderReflection,
    device: ash::Device,
}

impl VulkanShaderModule {
    pub(crate) fn new(
        device: ash::Device,
        words: &[u32],
        stage: ShaderStageFlags,
        entry_point: &str,
        reflection: ShaderReflection,
    ) -> Result<Self> {
        let entry_point = CString::new(entry_point)
            .map_err(|_| engine_warn_err!(LOG_SOURCE, "Entry point '{}' contains a NUL byte", entry_point))?;

        let create_info = vk::ShaderModuleCreateInfo::default().code(words);
        let module = unsafe {
            device
                .create_shader_module(&create_info, None)
                .map_err(|e| creation_error("shader module", e))?
        };

        Ok(Self {
            module,
            stage,
            entry_point,
            reflection,
            device,
        })
    }

    pub(crate) fn stage_create_info(&self) -> vk::PipelineShaderStageCreateInfo<'_> {
        vk::PipelineShaderStageCreateInfo::default()
            .stage(stage_flags_to_vk(self.stage))
            .module(self.module)
            .name(&self.entry_point)
    }
}

impl ShaderModule for VulkanShaderModule {
    fn stage(&self) -> ShaderStageFlags {
        self.stage
    }

    fn reflection(&self) -> &ShaderReflection {
        &self.reflection
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for VulkanShaderModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VulkanShaderModule")
            .field("module", &self.module)
            .field("stage", &self.stage)
            .field("entry_point", &self.entry_point)
            .finish_non_exhaustive()
    }
}

impl Drop for VulkanShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.module, None);
        }
    }
}

/// Downcast a backend-agnostic module to the Vulkan one
pub(crate) fn as_vulkan_module(module: &Arc<dyn ShaderModule>) -> Result<&VulkanShaderModule> {
    module
        .as_any()
        .downcast_ref::<VulkanShaderModule>()
        .ok_or_else(|| engine_warn_err!(LOG_SOURCE, "Shader module {:?} was not created by this device", module))
}

// ===== PIPELINE LAYOUT OBJECTS =====

/// Descriptor-set layouts and the pipeline layout of a program
pub(crate) struct VulkanLayoutObjects {
    pub(crate) set_layouts: Vec<vk::DescriptorSetLayout>,
    pub(crate) pipeline_layout: vk::PipelineLayout,
    device: ash::Device,
}

impl VulkanLayoutObjects {
    /// Create the Vulkan objects for `layout`
    ///
    /// Vulkan set numbers are positional, so unused slots below the highest
    /// used set get an empty set layout.
    pub(crate) fn new(device: ash::Device, layout: &PipelineLayout) -> Result<Self> {
        let mut objects = Self {
            set_layouts: Vec::new(),
            pipeline_layout: vk::PipelineLayout::null(),
            device,
        };

        let set_count = 32 - layout.set_mask().leading_zeros();
        for set in 0..set_count {
            let bindings: Vec<vk::DescriptorSetLayoutBinding> = layout
                .set(set)
                .map(|set_layout| {
                    set_layout
                        .bindings
                        .iter()
                        .map(|binding| {
                            vk::DescriptorSetLayoutBinding::default()
                                .binding(binding.binding)
                                .descriptor_type(descriptor_type_to_vk(binding.descriptor_type))
                                .descriptor_count(binding.descriptor_count)
                                .stage_flags(stage_flags_to_vk(binding.shader_stage_flags))
                        })
                        .collect()
                })
                .unwrap_or_default();

            let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);
            let set_layout = unsafe {
                objects
                    .device
                    .create_descriptor_set_layout(&create_info, None)
                    .map_err(|e| creation_error("descriptor set layout", e))?
            };
            objects.set_layouts.push(set_layout);
        }

        let push_constant_ranges: Vec<vk::PushConstantRange> = if layout.push_constant.byte_size > 0 {
            vec![vk::PushConstantRange {
                stage_flags: stage_flags_to_vk(layout.push_constant.shader_stage_flags),
                offset: 0,
                size: layout.push_constant.byte_size,
            }]
        } else {
            Vec::new()
        };

        let create_info = vk::PipelineLayoutCreateInfo::default()
            .set_layouts(&objects.set_layouts)
            .push_constant_ranges(&push_constant_ranges);
        objects.pipeline_layout = unsafe {
            objects
                .device
                .create_pipeline_layout(&create_info, None)
                .map_err(|e| creation_error("pipeline layout", e))?
        };

        Ok(objects)
    }
}

impl Drop for VulkanLayoutObjects {
    fn drop(&mut self) {
        unsafe {
            if self.pipeline_layout != vk::PipelineLayout::null() {
                self.device.destroy_pipeline_layout(self.pipeline_layout, None);
            }
            for set_layout in self.set_layouts.drain(..) {
                self.device.destroy_descriptor_set_layout(set_layout, None);
            }
        }
    }
}

// ===== PROGRAMS =====

/// Linked vertex + fragment program
pub struct VulkanGpuShaderProgram {
    pub(crate) vertex_module: Arc<dyn ShaderModule>,
    pub(crate) fragment_module: Arc<dyn ShaderModule>,
    pub(crate) layout_objects: VulkanLayoutObjects,
    pipeline_layout: PipelineLayout,
}

impl VulkanGpuShaderProgram {
    pub(crate) fn new(
        device: ash::Device,
        vertex_module: Arc<dyn ShaderModule>,
        fragment_module: Arc<dyn ShaderModule>,
        pipeline_layout: PipelineLayout,
    ) -> Result<Self> {
        as_vulkan_module(&vertex_module)?;
        as_vulkan_module(&fragment_module)?;
        let layout_objects = VulkanLayoutObjects::new(device, &pipeline_layout)?;
        Ok(Self {
            vertex_module,
            fragment_module,
            layout_objects,
            pipeline_layout,
        })
    }

    /// Vulkan pipeline layout handle
    pub fn vk_pipeline_layout(&self) -> vk::PipelineLayout {
        self.layout_objects.pipeline_layout
    }
}

impl GpuShaderProgram for VulkanGpuShaderProgram {
    fn pipeline_layout(&self) -> &PipelineLayout {
        &self.pipeline_layout
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for VulkanGpuShaderProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VulkanGpuShaderProgram")
            .field("vertex_module", &self.vertex_module)
            .field("fragment_module", &self.fragment_module)
            .field("pipeline_layout", &self.layout_objects.pipeline_layout)
            .finish()
    }
}

/// Linked compute program
pub struct VulkanGpuComputeProgram {
    pub(crate) module: Arc<dyn ShaderModule>,
    pub(crate) layout_objects: VulkanLayoutObjects,
    pipeline_layout: PipelineLayout,
}

impl VulkanGpuComputeProgram {
    pub(crate) fn new(device: ash::Device, module: Arc<dyn ShaderModule>, pipeline_layout: PipelineLayout) -> Result<Self> {
        as_vulkan_module(&module)?;
        let layout_objects = VulkanLayoutObjects::new(device, &pipeline_layout)?;
        Ok(Self {
            module,
            layout_objects,
            pipeline_layout,
        })
    }

    /// Vulkan pipeline layout handle
    pub fn vk_pipeline_layout(&self) -> vk::PipelineLayout {
        self.layout_objects.pipeline_layout
    }
}

impl GpuComputeProgram for VulkanGpuComputeProgram {
    fn pipeline_layout(&self) -> &PipelineLayout {
        &self.pipeline_layout
    }

    fn thread_group_size(&self) -> ShaderThreadGroupSize {
        self.module.reflection().thread_group_size
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for VulkanGpuComputeProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VulkanGpuComputeProgram")
            .field("module", &self.module)
            .field("pipeline_layout", &self.layout_objects.pipeline_layout)
            .finish()
    }
}
