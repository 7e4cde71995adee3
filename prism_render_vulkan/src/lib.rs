/*!
# Prism Render - Vulkan Backend

Vulkan implementation of the `prism_render` `Device` trait, using the Ash
bindings and spirq for SPIR-V reflection.

Instance, physical device and queue creation belong to the application:
`VulkanDevice` wraps an existing logical device.

```no_run
use std::sync::Arc;
use prism_render::{ShaderManager, ShaderManagerConfig};
use prism_render_vulkan::{VulkanDevice, VulkanDeviceConfig};

# fn run(instance: &ash::Instance, physical_device: ash::vk::PhysicalDevice, device: ash::Device) -> prism_render::Result<()> {
let device = Arc::new(VulkanDevice::new(instance, physical_device, device, VulkanDeviceConfig::default())?);
let shaders = ShaderManager::new(device, ShaderManagerConfig::default());
# Ok(())
# }
```
*/

mod vulkan_device;
mod vulkan_format;
mod vulkan_pipeline;
mod vulkan_reflection;
mod vulkan_shader;

pub use vulkan_device::{VulkanDevice, VulkanDeviceConfig};
pub use vulkan_pipeline::VulkanGpuPipeline;
pub use vulkan_reflection::{reflect_spirv, shader_module_desc, spirv_words};
pub use vulkan_shader::{VulkanGpuComputeProgram, VulkanGpuShaderProgram, VulkanShaderModule};
