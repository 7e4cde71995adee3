/// Vulkan implementation of the `Device` trait
///
/// Wraps a logical device created by the application (instance, physical
/// device and queue selection stay outside this crate) and owns the
/// `vk::PipelineCache` every pipeline is compiled through.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use ash::vk;
use prism_render::device::{
    ComputePipelineDesc, Device, DeviceBackendType, DeviceProperties, GpuComputeProgram,
    GpuComputeProgramDesc, GpuPipeline, GpuShaderProgram, GpuShaderProgramDesc,
    GraphicsPipelineDesc, ShaderModule, ShaderModuleDesc,
};
use prism_render::pipeline::PIPELINE_CACHE_HEADER_SIZE;
use prism_render::{engine_debug, engine_err, engine_error, engine_info, engine_warn, Error, Result};

use crate::vulkan_pipeline::{create_compute_pipeline, create_graphics_pipeline};
use crate::vulkan_reflection::spirv_words;
use crate::vulkan_shader::{VulkanGpuComputeProgram, VulkanGpuShaderProgram, VulkanShaderModule};

const LOG_SOURCE: &str = "prism::vulkan";

/// Vulkan device configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VulkanDeviceConfig {
    /// Frames the application keeps in flight
    pub command_buffering_count: u32,
    /// Compile pipelines through a `vk::PipelineCache`
    pub enable_pipeline_cache: bool,
}

impl Default for VulkanDeviceConfig {
    fn default() -> Self {
        Self {
            command_buffering_count: 3,
            enable_pipeline_cache: true,
        }
    }
}

/// Vulkan device
pub struct VulkanDevice {
    device: ash::Device,
    properties: DeviceProperties,
    config: VulkanDeviceConfig,
    frame_count: AtomicU64,
    /// Replaced wholesale when stored cache data is imported
    pipeline_cache: Mutex<vk::PipelineCache>,
}

impl VulkanDevice {
    /// Wrap `device`, created from `physical_device` on `instance`
    ///
    /// The caller keeps ownership of the logical device and must destroy it
    /// after this object and every GPU object it created are dropped.
    pub fn new(
        instance: &ash::Instance,
        physical_device: vk::PhysicalDevice,
        device: ash::Device,
        config: VulkanDeviceConfig,
    ) -> Result<Self> {
        if config.command_buffering_count == 0 {
            return Err(Error::InitializationFailed(
                "command_buffering_count must be at least 1".to_string(),
            ));
        }

        let vk_properties = unsafe { instance.get_physical_device_properties(physical_device) };
        let device_name = vk_properties
            .device_name_as_c_str()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let properties = DeviceProperties {
            vendor_id: vk_properties.vendor_id,
            device_id: vk_properties.device_id,
            pipeline_cache_uuid: vk_properties.pipeline_cache_uuid,
            device_name,
        };

        let pipeline_cache = if config.enable_pipeline_cache {
            Self::create_pipeline_cache(&device, &[])?
        } else {
            vk::PipelineCache::null()
        };

        engine_info!(
            LOG_SOURCE,
            "Vulkan device '{}' ready ({} frames in flight, pipeline cache {})",
            properties.device_name,
            config.command_buffering_count,
            if config.enable_pipeline_cache { "on" } else { "off" }
        );

        Ok(Self {
            device,
            properties,
            config,
            frame_count: AtomicU64::new(0),
            pipeline_cache: Mutex::new(pipeline_cache),
        })
    }

    /// Underlying logical device
    pub fn ash_device(&self) -> &ash::Device {
        &self.device
    }

    /// Device configuration
    pub fn config(&self) -> &VulkanDeviceConfig {
        &self.config
    }

    /// Mark the end of a submitted frame; returns the new frame count
    pub fn advance_frame(&self) -> u64 {
        self.frame_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    fn create_pipeline_cache(device: &ash::Device, initial_data: &[u8]) -> Result<vk::PipelineCache> {
        let create_info = vk::PipelineCacheCreateInfo::default().initial_data(initial_data);
        unsafe {
            device
                .create_pipeline_cache(&create_info, None)
                .map_err(|e| creation_error("pipeline cache", e))
        }
    }

    fn current_pipeline_cache(&self) -> vk::PipelineCache {
        match self.pipeline_cache.lock() {
            Ok(cache) => *cache,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Log a failed object creation; allocation failures become `Error::OutOfMemory`
pub(crate) fn creation_error(what: &str, result: vk::Result) -> Error {
    match result {
        vk::Result::ERROR_OUT_OF_HOST_MEMORY | vk::Result::ERROR_OUT_OF_DEVICE_MEMORY => {
            engine_error!(LOG_SOURCE, "Out of memory creating {}: {:?}", what, result);
            Error::OutOfMemory
        }
        _ => engine_err!(LOG_SOURCE, "Failed to create {}: {:?}", what, result),
    }
}

impl Device for VulkanDevice {
    fn backend_type(&self) -> DeviceBackendType {
        DeviceBackendType::Vulkan
    }

    fn properties(&self) -> &DeviceProperties {
        &self.properties
    }

    fn create_shader_module(&self, desc: &ShaderModuleDesc) -> Result<Arc<dyn ShaderModule>> {
        if desc.stage.bits().count_ones() != 1 {
            return Err(Error::InvalidResource(format!(
                "shader module stage must be a single stage, got {:?}",
                desc.stage
            )));
        }
        let words = spirv_words(&desc.code)?;
        let module = VulkanShaderModule::new(
            self.device.clone(),
            &words,
            desc.stage,
            &desc.entry_point,
            desc.reflection.clone(),
        )?;
        Ok(Arc::new(module))
    }

    fn create_gpu_shader_program(&self, desc: &GpuShaderProgramDesc) -> Result<Arc<dyn GpuShaderProgram>> {
        let program = VulkanGpuShaderProgram::new(
            self.device.clone(),
            Arc::clone(&desc.vertex_module),
            Arc::clone(&desc.fragment_module),
            desc.pipeline_layout.clone(),
        )?;
        Ok(Arc::new(program))
    }

    fn create_gpu_compute_program(&self, desc: &GpuComputeProgramDesc) -> Result<Arc<dyn GpuComputeProgram>> {
        let program = VulkanGpuComputeProgram::new(
            self.device.clone(),
            Arc::clone(&desc.module),
            desc.pipeline_layout.clone(),
        )?;
        Ok(Arc::new(program))
    }

    fn create_graphics_pipeline(&self, desc: &GraphicsPipelineDesc) -> Result<Arc<dyn GpuPipeline>> {
        let pipeline = create_graphics_pipeline(&self.device, self.current_pipeline_cache(), desc)?;
        Ok(Arc::new(pipeline))
    }

    fn create_compute_pipeline(&self, desc: &ComputePipelineDesc) -> Result<Arc<dyn GpuPipeline>> {
        let pipeline = create_compute_pipeline(&self.device, self.current_pipeline_cache(), desc)?;
        Ok(Arc::new(pipeline))
    }

    fn frame_count(&self) -> u64 {
        self.frame_count.load(Ordering::Acquire)
    }

    fn command_buffering_count(&self) -> u32 {
        self.config.command_buffering_count
    }

    fn import_pipeline_cache(&self, data: &[u8]) -> bool {
        if !self.config.enable_pipeline_cache {
            return false;
        }

        let imported = match Self::create_pipeline_cache(&self.device, data) {
            Ok(cache) => cache,
            Err(_) => {
                engine_warn!(LOG_SOURCE, "Pipeline cache data rejected by the driver");
                return false;
            }
        };

        let mut cache = match self.pipeline_cache.lock() {
            Ok(cache) => cache,
            Err(poisoned) => poisoned.into_inner(),
        };
        let previous = std::mem::replace(&mut *cache, imported);
        unsafe {
            self.device.destroy_pipeline_cache(previous, None);
        }

        engine_debug!(
            LOG_SOURCE,
            "Imported {} bytes of pipeline cache data",
            data.len().saturating_sub(PIPELINE_CACHE_HEADER_SIZE)
        );
        true
    }

    fn pipeline_cache_data(&self) -> Vec<u8> {
        let cache = self.current_pipeline_cache();
        if cache == vk::PipelineCache::null() {
            return Vec::new();
        }
        unsafe {
            self.device
                .get_pipeline_cache_data(cache)
                .unwrap_or_else(|e| {
                    engine_warn!(LOG_SOURCE, "Failed to read pipeline cache data: {:?}", e);
                    Vec::new()
                })
        }
    }
}

impl Drop for VulkanDevice {
    fn drop(&mut self) {
        let cache = self.current_pipeline_cache();
        if cache != vk::PipelineCache::null() {
            unsafe {
                self.device.destroy_pipeline_cache(cache, None);
            }
        }
    }
}
