/// Compiled pipeline cache
///
/// Realizes graphics and compute pipeline objects for shaders registered in a
/// `ShaderManager`. Pipelines are keyed structurally and rebuilt when the
/// shader's program object was replaced. Pipelines of destroyed or replaced
/// shaders are evicted at the next `handle_pending_deletions` and aged out
/// the same way the shader registry ages out programs.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::config::ShaderManagerConfig;
use crate::device::{
    ComputePipelineDesc, Device, GpuComputeProgram, GpuPipeline, GpuShaderProgram,
    GraphicsPipelineDesc,
};
use crate::handle::RenderHandle;
use crate::pipeline::pipeline_cache_data::validate_pipeline_cache_data;
use crate::pipeline_state::{
    DynamicStateFlags, GraphicsState, RenderPassCompatibilityDesc, VertexInputDeclaration,
};
use crate::resource::hash_graphics_state;
use crate::shader::{DeferredDestructionQueue, DeferredObject, ShaderManager};
use crate::{engine_debug, engine_error, engine_warn};

const LOG_SOURCE: &str = "prism::PipelineStateCache";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GraphicsPipelineKey {
    shader: RenderHandle,
    graphics_state_hash: u64,
    vertex_input_declaration: VertexInputDeclaration,
    render_pass: RenderPassCompatibilityDesc,
    dynamic_state_flags: u32,
}

struct CachedGraphicsPipeline {
    state: GraphicsState,
    program: Arc<dyn GpuShaderProgram>,
    pipeline: Arc<dyn GpuPipeline>,
}

struct CachedComputePipeline {
    program: Arc<dyn GpuComputeProgram>,
    pipeline: Arc<dyn GpuPipeline>,
}

/// Cache of compiled pipeline state objects
pub struct PipelineStateCache {
    device: Arc<dyn Device>,
    config: ShaderManagerConfig,
    // States sharing a hash are told apart by comparing the stored state
    graphics: FxHashMap<GraphicsPipelineKey, Vec<CachedGraphicsPipeline>>,
    compute: FxHashMap<RenderHandle, CachedComputePipeline>,
    deferred: DeferredDestructionQueue,
}

impl PipelineStateCache {
    pub fn new(device: Arc<dyn Device>) -> Self {
        Self::with_config(device, ShaderManagerConfig::default())
    }

    /// Cache whose replaced pipelines age out with `config`'s headroom
    pub fn with_config(device: Arc<dyn Device>, config: ShaderManagerConfig) -> Self {
        Self {
            device,
            config,
            graphics: FxHashMap::default(),
            compute: FxHashMap::default(),
            deferred: DeferredDestructionQueue::new(),
        }
    }

    /// Graphics pipeline for `shader` drawn with `graphics_state` into `render_pass`
    ///
    /// An invalid `graphics_state` falls back to the shader's default graphics
    /// state, then to `GraphicsState::default()`. Returns None while the shader
    /// has no program (not drained yet, or a backend failure).
    pub fn graphics_pipeline(
        &mut self,
        shaders: &ShaderManager,
        shader: RenderHandle,
        graphics_state: RenderHandle,
        render_pass: &RenderPassCompatibilityDesc,
        dynamic_state_flags: DynamicStateFlags,
    ) -> Option<Arc<dyn GpuPipeline>> {
        let program = shaders.gpu_shader_program(shader)?;

        let state = if graphics_state.is_valid() {
            match shaders.graphics_state(graphics_state) {
                Some(state) => state.clone(),
                None => {
                    engine_warn!(
                        LOG_SOURCE,
                        "Graphics state {:?} not found, using the default state of shader {:?}",
                        graphics_state,
                        shader
                    );
                    Self::default_state(shaders, shader)
                }
            }
        } else {
            Self::default_state(shaders, shader)
        };
        let vertex_input_declaration = shaders
            .vertex_input_declaration(shaders.vertex_input_declaration_handle_by_shader_handle(shader).handle())
            .cloned()
            .unwrap_or_default();

        let key = GraphicsPipelineKey {
            shader,
            graphics_state_hash: hash_graphics_state(&state),
            vertex_input_declaration,
            render_pass: render_pass.clone(),
            dynamic_state_flags: dynamic_state_flags.bits(),
        };

        let bucket = self.graphics.entry(key.clone()).or_default();
        if let Some(position) = bucket.iter().position(|cached| cached.state == state) {
            if Arc::ptr_eq(&bucket[position].program, &program) {
                return Some(Arc::clone(&bucket[position].pipeline));
            }
            let stale = bucket.swap_remove(position);
            self.deferred
                .push(self.device.frame_count(), DeferredObject::Pipeline(stale.pipeline));
        }

        let desc = GraphicsPipelineDesc {
            program: Arc::clone(&program),
            graphics_state: &state,
            vertex_input_declaration: &key.vertex_input_declaration,
            render_pass,
            dynamic_state_flags,
        };
        let pipeline = match self.device.create_graphics_pipeline(&desc) {
            Ok(pipeline) => pipeline,
            Err(err) => {
                engine_error!(
                    LOG_SOURCE,
                    "Graphics pipeline creation for '{}' failed: {}",
                    shaders.id_desc(shader).path,
                    err
                );
                if self.graphics.get(&key).is_some_and(Vec::is_empty) {
                    self.graphics.remove(&key);
                }
                return None;
            }
        };

        self.graphics.entry(key).or_default().push(CachedGraphicsPipeline {
            state,
            program,
            pipeline: Arc::clone(&pipeline),
        });
        Some(pipeline)
    }

    /// Compute pipeline for `shader`
    pub fn compute_pipeline(&mut self, shaders: &ShaderManager, shader: RenderHandle) -> Option<Arc<dyn GpuPipeline>> {
        let program = shaders.gpu_compute_program(shader)?;

        if let Some(cached) = self.compute.get(&shader) {
            if Arc::ptr_eq(&cached.program, &program) {
                return Some(Arc::clone(&cached.pipeline));
            }
        }

        let frame = self.device.frame_count();
        if let Some(stale) = self.compute.remove(&shader) {
            self.deferred.push(frame, DeferredObject::Pipeline(stale.pipeline));
        }

        let pipeline = match self.device.create_compute_pipeline(&ComputePipelineDesc {
            program: Arc::clone(&program),
        }) {
            Ok(pipeline) => pipeline,
            Err(err) => {
                engine_error!(
                    LOG_SOURCE,
                    "Compute pipeline creation for '{}' failed: {}",
                    shaders.id_desc(shader).path,
                    err
                );
                return None;
            }
        };

        self.compute.insert(
            shader,
            CachedComputePipeline {
                program,
                pipeline: Arc::clone(&pipeline),
            },
        );
        Some(pipeline)
    }

    /// Evict pipelines whose shader was destroyed or got a new program, then
    /// release replaced pipelines that no in-flight frame can still use
    pub fn handle_pending_deletions(&mut self, shaders: &ShaderManager) {
        let frame = self.device.frame_count();
        let mut evicted = Vec::new();

        self.graphics.retain(|key, bucket| {
            let current = shaders.gpu_shader_program(key.shader);
            bucket.retain(|cached| {
                let live = current
                    .as_ref()
                    .is_some_and(|program| Arc::ptr_eq(program, &cached.program));
                if !live {
                    evicted.push(Arc::clone(&cached.pipeline));
                }
                live
            });
            !bucket.is_empty()
        });
        self.compute.retain(|&shader, cached| {
            let live = shaders
                .gpu_compute_program(shader)
                .is_some_and(|program| Arc::ptr_eq(&program, &cached.program));
            if !live {
                evicted.push(Arc::clone(&cached.pipeline));
            }
            live
        });

        if !evicted.is_empty() {
            engine_debug!(LOG_SOURCE, "Evicted {} pipelines of replaced or destroyed shaders", evicted.len());
        }
        for pipeline in evicted {
            self.deferred.push(frame, DeferredObject::Pipeline(pipeline));
        }

        let age_limit = self.config.age_limit(self.device.command_buffering_count());
        self.deferred.purge(frame, age_limit);
    }

    /// Number of cached pipelines
    pub fn pipeline_count(&self) -> usize {
        self.graphics.values().map(Vec::len).sum::<usize>() + self.compute.len()
    }

    /// Replaced pipelines waiting to age out
    pub fn pending_deletion_count(&self) -> usize {
        self.deferred.len()
    }

    /// Drop every cached pipeline; the objects age out like replaced ones
    pub fn clear(&mut self) {
        let frame = self.device.frame_count();
        for cached in self.graphics.drain().flat_map(|(_, bucket)| bucket) {
            self.deferred.push(frame, DeferredObject::Pipeline(cached.pipeline));
        }
        for (_, cached) in self.compute.drain() {
            self.deferred.push(frame, DeferredObject::Pipeline(cached.pipeline));
        }
    }

    /// Seed the backend pipeline cache with stored data
    ///
    /// Data recorded on another device, driver or header version is
    /// discarded. Returns whether the backend took the data.
    pub fn load_pipeline_cache(&self, data: &[u8]) -> bool {
        if !validate_pipeline_cache_data(data, self.device.properties()) {
            engine_debug!(
                LOG_SOURCE,
                "Pipeline cache data ({} bytes) does not match this device, discarded",
                data.len()
            );
            return false;
        }
        self.device.import_pipeline_cache(data)
    }

    /// Current backend pipeline cache contents
    pub fn store_pipeline_cache(&self) -> Vec<u8> {
        self.device.pipeline_cache_data()
    }

    fn default_state(shaders: &ShaderManager, shader: RenderHandle) -> GraphicsState {
        shaders
            .graphics_state(shaders.graphics_state_handle_by_shader_handle(shader).handle())
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "pipeline_state_cache_tests.rs"]
mod tests;
