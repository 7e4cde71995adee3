/// Shader registry
///
/// Owns the shader modules, the graphics and compute shader client entries
/// and the resource caches they reference. Every call that changes state takes
/// `&mut self` and runs on the thread that owns the backend device; GPU objects
/// are only created inside `handle_pending_allocations`. Other threads submit
/// work through a `ShaderRequestSender`.

use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::ShaderManagerConfig;
use crate::device::{
    Device, GpuComputeProgram, GpuComputeProgramDesc, GpuShaderProgram, GpuShaderProgramDesc,
    ShaderModule, ShaderModuleDesc,
};
use crate::handle::{RenderHandle, RenderHandleReference, RenderHandleType};
use crate::pipeline_state::{GraphicsState, PipelineLayout, VertexInputDeclaration};
use crate::reflection::{
    merge_pipeline_layouts, merge_specialization_constants, ShaderReflection,
    ShaderSpecializationConstant, ShaderThreadGroupSize,
};
use crate::resource::variant_table::VariantTable;
use crate::resource::{
    full_name, hash_graphics_state, CompatibilityFlags, GraphicsStateCache,
    GraphicsStateVariantDesc, PipelineLayoutCache, RenderSlotData, RenderSlotRegistry,
    VertexInputDeclarationRegistry, INVALID_RENDER_SLOT_ID,
};
use crate::shader::client::{ComputeShaderDesc, IdDesc, ShaderDesc};
use crate::shader::pending::{
    DeferredDestructionQueue, GpuProgram, PendingOp, ShaderRequest, ShaderRequestSender,
};
use crate::utils::SlotAllocator;
use crate::{engine_debug, engine_error, engine_warn};

const LOG_SOURCE: &str = "prism::ShaderManager";

// ============================================================================
// Entries
// ============================================================================

struct ShaderModuleEntry {
    desc: ShaderModuleDesc,
    module: Option<Arc<dyn ShaderModule>>,
}

struct ClientEntry {
    reference: RenderHandleReference,
    full_name: String,
    id: IdDesc,
    base: Option<RenderHandle>,
    render_slot_id: u32,
    /// Vertex + fragment for graphics shaders, a single module for compute
    modules: Vec<u32>,
    pipeline_layout: RenderHandle,
    reflection_pipeline_layout: RenderHandle,
    /// Whether `pipeline_layout` follows the reflection
    derived_pipeline_layout: bool,
    vertex_input_declaration: RenderHandle,
    derived_vertex_input_declaration: bool,
    graphics_state: RenderHandle,
    reflection: ShaderReflection,
    program: Option<GpuProgram>,
    /// Bumped every time `program` changes
    program_generation: u64,
}

struct ClientTable {
    kind: RenderHandleType,
    slots: SlotAllocator,
    entries: Vec<Option<ClientEntry>>,
    variants: VariantTable,
}

impl ClientTable {
    fn new(kind: RenderHandleType) -> Self {
        Self {
            kind,
            slots: SlotAllocator::new(),
            entries: Vec::new(),
            variants: VariantTable::new(),
        }
    }

    fn get(&self, handle: RenderHandle) -> Option<&ClientEntry> {
        let slot = handle.slot(self.kind)?;
        self.entries.get(slot)?.as_ref()
    }

    fn get_mut(&mut self, handle: RenderHandle) -> Option<&mut ClientEntry> {
        let slot = handle.slot(self.kind)?;
        self.entries.get_mut(slot)?.as_mut()
    }

    fn get_by_index(&self, index: u32) -> Option<&ClientEntry> {
        self.entries.get(index as usize)?.as_ref()
    }

    fn insert(&mut self, build: impl FnOnce(RenderHandleReference) -> ClientEntry) -> RenderHandle {
        let index = self.slots.alloc();
        let handle = RenderHandle::new(self.kind, index);
        let slot = index as usize;
        if slot >= self.entries.len() {
            self.entries.resize_with(slot + 1, || None);
        }
        self.entries[slot] = Some(build(RenderHandleReference::new(handle)));
        handle
    }

    fn live(&self) -> impl Iterator<Item = &ClientEntry> {
        self.entries.iter().flatten()
    }
}

/// Client-side fields shared by graphics and compute shader creation
struct ClientParams<'a> {
    path: &'a str,
    variant_name: &'a str,
    display_name: &'a str,
    render_slot_id: u32,
    base_shader_path: Option<&'a str>,
    modules: Vec<u32>,
    pipeline_layout: Option<RenderHandle>,
    vertex_input_declaration: Option<RenderHandle>,
    graphics_state: Option<RenderHandle>,
}

// ============================================================================
// ShaderManager
// ============================================================================

/// Registry of shaders, compute shaders and the caches they reference
pub struct ShaderManager {
    device: Arc<dyn Device>,
    config: ShaderManagerConfig,

    modules: Vec<ShaderModuleEntry>,
    module_name_to_index: FxHashMap<String, u32>,

    shaders: ClientTable,
    compute_shaders: ClientTable,
    name_to_handle: FxHashMap<String, RenderHandle>,

    pipeline_layouts: PipelineLayoutCache,
    graphics_states: GraphicsStateCache,
    vertex_inputs: VertexInputDeclarationRegistry,
    render_slots: RenderSlotRegistry,

    // Ops queued by the owning thread, including follow-ups of applied requests
    pending_tx: Sender<PendingOp>,
    pending_rx: Receiver<PendingOp>,
    // Requests from `ShaderRequestSender`s on other threads
    requests_tx: Sender<PendingOp>,
    requests_rx: Receiver<PendingOp>,
    deferred: DeferredDestructionQueue,
}

impl ShaderManager {
    pub fn new(device: Arc<dyn Device>, config: ShaderManagerConfig) -> Self {
        let (pending_tx, pending_rx) = unbounded();
        let (requests_tx, requests_rx) = unbounded();
        Self {
            device,
            config,
            modules: Vec::new(),
            module_name_to_index: FxHashMap::default(),
            shaders: ClientTable::new(RenderHandleType::ShaderProgram),
            compute_shaders: ClientTable::new(RenderHandleType::ComputeProgram),
            name_to_handle: FxHashMap::default(),
            pipeline_layouts: PipelineLayoutCache::new(),
            graphics_states: GraphicsStateCache::new(),
            vertex_inputs: VertexInputDeclarationRegistry::new(),
            render_slots: RenderSlotRegistry::new(),
            pending_tx,
            pending_rx,
            requests_tx,
            requests_rx,
            deferred: DeferredDestructionQueue::new(),
        }
    }

    /// Backend device the manager compiles against
    pub fn device(&self) -> &Arc<dyn Device> {
        &self.device
    }

    pub fn config(&self) -> &ShaderManagerConfig {
        &self.config
    }

    // ===== SHADER MODULES =====

    /// Register shader module byte-code, returning its index
    ///
    /// A module with the same name is replaced in place: the index is kept,
    /// the module is recompiled at the next drain and every shader using it
    /// gets its reflection refreshed and its program rebuilt.
    pub fn create_shader_module(&mut self, name: &str, desc: ShaderModuleDesc) -> u32 {
        if let Some(&index) = self.module_name_to_index.get(name) {
            if let Some(entry) = self.modules.get_mut(index as usize) {
                entry.desc = desc;
            }
            self.queue(PendingOp::CreateModule { index });
            self.refresh_dependents(index);
            return index;
        }

        let index = self.modules.len() as u32;
        self.modules.push(ShaderModuleEntry { desc, module: None });
        if !name.is_empty() {
            self.module_name_to_index.insert(name.to_string(), index);
        }
        self.queue(PendingOp::CreateModule { index });
        index
    }

    /// Index of the module named `name`
    pub fn shader_module_index(&self, name: &str) -> Option<u32> {
        self.module_name_to_index.get(name).copied()
    }

    /// Compiled module at `index` (None until drained, or after a backend failure)
    pub fn shader_module(&self, index: u32) -> Option<Arc<dyn ShaderModule>> {
        self.modules.get(index as usize)?.module.clone()
    }

    // ===== SHADER CREATION =====

    /// Create a graphics shader, or update the one with the same full name in place
    ///
    /// Returns an empty reference when a module index is unknown.
    pub fn create_shader(&mut self, desc: ShaderDesc) -> RenderHandleReference {
        let params = ClientParams {
            path: &desc.path,
            variant_name: &desc.variant_name,
            display_name: &desc.display_name,
            render_slot_id: desc.render_slot_id,
            base_shader_path: desc.base_shader_path.as_deref(),
            modules: vec![desc.vertex_module_index, desc.fragment_module_index],
            pipeline_layout: desc.pipeline_layout,
            vertex_input_declaration: desc.vertex_input_declaration,
            graphics_state: desc.graphics_state,
        };
        self.create_client(RenderHandleType::ShaderProgram, params)
    }

    /// Create a compute shader, or update the one with the same full name in place
    pub fn create_compute_shader(&mut self, desc: ComputeShaderDesc) -> RenderHandleReference {
        let params = ClientParams {
            path: &desc.path,
            variant_name: &desc.variant_name,
            display_name: &desc.display_name,
            render_slot_id: desc.render_slot_id,
            base_shader_path: desc.base_shader_path.as_deref(),
            modules: vec![desc.module_index],
            pipeline_layout: desc.pipeline_layout,
            vertex_input_declaration: None,
            graphics_state: None,
        };
        self.create_client(RenderHandleType::ComputeProgram, params)
    }

    fn create_client(&mut self, kind: RenderHandleType, params: ClientParams) -> RenderHandleReference {
        let name = full_name(params.path, params.variant_name);

        if let Some(&missing) = params
            .modules
            .iter()
            .find(|&&index| index as usize >= self.modules.len())
        {
            engine_warn!(
                LOG_SOURCE,
                "Shader '{}' references unknown shader module {}, creation skipped",
                name,
                missing
            );
            return RenderHandleReference::empty();
        }
        let Some(reflection) = self.reflect(&name, &params.modules) else {
            return RenderHandleReference::empty();
        };

        let reflection_layout = self.pipeline_layouts.create(&name, &reflection.pipeline_layout).handle();
        let pipeline_layout = match params.pipeline_layout {
            Some(handle) if self.pipeline_layouts.get(handle).is_some() => Some(handle),
            Some(handle) => {
                engine_warn!(
                    LOG_SOURCE,
                    "Pipeline layout {:?} of shader '{}' not found, using the reflected layout",
                    handle,
                    name
                );
                None
            }
            None => None,
        };

        let (vertex_input_declaration, derived_vertex_input_declaration) =
            if kind == RenderHandleType::ShaderProgram {
                match params.vertex_input_declaration {
                    Some(handle) if self.vertex_inputs.get(handle).is_some() => (handle, false),
                    explicit => {
                        if let Some(handle) = explicit {
                            engine_warn!(
                                LOG_SOURCE,
                                "Vertex input declaration {:?} of shader '{}' not found, using the reflected inputs",
                                handle,
                                name
                            );
                        }
                        let handle = self
                            .vertex_inputs
                            .create(&name, &reflection.vertex_input_declaration)
                            .handle();
                        (handle, true)
                    }
                }
            } else {
                (RenderHandle::INVALID, false)
            };

        let graphics_state = match params.graphics_state {
            Some(handle) if self.graphics_states.get(handle).is_some() => handle,
            Some(handle) => {
                engine_warn!(
                    LOG_SOURCE,
                    "Graphics state {:?} of shader '{}' not found",
                    handle,
                    name
                );
                RenderHandle::INVALID
            }
            None => RenderHandle::INVALID,
        };

        // Same full name and kind: update in place, keeping the program until it is rebuilt
        let existing = self.name_to_handle.get(&name).copied().filter(|_| !name.is_empty());
        if let Some(existing) = existing {
            if existing.kind() != kind {
                engine_warn!(
                    LOG_SOURCE,
                    "Shader '{}' re-created as a {:?}, the previous {:?} is destroyed",
                    name,
                    kind,
                    existing.kind()
                );
                self.destroy(existing);
            }
        }

        let id = IdDesc {
            path: params.path.to_string(),
            variant: params.variant_name.to_string(),
            display_name: params.display_name.to_string(),
            frame_index: 0,
        };
        let table = self.table_mut(kind);
        let handle = match existing.filter(|&handle| table.get(handle).is_some()) {
            Some(handle) => {
                let mut old_render_slot_id = params.render_slot_id;
                if let Some(entry) = table.get_mut(handle) {
                    old_render_slot_id = entry.render_slot_id;
                    entry.id = IdDesc {
                        frame_index: entry.id.frame_index,
                        ..id
                    };
                    entry.base = None;
                    entry.render_slot_id = params.render_slot_id;
                    entry.modules = params.modules;
                    entry.pipeline_layout = pipeline_layout.unwrap_or(reflection_layout);
                    entry.reflection_pipeline_layout = reflection_layout;
                    entry.derived_pipeline_layout = pipeline_layout.is_none();
                    entry.vertex_input_declaration = vertex_input_declaration;
                    entry.derived_vertex_input_declaration = derived_vertex_input_declaration;
                    entry.graphics_state = graphics_state;
                    entry.reflection = reflection;
                }
                table.variants.unlink_variant(handle.index());
                table
                    .variants
                    .move_base(handle, old_render_slot_id, params.render_slot_id);
                handle
            }
            None => {
                let entry_name = name.clone();
                let handle = table.insert(|reference| ClientEntry {
                    reference,
                    full_name: entry_name,
                    id,
                    base: None,
                    render_slot_id: params.render_slot_id,
                    modules: params.modules,
                    pipeline_layout: pipeline_layout.unwrap_or(reflection_layout),
                    reflection_pipeline_layout: reflection_layout,
                    derived_pipeline_layout: pipeline_layout.is_none(),
                    vertex_input_declaration,
                    derived_vertex_input_declaration,
                    graphics_state,
                    reflection,
                    program: None,
                    program_generation: 0,
                });
                if !name.is_empty() {
                    self.name_to_handle.insert(name.clone(), handle);
                }
                handle
            }
        };

        if let Some(base_path) = params.base_shader_path.filter(|path| !path.is_empty()) {
            self.link_base(handle, &name, base_path, params.render_slot_id);
        }

        self.queue(PendingOp::CreateProgram { handle });
        self.reference(handle)
    }

    fn link_base(&mut self, handle: RenderHandle, name: &str, base_path: &str, render_slot_id: u32) {
        let base = self
            .name_to_handle
            .get(base_path)
            .copied()
            .filter(|&base| base != handle);
        let table = self.table_mut(handle.kind());
        let base = base.and_then(|base| table.get(base).map(|entry| (base, entry.render_slot_id)));

        let Some((base, base_render_slot_id)) = base else {
            engine_warn!(
                LOG_SOURCE,
                "Base shader '{}' of '{}' not found, variant link dropped",
                base_path,
                name
            );
            return;
        };

        if let Some(entry) = table.get_mut(handle) {
            entry.base = Some(base);
        }
        table.variants.link(base, base_render_slot_id, handle.index(), render_slot_id);
    }

    /// Merged reflection of the modules at `module_indices` (vertex first)
    fn reflect(&self, name: &str, module_indices: &[u32]) -> Option<ShaderReflection> {
        let mut merged: Option<ShaderReflection> = None;
        for &index in module_indices {
            let reflection = &self.modules.get(index as usize)?.desc.reflection;
            merged = Some(match merged {
                None => reflection.clone(),
                Some(mut acc) => {
                    let (layout, compatible) =
                        merge_pipeline_layouts(&acc.pipeline_layout, &reflection.pipeline_layout);
                    if !compatible {
                        engine_warn!(
                            LOG_SOURCE,
                            "Shader '{}' stages disagree on descriptor bindings, keeping the vertex stage description",
                            name
                        );
                    }
                    acc.pipeline_layout = layout;
                    acc.specialization_constants = merge_specialization_constants(
                        &acc.specialization_constants,
                        &reflection.specialization_constants,
                    );
                    acc.push_constant_byte_size =
                        acc.push_constant_byte_size.max(reflection.push_constant_byte_size);
                    acc
                }
            });
        }
        merged
    }

    /// Re-reflect every shader using module `index` and queue its program rebuild
    fn refresh_dependents(&mut self, index: u32) {
        let dependents: Vec<RenderHandle> = self
            .shaders
            .live()
            .chain(self.compute_shaders.live())
            .filter(|entry| entry.modules.contains(&index))
            .map(|entry| entry.reference.handle())
            .collect();

        for handle in dependents {
            let Some((name, modules, derived_vertex_input)) = self
                .entry(handle)
                .map(|entry| (entry.full_name.clone(), entry.modules.clone(), entry.derived_vertex_input_declaration))
            else {
                continue;
            };
            let Some(reflection) = self.reflect(&name, &modules) else {
                continue;
            };

            let reflection_layout = self.pipeline_layouts.create(&name, &reflection.pipeline_layout).handle();
            let vertex_input = derived_vertex_input.then(|| {
                self.vertex_inputs
                    .create(&name, &reflection.vertex_input_declaration)
                    .handle()
            });

            if let Some(entry) = self.table_mut(handle.kind()).get_mut(handle) {
                entry.reflection_pipeline_layout = reflection_layout;
                if entry.derived_pipeline_layout {
                    entry.pipeline_layout = reflection_layout;
                }
                if let Some(vertex_input) = vertex_input {
                    entry.vertex_input_declaration = vertex_input;
                }
                entry.reflection = reflection;
            }
            self.queue(PendingOp::CreateProgram { handle });
        }
    }

    // ===== SHADER LOOKUP =====

    /// Shader or compute shader registered under `name`
    pub fn shader_handle(&self, name: &str) -> RenderHandleReference {
        match self.name_to_handle.get(name) {
            Some(&handle) => self.reference(handle),
            None => {
                if self.config.warn_on_missing_lookup {
                    engine_warn!(LOG_SOURCE, "Shader '{}' not found", name);
                }
                RenderHandleReference::empty()
            }
        }
    }

    /// Variant `variant` of the shader registered under `name`
    pub fn shader_handle_variant(&self, name: &str, variant: &str) -> RenderHandleReference {
        self.shader_handle(&full_name(name, variant))
    }

    /// Resolve `handle` to the shader used for `render_slot_id`
    ///
    /// The shader itself when its own render slot matches, otherwise the
    /// variant registered on its base for that slot, otherwise empty.
    pub fn shader_handle_for_slot(&self, handle: RenderHandle, render_slot_id: u32) -> RenderHandleReference {
        let Some(table) = self.table(handle.kind()) else {
            return RenderHandleReference::empty();
        };
        let Some(entry) = table.get(handle) else {
            return RenderHandleReference::empty();
        };
        if entry.render_slot_id == render_slot_id {
            return entry.reference.clone();
        }
        let base = entry.base.unwrap_or(handle);
        table
            .variants
            .resolve(base, render_slot_id)
            .and_then(|index| table.get_by_index(index))
            .map(|variant| variant.reference.clone())
            .unwrap_or_default()
    }

    /// Every shader and compute shader registered for `render_slot_id`
    pub fn shaders(&self, render_slot_id: u32) -> Vec<RenderHandleReference> {
        self.shaders
            .live()
            .chain(self.compute_shaders.live())
            .filter(|entry| entry.render_slot_id == render_slot_id)
            .map(|entry| entry.reference.clone())
            .collect()
    }

    pub fn is_shader(&self, handle: RenderHandle) -> bool {
        self.shaders.get(handle).is_some()
    }

    pub fn is_compute_shader(&self, handle: RenderHandle) -> bool {
        self.compute_shaders.get(handle).is_some()
    }

    /// Number of live graphics shaders
    pub fn shader_count(&self) -> usize {
        self.shaders.live().count()
    }

    /// Number of live compute shaders
    pub fn compute_shader_count(&self) -> usize {
        self.compute_shaders.live().count()
    }

    // ===== PER-SHADER QUERIES =====

    /// Pipeline layout the shader's program is linked against
    pub fn pipeline_layout_handle_by_shader_handle(&self, handle: RenderHandle) -> RenderHandleReference {
        self.entry(handle)
            .map(|entry| self.pipeline_layouts.reference(entry.pipeline_layout))
            .unwrap_or_default()
    }

    /// Default graphics state of a graphics shader
    pub fn graphics_state_handle_by_shader_handle(&self, handle: RenderHandle) -> RenderHandleReference {
        self.shaders
            .get(handle)
            .map(|entry| self.graphics_states.reference(entry.graphics_state))
            .unwrap_or_default()
    }

    /// Vertex input declaration of a graphics shader
    pub fn vertex_input_declaration_handle_by_shader_handle(&self, handle: RenderHandle) -> RenderHandleReference {
        self.shaders
            .get(handle)
            .filter(|entry| self.vertex_inputs.get(entry.vertex_input_declaration).is_some())
            .map(|entry| {
                self.vertex_inputs
                    .reference_by_index(entry.vertex_input_declaration.index())
            })
            .unwrap_or_default()
    }

    /// Pipeline layout merged from the shader modules' reflection
    pub fn reflection_pipeline_layout(&self, handle: RenderHandle) -> Option<&PipelineLayout> {
        self.entry(handle).map(|entry| &entry.reflection.pipeline_layout)
    }

    /// Specialization constants of every stage, sorted by id
    pub fn reflection_specialization(&self, handle: RenderHandle) -> Option<&[ShaderSpecializationConstant]> {
        self.entry(handle)
            .map(|entry| entry.reflection.specialization_constants.as_slice())
    }

    /// Vertex inputs reflected from the vertex module
    pub fn reflection_vertex_input_declaration(&self, handle: RenderHandle) -> Option<&VertexInputDeclaration> {
        self.shaders
            .get(handle)
            .map(|entry| &entry.reflection.vertex_input_declaration)
    }

    /// Local workgroup size of a compute shader
    pub fn reflection_thread_group_size(&self, handle: RenderHandle) -> Option<ShaderThreadGroupSize> {
        self.compute_shaders
            .get(handle)
            .map(|entry| entry.reflection.thread_group_size)
    }

    /// Identification of a shader (default when unknown)
    pub fn id_desc(&self, handle: RenderHandle) -> IdDesc {
        self.entry(handle).map(|entry| entry.id.clone()).unwrap_or_default()
    }

    /// Render slot of a shader (`INVALID_RENDER_SLOT_ID` when unknown)
    pub fn render_slot_id(&self, handle: RenderHandle) -> u32 {
        self.entry(handle)
            .map(|entry| entry.render_slot_id)
            .unwrap_or(INVALID_RENDER_SLOT_ID)
    }

    /// Base shader of a variant
    pub fn base_shader_handle(&self, handle: RenderHandle) -> Option<RenderHandle> {
        self.entry(handle).and_then(|entry| entry.base)
    }

    // ===== GPU OBJECTS =====

    /// Current program of a graphics shader (None before the first drain or after a failure)
    pub fn gpu_shader_program(&self, handle: RenderHandle) -> Option<Arc<dyn GpuShaderProgram>> {
        match self.shaders.get(handle)?.program.as_ref()? {
            GpuProgram::Graphics(program) => Some(Arc::clone(program)),
            GpuProgram::Compute(_) => None,
        }
    }

    /// Current program of a compute shader
    pub fn gpu_compute_program(&self, handle: RenderHandle) -> Option<Arc<dyn GpuComputeProgram>> {
        match self.compute_shaders.get(handle)?.program.as_ref()? {
            GpuProgram::Compute(program) => Some(Arc::clone(program)),
            GpuProgram::Graphics(_) => None,
        }
    }

    /// Counter bumped every time the shader's program object changes
    pub fn program_generation(&self, handle: RenderHandle) -> Option<u64> {
        self.entry(handle).map(|entry| entry.program_generation)
    }

    // ===== PIPELINE LAYOUTS =====

    pub fn create_pipeline_layout(&mut self, name: &str, layout: &PipelineLayout) -> RenderHandleReference {
        self.pipeline_layouts.create(name, layout)
    }

    pub fn pipeline_layout_handle(&self, name: &str) -> RenderHandleReference {
        let reference = self.pipeline_layouts.handle_by_name(name);
        if !reference.is_valid() && self.config.warn_on_missing_lookup {
            engine_warn!(LOG_SOURCE, "Pipeline layout '{}' not found", name);
        }
        reference
    }

    pub fn pipeline_layout(&self, handle: RenderHandle) -> Option<&PipelineLayout> {
        self.pipeline_layouts.get(handle)
    }

    /// Compatibility of two pipeline layouts
    ///
    /// Shader handles are compared through the layout their program uses.
    pub fn compatibility_flags(&self, lhs: RenderHandle, rhs: RenderHandle) -> CompatibilityFlags {
        self.pipeline_layouts
            .compatibility_flags(self.layout_of(lhs), self.layout_of(rhs))
    }

    fn layout_of(&self, handle: RenderHandle) -> RenderHandle {
        match handle.kind() {
            RenderHandleType::ShaderProgram | RenderHandleType::ComputeProgram => self
                .entry(handle)
                .map(|entry| entry.pipeline_layout)
                .unwrap_or(RenderHandle::INVALID),
            _ => handle,
        }
    }

    pub fn pipeline_layout_cache(&self) -> &PipelineLayoutCache {
        &self.pipeline_layouts
    }

    // ===== GRAPHICS STATES =====

    pub fn create_graphics_state(
        &mut self,
        name: &str,
        state: &GraphicsState,
        variant: Option<&GraphicsStateVariantDesc>,
    ) -> RenderHandleReference {
        self.graphics_states.create(name, state, variant)
    }

    pub fn graphics_state_handle(&self, name: &str) -> RenderHandleReference {
        let reference = self.graphics_states.handle_by_name(name);
        if !reference.is_valid() && self.config.warn_on_missing_lookup {
            engine_warn!(LOG_SOURCE, "Graphics state '{}' not found", name);
        }
        reference
    }

    pub fn graphics_state_handle_variant(&self, name: &str, variant: &str) -> RenderHandleReference {
        self.graphics_state_handle(&full_name(name, variant))
    }

    pub fn graphics_state_handle_by_hash(&self, hash: u64) -> RenderHandleReference {
        self.graphics_states.handle_by_hash(hash)
    }

    /// Resolve a graphics state to its variant for `render_slot_id`
    pub fn graphics_state_handle_for_slot(&self, handle: RenderHandle, render_slot_id: u32) -> RenderHandleReference {
        self.graphics_states.variant_handle(handle, render_slot_id)
    }

    pub fn graphics_state(&self, handle: RenderHandle) -> Option<&GraphicsState> {
        self.graphics_states.get(handle)
    }

    pub fn hash_graphics_state(&self, state: &GraphicsState) -> u64 {
        hash_graphics_state(state)
    }

    pub fn graphics_state_cache(&self) -> &GraphicsStateCache {
        &self.graphics_states
    }

    // ===== VERTEX INPUT DECLARATIONS =====

    pub fn create_vertex_input_declaration(
        &mut self,
        name: &str,
        declaration: &VertexInputDeclaration,
    ) -> RenderHandleReference {
        self.vertex_inputs.create(name, declaration)
    }

    pub fn vertex_input_declaration_handle(&self, name: &str) -> RenderHandleReference {
        let reference = self.vertex_inputs.handle_by_name(name);
        if !reference.is_valid() && self.config.warn_on_missing_lookup {
            engine_warn!(LOG_SOURCE, "Vertex input declaration '{}' not found", name);
        }
        reference
    }

    pub fn vertex_input_declaration(&self, handle: RenderHandle) -> Option<&VertexInputDeclaration> {
        self.vertex_inputs.get(handle)
    }

    // ===== RENDER SLOTS =====

    pub fn create_render_slot_id(&mut self, name: &str) -> u32 {
        self.render_slots.create_render_slot_id(name)
    }

    pub fn render_slot_id_by_name(&self, name: &str) -> u32 {
        self.render_slots.render_slot_id(name)
    }

    pub fn render_slot_name(&self, render_slot_id: u32) -> Option<&str> {
        self.render_slots.render_slot_name(render_slot_id)
    }

    pub fn set_render_slot_data(&mut self, data: RenderSlotData) -> bool {
        self.render_slots.set_render_slot_data(data)
    }

    pub fn render_slot_data(&self, render_slot_id: u32) -> Option<&RenderSlotData> {
        self.render_slots.render_slot_data(render_slot_id)
    }

    // ===== DESTRUCTION =====

    /// Destroy any resource owned by the manager
    ///
    /// Shaders disappear from every lookup immediately; their slot and GPU
    /// program are released by the following drains. Returns false for stale
    /// or empty handles.
    pub fn destroy(&mut self, handle: RenderHandle) -> bool {
        match handle.kind() {
            RenderHandleType::ShaderProgram | RenderHandleType::ComputeProgram => self.destroy_client(handle),
            RenderHandleType::PipelineLayout => self.pipeline_layouts.destroy(handle),
            RenderHandleType::GraphicsState => self.graphics_states.destroy(handle),
            RenderHandleType::VertexInputDeclaration => self.vertex_inputs.destroy(handle),
            RenderHandleType::Invalid => false,
        }
    }

    fn destroy_client(&mut self, handle: RenderHandle) -> bool {
        let table = self.table_mut(handle.kind());
        let Some(entry) = handle
            .slot(table.kind)
            .and_then(|slot| table.entries.get_mut(slot))
            .and_then(Option::take)
        else {
            return false;
        };

        table.variants.remove(handle.index());
        for variant in table.entries.iter_mut().flatten() {
            if variant.base == Some(handle) {
                variant.base = None;
            }
        }
        if self.name_to_handle.get(&entry.full_name) == Some(&handle) {
            self.name_to_handle.remove(&entry.full_name);
        }

        self.queue(PendingOp::Destroy {
            handle,
            program: entry.program,
        });
        true
    }

    // ===== PENDING QUEUE =====

    /// Producer end for other threads
    pub fn request_sender(&self) -> ShaderRequestSender {
        ShaderRequestSender::new(self.requests_tx.clone())
    }

    /// Create the queued GPU objects and release the aged-out ones
    ///
    /// Called once per frame by the frame loop that owns the device.
    /// Requests from other threads are taken as a snapshot of what was queued
    /// when the drain started and applied in submission order; anything sent
    /// while draining waits for the next call. Then slots of destroyed
    /// shaders are freed, modules compiled, programs created or replaced, and
    /// finally the deferred destruction queue is purged.
    pub fn handle_pending_allocations(&mut self) {
        let mut destroyed = Vec::new();
        let mut module_indices = Vec::new();
        let mut programs = Vec::new();

        let queued = self.requests_rx.len();
        let requests: Vec<PendingOp> = self.requests_rx.try_iter().take(queued).collect();
        for op in requests {
            match op {
                PendingOp::Request(request) => self.apply_request(request),
                other => self.queue(other),
            }
        }

        // Only the owning thread feeds this queue, so it cannot grow while draining
        while let Ok(op) = self.pending_rx.try_recv() {
            match op {
                PendingOp::Request(request) => self.apply_request(request),
                PendingOp::CreateModule { index } => module_indices.push(index),
                PendingOp::CreateProgram { handle } => programs.push(handle),
                PendingOp::Destroy { handle, program } => destroyed.push((handle, program)),
            }
        }

        let frame = self.device.frame_count();

        for (handle, program) in destroyed {
            if let Some(program) = program {
                self.deferred.push(frame, program.into());
            }
            self.table_mut(handle.kind()).slots.free(handle.index());
        }

        let mut seen = FxHashSet::default();
        module_indices.retain(|index| seen.insert(*index));
        for index in module_indices {
            self.compile_module(index);
        }

        let mut seen = FxHashSet::default();
        programs.retain(|handle| seen.insert(*handle));
        for handle in programs {
            self.compile_program(handle, frame);
        }

        let age_limit = self.config.age_limit(self.device.command_buffering_count());
        let released = self.deferred.purge(frame, age_limit);
        if released > 0 {
            engine_debug!(LOG_SOURCE, "Released {} deferred GPU object(s) at frame {}", released, frame);
        }
    }

    /// Objects waiting in the deferred destruction queue
    pub fn pending_deferred_destruction_count(&self) -> usize {
        self.deferred.len()
    }

    fn queue(&self, op: PendingOp) {
        // The receiver lives in `self`, so the channel cannot be disconnected here
        let _ = self.pending_tx.send(op);
    }

    fn apply_request(&mut self, request: ShaderRequest) {
        match request {
            ShaderRequest::CreateShaderModule { name, desc } => {
                self.create_shader_module(&name, desc);
            }
            ShaderRequest::CreateShader {
                mut desc,
                vertex_module,
                fragment_module,
            } => {
                match (
                    self.shader_module_index(&vertex_module),
                    self.shader_module_index(&fragment_module),
                ) {
                    (Some(vertex), Some(fragment)) => {
                        desc.vertex_module_index = vertex;
                        desc.fragment_module_index = fragment;
                        self.create_shader(desc);
                    }
                    _ => engine_warn!(
                        LOG_SOURCE,
                        "Shader '{}' references unknown module '{}' or '{}', creation skipped",
                        desc.path,
                        vertex_module,
                        fragment_module
                    ),
                }
            }
            ShaderRequest::CreateComputeShader { mut desc, module } => match self.shader_module_index(&module) {
                Some(index) => {
                    desc.module_index = index;
                    self.create_compute_shader(desc);
                }
                None => engine_warn!(
                    LOG_SOURCE,
                    "Compute shader '{}' references unknown module '{}', creation skipped",
                    desc.path,
                    module
                ),
            },
            ShaderRequest::Destroy { handle } => {
                self.destroy(handle);
            }
        }
    }

    fn compile_module(&mut self, index: u32) {
        let Some(entry) = self.modules.get_mut(index as usize) else {
            return;
        };
        entry.module = match self.device.create_shader_module(&entry.desc) {
            Ok(module) => Some(module),
            Err(err) => {
                engine_error!(LOG_SOURCE, "Shader module {} creation failed: {}", index, err);
                None
            }
        };
    }

    fn compile_program(&mut self, handle: RenderHandle, frame: u64) {
        let Some(table) = self.table(handle.kind()) else {
            return;
        };
        let Some(entry) = table.get(handle) else {
            return;
        };
        let layout = self
            .pipeline_layouts
            .get(entry.pipeline_layout)
            .cloned()
            .unwrap_or_else(|| entry.reflection.pipeline_layout.clone());
        let modules: Option<Vec<Arc<dyn ShaderModule>>> = entry
            .modules
            .iter()
            .map(|&index| self.shader_module(index))
            .collect();

        let program = match (handle.kind(), modules.as_deref()) {
            (_, None) => {
                engine_error!(
                    LOG_SOURCE,
                    "Shader '{}' has a module that failed to compile, no program created",
                    entry.full_name
                );
                None
            }
            (RenderHandleType::ShaderProgram, Some([vertex, fragment])) => self
                .device
                .create_gpu_shader_program(&GpuShaderProgramDesc {
                    vertex_module: Arc::clone(vertex),
                    fragment_module: Arc::clone(fragment),
                    pipeline_layout: layout,
                })
                .map(GpuProgram::Graphics)
                .map_err(|err| {
                    engine_error!(LOG_SOURCE, "GPU program creation for '{}' failed: {}", entry.full_name, err)
                })
                .ok(),
            (RenderHandleType::ComputeProgram, Some([module])) => self
                .device
                .create_gpu_compute_program(&GpuComputeProgramDesc {
                    module: Arc::clone(module),
                    pipeline_layout: layout,
                })
                .map(GpuProgram::Compute)
                .map_err(|err| {
                    engine_error!(LOG_SOURCE, "GPU compute program creation for '{}' failed: {}", entry.full_name, err)
                })
                .ok(),
            _ => None,
        };

        let Some(entry) = self.table_mut(handle.kind()).get_mut(handle) else {
            return;
        };
        let succeeded = program.is_some();
        let previous = std::mem::replace(&mut entry.program, program);
        entry.program_generation += 1;
        if succeeded {
            entry.id.frame_index = frame;
        }
        if let Some(previous) = previous {
            self.deferred.push(frame, previous.into());
        }
    }

    // ===== INTERNAL =====

    fn table(&self, kind: RenderHandleType) -> Option<&ClientTable> {
        match kind {
            RenderHandleType::ShaderProgram => Some(&self.shaders),
            RenderHandleType::ComputeProgram => Some(&self.compute_shaders),
            _ => None,
        }
    }

    /// Client table of a shader kind; other kinds map to the graphics table,
    /// whose lookups then reject the handle
    fn table_mut(&mut self, kind: RenderHandleType) -> &mut ClientTable {
        match kind {
            RenderHandleType::ComputeProgram => &mut self.compute_shaders,
            _ => &mut self.shaders,
        }
    }

    fn entry(&self, handle: RenderHandle) -> Option<&ClientEntry> {
        self.table(handle.kind())?.get(handle)
    }

    fn reference(&self, handle: RenderHandle) -> RenderHandleReference {
        self.entry(handle)
            .map(|entry| entry.reference.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "shader_manager_tests.rs"]
mod tests;
