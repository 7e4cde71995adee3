/// Graphics state cache
///
/// Stores fixed-function state combinations addressable by name, by
/// structural hash, and by `(base state, render slot)` for variants.

use std::hash::{Hash, Hasher};

use rustc_hash::{FxHashMap, FxHasher};

use crate::engine_warn;
use crate::handle::{RenderHandle, RenderHandleReference, RenderHandleType};
use crate::pipeline_state::{
    ColorBlendAttachmentState, ColorBlendState, DepthStencilState, GraphicsState, InputAssembly, RasterizationState,
    MAX_COLOR_ATTACHMENT_COUNT,
};
use crate::resource::render_slot::INVALID_RENDER_SLOT_ID;
use crate::resource::variant_table::{full_name, VariantTable};
use crate::utils::SlotAllocator;

// ============================================================================
// Structural hash
// ============================================================================
//
// Toggles and comparison ops are packed into disjoint ranges of a layout word:
//
// bits  0..5   input assembly
// bits  5..16  rasterization
// bits 16..32  depth/stencil
// bits 32..48  dynamic state flags
// bits 48..64  color blend
//
// Stencil op states (when stencil testing is on) and the full color
// attachment blend states are hashed at full width and xored over the word.

fn hash_input_assembly(state: &InputAssembly) -> u64 {
    (state.primitive_topology as u64 & 0xF) | ((state.enable_primitive_restart as u64) << 4)
}

fn hash_rasterization(state: &RasterizationState) -> u64 {
    (state.polygon_mode as u64 & 0x3)
        | ((state.cull_mode as u64 & 0x3) << 2)
        | ((state.front_face as u64 & 0x1) << 4)
        | ((state.enable_depth_clamp as u64) << 5)
        | ((state.enable_rasterizer_discard as u64) << 6)
        | ((state.depth_bias.is_some() as u64) << 7)
}

fn hash_depth_stencil(state: &DepthStencilState) -> u64 {
    (state.enable_depth_test as u64)
        | ((state.enable_depth_write as u64) << 1)
        | ((state.enable_depth_bounds_test as u64) << 2)
        | ((state.enable_stencil_test as u64) << 3)
        | ((state.depth_compare_op as u64 & 0x7) << 4)
}

fn color_attachments(state: &ColorBlendState) -> &[ColorBlendAttachmentState] {
    let count = state.color_attachments.len().min(MAX_COLOR_ATTACHMENT_COUNT);
    &state.color_attachments[..count]
}

fn hash_color_blend(state: &ColorBlendState) -> u64 {
    let mut bits = state.enable_logic_op as u64;
    if state.enable_logic_op {
        bits |= (state.logic_op as u64 & 0xF) << 1;
    }
    for (index, attachment) in color_attachments(state).iter().enumerate() {
        bits |= (attachment.enable_blend as u64) << (5 + index);
    }
    bits
}

fn hash_details(state: &GraphicsState) -> u64 {
    let mut hasher = FxHasher::default();
    let depth_stencil = &state.depth_stencil_state;
    if depth_stencil.enable_stencil_test {
        depth_stencil.front_stencil_op_state.hash(&mut hasher);
        depth_stencil.back_stencil_op_state.hash(&mut hasher);
    }
    color_attachments(&state.color_blend_state).hash(&mut hasher);
    hasher.finish()
}

/// Structural hash of a graphics state
///
/// Only semantically meaningful fields contribute: topology, raster/blend/
/// depth toggles and comparison ops, stencil ops, attachment blend states and
/// dynamic state flags. Line width, depth bias factors, depth bounds and
/// blend constants are excluded.
///
/// Equal hashes do not prove equal states; `GraphicsStateCache` compares the
/// stored state before reusing an entry.
pub fn hash_graphics_state(state: &GraphicsState) -> u64 {
    let layout = hash_input_assembly(&state.input_assembly)
        | (hash_rasterization(&state.rasterization_state) << 5)
        | (hash_depth_stencil(&state.depth_stencil_state) << 16)
        | ((state.dynamic_state_flags.bits() as u64 & 0xFFFF) << 32)
        | (hash_color_blend(&state.color_blend_state) << 48);
    layout ^ hash_details(state)
}

// ============================================================================
// Cache
// ============================================================================

/// Variant registration of a graphics state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphicsStateVariantDesc {
    /// Render slot the state is used in
    pub render_slot_id: u32,
    /// Variant name (empty for a base state)
    pub variant: String,
    /// Name of the base state this variant substitutes (empty = none)
    pub base_state: String,
    /// Variant name of the base state (usually empty)
    pub base_variant: String,
}

impl Default for GraphicsStateVariantDesc {
    fn default() -> Self {
        Self {
            render_slot_id: INVALID_RENDER_SLOT_ID,
            variant: String::new(),
            base_state: String::new(),
            base_variant: String::new(),
        }
    }
}

struct GraphicsStateEntry {
    full_name: String,
    reference: RenderHandleReference,
    hash: u64,
    render_slot_id: u32,
    base: Option<RenderHandle>,
    state: GraphicsState,
}

/// Graphics state cache
pub struct GraphicsStateCache {
    slots: SlotAllocator,
    entries: Vec<Option<GraphicsStateEntry>>,
    name_to_index: FxHashMap<String, u32>,
    hash_to_index: FxHashMap<u64, u32>,
    variants: VariantTable,
}

impl GraphicsStateCache {
    pub fn new() -> Self {
        Self {
            slots: SlotAllocator::new(),
            entries: Vec::new(),
            name_to_index: FxHashMap::default(),
            hash_to_index: FxHashMap::default(),
            variants: VariantTable::new(),
        }
    }

    /// Create a graphics state
    ///
    /// - A name that already exists is replaced in place (same handle).
    /// - An unnamed state equal to a stored state with the same hash returns
    ///   that entry. A different state colliding on the hash is stored as a
    ///   new entry with a warning; the hash index keeps the first one.
    /// - A variant whose base cannot be found is still created; the link is
    ///   dropped with a warning. The base must be created first.
    pub fn create(
        &mut self,
        name: &str,
        state: &GraphicsState,
        variant: Option<&GraphicsStateVariantDesc>,
    ) -> RenderHandleReference {
        if state.color_blend_state.color_attachments.len() > MAX_COLOR_ATTACHMENT_COUNT {
            engine_warn!(
                "prism::GraphicsStateCache",
                "Graphics state '{}' has {} color attachments, only the first {} are used",
                name,
                state.color_blend_state.color_attachments.len(),
                MAX_COLOR_ATTACHMENT_COUNT
            );
        }

        let hash = hash_graphics_state(state);
        let render_slot_id = variant.map(|v| v.render_slot_id).unwrap_or(INVALID_RENDER_SLOT_ID);
        let variant_name = variant.map(|v| v.variant.as_str()).unwrap_or("");
        let entry_name = full_name(name, variant_name);

        let index = match self.name_to_index.get(&entry_name).copied() {
            Some(index) if !entry_name.is_empty() => {
                self.replace(index, hash, render_slot_id, state);
                index
            }
            _ => {
                if entry_name.is_empty() {
                    if let Some(&existing) = self.hash_to_index.get(&hash) {
                        let stored = self.entries.get(existing as usize).and_then(Option::as_ref);
                        if stored.is_some_and(|entry| entry.state == *state) {
                            return self.reference_by_index(existing);
                        }
                        engine_warn!(
                            "prism::GraphicsStateCache",
                            "Unnamed graphics state collides with state #{} on hash {:#018x} but differs, stored separately",
                            existing,
                            hash
                        );
                    }
                }
                self.insert(&entry_name, hash, render_slot_id, state)
            }
        };

        self.hash_to_index.entry(hash).or_insert(index);
        if let Some(variant) = variant {
            self.link_base(index, variant);
        }
        self.reference_by_index(index)
    }

    /// Handle of the state named `name`
    pub fn handle_by_name(&self, name: &str) -> RenderHandleReference {
        self.name_to_index
            .get(name)
            .map(|&index| self.reference_by_index(index))
            .unwrap_or_default()
    }

    /// Handle of the variant `variant` of `name`
    pub fn handle_by_name_variant(&self, name: &str, variant: &str) -> RenderHandleReference {
        self.handle_by_name(&full_name(name, variant))
    }

    /// Handle of a state with structural hash `hash`
    pub fn handle_by_hash(&self, hash: u64) -> RenderHandleReference {
        self.hash_to_index
            .get(&hash)
            .map(|&index| self.reference_by_index(index))
            .unwrap_or_default()
    }

    /// Resolve `handle` to its variant for `render_slot_id`
    ///
    /// An exact render slot match returns `handle` itself.
    pub fn variant_handle(&self, handle: RenderHandle, render_slot_id: u32) -> RenderHandleReference {
        let Some(entry) = self.entry(handle) else {
            return RenderHandleReference::empty();
        };
        if entry.render_slot_id == render_slot_id {
            return entry.reference.clone();
        }
        let base = entry.base.unwrap_or(handle);
        self.variants
            .resolve(base, render_slot_id)
            .map(|index| self.reference_by_index(index))
            .unwrap_or_default()
    }

    /// State behind `handle`
    pub fn get(&self, handle: RenderHandle) -> Option<&GraphicsState> {
        self.entry(handle).map(|entry| &entry.state)
    }

    /// Stored hash of `handle`
    pub fn hash(&self, handle: RenderHandle) -> Option<u64> {
        self.entry(handle).map(|entry| entry.hash)
    }

    /// Render slot of `handle`
    pub fn render_slot_id(&self, handle: RenderHandle) -> Option<u32> {
        self.entry(handle).map(|entry| entry.render_slot_id)
    }

    /// Base state of a variant
    pub fn base_handle(&self, handle: RenderHandle) -> Option<RenderHandle> {
        self.entry(handle).and_then(|entry| entry.base)
    }

    /// Canonical reference of `handle`
    pub fn reference(&self, handle: RenderHandle) -> RenderHandleReference {
        self.entry(handle)
            .map(|entry| entry.reference.clone())
            .unwrap_or_default()
    }

    /// Canonical reference of slot `index`
    pub fn reference_by_index(&self, index: u32) -> RenderHandleReference {
        self.entries
            .get(index as usize)
            .and_then(Option::as_ref)
            .map(|entry| entry.reference.clone())
            .unwrap_or_default()
    }

    /// Remove a state, its name and hash entries and every variant link through it
    ///
    /// Variants of a destroyed base keep existing as unlinked states.
    pub fn destroy(&mut self, handle: RenderHandle) -> bool {
        let Some(slot) = handle.slot(RenderHandleType::GraphicsState) else {
            return false;
        };
        let Some(entry) = self.entries.get_mut(slot).and_then(Option::take) else {
            return false;
        };
        let index = handle.index();
        self.name_to_index.retain(|_, &mut i| i != index);
        if self.hash_to_index.get(&entry.hash) == Some(&index) {
            self.hash_to_index.remove(&entry.hash);
        }
        self.variants.remove(index);
        for variant in self.entries.iter_mut().flatten() {
            if variant.base == Some(handle) {
                variant.base = None;
            }
        }
        self.slots.free(index);
        true
    }

    /// Number of live states
    pub fn len(&self) -> usize {
        self.slots.len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn entry(&self, handle: RenderHandle) -> Option<&GraphicsStateEntry> {
        let slot = handle.slot(RenderHandleType::GraphicsState)?;
        self.entries.get(slot)?.as_ref()
    }

    fn insert(
        &mut self,
        entry_name: &str,
        hash: u64,
        render_slot_id: u32,
        state: &GraphicsState,
    ) -> u32 {
        let index = self.slots.alloc();
        let handle = RenderHandle::new(RenderHandleType::GraphicsState, index);
        let slot = index as usize;
        if slot >= self.entries.len() {
            self.entries.resize_with(slot + 1, || None);
        }
        self.entries[slot] = Some(GraphicsStateEntry {
            full_name: entry_name.to_string(),
            reference: RenderHandleReference::new(handle),
            hash,
            render_slot_id,
            base: None,
            state: state.clone(),
        });

        if !entry_name.is_empty() {
            self.name_to_index.insert(entry_name.to_string(), index);
        }
        index
    }

    fn replace(&mut self, index: u32, hash: u64, render_slot_id: u32, state: &GraphicsState) {
        let Some(Some(entry)) = self.entries.get_mut(index as usize) else {
            return;
        };
        if entry.hash != hash && self.hash_to_index.get(&entry.hash) == Some(&index) {
            self.hash_to_index.remove(&entry.hash);
        }
        let old_render_slot_id = entry.render_slot_id;
        entry.hash = hash;
        entry.render_slot_id = render_slot_id;
        entry.base = None;
        entry.state = state.clone();
        let handle = entry.reference.handle();
        self.variants.unlink_variant(index);
        self.variants.move_base(handle, old_render_slot_id, render_slot_id);
    }

    fn link_base(&mut self, index: u32, variant: &GraphicsStateVariantDesc) {
        if variant.base_state.is_empty() {
            return;
        }
        let base_name = full_name(&variant.base_state, &variant.base_variant);
        let base = self
            .name_to_index
            .get(&base_name)
            .copied()
            .filter(|&base_index| base_index != index)
            .and_then(|base_index| self.entries.get(base_index as usize)?.as_ref())
            .map(|base| (base.reference.handle(), base.render_slot_id));

        let Some((base_handle, base_render_slot_id)) = base else {
            let name = self
                .entries
                .get(index as usize)
                .and_then(Option::as_ref)
                .map(|entry| entry.full_name.clone())
                .unwrap_or_default();
            engine_warn!(
                "prism::GraphicsStateCache",
                "Base graphics state '{}' of '{}' not found, variant link dropped",
                base_name,
                name
            );
            return;
        };

        if let Some(Some(entry)) = self.entries.get_mut(index as usize) {
            entry.base = Some(base_handle);
        }
        self.variants.link(base_handle, base_render_slot_id, index, variant.render_slot_id);
    }
}

impl Default for GraphicsStateCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "graphics_state_cache_tests.rs"]
mod tests;
