/// Name-addressable cache of pipeline layouts
///
/// Layouts are normalized on insertion (sets placed at their own index,
/// bindings sorted, capacities clamped) and the handle's `extra` word carries
/// the occupied descriptor-set bitmask.

use bitflags::bitflags;
use rustc_hash::FxHashMap;

use crate::engine_warn;
use crate::handle::{RenderHandle, RenderHandleReference, RenderHandleType};
use crate::pipeline_state::{
    DescriptorSetLayout, PipelineLayout, MAX_DESCRIPTOR_SET_COUNT, MAX_PUSH_CONSTANT_BYTE_SIZE,
};
use crate::utils::SlotAllocator;

bitflags! {
    /// Result of comparing two pipeline layouts (empty = incompatible)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CompatibilityFlags: u32 {
        /// Every binding present in both layouts agrees on type and count
        const COMPATIBLE = 1 << 0;
        /// Every descriptor set is identical
        const EXACT = 1 << 1;
    }
}

/// Compare two layouts binding by binding
///
/// Only bindings present in both layouts are checked. Uniform and storage
/// buffers are interchangeable with their dynamic counterparts.
pub fn layout_compatibility(lhs: &PipelineLayout, rhs: &PipelineLayout) -> CompatibilityFlags {
    for (lhs_set, rhs_set) in lhs.descriptor_set_layouts.iter().zip(rhs.descriptor_set_layouts.iter()) {
        if !lhs_set.is_used() || !rhs_set.is_used() {
            continue;
        }
        for binding in &lhs_set.bindings {
            if let Some(other) = rhs_set.binding(binding.binding) {
                if !binding.descriptor_type.is_compatible_with(other.descriptor_type)
                    || binding.descriptor_count != other.descriptor_count
                {
                    return CompatibilityFlags::empty();
                }
            }
        }
    }

    if lhs.descriptor_set_layouts == rhs.descriptor_set_layouts {
        CompatibilityFlags::COMPATIBLE | CompatibilityFlags::EXACT
    } else {
        CompatibilityFlags::COMPATIBLE
    }
}

struct PipelineLayoutEntry {
    name: String,
    reference: RenderHandleReference,
    layout: PipelineLayout,
}

/// Pipeline layout cache
pub struct PipelineLayoutCache {
    slots: SlotAllocator,
    entries: Vec<Option<PipelineLayoutEntry>>,
    name_to_index: FxHashMap<String, u32>,
}

impl PipelineLayoutCache {
    pub fn new() -> Self {
        Self {
            slots: SlotAllocator::new(),
            entries: Vec::new(),
            name_to_index: FxHashMap::default(),
        }
    }

    /// Create a layout, or replace the content of the layout named `name`
    ///
    /// Replacing keeps the handle index (hot reload); the `extra` mask is
    /// refreshed to the new set occupancy.
    pub fn create(&mut self, name: &str, layout: &PipelineLayout) -> RenderHandleReference {
        let normalized = Self::normalize(name, layout);
        let mask = normalized.set_mask();

        if let Some(&index) = self.name_to_index.get(name) {
            if let Some(Some(entry)) = self.entries.get_mut(index as usize) {
                let handle = RenderHandle::new(RenderHandleType::PipelineLayout, index).with_extra(mask);
                entry.reference = entry.reference.with_handle(handle);
                entry.layout = normalized;
                return entry.reference.clone();
            }
        }

        let index = self.slots.alloc();
        let handle = RenderHandle::new(RenderHandleType::PipelineLayout, index).with_extra(mask);
        let reference = RenderHandleReference::new(handle);
        let entry = PipelineLayoutEntry {
            name: name.to_string(),
            reference: reference.clone(),
            layout: normalized,
        };

        let slot = index as usize;
        if slot >= self.entries.len() {
            self.entries.resize_with(slot + 1, || None);
        }
        self.entries[slot] = Some(entry);
        if !name.is_empty() {
            self.name_to_index.insert(name.to_string(), index);
        }
        reference
    }

    /// Handle of the layout named `name` (empty if unknown)
    pub fn handle_by_name(&self, name: &str) -> RenderHandleReference {
        self.name_to_index
            .get(name)
            .map(|&index| self.reference_by_index(index))
            .unwrap_or_default()
    }

    /// Layout behind `handle`
    pub fn get(&self, handle: RenderHandle) -> Option<&PipelineLayout> {
        self.entry(handle).map(|entry| &entry.layout)
    }

    /// Layout stored at slot `index`
    pub fn get_by_index(&self, index: u32) -> Option<&PipelineLayout> {
        self.entries
            .get(index as usize)
            .and_then(Option::as_ref)
            .map(|entry| &entry.layout)
    }

    /// Canonical reference of `handle` (empty if stale)
    pub fn reference(&self, handle: RenderHandle) -> RenderHandleReference {
        self.entry(handle)
            .map(|entry| entry.reference.clone())
            .unwrap_or_default()
    }

    /// Canonical reference of slot `index` (empty if free)
    pub fn reference_by_index(&self, index: u32) -> RenderHandleReference {
        self.entries
            .get(index as usize)
            .and_then(Option::as_ref)
            .map(|entry| entry.reference.clone())
            .unwrap_or_default()
    }

    /// Name the layout was created with
    pub fn name(&self, handle: RenderHandle) -> Option<&str> {
        self.entry(handle).map(|entry| entry.name.as_str())
    }

    /// Compare the layouts behind two handles (empty if either is stale)
    pub fn compatibility_flags(&self, lhs: RenderHandle, rhs: RenderHandle) -> CompatibilityFlags {
        match (self.get(lhs), self.get(rhs)) {
            (Some(lhs), Some(rhs)) => layout_compatibility(lhs, rhs),
            _ => CompatibilityFlags::empty(),
        }
    }

    /// Remove a layout and free its slot
    ///
    /// Returns false for stale handles.
    pub fn destroy(&mut self, handle: RenderHandle) -> bool {
        let Some(slot) = handle.slot(RenderHandleType::PipelineLayout) else {
            return false;
        };
        let Some(entry) = self.entries.get_mut(slot).and_then(Option::take) else {
            return false;
        };
        if self.name_to_index.get(&entry.name) == Some(&handle.index()) {
            self.name_to_index.remove(&entry.name);
        }
        self.slots.free(handle.index());
        true
    }

    /// Number of live layouts
    pub fn len(&self) -> usize {
        self.slots.len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn entry(&self, handle: RenderHandle) -> Option<&PipelineLayoutEntry> {
        let slot = handle.slot(RenderHandleType::PipelineLayout)?;
        self.entries.get(slot)?.as_ref()
    }

    /// Place every set at its own index, sort bindings and clamp capacities
    fn normalize(name: &str, layout: &PipelineLayout) -> PipelineLayout {
        if layout.descriptor_set_count as usize > MAX_DESCRIPTOR_SET_COUNT {
            engine_warn!(
                "prism::PipelineLayoutCache",
                "Pipeline layout '{}' declares {} descriptor sets, clamped to {}",
                name,
                layout.descriptor_set_count,
                MAX_DESCRIPTOR_SET_COUNT
            );
        }

        let mut normalized = PipelineLayout {
            push_constant: layout.push_constant,
            ..Default::default()
        };

        for set in layout.descriptor_set_layouts.iter().filter(|s| s.is_used()) {
            let target = set.set as usize;
            if target >= MAX_DESCRIPTOR_SET_COUNT {
                engine_warn!(
                    "prism::PipelineLayoutCache",
                    "Pipeline layout '{}': descriptor set {} is out of range (max {}), dropped",
                    name,
                    set.set,
                    MAX_DESCRIPTOR_SET_COUNT - 1
                );
                continue;
            }
            if normalized.descriptor_set_layouts[target].is_used() {
                engine_warn!(
                    "prism::PipelineLayoutCache",
                    "Pipeline layout '{}': descriptor set {} declared twice, keeping the first",
                    name,
                    set.set
                );
                continue;
            }
            let mut placed = DescriptorSetLayout::new(set.set, set.bindings.clone());
            placed.sort_bindings();
            normalized.descriptor_set_layouts[target] = placed;
        }

        if normalized.push_constant.byte_size > MAX_PUSH_CONSTANT_BYTE_SIZE {
            engine_warn!(
                "prism::PipelineLayoutCache",
                "Pipeline layout '{}': push constant size {} exceeds {} bytes, clamped",
                name,
                normalized.push_constant.byte_size,
                MAX_PUSH_CONSTANT_BYTE_SIZE
            );
            normalized.push_constant.byte_size = MAX_PUSH_CONSTANT_BYTE_SIZE;
        }

        normalized.descriptor_set_count = normalized.set_mask().count_ones();
        normalized
    }
}

impl Default for PipelineLayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "pipeline_layout_cache_tests.rs"]
mod tests;
