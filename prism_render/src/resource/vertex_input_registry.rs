/// Name-addressable registry of vertex input declarations

use rustc_hash::FxHashMap;

use crate::engine_warn;
use crate::handle::{RenderHandle, RenderHandleReference, RenderHandleType};
use crate::pipeline_state::{
    VertexInputDeclaration, MAX_VERTEX_INPUT_ATTRIBUTE_COUNT, MAX_VERTEX_INPUT_BINDING_COUNT,
};
use crate::utils::SlotAllocator;

struct VertexInputEntry {
    name: String,
    reference: RenderHandleReference,
    declaration: VertexInputDeclaration,
}

/// Vertex input declaration registry
pub struct VertexInputDeclarationRegistry {
    slots: SlotAllocator,
    entries: Vec<Option<VertexInputEntry>>,
    name_to_index: FxHashMap<String, u32>,
}

impl VertexInputDeclarationRegistry {
    pub fn new() -> Self {
        Self {
            slots: SlotAllocator::new(),
            entries: Vec::new(),
            name_to_index: FxHashMap::default(),
        }
    }

    /// Create a declaration, or overwrite the one named `name` in place
    ///
    /// Bindings and attributes beyond the fixed maxima are dropped with a warning.
    pub fn create(&mut self, name: &str, declaration: &VertexInputDeclaration) -> RenderHandleReference {
        let declaration = Self::clamp(name, declaration);

        if let Some(&index) = self.name_to_index.get(name) {
            if let Some(Some(entry)) = self.entries.get_mut(index as usize) {
                entry.declaration = declaration;
                return entry.reference.clone();
            }
        }

        let index = self.slots.alloc();
        let reference = RenderHandleReference::new(RenderHandle::new(
            RenderHandleType::VertexInputDeclaration,
            index,
        ));
        let slot = index as usize;
        if slot >= self.entries.len() {
            self.entries.resize_with(slot + 1, || None);
        }
        self.entries[slot] = Some(VertexInputEntry {
            name: name.to_string(),
            reference: reference.clone(),
            declaration,
        });
        if !name.is_empty() {
            self.name_to_index.insert(name.to_string(), index);
        }
        reference
    }

    /// Handle of the declaration named `name`
    pub fn handle_by_name(&self, name: &str) -> RenderHandleReference {
        self.name_to_index
            .get(name)
            .map(|&index| self.reference_by_index(index))
            .unwrap_or_default()
    }

    /// Declaration behind `handle`
    pub fn get(&self, handle: RenderHandle) -> Option<&VertexInputDeclaration> {
        let slot = handle.slot(RenderHandleType::VertexInputDeclaration)?;
        self.entries
            .get(slot)?
            .as_ref()
            .map(|entry| &entry.declaration)
    }

    /// Canonical reference of slot `index`
    pub fn reference_by_index(&self, index: u32) -> RenderHandleReference {
        self.entries
            .get(index as usize)
            .and_then(Option::as_ref)
            .map(|entry| entry.reference.clone())
            .unwrap_or_default()
    }

    /// Remove a declaration and free its slot
    pub fn destroy(&mut self, handle: RenderHandle) -> bool {
        let Some(slot) = handle.slot(RenderHandleType::VertexInputDeclaration) else {
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

    /// Number of live declarations
    pub fn len(&self) -> usize {
        self.slots.len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn clamp(name: &str, declaration: &VertexInputDeclaration) -> VertexInputDeclaration {
        let mut clamped = declaration.clone();
        if clamped.bindings.len() > MAX_VERTEX_INPUT_BINDING_COUNT {
            engine_warn!(
                "prism::VertexInputDeclarationRegistry",
                "Vertex input declaration '{}' has {} bindings, clamped to {}",
                name,
                clamped.bindings.len(),
                MAX_VERTEX_INPUT_BINDING_COUNT
            );
            clamped.bindings.truncate(MAX_VERTEX_INPUT_BINDING_COUNT);
        }
        if clamped.attributes.len() > MAX_VERTEX_INPUT_ATTRIBUTE_COUNT {
            engine_warn!(
                "prism::VertexInputDeclarationRegistry",
                "Vertex input declaration '{}' has {} attributes, clamped to {}",
                name,
                clamped.attributes.len(),
                MAX_VERTEX_INPUT_ATTRIBUTE_COUNT
            );
            clamped.attributes.truncate(MAX_VERTEX_INPUT_ATTRIBUTE_COUNT);
        }
        clamped
    }
}

impl Default for VertexInputDeclarationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "vertex_input_registry_tests.rs"]
mod tests;
