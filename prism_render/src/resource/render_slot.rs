/// Render slots: application-defined ids naming a rendering purpose
/// (shadow pass, forward pass, ...) that shader and graphics state variants
/// are selected by.

use rustc_hash::FxHashMap;

use crate::handle::RenderHandleReference;

/// Render slot id of entries not bound to any slot
pub const INVALID_RENDER_SLOT_ID: u32 = u32::MAX;

/// Default resources of a render slot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderSlotData {
    pub render_slot_id: u32,
    /// Default shader for the slot
    pub shader: RenderHandleReference,
    /// Default graphics state for the slot
    pub graphics_state: RenderHandleReference,
}

/// Name <-> id map of render slots, with per-slot default resources
pub struct RenderSlotRegistry {
    name_to_id: FxHashMap<String, u32>,
    slots: Vec<RenderSlotEntry>,
}

struct RenderSlotEntry {
    name: String,
    data: RenderSlotData,
}

impl RenderSlotRegistry {
    pub fn new() -> Self {
        Self {
            name_to_id: FxHashMap::default(),
            slots: Vec::new(),
        }
    }

    /// Id of the slot named `name`, created on first use
    pub fn create_render_slot_id(&mut self, name: &str) -> u32 {
        if let Some(&id) = self.name_to_id.get(name) {
            return id;
        }
        let id = self.slots.len() as u32;
        self.slots.push(RenderSlotEntry {
            name: name.to_string(),
            data: RenderSlotData {
                render_slot_id: id,
                ..Default::default()
            },
        });
        self.name_to_id.insert(name.to_string(), id);
        id
    }

    /// Id of the slot named `name` (`INVALID_RENDER_SLOT_ID` if unknown)
    pub fn render_slot_id(&self, name: &str) -> u32 {
        self.name_to_id
            .get(name)
            .copied()
            .unwrap_or(INVALID_RENDER_SLOT_ID)
    }

    /// Name of slot `id`
    pub fn render_slot_name(&self, id: u32) -> Option<&str> {
        self.slots.get(id as usize).map(|slot| slot.name.as_str())
    }

    /// Set the default resources of `data.render_slot_id`
    ///
    /// Returns false if the slot was never created.
    pub fn set_render_slot_data(&mut self, data: RenderSlotData) -> bool {
        match self.slots.get_mut(data.render_slot_id as usize) {
            Some(slot) => {
                slot.data = data;
                true
            }
            None => false,
        }
    }

    /// Default resources of slot `id`
    pub fn render_slot_data(&self, id: u32) -> Option<&RenderSlotData> {
        self.slots.get(id as usize).map(|slot| &slot.data)
    }

    /// Number of slots created
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl Default for RenderSlotRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "render_slot_tests.rs"]
mod tests;
