/// `(base handle, render slot) -> variant slot` links shared by the shader
/// registry and the graphics state cache

use rustc_hash::FxHashMap;

use crate::handle::{variant_key, RenderHandle};
use crate::resource::render_slot::INVALID_RENDER_SLOT_ID;

#[derive(Default)]
pub(crate) struct VariantTable {
    links: FxHashMap<u64, u32>,
}

impl VariantTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register `variant_index` as the variant of `base` for `render_slot_id`
    ///
    /// The base is also registered under its own render slot so resolution
    /// from any variant back to the base works. Linking a variant under the
    /// base's own slot is a no-op: the base keeps that slot.
    pub(crate) fn link(
        &mut self,
        base: RenderHandle,
        base_render_slot_id: u32,
        variant_index: u32,
        render_slot_id: u32,
    ) {
        if base_render_slot_id != INVALID_RENDER_SLOT_ID {
            self.links
                .entry(variant_key(base, base_render_slot_id))
                .or_insert(base.index());
        }
        if render_slot_id == INVALID_RENDER_SLOT_ID || render_slot_id == base_render_slot_id {
            return;
        }
        self.links.insert(variant_key(base, render_slot_id), variant_index);
    }

    /// Slot index registered for `(base, render_slot_id)`
    pub(crate) fn resolve(&self, base: RenderHandle, render_slot_id: u32) -> Option<u32> {
        self.links.get(&variant_key(base, render_slot_id)).copied()
    }

    /// Drop every link that resolves to `index` as a variant (before relinking a replaced entry)
    pub(crate) fn unlink_variant(&mut self, index: u32) {
        self.links
            .retain(|&key, &mut value| value != index || (key >> 32) as u32 == index);
    }

    /// Move the self-link of `base` from `old_render_slot_id` to `new_render_slot_id`
    ///
    /// Called when a base is re-created in place under another render slot.
    /// The self-link is only re-registered while variants still point at the
    /// base.
    pub(crate) fn move_base(&mut self, base: RenderHandle, old_render_slot_id: u32, new_render_slot_id: u32) {
        if old_render_slot_id == new_render_slot_id {
            return;
        }
        let index = base.index();
        let old_key = variant_key(base, old_render_slot_id);
        if self.links.get(&old_key) == Some(&index) {
            self.links.remove(&old_key);
        }
        let has_variants = self
            .links
            .iter()
            .any(|(&key, &value)| (key >> 32) as u32 == index && value != index);
        if has_variants && new_render_slot_id != INVALID_RENDER_SLOT_ID {
            self.links.insert(variant_key(base, new_render_slot_id), index);
        }
    }

    /// Drop every link that involves `index`, as a base or as a variant
    pub(crate) fn remove(&mut self, index: u32) {
        self.links
            .retain(|&key, &mut value| value != index && (key >> 32) as u32 != index);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.links.len()
    }
}

/// Full name of a variant entry: `path#variant`, or `path` when `variant` is empty
pub fn full_name(path: &str, variant: &str) -> String {
    if variant.is_empty() {
        path.to_string()
    } else {
        format!("{}#{}", path, variant)
    }
}

#[cfg(test)]
#[path = "variant_table_tests.rs"]
mod tests;
