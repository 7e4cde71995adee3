use super::*;
use crate::handle::{RenderHandle, RenderHandleType};

#[test]
fn test_create_is_idempotent() {
    let mut registry = RenderSlotRegistry::new();
    let opaque = registry.create_render_slot_id("OPAQUE");
    let shadow = registry.create_render_slot_id("SHADOW");

    assert_ne!(opaque, shadow);
    assert_eq!(registry.create_render_slot_id("OPAQUE"), opaque);
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_lookup_by_name_and_id() {
    let mut registry = RenderSlotRegistry::new();
    let id = registry.create_render_slot_id("DEPTH_PREPASS");

    assert_eq!(registry.render_slot_id("DEPTH_PREPASS"), id);
    assert_eq!(registry.render_slot_name(id), Some("DEPTH_PREPASS"));
    assert_eq!(registry.render_slot_id("UNKNOWN"), INVALID_RENDER_SLOT_ID);
    assert_eq!(registry.render_slot_name(99), None);
}

#[test]
fn test_slot_data_defaults_to_empty_references() {
    let mut registry = RenderSlotRegistry::new();
    let id = registry.create_render_slot_id("OPAQUE");

    let data = registry.render_slot_data(id).unwrap();
    assert_eq!(data.render_slot_id, id);
    assert!(!data.shader.is_valid());
    assert!(!data.graphics_state.is_valid());
}

#[test]
fn test_set_slot_data() {
    let mut registry = RenderSlotRegistry::new();
    let id = registry.create_render_slot_id("OPAQUE");
    let shader = RenderHandleReference::new(RenderHandle::new(RenderHandleType::ShaderProgram, 4));

    assert!(registry.set_render_slot_data(RenderSlotData {
        render_slot_id: id,
        shader: shader.clone(),
        graphics_state: RenderHandleReference::empty(),
    }));

    assert_eq!(registry.render_slot_data(id).unwrap().shader, shader);
}

#[test]
fn test_set_data_for_unknown_slot_fails() {
    let mut registry = RenderSlotRegistry::new();
    assert!(!registry.set_render_slot_data(RenderSlotData {
        render_slot_id: 3,
        ..Default::default()
    }));
}
