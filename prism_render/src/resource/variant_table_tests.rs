use super::*;
use crate::handle::RenderHandleType;

fn shader(index: u32) -> RenderHandle {
    RenderHandle::new(RenderHandleType::ShaderProgram, index)
}

#[test]
fn test_link_registers_variant_and_base() {
    let mut table = VariantTable::new();
    table.link(shader(0), 1, 5, 2);

    assert_eq!(table.resolve(shader(0), 2), Some(5));
    assert_eq!(table.resolve(shader(0), 1), Some(0));
    assert_eq!(table.len(), 2);
}

#[test]
fn test_link_on_base_slot_is_noop() {
    let mut table = VariantTable::new();
    table.link(shader(0), 3, 7, 3);

    assert_eq!(table.resolve(shader(0), 3), Some(0));
    assert_eq!(table.len(), 1);
}

#[test]
fn test_invalid_render_slot_is_not_linked() {
    let mut table = VariantTable::new();
    table.link(shader(0), INVALID_RENDER_SLOT_ID, 4, INVALID_RENDER_SLOT_ID);
    assert_eq!(table.len(), 0);
}

#[test]
fn test_unlink_variant_keeps_base_self_link() {
    let mut table = VariantTable::new();
    table.link(shader(0), 1, 5, 2);
    table.link(shader(5), 2, 6, 4);

    table.unlink_variant(5);

    assert_eq!(table.resolve(shader(0), 2), None);
    assert_eq!(table.resolve(shader(0), 1), Some(0));
    // 5 is still the base of 6
    assert_eq!(table.resolve(shader(5), 2), Some(5));
    assert_eq!(table.resolve(shader(5), 4), Some(6));
}

#[test]
fn test_remove_drops_base_and_variant_links() {
    let mut table = VariantTable::new();
    table.link(shader(0), 1, 5, 2);
    table.link(shader(0), 1, 6, 3);

    table.remove(0);

    assert_eq!(table.len(), 0);
}

#[test]
fn test_full_name() {
    assert_eq!(full_name("grass.shader", ""), "grass.shader");
    assert_eq!(full_name("grass.shader", "wind"), "grass.shader#wind");
}

#[test]
fn test_move_base_follows_new_render_slot() {
    let mut table = VariantTable::new();
    table.link(shader(0), 1, 5, 2);

    table.move_base(shader(0), 1, 7);

    assert_eq!(table.resolve(shader(0), 1), None);
    assert_eq!(table.resolve(shader(0), 7), Some(0));
    assert_eq!(table.resolve(shader(0), 2), Some(5));
}

#[test]
fn test_move_base_without_variants_drops_self_link() {
    let mut table = VariantTable::new();
    table.link(shader(0), 1, 5, 1);
    assert_eq!(table.len(), 1);

    table.move_base(shader(0), 1, 7);

    assert_eq!(table.len(), 0);
}
