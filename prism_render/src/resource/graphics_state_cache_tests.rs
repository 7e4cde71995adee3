/// Tests for GraphicsStateCache and hash_graphics_state

use super::*;
use crate::log;
use crate::pipeline_state::{
    BlendFactor, ColorBlendAttachmentState, CompareOp, CullMode, DepthBias, DynamicStateFlags,
    PolygonMode, PrimitiveTopology, StencilOp,
};
use crate::test_utils::CaptureLogger;
use serial_test::serial;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn opaque() -> GraphicsState {
    GraphicsState::default()
}

fn transparent() -> GraphicsState {
    let mut state = GraphicsState::default();
    state.depth_stencil_state.enable_depth_write = false;
    state.color_blend_state.color_attachments = vec![ColorBlendAttachmentState::alpha_blend()];
    state
}

fn variant(render_slot_id: u32, name: &str, base: &str) -> GraphicsStateVariantDesc {
    GraphicsStateVariantDesc {
        render_slot_id,
        variant: name.to_string(),
        base_state: base.to_string(),
        base_variant: String::new(),
    }
}

// ============================================================================
// Tests: hash_graphics_state
// ============================================================================

#[test]
fn test_hash_is_deterministic() {
    assert_eq!(hash_graphics_state(&opaque()), hash_graphics_state(&opaque()));
}

#[test]
fn test_hash_ignores_excluded_fields() {
    let base = opaque();
    let mut tweaked = opaque();
    tweaked.rasterization_state.line_width = 3.5;
    tweaked.color_blend_state.blend_constants = [0.25, 0.5, 0.75, 1.0];
    tweaked.depth_stencil_state.min_depth_bounds = 0.1;
    tweaked.depth_stencil_state.max_depth_bounds = 0.9;

    assert_eq!(hash_graphics_state(&base), hash_graphics_state(&tweaked));
}

#[test]
fn test_hash_ignores_depth_bias_factors_but_not_enable() {
    let mut a = opaque();
    a.rasterization_state.depth_bias = Some(DepthBias {
        constant_factor: 1.0,
        slope_factor: 1.0,
        clamp: 0.0,
    });
    let mut b = a.clone();
    b.rasterization_state.depth_bias = Some(DepthBias {
        constant_factor: 4.0,
        slope_factor: 2.0,
        clamp: 0.5,
    });

    assert_eq!(hash_graphics_state(&a), hash_graphics_state(&b));
    assert_ne!(hash_graphics_state(&a), hash_graphics_state(&opaque()));
}

#[test]
fn test_hash_differs_on_cull_mode() {
    let mut front = opaque();
    front.rasterization_state.cull_mode = CullMode::Front;
    let mut none = opaque();
    none.rasterization_state.cull_mode = CullMode::None;

    let back_hash = hash_graphics_state(&opaque());
    assert_ne!(back_hash, hash_graphics_state(&front));
    assert_ne!(back_hash, hash_graphics_state(&none));
    assert_ne!(hash_graphics_state(&front), hash_graphics_state(&none));
}

#[test]
fn test_sub_states_occupy_disjoint_bit_ranges() {
    let base = hash_graphics_state(&opaque());

    let mut topology = opaque();
    topology.input_assembly.primitive_topology = PrimitiveTopology::LineList;
    assert_eq!((base ^ hash_graphics_state(&topology)) & !0x1F, 0);

    let mut polygon = opaque();
    polygon.rasterization_state.polygon_mode = PolygonMode::Line;
    assert_eq!((base ^ hash_graphics_state(&polygon)) & !(0x7FF << 5), 0);

    let mut depth = opaque();
    depth.depth_stencil_state.depth_compare_op = CompareOp::GreaterOrEqual;
    assert_eq!((base ^ hash_graphics_state(&depth)) & !(0xFFFF << 16), 0);

    let mut dynamic = opaque();
    dynamic.dynamic_state_flags = DynamicStateFlags::VIEWPORT | DynamicStateFlags::SCISSOR;
    assert_eq!((base ^ hash_graphics_state(&dynamic)) & !(0xFFFF << 32), 0);
    assert_ne!(base, hash_graphics_state(&dynamic));
}

#[test]
fn test_hash_differs_on_blend() {
    assert_ne!(hash_graphics_state(&opaque()), hash_graphics_state(&transparent()));
}

#[test]
fn test_stencil_ops_only_count_when_enabled() {
    let mut a = opaque();
    a.depth_stencil_state.front_stencil_op_state.pass_op = StencilOp::Replace;
    assert_eq!(hash_graphics_state(&a), hash_graphics_state(&opaque()));

    a.depth_stencil_state.enable_stencil_test = true;
    assert_ne!(hash_graphics_state(&a), hash_graphics_state(&opaque()));
}

// ============================================================================
// Tests: Create and lookup
// ============================================================================

#[test]
fn test_create_and_lookup_by_name_and_hash() {
    let mut cache = GraphicsStateCache::new();
    let created = cache.create("opaque.state", &opaque(), None);

    assert_eq!(created.handle().kind(), RenderHandleType::GraphicsState);
    assert_eq!(cache.handle_by_name("opaque.state"), created);
    assert_eq!(cache.handle_by_hash(hash_graphics_state(&opaque())), created);
    assert_eq!(cache.get(created.handle()), Some(&opaque()));
    assert_eq!(cache.hash(created.handle()), Some(hash_graphics_state(&opaque())));
}

#[test]
fn test_unnamed_state_deduplicates_by_hash() {
    let mut cache = GraphicsStateCache::new();
    let first = cache.create("", &transparent(), None);
    let second = cache.create("", &transparent(), None);

    assert_eq!(first.handle(), second.handle());
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_stencil_reference_keeps_unnamed_states_apart() {
    let mut masked = opaque();
    masked.depth_stencil_state.enable_stencil_test = true;
    let mut outlined = masked.clone();
    outlined.depth_stencil_state.front_stencil_op_state.reference = 8;

    let mut cache = GraphicsStateCache::new();
    let a = cache.create("", &masked, None);
    let b = cache.create("", &outlined, None);

    assert_ne!(hash_graphics_state(&masked), hash_graphics_state(&outlined));
    assert_ne!(a.handle(), b.handle());
    assert_eq!(cache.get(b.handle()).unwrap().depth_stencil_state.front_stencil_op_state.reference, 8);
}

#[test]
#[serial]
fn test_unnamed_hash_collision_is_stored_separately() {
    let (logger, entries) = CaptureLogger::new();
    log::set_logger(logger);

    // Line width is not hashed, so both states share a hash
    let mut wide = opaque();
    wide.rasterization_state.line_width = 4.0;
    assert_eq!(hash_graphics_state(&wide), hash_graphics_state(&opaque()));

    let mut cache = GraphicsStateCache::new();
    let thin = cache.create("", &opaque(), None);
    let thick = cache.create("", &wide, None);

    assert_ne!(thin.handle(), thick.handle());
    assert_eq!(cache.get(thick.handle()), Some(&wide));
    assert_eq!(cache.handle_by_hash(hash_graphics_state(&wide)), thin);
    assert_eq!(cache.len(), 2);
    let warnings = CaptureLogger::from_source(&entries, "prism::GraphicsStateCache");
    assert_eq!(warnings.len(), 1);

    // The equal state still deduplicates onto the first entry
    assert_eq!(cache.create("", &opaque(), None), thin);

    log::reset_logger();
}

#[test]
fn test_named_states_with_same_content_get_own_slots() {
    let mut cache = GraphicsStateCache::new();
    let a = cache.create("a.state", &opaque(), None);
    let b = cache.create("b.state", &opaque(), None);

    assert_ne!(a.handle(), b.handle());
    // Hash lookup keeps returning the first registration
    assert_eq!(cache.handle_by_hash(hash_graphics_state(&opaque())), a);
}

#[test]
fn test_recreate_same_name_replaces_in_place() {
    let mut cache = GraphicsStateCache::new();
    let first = cache.create("mat.state", &opaque(), None);
    let second = cache.create("mat.state", &transparent(), None);

    assert_eq!(first.handle(), second.handle());
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get(first.handle()), Some(&transparent()));
    assert!(!cache.handle_by_hash(hash_graphics_state(&opaque())).is_valid());
    assert_eq!(cache.handle_by_hash(hash_graphics_state(&transparent())), first);
}

#[test]
fn test_missing_lookups_are_empty() {
    let cache = GraphicsStateCache::new();
    assert!(!cache.handle_by_name("nope").is_valid());
    assert!(!cache.handle_by_hash(42).is_valid());
    assert!(cache.get(RenderHandle::INVALID).is_none());
}

// ============================================================================
// Tests: Variants
// ============================================================================

#[test]
fn test_variant_resolution_by_render_slot() {
    let mut cache = GraphicsStateCache::new();
    let base = cache.create("mat.state", &opaque(), Some(&variant(1, "", "")));
    let shadow = cache.create("mat.state", &transparent(), Some(&variant(2, "shadow", "mat.state")));

    assert_eq!(cache.handle_by_name_variant("mat.state", "shadow"), shadow);
    assert_eq!(cache.base_handle(shadow.handle()), Some(base.handle()));
    assert_eq!(cache.render_slot_id(shadow.handle()), Some(2));

    assert_eq!(cache.variant_handle(base.handle(), 2), shadow);
    assert_eq!(cache.variant_handle(shadow.handle(), 1), base);
    assert_eq!(cache.variant_handle(base.handle(), 1), base);
    assert!(!cache.variant_handle(base.handle(), 7).is_valid());
}

#[test]
fn test_base_recreated_in_another_slot_moves_its_link() {
    let mut cache = GraphicsStateCache::new();
    let base = cache.create("mat.state", &opaque(), Some(&variant(1, "", "")));
    let shadow = cache.create("mat.state", &transparent(), Some(&variant(2, "shadow", "mat.state")));

    let moved = cache.create("mat.state", &opaque(), Some(&variant(5, "", "")));
    assert_eq!(moved, base);

    assert_eq!(cache.variant_handle(shadow.handle(), 5), base);
    assert!(!cache.variant_handle(shadow.handle(), 1).is_valid());
    assert_eq!(cache.variant_handle(base.handle(), 2), shadow);
}

#[test]
#[serial]
fn test_variant_with_missing_base_is_created_without_link() {
    let (logger, entries) = CaptureLogger::new();
    log::set_logger(logger);

    let mut cache = GraphicsStateCache::new();
    let orphan = cache.create("mat.state", &opaque(), Some(&variant(2, "shadow", "missing.state")));

    assert!(orphan.is_valid());
    assert_eq!(cache.base_handle(orphan.handle()), None);
    let warnings = CaptureLogger::from_source(&entries, "prism::GraphicsStateCache");
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("missing.state"));

    log::reset_logger();
}

#[test]
#[serial]
fn test_too_many_color_attachments_warns() {
    let (logger, entries) = CaptureLogger::new();
    log::set_logger(logger);

    let mut cache = GraphicsStateCache::new();
    let mut state = opaque();
    state.color_blend_state.color_attachments = vec![ColorBlendAttachmentState::default(); 10];
    let mut trimmed = opaque();
    trimmed.color_blend_state.color_attachments = vec![ColorBlendAttachmentState::default(); 8];

    let handle = cache.create("mrt.state", &state, None);

    assert_eq!(cache.hash(handle.handle()), Some(hash_graphics_state(&trimmed)));
    assert_eq!(CaptureLogger::from_source(&entries, "prism::GraphicsStateCache").len(), 1);

    log::reset_logger();
}

// ============================================================================
// Tests: Destroy
// ============================================================================

#[test]
fn test_destroy_removes_name_hash_and_links() {
    let mut cache = GraphicsStateCache::new();
    let base = cache.create("mat.state", &opaque(), Some(&variant(1, "", "")));
    let shadow = cache.create("mat.state", &transparent(), Some(&variant(2, "shadow", "mat.state")));

    assert!(cache.destroy(shadow.handle()));

    assert!(!cache.handle_by_name_variant("mat.state", "shadow").is_valid());
    assert!(!cache.handle_by_hash(hash_graphics_state(&transparent())).is_valid());
    assert!(!cache.variant_handle(base.handle(), 2).is_valid());
    assert!(!cache.destroy(shadow.handle()));
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_destroying_base_unlinks_its_variants() {
    let mut cache = GraphicsStateCache::new();
    let base = cache.create("mat.state", &opaque(), Some(&variant(1, "", "")));
    let shadow = cache.create("mat.state", &transparent(), Some(&variant(2, "shadow", "mat.state")));

    assert!(cache.destroy(base.handle()));
    assert_eq!(cache.base_handle(shadow.handle()), None);

    // A new state in the recycled slot is not reachable from the old variant
    let reused = cache.create("other.state", &opaque(), Some(&variant(1, "", "")));
    assert_eq!(reused.handle(), base.handle());
    assert!(!cache.variant_handle(shadow.handle(), 1).is_valid());
    assert_eq!(cache.variant_handle(shadow.handle(), 2), shadow);
}

#[test]
fn test_blend_factor_change_changes_hash() {
    let mut a = transparent();
    a.color_blend_state.color_attachments[0].src_color_blend_factor = BlendFactor::One;
    assert_ne!(hash_graphics_state(&a), hash_graphics_state(&transparent()));
}
