//! Unit tests for handle.rs

use crate::handle::{variant_key, RenderHandle, RenderHandleReference, RenderHandleType};
use rustc_hash::FxHashSet;

// ============================================================================
// RENDER HANDLE TESTS
// ============================================================================

#[test]
fn test_invalid_handle_defaults() {
    let handle = RenderHandle::default();
    assert_eq!(handle, RenderHandle::INVALID);
    assert!(!handle.is_valid());
    assert_eq!(handle.kind(), RenderHandleType::Invalid);
}

#[test]
fn test_handle_accessors() {
    let handle = RenderHandle::new(RenderHandleType::PipelineLayout, 7).with_extra(0b101);
    assert!(handle.is_valid());
    assert_eq!(handle.kind(), RenderHandleType::PipelineLayout);
    assert_eq!(handle.index(), 7);
    assert_eq!(handle.extra(), 0b101);
}

#[test]
fn test_handle_equality_is_structural() {
    let a = RenderHandle::new(RenderHandleType::ShaderProgram, 3);
    let b = RenderHandle::new(RenderHandleType::ShaderProgram, 3);
    let c = RenderHandle::new(RenderHandleType::ComputeProgram, 3);
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_ne!(a, a.with_extra(1));
}

#[test]
fn test_slot_checks_kind() {
    let handle = RenderHandle::new(RenderHandleType::GraphicsState, 4);
    assert_eq!(handle.slot(RenderHandleType::GraphicsState), Some(4));
    assert_eq!(handle.slot(RenderHandleType::ShaderProgram), None);
    assert_eq!(RenderHandle::INVALID.slot(RenderHandleType::ShaderProgram), None);
}

#[test]
fn test_packed_ids_are_distinct_across_kinds() {
    let mut ids = FxHashSet::default();
    for kind in [
        RenderHandleType::ShaderProgram,
        RenderHandleType::ComputeProgram,
        RenderHandleType::PipelineLayout,
        RenderHandleType::GraphicsState,
        RenderHandleType::VertexInputDeclaration,
    ] {
        for index in 0..4 {
            assert!(ids.insert(RenderHandle::new(kind, index).id()));
        }
    }
}

#[test]
fn test_debug_format() {
    let handle = RenderHandle::new(RenderHandleType::ShaderProgram, 2);
    assert!(format!("{:?}", handle).contains("ShaderProgram#2"));
    assert_eq!(format!("{:?}", RenderHandle::INVALID), "RenderHandle(Invalid)");
}

// ============================================================================
// RENDER HANDLE REFERENCE TESTS
// ============================================================================

#[test]
fn test_empty_reference() {
    let reference = RenderHandleReference::empty();
    assert!(!reference.is_valid());
    assert_eq!(reference.ref_count(), 0);
    assert_eq!(reference.handle(), RenderHandle::INVALID);
}

#[test]
fn test_reference_counting_tracks_clones() {
    let canonical = RenderHandleReference::new(RenderHandle::new(RenderHandleType::ShaderProgram, 0));
    assert_eq!(canonical.ref_count(), 1);

    let clone1 = canonical.clone();
    let clone2 = clone1.clone();
    assert_eq!(canonical.ref_count(), 3);
    assert_eq!(clone2, canonical);

    drop(clone1);
    drop(clone2);
    assert_eq!(canonical.ref_count(), 1);
    // Dropping clones never invalidates the handle itself
    assert!(canonical.is_valid());
}

#[test]
fn test_with_handle_shares_token() {
    let canonical = RenderHandleReference::new(RenderHandle::new(RenderHandleType::PipelineLayout, 1));
    let refreshed = canonical.with_handle(canonical.handle().with_extra(0b11));

    assert_eq!(refreshed.handle().index(), 1);
    assert_eq!(refreshed.handle().extra(), 0b11);
    assert_eq!(canonical.ref_count(), 2);
}

// ============================================================================
// VARIANT KEY TESTS
// ============================================================================

#[test]
fn test_variant_key_combines_base_and_slot() {
    let base = RenderHandle::new(RenderHandleType::ShaderProgram, 5);
    assert_eq!(variant_key(base, 2), (5u64 << 32) | 2);
    assert_ne!(variant_key(base, 2), variant_key(base, 3));
    assert_ne!(
        variant_key(base, 2),
        variant_key(RenderHandle::new(RenderHandleType::ShaderProgram, 6), 2)
    );
}
