use super::*;

// ============================================================================
// Tests: Allocation
// ============================================================================

#[test]
fn test_fresh_slots_are_dense() {
    let mut slots = SlotAllocator::new();
    let indices: Vec<u32> = (0..4).map(|_| slots.alloc()).collect();

    assert_eq!(indices, vec![0, 1, 2, 3]);
    assert_eq!(slots.len(), 4);
    assert_eq!(slots.high_water_mark(), 4);
}

#[test]
fn test_default_allocator_owns_nothing() {
    let slots = SlotAllocator::default();
    assert!(slots.is_empty());
    assert_eq!(slots.high_water_mark(), 0);
    assert!(!slots.is_live(0));
}

// ============================================================================
// Tests: Release and reuse
// ============================================================================

#[test]
fn test_released_slot_is_handed_out_again() {
    let mut slots = SlotAllocator::new();
    let shader = slots.alloc();
    let compute = slots.alloc();

    assert!(slots.free(shader));
    assert!(!slots.is_live(shader));
    assert!(slots.is_live(compute));

    // A registry reusing the slot keeps the same index
    assert_eq!(slots.alloc(), shader);
    assert_eq!(slots.high_water_mark(), 2);
}

#[test]
fn test_most_recently_released_slot_comes_first() {
    let mut slots = SlotAllocator::new();
    for _ in 0..3 {
        slots.alloc();
    }
    slots.free(0);
    slots.free(2);

    assert_eq!(slots.alloc(), 2);
    assert_eq!(slots.alloc(), 0);
    assert_eq!(slots.alloc(), 3);
}

#[test]
fn test_releasing_twice_is_rejected() {
    let mut slots = SlotAllocator::new();
    let layout = slots.alloc();
    slots.alloc();

    assert!(slots.free(layout));
    assert!(!slots.free(layout));
    assert_eq!(slots.len(), 1);

    // The free list holds the slot once
    assert_eq!(slots.alloc(), layout);
    assert_eq!(slots.alloc(), 2);
}

#[test]
fn test_releasing_unknown_slot_is_rejected() {
    let mut slots = SlotAllocator::new();
    slots.alloc();

    assert!(!slots.free(42));
    assert_eq!(slots.len(), 1);
    assert_eq!(slots.high_water_mark(), 1);
}

#[test]
fn test_high_water_mark_never_shrinks() {
    let mut slots = SlotAllocator::new();
    let a = slots.alloc();
    let b = slots.alloc();
    slots.free(b);
    slots.free(a);

    assert!(slots.is_empty());
    assert_eq!(slots.high_water_mark(), 2);
}
