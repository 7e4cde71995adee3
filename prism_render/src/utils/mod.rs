//! Small shared building blocks for the registries

pub mod slot_allocator;

pub use slot_allocator::SlotAllocator;
