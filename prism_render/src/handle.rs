//! Opaque resource identities handed out by the registries
//!
//! A `RenderHandle` is a weak, copyable identity: a kind tag, a dense slot
//! index into the array owned by the registry of that kind, and an `extra`
//! word (pipeline layouts store their occupied descriptor-set bitmask there).
//! Holders never own backend objects; they re-resolve through the registry.

use std::fmt;
use std::sync::Arc;

/// Resource kind encoded in a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RenderHandleType {
    /// Graphics shader (vertex + fragment program)
    ShaderProgram,
    /// Compute shader program
    ComputeProgram,
    /// Pipeline layout (descriptor sets + push constant)
    PipelineLayout,
    /// Fixed-function graphics state
    GraphicsState,
    /// Vertex bindings and attributes
    VertexInputDeclaration,
    /// Empty handle
    Invalid,
}

/// Opaque resource identity
///
/// Equality is structural. Replacing the object stored at a slot keeps the
/// same handle, so holders transparently observe hot-reloaded resources.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderHandle {
    kind: RenderHandleType,
    index: u32,
    extra: u32,
}

impl RenderHandle {
    /// The empty handle
    pub const INVALID: RenderHandle = RenderHandle {
        kind: RenderHandleType::Invalid,
        index: u32::MAX,
        extra: 0,
    };

    pub(crate) fn new(kind: RenderHandleType, index: u32) -> Self {
        Self { kind, index, extra: 0 }
    }

    /// Copy of this handle with a different `extra` word
    pub(crate) fn with_extra(self, extra: u32) -> Self {
        Self { extra, ..self }
    }

    /// Resource kind
    pub fn kind(&self) -> RenderHandleType {
        self.kind
    }

    /// Dense slot index in the owning registry
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Auxiliary bits (occupied descriptor-set mask for pipeline layouts)
    pub fn extra(&self) -> u32 {
        self.extra
    }

    /// Whether the handle names a resource kind at all.
    ///
    /// This does not prove the slot is still live; only the owning registry can.
    pub fn is_valid(&self) -> bool {
        self.kind != RenderHandleType::Invalid
    }

    /// Packed 64-bit id: kind in the top byte, extra in the next 24 bits, index below
    pub fn id(&self) -> u64 {
        ((self.kind as u64) << 56) | (((self.extra & 0x00FF_FFFF) as u64) << 32) | self.index as u64
    }

    /// Slot index if this handle is of `kind`
    pub(crate) fn slot(&self, kind: RenderHandleType) -> Option<usize> {
        if self.kind == kind {
            Some(self.index as usize)
        } else {
            None
        }
    }
}

impl Default for RenderHandle {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Debug for RenderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "RenderHandle({:?}#{}, extra={:#x})", self.kind, self.index, self.extra)
        } else {
            write!(f, "RenderHandle(Invalid)")
        }
    }
}

/// Lifetime token shared by every clone of a `RenderHandleReference`
#[derive(Debug)]
pub struct RenderReferenceCounter;

/// A handle plus a shared lifetime token
///
/// The registry keeps one canonical reference per slot and hands out clones.
/// Dropping every clone does not destroy the resource; destruction is always
/// an explicit `destroy` call.
#[derive(Clone, Default)]
pub struct RenderHandleReference {
    handle: RenderHandle,
    counter: Option<Arc<RenderReferenceCounter>>,
}

impl RenderHandleReference {
    /// Create the canonical reference for a freshly allocated slot
    pub(crate) fn new(handle: RenderHandle) -> Self {
        Self {
            handle,
            counter: Some(Arc::new(RenderReferenceCounter)),
        }
    }

    /// Empty reference (lookup misses, failed creations)
    pub fn empty() -> Self {
        Self::default()
    }

    /// The referenced handle (`RenderHandle::INVALID` when empty)
    pub fn handle(&self) -> RenderHandle {
        self.handle
    }

    /// Whether this reference carries a valid handle
    pub fn is_valid(&self) -> bool {
        self.handle.is_valid() && self.counter.is_some()
    }

    /// Number of live clones sharing this reference's token (0 when empty)
    pub fn ref_count(&self) -> usize {
        self.counter.as_ref().map(Arc::strong_count).unwrap_or(0)
    }

    /// Same token, `extra` word refreshed (pipeline layout hot reload)
    pub(crate) fn with_handle(&self, handle: RenderHandle) -> Self {
        Self {
            handle,
            counter: self.counter.clone(),
        }
    }
}

impl PartialEq for RenderHandleReference {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl Eq for RenderHandleReference {}

impl fmt::Debug for RenderHandleReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderHandleReference")
            .field("handle", &self.handle)
            .field("ref_count", &self.ref_count())
            .finish()
    }
}

/// Composite `(base handle, render slot)` key used by the variant tables
pub fn variant_key(base: RenderHandle, render_slot_id: u32) -> u64 {
    ((base.index() as u64) << 32) | render_slot_id as u64
}

#[cfg(test)]
#[path = "handle_tests.rs"]
mod tests;
