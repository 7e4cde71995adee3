/// Pipeline layout description: descriptor-set layouts and the push constant range

use bitflags::bitflags;

use crate::engine_warn;

/// Maximum number of descriptor sets in a pipeline layout
pub const MAX_DESCRIPTOR_SET_COUNT: usize = 4;

/// Maximum push constant range size in bytes
pub const MAX_PUSH_CONSTANT_BYTE_SIZE: u32 = 128;

/// Set index marking an unused descriptor-set slot
pub const INVALID_SET: u32 = u32::MAX;

bitflags! {
    /// Shader stages that can access a resource
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ShaderStageFlags: u32 {
        const VERTEX = 0b0001;
        const FRAGMENT = 0b0010;
        const COMPUTE = 0b0100;
        const ALL_GRAPHICS = Self::VERTEX.bits() | Self::FRAGMENT.bits();
    }
}

/// Descriptor type of a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorType {
    Sampler,
    CombinedImageSampler,
    SampledImage,
    StorageImage,
    UniformTexelBuffer,
    StorageTexelBuffer,
    UniformBuffer,
    StorageBuffer,
    UniformBufferDynamic,
    StorageBufferDynamic,
    InputAttachment,
    AccelerationStructure,
}

impl DescriptorType {
    /// Whether two descriptor types can be bound through the same layout slot.
    ///
    /// Dynamic and non-dynamic uniform (resp. storage) buffers are interchangeable.
    pub fn is_compatible_with(self, other: DescriptorType) -> bool {
        self == other || (self.buffer_class().is_some() && self.buffer_class() == other.buffer_class())
    }

    fn buffer_class(self) -> Option<u8> {
        match self {
            DescriptorType::UniformBuffer | DescriptorType::UniformBufferDynamic => Some(0),
            DescriptorType::StorageBuffer | DescriptorType::StorageBufferDynamic => Some(1),
            _ => None,
        }
    }
}

/// A single binding in a descriptor set layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorSetLayoutBinding {
    /// Binding index inside the set
    pub binding: u32,
    /// Descriptor type
    pub descriptor_type: DescriptorType,
    /// Array element count
    pub descriptor_count: u32,
    /// Stages that access the binding
    pub shader_stage_flags: ShaderStageFlags,
}

/// Descriptor set layout: a set index and its bindings (sorted by binding index once cached)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DescriptorSetLayout {
    /// Set index, `INVALID_SET` when the slot is unused
    pub set: u32,
    /// Bindings of this set
    pub bindings: Vec<DescriptorSetLayoutBinding>,
}

impl DescriptorSetLayout {
    /// Layout for `set` with the given bindings
    pub fn new(set: u32, bindings: Vec<DescriptorSetLayoutBinding>) -> Self {
        Self { set, bindings }
    }

    /// Whether this slot holds a set
    pub fn is_used(&self) -> bool {
        self.set != INVALID_SET
    }

    /// Binding with index `binding`
    pub fn binding(&self, binding: u32) -> Option<&DescriptorSetLayoutBinding> {
        self.bindings.iter().find(|b| b.binding == binding)
    }

    pub(crate) fn sort_bindings(&mut self) {
        self.bindings.sort_by_key(|b| b.binding);
    }
}

impl Default for DescriptorSetLayout {
    fn default() -> Self {
        Self {
            set: INVALID_SET,
            bindings: Vec::new(),
        }
    }
}

/// Push constant range (always starting at offset 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PushConstant {
    /// Stages that read the push constants
    pub shader_stage_flags: ShaderStageFlags,
    /// Size in bytes
    pub byte_size: u32,
}

/// Pipeline layout: up to `MAX_DESCRIPTOR_SET_COUNT` sets plus one push constant range.
///
/// Cached layouts keep set `n` at `descriptor_set_layouts[n]`, so lookups by set
/// index are direct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PipelineLayout {
    /// Number of used descriptor-set slots
    pub descriptor_set_count: u32,
    /// Descriptor set layouts
    pub descriptor_set_layouts: [DescriptorSetLayout; MAX_DESCRIPTOR_SET_COUNT],
    /// Push constant range (byte_size 0 = none)
    pub push_constant: PushConstant,
}

impl PipelineLayout {
    /// Build a layout from an unordered list of sets
    ///
    /// Sets land in the slot matching their set index. A set index past
    /// `MAX_DESCRIPTOR_SET_COUNT` and a second declaration of the same set are
    /// dropped with a warning; the first declaration wins.
    pub fn from_sets(sets: Vec<DescriptorSetLayout>, push_constant: PushConstant) -> Self {
        let mut layout = PipelineLayout {
            push_constant,
            ..Default::default()
        };
        for set in sets {
            let Some(slot) = layout.descriptor_set_layouts.get_mut(set.set as usize) else {
                engine_warn!(
                    "prism::PipelineLayout",
                    "Descriptor set {} with {} bindings is out of range (max {}), dropped",
                    set.set,
                    set.bindings.len(),
                    MAX_DESCRIPTOR_SET_COUNT - 1
                );
                continue;
            };
            if slot.is_used() {
                engine_warn!(
                    "prism::PipelineLayout",
                    "Descriptor set {} declared twice, keeping the first",
                    set.set
                );
                continue;
            }
            *slot = set;
        }
        layout.descriptor_set_count = layout.used_set_count();
        layout
    }

    /// Bitmask of occupied descriptor-set slots (bit n = set n)
    pub fn set_mask(&self) -> u32 {
        self.descriptor_set_layouts
            .iter()
            .enumerate()
            .filter(|(_, set)| set.is_used())
            .fold(0, |mask, (index, _)| mask | (1 << index))
    }

    /// Layout of set `set`, if used
    pub fn set(&self, set: u32) -> Option<&DescriptorSetLayout> {
        self.descriptor_set_layouts
            .get(set as usize)
            .filter(|layout| layout.is_used())
    }

    fn used_set_count(&self) -> u32 {
        self.descriptor_set_layouts.iter().filter(|s| s.is_used()).count() as u32
    }
}

#[cfg(test)]
#[path = "layout_tests.rs"]
mod tests;
