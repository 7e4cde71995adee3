/// Attachment and vertex attribute formats

/// Attachment and vertex attribute format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[allow(non_camel_case_types)]
pub enum Format {
    #[default]
    Undefined,

    // Color attachment formats
    R8G8B8A8_SRGB,
    R8G8B8A8_UNORM,
    B8G8R8A8_SRGB,
    B8G8R8A8_UNORM,
    R16G16B16A16_SFLOAT,

    // Depth/stencil formats
    D16_UNORM,
    D32_SFLOAT,
    D24_UNORM_S8_UINT,

    // Vertex attribute formats
    R32_SFLOAT,
    R32G32_SFLOAT,
    R32G32B32_SFLOAT,
    R32G32B32A32_SFLOAT,
    R32_UINT,
    R32G32_UINT,
    R32G32B32A32_UINT,
    R32_SINT,
    R8G8B8A8_SNORM,
    R16G16_SFLOAT,
}

impl Format {
    /// Size of one element in bytes (0 for `Undefined`)
    pub fn byte_size(self) -> u32 {
        match self {
            Format::Undefined => 0,
            Format::R8G8B8A8_SRGB
            | Format::R8G8B8A8_UNORM
            | Format::B8G8R8A8_SRGB
            | Format::B8G8R8A8_UNORM
            | Format::R8G8B8A8_SNORM
            | Format::R16G16_SFLOAT
            | Format::D32_SFLOAT
            | Format::D24_UNORM_S8_UINT
            | Format::R32_SFLOAT
            | Format::R32_UINT
            | Format::R32_SINT => 4,
            Format::D16_UNORM => 2,
            Format::R16G16B16A16_SFLOAT | Format::R32G32_SFLOAT | Format::R32G32_UINT => 8,
            Format::R32G32B32_SFLOAT => 12,
            Format::R32G32B32A32_SFLOAT | Format::R32G32B32A32_UINT => 16,
        }
    }

    /// Whether this is a depth (or depth/stencil) format
    pub fn is_depth(self) -> bool {
        matches!(self, Format::D16_UNORM | Format::D32_SFLOAT | Format::D24_UNORM_S8_UINT)
    }

    /// Whether this format carries a stencil aspect
    pub fn has_stencil(self) -> bool {
        matches!(self, Format::D24_UNORM_S8_UINT)
    }
}

/// Multisample count of the attachments a pipeline renders into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SampleCount {
    #[default]
    S1,
    S2,
    S4,
    S8,
}

impl SampleCount {
    /// Number of samples per pixel
    pub fn count(self) -> u32 {
        match self {
            SampleCount::S1 => 1,
            SampleCount::S2 => 2,
            SampleCount::S4 => 4,
            SampleCount::S8 => 8,
        }
    }
}
