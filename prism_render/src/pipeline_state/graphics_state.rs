/// Fixed-function graphics state (input assembly, rasterization, depth/stencil, blending)

use bitflags::bitflags;

/// Maximum number of color attachments with blend state
pub const MAX_COLOR_ATTACHMENT_COUNT: usize = 8;

// ===== INPUT ASSEMBLY ENUMS =====

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    LineStrip,
    TriangleList,
    TriangleStrip,
    TriangleFan,
    LineListWithAdjacency,
    LineStripWithAdjacency,
    TriangleListWithAdjacency,
    TriangleStripWithAdjacency,
    PatchList,
}

// ===== RASTERIZATION ENUMS =====

/// Which faces the rasterizer discards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullMode {
    None,
    Front,
    Back,
    /// Cull every face
    FrontAndBack,
}

/// Front face winding order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrontFace {
    CounterClockwise,
    Clockwise,
}

/// How polygons are filled (fill, wireframe, points)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolygonMode {
    Fill,
    /// Edges only (wireframe)
    Line,
    /// Vertices only
    Point,
}

// ===== DEPTH/STENCIL ENUMS =====

/// Comparison operator for depth and stencil tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    Always,
}

/// Stencil operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    IncrementAndClamp,
    DecrementAndClamp,
    Invert,
    IncrementAndWrap,
    DecrementAndWrap,
}

// ===== COLOR BLEND ENUMS =====

/// Blend factor for color blending equations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    ConstantColor,
    OneMinusConstantColor,
    ConstantAlpha,
    OneMinusConstantAlpha,
    SrcAlphaSaturate,
}

/// Blend operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendOp {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

/// Framebuffer logic operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicOp {
    Clear,
    And,
    AndReverse,
    Copy,
    AndInverted,
    NoOp,
    Xor,
    Or,
    Nor,
    Equivalent,
    Invert,
    OrReverse,
    CopyInverted,
    OrInverted,
    Nand,
    Set,
}

bitflags! {
    /// Color channel write mask
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ColorComponentFlags: u32 {
        const R = 0b0001;
        const G = 0b0010;
        const B = 0b0100;
        const A = 0b1000;
    }
}

impl Default for ColorComponentFlags {
    fn default() -> Self {
        Self::all()
    }
}

bitflags! {
    /// Pipeline state that is set on the command buffer instead of baked in
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DynamicStateFlags: u32 {
        const VIEWPORT = 1 << 0;
        const SCISSOR = 1 << 1;
        const LINE_WIDTH = 1 << 2;
        const DEPTH_BIAS = 1 << 3;
        const BLEND_CONSTANTS = 1 << 4;
        const DEPTH_BOUNDS = 1 << 5;
        const STENCIL_COMPARE_MASK = 1 << 6;
        const STENCIL_WRITE_MASK = 1 << 7;
        const STENCIL_REFERENCE = 1 << 8;
    }
}

// ===== INPUT ASSEMBLY STATE =====

/// Input assembly state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputAssembly {
    pub primitive_topology: PrimitiveTopology,
    pub enable_primitive_restart: bool,
}

impl Default for InputAssembly {
    fn default() -> Self {
        Self {
            primitive_topology: PrimitiveTopology::TriangleList,
            enable_primitive_restart: false,
        }
    }
}

// ===== RASTERIZATION STATE =====

/// Depth bias parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthBias {
    pub constant_factor: f32,
    pub slope_factor: f32,
    pub clamp: f32,
}

/// Rasterization fixed-function state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterizationState {
    pub enable_depth_clamp: bool,
    pub enable_rasterizer_discard: bool,
    pub polygon_mode: PolygonMode,
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
    /// Depth bias (None = disabled)
    pub depth_bias: Option<DepthBias>,
    /// Not part of the state hash
    pub line_width: f32,
}

impl Default for RasterizationState {
    fn default() -> Self {
        Self {
            enable_depth_clamp: false,
            enable_rasterizer_discard: false,
            polygon_mode: PolygonMode::Fill,
            cull_mode: CullMode::Back,
            front_face: FrontFace::CounterClockwise,
            depth_bias: None,
            line_width: 1.0,
        }
    }
}

// ===== DEPTH/STENCIL STATE =====

/// Stencil operation state (per-face)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilOpState {
    pub fail_op: StencilOp,
    pub pass_op: StencilOp,
    pub depth_fail_op: StencilOp,
    pub compare_op: CompareOp,
    pub compare_mask: u32,
    pub write_mask: u32,
    pub reference: u32,
}

impl Default for StencilOpState {
    fn default() -> Self {
        Self {
            fail_op: StencilOp::Keep,
            pass_op: StencilOp::Keep,
            depth_fail_op: StencilOp::Keep,
            compare_op: CompareOp::Always,
            compare_mask: 0xFF,
            write_mask: 0xFF,
            reference: 0,
        }
    }
}

/// Depth and stencil testing state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthStencilState {
    pub enable_depth_test: bool,
    pub enable_depth_write: bool,
    pub enable_depth_bounds_test: bool,
    pub enable_stencil_test: bool,
    pub depth_compare_op: CompareOp,
    pub front_stencil_op_state: StencilOpState,
    pub back_stencil_op_state: StencilOpState,
    /// Not part of the state hash
    pub min_depth_bounds: f32,
    /// Not part of the state hash
    pub max_depth_bounds: f32,
}

impl Default for DepthStencilState {
    fn default() -> Self {
        Self {
            enable_depth_test: true,
            enable_depth_write: true,
            enable_depth_bounds_test: false,
            enable_stencil_test: false,
            depth_compare_op: CompareOp::Less,
            front_stencil_op_state: StencilOpState::default(),
            back_stencil_op_state: StencilOpState::default(),
            min_depth_bounds: 0.0,
            max_depth_bounds: 1.0,
        }
    }
}

// ===== COLOR BLEND STATE =====

/// Blend state of one color attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorBlendAttachmentState {
    pub enable_blend: bool,
    pub color_write_mask: ColorComponentFlags,
    pub src_color_blend_factor: BlendFactor,
    pub dst_color_blend_factor: BlendFactor,
    pub color_blend_op: BlendOp,
    pub src_alpha_blend_factor: BlendFactor,
    pub dst_alpha_blend_factor: BlendFactor,
    pub alpha_blend_op: BlendOp,
}

impl Default for ColorBlendAttachmentState {
    fn default() -> Self {
        Self {
            enable_blend: false,
            color_write_mask: ColorComponentFlags::all(),
            src_color_blend_factor: BlendFactor::One,
            dst_color_blend_factor: BlendFactor::Zero,
            color_blend_op: BlendOp::Add,
            src_alpha_blend_factor: BlendFactor::One,
            dst_alpha_blend_factor: BlendFactor::Zero,
            alpha_blend_op: BlendOp::Add,
        }
    }
}

impl ColorBlendAttachmentState {
    /// Classic premultiplied-less alpha blending
    pub fn alpha_blend() -> Self {
        Self {
            enable_blend: true,
            src_color_blend_factor: BlendFactor::SrcAlpha,
            dst_color_blend_factor: BlendFactor::OneMinusSrcAlpha,
            src_alpha_blend_factor: BlendFactor::One,
            dst_alpha_blend_factor: BlendFactor::OneMinusSrcAlpha,
            ..Default::default()
        }
    }
}

/// Color blending state
#[derive(Debug, Clone, PartialEq)]
pub struct ColorBlendState {
    pub enable_logic_op: bool,
    pub logic_op: LogicOp,
    /// At most `MAX_COLOR_ATTACHMENT_COUNT` entries are used
    pub color_attachments: Vec<ColorBlendAttachmentState>,
    /// Not part of the state hash
    pub blend_constants: [f32; 4],
}

impl Default for ColorBlendState {
    fn default() -> Self {
        Self {
            enable_logic_op: false,
            logic_op: LogicOp::Copy,
            color_attachments: vec![ColorBlendAttachmentState::default()],
            blend_constants: [0.0; 4],
        }
    }
}

// ===== GRAPHICS STATE =====

/// Complete fixed-function graphics state
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GraphicsState {
    pub input_assembly: InputAssembly,
    pub rasterization_state: RasterizationState,
    pub depth_stencil_state: DepthStencilState,
    pub color_blend_state: ColorBlendState,
    pub dynamic_state_flags: DynamicStateFlags,
}
