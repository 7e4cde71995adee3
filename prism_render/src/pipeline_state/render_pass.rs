/// Render pass compatibility description used to key compiled pipelines

use crate::pipeline_state::{Format, SampleCount};

/// The parts of a render pass a graphics pipeline must be compatible with
///
/// Two render passes with equal descriptions can share compiled pipelines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RenderPassCompatibilityDesc {
    /// Color attachment formats, in attachment order
    pub color_attachment_formats: Vec<Format>,
    /// Depth/stencil attachment format (`Format::Undefined` = none)
    pub depth_stencil_format: Format,
    /// Sample count of every attachment
    pub sample_count: SampleCount,
    /// Subpass the pipeline is used in
    pub subpass_index: u32,
}

impl RenderPassCompatibilityDesc {
    /// Single color attachment, no depth
    pub fn color(format: Format) -> Self {
        Self {
            color_attachment_formats: vec![format],
            ..Default::default()
        }
    }

    /// Whether a depth/stencil attachment is present
    pub fn has_depth_stencil(&self) -> bool {
        self.depth_stencil_format != Format::Undefined
    }
}
