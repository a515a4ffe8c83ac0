/// Pipeline trait and pipeline descriptor

use crate::graphics_device::{BufferFormat, ShaderStageFlags, DescriptorSetLayoutHandle};

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    /// Triangle list
    TriangleList,
    /// Triangle strip
    TriangleStrip,
    /// Line list
    LineList,
}

/// Index buffer element type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    /// 16-bit indices (max 65535 vertices)
    U16,
    /// 32-bit indices (max ~4 billion vertices)
    U32,
}

impl IndexType {
    /// Size in bytes of one index element
    pub fn size_bytes(&self) -> u32 {
        match self {
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

/// Vertex attribute description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Attribute location in shader
    pub location: u32,
    /// Binding index
    pub binding: u32,
    /// Format of the attribute (data type and component count)
    pub format: BufferFormat,
    /// Offset in bytes from the start of the vertex
    pub offset: u32,
}

/// Vertex binding description (per-vertex rate)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexBinding {
    /// Binding index
    pub binding: u32,
    /// Stride in bytes between consecutive elements
    pub stride: u32,
}

/// Vertex input layout
///
/// An empty layout is valid: point light billboards and the skybox
/// generate their positions in the vertex shader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexLayout {
    /// Vertex bindings
    pub bindings: Vec<VertexBinding>,
    /// Vertex attributes
    pub attributes: Vec<VertexAttribute>,
}

/// Push constant range descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushConstantRange {
    /// Shader stages that can access these push constants
    pub stages: ShaderStageFlags,
    /// Offset in bytes
    pub offset: u32,
    /// Size in bytes
    pub size: u32,
}

/// Face culling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    /// No culling
    None,
    /// Cull front faces
    Front,
    /// Cull back faces
    Back,
}

/// Comparison operator for depth tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Less,
    LessOrEqual,
    Always,
}

/// Depth test configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthState {
    pub test_enable: bool,
    pub write_enable: bool,
    pub compare_op: CompareOp,
}

impl Default for DepthState {
    fn default() -> Self {
        Self {
            test_enable: true,
            write_enable: true,
            compare_op: CompareOp::Less,
        }
    }
}

impl DepthState {
    /// Depth test and write disabled
    pub fn disabled() -> Self {
        Self {
            test_enable: false,
            write_enable: false,
            compare_op: CompareOp::Always,
        }
    }
}

/// Descriptor for creating a graphics pipeline
#[derive(Debug, Clone)]
pub struct PipelineDesc {
    /// SPIR-V bytecode of the vertex shader
    pub vertex_shader: Vec<u8>,
    /// SPIR-V bytecode of the fragment shader
    pub fragment_shader: Vec<u8>,
    /// Vertex input layout
    pub vertex_layout: VertexLayout,
    /// Primitive topology
    pub topology: PrimitiveTopology,
    /// Set layouts in set-index order
    pub set_layouts: Vec<DescriptorSetLayoutHandle>,
    /// Push constant ranges
    pub push_constant_ranges: Vec<PushConstantRange>,
    /// Backend render pass the pipeline renders into
    pub render_pass: u64,
    pub cull_mode: CullMode,
    pub depth: DepthState,
    /// Alpha blending on the color attachment
    pub alpha_blend: bool,
}

/// Graphics pipeline resource trait
///
/// Holds the pipeline and its layout; destroyed when dropped.
pub trait Pipeline: Send + Sync {
    /// Backend pipeline handle
    fn raw_handle(&self) -> u64;

    /// Backend pipeline layout handle
    fn layout_handle(&self) -> u64;
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
