/// SkyboxPass - procedural sky with a sun disc
///
/// Draws a unit cube around the camera with depth test and write off, so
/// it must be the first pass recorded in the frame. The view matrix loses
/// its translation before it is pushed; the cube never moves relative to
/// the eye.

use std::sync::Arc;
use glam::{Mat3, Mat4};

use crate::error::Result;
use crate::frame::FrameInfo;
use crate::graphics_device::{
    GraphicsDevice, Pipeline, PipelineDesc, PrimitiveTopology, PushConstantRange, CullMode, DepthState,
    Buffer, BufferDesc, BufferUsage, BufferFormat, VertexLayout, VertexBinding, VertexAttribute,
};
use crate::pass::{DrawPass, PassContext, SkyboxPush, ShaderPair};
use crate::engine_debug;

/// 12 triangles of the unit cube
pub const SKYBOX_VERTEX_COUNT: u32 = 36;

pub struct SkyboxPass {
    pipeline: Arc<dyn Pipeline>,
    cube: Arc<dyn Buffer>,
}

impl SkyboxPass {
    pub fn new(context: &PassContext, shaders: ShaderPair) -> Result<Self> {
        let desc = PipelineDesc {
            vertex_shader: shaders.vertex,
            fragment_shader: shaders.fragment,
            vertex_layout: position_layout(),
            topology: PrimitiveTopology::TriangleList,
            set_layouts: vec![context.global_layout],
            push_constant_ranges: vec![PushConstantRange {
                stages: SkyboxPush::STAGES,
                offset: 0,
                size: SkyboxPush::SIZE,
            }],
            render_pass: context.render_pass,
            cull_mode: CullMode::None,
            depth: DepthState::disabled(),
            alpha_blend: false,
        };
        let pipeline = context.device.create_pipeline(&desc)?;
        let cube = create_cube(context.device.as_ref())?;
        engine_debug!("lumen::pass", "Skybox pipeline created");
        Ok(Self { pipeline, cube })
    }
}

fn position_layout() -> VertexLayout {
    VertexLayout {
        bindings: vec![VertexBinding { binding: 0, stride: 12 }],
        attributes: vec![VertexAttribute {
            location: 0,
            binding: 0,
            format: BufferFormat::R32G32B32_SFLOAT,
            offset: 0,
        }],
    }
}

/// Corner positions of the 12 cube triangles, wound outward
pub(crate) fn cube_positions() -> Vec<[f32; 3]> {
    const FACES: [[[f32; 3]; 4]; 6] = [
        [[-1.0, -1.0, 1.0], [1.0, -1.0, 1.0], [1.0, 1.0, 1.0], [-1.0, 1.0, 1.0]],     // +Z
        [[1.0, -1.0, -1.0], [-1.0, -1.0, -1.0], [-1.0, 1.0, -1.0], [1.0, 1.0, -1.0]], // -Z
        [[1.0, -1.0, 1.0], [1.0, -1.0, -1.0], [1.0, 1.0, -1.0], [1.0, 1.0, 1.0]],     // +X
        [[-1.0, -1.0, -1.0], [-1.0, -1.0, 1.0], [-1.0, 1.0, 1.0], [-1.0, 1.0, -1.0]], // -X
        [[-1.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, -1.0], [-1.0, 1.0, -1.0]],     // +Y
        [[-1.0, -1.0, -1.0], [1.0, -1.0, -1.0], [1.0, -1.0, 1.0], [-1.0, -1.0, 1.0]], // -Y
    ];
    FACES
        .iter()
        .flat_map(|[a, b, c, d]| [*a, *b, *c, *a, *c, *d])
        .collect()
}

fn create_cube(device: &dyn GraphicsDevice) -> Result<Arc<dyn Buffer>> {
    let positions = cube_positions();
    device.create_buffer(&BufferDesc::with_data(BufferUsage::Vertex, bytemuck::cast_slice(&positions)))
}

impl DrawPass for SkyboxPass {
    fn name(&self) -> &str {
        "skybox"
    }

    fn render(&mut self, frame: &mut FrameInfo) -> Result<()> {
        let push = SkyboxPush {
            projection: frame.camera.projection(),
            view: Mat4::from_mat3(Mat3::from_mat4(frame.camera.view())),
            sun_direction: frame.lighting.sun_direction,
            sun_size: frame.lighting.sun_size,
        };

        let pipeline = self.pipeline.as_ref();
        frame.command_list.bind_pipeline(pipeline)?;
        frame.command_list.bind_descriptor_sets(pipeline, 0, &[frame.global_set])?;
        frame.command_list.push_constants(pipeline, SkyboxPush::STAGES, 0, bytemuck::bytes_of(&push))?;
        frame.command_list.bind_vertex_buffer(self.cube.as_ref(), 0)?;
        frame.command_list.draw(SKYBOX_VERTEX_COUNT, 0)
    }
}
