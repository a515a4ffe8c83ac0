/// OpaquePass - lit, textured meshes
///
/// Draws every scene object that has a mesh. Per-object data travels in
/// `OpaquePush`; textures and materials are read from the global set
/// through the pushed material index.

use std::sync::Arc;

use crate::error::Result;
use crate::frame::FrameInfo;
use crate::graphics_device::{
    Pipeline, PipelineDesc, PrimitiveTopology, PushConstantRange, CullMode, DepthState,
};
use crate::pass::{DrawPass, PassContext, OpaquePush, ShaderPair};
use crate::resource::Vertex;
use crate::engine_debug;

pub struct OpaquePass {
    pipeline: Arc<dyn Pipeline>,
}

impl OpaquePass {
    pub fn new(context: &PassContext, shaders: ShaderPair) -> Result<Self> {
        let desc = PipelineDesc {
            vertex_shader: shaders.vertex,
            fragment_shader: shaders.fragment,
            vertex_layout: Vertex::layout(),
            topology: PrimitiveTopology::TriangleList,
            set_layouts: vec![context.global_layout],
            push_constant_ranges: vec![PushConstantRange {
                stages: OpaquePush::STAGES,
                offset: 0,
                size: OpaquePush::SIZE,
            }],
            render_pass: context.render_pass,
            cull_mode: CullMode::Back,
            depth: DepthState::default(),
            alpha_blend: false,
        };
        let pipeline = context.device.create_pipeline(&desc)?;
        engine_debug!("lumen::pass", "Opaque pipeline created");
        Ok(Self { pipeline })
    }

    pub fn pipeline(&self) -> &Arc<dyn Pipeline> {
        &self.pipeline
    }
}

impl DrawPass for OpaquePass {
    fn name(&self) -> &str {
        "opaque"
    }

    fn render(&mut self, frame: &mut FrameInfo) -> Result<()> {
        let pipeline = self.pipeline.as_ref();
        frame.command_list.bind_pipeline(pipeline)?;
        frame.command_list.bind_descriptor_sets(pipeline, 0, &[frame.global_set])?;

        for (_, object) in frame.objects.iter() {
            let Some(mesh) = &object.mesh else {
                continue;
            };
            let push = OpaquePush::new(
                object.transform.matrix(),
                object.transform.normal_matrix(),
                frame.frame_index as u32,
                object.material_index,
            );
            frame.command_list.push_constants(pipeline, OpaquePush::STAGES, 0, bytemuck::bytes_of(&push))?;
            mesh.bind(frame.command_list)?;
            mesh.draw(frame.command_list)?;
        }
        Ok(())
    }
}
