/// PointLightPass - point light billboards and the UBO light array
///
/// `update` copies every point light into the frame's uniform block.
/// `render` draws one camera-facing quad per light, farthest first so
/// alpha blending composes correctly. The quad is generated in the vertex
/// shader from 6 vertex indices.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::frame::{FrameInfo, GlobalUbo, MAX_POINT_LIGHTS};
use crate::graphics_device::{
    Pipeline, PipelineDesc, PrimitiveTopology, PushConstantRange, CullMode, DepthState, VertexLayout,
};
use crate::pass::{DrawPass, PassContext, PointLightPush, ShaderPair};
use crate::scene::SceneObject;
use crate::{engine_debug, engine_error};

/// Vertices drawn per light billboard
pub const BILLBOARD_VERTEX_COUNT: u32 = 6;

pub struct PointLightPass {
    pipeline: Arc<dyn Pipeline>,
}

impl PointLightPass {
    pub fn new(context: &PassContext, shaders: ShaderPair) -> Result<Self> {
        let desc = PipelineDesc {
            vertex_shader: shaders.vertex,
            fragment_shader: shaders.fragment,
            vertex_layout: VertexLayout::default(),
            topology: PrimitiveTopology::TriangleList,
            set_layouts: vec![context.global_layout],
            push_constant_ranges: vec![PushConstantRange {
                stages: PointLightPush::STAGES,
                offset: 0,
                size: PointLightPush::SIZE,
            }],
            render_pass: context.render_pass,
            cull_mode: CullMode::None,
            depth: DepthState::default(),
            alpha_blend: true,
        };
        let pipeline = context.device.create_pipeline(&desc)?;
        engine_debug!("lumen::pass", "Point light pipeline created");
        Ok(Self { pipeline })
    }
}

fn push_for(light: &SceneObject) -> PointLightPush {
    let intensity = light.point_light.map_or(0.0, |p| p.intensity);
    PointLightPush::new(light.transform.translation, light.color, intensity, light.light_radius())
}

impl DrawPass for PointLightPass {
    fn name(&self) -> &str {
        "point_light"
    }

    fn update(&mut self, frame: &FrameInfo, ubo: &mut GlobalUbo) -> Result<()> {
        for light in frame.objects.point_lights() {
            let intensity = light.point_light.map_or(0.0, |p| p.intensity);
            if !ubo.push_light(light.transform.translation, light.color, intensity) {
                let message = format!("scene has more than {} point lights", MAX_POINT_LIGHTS);
                engine_error!("lumen::pass", "{}", message);
                return Err(Error::InvalidResource(message));
            }
        }
        Ok(())
    }

    fn render(&mut self, frame: &mut FrameInfo) -> Result<()> {
        let eye = frame.camera.position();
        let mut lights: Vec<(f32, PointLightPush)> = frame
            .objects
            .point_lights()
            .map(|light| (eye.distance_squared(light.transform.translation), push_for(light)))
            .collect();
        lights.sort_by(|a, b| b.0.total_cmp(&a.0));

        let pipeline = self.pipeline.as_ref();
        frame.command_list.bind_pipeline(pipeline)?;
        frame.command_list.bind_descriptor_sets(pipeline, 0, &[frame.global_set])?;

        for (_, push) in &lights {
            frame.command_list.push_constants(pipeline, PointLightPush::STAGES, 0, bytemuck::bytes_of(push))?;
            frame.command_list.draw(BILLBOARD_VERTEX_COUNT, 0)?;
        }
        Ok(())
    }
}
