/// World - per-frame orchestration of one scene
///
/// Each frame slot has its own uniform buffer and global descriptor set:
///
/// ```text
/// global set [frame i]
/// ├── binding 0: ubo_buffers[i]        (GlobalUbo, rewritten every frame)
/// ├── binding 1: textures 0..n         (bindless, refreshed on demand)
/// └── binding 3: material table        (shared by both sets)
/// ```

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::config::{Config, MAX_FRAMES_IN_FLIGHT};
use crate::descriptor::{
    DescriptorSetLayout, DescriptorPool, DescriptorWriter,
    build_global_layout, build_global_pool,
    GLOBAL_UBO_BINDING, TEXTURE_ARRAY_BINDING, MATERIAL_BINDING,
};
use crate::error::Result;
use crate::frame::{FrameScheduler, FrameInfo, GlobalUbo};
use crate::graphics_device::{GraphicsDevice, Buffer, BufferDesc, BufferUsage, DescriptorSetHandle};
use crate::pass::{DrawPass, PassContext};
use crate::resource::{ResourceManager, Mesh};
use crate::scene::{Camera, ObjectTable, ObjectKey, SceneObject, SceneLighting};
use crate::surface::PresentationSurface;
use crate::world::GameHooks;
use crate::{engine_debug, engine_err, engine_error, engine_info, engine_warn};

/// Vertical field of view of the default perspective (radians)
pub const DEFAULT_FOV_Y: f32 = 50.0 * std::f32::consts::PI / 180.0;
pub const DEFAULT_NEAR: f32 = 0.1;
pub const DEFAULT_FAR: f32 = 10000.0;

pub struct World {
    device: Arc<dyn GraphicsDevice>,
    scheduler: FrameScheduler,
    resources: ResourceManager,

    global_layout: Arc<DescriptorSetLayout>,
    global_pool: Arc<DescriptorPool>,
    global_sets: Vec<DescriptorSetHandle>,
    ubo_buffers: Vec<Arc<dyn Buffer>>,

    objects: ObjectTable,
    camera: Camera,
    /// Perspective re-applied with the swapchain aspect ratio every frame
    perspective: Option<(f32, f32, f32)>,
    lighting: SceneLighting,
    passes: Vec<Box<dyn DrawPass>>,

    window_title: String,
}

impl World {
    /// Create the frame scheduler, resources and per-frame global sets
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        config: &Config,
        surface: &mut dyn PresentationSurface,
    ) -> Result<Self> {
        let scheduler = FrameScheduler::new(Arc::clone(&device), config, surface)?;
        let resources = ResourceManager::new(Arc::clone(&device))?;

        let global_layout = build_global_layout(Arc::clone(&device))?;
        let global_pool = build_global_pool(Arc::clone(&device))?;

        let ubo_buffers = (0..MAX_FRAMES_IN_FLIGHT)
            .map(|_| device.create_buffer(&BufferDesc::new(GlobalUbo::SIZE, BufferUsage::Uniform)))
            .collect::<Result<Vec<_>>>()?;

        let textures = resources.image_descriptors();
        let mut global_sets = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
        for ubo in &ubo_buffers {
            let mut writer = DescriptorWriter::new(&global_layout, &global_pool);
            writer
                .write_buffer(GLOBAL_UBO_BINDING, ubo.descriptor_info())?
                .write_image_array(TEXTURE_ARRAY_BINDING, &textures)?
                .write_buffer(MATERIAL_BINDING, resources.descriptor_info())?;
            match writer.build()? {
                Some(set) => global_sets.push(set),
                None => {
                    return Err(engine_err!("lumen::world",
                        "Global descriptor pool exhausted after {} sets", global_sets.len()));
                }
            }
        }

        let mut camera = Camera::new();
        camera.set_view_yxz(glam::Vec3::new(0.0, 0.0, -2.5), glam::Vec3::ZERO);

        engine_info!("lumen::world", "World created with {} frame slots", MAX_FRAMES_IN_FLIGHT);

        Ok(Self {
            device,
            scheduler,
            resources,
            global_layout,
            global_pool,
            global_sets,
            ubo_buffers,
            objects: ObjectTable::new(),
            camera,
            perspective: Some((DEFAULT_FOV_Y, DEFAULT_NEAR, DEFAULT_FAR)),
            lighting: SceneLighting::default(),
            passes: Vec::new(),
            window_title: config.window_title.clone(),
        })
    }

    // ===== FRAME LOOP =====

    /// Run frames until the surface asks to close
    ///
    /// Passes are created first. The device is drained before returning,
    /// on success and on error.
    pub fn run(&mut self, surface: &mut dyn PresentationSurface, hooks: &mut dyn GameHooks) -> Result<()> {
        let result = self.run_loop(surface, hooks);
        let drained = self.device.wait_idle();
        engine_info!("lumen::world", "Frame loop finished");
        result.and(drained)
    }

    fn run_loop(&mut self, surface: &mut dyn PresentationSurface, hooks: &mut dyn GameHooks) -> Result<()> {
        self.passes = hooks.create_passes(self)?;
        engine_debug!("lumen::world", "{} draw passes created", self.passes.len());

        let mut last = Instant::now();
        let mut fps_frames = 0u32;
        let mut fps_elapsed = 0.0f32;

        loop {
            surface.poll_events();
            if surface.should_close() {
                return Ok(());
            }

            let now = Instant::now();
            let delta_time = now.duration_since(last).as_secs_f32();
            last = now;

            if self.tick(surface, hooks, delta_time)? {
                fps_frames += 1;
            }
            fps_elapsed += delta_time;
            if fps_elapsed >= 1.0 {
                surface.set_title(&format!("{} - {} FPS", self.window_title, fps_frames));
                fps_frames = 0;
                fps_elapsed = 0.0;
            }
        }
    }

    /// Run one frame
    ///
    /// Returns `Ok(false)` when the frame was skipped because the swapchain
    /// had to be recreated at acquire time. When a pass or hook fails after
    /// the image was acquired, the frame is aborted (submitted and presented
    /// as recorded) before the error is returned, so the next tick can run.
    pub fn tick(
        &mut self,
        surface: &mut dyn PresentationSurface,
        hooks: &mut dyn GameHooks,
        delta_time: f32,
    ) -> Result<bool> {
        hooks.on_frame_begin(self, delta_time)?;
        self.resources.materials_mut().check_committed();

        if let Some((fov_y, near, far)) = self.perspective {
            self.camera.set_perspective_projection(fov_y, self.scheduler.aspect_ratio(), near, far);
        }

        let frame_index = match self.scheduler.begin_frame(surface)? {
            Some(frame_index) => frame_index,
            None => return Ok(false),
        };

        if let Err(e) = self.record_frame(hooks, frame_index, delta_time) {
            if let Err(abort) = self.scheduler.abort_frame(surface) {
                engine_error!("lumen::world", "Failed to abort frame {}: {}", frame_index, abort);
            }
            return Err(e);
        }
        self.scheduler.end_frame(surface)?;
        Ok(true)
    }

    /// Fill the frame's UBO and record every pass inside the render pass
    fn record_frame(&mut self, hooks: &mut dyn GameHooks, frame_index: usize, delta_time: f32) -> Result<()> {
        let global_set = self.global_sets[frame_index];

        let mut ubo = GlobalUbo::with_camera(
            self.camera.projection(),
            self.camera.view(),
            self.camera.inverse_view(),
        );
        {
            let frame = FrameInfo {
                frame_index,
                delta_time,
                command_list: self.scheduler.command_list()?,
                camera: &self.camera,
                global_set,
                objects: &self.objects,
                lighting: &self.lighting,
            };
            for pass in self.passes.iter_mut() {
                pass.update(&frame, &mut ubo)?;
            }
            hooks.on_update(&frame, &mut ubo)?;
        }
        self.ubo_buffers[frame_index].update(0, ubo.as_bytes())?;

        self.scheduler.begin_render_pass()?;
        {
            let mut frame = FrameInfo {
                frame_index,
                delta_time,
                command_list: self.scheduler.command_list()?,
                camera: &self.camera,
                global_set,
                objects: &self.objects,
                lighting: &self.lighting,
            };
            for pass in self.passes.iter_mut() {
                pass.render(&mut frame)?;
            }
            hooks.on_render(&mut frame)?;
        }
        self.scheduler.end_render_pass()
    }

    // ===== RESOURCES =====

    /// Rewrite the bindless texture array of every global set
    ///
    /// Drains the device first; sets of in-flight frames are rewritten.
    pub fn refresh_bindless_textures(&mut self) -> Result<()> {
        self.device.wait_idle()?;
        let textures = self.resources.image_descriptors();
        for &set in &self.global_sets {
            let mut writer = DescriptorWriter::new(&self.global_layout, &self.global_pool);
            writer.write_image_array(TEXTURE_ARRAY_BINDING, &textures)?;
            writer.overwrite(set)?;
        }
        engine_debug!("lumen::world", "Bindless array refreshed with {} textures", textures.len());
        Ok(())
    }

    /// Load a model file into a shareable GPU mesh
    pub fn load_mesh(&self, path: impl AsRef<Path>) -> Result<Arc<Mesh>> {
        Ok(Arc::new(Mesh::from_file(self.device.as_ref(), path)?))
    }

    /// Everything a draw pass needs to build its pipeline
    pub fn pass_context(&self) -> PassContext {
        PassContext {
            device: Arc::clone(&self.device),
            global_layout: self.global_layout.handle(),
            render_pass: self.scheduler.render_pass_handle(),
        }
    }

    /// Append a pass after the ones created by `GameHooks::create_passes`
    pub fn add_pass(&mut self, pass: Box<dyn DrawPass>) {
        self.passes.push(pass);
    }

    // ===== OBJECTS =====

    pub fn spawn(&mut self, object: SceneObject) -> ObjectKey {
        self.objects.insert(object)
    }

    pub fn despawn(&mut self, key: ObjectKey) -> Option<SceneObject> {
        self.objects.remove(key)
    }

    pub fn objects(&self) -> &ObjectTable {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> &mut ObjectTable {
        &mut self.objects
    }

    // ===== CAMERA / LIGHTING =====

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Perspective applied each frame with the current aspect ratio
    ///
    /// `None` leaves the camera projection alone.
    pub fn set_perspective(&mut self, perspective: Option<(f32, f32, f32)>) {
        self.perspective = perspective;
    }

    pub fn lighting(&self) -> &SceneLighting {
        &self.lighting
    }

    pub fn lighting_mut(&mut self) -> &mut SceneLighting {
        &mut self.lighting
    }

    // ===== ACCESSORS =====

    pub fn device(&self) -> &Arc<dyn GraphicsDevice> {
        &self.device
    }

    pub fn resources(&self) -> &ResourceManager {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut ResourceManager {
        &mut self.resources
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    pub fn global_sets(&self) -> &[DescriptorSetHandle] {
        &self.global_sets
    }

    pub fn ubo_buffer(&self, frame_index: usize) -> Option<&Arc<dyn Buffer>> {
        self.ubo_buffers.get(frame_index)
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }
}

impl Drop for World {
    fn drop(&mut self) {
        // Passes and resources hold device objects that may still be in use
        if let Err(e) = self.device.wait_idle() {
            engine_warn!("lumen::world", "wait_idle failed during shutdown: {}", e);
        }
    }
}

#[cfg(test)]
#[path = "world_tests.rs"]
mod tests;
