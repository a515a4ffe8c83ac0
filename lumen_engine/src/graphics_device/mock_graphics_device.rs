/// Mock GraphicsDevice for unit tests (no GPU required)
///
/// Every mock object shares one `MockState` so tests can inspect what the
/// engine asked the device to do: descriptor set contents, pool usage,
/// buffer bytes, swapchain generations and an ordered event log.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use rustc_hash::FxHashMap;

use crate::graphics_device::{
    GraphicsDevice, Buffer, BufferDesc, Texture, TextureDesc, TextureInfo, Pipeline, PipelineDesc,
    CommandList, FrameSlot, Swapchain, Extent2D, Format, AcquireOutcome, PresentOutcome,
    RenderPassBegin, Viewport, Rect2D, IndexType, ShaderStageFlags,
    DescriptorSetLayoutDesc, DescriptorPoolDesc, DescriptorWrite, DescriptorResources,
    DescriptorSetLayoutHandle, DescriptorPoolHandle, DescriptorSetHandle, DescriptorKind,
    BufferDescriptor, ImageDescriptor, ImageLayout, BindingFlags, PoolFlags, check_buffer_range,
};
use crate::error::{Error, Result};
use crate::engine_bail;

// ============================================================================
// Shared state
// ============================================================================

/// Descriptor stored in a mock set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockDescriptor {
    Buffer(BufferDescriptor),
    Image(ImageDescriptor),
}

#[derive(Debug)]
pub struct MockPool {
    pub max_sets: u32,
    pub flags: PoolFlags,
    pub live_sets: Vec<u64>,
    /// Descriptors per kind the pool was created with
    pub capacity: FxHashMap<DescriptorKind, u32>,
    /// Descriptors per kind not yet taken by a live set
    pub remaining: FxHashMap<DescriptorKind, u32>,
}

#[derive(Debug)]
pub struct MockSet {
    pub pool: u64,
    pub layout: u64,
    pub variable_count: Option<u32>,
    /// Descriptors per kind taken from the pool, returned on free
    pub charge: Vec<(DescriptorKind, u32)>,
    /// (binding, array element) -> descriptor
    pub descriptors: FxHashMap<(u32, u32), MockDescriptor>,
}

/// Scripted result of the next acquire call
#[derive(Debug, Clone, Copy)]
pub enum ScriptedAcquire {
    Outcome(AcquireOutcome),
    DeviceLost,
}

/// Scripted result of the next present call
#[derive(Debug, Clone, Copy)]
pub enum ScriptedPresent {
    Outcome(PresentOutcome),
    DeviceLost,
}

#[derive(Debug)]
pub struct MockState {
    next_handle: u64,
    pub layouts: FxHashMap<u64, DescriptorSetLayoutDesc>,
    pub pools: FxHashMap<u64, MockPool>,
    pub sets: FxHashMap<u64, MockSet>,
    pub buffers: FxHashMap<u64, Arc<Mutex<Vec<u8>>>>,
    pub created_textures: Vec<String>,
    pub created_pipelines: Vec<PipelineDesc>,
    pub update_calls: usize,
    pub wait_idle_calls: usize,
    pub swapchains_created: usize,
    /// Upcoming `create_swapchain` calls that report a zero surface extent
    pub deferred_swapchains: usize,
    /// (slot, semaphore) signaled by each submission
    pub submit_signals: Vec<(usize, u64)>,
    /// (image, semaphore) waited on by each present
    pub present_waits: Vec<(u32, u64)>,
    /// Raw handle passed as `previous` for each swapchain creation
    pub swapchain_hints: Vec<Option<u64>>,
    /// Ordered log of device, slot, swapchain and command list activity
    pub events: Vec<String>,
    /// Push constant payloads in recording order
    pub push_constants: Vec<(ShaderStageFlags, Vec<u8>)>,
    pub acquire_script: VecDeque<ScriptedAcquire>,
    pub present_script: VecDeque<ScriptedPresent>,
    /// Formats of the next swapchain generation
    pub image_format: Format,
    pub depth_format: Format,
    pub image_count: usize,
}

impl MockState {
    fn new() -> Self {
        Self {
            next_handle: 1,
            layouts: FxHashMap::default(),
            pools: FxHashMap::default(),
            sets: FxHashMap::default(),
            buffers: FxHashMap::default(),
            created_textures: Vec::new(),
            created_pipelines: Vec::new(),
            update_calls: 0,
            wait_idle_calls: 0,
            swapchains_created: 0,
            deferred_swapchains: 0,
            submit_signals: Vec::new(),
            present_waits: Vec::new(),
            swapchain_hints: Vec::new(),
            events: Vec::new(),
            push_constants: Vec::new(),
            acquire_script: VecDeque::new(),
            present_script: VecDeque::new(),
            image_format: Format::B8G8R8A8_SRGB,
            depth_format: Format::D32_FLOAT,
            image_count: 3,
        }
    }

    fn mint(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn log(&mut self, event: impl Into<String>) {
        self.events.push(event.into());
    }
}

type SharedState = Arc<Mutex<MockState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, MockState> {
    state.lock().unwrap()
}

// ============================================================================
// Mock Buffer
// ============================================================================

#[derive(Debug)]
pub struct MockBuffer {
    pub handle: u64,
    pub size: u64,
    pub bytes: Arc<Mutex<Vec<u8>>>,
}

impl Buffer for MockBuffer {
    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        check_buffer_range(self.size, offset, data.len())?;
        let mut bytes = self.bytes.lock().unwrap();
        let start = offset as usize;
        bytes[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn raw_handle(&self) -> u64 {
        self.handle
    }
}

// ============================================================================
// Mock Texture
// ============================================================================

#[derive(Debug)]
pub struct MockTexture {
    pub info: TextureInfo,
    pub view: u64,
    pub sampler: u64,
}

impl Texture for MockTexture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }

    fn image_descriptor(&self) -> ImageDescriptor {
        ImageDescriptor {
            view: self.view,
            sampler: self.sampler,
            layout: ImageLayout::ShaderReadOnly,
        }
    }
}

// ============================================================================
// Mock Pipeline
// ============================================================================

#[derive(Debug)]
pub struct MockPipeline {
    pub handle: u64,
    pub layout: u64,
}

impl Pipeline for MockPipeline {
    fn raw_handle(&self) -> u64 {
        self.handle
    }

    fn layout_handle(&self) -> u64 {
        self.layout
    }
}

// ============================================================================
// Mock CommandList
// ============================================================================

#[derive(Debug)]
pub struct MockCommandList {
    state: SharedState,
    pub recording: bool,
    pub in_render_pass: bool,
}

impl MockCommandList {
    fn record(&mut self, command: String) -> Result<()> {
        if !self.recording {
            engine_bail!("lumen::mock", "{} outside of recording", command);
        }
        lock(&self.state).log(command);
        Ok(())
    }
}

impl CommandList for MockCommandList {
    fn begin(&mut self) -> Result<()> {
        if self.recording {
            engine_bail!("lumen::mock", "begin while already recording");
        }
        self.recording = true;
        lock(&self.state).log("begin");
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        if self.in_render_pass {
            engine_bail!("lumen::mock", "end inside a render pass");
        }
        self.record("end".to_string())?;
        self.recording = false;
        Ok(())
    }

    fn begin_render_pass(&mut self, info: &RenderPassBegin) -> Result<()> {
        if self.in_render_pass {
            engine_bail!("lumen::mock", "nested render pass");
        }
        self.record(format!("begin_render_pass fb{} {}x{}",
            info.framebuffer, info.extent.width, info.extent.height))?;
        self.in_render_pass = true;
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        if !self.in_render_pass {
            engine_bail!("lumen::mock", "end_render_pass without render pass");
        }
        self.in_render_pass = false;
        self.record("end_render_pass".to_string())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.record(format!("set_viewport {}x{}", viewport.width, viewport.height))
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.record(format!("set_scissor {}x{}", scissor.width, scissor.height))
    }

    fn bind_pipeline(&mut self, pipeline: &dyn Pipeline) -> Result<()> {
        self.record(format!("bind_pipeline {}", pipeline.raw_handle()))
    }

    fn bind_descriptor_sets(
        &mut self,
        _pipeline: &dyn Pipeline,
        first_set: u32,
        sets: &[DescriptorSetHandle],
    ) -> Result<()> {
        let handles: Vec<String> = sets.iter().map(|s| s.0.to_string()).collect();
        self.record(format!("bind_descriptor_sets {} [{}]", first_set, handles.join(",")))
    }

    fn push_constants(
        &mut self,
        _pipeline: &dyn Pipeline,
        stages: ShaderStageFlags,
        _offset: u32,
        data: &[u8],
    ) -> Result<()> {
        self.record(format!("push_constants {}", data.len()))?;
        lock(&self.state).push_constants.push((stages, data.to_vec()));
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: &dyn Buffer, _offset: u64) -> Result<()> {
        self.record(format!("bind_vertex_buffer {}", buffer.raw_handle()))
    }

    fn bind_index_buffer(&mut self, buffer: &dyn Buffer, _offset: u64, _index_type: IndexType) -> Result<()> {
        self.record(format!("bind_index_buffer {}", buffer.raw_handle()))
    }

    fn draw(&mut self, vertex_count: u32, _first_vertex: u32) -> Result<()> {
        self.record(format!("draw {}", vertex_count))
    }

    fn draw_indexed(&mut self, index_count: u32, _first_index: u32, _vertex_offset: i32) -> Result<()> {
        self.record(format!("draw_indexed {}", index_count))
    }
}

// ============================================================================
// Mock FrameSlot
// ============================================================================

#[derive(Debug)]
pub struct MockFrameSlot {
    index: usize,
    state: SharedState,
    command_list: MockCommandList,
}

impl FrameSlot for MockFrameSlot {
    fn index(&self) -> usize {
        self.index
    }

    fn wait(&self) -> Result<()> {
        lock(&self.state).log(format!("wait slot{}", self.index));
        Ok(())
    }

    fn command_list(&mut self) -> &mut dyn CommandList {
        &mut self.command_list
    }

    fn submit(&mut self, signal_semaphore: u64) -> Result<()> {
        if self.command_list.recording {
            engine_bail!("lumen::mock", "submit while slot {} is still recording", self.index);
        }
        let mut state = lock(&self.state);
        state.log(format!("submit slot{}", self.index));
        state.submit_signals.push((self.index, signal_semaphore));
        Ok(())
    }

    fn image_available_semaphore(&self) -> u64 {
        1000 + self.index as u64
    }
}

// ============================================================================
// Mock Swapchain
// ============================================================================

#[derive(Debug)]
pub struct MockSwapchain {
    handle: u64,
    render_pass: u64,
    extent: Extent2D,
    image_format: Format,
    depth_format: Format,
    image_count: usize,
    next_image: u32,
    state: SharedState,
}

impl Swapchain for MockSwapchain {
    fn acquire_next_image(&mut self, _signal_semaphore: u64) -> Result<AcquireOutcome> {
        let mut state = lock(&self.state);
        let outcome = match state.acquire_script.pop_front() {
            Some(ScriptedAcquire::Outcome(outcome)) => outcome,
            Some(ScriptedAcquire::DeviceLost) => {
                engine_bail!("lumen::mock", "acquire failed: ERROR_DEVICE_LOST");
            }
            None => {
                let image_index = self.next_image;
                self.next_image = (self.next_image + 1) % self.image_count as u32;
                AcquireOutcome::Acquired { image_index, suboptimal: false }
            }
        };
        match outcome {
            AcquireOutcome::Acquired { image_index, .. } => state.log(format!("acquire image{}", image_index)),
            AcquireOutcome::OutOfDate => state.log("acquire out_of_date"),
        }
        Ok(outcome)
    }

    fn present(&mut self, image_index: u32, wait_semaphore: u64) -> Result<PresentOutcome> {
        let mut state = lock(&self.state);
        state.log(format!("present image{}", image_index));
        state.present_waits.push((image_index, wait_semaphore));
        match state.present_script.pop_front() {
            Some(ScriptedPresent::Outcome(outcome)) => Ok(outcome),
            Some(ScriptedPresent::DeviceLost) => {
                engine_bail!("lumen::mock", "present failed: ERROR_DEVICE_LOST");
            }
            None => Ok(PresentOutcome::Presented),
        }
    }

    fn image_format(&self) -> Format {
        self.image_format
    }

    fn depth_format(&self) -> Format {
        self.depth_format
    }

    fn extent(&self) -> Extent2D {
        self.extent
    }

    fn image_count(&self) -> usize {
        self.image_count
    }

    fn raw_handle(&self) -> u64 {
        self.handle
    }

    fn render_pass_handle(&self) -> u64 {
        self.render_pass
    }

    fn framebuffer_handle(&self, image_index: u32) -> Option<u64> {
        if (image_index as usize) < self.image_count {
            Some(self.handle * 100 + image_index as u64)
        } else {
            None
        }
    }

    fn render_finished_semaphore(&self, image_index: u32) -> Option<u64> {
        if (image_index as usize) < self.image_count {
            Some(self.handle * 100 + 50 + image_index as u64)
        } else {
            None
        }
    }
}

// ============================================================================
// Mock GraphicsDevice
// ============================================================================

/// Descriptors per kind a set of this layout takes from its pool
fn layout_charge(desc: &DescriptorSetLayoutDesc, variable_count: Option<u32>) -> Vec<(DescriptorKind, u32)> {
    let mut charge: Vec<(DescriptorKind, u32)> = Vec::new();
    for binding in &desc.bindings {
        let count = match variable_count {
            Some(count) if binding.flags.contains(BindingFlags::VARIABLE_DESCRIPTOR_COUNT) => count,
            _ => binding.count,
        };
        match charge.iter_mut().find(|(kind, _)| *kind == binding.kind) {
            Some((_, total)) => *total += count,
            None => charge.push((binding.kind, count)),
        }
    }
    charge
}

/// Mock device that tracks everything it is asked to do
#[derive(Debug, Clone)]
pub struct MockGraphicsDevice {
    state: SharedState,
}

impl MockGraphicsDevice {
    /// Create a new mock device
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::new())),
        }
    }

    /// Lock the shared state for inspection or scripting
    pub fn state(&self) -> MutexGuard<'_, MockState> {
        lock(&self.state)
    }

    /// Formats used by the next swapchain generation
    pub fn set_swapchain_formats(&self, image_format: Format, depth_format: Format) {
        let mut state = self.state();
        state.image_format = image_format;
        state.depth_format = depth_format;
    }

    pub fn push_acquire(&self, outcome: ScriptedAcquire) {
        self.state().acquire_script.push_back(outcome);
    }

    pub fn push_present(&self, outcome: ScriptedPresent) {
        self.state().present_script.push_back(outcome);
    }

    /// Current bytes of a buffer created by this device
    pub fn buffer_contents(&self, handle: u64) -> Vec<u8> {
        let bytes = self.state().buffers.get(&handle).cloned();
        bytes.map(|b| b.lock().unwrap().clone()).unwrap_or_default()
    }

    /// Descriptor written at (binding, element) of a set
    pub fn descriptor(&self, set: DescriptorSetHandle, binding: u32, element: u32) -> Option<MockDescriptor> {
        self.state()
            .sets
            .get(&set.0)
            .and_then(|s| s.descriptors.get(&(binding, element)).copied())
    }

    /// Number of descriptors written into a set
    pub fn descriptor_count(&self, set: DescriptorSetHandle) -> usize {
        self.state().sets.get(&set.0).map_or(0, |s| s.descriptors.len())
    }

    /// Number of live sets allocated from a pool
    pub fn live_sets(&self, pool: DescriptorPoolHandle) -> usize {
        self.state().pools.get(&pool.0).map_or(0, |p| p.live_sets.len())
    }

    pub fn events(&self) -> Vec<String> {
        self.state().events.clone()
    }

    pub fn clear_events(&self) {
        self.state().events.clear();
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_buffer(&self, desc: &BufferDesc) -> Result<Arc<dyn Buffer>> {
        let mut state = self.state();
        let handle = state.mint();
        let mut bytes = vec![0u8; desc.size as usize];
        if let Some(data) = &desc.data {
            if data.len() > bytes.len() {
                return Err(Error::InvalidResource("initial data larger than buffer".to_string()));
            }
            bytes[..data.len()].copy_from_slice(data);
        }
        let bytes = Arc::new(Mutex::new(bytes));
        state.buffers.insert(handle, Arc::clone(&bytes));
        Ok(Arc::new(MockBuffer { handle, size: desc.size, bytes }))
    }

    fn create_texture(&self, desc: &TextureDesc) -> Result<Arc<dyn Texture>> {
        if desc.data.len() != desc.expected_size() {
            return Err(Error::InvalidResource(format!(
                "texture data is {} bytes, expected {}", desc.data.len(), desc.expected_size()
            )));
        }
        let mut state = self.state();
        let view = state.mint();
        let sampler = state.mint();
        state.created_textures.push(format!("texture_{}x{}", desc.width, desc.height));
        Ok(Arc::new(MockTexture {
            info: TextureInfo { width: desc.width, height: desc.height, format: desc.format },
            view,
            sampler,
        }))
    }

    fn create_pipeline(&self, desc: &PipelineDesc) -> Result<Arc<dyn Pipeline>> {
        let mut state = self.state();
        for layout in &desc.set_layouts {
            if !state.layouts.contains_key(&layout.0) {
                engine_bail!("lumen::mock", "pipeline references unknown set layout {}", layout.0);
            }
        }
        let handle = state.mint();
        let layout = state.mint();
        state.created_pipelines.push(desc.clone());
        Ok(Arc::new(MockPipeline { handle, layout }))
    }

    fn create_descriptor_set_layout(&self, desc: &DescriptorSetLayoutDesc) -> Result<DescriptorSetLayoutHandle> {
        let mut state = self.state();
        let handle = state.mint();
        state.layouts.insert(handle, desc.clone());
        Ok(DescriptorSetLayoutHandle(handle))
    }

    fn destroy_descriptor_set_layout(&self, layout: DescriptorSetLayoutHandle) {
        let mut state = self.state();
        state.layouts.remove(&layout.0);
        state.log(format!("destroy_layout {}", layout.0));
    }

    fn create_descriptor_pool(&self, desc: &DescriptorPoolDesc) -> Result<DescriptorPoolHandle> {
        let mut state = self.state();
        let handle = state.mint();
        let mut capacity: FxHashMap<DescriptorKind, u32> = FxHashMap::default();
        for &(kind, count) in &desc.pool_sizes {
            *capacity.entry(kind).or_insert(0) += count;
        }
        state.pools.insert(handle, MockPool {
            max_sets: desc.max_sets,
            flags: desc.flags,
            live_sets: Vec::new(),
            remaining: capacity.clone(),
            capacity,
        });
        Ok(DescriptorPoolHandle(handle))
    }

    fn destroy_descriptor_pool(&self, pool: DescriptorPoolHandle) {
        let mut state = self.state();
        if let Some(removed) = state.pools.remove(&pool.0) {
            for set in removed.live_sets {
                state.sets.remove(&set);
            }
        }
        state.log(format!("destroy_pool {}", pool.0));
    }

    fn allocate_descriptor_set(
        &self,
        pool: DescriptorPoolHandle,
        layout: DescriptorSetLayoutHandle,
        variable_count: Option<u32>,
    ) -> Result<Option<DescriptorSetHandle>> {
        let mut state = self.state();
        let (update_after_bind, charge) = match state.layouts.get(&layout.0) {
            Some(desc) => (desc.update_after_bind_pool, layout_charge(desc, variable_count)),
            None => {
                engine_bail!("lumen::mock", "allocate with unknown layout {}", layout.0);
            }
        };
        let handle = state.mint();
        let p = match state.pools.get_mut(&pool.0) {
            Some(p) => p,
            None => {
                engine_bail!("lumen::mock", "allocate from unknown pool {}", pool.0);
            }
        };
        if update_after_bind && !p.flags.contains(PoolFlags::UPDATE_AFTER_BIND) {
            engine_bail!("lumen::mock", "update-after-bind layout needs an update-after-bind pool");
        }
        if p.live_sets.len() as u32 >= p.max_sets {
            return Ok(None);
        }
        // Per-kind exhaustion (ERROR_OUT_OF_POOL_MEMORY on a real device)
        let fits = charge
            .iter()
            .all(|(kind, count)| p.remaining.get(kind).copied().unwrap_or(0) >= *count);
        if !fits {
            return Ok(None);
        }
        for (kind, count) in &charge {
            if let Some(left) = p.remaining.get_mut(kind) {
                *left -= count;
            }
        }
        p.live_sets.push(handle);
        state.sets.insert(handle, MockSet {
            pool: pool.0,
            layout: layout.0,
            variable_count,
            charge,
            descriptors: FxHashMap::default(),
        });
        Ok(Some(DescriptorSetHandle(handle)))
    }

    fn free_descriptor_sets(&self, pool: DescriptorPoolHandle, sets: &[DescriptorSetHandle]) -> Result<()> {
        let mut state = self.state();
        match state.pools.get_mut(&pool.0) {
            Some(p) if p.flags.contains(PoolFlags::FREE_DESCRIPTOR_SET) => {
                p.live_sets.retain(|s| !sets.iter().any(|freed| freed.0 == *s));
            }
            Some(_) => {
                engine_bail!("lumen::mock", "free on a pool without FREE_DESCRIPTOR_SET");
            }
            None => {
                engine_bail!("lumen::mock", "free on unknown pool {}", pool.0);
            }
        }
        let mut refund = Vec::new();
        for set in sets {
            if let Some(freed) = state.sets.remove(&set.0) {
                refund.extend(freed.charge);
            }
        }
        if let Some(p) = state.pools.get_mut(&pool.0) {
            for (kind, count) in refund {
                *p.remaining.entry(kind).or_insert(0) += count;
            }
        }
        Ok(())
    }

    fn reset_descriptor_pool(&self, pool: DescriptorPoolHandle) -> Result<()> {
        let mut state = self.state();
        let live = match state.pools.get_mut(&pool.0) {
            Some(p) => {
                p.remaining = p.capacity.clone();
                std::mem::take(&mut p.live_sets)
            }
            None => {
                engine_bail!("lumen::mock", "reset on unknown pool {}", pool.0);
            }
        };
        for set in live {
            state.sets.remove(&set);
        }
        Ok(())
    }

    fn update_descriptor_sets(&self, writes: &[DescriptorWrite]) -> Result<()> {
        let mut state = self.state();
        // Validate the whole batch before applying any of it
        for write in writes {
            let set = match state.sets.get(&write.set.0) {
                Some(set) => set,
                None => {
                    engine_bail!("lumen::mock", "write into unknown set {}", write.set.0);
                }
            };
            let known = state
                .layouts
                .get(&set.layout)
                .is_some_and(|l| l.bindings.iter().any(|b| b.binding == write.binding));
            if !known {
                engine_bail!("lumen::mock", "write into undeclared binding {}", write.binding);
            }
        }
        for write in writes {
            if let Some(set) = state.sets.get_mut(&write.set.0) {
                match &write.resources {
                    DescriptorResources::Buffers(buffers) => {
                        for (i, b) in buffers.iter().enumerate() {
                            set.descriptors.insert((write.binding, write.array_element + i as u32), MockDescriptor::Buffer(*b));
                        }
                    }
                    DescriptorResources::Images(images) => {
                        for (i, img) in images.iter().enumerate() {
                            set.descriptors.insert((write.binding, write.array_element + i as u32), MockDescriptor::Image(*img));
                        }
                    }
                }
            }
        }
        state.update_calls += 1;
        Ok(())
    }

    fn create_frame_slot(&self, index: usize) -> Result<Box<dyn FrameSlot>> {
        Ok(Box::new(MockFrameSlot {
            index,
            state: Arc::clone(&self.state),
            command_list: MockCommandList {
                state: Arc::clone(&self.state),
                recording: false,
                in_render_pass: false,
            },
        }))
    }

    fn create_swapchain(
        &self,
        extent: Extent2D,
        previous: Option<&dyn Swapchain>,
    ) -> Result<Option<Box<dyn Swapchain>>> {
        let mut state = self.state();
        if state.deferred_swapchains > 0 {
            state.deferred_swapchains -= 1;
            state.log("create_swapchain deferred");
            return Ok(None);
        }
        let handle = state.mint();
        let render_pass = state.mint();
        state.swapchains_created += 1;
        state.swapchain_hints.push(previous.map(|p| p.raw_handle()));
        state.log(format!("create_swapchain {}x{}", extent.width, extent.height));
        Ok(Some(Box::new(MockSwapchain {
            handle,
            render_pass,
            extent,
            image_format: state.image_format,
            depth_format: state.depth_format,
            image_count: state.image_count,
            next_image: 0,
            state: Arc::clone(&self.state),
        })))
    }

    fn wait_idle(&self) -> Result<()> {
        let mut state = self.state();
        state.wait_idle_calls += 1;
        state.log("wait_idle");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
