//! Resource-level mesh types.
//!
//! # Hierarchy
//!
//! - **Vertex**: interleaved vertex as the opaque pipeline reads it
//! - **MeshData**: CPU-side vertices and indices produced by the loaders
//! - **Mesh**: GPU vertex buffer plus optional index buffer
//!
//! ```text
//! file.obj / file.gltf / file.glb
//!     └── model_loader ──> MeshData ──compute_tangents──> MeshData
//!                                          └── Mesh::new ──> Mesh (GPU)
//! ```

use std::path::Path;
use std::sync::Arc;
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use crate::error::{Error, Result};
use crate::graphics_device::{
    GraphicsDevice,
    Buffer,
    BufferDesc,
    BufferUsage,
    BufferFormat,
    CommandList,
    IndexType,
    VertexLayout,
    VertexBinding,
    VertexAttribute,
};
use crate::resource::model_loader;
use crate::{engine_debug, engine_error};

// ============================================================================
// VERTEX
// ============================================================================

/// Interleaved vertex: position, color, normal, uv, tangent
///
/// `tangent.w` holds the bitangent handedness (+1 or -1).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub tangent: [f32; 4],
}

impl Vertex {
    /// Stride of one vertex in bytes
    pub const STRIDE: u32 = std::mem::size_of::<Vertex>() as u32;

    /// Vertex input layout matching this struct (binding 0, locations 0..=4)
    pub fn layout() -> VertexLayout {
        let formats = [
            BufferFormat::R32G32B32_SFLOAT,    // position
            BufferFormat::R32G32B32_SFLOAT,    // color
            BufferFormat::R32G32B32_SFLOAT,    // normal
            BufferFormat::R32G32_SFLOAT,       // uv
            BufferFormat::R32G32B32A32_SFLOAT, // tangent
        ];
        let mut offset = 0;
        let attributes = formats
            .iter()
            .enumerate()
            .map(|(location, &format)| {
                let attribute = VertexAttribute {
                    location: location as u32,
                    binding: 0,
                    format,
                    offset,
                };
                offset += format.size_bytes();
                attribute
            })
            .collect();

        VertexLayout {
            bindings: vec![VertexBinding { binding: 0, stride: Self::STRIDE }],
            attributes,
        }
    }

    /// Bit pattern used to merge identical vertices
    pub(crate) fn dedup_key(&self) -> [u32; 15] {
        bytemuck::cast(*self)
    }
}

// ============================================================================
// MESH DATA
// ============================================================================

/// Vertices and triangle-list indices on the CPU
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    /// Empty for non-indexed geometry
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Load a model, picking the decoder from the file extension
    ///
    /// `.obj` goes through the OBJ loader, `.gltf` and `.glb` through the
    /// glTF loader. Tangents are computed before returning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        let mut data = match extension.as_deref() {
            Some("obj") => model_loader::load_obj(path)?,
            Some("gltf") | Some("glb") => model_loader::load_gltf(path)?,
            _ => {
                let message = format!("Unsupported model format: {}", path.display());
                engine_error!("lumen::resource", "{}", message);
                return Err(Error::UnsupportedAsset(message));
            }
        };
        data.compute_tangents();

        engine_debug!("lumen::resource", "Loaded model {} ({} vertices, {} indices)",
            path.display(), data.vertices.len(), data.indices.len());
        Ok(data)
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Fill `tangent` from triangle UV gradients
    ///
    /// Per-triangle tangents and bitangents are summed per vertex, then the
    /// tangent is Gram-Schmidt orthogonalized against the normal. Triangles
    /// with a degenerate UV mapping contribute nothing; a vertex left with
    /// no usable tangent gets an arbitrary one perpendicular to its normal.
    pub fn compute_tangents(&mut self) {
        let count = self.vertices.len();
        let mut tangents = vec![Vec3::ZERO; count];
        let mut bitangents = vec![Vec3::ZERO; count];

        let triangles: Vec<[usize; 3]> = if self.indices.is_empty() {
            (0..count / 3).map(|t| [3 * t, 3 * t + 1, 3 * t + 2]).collect()
        } else {
            self.indices
                .chunks_exact(3)
                .map(|tri| [tri[0] as usize, tri[1] as usize, tri[2] as usize])
                .collect()
        };

        for [i0, i1, i2] in triangles {
            if i0 >= count || i1 >= count || i2 >= count {
                continue;
            }
            let (v0, v1, v2) = (&self.vertices[i0], &self.vertices[i1], &self.vertices[i2]);

            let edge1 = Vec3::from(v1.position) - Vec3::from(v0.position);
            let edge2 = Vec3::from(v2.position) - Vec3::from(v0.position);
            let duv1 = Vec2::from(v1.uv) - Vec2::from(v0.uv);
            let duv2 = Vec2::from(v2.uv) - Vec2::from(v0.uv);

            let det = duv1.x * duv2.y - duv2.x * duv1.y;
            if det.abs() <= f32::EPSILON {
                continue;
            }
            let f = 1.0 / det;
            let tangent = f * (duv2.y * edge1 - duv1.y * edge2);
            let bitangent = f * (duv1.x * edge2 - duv2.x * edge1);

            for i in [i0, i1, i2] {
                tangents[i] += tangent;
                bitangents[i] += bitangent;
            }
        }

        for (i, vertex) in self.vertices.iter_mut().enumerate() {
            let normal = Vec3::from(vertex.normal).normalize_or_zero();
            let raw = tangents[i];

            let mut tangent = (raw - normal * normal.dot(raw)).normalize_or_zero();
            if tangent == Vec3::ZERO {
                tangent = if normal == Vec3::ZERO { Vec3::X } else { normal.any_orthonormal_vector() };
            }
            let handedness = if normal.cross(tangent).dot(bitangents[i]) < 0.0 { -1.0 } else { 1.0 };

            vertex.tangent = tangent.extend(handedness).to_array();
        }
    }
}

// ============================================================================
// GPU MESH
// ============================================================================

/// Vertex buffer with an optional 32-bit index buffer
pub struct Mesh {
    vertex_buffer: Arc<dyn Buffer>,
    index_buffer: Option<Arc<dyn Buffer>>,
    vertex_count: u32,
    index_count: u32,
}

impl Mesh {
    /// Upload `data` to device buffers
    ///
    /// Fails with `InvalidResource` for fewer than 3 vertices.
    pub fn new(device: &dyn GraphicsDevice, data: &MeshData) -> Result<Self> {
        if data.vertices.len() < 3 {
            return Err(Error::InvalidResource(format!(
                "mesh needs at least 3 vertices, got {}", data.vertices.len()
            )));
        }

        let vertex_buffer = device.create_buffer(&BufferDesc::with_data(
            BufferUsage::Vertex,
            bytemuck::cast_slice(&data.vertices),
        ))?;

        let index_buffer = if data.indices.is_empty() {
            None
        } else {
            Some(device.create_buffer(&BufferDesc::with_data(
                BufferUsage::Index,
                bytemuck::cast_slice(&data.indices),
            ))?)
        };

        Ok(Self {
            vertex_buffer,
            index_buffer,
            vertex_count: data.vertex_count(),
            index_count: data.index_count(),
        })
    }

    /// Load a model file and upload it
    pub fn from_file(device: &dyn GraphicsDevice, path: impl AsRef<Path>) -> Result<Self> {
        let data = MeshData::load(path)?;
        Self::new(device, &data)
    }

    /// Bind the vertex buffer, and the index buffer when there is one
    pub fn bind(&self, command_list: &mut dyn CommandList) -> Result<()> {
        command_list.bind_vertex_buffer(self.vertex_buffer.as_ref(), 0)?;
        if let Some(index_buffer) = &self.index_buffer {
            command_list.bind_index_buffer(index_buffer.as_ref(), 0, IndexType::U32)?;
        }
        Ok(())
    }

    /// Indexed draw when the mesh has indices, plain draw otherwise
    pub fn draw(&self, command_list: &mut dyn CommandList) -> Result<()> {
        if self.index_buffer.is_some() {
            command_list.draw_indexed(self.index_count, 0, 0)
        } else {
            command_list.draw(self.vertex_count, 0)
        }
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn has_index_buffer(&self) -> bool {
        self.index_buffer.is_some()
    }

    pub fn vertex_buffer(&self) -> &Arc<dyn Buffer> {
        &self.vertex_buffer
    }
}

impl std::fmt::Debug for Mesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mesh")
            .field("vertex_count", &self.vertex_count)
            .field("index_count", &self.index_count)
            .finish()
    }
}

#[cfg(test)]
#[path = "mesh_tests.rs"]
mod tests;
