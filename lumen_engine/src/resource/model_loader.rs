/// Model file decoding into `MeshData`
///
/// Both decoders walk the index stream and merge vertices whose every
/// attribute is bit-identical, so the output is always indexed.

use std::io::BufRead;
use std::path::Path;
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::resource::{MeshData, Vertex};
use crate::{engine_error, engine_warn};

/// Builds an indexed vertex list, merging duplicates
#[derive(Default)]
struct VertexDedup {
    data: MeshData,
    unique: FxHashMap<[u32; 15], u32>,
}

impl VertexDedup {
    fn push(&mut self, vertex: Vertex) {
        let next = self.data.vertices.len() as u32;
        let index = *self.unique.entry(vertex.dedup_key()).or_insert(next);
        if index == next {
            self.data.vertices.push(vertex);
        }
        self.data.indices.push(index);
    }
}

// ===== OBJ =====

fn obj_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        single_index: false,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    }
}

fn obj_error(source: &str, error: tobj::LoadError) -> Error {
    let message = format!("failed to load OBJ {}: {}", source, error);
    engine_error!("lumen::resource", "{}", message);
    Error::InvalidResource(message)
}

/// Load a Wavefront OBJ file
///
/// UVs are taken as stored. Missing vertex colors default to white and
/// missing normals to zero.
pub fn load_obj(path: &Path) -> Result<MeshData> {
    let (models, _materials) = tobj::load_obj(path, &obj_options())
        .map_err(|e| obj_error(&path.display().to_string(), e))?;
    Ok(obj_models_to_mesh(&models))
}

/// Decode OBJ text from a reader; `mtllib` statements are rejected
pub fn parse_obj(reader: &mut impl BufRead) -> Result<MeshData> {
    let (models, _materials) = tobj::load_obj_buf(reader, &obj_options(), |_| {
        Err(tobj::LoadError::OpenFileFailed)
    })
    .map_err(|e| obj_error("buffer", e))?;
    Ok(obj_models_to_mesh(&models))
}

fn obj_models_to_mesh(models: &[tobj::Model]) -> MeshData {
    let mut dedup = VertexDedup::default();

    for model in models {
        let mesh = &model.mesh;
        for (i, &position_index) in mesh.indices.iter().enumerate() {
            let p = position_index as usize;
            let mut vertex = Vertex {
                position: read3(&mesh.positions, p),
                color: [1.0; 3],
                ..Default::default()
            };
            if mesh.vertex_color.len() >= 3 * (p + 1) {
                vertex.color = read3(&mesh.vertex_color, p);
            }
            if let Some(&n) = mesh.normal_indices.get(i) {
                vertex.normal = read3(&mesh.normals, n as usize);
            }
            if let Some(&t) = mesh.texcoord_indices.get(i) {
                let t = t as usize;
                if mesh.texcoords.len() >= 2 * (t + 1) {
                    vertex.uv = [mesh.texcoords[2 * t], mesh.texcoords[2 * t + 1]];
                }
            }
            dedup.push(vertex);
        }
    }

    dedup.data
}

fn read3(values: &[f32], index: usize) -> [f32; 3] {
    match values.get(3 * index..3 * index + 3) {
        Some(v) => [v[0], v[1], v[2]],
        None => [0.0; 3],
    }
}

// ===== GLTF =====

/// Load a `.gltf` or `.glb` file
///
/// All triangle primitives of all meshes are merged. The V texture
/// coordinate is flipped (`1 - v`).
pub fn load_gltf(path: &Path) -> Result<MeshData> {
    let (document, buffers, _images) = gltf::import(path).map_err(|e| {
        let message = format!("failed to load glTF {}: {}", path.display(), e);
        engine_error!("lumen::resource", "{}", message);
        Error::InvalidResource(message)
    })?;
    gltf_to_mesh(&document, &buffers)
}

/// Decode an in-memory glTF (JSON with embedded buffers, or GLB)
pub fn parse_gltf(bytes: &[u8]) -> Result<MeshData> {
    let (document, buffers, _images) = gltf::import_slice(bytes).map_err(|e| {
        let message = format!("failed to parse glTF: {}", e);
        engine_error!("lumen::resource", "{}", message);
        Error::InvalidResource(message)
    })?;
    gltf_to_mesh(&document, &buffers)
}

fn gltf_to_mesh(document: &gltf::Document, buffers: &[gltf::buffer::Data]) -> Result<MeshData> {
    let mut dedup = VertexDedup::default();

    for mesh in document.meshes() {
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                engine_warn!("lumen::resource", "Skipping {:?} primitive of mesh {}",
                    primitive.mode(), mesh.index());
                continue;
            }

            let reader = primitive.reader(|buffer| {
                buffers.get(buffer.index()).map(|data| data.0.as_slice())
            });

            let positions: Vec<[f32; 3]> = match reader.read_positions() {
                Some(positions) => positions.collect(),
                None => {
                    let message = format!("mesh {} has a primitive without POSITION", mesh.index());
                    engine_error!("lumen::resource", "{}", message);
                    return Err(Error::InvalidResource(message));
                }
            };
            let normals: Vec<[f32; 3]> = reader.read_normals().map(|n| n.collect()).unwrap_or_default();
            let uvs: Vec<[f32; 2]> = reader
                .read_tex_coords(0)
                .map(|uv| uv.into_f32().collect())
                .unwrap_or_default();
            let colors: Vec<[f32; 3]> = reader
                .read_colors(0)
                .map(|c| c.into_rgb_f32().collect())
                .unwrap_or_default();

            let indices: Vec<u32> = if primitive.indices().is_none() {
                (0..positions.len() as u32).collect()
            } else {
                match reader.read_indices() {
                    Some(indices) => indices.into_u32().collect(),
                    None => {
                        engine_error!("lumen::resource", "Unsupported index type in mesh {}", mesh.index());
                        return Err(Error::UnsupportedAsset("Unsupported index type".to_string()));
                    }
                }
            };

            for index in indices {
                let i = index as usize;
                let position = match positions.get(i) {
                    Some(&position) => position,
                    None => {
                        let message = format!("index {} out of range in mesh {}", index, mesh.index());
                        engine_error!("lumen::resource", "{}", message);
                        return Err(Error::InvalidResource(message));
                    }
                };
                let uv = uvs.get(i).map_or([0.0; 2], |&[u, v]| [u, 1.0 - v]);
                dedup.push(Vertex {
                    position,
                    color: colors.get(i).copied().unwrap_or([1.0; 3]),
                    normal: normals.get(i).copied().unwrap_or_default(),
                    uv,
                    tangent: [0.0; 4],
                });
            }
        }
    }

    Ok(dedup.data)
}

#[cfg(test)]
#[path = "model_loader_tests.rs"]
mod tests;
