/// SPIR-V loading for pass pipelines

use std::path::Path;

use crate::error::{Error, Result};
use crate::engine_error;

const SPIRV_MAGIC: u32 = 0x0723_0203;

/// Vertex and fragment SPIR-V of one pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderPair {
    pub vertex: Vec<u8>,
    pub fragment: Vec<u8>,
}

impl ShaderPair {
    /// Validated pair from in-memory bytecode
    pub fn new(vertex: Vec<u8>, fragment: Vec<u8>) -> Result<Self> {
        check_spirv(&vertex)?;
        check_spirv(&fragment)?;
        Ok(Self { vertex, fragment })
    }

    pub fn load(vertex: impl AsRef<Path>, fragment: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            vertex: load_shader(vertex)?,
            fragment: load_shader(fragment)?,
        })
    }
}

/// Read a compiled `.spv` file
pub fn load_shader(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| {
        let message = format!("failed to read shader {}: {}", path.display(), e);
        engine_error!("lumen::pass", "{}", message);
        Error::InvalidResource(message)
    })?;
    check_spirv(&bytes).map_err(|e| {
        engine_error!("lumen::pass", "{}: {}", path.display(), e);
        e
    })?;
    Ok(bytes)
}

/// Reject bytecode that is not word-aligned or lacks the SPIR-V magic
pub fn check_spirv(bytes: &[u8]) -> Result<()> {
    if bytes.len() < 4 || bytes.len() % 4 != 0 {
        return Err(Error::InvalidResource(format!(
            "SPIR-V size {} is not a non-zero multiple of 4", bytes.len()
        )));
    }
    let magic = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    if magic != SPIRV_MAGIC {
        return Err(Error::InvalidResource(format!("bad SPIR-V magic {:#010x}", magic)));
    }
    Ok(())
}
