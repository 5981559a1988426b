use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::error::{Error, Result};
use crate::view::backend::{ProgramHandle, RenderingBackend};

pub const PRIMITIVE_SHADER: &str = "primitive";
pub const SKYBOX_SHADER: &str = "skybox";

fn builtin_source(name: &str) -> Option<&'static str> {
    match name {
        PRIMITIVE_SHADER => Some(include_str!("shaders/primitive.wgsl")),
        SKYBOX_SHADER => Some(include_str!("shaders/skybox.wgsl")),
        _ => None,
    }
}

/// WGSL for `name`: `<dir>/<name>.wgsl` when present, the embedded copy otherwise.
pub fn load_source(name: &str, dir: Option<&Path>) -> Result<Cow<'static, str>> {
    if let Some(dir) = dir {
        let path = dir.join(format!("{name}.wgsl"));
        if path.is_file() {
            let source = std::fs::read_to_string(&path).map_err(|source| Error::Io {
                path: path.clone(),
                source,
            })?;
            tracing::info!(?path, "shader override loaded");
            return Ok(Cow::Owned(source));
        }
    }
    builtin_source(name)
        .map(Cow::Borrowed)
        .ok_or_else(|| Error::UnknownShader(name.to_string()))
}

/// Per-program camera block, laid out as the `Camera` struct in the shaders.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self {
            projection: Mat4::IDENTITY.to_cols_array_2d(),
            view: Mat4::IDENTITY.to_cols_array_2d(),
        }
    }
}

impl CameraUniform {
    fn slot_mut(&mut self, name: &str) -> Option<&mut [[f32; 4]; 4]> {
        match name {
            "projection" => Some(&mut self.projection),
            "view" => Some(&mut self.view),
            _ => None,
        }
    }
}

/// CPU copies of every program's uniforms; written by the camera, flushed by the renderer.
#[derive(Debug, Default)]
pub struct UniformTable {
    blocks: Vec<(String, CameraUniform, bool)>,
}

impl UniformTable {
    pub fn register(&mut self, label: &str) -> ProgramHandle {
        self.blocks.push((label.to_string(), CameraUniform::default(), true));
        ProgramHandle(self.blocks.len() as u32 - 1)
    }

    pub fn get(&self, program: ProgramHandle) -> Option<&CameraUniform> {
        self.blocks.get(program.0 as usize).map(|(_, block, _)| block)
    }

    /// Hands out blocks written since the last drain.
    pub fn drain_dirty(&mut self) -> impl Iterator<Item = (ProgramHandle, CameraUniform)> + '_ {
        self.blocks
            .iter_mut()
            .enumerate()
            .filter(|(_, (_, _, dirty))| *dirty)
            .map(|(index, (_, block, dirty))| {
                *dirty = false;
                (ProgramHandle(index as u32), *block)
            })
    }
}

impl RenderingBackend for UniformTable {
    fn set_uniform_mat4(&mut self, program: ProgramHandle, name: &str, matrix: &Mat4) {
        let Some((label, block, dirty)) = self.blocks.get_mut(program.0 as usize) else {
            tracing::warn!(?program, name, "uniform write to unknown program ignored");
            return;
        };
        match block.slot_mut(name) {
            Some(slot) => {
                *slot = matrix.to_cols_array_2d();
                *dirty = true;
            }
            None => tracing::warn!(program = %label, name, "unknown uniform ignored"),
        }
    }
}

/// Compiled shader modules plus one camera uniform buffer per program.
pub struct ShaderLibrary {
    dir: Option<PathBuf>,
    modules: HashMap<String, wgpu::ShaderModule>,
    uniforms: UniformTable,
    buffers: Vec<wgpu::Buffer>,
}

impl ShaderLibrary {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self {
            dir,
            modules: HashMap::new(),
            uniforms: UniformTable::default(),
            buffers: Vec::new(),
        }
    }

    /// Compiles `name` on first use.
    pub fn module(&mut self, device: &wgpu::Device, name: &str) -> Result<&wgpu::ShaderModule> {
        if !self.modules.contains_key(name) {
            let source = load_source(name, self.dir.as_deref())?;
            let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(name),
                source: wgpu::ShaderSource::Wgsl(source),
            });
            tracing::debug!(name, "shader compiled");
            self.modules.insert(name.to_string(), module);
        }
        self.modules
            .get(name)
            .ok_or_else(|| Error::UnknownShader(name.to_string()))
    }

    pub fn register_program(&mut self, device: &wgpu::Device, label: &str) -> ProgramHandle {
        let handle = self.uniforms.register(label);
        self.buffers.push(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{label} camera uniforms")),
            size: std::mem::size_of::<CameraUniform>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        handle
    }

    pub fn buffer(&self, program: ProgramHandle) -> Option<&wgpu::Buffer> {
        self.buffers.get(program.0 as usize)
    }

    pub fn uniforms(&self) -> &UniformTable {
        &self.uniforms
    }

    /// Uploads every block written since the previous flush.
    pub fn flush(&mut self, queue: &wgpu::Queue) {
        for (program, block) in self.uniforms.drain_dirty() {
            if let Some(buffer) = self.buffers.get(program.0 as usize) {
                queue.write_buffer(buffer, 0, bytemuck::bytes_of(&block));
            }
        }
    }
}

impl RenderingBackend for ShaderLibrary {
    fn set_uniform_mat4(&mut self, program: ProgramHandle, name: &str, matrix: &Mat4) {
        self.uniforms.set_uniform_mat4(program, name, matrix);
    }
}
