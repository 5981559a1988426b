use glam::Mat4;

/// Opaque id of a shader program owned by the rendering backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

/// The single call the camera core makes into the renderer.
pub trait RenderingBackend {
    fn set_uniform_mat4(&mut self, program: ProgramHandle, name: &str, matrix: &Mat4);
}
