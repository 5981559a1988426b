// VIEW: GPU setup, shaders and drawing
pub mod backend;
pub mod gpu_init;
pub mod render;
pub mod shader;
pub mod skybox;

pub use backend::{ProgramHandle, RenderingBackend};
pub use gpu_init::GpuContext;
pub use render::{OverlayFrame, Renderer};
pub use shader::ShaderLibrary;
pub use skybox::CubeFaces;
