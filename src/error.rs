use std::path::PathBuf;

/// Errors raised by the engine shell around the camera core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter: {0}")]
    RequestAdapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to request device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("image decode error in {path:?}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("no shader named {0:?}")]
    UnknownShader(String),
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("skybox face {face} not found in {dir:?}")]
    MissingSkyboxFace { dir: PathBuf, face: &'static str },
    #[error("skybox face {face} is {width}x{height}, expected {expected}x{expected}")]
    SkyboxFaceSize {
        face: &'static str,
        width: u32,
        height: u32,
        expected: u32,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
