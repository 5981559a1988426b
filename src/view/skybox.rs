use std::path::{Path, PathBuf};

use glam::Vec3;
use image::{Rgba, RgbaImage};

use crate::error::{Error, Result};

/// Cube layer order expected by the GPU: +X, -X, +Y, -Y, +Z, -Z.
pub const FACE_NAMES: [&str; 6] = ["posx", "negx", "posy", "negy", "posz", "negz"];

/// Tried in this order for every face.
pub const FACE_EXTENSIONS: [&str; 3] = ["dds", "png", "webp"];

pub const GRADIENT_FACE_SIZE: u32 = 64;

const ZENITH: Vec3 = Vec3::new(0.25, 0.45, 0.85);
const HORIZON: Vec3 = Vec3::new(0.85, 0.9, 0.97);
const GROUND: Vec3 = Vec3::new(0.35, 0.33, 0.3);

/// Six square, equally sized RGBA faces.
#[derive(Debug, Clone)]
pub struct CubeFaces {
    size: u32,
    faces: Vec<RgbaImage>,
}

fn find_face(dir: &Path, prefix: &str, face: &str) -> Option<PathBuf> {
    FACE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{prefix}{face}.{ext}")))
        .find(|path| path.is_file())
}

/// Direction through pixel (u, v) of `face`, both in [-1, 1], v pointing down.
fn face_direction(face: usize, u: f32, v: f32) -> Vec3 {
    match face {
        0 => Vec3::new(1.0, -v, -u),
        1 => Vec3::new(-1.0, -v, u),
        2 => Vec3::new(u, 1.0, v),
        3 => Vec3::new(u, -1.0, -v),
        4 => Vec3::new(u, -v, 1.0),
        _ => Vec3::new(-u, -v, -1.0),
    }
    .normalize()
}

fn sky_color(direction: Vec3) -> Rgba<u8> {
    let c = if direction.y >= 0.0 {
        HORIZON.lerp(ZENITH, direction.y.sqrt())
    } else {
        HORIZON.lerp(GROUND, (-direction.y).sqrt())
    };
    let c = (c * 255.0).round();
    Rgba([c.x as u8, c.y as u8, c.z as u8, 255])
}

impl CubeFaces {
    /// Loads `<prefix>posx` .. `<prefix>negz` from `dir`.
    pub fn load_from_dir(dir: &Path, prefix: &str) -> Result<Self> {
        let mut faces = Vec::with_capacity(FACE_NAMES.len());
        let mut size = None;

        for face in FACE_NAMES {
            let path = find_face(dir, prefix, face).ok_or_else(|| Error::MissingSkyboxFace {
                dir: dir.to_path_buf(),
                face,
            })?;
            let image = image::open(&path)
                .map_err(|source| Error::Image {
                    path: path.clone(),
                    source,
                })?
                .to_rgba8();

            let expected = *size.get_or_insert(image.width());
            if image.width() != expected || image.height() != expected {
                return Err(Error::SkyboxFaceSize {
                    face,
                    width: image.width(),
                    height: image.height(),
                    expected,
                });
            }
            tracing::debug!(?path, "skybox face loaded");
            faces.push(image);
        }

        Ok(Self {
            size: size.unwrap_or(0),
            faces,
        })
    }

    /// Sky-blue zenith fading to a pale horizon and a dark ground.
    pub fn procedural_gradient(size: u32) -> Self {
        let size = size.max(1);
        let faces = (0..FACE_NAMES.len())
            .map(|face| {
                RgbaImage::from_fn(size, size, |x, y| {
                    let u = (x as f32 + 0.5) / size as f32 * 2.0 - 1.0;
                    let v = (y as f32 + 0.5) / size as f32 * 2.0 - 1.0;
                    sky_color(face_direction(face, u, v))
                })
            })
            .collect();
        Self { size, faces }
    }

    /// Loads from `dir` when given, falling back to the gradient on any failure.
    pub fn load_or_gradient(dir: Option<&Path>, prefix: &str) -> Self {
        let Some(dir) = dir else {
            return Self::procedural_gradient(GRADIENT_FACE_SIZE);
        };
        match Self::load_from_dir(dir, prefix) {
            Ok(faces) => {
                tracing::info!(?dir, size = faces.size, "skybox loaded");
                faces
            }
            Err(err) => {
                tracing::warn!(%err, "skybox unavailable, using procedural gradient");
                Self::procedural_gradient(GRADIENT_FACE_SIZE)
            }
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn faces(&self) -> &[RgbaImage] {
        &self.faces
    }
}

/// The uploaded cubemap and its sampling state.
pub struct SkyboxTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl SkyboxTexture {
    pub fn upload(device: &wgpu::Device, queue: &wgpu::Queue, faces: &CubeFaces) -> Self {
        let size = wgpu::Extent3d {
            width: faces.size,
            height: faces.size,
            depth_or_array_layers: FACE_NAMES.len() as u32,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("skybox_texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (layer, face) in faces.faces.iter().enumerate() {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d {
                        x: 0,
                        y: 0,
                        z: layer as u32,
                    },
                    aspect: wgpu::TextureAspect::All,
                },
                face.as_raw(),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * faces.size),
                    rows_per_image: Some(faces.size),
                },
                wgpu::Extent3d {
                    depth_or_array_layers: 1,
                    ..size
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("skybox_view"),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("skybox_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }
}
