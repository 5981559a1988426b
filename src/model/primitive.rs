use glam::{EulerRot, Mat4, Quat, Vec3};

use crate::utils::Mesh;

/// The closed set of things the engine knows how to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    /// UV sphere.
    Sphere { radius: f32, slices: u32, stacks: u32 },
    /// Square on the XZ plane, `scale` units to a side.
    Plane { scale: f32 },
    /// Unit cube seen from the inside, textured with the sky cubemap.
    Skybox,
}

impl Primitive {
    pub fn sphere() -> Self {
        Primitive::Sphere {
            radius: 0.3,
            slices: 100,
            stacks: 100,
        }
    }

    pub fn plane() -> Self {
        Primitive::Plane { scale: 1.0 }
    }

    pub fn mesh(&self) -> Mesh {
        match *self {
            Primitive::Sphere { radius, slices, stacks } => Mesh::sphere(radius, slices, stacks),
            Primitive::Plane { scale } => Mesh::plane(scale),
            Primitive::Skybox => Mesh::skybox_cube(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Primitive::Sphere { .. } => "sphere",
            Primitive::Plane { .. } => "plane",
            Primitive::Skybox => "skybox",
        }
    }
}

/// Placement of a primitive in the world. Rotation is Euler degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation_degrees: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation_degrees: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn rotation(&self) -> Quat {
        // Through a quaternion so stacked rotations don't lock up.
        let r = self.rotation_degrees;
        Quat::from_euler(EulerRot::XYZ, r.x.to_radians(), r.y.to_radians(), r.z.to_radians())
    }

    /// Scale first, then rotate, then translate.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_quat(self.rotation())
            * Mat4::from_scale(self.scale)
    }
}

/// What an actor hands the renderer each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drawable {
    pub primitive: Primitive,
    pub transform: Transform,
    pub color: [f32; 4],
}
