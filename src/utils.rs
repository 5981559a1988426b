use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.indices.is_empty()
    }

    /// UV sphere with `slices` around the equator and `stacks` pole to pole.
    pub fn sphere(radius: f32, slices: u32, stacks: u32) -> Self {
        let slices = slices.max(3);
        let stacks = stacks.max(2);
        let mut mesh = Mesh::default();

        for stack in 0..=stacks {
            let v = stack as f32 / stacks as f32;
            let phi = std::f32::consts::PI * v;
            for slice in 0..=slices {
                let u = slice as f32 / slices as f32;
                let theta = std::f32::consts::TAU * u;
                let normal = [theta.cos() * phi.sin(), phi.cos(), theta.sin() * phi.sin()];
                mesh.vertices.push(Vertex {
                    pos: normal.map(|c| c * radius),
                    normal,
                    uv: [u, v],
                });
            }
        }

        let ring = slices + 1;
        for stack in 0..stacks {
            for slice in 0..slices {
                let a = stack * ring + slice;
                let b = a + ring;
                // Counter-clockwise seen from outside.
                mesh.indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
            }
        }
        mesh
    }

    /// Square facing +Y, centred on the origin.
    pub fn plane(scale: f32) -> Self {
        let h = scale * 0.5;
        let normal = [0.0, 1.0, 0.0];
        let corner = |x: f32, z: f32, uv: [f32; 2]| Vertex { pos: [x, 0.0, z], normal, uv };
        Mesh {
            vertices: vec![
                corner(-h, -h, [0.0, 0.0]),
                corner(h, -h, [1.0, 0.0]),
                corner(h, h, [1.0, 1.0]),
                corner(-h, h, [0.0, 1.0]),
            ],
            indices: vec![0, 2, 1, 0, 3, 2],
        }
    }

    /// Unit cube wound to be seen from the inside. Positions double as cubemap directions.
    pub fn skybox_cube() -> Self {
        let corners = [
            [-1.0, -1.0, -1.0],
            [1.0, -1.0, -1.0],
            [1.0, 1.0, -1.0],
            [-1.0, 1.0, -1.0],
            [-1.0, -1.0, 1.0],
            [1.0, -1.0, 1.0],
            [1.0, 1.0, 1.0],
            [-1.0, 1.0, 1.0],
        ];
        Mesh {
            vertices: corners
                .iter()
                .map(|&pos| Vertex { pos, normal: [0.0; 3], uv: [0.0; 2] })
                .collect(),
            indices: vec![
                0, 1, 2, 2, 3, 0, // -Z
                5, 4, 7, 7, 6, 5, // +Z
                4, 0, 3, 3, 7, 4, // -X
                1, 5, 6, 6, 2, 1, // +X
                3, 2, 6, 6, 7, 3, // +Y
                4, 5, 1, 1, 0, 4, // -Y
            ],
        }
    }

    pub fn upload(&self, device: &wgpu::Device, label: &str) -> MeshBuffer {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} vertices")),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} indices")),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        MeshBuffer {
            vertex_buffer,
            index_buffer,
            index_count: self.indices.len() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn triangle_normal(mesh: &Mesh, tri: &[u32]) -> Vec3 {
        let p = |i: u32| Vec3::from(mesh.vertices[i as usize].pos);
        (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]))
    }

    #[test]
    fn sphere_counts_and_normals() {
        let mesh = Mesh::sphere(0.3, 100, 100);
        assert_eq!(mesh.vertices.len(), 101 * 101);
        assert_eq!(mesh.indices.len(), 100 * 100 * 6);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
        for v in &mesh.vertices {
            assert!((Vec3::from(v.normal).length() - 1.0).abs() < 1e-5);
            assert!((Vec3::from(v.pos).length() - 0.3).abs() < 1e-5);
        }
    }

    #[test]
    fn sphere_faces_outward() {
        let mesh = Mesh::sphere(1.0, 16, 8);
        // A quad in the middle band, away from degenerate pole triangles.
        let start = (4 * 16 + 3) * 6;
        let tri = &mesh.indices[start..start + 3];
        let centroid: Vec3 = tri.iter().map(|&i| Vec3::from(mesh.vertices[i as usize].pos)).sum::<Vec3>() / 3.0;
        assert!(triangle_normal(&mesh, tri).dot(centroid) > 0.0);
    }

    #[test]
    fn plane_faces_up() {
        let mesh = Mesh::plane(4.0);
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.vertices[2].pos, [2.0, 0.0, 2.0]);
        for tri in mesh.indices.chunks(3) {
            assert!(triangle_normal(&mesh, tri).y > 0.0);
        }
    }

    #[test]
    fn skybox_faces_inward() {
        let mesh = Mesh::skybox_cube();
        assert_eq!(mesh.indices.len(), 36);
        for tri in mesh.indices.chunks(3) {
            let centroid: Vec3 = tri.iter().map(|&i| Vec3::from(mesh.vertices[i as usize].pos)).sum::<Vec3>() / 3.0;
            assert!(triangle_normal(&mesh, tri).dot(centroid) < 0.0, "{tri:?}");
        }
    }
}
