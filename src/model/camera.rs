use glam::{Mat3, Mat4, Vec3};

pub const WORLD_UP: Vec3 = Vec3::Y;

/// Yaw the camera faces after a reset: looking down -Z.
pub const FORWARD_YAW: f32 = -std::f32::consts::FRAC_PI_2;

/// Look angles in radians. `current_*` is what the camera shows, `target_*`
/// is where input wants it to be.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    pub current_yaw: f32,
    pub current_pitch: f32,
    pub target_yaw: f32,
    pub target_pitch: f32,
}

impl Orientation {
    pub fn forward_facing() -> Self {
        Self {
            current_yaw: FORWARD_YAW,
            current_pitch: 0.0,
            target_yaw: FORWARD_YAW,
            target_pitch: 0.0,
        }
    }

    pub fn is_converged(&self) -> bool {
        self.current_yaw == self.target_yaw && self.current_pitch == self.target_pitch
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Self::forward_facing()
    }
}

/// Orthonormal camera frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Basis {
    pub front: Vec3,
    pub right: Vec3,
    pub up: Vec3,
}

/// Spherical to Cartesian look direction.
pub fn look_direction(yaw: f32, pitch: f32) -> Vec3 {
    Vec3::new(
        yaw.cos() * pitch.cos(),
        pitch.sin(),
        yaw.sin() * pitch.cos(),
    )
    .normalize()
}

/// Re-orthogonalizes `right`/`up` from `front` and the fixed world up.
///
/// When `front` is (anti)parallel to world up the cross product vanishes; the
/// horizontal heading given by `yaw` is used instead so `right` stays unit
/// length through the pole.
pub fn orthonormal_basis(front: Vec3, yaw: f32) -> Basis {
    let right = WORLD_UP
        .cross(front)
        .try_normalize()
        .unwrap_or_else(|| WORLD_UP.cross(Vec3::new(yaw.cos(), 0.0, yaw.sin())).normalize());
    let up = front.cross(right);
    Basis { front, right, up }
}

/// Basis for the currently displayed angles of `orientation`.
pub fn derive_basis(orientation: &Orientation) -> Basis {
    let front = look_direction(orientation.current_yaw, orientation.current_pitch);
    orthonormal_basis(front, orientation.current_yaw)
}

/// Right-handed look-at from `position` toward `position + front`.
pub fn build_view_matrix(position: Vec3, front: Vec3, up: Vec3) -> Mat4 {
    Mat4::look_at_rh(position, position + front, up)
}

/// View matrix with the translation removed, for geometry pinned to the eye.
pub fn skybox_view(view: &Mat4) -> Mat4 {
    Mat4::from_mat3(Mat3::from_mat4(*view))
}

/// Perspective parameters. Depth maps to 0..1 as wgpu expects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fov_y: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Projection {
    pub fn new(fov_y: f32, width: u32, height: u32, z_near: f32, z_far: f32) -> Self {
        Self {
            fov_y,
            aspect: aspect_ratio(width, height),
            z_near,
            z_far,
        }
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = aspect_ratio(width, height);
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.z_near, self.z_far)
    }
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}

/// Everything the renderer needs to know about the eye.
#[derive(Debug, Clone)]
pub struct CameraState {
    pub position: Vec3,
    pub front: Vec3,
    pub up: Vec3,
    pub right: Vec3,
    pub view: Mat4,
    pub projection: Mat4,
}

impl CameraState {
    pub fn new(position: Vec3, basis: Basis, projection: Mat4) -> Self {
        Self {
            position,
            front: basis.front,
            up: basis.up,
            right: basis.right,
            view: build_view_matrix(position, basis.front, basis.up),
            projection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f32 = 1e-5;

    fn assert_orthonormal(basis: &Basis) {
        assert!((basis.front.length() - 1.0).abs() < TOLERANCE, "front not unit: {:?}", basis);
        assert!((basis.right.length() - 1.0).abs() < TOLERANCE, "right not unit: {:?}", basis);
        assert!((basis.up.length() - 1.0).abs() < TOLERANCE, "up not unit: {:?}", basis);
        assert!(basis.front.dot(basis.right).abs() < TOLERANCE, "front/right: {:?}", basis);
        assert!(basis.front.dot(basis.up).abs() < TOLERANCE, "front/up: {:?}", basis);
        assert!(basis.right.dot(basis.up).abs() < TOLERANCE, "right/up: {:?}", basis);
    }

    fn at(yaw: f32, pitch: f32) -> Orientation {
        Orientation {
            current_yaw: yaw,
            current_pitch: pitch,
            target_yaw: yaw,
            target_pitch: pitch,
        }
    }

    #[test]
    fn forward_facing_looks_down_negative_z() {
        let basis = derive_basis(&Orientation::forward_facing());
        assert!(basis.front.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), TOLERANCE));
        assert!(basis.up.abs_diff_eq(Vec3::Y, TOLERANCE));
        assert!(basis.right.abs_diff_eq(Vec3::new(-1.0, 0.0, 0.0), TOLERANCE));
    }

    #[test]
    fn basis_is_orthonormal_off_the_poles() {
        let mut yaw = -std::f32::consts::PI;
        while yaw <= std::f32::consts::PI {
            let mut pitch = -1.55;
            while pitch <= 1.55 {
                assert_orthonormal(&derive_basis(&at(yaw, pitch)));
                pitch += 0.05;
            }
            yaw += 0.1;
        }
    }

    #[test]
    fn basis_survives_the_pole() {
        let basis = derive_basis(&at(0.3, std::f32::consts::FRAC_PI_2));
        assert!(basis.right.is_finite());
        assert!((basis.right.length() - 1.0).abs() < TOLERANCE);
        assert!(basis.front.dot(basis.right).abs() < TOLERANCE);
    }

    #[test]
    fn exact_pole_falls_back_to_yaw_heading() {
        for yaw in [0.0f32, 0.3, -2.0] {
            for front in [Vec3::Y, Vec3::NEG_Y] {
                let basis = orthonormal_basis(front, yaw);
                assert!(basis.right.is_finite());
                assert!(basis
                    .right
                    .abs_diff_eq(Vec3::new(yaw.sin(), 0.0, -yaw.cos()), TOLERANCE));
                assert!(basis.front.dot(basis.right).abs() < TOLERANCE);
                assert!((basis.up.length() - 1.0).abs() < TOLERANCE);
            }
        }
    }

    #[test]
    fn derive_basis_is_bit_identical() {
        let orientation = at(0.731, -0.219);
        let a = derive_basis(&orientation);
        let b = derive_basis(&orientation);
        assert_eq!(a.front.to_array(), b.front.to_array());
        assert_eq!(a.right.to_array(), b.right.to_array());
        assert_eq!(a.up.to_array(), b.up.to_array());
    }

    #[test]
    fn view_matrix_puts_target_in_front_of_eye() {
        let position = Vec3::new(1.0, 2.0, 3.0);
        let basis = derive_basis(&at(0.4, 0.2));
        let view = build_view_matrix(position, basis.front, basis.up);

        let eye = view.transform_point3(position);
        assert!(eye.abs_diff_eq(Vec3::ZERO, TOLERANCE));

        // Right-handed: the look target lands on -Z in view space.
        let target = view.transform_point3(position + basis.front);
        assert!(target.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), TOLERANCE));
    }

    #[test]
    fn skybox_view_drops_translation() {
        let basis = derive_basis(&at(0.4, 0.2));
        let view = build_view_matrix(Vec3::new(5.0, -2.0, 9.0), basis.front, basis.up);
        let sky = skybox_view(&view);
        assert_eq!(sky.w_axis, glam::Vec4::W);
        assert!(sky
            .transform_vector3(basis.front)
            .abs_diff_eq(view.transform_vector3(basis.front), TOLERANCE));
    }

    #[test]
    fn projection_tracks_aspect() {
        let mut projection = Projection::new(45f32.to_radians(), 1024, 768, 0.1, 100.0);
        assert!((projection.aspect - 1024.0 / 768.0).abs() < TOLERANCE);
        projection.set_aspect(800, 0);
        assert_eq!(projection.aspect, 800.0);
    }
}
