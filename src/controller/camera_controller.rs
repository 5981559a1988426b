use glam::Vec3;

use crate::controller::input::{InputProcessor, InputSnapshot};
use crate::controller::orientation::{OrientationSmoother, SmootherSettings};
use crate::model::camera::{self, CameraState, Orientation, Projection};
use crate::view::backend::{ProgramHandle, RenderingBackend};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSettings {
    pub fov_y: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub start_position: Vec3,
    /// World units per second while a movement key is held.
    pub base_speed: f32,
    pub look: SmootherSettings,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_y: 45f32.to_radians(),
            z_near: 0.1,
            z_far: 100.0,
            start_position: Vec3::new(0.0, 0.0, 3.0),
            base_speed: 2.5,
            look: SmootherSettings::default(),
        }
    }
}

/// Free-look fly camera: drag to look, keys to move.
pub struct CameraController {
    state: CameraState,
    smoother: OrientationSmoother,
    projection: Projection,
    processor: InputProcessor,
    pub base_speed: f32,
}

impl CameraController {
    pub fn new(settings: CameraSettings, width: u32, height: u32, processor: InputProcessor) -> Self {
        let smoother = OrientationSmoother::new(settings.look);
        let projection = Projection::new(settings.fov_y, width, height, settings.z_near, settings.z_far);
        let basis = camera::derive_basis(&smoother.orientation());
        Self {
            state: CameraState::new(settings.start_position, basis, projection.matrix()),
            smoother,
            projection,
            processor,
            base_speed: settings.base_speed,
        }
    }

    pub fn state(&self) -> &CameraState {
        &self.state
    }

    pub fn orientation(&self) -> Orientation {
        self.smoother.orientation()
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn pitch_limit(&self) -> Option<f32> {
        self.smoother.settings().pitch_limit
    }

    pub fn set_pitch_limit(&mut self, limit: Option<f32>) {
        self.smoother.set_pitch_limit(limit);
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.state.position = position;
        self.rebuild_view();
    }

    /// Snap back to the forward-facing pose.
    pub fn reset(&mut self) {
        self.smoother.reset();
        self.refresh_front();
        self.rebuild_view();
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.projection.set_aspect(width, height);
        self.state.projection = self.projection.matrix();
    }

    pub fn set_fov(&mut self, fov_y: f32) {
        self.projection.fov_y = fov_y;
        self.state.projection = self.projection.matrix();
    }

    /// Advance one frame: ease the look angles, move, rebuild the view.
    pub fn update(&mut self, input: &InputSnapshot, dt: f32) {
        if self.processor.wants_reset(input) {
            self.smoother.reset();
        }

        self.smoother
            .update(input.pointer_delta(), input.right_button_down, dt);
        self.refresh_front();

        let step = self.base_speed * dt;
        if self.processor.is_moving_forward(input) {
            self.state.position += self.state.front * step;
        }
        if self.processor.is_moving_backward(input) {
            self.state.position -= self.state.front * step;
        }
        if self.processor.is_moving_left(input) {
            self.state.position -= self.strafe_axis() * step;
        }
        if self.processor.is_moving_right(input) {
            self.state.position += self.strafe_axis() * step;
        }

        self.rebuild_view();
    }

    /// Publishes `projection` and `view` to `program`.
    pub fn submit_uniforms(&self, backend: &mut dyn RenderingBackend, program: ProgramHandle) {
        backend.set_uniform_mat4(program, "projection", &self.state.projection);
        backend.set_uniform_mat4(program, "view", &self.state.view);
    }

    /// Like [`submit_uniforms`](Self::submit_uniforms), with the eye translation removed.
    pub fn submit_skybox_uniforms(&self, backend: &mut dyn RenderingBackend, program: ProgramHandle) {
        backend.set_uniform_mat4(program, "projection", &self.state.projection);
        backend.set_uniform_mat4(program, "view", &camera::skybox_view(&self.state.view));
    }

    fn refresh_front(&mut self) {
        if self.smoother.take_dirty() {
            self.state.front = camera::derive_basis(&self.smoother.orientation()).front;
        }
    }

    fn strafe_axis(&self) -> Vec3 {
        self.state.front.cross(self.state.up).normalize()
    }

    // front must be final before this runs.
    fn rebuild_view(&mut self) {
        let basis = camera::orthonormal_basis(self.state.front, self.smoother.orientation().current_yaw);
        self.state.right = basis.right;
        self.state.up = basis.up;
        self.state.view = camera::build_view_matrix(self.state.position, self.state.front, self.state.up);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::input::KeyBindings;
    use crate::view::backend::tests::RecordingBackend;
    use glam::Vec2;
    use winit::keyboard::KeyCode;

    const TOLERANCE: f32 = 1e-5;

    fn controller() -> CameraController {
        CameraController::new(CameraSettings::default(), 1024, 768, InputProcessor::new(KeyBindings::default()))
    }

    fn holding(keys: &[KeyCode]) -> InputSnapshot {
        InputSnapshot {
            keys_down: keys.iter().copied().collect(),
            ..InputSnapshot::default()
        }
    }

    #[test]
    fn starts_forward_facing() {
        let camera = controller();
        assert_eq!(camera.state().position, Vec3::new(0.0, 0.0, 3.0));
        assert!(camera.state().front.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), TOLERANCE));
        assert!(camera.state().up.abs_diff_eq(Vec3::Y, TOLERANCE));
    }

    #[test]
    fn forward_for_one_second_moves_base_speed() {
        let mut camera = controller();
        let start = camera.state().position;
        let front = camera.state().front;

        camera.update(&holding(&[KeyCode::KeyW]), 1.0);

        assert_eq!(camera.state().front, front);
        assert_eq!(camera.state().position, start + front * 2.5);
    }

    #[test]
    fn opposite_keys_cancel() {
        let mut camera = controller();
        let start = camera.state().position;
        camera.update(&holding(&[KeyCode::KeyW, KeyCode::KeyS, KeyCode::KeyA, KeyCode::KeyD]), 0.5);
        assert!(camera.state().position.abs_diff_eq(start, TOLERANCE));
    }

    #[test]
    fn strafe_moves_along_screen_right() {
        let mut camera = controller();
        camera.update(&holding(&[KeyCode::KeyD]), 1.0);
        // Looking down -Z, screen right is +X.
        assert!(camera
            .state()
            .position
            .abs_diff_eq(Vec3::new(2.5, 0.0, 3.0), TOLERANCE));
    }

    #[test]
    fn movement_scales_with_dt() {
        let mut a = controller();
        let mut b = controller();
        for _ in 0..4 {
            a.update(&holding(&[KeyCode::KeyW]), 0.025);
        }
        b.update(&holding(&[KeyCode::KeyW]), 0.1);
        assert!(a.state().position.abs_diff_eq(b.state().position, TOLERANCE));
    }

    #[test]
    fn drag_turns_the_camera() {
        let mut camera = controller();
        let input = InputSnapshot {
            pointer: Vec2::new(0.2, 0.0),
            pointer_prev: Vec2::ZERO,
            right_button_down: true,
            ..InputSnapshot::default()
        };
        camera.update(&input, 1.0);

        let o = camera.orientation();
        assert!(o.is_converged());
        let expected = camera::look_direction(o.current_yaw, o.current_pitch);
        assert!(camera.state().front.abs_diff_eq(expected, TOLERANCE));
        assert!(camera.state().front.dot(camera.state().up).abs() < TOLERANCE);
        assert!(camera.state().front.dot(camera.state().right).abs() < TOLERANCE);
    }

    #[test]
    fn pointer_motion_without_drag_is_ignored() {
        let mut camera = controller();
        let front = camera.state().front;
        let input = InputSnapshot {
            pointer: Vec2::new(0.9, -0.4),
            pointer_prev: Vec2::ZERO,
            ..InputSnapshot::default()
        };
        camera.update(&input, 1.0 / 60.0);
        assert_eq!(camera.state().front, front);
    }

    #[test]
    fn reset_key_restores_forward_pose() {
        let mut camera = controller();
        let drag = InputSnapshot {
            pointer: Vec2::new(0.5, 0.3),
            right_button_down: true,
            ..InputSnapshot::default()
        };
        camera.update(&drag, 1.0);
        assert!(!camera.state().front.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-2));

        camera.update(&holding(&[KeyCode::KeyR]), 1.0 / 60.0);
        assert_eq!(camera.orientation(), Orientation::forward_facing());
        assert!(camera.state().front.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), TOLERANCE));
    }

    #[test]
    fn view_matrix_follows_state() {
        let mut camera = controller();
        camera.update(&holding(&[KeyCode::KeyW, KeyCode::KeyD]), 0.3);
        let s = camera.state();
        assert_eq!(s.view, camera::build_view_matrix(s.position, s.front, s.up));
    }

    #[test]
    fn submits_projection_and_view() {
        let camera = controller();
        let mut backend = RecordingBackend::default();
        let program = ProgramHandle(7);

        camera.submit_uniforms(&mut backend, program);
        assert_eq!(backend.writes.len(), 2);
        assert_eq!(backend.last(program, "projection"), Some(camera.state().projection));
        assert_eq!(backend.last(program, "view"), Some(camera.state().view));
    }

    #[test]
    fn skybox_uniforms_drop_translation() {
        let camera = controller();
        let mut backend = RecordingBackend::default();
        let program = ProgramHandle(1);

        camera.submit_skybox_uniforms(&mut backend, program);
        let view = backend.last(program, "view").unwrap();
        assert_eq!(view.w_axis, glam::Vec4::W);
    }

    #[test]
    fn viewport_and_fov_rebuild_projection() {
        let mut camera = controller();
        let before = camera.state().projection;

        camera.set_viewport(1920, 1080);
        assert_ne!(camera.state().projection, before);
        assert_eq!(camera.state().projection, camera.projection().matrix());

        camera.set_fov(70f32.to_radians());
        assert_eq!(camera.projection().fov_y, 70f32.to_radians());
        assert_eq!(camera.state().projection, camera.projection().matrix());
    }
}
