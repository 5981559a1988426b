use std::f32::consts::{PI, TAU};

use glam::Vec2;

use crate::model::Orientation;

/// Below this angular distance (radians) the current angle snaps onto its target.
pub const CONVERGENCE_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmootherSettings {
    /// Radians of yaw per unit of normalized pointer travel.
    pub yaw_sensitivity: f32,
    /// Radians of pitch per unit of normalized pointer travel.
    pub pitch_sensitivity: f32,
    /// Low-pass rate; the lerp factor is `min(1, rate * dt)`.
    pub smoothing_rate: f32,
    /// Symmetric clamp on target pitch. `None` lets pitch run past the poles.
    pub pitch_limit: Option<f32>,
}

impl Default for SmootherSettings {
    fn default() -> Self {
        Self {
            yaw_sensitivity: 1.5,
            pitch_sensitivity: 1.0,
            smoothing_rate: 30.0,
            pitch_limit: Some(89f32.to_radians()),
        }
    }
}

/// Turns raw pointer deltas into eased yaw/pitch.
///
/// Targets only move while the drag button is held; the displayed angles
/// chase the targets through a first-order low-pass filter and snap once
/// they are within [`CONVERGENCE_EPSILON`].
#[derive(Debug, Clone)]
pub struct OrientationSmoother {
    orientation: Orientation,
    settings: SmootherSettings,
    dirty: bool,
}

impl OrientationSmoother {
    pub fn new(settings: SmootherSettings) -> Self {
        let mut smoother = Self {
            orientation: Orientation::forward_facing(),
            settings,
            dirty: true,
        };
        smoother.reset();
        smoother
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn settings(&self) -> &SmootherSettings {
        &self.settings
    }

    pub fn set_pitch_limit(&mut self, limit: Option<f32>) {
        self.settings.pitch_limit = limit;
        self.orientation.target_pitch = self.clamp_pitch(self.orientation.target_pitch);
    }

    /// Back to the forward-facing pose, with nothing left to ease.
    pub fn reset(&mut self) {
        self.orientation = Orientation::forward_facing();
        self.dirty = true;
    }

    /// Whether the last update (or a reset) moved the displayed angles.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns the dirty flag and clears it.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    pub fn update(&mut self, pointer_delta: Vec2, drag_held: bool, dt: f32) -> Orientation {
        if drag_held {
            self.orientation.target_yaw += pointer_delta.x * self.settings.yaw_sensitivity;
            self.orientation.target_pitch = self.clamp_pitch(
                self.orientation.target_pitch + pointer_delta.y * self.settings.pitch_sensitivity,
            );
            self.wrap_yaw();
        }

        let factor = (self.settings.smoothing_rate * dt).clamp(0.0, 1.0);
        let yaw_moved = approach(
            &mut self.orientation.current_yaw,
            self.orientation.target_yaw,
            factor,
        );
        let pitch_moved = approach(
            &mut self.orientation.current_pitch,
            self.orientation.target_pitch,
            factor,
        );
        self.dirty |= yaw_moved || pitch_moved;

        self.orientation
    }

    /// Keeps target yaw within one turn of zero, shifting current yaw by the
    /// same whole turns. Large angles lose the f32 precision the snap needs.
    fn wrap_yaw(&mut self) {
        let target = self.orientation.target_yaw;
        if target.abs() <= PI {
            return;
        }
        let shift = (target / TAU).round() * TAU;
        self.orientation.target_yaw -= shift;
        self.orientation.current_yaw -= shift;
    }

    fn clamp_pitch(&self, pitch: f32) -> f32 {
        match self.settings.pitch_limit {
            Some(limit) => pitch.clamp(-limit, limit),
            None => pitch,
        }
    }
}

impl Default for OrientationSmoother {
    fn default() -> Self {
        Self::new(SmootherSettings::default())
    }
}

/// One low-pass step of `current` toward `target`. Returns whether `current` changed.
fn approach(current: &mut f32, target: f32, factor: f32) -> bool {
    let before = *current;
    if (target - *current).abs() >= CONVERGENCE_EPSILON {
        *current += (target - *current) * factor;
    }
    if (target - *current).abs() < CONVERGENCE_EPSILON {
        *current = target;
    }
    *current != before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::camera::FORWARD_YAW;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn reset_faces_forward() {
        let mut smoother = OrientationSmoother::default();
        smoother.update(Vec2::new(0.3, 0.2), true, DT);
        smoother.reset();

        let o = smoother.orientation();
        assert!((o.current_yaw - (-90f32).to_radians()).abs() < 1e-6);
        assert_eq!(o.current_yaw, FORWARD_YAW);
        assert_eq!(o.target_yaw, FORWARD_YAW);
        assert_eq!(o.current_pitch, 0.0);
        assert_eq!(o.target_pitch, 0.0);
        assert!(smoother.is_dirty());
    }

    #[test]
    fn targets_only_move_while_dragging() {
        let mut smoother = OrientationSmoother::default();
        let before = smoother.orientation();

        let o = smoother.update(Vec2::new(0.5, -0.25), false, DT);
        assert_eq!(o, before);

        let o = smoother.update(Vec2::new(0.5, -0.25), true, DT);
        assert_eq!(o.target_yaw, FORWARD_YAW + 0.5 * 1.5);
        assert_eq!(o.target_pitch, -0.25);
    }

    #[test]
    fn converges_then_holds_exactly() {
        let targets = [(0.0, 0.0), (2.7, 0.4), (-3.1, -1.2), (0.0001, 0.9), (12.0, -0.05)];

        for (dyaw, dpitch) in targets {
            let mut smoother = OrientationSmoother::new(SmootherSettings {
                yaw_sensitivity: 1.0,
                pitch_sensitivity: 1.0,
                ..SmootherSettings::default()
            });
            smoother.update(Vec2::new(dyaw, dpitch), true, DT);

            let mut iterations = 0;
            while !smoother.orientation().is_converged() {
                smoother.update(Vec2::ZERO, false, DT);
                iterations += 1;
                assert!(iterations < 64, "no convergence toward ({dyaw}, {dpitch})");
            }

            let settled = smoother.orientation();
            smoother.take_dirty();
            for _ in 0..100 {
                assert_eq!(smoother.update(Vec2::ZERO, false, DT), settled);
            }
            assert!(!smoother.is_dirty());
        }
    }

    #[test]
    fn long_spins_still_converge() {
        let mut smoother = OrientationSmoother::default();
        for _ in 0..700 {
            smoother.update(Vec2::new(2.0, 0.0), true, 1.0);
        }
        smoother.update(Vec2::new(0.01, 0.0), true, DT);

        let o = smoother.orientation();
        assert!(o.target_yaw.abs() <= PI);
        assert!((o.target_yaw - o.current_yaw).abs() < 0.1);

        let mut iterations = 0;
        while !smoother.orientation().is_converged() {
            smoother.update(Vec2::ZERO, false, DT);
            iterations += 1;
            assert!(iterations < 64, "yaw stalled at {:?}", smoother.orientation());
        }
    }

    #[test]
    fn wrapping_keeps_the_look_direction() {
        let mut smoother = OrientationSmoother::default();
        let o = smoother.update(Vec2::new(3.0, 0.0), true, 1.0);
        let unwrapped = FORWARD_YAW + 3.0 * 1.5;
        assert!(o.target_yaw.abs() <= PI);
        assert!((o.target_yaw.cos() - unwrapped.cos()).abs() < 1e-5);
        assert!((o.target_yaw.sin() - unwrapped.sin()).abs() < 1e-5);
    }

    #[test]
    fn oversized_factor_lands_on_target() {
        let mut smoother = OrientationSmoother::default();
        let o = smoother.update(Vec2::new(0.2, 0.1), true, 1.0);
        assert!(o.is_converged());
    }

    #[test]
    fn zero_dt_holds_current_angles() {
        let mut smoother = OrientationSmoother::default();
        smoother.take_dirty();
        let o = smoother.update(Vec2::new(0.2, 0.1), true, 0.0);
        assert_eq!(o.current_yaw, FORWARD_YAW);
        assert_eq!(o.current_pitch, 0.0);
        assert!(!smoother.is_dirty());
    }

    #[test]
    fn dirty_flag_tracks_motion() {
        let mut smoother = OrientationSmoother::default();
        assert!(smoother.take_dirty());

        smoother.update(Vec2::ZERO, false, DT);
        assert!(!smoother.take_dirty());

        smoother.update(Vec2::new(0.1, 0.0), true, DT);
        assert!(smoother.take_dirty());
    }

    #[test]
    fn pitch_limit_clamps_target() {
        let mut smoother = OrientationSmoother::default();
        let o = smoother.update(Vec2::new(0.0, 10.0), true, DT);
        assert_eq!(o.target_pitch, 89f32.to_radians());

        let o = smoother.update(Vec2::new(0.0, -30.0), true, DT);
        assert_eq!(o.target_pitch, -89f32.to_radians());
    }

    #[test]
    fn unclamped_pitch_crosses_the_pole() {
        let mut smoother = OrientationSmoother::new(SmootherSettings {
            pitch_limit: None,
            ..SmootherSettings::default()
        });
        let o = smoother.update(Vec2::new(0.0, 2.0), true, DT);
        assert!(o.target_pitch > std::f32::consts::FRAC_PI_2);
    }

    #[test]
    fn tightening_the_limit_pulls_target_in() {
        let mut smoother = OrientationSmoother::new(SmootherSettings {
            pitch_limit: None,
            ..SmootherSettings::default()
        });
        smoother.update(Vec2::new(0.0, 2.0), true, DT);
        smoother.set_pitch_limit(Some(1.0));
        assert_eq!(smoother.orientation().target_pitch, 1.0);
    }
}
