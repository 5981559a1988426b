use egui::Context;
use glam::Vec3;

use crate::controller::camera_controller::CameraController;
use crate::controller::frame_clock::WallClock;
use crate::controller::frame_loop::RenderLoop;
use crate::controller::input::KeyBindings;
use crate::model::Orientation;

const FOV_RANGE: std::ops::RangeInclusive<f32> = 30.0..=120.0;

/// Read-only numbers shown in the debug window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HudInfo {
    pub fps: f32,
    pub delta_seconds: f32,
    pub position: Vec3,
    pub orientation: Orientation,
}

impl HudInfo {
    pub fn capture<C: WallClock>(frames: &RenderLoop<C>) -> Self {
        let stats = frames.stats();
        Self {
            fps: stats.fps,
            delta_seconds: stats.delta_seconds,
            position: frames.camera.state().position,
            orientation: frames.camera.orientation(),
        }
    }
}

/// Values the settings window edits; pushed back into the camera after the UI pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlaySettings {
    pub fov_degrees: f32,
    pub pitch_limited: bool,
    pitch_limit: f32,
}

impl OverlaySettings {
    pub fn new(camera: &CameraController) -> Self {
        Self {
            fov_degrees: camera.projection().fov_y.to_degrees(),
            pitch_limited: camera.pitch_limit().is_some(),
            pitch_limit: camera.pitch_limit().unwrap_or(89f32.to_radians()),
        }
    }

    /// Returns whether anything changed.
    pub fn apply(&self, camera: &mut CameraController) -> bool {
        let mut changed = false;
        let fov = self.fov_degrees.clamp(*FOV_RANGE.start(), *FOV_RANGE.end()).to_radians();
        if (camera.projection().fov_y - fov).abs() > 1e-6 {
            camera.set_fov(fov);
            changed = true;
        }
        if camera.pitch_limit().is_some() != self.pitch_limited {
            camera.set_pitch_limit(self.pitch_limited.then_some(self.pitch_limit));
            tracing::info!(limited = self.pitch_limited, "pitch limit toggled");
            changed = true;
        }
        changed
    }
}

/// Draws the overlay for one frame.
pub fn build_ui(ctx: &Context, hud: &HudInfo, settings: &mut OverlaySettings, bindings: &KeyBindings) {
    draw_crosshair(ctx);
    draw_debug_window(ctx, hud, bindings);
    draw_settings_window(ctx, settings);
}

fn draw_crosshair(ctx: &Context) {
    let painter = ctx.layer_painter(egui::LayerId::new(egui::Order::TOP, egui::Id::new("crosshair")));
    let center = ctx.available_rect().center();
    let size = 10.0;
    let stroke = egui::Stroke::new(1.0, egui::Color32::BLACK);
    painter.line_segment(
        [egui::pos2(center.x - size, center.y), egui::pos2(center.x + size, center.y)],
        stroke,
    );
    painter.line_segment(
        [egui::pos2(center.x, center.y - size), egui::pos2(center.x, center.y + size)],
        stroke,
    );
}

fn draw_debug_window(ctx: &Context, hud: &HudInfo, bindings: &KeyBindings) {
    let o = hud.orientation;
    let p = hud.position;

    egui::Window::new("Debug")
        .default_pos([8.0, 8.0])
        .show(ctx, |ui| {
            ui.label(egui::RichText::new(format!("FPS: {:.0}", hud.fps)).small());
            ui.label(egui::RichText::new(format!("dt: {:.1} ms", hud.delta_seconds * 1000.0)).small());
            ui.label(egui::RichText::new(format!("Pos: x: {:.2} y: {:.2} z: {:.2}", p.x, p.y, p.z)).small());
            ui.label(
                egui::RichText::new(format!(
                    "Yaw: {:.1} -> {:.1}",
                    o.current_yaw.to_degrees(),
                    o.target_yaw.to_degrees()
                ))
                .small(),
            );
            ui.label(
                egui::RichText::new(format!(
                    "Pitch: {:.1} -> {:.1}",
                    o.current_pitch.to_degrees(),
                    o.target_pitch.to_degrees()
                ))
                .small(),
            );
            ui.separator();
            ui.label(egui::RichText::new("Controls:").small());
            ui.label(
                egui::RichText::new(format!(
                    "{:?}/{:?}/{:?}/{:?} or arrows - Move",
                    bindings.forward, bindings.left, bindings.backward, bindings.right
                ))
                .small(),
            );
            ui.label(egui::RichText::new("Right drag - Look").small());
            ui.label(egui::RichText::new(format!("{:?} - Reset view", bindings.reset_view)).small());
            ui.label(egui::RichText::new(format!("{:?} - Quit", bindings.quit)).small());
        });
}

fn draw_settings_window(ctx: &Context, settings: &mut OverlaySettings) {
    egui::Window::new("Settings")
        .anchor(egui::Align2::RIGHT_TOP, [-8.0, 8.0])
        .default_size([130.0, 100.0])
        .show(ctx, |ui| {
            ui.label(egui::RichText::new("FOV").small());
            ui.add(egui::Slider::new(&mut settings.fov_degrees, FOV_RANGE).step_by(5.0));
            ui.checkbox(&mut settings.pitch_limited, "Limit pitch");
        });
}
