use std::path::PathBuf;

use crate::controller::camera_controller::CameraSettings;
use crate::controller::frame_clock::{TimingSettings, WaitStrategy};
use crate::controller::input::KeyBindings;

#[derive(Debug, Clone, PartialEq)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "freelook".to_string(),
            width: 1024,
            height: 768,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetSettings {
    /// Directory holding `<skybox_prefix>posx.png` and friends. `None` draws the gradient sky.
    pub skybox_dir: Option<PathBuf>,
    pub skybox_prefix: String,
    /// Directory searched for `<name>.wgsl` overrides.
    pub shader_dir: Option<PathBuf>,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            skybox_dir: None,
            skybox_prefix: "skybox_".to_string(),
            shader_dir: None,
        }
    }
}

/// Everything tunable about a run, gathered in one place.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineConfig {
    pub window: WindowSettings,
    pub camera: CameraSettings,
    pub timing: TimingSettings,
    pub wait: WaitStrategy,
    pub assets: AssetSettings,
    pub key_bindings: KeyBindings,
}

impl EngineConfig {
    /// Scales both look sensitivities, keeping their ratio.
    pub fn with_sensitivity_scale(mut self, scale: f32) -> Self {
        self.camera.look.yaw_sensitivity *= scale;
        self.camera.look.pitch_sensitivity *= scale;
        self
    }
}
