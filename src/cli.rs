// cli.rs - Command-line interface configuration
use std::path::PathBuf;

use clap::Parser;

use freelook::controller::WaitStrategy;
use freelook::EngineConfig;

#[derive(Parser, Debug, Clone)]
#[command(name = "freelook")]
#[command(about = "Free-look camera over a small wgpu scene", long_about = None)]
pub struct Cli {
    /// Window width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Vertical field of view in degrees
    #[arg(long)]
    pub fov: Option<f32>,

    /// Directory holding the six skybox faces
    #[arg(long)]
    pub skybox_dir: Option<PathBuf>,

    /// File name prefix of the skybox faces
    #[arg(long)]
    pub skybox_prefix: Option<String>,

    /// Directory searched for `<name>.wgsl` shader overrides
    #[arg(long)]
    pub shader_dir: Option<PathBuf>,

    /// Let pitch pass the poles instead of stopping at 89 degrees
    #[arg(long)]
    pub unclamped_pitch: bool,

    /// Spin instead of sleeping out short frames
    #[arg(long)]
    pub busy_wait: bool,

    /// Multiplier applied to both look sensitivities
    #[arg(long)]
    pub sensitivity: Option<f32>,
}

impl Cli {
    pub fn into_config(self) -> EngineConfig {
        let mut config = EngineConfig::default();
        if let Some(width) = self.width {
            config.window.width = width.max(1);
        }
        if let Some(height) = self.height {
            config.window.height = height.max(1);
        }
        if let Some(fov) = self.fov {
            config.camera.fov_y = fov.to_radians();
        }
        if self.skybox_dir.is_some() {
            config.assets.skybox_dir = self.skybox_dir;
        }
        if let Some(prefix) = self.skybox_prefix {
            config.assets.skybox_prefix = prefix;
        }
        if self.shader_dir.is_some() {
            config.assets.shader_dir = self.shader_dir;
        }
        if self.unclamped_pitch {
            config.camera.look.pitch_limit = None;
        }
        if self.busy_wait {
            config.wait = WaitStrategy::Spin;
        }
        match self.sensitivity {
            Some(scale) => config.with_sensitivity_scale(scale),
            None => config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_gives_defaults() {
        let cli = Cli::try_parse_from(["freelook"]).unwrap();
        assert_eq!(cli.into_config(), EngineConfig::default());
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "freelook",
            "--width",
            "640",
            "--height",
            "480",
            "--fov",
            "60",
            "--skybox-dir",
            "assets/sky",
            "--unclamped-pitch",
            "--busy-wait",
            "--sensitivity",
            "2",
        ])
        .unwrap();
        let config = cli.into_config();

        assert_eq!((config.window.width, config.window.height), (640, 480));
        assert_eq!(config.camera.fov_y, 60f32.to_radians());
        assert_eq!(config.assets.skybox_dir, Some(PathBuf::from("assets/sky")));
        assert_eq!(config.camera.look.pitch_limit, None);
        assert_eq!(config.wait, WaitStrategy::Spin);
        assert_eq!(config.camera.look.yaw_sensitivity, 3.0);
    }

    #[test]
    fn rejects_unknown_flags() {
        assert!(Cli::try_parse_from(["freelook", "--wireframe"]).is_err());
    }
}
