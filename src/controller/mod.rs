// CONTROLLER: input, look smoothing, frame pacing and the update loop
pub mod actors;
pub mod camera_controller;
pub mod frame_clock;
pub mod frame_loop;
pub mod input;
pub mod orientation;

pub use actors::{Actor, ActorId, ActorList, PrimitiveActor};
pub use camera_controller::{CameraController, CameraSettings};
pub use frame_clock::{FrameClock, SystemClock, TimingSettings, WaitStrategy, WallClock};
pub use frame_loop::{FramePrograms, FrameStats, RenderLoop};
pub use input::{InputBackend, InputEvent, InputProcessor, InputSampler, InputSnapshot, InputState, KeyBindings};
pub use orientation::{OrientationSmoother, SmootherSettings};
