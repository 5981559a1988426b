use crate::controller::actors::ActorList;
use crate::controller::camera_controller::{CameraController, CameraSettings};
use crate::controller::frame_clock::{FrameClock, SystemClock, WallClock};
use crate::controller::input::{InputBackend, InputProcessor, InputSampler, InputSnapshot, KeyBindings};
use crate::view::backend::{ProgramHandle, RenderingBackend};

/// Slack on the one second window; fifty 0.02 s frames sum to just under 1.0.
const FPS_WINDOW_SLACK: f64 = 1e-6;

/// Averages frame rate over roughly one second windows.
#[derive(Debug, Clone, Default)]
pub struct FpsCounter {
    fps: f32,
    frame_count: u32,
    timer: f64,
}

impl FpsCounter {
    pub fn record(&mut self, dt: f32) {
        self.frame_count += 1;
        self.timer += f64::from(dt);
        if self.timer >= 1.0 - FPS_WINDOW_SLACK {
            self.fps = (f64::from(self.frame_count) / self.timer) as f32;
            self.frame_count = 0;
            self.timer = 0.0;
        }
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub frame_index: u64,
    pub delta_seconds: f32,
    pub fps: f32,
}

/// Programs the per-frame camera uniforms go to.
#[derive(Debug, Clone, Copy)]
pub struct FramePrograms {
    pub scene: ProgramHandle,
    pub skybox: Option<ProgramHandle>,
}

/// Input, update, output; once per iteration, all on the caller's thread.
pub struct RenderLoop<C: WallClock = SystemClock> {
    clock: FrameClock<C>,
    sampler: InputSampler,
    processor: InputProcessor,
    pub camera: CameraController,
    pub actors: ActorList,
    input: InputSnapshot,
    fps: FpsCounter,
    frame_index: u64,
    running: bool,
}

impl<C: WallClock> RenderLoop<C> {
    pub fn new(
        clock: FrameClock<C>,
        camera: CameraSettings,
        bindings: KeyBindings,
        width: u32,
        height: u32,
    ) -> Self {
        let processor = InputProcessor::new(bindings);
        Self {
            clock,
            sampler: InputSampler::new(width, height, processor.bindings()),
            camera: CameraController::new(camera, width, height, processor.clone()),
            processor,
            actors: ActorList::new(),
            input: InputSnapshot::default(),
            fps: FpsCounter::default(),
            frame_index: 0,
            running: true,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn stop(&mut self) {
        if self.running {
            tracing::info!(frames = self.frame_index, "render loop stopping");
        }
        self.running = false;
    }

    pub fn clock(&self) -> &FrameClock<C> {
        &self.clock
    }

    pub fn input(&self) -> &InputSnapshot {
        &self.input
    }

    pub fn stats(&self) -> FrameStats {
        FrameStats {
            frame_index: self.frame_index,
            delta_seconds: self.clock.timing().delta_seconds,
            fps: self.fps.fps(),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.camera.set_viewport(width, height);
        self.sampler.set_viewport(width, height);
    }

    /// Samples this frame's input; the quit key clears the running flag.
    pub fn process_input(&mut self, backend: &dyn InputBackend) {
        self.input = self.sampler.sample(backend);
        if self.processor.wants_quit(&self.input) {
            self.stop();
        }
    }

    /// Paces the frame, then advances the camera and every actor by the clamped delta.
    pub fn update(&mut self) -> f32 {
        let dt = self.clock.tick();
        self.camera.update(&self.input, dt);
        self.actors.update(dt);
        self.fps.record(dt);
        self.frame_index += 1;
        tracing::trace!(frame = self.frame_index, dt, "frame updated");
        dt
    }

    pub fn submit_uniforms(&self, backend: &mut dyn RenderingBackend, programs: FramePrograms) {
        self.camera.submit_uniforms(backend, programs.scene);
        if let Some(skybox) = programs.skybox {
            self.camera.submit_skybox_uniforms(backend, skybox);
        }
    }

    /// One full iteration. Returns whether the loop should keep going.
    pub fn run_frame(
        &mut self,
        input: &dyn InputBackend,
        backend: &mut dyn RenderingBackend,
        programs: FramePrograms,
    ) -> bool {
        self.process_input(input);
        if !self.running {
            return false;
        }
        self.update();
        self.submit_uniforms(backend, programs);
        true
    }
}
