use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use glam::Vec3;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use freelook::{
    controller::{
        input::native::window_event_to_input, ActorList, FrameClock, InputEvent, InputState, KeyBindings,
        PrimitiveActor, RenderLoop, SystemClock,
    },
    logging,
    model::{Primitive, Transform},
    ui::{self, HudInfo, OverlaySettings},
    view::{GpuContext, OverlayFrame, Renderer},
    EngineConfig,
};

mod cli;

use cli::Cli;

/// The demo scene: a ground plane and a few spheres.
fn populate_scene(actors: &mut ActorList) {
    let ground = Transform {
        position: Vec3::new(0.0, -0.5, 0.0),
        scale: Vec3::splat(10.0),
        ..Transform::default()
    };
    actors.add(Box::new(PrimitiveActor::new(Primitive::plane(), ground, [0.55, 0.6, 0.55, 1.0])));

    actors.add(Box::new(
        PrimitiveActor::new(Primitive::sphere(), Transform::default(), [0.85, 0.3, 0.25, 1.0])
            .with_spin(Vec3::new(0.0, 45.0, 0.0)),
    ));
    for (x, color) in [(-1.2, [0.25, 0.5, 0.85, 1.0]), (1.2, [0.95, 0.75, 0.2, 1.0])] {
        actors.add(Box::new(PrimitiveActor::new(
            Primitive::sphere(),
            Transform::at(Vec3::new(x, 0.0, -1.0)),
            color,
        )));
    }
}

/// Everything that exists once a window does.
struct Engine {
    window: Arc<Window>,
    renderer: Renderer,
    egui_state: egui_winit::State,
    egui_ctx: egui::Context,
    overlay: OverlaySettings,
    frames: RenderLoop,
    input: InputState,
    bindings: KeyBindings,
}

impl Engine {
    async fn new(window: Arc<Window>, config: &EngineConfig) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let gpu = GpuContext::new(window.clone(), size.width, size.height)
            .await
            .context("GPU initialisation failed")?;
        let renderer = Renderer::new(gpu, &config.assets).context("renderer setup failed")?;

        let clock = FrameClock::new(SystemClock::new(config.wait), config.timing);
        let mut frames = RenderLoop::new(
            clock,
            config.camera,
            config.key_bindings.clone(),
            size.width,
            size.height,
        );
        populate_scene(&mut frames.actors);

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            None,
            None,
            None,
        );

        Ok(Self {
            overlay: OverlaySettings::new(&frames.camera),
            window,
            renderer,
            egui_state,
            egui_ctx,
            frames,
            input: InputState::new(),
            bindings: config.key_bindings.clone(),
        })
    }

    fn handle_event(&mut self, event: &WindowEvent) {
        let consumed = self.egui_state.on_window_event(&self.window, event).consumed;
        let Some(input) = window_event_to_input(event) else {
            return;
        };
        // Presses on the overlay must not start a drag; releases always land.
        let press = matches!(input, InputEvent::MouseButton { is_down: true, .. } | InputEvent::KeyDown(_));
        if !(consumed && press) {
            self.input.process_event(&input);
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.renderer.resize(width, height);
        self.frames.resize(width, height);
    }

    fn run_overlay(&mut self) -> OverlayFrame {
        let raw_input = self.egui_state.take_egui_input(&self.window);
        let hud = HudInfo::capture(&self.frames);
        let overlay = &mut self.overlay;
        let bindings = &self.bindings;
        let output = self.egui_ctx.run(raw_input, |ctx| ui::build_ui(ctx, &hud, overlay, bindings));

        self.overlay.apply(&mut self.frames.camera);
        self.egui_state.handle_platform_output(&self.window, output.platform_output);
        let primitives = self.egui_ctx.tessellate(output.shapes, output.pixels_per_point);
        OverlayFrame {
            primitives,
            textures_delta: output.textures_delta,
            pixels_per_point: output.pixels_per_point,
        }
    }

    /// One iteration of the loop. Returns false once the quit key was seen.
    fn redraw(&mut self) -> anyhow::Result<bool> {
        self.frames.process_input(&self.input);
        if !self.frames.is_running() {
            return Ok(false);
        }
        self.frames.update();

        let overlay = self.run_overlay();
        let programs = self.renderer.programs();
        self.frames.submit_uniforms(&mut self.renderer.shaders, programs);
        self.renderer
            .draw_frame(&self.frames.actors, Some(overlay))
            .context("frame failed")?;
        Ok(true)
    }
}

struct App {
    config: EngineConfig,
    engine: Option<Engine>,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(config: EngineConfig) -> Self {
        Self {
            config,
            engine: None,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        tracing::error!("{err:#}");
        self.error = Some(err);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.engine.is_some() {
            return;
        }
        let attributes = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => return self.fail(event_loop, anyhow::Error::new(err).context("failed to create window")),
        };

        match pollster::block_on(Engine::new(window, &self.config)) {
            Ok(engine) => {
                tracing::info!("engine started");
                self.engine = Some(engine);
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        engine.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                engine.frames.stop();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => engine.resize(size.width, size.height),
            WindowEvent::RedrawRequested => match engine.redraw() {
                Ok(true) => {}
                Ok(false) => event_loop.exit(),
                Err(err) => self.fail(event_loop, err),
            },
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(engine) = &self.engine {
            engine.window.request_redraw();
        }
    }
}

fn main() -> anyhow::Result<()> {
    logging::init();
    let config = Cli::parse().into_config();
    tracing::info!(
        width = config.window.width,
        height = config.window.height,
        wait = ?config.wait,
        pitch_limit = ?config.camera.look.pitch_limit,
        "starting freelook"
    );

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
