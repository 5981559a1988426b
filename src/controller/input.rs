/// Platform-agnostic input handling
use std::collections::HashSet;

use glam::Vec2;
use winit::keyboard::KeyCode;

/// What the camera core reads from the windowing layer each frame.
pub trait InputBackend {
    /// Pointer position in window pixels, origin top-left.
    fn pointer_position(&self) -> (f64, f64);
    fn is_key_held(&self, code: KeyCode) -> bool;
    fn is_right_button_held(&self) -> bool;
}

/// Platform-independent input events
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    KeyDown(KeyCode),
    KeyUp(KeyCode),
    CursorMoved { x: f64, y: f64 },
    MouseButton { button: MouseButton, is_down: bool },
    FocusLost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Event-fed input state; the window layer pushes events, the sampler polls it.
#[derive(Debug, Default)]
pub struct InputState {
    pub pressed_keys: HashSet<KeyCode>,
    pub cursor: (f64, f64),
    pub left_button: bool,
    pub right_button: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown(code) => {
                self.pressed_keys.insert(*code);
            }
            InputEvent::KeyUp(code) => {
                self.pressed_keys.remove(code);
            }
            InputEvent::CursorMoved { x, y } => {
                self.cursor = (*x, *y);
            }
            InputEvent::MouseButton { button, is_down } => match button {
                MouseButton::Left => self.left_button = *is_down,
                MouseButton::Right => self.right_button = *is_down,
                MouseButton::Middle => {}
            },
            InputEvent::FocusLost => {
                self.pressed_keys.clear();
                self.left_button = false;
                self.right_button = false;
            }
        }
    }
}

impl InputBackend for InputState {
    fn pointer_position(&self) -> (f64, f64) {
        self.cursor
    }

    fn is_key_held(&self, code: KeyCode) -> bool {
        self.pressed_keys.contains(&code)
    }

    fn is_right_button_held(&self) -> bool {
        self.right_button
    }
}

/// One frame of input, with the previous frame's pointer kept for the delta.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    pub pointer: Vec2,
    pub pointer_prev: Vec2,
    pub keys_down: HashSet<KeyCode>,
    pub right_button_down: bool,
}

impl InputSnapshot {
    pub fn pointer_delta(&self) -> Vec2 {
        self.pointer - self.pointer_prev
    }

    pub fn is_key_down(&self, code: KeyCode) -> bool {
        self.keys_down.contains(&code)
    }
}

/// Pixel to normalized device coordinates: x right, y up, both in [-1, 1].
pub fn normalize_pointer(x: f64, y: f64, width: u32, height: u32) -> Vec2 {
    let w = width.max(1) as f64;
    let h = height.max(1) as f64;
    Vec2::new((2.0 * x / w - 1.0) as f32, (1.0 - 2.0 * y / h) as f32)
}

/// Polls an [`InputBackend`] once per frame.
#[derive(Debug, Clone)]
pub struct InputSampler {
    width: u32,
    height: u32,
    watched: Vec<KeyCode>,
    prev: Option<Vec2>,
}

impl InputSampler {
    pub fn new(width: u32, height: u32, bindings: &KeyBindings) -> Self {
        Self {
            width,
            height,
            watched: bindings.all_keys(),
            prev: None,
        }
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        // The old normalized position means something else now.
        self.prev = None;
    }

    pub fn sample(&mut self, backend: &dyn InputBackend) -> InputSnapshot {
        let (x, y) = backend.pointer_position();
        let pointer = normalize_pointer(x, y, self.width, self.height);
        let pointer_prev = self.prev.replace(pointer).unwrap_or(pointer);

        InputSnapshot {
            pointer,
            pointer_prev,
            keys_down: self
                .watched
                .iter()
                .copied()
                .filter(|code| backend.is_key_held(*code))
                .collect(),
            right_button_down: backend.is_right_button_held(),
        }
    }
}

/// Key mapping configuration
#[derive(Debug, Clone, PartialEq)]
pub struct KeyBindings {
    pub forward: KeyCode,
    pub backward: KeyCode,
    pub left: KeyCode,
    pub right: KeyCode,
    pub reset_view: KeyCode,
    pub quit: KeyCode,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: KeyCode::KeyW,
            backward: KeyCode::KeyS,
            left: KeyCode::KeyA,
            right: KeyCode::KeyD,
            reset_view: KeyCode::KeyR,
            quit: KeyCode::Escape,
        }
    }
}

impl KeyBindings {
    /// Every key the sampler has to report, arrow alternates included.
    pub fn all_keys(&self) -> Vec<KeyCode> {
        vec![
            self.forward,
            self.backward,
            self.left,
            self.right,
            self.reset_view,
            self.quit,
            KeyCode::ArrowUp,
            KeyCode::ArrowDown,
            KeyCode::ArrowLeft,
            KeyCode::ArrowRight,
        ]
    }
}

/// High-level input queries over a snapshot
#[derive(Debug, Clone, Default)]
pub struct InputProcessor {
    bindings: KeyBindings,
}

impl InputProcessor {
    pub fn new(bindings: KeyBindings) -> Self {
        Self { bindings }
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    pub fn is_moving_forward(&self, input: &InputSnapshot) -> bool {
        input.is_key_down(self.bindings.forward) || input.is_key_down(KeyCode::ArrowUp)
    }

    pub fn is_moving_backward(&self, input: &InputSnapshot) -> bool {
        input.is_key_down(self.bindings.backward) || input.is_key_down(KeyCode::ArrowDown)
    }

    pub fn is_moving_left(&self, input: &InputSnapshot) -> bool {
        input.is_key_down(self.bindings.left) || input.is_key_down(KeyCode::ArrowLeft)
    }

    pub fn is_moving_right(&self, input: &InputSnapshot) -> bool {
        input.is_key_down(self.bindings.right) || input.is_key_down(KeyCode::ArrowRight)
    }

    pub fn wants_reset(&self, input: &InputSnapshot) -> bool {
        input.is_key_down(self.bindings.reset_view)
    }

    pub fn wants_quit(&self, input: &InputSnapshot) -> bool {
        input.is_key_down(self.bindings.quit)
    }
}

pub mod native {
    use super::*;
    use winit::event::{ElementState, KeyEvent, WindowEvent};
    use winit::keyboard::PhysicalKey;

    /// Translates the window events the engine cares about.
    pub fn window_event_to_input(event: &WindowEvent) -> Option<InputEvent> {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat: false,
                        ..
                    },
                ..
            } => Some(match state {
                ElementState::Pressed => InputEvent::KeyDown(*code),
                ElementState::Released => InputEvent::KeyUp(*code),
            }),
            WindowEvent::CursorMoved { position, .. } => Some(InputEvent::CursorMoved {
                x: position.x,
                y: position.y,
            }),
            WindowEvent::MouseInput { state, button, .. } => {
                let button = match button {
                    winit::event::MouseButton::Left => MouseButton::Left,
                    winit::event::MouseButton::Right => MouseButton::Right,
                    winit::event::MouseButton::Middle => MouseButton::Middle,
                    _ => return None,
                };
                Some(InputEvent::MouseButton {
                    button,
                    is_down: *state == ElementState::Pressed,
                })
            }
            WindowEvent::Focused(false) => Some(InputEvent::FocusLost),
            _ => None,
        }
    }
}
