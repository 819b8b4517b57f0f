//! Application shell: window, keyboard snapshot, frame clock.
//!
//! Everything here is adapter code between winit and the renderer core:
//! key events flip bits in the [`InputState`] snapshot, the frame clock
//! produces the per-frame dt, and each redraw runs one advance/draw cycle.

use std::sync::Arc;
use std::time::Instant;

use log::error;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes},
};

use crate::gfx::rendering::WgpuDevice;
use crate::input::{InputState, Key};
use crate::scene::{Scene, SceneConfig};

/// Window appearance and the frame clear color.
#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub clear_color: [f64; 4],
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "gorse".to_string(),
            width: 512,
            height: 512,
            clear_color: [0.3, 0.48, 0.52, 1.0],
        }
    }
}

/// Produces the elapsed seconds between consecutive frames.
///
/// The first tick yields 0.0; `Instant` is monotonic and `duration_since`
/// saturates, so dt can never go negative across clock adjustments.
struct FrameClock {
    last: Option<Instant>,
}

impl FrameClock {
    fn new() -> Self {
        Self { last: None }
    }

    fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let dt = match self.last {
            Some(last) => now.duration_since(last).as_secs_f32(),
            None => 0.0,
        };
        self.last = Some(now);
        dt
    }
}

pub struct App {
    event_loop: Option<EventLoop<()>>,
    state: AppState,
}

struct AppState {
    window: Option<Arc<Window>>,
    device: Option<WgpuDevice>,
    scene: Option<Scene>,
    input: InputState,
    clock: FrameClock,
    window_config: WindowConfig,
    scene_config: SceneConfig,
}

impl App {
    pub fn new(window_config: WindowConfig, scene_config: SceneConfig) -> Self {
        let event_loop = EventLoop::new().expect("Failed to create event loop");
        Self {
            event_loop: Some(event_loop),
            state: AppState {
                window: None,
                device: None,
                scene: None,
                input: InputState::new(),
                clock: FrameClock::new(),
                window_config,
                scene_config,
            },
        }
    }

    /// Runs the event loop until the window closes (consumes self).
    pub fn run(mut self) {
        let event_loop = self.event_loop.take().expect("Event loop already consumed");
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop
            .run_app(&mut self.state)
            .expect("Failed to run event loop");
    }
}

fn map_key(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::KeyW => Some(Key::Forward),
        KeyCode::KeyS => Some(Key::Backward),
        KeyCode::KeyA => Some(Key::TurnLeft),
        KeyCode::KeyD => Some(Key::TurnRight),
        KeyCode::KeyI => Some(Key::CameraForward),
        KeyCode::KeyK => Some(Key::CameraBackward),
        KeyCode::KeyJ => Some(Key::CameraLeft),
        KeyCode::KeyL => Some(Key::CameraRight),
        _ => None,
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = WindowAttributes::default()
            .with_title(self.window_config.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.window_config.width,
                self.window_config.height,
            ));
        if let Ok(window) = event_loop.create_window(attributes) {
            let window_handle = Arc::new(window);
            self.window = Some(window_handle.clone());

            let (width, height) = window_handle.inner_size().into();
            let mut device =
                pollster::block_on(WgpuDevice::new(window_handle.clone(), width, height));

            match Scene::new(&mut device, &self.scene_config) {
                Ok(mut scene) => {
                    scene
                        .camera
                        .set_aspect_ratio(width as f32 / height.max(1) as f32);
                    self.scene = Some(scene);
                }
                // A scene without working shaders cannot render anything.
                Err(err) => {
                    error!("scene construction failed: {err}");
                    event_loop.exit();
                    return;
                }
            }
            self.device = Some(device);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(device) = self.device.as_mut() else {
            return;
        };

        match event {
            WindowEvent::KeyboardInput {
                event:
                    winit::event::KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => {
                if matches!(code, KeyCode::Escape) {
                    event_loop.exit();
                    return;
                }
                if matches!(code, KeyCode::Tab) && state.is_pressed() && !repeat {
                    if let Some(scene) = self.scene.as_mut() {
                        scene.toggle_camera_mode();
                    }
                    return;
                }
                if let Some(key) = map_key(code) {
                    self.input.set(key, state.is_pressed());
                }
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if let Some(scene) = self.scene.as_mut() {
                    scene
                        .camera
                        .set_aspect_ratio(width as f32 / height.max(1) as f32);
                }
                device.resize(width, height);
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                let dt = self.clock.tick();
                if let Some(scene) = self.scene.as_mut() {
                    scene.advance(dt, &self.input);
                    if device.begin_frame(self.window_config.clear_color) {
                        scene.draw(device);
                        device.end_frame();
                    }
                }
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_clock_first_tick_is_zero() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick(), 0.0);
    }

    #[test]
    fn test_frame_clock_never_negative() {
        let mut clock = FrameClock::new();
        clock.tick();
        for _ in 0..10 {
            assert!(clock.tick() >= 0.0);
        }
    }
}
