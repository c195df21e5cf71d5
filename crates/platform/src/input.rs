//! Keyboard/mouse state sampled once per frame.

use std::collections::HashSet;

use corelib::camera::CameraInput;
use glam::Vec2;
use winit::keyboard::KeyCode;

const RELOAD_KEY: KeyCode = KeyCode::KeyS;
const WIREFRAME_KEY: KeyCode = KeyCode::KeyW;

#[derive(Debug, Default)]
pub struct InputState {
    held: HashSet<KeyCode>,
    mouse_delta: Vec2,
    reload_armed: bool,
    reload_requested: bool,
}

impl InputState {
    pub fn key(&mut self, code: KeyCode, pressed: bool) {
        if pressed {
            self.held.insert(code);
            if code == RELOAD_KEY {
                self.reload_armed = true;
            }
        } else {
            self.held.remove(&code);
            // Reload fires on release so a held key triggers it once.
            if code == RELOAD_KEY && self.reload_armed {
                self.reload_armed = false;
                self.reload_requested = true;
            }
        }
    }

    pub fn mouse_motion(&mut self, dx: f64, dy: f64) {
        self.mouse_delta += Vec2::new(dx as f32, dy as f32);
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.held.contains(&code)
    }

    pub fn wireframe(&self) -> bool {
        self.is_held(WIREFRAME_KEY)
    }

    pub fn take_reload_request(&mut self) -> bool {
        std::mem::take(&mut self.reload_requested)
    }

    /// Arrow keys move, mouse motion turns. Consumes the accumulated mouse delta.
    pub fn take_camera_input(&mut self) -> CameraInput {
        CameraInput {
            forward: self.is_held(KeyCode::ArrowUp),
            backward: self.is_held(KeyCode::ArrowDown),
            left: self.is_held(KeyCode::ArrowLeft),
            right: self.is_held(KeyCode::ArrowRight),
            mouse_delta: std::mem::take(&mut self.mouse_delta),
        }
    }

    /// Forget held keys, e.g. when focus is lost and releases won't arrive.
    pub fn clear(&mut self) {
        self.held.clear();
        self.reload_armed = false;
        self.mouse_delta = Vec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reload_fires_once_on_release() {
        let mut input = InputState::default();
        input.key(KeyCode::KeyS, true);
        input.key(KeyCode::KeyS, true);
        assert!(!input.take_reload_request());
        input.key(KeyCode::KeyS, false);
        assert!(input.take_reload_request());
        assert!(!input.take_reload_request());
    }

    #[test]
    fn release_without_press_does_nothing() {
        let mut input = InputState::default();
        input.key(KeyCode::KeyS, false);
        assert!(!input.take_reload_request());
    }

    #[test]
    fn camera_input_consumes_mouse_delta() {
        let mut input = InputState::default();
        input.key(KeyCode::ArrowUp, true);
        input.key(KeyCode::KeyW, true);
        input.mouse_motion(3.0, -2.0);
        input.mouse_motion(1.0, 0.0);

        assert!(input.wireframe());
        let first = input.take_camera_input();
        assert!(first.forward && !first.backward);
        assert_eq!(first.mouse_delta, Vec2::new(4.0, -2.0));
        assert_eq!(input.take_camera_input().mouse_delta, Vec2::ZERO);

        input.clear();
        assert!(!input.wireframe());
    }
}
