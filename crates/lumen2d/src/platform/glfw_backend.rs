//! GLFW platform backend
//!
//! Opens a resizable window with an OpenGL 3.3 core context, translates key
//! and focus events into engine [`Event`]s and swaps the context's buffers
//! on present.

use super::{check_size, PlatformBackend, PlatformError};
use crate::backend::Backend;
use crate::input::{Event, EventQueue, KeyCode};
use glfw::Context;
use std::ffi::c_void;

fn log_glfw_error(error: glfw::Error, description: String) {
    log::error!("GLFW error {:?}: {}", error, description);
}

struct Surface {
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
}

/// Window and input through GLFW
#[derive(Default)]
pub struct GlfwPlatform {
    surface: Option<Surface>,
}

impl GlfwPlatform {
    /// Create the backend; nothing is opened until [`PlatformBackend::init`]
    pub fn new() -> Self {
        Self::default()
    }

    fn surface_mut(&mut self) -> Result<&mut Surface, PlatformError> {
        self.surface.as_mut().ok_or(PlatformError::NoWindow)
    }
}

impl Backend for GlfwPlatform {
    fn name(&self) -> &'static str {
        "glfw"
    }

    fn probe(&self) -> bool {
        // Dropping the instance terminates GLFW again
        glfw::init(log_glfw_error).is_ok()
    }
}

impl PlatformBackend for GlfwPlatform {
    fn init(&mut self, title: &str, width: u32, height: u32) -> Result<(), PlatformError> {
        check_size(width, height)?;

        let mut glfw = glfw::init(log_glfw_error).map_err(|e| PlatformError::InitFailed {
            backend: "glfw",
            reason: format!("{:?}", e),
        })?;

        glfw.window_hint(glfw::WindowHint::ContextVersion(3, 3));
        glfw.window_hint(glfw::WindowHint::OpenGlProfile(glfw::OpenGlProfileHint::Core));
        glfw.window_hint(glfw::WindowHint::Resizable(true));

        let (mut window, events) = glfw
            .create_window(width, height, title, glfw::WindowMode::Windowed)
            .ok_or_else(|| PlatformError::WindowCreation(format!("{}x{} '{}'", width, height, title)))?;

        window.make_current();
        glfw.set_swap_interval(glfw::SwapInterval::Sync(1));

        window.set_key_polling(true);
        window.set_focus_polling(true);
        window.set_close_polling(true);
        window.set_framebuffer_size_polling(true);

        log::info!("Created GLFW window '{}' {}x{}", title, width, height);
        self.surface = Some(Surface { glfw, window, events });
        Ok(())
    }

    fn terminate(&mut self) {
        if self.surface.take().is_some() {
            log::debug!("GLFW window closed");
        }
    }

    fn pump_events(&mut self, queue: &mut EventQueue) -> bool {
        let Some(surface) = self.surface.as_mut() else {
            return false;
        };

        surface.glfw.poll_events();
        for (_, event) in glfw::flush_messages(&surface.events) {
            match event {
                glfw::WindowEvent::Key(key, _, glfw::Action::Press, _) => {
                    if let Some(code) = map_key(key) {
                        queue.push(Event::KeyPressed(code));
                    }
                }
                glfw::WindowEvent::Key(key, _, glfw::Action::Release, _) => {
                    if let Some(code) = map_key(key) {
                        queue.push(Event::KeyReleased(code));
                    }
                }
                glfw::WindowEvent::Focus(true) => queue.push(Event::WindowActivated),
                glfw::WindowEvent::Focus(false) => queue.push(Event::WindowDeactivated),
                glfw::WindowEvent::FramebufferSize(width, height) => match resize_event(width, height) {
                    Some(event) => queue.push(event),
                    None => log::debug!("Ignoring framebuffer size {}x{}", width, height),
                },
                _ => {}
            }
        }

        !surface.window.should_close()
    }

    fn swap_buffers(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.window.swap_buffers();
        }
    }

    fn set_title(&mut self, title: &str) -> Result<(), PlatformError> {
        self.surface_mut()?.window.set_title(title);
        Ok(())
    }

    fn set_size(&mut self, width: u32, height: u32) -> Result<(), PlatformError> {
        check_size(width, height)?;
        self.surface_mut()?.window.set_size(width as i32, height as i32);
        Ok(())
    }

    fn size(&self) -> (u32, u32) {
        self.surface.as_ref().map_or((0, 0), |surface| {
            let (width, height) = surface.window.get_framebuffer_size();
            (width.max(0) as u32, height.max(0) as u32)
        })
    }

    fn gl_version(&self) -> u32 {
        self.surface.as_ref().map_or(0, |surface| {
            let version = surface.window.get_context_version();
            version.major as u32 * 100 + version.minor as u32 * 10
        })
    }

    fn gl_proc_address(&mut self, name: &str) -> *const c_void {
        match self.surface.as_mut() {
            Some(surface) => surface.window.get_proc_address(name) as *const c_void,
            None => std::ptr::null(),
        }
    }
}

/// `None` for the zero size reported while minimized
fn resize_event(width: i32, height: i32) -> Option<Event> {
    let width = u32::try_from(width).ok().filter(|w| *w > 0)?;
    let height = u32::try_from(height).ok().filter(|h| *h > 0)?;
    Some(Event::WindowResized { width, height })
}

fn map_key(key: glfw::Key) -> Option<KeyCode> {
    use glfw::Key;
    Some(match key {
        Key::Num0 => KeyCode::Key0,
        Key::Num1 => KeyCode::Key1,
        Key::Num2 => KeyCode::Key2,
        Key::Num3 => KeyCode::Key3,
        Key::Num4 => KeyCode::Key4,
        Key::Num5 => KeyCode::Key5,
        Key::Num6 => KeyCode::Key6,
        Key::Num7 => KeyCode::Key7,
        Key::Num8 => KeyCode::Key8,
        Key::Num9 => KeyCode::Key9,
        Key::A => KeyCode::A,
        Key::B => KeyCode::B,
        Key::C => KeyCode::C,
        Key::D => KeyCode::D,
        Key::E => KeyCode::E,
        Key::F => KeyCode::F,
        Key::G => KeyCode::G,
        Key::H => KeyCode::H,
        Key::I => KeyCode::I,
        Key::J => KeyCode::J,
        Key::K => KeyCode::K,
        Key::L => KeyCode::L,
        Key::M => KeyCode::M,
        Key::N => KeyCode::N,
        Key::O => KeyCode::O,
        Key::P => KeyCode::P,
        Key::Q => KeyCode::Q,
        Key::R => KeyCode::R,
        Key::S => KeyCode::S,
        Key::T => KeyCode::T,
        Key::U => KeyCode::U,
        Key::V => KeyCode::V,
        Key::W => KeyCode::W,
        Key::X => KeyCode::X,
        Key::Y => KeyCode::Y,
        Key::Z => KeyCode::Z,
        Key::GraveAccent => KeyCode::Grave,
        Key::Apostrophe => KeyCode::Apostrophe,
        Key::Minus => KeyCode::Minus,
        Key::Equal => KeyCode::Equal,
        Key::LeftBracket => KeyCode::LeftBracket,
        Key::RightBracket => KeyCode::RightBracket,
        Key::Comma => KeyCode::Comma,
        Key::Period => KeyCode::Period,
        Key::Semicolon => KeyCode::Semicolon,
        Key::Slash => KeyCode::Slash,
        Key::Backslash => KeyCode::Backslash,
        Key::Space => KeyCode::Space,
        Key::Escape => KeyCode::Escape,
        Key::Backspace => KeyCode::Backspace,
        Key::Tab => KeyCode::Tab,
        Key::Enter => KeyCode::Enter,
        Key::F1 => KeyCode::F1,
        Key::F2 => KeyCode::F2,
        Key::F3 => KeyCode::F3,
        Key::F4 => KeyCode::F4,
        Key::F5 => KeyCode::F5,
        Key::F6 => KeyCode::F6,
        Key::F7 => KeyCode::F7,
        Key::F8 => KeyCode::F8,
        Key::F9 => KeyCode::F9,
        Key::F10 => KeyCode::F10,
        Key::F11 => KeyCode::F11,
        Key::F12 => KeyCode::F12,
        Key::Up => KeyCode::Up,
        Key::Down => KeyCode::Down,
        Key::Left => KeyCode::Left,
        Key::Right => KeyCode::Right,
        Key::LeftShift => KeyCode::LeftShift,
        Key::RightShift => KeyCode::RightShift,
        Key::LeftControl => KeyCode::LeftControl,
        Key::RightControl => KeyCode::RightControl,
        Key::LeftAlt => KeyCode::LeftAlt,
        Key::RightAlt => KeyCode::RightAlt,
        Key::LeftSuper => KeyCode::LeftSuper,
        Key::RightSuper => KeyCode::RightSuper,
        Key::Menu => KeyCode::Menu,
        Key::PageUp => KeyCode::PageUp,
        Key::PageDown => KeyCode::PageDown,
        Key::Home => KeyCode::Home,
        Key::End => KeyCode::End,
        Key::Insert => KeyCode::Insert,
        Key::Delete => KeyCode::Delete,
        Key::Pause => KeyCode::Pause,
        Key::Kp0 => KeyCode::Keypad0,
        Key::Kp1 => KeyCode::Keypad1,
        Key::Kp2 => KeyCode::Keypad2,
        Key::Kp3 => KeyCode::Keypad3,
        Key::Kp4 => KeyCode::Keypad4,
        Key::Kp5 => KeyCode::Keypad5,
        Key::Kp6 => KeyCode::Keypad6,
        Key::Kp7 => KeyCode::Keypad7,
        Key::Kp8 => KeyCode::Keypad8,
        Key::Kp9 => KeyCode::Keypad9,
        Key::KpMultiply => KeyCode::KeypadMultiply,
        Key::KpAdd => KeyCode::KeypadAdd,
        Key::KpSubtract => KeyCode::KeypadSubtract,
        Key::KpDecimal => KeyCode::KeypadDecimal,
        Key::KpDivide => KeyCode::KeypadDivide,
        Key::KpEnter => KeyCode::KeypadEnter,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        assert_eq!(map_key(glfw::Key::Num3), Some(KeyCode::Key3));
        assert_eq!(map_key(glfw::Key::Kp3), Some(KeyCode::Keypad3));
        assert_eq!(map_key(glfw::Key::GraveAccent), Some(KeyCode::Grave));
        assert_eq!(map_key(glfw::Key::CapsLock), None);
    }

    #[test]
    fn test_framebuffer_size_becomes_resize_event() {
        assert_eq!(resize_event(800, 600), Some(Event::WindowResized { width: 800, height: 600 }));
        assert_eq!(resize_event(0, 0), None);
        assert_eq!(resize_event(-1, 600), None);
    }
}
