//! Platform (window and event loop) backends
//!
//! A platform backend owns the OS window, pumps its message loop into the
//! engine's [`EventQueue`] and presents finished frames. It also exposes the
//! GL context it created, if any, so a GPU graphics backend can load its
//! entry points.

#[cfg(feature = "glfw")]
pub mod glfw_backend;
pub mod null;

#[cfg(feature = "glfw")]
pub use glfw_backend::GlfwPlatform;
pub use null::{InputScript, NullPlatform};

use crate::backend::Backend;
use crate::input::EventQueue;
use std::ffi::c_void;
use thiserror::Error;

/// Platform errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// Windowing system could not be initialized
    #[error("{backend} initialization failed: {reason}")]
    InitFailed {
        /// Backend name
        backend: &'static str,
        /// Failure description
        reason: String,
    },

    /// Window creation failed
    #[error("window creation failed: {0}")]
    WindowCreation(String),

    /// Window size with a zero dimension
    #[error("invalid window size {width}x{height}")]
    InvalidSize {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },

    /// Operation issued without an open window
    #[error("no window is open")]
    NoWindow,
}

/// Operations a platform backend provides
pub trait PlatformBackend: Backend {
    /// Open the window
    fn init(&mut self, title: &str, width: u32, height: u32) -> Result<(), PlatformError>;

    /// Close the window and release the windowing system
    fn terminate(&mut self);

    /// Pump the OS event loop, appending translated events to `queue`
    ///
    /// Returns `false` once quitting was requested.
    fn pump_events(&mut self, queue: &mut EventQueue) -> bool;

    /// Present the finished frame
    fn swap_buffers(&mut self);

    /// Change the window title
    fn set_title(&mut self, title: &str) -> Result<(), PlatformError>;

    /// Change the window's client size
    fn set_size(&mut self, width: u32, height: u32) -> Result<(), PlatformError>;

    /// Current client size
    fn size(&self) -> (u32, u32);

    /// GL version of the window's context as `major * 100 + minor * 10`,
    /// or 0 without a GL context
    fn gl_version(&self) -> u32;

    /// Address of a GL entry point, null when unavailable
    fn gl_proc_address(&mut self, name: &str) -> *const c_void;
}

/// Platform backends in probe order
pub fn default_candidates() -> Vec<Box<dyn PlatformBackend>> {
    let mut candidates: Vec<Box<dyn PlatformBackend>> = Vec::new();
    #[cfg(feature = "glfw")]
    candidates.push(Box::new(GlfwPlatform::new()));
    candidates.push(Box::new(NullPlatform::new()));
    candidates
}

fn check_size(width: u32, height: u32) -> Result<(), PlatformError> {
    if width == 0 || height == 0 {
        return Err(PlatformError::InvalidSize { width, height });
    }
    Ok(())
}
