//! Application trait and lifecycle management

use crate::audio::AudioError;
use crate::engine::{Engine, EngineError};
use crate::render::GraphicsError;
use thiserror::Error;

/// Application lifecycle trait
///
/// Implement this trait and hand the value to [`Engine::run`]. The engine
/// calls `initialize` once, then `update` and `render` every frame until the
/// platform requests quitting, then `cleanup`.
pub trait Application {
    /// Initialize the application
    ///
    /// Called once after the engine is initialized. Load textures and
    /// sounds here.
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError>;

    /// Update the application
    ///
    /// Called every frame after input was processed.
    ///
    /// # Arguments
    /// * `engine` - Mutable reference to the engine
    /// * `delta_time` - Time since last frame in seconds
    fn update(&mut self, engine: &mut Engine, delta_time: f32) -> Result<(), AppError>;

    /// Issue this frame's draw calls
    ///
    /// Queued draws are flushed and presented after this returns.
    fn render(&mut self, _engine: &mut Engine) -> Result<(), AppError> {
        Ok(())
    }

    /// Cleanup the application
    ///
    /// Called when the main loop ends, before the engine terminates.
    fn cleanup(&mut self, engine: &mut Engine);
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Engine error propagated to application level
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Graphics call failed
    #[error("Graphics error: {0}")]
    Graphics(#[from] GraphicsError),

    /// Audio call failed
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    /// Custom application error
    #[error("Application error: {0}")]
    Custom(String),
}
