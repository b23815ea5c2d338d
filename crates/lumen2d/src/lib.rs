//! # lumen2d
//!
//! A minimal 2D runtime: one window, keyboard input, immediate-mode shape and
//! texture drawing, and sound playback, each behind interchangeable backends.
//!
//! ## Features
//!
//! - **Backend selection**: every capability probes an ordered list of
//!   backends and keeps the first available one; a `null` backend always
//!   closes the list
//! - **Edge-triggered keyboard**: presses and releases stay visible for a
//!   whole frame
//! - **Typed resource handles**: textures, images, waves, sounds and music
//!   each live in their own handle table
//! - **Batched drawing**: draw calls are merged and backend state changes
//!   are applied lazily
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lumen2d::prelude::*;
//!
//! struct MyApp;
//!
//! impl Application for MyApp {
//!     fn initialize(&mut self, _engine: &mut Engine) -> Result<(), AppError> {
//!         Ok(())
//!     }
//!
//!     fn update(&mut self, engine: &mut Engine, _delta_time: f32) -> Result<(), AppError> {
//!         if engine.is_key_pressed(KeyCode::Space) {
//!             engine.graphics_mut().draw_point(10.0, 10.0, Color::WHITE)?;
//!         }
//!         Ok(())
//!     }
//!
//!     fn cleanup(&mut self, _engine: &mut Engine) {}
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     Engine::run(EngineConfig::new("demo"), &mut MyApp)?;
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod backend;
pub mod config;
pub mod core;
pub mod foundation;
pub mod input;
pub mod platform;
pub mod render;

mod application;
mod engine;
#[cfg(test)]
mod testing;

pub use application::{AppError, Application};
pub use engine::{Engine, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        audio::{Audio, AudioError, Music, Sound, VoiceId, Wave},
        config::Config,
        core::EngineConfig,
        foundation::{handles::Handle, math::Mat4},
        input::{Event, KeyCode, KeyState, KeyboardState},
        render::{BlendMode, Color, Graphics, GraphicsError, Image, Rect, Texture},
        AppError, Application, Engine, EngineError,
    };
}
