//! Core engine implementation
//!
//! [`Engine`] is the context object an application owns. It selects and
//! starts one platform backend and creates the [`Graphics`] and [`Audio`]
//! façades, then drives the per-frame input bookkeeping:
//!
//! 1. Keys released last frame become idle.
//! 2. The platform pumps OS events into the event queue.
//! 3. The queue is drained in order into the keyboard state.
//!
//! [`Engine::present`] flushes queued draws and then swaps buffers.

use crate::application::Application;
use crate::audio::{self, Audio, AudioBackend, AudioError};
use crate::backend::{select_backend, BackendError};
use crate::config::{Config, ConfigError};
use crate::core::{EngineConfig, Enter, Leave, Lifecycle};
use crate::foundation::time::Timer;
use crate::input::{Event, EventQueue, KeyCode, KeyboardState};
use crate::platform::{self, PlatformBackend, PlatformError};
use crate::render::{self, Graphics, GraphicsBackend, GraphicsError};
use thiserror::Error;

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Operation issued while the engine is not initialized
    #[error("engine is not initialized")]
    NotInitialized,

    /// No backend could be selected for a capability
    #[error("backend selection failed: {0}")]
    Backend(#[from] BackendError),

    /// Platform error
    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Graphics error
    #[error("graphics error: {0}")]
    Graphics(#[from] GraphicsError),

    /// Audio error
    #[error("audio error: {0}")]
    Audio(#[from] AudioError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Application callback error
    #[error("application error: {0}")]
    Application(String),
}

/// Main engine struct
pub struct Engine {
    config: EngineConfig,
    lifecycle: Lifecycle,
    platform_candidates: Vec<Box<dyn PlatformBackend>>,
    platform: Option<Box<dyn PlatformBackend>>,
    graphics: Graphics,
    audio: Audio,
    events: EventQueue,
    keyboard: KeyboardState,
    window_active: bool,
    quit_requested: bool,
    timer: Timer,
}

impl Engine {
    /// Create an engine over the default backend lists
    pub fn new(config: EngineConfig) -> Self {
        Self::with_backends(
            config,
            platform::default_candidates(),
            render::backend::default_candidates(),
            audio::backend::default_candidates(),
        )
    }

    /// Create an engine over explicit backend lists, each in probe order
    pub fn with_backends(
        config: EngineConfig,
        platform: Vec<Box<dyn PlatformBackend>>,
        graphics: Vec<Box<dyn GraphicsBackend>>,
        audio: Vec<Box<dyn AudioBackend>>,
    ) -> Self {
        let graphics = Graphics::new(config.graphics.clone(), config.backends.graphics.clone(), graphics);
        let audio = Audio::new(config.audio.clone(), config.backends.audio.clone(), audio);
        Self {
            config,
            lifecycle: Lifecycle::new("Engine"),
            platform_candidates: platform,
            platform: None,
            graphics,
            audio,
            events: EventQueue::new(),
            keyboard: KeyboardState::new(),
            window_active: false,
            quit_requested: false,
            timer: Timer::new(),
        }
    }

    /// Open the window and start graphics and audio
    ///
    /// Backends are selected on the first call only; a later
    /// re-initialization reuses them.
    pub fn initialize(&mut self) -> Result<(), EngineError> {
        if self.lifecycle.enter() == Enter::Nested {
            return Ok(());
        }

        log::info!("Initializing engine...");
        if let Err(e) = self.start() {
            log::error!("Engine initialization failed: {}", e);
            self.lifecycle.abort();
            return Err(e);
        }

        self.lifecycle.commit();
        log::info!(
            "Engine initialized (platform: {}, graphics: {}, audio: {})",
            self.platform.as_ref().map_or("none", |p| p.name()),
            self.graphics.backend_name().unwrap_or("none"),
            self.audio.backend_name().unwrap_or("none")
        );
        Ok(())
    }

    fn start(&mut self) -> Result<(), EngineError> {
        self.config.validate()?;

        if self.platform.is_none() {
            let candidates = std::mem::take(&mut self.platform_candidates);
            self.platform = Some(select_backend(
                "platform",
                candidates,
                self.config.backends.platform.as_deref(),
            )?);
        }

        let window = &self.config.window;
        let platform = self.platform.as_deref_mut().ok_or(EngineError::NotInitialized)?;
        platform.init(&window.title, window.width, window.height)?;

        if let Err(e) = self.graphics.initialize(window.width, window.height) {
            platform.terminate();
            return Err(match e {
                GraphicsError::Selection(e) => EngineError::Backend(e),
                other => other.into(),
            });
        }

        if let Err(e) = self.audio.initialize() {
            self.graphics.shutdown();
            platform.terminate();
            return Err(match e {
                AudioError::Selection(e) => EngineError::Backend(e),
                other => other.into(),
            });
        }

        self.events.clear();
        self.keyboard = KeyboardState::new();
        self.window_active = true;
        self.quit_requested = false;
        self.timer.reset();
        Ok(())
    }

    /// Release one initialization; everything stops with the last one
    pub fn terminate(&mut self) -> Result<(), EngineError> {
        match self.lifecycle.leave() {
            Leave::NotInitialized => Err(EngineError::NotInitialized),
            Leave::Nested => Ok(()),
            Leave::Last => {
                self.teardown();
                Ok(())
            }
        }
    }

    fn teardown(&mut self) {
        self.audio.shutdown();
        self.graphics.shutdown();
        if let Some(platform) = self.platform.as_deref_mut() {
            platform.terminate();
        }
        self.events.clear();
        self.keyboard = KeyboardState::new();
        self.window_active = false;
        log::info!("Engine shutdown complete");
    }

    /// Whether the engine is usable
    pub fn is_initialized(&self) -> bool {
        self.lifecycle.is_initialized()
    }

    fn ensure_initialized(&self) -> Result<(), EngineError> {
        if self.lifecycle.is_initialized() {
            Ok(())
        } else {
            Err(EngineError::NotInitialized)
        }
    }

    fn platform_mut(&mut self) -> Result<&mut (dyn PlatformBackend + 'static), EngineError> {
        self.ensure_initialized()?;
        self.platform.as_deref_mut().ok_or(EngineError::NotInitialized)
    }

    /// Ask the main loop to end; the next [`Engine::process`] returns `false`
    pub fn quit(&mut self) {
        log::info!("Engine shutdown requested");
        self.quit_requested = true;
    }

    /// Process one frame of input
    ///
    /// Returns `Ok(false)` once the platform reports that quitting was
    /// requested, or after [`Engine::quit`]. Events queued before the
    /// request are still applied.
    pub fn process(&mut self) -> Result<bool, EngineError> {
        self.ensure_initialized()?;

        self.keyboard.begin_frame();

        let platform = self.platform.as_deref_mut().ok_or(EngineError::NotInitialized)?;
        let running = platform.pump_events(&mut self.events) && !self.quit_requested;

        let mut resized = None;
        for event in self.events.drain() {
            match event {
                Event::WindowActivated => {
                    log::debug!("Window activated");
                    self.window_active = true;
                }
                Event::WindowDeactivated => {
                    log::debug!("Window deactivated, releasing held keys");
                    self.window_active = false;
                }
                Event::WindowResized { width, height } => resized = Some((width, height)),
                Event::KeyPressed(_) | Event::KeyReleased(_) => {}
            }
            self.keyboard.apply(event);
        }

        if let Some((width, height)) = resized {
            self.graphics.resize(width, height)?;
            self.config.window.width = width;
            self.config.window.height = height;
            log::debug!("Window resized by platform to {}x{}", width, height);
        }

        self.timer.update();
        self.graphics.begin_frame();
        self.audio.update()?;

        if !running {
            log::info!("Quit requested");
        }
        Ok(running)
    }

    /// Flush queued draws, then swap buffers
    pub fn present(&mut self) -> Result<(), EngineError> {
        self.ensure_initialized()?;
        self.graphics.flush()?;
        self.platform_mut()?.swap_buffers();
        Ok(())
    }

    // Input
    //
    // Key queries never fail. Before initialization and after termination
    // every key reads as idle.

    /// Snapshot of every key's state
    pub const fn keyboard_state(&self) -> KeyboardState {
        self.keyboard
    }

    /// Whether `key` is idle
    pub fn is_key_idle(&self, key: KeyCode) -> bool {
        self.keyboard.is_idle(key)
    }

    /// Whether `key` is held down
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keyboard.is_pressed(key)
    }

    /// Whether `key` was released during the last processed frame
    pub fn is_key_released(&self, key: KeyCode) -> bool {
        self.keyboard.is_released(key)
    }

    /// Whether the window has focus
    pub const fn is_window_active(&self) -> bool {
        self.window_active
    }

    // Window

    /// Change the window title
    pub fn set_window_title(&mut self, title: &str) -> Result<(), EngineError> {
        self.platform_mut()?.set_title(title)?;
        self.config.window.title = title.to_string();
        Ok(())
    }

    /// Resize the window; the graphics view follows
    pub fn set_window_size(&mut self, width: u32, height: u32) -> Result<(), EngineError> {
        self.platform_mut()?.set_size(width, height)?;
        self.graphics.resize(width, height)?;
        self.config.window.width = width;
        self.config.window.height = height;
        log::debug!("Window resized to {}x{}", width, height);
        Ok(())
    }

    /// Current window client size
    pub fn window_size(&self) -> (u32, u32) {
        self.platform.as_ref().map_or((0, 0), |platform| platform.size())
    }

    /// Name of the selected platform backend
    pub fn platform_name(&self) -> Option<&'static str> {
        self.platform.as_ref().map(|platform| platform.name())
    }

    // Time

    /// Seconds since initialization, single precision
    pub fn time_mediump(&self) -> f32 {
        self.timer.elapsed_mediump()
    }

    /// Seconds since initialization, double precision
    pub fn time_highp(&self) -> f64 {
        self.timer.elapsed_highp()
    }

    /// Seconds between the last two processed frames
    pub fn delta_time(&self) -> f32 {
        self.timer.delta_time()
    }

    /// Frames processed since initialization
    pub fn frame_count(&self) -> u64 {
        self.timer.frame_count()
    }

    // Subsystems

    /// Graphics façade
    pub const fn graphics(&self) -> &Graphics {
        &self.graphics
    }

    /// Mutable graphics façade
    pub fn graphics_mut(&mut self) -> &mut Graphics {
        &mut self.graphics
    }

    /// Audio façade
    pub const fn audio(&self) -> &Audio {
        &self.audio
    }

    /// Mutable audio façade
    pub fn audio_mut(&mut self) -> &mut Audio {
        &mut self.audio
    }

    /// Active configuration
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    // Main loop

    /// Create an engine, initialize it and run `app` until quitting
    pub fn run<A: Application>(config: EngineConfig, app: &mut A) -> Result<(), EngineError> {
        let mut engine = Self::new(config);
        engine.initialize()?;
        engine.run_app(app)?;
        engine.terminate()
    }

    /// Run `app` on an initialized engine until quitting
    ///
    /// Each frame is `process`, `update`, `render`, `present`. `cleanup` is
    /// called once the loop ends, also when a frame failed.
    pub fn run_app<A: Application>(&mut self, app: &mut A) -> Result<(), EngineError> {
        self.ensure_initialized()?;
        app.initialize(self)
            .map_err(|e| EngineError::Application(format!("App initialization: {}", e)))?;

        log::info!("Starting main loop...");
        let result = self.frames(app);
        app.cleanup(self);
        result
    }

    fn frames<A: Application>(&mut self, app: &mut A) -> Result<(), EngineError> {
        while self.process()? {
            let delta_time = self.delta_time();
            app.update(self, delta_time)
                .map_err(|e| EngineError::Application(format!("App update: {}", e)))?;
            app.render(self)
                .map_err(|e| EngineError::Application(format!("App render: {}", e)))?;
            self.present()?;
        }
        Ok(())
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if self.lifecycle.force_leave() {
            self.teardown();
        }
    }
}
