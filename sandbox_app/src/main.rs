//! Sandbox demo application
//!
//! Draws a bouncing square over a checkerboard texture and plays a short
//! tone whenever the square hits a wall. Space pauses the motion, Escape
//! quits. Without the `glfw` feature the demo runs headless for a fixed
//! number of frames and can save its last frame with `--capture <file.png>`.

use lumen2d::audio;
use lumen2d::platform::{self, NullPlatform, PlatformBackend};
use lumen2d::prelude::*;
use lumen2d::render;

const HEADLESS_FRAMES: u64 = 120;
const SQUARE: f32 = 48.0;

struct SandboxApp {
    checker: Option<Handle<Texture>>,
    bounce: Option<Handle<Sound>>,
    position: [f32; 2],
    velocity: [f32; 2],
    paused: bool,
    capture_path: Option<String>,
}

impl SandboxApp {
    fn new(capture_path: Option<String>) -> Self {
        Self {
            checker: None,
            bounce: None,
            position: [100.0, 80.0],
            velocity: [180.0, 140.0],
            paused: false,
            capture_path,
        }
    }

    fn checkerboard() -> Image {
        let size = 8;
        let mut pixels = Vec::with_capacity(size * size * 4);
        for y in 0..size {
            for x in 0..size {
                let shade = if (x + y) % 2 == 0 { 70 } else { 40 };
                pixels.extend_from_slice(&[shade, shade, shade + 20, 255]);
            }
        }
        match Image::new(size as u32, size as u32, 4, pixels) {
            Ok(image) => image,
            Err(e) => {
                log::warn!("Checkerboard generation failed: {}", e);
                Image::solid_color(size as u32, size as u32, [50, 50, 60, 255])
            }
        }
    }

    fn tone() -> Result<Wave, AudioError> {
        let rate = 22050;
        let samples = (0..rate / 20)
            .map(|i| {
                let t = i as f32 / rate as f32;
                ((t * 880.0 * std::f32::consts::TAU).sin() * 8000.0) as i16
            })
            .collect();
        Wave::new(1, rate, samples)
    }
}

impl Application for SandboxApp {
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
        let checker = engine.graphics_mut().create_texture(&Self::checkerboard())?;
        self.checker = Some(checker);

        let audio = engine.audio_mut();
        let wave = audio.create_wave(Self::tone()?)?;
        self.bounce = Some(audio.load_sound(wave)?);
        audio.destroy_wave(wave)?;

        log::info!("Sandbox ready: Space pauses, Escape quits");
        Ok(())
    }

    fn update(&mut self, engine: &mut Engine, delta_time: f32) -> Result<(), AppError> {
        if engine.is_key_released(KeyCode::Space) {
            self.paused = !self.paused;
        }
        if engine.is_key_pressed(KeyCode::Escape) {
            engine.set_window_title("lumen2d sandbox (closing)")?;
            engine.quit();
        }
        if self.paused {
            return Ok(());
        }

        let (width, height) = engine.graphics().size();
        let bounds = [width as f32 - SQUARE, height as f32 - SQUARE];
        let mut bounced = false;
        for axis in 0..2 {
            self.position[axis] += self.velocity[axis] * delta_time;
            if self.position[axis] < 0.0 || self.position[axis] > bounds[axis] {
                self.position[axis] = self.position[axis].clamp(0.0, bounds[axis].max(0.0));
                self.velocity[axis] = -self.velocity[axis];
                bounced = true;
            }
        }

        if bounced {
            if let Some(sound) = self.bounce {
                engine.audio_mut().play_sound(sound)?;
            }
        }
        Ok(())
    }

    fn render(&mut self, engine: &mut Engine) -> Result<(), AppError> {
        let (width, height) = engine.graphics().size();
        let graphics = engine.graphics_mut();
        graphics.clear(Color::rgb(20, 20, 30))?;

        if let Some(checker) = self.checker {
            graphics.draw_texture(checker, 0.0, 0.0, width as f32, height as f32)?;
        }

        graphics.push_matrix()?;
        graphics.translate(self.position[0] + SQUARE / 2.0, self.position[1] + SQUARE / 2.0)?;
        graphics.rotate(self.position[0])?;
        graphics.draw_rectangle(
            -SQUARE / 2.0,
            -SQUARE / 2.0,
            SQUARE,
            SQUARE,
            Color::WHITE,
            Color::rgba(220, 80, 60, 200),
        )?;
        graphics.pop_matrix()?;

        graphics.set_blend_mode(BlendMode::ADD)?;
        graphics.draw_line(0.0, height as f32, self.position[0], self.position[1], Color::rgb(60, 120, 220))?;
        graphics.set_blend_mode(BlendMode::ALPHA)?;
        Ok(())
    }

    fn cleanup(&mut self, engine: &mut Engine) {
        let stats = engine.graphics().stats();
        log::info!(
            "Last frame: {} draw calls, {} vertices, {} texture changes",
            stats.draw_calls,
            stats.vertices,
            stats.texture_changes
        );

        if let Some(path) = self.capture_path.take() {
            match engine.graphics_mut().capture_screen() {
                Ok(image) => match image.save(&path) {
                    Ok(()) => log::info!("Saved capture to {}", path),
                    Err(e) => log::error!("Failed to save capture: {}", e),
                },
                Err(e) => log::error!("Screen capture failed: {}", e),
            }
        }

        if let Some(checker) = self.checker.take() {
            if let Err(e) = engine.graphics_mut().destroy_texture(checker) {
                log::warn!("Failed to destroy texture: {}", e);
            }
        }
    }
}

fn platform_candidates() -> Vec<Box<dyn PlatformBackend>> {
    if cfg!(feature = "glfw") {
        platform::default_candidates()
    } else {
        vec![Box::new(NullPlatform::new().with_frame_limit(HEADLESS_FRAMES))]
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let mut config_path = None;
    let mut capture_path = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--capture" => capture_path = args.next(),
            other => config_path = Some(other.to_string()),
        }
    }

    let config = match &config_path {
        Some(path) => EngineConfig::load_from_file(path)?,
        None => EngineConfig::new("lumen2d sandbox").with_window_size(640, 480),
    };
    lumen2d::foundation::logging::init_with_level(&config.logging.level);

    let mut engine = Engine::with_backends(
        config,
        platform_candidates(),
        render::backend::default_candidates(),
        audio::backend::default_candidates(),
    );
    if let Err(e) = engine.initialize() {
        log::error!("Failed to start: {}", e);
        return Err(e.into());
    }

    let mut app = SandboxApp::new(capture_path);
    engine.run_app(&mut app)?;
    engine.terminate()?;
    Ok(())
}
