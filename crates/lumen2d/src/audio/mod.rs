//! # Audio
//!
//! Sound effects and music on top of an interchangeable [`AudioBackend`].
//!
//! ## Resources
//!
//! - **Wave**: decoded PCM kept by the façade (`create_wave`, `load_wave`).
//! - **Sound**: a wave uploaded to the backend for short effects.
//! - **Music**: a wave uploaded to the backend for background tracks.
//!
//! Sounds and music copy the wave's samples when created, so the wave can be
//! destroyed afterwards.
//!
//! ## Voices
//!
//! Playing a sound or a music track starts a new voice and returns its
//! [`VoiceId`]. The same sound can have any number of voices; pausing or
//! stopping one leaves the others alone. Once a voice is stopped, or has
//! finished and been reaped by [`Audio::update`], its id is stale and every
//! voice operation on it fails with [`AudioError::InvalidVoice`].

pub mod backend;
pub mod wave;

pub use backend::{AudioBackend, AudioResult, BufferId, VoiceId};
pub use wave::Wave;

use crate::backend::{select_backend, BackendError};
use crate::core::{AudioConfig, Enter, Leave, Lifecycle};
use crate::foundation::handles::{Handle, HandleError, HandleTable};
use std::path::Path;
use thiserror::Error;

/// Audio errors
#[derive(Error, Debug)]
pub enum AudioError {
    /// Operation issued while the façade is not initialized
    #[error("audio is not initialized")]
    NotInitialized,

    /// No audio backend could be selected
    #[error(transparent)]
    Selection(#[from] BackendError),

    /// The selected backend failed to open its device
    #[error("{backend} initialization failed: {reason}")]
    InitFailed {
        /// Backend name
        backend: &'static str,
        /// Failure description
        reason: String,
    },

    /// Voice id that was stopped, finished or never existed
    #[error("invalid or expired voice")]
    InvalidVoice,

    /// Unknown or destroyed resource handle
    #[error(transparent)]
    Handle(#[from] HandleError),

    /// Sample data with an unusable layout
    #[error("invalid wave: {0}")]
    InvalidWave(String),

    /// Malformed or unsupported audio file
    #[error("failed to decode audio: {0}")]
    Decode(String),

    /// Reading audio data failed
    #[error("audio I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend could not start playback
    #[error("playback failed: {0}")]
    PlaybackFailed(String),
}

impl From<hound::Error> for AudioError {
    fn from(error: hound::Error) -> Self {
        match error {
            hound::Error::IoError(e) => Self::Io(e),
            other => Self::Decode(other.to_string()),
        }
    }
}

/// A sound effect uploaded to the backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sound {
    buffer: BufferId,
    duration: f32,
}

impl Sound {
    /// Length of one play-through in seconds
    pub const fn duration_secs(&self) -> f32 {
        self.duration
    }
}

/// A music track uploaded to the backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Music {
    buffer: BufferId,
    duration: f32,
}

impl Music {
    /// Length of one play-through in seconds
    pub const fn duration_secs(&self) -> f32 {
        self.duration
    }
}

/// Audio façade
pub struct Audio {
    config: AudioConfig,
    preferred: Option<String>,
    lifecycle: Lifecycle,
    candidates: Vec<Box<dyn AudioBackend>>,
    backend: Option<Box<dyn AudioBackend>>,
    waves: HandleTable<Wave>,
    sounds: HandleTable<Sound>,
    music: HandleTable<Music>,
    master_volume: f32,
}

impl Audio {
    /// Create an uninitialized façade over `candidates`
    pub fn new(config: AudioConfig, preferred: Option<String>, candidates: Vec<Box<dyn AudioBackend>>) -> Self {
        let master_volume = clamp_volume(config.master_volume);
        Self {
            config,
            preferred,
            lifecycle: Lifecycle::new("Audio"),
            candidates,
            backend: None,
            waves: HandleTable::new("wave"),
            sounds: HandleTable::new("sound"),
            music: HandleTable::new("music"),
            master_volume,
        }
    }

    /// Select a backend (first call only) and open the output device
    pub fn initialize(&mut self) -> AudioResult<()> {
        if self.lifecycle.enter() == Enter::Nested {
            return Ok(());
        }

        if let Err(e) = self.start() {
            self.lifecycle.abort();
            return Err(e);
        }

        self.lifecycle.commit();
        Ok(())
    }

    fn start(&mut self) -> AudioResult<()> {
        if self.backend.is_none() {
            let candidates = std::mem::take(&mut self.candidates);
            self.backend = Some(select_backend("audio", candidates, self.preferred.as_deref())?);
        }
        let volume = self.master_volume;
        let backend = self.backend.as_deref_mut().ok_or(AudioError::NotInitialized)?;
        backend.init()?;
        backend.set_master_volume(volume);
        Ok(())
    }

    /// Release one initialization; the device closes with the last one
    pub fn terminate(&mut self) -> AudioResult<()> {
        match self.lifecycle.leave() {
            Leave::NotInitialized => Err(AudioError::NotInitialized),
            Leave::Nested => Ok(()),
            Leave::Last => {
                self.teardown();
                Ok(())
            }
        }
    }

    /// Stop regardless of outstanding initializations
    pub(crate) fn shutdown(&mut self) {
        if self.lifecycle.force_leave() {
            self.teardown();
        }
    }

    fn teardown(&mut self) {
        let sounds = self.sounds.drain().count();
        let music = self.music.drain().count();
        let waves = self.waves.drain().count();
        if sounds + music + waves > 0 {
            log::debug!(
                "Released {} sounds, {} music tracks and {} waves at shutdown",
                sounds,
                music,
                waves
            );
        }
        if let Some(backend) = self.backend.as_deref_mut() {
            backend.terminate();
        }
    }

    /// Whether the façade is usable
    pub fn is_initialized(&self) -> bool {
        self.lifecycle.is_initialized()
    }

    /// Name of the selected backend
    pub fn backend_name(&self) -> Option<&'static str> {
        self.backend.as_ref().map(|backend| backend.name())
    }

    /// Configuration the façade was created with
    pub const fn config(&self) -> &AudioConfig {
        &self.config
    }

    fn backend_mut(&mut self) -> AudioResult<&mut (dyn AudioBackend + 'static)> {
        if !self.lifecycle.is_initialized() {
            return Err(AudioError::NotInitialized);
        }
        self.backend.as_deref_mut().ok_or(AudioError::NotInitialized)
    }

    fn backend_ref(&self) -> AudioResult<&(dyn AudioBackend + 'static)> {
        if !self.lifecycle.is_initialized() {
            return Err(AudioError::NotInitialized);
        }
        self.backend.as_deref().ok_or(AudioError::NotInitialized)
    }

    /// Reap finished voices; the engine calls this once per frame
    pub fn update(&mut self) -> AudioResult<()> {
        self.backend_mut()?.update();
        Ok(())
    }

    // Volume

    /// Current master volume
    pub const fn master_volume(&self) -> f32 {
        self.master_volume
    }

    /// Scale all output; values outside 0.0 to 1.0 are clamped
    pub fn set_master_volume(&mut self, volume: f32) -> AudioResult<()> {
        let volume = clamp_volume(volume);
        self.backend_mut()?.set_master_volume(volume);
        self.master_volume = volume;
        Ok(())
    }

    // Waves

    /// Keep decoded PCM for later upload
    pub fn create_wave(&mut self, wave: Wave) -> AudioResult<Handle<Wave>> {
        self.backend_ref()?;
        Ok(self.waves.create(wave)?)
    }

    /// Decode a RIFF WAVE file and keep it
    pub fn load_wave<P: AsRef<Path>>(&mut self, path: P) -> AudioResult<Handle<Wave>> {
        self.backend_ref()?;
        let wave = Wave::from_file(path.as_ref()).map_err(|e| {
            log::error!("Failed to load wave {:?}: {}", path.as_ref(), e);
            e
        })?;
        self.create_wave(wave)
    }

    /// Kept wave
    pub fn wave(&self, handle: Handle<Wave>) -> AudioResult<&Wave> {
        self.backend_ref()?;
        Ok(self.waves.try_get(handle)?)
    }

    /// Forget a kept wave
    pub fn destroy_wave(&mut self, handle: Handle<Wave>) -> AudioResult<()> {
        self.backend_ref()?;
        self.waves.destroy(handle)?;
        Ok(())
    }

    fn upload(&mut self, wave: Handle<Wave>) -> AudioResult<(BufferId, f32)> {
        self.backend_ref()?;
        let wave = self.waves.try_get(wave)?.clone();
        let duration = wave.duration_secs();
        let buffer = self.backend_mut()?.load_sound(&wave)?;
        Ok((buffer, duration))
    }

    // Sounds

    /// Upload a kept wave as a sound effect
    pub fn load_sound(&mut self, wave: Handle<Wave>) -> AudioResult<Handle<Sound>> {
        let (buffer, duration) = self.upload(wave)?;
        match self.sounds.create(Sound { buffer, duration }) {
            Ok(handle) => {
                log::debug!("Created sound {} ({:.2}s)", handle.id(), duration);
                Ok(handle)
            }
            Err(e) => {
                self.backend_mut()?.unload_sound(buffer);
                Err(e.into())
            }
        }
    }

    /// Sound record
    pub fn sound(&self, handle: Handle<Sound>) -> AudioResult<&Sound> {
        self.backend_ref()?;
        Ok(self.sounds.try_get(handle)?)
    }

    /// Release a sound, stopping its voices
    pub fn destroy_sound(&mut self, handle: Handle<Sound>) -> AudioResult<()> {
        self.backend_ref()?;
        let sound = self.sounds.destroy(handle)?;
        self.backend_mut()?.unload_sound(sound.buffer);
        Ok(())
    }

    /// Play a sound once on a new voice
    pub fn play_sound(&mut self, handle: Handle<Sound>) -> AudioResult<VoiceId> {
        self.start_sound(handle, false)
    }

    /// Play a sound repeatedly on a new voice until stopped
    pub fn loop_sound(&mut self, handle: Handle<Sound>) -> AudioResult<VoiceId> {
        self.start_sound(handle, true)
    }

    fn start_sound(&mut self, handle: Handle<Sound>, looped: bool) -> AudioResult<VoiceId> {
        self.backend_ref()?;
        let buffer = self.sounds.try_get(handle)?.buffer;
        self.backend_mut()?.play(buffer, looped)
    }

    // Music

    /// Upload a kept wave as a music track
    pub fn open_music(&mut self, wave: Handle<Wave>) -> AudioResult<Handle<Music>> {
        let (buffer, duration) = self.upload(wave)?;
        match self.music.create(Music { buffer, duration }) {
            Ok(handle) => {
                log::debug!("Opened music {} ({:.2}s)", handle.id(), duration);
                Ok(handle)
            }
            Err(e) => {
                self.backend_mut()?.unload_sound(buffer);
                Err(e.into())
            }
        }
    }

    /// Music record
    pub fn music(&self, handle: Handle<Music>) -> AudioResult<&Music> {
        self.backend_ref()?;
        Ok(self.music.try_get(handle)?)
    }

    /// Release a music track, stopping its voices
    pub fn close_music(&mut self, handle: Handle<Music>) -> AudioResult<()> {
        self.backend_ref()?;
        let music = self.music.destroy(handle)?;
        self.backend_mut()?.unload_sound(music.buffer);
        Ok(())
    }

    /// Play a music track once on a new voice
    pub fn play_music(&mut self, handle: Handle<Music>) -> AudioResult<VoiceId> {
        self.start_music(handle, false)
    }

    /// Play a music track repeatedly on a new voice until stopped
    pub fn loop_music(&mut self, handle: Handle<Music>) -> AudioResult<VoiceId> {
        self.start_music(handle, true)
    }

    fn start_music(&mut self, handle: Handle<Music>, looped: bool) -> AudioResult<VoiceId> {
        self.backend_ref()?;
        let buffer = self.music.try_get(handle)?.buffer;
        self.backend_mut()?.play(buffer, looped)
    }

    // Voices

    /// Pause a voice
    pub fn pause_voice(&mut self, voice: VoiceId) -> AudioResult<()> {
        self.backend_mut()?.pause(voice)
    }

    /// Resume a paused voice
    pub fn unpause_voice(&mut self, voice: VoiceId) -> AudioResult<()> {
        self.backend_mut()?.unpause(voice)
    }

    /// Stop a voice; its id becomes stale
    pub fn stop_voice(&mut self, voice: VoiceId) -> AudioResult<()> {
        self.backend_mut()?.stop(voice)
    }

    /// Whether a voice is alive and not paused
    pub fn is_voice_playing(&self, voice: VoiceId) -> bool {
        self.backend_ref().is_ok_and(|backend| backend.is_playing(voice))
    }
}

impl Drop for Audio {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}
