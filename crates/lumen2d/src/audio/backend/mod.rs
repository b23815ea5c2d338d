//! Audio backend abstraction
//!
//! An audio backend stores uploaded PCM buffers and plays them on voices.
//! Every `play` starts a new voice, so the same buffer can sound several
//! times at once and each instance is paused or stopped on its own.

#[cfg(feature = "rodio")]
pub mod rodio_backend;
pub mod null;

#[cfg(feature = "rodio")]
pub use rodio_backend::RodioAudio;
pub use null::NullAudio;

use super::{AudioError, Wave};
use crate::backend::Backend;

/// Result type for audio operations
pub type AudioResult<T> = Result<T, AudioError>;

/// Backend-side identifier of an uploaded buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

slotmap::new_key_type! {
    /// One playing instance of a buffer
    ///
    /// Keys are generational: a stopped or finished voice's id never
    /// resolves again, even after its slot is reused.
    pub struct VoiceId;
}

/// Operations an audio backend provides
pub trait AudioBackend: Backend {
    /// Open the output device
    fn init(&mut self) -> AudioResult<()>;

    /// Stop all voices, drop all buffers and close the device
    fn terminate(&mut self);

    /// Scale every voice's output (0.0 to 1.0)
    fn set_master_volume(&mut self, volume: f32);

    /// Upload PCM data
    fn load_sound(&mut self, wave: &Wave) -> AudioResult<BufferId>;

    /// Release a buffer, stopping the voices that play it
    fn unload_sound(&mut self, buffer: BufferId);

    /// Start a voice playing `buffer`
    fn play(&mut self, buffer: BufferId, looped: bool) -> AudioResult<VoiceId>;

    /// Pause a voice
    fn pause(&mut self, voice: VoiceId) -> AudioResult<()>;

    /// Resume a paused voice
    fn unpause(&mut self, voice: VoiceId) -> AudioResult<()>;

    /// Stop a voice and release it
    fn stop(&mut self, voice: VoiceId) -> AudioResult<()>;

    /// Whether `voice` exists and is not paused
    fn is_playing(&self, voice: VoiceId) -> bool;

    /// Release voices that finished playing
    fn update(&mut self);
}

/// Audio backends in probe order
pub fn default_candidates() -> Vec<Box<dyn AudioBackend>> {
    let mut candidates: Vec<Box<dyn AudioBackend>> = Vec::new();
    #[cfg(feature = "rodio")]
    candidates.push(Box::new(RodioAudio::new()));
    candidates.push(Box::new(NullAudio::new()));
    candidates
}
