//! Silent audio backend
//!
//! Tracks buffers and voices exactly like a real backend but produces no
//! output. Voices never finish on their own; they end when stopped or when
//! their buffer is unloaded.

use super::{AudioBackend, AudioResult, BufferId, VoiceId};
use crate::audio::{AudioError, Wave};
use crate::backend::Backend;
use slotmap::SlotMap;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
struct NullVoice {
    buffer: BufferId,
    looped: bool,
    paused: bool,
}

/// Audio backend without an output device
#[derive(Debug, Default)]
pub struct NullAudio {
    buffers: HashMap<BufferId, usize>,
    voices: SlotMap<VoiceId, NullVoice>,
    next_buffer: u32,
    master_volume: f32,
}

impl NullAudio {
    /// Create the backend
    pub fn new() -> Self {
        Self {
            master_volume: 1.0,
            ..Self::default()
        }
    }

    /// Voices currently alive, paused or not
    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    /// Whether `voice` was started looping
    pub fn is_looping(&self, voice: VoiceId) -> bool {
        self.voices.get(voice).is_some_and(|v| v.looped)
    }

    /// Last master volume set
    pub const fn master_volume(&self) -> f32 {
        self.master_volume
    }

    fn voice_mut(&mut self, voice: VoiceId) -> AudioResult<&mut NullVoice> {
        self.voices.get_mut(voice).ok_or(AudioError::InvalidVoice)
    }
}

impl Backend for NullAudio {
    fn name(&self) -> &'static str {
        "null"
    }

    fn probe(&self) -> bool {
        true
    }
}

impl AudioBackend for NullAudio {
    fn init(&mut self) -> AudioResult<()> {
        Ok(())
    }

    fn terminate(&mut self) {
        self.voices.clear();
        self.buffers.clear();
    }

    fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume;
    }

    fn load_sound(&mut self, wave: &Wave) -> AudioResult<BufferId> {
        self.next_buffer += 1;
        let id = BufferId(self.next_buffer);
        self.buffers.insert(id, wave.frames());
        Ok(id)
    }

    fn unload_sound(&mut self, buffer: BufferId) {
        self.voices.retain(|_, voice| voice.buffer != buffer);
        self.buffers.remove(&buffer);
    }

    fn play(&mut self, buffer: BufferId, looped: bool) -> AudioResult<VoiceId> {
        if !self.buffers.contains_key(&buffer) {
            return Err(AudioError::PlaybackFailed(format!("unknown buffer {}", buffer.0)));
        }
        Ok(self.voices.insert(NullVoice {
            buffer,
            looped,
            paused: false,
        }))
    }

    fn pause(&mut self, voice: VoiceId) -> AudioResult<()> {
        self.voice_mut(voice)?.paused = true;
        Ok(())
    }

    fn unpause(&mut self, voice: VoiceId) -> AudioResult<()> {
        self.voice_mut(voice)?.paused = false;
        Ok(())
    }

    fn stop(&mut self, voice: VoiceId) -> AudioResult<()> {
        self.voices.remove(voice).map(|_| ()).ok_or(AudioError::InvalidVoice)
    }

    fn is_playing(&self, voice: VoiceId) -> bool {
        self.voices.get(voice).is_some_and(|v| !v.paused)
    }

    fn update(&mut self) {}
}
