//! Rodio audio backend
//!
//! Plays uploaded PCM buffers through the default output device. Each voice
//! is its own [`Sink`], so voices pause, resume and stop independently.

use super::{AudioBackend, AudioResult, BufferId, VoiceId};
use crate::audio::{AudioError, Wave};
use crate::backend::Backend;
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
use slotmap::SlotMap;
use std::collections::HashMap;

struct Voice {
    sink: Sink,
    buffer: BufferId,
}

/// Rodio-based audio backend
pub struct RodioAudio {
    /// Audio output stream (must be kept alive)
    _output_stream: Option<OutputStream>,
    /// Output stream handle for creating sinks
    stream_handle: Option<OutputStreamHandle>,
    buffers: HashMap<BufferId, Wave>,
    voices: SlotMap<VoiceId, Voice>,
    next_buffer: u32,
    master_volume: f32,
}

impl Default for RodioAudio {
    fn default() -> Self {
        Self::new()
    }
}

impl RodioAudio {
    /// Create the backend; the device is opened by [`AudioBackend::init`]
    pub fn new() -> Self {
        Self {
            _output_stream: None,
            stream_handle: None,
            buffers: HashMap::new(),
            voices: SlotMap::with_key(),
            next_buffer: 0,
            master_volume: 1.0,
        }
    }

    fn sink(&self, voice: VoiceId) -> AudioResult<&Sink> {
        self.voices.get(voice).map(|v| &v.sink).ok_or(AudioError::InvalidVoice)
    }
}

impl Backend for RodioAudio {
    fn name(&self) -> &'static str {
        "rodio"
    }

    fn probe(&self) -> bool {
        OutputStream::try_default().is_ok()
    }
}

impl AudioBackend for RodioAudio {
    fn init(&mut self) -> AudioResult<()> {
        let (stream, handle) = OutputStream::try_default().map_err(|e| AudioError::InitFailed {
            backend: "rodio",
            reason: e.to_string(),
        })?;
        self._output_stream = Some(stream);
        self.stream_handle = Some(handle);
        log::info!("Rodio audio output opened");
        Ok(())
    }

    fn terminate(&mut self) {
        for (_, voice) in self.voices.drain() {
            voice.sink.stop();
        }
        self.buffers.clear();
        self.stream_handle = None;
        self._output_stream = None;
        log::debug!("Rodio audio output closed");
    }

    fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume;
        for voice in self.voices.values() {
            voice.sink.set_volume(volume);
        }
    }

    fn load_sound(&mut self, wave: &Wave) -> AudioResult<BufferId> {
        self.next_buffer += 1;
        let id = BufferId(self.next_buffer);
        self.buffers.insert(id, wave.clone());
        Ok(id)
    }

    fn unload_sound(&mut self, buffer: BufferId) {
        self.voices.retain(|_, voice| {
            let keep = voice.buffer != buffer;
            if !keep {
                voice.sink.stop();
            }
            keep
        });
        self.buffers.remove(&buffer);
    }

    fn play(&mut self, buffer: BufferId, looped: bool) -> AudioResult<VoiceId> {
        let stream_handle = self.stream_handle.as_ref().ok_or(AudioError::NotInitialized)?;
        let wave = self
            .buffers
            .get(&buffer)
            .ok_or_else(|| AudioError::PlaybackFailed(format!("unknown buffer {}", buffer.0)))?;

        let sink = Sink::try_new(stream_handle)
            .map_err(|e| AudioError::PlaybackFailed(format!("Failed to create sink: {}", e)))?;
        sink.set_volume(self.master_volume);

        let source = SamplesBuffer::new(wave.channels(), wave.sample_rate(), wave.samples().to_vec());
        if looped {
            sink.append(source.repeat_infinite());
        } else {
            sink.append(source);
        }

        Ok(self.voices.insert(Voice { sink, buffer }))
    }

    fn pause(&mut self, voice: VoiceId) -> AudioResult<()> {
        self.sink(voice)?.pause();
        Ok(())
    }

    fn unpause(&mut self, voice: VoiceId) -> AudioResult<()> {
        self.sink(voice)?.play();
        Ok(())
    }

    fn stop(&mut self, voice: VoiceId) -> AudioResult<()> {
        let voice = self.voices.remove(voice).ok_or(AudioError::InvalidVoice)?;
        voice.sink.stop();
        Ok(())
    }

    fn is_playing(&self, voice: VoiceId) -> bool {
        self.voices
            .get(voice)
            .is_some_and(|v| !v.sink.is_paused() && !v.sink.empty())
    }

    fn update(&mut self) {
        self.voices.retain(|_, voice| !voice.sink.empty());
    }
}

impl Drop for RodioAudio {
    fn drop(&mut self) {
        if self.stream_handle.is_some() {
            self.terminate();
        }
    }
}
