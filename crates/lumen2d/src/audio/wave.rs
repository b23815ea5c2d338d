//! Decoded PCM audio
//!
//! A [`Wave`] holds interleaved signed 16-bit samples. RIFF WAVE data is
//! decoded with `hound` from any `Read + Seek` byte source.

use super::AudioError;
use hound::{SampleFormat, WavReader};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

/// Interleaved 16-bit PCM audio
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wave {
    channels: u16,
    sample_rate: u32,
    samples: Vec<i16>,
}

impl Wave {
    /// Wrap interleaved samples
    pub fn new(channels: u16, sample_rate: u32, samples: Vec<i16>) -> Result<Self, AudioError> {
        if !(1..=2).contains(&channels) {
            return Err(AudioError::InvalidWave(format!("{} channels (expected 1 or 2)", channels)));
        }
        if sample_rate == 0 {
            return Err(AudioError::InvalidWave("sample rate is zero".to_string()));
        }
        if samples.len() % channels as usize != 0 {
            return Err(AudioError::InvalidWave(format!(
                "{} samples do not divide into {} channels",
                samples.len(),
                channels
            )));
        }
        Ok(Self {
            channels,
            sample_rate,
            samples,
        })
    }

    /// Silent wave lasting `frames` frames
    pub fn silence(channels: u16, sample_rate: u32, frames: usize) -> Result<Self, AudioError> {
        Self::new(channels, sample_rate, vec![0; frames * channels as usize])
    }

    /// Read a RIFF WAVE file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AudioError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let wave = Self::from_wav_reader(BufReader::new(file))?;
        log::info!(
            "Loaded wave {:?} ({} Hz, {} channels, {:.2}s)",
            path,
            wave.sample_rate,
            wave.channels,
            wave.duration_secs()
        );
        Ok(wave)
    }

    /// Read RIFF WAVE data
    ///
    /// Integer PCM of any width is rescaled to 16 bits; float PCM is
    /// clamped to -1..=1 first.
    pub fn from_wav_reader<R: Read + Seek>(reader: R) -> Result<Self, AudioError> {
        let mut reader = WavReader::new(reader)?;
        let spec = reader.spec();

        let samples: Result<Vec<i16>, hound::Error> = match spec.sample_format {
            SampleFormat::Float => reader
                .samples::<f32>()
                .map(|sample| sample.map(|s| (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16))
                .collect(),
            SampleFormat::Int => {
                let bits = u32::from(spec.bits_per_sample);
                reader
                    .samples::<i32>()
                    .map(|sample| sample.map(|s| rescale_to_16(s, bits)))
                    .collect()
            }
        };

        Self::new(spec.channels, spec.sample_rate, samples?)
    }

    /// Channel count (1 or 2)
    pub const fn channels(&self) -> u16 {
        self.channels
    }

    /// Frames per second
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Interleaved samples
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Playback length in seconds
    pub fn duration_secs(&self) -> f32 {
        self.frames() as f32 / self.sample_rate as f32
    }
}

fn rescale_to_16(sample: i32, bits: u32) -> i16 {
    let scaled = if bits <= 16 { sample << (16 - bits) } else { sample >> (bits - 16) };
    scaled as i16
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Cursor;

    fn wav_bytes(channels: u16, sample_rate: u32, bits: u16, data: &[u8], extra_chunk: bool) -> Vec<u8> {
        wav_bytes_declaring(channels, sample_rate, bits, data, data.len() as u32, extra_chunk)
    }

    fn wav_bytes_declaring(
        channels: u16,
        sample_rate: u32,
        bits: u16,
        data: &[u8],
        declared: u32,
        extra_chunk: bool,
    ) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(b"WAVE");
        if extra_chunk {
            body.extend_from_slice(b"LIST");
            body.extend_from_slice(&4u32.to_le_bytes());
            body.extend_from_slice(&[1, 2, 3, 4]);
        }
        body.extend_from_slice(b"fmt ");
        body.extend_from_slice(&16u32.to_le_bytes());
        body.extend_from_slice(&1u16.to_le_bytes());
        body.extend_from_slice(&channels.to_le_bytes());
        body.extend_from_slice(&sample_rate.to_le_bytes());
        let block_align = channels * bits / 8;
        body.extend_from_slice(&(sample_rate * u32::from(block_align)).to_le_bytes());
        body.extend_from_slice(&block_align.to_le_bytes());
        body.extend_from_slice(&bits.to_le_bytes());
        body.extend_from_slice(b"data");
        body.extend_from_slice(&declared.to_le_bytes());
        body.extend_from_slice(data);

        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(body.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&body);
        bytes
    }

    #[test]
    fn test_reads_16_bit_stereo() {
        let data: Vec<u8> = [100i16, -100, 2000, -2000].iter().flat_map(|s| s.to_le_bytes()).collect();
        let wave = Wave::from_wav_reader(Cursor::new(wav_bytes(2, 22050, 16, &data, true))).unwrap();

        assert_eq!(wave.channels(), 2);
        assert_eq!(wave.sample_rate(), 22050);
        assert_eq!(wave.samples(), &[100, -100, 2000, -2000]);
        assert_eq!(wave.frames(), 2);
    }

    #[test]
    fn test_reads_8_bit_mono() {
        let wave = Wave::from_wav_reader(Cursor::new(wav_bytes(1, 8000, 8, &[128, 255, 0], false))).unwrap();
        assert_eq!(wave.samples(), &[0, 127 << 8, -128 << 8]);
    }

    #[test]
    fn test_rejects_non_wave_data() {
        let result = Wave::from_wav_reader(Cursor::new(b"OggS0000000000000000".to_vec()));
        assert!(matches!(result, Err(AudioError::Decode(_))));
    }

    #[test]
    fn test_rejects_truncated_data() {
        let mut bytes = wav_bytes(1, 8000, 16, &[0, 0, 0, 0], false);
        bytes.truncate(bytes.len() - 2);
        assert!(matches!(
            Wave::from_wav_reader(Cursor::new(bytes)),
            Err(AudioError::Io(_) | AudioError::Decode(_))
        ));
    }

    #[test]
    fn test_rejects_short_odd_length_data() {
        // 16-bit data with 5 bytes present but 9 declared
        let bytes = wav_bytes_declaring(1, 8000, 16, &[1, 0, 2, 0, 3], 9, false);
        assert!(matches!(
            Wave::from_wav_reader(Cursor::new(bytes)),
            Err(AudioError::Io(_) | AudioError::Decode(_))
        ));
    }

    #[test]
    fn test_oversized_declared_length_fails_without_allocating_it() {
        let bytes = wav_bytes_declaring(1, 8000, 16, &[1, 0, 2, 0], u32::MAX - 1, false);
        assert!(Wave::from_wav_reader(Cursor::new(bytes)).is_err());
    }

    #[test]
    fn test_rescales_wide_integer_samples() {
        assert_eq!(rescale_to_16(-128, 8), i16::MIN);
        assert_eq!(rescale_to_16(0x12_3456, 24), 0x1234);
        assert_eq!(rescale_to_16(i32::MAX, 32), i16::MAX);
    }

    #[test]
    fn test_validates_layout() {
        assert!(Wave::new(3, 44100, vec![0; 3]).is_err());
        assert!(Wave::new(2, 0, vec![0; 2]).is_err());
        assert!(Wave::new(2, 44100, vec![0; 3]).is_err());
    }

    #[test]
    fn test_duration() {
        let wave = Wave::silence(2, 1000, 500).unwrap();
        assert_relative_eq!(wave.duration_secs(), 0.5);
    }
}
