//! # tts-studio
//!
//! A Rust library for turning text into a playable WAV clip, with graceful
//! degradation when no real speech synthesizer is installed.
//!
//! ## Features
//!
//! - **espeak-ng backend**: Real speech through the `espeak-ng` program when it is available
//! - **Tone fallback**: A deterministic harmonic tone whose length follows the text length
//! - **Typed options**: Model, language, speed, pitch, energy, voice and cloning settings
//! - **In-memory WAV**: 16-bit PCM or 32-bit float, mono, ready for playback or download
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! tts-studio = "2026.2"
//! ```
//!
//! ```no_run
//! use tts_studio::{studio::{Session, Studio}, options::SynthesisOptions, WavEncoding};
//!
//! let mut studio = Studio::with_espeak(Default::default());
//! let mut session = Session::default();
//!
//! let generation = studio.generate("Hello, world!", &SynthesisOptions::default())?;
//! let path = session.record(generation).save_to_dir(".".as_ref(), WavEncoding::Pcm16)?;
//! println!("Saved to {}", path.display());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod engines;
pub mod options;
pub mod studio;

use std::io::Cursor;
use std::path::Path;

use serde::{Deserialize, Serialize};

use options::SynthesisOptions;

/// Sample encoding used when serialising a [`SynthesisResult`] to WAV.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WavEncoding {
    /// Signed 16-bit PCM. Samples are clamped to [-1, 1].
    #[default]
    Pcm16,
    /// IEEE 32-bit float.
    Float32,
}

impl WavEncoding {
    fn spec(self, sample_rate: u32) -> hound::WavSpec {
        match self {
            WavEncoding::Pcm16 => hound::WavSpec {
                channels: 1,
                sample_rate,
                bits_per_sample: 16,
                sample_format: hound::SampleFormat::Int,
            },
            WavEncoding::Float32 => hound::WavSpec {
                channels: 1,
                sample_rate,
                bits_per_sample: 32,
                sample_format: hound::SampleFormat::Float,
            },
        }
    }
}

impl std::str::FromStr for WavEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pcm16" | "pcm" | "int16" => Ok(WavEncoding::Pcm16),
            "float32" | "float" | "f32" => Ok(WavEncoding::Float32),
            other => Err(format!("unknown WAV encoding '{other}' (expected pcm16 or float32)")),
        }
    }
}

/// The result of a synthesis (text-to-speech) operation.
///
/// Contains raw f32 audio samples and the sample rate of the output audio.
/// Mono only.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisResult {
    /// Raw audio samples as f32 values
    pub samples: Vec<f32>,
    /// Sample rate of the audio (22050 for both bundled engines)
    pub sample_rate: u32,
}

impl SynthesisResult {
    /// Encode the audio as a complete WAV byte stream.
    pub fn to_wav_bytes(&self, encoding: WavEncoding) -> Result<Vec<u8>, hound::Error> {
        let bytes_per_sample = match encoding {
            WavEncoding::Pcm16 => 2,
            WavEncoding::Float32 => 4,
        };
        let mut cursor = Cursor::new(Vec::with_capacity(44 + self.samples.len() * bytes_per_sample));
        {
            let mut writer = hound::WavWriter::new(&mut cursor, encoding.spec(self.sample_rate))?;
            self.write_samples(&mut writer, encoding)?;
            writer.finalize()?;
        }
        Ok(cursor.into_inner())
    }

    /// Write the audio to a WAV file.
    pub fn write_wav(&self, path: &Path, encoding: WavEncoding) -> Result<(), hound::Error> {
        let mut writer = hound::WavWriter::create(path, encoding.spec(self.sample_rate))?;
        self.write_samples(&mut writer, encoding)?;
        writer.finalize()?;
        Ok(())
    }

    fn write_samples<W>(
        &self,
        writer: &mut hound::WavWriter<W>,
        encoding: WavEncoding,
    ) -> Result<(), hound::Error>
    where
        W: std::io::Write + std::io::Seek,
    {
        match encoding {
            WavEncoding::Pcm16 => {
                for &sample in &self.samples {
                    writer.write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
                }
            }
            WavEncoding::Float32 => {
                for &sample in &self.samples {
                    writer.write_sample(sample)?;
                }
            }
        }
        Ok(())
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Common interface for text-to-speech synthesis engines.
///
/// Every engine receives the full [`SynthesisOptions`] and uses the parts it
/// understands. Errors are boxed so the studio can hold heterogeneous
/// backends behind one trait object.
pub trait SynthesisEngine: Send {
    /// Short engine name used in logs and in [`studio::AudioSource`].
    fn name(&self) -> &str;

    /// Whether the engine can currently be used (e.g. its program is installed).
    fn is_available(&self) -> bool {
        true
    }

    /// Synthesize speech from the given text.
    fn synthesize(
        &mut self,
        text: &str,
        options: &SynthesisOptions,
    ) -> Result<SynthesisResult, Box<dyn std::error::Error + Send + Sync>>;

    /// Synthesize speech from the given text and write to a WAV file.
    ///
    /// Default implementation calls `synthesize()` then `SynthesisResult::write_wav()`.
    fn synthesize_to_file(
        &mut self,
        text: &str,
        wav_path: &Path,
        options: &SynthesisOptions,
        encoding: WavEncoding,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.synthesize(text, options)?.write_wav(wav_path, encoding)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> SynthesisResult {
        SynthesisResult {
            samples: vec![0.0, 0.25, -0.5, 1.5, -2.0],
            sample_rate: 22050,
        }
    }

    #[test]
    fn pcm16_header_is_canonical_44_bytes() {
        let result = ramp();
        let bytes = result.to_wav_bytes(WavEncoding::Pcm16).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(bytes.len(), 44 + 2 * result.samples.len());
    }

    #[test]
    fn pcm16_clamps_out_of_range_samples() {
        let bytes = ramp().to_wav_bytes(WavEncoding::Pcm16).unwrap();
        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 22050);
        let decoded: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, vec![0, 8191, -16383, i16::MAX, -i16::MAX]);
    }

    #[test]
    fn float32_preserves_samples() {
        let result = ramp();
        let bytes = result.to_wav_bytes(WavEncoding::Float32).unwrap();
        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.spec().sample_format, hound::SampleFormat::Float);
        let decoded: Vec<f32> = reader.into_samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, result.samples);
    }

    #[test]
    fn write_wav_matches_in_memory_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        let result = ramp();
        result.write_wav(&path, WavEncoding::Pcm16).unwrap();
        let on_disk = std::fs::read(&path).unwrap();
        assert_eq!(on_disk, result.to_wav_bytes(WavEncoding::Pcm16).unwrap());
    }

    #[test]
    fn duration_uses_sample_rate() {
        let result = SynthesisResult {
            samples: vec![0.0; 11025],
            sample_rate: 22050,
        };
        assert!((result.duration_secs() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn parses_encoding_names() {
        assert_eq!("PCM16".parse::<WavEncoding>(), Ok(WavEncoding::Pcm16));
        assert_eq!("float32".parse::<WavEncoding>(), Ok(WavEncoding::Float32));
        assert!("mp3".parse::<WavEncoding>().is_err());
    }
}
