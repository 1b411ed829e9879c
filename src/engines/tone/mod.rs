//! Deterministic tone fallback engine.
//!
//! Produces a short harmonic tone (220 Hz with 2nd and 3rd harmonics) whose
//! length follows the input's character count. It stands in for real speech
//! whenever no synthesizer is installed or the installed one fails, and uses
//! the same sample rate and WAV conventions as the espeak-ng backend so the
//! two outputs are interchangeable.
//!
//! # Clip Shape
//!
//! | Step | Rule |
//! |---|---|
//! | Duration | `max(1.0, chars / 15)` seconds |
//! | Partials | 0.3·sin(220 Hz) + 0.1·sin(440 Hz) + 0.05·sin(660 Hz) |
//! | Fades | linear, 2205 samples each end (at most half the clip) |
//! | Speed | linear-interpolation resample to `round(len / speed)` samples |
//!
//! # Example
//!
//! ```rust
//! use tts_studio::engines::tone::{synthesize, SAMPLE_RATE};
//!
//! let result = synthesize("fifteen chars!!", 1.0)?;
//! assert_eq!(result.samples.len(), SAMPLE_RATE as usize);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod engine;
pub mod generator;

pub use engine::ToneEngine;
pub use generator::{synthesize, ToneError, SAMPLE_RATE};
