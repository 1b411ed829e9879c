//! Speech synthesis engines.
//!
//! # Available Engines
//!
//! - `espeak` - espeak-ng command-line synthesizer (must be installed)
//! - `tone` - deterministic harmonic tone, always available

pub mod espeak;
pub mod tone;
