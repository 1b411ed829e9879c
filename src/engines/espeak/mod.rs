//! espeak-ng speech backend.
//!
//! Runs the `espeak-ng` program with `--stdout` and decodes the WAV it
//! produces. espeak-ng's native rate is 22050 Hz, the same as the tone
//! fallback, so either engine's output can be handed to the same player.
//!
//! # System Requirements
//!
//! **espeak-ng** must be installed on your system:
//! - **Linux**: `sudo apt-get install espeak-ng`
//! - **macOS**: `brew install espeak-ng`
//! - **Windows**: Download installer from <https://espeak-ng.org/download>
//!
//! # Option Mapping
//!
//! | Option | espeak-ng flag |
//! |---|---|
//! | `language` | `-v en`, `-v hi`, `-v es`, `-v fr`, `-v de`, `-v cmn`, `-v ja` |
//! | `voice_gender` | voice variant `+m3` / `+f3`, none for neutral |
//! | pretrained cloning voice | voice variant `+m1`, `+f1`, `+m2`, `+f2` |
//! | `speed` | `-s` = 175 wpm × speed |
//! | `pitch` | `-p` = 50 × pitch, clamped to 0–99 |
//! | `energy` | `-a` = 100 × energy, clamped to 0–200 |

pub mod engine;

pub use engine::{decode_wav, voice_name, EspeakConfig, EspeakEngine, EspeakError};
