//! Tolk - Speaker-attributed transcription server
//!
//! Accepts uploaded audio, normalizes it to a canonical waveform, transcribes
//! speech, identifies speaker turns through a remote diarization service, and
//! aligns both into a speaker-labeled transcript that is persisted as JSON.
//!
//! The name "Tolk" comes from the Norwegian word for "interpreter."
//!
//! # Architecture
//!
//! - `config` - Configuration management
//! - `audio` - Waveform conversion and chunking (ffmpeg/ffprobe)
//! - `transcription` - Speech-to-text via the Whisper API
//! - `diarization` - Speaker diarization job submission and polling
//! - `alignment` - Matching transcript segments to speaker intervals
//! - `combine` - Merging consecutive same-speaker entries
//! - `analysis` - LLM-based interview analysis
//! - `store` - Persisted result records
//! - `pipeline` - Stage orchestration
//! - `server` - HTTP endpoints and static waveform exposure

pub mod alignment;
pub mod analysis;
pub mod audio;
pub mod combine;
pub mod config;
pub mod diarization;
pub mod error;
pub mod openai;
pub mod pipeline;
pub mod server;
pub mod store;
pub mod transcription;

pub use error::{Result, TolkError};
