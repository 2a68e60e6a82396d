//! Speech-to-text transcription via the OpenAI Whisper API.
//!
//! Files below the API size limit are sent in one request. Larger files are
//! split into fixed-duration chunks which are transcribed independently and
//! stitched back onto the global timeline.

mod models;
mod whisper;

pub use models::{shift_segments, TranscriptSegment};
pub use whisper::WhisperClient;
