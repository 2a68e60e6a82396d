//! Audio transcoding utilities built on ffmpeg and ffprobe.

mod transcode;

pub use transcode::{convert_to_wav, probe_duration, split_into_chunks};
