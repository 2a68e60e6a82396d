//! Alignment of transcript segments with diarization intervals.
//!
//! Each segment is attributed to the first interval it overlaps, scanning
//! intervals in input order. First-match is deliberate: when several
//! intervals qualify, the earliest-indexed one wins regardless of overlap
//! size, matching the behavior downstream consumers already rely on.

use crate::diarization::DiarizationInterval;
use crate::transcription::TranscriptSegment;
use serde::{Deserialize, Serialize};

/// Speaker label used when no diarization interval overlaps a segment.
pub const UNKNOWN_SPEAKER: &str = "unknown";

/// A transcript segment with its attributed speaker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlignedEntry {
    /// Speaker label, or [`UNKNOWN_SPEAKER`].
    pub speaker: String,
    /// Recognized text.
    pub text: String,
    /// Start time in seconds, inherited from the source segment.
    pub start: f64,
    /// End time in seconds, inherited from the source segment.
    pub end: f64,
}

/// Attribute each transcript segment to a speaker by temporal overlap.
///
/// Output preserves segment order and count exactly; intervals that match
/// no segment are dropped. Intervals are not assumed sorted or disjoint.
pub fn align(
    segments: &[TranscriptSegment],
    intervals: &[DiarizationInterval],
) -> Vec<AlignedEntry> {
    segments
        .iter()
        .map(|segment| {
            let speaker = intervals
                .iter()
                .find(|interval| overlaps(segment, interval))
                .map(|interval| interval.speaker.clone())
                .unwrap_or_else(|| UNKNOWN_SPEAKER.to_string());

            AlignedEntry {
                speaker,
                text: segment.text.clone(),
                start: segment.start,
                end: segment.end,
            }
        })
        .collect()
}

/// Overlap predicate: the segment starts inside the interval, ends inside
/// it, or spans it entirely.
fn overlaps(segment: &TranscriptSegment, interval: &DiarizationInterval) -> bool {
    (segment.start >= interval.start && segment.start < interval.end)
        || (segment.end > interval.start && segment.end <= interval.end)
        || (segment.start <= interval.start && segment.end >= interval.end)
}
