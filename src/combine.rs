//! Merging of consecutive same-speaker transcript entries.

use crate::alignment::AlignedEntry;

/// Merge consecutive entries that share a speaker into single entries.
///
/// Text is joined with a single space and the running entry's end time is
/// extended; the start time stays at the first entry of the run. Output
/// length is at most the input length, and no two adjacent output entries
/// share a speaker.
pub fn combine(entries: &[AlignedEntry]) -> Vec<AlignedEntry> {
    let mut combined: Vec<AlignedEntry> = Vec::new();

    for entry in entries {
        match combined.last_mut() {
            Some(current) if current.speaker == entry.speaker => {
                current.text.push(' ');
                current.text.push_str(&entry.text);
                current.end = entry.end;
            }
            _ => combined.push(entry.clone()),
        }
    }

    combined
}
