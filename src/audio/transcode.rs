//! Waveform normalization and chunking via ffmpeg/ffprobe.
//!
//! All speech services downstream expect mono 16 kHz 16-bit PCM, so every
//! input container is funneled through the same conversion before anything
//! else happens.

use crate::error::{Result, TolkError};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Converts an audio or video file to a mono 16 kHz 16-bit PCM WAV file.
///
/// The output path is the input path with its extension replaced by `wav`.
#[instrument(skip_all, fields(input = %input.display()))]
pub async fn convert_to_wav(input: &Path) -> Result<PathBuf> {
    let output = input.with_extension("wav");
    debug!("Converting to {}", output.display());

    run_ffmpeg_to_wav(input, &output, None, None).await?;

    Ok(output)
}

/// Queries the duration of a media file in seconds using ffprobe.
pub async fn probe_duration(path: &Path) -> Result<f64> {
    let result = Command::new("ffprobe")
        .arg("-v").arg("quiet")
        .arg("-print_format").arg("json")
        .arg("-show_format")
        .arg(path)
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(TolkError::ToolNotFound("ffprobe".into()));
        }
        Err(e) => {
            return Err(TolkError::Probe(format!("ffprobe execution failed: {e}")));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(TolkError::Probe(format!("ffprobe returned error: {stderr}")));
    }

    let json_str = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&json_str)
        .map_err(|_| TolkError::Probe("Invalid ffprobe output".into()))?;

    parsed["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| TolkError::Probe("Could not determine audio duration".into()))
}

/// Splits an audio file into fixed-duration WAV chunks.
///
/// Chunks start at multiples of `chunk_seconds`; the last one is clamped at
/// end-of-stream by ffmpeg. Files land in a fresh scratch directory and the
/// caller is responsible for deleting them.
#[instrument(skip_all, fields(input = %input.display()))]
pub async fn split_into_chunks(input: &Path, chunk_seconds: u32) -> Result<Vec<PathBuf>> {
    let total_duration = probe_duration(input).await?;
    info!("Total audio duration: {:.1}s", total_duration);

    let scratch_dir = tempfile::Builder::new()
        .prefix("tolk-chunks-")
        .tempdir()?
        .keep();

    let base_name = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("audio");

    let chunk_len = chunk_seconds as f64;
    let mut chunks = Vec::new();
    let mut offset = 0.0;
    let mut idx = 0u32;

    while offset < total_duration {
        let chunk_path = scratch_dir.join(format!("{}_{:04}.wav", base_name, idx));

        run_ffmpeg_to_wav(input, &chunk_path, Some(offset), Some(chunk_len)).await?;

        debug!("Created chunk {} at offset {:.1}s", idx, offset);
        chunks.push(chunk_path);

        offset += chunk_len;
        idx += 1;
    }

    info!("Created {} audio chunks", chunks.len());
    Ok(chunks)
}

/// Runs ffmpeg to produce a mono 16 kHz PCM WAV, optionally limited to a
/// time window.
async fn run_ffmpeg_to_wav(
    input: &Path,
    output: &Path,
    start: Option<f64>,
    length: Option<f64>,
) -> Result<()> {
    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-y");

    if let Some(start) = start {
        cmd.arg("-ss").arg(format!("{:.3}", start));
    }

    cmd.arg("-i").arg(input);

    if let Some(length) = length {
        cmd.arg("-t").arg(format!("{:.3}", length));
    }

    cmd.arg("-acodec").arg("pcm_s16le")
        .arg("-ac").arg("1")
        .arg("-ar").arg("16000")
        .arg("-loglevel").arg("error")
        .arg(output)
        .stdout(Stdio::null())
        .stderr(Stdio::piped());

    let result = cmd.output().await;

    match result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let stderr = String::from_utf8_lossy(&out.stderr);
            Err(TolkError::Conversion(format!("ffmpeg failed: {stderr}")))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(TolkError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(TolkError::Conversion(format!("ffmpeg execution failed: {e}"))),
    }
}
