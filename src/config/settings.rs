//! Configuration settings for Tolk.
//!
//! Settings are loaded once at startup from an optional TOML file, then
//! overridden by environment variables. Components receive the resolved
//! struct through their constructors; nothing reads the environment after
//! startup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub transcription: TranscriptionSettings,
    pub diarization: DiarizationSettings,
    pub analysis: AnalysisSettings,
}

/// HTTP server and file layout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address to bind.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Publicly reachable base URL under which `/uploads` is exposed.
    /// The diarization service fetches waveform files through it.
    pub public_base_url: String,
    /// Directory holding uploaded audio files.
    pub uploads_dir: String,
    /// Directory where result records are written.
    pub results_dir: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            public_base_url: "http://localhost:3000".to_string(),
            uploads_dir: "uploads".to_string(),
            results_dir: "results".to_string(),
        }
    }
}

/// Speech-to-text settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Whisper model to use.
    pub model: String,
    /// Duration in seconds of each chunk when splitting long audio.
    pub chunk_duration_seconds: u32,
    /// File size at or above which audio is split before transcription.
    pub size_threshold_bytes: u64,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: "whisper-1".to_string(),
            chunk_duration_seconds: 600,
            size_threshold_bytes: 25 * 1024 * 1024,
        }
    }
}

/// Diarization service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiarizationSettings {
    /// Base URL of the diarization API.
    pub api_base_url: String,
    /// Bearer token for the diarization API.
    pub api_key: String,
    /// Maximum number of status polls before giving up.
    pub poll_attempts: u32,
    /// Fixed delay between status polls, in seconds.
    pub poll_interval_seconds: u64,
}

impl Default for DiarizationSettings {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.pyannote.ai/v1".to_string(),
            api_key: String::new(),
            poll_attempts: 30,
            poll_interval_seconds: 10,
        }
    }
}

/// Interview analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Chat model used for summarization.
    pub model: String,
    /// Sampling temperature for the analysis completion.
    pub temperature: f32,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or the default location if None.
    /// Environment overrides are applied after the file is read.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env_overrides();
        Ok(settings)
    }

    /// Apply environment variable overrides.
    ///
    /// `NGROK_URL` is honored as a fallback alias for `PUBLIC_BASE_URL`
    /// since tunneled deployments commonly export it.
    fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(url) = std::env::var("PUBLIC_BASE_URL") {
            self.server.public_base_url = url;
        } else if let Ok(url) = std::env::var("NGROK_URL") {
            self.server.public_base_url = url;
        }
        if let Ok(key) = std::env::var("PYANNOTE_API_KEY") {
            self.diarization.api_key = key;
        }
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tolk")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded uploads directory path.
    pub fn uploads_dir(&self) -> PathBuf {
        Self::expand_path(&self.server.uploads_dir)
    }

    /// Get the expanded results directory path.
    pub fn results_dir(&self) -> PathBuf {
        Self::expand_path(&self.server.results_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.transcription.chunk_duration_seconds, 600);
        assert_eq!(settings.transcription.size_threshold_bytes, 25 * 1024 * 1024);
        assert_eq!(settings.diarization.poll_attempts, 30);
        assert_eq!(settings.diarization.poll_interval_seconds, 10);
    }

    #[test]
    fn test_partial_toml() {
        let settings: Settings = toml::from_str(
            r#"
            [server]
            port = 8080

            [diarization]
            poll_attempts = 5
            "#,
        )
        .unwrap();

        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.diarization.poll_attempts, 5);
        // Untouched sections keep their defaults
        assert_eq!(settings.transcription.model, "whisper-1");
    }
}
